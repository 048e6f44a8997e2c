use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Neighbors in the expansion order used by the path search:
    /// left, right, up, down.
    pub fn neighbors(&self) -> [Position; 4] {
        [
            Position::new(self.x - 1, self.y),
            Position::new(self.x + 1, self.y),
            Position::new(self.x, self.y - 1),
            Position::new(self.x, self.y + 1),
        ]
    }
}

impl From<Position> for [i32; 2] {
    fn from(pos: Position) -> Self {
        [pos.x, pos.y]
    }
}

impl From<[i32; 2]> for Position {
    fn from(pair: [i32; 2]) -> Self {
        Position::new(pair[0], pair[1])
    }
}

/// The four grid actions. The enumeration order is part of the behavior
/// contract: the evasive target strategy tries directions in exactly this
/// order and keeps the first qualifying candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Right,
    Up,
    Left,
    Down,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Right, Action::Up, Action::Left, Action::Down];

    pub fn delta(&self) -> (i32, i32) {
        match self {
            Action::Right => (1, 0),
            Action::Up => (0, -1),
            Action::Left => (-1, 0),
            Action::Down => (0, 1),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Action::Right => 0,
            Action::Up => 1,
            Action::Left => 2,
            Action::Down => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Action::ALL.get(index).copied()
    }

    pub fn apply(&self, pos: Position) -> Position {
        let (dx, dy) = self.delta();
        Position::new(pos.x + dx, pos.y + dy)
    }
}

pub fn clamp_position(pos: Position, min: i32, max: i32) -> Position {
    Position::new(pos.x.clamp(min, max), pos.y.clamp(min, max))
}
