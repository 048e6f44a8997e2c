use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::types::Position;

#[derive(Clone, Eq, PartialEq)]
struct Node {
    f_score: i32,
    g_score: i32,
    pos: Position,
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on (f, g, position). Ties break on smaller g, then on
        // position order, which pins down the expansion sequence and keeps
        // returned path lengths reproducible.
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.g_score.cmp(&self.g_score))
            .then_with(|| other.pos.cmp(&self.pos))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct AStar;

impl AStar {
    /// Shortest 4-directional path from `start` to `goal`, avoiding
    /// `obstacles`, within a `size` x `size` grid.
    ///
    /// The returned path excludes `start` and includes `goal`, so its length
    /// is the number of moves. Returns `None` when the goal is unreachable.
    /// The start cell is expanded even when it is itself an obstacle; only
    /// neighbor cells are filtered against the obstacle set.
    #[tracing::instrument(level = "trace", skip(obstacles), fields(start_x = start.x, start_y = start.y, goal_x = goal.x, goal_y = goal.y))]
    pub fn find_path(
        size: i32,
        obstacles: &HashSet<Position>,
        start: Position,
        goal: Position,
    ) -> Option<Vec<Position>> {
        let mut open_set = BinaryHeap::new();
        let mut came_from: HashMap<Position, Position> = HashMap::new();
        let mut g_score: HashMap<Position, i32> = HashMap::new();

        g_score.insert(start, 0);
        open_set.push(Node {
            f_score: heuristic(start, goal),
            g_score: 0,
            pos: start,
        });

        while let Some(Node {
            g_score: current_g,
            pos: current,
            ..
        }) = open_set.pop()
        {
            if current == goal {
                tracing::trace!("Path found");
                return Some(reconstruct_path(&came_from, current));
            }

            for neighbor in current.neighbors() {
                if obstacles.contains(&neighbor)
                    || neighbor.x < 0
                    || neighbor.x >= size
                    || neighbor.y < 0
                    || neighbor.y >= size
                {
                    continue;
                }

                let tentative_g = current_g + 1;

                if tentative_g < *g_score.get(&neighbor).unwrap_or(&i32::MAX) {
                    came_from.insert(neighbor, current);
                    g_score.insert(neighbor, tentative_g);
                    open_set.push(Node {
                        f_score: tentative_g + heuristic(neighbor, goal),
                        g_score: tentative_g,
                        pos: neighbor,
                    });
                }
            }
        }

        tracing::trace!("No path found");
        None
    }
}

fn heuristic(a: Position, b: Position) -> i32 {
    a.distance(&b)
}

fn reconstruct_path(came_from: &HashMap<Position, Position>, goal: Position) -> Vec<Position> {
    let mut path = Vec::new();
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        path.push(current);
        current = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> HashSet<Position> {
        HashSet::new()
    }

    #[test]
    fn test_path_length_equals_manhattan_without_obstacles() {
        let start = Position::new(1, 1);
        let goal = Position::new(7, 4);
        let path = AStar::find_path(10, &empty(), start, goal).unwrap();
        assert_eq!(path.len() as i32, start.distance(&goal));
        assert_eq!(*path.last().unwrap(), goal);
        assert!(!path.contains(&start));
    }

    #[test]
    fn test_path_to_self_is_empty() {
        let pos = Position::new(3, 3);
        let path = AStar::find_path(10, &empty(), pos, pos).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_consecutive_path_cells_are_adjacent() {
        let mut obstacles = HashSet::new();
        for y in 0..9 {
            obstacles.insert(Position::new(4, y));
        }
        let start = Position::new(1, 1);
        let goal = Position::new(8, 1);
        let path = AStar::find_path(10, &obstacles, start, goal).unwrap();
        let mut prev = start;
        for cell in &path {
            assert_eq!(prev.distance(cell), 1);
            assert!(!obstacles.contains(cell));
            prev = *cell;
        }
        assert_eq!(prev, goal);
    }

    #[test]
    fn test_no_path_when_goal_enclosed() {
        let goal = Position::new(5, 5);
        let obstacles: HashSet<Position> = goal.neighbors().into_iter().collect();
        assert!(AStar::find_path(10, &obstacles, Position::new(1, 1), goal).is_none());
    }

    #[test]
    fn test_detour_around_wall() {
        // Vertical wall at x=5 with a gap at y=8.
        let mut obstacles = HashSet::new();
        for y in 0..8 {
            obstacles.insert(Position::new(5, y));
        }
        let start = Position::new(4, 0);
        let goal = Position::new(6, 0);
        let path = AStar::find_path(10, &obstacles, start, goal).unwrap();
        // Down to the gap, across, back up: 8 + 2 + 8 = 18 moves.
        assert_eq!(path.len(), 18);
    }

    #[test]
    fn test_adding_obstacle_never_shortens_path() {
        let start = Position::new(1, 1);
        let goal = Position::new(8, 8);
        let base_len = AStar::find_path(10, &empty(), start, goal).unwrap().len();
        let mut obstacles = HashSet::new();
        for pos in [
            Position::new(4, 4),
            Position::new(5, 4),
            Position::new(4, 5),
            Position::new(2, 1),
            Position::new(1, 2),
        ] {
            obstacles.insert(pos);
            let len = AStar::find_path(10, &obstacles, start, goal).unwrap().len();
            assert!(len >= base_len, "path shortened after adding {pos:?}");
        }
    }

    #[test]
    fn test_search_expands_from_obstacle_start() {
        // The start cell itself being blocked must not prevent the search;
        // the collision distance computation relies on this.
        let mut obstacles = HashSet::new();
        obstacles.insert(Position::new(3, 3));
        let path = AStar::find_path(10, &obstacles, Position::new(3, 3), Position::new(6, 3));
        assert_eq!(path.unwrap().len(), 3);
    }
}
