use std::collections::HashSet;

use crate::types::Position;

/// Grid cell codes used by the image encoding.
pub const CELL_EMPTY: u8 = 0;
pub const CELL_OBSTACLE: u8 = 1;
pub const CELL_AGENT: u8 = 3;
pub const CELL_TARGET: u8 = 4;

/// Observation encoding consumed by the external policy.
///
/// Every encoding narrows values to `u8` with wrapping; grids large enough
/// to produce coordinates past 255 wrap silently, matching the wire
/// contract of the policies trained against these observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObsEncoding {
    /// Row-major size x size byte grid of cell codes.
    Image,
    /// Reserved dict-shaped observation; encodes via the flat fallback.
    Structured,
    /// Agent (x, y), target (x, y), then every obstacle pair in ascending
    /// (x, y) order.
    Flat,
}

impl ObsEncoding {
    /// Map a policy-type selector onto an encoding. Unknown selectors fall
    /// back to the flat vector rather than failing.
    pub fn from_selector(selector: &str) -> Self {
        match selector {
            "CnnPolicy" => ObsEncoding::Image,
            "MultiInputPolicy" => ObsEncoding::Structured,
            _ => ObsEncoding::Flat,
        }
    }

    pub fn encode(
        &self,
        size: i32,
        agent: Position,
        target: Position,
        obstacles: &HashSet<Position>,
    ) -> Vec<u8> {
        match self {
            ObsEncoding::Image => encode_image(size, agent, target, obstacles),
            ObsEncoding::Structured => {
                tracing::debug!("Structured encoding not implemented, using flat fallback");
                encode_flat(agent, target, obstacles)
            }
            ObsEncoding::Flat => encode_flat(agent, target, obstacles),
        }
    }
}

fn encode_image(
    size: i32,
    agent: Position,
    target: Position,
    obstacles: &HashSet<Position>,
) -> Vec<u8> {
    let size = size as usize;
    let mut grid = vec![CELL_EMPTY; size * size];
    let idx = |pos: Position| pos.y as usize * size + pos.x as usize;
    for &obstacle in obstacles {
        grid[idx(obstacle)] = CELL_OBSTACLE;
    }
    // Agent is written after the target so it wins if the cells coincide
    // at the terminal step.
    grid[idx(target)] = CELL_TARGET;
    grid[idx(agent)] = CELL_AGENT;
    grid
}

fn encode_flat(agent: Position, target: Position, obstacles: &HashSet<Position>) -> Vec<u8> {
    let mut sorted: Vec<Position> = obstacles.iter().copied().collect();
    sorted.sort();

    let mut out = Vec::with_capacity(4 + 2 * sorted.len());
    out.push(agent.x as u8);
    out.push(agent.y as u8);
    out.push(target.x as u8);
    out.push(target.y as u8);
    for obstacle in sorted {
        out.push(obstacle.x as u8);
        out.push(obstacle.y as u8);
    }
    out
}
