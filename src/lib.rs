pub mod bridge;
pub mod encoder;
pub mod env;
pub mod events;
pub mod pathfinding;
pub mod patterns;
pub mod policy;
pub mod target;
pub mod trajectory;
pub mod types;

// Re-export commonly used types for convenience
pub use env::{GridSim, SimConfig, StepInfo, StepResult};
pub use pathfinding::AStar;
pub use types::{Action, Position};
