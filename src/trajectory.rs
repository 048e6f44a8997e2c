use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::types::Position;

pub const TRAJECTORY_FILE: &str = "visited_cells.txt";

/// Per-episode log of visited grid cells for evaluation runs.
///
/// Consecutive duplicate positions are suppressed at record time, so each
/// episode line is the deduplicated movement trace. Saved as one line per
/// episode of comma-separated linearized indices (`y * grid_width + x`).
#[derive(Debug, Default)]
pub struct TrajectoryLog {
    episodes: Vec<Vec<Position>>,
}

impl TrajectoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the agent's current cell for `episode`, skipping it when it
    /// equals the episode's last recorded cell.
    pub fn record(&mut self, episode: usize, pos: Position) {
        while self.episodes.len() <= episode {
            self.episodes.push(Vec::new());
        }
        let trace = &mut self.episodes[episode];
        if trace.last() != Some(&pos) {
            trace.push(pos);
        }
    }

    pub fn num_episodes(&self) -> usize {
        self.episodes.len()
    }

    pub fn episode(&self, index: usize) -> Option<&[Position]> {
        self.episodes.get(index).map(|e| e.as_slice())
    }

    /// Write the log to `<root>/<folder>/visited_cells.txt`, overwriting any
    /// previous save. Returns the path written.
    pub fn save(&self, root: &Path, folder: &str, grid_width: i32) -> io::Result<PathBuf> {
        let dir = root.join(folder);
        fs::create_dir_all(&dir)?;
        let path = dir.join(TRAJECTORY_FILE);

        let mut contents = String::new();
        for trace in &self.episodes {
            let line: Vec<String> = trace
                .iter()
                .map(|pos| (pos.y * grid_width + pos.x).to_string())
                .collect();
            contents.push_str(&line.join(","));
            contents.push('\n');
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Parse a saved log back into per-episode linearized index sequences.
    pub fn load(path: &Path) -> io::Result<Vec<Vec<i32>>> {
        let contents = fs::read_to_string(path)?;
        let mut episodes = Vec::new();
        for line in contents.lines() {
            if line.is_empty() {
                episodes.push(Vec::new());
                continue;
            }
            let indices = line
                .split(',')
                .map(|value| {
                    value
                        .parse::<i32>()
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
                })
                .collect::<io::Result<Vec<i32>>>()?;
            episodes.push(indices);
        }
        Ok(episodes)
    }
}
