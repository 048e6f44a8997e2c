use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::types::Position;

/// Pool of fixed interior obstacle layouts, cycled round-robin across
/// episode resets and persisted as JSON so repeated runs in the same
/// working directory see the same layouts.
///
/// With `num_patterns == 0` no pool exists: every request draws a fresh
/// layout and nothing touches disk.
pub struct PatternLibrary {
    size: i32,
    num_obstacles: usize,
    num_patterns: usize,
    store_path: PathBuf,
    patterns: Option<Vec<Vec<Position>>>,
    index: usize,
}

impl PatternLibrary {
    pub const DEFAULT_STORE: &'static str = "obstacle_patterns.json";

    pub fn new(size: i32, num_obstacles: usize, num_patterns: usize) -> Self {
        Self::with_store(size, num_obstacles, num_patterns, Self::DEFAULT_STORE)
    }

    pub fn with_store(
        size: i32,
        num_obstacles: usize,
        num_patterns: usize,
        store_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            size,
            num_obstacles,
            num_patterns,
            store_path: store_path.into(),
            patterns: None,
            index: 0,
        }
    }

    /// Yield the next interior layout. Cycles `patterns[index]` with a
    /// post-increment modulo `num_patterns`, loading or generating the pool
    /// on first use.
    pub fn next_pattern(&mut self, rng: &mut impl Rng) -> HashSet<Position> {
        if self.num_patterns == 0 {
            return self.generate_pattern(rng);
        }

        if self.patterns.is_none() {
            self.patterns = Some(self.load_or_create(rng));
        }

        let patterns = self.patterns.as_ref().unwrap();
        let selected = patterns[self.index].iter().copied().collect();
        self.index = (self.index + 1) % self.num_patterns;
        selected
    }

    /// Rejection-sample `num_obstacles` distinct cells at least two cells
    /// away from every edge.
    fn generate_pattern(&self, rng: &mut impl Rng) -> HashSet<Position> {
        let mut pattern = HashSet::new();
        let margin = 2;
        while pattern.len() < self.num_obstacles {
            let x = rng.random_range(margin..self.size - margin - 1);
            let y = rng.random_range(margin..self.size - margin - 1);
            pattern.insert(Position::new(x, y));
        }
        pattern
    }

    fn load_or_create(&self, rng: &mut impl Rng) -> Vec<Vec<Position>> {
        if self.store_path.exists() {
            match Self::load(&self.store_path) {
                Ok(patterns) if patterns.len() >= self.num_patterns => return patterns,
                Ok(patterns) => {
                    tracing::warn!(
                        found = patterns.len(),
                        expected = self.num_patterns,
                        "Pattern store holds too few patterns, regenerating"
                    );
                }
                Err(err) => {
                    tracing::warn!(%err, "Failed to load pattern store, regenerating");
                }
            }
        }

        let patterns: Vec<Vec<Position>> = (0..self.num_patterns)
            .map(|_| {
                let mut cells: Vec<Position> = self.generate_pattern(rng).into_iter().collect();
                cells.sort();
                cells
            })
            .collect();

        // Persistence failure only loses cross-run reproducibility; the
        // in-memory pool keeps the run going.
        if let Err(err) = self.save(&patterns) {
            tracing::warn!(%err, path = %self.store_path.display(), "Failed to save obstacle patterns");
        } else {
            tracing::info!(
                count = patterns.len(),
                path = %self.store_path.display(),
                "Saved obstacle patterns"
            );
        }

        patterns
    }

    fn save(&self, patterns: &[Vec<Position>]) -> Result<(), Box<dyn std::error::Error>> {
        let pairs: Vec<Vec<[i32; 2]>> = patterns
            .iter()
            .map(|p| p.iter().map(|&pos| pos.into()).collect())
            .collect();
        if let Some(parent) = self.store_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.store_path, serde_json::to_string(&pairs)?)?;
        Ok(())
    }

    fn load(path: &Path) -> Result<Vec<Vec<Position>>, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let pairs: Vec<Vec<[i32; 2]>> = serde_json::from_str(&contents)?;
        Ok(pairs
            .into_iter()
            .map(|p| p.into_iter().map(Position::from).collect())
            .collect())
    }
}
