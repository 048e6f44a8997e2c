//! Grid navigation environment - episode generation, action application,
//! reward shaping, and termination/truncation rules.

use std::collections::HashSet;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::encoder::ObsEncoding;
use crate::pathfinding::AStar;
use crate::patterns::PatternLibrary;
use crate::target::TargetMotion;
use crate::types::{Action, Position, clamp_position};

/// Environment configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Side length of the square grid
    pub size: i32,
    /// Interior obstacles per layout; 0 switches distances to plain Manhattan
    pub num_obstacles: usize,
    /// Layout pool size; 0 draws a fresh layout every reset
    pub num_patterns: usize,
    /// Target movement strategy
    pub target_motion: TargetMotion,
    /// Per-step distance shaping on/off
    pub dense_rewards: bool,
    /// Observation encoding handed to the policy
    pub encoding: ObsEncoding,
    /// Step limit before truncation
    pub max_steps: u32,
    /// Obstacle pattern store location
    pub pattern_store: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            size: 10,
            num_obstacles: 15,
            num_patterns: 10,
            target_motion: TargetMotion::Static,
            dense_rewards: true,
            encoding: ObsEncoding::Image,
            max_steps: 100,
            pattern_store: PathBuf::from(PatternLibrary::DEFAULT_STORE),
        }
    }
}

/// Additional information returned with every observation
#[derive(Debug, Clone, Copy)]
pub struct StepInfo {
    /// Distance to the target under the active metric (Manhattan without
    /// obstacles, shortest-path length with them)
    pub distance: i32,
    /// Moves so far that increased the distance or hit an obstacle
    pub wrong_steps: u32,
}

/// Step result from the environment
#[derive(Debug, Clone)]
pub struct StepResult {
    pub observation: Vec<u8>,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

/// Deterministic discrete-grid navigation simulator.
///
/// `reset` builds an episode (obstacle layout plus mutually reachable agent
/// and target placements), `step` applies one agent action. The bridge
/// drives the same simulator through `set_positions`/`observe`/`live_step`
/// with positions quantized from the continuous world.
pub struct GridSim {
    config: SimConfig,
    patterns: PatternLibrary,
    obstacles: HashSet<Position>,
    agent: Position,
    target: Position,
    step_count: u32,
    wrong_steps: u32,
    rng: StdRng,
}

impl GridSim {
    pub fn new(config: SimConfig) -> Self {
        let patterns = PatternLibrary::with_store(
            config.size,
            config.num_obstacles,
            config.num_patterns,
            config.pattern_store.clone(),
        );
        Self {
            config,
            patterns,
            obstacles: HashSet::new(),
            agent: Position::new(1, 1),
            target: Position::new(1, 2),
            step_count: 0,
            wrong_steps: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Simulator flavor owned by the realtime bridge: border-ring obstacles
    /// only, flat observations, positions injected from the live world.
    pub fn for_bridge(size: i32) -> Self {
        let config = SimConfig {
            size,
            num_obstacles: 0,
            num_patterns: 0,
            dense_rewards: false,
            encoding: ObsEncoding::Flat,
            ..SimConfig::default()
        };
        let mut sim = Self::new(config);
        sim.obstacles = border_ring(size);
        sim
    }

    /// Start a new episode. A seed reseeds the simulator RNG first, making
    /// the episode sequence reproducible.
    pub fn reset(&mut self, seed: Option<u64>) -> (Vec<u8>, StepInfo) {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }

        self.step_count = 0;
        self.wrong_steps = 0;

        let interior = self.patterns.next_pattern(&mut self.rng);
        self.obstacles = interior;
        self.obstacles.extend(border_ring(self.config.size));

        // Resample until agent and target are free, distinct, and mutually
        // reachable. A fully disconnected layout is a configuration error;
        // the loop does not guard against it.
        loop {
            self.agent = self.sample_interior_cell(None);
            self.target = self.sample_interior_cell(Some(self.agent));
            if self.config.num_obstacles == 0
                || AStar::find_path(self.config.size, &self.obstacles, self.agent, self.target)
                    .is_some()
            {
                break;
            }
        }

        tracing::debug!(
            agent = ?self.agent,
            target = ?self.target,
            obstacles = self.obstacles.len(),
            "Episode reset"
        );

        (self.observe(), self.info())
    }

    /// Apply one agent action and advance the episode.
    pub fn step(&mut self, action: Action) -> StepResult {
        self.step_count += 1;

        let mut terminated = false;
        let mut reward = 0.0_f32;

        let distance_before = self.distance_from(self.agent);
        let candidate = clamp_position(action.apply(self.agent), 0, self.config.size - 1);
        let distance_after = self.distance_from(candidate);

        if self.config.dense_rewards {
            if distance_after < distance_before {
                reward = 0.01;
            } else if distance_after > distance_before {
                reward = -0.02;
            }
        }

        if distance_after > distance_before {
            self.wrong_steps += 1;
        }

        if self.config.target_motion.is_moving() {
            let new_target = self.config.target_motion.next_position(
                self.target,
                self.agent,
                self.config.size,
                &mut self.rng,
            );
            // Position swap counts as a catch even though the cells never
            // coincide on any single tick.
            if candidate == self.target && new_target == self.agent {
                terminated = true;
                reward = self.terminal_reward();
            }
            self.target = new_target;
        }

        if candidate == self.target {
            terminated = true;
            reward = self.terminal_reward();
        }

        if self.obstacles.contains(&candidate) {
            terminated = true;
            reward = 0.0;
            self.wrong_steps += 1;
        }

        self.agent = candidate;

        let mut truncated = false;
        if self.step_count >= self.config.max_steps {
            truncated = true;
            reward = -1.0;
        }

        StepResult {
            observation: self.observe(),
            reward,
            terminated,
            truncated,
            info: self.info(),
        }
    }

    /// Inject quantized world positions (bridge sessions).
    pub fn set_positions(&mut self, agent: Position, target: Position) {
        self.agent = agent;
        self.target = target;
    }

    /// Render the current state for the policy.
    pub fn observe(&self) -> Vec<u8> {
        self.config
            .encoding
            .encode(self.config.size, self.agent, self.target, &self.obstacles)
    }

    /// Live-session termination check: the world moves the agent, the
    /// simulator only detects arrival.
    pub fn live_step(&self) -> bool {
        self.agent == self.target
    }

    pub fn agent(&self) -> Position {
        self.agent
    }

    pub fn target(&self) -> Position {
        self.target
    }

    pub fn obstacles(&self) -> &HashSet<Position> {
        &self.obstacles
    }

    pub fn size(&self) -> i32 {
        self.config.size
    }

    pub fn wrong_steps(&self) -> u32 {
        self.wrong_steps
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    fn info(&self) -> StepInfo {
        StepInfo {
            distance: self.distance_from(self.agent),
            wrong_steps: self.wrong_steps,
        }
    }

    fn terminal_reward(&self) -> f32 {
        1.0 - 0.9 * (self.step_count as f32 / self.config.max_steps as f32)
    }

    /// Distance from `from` to the target under the active metric. An
    /// unreachable target maps to `i32::MAX`; that only happens when `from`
    /// is an enclosed obstacle cell, and the collision override decides the
    /// step outcome before the sentinel matters.
    fn distance_from(&self, from: Position) -> i32 {
        if self.config.num_obstacles == 0 {
            from.distance(&self.target)
        } else {
            AStar::find_path(self.config.size, &self.obstacles, from, self.target)
                .map_or(i32::MAX, |path| path.len() as i32)
        }
    }

    fn sample_interior_cell(&mut self, exclude: Option<Position>) -> Position {
        loop {
            let x = self.rng.random_range(1..self.config.size - 2);
            let y = self.rng.random_range(1..self.config.size - 2);
            let pos = Position::new(x, y);
            if !self.obstacles.contains(&pos) && Some(pos) != exclude {
                return pos;
            }
        }
    }

    #[cfg(test)]
    fn set_obstacles(&mut self, obstacles: HashSet<Position>) {
        self.obstacles = obstacles;
    }
}

fn border_ring(size: i32) -> HashSet<Position> {
    let mut ring = HashSet::new();
    for i in 0..size {
        ring.insert(Position::new(i, 0));
        ring.insert(Position::new(i, size - 1));
        ring.insert(Position::new(0, i));
        ring.insert(Position::new(size - 1, i));
    }
    ring
}
