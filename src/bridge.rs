//! Real-time bridge between the continuous world's event stream and the
//! discrete grid simulator.
//!
//! The bridge consumes line-delimited JSON events, quantizes entity
//! positions into grid cells, asks the policy for an action, and converts
//! the discrete decision back into a continuous motion command. Output
//! lines echo the updated agents and targets arrays every tick.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::env::GridSim;
use crate::events::{Drawable, Event, SessionSetup};
use crate::policy::{ActionPolicy, GreedyPolicy};
use crate::trajectory::TrajectoryLog;
use crate::types::{Position, clamp_position};

/// Multiplier from an entity's per-tick speed to the emitted displacement.
const SPEED_SCALE: f64 = 5.0;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("output stream error: {0}")]
    Output(#[from] std::io::Error),
    #[error("output encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Minimum interval between policy decisions; ticks inside the window
    /// only re-emit state.
    pub delay_interval: Duration,
    /// Number of episodes recorded into the evaluation trajectory log.
    pub eval_episodes: usize,
    /// Root directory for evaluation output.
    pub eval_root: PathBuf,
    /// Experiment folder under the evaluation root.
    pub eval_folder: String,
    /// Seed for the initial (and rejoin) entity placement.
    pub placement_seed: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            delay_interval: Duration::ZERO,
            eval_episodes: 100,
            eval_root: PathBuf::from("evaluations"),
            eval_folder: "live_experiment".to_string(),
            placement_seed: 42,
        }
    }
}

/// Pixel-to-cell scale factors derived once from the session geometry.
#[derive(Debug, Clone, Copy)]
struct CellGeometry {
    cell_width: f64,
    cell_height: f64,
    cols: i32,
    eval_mode: bool,
}

/// Per-connection state, created lazily on the first observed agent entity
/// and alive until end of stream.
struct BridgeSession {
    sim: GridSim,
    policy: Box<dyn ActionPolicy>,
    rng: StdRng,
    last_decision: Option<Instant>,
    trajectory: TrajectoryLog,
    episode: usize,
    rejoined: bool,
}

impl BridgeSession {
    fn new(cols: i32, seed: u64) -> Self {
        Self {
            sim: GridSim::for_bridge(cols),
            policy: Box::new(GreedyPolicy),
            rng: StdRng::seed_from_u64(seed),
            last_decision: None,
            trajectory: TrajectoryLog::new(),
            episode: 0,
            rejoined: false,
        }
    }

    fn decision_due(&self, delay: Duration) -> bool {
        match self.last_decision {
            None => true,
            Some(at) => at.elapsed() >= delay,
        }
    }

    /// Sample fresh agent and target cells from the interior, obstacle-free
    /// and distinct.
    fn sample_placement(&mut self) -> (Position, Position) {
        let size = self.sim.size();
        let agent = loop {
            let pos = Position::new(
                self.rng.random_range(1..size - 2),
                self.rng.random_range(1..size - 2),
            );
            if !self.sim.obstacles().contains(&pos) {
                break pos;
            }
        };
        let target = loop {
            let pos = Position::new(
                self.rng.random_range(1..size - 2),
                self.rng.random_range(1..size - 2),
            );
            if !self.sim.obstacles().contains(&pos) && pos != agent {
                break pos;
            }
        };
        (agent, target)
    }
}

/// Event-stream driver for one live connection.
pub struct Bridge<W: Write> {
    config: BridgeConfig,
    geometry: Option<CellGeometry>,
    session: Option<BridgeSession>,
    out: W,
}

impl<W: Write> Bridge<W> {
    pub fn new(config: BridgeConfig, out: W) -> Self {
        Self {
            config,
            geometry: None,
            session: None,
            out,
        }
    }

    /// Synchronous pull loop over the input stream. Malformed lines are
    /// reported and skipped; end of input is the only termination.
    pub fn run(&mut self, reader: impl BufRead) -> Result<(), BridgeError> {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(&line) {
                Ok(event) => self.handle_event(event)?,
                Err(err) => {
                    tracing::error!(%err, "Invalid JSON data received, skipping line");
                }
            }
        }
        tracing::info!("Event stream closed");
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) -> Result<(), BridgeError> {
        match event {
            Event::OneTimeData(setup) => {
                self.apply_setup(setup);
                Ok(())
            }
            Event::Drawables(drawables) => self.handle_tick(drawables),
        }
    }

    fn apply_setup(&mut self, setup: SessionSetup) {
        let geometry = CellGeometry {
            cell_width: setup.game_bounds_dimensions.width
                / setup.path_grid_dimensions.cols as f64,
            cell_height: setup.game_bounds_dimensions.height
                / setup.path_grid_dimensions.rows as f64,
            cols: setup.path_grid_dimensions.cols,
            eval_mode: setup.eval_mode,
        };
        tracing::info!(
            cell_width = geometry.cell_width,
            cell_height = geometry.cell_height,
            cols = geometry.cols,
            eval_mode = geometry.eval_mode,
            "Session geometry established"
        );
        self.geometry = Some(geometry);
    }

    fn handle_tick(&mut self, drawables: Vec<Drawable>) -> Result<(), BridgeError> {
        let mut agents: Vec<Drawable> = Vec::new();
        let mut targets: Vec<Drawable> = Vec::new();
        for drawable in drawables {
            if drawable.is_agent() {
                agents.push(drawable);
            } else if drawable.is_player() {
                targets.push(drawable);
            }
        }

        // A tick before the session geometry is known cannot be quantized;
        // pass the entities through untouched.
        let Some(geometry) = self.geometry else {
            return self.echo(&agents, &targets);
        };

        for agent in &mut agents {
            agent.update_cell(geometry.cell_width, geometry.cell_height);
        }
        for target in &mut targets {
            target.update_cell(geometry.cell_width, geometry.cell_height);
        }

        if !agents.is_empty() && self.session.is_none() {
            let mut session = BridgeSession::new(geometry.cols, self.config.placement_seed);
            let (agent_cell, target_cell) = session.sample_placement();
            agents[0].place_at_cell(agent_cell, geometry.cell_width, geometry.cell_height);
            agents[0].update_cell(geometry.cell_width, geometry.cell_height);
            session.sim.set_positions(agent_cell, target_cell);
            tracing::info!(?agent_cell, "Bridge session created");
            self.session = Some(session);
        }

        if !agents.is_empty() && !targets.is_empty() {
            self.drive(&mut agents, &mut targets, geometry);
        } else if geometry.eval_mode
            && let Some(session) = self.session.as_mut()
        {
            // The external player left mid-session; the next complete tick
            // re-seeds the placement.
            session.rejoined = true;
        }

        self.echo(&agents, &targets)
    }

    /// One decision tick: inject quantized positions, consult the policy,
    /// and either emit a motion command or (in eval mode) re-randomize the
    /// episode.
    fn drive(&mut self, agents: &mut [Drawable], targets: &mut [Drawable], geometry: CellGeometry) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let agent_cell = Position::new(
            agents[0].cell_x.unwrap_or(0),
            agents[0].cell_y.unwrap_or(0),
        );
        let target_cell = Position::new(
            targets[0].cell_x.unwrap_or(0),
            targets[0].cell_y.unwrap_or(0),
        );
        session.sim.set_positions(agent_cell, target_cell);

        if !session.decision_due(self.config.delay_interval) {
            return;
        }

        let observation = session.sim.observe();
        let action = session.policy.select_action(&observation);
        let terminated = session.sim.live_step();

        if !terminated && !session.rejoined {
            let next_cell = clamp_position(action.apply(agent_cell), 0, session.sim.size() - 1);
            apply_motion(&mut agents[0], next_cell, geometry);
        } else if geometry.eval_mode {
            if session.rejoined {
                session.rejoined = false;
                session.rng = StdRng::seed_from_u64(self.config.placement_seed);
                let (agent_cell, target_cell) = session.sample_placement();
                agents[0].place_at_cell(agent_cell, geometry.cell_width, geometry.cell_height);
                targets[0].place_at_cell(target_cell, geometry.cell_width, geometry.cell_height);
                agents[0].update_cell(geometry.cell_width, geometry.cell_height);
                targets[0].update_cell(geometry.cell_width, geometry.cell_height);
            } else {
                let (agent_cell, target_cell) = session.sample_placement();
                agents[0].place_at_cell(agent_cell, geometry.cell_width, geometry.cell_height);
                targets[0].place_at_cell(target_cell, geometry.cell_width, geometry.cell_height);
            }
        }

        session.last_decision = Some(Instant::now());

        if session.episode < self.config.eval_episodes {
            if let (Some(x), Some(y)) = (agents[0].cell_x, agents[0].cell_y) {
                session.trajectory.record(session.episode, Position::new(x, y));
            }

            if session.episode == self.config.eval_episodes - 1 {
                match session.trajectory.save(
                    &self.config.eval_root,
                    &self.config.eval_folder,
                    geometry.cols,
                ) {
                    Ok(path) => tracing::debug!(path = %path.display(), "Saved trajectory log"),
                    Err(err) => tracing::warn!(%err, "Failed to save trajectory log"),
                }
            }
        }

        if terminated {
            session.episode += 1;
            tracing::info!(episode = session.episode, "Episode finished");
        }
    }

    fn echo(&mut self, agents: &[Drawable], targets: &[Drawable]) -> Result<(), BridgeError> {
        let agents_line = serde_json::to_string(agents)?;
        let targets_line = serde_json::to_string(targets)?;
        writeln!(self.out, "{agents_line}")?;
        writeln!(self.out, "{targets_line}")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Move the agent drawable toward the center of `next_cell` by its speed
/// along the L1-normalized direction vector.
fn apply_motion(agent: &mut Drawable, next_cell: Position, geometry: CellGeometry) {
    let target_x = next_cell.x as f64 * geometry.cell_width + geometry.cell_width / 2.0;
    let target_y = next_cell.y as f64 * geometry.cell_height + geometry.cell_height / 2.0;

    let delta_x = target_x - agent.center_x();
    let delta_y = target_y - agent.center_y();
    let distance = delta_x.abs() + delta_y.abs();

    let (step_x, step_y) = if distance != 0.0 {
        (delta_x / distance, delta_y / distance)
    } else {
        (0.0, 0.0)
    };

    agent.top_left_x += step_x * agent.speed * SPEED_SCALE;
    agent.top_left_y += step_y * agent.speed * SPEED_SCALE;
}
