use std::env;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use dotenv::dotenv;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use gridbot::bridge::{Bridge, BridgeConfig};

fn get_env_var_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|val| val.parse::<u64>().ok())
}

fn get_env_var_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|val| val.parse::<usize>().ok())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridbot=debug,info"));

    // stdout carries the protocol, so all diagnostics go to stderr.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    let defaults = BridgeConfig::default();
    let config = BridgeConfig {
        delay_interval: Duration::from_millis(get_env_var_u64("GRIDBOT_DELAY_MS").unwrap_or(0)),
        eval_episodes: get_env_var_usize("GRIDBOT_EVAL_EPISODES")
            .unwrap_or(defaults.eval_episodes),
        eval_root: env::var("GRIDBOT_EVAL_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.eval_root),
        eval_folder: env::var("GRIDBOT_EVAL_FOLDER").unwrap_or(defaults.eval_folder),
        placement_seed: get_env_var_u64("GRIDBOT_SEED").unwrap_or(defaults.placement_seed),
    };

    tracing::info!(?config, "Starting bridge");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut bridge = Bridge::new(config, stdout.lock());
    bridge.run(stdin.lock())?;

    Ok(())
}
