//! Engine binary for the Nebula simulation.
//!
//! Wires the seeded universe, the compute unit, the orchestrator, and the
//! operator controls together, then runs the heartbeat until a stop
//! condition is met.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `nebula-config.yaml`
//! 3. Seed the universe from the configured seed
//! 4. Start the compute unit
//! 5. Create operator state and install the Ctrl-C handler
//! 6. Build and initialize the orchestrator
//! 7. Run the heartbeat
//! 8. Dispose and log the result

mod callback;
mod error;
mod seed;

use std::path::Path;
use std::sync::Arc;

use nebula_core::compute::ComputeUnit;
use nebula_core::config::GameConfig;
use nebula_core::operator::OperatorState;
use nebula_core::orchestrator::Orchestrator;
use nebula_core::runner::{self, RunSettings, SystemClock};
use nebula_core::time_source::now_ms;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::callback::LogCallback;
use crate::error::EngineError;

/// Ticks between status log lines.
const STATUS_EVERY_TICKS: u64 = 60;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the run itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("nebula-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        seed = config.engine.seed,
        game_speed = config.engine.game_speed,
        tick_interval_ms = config.engine.tick_interval_ms,
        npc_count = config.universe.npc_count,
        "Configuration loaded"
    );

    // 3. Seed the universe.
    let mut rng = StdRng::seed_from_u64(config.engine.seed);
    let mut state = seed::seed_universe(&config.universe, now_ms(), &mut rng)
        .map_err(EngineError::from)?;

    // 4. Start the compute unit.
    let compute = ComputeUnit::spawn(&config.compute).map_err(EngineError::from)?;
    info!(timeout_ms = config.compute.timeout_ms, "Compute unit started");

    // 5. Operator state and Ctrl-C.
    let operator = Arc::new(OperatorState::new(config.engine.max_ticks));
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping");
                    operator.request_stop();
                }
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
            }
        });
    }

    // 6. Build the orchestrator.
    let mut orchestrator = Orchestrator::new(&config, compute, Arc::clone(&operator));
    orchestrator.init(now_ms()).map_err(EngineError::from)?;

    // 7. Run.
    let settings = RunSettings {
        tick_interval_ms: config.engine.tick_interval_ms,
        catch_up_interval_ms: config.engine.catch_up_interval_ms,
    };
    let mut callback = LogCallback::new(STATUS_EVERY_TICKS);
    let result = runner::run_engine(
        &mut state,
        &mut orchestrator,
        &operator,
        &SystemClock,
        settings,
        &mut callback,
    )
    .await;

    // 8. Dispose before surfacing any run error.
    orchestrator.dispose();
    let result = result.map_err(EngineError::from)?;
    runner::log_run_end(&result);

    info!(
        planets = state.planets.len(),
        battles = state.battle_reports.len(),
        achievements = state.achievements.len(),
        uptime_secs = operator.elapsed_seconds(),
        "nebula-engine shutdown complete"
    );
    Ok(())
}

/// Load configuration from `nebula-config.yaml`, or defaults if absent.
fn load_config() -> Result<GameConfig, EngineError> {
    let config_path = Path::new("nebula-config.yaml");
    if config_path.exists() {
        let config = GameConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        Ok(GameConfig::default())
    }
}
