//! Time source, scheduling, and tick orchestration for the Nebula simulation.
//!
//! This crate owns the heartbeat that advances the game state: each tick
//! runs Economy, Missions, NPCs, and the Scheduler in that order over a
//! single [`GameState`].
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `nebula-config.yaml` into
//!   strongly-typed structs.
//! - [`time_source`] -- Bounded deltas and catch-up banking.
//! - [`scheduler`] -- Interval jobs with independent timing.
//! - [`dirty`] -- Dirty-state hints gating recomputation.
//! - [`compute`] -- Battle math on a separate worker thread with timeouts.
//! - [`state`] -- The game-state aggregate.
//! - [`progression`] -- Achievement and diplomacy-cleanup jobs.
//! - [`tick`] -- The per-tick phases.
//! - [`orchestrator`] -- Service ownership, lifecycle, and tick sequencing.
//! - [`operator`] -- Pause, resume, and stop controls.
//! - [`runner`] -- The heartbeat and catch-up loops.

pub mod compute;
pub mod config;
pub mod dirty;
pub mod operator;
pub mod orchestrator;
pub mod progression;
pub mod runner;
pub mod scheduler;
pub mod state;
pub mod tick;
pub mod time_source;

pub use compute::{ComputeError, ComputeUnit};
pub use config::{ConfigError, GameConfig};
pub use dirty::DirtyFlags;
pub use operator::{OperatorState, RunEndReason};
pub use orchestrator::Orchestrator;
pub use runner::{
    Clock, ManualClock, NoOpCallback, RunResult, RunSettings, RunnerError, SystemClock,
    TickCallback, log_run_end, run_engine,
};
pub use state::GameState;
pub use tick::{TickContext, TickError, TickSummary};
pub use time_source::TimeSource;
