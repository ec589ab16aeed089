//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the run so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: nebula_core::config::ConfigError,
    },

    /// Universe seeding failed.
    #[error("seed error: {source}")]
    Seed {
        /// The underlying seeding error.
        #[from]
        source: crate::seed::SeedError,
    },

    /// The compute unit could not start.
    #[error("compute error: {source}")]
    Compute {
        /// The underlying compute error.
        #[from]
        source: nebula_core::compute::ComputeError,
    },

    /// The orchestrator refused to start.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: nebula_core::tick::TickError,
    },

    /// The heartbeat failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: nebula_core::runner::RunnerError,
    },
}
