//! Production and queue resolution for the Nebula simulation.
//!
//! Every function here is pure with respect to its inputs: given a planet
//! and an elapsed time it computes what changes, and the `accrue` /
//! `resolve_*` helpers apply exactly that to the value they are handed.
//!
//! # Modules
//!
//! - [`production`] -- Energy balance, hourly rates, storage capacity, and
//!   carry-exact accrual with overflow reporting.
//! - [`cost`] -- Upgrade curves and unit prices.
//! - [`queue`] -- Queue completion, build and research durations, and
//!   queue chaining.
//! - [`error`] -- Error types for spending resources.

pub mod cost;
pub mod error;
pub mod production;
pub mod queue;

pub use cost::{building_cost, deduct, defense_cost, level_cost, research_cost, ship_cost};
pub use error::EconomyError;
pub use production::{
    HOUR_MS, ProductionContext, ProductionOutcome, ProductionReport, accrue, apply_production,
    energy_consumption, energy_production, energy_ratio, offline_efficiency,
    production_for_period, production_report, storage_capacity,
};
pub use queue::{
    CompletedWork, QueuePartition, QueueRequest, can_start_next, enqueue, partition_completed,
    remaining_time, resolve_planet_queue, resolve_research_queue,
};
