//! Fleet missions and combat for the Nebula simulation.
//!
//! Missions travel `outbound -> returning -> completed`. The state machine
//! in [`resolver`] is pure: it says which side effect is due and the
//! orchestrator applies it once through [`arrival`]. Combat is a plain
//! function of copied inputs so it can run on a separate thread.
//!
//! # Modules
//!
//! - [`travel`] -- Distance, flight time, fuel, and cargo capacity.
//! - [`resolver`] -- Mission state machine and recall.
//! - [`validate`] -- Pre-dispatch checks.
//! - [`dispatch`] -- Launching a fleet from a planet.
//! - [`arrival`] -- Per-kind arrival effects and the return leg.
//! - [`combat`] -- Round-based battle simulation.
//! - [`loot`] -- Plunder, debris, defense repair, and moon chance.
//! - [`error`] -- Dispatch errors.

pub mod arrival;
pub mod combat;
pub mod dispatch;
pub mod error;
pub mod loot;
pub mod resolver;
pub mod travel;
pub mod validate;

pub use arrival::ArrivalOutcome;
pub use combat::{BattleOutcome, BattleRequest, CombatTech, MAX_ROUNDS, simulate_battle};
pub use dispatch::{DispatchRequest, FlightParams, dispatch};
pub use error::MissionError;
pub use loot::{
    DebrisRequest, PlunderRequest, calculate_debris, calculate_plunder, moon_chance,
    repair_defenses, roll_moon,
};
pub use resolver::{MissionResolution, next_event_time, recall, resolve};
pub use travel::{cargo_capacity, distance, flight_time_ms, flight_time_secs, fuel_consumption};
pub use validate::can_execute_mission;
