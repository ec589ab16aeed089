//! Autonomous factions for the Nebula simulation.
//!
//! NPCs own planets, grow on their own, and react to the player according
//! to their reputation. The [`engine`] advances a bounded slice of the
//! population per pass so the cost of a tick does not grow with the number
//! of factions.
//!
//! # Modules
//!
//! - [`relation`] -- Reputation, status thresholds, and player actions.
//! - [`growth`] -- Difficulty tiers, passive income, and instant upgrades.
//! - [`behavior`] -- Spy and attack launches, trade, intel, and aid events.
//! - [`engine`] -- Round-robin slices on independent phase timers.
//! - [`config`] -- Engine tunables.
//! - [`error`] -- Per-NPC errors.

pub mod behavior;
pub mod config;
pub mod engine;
pub mod error;
pub mod growth;
pub mod relation;

pub use behavior::{ActiveMissions, BehaviorContext, act};
pub use config::NpcSettings;
pub use engine::{NpcEngine, NpcTickContext, NpcTickReport, next_slice};
pub use error::NpcError;
pub use growth::{GrowthReport, difficulty_for_distance, grow, npc_income};
pub use relation::{
    PlayerAction, RelationStats, action_delta, adjust, new_relation, record_action,
    relation_stats, status_for, status_toward,
};
