//! Shared type definitions for the Nebula simulation.
//!
//! This crate is the single source of truth for the entity model used by
//! every other crate in the workspace. Snapshot types derive `ts-rs` so a
//! UI can consume immutable copies of engine state.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Resources, buildings, technologies, units, mission kinds
//! - [`resources`] -- [`Resources`] bundles and unit-count map helpers
//! - [`structs`] -- Planets, queues, missions, reports, factions
//! - [`data`] -- Static unit stats and cost curves
//! - [`math`] -- Float/integer conversion helpers

pub mod data;
pub mod enums;
pub mod ids;
pub mod math;
pub mod resources;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    BattleWinner, BuildingType, DefenseType, DifficultyTier, DiplomaticEventKind,
    DispatchRejection, ExpeditionOutcome, MissionFailReason, MissionKind, MissionStatus,
    QueueItemKind, RelationStatus, ResourceKind, Severity, ShipType, TechnologyType,
};
pub use ids::{MissionId, NpcId, PlanetId, PlayerId, QueueItemId, ReportId, RequestId};
pub use resources::Resources;
pub use structs::{
    BattleResult, Coordinate, DebrisField, Defenses, DiplomaticEvent, Fleet, FleetMission,
    MissionReport, MissionReportDetails, Notification, Npc, OfficerBonuses, Owner, Planet,
    Player, ProductionCarry, QueueItem, QueueTarget, Relation, RelationChange, RelationReason,
    RoundDetail, SpyReport, TechLevels, tech_level,
};

#[cfg(test)]
mod tests {
    //! Binding generation for snapshot types.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::PlanetId::export_all();
        let _ = crate::ids::PlayerId::export_all();
        let _ = crate::ids::NpcId::export_all();
        let _ = crate::ids::MissionId::export_all();
        let _ = crate::ids::ReportId::export_all();

        // Enums
        let _ = crate::enums::ResourceKind::export_all();
        let _ = crate::enums::MissionKind::export_all();
        let _ = crate::enums::MissionStatus::export_all();
        let _ = crate::enums::RelationStatus::export_all();
        let _ = crate::enums::Severity::export_all();

        // Structs
        let _ = crate::resources::Resources::export_all();
        let _ = crate::structs::Planet::export_all();
        let _ = crate::structs::FleetMission::export_all();
        let _ = crate::structs::BattleResult::export_all();
        let _ = crate::structs::MissionReport::export_all();
        let _ = crate::structs::SpyReport::export_all();
        let _ = crate::structs::Npc::export_all();
        let _ = crate::structs::Player::export_all();
        let _ = crate::structs::Notification::export_all();
    }
}
