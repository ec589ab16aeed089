//! Core entity structs for the Nebula simulation.
//!
//! Entities are plain data. All behavior lives in the subsystem crates
//! (`nebula-economy`, `nebula-fleet`, `nebula-npc`) and the orchestrator in
//! `nebula-core`, which own the rules for mutating them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    BattleWinner, BuildingType, DefenseType, DifficultyTier, DiplomaticEventKind,
    ExpeditionOutcome, MissionFailReason, MissionKind, MissionStatus, QueueItemKind,
    RelationStatus, Severity, ShipType, TechnologyType,
};
use crate::ids::{MissionId, NpcId, PlanetId, PlayerId, QueueItemId, ReportId};
use crate::resources::Resources;

/// Ship counts keyed by type. Zero entries are omitted.
pub type Fleet = BTreeMap<ShipType, u64>;

/// Defense counts keyed by type. Zero entries are omitted.
pub type Defenses = BTreeMap<DefenseType, u64>;

/// Technology levels keyed by type. Absent means level 0.
pub type TechLevels = BTreeMap<TechnologyType, u32>;

/// Level of `tech` in `levels`, zero when never researched.
pub fn tech_level(levels: &TechLevels, tech: TechnologyType) -> u32 {
    levels.get(&tech).copied().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Coordinates and ownership
// ---------------------------------------------------------------------------

/// A position in the shared universe: galaxy, solar system, and slot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct Coordinate {
    /// Galaxy number (1-based).
    pub galaxy: u32,
    /// Solar system within the galaxy (1-based).
    pub system: u32,
    /// Slot within the solar system (1-based).
    pub position: u32,
}

impl Coordinate {
    /// Create a coordinate.
    pub const fn new(galaxy: u32, system: u32, position: u32) -> Self {
        Self {
            galaxy,
            system,
            position,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}:{}]", self.galaxy, self.system, self.position)
    }
}

/// Who owns a planet or a fleet mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Owner {
    /// The human player.
    Player(PlayerId),
    /// An autonomous faction.
    Npc(NpcId),
}

impl Owner {
    /// The NPC id, if an NPC owns this.
    pub const fn npc(self) -> Option<NpcId> {
        match self {
            Self::Npc(id) => Some(id),
            Self::Player(_) => None,
        }
    }

    /// Whether the human player owns this.
    pub const fn is_player(self) -> bool {
        matches!(self, Self::Player(_))
    }
}

// ---------------------------------------------------------------------------
// Planets and queues
// ---------------------------------------------------------------------------

/// What a queue item produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum QueueTarget {
    /// A building (for `Building` and `Demolish` items).
    Building(BuildingType),
    /// A technology.
    Technology(TechnologyType),
    /// A ship type.
    Ship(ShipType),
    /// A defense type.
    Defense(DefenseType),
}

/// One entry of a build, research, shipyard, or demolish queue.
///
/// Invariant: `end_time >= start_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QueueItem {
    /// Unique id.
    pub id: QueueItemId,
    /// What kind of work this is.
    pub kind: QueueItemKind,
    /// What is being produced.
    pub target: QueueTarget,
    /// Explicit resulting level for buildings and technologies. When
    /// absent the current level is incremented.
    pub target_level: Option<u32>,
    /// Unit count for ships and defenses. Zero is treated as one.
    pub quantity: u64,
    /// Start timestamp (ms).
    pub start_time: u64,
    /// Completion timestamp (ms).
    pub end_time: u64,
}

/// Sub-unit production carried between ticks, in unit-milliseconds of an
/// hourly rate (a full unit is `3_600_000`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProductionCarry {
    /// Metal remainder.
    pub metal: u64,
    /// Crystal remainder.
    pub crystal: u64,
    /// Deuterium remainder.
    pub deuterium: u64,
    /// Dark matter remainder.
    pub dark_matter: u64,
    /// Remainder of deuterium burned by fusion reactors.
    pub deuterium_drain: u64,
}

/// A planet or moon.
///
/// Invariant: every stocked resource stays within the storage capacity
/// computed from the planet's buildings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Planet {
    /// Unique id.
    pub id: PlanetId,
    /// Display name.
    pub name: String,
    /// Owner of the planet.
    pub owner: Owner,
    /// Position in the universe.
    pub coordinate: Coordinate,
    /// Current resource stock.
    pub resources: Resources,
    /// Building levels. Absent means level 0.
    pub buildings: BTreeMap<BuildingType, u32>,
    /// Stationed ships.
    pub fleet: Fleet,
    /// Built defenses.
    pub defenses: Defenses,
    /// Ordered build queue (buildings, demolitions, ships, defenses).
    pub build_queue: Vec<QueueItem>,
    /// Timestamp (ms) of the last production update.
    pub last_update: u64,
    /// Fractional production not yet credited.
    #[serde(default)]
    pub production_carry: ProductionCarry,
    /// Usable building fields.
    pub max_space: u32,
    /// Maximum number of ships that may be stationed.
    pub fleet_storage: u64,
    /// Maximum surface temperature; drives deuterium output.
    pub max_temperature: i32,
    /// Whether this is a moon.
    pub is_moon: bool,
    /// Parent planet for moons.
    pub parent_planet: Option<PlanetId>,
}

impl Planet {
    /// Level of `building`, zero when never built.
    pub fn building_level(&self, building: BuildingType) -> u32 {
        self.buildings.get(&building).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

/// A timed fleet dispatch.
///
/// Invariants: `arrival_time >= departure_time`; when present,
/// `return_time >= arrival_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FleetMission {
    /// Unique id.
    pub id: MissionId,
    /// Who sent the fleet.
    pub owner: Owner,
    /// Planet the fleet left from and returns to.
    pub origin_planet: PlanetId,
    /// Destination coordinate.
    pub target: Coordinate,
    /// Planet resolved at the destination when dispatched, if any.
    pub target_planet: Option<PlanetId>,
    /// Whether the destination is a moon.
    pub target_is_moon: bool,
    /// What happens on arrival.
    pub kind: MissionKind,
    /// Ships in flight. Zero entries are omitted.
    pub fleet: Fleet,
    /// Resources carried.
    pub cargo: Resources,
    /// Departure timestamp (ms).
    pub departure_time: u64,
    /// Arrival timestamp (ms).
    pub arrival_time: u64,
    /// Return timestamp (ms), absent for one-way trips.
    pub return_time: Option<u64>,
    /// Current lifecycle phase.
    pub status: MissionStatus,
}

/// Debris left behind after combat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DebrisField {
    /// Where the debris floats.
    pub coordinate: Coordinate,
    /// Salvageable metal and crystal.
    pub resources: Resources,
    /// Creation timestamp (ms).
    pub created_at: u64,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Losses inflicted during one combat round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoundDetail {
    /// Round number (1-based).
    pub round: u32,
    /// Attacker ships destroyed this round.
    pub attacker_losses: Fleet,
    /// Defender ships destroyed this round.
    pub defender_ship_losses: Fleet,
    /// Defender defenses destroyed this round.
    pub defender_defense_losses: Defenses,
    /// Damage dealt by the attacker after shields.
    pub attacker_damage: u64,
    /// Damage dealt by the defender after shields.
    pub defender_damage: u64,
}

/// Immutable record of a resolved battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BattleResult {
    /// Unique id.
    pub id: ReportId,
    /// Battle timestamp (ms).
    pub timestamp: u64,
    /// Where the battle happened.
    pub coordinate: Coordinate,
    /// Attacking side.
    pub attacker: Owner,
    /// Defending side.
    pub defender: Owner,
    /// Planet the attack was launched from.
    pub attacker_planet: PlanetId,
    /// Planet that was attacked.
    pub defender_planet: PlanetId,
    /// Attacking fleet before combat.
    pub attacker_fleet: Fleet,
    /// Defending fleet before combat.
    pub defender_fleet: Fleet,
    /// Defenses before combat.
    pub defender_defenses: Defenses,
    /// Per-round breakdown.
    pub rounds: Vec<RoundDetail>,
    /// Attacker ships lost.
    pub attacker_losses: Fleet,
    /// Defender ships lost.
    pub defender_ship_losses: Fleet,
    /// Defender defenses lost (before repair).
    pub defender_defense_losses: Defenses,
    /// Attacker ships left.
    pub attacker_remaining: Fleet,
    /// Defender ships left.
    pub defender_remaining: Fleet,
    /// Defenses left after repair.
    pub defender_defenses_after: Defenses,
    /// Defenses restored by post-battle repair.
    pub repaired_defenses: Defenses,
    /// Who won.
    pub winner: BattleWinner,
    /// Resources taken by the attacker.
    pub plunder: Resources,
    /// Debris created.
    pub debris: Resources,
    /// Probability a moon forms, in `0.0..=0.2`.
    pub moon_chance: f64,
    /// Whether a moon formed.
    pub moon_created: bool,
}

/// Extra data attached to a mission report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MissionReportDetails {
    /// Resources delivered, loaded, or found.
    pub resources: Resources,
    /// Ships found.
    pub fleet_found: Fleet,
    /// Ships lost.
    pub fleet_lost: Fleet,
    /// Planet created, captured, or destroyed.
    pub planet: Option<PlanetId>,
    /// Battle report produced by this mission.
    pub battle: Option<ReportId>,
    /// Expedition event rolled.
    pub expedition: Option<ExpeditionOutcome>,
    /// Destruction chance in percent (destroy missions).
    pub destruction_chance: Option<u32>,
}

/// Outcome record for one mission arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MissionReport {
    /// Unique id.
    pub id: ReportId,
    /// Mission that produced the report.
    pub mission_id: MissionId,
    /// Sender of the mission.
    pub owner: Owner,
    /// Mission kind.
    pub kind: MissionKind,
    /// Arrival timestamp (ms).
    pub timestamp: u64,
    /// Mission origin.
    pub origin_planet: PlanetId,
    /// Mission target.
    pub target: Coordinate,
    /// Whether the arrival effect succeeded.
    pub success: bool,
    /// Reason code when `success` is false.
    pub reason: Option<MissionFailReason>,
    /// Kind-specific data.
    pub details: MissionReportDetails,
}

/// Intelligence gathered by espionage probes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpyReport {
    /// Unique id.
    pub id: ReportId,
    /// Report timestamp (ms).
    pub timestamp: u64,
    /// Who sent the probes.
    pub spy: Owner,
    /// Spied planet.
    pub target_planet: PlanetId,
    /// Spied coordinate.
    pub coordinate: Coordinate,
    /// Resource stock seen.
    pub resources: Resources,
    /// Fleet seen.
    pub fleet: Fleet,
    /// Defenses seen.
    pub defenses: Defenses,
    /// Building levels seen.
    pub buildings: BTreeMap<BuildingType, u32>,
    /// Whether the target noticed the probes.
    pub detected: bool,
}

// ---------------------------------------------------------------------------
// Players, factions, and diplomacy
// ---------------------------------------------------------------------------

/// Percentage bonuses granted by hired officers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OfficerBonuses {
    /// Extra energy production in percent.
    pub energy_production_pct: u32,
    /// Extra storage capacity in percent.
    pub storage_capacity_pct: u32,
    /// Extra dark matter production in percent.
    pub dark_matter_production_pct: u32,
    /// Fuel consumption reduction in percent.
    pub fuel_reduction_pct: u32,
}

/// The human player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Unique id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Researched technology levels (global across planets).
    pub technologies: TechLevels,
    /// Ordered research queue.
    pub research_queue: Vec<QueueItem>,
    /// Owned planets, home planet first.
    pub planets: Vec<PlanetId>,
    /// Officer bonuses.
    pub bonuses: OfficerBonuses,
}

/// Why a reputation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum RelationReason {
    /// The player attacked the NPC.
    Attacked,
    /// The player spied on the NPC.
    Spied,
    /// The player destroyed one of the NPC's planets.
    PlanetDestroyed,
    /// The player sent a gift.
    Gift,
    /// The player completed a trade.
    Trade,
    /// Random attitude swing.
    AttitudeSwing,
    /// The NPC sent aid.
    Aid,
}

/// One entry of a relation's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RelationChange {
    /// When it happened (ms).
    pub timestamp: u64,
    /// Reputation delta applied.
    pub delta: i32,
    /// Why it happened.
    pub reason: RelationReason,
}

/// An NPC's standing with one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Relation {
    /// Reputation score in `-100..=100`.
    pub reputation: i32,
    /// Status derived from reputation.
    pub status: RelationStatus,
    /// Last change timestamp (ms).
    pub last_updated: u64,
    /// Most recent changes, oldest first.
    pub history: Vec<RelationChange>,
}

/// An autonomous faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Npc {
    /// Unique id.
    pub id: NpcId,
    /// Display name.
    pub name: String,
    /// Owned planets.
    pub planets: Vec<PlanetId>,
    /// Researched technology levels.
    pub technologies: TechLevels,
    /// Standing with each player.
    pub relations: BTreeMap<PlayerId, Relation>,
    /// Strength tier.
    pub difficulty: DifficultyTier,
    /// Last spy launch (ms).
    pub last_spy_time: u64,
    /// Last attack launch (ms).
    pub last_attack_time: u64,
    /// The NPC's own fleet missions.
    pub missions: Vec<FleetMission>,
}

/// An emergent diplomatic event raised by NPC behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DiplomaticEvent {
    /// What happened.
    pub kind: DiplomaticEventKind,
    /// Which NPC raised it.
    pub npc_id: NpcId,
    /// When (ms).
    pub timestamp: u64,
    /// Resources offered or sent.
    pub resources: Resources,
    /// New relation status for attitude swings.
    pub new_status: Option<RelationStatus>,
}

/// A user-visible message produced by a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Notification {
    /// When (ms).
    pub timestamp: u64,
    /// How important.
    pub severity: Severity,
    /// Human-readable text.
    pub message: String,
}
