//! Enumeration types for the Nebula simulation.
//!
//! Unit, building, and technology enums double as keys into the static
//! data tables in [`crate::data`]. Every enum that keys a count map
//! exposes an `ALL` slice so callers can iterate without relying on map
//! contents.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A resource held in a planet's stock.
///
/// Only metal, crystal, and deuterium are plunderable. Energy is derived
/// from buildings each tick and is never stored by production, carried as
/// cargo, or looted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Basic construction material.
    Metal,
    /// Electronics and alloy material.
    Crystal,
    /// Fuel for fleets and fusion reactors.
    Deuterium,
    /// Rare premium resource; separate, smaller storage.
    DarkMatter,
    /// Derived power balance.
    Energy,
}

impl ResourceKind {
    /// Every resource kind.
    pub const ALL: [Self; 5] = [
        Self::Metal,
        Self::Crystal,
        Self::Deuterium,
        Self::DarkMatter,
        Self::Energy,
    ];

    /// Whether combat plunder may take this resource.
    pub const fn is_plunderable(self) -> bool {
        matches!(self, Self::Metal | Self::Crystal | Self::Deuterium)
    }

    /// Whether a fleet may carry this resource as cargo.
    pub const fn is_transportable(self) -> bool {
        !matches!(self, Self::Energy)
    }
}

// ---------------------------------------------------------------------------
// Buildings and technologies
// ---------------------------------------------------------------------------

/// A building that can be constructed on a planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    /// Produces metal.
    MetalMine,
    /// Produces crystal.
    CrystalMine,
    /// Produces deuterium; output depends on planet temperature.
    DeuteriumSynthesizer,
    /// Produces energy.
    SolarPlant,
    /// Produces energy by burning deuterium.
    FusionReactor,
    /// Speeds up building construction.
    RoboticsFactory,
    /// Halves construction time per level.
    NaniteFactory,
    /// Builds ships and defenses.
    Shipyard,
    /// Speeds up research.
    ResearchLab,
    /// Raises metal capacity.
    MetalStorage,
    /// Raises crystal capacity.
    CrystalStorage,
    /// Raises deuterium capacity.
    DeuteriumTank,
    /// Produces dark matter and raises its capacity.
    DarkMatterCollector,
    /// Adds usable planet space.
    Terraformer,
    /// Adds usable moon space.
    LunarBase,
    /// Scans fleet movements from a moon.
    SensorPhalanx,
    /// Instant fleet transfer between moons.
    JumpGate,
}

impl BuildingType {
    /// Every building type.
    pub const ALL: [Self; 17] = [
        Self::MetalMine,
        Self::CrystalMine,
        Self::DeuteriumSynthesizer,
        Self::SolarPlant,
        Self::FusionReactor,
        Self::RoboticsFactory,
        Self::NaniteFactory,
        Self::Shipyard,
        Self::ResearchLab,
        Self::MetalStorage,
        Self::CrystalStorage,
        Self::DeuteriumTank,
        Self::DarkMatterCollector,
        Self::Terraformer,
        Self::LunarBase,
        Self::SensorPhalanx,
        Self::JumpGate,
    ];
}

/// A technology researched once per player and shared by all planets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum TechnologyType {
    /// Prerequisite for power-related research.
    EnergyTechnology,
    /// Prerequisite for laser weapons.
    LaserTechnology,
    /// Prerequisite for ion weapons.
    IonTechnology,
    /// Prerequisite for hyperspace drives.
    HyperspaceTechnology,
    /// Prerequisite for plasma weapons.
    PlasmaTechnology,
    /// Raises the number of concurrent fleet slots.
    ComputerTechnology,
    /// Improves spy reports.
    EspionageTechnology,
    /// Speeds up combustion-drive ships.
    CombustionDrive,
    /// Speeds up impulse-drive ships.
    ImpulseDrive,
    /// Speeds up hyperspace-drive ships.
    HyperspaceDrive,
    /// +10% weapon damage per level in combat.
    WeaponsTechnology,
    /// +10% shield strength per level in combat.
    ShieldingTechnology,
    /// +10% hull strength per level in combat.
    ArmourTechnology,
    /// Unlocks expeditions and more colonies.
    Astrophysics,
    /// Improves dark matter yield.
    DarkMatterTechnology,
    /// +2% metal production per level.
    MineralResearch,
    /// +2% crystal production per level.
    CrystalResearch,
    /// +2% deuterium production per level.
    FuelResearch,
}

impl TechnologyType {
    /// Every technology type.
    pub const ALL: [Self; 18] = [
        Self::EnergyTechnology,
        Self::LaserTechnology,
        Self::IonTechnology,
        Self::HyperspaceTechnology,
        Self::PlasmaTechnology,
        Self::ComputerTechnology,
        Self::EspionageTechnology,
        Self::CombustionDrive,
        Self::ImpulseDrive,
        Self::HyperspaceDrive,
        Self::WeaponsTechnology,
        Self::ShieldingTechnology,
        Self::ArmourTechnology,
        Self::Astrophysics,
        Self::DarkMatterTechnology,
        Self::MineralResearch,
        Self::CrystalResearch,
        Self::FuelResearch,
    ];
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// A ship type built in the shipyard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ShipType {
    /// Cheap early fighter.
    LightFighter,
    /// Armoured fighter.
    HeavyFighter,
    /// Fast raider.
    Cruiser,
    /// Mainline warship.
    Battleship,
    /// Small transport.
    SmallCargo,
    /// Large transport.
    LargeCargo,
    /// Founds a new colony; consumed on success.
    ColonyShip,
    /// Harvests debris fields.
    Recycler,
    /// Espionage probe.
    EspionageProbe,
    /// Collects dark matter on expeditions.
    DarkMatterHarvester,
    /// Capital ship able to destroy planets and moons.
    Deathstar,
}

impl ShipType {
    /// Every ship type.
    pub const ALL: [Self; 11] = [
        Self::LightFighter,
        Self::HeavyFighter,
        Self::Cruiser,
        Self::Battleship,
        Self::SmallCargo,
        Self::LargeCargo,
        Self::ColonyShip,
        Self::Recycler,
        Self::EspionageProbe,
        Self::DarkMatterHarvester,
        Self::Deathstar,
    ];
}

/// A stationary planetary defense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum DefenseType {
    /// Cheapest defense.
    RocketLauncher,
    /// Light laser turret.
    LightLaser,
    /// Heavy laser turret.
    HeavyLaser,
    /// Gauss cannon.
    GaussCannon,
    /// Ion cannon; high shields.
    IonCannon,
    /// Strongest turret.
    PlasmaTurret,
    /// Small shield dome.
    SmallShieldDome,
    /// Large shield dome.
    LargeShieldDome,
    /// Planetary shield; hinders planet destruction.
    PlanetaryShield,
}

impl DefenseType {
    /// Every defense type.
    pub const ALL: [Self; 9] = [
        Self::RocketLauncher,
        Self::LightLaser,
        Self::HeavyLaser,
        Self::GaussCannon,
        Self::IonCannon,
        Self::PlasmaTurret,
        Self::SmallShieldDome,
        Self::LargeShieldDome,
        Self::PlanetaryShield,
    ];

    /// Whether this defense counts as a shield facility.
    pub const fn is_shield(self) -> bool {
        matches!(
            self,
            Self::SmallShieldDome | Self::LargeShieldDome | Self::PlanetaryShield
        )
    }
}

// ---------------------------------------------------------------------------
// Queues
// ---------------------------------------------------------------------------

/// The kind of work a queue item performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum QueueItemKind {
    /// Raise a building level.
    Building,
    /// Lower a building level.
    Demolish,
    /// Raise a technology level.
    Technology,
    /// Produce ships.
    Ship,
    /// Produce defenses.
    Defense,
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

/// What a fleet mission does when it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    /// Deliver cargo to a planet.
    Transport,
    /// Fight the planet's fleet and defenses, then plunder.
    Attack,
    /// Found a colony on an empty slot.
    Colonize,
    /// Gather intelligence with probes.
    Spy,
    /// Station the fleet at an own planet.
    Deploy,
    /// Harvest a debris field.
    Recycle,
    /// Attempt to destroy the target with deathstars.
    Destroy,
    /// Explore deep space for random finds.
    Expedition,
}

/// Lifecycle phase of a fleet mission.
///
/// Transitions only move forward: `Outbound -> Returning -> Completed`,
/// or `Outbound -> Completed` for one-way missions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    /// Travelling to the target.
    Outbound,
    /// Travelling home.
    Returning,
    /// Finished; the record can be retired.
    Completed,
}

/// Why a mission's arrival effect did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum MissionFailReason {
    /// No planet exists at the target coordinate.
    TargetNotFound,
    /// Colonize target slot is already taken.
    PositionOccupied,
    /// Deploy target is owned by someone else.
    NotOwnPlanet,
    /// Recycle target has no debris field.
    NoDebrisField,
    /// Recycle target debris field holds nothing.
    DebrisEmpty,
    /// Attack/spy/destroy target is the sender's own planet.
    OwnPlanet,
    /// Destroy mission arrived without surviving deathstars.
    NoDeathstar,
    /// A random roll went against the sender.
    ChanceFailed,
    /// The combat computation failed or timed out.
    CombatFailed,
}

/// Why a mission may not be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum DispatchRejection {
    /// The fleet contains no ships.
    NoShips,
    /// The origin planet lacks the deuterium for the trip.
    InsufficientFuel,
    /// Colonize requires a colony ship.
    NoColonyShip,
    /// Spy requires an espionage probe.
    NoSpyProbe,
    /// Recycle requires a recycler.
    NoRecycler,
    /// Destroy requires a deathstar.
    NoDeathstar,
    /// The cargo does not fit into the fleet's holds.
    InsufficientCargo,
}

/// The random event an expedition ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ExpeditionOutcome {
    /// Found metal, crystal, and deuterium.
    Resources,
    /// Found dark matter.
    DarkMatter,
    /// Found abandoned ships.
    Fleet,
    /// Ambushed by pirates.
    Pirates,
    /// Ambushed by aliens.
    Aliens,
    /// Found nothing.
    Nothing,
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// Which side won a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum BattleWinner {
    /// The defender was wiped out.
    Attacker,
    /// The attacker was wiped out.
    Defender,
    /// Both sides still stand after the round cap.
    Draw,
}

// ---------------------------------------------------------------------------
// Factions and notifications
// ---------------------------------------------------------------------------

/// An NPC's attitude toward the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum RelationStatus {
    /// Spies on and attacks the player.
    Hostile,
    /// Trades and may swing either way.
    Neutral,
    /// Shares intel and sends aid.
    Friendly,
}

/// Strength tier of an NPC, derived from distance to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    /// Close neighbour; grows slowly.
    Easy,
    /// Mid-range neighbour.
    Medium,
    /// Distant power; grows fast.
    Hard,
}

/// An emergent diplomatic event raised by NPC behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum DiplomaticEventKind {
    /// A neutral NPC proposes a resource trade.
    TradeOffer,
    /// A neutral NPC's attitude swung.
    AttitudeSwing,
    /// A friendly NPC shared a spy report on a third party.
    IntelShared,
    /// A friendly NPC invites the player to a joint attack.
    JointAttackInvite,
    /// A friendly NPC sent resources.
    Aid,
}

/// Severity attached to a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Routine information.
    Info,
    /// Something good happened.
    Success,
    /// Something needs attention.
    Warning,
    /// Something failed.
    Error,
}
