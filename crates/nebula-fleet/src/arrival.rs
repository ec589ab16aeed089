//! Kind-specific arrival effects and the return leg.
//!
//! Each function applies one mission kind's effect to the values it is
//! handed and returns an [`ArrivalOutcome`]. A missing or unsuitable target
//! is a failed outcome with a reason code, never an error. Capacities are
//! passed in by the caller so this crate stays free of production rules.

use std::collections::BTreeMap;

use nebula_types::data::ship_stats;
use nebula_types::resources::{add_units, merge_units, remove_units, total_units, unit_count};
use nebula_types::{
    BattleResult, Coordinate, DebrisField, DefenseType, Defenses, ExpeditionOutcome, Fleet,
    FleetMission, MissionFailReason, MissionReport, MissionReportDetails, Owner, Planet,
    PlanetId, ProductionCarry, ReportId, ResourceKind, Resources, ShipType, SpyReport,
    TechLevels,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::{BattleOutcome, BattleRequest, CombatTech, MAX_ROUNDS};
use crate::loot::{moon_chance, repair_defenses};
use crate::travel::cargo_capacity;

/// Starting stock of a fresh colony.
pub const COLONY_START_RESOURCES: Resources = Resources::new(500, 500, 0);

/// Building fields of a fresh colony.
pub const COLONY_MAX_SPACE: u32 = 200;

/// Ship storage of a fresh colony.
pub const COLONY_FLEET_STORAGE: u64 = 1_000;

/// Probability the target notices a spy mission.
pub const SPY_DETECTION_CHANCE: f64 = 0.3;

/// Result of one arrival effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalOutcome {
    /// Whether the effect happened.
    pub success: bool,
    /// Why it did not.
    pub reason: Option<MissionFailReason>,
    /// Kind-specific data for the report.
    pub details: MissionReportDetails,
    /// The mission ends here instead of flying home.
    pub one_way: bool,
}

impl ArrivalOutcome {
    /// A successful effect.
    pub const fn succeeded(details: MissionReportDetails) -> Self {
        Self {
            success: true,
            reason: None,
            details,
            one_way: false,
        }
    }

    /// A failed effect. The fleet flies home with what it carried.
    pub fn failed(reason: MissionFailReason) -> Self {
        Self {
            success: false,
            reason: Some(reason),
            details: MissionReportDetails::default(),
            one_way: false,
        }
    }

    /// Turn the outcome into a report for `mission`.
    pub fn into_report(self, mission: &FleetMission, now: u64) -> MissionReport {
        MissionReport {
            id: ReportId::new(),
            mission_id: mission.id,
            owner: mission.owner,
            kind: mission.kind,
            timestamp: now,
            origin_planet: mission.origin_planet,
            target: mission.target,
            success: self.success,
            reason: self.reason,
            details: self.details,
        }
    }
}

/// Move `cargo` into `stock` without exceeding `capacity`.
///
/// Energy is never deposited. Returns what was actually moved; the rest
/// stays with the sender.
pub fn deposit(stock: &mut Resources, cargo: &Resources, capacity: &Resources) -> Resources {
    let mut moved = Resources::ZERO;
    for kind in ResourceKind::ALL {
        if !kind.is_transportable() {
            continue;
        }
        let room = capacity.get(kind).saturating_sub(stock.get(kind));
        let take = cargo.get(kind).min(room);
        stock.set(kind, stock.get(kind).saturating_add(take));
        moved.set(kind, take);
    }
    moved
}

// ---------------------------------------------------------------------------
// Peaceful missions
// ---------------------------------------------------------------------------

/// Unload cargo at the target. What does not fit flies home.
pub fn transport(
    mission: &mut FleetMission,
    target: Option<&mut Planet>,
    capacity: &Resources,
) -> ArrivalOutcome {
    let Some(planet) = target else {
        return ArrivalOutcome::failed(MissionFailReason::TargetNotFound);
    };
    let delivered = deposit(&mut planet.resources, &mission.cargo, capacity);
    mission.cargo = mission.cargo.saturating_sub(&delivered);
    ArrivalOutcome::succeeded(MissionReportDetails {
        resources: delivered,
        planet: Some(planet.id),
        ..MissionReportDetails::default()
    })
}

/// Maximum temperature of a new planet in slot `position`.
pub fn slot_temperature(position: u32) -> i32 {
    let offset = i32::try_from(position.saturating_sub(1)).unwrap_or(i32::MAX);
    240_i32.saturating_sub(offset.saturating_mul(20))
}

/// A fresh colony owned by `owner` at `coordinate`.
pub fn new_colony(owner: Owner, coordinate: Coordinate, now: u64) -> Planet {
    Planet {
        id: PlanetId::new(),
        name: format!("Colony {coordinate}"),
        owner,
        coordinate,
        resources: COLONY_START_RESOURCES,
        buildings: BTreeMap::new(),
        fleet: Fleet::new(),
        defenses: Defenses::new(),
        build_queue: Vec::new(),
        last_update: now,
        production_carry: ProductionCarry::default(),
        max_space: COLONY_MAX_SPACE,
        fleet_storage: COLONY_FLEET_STORAGE,
        max_temperature: slot_temperature(coordinate.position),
        is_moon: false,
        parent_planet: None,
    }
}

/// Found a colony on an empty slot, consuming one colony ship.
///
/// An occupied slot fails with `PositionOccupied` and the colony ship
/// flies home unused.
pub fn colonize(
    mission: &mut FleetMission,
    occupied: bool,
    now: u64,
) -> (ArrivalOutcome, Option<Planet>) {
    if occupied {
        return (ArrivalOutcome::failed(MissionFailReason::PositionOccupied), None);
    }
    remove_units(&mut mission.fleet, ShipType::ColonyShip, 1);
    let colony = new_colony(mission.owner, mission.target, now);
    let outcome = ArrivalOutcome::succeeded(MissionReportDetails {
        planet: Some(colony.id),
        ..MissionReportDetails::default()
    });
    (outcome, Some(colony))
}

/// Snapshot the target planet.
pub fn spy<R: Rng + ?Sized>(
    mission: &FleetMission,
    target: Option<&Planet>,
    now: u64,
    rng: &mut R,
) -> (ArrivalOutcome, Option<SpyReport>) {
    let Some(planet) = target else {
        return (ArrivalOutcome::failed(MissionFailReason::TargetNotFound), None);
    };
    if planet.owner == mission.owner {
        return (ArrivalOutcome::failed(MissionFailReason::OwnPlanet), None);
    }
    let report = SpyReport {
        id: ReportId::new(),
        timestamp: now,
        spy: mission.owner,
        target_planet: planet.id,
        coordinate: planet.coordinate,
        resources: planet.resources,
        fleet: planet.fleet.clone(),
        defenses: planet.defenses.clone(),
        buildings: planet.buildings.clone(),
        detected: rng.random_bool(SPY_DETECTION_CHANCE),
    };
    let outcome = ArrivalOutcome::succeeded(MissionReportDetails {
        planet: Some(planet.id),
        ..MissionReportDetails::default()
    });
    (outcome, Some(report))
}

/// Station the fleet at one of the sender's own planets.
///
/// Success is one-way: ships and cargo stay at the target. Cargo beyond
/// the target's capacity is lost.
pub fn deploy(
    mission: &mut FleetMission,
    target: Option<&mut Planet>,
    capacity: &Resources,
) -> ArrivalOutcome {
    let Some(planet) = target else {
        return ArrivalOutcome::failed(MissionFailReason::TargetNotFound);
    };
    if planet.owner != mission.owner {
        return ArrivalOutcome::failed(MissionFailReason::NotOwnPlanet);
    }
    merge_units(&mut planet.fleet, &mission.fleet);
    let delivered = deposit(&mut planet.resources, &mission.cargo, capacity);
    mission.fleet.clear();
    mission.cargo = Resources::ZERO;
    ArrivalOutcome {
        one_way: true,
        ..ArrivalOutcome::succeeded(MissionReportDetails {
            resources: delivered,
            planet: Some(planet.id),
            ..MissionReportDetails::default()
        })
    }
}

/// Load metal and crystal from a debris field into the recyclers.
///
/// Free space is recycler capacity minus cargo already aboard. The take is
/// split by the field's metal/crystal ratio, floored. The caller deletes
/// the field once it is empty.
pub fn recycle(mission: &mut FleetMission, field: Option<&mut DebrisField>) -> ArrivalOutcome {
    let Some(field) = field else {
        return ArrivalOutcome::failed(MissionFailReason::NoDebrisField);
    };
    let metal = field.resources.metal;
    let crystal = field.resources.crystal;
    let total = metal.saturating_add(crystal);
    if total == 0 {
        return ArrivalOutcome::failed(MissionFailReason::DebrisEmpty);
    }
    let recyclers = unit_count(&mission.fleet, &ShipType::Recycler);
    let space = ship_stats(ShipType::Recycler)
        .cargo
        .saturating_mul(recyclers)
        .saturating_sub(mission.cargo.cargo_total());
    let take = total.min(space);
    let share = |part: u64| {
        let scaled = u128::from(take)
            .saturating_mul(u128::from(part))
            .checked_div(u128::from(total))
            .unwrap_or(0);
        u64::try_from(scaled).unwrap_or(0)
    };
    let collected = Resources::new(share(metal), share(crystal), 0);
    field.resources = field.resources.saturating_sub(&collected);
    mission.cargo = mission.cargo.saturating_add(&collected);
    ArrivalOutcome::succeeded(MissionReportDetails {
        resources: collected,
        ..MissionReportDetails::default()
    })
}

// ---------------------------------------------------------------------------
// Hostile missions
// ---------------------------------------------------------------------------

/// Check that an attack, spy, or destroy target exists and is foreign.
///
/// # Errors
///
/// `TargetNotFound` for an empty slot, `OwnPlanet` for the sender's own
/// planet.
pub fn hostile_target(
    mission: &FleetMission,
    target: Option<&Planet>,
) -> Result<PlanetId, MissionFailReason> {
    match target {
        None => Err(MissionFailReason::TargetNotFound),
        Some(planet) if planet.owner == mission.owner => Err(MissionFailReason::OwnPlanet),
        Some(planet) => Ok(planet.id),
    }
}

/// Build the battle input for `mission` against `target`.
///
/// Both sides fight with their researched weapons, shielding, and armour
/// levels.
pub fn battle_request(
    mission: &FleetMission,
    attacker_tech: &TechLevels,
    target: &Planet,
    defender_tech: &TechLevels,
) -> BattleRequest {
    BattleRequest {
        attacker_fleet: mission.fleet.clone(),
        attacker_tech: CombatTech::from_levels(attacker_tech),
        defender_fleet: target.fleet.clone(),
        defender_defenses: target.defenses.clone(),
        defender_tech: CombatTech::from_levels(defender_tech),
        max_rounds: MAX_ROUNDS,
    }
}

/// Apply a finished battle to both sides and build its report.
///
/// Survivors replace both fleets, lost defenses are partly repaired, and
/// `plunder` (capped by what the target holds) moves into the attacker's
/// cargo. `moon_created` starts false; the caller rolls for it.
pub fn apply_battle(
    mission: &mut FleetMission,
    target: &mut Planet,
    request: &BattleRequest,
    outcome: &BattleOutcome,
    plunder: Resources,
    debris: Resources,
    now: u64,
) -> BattleResult {
    mission.fleet.clone_from(&outcome.attacker_remaining);
    target.fleet.clone_from(&outcome.defender_remaining);
    let (repaired, restored) =
        repair_defenses(&request.defender_defenses, &outcome.defenses_remaining);
    target.defenses.clone_from(&repaired);

    let taken = plunder.cargo_only().min(&target.resources);
    target.resources = target.resources.saturating_sub(&taken);
    mission.cargo = mission.cargo.saturating_add(&taken);

    BattleResult {
        id: ReportId::new(),
        timestamp: now,
        coordinate: target.coordinate,
        attacker: mission.owner,
        defender: target.owner,
        attacker_planet: mission.origin_planet,
        defender_planet: target.id,
        attacker_fleet: request.attacker_fleet.clone(),
        defender_fleet: request.defender_fleet.clone(),
        defender_defenses: request.defender_defenses.clone(),
        rounds: outcome.rounds.clone(),
        attacker_losses: outcome.attacker_losses.clone(),
        defender_ship_losses: outcome.defender_ship_losses.clone(),
        defender_defense_losses: outcome.defender_defense_losses.clone(),
        attacker_remaining: outcome.attacker_remaining.clone(),
        defender_remaining: outcome.defender_remaining.clone(),
        defender_defenses_after: repaired,
        repaired_defenses: restored,
        winner: outcome.winner,
        plunder: taken,
        debris,
        moon_chance: moon_chance(&debris),
        moon_created: false,
    }
}

/// A moon orbiting `parent`.
pub fn create_moon(parent: &Planet, now: u64) -> Planet {
    Planet {
        id: PlanetId::new(),
        name: format!("{} Moon", parent.name),
        owner: parent.owner,
        coordinate: parent.coordinate,
        resources: Resources::ZERO,
        buildings: BTreeMap::new(),
        fleet: Fleet::new(),
        defenses: Defenses::new(),
        build_queue: Vec::new(),
        last_update: now,
        production_carry: ProductionCarry::default(),
        max_space: 1,
        fleet_storage: COLONY_FLEET_STORAGE,
        max_temperature: parent.max_temperature.saturating_sub(40),
        is_moon: true,
        parent_planet: Some(parent.id),
    }
}

/// Rough strength of a planet's garrison: 100 per ship, 50 per defense.
pub fn defense_power(fleet: &Fleet, defenses: &Defenses) -> u64 {
    total_units(fleet)
        .saturating_mul(100)
        .saturating_add(total_units(defenses).saturating_mul(50))
}

/// Destruction chance in percent:
/// `deathstars × 10 − planetary shields × 5 − power / 10000`, clamped to
/// `1..=99`.
pub fn destruction_chance(deathstars: u64, planetary_shields: u64, power: u64) -> u32 {
    let base = i128::from(deathstars).saturating_mul(10);
    let chance = base
        .saturating_sub(i128::from(planetary_shields).saturating_mul(5))
        .saturating_sub(i128::from(power.saturating_div(10_000)))
        .clamp(1, 99);
    u32::try_from(chance).unwrap_or(1)
}

/// Roll for destroying `target` with the mission's surviving deathstars.
pub fn roll_destruction<R: Rng + ?Sized>(
    mission: &FleetMission,
    target: &Planet,
    rng: &mut R,
) -> ArrivalOutcome {
    let deathstars = unit_count(&mission.fleet, &ShipType::Deathstar);
    if deathstars == 0 {
        return ArrivalOutcome::failed(MissionFailReason::NoDeathstar);
    }
    let shields = unit_count(&target.defenses, &DefenseType::PlanetaryShield);
    let chance = destruction_chance(
        deathstars,
        shields,
        defense_power(&target.fleet, &target.defenses),
    );
    let destroyed = rng.random_range(0..100_u32) < chance;
    let details = MissionReportDetails {
        planet: Some(target.id),
        destruction_chance: Some(chance),
        ..MissionReportDetails::default()
    };
    if destroyed {
        ArrivalOutcome::succeeded(details)
    } else {
        ArrivalOutcome {
            details,
            ..ArrivalOutcome::failed(MissionFailReason::ChanceFailed)
        }
    }
}

// ---------------------------------------------------------------------------
// Expeditions
// ---------------------------------------------------------------------------

const EXPEDITION_TABLE: [(ExpeditionOutcome, u32); 6] = [
    (ExpeditionOutcome::Resources, 30),
    (ExpeditionOutcome::DarkMatter, 10),
    (ExpeditionOutcome::Fleet, 15),
    (ExpeditionOutcome::Pirates, 10),
    (ExpeditionOutcome::Aliens, 5),
    (ExpeditionOutcome::Nothing, 30),
];

/// Draw an expedition event from the weighted table.
pub fn roll_expedition<R: Rng + ?Sized>(rng: &mut R) -> ExpeditionOutcome {
    let total = EXPEDITION_TABLE.iter().map(|&(_, w)| w).sum::<u32>();
    let mut roll = rng.random_range(0..total);
    for (outcome, weight) in EXPEDITION_TABLE {
        if roll < weight {
            return outcome;
        }
        roll = roll.saturating_sub(weight);
    }
    ExpeditionOutcome::Nothing
}

/// Lose `pct` percent of every ship type, floored.
fn ambush(fleet: &mut Fleet, pct: u64) -> Fleet {
    let mut lost = Fleet::new();
    for (&ship, count) in fleet.iter_mut() {
        let gone = count.saturating_mul(pct).saturating_div(100);
        if gone > 0 {
            *count = count.saturating_sub(gone);
            lost.insert(ship, gone);
        }
    }
    fleet.retain(|_, count| *count > 0);
    lost
}

/// Explore deep space. Any event other than nothing counts as success.
pub fn expedition<R: Rng + ?Sized>(mission: &mut FleetMission, rng: &mut R) -> ArrivalOutcome {
    let event = roll_expedition(rng);
    let mut details = MissionReportDetails {
        expedition: Some(event),
        ..MissionReportDetails::default()
    };
    match event {
        ExpeditionOutcome::Resources => {
            let mut space = cargo_capacity(&mission.fleet).saturating_sub(mission.cargo.cargo_total());
            let mut found = Resources::ZERO;
            for (kind, upper) in [
                (ResourceKind::Metal, 20_000_u64),
                (ResourceKind::Crystal, 10_000),
                (ResourceKind::Deuterium, 5_000),
            ] {
                let amount = rng.random_range(1_000..=upper).min(space);
                space = space.saturating_sub(amount);
                found.set(kind, amount);
            }
            mission.cargo = mission.cargo.saturating_add(&found);
            details.resources = found;
        }
        ExpeditionOutcome::DarkMatter => {
            let found = rng.random_range(50..=500_u64);
            mission.cargo.dark_matter = mission.cargo.dark_matter.saturating_add(found);
            details.resources.dark_matter = found;
        }
        ExpeditionOutcome::Fleet => {
            let ship = if rng.random_bool(0.5) {
                ShipType::LightFighter
            } else {
                ShipType::SmallCargo
            };
            let count = rng.random_range(1..=10_u64);
            add_units(&mut mission.fleet, ship, count);
            details.fleet_found.insert(ship, count);
        }
        ExpeditionOutcome::Pirates => details.fleet_lost = ambush(&mut mission.fleet, 10),
        ExpeditionOutcome::Aliens => details.fleet_lost = ambush(&mut mission.fleet, 20),
        ExpeditionOutcome::Nothing => {}
    }
    ArrivalOutcome {
        success: event != ExpeditionOutcome::Nothing,
        ..ArrivalOutcome::succeeded(details)
    }
}

// ---------------------------------------------------------------------------
// Return leg
// ---------------------------------------------------------------------------

/// Credit the returning fleet and cargo to its origin.
///
/// Cargo is credited in full even past storage capacity; production stays
/// stalled until the stock drops back under it. Returns what was credited.
/// A vanished origin loses everything and returns zero.
pub fn return_home(mission: &mut FleetMission, origin: Option<&mut Planet>) -> Resources {
    let Some(planet) = origin else {
        return Resources::ZERO;
    };
    merge_units(&mut planet.fleet, &mission.fleet);
    let mut credited = Resources::ZERO;
    for kind in ResourceKind::ALL {
        if kind.is_transportable() {
            let amount = mission.cargo.get(kind);
            let stock = &mut planet.resources;
            stock.set(kind, stock.get(kind).saturating_add(amount));
            credited.set(kind, amount);
        }
    }
    mission.fleet.clear();
    mission.cargo = Resources::ZERO;
    credited
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use nebula_types::{MissionId, MissionKind, MissionStatus, PlayerId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::combat::simulate_battle;

    const BIG: Resources = Resources::new(1_000_000, 1_000_000, 1_000_000);

    fn player() -> Owner {
        Owner::Player(PlayerId::new())
    }

    fn planet(owner: Owner, coordinate: Coordinate) -> Planet {
        let mut p = new_colony(owner, coordinate, 0);
        p.resources = Resources::new(10_000, 10_000, 10_000);
        p
    }

    fn mission(owner: Owner, kind: MissionKind, fleet: &[(ShipType, u64)]) -> FleetMission {
        FleetMission {
            id: MissionId::new(),
            owner,
            origin_planet: PlanetId::new(),
            target: Coordinate::new(1, 2, 3),
            target_planet: None,
            target_is_moon: false,
            kind,
            fleet: fleet.iter().copied().collect(),
            cargo: Resources::ZERO,
            departure_time: 0,
            arrival_time: 100,
            return_time: Some(200),
            status: MissionStatus::Outbound,
        }
    }

    #[test]
    fn transport_to_empty_slot_fails() {
        let mut m = mission(player(), MissionKind::Transport, &[(ShipType::SmallCargo, 1)]);
        m.cargo = Resources::new(100, 0, 0);
        let outcome = transport(&mut m, None, &BIG);
        assert_eq!(outcome.reason, Some(MissionFailReason::TargetNotFound));
        assert_eq!(m.cargo.metal, 100);
    }

    #[test]
    fn transport_keeps_overflow_aboard() {
        let owner = player();
        let mut target = planet(owner, Coordinate::new(1, 2, 3));
        let mut m = mission(owner, MissionKind::Transport, &[(ShipType::SmallCargo, 1)]);
        m.cargo = Resources::new(3_000, 500, 0);
        let cap = Resources::new(12_000, 20_000, 20_000);
        let outcome = transport(&mut m, Some(&mut target), &cap);
        assert!(outcome.success);
        assert_eq!(target.resources.metal, 12_000);
        assert_eq!(outcome.details.resources, Resources::new(2_000, 500, 0));
        assert_eq!(m.cargo, Resources::new(1_000, 0, 0));
    }

    #[test]
    fn colonize_consumes_one_colony_ship() {
        let mut m = mission(player(), MissionKind::Colonize, &[(ShipType::ColonyShip, 2)]);
        let (outcome, colony) = colonize(&mut m, false, 50);
        assert!(outcome.success);
        let colony = colony.unwrap();
        assert_eq!(colony.coordinate, m.target);
        assert_eq!(colony.resources, COLONY_START_RESOURCES);
        assert_eq!(colony.max_space, COLONY_MAX_SPACE);
        assert_eq!(m.fleet.get(&ShipType::ColonyShip), Some(&1));
    }

    #[test]
    fn colonize_occupied_slot_returns_empty_handed() {
        let mut m = mission(player(), MissionKind::Colonize, &[(ShipType::ColonyShip, 1)]);
        let (outcome, colony) = colonize(&mut m, true, 50);
        assert_eq!(outcome.reason, Some(MissionFailReason::PositionOccupied));
        assert!(colony.is_none());
        assert_eq!(m.fleet.get(&ShipType::ColonyShip), Some(&1));
    }

    #[test]
    fn spy_copies_target_state() {
        let mut rng = StdRng::seed_from_u64(1);
        let target = planet(player(), Coordinate::new(1, 2, 3));
        let m = mission(player(), MissionKind::Spy, &[(ShipType::EspionageProbe, 1)]);
        let (outcome, report) = spy(&m, Some(&target), 10, &mut rng);
        assert!(outcome.success);
        let report = report.unwrap();
        assert_eq!(report.resources, target.resources);
        assert_eq!(report.target_planet, target.id);
    }

    #[test]
    fn spy_on_own_planet_fails() {
        let mut rng = StdRng::seed_from_u64(1);
        let owner = player();
        let target = planet(owner, Coordinate::new(1, 2, 3));
        let m = mission(owner, MissionKind::Spy, &[(ShipType::EspionageProbe, 1)]);
        let (outcome, report) = spy(&m, Some(&target), 10, &mut rng);
        assert_eq!(outcome.reason, Some(MissionFailReason::OwnPlanet));
        assert!(report.is_none());
    }

    #[test]
    fn deploy_is_one_way_to_own_planet() {
        let owner = player();
        let mut target = planet(owner, Coordinate::new(1, 2, 3));
        let mut m = mission(owner, MissionKind::Deploy, &[(ShipType::Cruiser, 4)]);
        let outcome = deploy(&mut m, Some(&mut target), &BIG);
        assert!(outcome.success);
        assert!(outcome.one_way);
        assert_eq!(target.fleet.get(&ShipType::Cruiser), Some(&4));
        assert!(m.fleet.is_empty());
    }

    #[test]
    fn deploy_to_foreign_planet_fails() {
        let mut target = planet(player(), Coordinate::new(1, 2, 3));
        let mut m = mission(player(), MissionKind::Deploy, &[(ShipType::Cruiser, 4)]);
        let outcome = deploy(&mut m, Some(&mut target), &BIG);
        assert_eq!(outcome.reason, Some(MissionFailReason::NotOwnPlanet));
        assert!(!outcome.one_way);
        assert_eq!(m.fleet.get(&ShipType::Cruiser), Some(&4));
    }

    #[test]
    fn recycle_splits_by_ratio_up_to_capacity() {
        let mut m = mission(player(), MissionKind::Recycle, &[(ShipType::Recycler, 1)]);
        let mut field = DebrisField {
            coordinate: m.target,
            resources: Resources::new(30_000, 10_000, 0),
            created_at: 0,
        };
        let outcome = recycle(&mut m, Some(&mut field));
        assert!(outcome.success);
        assert_eq!(m.cargo, Resources::new(15_000, 5_000, 0));
        assert_eq!(field.resources, Resources::new(15_000, 5_000, 0));
    }

    #[test]
    fn recycle_failures() {
        let mut m = mission(player(), MissionKind::Recycle, &[(ShipType::Recycler, 1)]);
        assert_eq!(
            recycle(&mut m, None).reason,
            Some(MissionFailReason::NoDebrisField)
        );
        let mut empty = DebrisField {
            coordinate: m.target,
            resources: Resources::ZERO,
            created_at: 0,
        };
        assert_eq!(
            recycle(&mut m, Some(&mut empty)).reason,
            Some(MissionFailReason::DebrisEmpty)
        );
    }

    #[test]
    fn hostile_target_checks() {
        let owner = player();
        let own = planet(owner, Coordinate::new(1, 2, 3));
        let m = mission(owner, MissionKind::Attack, &[(ShipType::Cruiser, 1)]);
        assert_eq!(hostile_target(&m, None), Err(MissionFailReason::TargetNotFound));
        assert_eq!(hostile_target(&m, Some(&own)), Err(MissionFailReason::OwnPlanet));
    }

    #[test]
    fn winning_battle_loots_and_repairs() {
        let mut target = planet(player(), Coordinate::new(1, 2, 3));
        target.defenses.insert(DefenseType::RocketLauncher, 10);
        let mut m = mission(player(), MissionKind::Attack, &[(ShipType::Battleship, 50)]);
        let request = battle_request(&m, &TechLevels::new(), &target, &TechLevels::new());
        let outcome = simulate_battle(&request);
        let plunder = Resources::new(5_000, 5_000, 5_000);
        let result = apply_battle(&mut m, &mut target, &request, &outcome, plunder, Resources::ZERO, 7);

        assert_eq!(result.winner, nebula_types::BattleWinner::Attacker);
        assert_eq!(m.cargo, plunder);
        assert_eq!(target.resources, Resources::new(5_000, 5_000, 5_000));
        assert_eq!(target.defenses.get(&DefenseType::RocketLauncher), Some(&7));
        assert_eq!(result.moon_chance, 0.0);
    }

    #[test]
    fn destruction_chance_is_clamped() {
        assert_eq!(destruction_chance(0, 0, 0), 1);
        assert_eq!(destruction_chance(3, 1, 25_000), 23);
        assert_eq!(destruction_chance(20, 0, 0), 99);
    }

    #[test]
    fn destroy_without_deathstars_fails() {
        let mut rng = StdRng::seed_from_u64(3);
        let target = planet(player(), Coordinate::new(1, 2, 3));
        let m = mission(player(), MissionKind::Destroy, &[(ShipType::Cruiser, 1)]);
        let outcome = roll_destruction(&m, &target, &mut rng);
        assert_eq!(outcome.reason, Some(MissionFailReason::NoDeathstar));
    }

    #[test]
    fn expedition_success_matches_event() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let mut m = mission(player(), MissionKind::Expedition, &[(ShipType::LargeCargo, 5)]);
            let outcome = expedition(&mut m, &mut rng);
            let event = outcome.details.expedition.unwrap();
            assert_eq!(outcome.success, event != ExpeditionOutcome::Nothing);
            assert!(m.cargo.plunderable_total() <= 125_000);
        }
    }

    #[test]
    fn pirates_take_a_tenth() {
        let mut fleet: Fleet = [(ShipType::LightFighter, 25), (ShipType::Cruiser, 5)]
            .into_iter()
            .collect();
        let lost = ambush(&mut fleet, 10);
        assert_eq!(lost.get(&ShipType::LightFighter), Some(&2));
        assert_eq!(lost.get(&ShipType::Cruiser), None);
        assert_eq!(fleet.get(&ShipType::LightFighter), Some(&23));
    }

    #[test]
    fn return_home_credits_everything() {
        let owner = player();
        let mut origin = planet(owner, Coordinate::new(1, 1, 1));
        let mut m = mission(owner, MissionKind::Attack, &[(ShipType::Cruiser, 3)]);
        m.cargo = Resources::new(1_000, 2_000, 3_000);
        let credited = return_home(&mut m, Some(&mut origin));
        assert_eq!(credited, Resources::new(1_000, 2_000, 3_000));
        assert_eq!(origin.fleet.get(&ShipType::Cruiser), Some(&3));
        assert_eq!(origin.resources, Resources::new(11_000, 12_000, 13_000));
    }

    #[test]
    fn return_home_credits_dark_matter_and_ignores_energy() {
        let owner = player();
        let mut origin = planet(owner, Coordinate::new(1, 1, 1));
        origin.resources = Resources::new(500_000, 500_000, 500_000);
        let mut m = mission(owner, MissionKind::Transport, &[(ShipType::LargeCargo, 1)]);
        m.cargo = Resources {
            dark_matter: 50,
            energy: 70,
            ..Resources::new(4_000, 3_000, 2_000)
        };

        let credited = return_home(&mut m, Some(&mut origin));
        assert_eq!(credited.dark_matter, 50);
        assert_eq!(credited.energy, 0);
        assert_eq!(origin.resources.metal, 504_000);
        assert_eq!(origin.resources.deuterium, 502_000);
        assert_eq!(origin.resources.dark_matter, 50);
        assert_eq!(origin.resources.energy, 0);
        assert_eq!(m.cargo, Resources::ZERO);
    }

    #[test]
    fn reports_carry_mission_identity() {
        let m = mission(player(), MissionKind::Spy, &[(ShipType::EspionageProbe, 1)]);
        let report = ArrivalOutcome::failed(MissionFailReason::TargetNotFound).into_report(&m, 99);
        assert_eq!(report.mission_id, m.id);
        assert!(!report.success);
        assert_eq!(report.timestamp, 99);
    }
}
