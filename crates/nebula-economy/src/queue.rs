//! Build, research, shipyard, and demolish queues.
//!
//! An item completes when `end_time <= now`. Completed items are split
//! from the queue in order and applied one at a time. Items whose kind does
//! not match their target (a demolish pointing at a ship, a technology in a
//! planet queue) are skipped and logged; they never mutate anything.

use std::collections::BTreeMap;
use std::fmt;

use nebula_types::data::{building_curve, defense_stats, ship_stats, technology_curve};
use nebula_types::math::{floor_u64, to_f64};
use nebula_types::resources::add_units;
use nebula_types::{
    BuildingType, Defenses, DefenseType, Fleet, Planet, QueueItem, QueueItemId, QueueItemKind,
    QueueTarget, ShipType, TechLevels, TechnologyType,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cost::level_cost;

/// Queue items split by completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueuePartition {
    /// Items with `end_time <= now`, in queue order.
    pub completed: Vec<QueueItem>,
    /// Items still in progress, in queue order.
    pub remaining: Vec<QueueItem>,
}

/// Split `queue` into completed and remaining items, preserving order.
pub fn partition_completed(queue: Vec<QueueItem>, now: u64) -> QueuePartition {
    let (completed, remaining) = queue.into_iter().partition(|item| item.end_time <= now);
    QueuePartition {
        completed,
        remaining,
    }
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// A finished queue item, as applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompletedWork {
    /// A building reached a new level.
    Building {
        /// Which building.
        building: BuildingType,
        /// Its new level.
        level: u32,
    },
    /// A building was torn down one level.
    Demolished {
        /// Which building.
        building: BuildingType,
        /// Its new level.
        level: u32,
    },
    /// A technology reached a new level.
    Technology {
        /// Which technology.
        tech: TechnologyType,
        /// Its new level.
        level: u32,
    },
    /// Ships left the shipyard.
    Ships {
        /// Which ship type.
        ship: ShipType,
        /// How many.
        count: u64,
    },
    /// Defense units were built.
    Defenses {
        /// Which defense type.
        defense: DefenseType,
        /// How many.
        count: u64,
    },
}

impl CompletedWork {
    /// Whether this changes production inputs (building levels or
    /// research).
    pub const fn affects_economy(&self) -> bool {
        matches!(
            self,
            Self::Building { .. } | Self::Demolished { .. } | Self::Technology { .. }
        )
    }
}

impl fmt::Display for CompletedWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building { building, level } => {
                write!(f, "{building:?} upgraded to level {level}")
            }
            Self::Demolished { building, level } => {
                write!(f, "{building:?} demolished to level {level}")
            }
            Self::Technology { tech, level } => {
                write!(f, "{tech:?} researched to level {level}")
            }
            Self::Ships { ship, count } => write!(f, "{count} x {ship:?} built"),
            Self::Defenses { defense, count } => write!(f, "{count} x {defense:?} built"),
        }
    }
}

fn skip(item: &QueueItem) {
    warn!(
        item = %item.id,
        kind = ?item.kind,
        target = ?item.target,
        "Skipping queue item with mismatched kind and target"
    );
}

/// Apply a completed building or demolish item to a level map.
pub fn apply_building_completion(
    buildings: &mut BTreeMap<BuildingType, u32>,
    item: &QueueItem,
) -> Option<CompletedWork> {
    let QueueTarget::Building(building) = item.target else {
        skip(item);
        return None;
    };
    let current = buildings.get(&building).copied().unwrap_or(0);
    match item.kind {
        QueueItemKind::Building => {
            let level = item.target_level.unwrap_or_else(|| current.saturating_add(1));
            buildings.insert(building, level);
            Some(CompletedWork::Building { building, level })
        }
        QueueItemKind::Demolish => {
            let level = current.saturating_sub(1);
            buildings.insert(building, level);
            Some(CompletedWork::Demolished { building, level })
        }
        QueueItemKind::Technology | QueueItemKind::Ship | QueueItemKind::Defense => {
            skip(item);
            None
        }
    }
}

/// Apply a completed research item to an owner's technology levels.
pub fn apply_research_completion(
    technologies: &mut TechLevels,
    item: &QueueItem,
) -> Option<CompletedWork> {
    let (QueueItemKind::Technology, QueueTarget::Technology(tech)) = (item.kind, item.target)
    else {
        skip(item);
        return None;
    };
    let current = technologies.get(&tech).copied().unwrap_or(0);
    let level = item.target_level.unwrap_or_else(|| current.saturating_add(1));
    technologies.insert(tech, level);
    Some(CompletedWork::Technology { tech, level })
}

/// Apply a completed shipyard item to a fleet.
pub fn apply_shipyard_completion(fleet: &mut Fleet, item: &QueueItem) -> Option<CompletedWork> {
    let (QueueItemKind::Ship, QueueTarget::Ship(ship)) = (item.kind, item.target) else {
        skip(item);
        return None;
    };
    let count = item.quantity.max(1);
    add_units(fleet, ship, count);
    Some(CompletedWork::Ships { ship, count })
}

/// Apply a completed defense item.
pub fn apply_defense_completion(defenses: &mut Defenses, item: &QueueItem) -> Option<CompletedWork> {
    let (QueueItemKind::Defense, QueueTarget::Defense(defense)) = (item.kind, item.target) else {
        skip(item);
        return None;
    };
    let count = item.quantity.max(1);
    add_units(defenses, defense, count);
    Some(CompletedWork::Defenses { defense, count })
}

/// Apply one completed item from a planet's build queue.
pub fn apply_planet_completion(planet: &mut Planet, item: &QueueItem) -> Option<CompletedWork> {
    match item.kind {
        QueueItemKind::Building | QueueItemKind::Demolish => {
            apply_building_completion(&mut planet.buildings, item)
        }
        QueueItemKind::Ship => apply_shipyard_completion(&mut planet.fleet, item),
        QueueItemKind::Defense => apply_defense_completion(&mut planet.defenses, item),
        QueueItemKind::Technology => {
            skip(item);
            None
        }
    }
}

/// Complete every due item in a planet's build queue.
pub fn resolve_planet_queue(planet: &mut Planet, now: u64) -> Vec<CompletedWork> {
    let queue = std::mem::take(&mut planet.build_queue);
    let QueuePartition {
        completed,
        remaining,
    } = partition_completed(queue, now);
    planet.build_queue = remaining;
    completed
        .iter()
        .filter_map(|item| apply_planet_completion(planet, item))
        .collect()
}

/// Complete every due item in a research queue.
pub fn resolve_research_queue(
    queue: &mut Vec<QueueItem>,
    technologies: &mut TechLevels,
    now: u64,
) -> Vec<CompletedWork> {
    let QueuePartition {
        completed,
        remaining,
    } = partition_completed(std::mem::take(queue), now);
    *queue = remaining;
    completed
        .iter()
        .filter_map(|item| apply_research_completion(technologies, item))
        .collect()
}

// ---------------------------------------------------------------------------
// Durations
// ---------------------------------------------------------------------------

fn effective_speed(speed: f64) -> f64 {
    if speed > 0.0 { speed } else { 1.0 }
}

/// Seconds to upgrade `building` to `level`.
pub fn building_time_secs(
    building: BuildingType,
    level: u32,
    robotics: u32,
    nanite: u32,
    speed: f64,
) -> u64 {
    let cost = level_cost(&building_curve(building), level);
    let base = to_f64(cost.metal.saturating_add(cost.crystal)) * 3_600.0 / 2_500.0;
    let divisor =
        (1.0 + f64::from(robotics)) * 2.0_f64.powf(f64::from(nanite)) * effective_speed(speed);
    floor_u64(base / divisor).max(1)
}

/// Seconds to research `tech` to `level`.
pub fn research_time_secs(tech: TechnologyType, level: u32, lab: u32, speed: f64) -> u64 {
    let cost = level_cost(&technology_curve(tech), level);
    let base = to_f64(cost.metal.saturating_add(cost.crystal)) * 3_600.0 / 1_000.0;
    let divisor = (1.0 + f64::from(lab)) * effective_speed(speed);
    floor_u64(base / divisor).max(1)
}

fn unit_time_secs(metal: u64, crystal: u64, shipyard: u32, nanite: u32, speed: f64) -> u64 {
    let base = to_f64(metal.saturating_add(crystal)) * 3_600.0 / 2_500.0;
    let divisor =
        (1.0 + f64::from(shipyard)) * 2.0_f64.powf(f64::from(nanite)) * effective_speed(speed);
    floor_u64(base / divisor).max(1)
}

/// Seconds to build `count` ships.
pub fn ship_build_time_secs(
    ship: ShipType,
    count: u64,
    shipyard: u32,
    nanite: u32,
    speed: f64,
) -> u64 {
    let cost = ship_stats(ship).cost;
    unit_time_secs(cost.metal, cost.crystal, shipyard, nanite, speed).saturating_mul(count)
}

/// Seconds to build `count` defense units.
pub fn defense_build_time_secs(
    defense: DefenseType,
    count: u64,
    shipyard: u32,
    nanite: u32,
    speed: f64,
) -> u64 {
    let cost = defense_stats(defense).cost;
    unit_time_secs(cost.metal, cost.crystal, shipyard, nanite, speed).saturating_mul(count)
}

// ---------------------------------------------------------------------------
// Queue inspection
// ---------------------------------------------------------------------------

/// Whether the head of the queue has finished (or never started), so the
/// next item may begin.
pub fn can_start_next(queue: &[QueueItem], now: u64) -> bool {
    queue
        .first()
        .is_some_and(|head| head.start_time == 0 || head.end_time <= now)
}

/// Sum of the time left on every item.
pub fn remaining_time(queue: &[QueueItem], now: u64) -> u64 {
    queue
        .iter()
        .fold(0_u64, |acc, item| acc.saturating_add(item.end_time.saturating_sub(now)))
}

/// What to put in a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueRequest {
    /// Work kind.
    pub kind: QueueItemKind,
    /// What is produced.
    pub target: QueueTarget,
    /// Explicit resulting level, if any.
    pub target_level: Option<u32>,
    /// Unit count for ships and defenses.
    pub quantity: u64,
}

/// Append an item that starts when the last queued item ends (or `now` if
/// the queue is idle) and runs for `duration_ms`.
pub fn enqueue(
    queue: &mut Vec<QueueItem>,
    request: QueueRequest,
    duration_ms: u64,
    now: u64,
) -> QueueItemId {
    let start_time = queue
        .last()
        .map_or(now, |last| last.end_time.max(now));
    let item = QueueItem {
        id: QueueItemId::new(),
        kind: request.kind,
        target: request.target,
        target_level: request.target_level,
        quantity: request.quantity,
        start_time,
        end_time: start_time.saturating_add(duration_ms),
    };
    let id = item.id;
    queue.push(item);
    id
}

#[cfg(test)]
mod tests {
    use nebula_types::resources::unit_count;
    use nebula_types::{Coordinate, Owner, PlanetId, PlayerId, ProductionCarry, Resources};

    use super::*;

    fn item(kind: QueueItemKind, target: QueueTarget, end_time: u64) -> QueueItem {
        QueueItem {
            id: QueueItemId::new(),
            kind,
            target,
            target_level: None,
            quantity: 0,
            start_time: 1,
            end_time,
        }
    }

    fn planet() -> Planet {
        Planet {
            id: PlanetId::new(),
            name: String::from("Colony"),
            owner: Owner::Player(PlayerId::new()),
            coordinate: Coordinate::new(1, 2, 3),
            resources: Resources::ZERO,
            buildings: BTreeMap::new(),
            fleet: BTreeMap::new(),
            defenses: BTreeMap::new(),
            build_queue: Vec::new(),
            last_update: 0,
            production_carry: ProductionCarry::default(),
            max_space: 163,
            fleet_storage: 1_000,
            max_temperature: 20,
            is_moon: false,
            parent_planet: None,
        }
    }

    #[test]
    fn partition_is_exact_and_ordered() {
        let mine = QueueTarget::Building(BuildingType::MetalMine);
        let queue = vec![
            item(QueueItemKind::Building, mine, 100),
            item(QueueItemKind::Building, mine, 200),
            item(QueueItemKind::Building, mine, 150),
            item(QueueItemKind::Building, mine, 201),
        ];
        let ids: Vec<_> = queue.iter().map(|i| i.id).collect();

        let split = partition_completed(queue, 200);
        assert_eq!(split.completed.len(), 3);
        assert_eq!(split.remaining.len(), 1);
        let done: Vec<_> = split.completed.iter().map(|i| i.id).collect();
        assert_eq!(done, ids.iter().take(3).copied().collect::<Vec<_>>());
        assert_eq!(split.remaining.first().map(|i| i.id), ids.get(3).copied());
    }

    #[test]
    fn building_increments_or_sets_level() {
        let mut buildings = BTreeMap::new();
        let mine = QueueTarget::Building(BuildingType::MetalMine);
        apply_building_completion(&mut buildings, &item(QueueItemKind::Building, mine, 0));
        assert_eq!(buildings.get(&BuildingType::MetalMine), Some(&1));

        let mut explicit = item(QueueItemKind::Building, mine, 0);
        explicit.target_level = Some(7);
        let done = apply_building_completion(&mut buildings, &explicit);
        assert_eq!(
            done,
            Some(CompletedWork::Building {
                building: BuildingType::MetalMine,
                level: 7
            })
        );
    }

    #[test]
    fn demolish_floors_at_zero() {
        let mut buildings = BTreeMap::new();
        let lab = QueueTarget::Building(BuildingType::ResearchLab);
        let done = apply_building_completion(&mut buildings, &item(QueueItemKind::Demolish, lab, 0));
        assert_eq!(
            done,
            Some(CompletedWork::Demolished {
                building: BuildingType::ResearchLab,
                level: 0
            })
        );
    }

    #[test]
    fn shipyard_treats_zero_quantity_as_one() {
        let mut p = planet();
        let mut ships = item(QueueItemKind::Ship, QueueTarget::Ship(ShipType::Cruiser), 10);
        p.build_queue.push(ships.clone());
        ships.quantity = 4;
        p.build_queue.push(ships);

        let done = resolve_planet_queue(&mut p, 10);
        assert_eq!(done.len(), 2);
        assert_eq!(unit_count(&p.fleet, &ShipType::Cruiser), 5);
        assert!(p.build_queue.is_empty());
    }

    #[test]
    fn mismatched_items_are_skipped_without_mutation() {
        let mut p = planet();
        p.build_queue.push(item(
            QueueItemKind::Demolish,
            QueueTarget::Ship(ShipType::Recycler),
            5,
        ));
        p.build_queue.push(item(
            QueueItemKind::Technology,
            QueueTarget::Technology(TechnologyType::IonTechnology),
            5,
        ));
        let before = p.clone();

        let done = resolve_planet_queue(&mut p, 10);
        assert!(done.is_empty());
        assert_eq!(p.buildings, before.buildings);
        assert_eq!(p.fleet, before.fleet);
        assert!(p.build_queue.is_empty());
    }

    #[test]
    fn research_updates_global_levels() {
        let mut techs = TechLevels::new();
        let mut queue = vec![
            item(
                QueueItemKind::Technology,
                QueueTarget::Technology(TechnologyType::WeaponsTechnology),
                50,
            ),
            item(
                QueueItemKind::Technology,
                QueueTarget::Technology(TechnologyType::ArmourTechnology),
                500,
            ),
        ];
        let done = resolve_research_queue(&mut queue, &mut techs, 100);
        assert_eq!(done.len(), 1);
        assert_eq!(techs.get(&TechnologyType::WeaponsTechnology), Some(&1));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn build_time_has_one_second_floor() {
        assert_eq!(
            building_time_secs(BuildingType::MetalMine, 1, 10, 5, 100.0),
            1
        );
        // (60 + 15) / 2500 * 3600 = 108
        assert_eq!(building_time_secs(BuildingType::MetalMine, 1, 0, 0, 1.0), 108);
        // Robotics level 1 halves it.
        assert_eq!(building_time_secs(BuildingType::MetalMine, 1, 1, 0, 1.0), 54);
    }

    #[test]
    fn ship_time_is_per_unit_times_count() {
        let one = ship_build_time_secs(ShipType::SmallCargo, 1, 0, 0, 1.0);
        assert_eq!(one, 5_760);
        assert_eq!(ship_build_time_secs(ShipType::SmallCargo, 3, 0, 0, 1.0), one * 3);
    }

    #[test]
    fn research_time_uses_lab_level() {
        // (200 + 100) / 1000 * 3600 = 1080, halved by lab level 1.
        assert_eq!(
            research_time_secs(TechnologyType::LaserTechnology, 1, 1, 1.0),
            540
        );
    }

    #[test]
    fn enqueue_chains_after_last_item() {
        let mut queue = Vec::new();
        let request = QueueRequest {
            kind: QueueItemKind::Building,
            target: QueueTarget::Building(BuildingType::SolarPlant),
            target_level: Some(1),
            quantity: 0,
        };
        enqueue(&mut queue, request, 1_000, 100);
        enqueue(&mut queue, request, 500, 200);

        let ends: Vec<_> = queue.iter().map(|i| (i.start_time, i.end_time)).collect();
        assert_eq!(ends, vec![(100, 1_100), (1_100, 1_600)]);
        assert_eq!(remaining_time(&queue, 600), 500 + 1_000);
        assert!(!can_start_next(&queue, 600));
        assert!(can_start_next(&queue, 1_100));
        assert!(!can_start_next(&[], 0));
    }
}
