//! Universe seeding for a fresh game.
//!
//! Places the player's homeworld and one home planet per NPC faction on
//! distinct random slots. Each faction starts neutral toward the player,
//! with a difficulty tier set by its distance from the homeworld and
//! staggered spy and attack timers so factions do not all act at once.

use std::collections::{BTreeMap, BTreeSet};

use nebula_core::config::UniverseConfig;
use nebula_core::state::GameState;
use nebula_fleet::arrival::new_colony;
use nebula_fleet::distance;
use nebula_npc::growth::MIN_SPY_PROBES;
use nebula_npc::{difficulty_for_distance, new_relation};
use nebula_types::{
    BuildingType, Coordinate, DifficultyTier, Npc, NpcId, OfficerBonuses, Owner, Player,
    PlayerId, ShipType, TechLevels,
};
use rand::Rng;
use tracing::{debug, info};

/// Largest random offset applied to an NPC's last spy time (ms).
const SPY_OFFSET_MS: u64 = 240_000;

/// Largest random offset applied to an NPC's last attack time (ms).
const ATTACK_OFFSET_MS: u64 = 480_000;

/// Random draws allowed per planet before giving up on a free slot.
const PLACEMENT_ATTEMPTS: u32 = 1_000;

const FACTION_NAMES: &[&str] = &[
    "Vexari", "Kethra", "Orrim", "Sable", "Thalos", "Myrren", "Quorax", "Ilvane", "Drusk",
    "Zephon", "Caldra", "Nyxar", "Halcyon", "Torvek", "Ashen", "Velor",
];

/// Errors that can occur while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// The universe has fewer slots than planets to place.
    #[error("universe has {slots} slots but {needed} planets must be placed")]
    UniverseTooSmall {
        /// Slots available.
        slots: u64,
        /// Planets to place.
        needed: u64,
    },

    /// Random placement kept hitting occupied slots.
    #[error("no free slot found after {attempts} attempts")]
    NoFreeSlot {
        /// Draws made.
        attempts: u32,
    },
}

/// Build a new universe from `config`.
pub fn seed_universe<R: Rng + ?Sized>(
    config: &UniverseConfig,
    now: u64,
    rng: &mut R,
) -> Result<GameState, SeedError> {
    let slots = u64::from(config.galaxies)
        .saturating_mul(u64::from(config.systems))
        .saturating_mul(u64::from(config.positions));
    let needed = u64::from(config.npc_count).saturating_add(1);
    if slots < needed {
        return Err(SeedError::UniverseTooSmall { slots, needed });
    }

    let mut state = GameState::new(Player {
        id: PlayerId::new(),
        name: config.player_name.clone(),
        technologies: TechLevels::new(),
        research_queue: Vec::new(),
        planets: Vec::new(),
        bonuses: OfficerBonuses::default(),
    });
    let mut used = BTreeSet::new();

    let home_at = free_slot(config, &mut used, rng)?;
    let mut home = new_colony(Owner::Player(state.player.id), home_at, now);
    home.name = String::from("Homeworld");
    state.add_planet(home);

    for index in 0..config.npc_count {
        let at = free_slot(config, &mut used, rng)?;
        let difficulty = difficulty_for_distance(distance(home_at, at));
        let npc = faction(index, difficulty, state.player.id, now, rng);
        let mut planet = new_colony(Owner::Npc(npc.id), at, now);
        planet.name = format!("{} Prime", npc.name);
        let start = starting_level(difficulty);
        for building in [
            BuildingType::MetalMine,
            BuildingType::CrystalMine,
            BuildingType::SolarPlant,
        ] {
            planet.buildings.insert(building, start);
        }
        planet.fleet.insert(ShipType::EspionageProbe, MIN_SPY_PROBES);
        debug!(npc = %npc.name, coordinate = %at, ?difficulty, "Faction placed");
        state.npcs.push(npc);
        state.add_planet(planet);
    }

    info!(
        home = %home_at,
        factions = state.npcs.len(),
        planets = state.planets.len(),
        "Universe seeded"
    );
    Ok(state)
}

fn faction<R: Rng + ?Sized>(
    index: u32,
    difficulty: DifficultyTier,
    player: PlayerId,
    now: u64,
    rng: &mut R,
) -> Npc {
    Npc {
        id: NpcId::new(),
        name: faction_name(index),
        planets: Vec::new(),
        technologies: TechLevels::new(),
        relations: BTreeMap::from([(player, new_relation(now))]),
        difficulty,
        last_spy_time: now.saturating_sub(rng.random_range(0..SPY_OFFSET_MS)),
        last_attack_time: now.saturating_sub(rng.random_range(0..ATTACK_OFFSET_MS)),
        missions: Vec::new(),
    }
}

/// Names cycle through the pool; later rounds get a numeral suffix.
fn faction_name(index: u32) -> String {
    let pool = u32::try_from(FACTION_NAMES.len()).unwrap_or(1);
    let slot = usize::try_from(index.checked_rem(pool).unwrap_or(0)).unwrap_or(0);
    let round = index.checked_div(pool).unwrap_or(0);
    let base = FACTION_NAMES.get(slot).copied().unwrap_or("Faction");
    if round == 0 {
        base.to_owned()
    } else {
        format!("{base} {}", round.saturating_add(1))
    }
}

const fn starting_level(tier: DifficultyTier) -> u32 {
    match tier {
        DifficultyTier::Easy => 2,
        DifficultyTier::Medium => 4,
        DifficultyTier::Hard => 6,
    }
}

fn free_slot<R: Rng + ?Sized>(
    config: &UniverseConfig,
    used: &mut BTreeSet<Coordinate>,
    rng: &mut R,
) -> Result<Coordinate, SeedError> {
    for _ in 0..PLACEMENT_ATTEMPTS {
        let at = Coordinate::new(
            rng.random_range(1..=config.galaxies),
            rng.random_range(1..=config.systems),
            rng.random_range(1..=config.positions),
        );
        if used.insert(at) {
            return Ok(at);
        }
    }
    Err(SeedError::NoFreeSlot {
        attempts: PLACEMENT_ATTEMPTS,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use nebula_npc::status_toward;
    use nebula_types::RelationStatus;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn small() -> UniverseConfig {
        UniverseConfig {
            player_name: "Tester".to_owned(),
            galaxies: 2,
            systems: 5,
            positions: 6,
            npc_count: 12,
        }
    }

    #[test]
    fn places_every_planet_on_a_distinct_slot() {
        let mut rng = StdRng::seed_from_u64(42);
        let state = seed_universe(&small(), 1_000_000, &mut rng).unwrap();

        assert_eq!(state.npcs.len(), 12);
        assert_eq!(state.planets.len(), 13);
        let coords: BTreeSet<_> = state.planets.values().map(|p| p.coordinate).collect();
        assert_eq!(coords.len(), 13);
        assert_eq!(state.player.name, "Tester");
        assert_eq!(state.player.planets.len(), 1);

        for npc in &state.npcs {
            assert_eq!(npc.planets.len(), 1);
            assert_eq!(status_toward(npc, state.player.id), RelationStatus::Neutral);
            assert!(npc.last_spy_time <= 1_000_000);
            assert!(npc.last_attack_time + ATTACK_OFFSET_MS >= 1_000_000);
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let layout = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let state = seed_universe(&small(), 0, &mut rng).unwrap();
            state
                .planets
                .values()
                .map(|p| p.coordinate)
                .collect::<BTreeSet<_>>()
        };
        assert_eq!(layout(7), layout(7));
    }

    #[test]
    fn tiny_universe_is_rejected() {
        let config = UniverseConfig {
            galaxies: 1,
            systems: 1,
            positions: 3,
            npc_count: 5,
            ..small()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let result = seed_universe(&config, 0, &mut rng);
        assert!(matches!(
            result,
            Err(SeedError::UniverseTooSmall {
                slots: 3,
                needed: 6
            })
        ));
    }

    #[test]
    fn names_cycle_with_a_suffix() {
        assert_eq!(faction_name(0), "Vexari");
        let pool = u32::try_from(FACTION_NAMES.len()).unwrap();
        assert_eq!(faction_name(pool), "Vexari 2");
    }
}
