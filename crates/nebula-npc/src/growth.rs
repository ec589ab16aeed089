//! NPC economic growth.
//!
//! NPCs do not run build queues. Each growth pass credits tier-scaled
//! income to every planet they own, then spends it instantly on buildings,
//! combat technology, ships, and defenses.

use std::collections::BTreeMap;

use nebula_economy::{
    HOUR_MS, apply_production, building_cost, deduct, defense_cost, research_cost, ship_cost,
    storage_capacity,
};
use nebula_types::math::round_u64;
use nebula_types::resources::{add_units, unit_count};
use nebula_types::{
    BuildingType, DefenseType, DifficultyTier, Npc, Planet, PlanetId, Resources, ShipType,
    TechLevels, TechnologyType, tech_level,
};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::NpcError;

/// Income of a medium-tier planet per hour at game speed 1.
pub const BASE_INCOME_PER_HOUR: Resources = Resources::new(3_000, 1_500, 750);

/// Espionage probes every NPC planet tries to keep on hand.
pub const MIN_SPY_PROBES: u64 = 3;

/// Chance per growth pass of researching one combat technology level.
const RESEARCH_CHANCE: f64 = 0.1;

const GROWTH_BUILDINGS: [BuildingType; 8] = [
    BuildingType::MetalMine,
    BuildingType::CrystalMine,
    BuildingType::DeuteriumSynthesizer,
    BuildingType::SolarPlant,
    BuildingType::MetalStorage,
    BuildingType::CrystalStorage,
    BuildingType::DeuteriumTank,
    BuildingType::Shipyard,
];

const COMBAT_TECHS: [TechnologyType; 3] = [
    TechnologyType::WeaponsTechnology,
    TechnologyType::ShieldingTechnology,
    TechnologyType::ArmourTechnology,
];

/// Strength tier from distance to the player's home planet.
///
/// Same-system neighbours are easy, same-galaxy ones medium, anything in
/// another galaxy hard.
pub const fn difficulty_for_distance(distance: u64) -> DifficultyTier {
    if distance <= 3_000 {
        DifficultyTier::Easy
    } else if distance < 20_000 {
        DifficultyTier::Medium
    } else {
        DifficultyTier::Hard
    }
}

/// Income multiplier for a tier, in percent.
pub const fn tier_income_pct(tier: DifficultyTier) -> u64 {
    match tier {
        DifficultyTier::Easy => 50,
        DifficultyTier::Medium => 100,
        DifficultyTier::Hard => 200,
    }
}

/// Highest building or technology level a tier grows to.
pub const fn tier_level_cap(tier: DifficultyTier) -> u32 {
    match tier {
        DifficultyTier::Easy => 10,
        DifficultyTier::Medium => 15,
        DifficultyTier::Hard => 20,
    }
}

/// Income of one planet over `elapsed_ms`.
pub fn npc_income(tier: DifficultyTier, elapsed_ms: u64, game_speed: f64) -> Resources {
    let speed_pct = round_u64(game_speed.max(0.0) * 100.0);
    let scale = |per_hour: u64| {
        let amount = u128::from(per_hour)
            .saturating_mul(u128::from(tier_income_pct(tier)))
            .saturating_mul(u128::from(speed_pct))
            .saturating_mul(u128::from(elapsed_ms))
            .checked_div(u128::from(HOUR_MS).saturating_mul(10_000))
            .unwrap_or(0);
        u64::try_from(amount).unwrap_or(u64::MAX)
    };
    Resources::new(
        scale(BASE_INCOME_PER_HOUR.metal),
        scale(BASE_INCOME_PER_HOUR.crystal),
        scale(BASE_INCOME_PER_HOUR.deuterium),
    )
}

/// What one growth pass did for one NPC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthReport {
    /// Income credited across all planets.
    pub income: Resources,
    /// Building levels gained.
    pub upgrades: u32,
    /// Technology levels gained.
    pub research: u32,
    /// Ships built.
    pub ships_built: u64,
    /// Defenses built.
    pub defenses_built: u64,
}

impl GrowthReport {
    fn merge(&mut self, other: &Self) {
        self.income = self.income.saturating_add(&other.income);
        self.upgrades = self.upgrades.saturating_add(other.upgrades);
        self.research = self.research.saturating_add(other.research);
        self.ships_built = self.ships_built.saturating_add(other.ships_built);
        self.defenses_built = self.defenses_built.saturating_add(other.defenses_built);
    }
}

/// Grow `npc` by `elapsed_ms` of game time.
///
/// # Errors
///
/// Returns [`NpcError::MissingPlanet`] if the NPC lists a planet that is
/// not in `planets`. Planets processed before the missing one keep their
/// growth.
pub fn grow<R: Rng + ?Sized>(
    npc: &mut Npc,
    planets: &mut BTreeMap<PlanetId, Planet>,
    elapsed_ms: u64,
    game_speed: f64,
    rng: &mut R,
) -> Result<GrowthReport, NpcError> {
    let mut report = GrowthReport::default();
    let cap = tier_level_cap(npc.difficulty);
    for &planet_id in &npc.planets {
        let planet = planets.get_mut(&planet_id).ok_or(NpcError::MissingPlanet {
            npc: npc.id,
            planet: planet_id,
        })?;
        let income = npc_income(npc.difficulty, elapsed_ms, game_speed);
        let capacity = storage_capacity(planet, 0);
        let (stock, _overflow) = apply_production(&planet.resources, &income, &capacity);
        planet.resources = stock;

        let mut planet_report = GrowthReport {
            income,
            ..GrowthReport::default()
        };
        planet_report.upgrades = u32::from(upgrade_building(planet, cap, rng));
        if rng.random_bool(RESEARCH_CHANCE) {
            planet_report.research =
                u32::from(research_combat_tech(&mut npc.technologies, planet, cap, rng));
        }
        planet_report.ships_built = build_fleet(planet);
        planet_report.defenses_built = build_defenses(planet);
        report.merge(&planet_report);
    }
    debug!(
        npc_id = %npc.id,
        upgrades = report.upgrades,
        ships = report.ships_built,
        "NPC grew"
    );
    Ok(report)
}

/// Raise one random affordable building below `cap`.
fn upgrade_building<R: Rng + ?Sized>(planet: &mut Planet, cap: u32, rng: &mut R) -> bool {
    let candidates: Vec<(BuildingType, u32)> = GROWTH_BUILDINGS
        .iter()
        .map(|&b| (b, planet.building_level(b).saturating_add(1)))
        .filter(|&(b, next)| next <= cap && planet.resources.covers(&building_cost(b, next)))
        .collect();
    let Some(&(building, next)) = candidates.choose(rng) else {
        return false;
    };
    if deduct(&mut planet.resources, &building_cost(building, next)).is_err() {
        return false;
    }
    planet.buildings.insert(building, next);
    true
}

/// Research one random combat technology below `cap`, paid by `planet`.
fn research_combat_tech<R: Rng + ?Sized>(
    technologies: &mut TechLevels,
    planet: &mut Planet,
    cap: u32,
    rng: &mut R,
) -> bool {
    let Some(&tech) = COMBAT_TECHS.choose(rng) else {
        return false;
    };
    let next = tech_level(technologies, tech).saturating_add(1);
    if next > cap || deduct(&mut planet.resources, &research_cost(tech, next)).is_err() {
        return false;
    }
    technologies.insert(tech, next);
    true
}

/// How many units costing `unit` fit into `budget`.
fn affordable(budget: &Resources, unit: &Resources) -> u64 {
    [
        (budget.metal, unit.metal),
        (budget.crystal, unit.crystal),
        (budget.deuterium, unit.deuterium),
    ]
    .iter()
    .filter(|&&(_, price)| price > 0)
    .map(|&(have, price)| have.saturating_div(price))
    .min()
    .unwrap_or(0)
}

/// A share of `stock`, in percent.
fn share(stock: &Resources, pct: u64) -> Resources {
    let part = |amount: u64| amount.saturating_mul(pct).saturating_div(100);
    Resources::new(part(stock.metal), part(stock.crystal), part(stock.deuterium))
}

/// Top up spy probes, then put 30% of the stock into light fighters.
fn build_fleet(planet: &mut Planet) -> u64 {
    if planet.building_level(BuildingType::Shipyard) == 0 {
        return 0;
    }
    let mut built = 0_u64;
    let missing = MIN_SPY_PROBES
        .saturating_sub(unit_count(&planet.fleet, &ShipType::EspionageProbe));
    let probes = missing.min(affordable(
        &planet.resources,
        &ship_cost(ShipType::EspionageProbe, 1),
    ));
    if probes > 0
        && deduct(&mut planet.resources, &ship_cost(ShipType::EspionageProbe, probes)).is_ok()
    {
        add_units(&mut planet.fleet, ShipType::EspionageProbe, probes);
        built = built.saturating_add(probes);
    }
    let fighters = affordable(
        &share(&planet.resources, 30),
        &ship_cost(ShipType::LightFighter, 1),
    );
    if fighters > 0
        && deduct(&mut planet.resources, &ship_cost(ShipType::LightFighter, fighters)).is_ok()
    {
        add_units(&mut planet.fleet, ShipType::LightFighter, fighters);
        built = built.saturating_add(fighters);
    }
    built
}

/// Put 20% of the stock into rocket launchers.
fn build_defenses(planet: &mut Planet) -> u64 {
    if planet.building_level(BuildingType::Shipyard) == 0 {
        return 0;
    }
    let unit = defense_cost(DefenseType::RocketLauncher, 1);
    let count = affordable(&share(&planet.resources, 20), &unit);
    if count == 0
        || deduct(
            &mut planet.resources,
            &defense_cost(DefenseType::RocketLauncher, count),
        )
        .is_err()
    {
        return 0;
    }
    add_units(&mut planet.defenses, DefenseType::RocketLauncher, count);
    count
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nebula_fleet::arrival::new_colony;
    use nebula_types::{Coordinate, NpcId, Owner};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn setup(tier: DifficultyTier) -> (Npc, BTreeMap<PlanetId, Planet>) {
        let id = NpcId::new();
        let mut planet = new_colony(Owner::Npc(id), Coordinate::new(1, 5, 5), 0);
        planet.buildings.insert(BuildingType::Shipyard, 2);
        let npc = Npc {
            id,
            name: "Kessari Reach".to_owned(),
            planets: vec![planet.id],
            technologies: BTreeMap::new(),
            relations: BTreeMap::new(),
            difficulty: tier,
            last_spy_time: 0,
            last_attack_time: 0,
            missions: Vec::new(),
        };
        let planets = [(planet.id, planet)].into_iter().collect();
        (npc, planets)
    }

    #[test]
    fn tiers_follow_distance() {
        assert_eq!(difficulty_for_distance(1_010), DifficultyTier::Easy);
        assert_eq!(difficulty_for_distance(2_795), DifficultyTier::Easy);
        assert_eq!(difficulty_for_distance(12_000), DifficultyTier::Medium);
        assert_eq!(difficulty_for_distance(40_000), DifficultyTier::Hard);
    }

    #[test]
    fn income_scales_with_tier_and_time() {
        assert_eq!(
            npc_income(DifficultyTier::Medium, HOUR_MS, 1.0),
            BASE_INCOME_PER_HOUR
        );
        assert_eq!(
            npc_income(DifficultyTier::Hard, HOUR_MS / 2, 1.0),
            BASE_INCOME_PER_HOUR
        );
        assert_eq!(
            npc_income(DifficultyTier::Easy, HOUR_MS, 2.0),
            BASE_INCOME_PER_HOUR
        );
    }

    #[test]
    fn growth_spends_within_stock() {
        let mut rng = StdRng::seed_from_u64(42);
        let (mut npc, mut planets) = setup(DifficultyTier::Hard);
        for planet in planets.values_mut() {
            planet.resources = Resources::new(5_000, 5_000, 5_000);
        }
        for _ in 0..20 {
            grow(&mut npc, &mut planets, 600_000, 1.0, &mut rng).unwrap();
        }
        let planet = planets.values().next().unwrap();
        let capacity = storage_capacity(planet, 0);
        assert!(planet.resources.metal <= capacity.metal);
        assert!(planet.resources.crystal <= capacity.crystal);
        assert_eq!(unit_count(&planet.fleet, &ShipType::EspionageProbe), MIN_SPY_PROBES);
    }

    #[test]
    fn levels_never_pass_the_tier_cap() {
        let mut rng = StdRng::seed_from_u64(9);
        let (mut npc, mut planets) = setup(DifficultyTier::Easy);
        for planet in planets.values_mut() {
            planet.resources = Resources::new(10_000, 10_000, 10_000);
            planet.buildings.insert(BuildingType::MetalStorage, 12);
        }
        for _ in 0..200 {
            grow(&mut npc, &mut planets, HOUR_MS, 1.0, &mut rng).unwrap();
        }
        let planet = planets.values().next().unwrap();
        assert!(planet.buildings.values().all(|&level| level <= 12));
        assert!(planet.building_level(BuildingType::MetalMine) <= 10);
        assert!(npc.technologies.values().all(|&level| level <= 10));
    }

    #[test]
    fn missing_planet_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let (mut npc, _) = setup(DifficultyTier::Medium);
        let mut empty = BTreeMap::new();
        let result = grow(&mut npc, &mut empty, 1_000, 1.0, &mut rng);
        assert!(matches!(result, Err(NpcError::MissingPlanet { .. })));
    }
}
