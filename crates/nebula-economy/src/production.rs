//! Resource production, energy balance, and storage capacity.
//!
//! All rates are per hour. Each building contributes through a curve of the
//! form `base × level × factor^level`, floored to whole units at every
//! stage. Mines are throttled by the planet's energy ratio, then scaled by
//! research bonuses and the resource speed.
//!
//! Planets accrue whole units only. The sub-unit remainder of each tick is
//! kept in [`ProductionCarry`] so many short ticks credit exactly what one
//! long tick would.
//!
//! [`ProductionCarry`]: nebula_types::ProductionCarry

use nebula_types::math::{floor_i64, floor_u64, to_f64};
use nebula_types::{
    BuildingType, OfficerBonuses, Planet, Resources, TechLevels, TechnologyType, tech_level,
};
use serde::{Deserialize, Serialize};

/// Milliseconds in one hour. Hourly rates are spread over this many
/// milliseconds.
pub const HOUR_MS: u64 = 3_600_000;

const BASE_METAL: f64 = 10.0;
const BASE_CRYSTAL: f64 = 5.0;
const BASE_STORAGE: f64 = 10_000.0;
const STORAGE_FACTOR: f64 = 2.0;
const RESEARCH_BONUS_PER_LEVEL: f64 = 0.02;
const BASE_DARK_MATTER_CAPACITY: u64 = 1_000;
const DARK_MATTER_CAPACITY_PER_LEVEL: u64 = 100;
const BASE_ENERGY_CAPACITY: u64 = 1_000;
const ENERGY_CAPACITY_PER_LEVEL: u64 = 500;

/// Raw `base × level × factor^level`; zero at level 0.
fn curve(base: f64, level: u32, factor: f64) -> f64 {
    if level == 0 {
        return 0.0;
    }
    let level = f64::from(level);
    base * level * factor.powf(level)
}

fn percent(pct: u32) -> f64 {
    1.0 + f64::from(pct) / 100.0
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Owner-level modifiers that feed into a planet's production.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductionContext {
    /// Officer percentage bonuses.
    pub bonuses: OfficerBonuses,
    /// Mineral research level (metal bonus).
    pub mineral_research: u32,
    /// Crystal research level (crystal bonus).
    pub crystal_research: u32,
    /// Fuel research level (deuterium bonus).
    pub fuel_research: u32,
    /// Global resource speed multiplier.
    pub resource_speed: f64,
}

impl ProductionContext {
    /// Build a context from an owner's technologies and bonuses.
    pub fn new(technologies: &TechLevels, bonuses: OfficerBonuses, resource_speed: f64) -> Self {
        Self {
            bonuses,
            mineral_research: tech_level(technologies, TechnologyType::MineralResearch),
            crystal_research: tech_level(technologies, TechnologyType::CrystalResearch),
            fuel_research: tech_level(technologies, TechnologyType::FuelResearch),
            resource_speed: if resource_speed > 0.0 {
                resource_speed
            } else {
                1.0
            },
        }
    }
}

impl Default for ProductionContext {
    fn default() -> Self {
        Self::new(&TechLevels::new(), OfficerBonuses::default(), 1.0)
    }
}

// ---------------------------------------------------------------------------
// Energy
// ---------------------------------------------------------------------------

/// Hourly energy output of solar plants and fusion reactors.
pub fn energy_production(planet: &Planet, energy_bonus_pct: u32) -> u64 {
    let solar = floor_u64(curve(
        50.0,
        planet.building_level(BuildingType::SolarPlant),
        1.1,
    ));
    let fusion = floor_u64(curve(
        150.0,
        planet.building_level(BuildingType::FusionReactor),
        1.15,
    ));
    floor_u64(to_f64(solar.saturating_add(fusion)) * percent(energy_bonus_pct))
}

/// Hourly energy drawn by the three mines.
pub fn energy_consumption(planet: &Planet) -> u64 {
    let metal = floor_u64(curve(
        10.0,
        planet.building_level(BuildingType::MetalMine),
        1.1,
    ));
    let crystal = floor_u64(curve(
        10.0,
        planet.building_level(BuildingType::CrystalMine),
        1.1,
    ));
    let deuterium = floor_u64(curve(
        15.0,
        planet.building_level(BuildingType::DeuteriumSynthesizer),
        1.1,
    ));
    metal.saturating_add(crystal).saturating_add(deuterium)
}

/// `min(1, production / consumption)`, or 1 when nothing consumes energy.
pub fn energy_ratio(production: u64, consumption: u64) -> f64 {
    if consumption == 0 {
        return 1.0;
    }
    (to_f64(production) / to_f64(consumption)).min(1.0)
}

/// Deuterium synthesizer output factor from the planet's maximum
/// temperature. Cold planets produce more.
pub fn temperature_modifier(max_temperature: i32) -> f64 {
    0.002_f64.mul_add(-f64::from(max_temperature), 1.28)
}

// ---------------------------------------------------------------------------
// Capacity
// ---------------------------------------------------------------------------

/// Storage capacity per resource.
///
/// Metal, crystal, and deuterium scale with their storage building as
/// `10000 × 2^level × (1 + bonus)`. Dark matter and energy use smaller
/// linear formulas.
pub fn storage_capacity(planet: &Planet, storage_bonus_pct: u32) -> Resources {
    let bonus = percent(storage_bonus_pct);
    let scaled = |building| {
        let level = f64::from(planet.building_level(building));
        floor_u64(BASE_STORAGE * STORAGE_FACTOR.powf(level) * bonus)
    };
    let collector = u64::from(planet.building_level(BuildingType::DarkMatterCollector));
    let solar = u64::from(planet.building_level(BuildingType::SolarPlant));
    Resources {
        metal: scaled(BuildingType::MetalStorage),
        crystal: scaled(BuildingType::CrystalStorage),
        deuterium: scaled(BuildingType::DeuteriumTank),
        dark_matter: BASE_DARK_MATTER_CAPACITY
            .saturating_add(collector.saturating_mul(DARK_MATTER_CAPACITY_PER_LEVEL)),
        energy: BASE_ENERGY_CAPACITY.saturating_add(solar.saturating_mul(ENERGY_CAPACITY_PER_LEVEL)),
    }
}

// ---------------------------------------------------------------------------
// Production report
// ---------------------------------------------------------------------------

/// Everything derived from a planet's buildings for one production step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionReport {
    /// Hourly output. The energy component is always zero.
    pub rates: Resources,
    /// Hourly deuterium burned when fusion upkeep exceeds synthesis.
    pub deuterium_drain: u64,
    /// Hourly energy produced.
    pub energy_production: u64,
    /// Hourly energy consumed.
    pub energy_consumption: u64,
    /// Mine throttle in `0.0..=1.0`.
    pub energy_ratio: f64,
    /// Storage capacity per resource.
    pub capacity: Resources,
}

/// Compute hourly rates, energy balance, and capacity for a planet.
pub fn production_report(planet: &Planet, ctx: &ProductionContext) -> ProductionReport {
    let produced_energy = energy_production(planet, ctx.bonuses.energy_production_pct);
    let consumed_energy = energy_consumption(planet);
    let ratio = energy_ratio(produced_energy, consumed_energy);
    let speed = ctx.resource_speed;

    let research = |level: u32| RESEARCH_BONUS_PER_LEVEL.mul_add(f64::from(level), 1.0);

    let metal_mine = curve(30.0, planet.building_level(BuildingType::MetalMine), 1.1);
    let metal = BASE_METAL + (metal_mine * ratio).floor();
    let metal = floor_u64(metal * research(ctx.mineral_research) * speed);

    let crystal_mine = curve(20.0, planet.building_level(BuildingType::CrystalMine), 1.1);
    let crystal = BASE_CRYSTAL + (crystal_mine * ratio).floor();
    let crystal = floor_u64(crystal * research(ctx.crystal_research) * speed);

    let synthesizer = curve(
        10.0,
        planet.building_level(BuildingType::DeuteriumSynthesizer),
        1.1,
    );
    let synthesized = (synthesizer * ratio * temperature_modifier(planet.max_temperature)).floor();
    let upkeep = curve(10.0, planet.building_level(BuildingType::FusionReactor), 1.1).floor();
    let net = floor_i64((synthesized - upkeep) * research(ctx.fuel_research) * speed);

    let collector = curve(
        25.0,
        planet.building_level(BuildingType::DarkMatterCollector),
        1.5,
    );
    let dark_matter =
        floor_u64(collector * percent(ctx.bonuses.dark_matter_production_pct) * speed);

    ProductionReport {
        rates: Resources {
            metal,
            crystal,
            deuterium: u64::try_from(net).unwrap_or(0),
            dark_matter,
            energy: 0,
        },
        deuterium_drain: net.checked_neg().and_then(|n| u64::try_from(n).ok()).unwrap_or(0),
        energy_production: produced_energy,
        energy_consumption: consumed_energy,
        energy_ratio: ratio,
        capacity: storage_capacity(planet, ctx.bonuses.storage_capacity_pct),
    }
}

/// Whole units produced over `delta_ms` at the report's rates, floored,
/// without any carried remainder.
pub fn production_for_period(report: &ProductionReport, delta_ms: u64) -> Resources {
    let over = |rate: u64| rate.saturating_mul(delta_ms).saturating_div(HOUR_MS);
    Resources {
        metal: over(report.rates.metal),
        crystal: over(report.rates.crystal),
        deuterium: over(report.rates.deuterium),
        dark_matter: over(report.rates.dark_matter),
        energy: 0,
    }
}

/// Add `produced` to `stock`, clamping every storable resource to
/// `capacity`.
///
/// Returns the new stock and the overflow that did not fit. Overflow is
/// `max(0, stock + produced - capacity)` per resource and is never
/// re-added. Energy is carried through unchanged.
pub fn apply_production(
    stock: &Resources,
    produced: &Resources,
    capacity: &Resources,
) -> (Resources, Resources) {
    let clamp = |before: u64, add: u64, cap: u64| {
        let total = before.saturating_add(add);
        (total.min(cap), total.saturating_sub(cap))
    };
    let (metal, metal_over) = clamp(stock.metal, produced.metal, capacity.metal);
    let (crystal, crystal_over) = clamp(stock.crystal, produced.crystal, capacity.crystal);
    let (deuterium, deuterium_over) =
        clamp(stock.deuterium, produced.deuterium, capacity.deuterium);
    let (dark_matter, dark_matter_over) =
        clamp(stock.dark_matter, produced.dark_matter, capacity.dark_matter);

    (
        Resources {
            metal,
            crystal,
            deuterium,
            dark_matter,
            energy: stock.energy,
        },
        Resources {
            metal: metal_over,
            crystal: crystal_over,
            deuterium: deuterium_over,
            dark_matter: dark_matter_over,
            energy: 0,
        },
    )
}

// ---------------------------------------------------------------------------
// Accrual
// ---------------------------------------------------------------------------

/// What one accrual step credited to a planet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionOutcome {
    /// Whole units produced before clamping.
    pub produced: Resources,
    /// Production lost to full storage.
    pub overflow: Resources,
    /// Deuterium burned by fusion reactors.
    pub burned: u64,
}

/// Spread an hourly rate over `delta_ms`, scaled by `efficiency_pct`, and
/// return the whole units. The remainder stays in `carry`.
fn step(rate: u64, delta_ms: u64, efficiency_pct: u64, carry: &mut u64) -> u64 {
    let total = rate
        .saturating_mul(delta_ms)
        .saturating_mul(efficiency_pct)
        .saturating_div(100)
        .saturating_add(*carry);
    let whole = total.saturating_div(HOUR_MS);
    *carry = total.saturating_sub(whole.saturating_mul(HOUR_MS));
    whole
}

/// Credit `delta_ms` of production to `planet`.
///
/// `efficiency_pct` scales the output (100 for live play, lower while
/// draining offline time). Stock is clamped to capacity and the energy
/// balance is refreshed.
pub fn accrue(
    planet: &mut Planet,
    report: &ProductionReport,
    delta_ms: u64,
    efficiency_pct: u64,
) -> ProductionOutcome {
    let mut carry = planet.production_carry;
    let produced = Resources {
        metal: step(report.rates.metal, delta_ms, efficiency_pct, &mut carry.metal),
        crystal: step(report.rates.crystal, delta_ms, efficiency_pct, &mut carry.crystal),
        deuterium: step(
            report.rates.deuterium,
            delta_ms,
            efficiency_pct,
            &mut carry.deuterium,
        ),
        dark_matter: step(
            report.rates.dark_matter,
            delta_ms,
            efficiency_pct,
            &mut carry.dark_matter,
        ),
        energy: 0,
    };
    let burned = step(
        report.deuterium_drain,
        delta_ms,
        efficiency_pct,
        &mut carry.deuterium_drain,
    );
    planet.production_carry = carry;

    let (mut stock, overflow) = apply_production(&planet.resources, &produced, &report.capacity);
    stock.deuterium = stock.deuterium.saturating_sub(burned);
    stock.energy = report
        .energy_production
        .saturating_sub(report.energy_consumption)
        .min(report.capacity.energy);
    planet.resources = stock;

    ProductionOutcome {
        produced,
        overflow,
        burned,
    }
}

/// Production efficiency in percent for time spent offline.
///
/// Up to one hour is credited in full; longer gaps are progressively
/// discounted.
pub const fn offline_efficiency(offline_ms: u64) -> u64 {
    const HOUR: u64 = HOUR_MS;
    if offline_ms <= HOUR {
        100
    } else if offline_ms <= HOUR.saturating_mul(6) {
        80
    } else if offline_ms <= HOUR.saturating_mul(24) {
        50
    } else {
        30
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use std::collections::BTreeMap;

    use nebula_types::{Coordinate, Owner, PlanetId, PlayerId, ProductionCarry};

    use super::*;

    fn planet(buildings: &[(BuildingType, u32)]) -> Planet {
        Planet {
            id: PlanetId::new(),
            name: String::from("Homeworld"),
            owner: Owner::Player(PlayerId::new()),
            coordinate: Coordinate::new(1, 1, 1),
            resources: Resources::new(500, 500, 0),
            buildings: buildings.iter().copied().collect(),
            fleet: BTreeMap::new(),
            defenses: BTreeMap::new(),
            build_queue: Vec::new(),
            last_update: 0,
            production_carry: ProductionCarry::default(),
            max_space: 163,
            fleet_storage: 1_000,
            max_temperature: 40,
            is_moon: false,
            parent_planet: None,
        }
    }

    #[test]
    fn no_consumption_means_full_ratio() {
        assert_eq!(energy_ratio(0, 0), 1.0);
        assert_eq!(energy_ratio(50, 100), 0.5);
        assert_eq!(energy_ratio(500, 100), 1.0);
    }

    #[test]
    fn empty_planet_has_base_production() {
        let p = planet(&[]);
        let report = production_report(&p, &ProductionContext::default());
        assert_eq!(report.rates.metal, 10);
        assert_eq!(report.rates.crystal, 5);
        assert_eq!(report.rates.deuterium, 0);
        assert_eq!(report.deuterium_drain, 0);
    }

    #[test]
    fn metal_mine_level_five_for_one_hour() {
        // Level 5 mine draws floor(10*5*1.1^5) = 80 energy; level 5 solar
        // yields 402, so the mine runs at full ratio.
        let mut p = planet(&[(BuildingType::MetalMine, 5), (BuildingType::SolarPlant, 5)]);
        let report = production_report(&p, &ProductionContext::default());
        assert_eq!(report.energy_ratio, 1.0);

        let expected = 10 + floor_u64(30.0 * 5.0 * 1.1_f64.powf(5.0));
        assert_eq!(report.rates.metal, expected);

        let before = p.resources.metal;
        let outcome = accrue(&mut p, &report, HOUR_MS, 100);
        assert_eq!(p.resources.metal, before + expected);
        assert_eq!(outcome.overflow.metal, 0);
        assert_eq!(p.production_carry.metal, 0);
    }

    #[test]
    fn metal_mine_output_clamped_to_capacity() {
        let mut p = planet(&[(BuildingType::MetalMine, 5), (BuildingType::SolarPlant, 5)]);
        p.resources.metal = 9_900;
        let report = production_report(&p, &ProductionContext::default());
        let outcome = accrue(&mut p, &report, HOUR_MS, 100);
        assert_eq!(p.resources.metal, 10_000);
        assert_eq!(outcome.overflow.metal, 9_900 + report.rates.metal - 10_000);
    }

    #[test]
    fn short_ticks_sum_to_one_long_tick() {
        let mut split = planet(&[(BuildingType::MetalMine, 3), (BuildingType::SolarPlant, 4)]);
        let mut whole = split.clone();
        let report = production_report(&split, &ProductionContext::default());

        for _ in 0..3_600 {
            accrue(&mut split, &report, 1_000, 100);
        }
        accrue(&mut whole, &report, HOUR_MS, 100);
        assert_eq!(split.resources, whole.resources);
    }

    #[test]
    fn low_energy_throttles_mines() {
        let p = planet(&[(BuildingType::MetalMine, 10)]);
        let report = production_report(&p, &ProductionContext::default());
        assert_eq!(report.energy_ratio, 0.0);
        assert_eq!(report.rates.metal, 10);
    }

    #[test]
    fn research_adds_two_percent_per_level() {
        let p = planet(&[]);
        let mut techs = TechLevels::new();
        techs.insert(TechnologyType::MineralResearch, 10);
        let ctx = ProductionContext::new(&techs, OfficerBonuses::default(), 1.0);
        let report = production_report(&p, &ctx);
        assert_eq!(report.rates.metal, 12);
    }

    #[test]
    fn fusion_without_synthesizer_drains_deuterium() {
        let mut p = planet(&[(BuildingType::FusionReactor, 2)]);
        p.resources.deuterium = 1_000;
        let report = production_report(&p, &ProductionContext::default());
        assert_eq!(report.rates.deuterium, 0);
        assert!(report.deuterium_drain > 0);

        let outcome = accrue(&mut p, &report, HOUR_MS, 100);
        assert_eq!(outcome.burned, report.deuterium_drain);
        assert_eq!(p.resources.deuterium, 1_000 - report.deuterium_drain);
    }

    #[test]
    fn storage_doubles_per_level() {
        let p = planet(&[(BuildingType::MetalStorage, 2), (BuildingType::SolarPlant, 3)]);
        let cap = storage_capacity(&p, 0);
        assert_eq!(cap.metal, 40_000);
        assert_eq!(cap.crystal, 10_000);
        assert_eq!(cap.dark_matter, 1_000);
        assert_eq!(cap.energy, 2_500);

        let boosted = storage_capacity(&p, 10);
        assert_eq!(boosted.crystal, 11_000);
    }

    #[test]
    fn overflow_is_excess_over_capacity() {
        let stock = Resources::new(90, 0, 50);
        let produced = Resources::new(20, 5, 10);
        let capacity = Resources::new(100, 100, 100);
        let (after, overflow) = apply_production(&stock, &produced, &capacity);
        assert_eq!(after, Resources::new(100, 5, 60));
        assert_eq!(overflow, Resources::new(10, 0, 0));
    }

    #[test]
    fn stock_above_capacity_is_clamped() {
        let stock = Resources::new(150, 0, 0);
        let (after, overflow) =
            apply_production(&stock, &Resources::ZERO, &Resources::new(100, 100, 100));
        assert_eq!(after.metal, 100);
        assert_eq!(overflow.metal, 50);
    }

    #[test]
    fn period_production_floors() {
        let p = planet(&[]);
        let report = production_report(&p, &ProductionContext::default());
        let half_hour = production_for_period(&report, HOUR_MS / 2);
        assert_eq!(half_hour.metal, 5);
        assert_eq!(half_hour.crystal, 2);
    }

    #[test]
    fn offline_efficiency_steps_down() {
        assert_eq!(offline_efficiency(HOUR_MS), 100);
        assert_eq!(offline_efficiency(HOUR_MS * 2), 80);
        assert_eq!(offline_efficiency(HOUR_MS * 12), 50);
        assert_eq!(offline_efficiency(HOUR_MS * 48), 30);
    }

    #[test]
    fn reduced_efficiency_scales_output() {
        let mut p = planet(&[]);
        let report = production_report(&p, &ProductionContext::default());
        accrue(&mut p, &report, HOUR_MS, 50);
        assert_eq!(p.resources.metal, 505);
    }
}
