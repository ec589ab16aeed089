//! Plunder, debris, defense repair, and moon formation.
//!
//! Only metal, crystal, and deuterium can be plundered. Dark matter stays
//! on the planet and energy is never transported.

use nebula_types::data::ship_stats;
use nebula_types::math::to_f64;
use nebula_types::resources::add_units;
use nebula_types::{Defenses, Fleet, Resources};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::travel::cargo_capacity;

/// Share of each defender resource up for grabs, in percent.
pub const PLUNDER_RATIO_PCT: u64 = 50;

/// Share of destroyed ships' metal and crystal that becomes debris, in
/// percent.
pub const DEBRIS_RATIO_PCT: u64 = 30;

/// Share of destroyed defenses rebuilt after battle, in percent.
pub const DEFENSE_REPAIR_PCT: u64 = 70;

/// Highest possible moon chance.
pub const MOON_CHANCE_CAP: f64 = 0.2;

/// Debris that yields a 1.0 moon chance before capping.
const MOON_DEBRIS_SCALE: f64 = 100_000.0;

fn scale(amount: u64, numerator: u64, denominator: u64) -> u64 {
    let scaled = u128::from(amount)
        .saturating_mul(u128::from(numerator))
        .checked_div(u128::from(denominator))
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Input to [`calculate_plunder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlunderRequest {
    /// Stock on the attacked planet.
    pub defender_resources: Resources,
    /// Surviving attacker ships.
    pub attacker_fleet: Fleet,
    /// Cargo already aboard.
    pub carried: Resources,
}

/// How much the attacker carries off.
///
/// Up to [`PLUNDER_RATIO_PCT`] of each plunderable resource is available.
/// If it all fits in the fleet's free cargo space it is all taken;
/// otherwise every resource is scaled down by the same factor, floored.
pub fn calculate_plunder(request: &PlunderRequest) -> Resources {
    let stock = request.defender_resources;
    let available = Resources::new(
        scale(stock.metal, PLUNDER_RATIO_PCT, 100),
        scale(stock.crystal, PLUNDER_RATIO_PCT, 100),
        scale(stock.deuterium, PLUNDER_RATIO_PCT, 100),
    );
    let total = available.plunderable_total();
    let space = cargo_capacity(&request.attacker_fleet).saturating_sub(request.carried.cargo_total());
    if space >= total {
        return available;
    }
    Resources::new(
        scale(available.metal, space, total),
        scale(available.crystal, space, total),
        scale(available.deuterium, space, total),
    )
}

/// Input to [`calculate_debris`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebrisRequest {
    /// Attacker ships destroyed.
    pub attacker_losses: Fleet,
    /// Defender ships destroyed. Defense losses never create debris.
    pub defender_losses: Fleet,
}

/// Debris from destroyed ships on both sides.
pub fn calculate_debris(request: &DebrisRequest) -> Resources {
    let wreckage = request
        .attacker_losses
        .iter()
        .chain(&request.defender_losses)
        .fold(Resources::ZERO, |acc, (&ship, &count)| {
            acc.saturating_add(&ship_stats(ship).cost.saturating_mul(count))
        });
    Resources::new(
        scale(wreckage.metal, DEBRIS_RATIO_PCT, 100),
        scale(wreckage.crystal, DEBRIS_RATIO_PCT, 100),
        0,
    )
}

/// Rebuild lost defenses.
///
/// For every type, `floor(lost × 70%)` units come back, where `lost` is
/// the drop from `before` to `after`. Returns the repaired inventory and
/// the units restored.
pub fn repair_defenses(before: &Defenses, after: &Defenses) -> (Defenses, Defenses) {
    let mut repaired = after.clone();
    let mut restored = Defenses::new();
    for (&defense, &count) in before {
        let left = after.get(&defense).copied().unwrap_or(0);
        let back = scale(count.saturating_sub(left), DEFENSE_REPAIR_PCT, 100);
        if back > 0 {
            add_units(&mut repaired, defense, back);
            restored.insert(defense, back);
        }
    }
    (repaired, restored)
}

/// Moon formation chance: debris / 100000, capped at 20%.
pub fn moon_chance(debris: &Resources) -> f64 {
    (to_f64(debris.metal.saturating_add(debris.crystal)) / MOON_DEBRIS_SCALE).min(MOON_CHANCE_CAP)
}

/// Roll once for a moon.
pub fn roll_moon<R: Rng + ?Sized>(chance: f64, rng: &mut R) -> bool {
    chance > 0.0 && rng.random_bool(chance.clamp(0.0, 1.0))
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use nebula_types::{DefenseType, ShipType};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn plunder_takes_half_when_cargo_allows() {
        let req = PlunderRequest {
            defender_resources: Resources::new(10_000, 6_000, 2_000),
            attacker_fleet: [(ShipType::LargeCargo, 1)].into_iter().collect(),
            carried: Resources::ZERO,
        };
        assert_eq!(calculate_plunder(&req), Resources::new(5_000, 3_000, 1_000));
    }

    #[test]
    fn plunder_scales_to_cargo_space() {
        let req = PlunderRequest {
            defender_resources: Resources::new(100_000, 50_000, 50_000),
            attacker_fleet: [(ShipType::SmallCargo, 2)].into_iter().collect(),
            carried: Resources::ZERO,
        };
        let loot = calculate_plunder(&req);
        // 10000 capacity over 100000 available: a tenth of each.
        assert_eq!(loot, Resources::new(5_000, 2_500, 2_500));
        assert!(loot.plunderable_total() <= 10_000);
    }

    #[test]
    fn plunder_respects_caps_for_odd_amounts() {
        let req = PlunderRequest {
            defender_resources: Resources::new(33_333, 7_777, 1_001),
            attacker_fleet: [(ShipType::LightFighter, 7)].into_iter().collect(),
            carried: Resources::new(10, 0, 0),
        };
        let loot = calculate_plunder(&req);
        // Seven fighters hold 350, ten units already aboard.
        assert!(loot.plunderable_total() <= 340);
        assert!(loot.metal <= 16_666);
        assert!(loot.crystal <= 3_888);
        assert!(loot.deuterium <= 500);
    }

    #[test]
    fn dark_matter_is_never_plundered() {
        let mut stock = Resources::new(100, 100, 100);
        stock.dark_matter = 1_000;
        let req = PlunderRequest {
            defender_resources: stock,
            attacker_fleet: [(ShipType::LargeCargo, 10)].into_iter().collect(),
            carried: Resources::ZERO,
        };
        assert_eq!(calculate_plunder(&req).dark_matter, 0);
    }

    #[test]
    fn debris_is_thirty_percent_of_ship_losses() {
        let req = DebrisRequest {
            attacker_losses: [(ShipType::LightFighter, 10)].into_iter().collect(),
            defender_losses: [(ShipType::Cruiser, 1)].into_iter().collect(),
        };
        // Metal: (30000 + 20000) * 0.3, crystal: (10000 + 7000) * 0.3.
        assert_eq!(calculate_debris(&req), Resources::new(15_000, 5_100, 0));
    }

    #[test]
    fn repair_restores_seventy_percent_of_losses() {
        let before: Defenses = [(DefenseType::RocketLauncher, 20), (DefenseType::LightLaser, 3)]
            .into_iter()
            .collect();
        let after: Defenses = [(DefenseType::RocketLauncher, 10)].into_iter().collect();
        let (repaired, restored) = repair_defenses(&before, &after);
        assert_eq!(repaired.get(&DefenseType::RocketLauncher), Some(&17));
        assert_eq!(repaired.get(&DefenseType::LightLaser), Some(&2));
        assert_eq!(restored.get(&DefenseType::RocketLauncher), Some(&7));
    }

    #[test]
    fn moon_chance_is_capped() {
        assert_eq!(moon_chance(&Resources::new(5_000, 5_000, 0)), 0.1);
        assert_eq!(moon_chance(&Resources::new(5_000_000, 0, 0)), MOON_CHANCE_CAP);
        assert_eq!(moon_chance(&Resources::ZERO), 0.0);
    }

    #[test]
    fn zero_chance_never_rolls_a_moon() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!((0..100).all(|_| !roll_moon(0.0, &mut rng)));
    }
}
