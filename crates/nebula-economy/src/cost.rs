//! Upgrade and unit costs.
//!
//! Level `n` of a building or technology costs `base × multiplier^(n-1)`
//! per resource, floored. Ships and defenses cost their table price times
//! the unit count.

use nebula_types::data::{CostCurve, building_curve, defense_stats, ship_stats, technology_curve};
use nebula_types::math::{floor_u64, to_f64};
use nebula_types::{BuildingType, DefenseType, Resources, ShipType, TechnologyType};

use crate::error::EconomyError;

/// Cost of reaching `level` on `curve`. Level 0 is free.
pub fn level_cost(curve: &CostCurve, level: u32) -> Resources {
    if level == 0 {
        return Resources::ZERO;
    }
    let factor = curve.multiplier.powf(f64::from(level.saturating_sub(1)));
    let scale = |amount: u64| floor_u64(to_f64(amount) * factor);
    Resources {
        metal: scale(curve.base_cost.metal),
        crystal: scale(curve.base_cost.crystal),
        deuterium: scale(curve.base_cost.deuterium),
        dark_matter: scale(curve.base_cost.dark_matter),
        energy: 0,
    }
}

/// Cost of upgrading `building` to `level`.
pub fn building_cost(building: BuildingType, level: u32) -> Resources {
    level_cost(&building_curve(building), level)
}

/// Cost of researching `tech` to `level`.
pub fn research_cost(tech: TechnologyType, level: u32) -> Resources {
    level_cost(&technology_curve(tech), level)
}

/// Cost of `count` ships.
pub const fn ship_cost(ship: ShipType, count: u64) -> Resources {
    ship_stats(ship).cost.saturating_mul(count)
}

/// Cost of `count` defense units.
pub const fn defense_cost(defense: DefenseType, count: u64) -> Resources {
    defense_stats(defense).cost.saturating_mul(count)
}

/// Subtract `cost` from `stock`.
///
/// # Errors
///
/// Returns [`EconomyError::InsufficientResources`] and leaves `stock`
/// untouched if any component falls short.
pub fn deduct(stock: &mut Resources, cost: &Resources) -> Result<(), EconomyError> {
    let left = stock
        .checked_sub(cost)
        .ok_or(EconomyError::InsufficientResources {
            required: *cost,
            available: *stock,
        })?;
    *stock = left;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_level_costs_base() {
        assert_eq!(
            building_cost(BuildingType::MetalMine, 1),
            Resources::new(60, 15, 0)
        );
        assert_eq!(building_cost(BuildingType::MetalMine, 0), Resources::ZERO);
    }

    #[test]
    fn cost_grows_by_multiplier() {
        // 60 * 1.5^2 = 135, 15 * 1.5^2 = 33.75
        assert_eq!(
            building_cost(BuildingType::MetalMine, 3),
            Resources::new(135, 33, 0)
        );
        assert_eq!(
            research_cost(TechnologyType::LaserTechnology, 4),
            Resources::new(1_600, 800, 0)
        );
    }

    #[test]
    fn unit_cost_scales_with_count() {
        assert_eq!(
            ship_cost(ShipType::SmallCargo, 3),
            Resources::new(6_000, 6_000, 0)
        );
        assert_eq!(
            defense_cost(DefenseType::RocketLauncher, 2),
            Resources::new(4_000, 0, 0)
        );
    }

    #[test]
    fn deduct_is_all_or_nothing() {
        let mut stock = Resources::new(100, 100, 0);
        assert!(deduct(&mut stock, &Resources::new(50, 150, 0)).is_err());
        assert_eq!(stock, Resources::new(100, 100, 0));

        assert!(deduct(&mut stock, &Resources::new(50, 50, 0)).is_ok());
        assert_eq!(stock, Resources::new(50, 50, 0));
    }
}
