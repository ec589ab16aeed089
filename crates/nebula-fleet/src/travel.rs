//! Distance, flight time, fuel, and cargo math.
//!
//! A fleet always travels at the speed of its slowest ship.

use nebula_types::data::ship_stats;
use nebula_types::math::{ceil_u64, round_u64, to_f64};
use nebula_types::resources::total_units;
use nebula_types::{Coordinate, Fleet};

/// Distance between two slots in the same position.
pub const SAME_SLOT_DISTANCE: u64 = 5;

/// Abstract distance between two coordinates.
///
/// - same slot: 5
/// - same system: `1000 + 5 × |Δposition|`
/// - same galaxy: `2700 + 95 × |Δsystem|`
/// - otherwise: `20000 × |Δgalaxy|`
pub fn distance(from: Coordinate, to: Coordinate) -> u64 {
    if from.galaxy != to.galaxy {
        return 20_000_u64.saturating_mul(u64::from(from.galaxy.abs_diff(to.galaxy)));
    }
    if from.system != to.system {
        return 2_700_u64
            .saturating_add(95_u64.saturating_mul(u64::from(from.system.abs_diff(to.system))));
    }
    if from.position != to.position {
        return 1_000_u64
            .saturating_add(5_u64.saturating_mul(u64::from(from.position.abs_diff(to.position))));
    }
    SAME_SLOT_DISTANCE
}

/// Speed of the slowest ship present, or `None` for an empty fleet.
pub fn min_speed(fleet: &Fleet) -> Option<u64> {
    fleet
        .iter()
        .filter(|&(_, &count)| count > 0)
        .map(|(&ship, _)| ship_stats(ship).speed)
        .min()
}

/// One-way flight time in seconds:
/// `round(10 + 35000 / multiplier × sqrt(distance × 10 / min_speed))`.
///
/// An empty fleet (no speed) takes zero time. The 10-second term is the
/// floor for any trip.
pub fn flight_time_secs(
    from: Coordinate,
    to: Coordinate,
    fleet: &Fleet,
    speed_multiplier: f64,
) -> u64 {
    let Some(speed) = min_speed(fleet).filter(|&s| s > 0) else {
        return 0;
    };
    let multiplier = if speed_multiplier > 0.0 {
        speed_multiplier
    } else {
        1.0
    };
    let ratio = to_f64(distance(from, to)) * 10.0 / to_f64(speed);
    round_u64((35_000.0 / multiplier).mul_add(ratio.sqrt(), 10.0))
}

/// One-way flight time in milliseconds.
pub fn flight_time_ms(
    from: Coordinate,
    to: Coordinate,
    fleet: &Fleet,
    speed_multiplier: f64,
) -> u64 {
    flight_time_secs(from, to, fleet, speed_multiplier).saturating_mul(1_000)
}

/// Deuterium burned by a one-way trip over `distance`:
/// `ceil(fuel × (1 + distance / 35000) × count)` per ship type.
pub fn fuel_consumption(fleet: &Fleet, distance: u64) -> u64 {
    let factor = 1.0 + to_f64(distance) / 35_000.0;
    fleet
        .iter()
        .filter(|&(_, &count)| count > 0)
        .map(|(&ship, &count)| ceil_u64(to_f64(ship_stats(ship).fuel) * factor * to_f64(count)))
        .fold(0_u64, u64::saturating_add)
}

/// Total cargo capacity of a fleet.
pub fn cargo_capacity(fleet: &Fleet) -> u64 {
    fleet
        .iter()
        .map(|(&ship, &count)| ship_stats(ship).cargo.saturating_mul(count))
        .fold(0_u64, u64::saturating_add)
}

/// Whether the fleet has any ship at all.
pub fn has_ships(fleet: &Fleet) -> bool {
    total_units(fleet) > 0
}

#[cfg(test)]
mod tests {
    use nebula_types::ShipType;

    use super::*;

    fn fleet(entries: &[(ShipType, u64)]) -> Fleet {
        entries.iter().copied().collect()
    }

    #[test]
    fn distance_tiers() {
        let home = Coordinate::new(1, 10, 5);
        assert_eq!(distance(home, home), 5);
        assert_eq!(distance(home, Coordinate::new(1, 10, 8)), 1_015);
        assert_eq!(distance(home, Coordinate::new(1, 11, 5)), 2_795);
        assert_eq!(distance(home, Coordinate::new(3, 10, 5)), 40_000);
    }

    #[test]
    fn slowest_ship_sets_pace() {
        let f = fleet(&[(ShipType::LightFighter, 10), (ShipType::SmallCargo, 1)]);
        assert_eq!(min_speed(&f), Some(5_000));
        assert_eq!(min_speed(&Fleet::new()), None);
    }

    #[test]
    fn flight_time_formula() {
        let f = fleet(&[(ShipType::HeavyFighter, 3)]);
        let from = Coordinate::new(1, 1, 1);
        let to = Coordinate::new(1, 2, 1);
        let expected = (35_000.0_f64 * (2_795.0_f64 * 10.0 / 10_000.0).sqrt() + 10.0).round();
        assert_eq!(flight_time_secs(from, to, &f, 1.0), round_u64(expected));
        assert_eq!(flight_time_secs(from, to, &Fleet::new(), 1.0), 0);
    }

    #[test]
    fn faster_universe_shortens_trips() {
        let f = fleet(&[(ShipType::Cruiser, 1)]);
        let from = Coordinate::new(1, 1, 1);
        let to = Coordinate::new(2, 1, 1);
        assert!(flight_time_secs(from, to, &f, 2.0) < flight_time_secs(from, to, &f, 1.0));
    }

    #[test]
    fn fuel_rounds_up_per_type() {
        let f = fleet(&[(ShipType::SmallCargo, 3)]);
        // 10 * (1 + 35000/35000) * 3 = 60
        assert_eq!(fuel_consumption(&f, 35_000), 60);
        // 10 * (1 + 1000/35000) * 1 = 10.28.. -> 11
        assert_eq!(fuel_consumption(&fleet(&[(ShipType::SmallCargo, 1)]), 1_000), 11);
    }

    #[test]
    fn cargo_sums_all_ships() {
        let f = fleet(&[(ShipType::SmallCargo, 2), (ShipType::LargeCargo, 1)]);
        assert_eq!(cargo_capacity(&f), 35_000);
    }
}
