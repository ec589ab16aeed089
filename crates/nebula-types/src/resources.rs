//! Resource bundles and unit-count maps.
//!
//! [`Resources`] is used for planet stocks, storage capacities, costs,
//! cargo, plunder, and debris. All arithmetic saturates: a stock can never
//! go negative and an addition can never wrap.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::ResourceKind;

/// An amount of each resource kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Resources {
    /// Metal amount.
    pub metal: u64,
    /// Crystal amount.
    pub crystal: u64,
    /// Deuterium amount.
    pub deuterium: u64,
    /// Dark matter amount.
    pub dark_matter: u64,
    /// Energy amount (capacity or balance; never stocked by production).
    pub energy: u64,
}

impl Resources {
    /// All resources at zero.
    pub const ZERO: Self = Self {
        metal: 0,
        crystal: 0,
        deuterium: 0,
        dark_matter: 0,
        energy: 0,
    };

    /// Build a bundle of the three basic resources.
    pub const fn new(metal: u64, crystal: u64, deuterium: u64) -> Self {
        Self {
            metal,
            crystal,
            deuterium,
            dark_matter: 0,
            energy: 0,
        }
    }

    /// Read one resource.
    pub const fn get(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Metal => self.metal,
            ResourceKind::Crystal => self.crystal,
            ResourceKind::Deuterium => self.deuterium,
            ResourceKind::DarkMatter => self.dark_matter,
            ResourceKind::Energy => self.energy,
        }
    }

    /// Overwrite one resource.
    pub const fn set(&mut self, kind: ResourceKind, amount: u64) {
        match kind {
            ResourceKind::Metal => self.metal = amount,
            ResourceKind::Crystal => self.crystal = amount,
            ResourceKind::Deuterium => self.deuterium = amount,
            ResourceKind::DarkMatter => self.dark_matter = amount,
            ResourceKind::Energy => self.energy = amount,
        }
    }

    /// Component-wise saturating addition.
    #[must_use]
    pub const fn saturating_add(&self, other: &Self) -> Self {
        Self {
            metal: self.metal.saturating_add(other.metal),
            crystal: self.crystal.saturating_add(other.crystal),
            deuterium: self.deuterium.saturating_add(other.deuterium),
            dark_matter: self.dark_matter.saturating_add(other.dark_matter),
            energy: self.energy.saturating_add(other.energy),
        }
    }

    /// Component-wise saturating subtraction (floored at zero).
    #[must_use]
    pub const fn saturating_sub(&self, other: &Self) -> Self {
        Self {
            metal: self.metal.saturating_sub(other.metal),
            crystal: self.crystal.saturating_sub(other.crystal),
            deuterium: self.deuterium.saturating_sub(other.deuterium),
            dark_matter: self.dark_matter.saturating_sub(other.dark_matter),
            energy: self.energy.saturating_sub(other.energy),
        }
    }

    /// Every component multiplied by `factor`, saturating.
    #[must_use]
    pub const fn saturating_mul(&self, factor: u64) -> Self {
        Self {
            metal: self.metal.saturating_mul(factor),
            crystal: self.crystal.saturating_mul(factor),
            deuterium: self.deuterium.saturating_mul(factor),
            dark_matter: self.dark_matter.saturating_mul(factor),
            energy: self.energy.saturating_mul(factor),
        }
    }

    /// Component-wise subtraction, or `None` if any component would go
    /// negative.
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        Some(Self {
            metal: self.metal.checked_sub(other.metal)?,
            crystal: self.crystal.checked_sub(other.crystal)?,
            deuterium: self.deuterium.checked_sub(other.deuterium)?,
            dark_matter: self.dark_matter.checked_sub(other.dark_matter)?,
            energy: self.energy.checked_sub(other.energy)?,
        })
    }

    /// Whether every component of `self` is at least the matching
    /// component of `cost`.
    pub const fn covers(&self, cost: &Self) -> bool {
        self.metal >= cost.metal
            && self.crystal >= cost.crystal
            && self.deuterium >= cost.deuterium
            && self.dark_matter >= cost.dark_matter
            && self.energy >= cost.energy
    }

    /// Component-wise minimum.
    #[must_use]
    pub fn min(&self, other: &Self) -> Self {
        Self {
            metal: self.metal.min(other.metal),
            crystal: self.crystal.min(other.crystal),
            deuterium: self.deuterium.min(other.deuterium),
            dark_matter: self.dark_matter.min(other.dark_matter),
            energy: self.energy.min(other.energy),
        }
    }

    /// Sum of metal, crystal, and deuterium.
    pub const fn plunderable_total(&self) -> u64 {
        self.metal
            .saturating_add(self.crystal)
            .saturating_add(self.deuterium)
    }

    /// Sum of every transportable resource (everything but energy).
    pub const fn cargo_total(&self) -> u64 {
        self.plunderable_total().saturating_add(self.dark_matter)
    }

    /// Keep only the transportable components (drops energy).
    #[must_use]
    pub const fn cargo_only(&self) -> Self {
        Self {
            energy: 0,
            ..*self
        }
    }

    /// Whether every component is zero.
    pub const fn is_empty(&self) -> bool {
        self.metal == 0
            && self.crystal == 0
            && self.deuterium == 0
            && self.dark_matter == 0
            && self.energy == 0
    }
}

// ---------------------------------------------------------------------------
// Unit-count maps
// ---------------------------------------------------------------------------

/// Add `count` units of `key` to a partial count map.
pub fn add_units<K: Ord + Copy>(map: &mut BTreeMap<K, u64>, key: K, count: u64) {
    if count == 0 {
        return;
    }
    let entry = map.entry(key).or_insert(0);
    *entry = entry.saturating_add(count);
}

/// Remove up to `count` units of `key`. Returns how many were removed.
/// Entries that reach zero are dropped so the map stays partial.
pub fn remove_units<K: Ord + Copy>(map: &mut BTreeMap<K, u64>, key: K, count: u64) -> u64 {
    let Some(entry) = map.get_mut(&key) else {
        return 0;
    };
    let removed = count.min(*entry);
    *entry = entry.saturating_sub(removed);
    if *entry == 0 {
        map.remove(&key);
    }
    removed
}

/// Merge every count of `other` into `map`.
pub fn merge_units<K: Ord + Copy>(map: &mut BTreeMap<K, u64>, other: &BTreeMap<K, u64>) {
    for (&key, &count) in other {
        add_units(map, key, count);
    }
}

/// Total number of units across all keys.
pub fn total_units<K>(map: &BTreeMap<K, u64>) -> u64 {
    map.values().fold(0_u64, |acc, &n| acc.saturating_add(n))
}

/// Count for `key`, zero when absent.
pub fn unit_count<K: Ord>(map: &BTreeMap<K, u64>, key: &K) -> u64 {
    map.get(key).copied().unwrap_or(0)
}

/// Per-key difference `before - after`, omitting non-positive entries.
pub fn unit_losses<K: Ord + Copy>(
    before: &BTreeMap<K, u64>,
    after: &BTreeMap<K, u64>,
) -> BTreeMap<K, u64> {
    before
        .iter()
        .filter_map(|(&key, &n)| {
            let lost = n.saturating_sub(unit_count(after, &key));
            (lost > 0).then_some((key, lost))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::ShipType;

    #[test]
    fn saturating_sub_never_goes_negative() {
        let stock = Resources::new(10, 5, 0);
        let cost = Resources::new(20, 1, 3);
        let left = stock.saturating_sub(&cost);
        assert_eq!(left, Resources::new(0, 4, 0));
        assert!(stock.checked_sub(&cost).is_none());
    }

    #[test]
    fn covers_compares_every_component() {
        let stock = Resources::new(100, 100, 100);
        assert!(stock.covers(&Resources::new(100, 0, 50)));
        assert!(!stock.covers(&Resources::new(101, 0, 0)));
    }

    #[test]
    fn cargo_excludes_energy() {
        let mut r = Resources::new(1, 2, 3);
        r.dark_matter = 4;
        r.energy = 100;
        assert_eq!(r.plunderable_total(), 6);
        assert_eq!(r.cargo_total(), 10);
        assert_eq!(r.cargo_only().energy, 0);
    }

    #[test]
    fn unit_maps_stay_partial() {
        let mut fleet = BTreeMap::new();
        add_units(&mut fleet, ShipType::Cruiser, 3);
        add_units(&mut fleet, ShipType::Recycler, 0);
        assert_eq!(fleet.len(), 1);

        let removed = remove_units(&mut fleet, ShipType::Cruiser, 5);
        assert_eq!(removed, 3);
        assert!(fleet.is_empty());
    }

    #[test]
    fn losses_are_before_minus_after() {
        let mut before = BTreeMap::new();
        before.insert(ShipType::LightFighter, 10);
        before.insert(ShipType::Battleship, 2);
        let mut after = BTreeMap::new();
        after.insert(ShipType::LightFighter, 4);
        after.insert(ShipType::Battleship, 2);

        let losses = unit_losses(&before, &after);
        assert_eq!(losses.len(), 1);
        assert_eq!(unit_count(&losses, &ShipType::LightFighter), 6);
    }
}
