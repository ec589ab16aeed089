//! Pre-dispatch validation.

use nebula_types::resources::unit_count;
use nebula_types::{DispatchRejection, Fleet, MissionKind, Resources, ShipType};

use crate::travel::{cargo_capacity, has_ships};

/// Check whether `fleet` may fly `kind` carrying `cargo`.
///
/// Checks run in a fixed order and the first failure wins: ships present,
/// fuel covered by `available_deuterium` (the cargo's deuterium counts
/// against it too), kind-specific ship requirement, then cargo space.
///
/// # Errors
///
/// Returns the first [`DispatchRejection`] that applies.
pub fn can_execute_mission(
    kind: MissionKind,
    fleet: &Fleet,
    cargo: &Resources,
    available_deuterium: u64,
    fuel: u64,
) -> Result<(), DispatchRejection> {
    if !has_ships(fleet) {
        return Err(DispatchRejection::NoShips);
    }
    if fuel.saturating_add(cargo.deuterium) > available_deuterium {
        return Err(DispatchRejection::InsufficientFuel);
    }
    let required = match kind {
        MissionKind::Colonize => Some((ShipType::ColonyShip, DispatchRejection::NoColonyShip)),
        MissionKind::Spy => Some((ShipType::EspionageProbe, DispatchRejection::NoSpyProbe)),
        MissionKind::Recycle => Some((ShipType::Recycler, DispatchRejection::NoRecycler)),
        MissionKind::Destroy => Some((ShipType::Deathstar, DispatchRejection::NoDeathstar)),
        MissionKind::Transport
        | MissionKind::Attack
        | MissionKind::Deploy
        | MissionKind::Expedition => None,
    };
    if let Some((_, rejection)) = required.filter(|&(ship, _)| unit_count(fleet, &ship) == 0) {
        return Err(rejection);
    }
    if cargo.cargo_total() > cargo_capacity(fleet) {
        return Err(DispatchRejection::InsufficientCargo);
    }
    Ok(())
}
