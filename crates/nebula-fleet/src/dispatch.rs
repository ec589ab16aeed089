//! Launching a fleet from a planet.

use nebula_types::resources::{remove_units, unit_count};
use nebula_types::{
    Coordinate, Fleet, FleetMission, MissionId, MissionKind, MissionStatus, Owner, Planet,
    PlanetId, Resources,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MissionError;
use crate::travel::{distance, flight_time_ms, fuel_consumption};
use crate::validate::can_execute_mission;

/// What the sender asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// Mission kind.
    pub kind: MissionKind,
    /// Destination.
    pub target: Coordinate,
    /// Planet known at the destination, if any.
    pub target_planet: Option<PlanetId>,
    /// Whether the destination is a moon.
    pub target_is_moon: bool,
    /// Ships to send.
    pub fleet: Fleet,
    /// Resources to load.
    pub cargo: Resources,
}

/// Universe-wide flight modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightParams {
    /// Fleet speed multiplier.
    pub speed_multiplier: f64,
    /// Fuel reduction in percent (officer bonus).
    pub fuel_reduction_pct: u32,
}

impl Default for FlightParams {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            fuel_reduction_pct: 0,
        }
    }
}

/// Fuel for a one-way trip after the percentage reduction.
pub fn trip_fuel(fleet: &Fleet, distance: u64, fuel_reduction_pct: u32) -> u64 {
    let base = fuel_consumption(fleet, distance);
    let keep = 100_u64.saturating_sub(u64::from(fuel_reduction_pct));
    base.saturating_mul(keep).saturating_div(100)
}

/// Validate and launch a mission from `origin`.
///
/// On success the ships leave the origin's hangar and the cargo plus fuel
/// leave its stock. Arrival is `now + flight`, return is
/// `arrival + flight`. On error `origin` is untouched.
///
/// # Errors
///
/// - [`MissionError::EnergyCargo`] if energy is loaded
/// - [`MissionError::ShipsUnavailable`] if the hangar is short
/// - [`MissionError::Rejected`] if [`can_execute_mission`] fails
/// - [`MissionError::InsufficientResources`] if the stock cannot cover
///   cargo and fuel
pub fn dispatch(
    origin: &mut Planet,
    owner: Owner,
    request: DispatchRequest,
    now: u64,
    params: FlightParams,
) -> Result<FleetMission, MissionError> {
    let DispatchRequest {
        kind,
        target,
        target_planet,
        target_is_moon,
        mut fleet,
        cargo,
    } = request;
    if cargo.energy > 0 {
        return Err(MissionError::EnergyCargo);
    }
    fleet.retain(|_, count| *count > 0);
    for (&ship, &requested) in &fleet {
        let available = unit_count(&origin.fleet, &ship);
        if available < requested {
            return Err(MissionError::ShipsUnavailable {
                ship,
                requested,
                available,
            });
        }
    }

    let trip = distance(origin.coordinate, target);
    let fuel = trip_fuel(&fleet, trip, params.fuel_reduction_pct);
    can_execute_mission(kind, &fleet, &cargo, origin.resources.deuterium, fuel)?;

    let mut required = cargo;
    required.deuterium = required.deuterium.saturating_add(fuel);
    let remaining = origin
        .resources
        .checked_sub(&required)
        .ok_or(MissionError::InsufficientResources {
            required,
            available: origin.resources,
        })?;

    origin.resources = remaining;
    for (&ship, &count) in &fleet {
        remove_units(&mut origin.fleet, ship, count);
    }

    let flight = flight_time_ms(origin.coordinate, target, &fleet, params.speed_multiplier);
    let arrival_time = now.saturating_add(flight);
    let mission = FleetMission {
        id: MissionId::new(),
        owner,
        origin_planet: origin.id,
        target,
        target_planet,
        target_is_moon,
        kind,
        fleet,
        cargo,
        departure_time: now,
        arrival_time,
        return_time: Some(arrival_time.saturating_add(flight)),
        status: MissionStatus::Outbound,
    };
    debug!(
        mission_id = %mission.id,
        kind = ?kind,
        target = %target,
        fuel,
        arrival_time,
        "Fleet dispatched"
    );
    Ok(mission)
}
