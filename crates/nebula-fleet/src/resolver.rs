//! Mission lifecycle state machine.
//!
//! `outbound -> returning -> completed`. A successful deploy is one-way and
//! jumps straight to `completed`. [`resolve`] never mutates; it reports
//! which side effect the caller owes for the current time.

use nebula_types::{FleetMission, MissionStatus};
use serde::{Deserialize, Serialize};

/// What the caller should do with a mission at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionResolution {
    /// Status the mission moves to.
    pub new_status: MissionStatus,
    /// The arrival effect is due.
    pub should_process_arrival: bool,
    /// The fleet has come home and must be credited.
    pub should_process_return: bool,
    /// The record can be retired.
    pub is_completed: bool,
}

impl MissionResolution {
    const fn idle(status: MissionStatus) -> Self {
        Self {
            new_status: status,
            should_process_arrival: false,
            should_process_return: false,
            is_completed: false,
        }
    }
}

/// Classify `mission` at `now`.
///
/// - outbound and `now >= arrival_time`: arrival due, moves to returning
/// - returning and `now >= return_time`: return due, completed
/// - completed: nothing due, completed
/// - anything else: unchanged
pub const fn resolve(mission: &FleetMission, now: u64) -> MissionResolution {
    match mission.status {
        MissionStatus::Outbound => {
            if now >= mission.arrival_time {
                MissionResolution {
                    new_status: MissionStatus::Returning,
                    should_process_arrival: true,
                    should_process_return: false,
                    is_completed: false,
                }
            } else {
                MissionResolution::idle(MissionStatus::Outbound)
            }
        }
        MissionStatus::Returning => match mission.return_time {
            Some(return_time) if now >= return_time => MissionResolution {
                new_status: MissionStatus::Completed,
                should_process_arrival: false,
                should_process_return: true,
                is_completed: true,
            },
            _ => MissionResolution::idle(MissionStatus::Returning),
        },
        MissionStatus::Completed => MissionResolution {
            new_status: MissionStatus::Completed,
            should_process_arrival: false,
            should_process_return: false,
            is_completed: true,
        },
    }
}

/// The next timestamp at which [`resolve`] would report work, if any.
pub const fn next_event_time(mission: &FleetMission) -> Option<u64> {
    match mission.status {
        MissionStatus::Outbound => Some(mission.arrival_time),
        MissionStatus::Returning => mission.return_time,
        MissionStatus::Completed => None,
    }
}

/// Turn an outbound mission around.
///
/// The fleet takes as long to come home as it has already flown:
/// `return_time = now + (now - departure_time)`. Returns `false` and
/// leaves the mission untouched if it is not outbound or has already
/// reached its arrival time.
pub fn recall(mission: &mut FleetMission, now: u64) -> bool {
    if mission.status != MissionStatus::Outbound || now >= mission.arrival_time {
        return false;
    }
    let flown = now.saturating_sub(mission.departure_time);
    mission.status = MissionStatus::Returning;
    mission.return_time = Some(now.saturating_add(flown));
    true
}

/// Time left until the mission's next phase change.
pub fn remaining_time(mission: &FleetMission, now: u64) -> u64 {
    next_event_time(mission).map_or(0, |at| at.saturating_sub(now))
}

#[cfg(test)]
mod tests {
    use nebula_types::{
        Coordinate, MissionId, MissionKind, Owner, PlanetId, PlayerId, Resources, ShipType,
    };

    use super::*;

    fn mission(status: MissionStatus) -> FleetMission {
        FleetMission {
            id: MissionId::new(),
            owner: Owner::Player(PlayerId::new()),
            origin_planet: PlanetId::new(),
            target: Coordinate::new(1, 2, 3),
            target_planet: None,
            target_is_moon: false,
            kind: MissionKind::Transport,
            fleet: [(ShipType::SmallCargo, 2)].into_iter().collect(),
            cargo: Resources::ZERO,
            departure_time: 1_000,
            arrival_time: 5_000,
            return_time: Some(9_000),
            status,
        }
    }

    #[test]
    fn outbound_arrives_at_arrival_time() {
        let m = mission(MissionStatus::Outbound);
        assert!(!resolve(&m, 4_999).should_process_arrival);
        let at = resolve(&m, 5_000);
        assert!(at.should_process_arrival);
        assert_eq!(at.new_status, MissionStatus::Returning);
        assert!(!at.is_completed);
    }

    #[test]
    fn returning_completes_at_return_time() {
        let m = mission(MissionStatus::Returning);
        assert_eq!(resolve(&m, 8_999).new_status, MissionStatus::Returning);
        let done = resolve(&m, 9_000);
        assert!(done.should_process_return);
        assert!(done.is_completed);
    }

    #[test]
    fn returning_without_return_time_waits() {
        let mut m = mission(MissionStatus::Returning);
        m.return_time = None;
        assert!(!resolve(&m, u64::MAX).is_completed);
    }

    #[test]
    fn resolve_is_pure() {
        let m = mission(MissionStatus::Outbound);
        assert_eq!(resolve(&m, 6_000), resolve(&m, 6_000));
        assert_eq!(m.status, MissionStatus::Outbound);
    }

    #[test]
    fn recall_mirrors_elapsed_flight() {
        let mut m = mission(MissionStatus::Outbound);
        assert!(recall(&mut m, 3_000));
        assert_eq!(m.status, MissionStatus::Returning);
        assert_eq!(m.return_time, Some(5_000));
    }

    #[test]
    fn recall_after_arrival_or_return_is_noop() {
        let mut arrived = mission(MissionStatus::Outbound);
        assert!(!recall(&mut arrived, 5_000));
        assert_eq!(arrived.status, MissionStatus::Outbound);

        let mut returning = mission(MissionStatus::Returning);
        let before = returning.clone();
        assert!(!recall(&mut returning, 2_000));
        assert_eq!(returning, before);

        let mut completed = mission(MissionStatus::Completed);
        assert!(!recall(&mut completed, 2_000));
        assert_eq!(completed.status, MissionStatus::Completed);
    }

    #[test]
    fn next_event_follows_status() {
        assert_eq!(next_event_time(&mission(MissionStatus::Outbound)), Some(5_000));
        assert_eq!(next_event_time(&mission(MissionStatus::Returning)), Some(9_000));
        assert_eq!(next_event_time(&mission(MissionStatus::Completed)), None);
        assert_eq!(remaining_time(&mission(MissionStatus::Outbound), 4_000), 1_000);
    }
}
