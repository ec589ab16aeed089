//! Error types for the `nebula-fleet` crate.

use nebula_types::{DispatchRejection, Resources, ShipType};

/// Errors raised while dispatching a fleet.
///
/// Arrival-time problems are never errors; they become failed mission
/// reports with a [`nebula_types::MissionFailReason`].
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    /// The mission failed pre-dispatch validation.
    #[error("mission rejected: {0:?}")]
    Rejected(DispatchRejection),

    /// The origin planet does not have the ships requested.
    #[error("origin has {available} {ship:?}, {requested} requested")]
    ShipsUnavailable {
        /// Ship type that is short.
        ship: ShipType,
        /// Ships asked for.
        requested: u64,
        /// Ships stationed.
        available: u64,
    },

    /// The origin planet cannot pay for the cargo and fuel.
    #[error("insufficient resources at origin: need {required:?}, have {available:?}")]
    InsufficientResources {
        /// Cargo plus fuel.
        required: Resources,
        /// Origin stock.
        available: Resources,
    },

    /// Energy cannot be loaded as cargo.
    #[error("energy cannot be transported")]
    EnergyCargo,
}

impl From<DispatchRejection> for MissionError {
    fn from(rejection: DispatchRejection) -> Self {
        Self::Rejected(rejection)
    }
}
