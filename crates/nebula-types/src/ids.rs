//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the simulation carries a strongly-typed ID so that a
//! planet ID can never be passed where a mission ID is expected. All IDs
//! use UUID v7 (time-ordered), which keeps `BTreeMap` iteration roughly in
//! creation order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a planet or moon.
    PlanetId
}

define_id! {
    /// Unique identifier for the human player.
    PlayerId
}

define_id! {
    /// Unique identifier for an autonomous faction (NPC).
    NpcId
}

define_id! {
    /// Unique identifier for a fleet mission.
    MissionId
}

define_id! {
    /// Unique identifier for a battle, mission, or spy report.
    ReportId
}

define_id! {
    /// Unique identifier for a build/research queue item.
    QueueItemId
}

define_id! {
    /// Correlation identifier for a request sent to the compute unit.
    RequestId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let planet = PlanetId::new();
        let mission = MissionId::new();
        assert_ne!(planet.into_inner(), Uuid::nil());
        assert_ne!(mission.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = RequestId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<RequestId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = NpcId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
