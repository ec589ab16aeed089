//! Error types for the `nebula-npc` crate.

use nebula_types::{NpcId, PlanetId};

/// Errors raised while advancing one NPC.
///
/// The engine logs these and moves on to the next NPC.
#[derive(Debug, thiserror::Error)]
pub enum NpcError {
    /// The NPC lists a planet that is not in the universe.
    #[error("npc {npc} owns missing planet {planet}")]
    MissingPlanet {
        /// The NPC.
        npc: NpcId,
        /// The planet that could not be found.
        planet: PlanetId,
    },
}
