//! Dirty-state tracking.
//!
//! Four independent hints telling the orchestrator which subsystems saw
//! new inputs. They only gate recomputation of cached values; a flag that
//! is never set delays a refresh but cannot corrupt state.

use serde::{Deserialize, Serialize};

/// Which subsystems need recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyFlags {
    economy: bool,
    fleet: bool,
    npc: bool,
    queues: bool,
}

impl Default for DirtyFlags {
    /// Everything dirty, so a cold start processes all subsystems.
    fn default() -> Self {
        Self::new()
    }
}

impl DirtyFlags {
    /// All four flags set.
    pub const fn new() -> Self {
        Self {
            economy: true,
            fleet: true,
            npc: true,
            queues: true,
        }
    }

    /// Production inputs changed (building levels, research, planets).
    pub const fn mark_economy(&mut self) {
        self.economy = true;
    }

    /// The mission list changed.
    pub const fn mark_fleet(&mut self) {
        self.fleet = true;
    }

    /// NPC state changed outside the NPC engine.
    pub const fn mark_npc(&mut self) {
        self.npc = true;
    }

    /// A queue gained or lost items.
    pub const fn mark_queues(&mut self) {
        self.queues = true;
    }

    /// Set every flag.
    pub const fn mark_all(&mut self) {
        *self = Self::new();
    }

    /// Clear every flag.
    pub const fn reset(&mut self) {
        self.economy = false;
        self.fleet = false;
        self.npc = false;
        self.queues = false;
    }

    /// Economy flag.
    pub const fn economy(&self) -> bool {
        self.economy
    }

    /// Fleet flag.
    pub const fn fleet(&self) -> bool {
        self.fleet
    }

    /// NPC flag.
    pub const fn npc(&self) -> bool {
        self.npc
    }

    /// Queue flag.
    pub const fn queues(&self) -> bool {
        self.queues
    }

    /// Whether any flag is set.
    pub const fn any(&self) -> bool {
        self.economy || self.fleet || self.npc || self.queues
    }

    pub(crate) const fn clear_economy(&mut self) {
        self.economy = false;
    }

    pub(crate) const fn clear_fleet(&mut self) {
        self.fleet = false;
    }

    pub(crate) const fn clear_npc(&mut self) {
        self.npc = false;
    }

    pub(crate) const fn clear_queues(&mut self) {
        self.queues = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_is_all_dirty() {
        let flags = DirtyFlags::default();
        assert!(flags.economy() && flags.fleet() && flags.npc() && flags.queues());
    }

    #[test]
    fn marks_are_independent() {
        let mut flags = DirtyFlags::new();
        flags.reset();
        assert!(!flags.any());
        flags.mark_fleet();
        assert!(flags.fleet());
        assert!(!flags.economy());
        assert!(!flags.npc());
        assert!(!flags.queues());
        flags.mark_all();
        assert_eq!(flags, DirtyFlags::new());
    }
}
