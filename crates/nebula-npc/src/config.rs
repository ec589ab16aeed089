//! Tunables for the NPC engine.
//!
//! Embedded as the `npc` section of the game configuration file. Every
//! field has a default so a partial section is fine.

use serde::{Deserialize, Serialize};

/// NPC engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcSettings {
    /// NPCs advanced per growth or behavior pass.
    #[serde(default = "default_slice_size")]
    pub slice_size: usize,

    /// Elapsed game time between growth passes (ms).
    #[serde(default = "default_phase_interval_ms")]
    pub growth_interval_ms: u64,

    /// Elapsed game time between behavior passes (ms).
    #[serde(default = "default_phase_interval_ms")]
    pub behavior_interval_ms: u64,

    /// Cap on NPC spy missions outbound at once, across all NPCs.
    #[serde(default = "default_max_spy_missions")]
    pub max_spy_missions: u32,

    /// Cap on NPC attack missions outbound at once, across all NPCs.
    #[serde(default = "default_max_attack_missions")]
    pub max_attack_missions: u32,

    /// Minimum gap between one NPC's spy launches (ms).
    #[serde(default = "default_spy_cooldown_ms")]
    pub spy_cooldown_ms: u64,

    /// Minimum gap between one NPC's attack launches (ms).
    #[serde(default = "default_attack_cooldown_ms")]
    pub attack_cooldown_ms: u64,

    /// Chance per behavior pass that a neutral NPC offers a trade.
    #[serde(default = "default_trade_offer_chance")]
    pub trade_offer_chance: f64,

    /// Chance per behavior pass that a neutral NPC's attitude swings.
    #[serde(default = "default_attitude_swing_chance")]
    pub attitude_swing_chance: f64,

    /// Chance per behavior pass that a friendly NPC shares intel.
    #[serde(default = "default_intel_chance")]
    pub intel_chance: f64,

    /// Chance per behavior pass that a friendly NPC proposes a joint attack.
    #[serde(default = "default_joint_attack_chance")]
    pub joint_attack_chance: f64,

    /// Chance per behavior pass that a friendly NPC sends aid.
    #[serde(default = "default_aid_chance")]
    pub aid_chance: f64,
}

impl Default for NpcSettings {
    fn default() -> Self {
        Self {
            slice_size: default_slice_size(),
            growth_interval_ms: default_phase_interval_ms(),
            behavior_interval_ms: default_phase_interval_ms(),
            max_spy_missions: default_max_spy_missions(),
            max_attack_missions: default_max_attack_missions(),
            spy_cooldown_ms: default_spy_cooldown_ms(),
            attack_cooldown_ms: default_attack_cooldown_ms(),
            trade_offer_chance: default_trade_offer_chance(),
            attitude_swing_chance: default_attitude_swing_chance(),
            intel_chance: default_intel_chance(),
            joint_attack_chance: default_joint_attack_chance(),
            aid_chance: default_aid_chance(),
        }
    }
}

const fn default_slice_size() -> usize {
    20
}

const fn default_phase_interval_ms() -> u64 {
    5_000
}

const fn default_max_spy_missions() -> u32 {
    3
}

const fn default_max_attack_missions() -> u32 {
    2
}

const fn default_spy_cooldown_ms() -> u64 {
    240_000
}

const fn default_attack_cooldown_ms() -> u64 {
    480_000
}

const fn default_trade_offer_chance() -> f64 {
    0.05
}

const fn default_attitude_swing_chance() -> f64 {
    0.02
}

const fn default_intel_chance() -> f64 {
    0.05
}

const fn default_joint_attack_chance() -> f64 {
    0.02
}

const fn default_aid_chance() -> f64 {
    0.03
}
