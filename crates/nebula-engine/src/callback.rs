//! Tick callback that writes tick outcomes to the log.
//!
//! Notifications are the engine's user-visible events; without a UI
//! attached they go to the log at a level matching their severity.

use nebula_core::runner::TickCallback;
use nebula_core::state::GameState;
use nebula_core::tick::TickSummary;
use nebula_types::Severity;
use tracing::{debug, error, info, warn};

/// Logs every notification and a periodic status line.
pub struct LogCallback {
    status_every: u64,
}

impl LogCallback {
    /// Log a status line every `status_every` ticks (0 disables it).
    pub const fn new(status_every: u64) -> Self {
        Self { status_every }
    }
}

impl TickCallback for LogCallback {
    fn on_tick(&mut self, summary: &TickSummary, state: &GameState) {
        for note in &summary.notifications {
            match note.severity {
                Severity::Info | Severity::Success => {
                    info!(tick = summary.tick, severity = ?note.severity, "{}", note.message);
                }
                Severity::Warning => warn!(tick = summary.tick, "{}", note.message),
                Severity::Error => error!(tick = summary.tick, "{}", note.message),
            }
        }

        if summary.catch_up {
            debug!(tick = summary.tick, delta_ms = summary.delta_ms, "Catch-up chunk applied");
        }

        let due = summary
            .tick
            .checked_rem(self.status_every)
            .is_some_and(|r| r == 0);
        if due {
            let stats = summary.relation_stats.unwrap_or_default();
            info!(
                tick = summary.tick,
                planets = state.player.planets.len(),
                missions = state.missions.len(),
                factions = state.npcs.len(),
                friendly = stats.friendly,
                hostile = stats.hostile,
                battles = state.battle_reports.len(),
                achievements = state.achievements.len(),
                "Status"
            );
        }
    }
}
