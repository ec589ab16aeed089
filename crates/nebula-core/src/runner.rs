//! Heartbeat loop with a catch-up loop and operator controls.
//!
//! [`run_engine`] drives an [`Orchestrator`] from a [`Clock`]:
//!
//! - **Main loop**: one tick every `tick_interval_ms` with a bounded delta
//! - **Catch-up loop**: while banked time remains, one chunk every
//!   `catch_up_interval_ms`; it starts when the main tick banks time and
//!   stops itself once the bank is empty
//! - **Pause/resume**: no ticks while paused; paused time is not simulated
//! - **Stop**: operator stop or `max_ticks` ends both loops
//!
//! Stopping does not cancel compute requests already in flight. The owner
//! disposes the orchestrator after the run, which rejects anything still
//! pending.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use crate::operator::{OperatorState, RunEndReason};
use crate::orchestrator::Orchestrator;
use crate::state::GameState;
use crate::tick::{TickError, TickSummary};
use crate::time_source;

/// Errors that can occur during the engine run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick could not run.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Cadence of the two loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Milliseconds between main ticks.
    pub tick_interval_ms: u64,
    /// Milliseconds between catch-up chunks.
    pub catch_up_interval_ms: u64,
}

/// Result of the engine run.
#[derive(Debug)]
pub struct RunResult {
    /// Why the run ended.
    pub end_reason: RunEndReason,
    /// Main ticks executed.
    pub total_ticks: u64,
    /// Catch-up chunks executed.
    pub catch_up_ticks: u64,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
}

/// Source of wall-clock milliseconds.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds.
    fn now_ms(&self) -> u64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        time_source::now_ms()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// A clock reading `now`.
    pub fn new(now: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    /// Jump to `now`.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::Release);
    }

    /// Move forward by `ms`.
    pub fn advance(&self, ms: u64) {
        let _ = self
            .now
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |now| {
                Some(now.saturating_add(ms))
            });
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}

/// Callback invoked after each tick completes.
///
/// Implementations can forward the summary's notifications to a UI,
/// persist a snapshot, and so on.
pub trait TickCallback: Send {
    /// Called after a main or catch-up tick.
    fn on_tick(&mut self, summary: &TickSummary, state: &GameState);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &GameState) {}
}

/// Run the heartbeat until the operator stops it or `max_ticks` main
/// ticks have run.
///
/// The orchestrator must already be initialized.
///
/// # Errors
///
/// Returns [`RunnerError`] if the orchestrator refuses to tick.
pub async fn run_engine(
    state: &mut GameState,
    orchestrator: &mut Orchestrator,
    operator: &Arc<OperatorState>,
    clock: &dyn Clock,
    settings: RunSettings,
    callback: &mut dyn TickCallback,
) -> Result<RunResult, RunnerError> {
    let mut main = interval(Duration::from_millis(settings.tick_interval_ms.max(1)));
    main.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut catch_up = interval(Duration::from_millis(settings.catch_up_interval_ms.max(1)));
    catch_up.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut catching_up = false;
    let mut total_ticks: u64 = 0;
    let mut catch_up_ticks: u64 = 0;
    let mut last_summary: Option<TickSummary> = None;

    info!(
        max_ticks = operator.max_ticks(),
        tick_interval_ms = settings.tick_interval_ms,
        catch_up_interval_ms = settings.catch_up_interval_ms,
        "Engine starting"
    );

    loop {
        if operator.is_paused() && !operator.is_stop_requested() {
            info!("Engine paused, waiting for resume...");
            operator.wait_if_paused().await;
            orchestrator.resync(clock.now_ms());
            main.reset();
            info!("Engine resumed");
        }

        if operator.is_stop_requested() {
            info!("Operator stop requested");
            return Ok(finish(
                RunEndReason::OperatorStop,
                total_ticks,
                catch_up_ticks,
                last_summary,
            ));
        }

        tokio::select! {
            _ = main.tick() => {
                let Some(summary) = orchestrator.advance(state, clock.now_ms()).await? else {
                    continue;
                };
                total_ticks = total_ticks.saturating_add(1);
                callback.on_tick(&summary, state);
                last_summary = Some(summary);

                if !catching_up && orchestrator.pending_catch_up() > 0 {
                    info!(pending_ms = orchestrator.pending_catch_up(), "Catch-up started");
                    catching_up = true;
                    catch_up.reset();
                }

                if operator.tick_limit_reached(total_ticks) {
                    info!(total_ticks, max_ticks = operator.max_ticks(), "Tick limit reached");
                    return Ok(finish(
                        RunEndReason::MaxTicksReached,
                        total_ticks,
                        catch_up_ticks,
                        last_summary,
                    ));
                }
            }
            _ = catch_up.tick(), if catching_up => {
                if let Some(summary) = orchestrator.catch_up_step(state, clock.now_ms()).await? {
                    catch_up_ticks = catch_up_ticks.saturating_add(1);
                    callback.on_tick(&summary, state);
                    last_summary = Some(summary);
                }
                if orchestrator.pending_catch_up() == 0 {
                    info!(catch_up_ticks, "Catch-up finished");
                    catching_up = false;
                }
            }
        }
    }
}

const fn finish(
    end_reason: RunEndReason,
    total_ticks: u64,
    catch_up_ticks: u64,
    final_summary: Option<TickSummary>,
) -> RunResult {
    RunResult {
        end_reason,
        total_ticks,
        catch_up_ticks,
        final_summary,
    }
}

/// Log the end of a run.
pub fn log_run_end(result: &RunResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        catch_up_ticks = result.catch_up_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Engine stopped"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            now = summary.now,
            delta_ms = summary.delta_ms,
            missions = summary.missions_resolved,
            battles = summary.battles,
            "Final tick summary"
        );
    } else {
        warn!("Engine stopped with no ticks executed");
    }
}
