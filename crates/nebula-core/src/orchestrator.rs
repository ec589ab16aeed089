//! Per-tick orchestration over explicitly owned services.
//!
//! The [`Orchestrator`] owns the time source, dirty flags, scheduler, NPC
//! engine, compute unit, and random source. It is constructed with its
//! services, brought up with [`Orchestrator::init`], and torn down with
//! [`Orchestrator::dispose`]. Each tick runs the phases in
//! [`crate::tick`] in order and hands back a [`TickSummary`] whose
//! notification list the caller drains.

use std::sync::Arc;

use nebula_economy::offline_efficiency;
use nebula_fleet::{DispatchRequest, FlightParams, dispatch};
use nebula_npc::NpcEngine;
use nebula_types::{MissionId, Owner, PlanetId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::compute::ComputeUnit;
use crate::config::{GameConfig, ProgressionConfig};
use crate::dirty::DirtyFlags;
use crate::operator::OperatorState;
use crate::progression::{self, ProgressionError};
use crate::scheduler::Scheduler;
use crate::state::GameState;
use crate::tick::{self, ProductionCache, TickContext, TickError, TickSummary};
use crate::time_source::TimeSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Running,
    Disposed,
}

/// Sequences the tick phases over one [`GameState`].
#[derive(Debug)]
pub struct Orchestrator {
    time_source: TimeSource,
    dirty: DirtyFlags,
    scheduler: Scheduler<GameState, ProgressionError>,
    npc_engine: NpcEngine,
    compute: ComputeUnit,
    operator: Arc<OperatorState>,
    rng: StdRng,
    production_cache: ProductionCache,
    progression: ProgressionConfig,
    game_speed: f64,
    lifecycle: Lifecycle,
    tick_count: u64,
}

impl Orchestrator {
    /// Assemble an orchestrator from its services.
    ///
    /// Nothing runs until [`init`](Self::init) is called.
    pub fn new(config: &GameConfig, compute: ComputeUnit, operator: Arc<OperatorState>) -> Self {
        Self {
            time_source: TimeSource::new(config.time_source, 0),
            dirty: DirtyFlags::new(),
            scheduler: Scheduler::new(),
            npc_engine: NpcEngine::new(config.npc.clone()),
            compute,
            operator,
            rng: StdRng::seed_from_u64(config.engine.seed),
            production_cache: ProductionCache::new(),
            progression: config.progression,
            game_speed: config.engine.game_speed,
            lifecycle: Lifecycle::Created,
            tick_count: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Resync the time source to `now` and register the scheduled jobs.
    ///
    /// Calling it again while running is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Disposed`] after [`dispose`](Self::dispose).
    pub fn init(&mut self, now: u64) -> Result<(), TickError> {
        match self.lifecycle {
            Lifecycle::Disposed => return Err(TickError::Disposed),
            Lifecycle::Running => return Ok(()),
            Lifecycle::Created => {}
        }
        self.time_source.reset(now);
        self.scheduler.clear();
        progression::register(&mut self.scheduler, &self.progression);
        self.dirty.mark_all();
        self.lifecycle = Lifecycle::Running;
        info!(
            now,
            jobs = self.scheduler.len(),
            game_speed = self.game_speed,
            npc_slice = self.npc_engine.slice_size(),
            "Orchestrator initialized"
        );
        Ok(())
    }

    /// Tear down the compute unit and drop scheduled jobs. Idempotent.
    pub fn dispose(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        self.compute.dispose();
        self.scheduler.clear();
        self.production_cache.clear();
        self.lifecycle = Lifecycle::Disposed;
        info!(ticks = self.tick_count, "Orchestrator disposed");
    }

    const fn ensure_running(&self) -> Result<(), TickError> {
        match self.lifecycle {
            Lifecycle::Running => Ok(()),
            Lifecycle::Created => Err(TickError::NotInitialized),
            Lifecycle::Disposed => Err(TickError::Disposed),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Stop mutating game state until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.operator.pause();
    }

    /// Resume ticking.
    pub fn resume(&self) {
        self.operator.resume();
    }

    /// Whether ticks are currently no-ops.
    pub fn is_paused(&self) -> bool {
        self.operator.is_paused()
    }

    /// Move the time source's reference to `now` without simulating the
    /// time in between.
    pub const fn resync(&mut self, now: u64) {
        self.time_source.reset(now);
    }

    // -----------------------------------------------------------------------
    // Ticks
    // -----------------------------------------------------------------------

    /// Run a main tick at wall-clock `now`.
    ///
    /// While paused this only resyncs the time source, so paused time is
    /// never simulated, and returns `None`.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::NotInitialized`] or [`TickError::Disposed`]
    /// outside the running lifecycle.
    pub async fn advance(
        &mut self,
        state: &mut GameState,
        now: u64,
    ) -> Result<Option<TickSummary>, TickError> {
        self.ensure_running()?;
        if self.is_paused() {
            self.time_source.reset(now);
            return Ok(None);
        }
        let delta_ms = self.time_source.advance(now);
        let ctx = TickContext {
            now,
            delta_ms,
            efficiency_pct: 100,
            catch_up: false,
        };
        Ok(Some(self.run_tick(state, ctx).await))
    }

    /// Drain one chunk of banked catch-up time.
    ///
    /// Production during the chunk is scaled by the offline efficiency of
    /// the gap that banked it. Returns `None` when nothing is banked or
    /// the orchestrator is paused.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::NotInitialized`] or [`TickError::Disposed`]
    /// outside the running lifecycle.
    pub async fn catch_up_step(
        &mut self,
        state: &mut GameState,
        now: u64,
    ) -> Result<Option<TickSummary>, TickError> {
        self.ensure_running()?;
        if self.is_paused() {
            return Ok(None);
        }
        let Some(chunk) = self.time_source.next_chunk() else {
            return Ok(None);
        };
        let ctx = TickContext {
            now,
            delta_ms: chunk,
            efficiency_pct: offline_efficiency(self.time_source.last_gap_ms()),
            catch_up: true,
        };
        Ok(Some(self.run_tick(state, ctx).await))
    }

    async fn run_tick(&mut self, state: &mut GameState, ctx: TickContext) -> TickSummary {
        self.tick_count = self.tick_count.saturating_add(1);

        let completed_work = tick::phase_economy(
            state,
            &ctx,
            &mut self.dirty,
            &mut self.production_cache,
            self.game_speed,
        );
        let missions =
            tick::phase_missions(state, &ctx, &self.compute, &mut self.dirty, &mut self.rng).await;
        let npcs = tick::phase_npcs(
            state,
            &ctx,
            &mut self.npc_engine,
            &mut self.dirty,
            self.game_speed,
            &mut self.rng,
        );

        let (jobs_run, failures) = self.scheduler.tick(state, ctx.now);
        for failure in &failures {
            warn!(job = failure.job, error = %failure.source, "Scheduled job failed");
        }

        let summary = TickSummary {
            tick: self.tick_count,
            now: ctx.now,
            delta_ms: ctx.delta_ms,
            catch_up: ctx.catch_up,
            completed_work,
            missions_resolved: missions.resolved,
            battles: missions.battles,
            npcs_grown: npcs.grown,
            npcs_acted: npcs.acted,
            relation_stats: npcs.relation_stats,
            jobs_run,
            notifications: state.drain_notifications(),
        };
        debug!(
            tick = summary.tick,
            now = summary.now,
            delta_ms = summary.delta_ms,
            catch_up = summary.catch_up,
            completed = summary.completed_work.len(),
            missions = summary.missions_resolved,
            battles = summary.battles,
            combat_failures = missions.combat_failures,
            npcs_grown = summary.npcs_grown,
            npcs_acted = summary.npcs_acted,
            "Tick completed"
        );
        summary
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Launch a fleet from planet `origin` on behalf of its owner.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::UnknownPlanet`] if `origin` does not exist and
    /// [`TickError::Dispatch`] if the launch is rejected.
    pub fn dispatch(
        &mut self,
        state: &mut GameState,
        origin: PlanetId,
        request: DispatchRequest,
        now: u64,
    ) -> Result<MissionId, TickError> {
        self.ensure_running()?;
        let fuel_reduction_pct = state.player.bonuses.fuel_reduction_pct;
        let planet = state
            .planets
            .get_mut(&origin)
            .ok_or(TickError::UnknownPlanet { planet_id: origin })?;
        let owner = planet.owner;
        let params = FlightParams {
            speed_multiplier: self.game_speed,
            fuel_reduction_pct: if owner.is_player() {
                fuel_reduction_pct
            } else {
                0
            },
        };
        let mission = dispatch(planet, owner, request, now, params)?;
        let id = mission.id;
        info!(
            mission_id = %id,
            kind = ?mission.kind,
            target = %mission.target,
            arrival_time = mission.arrival_time,
            "Fleet dispatched"
        );
        match owner {
            Owner::Player(_) => state.missions.push(mission),
            Owner::Npc(npc) => match state.npc_mut(npc) {
                Some(npc) => npc.missions.push(mission),
                None => return Err(TickError::UnknownPlanet { planet_id: origin }),
            },
        }
        self.dirty.mark_fleet();
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Banked catch-up time not yet drained.
    pub const fn pending_catch_up(&self) -> u64 {
        self.time_source.pending_catch_up()
    }

    /// Ticks run so far, main and catch-up.
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Current dirty flags.
    pub const fn dirty(&self) -> &DirtyFlags {
        &self.dirty
    }

    /// Dirty flags, for callers that change state between ticks.
    pub const fn dirty_mut(&mut self) -> &mut DirtyFlags {
        &mut self.dirty
    }

    /// The time source.
    pub const fn time_source(&self) -> &TimeSource {
        &self.time_source
    }

    /// The compute unit.
    pub const fn compute(&self) -> &ComputeUnit {
        &self.compute
    }

    /// Shared operator controls.
    pub const fn operator(&self) -> &Arc<OperatorState> {
        &self.operator
    }
}
