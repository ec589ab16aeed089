//! Tick phases: the per-heartbeat work the orchestrator sequences.
//!
//! Each tick runs these phases in order over one [`GameState`]:
//!
//! 1. **Economy** -- accrue production on the player's planets and
//!    complete due build, shipyard, defense, and research items.
//!
//! 2. **Missions** -- move every fleet mission through the
//!    `outbound -> returning -> completed` state machine, applying each
//!    arrival and return effect exactly once. Battles are awaited on the
//!    compute unit; this is the only point where a tick suspends.
//!
//! 3. **NPCs** -- run the sliced growth and behavior passes and turn
//!    diplomatic events into notifications.
//!
//! The scheduler runs last and is driven by the orchestrator.
//!
//! A failure on one planet, mission, or NPC is logged and never stops its
//! siblings. User-visible failures end up in mission reports or
//! notifications.

use std::collections::BTreeMap;

use nebula_economy::{
    CompletedWork, ProductionContext, ProductionReport, accrue, production_report,
    resolve_planet_queue, resolve_research_queue,
};
use nebula_fleet::arrival::{self, ArrivalOutcome};
use nebula_fleet::{
    BattleOutcome, BattleRequest, DebrisRequest, FlightParams, MissionError, PlunderRequest,
    next_event_time, recall, resolve, roll_moon,
};
use nebula_npc::{
    NpcEngine, NpcTickContext, NpcTickReport, PlayerAction, RelationStats, record_action,
};
use nebula_types::resources::total_units;
use nebula_types::{
    BattleWinner, BuildingType, Coordinate, DiplomaticEvent, DiplomaticEventKind, FleetMission,
    MissionFailReason, MissionKind, MissionReportDetails, MissionStatus, Notification, Owner,
    Planet, PlanetId, RelationStatus, Resources, Severity, SpyReport,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::compute::{ComputeError, ComputeUnit};
use crate::dirty::DirtyFlags;
use crate::state::GameState;

/// Phase changes one mission may go through in a single tick: an arrival
/// followed by a return that is already due.
pub const MAX_TRANSITIONS_PER_TICK: usize = 2;

/// Errors that stop a tick from running at all.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The orchestrator was used before `init`.
    #[error("orchestrator is not initialized")]
    NotInitialized,

    /// The orchestrator was used after `dispose`.
    #[error("orchestrator has been disposed")]
    Disposed,

    /// A command named a planet that does not exist.
    #[error("planet {planet_id} not found")]
    UnknownPlanet {
        /// The missing planet.
        planet_id: PlanetId,
    },

    /// A fleet could not be launched.
    #[error("dispatch failed: {source}")]
    Dispatch {
        /// The underlying dispatch error.
        #[from]
        source: MissionError,
    },
}

/// Inputs shared by every phase of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickContext {
    /// Wall-clock time of the tick (ms).
    pub now: u64,
    /// Game time the tick simulates (ms).
    pub delta_ms: u64,
    /// Production efficiency in percent (100 online, lower for catch-up).
    pub efficiency_pct: u64,
    /// Whether this tick drains banked catch-up time.
    pub catch_up: bool,
}

/// Summary of a single tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    /// Tick number, counting main and catch-up ticks.
    pub tick: u64,
    /// Wall-clock time of the tick (ms).
    pub now: u64,
    /// Game time simulated (ms).
    pub delta_ms: u64,
    /// Whether this was a catch-up tick.
    pub catch_up: bool,
    /// Queue items completed.
    pub completed_work: Vec<CompletedWork>,
    /// Mission phase changes applied.
    pub missions_resolved: usize,
    /// Battles fought.
    pub battles: usize,
    /// NPCs advanced by growth.
    pub npcs_grown: usize,
    /// NPCs advanced by behavior.
    pub npcs_acted: usize,
    /// Attitude counts, when growth recounted them.
    pub relation_stats: Option<RelationStats>,
    /// Scheduled jobs that ran.
    pub jobs_run: usize,
    /// User-visible events, oldest first.
    pub notifications: Vec<Notification>,
}

// ---------------------------------------------------------------------------
// Phase 1: Economy
// ---------------------------------------------------------------------------

/// A planet's production report plus the inputs it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedProduction {
    buildings: BTreeMap<BuildingType, u32>,
    max_temperature: i32,
    context: ProductionContext,
    report: ProductionReport,
}

impl CachedProduction {
    fn build(planet: &Planet, context: &ProductionContext) -> Self {
        Self {
            buildings: planet.buildings.clone(),
            max_temperature: planet.max_temperature,
            context: *context,
            report: production_report(planet, context),
        }
    }

    fn matches(&self, planet: &Planet, context: &ProductionContext) -> bool {
        self.context == *context
            && self.max_temperature == planet.max_temperature
            && self.buildings == planet.buildings
    }

    /// The cached report.
    pub const fn report(&self) -> &ProductionReport {
        &self.report
    }
}

/// Production reports per player planet.
pub type ProductionCache = BTreeMap<PlanetId, CachedProduction>;

/// Accrue production and complete due queue items on the player's planets.
///
/// A cached report is reused only while the planet's buildings, its
/// temperature, the player's research and bonuses, and the game speed are
/// unchanged. The economy flag drops the whole cache early.
pub fn phase_economy(
    state: &mut GameState,
    ctx: &TickContext,
    dirty: &mut DirtyFlags,
    cache: &mut ProductionCache,
    game_speed: f64,
) -> Vec<CompletedWork> {
    if dirty.economy() {
        cache.clear();
        dirty.clear_economy();
    }
    dirty.clear_queues();
    cache.retain(|id, _| state.player.planets.contains(id));

    let production =
        ProductionContext::new(&state.player.technologies, state.player.bonuses, game_speed);
    let mut completed = Vec::new();
    let mut messages = Vec::new();

    for id in &state.player.planets {
        let Some(planet) = state.planets.get_mut(id) else {
            warn!(planet_id = %id, "Player planet missing, skipping production");
            continue;
        };
        let cached = cache
            .entry(*id)
            .or_insert_with(|| CachedProduction::build(planet, &production));
        if !cached.matches(planet, &production) {
            debug!(planet_id = %id, "Production inputs changed, rebuilding report");
            *cached = CachedProduction::build(planet, &production);
        }
        let outcome = accrue(planet, &cached.report, ctx.delta_ms, ctx.efficiency_pct);
        planet.last_update = ctx.now;
        if !outcome.overflow.is_empty() {
            debug!(planet_id = %id, overflow = ?outcome.overflow, "Storage full, production lost");
        }
        for work in resolve_planet_queue(planet, ctx.now) {
            messages.push(format!("{}: {work}", planet.name));
            completed.push(work);
        }
    }

    let player = &mut state.player;
    for work in resolve_research_queue(&mut player.research_queue, &mut player.technologies, ctx.now)
    {
        messages.push(format!("Research complete: {work}"));
        completed.push(work);
    }

    for message in messages {
        state.notify(ctx.now, Severity::Success, message);
    }
    if completed.iter().any(CompletedWork::affects_economy) {
        dirty.mark_economy();
    }
    if !completed.is_empty() {
        dirty.mark_queues();
    }
    completed
}

// ---------------------------------------------------------------------------
// Phase 2: Missions
// ---------------------------------------------------------------------------

/// What the mission phase did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionPhaseReport {
    /// Phase changes applied.
    pub resolved: usize,
    /// Battles fought.
    pub battles: usize,
    /// Battles that could not be computed.
    pub combat_failures: usize,
    /// NPC missions recalled because their target was destroyed.
    pub recalled: usize,
}

/// Advance every due mission, the player's first and then each NPC's.
///
/// Returns early without touching anything when no mission has a due
/// timestamp and the fleet flag is clear.
pub async fn phase_missions<R: Rng + ?Sized>(
    state: &mut GameState,
    ctx: &TickContext,
    compute: &ComputeUnit,
    dirty: &mut DirtyFlags,
    rng: &mut R,
) -> MissionPhaseReport {
    let due = state
        .all_missions()
        .filter_map(next_event_time)
        .any(|at| at <= ctx.now);
    if !due && !dirty.fleet() {
        return MissionPhaseReport::default();
    }
    dirty.clear_fleet();

    let mut pass = MissionPass {
        ctx: *ctx,
        compute,
        rng,
        report: MissionPhaseReport::default(),
        destroyed: Vec::new(),
    };

    let player_missions = std::mem::take(&mut state.missions);
    let mut kept = pass.run_list(state, player_missions).await;
    kept.append(&mut state.missions);
    state.missions = kept;

    for index in 0..state.npcs.len() {
        let list = match state.npcs.get_mut(index) {
            Some(npc) => std::mem::take(&mut npc.missions),
            None => continue,
        };
        let kept = pass.run_list(state, list).await;
        if let Some(npc) = state.npcs.get_mut(index) {
            npc.missions = kept;
        }
    }

    let MissionPass {
        mut report,
        destroyed,
        ..
    } = pass;
    if !destroyed.is_empty() {
        report.recalled = recall_missions_to(state, &destroyed, ctx.now);
    }
    report
}

/// Turn around every outbound NPC mission headed for one of `targets`,
/// each a coordinate plus whether the destroyed body was a moon.
fn recall_missions_to(state: &mut GameState, targets: &[(Coordinate, bool)], now: u64) -> usize {
    let mut recalled = 0_usize;
    for npc in &mut state.npcs {
        for mission in &mut npc.missions {
            let aimed_at = (mission.target, mission.target_is_moon);
            if targets.contains(&aimed_at) && recall(mission, now) {
                debug!(
                    mission_id = %mission.id,
                    target = %mission.target,
                    "Recalled mission to destroyed planet"
                );
                recalled = recalled.saturating_add(1);
            }
        }
    }
    recalled
}

/// Per-tick state for mission processing.
struct MissionPass<'a, R: ?Sized> {
    ctx: TickContext,
    compute: &'a ComputeUnit,
    rng: &'a mut R,
    report: MissionPhaseReport,
    destroyed: Vec<(Coordinate, bool)>,
}

impl<R: Rng + ?Sized> MissionPass<'_, R> {
    /// Process `list` in order and return the missions still in flight.
    async fn run_list(
        &mut self,
        state: &mut GameState,
        list: Vec<FleetMission>,
    ) -> Vec<FleetMission> {
        let mut kept = Vec::with_capacity(list.len());
        for mut mission in list {
            if self.advance(state, &mut mission).await {
                kept.push(mission);
            }
        }
        kept
    }

    /// Apply every transition due for `mission`. Returns whether it stays
    /// in flight.
    async fn advance(&mut self, state: &mut GameState, mission: &mut FleetMission) -> bool {
        for _ in 0..MAX_TRANSITIONS_PER_TICK {
            let step = resolve(mission, self.ctx.now);
            if step.should_process_arrival {
                let outcome = self.arrive(state, mission).await;
                self.report.resolved = self.report.resolved.saturating_add(1);
                let one_way = outcome.one_way;
                self.file_report(state, mission, outcome);
                if one_way || total_units(&mission.fleet) == 0 {
                    mission.status = MissionStatus::Completed;
                    return false;
                }
                mission.status = step.new_status;
            } else if step.should_process_return {
                self.return_home(state, mission);
                mission.status = MissionStatus::Completed;
                return false;
            } else {
                return !step.is_completed;
            }
        }
        true
    }

    async fn arrive(&mut self, state: &mut GameState, mission: &mut FleetMission) -> ArrivalOutcome {
        let now = self.ctx.now;
        let target_id = state.planet_id_at(mission.target, mission.target_is_moon);
        debug!(
            mission_id = %mission.id,
            kind = ?mission.kind,
            target = %mission.target,
            "Mission arrived"
        );

        match mission.kind {
            MissionKind::Transport => {
                let capacity = target_id.map_or(Resources::ZERO, |id| state.capacity_of(id));
                let target = target_id.and_then(|id| state.planets.get_mut(&id));
                arrival::transport(mission, target, &capacity)
            }
            MissionKind::Deploy => {
                let capacity = target_id.map_or(Resources::ZERO, |id| state.capacity_of(id));
                let target = target_id.and_then(|id| state.planets.get_mut(&id));
                arrival::deploy(mission, target, &capacity)
            }
            MissionKind::Colonize => {
                let occupied = state.planet_id_at(mission.target, false).is_some();
                let (outcome, colony) = arrival::colonize(mission, occupied, now);
                if let Some(colony) = colony {
                    info!(
                        planet_id = %colony.id,
                        coordinate = %colony.coordinate,
                        owner = ?colony.owner,
                        "Colony founded"
                    );
                    if mission.owner.is_player() {
                        let message = format!("New colony founded at {}", colony.coordinate);
                        state.notify(now, Severity::Success, message);
                    }
                    state.add_planet(colony);
                }
                outcome
            }
            MissionKind::Spy => {
                let target = target_id.and_then(|id| state.planets.get(&id));
                let (outcome, report) = arrival::spy(mission, target, now, &mut *self.rng);
                if let Some(report) = report {
                    file_spy_report(state, mission.owner, report, now);
                }
                outcome
            }
            MissionKind::Recycle => {
                let at = mission.target;
                let outcome = arrival::recycle(mission, state.debris_at_mut(at));
                state.prune_debris(None);
                outcome
            }
            MissionKind::Expedition => arrival::expedition(mission, &mut *self.rng),
            MissionKind::Attack | MissionKind::Destroy => {
                self.battle(state, mission, target_id).await
            }
        }
    }

    /// Fight at the target. Every compute call finishes before any state
    /// is touched, so a failed computation leaves both sides intact.
    async fn battle(
        &mut self,
        state: &mut GameState,
        mission: &mut FleetMission,
        target_id: Option<PlanetId>,
    ) -> ArrivalOutcome {
        let now = self.ctx.now;
        let target = target_id.and_then(|id| state.planets.get(&id));
        let (target_id, request, defender_resources) =
            match arrival::hostile_target(mission, target) {
                Ok(id) => {
                    let Some(target) = state.planets.get(&id) else {
                        return ArrivalOutcome::failed(MissionFailReason::TargetNotFound);
                    };
                    let attacker_tech = state.tech_of(mission.owner).cloned().unwrap_or_default();
                    let defender_tech = state.tech_of(target.owner).cloned().unwrap_or_default();
                    let request =
                        arrival::battle_request(mission, &attacker_tech, target, &defender_tech);
                    (id, request, target.resources)
                }
                Err(reason) => return ArrivalOutcome::failed(reason),
            };

        let (outcome, plunder, debris) =
            match compute_battle(self.compute, &request, defender_resources, mission.cargo).await {
                Ok(computed) => computed,
                Err(error) => {
                    warn!(
                        mission_id = %mission.id,
                        error = %error,
                        "Combat resolution failed, fleet returns intact"
                    );
                    self.report.combat_failures = self.report.combat_failures.saturating_add(1);
                    return ArrivalOutcome::failed(MissionFailReason::CombatFailed);
                }
            };

        let Some(target) = state.planets.get_mut(&target_id) else {
            return ArrivalOutcome::failed(MissionFailReason::TargetNotFound);
        };
        let mut result =
            arrival::apply_battle(mission, target, &request, &outcome, plunder, debris, now);
        let coordinate = target.coordinate;
        let defender = target.owner;
        let on_moon = target.is_moon;

        state.add_debris(coordinate, debris, now);
        if !on_moon {
            result.moon_created = self.roll_for_moon(state, target_id, result.moon_chance);
        }

        record_player_action(state, mission.owner, defender, PlayerAction::Attacked, now);
        if defender.is_player() {
            let message = format!(
                "{} attacked {coordinate}: {:?} won",
                state.owner_name(mission.owner),
                result.winner
            );
            state.notify(now, Severity::Warning, message);
        }

        self.report.battles = self.report.battles.saturating_add(1);
        info!(
            mission_id = %mission.id,
            coordinate = %coordinate,
            winner = ?result.winner,
            rounds = result.rounds.len(),
            "Battle resolved"
        );
        let details = MissionReportDetails {
            resources: result.plunder,
            fleet_lost: result.attacker_losses.clone(),
            planet: Some(target_id),
            battle: Some(result.id),
            ..MissionReportDetails::default()
        };
        state.push_battle_report(result);

        if mission.kind != MissionKind::Destroy {
            return ArrivalOutcome::succeeded(details);
        }
        let Some(target) = state.planets.get(&target_id) else {
            return ArrivalOutcome::succeeded(details);
        };
        let mut roll = arrival::roll_destruction(mission, target, &mut *self.rng);
        roll.details = MissionReportDetails {
            destruction_chance: roll.details.destruction_chance,
            ..details
        };
        if roll.success {
            self.destroy_planet(state, mission.owner, target_id);
        }
        roll
    }

    /// Roll for a moon around `parent`. At most one moon per coordinate.
    fn roll_for_moon(&mut self, state: &mut GameState, parent: PlanetId, chance: f64) -> bool {
        let Some(planet) = state.planets.get(&parent) else {
            return false;
        };
        if state.planet_id_at(planet.coordinate, true).is_some()
            || !roll_moon(chance, &mut *self.rng)
        {
            return false;
        }
        let moon = arrival::create_moon(planet, self.ctx.now);
        info!(planet_id = %moon.id, coordinate = %moon.coordinate, "Moon formed from debris");
        state.add_planet(moon);
        true
    }

    fn destroy_planet(&mut self, state: &mut GameState, attacker: Owner, planet_id: PlanetId) {
        let now = self.ctx.now;
        let Some(planet) = state.remove_planet(planet_id) else {
            return;
        };
        // The debris field belongs to the slot; keep it while a planet or moon remains.
        let at = planet.coordinate;
        if state.planet_id_at(at, false).is_none() && state.planet_id_at(at, true).is_none() {
            state.prune_debris(Some(at));
        }
        self.destroyed.push((at, planet.is_moon));
        info!(planet_id = %planet.id, coordinate = %planet.coordinate, "Planet destroyed");

        record_player_action(state, attacker, planet.owner, PlayerAction::PlanetDestroyed, now);
        if planet.owner.is_player() {
            let message = format!("{} at {} was destroyed", planet.name, planet.coordinate);
            state.notify(now, Severity::Error, message);
        }
    }

    fn return_home(&mut self, state: &mut GameState, mission: &mut FleetMission) {
        let now = self.ctx.now;
        let origin = state.planets.get_mut(&mission.origin_planet);
        let found = origin.is_some();
        let credited = arrival::return_home(mission, origin);
        self.report.resolved = self.report.resolved.saturating_add(1);

        if !found {
            warn!(
                mission_id = %mission.id,
                origin = %mission.origin_planet,
                "Origin planet gone, returning fleet lost"
            );
        } else if mission.owner.is_player() {
            let message = format!(
                "Fleet returned from {} ({:?}) with {} metal, {} crystal, {} deuterium",
                mission.target, mission.kind, credited.metal, credited.crystal, credited.deuterium
            );
            state.notify(now, Severity::Info, message);
        }
    }

    fn file_report(&self, state: &mut GameState, mission: &FleetMission, outcome: ArrivalOutcome) {
        if !outcome.success {
            debug!(mission_id = %mission.id, reason = ?outcome.reason, "Mission effect failed");
        }
        if mission.owner.is_player() {
            state.push_mission_report(outcome.into_report(mission, self.ctx.now));
        }
    }
}

async fn compute_battle(
    compute: &ComputeUnit,
    request: &BattleRequest,
    defender_resources: Resources,
    carried: Resources,
) -> Result<(BattleOutcome, Resources, Resources), ComputeError> {
    let outcome = compute.simulate_battle(request.clone()).await?;
    let plunder = if outcome.winner == BattleWinner::Attacker {
        compute
            .calculate_plunder(PlunderRequest {
                defender_resources,
                attacker_fleet: outcome.attacker_remaining.clone(),
                carried,
            })
            .await?
    } else {
        Resources::ZERO
    };
    let debris = compute
        .calculate_debris(DebrisRequest {
            attacker_losses: outcome.attacker_losses.clone(),
            defender_losses: outcome.defender_ship_losses.clone(),
        })
        .await?;
    Ok((outcome, plunder, debris))
}

/// Record a hostile act by the player against an NPC. Other pairings are
/// ignored.
fn record_player_action(
    state: &mut GameState,
    actor: Owner,
    target: Owner,
    action: PlayerAction,
    now: u64,
) {
    let (Owner::Player(player), Some(npc_id)) = (actor, target.npc()) else {
        return;
    };
    if let Some(npc) = state.npc_mut(npc_id) {
        record_action(npc, player, action, now);
    }
}

fn file_spy_report(state: &mut GameState, spy: Owner, report: SpyReport, now: u64) {
    match spy {
        Owner::Player(_) => {
            if report.detected {
                let owner = state.planets.get(&report.target_planet).map(|p| p.owner);
                if let Some(owner) = owner {
                    record_player_action(state, spy, owner, PlayerAction::Spied, now);
                }
            }
            state.push_spy_report(report);
        }
        Owner::Npc(_) => {
            if report.detected {
                let message = format!(
                    "Espionage by {} detected at {}",
                    state.owner_name(spy),
                    report.coordinate
                );
                state.notify(now, Severity::Warning, message);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Phase 3: NPCs
// ---------------------------------------------------------------------------

/// Run the NPC engine and deliver its diplomatic events.
pub fn phase_npcs<R: Rng + ?Sized>(
    state: &mut GameState,
    ctx: &TickContext,
    engine: &mut NpcEngine,
    dirty: &mut DirtyFlags,
    game_speed: f64,
    rng: &mut R,
) -> NpcTickReport {
    dirty.clear_npc();
    let in_flight = |state: &GameState| state.npcs.iter().map(|n| n.missions.len()).sum::<usize>();
    let before = in_flight(state);

    let report = {
        let GameState {
            player,
            planets,
            npcs,
            ..
        } = state;
        let npc_ctx = NpcTickContext {
            player: &*player,
            delta_ms: ctx.delta_ms,
            now: ctx.now,
            game_speed,
            flight: FlightParams {
                speed_multiplier: game_speed,
                fuel_reduction_pct: 0,
            },
        };
        engine.tick(npcs, planets, &npc_ctx, rng)
    };

    if in_flight(state) != before {
        dirty.mark_fleet();
    }
    if report.grown > 0 || report.acted > 0 {
        dirty.mark_npc();
    }
    for event in &report.events {
        deliver_event(state, event, ctx.now);
    }
    report
}

fn deliver_event(state: &mut GameState, event: &DiplomaticEvent, now: u64) {
    let name = state
        .npc(event.npc_id)
        .map_or_else(|| String::from("Unknown faction"), |npc| npc.name.clone());
    let r = event.resources;
    let (severity, message) = match event.kind {
        DiplomaticEventKind::TradeOffer => (
            Severity::Info,
            format!(
                "{name} offers a trade: {} metal, {} crystal, {} deuterium",
                r.metal, r.crystal, r.deuterium
            ),
        ),
        DiplomaticEventKind::AttitudeSwing => {
            let status = event.new_status.unwrap_or(RelationStatus::Neutral);
            let severity = if status == RelationStatus::Hostile {
                Severity::Warning
            } else {
                Severity::Info
            };
            (severity, format!("{name} is now {status:?} toward you"))
        }
        DiplomaticEventKind::IntelShared => (
            Severity::Info,
            format!("{name} shared intelligence on hostile fleet movements"),
        ),
        DiplomaticEventKind::JointAttackInvite => (
            Severity::Info,
            format!("{name} proposes a joint attack on a common enemy"),
        ),
        DiplomaticEventKind::Aid => {
            let received = credit_home(state, &r);
            (
                Severity::Success,
                format!(
                    "{name} sent aid: {} metal, {} crystal, {} deuterium",
                    received.metal, received.crystal, received.deuterium
                ),
            )
        }
    };
    state.notify(now, severity, message);
}

/// Deposit `resources` on the player's home planet, clamped to storage.
fn credit_home(state: &mut GameState, resources: &Resources) -> Resources {
    let Some(home) = state.home_planet() else {
        return Resources::ZERO;
    };
    let capacity = state.capacity_of(home);
    state
        .planets
        .get_mut(&home)
        .map_or(Resources::ZERO, |planet| {
            arrival::deposit(&mut planet.resources, resources, &capacity)
        })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use nebula_economy::storage_capacity;
    use nebula_fleet::arrival::new_colony;
    use nebula_types::resources::unit_count;
    use nebula_types::{
        BuildingType, DifficultyTier, Fleet, MissionId, Npc, NpcId, OfficerBonuses, Planet,
        Player, PlayerId, QueueItem, QueueItemId, QueueItemKind, QueueTarget, ShipType,
        TechLevels,
    };
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::config::ComputeConfig;

    const HOUR_MS: u64 = 3_600_000;

    fn ctx(now: u64, delta_ms: u64) -> TickContext {
        TickContext {
            now,
            delta_ms,
            efficiency_pct: 100,
            catch_up: false,
        }
    }

    fn world() -> (GameState, PlanetId, NpcId, PlanetId) {
        let mut state = GameState::new(Player {
            id: PlayerId::new(),
            name: "Commander".to_owned(),
            technologies: TechLevels::new(),
            research_queue: Vec::new(),
            planets: Vec::new(),
            bonuses: OfficerBonuses::default(),
        });
        let npc_id = NpcId::new();
        state.npcs.push(Npc {
            id: npc_id,
            name: "Vexari".to_owned(),
            planets: Vec::new(),
            technologies: TechLevels::new(),
            relations: BTreeMap::new(),
            difficulty: DifficultyTier::Easy,
            last_spy_time: 0,
            last_attack_time: 0,
            missions: Vec::new(),
        });
        let home = new_colony(Owner::Player(state.player.id), Coordinate::new(1, 10, 8), 0);
        let outpost = new_colony(Owner::Npc(npc_id), Coordinate::new(1, 11, 8), 0);
        let (home_id, outpost_id) = (home.id, outpost.id);
        state.add_planet(home);
        state.add_planet(outpost);
        (state, home_id, npc_id, outpost_id)
    }

    fn mission(state: &GameState, origin: PlanetId, kind: MissionKind, target: Coordinate) -> FleetMission {
        FleetMission {
            id: MissionId::new(),
            owner: Owner::Player(state.player.id),
            origin_planet: origin,
            target,
            target_planet: None,
            target_is_moon: false,
            kind,
            fleet: Fleet::new(),
            cargo: Resources::ZERO,
            departure_time: 0,
            arrival_time: 1_000,
            return_time: Some(2_000),
            status: MissionStatus::Outbound,
        }
    }

    fn compute() -> ComputeUnit {
        ComputeUnit::spawn(&ComputeConfig::default()).unwrap()
    }

    fn planet_mut(state: &mut GameState, id: PlanetId) -> &mut Planet {
        state.planets.get_mut(&id).unwrap()
    }

    // -- economy ------------------------------------------------------------

    #[test]
    fn metal_mine_yields_one_hour_of_production() {
        let (mut state, home, _, _) = world();
        let planet = planet_mut(&mut state, home);
        planet.buildings.insert(BuildingType::MetalMine, 5);
        planet.buildings.insert(BuildingType::SolarPlant, 10);
        planet.resources = Resources::ZERO;

        let production = ProductionContext::new(&TechLevels::new(), OfficerBonuses::default(), 1.0);
        let expected = production_report(state.planets.get(&home).unwrap(), &production);
        assert_eq!(expected.energy_ratio, 1.0);

        let mut dirty = DirtyFlags::new();
        let mut cache = BTreeMap::new();
        phase_economy(&mut state, &ctx(HOUR_MS, HOUR_MS), &mut dirty, &mut cache, 1.0);

        let planet = state.planets.get(&home).unwrap();
        let capacity = storage_capacity(planet, 0);
        assert_eq!(planet.resources.metal, expected.rates.metal.min(capacity.metal));
        assert_eq!(planet.last_update, HOUR_MS);
        assert!(!dirty.economy());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn completed_building_marks_economy_and_notifies() {
        let (mut state, home, _, _) = world();
        planet_mut(&mut state, home).build_queue.push(QueueItem {
            id: QueueItemId::new(),
            kind: QueueItemKind::Building,
            target: QueueTarget::Building(BuildingType::MetalMine),
            target_level: Some(1),
            quantity: 1,
            start_time: 0,
            end_time: 500,
        });
        let mut dirty = DirtyFlags::new();
        dirty.reset();
        let mut cache = BTreeMap::new();

        let completed = phase_economy(&mut state, &ctx(1_000, 1_000), &mut dirty, &mut cache, 1.0);
        assert_eq!(completed.len(), 1);
        assert!(dirty.economy());
        assert!(dirty.queues());
        assert_eq!(state.planets.get(&home).unwrap().building_level(BuildingType::MetalMine), 1);
        let notes = state.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes.first().unwrap().severity, Severity::Success);
    }

    #[test]
    fn changed_buildings_rebuild_the_report_without_a_mark() {
        let (mut state, home, _, _) = world();
        let planet = planet_mut(&mut state, home);
        planet.buildings.insert(BuildingType::MetalMine, 1);
        planet.buildings.insert(BuildingType::SolarPlant, 20);
        planet.resources = Resources::ZERO;
        let mut dirty = DirtyFlags::new();
        let mut cache = BTreeMap::new();
        phase_economy(&mut state, &ctx(HOUR_MS, HOUR_MS), &mut dirty, &mut cache, 1.0);
        let after_first = state.planets.get(&home).unwrap().resources.metal;

        // Upgrade behind the engine's back: no economy mark.
        planet_mut(&mut state, home)
            .buildings
            .insert(BuildingType::MetalMine, 10);
        dirty.reset();
        let production = ProductionContext::new(&TechLevels::new(), OfficerBonuses::default(), 1.0);
        let fresh = production_report(state.planets.get(&home).unwrap(), &production);

        phase_economy(&mut state, &ctx(2 * HOUR_MS, HOUR_MS), &mut dirty, &mut cache, 1.0);
        let metal = state.planets.get(&home).unwrap().resources.metal;
        assert_eq!(metal - after_first, fresh.rates.metal);
        assert_eq!(cache.get(&home).unwrap().report(), &fresh);
    }

    #[test]
    fn changed_bonuses_rebuild_the_report_without_a_mark() {
        let (mut state, home, _, _) = world();
        planet_mut(&mut state, home)
            .buildings
            .insert(BuildingType::SolarPlant, 5);
        let mut dirty = DirtyFlags::new();
        let mut cache = BTreeMap::new();
        phase_economy(&mut state, &ctx(1_000, 1_000), &mut dirty, &mut cache, 1.0);
        let before = cache.get(&home).unwrap().report().energy_production;

        state.player.bonuses.energy_production_pct = 50;
        dirty.reset();
        phase_economy(&mut state, &ctx(2_000, 1_000), &mut dirty, &mut cache, 1.0);
        assert!(cache.get(&home).unwrap().report().energy_production > before);
    }

    #[test]
    fn removed_planets_leave_the_cache() {
        let (mut state, home, _, _) = world();
        let mut dirty = DirtyFlags::new();
        let mut cache = BTreeMap::new();
        phase_economy(&mut state, &ctx(1_000, 1_000), &mut dirty, &mut cache, 1.0);
        assert!(cache.contains_key(&home));

        state.remove_planet(home);
        dirty.reset();
        phase_economy(&mut state, &ctx(2_000, 1_000), &mut dirty, &mut cache, 1.0);
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_player_planet_is_skipped() {
        let (mut state, _, _, _) = world();
        state.player.planets.insert(0, PlanetId::new());
        let mut dirty = DirtyFlags::new();
        let mut cache = BTreeMap::new();
        phase_economy(&mut state, &ctx(1_000, 1_000), &mut dirty, &mut cache, 1.0);
        assert_eq!(cache.len(), 1);
    }

    // -- missions -----------------------------------------------------------

    #[tokio::test]
    async fn idle_missions_short_circuit() {
        let (mut state, home, _, _) = world();
        let mut m = mission(&state, home, MissionKind::Transport, Coordinate::new(1, 10, 9));
        m.fleet.insert(ShipType::SmallCargo, 1);
        state.missions.push(m);
        let unit = compute();
        let mut dirty = DirtyFlags::new();
        dirty.reset();
        let mut rng = StdRng::seed_from_u64(1);

        let report = phase_missions(&mut state, &ctx(500, 500), &unit, &mut dirty, &mut rng).await;
        assert_eq!(report, MissionPhaseReport::default());
        assert_eq!(state.missions.len(), 1);
    }

    #[tokio::test]
    async fn transport_delivers_then_returns_in_one_tick() {
        let (mut state, home, _, _) = world();
        let target = new_colony(Owner::Player(state.player.id), Coordinate::new(1, 10, 9), 0);
        let target_id = target.id;
        state.add_planet(target);
        let before = state.planets.get(&target_id).unwrap().resources.metal;

        let mut m = mission(&state, home, MissionKind::Transport, Coordinate::new(1, 10, 9));
        m.fleet.insert(ShipType::SmallCargo, 2);
        m.cargo = Resources::new(300, 0, 0);
        state.missions.push(m);

        let unit = compute();
        let mut dirty = DirtyFlags::new();
        let mut rng = StdRng::seed_from_u64(2);
        let report = phase_missions(&mut state, &ctx(5_000, 5_000), &unit, &mut dirty, &mut rng).await;

        assert_eq!(report.resolved, 2);
        assert!(state.missions.is_empty());
        assert_eq!(state.planets.get(&target_id).unwrap().resources.metal, before + 300);
        assert_eq!(
            unit_of(&state, home, ShipType::SmallCargo),
            2,
            "ships are credited back to the origin"
        );
        assert_eq!(state.mission_reports.len(), 1);
        assert!(state.mission_reports.first().unwrap().success);
    }

    #[tokio::test]
    async fn returning_cargo_is_credited_past_storage() {
        let (mut state, home, _, _) = world();
        let capacity = storage_capacity(state.planets.get(&home).unwrap(), 0);
        planet_mut(&mut state, home).resources =
            Resources::new(capacity.metal, capacity.crystal, capacity.deuterium);

        // Nobody lives at the target, so the cargo flies home again.
        let mut m = mission(&state, home, MissionKind::Transport, Coordinate::new(2, 40, 3));
        m.fleet.insert(ShipType::SmallCargo, 2);
        m.cargo = Resources::new(300, 200, 100);
        state.missions.push(m);

        let unit = compute();
        let mut dirty = DirtyFlags::new();
        let mut rng = StdRng::seed_from_u64(2);
        phase_missions(&mut state, &ctx(5_000, 5_000), &unit, &mut dirty, &mut rng).await;

        assert!(state.missions.is_empty());
        let stock = state.planets.get(&home).unwrap().resources;
        assert_eq!(stock.metal, capacity.metal + 300);
        assert_eq!(stock.crystal, capacity.crystal + 200);
        assert_eq!(stock.deuterium, capacity.deuterium + 100);
    }

    fn unit_of(state: &GameState, planet: PlanetId, ship: ShipType) -> u64 {
        state
            .planets
            .get(&planet)
            .map_or(0, |p| unit_count(&p.fleet, &ship))
    }

    #[tokio::test]
    async fn colonize_occupied_slot_returns_empty_handed() {
        let (mut state, home, _, _) = world();
        let mut m = mission(&state, home, MissionKind::Colonize, Coordinate::new(1, 11, 8));
        m.fleet.insert(ShipType::ColonyShip, 1);
        state.missions.push(m);
        let unit = compute();
        let mut dirty = DirtyFlags::new();
        let mut rng = StdRng::seed_from_u64(3);

        phase_missions(&mut state, &ctx(1_500, 1_500), &unit, &mut dirty, &mut rng).await;
        let report = state.mission_reports.first().unwrap();
        assert!(!report.success);
        assert_eq!(report.reason, Some(MissionFailReason::PositionOccupied));
        assert_eq!(state.missions.first().unwrap().status, MissionStatus::Returning);
        assert_eq!(state.player.planets.len(), 1);
    }

    #[tokio::test]
    async fn colonize_free_slot_founds_a_planet() {
        let (mut state, home, _, _) = world();
        let mut m = mission(&state, home, MissionKind::Colonize, Coordinate::new(1, 12, 4));
        m.fleet.insert(ShipType::ColonyShip, 1);
        m.fleet.insert(ShipType::SmallCargo, 1);
        state.missions.push(m);
        let unit = compute();
        let mut dirty = DirtyFlags::new();
        let mut rng = StdRng::seed_from_u64(4);

        phase_missions(&mut state, &ctx(1_500, 1_500), &unit, &mut dirty, &mut rng).await;
        assert_eq!(state.player.planets.len(), 2);
        assert!(state.planet_id_at(Coordinate::new(1, 12, 4), false).is_some());
        let returning = state.missions.first().unwrap();
        assert_eq!(unit_count(&returning.fleet, &ShipType::ColonyShip), 0);
        assert_eq!(unit_count(&returning.fleet, &ShipType::SmallCargo), 1);
    }

    #[tokio::test]
    async fn recycle_empties_and_removes_the_field() {
        let (mut state, home, _, _) = world();
        let at = Coordinate::new(1, 10, 10);
        state.add_debris(at, Resources::new(1_000, 500, 0), 0);
        let mut m = mission(&state, home, MissionKind::Recycle, at);
        m.fleet.insert(ShipType::Recycler, 1);
        state.missions.push(m);
        let unit = compute();
        let mut dirty = DirtyFlags::new();
        let mut rng = StdRng::seed_from_u64(5);

        phase_missions(&mut state, &ctx(1_500, 1_500), &unit, &mut dirty, &mut rng).await;
        assert!(state.debris.is_empty());
        assert_eq!(state.missions.first().unwrap().cargo, Resources::new(1_000, 500, 0));
    }

    #[tokio::test]
    async fn attack_records_battle_and_sours_relations() {
        let (mut state, home, npc_id, outpost) = world();
        planet_mut(&mut state, outpost).fleet.insert(ShipType::LightFighter, 1);
        let mut m = mission(&state, home, MissionKind::Attack, Coordinate::new(1, 11, 8));
        m.fleet.insert(ShipType::Cruiser, 30);
        m.fleet.insert(ShipType::LargeCargo, 5);
        state.missions.push(m);
        let unit = compute();
        let mut dirty = DirtyFlags::new();
        let mut rng = StdRng::seed_from_u64(6);

        let report = phase_missions(&mut state, &ctx(1_500, 1_500), &unit, &mut dirty, &mut rng).await;
        assert_eq!(report.battles, 1);
        let battle = state.battle_reports.first().unwrap();
        assert_eq!(battle.winner, BattleWinner::Attacker);
        assert!(battle.plunder.metal > 0);
        let returning = state.missions.first().unwrap();
        assert_eq!(returning.cargo, battle.plunder);
        let reputation = state
            .npc(npc_id)
            .and_then(|n| n.relations.get(&state.player.id))
            .map(|r| r.reputation);
        assert_eq!(reputation, Some(-20));
        assert_eq!(
            state.mission_reports.first().unwrap().details.battle,
            Some(battle.id)
        );
    }

    #[tokio::test]
    async fn failed_combat_keeps_both_sides_intact() {
        let (mut state, home, _, outpost) = world();
        planet_mut(&mut state, outpost).fleet.insert(ShipType::LightFighter, 4);
        let stock = state.planets.get(&outpost).unwrap().resources;
        let mut m = mission(&state, home, MissionKind::Attack, Coordinate::new(1, 11, 8));
        m.fleet.insert(ShipType::Cruiser, 10);
        state.missions.push(m);

        let unit = ComputeUnit::spawn_with(&ComputeConfig::default(), |_| {
            Err(String::from("worker crashed"))
        })
        .unwrap();
        let mut dirty = DirtyFlags::new();
        let mut rng = StdRng::seed_from_u64(7);

        let report = phase_missions(&mut state, &ctx(1_500, 1_500), &unit, &mut dirty, &mut rng).await;
        assert_eq!(report.combat_failures, 1);
        assert_eq!(report.battles, 0);
        let returning = state.missions.first().unwrap();
        assert_eq!(returning.status, MissionStatus::Returning);
        assert_eq!(returning.fleet.get(&ShipType::Cruiser), Some(&10));
        let target = state.planets.get(&outpost).unwrap();
        assert_eq!(target.fleet.get(&ShipType::LightFighter), Some(&4));
        assert_eq!(target.resources, stock);
        assert_eq!(
            state.mission_reports.first().unwrap().reason,
            Some(MissionFailReason::CombatFailed)
        );
        assert!(state.battle_reports.is_empty());
    }

    #[tokio::test]
    async fn wiped_out_attacker_is_retired() {
        let (mut state, home, _, outpost) = world();
        planet_mut(&mut state, outpost).fleet.insert(ShipType::Battleship, 50);
        let mut m = mission(&state, home, MissionKind::Attack, Coordinate::new(1, 11, 8));
        m.fleet.insert(ShipType::LightFighter, 1);
        state.missions.push(m);
        let unit = compute();
        let mut dirty = DirtyFlags::new();
        let mut rng = StdRng::seed_from_u64(8);

        phase_missions(&mut state, &ctx(1_500, 1_500), &unit, &mut dirty, &mut rng).await;
        assert!(state.missions.is_empty());
        assert_eq!(state.battle_reports.first().unwrap().winner, BattleWinner::Defender);
    }

    #[tokio::test]
    async fn destroyed_planet_recalls_npc_missions_and_clears_debris() {
        let (mut state, home, npc_id, outpost) = world();
        let at = Coordinate::new(1, 11, 8);
        state.add_debris(at, Resources::new(5_000, 5_000, 0), 0);

        let npc_origin = new_colony(Owner::Npc(npc_id), Coordinate::new(1, 30, 3), 0);
        let npc_origin_id = npc_origin.id;
        state.add_planet(npc_origin);
        let mut reinforcement = mission(&state, npc_origin_id, MissionKind::Deploy, at);
        reinforcement.owner = Owner::Npc(npc_id);
        reinforcement.fleet.insert(ShipType::SmallCargo, 1);
        reinforcement.arrival_time = 100_000;
        reinforcement.return_time = Some(200_000);
        state.npc_mut(npc_id).unwrap().missions.push(reinforcement);

        let mut m = mission(&state, home, MissionKind::Destroy, at);
        m.fleet.insert(ShipType::Deathstar, 20);
        state.missions.push(m);
        let unit = compute();
        let mut dirty = DirtyFlags::new();

        // 20 deathstars against an empty planet roll at 99%.
        let mut rng = StdRng::seed_from_u64(9);
        let report = phase_missions(&mut state, &ctx(1_500, 1_500), &unit, &mut dirty, &mut rng).await;

        let outcome = state.mission_reports.first().unwrap();
        assert_eq!(outcome.details.destruction_chance, Some(99));
        if outcome.success {
            assert!(!state.planets.contains_key(&outpost));
            assert!(state.debris.iter().all(|d| d.coordinate != at));
            assert_eq!(report.recalled, 1);
            let recalled = state.npc(npc_id).unwrap().missions.first().unwrap();
            assert_eq!(recalled.status, MissionStatus::Returning);
            assert_eq!(recalled.return_time, Some(1_500 + 1_500));
            let reputation = state
                .npc(npc_id)
                .and_then(|n| n.relations.get(&state.player.id))
                .map(|r| r.reputation);
            assert_eq!(reputation, Some(-70));
        } else {
            assert_eq!(outcome.reason, Some(MissionFailReason::ChanceFailed));
            assert!(state.planets.contains_key(&outpost));
        }
    }

    #[tokio::test]
    async fn destroyed_moon_keeps_the_parent_debris() {
        let (mut state, home, npc_id, outpost) = world();
        let at = Coordinate::new(1, 11, 8);
        let moon = arrival::create_moon(state.planets.get(&outpost).unwrap(), 0);
        let moon_id = moon.id;
        state.add_planet(moon);
        state.add_debris(at, Resources::new(5_000, 5_000, 0), 0);

        let npc_origin = new_colony(Owner::Npc(npc_id), Coordinate::new(1, 30, 3), 0);
        let npc_origin_id = npc_origin.id;
        state.add_planet(npc_origin);
        for target_is_moon in [false, true] {
            let mut reinforcement = mission(&state, npc_origin_id, MissionKind::Deploy, at);
            reinforcement.owner = Owner::Npc(npc_id);
            reinforcement.target_is_moon = target_is_moon;
            reinforcement.fleet.insert(ShipType::SmallCargo, 1);
            reinforcement.arrival_time = 100_000;
            reinforcement.return_time = Some(200_000);
            state.npc_mut(npc_id).unwrap().missions.push(reinforcement);
        }

        let mut m = mission(&state, home, MissionKind::Destroy, at);
        m.target_is_moon = true;
        m.fleet.insert(ShipType::Deathstar, 20);
        state.missions.push(m);
        let unit = compute();
        let mut dirty = DirtyFlags::new();

        let mut destroyed = false;
        for seed in 0..10 {
            let mut s = state.clone();
            let mut rng = StdRng::seed_from_u64(seed);
            let report = phase_missions(&mut s, &ctx(1_500, 1_500), &unit, &mut dirty, &mut rng).await;
            if !s.mission_reports.first().unwrap().success {
                continue;
            }
            destroyed = true;
            assert!(!s.planets.contains_key(&moon_id));
            assert!(s.planets.contains_key(&outpost));
            assert!(s.debris.iter().any(|d| d.coordinate == at));
            assert_eq!(report.recalled, 1);
            let statuses: Vec<_> = s
                .npc(npc_id)
                .unwrap()
                .missions
                .iter()
                .map(|m| (m.target_is_moon, m.status))
                .collect();
            assert_eq!(
                statuses,
                vec![(false, MissionStatus::Outbound), (true, MissionStatus::Returning)]
            );
        }
        assert!(destroyed);
    }

    #[tokio::test]
    async fn npc_spy_detection_warns_the_player() {
        let (mut state, home, npc_id, outpost) = world();
        let mut probe = mission(&state, outpost, MissionKind::Spy, Coordinate::new(1, 10, 8));
        probe.owner = Owner::Npc(npc_id);
        probe.fleet.insert(ShipType::EspionageProbe, 1);
        state.npc_mut(npc_id).unwrap().missions.push(probe);
        let unit = compute();
        let mut dirty = DirtyFlags::new();

        let mut warned = false;
        for seed in 0..20 {
            let mut s = state.clone();
            let mut rng = StdRng::seed_from_u64(seed);
            phase_missions(&mut s, &ctx(1_500, 1_500), &unit, &mut dirty, &mut rng).await;
            assert!(s.spy_reports.is_empty());
            assert!(s.mission_reports.is_empty());
            warned |= s
                .drain_notifications()
                .iter()
                .any(|n| n.severity == Severity::Warning);
        }
        assert!(warned);
        assert!(state.planets.contains_key(&home));
    }

    // -- npcs ---------------------------------------------------------------

    #[test]
    fn aid_is_credited_to_the_home_planet() {
        let (mut state, home, npc_id, _) = world();
        planet_mut(&mut state, home).resources = Resources::ZERO;
        let event = DiplomaticEvent {
            kind: DiplomaticEventKind::Aid,
            npc_id,
            timestamp: 0,
            resources: Resources::new(400, 300, 200),
            new_status: None,
        };
        deliver_event(&mut state, &event, 0);
        assert_eq!(
            state.planets.get(&home).unwrap().resources,
            Resources::new(400, 300, 200)
        );
        let note = state.drain_notifications();
        assert!(note.first().unwrap().message.starts_with("Vexari sent aid"));
    }

    #[test]
    fn npc_phase_runs_once_intervals_elapse() {
        let (mut state, _, _, _) = world();
        let mut engine = NpcEngine::default();
        let mut dirty = DirtyFlags::new();
        let mut rng = StdRng::seed_from_u64(10);

        let report = phase_npcs(&mut state, &ctx(1_000, 1_000), &mut engine, &mut dirty, 1.0, &mut rng);
        assert_eq!(report.grown, 0);
        assert!(!dirty.npc());

        let report = phase_npcs(&mut state, &ctx(6_000, 5_000), &mut engine, &mut dirty, 1.0, &mut rng);
        assert_eq!(report.grown, 1);
        assert!(dirty.npc());
    }
}
