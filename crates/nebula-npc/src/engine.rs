//! Sliced round-robin driver for the NPC population.
//!
//! Growth and behavior each keep their own cursor and their own elapsed
//! time accumulator. A phase fires once its accumulator reaches the
//! configured interval, then advances at most `slice_size` NPCs starting
//! at its cursor. The cursor wraps to zero once it reaches the end of the
//! population, so every NPC is touched once per `ceil(n / slice_size)`
//! passes of that phase.

use std::collections::BTreeMap;

use nebula_fleet::FlightParams;
use nebula_types::{DiplomaticEvent, Npc, Planet, PlanetId, Player};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::behavior::{ActiveMissions, BehaviorContext, act};
use crate::config::NpcSettings;
use crate::growth::grow;
use crate::relation::{RelationStats, relation_stats};

/// Half-open index range `[start, end)` for the next slice and the cursor
/// to store afterwards.
///
/// A cursor past the end restarts at zero, which covers a population that
/// shrank since the last pass.
pub const fn next_slice(cursor: usize, slice_size: usize, total: usize) -> (usize, usize, usize) {
    let start = if cursor >= total { 0 } else { cursor };
    let end = start.saturating_add(slice_size);
    let end = if end > total { total } else { end };
    let next = if end >= total { 0 } else { end };
    (start, end, next)
}

/// Per-tick inputs to the NPC engine.
#[derive(Debug, Clone, Copy)]
pub struct NpcTickContext<'a> {
    /// The player the NPCs react to.
    pub player: &'a Player,
    /// Game time elapsed since the previous tick (ms).
    pub delta_ms: u64,
    /// Current game time (ms).
    pub now: u64,
    /// Universe speed multiplier for NPC income.
    pub game_speed: f64,
    /// Flight modifiers for NPC missions.
    pub flight: FlightParams,
}

/// What one engine tick did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NpcTickReport {
    /// NPCs advanced by the growth phase.
    pub grown: usize,
    /// NPCs advanced by the behavior phase.
    pub acted: usize,
    /// Diplomatic events raised by behavior.
    pub events: Vec<DiplomaticEvent>,
    /// Attitude counts, recounted after a growth pass.
    pub relation_stats: Option<RelationStats>,
}

/// Round-robin state for the NPC population.
#[derive(Debug, Clone, Default)]
pub struct NpcEngine {
    settings: NpcSettings,
    growth_cursor: usize,
    behavior_cursor: usize,
    growth_elapsed_ms: u64,
    behavior_elapsed_ms: u64,
}

impl NpcEngine {
    /// Create an engine with both cursors at zero.
    pub const fn new(settings: NpcSettings) -> Self {
        Self {
            settings,
            growth_cursor: 0,
            behavior_cursor: 0,
            growth_elapsed_ms: 0,
            behavior_elapsed_ms: 0,
        }
    }

    /// Current settings.
    pub const fn settings(&self) -> &NpcSettings {
        &self.settings
    }

    /// NPCs advanced per pass.
    pub const fn slice_size(&self) -> usize {
        self.settings.slice_size
    }

    /// Change the slice size. Zero is raised to one.
    pub fn set_slice_size(&mut self, slice_size: usize) {
        self.settings.slice_size = slice_size.max(1);
    }

    /// Position of the growth cursor.
    pub const fn growth_cursor(&self) -> usize {
        self.growth_cursor
    }

    /// Position of the behavior cursor.
    pub const fn behavior_cursor(&self) -> usize {
        self.behavior_cursor
    }

    /// Accumulate `ctx.delta_ms` and run whichever phases are due.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        npcs: &mut [Npc],
        planets: &mut BTreeMap<PlanetId, Planet>,
        ctx: &NpcTickContext<'_>,
        rng: &mut R,
    ) -> NpcTickReport {
        let mut report = NpcTickReport::default();
        if npcs.is_empty() {
            return report;
        }

        self.growth_elapsed_ms = self.growth_elapsed_ms.saturating_add(ctx.delta_ms);
        self.behavior_elapsed_ms = self.behavior_elapsed_ms.saturating_add(ctx.delta_ms);

        if self.growth_elapsed_ms >= self.settings.growth_interval_ms {
            let elapsed = std::mem::take(&mut self.growth_elapsed_ms);
            report.grown = self.run_growth(npcs, planets, elapsed, ctx.game_speed, rng);
            report.relation_stats = Some(relation_stats(npcs, ctx.player.id));
        }
        if self.behavior_elapsed_ms >= self.settings.behavior_interval_ms {
            self.behavior_elapsed_ms = 0;
            let (acted, events) = self.run_behavior(npcs, planets, ctx, rng);
            report.acted = acted;
            report.events = events;
        }
        report
    }

    /// Grow the next slice of NPCs.
    ///
    /// Each NPC in the slice is credited with the game time it sat idle,
    /// `elapsed_ms` times the number of passes in a full cycle. Returns
    /// how many NPCs grew.
    pub fn run_growth<R: Rng + ?Sized>(
        &mut self,
        npcs: &mut [Npc],
        planets: &mut BTreeMap<PlanetId, Planet>,
        elapsed_ms: u64,
        game_speed: f64,
        rng: &mut R,
    ) -> usize {
        let total = npcs.len();
        let slice = self.slice_size().max(1);
        let (start, end, next) = next_slice(self.growth_cursor, slice, total);
        self.growth_cursor = next;

        let passes = total.div_ceil(slice);
        let credited = elapsed_ms.saturating_mul(u64::try_from(passes).unwrap_or(u64::MAX));
        let mut grown = 0_usize;
        for npc in npcs.get_mut(start..end).unwrap_or_default() {
            match grow(npc, planets, credited, game_speed, rng) {
                Ok(_) => grown = grown.saturating_add(1),
                Err(e) => warn!(npc_id = %npc.id, error = %e, "NPC growth skipped"),
            }
        }
        debug!(start, end, next, grown, "NPC growth slice");
        grown
    }

    /// Run behavior for the next slice of NPCs, in shuffled order.
    pub fn run_behavior<R: Rng + ?Sized>(
        &mut self,
        npcs: &mut [Npc],
        planets: &mut BTreeMap<PlanetId, Planet>,
        ctx: &NpcTickContext<'_>,
        rng: &mut R,
    ) -> (usize, Vec<DiplomaticEvent>) {
        let total = npcs.len();
        let (start, end, next) = next_slice(self.behavior_cursor, self.slice_size().max(1), total);
        self.behavior_cursor = next;

        let mut active = ActiveMissions::total(npcs);
        let behavior = BehaviorContext {
            player: ctx.player,
            settings: &self.settings,
            now: ctx.now,
            flight: ctx.flight,
        };
        let mut order: Vec<usize> = (start..end).collect();
        order.shuffle(rng);

        let mut events = Vec::new();
        let mut acted = 0_usize;
        for index in order {
            if let Some(npc) = npcs.get_mut(index) {
                events.extend(act(npc, planets, &mut active, &behavior, rng));
                acted = acted.saturating_add(1);
            }
        }
        debug!(start, end, next, acted, events = events.len(), "NPC behavior slice");
        (acted, events)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::collections::BTreeSet;

    use nebula_fleet::arrival::new_colony;
    use nebula_types::{
        Coordinate, DifficultyTier, NpcId, OfficerBonuses, Owner, PlayerId, TechLevels,
    };
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn player() -> Player {
        Player {
            id: PlayerId::new(),
            name: "Commander".to_owned(),
            technologies: TechLevels::new(),
            research_queue: Vec::new(),
            planets: Vec::new(),
            bonuses: OfficerBonuses::default(),
        }
    }

    fn population(count: u32) -> (Vec<Npc>, BTreeMap<PlanetId, Planet>) {
        let mut planets = BTreeMap::new();
        let npcs = (0..count)
            .map(|i| {
                let id = NpcId::new();
                let planet = new_colony(Owner::Npc(id), Coordinate::new(2, i + 1, 7), 0);
                let planet_id = planet.id;
                planets.insert(planet_id, planet);
                Npc {
                    id,
                    name: format!("Faction {i}"),
                    planets: vec![planet_id],
                    technologies: TechLevels::new(),
                    relations: BTreeMap::new(),
                    difficulty: DifficultyTier::Easy,
                    last_spy_time: 0,
                    last_attack_time: 0,
                    missions: Vec::new(),
                }
            })
            .collect();
        (npcs, planets)
    }

    #[test]
    fn slice_bounds_wrap() {
        assert_eq!(next_slice(0, 20, 47), (0, 20, 20));
        assert_eq!(next_slice(20, 20, 47), (20, 40, 40));
        assert_eq!(next_slice(40, 20, 47), (40, 47, 0));
        assert_eq!(next_slice(60, 20, 47), (0, 20, 20));
        assert_eq!(next_slice(0, 20, 0), (0, 0, 0));
    }

    #[test]
    fn forty_seven_npcs_take_three_growth_passes() {
        let (mut npcs, mut planets) = population(47);
        let mut engine = NpcEngine::new(NpcSettings::default());
        let mut rng = StdRng::seed_from_u64(47);
        let mut touched = BTreeSet::new();

        for pass in 0..3 {
            let before = engine.growth_cursor();
            let grown = engine.run_growth(&mut npcs, &mut planets, 5_000, 1.0, &mut rng);
            touched.extend(before..before + grown);
            if pass < 2 {
                assert_ne!(engine.growth_cursor(), 0);
            }
        }
        assert_eq!(touched.len(), 47);
        assert_eq!(engine.growth_cursor(), 0);
    }

    #[test]
    fn phases_wait_for_their_interval() {
        let (mut npcs, mut planets) = population(5);
        let p = player();
        let mut engine = NpcEngine::new(NpcSettings::default());
        let mut rng = StdRng::seed_from_u64(1);
        let mut ctx = NpcTickContext {
            player: &p,
            delta_ms: 1_000,
            now: 1_000,
            game_speed: 1.0,
            flight: FlightParams::default(),
        };
        for _ in 0..4 {
            let report = engine.tick(&mut npcs, &mut planets, &ctx, &mut rng);
            assert_eq!(report.grown, 0);
            assert!(report.relation_stats.is_none());
            ctx.now += 1_000;
        }
        let report = engine.tick(&mut npcs, &mut planets, &ctx, &mut rng);
        assert_eq!(report.grown, 5);
        assert_eq!(report.acted, 5);
        assert!(report.relation_stats.is_some());
    }

    #[test]
    fn missing_planet_does_not_stop_the_slice() {
        let (mut npcs, mut planets) = population(3);
        let lost = npcs.get(1).unwrap().planets.first().copied().unwrap();
        planets.remove(&lost);
        let mut engine = NpcEngine::new(NpcSettings::default());
        let mut rng = StdRng::seed_from_u64(3);
        let grown = engine.run_growth(&mut npcs, &mut planets, 5_000, 1.0, &mut rng);
        assert_eq!(grown, 2);
    }

    #[test]
    fn slice_size_never_zero() {
        let mut engine = NpcEngine::default();
        engine.set_slice_size(0);
        assert_eq!(engine.slice_size(), 1);
    }
}
