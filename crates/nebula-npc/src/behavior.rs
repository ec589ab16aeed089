//! NPC behavior toward the player.
//!
//! Hostile NPCs spy on and attack the player's planets, subject to
//! per-NPC cooldowns and global caps on outbound missions. Neutral NPCs
//! may offer trades or swing their attitude. Friendly NPCs share intel,
//! propose joint attacks, and send aid. Everything here returns
//! [`DiplomaticEvent`]s for the caller to surface.

use std::collections::BTreeMap;

use nebula_fleet::{DispatchRequest, FlightParams, dispatch};
use nebula_types::resources::unit_count;
use nebula_types::{
    Coordinate, DiplomaticEvent, DiplomaticEventKind, Fleet, MissionKind, MissionStatus, Npc,
    Owner, Planet, PlanetId, Player, RelationReason, RelationStatus, Resources, ShipType,
};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::NpcSettings;
use crate::relation::{adjust, new_relation, status_toward};

/// Ship types an NPC sends on attacks.
const ATTACK_SHIPS: [ShipType; 4] = [
    ShipType::LightFighter,
    ShipType::HeavyFighter,
    ShipType::Cruiser,
    ShipType::Battleship,
];

/// Outbound NPC spy and attack missions across the population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveMissions {
    /// Spy missions outbound.
    pub spy: u32,
    /// Attack missions outbound.
    pub attack: u32,
}

impl ActiveMissions {
    /// Count one NPC's outbound spy and attack missions.
    pub fn of(npc: &Npc) -> Self {
        npc.missions
            .iter()
            .filter(|m| m.status == MissionStatus::Outbound)
            .fold(Self::default(), |mut acc, m| {
                match m.kind {
                    MissionKind::Spy => acc.spy = acc.spy.saturating_add(1),
                    MissionKind::Attack => acc.attack = acc.attack.saturating_add(1),
                    _ => {}
                }
                acc
            })
    }

    /// Count across every NPC.
    pub fn total(npcs: &[Npc]) -> Self {
        npcs.iter().map(Self::of).fold(Self::default(), |acc, n| Self {
            spy: acc.spy.saturating_add(n.spy),
            attack: acc.attack.saturating_add(n.attack),
        })
    }

    /// Swap one NPC's old contribution for its new one.
    pub const fn replace(&mut self, before: Self, after: Self) {
        self.spy = self.spy.saturating_sub(before.spy).saturating_add(after.spy);
        self.attack = self
            .attack
            .saturating_sub(before.attack)
            .saturating_add(after.attack);
    }
}

/// Inputs shared by every NPC in one behavior pass.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorContext<'a> {
    /// The player the NPCs react to.
    pub player: &'a Player,
    /// Engine settings.
    pub settings: &'a NpcSettings,
    /// Current game time (ms).
    pub now: u64,
    /// Flight modifiers for launched missions.
    pub flight: FlightParams,
}

/// Run one NPC's behavior.
///
/// `active` must hold the population-wide counts before the call; it is
/// updated with this NPC's change so the next NPC sees current caps.
pub fn act<R: Rng + ?Sized>(
    npc: &mut Npc,
    planets: &mut BTreeMap<PlanetId, Planet>,
    active: &mut ActiveMissions,
    ctx: &BehaviorContext<'_>,
    rng: &mut R,
) -> Vec<DiplomaticEvent> {
    let before = ActiveMissions::of(npc);
    let mut events = Vec::new();
    match status_toward(npc, ctx.player.id) {
        RelationStatus::Hostile => {
            let mut running = *active;
            if try_spy(npc, planets, running, ctx, rng) {
                running.spy = running.spy.saturating_add(1);
            }
            try_attack(npc, planets, running, ctx, rng);
        }
        RelationStatus::Neutral => neutral_events(npc, planets, ctx, rng, &mut events),
        RelationStatus::Friendly => friendly_events(npc, planets, ctx, rng, &mut events),
    }
    active.replace(before, ActiveMissions::of(npc));
    events
}

/// A random planet of the player's that still exists.
fn pick_target<R: Rng + ?Sized>(
    player: &Player,
    planets: &BTreeMap<PlanetId, Planet>,
    rng: &mut R,
) -> Option<(PlanetId, Coordinate, bool)> {
    let known: Vec<&Planet> = player
        .planets
        .iter()
        .filter_map(|id| planets.get(id))
        .collect();
    known
        .choose(rng)
        .map(|p| (p.id, p.coordinate, p.is_moon))
}

/// The NPC planet with the most `ships`, if any has at least one.
fn best_origin(npc: &Npc, planets: &BTreeMap<PlanetId, Planet>, ships: &[ShipType]) -> Option<PlanetId> {
    npc.planets
        .iter()
        .filter_map(|id| planets.get(id))
        .map(|p| {
            let count = ships
                .iter()
                .fold(0_u64, |acc, s| acc.saturating_add(unit_count(&p.fleet, s)));
            (p.id, count)
        })
        .filter(|&(_, count)| count > 0)
        .max_by_key(|&(_, count)| count)
        .map(|(id, _)| id)
}

fn launch(
    npc: &mut Npc,
    planets: &mut BTreeMap<PlanetId, Planet>,
    origin: PlanetId,
    request: DispatchRequest,
    ctx: &BehaviorContext<'_>,
) -> bool {
    let Some(planet) = planets.get_mut(&origin) else {
        return false;
    };
    match dispatch(planet, Owner::Npc(npc.id), request, ctx.now, ctx.flight) {
        Ok(mission) => {
            debug!(
                npc_id = %npc.id,
                kind = ?mission.kind,
                target = %mission.target,
                "NPC launched mission"
            );
            npc.missions.push(mission);
            true
        }
        Err(e) => {
            debug!(npc_id = %npc.id, error = %e, "NPC mission not launched");
            false
        }
    }
}

fn try_spy<R: Rng + ?Sized>(
    npc: &mut Npc,
    planets: &mut BTreeMap<PlanetId, Planet>,
    active: ActiveMissions,
    ctx: &BehaviorContext<'_>,
    rng: &mut R,
) -> bool {
    if active.spy >= ctx.settings.max_spy_missions
        || ctx.now.saturating_sub(npc.last_spy_time) < ctx.settings.spy_cooldown_ms
    {
        return false;
    }
    let Some((target_planet, target, target_is_moon)) = pick_target(ctx.player, planets, rng) else {
        return false;
    };
    let Some(origin) = best_origin(npc, planets, &[ShipType::EspionageProbe]) else {
        return false;
    };
    let request = DispatchRequest {
        kind: MissionKind::Spy,
        target,
        target_planet: Some(target_planet),
        target_is_moon,
        fleet: [(ShipType::EspionageProbe, 1)].into_iter().collect(),
        cargo: Resources::ZERO,
    };
    let launched = launch(npc, planets, origin, request, ctx);
    if launched {
        npc.last_spy_time = ctx.now;
    }
    launched
}

fn try_attack<R: Rng + ?Sized>(
    npc: &mut Npc,
    planets: &mut BTreeMap<PlanetId, Planet>,
    active: ActiveMissions,
    ctx: &BehaviorContext<'_>,
    rng: &mut R,
) -> bool {
    if active.attack >= ctx.settings.max_attack_missions
        || ctx.now.saturating_sub(npc.last_attack_time) < ctx.settings.attack_cooldown_ms
    {
        return false;
    }
    let Some((target_planet, target, target_is_moon)) = pick_target(ctx.player, planets, rng) else {
        return false;
    };
    let Some(origin) = best_origin(npc, planets, &ATTACK_SHIPS) else {
        return false;
    };
    let fleet: Fleet = planets
        .get(&origin)
        .map(|p| {
            ATTACK_SHIPS
                .iter()
                .map(|&s| (s, unit_count(&p.fleet, &s)))
                .filter(|&(_, n)| n > 0)
                .collect()
        })
        .unwrap_or_default();
    let request = DispatchRequest {
        kind: MissionKind::Attack,
        target,
        target_planet: Some(target_planet),
        target_is_moon,
        fleet,
        cargo: Resources::ZERO,
    };
    let launched = launch(npc, planets, origin, request, ctx);
    if launched {
        npc.last_attack_time = ctx.now;
    }
    launched
}

/// A `pct` share of the metal, crystal, and deuterium on the NPC's first
/// planet.
fn home_share(npc: &Npc, planets: &BTreeMap<PlanetId, Planet>, pct: u64) -> Resources {
    npc.planets
        .first()
        .and_then(|id| planets.get(id))
        .map_or(Resources::ZERO, |p| {
            let part = |n: u64| n.saturating_mul(pct).saturating_div(100);
            Resources::new(
                part(p.resources.metal),
                part(p.resources.crystal),
                part(p.resources.deuterium),
            )
        })
}

fn event(npc: &Npc, kind: DiplomaticEventKind, now: u64) -> DiplomaticEvent {
    DiplomaticEvent {
        kind,
        npc_id: npc.id,
        timestamp: now,
        resources: Resources::ZERO,
        new_status: None,
    }
}

fn neutral_events<R: Rng + ?Sized>(
    npc: &mut Npc,
    planets: &BTreeMap<PlanetId, Planet>,
    ctx: &BehaviorContext<'_>,
    rng: &mut R,
    events: &mut Vec<DiplomaticEvent>,
) {
    let settings = ctx.settings;
    if rng.random_bool(settings.trade_offer_chance.clamp(0.0, 1.0)) {
        events.push(DiplomaticEvent {
            resources: home_share(npc, planets, 10),
            ..event(npc, DiplomaticEventKind::TradeOffer, ctx.now)
        });
    }
    if rng.random_bool(settings.attitude_swing_chance.clamp(0.0, 1.0)) {
        let delta = if rng.random_bool(0.5) { 25 } else { -25 };
        let relation = npc
            .relations
            .entry(ctx.player.id)
            .or_insert_with(|| new_relation(ctx.now));
        if let Some(status) = adjust(relation, delta, RelationReason::AttitudeSwing, ctx.now) {
            events.push(DiplomaticEvent {
                new_status: Some(status),
                ..event(npc, DiplomaticEventKind::AttitudeSwing, ctx.now)
            });
        }
    }
}

fn friendly_events<R: Rng + ?Sized>(
    npc: &mut Npc,
    planets: &mut BTreeMap<PlanetId, Planet>,
    ctx: &BehaviorContext<'_>,
    rng: &mut R,
    events: &mut Vec<DiplomaticEvent>,
) {
    let settings = ctx.settings;
    if rng.random_bool(settings.intel_chance.clamp(0.0, 1.0)) {
        events.push(event(npc, DiplomaticEventKind::IntelShared, ctx.now));
    }
    if rng.random_bool(settings.joint_attack_chance.clamp(0.0, 1.0)) {
        events.push(event(npc, DiplomaticEventKind::JointAttackInvite, ctx.now));
    }
    if rng.random_bool(settings.aid_chance.clamp(0.0, 1.0)) {
        let aid = home_share(npc, planets, 5);
        if aid.is_empty() {
            return;
        }
        if let Some(home) = npc.planets.first().and_then(|id| planets.get_mut(id)) {
            home.resources = home.resources.saturating_sub(&aid);
        }
        if let Some(relation) = npc.relations.get_mut(&ctx.player.id) {
            adjust(relation, 2, RelationReason::Aid, ctx.now);
        }
        events.push(DiplomaticEvent {
            resources: aid,
            ..event(npc, DiplomaticEventKind::Aid, ctx.now)
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nebula_fleet::arrival::new_colony;
    use nebula_types::{DifficultyTier, NpcId, OfficerBonuses, PlayerId, TechLevels};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::relation::{PlayerAction, record_action};

    struct World {
        player: Player,
        npc: Npc,
        planets: BTreeMap<PlanetId, Planet>,
    }

    fn world(fleet: &[(ShipType, u64)]) -> World {
        let player_id = PlayerId::new();
        let home = new_colony(Owner::Player(player_id), Coordinate::new(1, 1, 4), 0);
        let npc_id = NpcId::new();
        let mut base = new_colony(Owner::Npc(npc_id), Coordinate::new(1, 2, 4), 0);
        base.resources = Resources::new(10_000, 10_000, 10_000);
        base.fleet = fleet.iter().copied().collect();
        let player = Player {
            id: player_id,
            name: "Commander".to_owned(),
            technologies: TechLevels::new(),
            research_queue: Vec::new(),
            planets: vec![home.id],
            bonuses: OfficerBonuses::default(),
        };
        let npc = Npc {
            id: npc_id,
            name: "Orrin Syndicate".to_owned(),
            planets: vec![base.id],
            technologies: TechLevels::new(),
            relations: BTreeMap::new(),
            difficulty: DifficultyTier::Medium,
            last_spy_time: 0,
            last_attack_time: 0,
            missions: Vec::new(),
        };
        let planets = [(home.id, home), (base.id, base)].into_iter().collect();
        World {
            player,
            npc,
            planets,
        }
    }

    #[test]
    fn hostile_npc_spies_and_attacks() {
        let mut w = world(&[(ShipType::EspionageProbe, 3), (ShipType::LightFighter, 10)]);
        record_action(&mut w.npc, w.player.id, PlayerAction::Attacked, 0);
        let settings = NpcSettings::default();
        let ctx = BehaviorContext {
            player: &w.player,
            settings: &settings,
            now: 1_000_000,
            flight: FlightParams::default(),
        };
        let mut active = ActiveMissions::default();
        let mut rng = StdRng::seed_from_u64(5);
        act(&mut w.npc, &mut w.planets, &mut active, &ctx, &mut rng);

        assert_eq!(active, ActiveMissions { spy: 1, attack: 1 });
        assert_eq!(w.npc.missions.len(), 2);
        assert_eq!(w.npc.last_spy_time, 1_000_000);
        assert_eq!(w.npc.last_attack_time, 1_000_000);
    }

    #[test]
    fn global_caps_block_new_missions() {
        let mut w = world(&[(ShipType::EspionageProbe, 3), (ShipType::LightFighter, 10)]);
        record_action(&mut w.npc, w.player.id, PlayerAction::Attacked, 0);
        let settings = NpcSettings::default();
        let ctx = BehaviorContext {
            player: &w.player,
            settings: &settings,
            now: 1_000_000,
            flight: FlightParams::default(),
        };
        let mut active = ActiveMissions {
            spy: settings.max_spy_missions,
            attack: settings.max_attack_missions,
        };
        let mut rng = StdRng::seed_from_u64(5);
        act(&mut w.npc, &mut w.planets, &mut active, &ctx, &mut rng);
        assert!(w.npc.missions.is_empty());
    }

    #[test]
    fn cooldown_blocks_repeat_spying() {
        let mut w = world(&[(ShipType::EspionageProbe, 3)]);
        record_action(&mut w.npc, w.player.id, PlayerAction::Attacked, 0);
        w.npc.last_spy_time = 900_000;
        let settings = NpcSettings::default();
        let ctx = BehaviorContext {
            player: &w.player,
            settings: &settings,
            now: 1_000_000,
            flight: FlightParams::default(),
        };
        let mut active = ActiveMissions::default();
        let mut rng = StdRng::seed_from_u64(5);
        act(&mut w.npc, &mut w.planets, &mut active, &ctx, &mut rng);
        assert!(w.npc.missions.is_empty());
    }

    #[test]
    fn certain_neutral_swing_emits_event() {
        let mut w = world(&[]);
        let settings = NpcSettings {
            trade_offer_chance: 1.0,
            attitude_swing_chance: 1.0,
            ..NpcSettings::default()
        };
        let ctx = BehaviorContext {
            player: &w.player,
            settings: &settings,
            now: 10,
            flight: FlightParams::default(),
        };
        let mut active = ActiveMissions::default();
        let mut rng = StdRng::seed_from_u64(2);
        let events = act(&mut w.npc, &mut w.planets, &mut active, &ctx, &mut rng);
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![DiplomaticEventKind::TradeOffer, DiplomaticEventKind::AttitudeSwing]
        );
        assert_ne!(status_toward(&w.npc, w.player.id), RelationStatus::Neutral);
    }

    #[test]
    fn friendly_aid_leaves_npc_stock() {
        let mut w = world(&[]);
        for _ in 0..5 {
            record_action(&mut w.npc, w.player.id, PlayerAction::Trade, 0);
        }
        let settings = NpcSettings {
            intel_chance: 0.0,
            joint_attack_chance: 0.0,
            aid_chance: 1.0,
            ..NpcSettings::default()
        };
        let ctx = BehaviorContext {
            player: &w.player,
            settings: &settings,
            now: 10,
            flight: FlightParams::default(),
        };
        let mut active = ActiveMissions::default();
        let mut rng = StdRng::seed_from_u64(2);
        let events = act(&mut w.npc, &mut w.planets, &mut active, &ctx, &mut rng);
        let aid = events.first().unwrap();
        assert_eq!(aid.kind, DiplomaticEventKind::Aid);
        assert_eq!(aid.resources, Resources::new(500, 500, 500));
        let base = w.planets.get(w.npc.planets.first().unwrap()).unwrap();
        assert_eq!(base.resources, Resources::new(9_500, 9_500, 9_500));
    }

    #[test]
    fn active_counts_replace_incrementally() {
        let mut active = ActiveMissions { spy: 3, attack: 1 };
        active.replace(
            ActiveMissions { spy: 1, attack: 0 },
            ActiveMissions { spy: 0, attack: 1 },
        );
        assert_eq!(active, ActiveMissions { spy: 2, attack: 2 });
    }
}
