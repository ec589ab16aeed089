//! The game-state aggregate mutated by each tick.
//!
//! [`GameState`] owns every entity collection. Exactly one tick phase
//! mutates it at a time; the compute unit only ever sees copies. The
//! aggregate is a plain snapshot-able value so persistence can serialize
//! it however it likes.

use std::collections::{BTreeMap, BTreeSet};

use nebula_economy::storage_capacity;
use nebula_types::{
    BattleResult, Coordinate, DebrisField, FleetMission, MissionReport, Notification, Npc, NpcId,
    Owner, Planet, PlanetId, Player, Resources, Severity, SpyReport, TechLevels,
};
use serde::{Deserialize, Serialize};

use crate::progression::Achievement;

/// Most reports of each kind kept in the state; older ones are dropped.
pub const REPORT_LIMIT: usize = 200;

/// Everything the engine simulates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// The human player.
    pub player: Player,
    /// Every planet and moon in the universe, player and NPC alike.
    pub planets: BTreeMap<PlanetId, Planet>,
    /// The NPC population, in round-robin order.
    pub npcs: Vec<Npc>,
    /// The player's fleet missions. NPC missions live on each [`Npc`].
    pub missions: Vec<FleetMission>,
    /// Debris fields, at most one per coordinate.
    pub debris: Vec<DebrisField>,
    /// Battle reports, oldest first.
    pub battle_reports: Vec<BattleResult>,
    /// Player mission reports, oldest first.
    pub mission_reports: Vec<MissionReport>,
    /// Player spy reports, oldest first.
    pub spy_reports: Vec<SpyReport>,
    /// Achievements already earned.
    pub achievements: BTreeSet<Achievement>,
    /// Notifications produced since the last drain.
    #[serde(skip)]
    pub outbox: Vec<Notification>,
}

fn push_capped<T>(log: &mut Vec<T>, item: T) {
    log.push(item);
    let excess = log.len().saturating_sub(REPORT_LIMIT);
    log.drain(..excess);
}

impl GameState {
    /// A universe holding only `player`.
    pub fn new(player: Player) -> Self {
        Self {
            player,
            planets: BTreeMap::new(),
            npcs: Vec::new(),
            missions: Vec::new(),
            debris: Vec::new(),
            battle_reports: Vec::new(),
            mission_reports: Vec::new(),
            spy_reports: Vec::new(),
            achievements: BTreeSet::new(),
            outbox: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Planets
    // -----------------------------------------------------------------------

    /// The planet (or moon, if `moon`) at `coordinate`.
    pub fn planet_id_at(&self, coordinate: Coordinate, moon: bool) -> Option<PlanetId> {
        self.planets
            .values()
            .find(|p| p.coordinate == coordinate && p.is_moon == moon)
            .map(|p| p.id)
    }

    /// The player's first planet.
    pub fn home_planet(&self) -> Option<PlanetId> {
        self.player.planets.first().copied()
    }

    /// Insert `planet` and list it under its owner.
    pub fn add_planet(&mut self, planet: Planet) {
        let id = planet.id;
        match planet.owner {
            Owner::Player(_) => self.player.planets.push(id),
            Owner::Npc(npc) => {
                if let Some(npc) = self.npc_mut(npc) {
                    npc.planets.push(id);
                }
            }
        }
        self.planets.insert(id, planet);
    }

    /// Remove a planet and unlist it from its owner.
    pub fn remove_planet(&mut self, id: PlanetId) -> Option<Planet> {
        let planet = self.planets.remove(&id)?;
        match planet.owner {
            Owner::Player(_) => self.player.planets.retain(|p| *p != id),
            Owner::Npc(npc) => {
                if let Some(npc) = self.npc_mut(npc) {
                    npc.planets.retain(|p| *p != id);
                }
            }
        }
        Some(planet)
    }

    /// Storage bonus in percent for planets of `owner`.
    pub fn storage_bonus(&self, owner: Owner) -> u32 {
        if owner.is_player() {
            self.player.bonuses.storage_capacity_pct
        } else {
            0
        }
    }

    /// Storage capacity of planet `id`, or zero if it does not exist.
    pub fn capacity_of(&self, id: PlanetId) -> Resources {
        self.planets.get(&id).map_or(Resources::ZERO, |planet| {
            storage_capacity(planet, self.storage_bonus(planet.owner))
        })
    }

    // -----------------------------------------------------------------------
    // Owners
    // -----------------------------------------------------------------------

    /// Technology levels of `owner`.
    pub fn tech_of(&self, owner: Owner) -> Option<&TechLevels> {
        match owner {
            Owner::Player(id) => (id == self.player.id).then_some(&self.player.technologies),
            Owner::Npc(id) => self.npc(id).map(|npc| &npc.technologies),
        }
    }

    /// Display name of `owner`.
    pub fn owner_name(&self, owner: Owner) -> &str {
        match owner {
            Owner::Player(_) => self.player.name.as_str(),
            Owner::Npc(id) => self.npc(id).map_or("Unknown faction", |npc| npc.name.as_str()),
        }
    }

    /// The NPC with `id`.
    pub fn npc(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.iter().find(|npc| npc.id == id)
    }

    /// The NPC with `id`, mutably.
    pub fn npc_mut(&mut self, id: NpcId) -> Option<&mut Npc> {
        self.npcs.iter_mut().find(|npc| npc.id == id)
    }

    // -----------------------------------------------------------------------
    // Missions and debris
    // -----------------------------------------------------------------------

    /// Every mission in flight, the player's first.
    pub fn all_missions(&self) -> impl Iterator<Item = &FleetMission> {
        self.missions
            .iter()
            .chain(self.npcs.iter().flat_map(|npc| npc.missions.iter()))
    }

    /// The debris field at `coordinate`.
    pub fn debris_at_mut(&mut self, coordinate: Coordinate) -> Option<&mut DebrisField> {
        self.debris.iter_mut().find(|d| d.coordinate == coordinate)
    }

    /// Add `resources` to the field at `coordinate`, creating it if absent.
    pub fn add_debris(&mut self, coordinate: Coordinate, resources: Resources, now: u64) {
        if resources.is_empty() {
            return;
        }
        match self.debris_at_mut(coordinate) {
            Some(field) => field.resources = field.resources.saturating_add(&resources),
            None => self.debris.push(DebrisField {
                coordinate,
                resources,
                created_at: now,
            }),
        }
    }

    /// Drop fields with nothing left and, if given, the field at a
    /// coordinate whose planet is gone.
    pub fn prune_debris(&mut self, destroyed: Option<Coordinate>) {
        self.debris.retain(|field| {
            Some(field.coordinate) != destroyed
                && (field.resources.metal > 0 || field.resources.crystal > 0)
        });
    }

    // -----------------------------------------------------------------------
    // Reports and notifications
    // -----------------------------------------------------------------------

    /// Append a battle report.
    pub fn push_battle_report(&mut self, report: BattleResult) {
        push_capped(&mut self.battle_reports, report);
    }

    /// Append a mission report.
    pub fn push_mission_report(&mut self, report: MissionReport) {
        push_capped(&mut self.mission_reports, report);
    }

    /// Append a spy report.
    pub fn push_spy_report(&mut self, report: SpyReport) {
        push_capped(&mut self.spy_reports, report);
    }

    /// Queue a notification for the caller.
    pub fn notify(&mut self, timestamp: u64, severity: Severity, message: impl Into<String>) {
        self.outbox.push(Notification {
            timestamp,
            severity,
            message: message.into(),
        });
    }

    /// Take every queued notification.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }
}
