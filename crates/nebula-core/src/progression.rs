//! Low-frequency progression jobs run by the scheduler.
//!
//! - achievement checks award one-off milestones to the player
//! - diplomacy cleanup drops NPCs that have lost every planet

use nebula_npc::relation_stats;
use nebula_types::resources::total_units;
use nebula_types::{BattleWinner, BuildingType, Owner, PlanetId, Severity};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ProgressionConfig;
use crate::scheduler::Scheduler;
use crate::state::GameState;

/// Errors raised by progression jobs.
#[derive(Debug, thiserror::Error)]
pub enum ProgressionError {
    /// The player lists a planet the universe does not contain.
    #[error("player planet {planet_id} is missing")]
    MissingPlanet {
        /// The dangling id.
        planet_id: PlanetId,
    },
}

/// One-off player milestones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    /// Own at least two planets.
    Colonist,
    /// Command at least 100 ships, docked or in flight.
    Admiral,
    /// Reach 25 technology levels in total.
    Scholar,
    /// Raise a metal mine to level 15.
    Industrialist,
    /// Win a battle as the attacker.
    Conqueror,
    /// Be on friendly terms with three factions.
    Diplomat,
}

impl Achievement {
    /// Every achievement, in check order.
    pub const ALL: [Self; 6] = [
        Self::Colonist,
        Self::Admiral,
        Self::Scholar,
        Self::Industrialist,
        Self::Conqueror,
        Self::Diplomat,
    ];

    /// Display title.
    pub const fn title(self) -> &'static str {
        match self {
            Self::Colonist => "Colonist",
            Self::Admiral => "Admiral",
            Self::Scholar => "Scholar",
            Self::Industrialist => "Industrialist",
            Self::Conqueror => "Conqueror",
            Self::Diplomat => "Diplomat",
        }
    }

    fn earned(self, state: &GameState) -> bool {
        let player = &state.player;
        let planets = || player.planets.iter().filter_map(|id| state.planets.get(id));
        match self {
            Self::Colonist => planets().filter(|p| !p.is_moon).count() >= 2,
            Self::Admiral => {
                let docked = planets().map(|p| total_units(&p.fleet)).sum::<u64>();
                let flying = state.missions.iter().map(|m| total_units(&m.fleet)).sum::<u64>();
                docked.saturating_add(flying) >= 100
            }
            Self::Scholar => {
                player
                    .technologies
                    .values()
                    .map(|&level| u64::from(level))
                    .sum::<u64>()
                    >= 25
            }
            Self::Industrialist => planets().any(|p| p.building_level(BuildingType::MetalMine) >= 15),
            Self::Conqueror => state.battle_reports.iter().any(|r| {
                r.attacker == Owner::Player(player.id) && r.winner == BattleWinner::Attacker
            }),
            Self::Diplomat => relation_stats(&state.npcs, player.id).friendly >= 3,
        }
    }
}

/// Award every newly earned achievement.
///
/// # Errors
///
/// Returns [`ProgressionError::MissingPlanet`] if the player lists a
/// planet that does not exist; nothing is awarded in that case.
pub fn check_achievements(
    state: &mut GameState,
    now: u64,
) -> Result<Vec<Achievement>, ProgressionError> {
    if let Some(&planet_id) = state
        .player
        .planets
        .iter()
        .find(|id| !state.planets.contains_key(id))
    {
        return Err(ProgressionError::MissingPlanet { planet_id });
    }

    let view: &GameState = state;
    let earned: Vec<Achievement> = Achievement::ALL
        .into_iter()
        .filter(|a| !view.achievements.contains(a) && a.earned(view))
        .collect();
    for achievement in &earned {
        state.achievements.insert(*achievement);
        state.notify(
            now,
            Severity::Success,
            format!("Achievement unlocked: {}", achievement.title()),
        );
        info!(achievement = achievement.title(), "Achievement unlocked");
    }
    Ok(earned)
}

/// Remove NPCs that no longer own any existing planet, with their missions.
///
/// Returns how many were removed.
pub fn cleanup_eliminated(state: &mut GameState, now: u64) -> usize {
    let planets = &state.planets;
    let (eliminated, alive): (Vec<_>, Vec<_>) = std::mem::take(&mut state.npcs)
        .into_iter()
        .partition(|npc| !npc.planets.iter().any(|id| planets.contains_key(id)));
    state.npcs = alive;
    for npc in &eliminated {
        info!(
            npc_id = %npc.id,
            name = %npc.name,
            missions = npc.missions.len(),
            "Faction eliminated"
        );
        state.notify(now, Severity::Info, format!("{} has been eliminated", npc.name));
    }
    eliminated.len()
}

/// Register the progression jobs on `scheduler`.
pub fn register(scheduler: &mut Scheduler<GameState, ProgressionError>, config: &ProgressionConfig) {
    scheduler.every("achievements", config.achievement_check_ms, |state, now| {
        check_achievements(state, now).map(|_| ())
    });
    scheduler.every("diplomacy_cleanup", config.diplomacy_cleanup_ms, |state, now| {
        cleanup_eliminated(state, now);
        Ok(())
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use nebula_fleet::arrival::new_colony;
    use nebula_types::{
        Coordinate, DifficultyTier, Npc, NpcId, OfficerBonuses, Player, PlayerId, ShipType,
        TechLevels, TechnologyType,
    };

    use super::*;

    fn state() -> GameState {
        let mut s = GameState::new(Player {
            id: PlayerId::new(),
            name: "Commander".to_owned(),
            technologies: TechLevels::new(),
            research_queue: Vec::new(),
            planets: Vec::new(),
            bonuses: OfficerBonuses::default(),
        });
        let home = new_colony(Owner::Player(s.player.id), Coordinate::new(1, 1, 8), 0);
        s.add_planet(home);
        s
    }

    fn npc(name: &str) -> Npc {
        Npc {
            id: NpcId::new(),
            name: name.to_owned(),
            planets: Vec::new(),
            technologies: TechLevels::new(),
            relations: BTreeMap::new(),
            difficulty: DifficultyTier::Medium,
            last_spy_time: 0,
            last_attack_time: 0,
            missions: Vec::new(),
        }
    }

    #[test]
    fn achievements_are_awarded_once() {
        let mut s = state();
        assert!(check_achievements(&mut s, 0).unwrap().is_empty());

        let home = s.home_planet().unwrap();
        s.planets.get_mut(&home).unwrap().fleet.insert(ShipType::LightFighter, 100);
        s.player.technologies.insert(TechnologyType::ComputerTechnology, 25);

        let earned = check_achievements(&mut s, 10).unwrap();
        assert_eq!(earned, vec![Achievement::Admiral, Achievement::Scholar]);
        assert_eq!(s.drain_notifications().len(), 2);
        assert!(check_achievements(&mut s, 20).unwrap().is_empty());
    }

    #[test]
    fn dangling_planet_is_an_error() {
        let mut s = state();
        s.player.planets.push(PlanetId::new());
        let result = check_achievements(&mut s, 0);
        assert!(matches!(result, Err(ProgressionError::MissingPlanet { .. })));
        assert!(s.achievements.is_empty());
    }

    #[test]
    fn cleanup_removes_factions_without_planets() {
        let mut s = state();
        let alive = npc("Orrim");
        let alive_id = alive.id;
        s.npcs.push(alive);
        s.npcs.push(npc("Kethra"));
        let mut ghost = npc("Sable");
        ghost.planets.push(PlanetId::new());
        s.npcs.push(ghost);
        s.add_planet(new_colony(Owner::Npc(alive_id), Coordinate::new(1, 4, 4), 0));

        assert_eq!(cleanup_eliminated(&mut s, 5), 2);
        assert_eq!(s.npcs.len(), 1);
        assert_eq!(s.npcs.first().unwrap().id, alive_id);
        assert_eq!(s.drain_notifications().len(), 2);
    }

    #[test]
    fn jobs_run_through_the_scheduler() {
        let mut s = state();
        s.npcs.push(npc("Kethra"));
        let mut scheduler = Scheduler::new();
        register(&mut scheduler, &ProgressionConfig::default());
        assert_eq!(scheduler.len(), 2);

        let (ran, failures) = scheduler.tick(&mut s, 1_000);
        assert_eq!(ran, 2);
        assert!(failures.is_empty());
        assert!(s.npcs.is_empty());
    }
}
