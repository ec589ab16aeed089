//! NPC standing toward a player.
//!
//! Reputation lives in `-100..=100`. Status is a pure function of the
//! score: at or below -20 the NPC is hostile, at or above 20 friendly,
//! neutral in between. History keeps only the most recent changes.

use nebula_types::{Npc, PlayerId, Relation, RelationChange, RelationReason, RelationStatus};
use serde::{Deserialize, Serialize};

/// Lowest possible reputation.
pub const REPUTATION_MIN: i32 = -100;

/// Highest possible reputation.
pub const REPUTATION_MAX: i32 = 100;

/// Reputation at or below which an NPC turns hostile.
pub const HOSTILE_THRESHOLD: i32 = -20;

/// Reputation at or above which an NPC turns friendly.
pub const FRIENDLY_THRESHOLD: i32 = 20;

/// Entries kept in a relation's history.
pub const HISTORY_LIMIT: usize = 20;

/// Status for a reputation score.
pub const fn status_for(reputation: i32) -> RelationStatus {
    if reputation <= HOSTILE_THRESHOLD {
        RelationStatus::Hostile
    } else if reputation >= FRIENDLY_THRESHOLD {
        RelationStatus::Friendly
    } else {
        RelationStatus::Neutral
    }
}

/// A fresh neutral relation.
pub const fn new_relation(now: u64) -> Relation {
    Relation {
        reputation: 0,
        status: RelationStatus::Neutral,
        last_updated: now,
        history: Vec::new(),
    }
}

/// Shift `relation` by `delta`, clamped, and record why.
///
/// Returns the new status if it changed.
pub fn adjust(
    relation: &mut Relation,
    delta: i32,
    reason: RelationReason,
    now: u64,
) -> Option<RelationStatus> {
    let before = relation.status;
    relation.reputation = relation
        .reputation
        .saturating_add(delta)
        .clamp(REPUTATION_MIN, REPUTATION_MAX);
    relation.status = status_for(relation.reputation);
    relation.last_updated = now;
    relation.history.push(RelationChange {
        timestamp: now,
        delta,
        reason,
    });
    let excess = relation.history.len().saturating_sub(HISTORY_LIMIT);
    relation.history.drain(..excess);
    (relation.status != before).then_some(relation.status)
}

/// Something the player did to an NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerAction {
    /// Attacked one of the NPC's planets.
    Attacked,
    /// Spied on one of the NPC's planets.
    Spied,
    /// Destroyed one of the NPC's planets.
    PlanetDestroyed,
    /// Sent resources worth `value`.
    Gift {
        /// Total metal + crystal + deuterium sent.
        value: u64,
    },
    /// Accepted a trade.
    Trade,
}

/// Reputation delta and reason for `action`.
///
/// Gifts earn one point per 10 000 resources, between 1 and 15.
pub fn action_delta(action: PlayerAction) -> (i32, RelationReason) {
    match action {
        PlayerAction::Attacked => (-20, RelationReason::Attacked),
        PlayerAction::Spied => (-5, RelationReason::Spied),
        PlayerAction::PlanetDestroyed => (-50, RelationReason::PlanetDestroyed),
        PlayerAction::Gift { value } => {
            let points = i32::try_from(value.saturating_div(10_000)).unwrap_or(i32::MAX);
            (points.clamp(1, 15), RelationReason::Gift)
        }
        PlayerAction::Trade => (5, RelationReason::Trade),
    }
}

/// Apply `action` by `player` to `npc`'s relation, creating it if absent.
///
/// Returns the new status if it changed.
pub fn record_action(
    npc: &mut Npc,
    player: PlayerId,
    action: PlayerAction,
    now: u64,
) -> Option<RelationStatus> {
    let (delta, reason) = action_delta(action);
    let relation = npc
        .relations
        .entry(player)
        .or_insert_with(|| new_relation(now));
    adjust(relation, delta, reason, now)
}

/// Current status of `npc` toward `player`; neutral when unknown.
pub fn status_toward(npc: &Npc, player: PlayerId) -> RelationStatus {
    npc.relations
        .get(&player)
        .map_or(RelationStatus::Neutral, |r| r.status)
}

/// How many NPCs hold each attitude toward one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationStats {
    /// Friendly NPCs.
    pub friendly: u32,
    /// Neutral NPCs.
    pub neutral: u32,
    /// Hostile NPCs.
    pub hostile: u32,
}

/// Recount attitudes toward `player` from reputation scores.
pub fn relation_stats(npcs: &[Npc], player: PlayerId) -> RelationStats {
    npcs.iter()
        .filter_map(|npc| npc.relations.get(&player))
        .fold(RelationStats::default(), |mut stats, relation| {
            let slot = match status_for(relation.reputation) {
                RelationStatus::Friendly => &mut stats.friendly,
                RelationStatus::Neutral => &mut stats.neutral,
                RelationStatus::Hostile => &mut stats.hostile,
            };
            *slot = slot.saturating_add(1);
            stats
        })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use nebula_types::{DifficultyTier, NpcId};

    use super::*;

    fn npc() -> Npc {
        Npc {
            id: NpcId::new(),
            name: "Vorn Collective".to_owned(),
            planets: Vec::new(),
            technologies: BTreeMap::new(),
            relations: BTreeMap::new(),
            difficulty: DifficultyTier::Medium,
            last_spy_time: 0,
            last_attack_time: 0,
            missions: Vec::new(),
        }
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(status_for(-20), RelationStatus::Hostile);
        assert_eq!(status_for(-19), RelationStatus::Neutral);
        assert_eq!(status_for(19), RelationStatus::Neutral);
        assert_eq!(status_for(20), RelationStatus::Friendly);
    }

    #[test]
    fn reputation_is_clamped() {
        let mut relation = new_relation(0);
        adjust(&mut relation, -500, RelationReason::PlanetDestroyed, 1);
        assert_eq!(relation.reputation, REPUTATION_MIN);
        adjust(&mut relation, i32::MAX, RelationReason::Gift, 2);
        assert_eq!(relation.reputation, REPUTATION_MAX);
    }

    #[test]
    fn history_is_bounded() {
        let mut relation = new_relation(0);
        for t in 0..50 {
            adjust(&mut relation, 1, RelationReason::Trade, t);
        }
        assert_eq!(relation.history.len(), HISTORY_LIMIT);
        assert_eq!(relation.history.first().map(|c| c.timestamp), Some(30));
    }

    #[test]
    fn attack_turns_neutral_hostile() {
        let mut n = npc();
        let player = PlayerId::new();
        let changed = record_action(&mut n, player, PlayerAction::Attacked, 10);
        assert_eq!(changed, Some(RelationStatus::Hostile));
        assert_eq!(status_toward(&n, player), RelationStatus::Hostile);
    }

    #[test]
    fn gifts_scale_and_cap() {
        assert_eq!(action_delta(PlayerAction::Gift { value: 500 }).0, 1);
        assert_eq!(action_delta(PlayerAction::Gift { value: 80_000 }).0, 8);
        assert_eq!(action_delta(PlayerAction::Gift { value: 10_000_000 }).0, 15);
    }

    #[test]
    fn stats_count_each_status() {
        let player = PlayerId::new();
        let mut a = npc();
        let mut b = npc();
        let c = npc();
        record_action(&mut a, player, PlayerAction::Attacked, 0);
        record_action(&mut b, player, PlayerAction::Trade, 0);
        let stats = relation_stats(&[a, b, c], player);
        assert_eq!(
            stats,
            RelationStats {
                friendly: 0,
                neutral: 1,
                hostile: 1,
            }
        );
    }
}
