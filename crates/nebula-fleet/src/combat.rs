//! Deterministic round-based battle simulation.
//!
//! Each round both sides fire at once using their strength at the start of
//! the round. A side's total firepower is spread over the enemy's unit
//! groups in proportion to head count. Each group's shields soak damage
//! first (shields regenerate every round); whatever gets through destroys
//! whole units at the group's hull value.
//!
//! The battle ends after [`MAX_ROUNDS`] or as soon as one side has no
//! combat power left (no units, or only units that cannot fire). It is a
//! draw only if both sides still have combat power after the last round;
//! otherwise the side that can still fire wins.

use nebula_types::data::{defense_stats, ship_stats};
use nebula_types::resources::{add_units, unit_losses};
use nebula_types::{
    BattleWinner, DefenseType, Defenses, Fleet, RoundDetail, ShipType, TechLevels,
    TechnologyType, tech_level,
};
use serde::{Deserialize, Serialize};

/// Default round cap.
pub const MAX_ROUNDS: u32 = 6;

/// Stat bonus per technology level, in percent.
const TECH_BONUS_PCT_PER_LEVEL: u64 = 10;

/// Weapon, shield, and armour technology levels of one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatTech {
    /// Weapons technology level.
    pub weapons: u32,
    /// Shielding technology level.
    pub shielding: u32,
    /// Armour technology level.
    pub armour: u32,
}

impl CombatTech {
    /// Read the combat technologies from a level map.
    pub fn from_levels(levels: &TechLevels) -> Self {
        Self {
            weapons: tech_level(levels, TechnologyType::WeaponsTechnology),
            shielding: tech_level(levels, TechnologyType::ShieldingTechnology),
            armour: tech_level(levels, TechnologyType::ArmourTechnology),
        }
    }
}

/// Input to one battle. Carries copies of everything it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRequest {
    /// Attacking ships.
    pub attacker_fleet: Fleet,
    /// Attacker technology.
    pub attacker_tech: CombatTech,
    /// Defending ships.
    pub defender_fleet: Fleet,
    /// Defending installations.
    pub defender_defenses: Defenses,
    /// Defender technology.
    pub defender_tech: CombatTech,
    /// Round cap.
    pub max_rounds: u32,
}

/// Result of [`simulate_battle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    /// Per-round losses.
    pub rounds: Vec<RoundDetail>,
    /// Attacker ships left.
    pub attacker_remaining: Fleet,
    /// Defender ships left.
    pub defender_remaining: Fleet,
    /// Defender installations left, before repair.
    pub defenses_remaining: Defenses,
    /// Attacker ships destroyed.
    pub attacker_losses: Fleet,
    /// Defender ships destroyed.
    pub defender_ship_losses: Fleet,
    /// Defender installations destroyed.
    pub defender_defense_losses: Defenses,
    /// Who won.
    pub winner: BattleWinner,
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Ship(ShipType),
    Defense(DefenseType),
}

#[derive(Debug, Clone, Copy)]
struct Group {
    unit: Unit,
    count: u64,
    attack: u64,
    shield: u64,
    armor: u64,
}

fn boosted(base: u64, level: u32) -> u64 {
    let pct = TECH_BONUS_PCT_PER_LEVEL
        .saturating_mul(u64::from(level))
        .saturating_add(100);
    base.saturating_mul(pct).saturating_div(100)
}

fn ship_groups(fleet: &Fleet, tech: CombatTech) -> Vec<Group> {
    fleet
        .iter()
        .filter(|&(_, &count)| count > 0)
        .map(|(&ship, &count)| {
            let stats = ship_stats(ship);
            Group {
                unit: Unit::Ship(ship),
                count,
                attack: boosted(stats.attack, tech.weapons),
                shield: boosted(stats.shield, tech.shielding),
                armor: boosted(stats.armor, tech.armour),
            }
        })
        .collect()
}

fn defense_groups(defenses: &Defenses, tech: CombatTech) -> impl Iterator<Item = Group> + '_ {
    defenses
        .iter()
        .filter(|&(_, &count)| count > 0)
        .map(move |(&defense, &count)| {
            let stats = defense_stats(defense);
            Group {
                unit: Unit::Defense(defense),
                count,
                attack: boosted(stats.attack, tech.weapons),
                shield: boosted(stats.shield, tech.shielding),
                armor: boosted(stats.armor, tech.armour),
            }
        })
}

fn head_count(groups: &[Group]) -> u64 {
    groups
        .iter()
        .fold(0_u64, |acc, g| acc.saturating_add(g.count))
}

fn firepower(groups: &[Group]) -> u64 {
    groups
        .iter()
        .fold(0_u64, |acc, g| acc.saturating_add(g.count.saturating_mul(g.attack)))
}

/// Spread `incoming` damage over `targets` by head count. Returns units
/// destroyed per group and the damage that got past shields.
fn absorb(targets: &[Group], incoming: u64) -> (Vec<u64>, u64) {
    let total = u128::from(head_count(targets));
    let mut dealt = 0_u64;
    let kills = targets
        .iter()
        .map(|g| {
            let share = u128::from(incoming)
                .saturating_mul(u128::from(g.count))
                .checked_div(total)
                .unwrap_or(0);
            let share = u64::try_from(share).unwrap_or(u64::MAX);
            let through = share.saturating_sub(g.count.saturating_mul(g.shield));
            dealt = dealt.saturating_add(through);
            through.saturating_div(g.armor.max(1)).min(g.count)
        })
        .collect();
    (kills, dealt)
}

/// Remove `kills` from `groups`, recording what died.
fn apply_kills(groups: &mut [Group], kills: &[u64], ships: &mut Fleet, defenses: &mut Defenses) {
    for (group, &killed) in groups.iter_mut().zip(kills) {
        if killed == 0 {
            continue;
        }
        group.count = group.count.saturating_sub(killed);
        match group.unit {
            Unit::Ship(ship) => add_units(ships, ship, killed),
            Unit::Defense(defense) => add_units(defenses, defense, killed),
        }
    }
}

fn survivors(groups: &[Group]) -> (Fleet, Defenses) {
    let mut fleet = Fleet::new();
    let mut defenses = Defenses::new();
    for group in groups {
        match group.unit {
            Unit::Ship(ship) => add_units(&mut fleet, ship, group.count),
            Unit::Defense(defense) => add_units(&mut defenses, defense, group.count),
        }
    }
    (fleet, defenses)
}

/// Both sides fire at once; losses are applied after both volleys.
fn fight_round(round: u32, attackers: &mut [Group], defenders: &mut [Group]) -> RoundDetail {
    let (defender_kills, attacker_damage) = absorb(defenders, firepower(attackers));
    let (attacker_kills, defender_damage) = absorb(attackers, firepower(defenders));

    let mut detail = RoundDetail {
        round,
        attacker_damage,
        defender_damage,
        ..RoundDetail::default()
    };
    let mut unused = Defenses::new();
    apply_kills(
        attackers,
        &attacker_kills,
        &mut detail.attacker_losses,
        &mut unused,
    );
    apply_kills(
        defenders,
        &defender_kills,
        &mut detail.defender_ship_losses,
        &mut detail.defender_defense_losses,
    );
    detail
}

/// Run a battle to completion.
pub fn simulate_battle(request: &BattleRequest) -> BattleOutcome {
    let mut attackers = ship_groups(&request.attacker_fleet, request.attacker_tech);
    let mut defenders = ship_groups(&request.defender_fleet, request.defender_tech);
    defenders.extend(defense_groups(
        &request.defender_defenses,
        request.defender_tech,
    ));

    let mut rounds = Vec::new();
    if head_count(&attackers) > 0 && head_count(&defenders) > 0 {
        for round in 1..=request.max_rounds {
            rounds.push(fight_round(round, &mut attackers, &mut defenders));
            if firepower(&attackers) == 0 || firepower(&defenders) == 0 {
                break;
            }
        }
    }

    let (attacker_remaining, _) = survivors(&attackers);
    let (defender_remaining, defenses_remaining) = survivors(&defenders);

    let winner = match (firepower(&attackers) > 0, firepower(&defenders) > 0) {
        (true, true) => BattleWinner::Draw,
        (true, false) => BattleWinner::Attacker,
        (false, true) => BattleWinner::Defender,
        // Neither side can fire: an undefended target falls.
        (false, false) if head_count(&defenders) == 0 => BattleWinner::Attacker,
        (false, false) => BattleWinner::Defender,
    };

    BattleOutcome {
        rounds,
        attacker_losses: unit_losses(&request.attacker_fleet, &attacker_remaining),
        defender_ship_losses: unit_losses(&request.defender_fleet, &defender_remaining),
        defender_defense_losses: unit_losses(&request.defender_defenses, &defenses_remaining),
        attacker_remaining,
        defender_remaining,
        defenses_remaining,
        winner,
    }
}
