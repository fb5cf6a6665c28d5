//! Cooldown-gated attack resolution
//!
//! An attack either lands in full or does nothing. There is no queueing:
//! callers poll `can_attack` each tick and evade while it is false.

use serde::{Deserialize, Serialize};

use crate::agents::agent::CombatStats;
use crate::agents::registry::AgentRegistry;
use crate::core::types::{AgentId, SimTime};

/// A successful hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub damage: i32,
    /// Defender health after the hit; may be negative
    pub remaining: i32,
    pub killed: bool,
}

pub fn can_attack(attacker: &CombatStats, now: SimTime) -> bool {
    attacker.can_attack(now)
}

/// Apply one hit if the attacker is off cooldown
pub fn strike(attacker: &mut CombatStats, defender: &mut CombatStats, now: SimTime) -> Option<AttackOutcome> {
    if !attacker.can_attack(now) {
        return None;
    }
    defender.health -= attacker.attack;
    attacker.last_attack_at = Some(now);
    Some(AttackOutcome {
        damage: attacker.attack,
        remaining: defender.health,
        killed: !defender.is_alive(),
    })
}

/// Resolve an attack between two registered agents
///
/// Returns None with no state change when either agent is missing or has no
/// combat stats, when the attacker targets itself, or while the attacker's
/// cooldown is running.
pub fn try_attack(
    agents: &mut AgentRegistry,
    attacker: AgentId,
    defender: AgentId,
    now: SimTime,
) -> Option<AttackOutcome> {
    if attacker == defender {
        return None;
    }
    let mut attacker_stats = agents.get(attacker)?.combat?;
    let mut defender_stats = agents.get(defender)?.combat?;

    let outcome = strike(&mut attacker_stats, &mut defender_stats, now)?;

    if let Some(agent) = agents.get_mut(attacker) {
        agent.combat = Some(attacker_stats);
    }
    if let Some(agent) = agents.get_mut(defender) {
        agent.combat = Some(defender_stats);
    }
    Some(outcome)
}

/// Seconds until `agent` may attack again; None without combat stats
pub fn cooldown_remaining(agents: &AgentRegistry, agent: AgentId, now: SimTime) -> Option<f32> {
    agents
        .get(agent)
        .and_then(|a| a.combat)
        .map(|c| c.cooldown_remaining(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::agent::{Agent, AgentKind};
    use crate::core::types::Faction;
    use crate::grid::hex::{HexCoord, HexLayout};

    fn fighters() -> (AgentRegistry, AgentId, AgentId) {
        let mut agents = AgentRegistry::new(HexLayout::default());
        let bee = agents
            .register(
                Agent::new(AgentKind::Worker, Faction::Player, HexCoord::new(0, 0))
                    .with_combat(CombatStats::new(10, 3, 1.0)),
            )
            .unwrap();
        let wasp = agents
            .register(
                Agent::new(AgentKind::Wasp, Faction::Enemy, HexCoord::new(1, 0))
                    .with_combat(CombatStats::new(5, 2, 1.0)),
            )
            .unwrap();
        (agents, bee, wasp)
    }

    #[test]
    fn test_attack_reduces_health() {
        let (mut agents, bee, wasp) = fighters();
        let outcome = try_attack(&mut agents, bee, wasp, 0.0).unwrap();

        assert_eq!(outcome.damage, 3);
        assert_eq!(outcome.remaining, 2);
        assert!(!outcome.killed);
        assert_eq!(agents.get(wasp).unwrap().health(), Some(2));
    }

    #[test]
    fn test_second_attack_within_cooldown_fails() {
        let (mut agents, bee, wasp) = fighters();
        assert!(try_attack(&mut agents, bee, wasp, 0.0).is_some());
        assert!(try_attack(&mut agents, bee, wasp, 0.5).is_none());
        assert_eq!(agents.get(wasp).unwrap().health(), Some(2));

        assert!(try_attack(&mut agents, bee, wasp, 1.0).is_some());
    }

    #[test]
    fn test_health_may_go_negative() {
        let (mut agents, bee, wasp) = fighters();
        try_attack(&mut agents, bee, wasp, 0.0);
        let outcome = try_attack(&mut agents, bee, wasp, 1.0).unwrap();
        assert_eq!(outcome.remaining, -1);
        assert!(outcome.killed);
    }

    #[test]
    fn test_cooldowns_are_per_attacker() {
        let (mut agents, bee, wasp) = fighters();
        assert!(try_attack(&mut agents, bee, wasp, 0.0).is_some());
        assert!(try_attack(&mut agents, wasp, bee, 0.0).is_some());
        assert_eq!(cooldown_remaining(&agents, bee, 0.25), Some(0.75));
    }

    #[test]
    fn test_missing_stats_no_change() {
        let (mut agents, bee, _) = fighters();
        let rock = agents
            .register(Agent::new(AgentKind::Wasp, Faction::Enemy, HexCoord::new(0, 1)))
            .unwrap();

        assert!(try_attack(&mut agents, bee, rock, 0.0).is_none());
        assert!(try_attack(&mut agents, bee, AgentId::new(), 0.0).is_none());
        assert!(try_attack(&mut agents, bee, bee, 0.0).is_none());
        // Failed attempts never start the cooldown
        assert!(agents.get(bee).unwrap().combat.unwrap().can_attack(0.0));
    }
}
