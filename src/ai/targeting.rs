//! Target selection shared by the enemy AI variants
//!
//! Candidates are player agents the AI can see. Tanks come first, then
//! ordinary units, then hives; within a tier the nearest wins.

use ordered_float::OrderedFloat;

use crate::agents::agent::{Agent, AgentKind};
use crate::agents::registry::AgentRegistry;
use crate::core::types::{AgentId, Faction, Vec2};
use crate::grid::hex::HexCoord;
use crate::hive::activity::in_range;
use crate::hive::colony::HiveRegistry;

/// Target priority; lower ranks first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TargetTier {
    Tank,
    Unit,
    Hive,
}

impl TargetTier {
    pub fn of(agent: &Agent) -> Self {
        if agent.kind.is_tank() {
            TargetTier::Tank
        } else if agent.kind.is_structure() {
            TargetTier::Hive
        } else {
            TargetTier::Unit
        }
    }
}

/// Who is looking, and from where
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetQuery {
    pub origin: HexCoord,
    pub position: Vec2,
    pub vision_range: u32,
    /// Home-bound AIs only engage inside their hive's activity radius
    pub leash: Option<Leash>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leash {
    pub hive: HexCoord,
    pub radius: u32,
}

impl TargetQuery {
    /// Would this agent pass the candidate filters?
    pub fn accepts(&self, candidate: &Agent) -> bool {
        candidate.faction == Faction::Player
            && !candidate.invincible
            && candidate.combat.is_some()
            && candidate.is_alive()
            && candidate.coord().distance(&self.origin) <= self.vision_range
            && self
                .leash
                .map(|l| in_range(l.hive, candidate.coord(), l.radius))
                .unwrap_or(true)
    }

    fn rank(&self, candidate: &Agent) -> (TargetTier, u32, OrderedFloat<f32>) {
        (
            TargetTier::of(candidate),
            candidate.coord().distance(&self.origin),
            OrderedFloat(candidate.world_pos.distance(&self.position)),
        )
    }
}

/// Best target for a query, if any
pub fn find_target(agents: &AgentRegistry, query: &TargetQuery) -> Option<AgentId> {
    agents
        .within(query.origin, query.vision_range)
        .into_iter()
        .filter(|candidate| query.accepts(candidate))
        .min_by_key(|candidate| query.rank(candidate))
        .map(|candidate| candidate.id)
}

/// A queen standing on her own hive tile is inside it: aim at the hive
pub fn redirect_sheltered_queen(
    agents: &AgentRegistry,
    hives: &HiveRegistry,
    target: AgentId,
) -> AgentId {
    let Some(agent) = agents.get(target) else {
        return target;
    };
    if agent.kind != AgentKind::Queen {
        return target;
    }
    hives
        .for_faction(agent.faction)
        .filter(|hive| hive.coord == agent.coord() && agents.contains(hive.id))
        .map(|hive| hive.id)
        .unwrap_or(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::agent::CombatStats;
    use crate::core::config::SimulationConfig;
    use crate::grid::hex::HexLayout;
    use crate::hive::colony::Hive;

    fn player(kind: AgentKind, q: i32, r: i32) -> Agent {
        let layout = HexLayout::default();
        let coord = HexCoord::new(q, r);
        let mut agent = Agent::new(kind, Faction::Player, coord).with_combat(CombatStats::new(10, 1, 1.0));
        agent.world_pos = layout.to_world(coord);
        agent
    }

    fn query_from(origin: HexCoord, vision: u32) -> TargetQuery {
        TargetQuery {
            origin,
            position: HexLayout::default().to_world(origin),
            vision_range: vision,
            leash: None,
        }
    }

    #[test]
    fn test_worker_preferred_over_hive_at_same_distance() {
        let mut agents = AgentRegistry::new(HexLayout::default());
        // Hive registered first so registration order cannot explain the result
        agents.register(player(AgentKind::Hive, 4, 0)).unwrap();
        let worker = agents.register(player(AgentKind::Worker, 0, 4)).unwrap();

        let target = find_target(&agents, &query_from(HexCoord::new(0, 0), 4));
        assert_eq!(target, Some(worker));
    }

    #[test]
    fn test_unit_beats_closer_hive() {
        let mut agents = AgentRegistry::new(HexLayout::default());
        agents.register(player(AgentKind::Hive, 1, 0)).unwrap();
        let worker = agents.register(player(AgentKind::Worker, 3, 0)).unwrap();

        let target = find_target(&agents, &query_from(HexCoord::new(0, 0), 4));
        assert_eq!(target, Some(worker));
    }

    #[test]
    fn test_tank_ranks_first() {
        let mut agents = AgentRegistry::new(HexLayout::default());
        agents.register(player(AgentKind::Worker, 1, 0)).unwrap();
        let guard = agents.register(player(AgentKind::Guard, 3, 0)).unwrap();

        let target = find_target(&agents, &query_from(HexCoord::new(0, 0), 4));
        assert_eq!(target, Some(guard));
    }

    #[test]
    fn test_nearest_within_tier() {
        let mut agents = AgentRegistry::new(HexLayout::default());
        agents.register(player(AgentKind::Worker, 3, 0)).unwrap();
        let near = agents.register(player(AgentKind::Worker, 0, 2)).unwrap();

        let target = find_target(&agents, &query_from(HexCoord::new(0, 0), 4));
        assert_eq!(target, Some(near));
    }

    #[test]
    fn test_filters() {
        let mut agents = AgentRegistry::new(HexLayout::default());
        let mut ghost = player(AgentKind::Worker, 1, 0);
        ghost.invincible = true;
        agents.register(ghost).unwrap();
        agents.register(player(AgentKind::Worker, 5, 0)).unwrap();
        agents
            .register(
                Agent::new(AgentKind::Wasp, Faction::Enemy, HexCoord::new(0, 1))
                    .with_combat(CombatStats::new(10, 1, 1.0)),
            )
            .unwrap();

        assert_eq!(find_target(&agents, &query_from(HexCoord::new(0, 0), 4)), None);
    }

    #[test]
    fn test_leash_clips_to_hive_radius() {
        let mut agents = AgentRegistry::new(HexLayout::default());
        let far = agents.register(player(AgentKind::Worker, 4, 0)).unwrap();

        let mut query = query_from(HexCoord::new(1, 0), 4);
        query.leash = Some(Leash {
            hive: HexCoord::new(0, 0),
            radius: 3,
        });
        assert_eq!(find_target(&agents, &query), None);

        query.leash = Some(Leash {
            hive: HexCoord::new(0, 0),
            radius: 4,
        });
        assert_eq!(find_target(&agents, &query), Some(far));
    }

    #[test]
    fn test_leash_always_allows_adjacent_to_hive() {
        let mut agents = AgentRegistry::new(HexLayout::default());
        let next_door = agents.register(player(AgentKind::Worker, 1, 0)).unwrap();

        let mut query = query_from(HexCoord::new(0, 0), 2);
        query.leash = Some(Leash {
            hive: HexCoord::new(0, 0),
            radius: 0,
        });
        assert_eq!(find_target(&agents, &query), Some(next_door));
    }

    #[test]
    fn test_sheltered_queen_redirects_to_hive() {
        let config = SimulationConfig::default();
        let mut agents = AgentRegistry::new(HexLayout::default());
        let mut hives = HiveRegistry::new();
        let hive = agents.register(player(AgentKind::Hive, 2, 0)).unwrap();
        hives.insert(Hive::player(hive, HexCoord::new(2, 0), &config)).unwrap();
        let queen = agents.register(player(AgentKind::Queen, 2, 0)).unwrap();

        assert_eq!(redirect_sheltered_queen(&agents, &hives, queen), hive);

        agents.set_position(queen, HexCoord::new(3, 0));
        assert_eq!(redirect_sheltered_queen(&agents, &hives, queen), queen);
    }
}
