//! Player fog of war
//!
//! Recomputed every tick from all live player agents. Tiles inside the
//! union of vision disks are Visible; tiles that drop out become Revealed
//! and never go back to Hidden. Structures seen even once stay discovered.

use ahash::AHashSet;
use rayon::prelude::*;

use crate::agents::agent::Agent;
use crate::agents::registry::AgentRegistry;
use crate::core::types::{AgentId, Faction};
use crate::grid::hex::HexCoord;
use crate::grid::tiles::{FogState, TileRegistry};

/// Visibility state for the player faction
#[derive(Debug, Clone, Default)]
pub struct VisibilityAggregator {
    /// Currently visible coordinates
    visible: AHashSet<HexCoord>,
    /// Structures that have ever been seen
    discovered: AHashSet<AgentId>,
}

impl VisibilityAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Is this coordinate currently visible?
    pub fn is_visible(&self, coord: HexCoord) -> bool {
        self.visible.contains(&coord)
    }

    /// Has this structure ever been seen?
    pub fn is_discovered(&self, structure: AgentId) -> bool {
        self.discovered.contains(&structure)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Whether an agent should be drawn: visible now, or a remembered structure
    pub fn is_render_eligible(&self, agent: &Agent) -> bool {
        if agent.faction == Faction::Player {
            return true;
        }
        self.is_visible(agent.coord()) || (agent.kind.is_structure() && self.is_discovered(agent.id))
    }

    /// Recompute visibility; returns structures discovered this call
    pub fn update(
        &mut self,
        tiles: &mut TileRegistry,
        agents: &AgentRegistry,
        parallel_threshold: usize,
    ) -> Vec<(AgentId, HexCoord)> {
        let new_visible = calculate_visible(agents, parallel_threshold);

        // Visible -> Revealed for everything that dropped out
        for coord in self.visible.difference(&new_visible) {
            tiles.set_fog(*coord, FogState::Revealed);
        }
        for coord in &new_visible {
            tiles.set_fog(*coord, FogState::Visible);
        }
        self.visible = new_visible;

        let mut newly_discovered = Vec::new();
        for agent in agents.iter() {
            if agent.kind.is_structure()
                && self.visible.contains(&agent.coord())
                && self.discovered.insert(agent.id)
            {
                newly_discovered.push((agent.id, agent.coord()));
            }
        }
        newly_discovered
    }
}

/// Union of vision disks of all live player agents
pub fn calculate_visible(agents: &AgentRegistry, parallel_threshold: usize) -> AHashSet<HexCoord> {
    let sources: Vec<(HexCoord, u32)> = agents
        .of_faction(Faction::Player)
        .filter(|a| a.is_alive())
        .map(|a| (a.coord(), a.vision_range))
        .collect();

    if sources.len() > parallel_threshold {
        // PARALLEL: disks are independent, merge is serial
        let disks: Vec<Vec<HexCoord>> = sources
            .par_iter()
            .map(|(center, range)| center.hexes_in_range(*range))
            .collect();
        disks.into_iter().flatten().collect()
    } else {
        sources
            .iter()
            .flat_map(|(center, range)| center.hexes_in_range(*range))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::agent::{AgentKind, CombatStats};
    use crate::grid::hex::HexLayout;
    use crate::grid::tiles::Terrain;

    fn scout(q: i32, r: i32, range: u32) -> Agent {
        Agent::new(AgentKind::Worker, Faction::Player, HexCoord::new(q, r)).with_vision(range)
    }

    #[test]
    fn test_visibility_near_unit() {
        let mut tiles = TileRegistry::hexagon(6, Terrain::Meadow);
        let mut agents = AgentRegistry::new(HexLayout::default());
        agents.register(scout(0, 0, 2)).unwrap();

        let mut vis = VisibilityAggregator::new();
        vis.update(&mut tiles, &agents, usize::MAX);

        assert!(vis.is_visible(HexCoord::new(0, 0)));
        assert!(vis.is_visible(HexCoord::new(2, -1)));
        assert!(!vis.is_visible(HexCoord::new(3, 0)));
        assert_eq!(vis.visible_count(), 19);
        assert_eq!(tiles.fog(HexCoord::new(1, 1)), FogState::Visible);
        assert_eq!(tiles.fog(HexCoord::new(4, 0)), FogState::Hidden);
    }

    #[test]
    fn test_revealed_never_returns_to_hidden() {
        let mut tiles = TileRegistry::hexagon(8, Terrain::Meadow);
        let mut agents = AgentRegistry::new(HexLayout::default());
        let id = agents.register(scout(-5, 0, 1)).unwrap();

        let mut vis = VisibilityAggregator::new();
        vis.update(&mut tiles, &agents, usize::MAX);
        assert_eq!(tiles.fog(HexCoord::new(-5, 0)), FogState::Visible);

        agents.set_position(id, HexCoord::new(5, 0));
        vis.update(&mut tiles, &agents, usize::MAX);
        assert_eq!(tiles.fog(HexCoord::new(-5, 0)), FogState::Revealed);
        assert_eq!(tiles.fog(HexCoord::new(5, 0)), FogState::Visible);

        agents.unregister(id);
        vis.update(&mut tiles, &agents, usize::MAX);
        assert_eq!(tiles.fog(HexCoord::new(5, 0)), FogState::Revealed);
        assert_eq!(tiles.fog(HexCoord::new(-5, 0)), FogState::Revealed);
    }

    #[test]
    fn test_enemy_agents_grant_no_vision() {
        let mut tiles = TileRegistry::hexagon(4, Terrain::Meadow);
        let mut agents = AgentRegistry::new(HexLayout::default());
        agents
            .register(Agent::new(AgentKind::Wasp, Faction::Enemy, HexCoord::new(0, 0)).with_vision(3))
            .unwrap();

        let mut vis = VisibilityAggregator::new();
        vis.update(&mut tiles, &agents, usize::MAX);
        assert_eq!(vis.visible_count(), 0);
    }

    #[test]
    fn test_dead_agents_grant_no_vision() {
        let mut agents = AgentRegistry::new(HexLayout::default());
        let mut dead = scout(0, 0, 2).with_combat(CombatStats::new(5, 1, 1.0));
        dead.combat.as_mut().unwrap().health = 0;
        agents.register(dead).unwrap();

        assert!(calculate_visible(&agents, usize::MAX).is_empty());
    }

    #[test]
    fn test_structure_discovery_is_permanent() {
        let mut tiles = TileRegistry::hexagon(8, Terrain::Meadow);
        let mut agents = AgentRegistry::new(HexLayout::default());
        let wasp_hive = agents
            .register(Agent::new(AgentKind::WaspHive, Faction::Enemy, HexCoord::new(4, 0)))
            .unwrap();
        let patrol = agents
            .register(Agent::new(AgentKind::Wasp, Faction::Enemy, HexCoord::new(4, -1)))
            .unwrap();
        let bee = agents.register(scout(2, 0, 2)).unwrap();

        let mut vis = VisibilityAggregator::new();
        let found = vis.update(&mut tiles, &agents, usize::MAX);
        assert_eq!(found, vec![(wasp_hive, HexCoord::new(4, 0))]);
        assert!(vis.is_discovered(wasp_hive));

        agents.set_position(bee, HexCoord::new(-6, 0));
        let found = vis.update(&mut tiles, &agents, usize::MAX);
        assert!(found.is_empty());

        assert_eq!(tiles.fog(HexCoord::new(4, 0)), FogState::Revealed);
        assert!(vis.is_discovered(wasp_hive));
        assert!(vis.is_render_eligible(agents.get(wasp_hive).unwrap()));
        // Mobile units are not remembered
        assert!(!vis.is_discovered(patrol));
        assert!(!vis.is_render_eligible(agents.get(patrol).unwrap()));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let mut agents = AgentRegistry::new(HexLayout::default());
        for q in -4..=4 {
            agents.register(scout(q, 0, 2)).unwrap();
        }
        let serial = calculate_visible(&agents, usize::MAX);
        let parallel = calculate_visible(&agents, 0);
        assert_eq!(serial, parallel);
    }
}
