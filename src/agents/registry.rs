//! Registry of all live agents
//!
//! Keeps agents by id, an insertion-ordered id list for deterministic
//! iteration, and a per-tile index so "who is within N tiles" never scans
//! the whole world.
//!
//! Callers that add or remove agents while walking the population iterate
//! over `ids()` or `snapshot()`, which are copies taken at call time.

use ahash::AHashMap;

use crate::agents::agent::{Agent, AgentKind};
use crate::core::error::{HiveError, Result};
use crate::core::types::{AgentId, Faction, Vec2};
use crate::grid::hex::{HexCoord, HexLayout};

#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: AHashMap<AgentId, Agent>,
    order: Vec<AgentId>,
    by_tile: AHashMap<HexCoord, Vec<AgentId>>,
    layout: HexLayout,
}

impl AgentRegistry {
    pub fn new(layout: HexLayout) -> Self {
        Self {
            agents: AHashMap::new(),
            order: Vec::new(),
            by_tile: AHashMap::new(),
            layout,
        }
    }

    pub fn layout(&self) -> &HexLayout {
        &self.layout
    }

    /// Add an agent. Registering the same id twice is refused.
    pub fn register(&mut self, agent: Agent) -> Result<AgentId> {
        let id = agent.id;
        if self.agents.contains_key(&id) {
            return Err(HiveError::InvariantViolation(format!(
                "agent {} registered twice",
                id
            )));
        }
        self.by_tile.entry(agent.coord).or_default().push(id);
        self.order.push(id);
        self.agents.insert(id, agent);
        Ok(id)
    }

    /// Remove an agent. Only the first call for an id returns it.
    pub fn unregister(&mut self, id: AgentId) -> Option<Agent> {
        let agent = self.agents.remove(&id)?;
        self.order.retain(|&other| other != id);
        self.unindex(id, agent.coord);
        Some(agent)
    }

    fn unindex(&mut self, id: AgentId, coord: HexCoord) {
        if let Some(cell) = self.by_tile.get_mut(&coord) {
            cell.retain(|&e| e != id);
            if cell.is_empty() {
                self.by_tile.remove(&coord);
            }
        }
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Teleport an agent: updates the tile index and snaps to the tile center
    pub fn set_position(&mut self, id: AgentId, coord: HexCoord) -> bool {
        let center = self.layout.to_world(coord);
        if !self.move_to_tile(id, coord) {
            return false;
        }
        if let Some(agent) = self.agents.get_mut(&id) {
            agent.world_pos = center;
        }
        true
    }

    /// Change an agent's tile without touching its world position
    pub(crate) fn move_to_tile(&mut self, id: AgentId, coord: HexCoord) -> bool {
        let Some(agent) = self.agents.get_mut(&id) else {
            return false;
        };
        let old = agent.coord;
        if old == coord {
            return true;
        }
        agent.coord = coord;
        self.unindex(id, old);
        self.by_tile.entry(coord).or_default().push(id);
        true
    }

    pub(crate) fn set_world_pos(&mut self, id: AgentId, pos: Vec2) {
        if let Some(agent) = self.agents.get_mut(&id) {
            agent.world_pos = pos;
        }
    }

    /// Copy of all live ids in registration order
    pub fn ids(&self) -> Vec<AgentId> {
        self.order.clone()
    }

    /// Copy of all live agents in registration order
    pub fn snapshot(&self) -> Vec<Agent> {
        self.iter().cloned().collect()
    }

    /// Live agents in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.order.iter().filter_map(move |id| self.agents.get(id))
    }

    pub fn of_faction(&self, faction: Faction) -> impl Iterator<Item = &Agent> + '_ {
        self.iter().filter(move |a| a.faction == faction)
    }

    /// Agents standing on a tile
    pub fn at(&self, coord: HexCoord) -> impl Iterator<Item = &Agent> + '_ {
        self.by_tile
            .get(&coord)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.agents.get(id))
    }

    /// Agents within `radius` tiles of `center`, using the tile index
    pub fn within(&self, center: HexCoord, radius: u32) -> Vec<&Agent> {
        // Small radii: walk the disk. Large radii: walking occupied tiles is cheaper.
        let r = radius as usize;
        let disk_size = r
            .saturating_mul(r.saturating_add(1))
            .saturating_mul(3)
            .saturating_add(1);
        if disk_size <= self.by_tile.len() {
            center
                .hexes_in_range(radius)
                .into_iter()
                .flat_map(|coord| self.at(coord).collect::<Vec<_>>())
                .collect()
        } else {
            self.iter()
                .filter(|a| a.coord.distance(&center) <= radius)
                .collect()
        }
    }

    /// First live queen of a faction
    pub fn queen_of(&self, faction: Faction) -> Option<&Agent> {
        self.of_faction(faction)
            .find(|a| a.kind == AgentKind::Queen && a.is_alive())
    }

    pub fn count_kind(&self, faction: Faction, kind: AgentKind) -> usize {
        self.of_faction(faction).filter(|a| a.kind == kind).count()
    }
}
