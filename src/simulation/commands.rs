//! Command injection from the UI
//!
//! Every entry point validates before touching state. A refused command
//! leaves the world exactly as it was, logs one line and records a
//! `CommandRejected` event; the returned error is informational.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agents::agent::AgentKind;
use crate::core::error::{HiveError, Result};
use crate::core::types::{AgentId, Vec2};
use crate::grid::hex::HexCoord;
use crate::grid::pathfinding::find_path;
use crate::hive::activity::in_range;
use crate::simulation::world::World;

/// What the player clicked on; used once and dropped
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CommandTarget {
    None,
    Tile(HexCoord),
    Unit(AgentId),
    Position(Vec2),
}

impl World {
    /// Route a UI command to the matching entry point
    pub fn dispatch_command(&mut self, agent: AgentId, target: CommandTarget) -> Result<()> {
        match target {
            CommandTarget::None => self.cancel_current_task(agent),
            CommandTarget::Tile(tile) => self.issue_command_to_tile(agent, tile),
            CommandTarget::Position(pos) => {
                let tile = self.layout.from_world(pos);
                self.issue_command_to_tile(agent, tile)
            }
            CommandTarget::Unit(other) => {
                let (Some(actor), Some(unit)) = (self.agents.get(agent), self.agents.get(other)) else {
                    let missing = if self.agents.contains(agent) { other } else { agent };
                    return self.reject(agent, HiveError::agent_not_found(missing));
                };
                if unit.is_hostile_to(actor) {
                    self.issue_attack_command(agent, other)
                } else if unit.kind == AgentKind::Queen && actor.kind != AgentKind::Queen {
                    self.issue_follow_queen(agent)
                } else {
                    let tile = unit.coord();
                    self.issue_command_to_tile(agent, tile)
                }
            }
        }
    }

    /// Order an agent onto a tile
    ///
    /// Workers must stay inside their home hive's activity radius; queens
    /// simply walk there.
    pub fn issue_command_to_tile(&mut self, agent: AgentId, tile: HexCoord) -> Result<()> {
        let Some(actor) = self.agents.get(agent) else {
            return self.reject(agent, HiveError::agent_not_found(agent));
        };
        if !self.tiles.contains(tile) {
            return self.reject(agent, HiveError::tile_not_found(tile));
        }
        let (kind, from, home) = (actor.kind, actor.coord(), actor.home_hive);

        if kind == AgentKind::Queen {
            return self.move_queen(agent, from, tile);
        }
        if !self.workers.contains_key(&agent) {
            return self.reject(
                agent,
                HiveError::Rejected(format!("{:?} does not take orders", kind)),
            );
        }

        if let Some(hive) = home.and_then(|id| self.hives.get(id)) {
            let radius = hive.activity_radius(self.economy.radius_bonus(hive.faction));
            if !in_range(hive.coord, tile, radius) {
                let hive_coord = hive.coord;
                return self.reject(
                    agent,
                    HiveError::Rejected(format!(
                        "tile ({}, {}) is outside the activity radius {} of hive at ({}, {})",
                        tile.q, tile.r, radius, hive_coord.q, hive_coord.r
                    )),
                );
            }
        }

        debug!(agent = %agent, q = tile.q, r = tile.r, "tile command");
        self.with_worker(agent, 0.0, |brain, ctx| brain.command_tile(ctx, tile));
        Ok(())
    }

    fn move_queen(&mut self, queen: AgentId, from: HexCoord, tile: HexCoord) -> Result<()> {
        let Some(path) = find_path(&self.tiles, from, tile) else {
            return self.reject(queen, HiveError::Unreachable { from, to: tile });
        };
        let Some(mover) = self.movers.get_mut(&queen) else {
            return self.reject(queen, HiveError::agent_not_found(queen));
        };
        mover.set_path(&path, from);
        debug!(agent = %queen, q = tile.q, r = tile.r, "queen moving");
        Ok(())
    }

    /// Order a worker to fight a specific hostile agent
    pub fn issue_attack_command(&mut self, agent: AgentId, target: AgentId) -> Result<()> {
        let Some(actor) = self.agents.get(agent) else {
            return self.reject(agent, HiveError::agent_not_found(agent));
        };
        let Some(victim) = self.agents.get(target) else {
            return self.reject(agent, HiveError::agent_not_found(target));
        };
        let (kind, valid) = (actor.kind, victim.is_valid_target_for(actor));
        let target_coord = victim.coord();
        let home = actor.home_hive;
        if !self.workers.contains_key(&agent) {
            return self.reject(
                agent,
                HiveError::Rejected(format!("{:?} does not take attack orders", kind)),
            );
        }
        if agent == target || !valid {
            return self.reject(
                agent,
                HiveError::Rejected(format!("{} is not a valid target", target)),
            );
        }

        if let Some(hive) = home.and_then(|id| self.hives.get(id)) {
            let radius = hive.activity_radius(self.economy.radius_bonus(hive.faction));
            if !in_range(hive.coord, target_coord, radius) {
                return self.reject(
                    agent,
                    HiveError::Rejected(format!(
                        "target at ({}, {}) is outside the activity radius {}",
                        target_coord.q, target_coord.r, radius
                    )),
                );
            }
        }

        debug!(agent = %agent, target = %target, "attack command");
        self.with_worker(agent, 0.0, |brain, ctx| brain.command_attack(ctx, target));
        Ok(())
    }

    /// Order a worker to trail its faction's queen
    pub fn issue_follow_queen(&mut self, agent: AgentId) -> Result<()> {
        let Some(actor) = self.agents.get(agent) else {
            return self.reject(agent, HiveError::agent_not_found(agent));
        };
        let (kind, faction) = (actor.kind, actor.faction);
        if !self.workers.contains_key(&agent) {
            return self.reject(
                agent,
                HiveError::Rejected(format!("{:?} cannot follow the queen", kind)),
            );
        }
        if self.agents.queen_of(faction).is_none() {
            return self.reject(agent, HiveError::NotFound(format!("{:?} queen", faction)));
        }

        self.with_worker(agent, 0.0, |brain, ctx| brain.command_follow_queen(ctx));
        Ok(())
    }

    /// Drop the current task; workers go Idle, queens stop walking
    pub fn cancel_current_task(&mut self, agent: AgentId) -> Result<()> {
        if !self.agents.contains(agent) {
            return self.reject(agent, HiveError::agent_not_found(agent));
        }
        if self.workers.contains_key(&agent) {
            self.with_worker(agent, 0.0, |brain, ctx| brain.cancel(ctx));
        } else if let Some(mover) = self.movers.get_mut(&agent) {
            mover.clear_path();
        }
        Ok(())
    }

    fn reject(&mut self, agent: AgentId, err: HiveError) -> Result<()> {
        self.note_rejection(agent, &err);
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::worker::WorkerState;
    use crate::core::config::SimulationConfig;
    use crate::core::types::Faction;
    use crate::simulation::events::SimEventKind;

    fn world_with_hive() -> (World, AgentId) {
        let mut world = World::new(SimulationConfig::default(), 5).unwrap();
        let hive = world.found_hive(Faction::Player, HexCoord::new(0, 0)).unwrap();
        (world, hive)
    }

    #[test]
    fn test_out_of_radius_rejected_without_side_effects() {
        let (mut world, _) = world_with_hive();
        let worker = world
            .spawn_agent(AgentKind::Worker, Faction::Player, HexCoord::new(1, 0))
            .unwrap();
        world.drain_events();
        let before = world.agents().get(worker).unwrap().clone();

        let result = world.issue_command_to_tile(worker, HexCoord::new(6, 0));
        assert!(matches!(result, Err(HiveError::Rejected(_))));
        assert!(world.worker_state(worker).unwrap().is_idle());
        assert!(!world.is_moving(worker));
        assert_eq!(world.agents().get(worker).unwrap().coord(), before.coord());

        let events = world.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].kind, SimEventKind::CommandRejected { .. }));
    }

    #[test]
    fn test_missing_agent_or_tile_ignored() {
        let (mut world, _) = world_with_hive();
        let worker = world
            .spawn_agent(AgentKind::Worker, Faction::Player, HexCoord::new(1, 0))
            .unwrap();
        assert!(matches!(
            world.issue_command_to_tile(AgentId::new(), HexCoord::new(1, 1)),
            Err(HiveError::NotFound(_))
        ));
        assert!(matches!(
            world.issue_command_to_tile(worker, HexCoord::new(99, 0)),
            Err(HiveError::NotFound(_))
        ));
    }

    #[test]
    fn test_tile_command_starts_moving() {
        let (mut world, _) = world_with_hive();
        let worker = world
            .spawn_agent(AgentKind::Worker, Faction::Player, HexCoord::new(1, 0))
            .unwrap();
        world.issue_command_to_tile(worker, HexCoord::new(3, 0)).unwrap();
        assert!(matches!(
            world.worker_state(worker),
            Some(WorkerState::Moving { destination, .. }) if *destination == HexCoord::new(3, 0)
        ));
        assert!(world.is_moving(worker));
    }

    #[test]
    fn test_position_dispatch_uses_layout() {
        let (mut world, _) = world_with_hive();
        let worker = world
            .spawn_agent(AgentKind::Worker, Faction::Player, HexCoord::new(1, 0))
            .unwrap();
        let pos = world.layout().to_world(HexCoord::new(2, -1));
        world
            .dispatch_command(worker, CommandTarget::Position(pos))
            .unwrap();
        assert!(matches!(
            world.worker_state(worker),
            Some(WorkerState::Moving { destination, .. }) if *destination == HexCoord::new(2, -1)
        ));
    }

    #[test]
    fn test_attack_on_friendly_rejected() {
        let (mut world, _) = world_with_hive();
        let a = world
            .spawn_agent(AgentKind::Worker, Faction::Player, HexCoord::new(1, 0))
            .unwrap();
        let b = world
            .spawn_agent(AgentKind::Worker, Faction::Player, HexCoord::new(2, 0))
            .unwrap();
        assert!(matches!(
            world.issue_attack_command(a, b),
            Err(HiveError::Rejected(_))
        ));
    }

    #[test]
    fn test_unit_dispatch_attacks_hostiles() {
        let (mut world, _) = world_with_hive();
        let worker = world
            .spawn_agent(AgentKind::Worker, Faction::Player, HexCoord::new(1, 0))
            .unwrap();
        let wasp = world
            .spawn_agent(AgentKind::Wasp, Faction::Enemy, HexCoord::new(3, 0))
            .unwrap();
        world.dispatch_command(worker, CommandTarget::Unit(wasp)).unwrap();
        assert!(matches!(
            world.worker_state(worker),
            Some(WorkerState::Attacking { target, .. }) if *target == wasp
        ));
    }

    #[test]
    fn test_unit_dispatch_follows_queen() {
        let (mut world, _) = world_with_hive();
        let worker = world
            .spawn_agent(AgentKind::Worker, Faction::Player, HexCoord::new(1, 0))
            .unwrap();
        let queen = world.spawn_queen(Faction::Player, HexCoord::new(0, 2)).unwrap();
        world.dispatch_command(worker, CommandTarget::Unit(queen)).unwrap();
        assert!(matches!(
            world.worker_state(worker),
            Some(WorkerState::FollowingQueen { .. })
        ));
    }

    #[test]
    fn test_follow_without_queen_rejected() {
        let (mut world, _) = world_with_hive();
        let worker = world
            .spawn_agent(AgentKind::Worker, Faction::Player, HexCoord::new(1, 0))
            .unwrap();
        assert!(matches!(
            world.issue_follow_queen(worker),
            Err(HiveError::NotFound(_))
        ));
        assert!(world.worker_state(worker).unwrap().is_idle());
    }

    #[test]
    fn test_cancel_stops_worker_and_queen() {
        let (mut world, _) = world_with_hive();
        let worker = world
            .spawn_agent(AgentKind::Worker, Faction::Player, HexCoord::new(1, 0))
            .unwrap();
        let queen = world.spawn_queen(Faction::Player, HexCoord::new(0, 1)).unwrap();

        world.issue_command_to_tile(worker, HexCoord::new(3, 0)).unwrap();
        world.issue_command_to_tile(queen, HexCoord::new(-3, 0)).unwrap();
        assert!(world.is_moving(queen));

        world.dispatch_command(worker, CommandTarget::None).unwrap();
        world.cancel_current_task(queen).unwrap();
        assert!(world.worker_state(worker).unwrap().is_idle());
        assert!(!world.is_moving(queen));
    }

    #[test]
    fn test_structures_take_no_orders() {
        let (mut world, hive) = world_with_hive();
        assert!(matches!(
            world.issue_command_to_tile(hive, HexCoord::new(1, 0)),
            Err(HiveError::Rejected(_))
        ));
    }
}
