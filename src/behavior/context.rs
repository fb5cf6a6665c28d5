//! What a behaviour task can see and touch while it is resumed
//!
//! The world builds one of these per agent per tick out of disjoint borrows
//! of its own fields, so tasks never reach for global state.

use rand_chacha::ChaCha8Rng;

use crate::agents::agent::Agent;
use crate::agents::registry::AgentRegistry;
use crate::core::config::SimulationConfig;
use crate::core::error::{HiveError, Result};
use crate::core::types::{AgentId, Faction, SimTime, Vec2};
use crate::grid::hex::{HexCoord, HexLayout};
use crate::grid::pathfinding::find_path;
use crate::grid::tiles::TileRegistry;
use crate::hive::activity::Authority;
use crate::hive::colony::{Hive, HiveRegistry};
use crate::hive::economy::Economy;
use crate::simulation::events::{EventLog, SimEventKind};
use crate::simulation::movement::{random_point_in_tile, MovementExecutor};

/// Copy of the fields a task reads about its own agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub id: AgentId,
    pub coord: HexCoord,
    pub position: Vec2,
    pub faction: Faction,
    pub home: Option<AgentId>,
    pub vision_range: u32,
}

impl Body {
    pub fn of(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            coord: agent.coord(),
            position: agent.world_pos,
            faction: agent.faction,
            home: agent.home_hive,
            vision_range: agent.vision_range,
        }
    }
}

pub struct TaskContext<'a> {
    pub id: AgentId,
    pub now: SimTime,
    pub dt: f32,
    pub config: &'a SimulationConfig,
    pub tiles: &'a mut TileRegistry,
    pub agents: &'a mut AgentRegistry,
    pub hives: &'a HiveRegistry,
    pub economy: &'a mut Economy,
    pub mover: &'a mut MovementExecutor,
    pub events: &'a mut EventLog,
    pub rng: &'a mut ChaCha8Rng,
}

impl<'a> TaskContext<'a> {
    pub fn body(&self) -> Option<Body> {
        self.agents.get(self.id).map(Body::of)
    }

    pub fn layout(&self) -> HexLayout {
        *self.agents.layout()
    }

    /// The agent's home hive, if it still exists
    pub fn home(&self, body: &Body) -> Option<&Hive> {
        body.home.and_then(|id| self.hives.get(id))
    }

    /// Home hive that is on the ground and can receive workers
    pub fn available_home(&self, body: &Body) -> Option<&Hive> {
        self.home(body).filter(|h| !h.is_relocating())
    }

    pub fn hive_radius(&self, hive: &Hive) -> u32 {
        hive.activity_radius(self.economy.radius_bonus(hive.faction))
    }

    /// Who authorises fights for this agent right now
    ///
    /// The home hive if there is one; otherwise a queen of the same faction
    /// standing within one tile.
    pub fn authority(&self, body: &Body) -> Option<Authority> {
        if let Some(hive) = self.hive_authority(body) {
            return Some(hive);
        }
        self.agents
            .queen_of(body.faction)
            .filter(|q| q.coord().distance(&body.coord) <= 1)
            .map(|q| Authority::Queen { coord: q.coord() })
    }

    /// The home hive's radius; the only leash on a fight already under way
    pub fn hive_authority(&self, body: &Body) -> Option<Authority> {
        self.home(body).map(|hive| Authority::Hive {
            coord: hive.coord,
            radius: self.hive_radius(hive),
        })
    }

    /// Commit a path to `destination`, or queue it if already travelling
    ///
    /// When already on the destination tile the agent just settles onto its
    /// center.
    pub fn travel_to(&mut self, destination: HexCoord) -> Result<()> {
        let body = self.body().ok_or_else(|| HiveError::agent_not_found(self.id))?;
        let from = body.coord;

        if from == destination {
            if self.mover.is_travelling() {
                self.mover.set_path(&[destination], from);
            } else {
                let center = self.layout().to_world(destination);
                self.mover.clear_path();
                if body.position.distance(&center) > f32::EPSILON {
                    self.mover.nudge(body.position, center);
                }
            }
            return Ok(());
        }

        let path = find_path(self.tiles, from, destination).ok_or(HiveError::Unreachable {
            from,
            to: destination,
        })?;
        self.mover.set_path(&path, from);
        Ok(())
    }

    /// Standing still on the center of `destination`
    pub fn arrived_at(&self, destination: HexCoord) -> bool {
        let Some(body) = self.body() else {
            return false;
        };
        body.coord == destination
            && !self.mover.is_travelling()
            && body.position.distance(&self.layout().to_world(destination))
                <= self.config.movement.arrival_epsilon
    }

    /// Random in-tile repositioning; ignored while travelling
    pub fn nudge_in_tile(&mut self) {
        let Some(body) = self.body() else {
            return;
        };
        let layout = self.layout();
        let target = random_point_in_tile(
            &layout,
            body.coord,
            self.config.movement.nudge_fraction,
            self.rng,
        );
        self.mover.nudge(body.position, target);
    }

    /// Record a failed path and fall back
    pub fn report_path_failure(&mut self, err: &HiveError) {
        if let HiveError::Unreachable { from, to } = *err {
            self.events.push(SimEventKind::PathFailed {
                agent: self.id,
                from,
                to,
            });
        }
    }
}
