//! World state and the tick driver
//!
//! The world owns every registry and service and hands out disjoint
//! borrows of them to the per-agent tasks. One `tick(dt)` runs, in order:
//! clock, visibility, hive tasks (casting and spawning), wave spawners,
//! worker tasks, enemy tasks, movement integration, death processing.

use ahash::AHashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::agents::agent::{Agent, AgentKind};
use crate::agents::registry::AgentRegistry;
use crate::ai::enemy::EnemyBrain;
use crate::ai::wave::WaveSpawner;
use crate::behavior::context::TaskContext;
use crate::behavior::worker::{WorkerBrain, WorkerState};
use crate::core::config::SimulationConfig;
use crate::core::error::{HiveError, Result};
use crate::core::types::{AgentId, Faction, SimClock};
use crate::grid::hex::{HexCoord, HexLayout};
use crate::grid::tiles::{Terrain, Tile, TileRegistry};
use crate::hive::colony::{CastGoal, CastProgress, Hive, HiveRegistry, RelocationState};
use crate::hive::economy::Economy;
use crate::simulation::events::{EventLog, SimEvent, SimEventKind};
use crate::simulation::movement::MovementExecutor;
use crate::simulation::visibility::VisibilityAggregator;

/// The whole simulation
pub struct World {
    pub(crate) config: SimulationConfig,
    pub(crate) layout: HexLayout,
    pub(crate) tiles: TileRegistry,
    pub(crate) agents: AgentRegistry,
    pub(crate) visibility: VisibilityAggregator,
    pub(crate) hives: HiveRegistry,
    pub(crate) economy: Economy,
    pub(crate) movers: AHashMap<AgentId, MovementExecutor>,
    pub(crate) workers: AHashMap<AgentId, WorkerBrain>,
    pub(crate) enemies: AHashMap<AgentId, EnemyBrain>,
    pub(crate) waves: Vec<WaveSpawner>,
    pub(crate) events: EventLog,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) clock: SimClock,
}

impl World {
    /// Empty hexagonal meadow of `grid.map_radius` with the player's
    /// starting stockpile
    pub fn new(config: SimulationConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let layout = HexLayout::new(config.grid.hex_size);
        let tiles = TileRegistry::hexagon(config.grid.map_radius, Terrain::Meadow);
        let mut economy = Economy::new();
        economy.add_resources(Faction::Player, config.hive.starting_resources);
        economy.take_dirty();

        info!(seed, radius = config.grid.map_radius, "world created");
        Ok(Self {
            layout,
            tiles,
            agents: AgentRegistry::new(layout),
            visibility: VisibilityAggregator::new(),
            hives: HiveRegistry::new(),
            economy,
            movers: AHashMap::new(),
            workers: AHashMap::new(),
            enemies: AHashMap::new(),
            waves: Vec::new(),
            events: EventLog::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            clock: SimClock::new(),
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn layout(&self) -> &HexLayout {
        &self.layout
    }

    pub fn clock(&self) -> SimClock {
        self.clock
    }

    pub fn tiles(&self) -> &TileRegistry {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut TileRegistry {
        &mut self.tiles
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    pub fn hives(&self) -> &HiveRegistry {
        &self.hives
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    /// Stockpile dirty flag, cleared on read
    pub fn take_economy_dirty(&mut self) -> bool {
        self.economy.take_dirty()
    }

    pub fn visibility(&self) -> &VisibilityAggregator {
        &self.visibility
    }

    pub fn worker_state(&self, id: AgentId) -> Option<&WorkerState> {
        self.workers.get(&id).map(|b| b.state())
    }

    pub fn carrying(&self, id: AgentId) -> Option<u32> {
        self.workers.get(&id).map(|b| b.carrying())
    }

    pub fn enemy_brain(&self, id: AgentId) -> Option<&EnemyBrain> {
        self.enemies.get(&id)
    }

    pub fn is_moving(&self, id: AgentId) -> bool {
        self.movers.get(&id).map(|m| m.is_moving()).unwrap_or(false)
    }

    pub fn waves(&self) -> &[WaveSpawner] {
        &self.waves
    }

    /// Take every event recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    // ------------------------------------------------------------------
    // Read-only queries
    // ------------------------------------------------------------------

    /// Copy of all live agents in registration order
    pub fn get_all_units(&self) -> Vec<Agent> {
        self.agents.snapshot()
    }

    pub fn get_tile(&self, q: i32, r: i32) -> Option<&Tile> {
        self.tiles.get(HexCoord::new(q, r))
    }

    pub fn get_neighbors(&self, q: i32, r: i32) -> Vec<&Tile> {
        self.tiles.neighbors(HexCoord::new(q, r))
    }

    // ------------------------------------------------------------------
    // Economy
    // ------------------------------------------------------------------

    pub fn add_resources(&mut self, faction: Faction, amount: u32) {
        self.economy.add_resources(faction, amount);
    }

    pub fn try_spend_resources(&mut self, faction: Faction, amount: u32) -> bool {
        self.economy.try_spend_resources(faction, amount)
    }

    pub fn has_resources(&self, faction: Faction, amount: u32) -> bool {
        self.economy.has_resources(faction, amount)
    }

    pub fn upgrade_gather_speed(&mut self, faction: Faction) -> Result<()> {
        if self.economy.upgrade_gather_speed(faction, &self.config.hive) {
            return Ok(());
        }
        Err(HiveError::Rejected(format!(
            "{:?} cannot afford gather speed upgrade ({})",
            faction, self.config.hive.gather_tech_cost
        )))
    }

    pub fn upgrade_activity_radius(&mut self, faction: Faction) -> Result<()> {
        if self.economy.upgrade_activity_radius(faction, &self.config.hive) {
            return Ok(());
        }
        Err(HiveError::Rejected(format!(
            "{:?} cannot buy another activity radius level",
            faction
        )))
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    fn speed_for(&self, kind: AgentKind) -> Option<f32> {
        let m = &self.config.movement;
        match kind {
            AgentKind::Worker | AgentKind::Guard => Some(m.worker_speed),
            AgentKind::Queen => Some(m.queen_speed),
            AgentKind::Wasp => Some(m.wasp_speed),
            AgentKind::Hive | AgentKind::WaspHive => None,
        }
    }

    /// Add an agent built elsewhere, wiring up its movement and behaviour
    ///
    /// Wasps registered this way become wave raiders; use `spawn_wasp_guard`
    /// for hive-bound ones.
    pub fn register_unit(&mut self, agent: Agent) -> Result<AgentId> {
        if !self.tiles.contains(agent.coord()) {
            return Err(HiveError::tile_not_found(agent.coord()));
        }
        let kind = agent.kind;
        let faction = agent.faction;
        let at = agent.coord();
        let id = self.agents.register(agent)?;

        if let Some(speed) = self.speed_for(kind) {
            self.movers.insert(id, MovementExecutor::new(speed));
        }
        match kind {
            AgentKind::Worker | AgentKind::Guard => {
                self.workers.insert(id, WorkerBrain::new());
            }
            AgentKind::Wasp => {
                self.enemies.insert(id, EnemyBrain::wave());
            }
            _ => {}
        }

        self.events.push(SimEventKind::Spawned {
            agent: id,
            kind,
            faction,
            at,
        });
        debug!(agent = %id, ?kind, q = at.q, r = at.r, "registered");
        Ok(id)
    }

    /// Remove an agent and everything attached to it
    ///
    /// Returns None when the agent was already gone.
    pub fn unregister_unit(&mut self, id: AgentId) -> Option<Agent> {
        self.despawn(id)
    }

    /// Teleport an agent to a registered tile, dropping any movement
    pub fn set_position(&mut self, id: AgentId, q: i32, r: i32) -> Result<()> {
        let coord = HexCoord::new(q, r);
        if !self.tiles.contains(coord) {
            return Err(HiveError::tile_not_found(coord));
        }
        if !self.agents.set_position(id, coord) {
            return Err(HiveError::agent_not_found(id));
        }
        if let Some(mover) = self.movers.get_mut(&id) {
            mover.clear_path();
        }
        Ok(())
    }

    /// New agent with config stats on a registered tile
    pub fn spawn_agent(&mut self, kind: AgentKind, faction: Faction, coord: HexCoord) -> Result<AgentId> {
        let mut agent = Agent::spawn(kind, faction, coord, &self.config, &self.layout);
        if matches!(kind, AgentKind::Worker | AgentKind::Guard) {
            agent.home_hive = self.hives.for_faction(faction).map(|h| h.id);
        }
        let id = self.register_unit(agent)?;
        if kind == AgentKind::Worker {
            self.adopt(id, faction);
        }
        Ok(id)
    }

    /// Give a worker to its faction's hive if there is room
    fn adopt(&mut self, worker: AgentId, faction: Faction) {
        let Some(hive_id) = self.hives.for_faction(faction).map(|h| h.id) else {
            return;
        };
        let adopted = self
            .hives
            .get_mut(hive_id)
            .map(|h| h.add_worker(worker))
            .unwrap_or(false);
        if let Some(agent) = self.agents.get_mut(worker) {
            agent.home_hive = adopted.then_some(hive_id);
        }
    }

    pub fn spawn_queen(&mut self, faction: Faction, coord: HexCoord) -> Result<AgentId> {
        self.spawn_agent(AgentKind::Queen, faction, coord)
    }

    /// Wasp bound to a wasp hive
    pub fn spawn_wasp_guard(&mut self, hive: AgentId, coord: HexCoord) -> Result<AgentId> {
        let id = self.spawn_agent(AgentKind::Wasp, Faction::Enemy, coord)?;
        self.enemies.insert(id, EnemyBrain::home_guard(hive));
        if let Some(agent) = self.agents.get_mut(id) {
            agent.home_hive = Some(hive);
        }
        Ok(id)
    }

    /// Place a hive for free; used for map setup
    pub fn found_hive(&mut self, faction: Faction, coord: HexCoord) -> Result<AgentId> {
        if self.hives.for_faction(faction).is_some() {
            return Err(HiveError::Rejected(format!("{:?} already owns a hive", faction)));
        }
        let kind = match faction {
            Faction::Enemy => AgentKind::WaspHive,
            _ => AgentKind::Hive,
        };
        let id = self.spawn_agent(kind, faction, coord)?;
        let hive = match faction {
            Faction::Enemy => Hive::wasp(id, coord, &self.config),
            _ => Hive::player(id, coord, &self.config),
        };
        if let Err(err) = self.hives.insert(hive) {
            self.despawn(id);
            return Err(err);
        }

        // Homeless workers move in
        for worker in self.agents.ids() {
            let homeless = self
                .agents
                .get(worker)
                .map(|a| a.kind == AgentKind::Worker && a.faction == faction && a.home_hive.is_none())
                .unwrap_or(false);
            if homeless {
                self.adopt(worker, faction);
            }
        }
        for guard in self.agents.ids() {
            let is_guard = self
                .agents
                .get(guard)
                .map(|a| a.kind == AgentKind::Guard && a.faction == faction)
                .unwrap_or(false);
            if is_guard {
                if let Some(agent) = self.agents.get_mut(guard) {
                    agent.home_hive = Some(id);
                }
            }
        }
        info!(hive = %id, ?faction, q = coord.q, r = coord.r, "hive founded");
        Ok(id)
    }

    /// A queen builds her faction's hive where she stands
    pub fn build_hive(&mut self, queen: AgentId) -> Result<AgentId> {
        let result = self.try_build_hive(queen);
        if let Err(err) = &result {
            self.note_rejection(queen, err);
        }
        result
    }

    fn try_build_hive(&mut self, queen: AgentId) -> Result<AgentId> {
        let (faction, coord) = self
            .agents
            .get(queen)
            .filter(|a| a.kind.is_queen())
            .map(|a| (a.faction, a.coord()))
            .ok_or_else(|| HiveError::agent_not_found(queen))?;
        if self.hives.for_faction(faction).is_some() {
            return Err(HiveError::Rejected(format!("{:?} already owns a hive", faction)));
        }
        let cost = self.config.hive.build_cost;
        if !self.economy.try_spend_resources(faction, cost) {
            return Err(HiveError::Rejected(format!("building a hive costs {}", cost)));
        }
        self.found_hive(faction, coord)
    }

    /// Start lifting or landing the queen's hive, or build one if she has none
    pub fn begin_hive_cast(&mut self, queen: AgentId) -> Result<()> {
        let result = self.try_begin_cast(queen);
        if let Err(err) = &result {
            self.note_rejection(queen, err);
        }
        result
    }

    fn try_begin_cast(&mut self, queen: AgentId) -> Result<()> {
        let (faction, anchor) = self
            .agents
            .get(queen)
            .filter(|a| a.kind.is_queen())
            .map(|a| (a.faction, a.coord()))
            .ok_or_else(|| HiveError::agent_not_found(queen))?;

        let Some(hive_id) = self.hives.for_faction(faction).map(|h| h.id) else {
            return self.try_build_hive(queen).map(|_| ());
        };
        let hive = self
            .hives
            .get_mut(hive_id)
            .ok_or_else(|| HiveError::agent_not_found(hive_id))?;

        // A grounded hive is lifted from where it stands
        if !hive.is_floating() && hive.coord != anchor {
            return Err(HiveError::Rejected(
                "the queen must stand on her hive to lift it".into(),
            ));
        }
        let goal = hive.begin_cast(queen, anchor)?;
        if let Some(mover) = self.movers.get_mut(&queen) {
            mover.clear_path();
        }
        self.events.push(SimEventKind::CastStarted { hive: hive_id, goal });
        info!(hive = %hive_id, ?goal, "hive cast started");
        Ok(())
    }

    /// Log, record and hand back a refused command
    pub(crate) fn note_rejection(&mut self, agent: AgentId, err: &HiveError) {
        match err {
            HiveError::NotFound(_) => debug!(agent = %agent, error = %err, "command ignored"),
            _ => warn!(agent = %agent, error = %err, "command rejected"),
        }
        self.events.push(SimEventKind::CommandRejected {
            agent,
            reason: err.to_string(),
        });
    }

    /// Remove an agent exactly once, cleaning up everything that refers to it
    fn despawn(&mut self, id: AgentId) -> Option<Agent> {
        let agent = self.agents.unregister(id)?;
        self.movers.remove(&id);
        self.workers.remove(&id);
        self.enemies.remove(&id);

        if let Some(home) = agent.home_hive {
            if let Some(hive) = self.hives.get_mut(home) {
                hive.remove_worker(id);
            }
        }

        if let Some(hive) = self.hives.remove(id) {
            for worker in hive.workers() {
                if let Some(w) = self.agents.get_mut(*worker) {
                    w.home_hive = None;
                }
            }
            for other in self.agents.ids() {
                let homed_here = self
                    .agents
                    .get(other)
                    .map(|a| a.home_hive == Some(id))
                    .unwrap_or(false);
                if homed_here {
                    if let Some(a) = self.agents.get_mut(other) {
                        a.home_hive = None;
                    }
                    if let Some(brain) = self.enemies.get_mut(&other) {
                        brain.release();
                    }
                }
            }
            let carrier = self
                .agents
                .iter()
                .find(|a| a.carried_building == Some(id))
                .map(|a| a.id);
            if let Some(carrier) = carrier {
                if let Some(queen) = self.agents.get_mut(carrier) {
                    queen.carried_building = None;
                }
            }
            self.events.push(SimEventKind::HiveDestroyed {
                hive: id,
                faction: hive.faction,
            });
            info!(hive = %id, faction = ?hive.faction, "hive destroyed");
        }

        // A queen carrying a hive drops it where she fell
        if let Some(carried) = agent.carried_building {
            if let Some(hive) = self.hives.get_mut(carried) {
                hive.relocation = RelocationState::Landed;
                hive.coord = agent.coord();
            }
            if let Some(building) = self.agents.get_mut(carried) {
                building.invincible = false;
            }
            self.agents.set_position(carried, agent.coord());
        }

        self.events.push(SimEventKind::Despawned {
            agent: id,
            kind: agent.kind,
        });
        debug!(agent = %id, kind = ?agent.kind, "despawned");
        Some(agent)
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Run a worker task with a context built from the world's fields
    pub(crate) fn with_worker<T>(
        &mut self,
        id: AgentId,
        dt: f32,
        f: impl FnOnce(&mut WorkerBrain, &mut TaskContext) -> T,
    ) -> Option<T> {
        let brain = self.workers.get_mut(&id)?;
        let mover = self.movers.get_mut(&id)?;
        let mut ctx = TaskContext {
            id,
            now: self.clock.elapsed,
            dt,
            config: &self.config,
            tiles: &mut self.tiles,
            agents: &mut self.agents,
            hives: &self.hives,
            economy: &mut self.economy,
            mover,
            events: &mut self.events,
            rng: &mut self.rng,
        };
        Some(f(brain, &mut ctx))
    }

    fn with_enemy(&mut self, id: AgentId, dt: f32) {
        let (Some(brain), Some(mover)) = (self.enemies.get_mut(&id), self.movers.get_mut(&id)) else {
            return;
        };
        let mut ctx = TaskContext {
            id,
            now: self.clock.elapsed,
            dt,
            config: &self.config,
            tiles: &mut self.tiles,
            agents: &mut self.agents,
            hives: &self.hives,
            economy: &mut self.economy,
            mover,
            events: &mut self.events,
            rng: &mut self.rng,
        };
        brain.resume(&mut ctx);
    }

    fn is_alive(&self, id: AgentId) -> bool {
        self.agents.get(id).map(|a| a.is_alive()).unwrap_or(false)
    }

    /// Advance the simulation by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.clock.advance(dt);
        self.events.set_clock(self.clock.tick, self.clock.elapsed);

        self.update_visibility();
        self.update_hives(dt);
        self.update_waves(dt);

        for id in self.agents.ids() {
            if self.workers.contains_key(&id) && self.is_alive(id) {
                self.with_worker(id, dt, |brain, ctx| brain.resume(ctx));
            }
        }
        for id in self.agents.ids() {
            if self.enemies.contains_key(&id) && self.is_alive(id) {
                self.with_enemy(id, dt);
            }
        }

        self.integrate_movement(dt);
        self.process_deaths();
    }

    fn update_visibility(&mut self) {
        let discovered = self.visibility.update(
            &mut self.tiles,
            &self.agents,
            self.config.visibility.parallel_threshold,
        );
        for (agent, at) in discovered {
            info!(structure = %agent, q = at.q, r = at.r, "structure discovered");
            self.events.push(SimEventKind::StructureDiscovered { agent, at });
        }
    }

    fn update_hives(&mut self, dt: f32) {
        for hive_id in self.hives.ids() {
            self.update_cast(hive_id, dt);
            self.update_spawn(hive_id, dt);
        }
    }

    fn update_cast(&mut self, hive_id: AgentId, dt: f32) {
        let queen = self.hives.get(hive_id).and_then(|h| h.casting_queen());
        let queen_coord = queen.and_then(|q| self.agents.get(q)).map(|q| q.coord());
        let cast_duration = self.config.hive.cast_duration;
        let Some(hive) = self.hives.get_mut(hive_id) else {
            return;
        };

        match hive.tick_cast(dt, queen_coord, cast_duration) {
            CastProgress::NotCasting | CastProgress::InProgress => {}
            CastProgress::Cancelled(goal) => {
                info!(hive = %hive_id, ?goal, "hive cast cancelled");
                self.events.push(SimEventKind::CastCancelled { hive: hive_id, goal });
            }
            CastProgress::Completed(goal) => {
                let at = hive.coord;
                if let Some(q) = queen {
                    if let Some(queen) = self.agents.get_mut(q) {
                        queen.carried_building = match goal {
                            CastGoal::Lift => Some(hive_id),
                            CastGoal::Land => None,
                        };
                    }
                }
                if let Some(building) = self.agents.get_mut(hive_id) {
                    building.invincible = goal == CastGoal::Lift;
                }
                self.agents.set_position(hive_id, at);
                info!(hive = %hive_id, ?goal, q = at.q, r = at.r, "hive cast completed");
                self.events.push(SimEventKind::CastCompleted { hive: hive_id, goal, at });
            }
        }
    }

    fn update_spawn(&mut self, hive_id: AgentId, dt: f32) {
        let Some(hive) = self.hives.get_mut(hive_id) else {
            return;
        };
        if !hive.tick_spawn(dt) {
            return;
        }
        let (faction, coord, kind, cost) = (hive.faction, hive.coord, hive.spawn_kind, hive.spawn_cost);

        // Stays due until it can be paid for
        if !self.economy.try_spend_resources(faction, cost) {
            return;
        }
        if let Some(hive) = self.hives.get_mut(hive_id) {
            hive.mark_spawned();
        }

        let spawned = match kind {
            AgentKind::Wasp => self.spawn_guard_for(hive_id, coord),
            _ => self.spawn_agent(kind, faction, coord),
        };
        match spawned {
            Ok(id) => debug!(hive = %hive_id, agent = %id, "hive spawned"),
            Err(err) => warn!(hive = %hive_id, error = %err, "hive spawn failed"),
        }
    }

    fn spawn_guard_for(&mut self, hive_id: AgentId, coord: HexCoord) -> Result<AgentId> {
        let id = self.spawn_wasp_guard(hive_id, coord)?;
        if let Some(hive) = self.hives.get_mut(hive_id) {
            hive.add_worker(id);
        }
        Ok(id)
    }

    /// Add a raid wave source
    pub fn add_wave_spawner(&mut self, spawn_at: HexCoord) -> Result<()> {
        if !self.tiles.contains(spawn_at) {
            return Err(HiveError::tile_not_found(spawn_at));
        }
        self.waves.push(WaveSpawner::new(spawn_at, &self.config.enemy));
        Ok(())
    }

    fn update_waves(&mut self, dt: f32) {
        let due: Vec<(HexCoord, usize)> = self
            .waves
            .iter_mut()
            .filter_map(|w| w.tick(dt).map(|size| (w.spawn_at, size)))
            .collect();

        for (at, size) in due {
            let mut launched = 0;
            for _ in 0..size {
                match self.spawn_agent(AgentKind::Wasp, Faction::Enemy, at) {
                    Ok(_) => launched += 1,
                    Err(err) => warn!(error = %err, "wave spawn failed"),
                }
            }
            info!(size = launched, q = at.q, r = at.r, "wave launched");
            self.events.push(SimEventKind::WaveLaunched { size: launched, at });
        }
    }

    fn integrate_movement(&mut self, dt: f32) {
        for id in self.agents.ids() {
            let Some(mover) = self.movers.get_mut(&id) else {
                continue;
            };
            let Some(agent) = self.agents.get(id) else {
                continue;
            };
            let (position, coord) = (agent.world_pos, agent.coord());
            let step = mover.advance(dt, position, coord, &self.tiles, &self.layout);

            if let Some(tile) = step.entered {
                self.agents.move_to_tile(id, tile);
            }
            self.agents.set_world_pos(id, step.position);
            if let Some(to) = step.unreachable {
                let from = step.entered.unwrap_or(coord);
                debug!(agent = %id, ?from, ?to, "queued destination unreachable");
                self.events.push(SimEventKind::PathFailed { agent: id, from, to });
            }
        }

        // Floating hives ride along with their queen
        for hive_id in self.hives.ids() {
            let floating = self.hives.get(hive_id).map(|h| h.is_floating()).unwrap_or(false);
            if !floating {
                continue;
            }
            let carrier = self
                .agents
                .iter()
                .find(|a| a.carried_building == Some(hive_id))
                .map(|a| (a.coord(), a.world_pos));
            if let Some((coord, position)) = carrier {
                if let Some(hive) = self.hives.get_mut(hive_id) {
                    hive.coord = coord;
                }
                self.agents.move_to_tile(hive_id, coord);
                self.agents.set_world_pos(hive_id, position);
            }
        }
    }

    fn process_deaths(&mut self) {
        let dead: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|a| !a.is_alive())
            .map(|a| a.id)
            .collect();
        for id in dead {
            self.despawn(id);
        }
    }

    /// Compact description for logs and the headless runner
    pub fn summary(&self) -> WorldSummary {
        let mut units: Vec<(String, usize)> = Vec::new();
        for agent in self.agents.iter() {
            let key = format!("{:?}", agent.kind);
            match units.iter_mut().find(|(k, _)| *k == key) {
                Some((_, count)) => *count += 1,
                None => units.push((key, 1)),
            }
        }
        let mut worker_states: Vec<(String, usize)> = Vec::new();
        for id in self.agents.ids() {
            let Some(state) = self.worker_state(id) else {
                continue;
            };
            let key = state.name().to_string();
            match worker_states.iter_mut().find(|(k, _)| *k == key) {
                Some((_, count)) => *count += 1,
                None => worker_states.push((key, 1)),
            }
        }

        WorldSummary {
            tick: self.clock.tick,
            elapsed: self.clock.elapsed,
            player_resources: self.economy.resources(Faction::Player),
            enemy_resources: self.economy.resources(Faction::Enemy),
            units,
            worker_states,
            hives: self
                .hives
                .iter()
                .map(|h| HiveSummary {
                    faction: h.faction,
                    coord: h.coord,
                    workers: h.workers().len(),
                    relocation: format!("{:?}", h.relocation),
                })
                .collect(),
            visible_tiles: self.visibility.visible_count(),
            waves_launched: self.waves.iter().map(|w| w.waves_launched()).sum(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HiveSummary {
    pub faction: Faction,
    pub coord: HexCoord,
    pub workers: usize,
    pub relocation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldSummary {
    pub tick: u64,
    pub elapsed: f32,
    pub player_resources: u32,
    pub enemy_resources: u32,
    pub units: Vec<(String, usize)>,
    pub worker_states: Vec<(String, usize)>,
    pub hives: Vec<HiveSummary>,
    pub visible_tiles: usize,
    pub waves_launched: u32,
}
