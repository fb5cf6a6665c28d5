//! Wasp behaviour
//!
//! Two variants share the targeting rules in `targeting`:
//! - home guards stay leashed to their wasp hive's activity radius and walk
//!   back when they have nothing to fight;
//! - wave raiders are not leashed and march on the player hive.
//!
//! Targets are re-scanned on a jittered period, and additionally exactly when
//! the attack cooldown runs out so no frame is wasted between hits.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ai::targeting::{find_target, redirect_sheltered_queen, Leash, TargetQuery};
use crate::behavior::context::{Body, TaskContext};
use crate::behavior::wait::Countdown;
use crate::core::types::{AgentId, Faction};
use crate::grid::hex::HexCoord;
use crate::simulation::combat;
use crate::simulation::events::SimEventKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyRole {
    HomeGuard { hive: AgentId },
    Wave,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyBrain {
    role: EnemyRole,
    target: Option<AgentId>,
    rescan: Countdown,
    evade: Countdown,
    idle_nudge: Countdown,
    /// Tile last pathed to
    heading: Option<HexCoord>,
}

impl EnemyBrain {
    pub fn home_guard(hive: AgentId) -> Self {
        Self::with_role(EnemyRole::HomeGuard { hive })
    }

    pub fn wave() -> Self {
        Self::with_role(EnemyRole::Wave)
    }

    fn with_role(role: EnemyRole) -> Self {
        Self {
            role,
            target: None,
            rescan: Countdown::done(),
            evade: Countdown::done(),
            idle_nudge: Countdown::done(),
            heading: None,
        }
    }

    pub fn role(&self) -> EnemyRole {
        self.role
    }

    pub fn target(&self) -> Option<AgentId> {
        self.target
    }

    /// Seconds until the next scheduled re-scan
    pub fn next_scan_in(&self) -> f32 {
        self.rescan.remaining()
    }

    /// The guard's hive has been destroyed: fight on as a raider
    pub fn release(&mut self) {
        self.role = EnemyRole::Wave;
    }

    fn leash(&self, ctx: &TaskContext) -> Option<Leash> {
        match self.role {
            EnemyRole::HomeGuard { hive } => ctx.hives.get(hive).map(|h| Leash {
                hive: h.coord,
                radius: ctx.hive_radius(h),
            }),
            EnemyRole::Wave => None,
        }
    }

    fn query(&self, ctx: &TaskContext, body: &Body) -> TargetQuery {
        TargetQuery {
            origin: body.coord,
            position: body.position,
            vision_range: body.vision_range,
            leash: self.leash(ctx),
        }
    }

    fn scan(&self, ctx: &TaskContext, body: &Body) -> Option<AgentId> {
        let found = find_target(&*ctx.agents, &self.query(ctx, body))?;
        Some(match self.role {
            EnemyRole::Wave => redirect_sheltered_queen(&*ctx.agents, ctx.hives, found),
            EnemyRole::HomeGuard { .. } => found,
        })
    }

    /// Is the current target still worth chasing?
    fn target_valid(&self, ctx: &TaskContext, body: &Body, target: AgentId) -> bool {
        let Some(agent) = ctx.agents.get(target) else {
            return false;
        };
        if !agent.is_alive() || agent.invincible {
            return false;
        }
        match self.leash(ctx) {
            Some(leash) => {
                crate::hive::activity::in_range(leash.hive, agent.coord(), leash.radius)
                    && crate::hive::activity::in_range(leash.hive, body.coord, leash.radius)
            }
            // Raiders keep a lock until the target slips out of sight
            None => agent.coord().distance(&body.coord) <= body.vision_range.max(1),
        }
    }

    fn go_to(&mut self, ctx: &mut TaskContext, destination: HexCoord) {
        if self.heading == Some(destination) && ctx.mover.is_moving() {
            return;
        }
        match ctx.travel_to(destination) {
            Ok(()) => self.heading = Some(destination),
            Err(err) => {
                debug!(agent = %ctx.id, error = %err, "wasp cannot path");
                ctx.report_path_failure(&err);
                self.heading = None;
            }
        }
    }

    pub fn resume(&mut self, ctx: &mut TaskContext) {
        let Some(body) = ctx.body() else {
            return;
        };

        if let Some(target) = self.target {
            if !self.target_valid(ctx, &body, target) {
                self.target = None;
                self.rescan = Countdown::done();
            }
        }

        if self.rescan.tick(ctx.dt) {
            let found = self.scan(ctx, &body);
            if found != self.target {
                debug!(agent = %ctx.id, target = ?found, "wasp retargets");
            }
            self.target = found;
            let e = &ctx.config.enemy;
            self.rescan = Countdown::random(ctx.rng, e.rescan_min, e.rescan_max);
        }

        match self.target {
            Some(target) => self.engage(ctx, &body, target),
            None => self.wander(ctx, &body),
        }
    }

    fn engage(&mut self, ctx: &mut TaskContext, body: &Body, target: AgentId) {
        let Some(target_coord) = ctx.agents.get(target).map(|t| t.coord()) else {
            return;
        };
        if body.coord.distance(&target_coord) > 1 {
            self.go_to(ctx, target_coord);
            return;
        }
        if self.heading.take().is_some() {
            ctx.mover.clear_path();
        }

        if !self.evade.tick(ctx.dt) {
            return;
        }
        match combat::try_attack(ctx.agents, ctx.id, target, ctx.now) {
            Some(outcome) => {
                ctx.events.push(SimEventKind::Attacked {
                    attacker: ctx.id,
                    defender: target,
                    damage: outcome.damage,
                    remaining: outcome.remaining,
                });
                if outcome.killed {
                    self.target = None;
                    self.rescan = Countdown::done();
                    return;
                }
                // Look again the moment the next hit becomes possible
                let cooldown = combat::cooldown_remaining(ctx.agents, ctx.id, ctx.now).unwrap_or(0.0);
                if cooldown < self.rescan.remaining() {
                    self.rescan = Countdown::new(cooldown);
                }
            }
            None => {
                let wait = combat::cooldown_remaining(ctx.agents, ctx.id, ctx.now).unwrap_or(0.0);
                self.evade = Countdown::new(wait);
                ctx.nudge_in_tile();
            }
        }
    }

    fn wander(&mut self, ctx: &mut TaskContext, body: &Body) {
        let destination = match self.role {
            EnemyRole::HomeGuard { hive } => ctx
                .hives
                .get(hive)
                .map(|h| h.coord)
                .filter(|home| home.distance(&body.coord) > 1),
            EnemyRole::Wave => ctx
                .hives
                .for_faction(Faction::Player)
                .map(|h| h.coord)
                .filter(|hive| hive.distance(&body.coord) > 1),
        };

        match destination {
            Some(destination) => self.go_to(ctx, destination),
            None => {
                if self.heading.take().is_some() {
                    ctx.mover.clear_path();
                }
                if self.idle_nudge.tick(ctx.dt) && !ctx.mover.is_moving() {
                    ctx.nudge_in_tile();
                    let w = &ctx.config.worker;
                    self.idle_nudge = Countdown::random(ctx.rng, w.idle_nudge_min, w.idle_nudge_max);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::agent::{Agent, AgentKind};
    use crate::agents::registry::AgentRegistry;
    use crate::core::config::SimulationConfig;
    use crate::grid::hex::HexLayout;
    use crate::grid::tiles::{Terrain, TileRegistry};
    use crate::hive::colony::{Hive, HiveRegistry};
    use crate::hive::economy::Economy;
    use crate::simulation::events::EventLog;
    use crate::simulation::movement::MovementExecutor;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Arena {
        config: SimulationConfig,
        tiles: TileRegistry,
        agents: AgentRegistry,
        hives: HiveRegistry,
        economy: Economy,
        mover: MovementExecutor,
        events: EventLog,
        rng: ChaCha8Rng,
        wasp: AgentId,
        brain: EnemyBrain,
        now: f32,
    }

    impl Arena {
        fn new(role_home: bool) -> Self {
            let config = SimulationConfig::default();
            let layout = HexLayout::new(config.grid.hex_size);
            let mut agents = AgentRegistry::new(layout);
            let mut hives = HiveRegistry::new();

            let nest = agents
                .register(Agent::spawn(AgentKind::WaspHive, Faction::Enemy, HexCoord::new(0, 0), &config, &layout))
                .unwrap();
            hives.insert(Hive::wasp(nest, HexCoord::new(0, 0), &config)).unwrap();
            let wasp = agents
                .register(Agent::spawn(AgentKind::Wasp, Faction::Enemy, HexCoord::new(1, 0), &config, &layout))
                .unwrap();
            let brain = if role_home {
                EnemyBrain::home_guard(nest)
            } else {
                EnemyBrain::wave()
            };

            Self {
                mover: MovementExecutor::new(config.movement.wasp_speed),
                tiles: TileRegistry::hexagon(10, Terrain::Meadow),
                config,
                agents,
                hives,
                economy: Economy::new(),
                events: EventLog::new(),
                rng: ChaCha8Rng::seed_from_u64(5),
                wasp,
                brain,
                now: 0.0,
            }
        }

        fn add_player(&mut self, kind: AgentKind, coord: HexCoord) -> AgentId {
            let layout = *self.agents.layout();
            self.agents
                .register(Agent::spawn(kind, Faction::Player, coord, &self.config, &layout))
                .unwrap()
        }

        fn step(&mut self, dt: f32) {
            self.now += dt;
            let mut ctx = TaskContext {
                id: self.wasp,
                now: self.now,
                dt,
                config: &self.config,
                tiles: &mut self.tiles,
                agents: &mut self.agents,
                hives: &self.hives,
                economy: &mut self.economy,
                mover: &mut self.mover,
                events: &mut self.events,
                rng: &mut self.rng,
            };
            self.brain.resume(&mut ctx);

            let agent = self.agents.get(self.wasp).unwrap();
            let (pos, coord) = (agent.world_pos, agent.coord());
            let layout = *self.agents.layout();
            let step = self.mover.advance(dt, pos, coord, &self.tiles, &layout);
            if let Some(tile) = step.entered {
                self.agents.move_to_tile(self.wasp, tile);
            }
            self.agents.set_world_pos(self.wasp, step.position);
        }
    }

    #[test]
    fn test_guard_attacks_adjacent_worker() {
        let mut arena = Arena::new(true);
        let bee = arena.add_player(AgentKind::Worker, HexCoord::new(2, 0));
        let start = arena.agents.get(bee).unwrap().health().unwrap();

        arena.step(0.1);
        assert_eq!(arena.brain.target(), Some(bee));
        assert!(arena.agents.get(bee).unwrap().health().unwrap() < start);
    }

    #[test]
    fn test_rescan_scheduled_at_cooldown_expiry() {
        let mut arena = Arena::new(true);
        arena.config.enemy.rescan_min = 5.0;
        arena.config.enemy.rescan_max = 5.0;
        arena.add_player(AgentKind::Worker, HexCoord::new(2, 0));

        arena.step(0.1);
        let cooldown = arena.config.combat.wasp.cooldown;
        assert!((arena.brain.next_scan_in() - cooldown).abs() < 1e-4);
    }

    #[test]
    fn test_guard_ignores_targets_outside_leash() {
        let mut arena = Arena::new(true);
        let radius = arena.config.enemy.hive_activity_radius as i32;
        arena.add_player(AgentKind::Worker, HexCoord::new(radius + 1, 0));
        // Make sure the worker is within sight, just not within the leash
        arena.agents.get_mut(arena.wasp).unwrap().vision_range = 10;

        arena.step(0.1);
        assert_eq!(arena.brain.target(), None);
    }

    #[test]
    fn test_wave_marches_on_player_hive() {
        let mut arena = Arena::new(false);
        let hive = arena.add_player(AgentKind::Hive, HexCoord::new(-8, 0));
        arena
            .hives
            .insert(Hive::player(hive, HexCoord::new(-8, 0), &arena.config))
            .unwrap();

        for _ in 0..40 {
            arena.step(0.1);
        }
        let coord = arena.agents.get(arena.wasp).unwrap().coord();
        assert!(coord.distance(&HexCoord::new(-8, 0)) < 9);
    }

    #[test]
    fn test_target_dropped_when_dead() {
        let mut arena = Arena::new(true);
        let bee = arena.add_player(AgentKind::Worker, HexCoord::new(2, 0));
        arena.step(0.1);
        assert_eq!(arena.brain.target(), Some(bee));

        arena.agents.get_mut(bee).unwrap().combat.as_mut().unwrap().health = 0;
        arena.step(0.1);
        assert_eq!(arena.brain.target(), None);
    }
}
