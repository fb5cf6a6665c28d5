//! Worker behaviour: idle, move, gather, attack, follow the queen, scout
//!
//! Each state is a resumable task. It stores its own progress (timers,
//! phase, destination) and `WorkerBrain::resume` is called once per tick.
//! A transition replaces the state wholesale: whatever the old task was
//! waiting for is dropped and never resumed. Attacking is the exception in
//! that it remembers where it came from and goes back there when the fight
//! ends.
//!
//! Priority rules, checked wherever the worker is not already fighting:
//! 1. hostile within one tile and inside the authority radius: attack
//! 2. carrying resources with a hive to take them to: deliver
//! 3. ordered onto a resource tile: gather, or scout when homeless
//! 4. otherwise: move

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::behavior::context::{Body, TaskContext};
use crate::behavior::wait::{Countdown, Stopwatch};
use crate::core::error::{HiveError, Result};
use crate::core::types::AgentId;
use crate::grid::hex::HexCoord;
use crate::simulation::combat;
use crate::simulation::events::SimEventKind;

/// Why a worker is walking somewhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveIntent {
    /// Plain move order
    Travel,
    /// Carrying resources to the hive; go back to `source` afterwards if it
    /// still has anything left
    Deliver { source: Option<HexCoord> },
    /// Walking back after leaving the activity radius
    ReturnHome,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GatherPhase {
    /// Short pause after a delivery
    Cooldown { wait: Countdown },
    /// Walking to the tile
    Approach { timeout: Stopwatch },
    /// Working the tile
    Work { elapsed: f32, nudge: Countdown },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScoutPhase {
    Travel { timeout: Stopwatch },
    Linger { wait: Countdown },
}

/// Where an interrupted worker picks up again once a fight is over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resume {
    Idle,
    Moving { destination: HexCoord, intent: MoveIntent },
    Gathering { tile: HexCoord },
    FollowingQueen,
    Scouting { destination: HexCoord },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WorkerState {
    Idle {
        nudge: Countdown,
    },
    Moving {
        destination: HexCoord,
        intent: MoveIntent,
        timeout: Stopwatch,
    },
    Gathering {
        tile: HexCoord,
        phase: GatherPhase,
    },
    Attacking {
        target: AgentId,
        previous: Resume,
        timeout: Stopwatch,
        evade: Countdown,
        /// Tile last pathed to while closing in
        chasing: Option<HexCoord>,
    },
    FollowingQueen {
        repath: Countdown,
    },
    Scouting {
        destination: HexCoord,
        phase: ScoutPhase,
    },
}

impl WorkerState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkerState::Idle { .. } => "Idle",
            WorkerState::Moving { .. } => "Moving",
            WorkerState::Gathering { .. } => "Gathering",
            WorkerState::Attacking { .. } => "Attacking",
            WorkerState::FollowingQueen { .. } => "FollowingQueen",
            WorkerState::Scouting { .. } => "Scouting",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, WorkerState::Idle { .. })
    }

    pub fn moving(destination: HexCoord, intent: MoveIntent) -> Self {
        WorkerState::Moving {
            destination,
            intent,
            timeout: Stopwatch::new(),
        }
    }

    pub fn gathering(tile: HexCoord) -> Self {
        WorkerState::Gathering {
            tile,
            phase: GatherPhase::Approach {
                timeout: Stopwatch::new(),
            },
        }
    }

    pub fn scouting(destination: HexCoord) -> Self {
        WorkerState::Scouting {
            destination,
            phase: ScoutPhase::Travel {
                timeout: Stopwatch::new(),
            },
        }
    }

    pub fn attacking(target: AgentId, previous: Resume) -> Self {
        WorkerState::Attacking {
            target,
            previous,
            timeout: Stopwatch::new(),
            evade: Countdown::done(),
            chasing: None,
        }
    }

    /// Where to come back to after an interruption
    pub fn resume_point(&self) -> Resume {
        match *self {
            WorkerState::Idle { .. } => Resume::Idle,
            WorkerState::Moving {
                destination,
                intent,
                ..
            } => Resume::Moving {
                destination,
                intent,
            },
            WorkerState::Gathering { tile, .. } => Resume::Gathering { tile },
            WorkerState::Attacking { previous, .. } => previous,
            WorkerState::FollowingQueen { .. } => Resume::FollowingQueen,
            WorkerState::Scouting { destination, .. } => Resume::Scouting { destination },
        }
    }
}

/// Per-worker behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerBrain {
    state: WorkerState,
    /// Resources in hand
    carrying: u32,
    /// Bumped on every transition
    epoch: u64,
}

impl Default for WorkerBrain {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerBrain {
    pub fn new() -> Self {
        Self {
            state: WorkerState::Idle {
                nudge: Countdown::done(),
            },
            carrying: 0,
            epoch: 0,
        }
    }

    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    pub fn carrying(&self) -> u32 {
        self.carrying
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    fn idle(ctx: &mut TaskContext) -> WorkerState {
        let w = &ctx.config.worker;
        WorkerState::Idle {
            nudge: Countdown::random(ctx.rng, w.idle_nudge_min, w.idle_nudge_max),
        }
    }

    /// Replace the current task
    ///
    /// The old task is dropped before the new one starts. If the new one
    /// cannot start (no path, target gone, tile empty) the worker goes Idle.
    pub fn transition_to(&mut self, ctx: &mut TaskContext, next: WorkerState) {
        let from = self.state.name();
        let mut next = next;
        if let Err(err) = Self::enter(ctx, &mut next) {
            debug!(agent = %ctx.id, state = next.name(), error = %err, "task could not start");
            ctx.report_path_failure(&err);
            ctx.mover.clear_path();
            next = Self::idle(ctx);
        }
        self.state = next;
        self.epoch += 1;
        ctx.events.push(SimEventKind::StateChanged {
            agent: ctx.id,
            from: from.to_string(),
            to: next.name().to_string(),
        });
    }

    /// First step of a task: commit paths, stop stale motion
    fn enter(ctx: &mut TaskContext, state: &mut WorkerState) -> Result<()> {
        let body = ctx.body().ok_or_else(|| HiveError::agent_not_found(ctx.id))?;
        match state {
            WorkerState::Idle { .. } => {
                ctx.mover.clear_path();
                Ok(())
            }
            WorkerState::Moving { destination, .. } => ctx.travel_to(*destination),
            WorkerState::Gathering { tile, phase } => {
                if ctx.tiles.resource_at(*tile) == 0 {
                    return Err(HiveError::Rejected(format!(
                        "tile ({}, {}) has no resources",
                        tile.q, tile.r
                    )));
                }
                match phase {
                    GatherPhase::Approach { .. } if ctx.arrived_at(*tile) => {
                        ctx.mover.clear_path();
                        *phase = work_phase();
                        Ok(())
                    }
                    GatherPhase::Approach { .. } => ctx.travel_to(*tile),
                    GatherPhase::Cooldown { .. } | GatherPhase::Work { .. } => {
                        ctx.mover.clear_path();
                        Ok(())
                    }
                }
            }
            WorkerState::Attacking { target, chasing, .. } => {
                let target_coord = ctx
                    .agents
                    .get(*target)
                    .map(|t| t.coord())
                    .ok_or_else(|| HiveError::agent_not_found(*target))?;
                if body.coord.distance(&target_coord) > 1 {
                    ctx.travel_to(target_coord)?;
                    *chasing = Some(target_coord);
                } else {
                    ctx.mover.clear_path();
                }
                Ok(())
            }
            WorkerState::FollowingQueen { .. } => {
                let queen = ctx
                    .agents
                    .queen_of(body.faction)
                    .map(|q| q.coord())
                    .ok_or_else(|| HiveError::NotFound(format!("{:?} queen", body.faction)))?;
                ctx.travel_to(queen)
            }
            WorkerState::Scouting { destination, .. } => ctx.travel_to(*destination),
        }
    }

    /// Pick the task a tile order turns into
    pub fn choose_state_for_command(&self, ctx: &mut TaskContext, tile: HexCoord) -> WorkerState {
        let Some(body) = ctx.body() else {
            return Self::idle(ctx);
        };
        let has_resource = ctx.tiles.resource_at(tile) > 0;
        let home = ctx.available_home(&body).map(|h| h.coord);

        let ordered = match home {
            Some(hive) if self.carrying > 0 => WorkerState::moving(
                hive,
                MoveIntent::Deliver {
                    source: has_resource.then_some(tile),
                },
            ),
            Some(_) if has_resource => WorkerState::gathering(tile),
            None if has_resource => WorkerState::scouting(tile),
            _ => WorkerState::moving(tile, MoveIntent::Travel),
        };

        match adjacent_enemy(ctx, &body) {
            Some(target) => WorkerState::attacking(target, ordered.resume_point()),
            None => ordered,
        }
    }

    /// Order onto a tile
    pub fn command_tile(&mut self, ctx: &mut TaskContext, tile: HexCoord) {
        let next = self.choose_state_for_command(ctx, tile);
        self.transition_to(ctx, next);
    }

    /// Order to attack a specific agent
    pub fn command_attack(&mut self, ctx: &mut TaskContext, target: AgentId) {
        let previous = self.state.resume_point();
        self.transition_to(ctx, WorkerState::attacking(target, previous));
    }

    pub fn command_follow_queen(&mut self, ctx: &mut TaskContext) {
        self.transition_to(
            ctx,
            WorkerState::FollowingQueen {
                repath: Countdown::new(ctx.config.worker.follow_repath_interval),
            },
        );
    }

    /// Drop whatever the worker is doing
    pub fn cancel(&mut self, ctx: &mut TaskContext) {
        let idle = Self::idle(ctx);
        self.transition_to(ctx, idle);
    }

    /// Resume the current task for one tick
    pub fn resume(&mut self, ctx: &mut TaskContext) {
        let Some(body) = ctx.body() else {
            return;
        };
        let next = match &mut self.state {
            WorkerState::Idle { nudge } => resume_idle(ctx, &body, nudge, self.carrying),
            WorkerState::Moving {
                destination,
                intent,
                timeout,
            } => resume_moving(ctx, &body, *destination, *intent, timeout, &mut self.carrying),
            WorkerState::Gathering { tile, phase } => {
                resume_gathering(ctx, &body, *tile, phase, &mut self.carrying)
            }
            WorkerState::Attacking {
                target,
                previous,
                timeout,
                evade,
                chasing,
            } => resume_attacking(ctx, &body, *target, *previous, timeout, evade, chasing),
            WorkerState::FollowingQueen { repath } => resume_following(ctx, &body, repath),
            WorkerState::Scouting { destination, phase } => {
                resume_scouting(ctx, &body, destination, phase)
            }
        };
        if let Some(next) = next {
            self.transition_to(ctx, next);
        }
    }
}

fn work_phase() -> GatherPhase {
    GatherPhase::Work {
        elapsed: 0.0,
        nudge: Countdown::done(),
    }
}

fn resume_into(ctx: &mut TaskContext, resume: Resume) -> WorkerState {
    match resume {
        Resume::Idle => WorkerBrain::idle(ctx),
        Resume::Moving {
            destination,
            intent,
        } => WorkerState::moving(destination, intent),
        Resume::Gathering { tile } => WorkerState::gathering(tile),
        Resume::FollowingQueen => WorkerState::FollowingQueen {
            repath: Countdown::done(),
        },
        Resume::Scouting { destination } => WorkerState::scouting(destination),
    }
}

/// Nearest attackable hostile within one tile that the authority covers
fn adjacent_enemy(ctx: &TaskContext, body: &Body) -> Option<AgentId> {
    let authority = ctx.authority(body)?;
    let me = ctx.agents.get(body.id)?;
    ctx.agents
        .within(body.coord, 1)
        .into_iter()
        .filter(|other| other.is_valid_target_for(me) && authority.allows(other.coord()))
        .min_by_key(|other| other.coord().distance(&body.coord))
        .map(|other| other.id)
}

/// Walk home, or stand down if there is no home
fn redirect_home(ctx: &mut TaskContext, body: &Body) -> WorkerState {
    match ctx.home(body).map(|h| h.coord) {
        Some(hive) => WorkerState::moving(hive, MoveIntent::ReturnHome),
        None => WorkerBrain::idle(ctx),
    }
}

fn time_out(ctx: &mut TaskContext, state: &str, seconds: f32) {
    let err = HiveError::Timeout {
        agent: ctx.id,
        state: state.to_string(),
        seconds,
    };
    warn!("{}", err);
    ctx.events.push(SimEventKind::TaskTimedOut {
        agent: ctx.id,
        state: state.to_string(),
    });
}

/// Keep travelling toward `destination`; Err when the way is lost
fn keep_travelling(ctx: &mut TaskContext, destination: HexCoord) -> Result<()> {
    if ctx.mover.is_moving() {
        return Ok(());
    }
    ctx.travel_to(destination)
}

fn resume_idle(
    ctx: &mut TaskContext,
    body: &Body,
    nudge: &mut Countdown,
    carrying: u32,
) -> Option<WorkerState> {
    if let Some(target) = adjacent_enemy(ctx, body) {
        return Some(WorkerState::attacking(target, Resume::Idle));
    }
    if carrying > 0 {
        if let Some(hive) = ctx.available_home(body).map(|h| h.coord) {
            return Some(WorkerState::moving(hive, MoveIntent::Deliver { source: None }));
        }
    }
    if nudge.tick(ctx.dt) && !ctx.mover.is_moving() {
        ctx.nudge_in_tile();
        let w = &ctx.config.worker;
        *nudge = Countdown::random(ctx.rng, w.idle_nudge_min, w.idle_nudge_max);
    }
    None
}

fn resume_moving(
    ctx: &mut TaskContext,
    body: &Body,
    destination: HexCoord,
    intent: MoveIntent,
    timeout: &mut Stopwatch,
    carrying: &mut u32,
) -> Option<WorkerState> {
    timeout.tick(ctx.dt);
    if timeout.exceeded(ctx.config.worker.move_timeout) {
        time_out(ctx, "Moving", timeout.elapsed());
        return Some(WorkerBrain::idle(ctx));
    }

    if !ctx.arrived_at(destination) {
        if let Err(err) = keep_travelling(ctx, destination) {
            warn!(agent = %ctx.id, error = %err, "lost the way while moving");
            ctx.report_path_failure(&err);
            return Some(WorkerBrain::idle(ctx));
        }
        return None;
    }

    let next = match intent {
        MoveIntent::Travel => {
            if ctx.tiles.resource_at(destination) > 0 && ctx.available_home(body).is_some() {
                WorkerState::Gathering {
                    tile: destination,
                    phase: work_phase(),
                }
            } else {
                WorkerBrain::idle(ctx)
            }
        }
        MoveIntent::Deliver { source } => deliver(ctx, body, destination, source, carrying),
        MoveIntent::ReturnHome => WorkerBrain::idle(ctx),
    };
    Some(next)
}

/// Hand resources to the hive standing on `at`, then pick the next task
fn deliver(
    ctx: &mut TaskContext,
    body: &Body,
    at: HexCoord,
    source: Option<HexCoord>,
    carrying: &mut u32,
) -> WorkerState {
    let Some(hive) = ctx.available_home(body).filter(|h| h.coord == at) else {
        // Hive moved or vanished on the way; Idle re-routes if it can
        return WorkerBrain::idle(ctx);
    };
    let faction = hive.faction;
    let radius = ctx.hive_radius(hive);
    let hive_coord = hive.coord;

    let amount = std::mem::take(carrying);
    ctx.economy.add_resources(faction, amount);
    ctx.events.push(SimEventKind::ResourcesDelivered {
        agent: ctx.id,
        faction,
        amount,
    });
    debug!(agent = %ctx.id, amount, "delivered");

    match source {
        Some(tile)
            if ctx.tiles.resource_at(tile) > 0
                && crate::hive::activity::in_range(hive_coord, tile, radius) =>
        {
            WorkerState::Gathering {
                tile,
                phase: GatherPhase::Cooldown {
                    wait: Countdown::new(ctx.config.worker.regather_cooldown),
                },
            }
        }
        _ => WorkerBrain::idle(ctx),
    }
}

fn resume_gathering(
    ctx: &mut TaskContext,
    body: &Body,
    tile: HexCoord,
    phase: &mut GatherPhase,
    carrying: &mut u32,
) -> Option<WorkerState> {
    match phase {
        GatherPhase::Cooldown { wait } => {
            if !wait.tick(ctx.dt) {
                return None;
            }
            if ctx.tiles.resource_at(tile) == 0 {
                return Some(WorkerBrain::idle(ctx));
            }
            if ctx.arrived_at(tile) {
                *phase = work_phase();
            } else if let Err(err) = ctx.travel_to(tile) {
                ctx.report_path_failure(&err);
                return Some(WorkerBrain::idle(ctx));
            } else {
                *phase = GatherPhase::Approach {
                    timeout: Stopwatch::new(),
                };
            }
            None
        }
        GatherPhase::Approach { timeout } => {
            if let Some(target) = adjacent_enemy(ctx, body) {
                return Some(WorkerState::attacking(target, Resume::Gathering { tile }));
            }
            timeout.tick(ctx.dt);
            if timeout.exceeded(ctx.config.worker.move_timeout) {
                time_out(ctx, "Gathering", timeout.elapsed());
                return Some(WorkerBrain::idle(ctx));
            }
            if ctx.arrived_at(tile) {
                *phase = work_phase();
                return None;
            }
            if let Err(err) = keep_travelling(ctx, tile) {
                ctx.report_path_failure(&err);
                return Some(WorkerBrain::idle(ctx));
            }
            None
        }
        GatherPhase::Work { elapsed, nudge } => {
            if let Some(target) = adjacent_enemy(ctx, body) {
                return Some(WorkerState::attacking(target, Resume::Gathering { tile }));
            }
            *elapsed += ctx.dt;
            if nudge.tick(ctx.dt) {
                ctx.nudge_in_tile();
                *nudge = Countdown::new(ctx.config.worker.gather_nudge_interval);
            }

            let duration = ctx.economy.gather_duration(
                body.faction,
                ctx.config.worker.gather_duration,
                &ctx.config.hive,
            );
            if *elapsed < duration {
                return None;
            }

            let amount = ctx
                .tiles
                .withdraw_resource(tile, ctx.config.worker.gather_amount);
            if amount == 0 {
                return Some(WorkerBrain::idle(ctx));
            }
            *carrying += amount;
            debug!(agent = %ctx.id, amount, left = ctx.tiles.resource_at(tile), "gathered");

            Some(match ctx.available_home(body).map(|h| h.coord) {
                Some(hive) => WorkerState::moving(hive, MoveIntent::Deliver { source: Some(tile) }),
                None => WorkerBrain::idle(ctx),
            })
        }
    }
}

fn resume_attacking(
    ctx: &mut TaskContext,
    body: &Body,
    target: AgentId,
    previous: Resume,
    timeout: &mut Stopwatch,
    evade: &mut Countdown,
    chasing: &mut Option<HexCoord>,
) -> Option<WorkerState> {
    let Some(target_coord) = ctx
        .agents
        .get(target)
        .filter(|t| t.is_alive())
        .map(|t| t.coord())
    else {
        return Some(resume_into(ctx, previous));
    };

    if let Some(authority) = ctx.hive_authority(body) {
        if !authority.allows(body.coord) || !authority.allows(target_coord) {
            debug!(agent = %ctx.id, "fight left the activity radius");
            return Some(redirect_home(ctx, body));
        }
    }

    timeout.tick(ctx.dt);
    if timeout.exceeded(ctx.config.worker.attack_timeout) {
        time_out(ctx, "Attacking", timeout.elapsed());
        return Some(redirect_home(ctx, body));
    }

    if body.coord.distance(&target_coord) > 1 {
        if *chasing != Some(target_coord) || !ctx.mover.is_moving() {
            if let Err(err) = ctx.travel_to(target_coord) {
                ctx.report_path_failure(&err);
                return Some(resume_into(ctx, previous));
            }
            *chasing = Some(target_coord);
        }
        return None;
    }
    if chasing.take().is_some() {
        ctx.mover.clear_path();
    }

    if !evade.tick(ctx.dt) {
        return None;
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
                return Some(resume_into(ctx, previous));
            }
        }
        None => {
            let wait = combat::cooldown_remaining(ctx.agents, ctx.id, ctx.now).unwrap_or(0.0);
            *evade = Countdown::new(wait);
            ctx.nudge_in_tile();
        }
    }
    None
}

fn resume_following(
    ctx: &mut TaskContext,
    body: &Body,
    repath: &mut Countdown,
) -> Option<WorkerState> {
    if let Some(target) = adjacent_enemy(ctx, body) {
        return Some(WorkerState::attacking(target, Resume::FollowingQueen));
    }
    let Some(queen) = ctx.agents.queen_of(body.faction).map(|q| q.coord()) else {
        debug!(agent = %ctx.id, "queen lost");
        return Some(WorkerBrain::idle(ctx));
    };
    if repath.tick(ctx.dt) {
        if let Err(err) = ctx.travel_to(queen) {
            ctx.report_path_failure(&err);
            return Some(WorkerBrain::idle(ctx));
        }
        *repath = Countdown::new(ctx.config.worker.follow_repath_interval);
    }
    None
}

fn resume_scouting(
    ctx: &mut TaskContext,
    body: &Body,
    destination: &mut HexCoord,
    phase: &mut ScoutPhase,
) -> Option<WorkerState> {
    match phase {
        ScoutPhase::Travel { timeout } => {
            timeout.tick(ctx.dt);
            let arrived = ctx.arrived_at(*destination);
            let gave_up = timeout.exceeded(ctx.config.worker.move_timeout);
            if gave_up {
                time_out(ctx, "Scouting", timeout.elapsed());
                ctx.mover.clear_path();
            }
            if arrived || gave_up {
                let w = &ctx.config.worker;
                *phase = ScoutPhase::Linger {
                    wait: Countdown::random(ctx.rng, w.scout_wait_min, w.scout_wait_max),
                };
                return None;
            }
            if let Err(err) = keep_travelling(ctx, *destination) {
                ctx.report_path_failure(&err);
                *phase = ScoutPhase::Linger {
                    wait: Countdown::done(),
                };
            }
            None
        }
        ScoutPhase::Linger { wait } => {
            if let Some(target) = adjacent_enemy(ctx, body) {
                return Some(WorkerState::attacking(
                    target,
                    Resume::Scouting {
                        destination: *destination,
                    },
                ));
            }
            if ctx.available_home(body).is_some() {
                return Some(WorkerBrain::idle(ctx));
            }
            if !wait.tick(ctx.dt) {
                return None;
            }

            let radius = ctx.config.worker.scout_radius;
            let candidates: Vec<HexCoord> = body
                .coord
                .hexes_in_range(radius)
                .into_iter()
                .filter(|c| *c != body.coord && ctx.tiles.contains(*c))
                .collect();
            let Some(&next) = candidates.choose(ctx.rng) else {
                let w = &ctx.config.worker;
                *wait = Countdown::random(ctx.rng, w.scout_wait_min, w.scout_wait_max);
                return None;
            };

            *destination = next;
            *phase = ScoutPhase::Travel {
                timeout: Stopwatch::new(),
            };
            if let Err(err) = ctx.travel_to(next) {
                ctx.report_path_failure(&err);
                *phase = ScoutPhase::Linger {
                    wait: Countdown::done(),
                };
            }
            None
        }
    }
}
