//! Hives: worker ownership, spawn throttling and relocation casting
//!
//! A hive is also an agent in the registry (it has a position and can be
//! attacked). This struct holds the parts only a hive has.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::agents::agent::AgentKind;
use crate::core::config::SimulationConfig;
use crate::core::error::{HiveError, Result};
use crate::core::types::{AgentId, Faction};
use crate::grid::hex::HexCoord;

/// What a relocation cast will do when it completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastGoal {
    Lift,
    Land,
}

/// Relocation state machine: Idle -> Casting -> {Floating <-> Landed}
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RelocationState {
    Idle,
    /// The queen must stay on `anchor` until `elapsed` reaches the cast duration
    Casting {
        goal: CastGoal,
        queen: AgentId,
        anchor: HexCoord,
        elapsed: f32,
    },
    /// Carried by the queen
    Floating,
    Landed,
}

/// Result of advancing a cast by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastProgress {
    NotCasting,
    InProgress,
    Cancelled(CastGoal),
    Completed(CastGoal),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hive {
    /// The hive's own agent id
    pub id: AgentId,
    pub faction: Faction,
    pub coord: HexCoord,
    workers: Vec<AgentId>,
    pub max_workers: usize,
    pub spawn_kind: AgentKind,
    pub spawn_interval: f32,
    pub spawn_cost: u32,
    spawn_timer: f32,
    base_radius: u32,
    pub relocation: RelocationState,
    has_relocated: bool,
}

impl Hive {
    /// Player hive spawning workers
    pub fn player(id: AgentId, coord: HexCoord, config: &SimulationConfig) -> Self {
        let h = &config.hive;
        Self::with_params(
            id,
            Faction::Player,
            coord,
            AgentKind::Worker,
            h.max_workers,
            h.spawn_interval,
            h.spawn_cost,
            h.activity_radius,
        )
    }

    /// Wasp hive spawning home-bound wasps for free
    pub fn wasp(id: AgentId, coord: HexCoord, config: &SimulationConfig) -> Self {
        let e = &config.enemy;
        Self::with_params(
            id,
            Faction::Enemy,
            coord,
            AgentKind::Wasp,
            e.guard_max,
            e.guard_spawn_interval,
            0,
            e.hive_activity_radius,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_params(
        id: AgentId,
        faction: Faction,
        coord: HexCoord,
        spawn_kind: AgentKind,
        max_workers: usize,
        spawn_interval: f32,
        spawn_cost: u32,
        activity_radius: u32,
    ) -> Self {
        Self {
            id,
            faction,
            coord,
            workers: Vec::new(),
            max_workers,
            spawn_kind,
            spawn_interval,
            spawn_cost,
            spawn_timer: 0.0,
            base_radius: activity_radius,
            relocation: RelocationState::Idle,
            has_relocated: false,
        }
    }

    /// Radius including any purchased bonus
    pub fn activity_radius(&self, bonus: u32) -> u32 {
        self.base_radius + bonus
    }

    pub fn workers(&self) -> &[AgentId] {
        &self.workers
    }

    pub fn has_capacity(&self) -> bool {
        self.workers.len() < self.max_workers
    }

    /// Adopt a worker; refused at the cap or if already owned
    pub fn add_worker(&mut self, id: AgentId) -> bool {
        if !self.has_capacity() || self.workers.contains(&id) {
            return false;
        }
        self.workers.push(id);
        true
    }

    pub fn remove_worker(&mut self, id: AgentId) -> bool {
        let before = self.workers.len();
        self.workers.retain(|&w| w != id);
        self.workers.len() != before
    }

    /// Lifted, or casting to land: workers treat the hive as unavailable
    pub fn is_relocating(&self) -> bool {
        matches!(
            self.relocation,
            RelocationState::Floating
                | RelocationState::Casting {
                    goal: CastGoal::Land,
                    ..
                }
        )
    }

    pub fn is_floating(&self) -> bool {
        matches!(self.relocation, RelocationState::Floating)
    }

    /// Spawning only happens while the hive sits on the ground
    fn is_grounded(&self) -> bool {
        matches!(
            self.relocation,
            RelocationState::Idle | RelocationState::Landed
        )
    }

    /// Advance the spawn timer; true when a spawn is due
    ///
    /// The timer only runs while under the cap and grounded. A due spawn
    /// stays due until `mark_spawned` is called, so a spawn blocked by cost
    /// retries every tick.
    pub fn tick_spawn(&mut self, dt: f32) -> bool {
        if !self.has_capacity() || !self.is_grounded() {
            self.spawn_timer = 0.0;
            return false;
        }
        self.spawn_timer = (self.spawn_timer + dt).min(self.spawn_interval);
        self.spawn_timer >= self.spawn_interval
    }

    pub fn mark_spawned(&mut self) {
        self.spawn_timer = 0.0;
    }

    /// Start a lift (from the ground) or land (while floating) cast
    pub fn begin_cast(&mut self, queen: AgentId, anchor: HexCoord) -> Result<CastGoal> {
        let goal = match self.relocation {
            RelocationState::Idle | RelocationState::Landed => CastGoal::Lift,
            RelocationState::Floating => CastGoal::Land,
            RelocationState::Casting { .. } => {
                return Err(HiveError::Rejected(format!(
                    "hive {} is already casting",
                    self.id
                )))
            }
        };
        self.relocation = RelocationState::Casting {
            goal,
            queen,
            anchor,
            elapsed: 0.0,
        };
        Ok(goal)
    }

    /// Advance a cast. `queen_coord` is None when the casting queen is gone.
    pub fn tick_cast(
        &mut self,
        dt: f32,
        queen_coord: Option<HexCoord>,
        cast_duration: f32,
    ) -> CastProgress {
        let RelocationState::Casting {
            goal,
            anchor,
            elapsed,
            queen,
        } = self.relocation
        else {
            return CastProgress::NotCasting;
        };

        if queen_coord != Some(anchor) {
            self.relocation = self.revert_state(goal);
            return CastProgress::Cancelled(goal);
        }

        let elapsed = elapsed + dt;
        if elapsed < cast_duration {
            self.relocation = RelocationState::Casting {
                goal,
                queen,
                anchor,
                elapsed,
            };
            return CastProgress::InProgress;
        }

        match goal {
            CastGoal::Lift => self.relocation = RelocationState::Floating,
            CastGoal::Land => {
                self.relocation = RelocationState::Landed;
                self.coord = anchor;
                self.has_relocated = true;
            }
        }
        CastProgress::Completed(goal)
    }

    /// Queen casting this hive, if any
    pub fn casting_queen(&self) -> Option<AgentId> {
        match self.relocation {
            RelocationState::Casting { queen, .. } => Some(queen),
            _ => None,
        }
    }

    fn revert_state(&self, goal: CastGoal) -> RelocationState {
        match goal {
            CastGoal::Land => RelocationState::Floating,
            CastGoal::Lift if self.has_relocated => RelocationState::Landed,
            CastGoal::Lift => RelocationState::Idle,
        }
    }
}

/// All hives, at most one per faction
#[derive(Debug, Clone, Default)]
pub struct HiveRegistry {
    hives: AHashMap<AgentId, Hive>,
    order: Vec<AgentId>,
}

impl HiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hive; refused while the faction already owns one
    pub fn insert(&mut self, hive: Hive) -> Result<AgentId> {
        if self.for_faction(hive.faction).is_some() {
            return Err(HiveError::Rejected(format!(
                "{:?} already owns a hive",
                hive.faction
            )));
        }
        let id = hive.id;
        self.order.push(id);
        self.hives.insert(id, hive);
        Ok(id)
    }

    pub fn remove(&mut self, id: AgentId) -> Option<Hive> {
        let hive = self.hives.remove(&id)?;
        self.order.retain(|&h| h != id);
        Some(hive)
    }

    pub fn get(&self, id: AgentId) -> Option<&Hive> {
        self.hives.get(&id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Hive> {
        self.hives.get_mut(&id)
    }

    pub fn for_faction(&self, faction: Faction) -> Option<&Hive> {
        self.iter().find(|h| h.faction == faction)
    }

    pub fn ids(&self) -> Vec<AgentId> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hive> + '_ {
        self.order.iter().filter_map(move |id| self.hives.get(id))
    }
}
