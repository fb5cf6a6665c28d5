//! Agent record: every simulated entity (bees, queens, hives, wasps)
//!
//! Capabilities are explicit optional fields resolved at construction
//! (`combat`, `home_hive`, `carried_building`), never looked up by type at
//! runtime.

use serde::{Deserialize, Serialize};

use crate::core::config::{CombatProfile, SimulationConfig};
use crate::core::types::{AgentId, Faction, SimTime, Vec2};
use crate::grid::hex::{HexCoord, HexLayout};

/// What an agent is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// Gathering bee
    Worker,
    /// Heavy defender bee; the "tank" enemies prioritise
    Guard,
    Queen,
    /// Player hive building
    Hive,
    Wasp,
    /// Enemy hive building
    WaspHive,
}

impl AgentKind {
    /// Buildings: immobile, permanently remembered once seen
    pub fn is_structure(&self) -> bool {
        matches!(self, AgentKind::Hive | AgentKind::WaspHive)
    }

    pub fn is_queen(&self) -> bool {
        matches!(self, AgentKind::Queen)
    }

    pub fn is_tank(&self) -> bool {
        matches!(self, AgentKind::Guard)
    }

    pub fn default_faction(&self) -> Faction {
        match self {
            AgentKind::Worker | AgentKind::Guard | AgentKind::Queen | AgentKind::Hive => {
                Faction::Player
            }
            AgentKind::Wasp | AgentKind::WaspHive => Faction::Enemy,
        }
    }

    fn combat_profile(&self, config: &SimulationConfig) -> CombatProfile {
        let c = &config.combat;
        match self {
            AgentKind::Worker => c.worker,
            AgentKind::Guard => c.guard,
            AgentKind::Queen => c.queen,
            AgentKind::Hive => c.hive,
            AgentKind::Wasp => c.wasp,
            AgentKind::WaspHive => c.wasp_hive,
        }
    }

    fn vision_range(&self, config: &SimulationConfig) -> u32 {
        match self {
            AgentKind::Worker => config.worker.vision_range,
            AgentKind::Guard => config.worker.guard_vision_range,
            AgentKind::Queen => config.visibility.queen_vision_range,
            AgentKind::Hive => config.hive.vision_range,
            AgentKind::Wasp | AgentKind::WaspHive => config.enemy.vision_range,
        }
    }
}

/// Health and attack state for combat-capable agents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    /// May go negative on the killing blow
    pub health: i32,
    pub max_health: i32,
    pub attack: i32,
    /// Seconds between successful attacks
    pub cooldown: f32,
    pub last_attack_at: Option<SimTime>,
}

impl CombatStats {
    pub fn new(max_health: i32, attack: i32, cooldown: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            attack,
            cooldown,
            last_attack_at: None,
        }
    }

    pub fn from_profile(profile: CombatProfile) -> Self {
        Self::new(profile.max_health, profile.attack, profile.cooldown)
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Earliest time the next attack may land
    pub fn ready_at(&self) -> SimTime {
        match self.last_attack_at {
            Some(last) => last + self.cooldown,
            None => SimTime::MIN,
        }
    }

    pub fn can_attack(&self, now: SimTime) -> bool {
        now >= self.ready_at()
    }

    pub fn cooldown_remaining(&self, now: SimTime) -> f32 {
        (self.ready_at() - now).max(0.0)
    }
}

/// A simulated entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub kind: AgentKind,
    pub faction: Faction,
    /// Owned by the registry's tile index; change through the registry
    pub(crate) coord: HexCoord,
    /// Interpolated position inside or between tiles
    pub world_pos: Vec2,
    pub vision_range: u32,
    pub can_move: bool,
    pub combat: Option<CombatStats>,
    /// Back-reference only: the hive owns its worker list
    pub home_hive: Option<AgentId>,
    /// Hive a queen is carrying during relocation
    pub carried_building: Option<AgentId>,
    pub invincible: bool,
}

impl Agent {
    pub fn new(kind: AgentKind, faction: Faction, coord: HexCoord) -> Self {
        Self {
            id: AgentId::new(),
            kind,
            faction,
            coord,
            world_pos: Vec2::default(),
            vision_range: 0,
            can_move: !kind.is_structure(),
            combat: None,
            home_hive: None,
            carried_building: None,
            invincible: false,
        }
    }

    /// Agent with stats and vision taken from config, placed at the tile center
    pub fn spawn(
        kind: AgentKind,
        faction: Faction,
        coord: HexCoord,
        config: &SimulationConfig,
        layout: &HexLayout,
    ) -> Self {
        let mut agent = Self::new(kind, faction, coord)
            .with_combat(CombatStats::from_profile(kind.combat_profile(config)))
            .with_vision(kind.vision_range(config));
        agent.world_pos = layout.to_world(coord);
        agent
    }

    pub fn with_combat(mut self, combat: CombatStats) -> Self {
        self.combat = Some(combat);
        self
    }

    pub fn with_vision(mut self, range: u32) -> Self {
        self.vision_range = range;
        self
    }

    pub fn with_home(mut self, hive: AgentId) -> Self {
        self.home_hive = Some(hive);
        self
    }

    pub fn coord(&self) -> HexCoord {
        self.coord
    }

    /// Agents without combat stats are never considered dead
    pub fn is_alive(&self) -> bool {
        self.combat.map(|c| c.is_alive()).unwrap_or(true)
    }

    pub fn is_hostile_to(&self, other: &Agent) -> bool {
        self.faction.is_hostile_to(other.faction)
    }

    /// Alive, hostile, attackable
    pub fn is_valid_target_for(&self, attacker: &Agent) -> bool {
        attacker.is_hostile_to(self) && self.combat.is_some() && self.is_alive() && !self.invincible
    }

    pub fn health(&self) -> Option<i32> {
        self.combat.map(|c| c.health)
    }
}
