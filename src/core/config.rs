//! Simulation configuration with documented constants
//!
//! All tunable numbers are collected here. The config is owned by the
//! `World` and handed by reference to every component that needs it; there
//! is no global instance.
//!
//! Every section is `#[serde(default)]`, so a TOML file only needs to name
//! the values it overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{HiveError, Result};

/// Hex layout and default map size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Distance from a hex center to any of its corners (world units)
    pub hex_size: f32,
    /// Radius of the generated hexagonal map, in tiles
    pub map_radius: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            hex_size: 1.0,
            map_radius: 12,
        }
    }
}

/// Agent travel speeds and arrival tolerances
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// World units per second
    pub worker_speed: f32,
    pub queen_speed: f32,
    pub wasp_speed: f32,
    /// Distance to a tile center that counts as "arrived"
    pub arrival_epsilon: f32,
    /// Max offset of an in-tile nudge, as a fraction of `hex_size`
    ///
    /// Kept under 0.5 so a nudge never leaves the current tile.
    pub nudge_fraction: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            worker_speed: 2.0,
            queen_speed: 1.5,
            wasp_speed: 2.2,
            arrival_epsilon: 0.05,
            nudge_fraction: 0.3,
        }
    }
}

/// Worker behaviour timings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Seconds spent working a tile before withdrawing resources
    pub gather_duration: f32,
    /// Max resource units withdrawn per gather
    pub gather_amount: u32,
    /// Pause after a delivery before heading back to the source tile
    pub regather_cooldown: f32,
    /// Interval between in-tile nudges while gathering
    pub gather_nudge_interval: f32,
    /// Randomized delay between idle nudges
    pub idle_nudge_min: f32,
    pub idle_nudge_max: f32,
    /// Upper bound on a Moving wait before falling back to Idle
    pub move_timeout: f32,
    /// Upper bound on an Attacking loop before redirecting home
    pub attack_timeout: f32,
    /// How often a follower re-paths toward its queen
    pub follow_repath_interval: f32,
    /// Randomized pause between scouting legs
    pub scout_wait_min: f32,
    pub scout_wait_max: f32,
    /// How far from its current tile a homeless scout picks the next leg
    pub scout_radius: u32,
    pub vision_range: u32,
    pub guard_vision_range: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            gather_duration: 3.0,
            gather_amount: 3,
            regather_cooldown: 0.5,
            gather_nudge_interval: 1.0,
            idle_nudge_min: 1.0,
            idle_nudge_max: 3.0,
            move_timeout: 15.0,
            attack_timeout: 30.0,
            follow_repath_interval: 0.5,
            scout_wait_min: 1.0,
            scout_wait_max: 3.0,
            scout_radius: 3,
            vision_range: 2,
            guard_vision_range: 3,
        }
    }
}

/// Combat stats for one kind of agent
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CombatProfile {
    pub max_health: i32,
    pub attack: i32,
    /// Seconds between successful attacks
    pub cooldown: f32,
}

impl CombatProfile {
    pub const fn new(max_health: i32, attack: i32, cooldown: f32) -> Self {
        Self {
            max_health,
            attack,
            cooldown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub worker: CombatProfile,
    pub guard: CombatProfile,
    pub queen: CombatProfile,
    pub hive: CombatProfile,
    pub wasp: CombatProfile,
    pub wasp_hive: CombatProfile,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            worker: CombatProfile::new(10, 2, 1.0),
            guard: CombatProfile::new(30, 4, 1.0),
            queen: CombatProfile::new(40, 3, 1.2),
            hive: CombatProfile::new(100, 2, 1.5),
            wasp: CombatProfile::new(12, 3, 1.0),
            wasp_hive: CombatProfile::new(80, 2, 1.5),
        }
    }
}

/// Hive spawning, relocation and tech costs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HiveConfig {
    pub max_workers: usize,
    /// Seconds between worker spawns while under the cap
    pub spawn_interval: f32,
    pub spawn_cost: u32,
    pub activity_radius: u32,
    pub vision_range: u32,
    /// Uninterrupted seconds the queen must hold still to lift or land
    pub cast_duration: f32,
    pub build_cost: u32,
    pub starting_resources: u32,
    /// Each gather-speed level multiplies gather duration by this factor
    pub gather_tech_factor: f32,
    pub gather_tech_min_duration: f32,
    pub gather_tech_cost: u32,
    pub radius_tech_cost: u32,
    pub max_radius_level: u32,
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            max_workers: 8,
            spawn_interval: 5.0,
            spawn_cost: 5,
            activity_radius: 5,
            vision_range: 3,
            cast_duration: 3.0,
            build_cost: 20,
            starting_resources: 50,
            gather_tech_factor: 0.8,
            gather_tech_min_duration: 1.0,
            gather_tech_cost: 20,
            radius_tech_cost: 30,
            max_radius_level: 5,
        }
    }
}

/// Enemy AI cadence and wave sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub vision_range: u32,
    /// Randomized periodic target re-scan interval
    pub rescan_min: f32,
    pub rescan_max: f32,
    pub wave_interval: f32,
    pub wave_size: usize,
    pub wave_growth: usize,
    pub wave_max_size: usize,
    /// Wasp hive guard spawning
    pub guard_spawn_interval: f32,
    pub guard_max: usize,
    pub hive_activity_radius: u32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            vision_range: 4,
            rescan_min: 0.5,
            rescan_max: 1.0,
            wave_interval: 30.0,
            wave_size: 2,
            wave_growth: 1,
            wave_max_size: 8,
            guard_spawn_interval: 8.0,
            guard_max: 4,
            hive_activity_radius: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Vision sources above this count compute their disks with rayon
    pub parallel_threshold: usize,
    pub queen_vision_range: u32,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 256,
            queen_vision_range: 3,
        }
    }
}

/// Configuration for the simulation systems
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    pub movement: MovementConfig,
    pub worker: WorkerConfig,
    pub combat: CombatConfig,
    pub hive: HiveConfig,
    pub enemy: EnemyConfig,
    pub visibility: VisibilityConfig,
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.grid.hex_size <= 0.0 {
            return Err(HiveError::Config("grid.hex_size must be positive".into()));
        }

        let m = &self.movement;
        if m.worker_speed <= 0.0 || m.queen_speed <= 0.0 || m.wasp_speed <= 0.0 {
            return Err(HiveError::Config("movement speeds must be positive".into()));
        }
        if !(0.0..0.5).contains(&m.nudge_fraction) {
            return Err(HiveError::Config(format!(
                "movement.nudge_fraction ({}) must be in [0, 0.5)",
                m.nudge_fraction
            )));
        }

        let w = &self.worker;
        check_range("worker.idle_nudge", w.idle_nudge_min, w.idle_nudge_max)?;
        check_range("worker.scout_wait", w.scout_wait_min, w.scout_wait_max)?;
        check_range("enemy.rescan", self.enemy.rescan_min, self.enemy.rescan_max)?;

        if w.gather_duration <= 0.0 || w.move_timeout <= 0.0 || w.attack_timeout <= 0.0 {
            return Err(HiveError::Config(
                "worker durations and timeouts must be positive".into(),
            ));
        }
        if w.gather_amount == 0 {
            return Err(HiveError::Config("worker.gather_amount must be nonzero".into()));
        }

        let h = &self.hive;
        if h.spawn_interval <= 0.0 || h.cast_duration <= 0.0 {
            return Err(HiveError::Config(
                "hive.spawn_interval and hive.cast_duration must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&h.gather_tech_factor) || h.gather_tech_factor == 0.0 {
            return Err(HiveError::Config(format!(
                "hive.gather_tech_factor ({}) must be in (0, 1]",
                h.gather_tech_factor
            )));
        }

        if self.enemy.wave_interval <= 0.0 || self.enemy.guard_spawn_interval <= 0.0 {
            return Err(HiveError::Config("enemy intervals must be positive".into()));
        }

        Ok(())
    }
}

fn check_range(name: &str, min: f32, max: f32) -> Result<()> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
        return Err(HiveError::Config(format!(
            "{}_min ({}) must be finite, >= 0 and <= {}_max ({})",
            name, min, name, max
        )));
    }
    Ok(())
}
