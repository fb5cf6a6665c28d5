//! Hive economy: activity radius policy, stockpiles, spawning, relocation

pub mod activity;
pub mod colony;
pub mod economy;

pub use activity::{in_range, Authority, ALWAYS_ALLOWED_DISTANCE};
pub use colony::{CastGoal, CastProgress, Hive, HiveRegistry, RelocationState};
pub use economy::{Economy, TechLevels};
