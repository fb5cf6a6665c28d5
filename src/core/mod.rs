pub mod config;
pub mod error;
pub mod types;

pub use config::SimulationConfig;
pub use error::{HiveError, Result};
pub use types::{AgentId, Faction, SimClock, SimTime, Tick, Vec2};
