//! World state, per-tick services and command injection

pub mod combat;
pub mod commands;
pub mod events;
pub mod movement;
pub mod visibility;
pub mod world;

pub use commands::CommandTarget;
pub use events::{EventLog, SimEvent, SimEventKind};
pub use movement::{MovementExecutor, MovementStep};
pub use visibility::VisibilityAggregator;
pub use world::{HiveSummary, World, WorldSummary};
