//! Agents and the live-agent registry

pub mod agent;
pub mod registry;

pub use agent::{Agent, AgentKind, CombatStats};
pub use registry::AgentRegistry;
