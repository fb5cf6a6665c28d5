use thiserror::Error;

use crate::core::types::AgentId;
use crate::grid::hex::HexCoord;

#[derive(Error, Debug)]
pub enum HiveError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No path from {from:?} to {to:?}")]
    Unreachable { from: HexCoord, to: HexCoord },

    #[error("Agent {agent} timed out in {state} after {seconds:.1}s")]
    Timeout {
        agent: AgentId,
        state: String,
        seconds: f32,
    },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Command rejected: {0}")]
    Rejected(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HiveError {
    pub fn agent_not_found(id: AgentId) -> Self {
        HiveError::NotFound(format!("agent {}", id))
    }

    pub fn tile_not_found(coord: HexCoord) -> Self {
        HiveError::NotFound(format!("tile ({}, {})", coord.q, coord.r))
    }
}

pub type Result<T> = std::result::Result<T, HiveError>;
