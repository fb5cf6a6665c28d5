//! Change notifications for the UI layer
//!
//! The core appends events as things happen; the UI drains them. The core
//! never calls into UI code.

use serde::{Deserialize, Serialize};

use crate::agents::agent::AgentKind;
use crate::core::types::{AgentId, Faction, SimTime, Tick};
use crate::grid::hex::HexCoord;
use crate::hive::colony::CastGoal;

/// Timestamped event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: Tick,
    pub time: SimTime,
    pub kind: SimEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEventKind {
    Spawned {
        agent: AgentId,
        kind: AgentKind,
        faction: Faction,
        at: HexCoord,
    },
    Despawned {
        agent: AgentId,
        kind: AgentKind,
    },
    StateChanged {
        agent: AgentId,
        from: String,
        to: String,
    },
    Attacked {
        attacker: AgentId,
        defender: AgentId,
        damage: i32,
        remaining: i32,
    },
    ResourcesDelivered {
        agent: AgentId,
        faction: Faction,
        amount: u32,
    },
    CommandRejected {
        agent: AgentId,
        reason: String,
    },
    PathFailed {
        agent: AgentId,
        from: HexCoord,
        to: HexCoord,
    },
    TaskTimedOut {
        agent: AgentId,
        state: String,
    },
    CastStarted {
        hive: AgentId,
        goal: CastGoal,
    },
    CastCancelled {
        hive: AgentId,
        goal: CastGoal,
    },
    CastCompleted {
        hive: AgentId,
        goal: CastGoal,
        at: HexCoord,
    },
    WaveLaunched {
        size: usize,
        at: HexCoord,
    },
    StructureDiscovered {
        agent: AgentId,
        at: HexCoord,
    },
    HiveDestroyed {
        hive: AgentId,
        faction: Faction,
    },
}

/// Append-only buffer drained by observers
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
    tick: Tick,
    time: SimTime,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp subsequent events with this tick and time
    pub(crate) fn set_clock(&mut self, tick: Tick, time: SimTime) {
        self.tick = tick;
        self.time = time;
    }

    pub fn push(&mut self, kind: SimEventKind) {
        self.events.push(SimEvent {
            tick: self.tick,
            time: self.time,
            kind,
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    /// Take all pending events
    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}
