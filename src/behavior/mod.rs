//! Resumable per-agent tasks

pub mod context;
pub mod wait;
pub mod worker;

pub use context::{Body, TaskContext};
pub use wait::{Countdown, Stopwatch};
pub use worker::{GatherPhase, MoveIntent, Resume, ScoutPhase, WorkerBrain, WorkerState};
