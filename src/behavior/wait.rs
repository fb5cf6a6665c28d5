//! Suspension primitives for resumable tasks
//!
//! A task that has to "wait N seconds" keeps one of these in its state and
//! feeds it `dt` every time it is resumed.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Counts down to zero
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    /// Already expired
    pub fn done() -> Self {
        Self::new(0.0)
    }

    /// Random duration in `[min, max]`
    pub fn random<R: Rng>(rng: &mut R, min: f32, max: f32) -> Self {
        Self::new(random_delay(rng, min, max))
    }

    /// Advance; true once the countdown has expired
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
        self.is_done()
    }

    pub fn is_done(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}

/// Counts up; used to bound waits with a timeout
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stopwatch {
    elapsed: f32,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn exceeded(&self, limit: f32) -> bool {
        self.elapsed > limit
    }
}

/// Uniform delay in `[min, max]`; `min` when the range is empty
pub fn random_delay<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max <= min {
        return min.max(0.0);
    }
    rng.gen_range(min..=max)
}
