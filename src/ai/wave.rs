//! Periodic raid waves
//!
//! Each wave is bigger than the last until the configured cap.

use serde::{Deserialize, Serialize};

use crate::behavior::wait::Countdown;
use crate::core::config::EnemyConfig;
use crate::grid::hex::HexCoord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveSpawner {
    pub spawn_at: HexCoord,
    timer: Countdown,
    interval: f32,
    next_size: usize,
    growth: usize,
    max_size: usize,
    launched: u32,
}

impl WaveSpawner {
    pub fn new(spawn_at: HexCoord, config: &EnemyConfig) -> Self {
        Self {
            spawn_at,
            timer: Countdown::new(config.wave_interval),
            interval: config.wave_interval,
            next_size: config.wave_size.min(config.wave_max_size),
            growth: config.wave_growth,
            max_size: config.wave_max_size,
            launched: 0,
        }
    }

    /// Advance the timer; returns the size of a wave due this tick
    pub fn tick(&mut self, dt: f32) -> Option<usize> {
        if !self.timer.tick(dt) {
            return None;
        }
        let size = self.next_size;
        self.next_size = (self.next_size + self.growth).min(self.max_size);
        self.timer = Countdown::new(self.interval);
        self.launched += 1;
        Some(size)
    }

    pub fn next_size(&self) -> usize {
        self.next_size
    }

    pub fn waves_launched(&self) -> u32 {
        self.launched
    }

    pub fn time_to_next(&self) -> f32 {
        self.timer.remaining()
    }
}
