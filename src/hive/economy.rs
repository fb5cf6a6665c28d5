//! Faction stockpiles and tech upgrades

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::HiveConfig;
use crate::core::types::Faction;

/// Purchased upgrade levels for one faction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechLevels {
    pub gather_speed: u32,
    pub activity_radius: u32,
}

/// Resource stockpiles per faction, plus tech
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Economy {
    stockpiles: AHashMap<Faction, u32>,
    tech: AHashMap<Faction, TechLevels>,
    /// Set whenever a stockpile changes; cleared by whoever renders it
    dirty: bool,
}

impl Economy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current amount in a faction's stockpile
    pub fn resources(&self, faction: Faction) -> u32 {
        self.stockpiles.get(&faction).copied().unwrap_or(0)
    }

    pub fn add_resources(&mut self, faction: Faction, amount: u32) {
        if amount == 0 {
            return;
        }
        let entry = self.stockpiles.entry(faction).or_insert(0);
        *entry = entry.saturating_add(amount);
        self.dirty = true;
    }

    pub fn has_resources(&self, faction: Faction, amount: u32) -> bool {
        self.resources(faction) >= amount
    }

    /// Spend if affordable, returns true if successful
    pub fn try_spend_resources(&mut self, faction: Faction, amount: u32) -> bool {
        if !self.has_resources(faction, amount) {
            return false;
        }
        if amount > 0 {
            if let Some(entry) = self.stockpiles.get_mut(&faction) {
                *entry -= amount;
            }
            self.dirty = true;
        }
        true
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the previous dirty state
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn tech(&self, faction: Faction) -> TechLevels {
        self.tech.get(&faction).copied().unwrap_or_default()
    }

    /// Gather duration after gather-speed upgrades
    pub fn gather_duration(&self, faction: Faction, base: f32, config: &HiveConfig) -> f32 {
        let level = self.tech(faction).gather_speed as i32;
        let scaled = base * config.gather_tech_factor.powi(level);
        scaled.max(config.gather_tech_min_duration.min(base))
    }

    /// Extra tiles of activity radius from upgrades
    pub fn radius_bonus(&self, faction: Faction) -> u32 {
        self.tech(faction).activity_radius
    }

    /// Buy one gather-speed level
    pub fn upgrade_gather_speed(&mut self, faction: Faction, config: &HiveConfig) -> bool {
        if !self.try_spend_resources(faction, config.gather_tech_cost) {
            return false;
        }
        self.tech.entry(faction).or_default().gather_speed += 1;
        true
    }

    /// Buy one activity-radius level, capped at `max_radius_level`
    pub fn upgrade_activity_radius(&mut self, faction: Faction, config: &HiveConfig) -> bool {
        if self.tech(faction).activity_radius >= config.max_radius_level {
            return false;
        }
        if !self.try_spend_resources(faction, config.radius_tech_cost) {
            return false;
        }
        self.tech.entry(faction).or_default().activity_radius += 1;
        true
    }
}
