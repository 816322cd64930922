//! Machine resource, wear and brew timer state

use std::time::Instant;

use tracing::debug;

use crate::models::DrinkKind;

/// Base brewing time before any drink or machine adjustments
pub const BASE_BREW_TIME_S: f64 = 10.0;

/// Wear above which brewing slows down
const SLOW_BREW_WEAR: f64 = 50.0;
/// Wear above which the machine asks for service
const MAINTENANCE_WEAR: f64 = 70.0;
const MAX_WEAR: f64 = 100.0;

/// Ideal water temperature window (°C)
const OPTIMAL_TEMP: (f64, f64) = (90.0, 98.0);

/// Resource levels, wear and the in-progress brew of one machine.
///
/// Wear, waste and brew fields are private so the derived values
/// (`components_health`, `is_broken`, `needs_maintenance`) can't drift
/// from the levels they are computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineState {
    pub water: u32,
    pub coffee: u32,
    pub milk: u32,
    pub cups: u32,
    pub sugar: u32,
    pub temperature: f64,
    pub drinks_made: u32,
    pub total_drinks_made: u32,
    pub maintenance_count: u32,
    waste_level: u32,
    wear_level: f64,
    components_health: u32,
    is_brewing: bool,
    current_brew_s: f64,
    total_brew_s: f64,
    brew_started_at: Option<Instant>,
}

impl Default for MachineState {
    fn default() -> Self {
        MachineState {
            water: 1000,
            coffee: 500,
            milk: 1000,
            cups: 50,
            sugar: 200,
            temperature: 95.0,
            drinks_made: 0,
            total_drinks_made: 0,
            maintenance_count: 0,
            waste_level: 15,
            wear_level: 0.0,
            components_health: 100,
            is_brewing: false,
            current_brew_s: 0.0,
            total_brew_s: 0.0,
            brew_started_at: None,
        }
    }
}

impl MachineState {
    pub fn waste_level(&self) -> u32 {
        self.waste_level
    }

    pub fn wear_level(&self) -> f64 {
        self.wear_level
    }

    pub fn components_health(&self) -> u32 {
        self.components_health
    }

    pub fn is_broken(&self) -> bool {
        self.wear_level >= MAX_WEAR
    }

    pub fn needs_maintenance(&self) -> bool {
        self.wear_level > MAINTENANCE_WEAR
    }

    pub fn is_brewing(&self) -> bool {
        self.is_brewing
    }

    pub fn current_brew_s(&self) -> f64 {
        self.current_brew_s
    }

    pub fn total_brew_s(&self) -> f64 {
        self.total_brew_s
    }

    /// Set the waste level, clamped to 100%
    pub fn set_waste_level(&mut self, level: u32) {
        self.waste_level = level.min(100);
    }

    pub fn add_waste(&mut self, amount: u32) {
        self.set_waste_level(self.waste_level.saturating_add(amount));
    }

    pub fn increase_wear(&mut self, amount: f64) {
        self.wear_level = (self.wear_level + amount).min(MAX_WEAR);
        self.refresh_health();
    }

    pub fn reduce_wear(&mut self, amount: f64) {
        self.wear_level = (self.wear_level - amount).max(0.0);
        self.refresh_health();
    }

    fn refresh_health(&mut self) {
        let health = 100.0 - self.wear_level.floor();
        self.components_health = health.clamp(0.0, 100.0) as u32;
    }

    /// Brewing time in seconds for a drink on this machine, rounded to 0.1s
    pub fn calculate_brew_time(&self, kind: DrinkKind, sugar_level: u32) -> f64 {
        let mut time = BASE_BREW_TIME_S + kind.brew_bonus_s();

        if sugar_level > 0 {
            time += sugar_level as f64 * 0.5;
        }

        if self.wear_level > SLOW_BREW_WEAR {
            time += self.wear_level * 0.1;
        }

        if self.temperature < OPTIMAL_TEMP.0 || self.temperature > OPTIMAL_TEMP.1 {
            time += 2.0;
        }

        (time * 10.0).round() / 10.0
    }

    pub fn start_brewing(&mut self, total_s: f64, now: Instant) {
        debug!(total_s, "brew started");
        self.is_brewing = true;
        self.total_brew_s = total_s;
        self.current_brew_s = 0.0;
        self.brew_started_at = Some(now);
    }

    /// Advance the brew timer to `now`; finishes the brew once the full time has elapsed
    pub fn update_brew_progress(&mut self, now: Instant) {
        if !self.is_brewing {
            return;
        }
        let Some(started) = self.brew_started_at else {
            return;
        };

        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        self.current_brew_s = elapsed.min(self.total_brew_s);

        if self.current_brew_s >= self.total_brew_s {
            self.complete_brewing();
        }
    }

    pub fn complete_brewing(&mut self) {
        self.is_brewing = false;
        self.current_brew_s = self.total_brew_s;
        self.brew_started_at = None;
        debug!(total_s = self.total_brew_s, "brew complete");
    }

    /// Progress of the current (or last) brew in percent
    pub fn brew_progress_percent(&self) -> f64 {
        if self.total_brew_s > 0.0 {
            self.current_brew_s / self.total_brew_s * 100.0
        } else {
            0.0
        }
    }
}
