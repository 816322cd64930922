//! Logical controller view of the machine: operating mode and notifications

use std::fmt;

use crate::machine::MachineState;
use crate::validator::CRITICAL_WASTE;

const HEATED_TEMP: f64 = 90.0;
const DIRTY_WASTE: u32 = 80;
const LOW_WATER: u32 = 200;
const LOW_COFFEE: u32 = 50;
const LOW_CUPS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    Normal,
    Maintenance,
    Error,
    Standby,
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationMode::Normal => "normal",
            OperationMode::Maintenance => "maintenance",
            OperationMode::Error => "error",
            OperationMode::Standby => "standby",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub priority: Priority,
    pub message: &'static str,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.priority {
            Priority::Critical => "CRITICAL",
            Priority::Warning => "WARNING",
            Priority::Info => "INFO",
        };
        write!(f, "{}: {}", tag, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MachineStatus {
    pub has_water: bool,
    pub has_coffee: bool,
    pub has_cups: bool,
    pub has_milk: bool,
    pub is_heated: bool,
    pub is_clean: bool,
    pub can_operate: bool,
    pub mode: OperationMode,
    pub notifications: Vec<Notification>,
    pub wear_level: f64,
    pub components_health: u32,
}

impl MachineStatus {
    pub fn from_state(state: &MachineState) -> Self {
        let has_water = state.water > 0;
        let has_coffee = state.coffee > 0;
        let has_cups = state.cups > 0;
        let is_heated = state.temperature >= HEATED_TEMP;
        let is_clean = state.waste_level() < DIRTY_WASTE;

        MachineStatus {
            has_water,
            has_coffee,
            has_cups,
            has_milk: state.milk > 0,
            is_heated,
            is_clean,
            can_operate: has_water
                && has_coffee
                && has_cups
                && is_heated
                && is_clean
                && !state.is_broken()
                && !state.is_brewing(),
            mode: mode_for(state),
            notifications: notifications_for(state),
            wear_level: state.wear_level(),
            components_health: state.components_health(),
        }
    }

    pub fn has(&self, priority: Priority) -> bool {
        self.notifications.iter().any(|n| n.priority == priority)
    }
}

fn mode_for(state: &MachineState) -> OperationMode {
    if state.is_broken() {
        OperationMode::Error
    } else if state.needs_maintenance() {
        OperationMode::Maintenance
    } else if state.is_brewing() {
        OperationMode::Standby
    } else if state.waste_level() >= CRITICAL_WASTE {
        OperationMode::Maintenance
    } else {
        OperationMode::Normal
    }
}

fn notifications_for(state: &MachineState) -> Vec<Notification> {
    let checks = [
        (state.is_broken(), Priority::Critical, "machine is broken, repair required"),
        (state.water == 0, Priority::Critical, "out of water"),
        (state.coffee == 0, Priority::Critical, "out of coffee"),
        (state.cups == 0, Priority::Critical, "out of cups"),
        (state.needs_maintenance(), Priority::Warning, "high wear, maintenance required"),
        (state.waste_level() >= DIRTY_WASTE, Priority::Warning, "waste level high"),
        (state.water < LOW_WATER, Priority::Warning, "water low"),
        (state.coffee < LOW_COFFEE, Priority::Warning, "coffee low"),
        (state.cups < LOW_CUPS, Priority::Warning, "cups low"),
    ];

    let mut notifications: Vec<Notification> = checks
        .into_iter()
        .filter(|(raised, _, _)| *raised)
        .map(|(_, priority, message)| Notification { priority, message })
        .collect();

    let closing = if notifications.is_empty() {
        "all systems nominal"
    } else {
        "review the notifications above"
    };
    notifications.push(Notification {
        priority: Priority::Info,
        message: closing,
    });
    notifications
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Machine State ===")?;
        writeln!(f, "Mode: {}", self.mode)?;
        writeln!(f, "Wear: {:.1}% (health {}%)", self.wear_level, self.components_health)?;
        writeln!(f)?;

        writeln!(f, "Logical variables:")?;
        writeln!(f, "  HasWater:  {}", self.has_water)?;
        writeln!(f, "  HasCoffee: {}", self.has_coffee)?;
        writeln!(f, "  HasCups:   {}", self.has_cups)?;
        writeln!(f, "  HasMilk:   {}", self.has_milk)?;
        writeln!(f, "  IsHeated:  {}", self.is_heated)?;
        writeln!(f, "  IsClean:   {}", self.is_clean)?;
        writeln!(f)?;

        writeln!(
            f,
            "CanOperate = HasWater ∧ HasCoffee ∧ HasCups ∧ IsHeated ∧ IsClean ∧ ¬broken ∧ ¬brewing = {}",
            self.can_operate
        )?;
        writeln!(f)?;

        writeln!(f, "Notifications:")?;
        for n in &self.notifications {
            writeln!(f, "  - {}", n)?;
        }

        Ok(())
    }
}
