//! Brew, refill and maintenance operations
//!
//! Every operation checks its preconditions first and leaves the state
//! untouched when any of them fails. On success it reports the
//! postconditions it observed after mutating the state.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{MachineError, Result};
use crate::machine::MachineState;
use crate::models::{Conditions, DrinkKind, Ingredient, MaintenanceKind, ResourceCheck};
use crate::validator::{BrewingValidator, CRITICAL_WASTE};

const BASE_WEAR: f64 = 0.5;
const SUGAR_WEAR: f64 = 0.1;
const MILK_WEAR: f64 = 0.2;
const WASTE_PER_DRINK: u32 = 2;

/// Water temperature after a service cycle (°C)
const SERVICE_TEMPERATURE: f64 = 25.0;

/// Postconditions checked after every brew, in report order
pub const BREW_POSTCONDITIONS: [&str; 4] = [
    "drink made",
    "resources consumed",
    "drink counter increased",
    "waste increased",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrewOrder {
    pub kind: DrinkKind,
    pub sugar_level: u32,
    pub add_milk: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrewReport {
    pub order: BrewOrder,
    pub brew_time_s: f64,
    pub wear_added: f64,
    pub postconditions: Conditions,
}

/// Resource sufficiency for an order, in the form the WP analysis expects
pub fn resource_checks(state: &MachineState, order: &BrewOrder) -> Vec<ResourceCheck> {
    let recipe = order.kind.recipe();
    let check = |name: &str, current: u32, required: u32, satisfied: bool| ResourceCheck {
        name: name.to_string(),
        current: current.into(),
        required: required.into(),
        satisfied,
    };

    vec![
        check("water", state.water, recipe.water, state.water >= recipe.water),
        check("coffee", state.coffee, recipe.coffee, state.coffee >= recipe.coffee),
        check(
            "milk",
            state.milk,
            recipe.milk,
            !order.add_milk || state.milk >= recipe.milk,
        ),
        check("cups", state.cups, 1, state.cups > 0),
        check("sugar", state.sugar, order.sugar_level, state.sugar >= order.sugar_level),
    ]
}

fn wear_for(order: &BrewOrder) -> f64 {
    let mut wear = BASE_WEAR + order.kind.wear();
    if order.sugar_level > 0 {
        wear += SUGAR_WEAR * order.sugar_level as f64;
    }
    if order.add_milk {
        wear += MILK_WEAR;
    }
    wear
}

/// Brew one drink, driving the brew timer from `start` to the end of the brew
pub fn brew(
    state: &mut MachineState,
    validator: &BrewingValidator,
    order: BrewOrder,
    start: Instant,
) -> Result<BrewReport> {
    let validation = validator.validate(state, order.kind, order.sugar_level, order.add_milk);
    if !validation.is_valid {
        return Err(MachineError::PreconditionsFailed {
            operation: "brew",
            failed: validation.conditions.failed(),
        });
    }

    let before = state.clone();
    let recipe = order.kind.recipe();
    let brew_time_s = state.calculate_brew_time(order.kind, order.sugar_level);

    state.start_brewing(brew_time_s, start);
    // Jump straight to the end; a second jump absorbs nanosecond rounding.
    let duration = Duration::from_secs_f64(brew_time_s);
    let mut now = start;
    while state.is_brewing() {
        now += duration;
        state.update_brew_progress(now);
    }
    debug!(
        progress = state.brew_progress_percent(),
        elapsed_s = state.current_brew_s(),
        "brew timer finished"
    );

    // Validation guarantees none of these underflow.
    state.water -= recipe.water;
    state.coffee -= recipe.coffee;
    if order.add_milk {
        state.milk -= recipe.milk;
    }
    state.sugar -= order.sugar_level;
    state.cups -= 1;

    state.drinks_made += 1;
    state.total_drinks_made += 1;
    state.add_waste(WASTE_PER_DRINK);
    let wear_added = wear_for(&order);
    state.increase_wear(wear_added);

    let milk_used = if order.add_milk { recipe.milk } else { 0 };
    let mut postconditions = Conditions::new();
    postconditions.insert(
        BREW_POSTCONDITIONS[0],
        !state.is_brewing() && state.current_brew_s() >= brew_time_s,
    );
    postconditions.insert(
        BREW_POSTCONDITIONS[1],
        state.water == before.water - recipe.water
            && state.coffee == before.coffee - recipe.coffee
            && state.milk == before.milk - milk_used
            && state.sugar == before.sugar - order.sugar_level
            && state.cups == before.cups - 1,
    );
    postconditions.insert(BREW_POSTCONDITIONS[2], state.drinks_made == before.drinks_made + 1);
    postconditions.insert(BREW_POSTCONDITIONS[3], state.waste_level() > before.waste_level());

    info!(kind = %order.kind, brew_time_s, wear_added, "drink brewed");
    Ok(BrewReport {
        order,
        brew_time_s,
        wear_added,
        postconditions,
    })
}

/// Postconditions a brew would reach, computed on a copy of the state.
///
/// A brew that would be rejected reports every postcondition as unmet.
pub fn preview_brew(
    state: &MachineState,
    validator: &BrewingValidator,
    order: BrewOrder,
    start: Instant,
) -> Conditions {
    let mut scratch = state.clone();
    match brew(&mut scratch, validator, order, start) {
        Ok(report) => report.postconditions,
        Err(_) => BREW_POSTCONDITIONS.iter().map(|name| (*name, false)).collect(),
    }
}

/// How much to add during a refill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefillAmount {
    Exact(u32),
    ToMax,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefillReport {
    pub ingredient: Ingredient,
    pub before: u32,
    pub after: u32,
    pub added: u32,
    pub postconditions: Conditions,
}

fn level_mut(state: &mut MachineState, ingredient: Ingredient) -> &mut u32 {
    match ingredient {
        Ingredient::Water => &mut state.water,
        Ingredient::Coffee => &mut state.coffee,
        Ingredient::Milk => &mut state.milk,
        Ingredient::Cups => &mut state.cups,
        Ingredient::Sugar => &mut state.sugar,
    }
}

pub fn level(state: &MachineState, ingredient: Ingredient) -> u32 {
    match ingredient {
        Ingredient::Water => state.water,
        Ingredient::Coffee => state.coffee,
        Ingredient::Milk => state.milk,
        Ingredient::Cups => state.cups,
        Ingredient::Sugar => state.sugar,
    }
}

fn operational(state: &MachineState, conditions: &mut Conditions) {
    conditions.insert("machine not broken", !state.is_broken());
    conditions.insert("machine not brewing", !state.is_brewing());
    conditions.insert("waste level not critical", state.waste_level() < CRITICAL_WASTE);
}

pub fn refill_preconditions(state: &MachineState, ingredient: Ingredient, amount: RefillAmount) -> Conditions {
    let available = ingredient.capacity().saturating_sub(level(state, ingredient));

    let mut conditions = Conditions::new();
    operational(state, &mut conditions);
    match amount {
        RefillAmount::Exact(n) => {
            conditions.insert("amount positive", n > 0);
            conditions.insert("within capacity", n <= available);
        }
        RefillAmount::ToMax => {
            conditions.insert("capacity available", available > 0);
        }
    }
    conditions
}

pub fn refill(state: &mut MachineState, ingredient: Ingredient, amount: RefillAmount) -> Result<RefillReport> {
    let preconditions = refill_preconditions(state, ingredient, amount);
    if !preconditions.all_met() {
        return Err(MachineError::PreconditionsFailed {
            operation: "refill",
            failed: preconditions.failed(),
        });
    }

    let before = level(state, ingredient);
    let added = match amount {
        RefillAmount::Exact(n) => n,
        RefillAmount::ToMax => ingredient.capacity() - before,
    };
    *level_mut(state, ingredient) += added;
    let after = level(state, ingredient);

    let mut postconditions = Conditions::new();
    postconditions.insert("amount added", after == before + added);
    postconditions.insert("within capacity", after <= ingredient.capacity());

    info!(%ingredient, before, after, "refilled");
    Ok(RefillReport {
        ingredient,
        before,
        after,
        added,
        postconditions,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaintenanceRequest {
    pub kind: MaintenanceKind,
    /// Only honoured by deep cleaning
    pub drain_water: bool,
    pub reset_statistics: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceReport {
    pub request: MaintenanceRequest,
    pub wear_before: f64,
    pub wear_after: f64,
    pub postconditions: Conditions,
}

pub fn maintenance_preconditions(state: &MachineState) -> Conditions {
    let mut conditions = Conditions::new();
    conditions.insert("machine not brewing", !state.is_brewing());
    conditions.insert("waste present", state.waste_level() > 0);
    conditions
}

pub fn maintain(state: &mut MachineState, request: MaintenanceRequest) -> Result<MaintenanceReport> {
    let preconditions = maintenance_preconditions(state);
    if !preconditions.all_met() {
        return Err(MachineError::PreconditionsFailed {
            operation: "maintenance",
            failed: preconditions.failed(),
        });
    }

    let before = state.clone();
    let drains = request.drain_water && request.kind == MaintenanceKind::DeepCleaning;

    state.set_waste_level(0);
    state.temperature = SERVICE_TEMPERATURE;
    state.maintenance_count += 1;
    state.reduce_wear(request.kind.wear_reduction());
    if drains {
        state.water = 0;
    }
    if request.reset_statistics {
        state.drinks_made = 0;
    }

    let mut postconditions = Conditions::new();
    postconditions.insert("waste cleaned", state.waste_level() == 0);
    postconditions.insert("temperature reset", state.temperature <= 30.0);
    postconditions.insert(
        "maintenance count increased",
        state.maintenance_count == before.maintenance_count + 1,
    );
    postconditions.insert("water drained", !drains || state.water == 0);
    postconditions.insert("wear reduced", state.wear_level() <= before.wear_level());
    postconditions.insert(
        "health maintained",
        state.components_health() >= before.components_health(),
    );
    postconditions.insert("machine not broken", !state.is_broken());

    info!(kind = %request.kind, wear = state.wear_level(), "maintenance done");
    Ok(MaintenanceReport {
        request,
        wear_before: before.wear_level(),
        wear_after: state.wear_level(),
        postconditions,
    })
}
