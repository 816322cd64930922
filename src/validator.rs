//! Brewing precondition checks

use crate::machine::MachineState;
use crate::models::{BrewingValidationResult, Conditions, DrinkKind};

/// Waste percentage at which brewing is refused
pub const CRITICAL_WASTE: u32 = 90;

/// Whether milk may be added to black coffees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MilkPolicy {
    #[default]
    Permissive,
    /// Espresso and Americano are served black only
    RejectForBlackCoffee,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BrewingValidator {
    pub milk_policy: MilkPolicy,
}

impl BrewingValidator {
    pub fn new(milk_policy: MilkPolicy) -> Self {
        BrewingValidator { milk_policy }
    }

    /// Evaluate every brewing precondition against the current state.
    ///
    /// Never mutates the machine; the result is valid only if every entry holds.
    pub fn validate(
        &self,
        state: &MachineState,
        kind: DrinkKind,
        sugar_level: u32,
        add_milk: bool,
    ) -> BrewingValidationResult {
        let recipe = kind.recipe();

        let mut conditions = Conditions::new();
        conditions.insert("machine not broken", !state.is_broken());
        conditions.insert("machine not brewing", !state.is_brewing());
        conditions.insert("waste level not critical", state.waste_level() < CRITICAL_WASTE);
        conditions.insert("enough water", state.water >= recipe.water);
        conditions.insert("enough coffee", state.coffee >= recipe.coffee);
        conditions.insert("enough milk", !add_milk || state.milk >= recipe.milk);
        conditions.insert("cups available", state.cups > 0);
        conditions.insert("enough sugar", state.sugar >= sugar_level);

        if self.milk_policy == MilkPolicy::RejectForBlackCoffee {
            conditions.insert("milk compatible with drink", !(add_milk && kind.is_black()));
        }

        BrewingValidationResult {
            is_valid: conditions.all_met(),
            conditions,
        }
    }
}
