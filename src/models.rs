//! Data models for drinks, ingredients and analysis results

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::MachineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrinkKind {
    Espresso,
    Americano,
    Cappuccino,
    Latte,
}

impl DrinkKind {
    pub const ALL: [DrinkKind; 4] = [
        DrinkKind::Espresso,
        DrinkKind::Americano,
        DrinkKind::Cappuccino,
        DrinkKind::Latte,
    ];

    pub fn recipe(self) -> Recipe {
        match self {
            DrinkKind::Espresso => Recipe::new(50, 15, 0),
            DrinkKind::Americano => Recipe::new(150, 15, 0),
            DrinkKind::Cappuccino => Recipe::new(100, 15, 50),
            DrinkKind::Latte => Recipe::new(50, 15, 100),
        }
    }

    /// Extra brewing seconds on top of the base time
    pub fn brew_bonus_s(self) -> f64 {
        match self {
            DrinkKind::Espresso => 5.0,
            DrinkKind::Americano => 10.0,
            DrinkKind::Cappuccino => 15.0,
            DrinkKind::Latte => 18.0,
        }
    }

    /// Surcharge added to the base price
    pub fn surcharge(self) -> f64 {
        match self {
            DrinkKind::Espresso => 30.0,
            DrinkKind::Americano => 40.0,
            DrinkKind::Cappuccino => 50.0,
            DrinkKind::Latte => 55.0,
        }
    }

    /// Wear added per drink, on top of the base wear
    pub fn wear(self) -> f64 {
        match self {
            DrinkKind::Espresso => 0.1,
            DrinkKind::Americano => 0.2,
            DrinkKind::Cappuccino => 0.3,
            DrinkKind::Latte => 0.4,
        }
    }

    /// Short reason shown next to the brew time bonus
    pub fn brew_note(self) -> &'static str {
        match self {
            DrinkKind::Espresso => "fast extraction",
            DrinkKind::Americano => "water top-up",
            DrinkKind::Cappuccino => "milk frothing",
            DrinkKind::Latte => "layered preparation",
        }
    }

    /// Black coffees where adding milk is a recipe mismatch
    pub fn is_black(self) -> bool {
        matches!(self, DrinkKind::Espresso | DrinkKind::Americano)
    }
}

impl fmt::Display for DrinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DrinkKind::Espresso => "Espresso",
            DrinkKind::Americano => "Americano",
            DrinkKind::Cappuccino => "Cappuccino",
            DrinkKind::Latte => "Latte",
        };
        f.write_str(name)
    }
}

impl FromStr for DrinkKind {
    type Err = MachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "espresso" => Ok(DrinkKind::Espresso),
            "americano" => Ok(DrinkKind::Americano),
            "cappuccino" => Ok(DrinkKind::Cappuccino),
            "latte" => Ok(DrinkKind::Latte),
            _ => Err(MachineError::UnknownDrink(s.to_string())),
        }
    }
}

/// Ingredient amounts needed for one drink (ml / g)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipe {
    pub water: u32,
    pub coffee: u32,
    pub milk: u32,
}

impl Recipe {
    const fn new(water: u32, coffee: u32, milk: u32) -> Self {
        Recipe { water, coffee, milk }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingredient {
    Water,
    Coffee,
    Milk,
    Cups,
    Sugar,
}

impl Ingredient {
    pub fn capacity(self) -> u32 {
        match self {
            Ingredient::Water => 2000,
            Ingredient::Coffee => 500,
            Ingredient::Milk => 1000,
            Ingredient::Cups => 50,
            Ingredient::Sugar => 200,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Ingredient::Water | Ingredient::Milk => "ml",
            Ingredient::Coffee | Ingredient::Sugar => "g",
            Ingredient::Cups => "pcs",
        }
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Ingredient::Water => "water",
            Ingredient::Coffee => "coffee",
            Ingredient::Milk => "milk",
            Ingredient::Cups => "cups",
            Ingredient::Sugar => "sugar",
        };
        f.write_str(name)
    }
}

impl FromStr for Ingredient {
    type Err = MachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "water" => Ok(Ingredient::Water),
            "coffee" => Ok(Ingredient::Coffee),
            "milk" => Ok(Ingredient::Milk),
            "cups" | "cup" => Ok(Ingredient::Cups),
            "sugar" => Ok(Ingredient::Sugar),
            _ => Err(MachineError::UnknownIngredient(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceKind {
    Cleaning,
    DeepCleaning,
    Calibration,
    Diagnostic,
}

impl MaintenanceKind {
    /// Wear removed by one service of this kind
    pub fn wear_reduction(self) -> f64 {
        match self {
            MaintenanceKind::Cleaning => 15.0,
            MaintenanceKind::DeepCleaning => 30.0,
            MaintenanceKind::Calibration => 20.0,
            MaintenanceKind::Diagnostic => 10.0,
        }
    }
}

impl fmt::Display for MaintenanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MaintenanceKind::Cleaning => "cleaning",
            MaintenanceKind::DeepCleaning => "deep cleaning",
            MaintenanceKind::Calibration => "calibration",
            MaintenanceKind::Diagnostic => "diagnostic",
        };
        f.write_str(name)
    }
}

impl FromStr for MaintenanceKind {
    type Err = MachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "cleaning" => Ok(MaintenanceKind::Cleaning),
            "deep-cleaning" | "deep" => Ok(MaintenanceKind::DeepCleaning),
            "calibration" => Ok(MaintenanceKind::Calibration),
            "diagnostic" => Ok(MaintenanceKind::Diagnostic),
            _ => Err(MachineError::UnknownMaintenance(s.to_string())),
        }
    }
}

/// Named boolean checks in the order they were evaluated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    entries: Vec<(String, bool)>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a check. Re-inserting a name overwrites it in place.
    pub fn insert(&mut self, name: impl Into<String>, met: bool) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = met,
            None => self.entries.push((name, met)),
        }
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, met)| *met)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(n, met)| (n.as_str(), *met))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn all_met(&self) -> bool {
        self.entries.iter().all(|(_, met)| *met)
    }

    pub fn failed(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, met)| !*met)
            .map(|(n, _)| n.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for Conditions {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        let mut conditions = Conditions::new();
        for (name, met) in iter {
            conditions.insert(name, met);
        }
        conditions
    }
}

/// Availability of a single resource for an order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceCheck {
    pub name: String,
    pub current: i64,
    pub required: i64,
    pub satisfied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrewingValidationResult {
    pub is_valid: bool,
    pub conditions: Conditions,
}

/// How a simulated loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    Completed,
    SafetyAborted,
}

/// Result of running one cyclic process through the analyzer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleAnalysisResult {
    pub invariant_maintained: bool,
    pub variant_valid: bool,
    pub iterations: usize,
    pub outcome: CycleOutcome,
    /// The loop's main variable once it stopped (temperature, waste, tests passed)
    pub final_value: f64,
    pub steps: Vec<String>,
    pub conclusion: String,
}

impl CycleAnalysisResult {
    pub fn conclusion_for(invariant_maintained: bool, variant_valid: bool) -> &'static str {
        if invariant_maintained && variant_valid {
            "Loop is correct: invariant maintained, variant decreases"
        } else {
            "Loop contains errors"
        }
    }

    pub fn is_correct(&self) -> bool {
        self.invariant_maintained && self.variant_valid
    }
}

/// Human-readable description of a cyclic process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleProcess {
    pub name: String,
    pub code: String,
    pub invariant: String,
    pub variant: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drink_parsing_is_case_insensitive() {
        assert_eq!("Latte".parse::<DrinkKind>(), Ok(DrinkKind::Latte));
        assert_eq!(" espresso ".parse::<DrinkKind>(), Ok(DrinkKind::Espresso));
    }

    #[test]
    fn unknown_drink_is_rejected() {
        assert_eq!(
            "mocha".parse::<DrinkKind>(),
            Err(MachineError::UnknownDrink("mocha".to_string()))
        );
    }

    #[test]
    fn recipes_match_menu() {
        assert_eq!(DrinkKind::Americano.recipe(), Recipe::new(150, 15, 0));
        assert_eq!(DrinkKind::Latte.recipe().milk, 100);
        assert!(DrinkKind::ALL.iter().all(|k| k.recipe().coffee == 15));
    }

    #[test]
    fn maintenance_aliases() {
        assert_eq!(
            "deep_cleaning".parse::<MaintenanceKind>(),
            Ok(MaintenanceKind::DeepCleaning)
        );
        assert!("polish".parse::<MaintenanceKind>().is_err());
    }

    #[test]
    fn conditions_keep_insertion_order() {
        let mut c = Conditions::new();
        c.insert("b", true);
        c.insert("a", false);
        c.insert("b", false);
        assert_eq!(c.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(c.get("b"), Some(false));
        assert_eq!(c.failed(), vec!["b".to_string(), "a".to_string()]);
        assert!(!c.all_met());
    }

    #[test]
    fn empty_conditions_are_vacuously_met() {
        assert!(Conditions::new().all_met());
    }
}
