//! Weakest-precondition analysis of a brewing order
//!
//! The WP of "brew drink d with sugar s" is approximated as the
//! conjunction of the brewing preconditions, resource sufficiency and two
//! numeric bounds (brew time, order cost). Postconditions are reported
//! but deliberately kept out of the formula and verdict: the WP describes
//! what must hold *before* brewing for the postconditions to follow.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{MachineError, Result};
use crate::machine::BASE_BREW_TIME_S;
use crate::models::{Conditions, DrinkKind, ResourceCheck};

pub const MAX_BREW_TIME_S: f64 = 60.0;
pub const MAX_COST: f64 = 500.0;
pub const BASE_PRICE_KEY: &str = "base";

const SUGAR_TIME_S: f64 = 0.5;
const SUGAR_PRICE: f64 = 5.0;

/// Price table used when none is supplied
pub fn default_prices() -> HashMap<String, f64> {
    HashMap::from([(BASE_PRICE_KEY.to_string(), 20.0)])
}

/// Everything the analysis looks at for one order
#[derive(Debug, Clone, Copy)]
pub struct WpRequest<'a> {
    pub preconditions: &'a Conditions,
    pub postconditions: &'a Conditions,
    pub kind: DrinkKind,
    pub sugar_level: u32,
    pub resources: &'a [ResourceCheck],
    pub prices: &'a HashMap<String, f64>,
}

fn within(value: f64, upper: f64) -> bool {
    value > 0.0 && value < upper
}

fn status(met: bool) -> &'static str {
    if met { "MET" } else { "NOT MET" }
}

fn holds(ok: bool) -> &'static str {
    if ok { "HOLDS" } else { "VIOLATED" }
}

/// Brew time without machine-dependent adjustments
pub fn total_time(kind: DrinkKind, sugar_level: u32, base_time: f64) -> f64 {
    let mut time = base_time + kind.brew_bonus_s();
    if sugar_level > 0 {
        time += sugar_level as f64 * SUGAR_TIME_S;
    }
    time
}

pub fn base_price(prices: &HashMap<String, f64>) -> Result<f64> {
    prices
        .get(BASE_PRICE_KEY)
        .copied()
        .ok_or_else(|| MachineError::MissingPrice(BASE_PRICE_KEY.to_string()))
}

pub fn total_cost(kind: DrinkKind, sugar_level: u32, prices: &HashMap<String, f64>) -> Result<f64> {
    let mut cost = base_price(prices)? + kind.surcharge();
    if sugar_level > 0 {
        cost += sugar_level as f64 * SUGAR_PRICE;
    }
    Ok(cost)
}

fn condition_section(title: &str, conditions: &Conditions) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}:\n", title));
    output.push_str(&format!("{}\n", "-".repeat(title.len() + 1)));

    for (name, met) in conditions.iter() {
        output.push_str(&format!("  - {}: {}\n", name, status(met)));
    }

    let summary = if conditions.all_met() {
        "ALL CONDITIONS MET"
    } else {
        "SOME CONDITIONS NOT MET"
    };
    output.push_str(&format!("\nRESULT: {}\n", summary));
    output
}

pub fn precondition_section(preconditions: &Conditions) -> String {
    condition_section("PRECONDITIONS", preconditions)
}

pub fn postcondition_section(postconditions: &Conditions) -> String {
    condition_section("POSTCONDITIONS", postconditions)
}

pub fn resource_section(resources: &[ResourceCheck]) -> String {
    let mut output = String::new();
    output.push_str("ORDER FEASIBILITY:\n");
    output.push_str("------------------\n");

    for r in resources {
        let verdict = if r.satisfied { "SUFFICIENT" } else { "INSUFFICIENT" };
        output.push_str(&format!("  - {}: {}/{} {}\n", r.name, r.current, r.required, verdict));
    }

    let all_met = resources.iter().all(|r| r.satisfied);
    let summary = if all_met {
        "ORDER POSSIBLE"
    } else {
        "ORDER IMPOSSIBLE - insufficient resources"
    };
    output.push_str(&format!("\nRESULT: {}\n", summary));

    output.push_str("\nINVARIANT: all resources >= 0\n");
    let non_negative = resources.iter().all(|r| r.current >= 0);
    output.push_str(&format!("   {}\n", holds(non_negative)));
    output
}

/// Step-by-step brew time computation with the time bound check
pub fn time_calculation_trace(kind: DrinkKind, sugar_level: u32, base_time: f64) -> String {
    let mut output = String::new();
    output.push_str("BREW TIME CALCULATION:\n");
    output.push_str("----------------------\n");
    output.push_str(&format!("  - Base time: {:.1} s\n", base_time));

    output.push_str("  - Contributions:\n");
    output.push_str(&format!(
        "    +{:.1} s ({} - {})\n",
        kind.brew_bonus_s(),
        kind,
        kind.brew_note()
    ));
    if sugar_level > 0 {
        output.push_str(&format!(
            "    +{:.1} s (sugar: {} portions)\n",
            sugar_level as f64 * SUGAR_TIME_S,
            sugar_level
        ));
    }

    let total = total_time(kind, sugar_level, base_time);
    output.push_str(&format!("\n  - TOTAL TIME: {:.1} s\n", total));
    output.push_str(&format!("\nINVARIANT: time > 0 && time < {:.0} s\n", MAX_BREW_TIME_S));
    output.push_str(&format!("   {}\n", holds(within(total, MAX_BREW_TIME_S))));
    output
}

/// Step-by-step order cost computation with the cost bound check
pub fn cost_calculation_trace(kind: DrinkKind, sugar_level: u32, prices: &HashMap<String, f64>) -> Result<String> {
    let base = base_price(prices)?;

    let mut output = String::new();
    output.push_str("COST CALCULATION:\n");
    output.push_str("-----------------\n");
    output.push_str(&format!("  - Base price: {:.2}\n", base));

    output.push_str("  - Components:\n");
    output.push_str(&format!("    +{:.2} ({})\n", kind.surcharge(), kind));
    if sugar_level > 0 {
        output.push_str(&format!(
            "    +{:.2} (sugar: {} portions)\n",
            sugar_level as f64 * SUGAR_PRICE,
            sugar_level
        ));
    }

    let total = total_cost(kind, sugar_level, prices)?;
    output.push_str(&format!("\n  - TOTAL COST: {:.2}\n", total));
    output.push_str(&format!("\nINVARIANT: cost > 0 && cost < {:.0}\n", MAX_COST));
    output.push_str(&format!("   {}\n", holds(within(total, MAX_COST))));
    Ok(output)
}

/// Textual WP formula. Postconditions never appear in it.
pub fn formula(req: &WpRequest<'_>) -> String {
    let pre_part = if req.preconditions.is_empty() {
        "TRUE".to_string()
    } else {
        req.preconditions
            .names()
            .map(|name| format!("({})", name))
            .collect::<Vec<_>>()
            .join(" ∧ ")
    };

    let resources_part = if req.resources.is_empty() {
        "TRUE".to_string()
    } else {
        req.resources
            .iter()
            .map(|r| format!("({}_available)", r.name))
            .collect::<Vec<_>>()
            .join(" ∧ ")
    };

    format!(
        "{} ∧ {} ∧ (0 < totalTime < {:.0}) ∧ (0 < totalCost < {:.0})",
        pre_part, resources_part, MAX_BREW_TIME_S, MAX_COST
    )
}

/// Evaluate the WP formula for this order
pub fn verdict(req: &WpRequest<'_>) -> Result<bool> {
    let pre_ok = req.preconditions.all_met();
    let resources_ok = req.resources.iter().all(|r| r.satisfied);
    let time_ok = within(total_time(req.kind, req.sugar_level, BASE_BREW_TIME_S), MAX_BREW_TIME_S);
    let cost_ok = within(total_cost(req.kind, req.sugar_level, req.prices)?, MAX_COST);

    debug!(pre_ok, resources_ok, time_ok, cost_ok, "wp verdict");
    Ok(pre_ok && resources_ok && time_ok && cost_ok)
}

/// Full WP report: sections, formula, verdict and a numbered breakdown
pub fn full_report(req: &WpRequest<'_>) -> Result<String> {
    let time = total_time(req.kind, req.sugar_level, BASE_BREW_TIME_S);
    let cost = total_cost(req.kind, req.sugar_level, req.prices)?;
    let overall = verdict(req)?;

    let mut output = String::new();
    output.push_str("FULL WP ANALYSIS OF THE BREWING ALGORITHM\n");
    output.push_str("=========================================\n\n");

    output.push_str(&precondition_section(req.preconditions));
    output.push('\n');
    output.push_str(&resource_section(req.resources));
    output.push('\n');
    output.push_str(&time_calculation_trace(req.kind, req.sugar_level, BASE_BREW_TIME_S));
    output.push('\n');
    output.push_str(&cost_calculation_trace(req.kind, req.sugar_level, req.prices)?);
    output.push('\n');
    output.push_str(&postcondition_section(req.postconditions));

    output.push_str(&format!("\nWP FORMULA: {}\n", formula(req)));
    output.push_str(&format!("\nOVERALL WP VERDICT: {}\n", holds(overall)));

    let resources_ok = req.resources.iter().all(|r| r.satisfied);
    output.push_str("\nSTEP-BY-STEP:\n");
    output.push_str(&format!(
        "1. Preconditions: {}/{} met -> {}\n",
        req.preconditions.iter().filter(|(_, met)| *met).count(),
        req.preconditions.len(),
        holds(req.preconditions.all_met())
    ));
    output.push_str(&format!(
        "2. Resources: {}/{} sufficient -> {}\n",
        req.resources.iter().filter(|r| r.satisfied).count(),
        req.resources.len(),
        holds(resources_ok)
    ));
    output.push_str(&format!(
        "3. Brew time: 0 < {:.1} < {:.0} -> {}\n",
        time,
        MAX_BREW_TIME_S,
        holds(within(time, MAX_BREW_TIME_S))
    ));
    output.push_str(&format!(
        "4. Cost: 0 < {:.2} < {:.0} -> {}\n",
        cost,
        MAX_COST,
        holds(within(cost, MAX_COST))
    ));
    output.push_str(&format!(
        "5. Formula: conjunction of {} preconditions, {} resources and 2 bounds\n",
        req.preconditions.len(),
        req.resources.len()
    ));
    output.push_str(&format!("6. Verdict: {}\n", holds(overall)));

    Ok(output)
}
