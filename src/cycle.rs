//! Loop invariant / variant analysis of the machine's cyclic processes
//!
//! Each process is a bounded while-loop. The analyzer runs it to
//! completion, checking the invariant on both sides of every iteration
//! and that the variant strictly decreases, and records a step-by-step
//! trace. Violations are findings, not errors: the run always finishes
//! and reports them through the result flags.

use tracing::{debug, info, warn};

use crate::error::{MachineError, Result};
use crate::models::{CycleAnalysisResult, CycleOutcome, CycleProcess};

/// Iteration ceiling for processes that cannot bound their own loop
pub const MAX_ITERATIONS: usize = 100_000;

/// What a single loop body did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step<S> {
    Continue(S),
    /// A safety condition stopped the loop early
    Abort(S),
}

/// A bounded loop the analyzer can simulate.
pub trait CyclicProcess {
    type State: Copy;

    fn name(&self) -> &'static str;

    /// Reject parameters that would make the loop meaningless or endless
    fn check_parameters(&self) -> Result<()>;

    fn initial(&self) -> Self::State;

    fn guard(&self, state: Self::State) -> bool;

    fn invariant(&self, state: Self::State) -> bool;

    fn variant(&self, state: Self::State) -> f64;

    /// Upper bound on iterations, known before the loop starts.
    ///
    /// `None` means the analyzer falls back to [`MAX_ITERATIONS`].
    fn iteration_bound(&self) -> Option<usize> {
        None
    }

    /// Run one loop body. Extra trace lines (corrections, cutoffs, test
    /// outcomes) go straight into `trace`.
    fn step(&mut self, state: Self::State, trace: &mut Vec<String>) -> Step<Self::State>;

    /// Short rendering of a state for violation messages
    fn describe(&self, state: Self::State) -> String;

    fn iteration_line(&self, iteration: usize, prev: Self::State, cur: Self::State, variant: f64) -> String;

    fn preamble(&self) -> Vec<String>;

    fn summary(&self, iterations: usize, last: Self::State) -> Vec<String>;

    /// The loop's main variable, reported as `final_value`
    fn final_value(&self, state: Self::State) -> f64;

    fn descriptor(&self) -> CycleProcess;
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "YES" } else { "NO" }
}

/// Simulate a process and collect its trace and verdict
pub fn analyze<P: CyclicProcess>(process: &mut P) -> Result<CycleAnalysisResult> {
    process.check_parameters()?;

    let mut steps = process.preamble();
    steps.push(String::new());

    let mut state = process.initial();
    let mut iterations = 0;
    let mut invariant_maintained = true;
    let mut variant_valid = true;
    let mut outcome = CycleOutcome::Completed;
    let limit = process.iteration_bound().unwrap_or(MAX_ITERATIONS);

    while process.guard(state) {
        if iterations == limit {
            warn!(process = process.name(), limit, "iteration limit reached");
            return Err(MachineError::IterationLimit {
                process: process.name(),
                limit,
            });
        }
        iterations += 1;

        let prev = state;
        let prev_variant = process.variant(prev);

        if !process.invariant(prev) {
            invariant_maintained = false;
            steps.push(format!(
                "INVARIANT VIOLATED before iteration {}: {}",
                iterations,
                process.describe(prev)
            ));
        }

        state = match process.step(prev, &mut steps) {
            Step::Continue(next) => next,
            Step::Abort(next) => {
                state = next;
                outcome = CycleOutcome::SafetyAborted;
                debug!(process = process.name(), iterations, "safety cutoff");
                break;
            }
        };

        if !process.invariant(state) {
            invariant_maintained = false;
            steps.push(format!(
                "INVARIANT VIOLATED after iteration {}: {}",
                iterations,
                process.describe(state)
            ));
        }

        let cur_variant = process.variant(state);
        if !(cur_variant < prev_variant) {
            variant_valid = false;
            steps.push(format!(
                "VARIANT VIOLATED: {} did not decrease from {}",
                cur_variant, prev_variant
            ));
        }

        steps.push(process.iteration_line(iterations, prev, state, cur_variant));
    }

    steps.push(String::new());
    steps.push("ANALYSIS RESULT:".to_string());
    steps.extend(process.summary(iterations, state));
    steps.push(format!("  - Invariant maintained: {}", yes_no(invariant_maintained)));
    steps.push(format!("  - Variant valid: {}", yes_no(variant_valid)));

    if !(invariant_maintained && variant_valid) {
        warn!(
            process = process.name(),
            invariant_maintained, variant_valid, "loop verification failed"
        );
    }
    info!(process = process.name(), iterations, ?outcome, "cycle analysis finished");

    Ok(CycleAnalysisResult {
        invariant_maintained,
        variant_valid,
        iterations,
        outcome,
        final_value: process.final_value(state),
        steps,
        conclusion: CycleAnalysisResult::conclusion_for(invariant_maintained, variant_valid).to_string(),
    })
}

fn positive_rate(process: &'static str, rate: f64) -> Result<()> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(MachineError::NonTerminatingRate { process, rate })
    }
}

/// The rate must still move a value of magnitude `magnitude`; float steps
/// below half an ulp are lost and the loop would stall.
fn rate_makes_progress(process: &'static str, rate: f64, magnitude: f64) -> Result<()> {
    if magnitude + rate != magnitude {
        Ok(())
    } else {
        Err(MachineError::NonTerminatingRate { process, rate })
    }
}

/// Loop bound for a float countdown covering `distance` in steps of `rate`.
///
/// Rounding can shorten a step to two thirds of `rate`, hence the doubling.
fn float_bound(distance: f64, rate: f64) -> Option<usize> {
    let steps = (distance / rate).ceil().max(0.0) * 2.0 + 1.0;
    if steps.is_finite() && steps < usize::MAX as f64 {
        Some(steps as usize)
    } else {
        None
    }
}

fn finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MachineError::InvalidParameter { name, value })
    }
}

/// Heat water from `current` towards `target`, aborting above `max_safe`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterHeating {
    pub current: f64,
    pub target: f64,
    pub rate: f64,
    pub max_safe: f64,
}

impl CyclicProcess for WaterHeating {
    type State = f64;

    fn name(&self) -> &'static str {
        "water heating"
    }

    fn check_parameters(&self) -> Result<()> {
        finite("current temperature", self.current)?;
        finite("target temperature", self.target)?;
        finite("max safe temperature", self.max_safe)?;
        positive_rate(self.name(), self.rate)?;
        rate_makes_progress(self.name(), self.rate, self.current.abs().max(self.target.abs()))
    }

    fn initial(&self) -> f64 {
        self.current
    }

    fn guard(&self, temp: f64) -> bool {
        temp < self.target
    }

    fn invariant(&self, temp: f64) -> bool {
        self.current <= temp && temp <= self.max_safe
    }

    fn variant(&self, temp: f64) -> f64 {
        self.target - temp
    }

    fn iteration_bound(&self) -> Option<usize> {
        float_bound(self.target - self.current, self.rate)
    }

    fn step(&mut self, temp: f64, trace: &mut Vec<String>) -> Step<f64> {
        let next = temp + self.rate;
        if next > self.max_safe {
            trace.push(format!(
                "SAFETY CUTOFF: temperature {}°C exceeded safe limit {}°C",
                next, self.max_safe
            ));
            return Step::Abort(next);
        }
        Step::Continue(next)
    }

    fn describe(&self, temp: f64) -> String {
        format!("{}°C not in [{}, {}]", temp, self.current, self.max_safe)
    }

    fn iteration_line(&self, iteration: usize, prev: f64, cur: f64, variant: f64) -> String {
        format!("Iteration {}: {}°C -> {}°C | variant: {:.2}", iteration, prev, cur, variant)
    }

    fn preamble(&self) -> Vec<String> {
        vec![
            "WATER HEATING STARTED".to_string(),
            format!("Initial temperature: {}°C", self.current),
            format!("Target temperature: {}°C", self.target),
            format!("Heating rate: {}°C/iteration", self.rate),
            format!("Max safe temperature: {}°C", self.max_safe),
        ]
    }

    fn summary(&self, iterations: usize, last: f64) -> Vec<String> {
        vec![
            format!("  - Iterations: {}", iterations),
            format!("  - Final temperature: {}°C", last),
        ]
    }

    fn final_value(&self, temp: f64) -> f64 {
        temp
    }

    fn descriptor(&self) -> CycleProcess {
        CycleProcess {
            name: "Water heating".to_string(),
            code: format!(
                "temp := {};\nwhile (temp < {}) {{\n    temp := temp + {};\n    if (temp > {}) break;\n}}",
                self.current, self.target, self.rate, self.max_safe
            ),
            invariant: format!("{} ≤ temp ≤ {}", self.current, self.max_safe),
            variant: format!("{} - temp", self.target),
            description: "Heat water to the target temperature with a safety cutoff".to_string(),
        }
    }
}

/// Drain the waste tank at `rate` percent per iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankCleaning {
    pub waste: f64,
    pub rate: f64,
}

impl CyclicProcess for TankCleaning {
    type State = f64;

    fn name(&self) -> &'static str {
        "tank cleaning"
    }

    fn check_parameters(&self) -> Result<()> {
        finite("waste level", self.waste)?;
        positive_rate(self.name(), self.rate)?;
        rate_makes_progress(self.name(), self.rate, self.waste.abs())
    }

    fn initial(&self) -> f64 {
        self.waste
    }

    fn guard(&self, waste: f64) -> bool {
        waste > 0.0
    }

    fn invariant(&self, waste: f64) -> bool {
        0.0 <= waste && waste <= self.waste
    }

    fn variant(&self, waste: f64) -> f64 {
        waste
    }

    fn iteration_bound(&self) -> Option<usize> {
        float_bound(self.waste, self.rate)
    }

    fn step(&mut self, waste: f64, trace: &mut Vec<String>) -> Step<f64> {
        let mut next = waste - self.rate;
        if next < 0.0 {
            next = 0.0;
            trace.push("CORRECTION: waste level clamped to 0%".to_string());
        }
        Step::Continue(next)
    }

    fn describe(&self, waste: f64) -> String {
        format!("{}% not in [0, {}]", waste, self.waste)
    }

    fn iteration_line(&self, iteration: usize, prev: f64, cur: f64, variant: f64) -> String {
        format!("Iteration {}: {}% -> {}% | variant: {:.2}", iteration, prev, cur, variant)
    }

    fn preamble(&self) -> Vec<String> {
        vec![
            "TANK CLEANING STARTED".to_string(),
            format!("Initial waste level: {}%", self.waste),
            format!("Cleaning rate: {}%/iteration", self.rate),
        ]
    }

    fn summary(&self, iterations: usize, last: f64) -> Vec<String> {
        vec![
            format!("  - Iterations: {}", iterations),
            format!("  - Final waste level: {}%", last),
        ]
    }

    fn final_value(&self, waste: f64) -> f64 {
        waste
    }

    fn descriptor(&self) -> CycleProcess {
        CycleProcess {
            name: "Tank cleaning".to_string(),
            code: format!(
                "wasteLevel := {};\nwhile (wasteLevel > 0) {{\n    wasteLevel := wasteLevel - {};\n    if (wasteLevel < 0) wasteLevel := 0;\n}}",
                self.waste, self.rate
            ),
            invariant: format!("0 ≤ wasteLevel ≤ {}", self.waste),
            variant: "wasteLevel".to_string(),
            description: "Empty the waste tanks".to_string(),
        }
    }
}

/// Run a self-test on each of `dispensers` dispensers.
///
/// `test` decides whether dispenser `i` passes; the analyzer itself
/// stays deterministic for a deterministic predicate.
pub struct DispenserTesting<F> {
    pub dispensers: usize,
    pub test: F,
}

/// `(tests_passed, i)`
pub type DispenserState = (usize, usize);

impl<F> DispenserTesting<F>
where
    F: FnMut(usize) -> bool,
{
    pub fn new(dispensers: usize, test: F) -> Self {
        DispenserTesting { dispensers, test }
    }
}

impl<F> CyclicProcess for DispenserTesting<F>
where
    F: FnMut(usize) -> bool,
{
    type State = DispenserState;

    fn name(&self) -> &'static str {
        "dispenser testing"
    }

    fn check_parameters(&self) -> Result<()> {
        Ok(())
    }

    fn initial(&self) -> DispenserState {
        (0, 0)
    }

    fn guard(&self, (_, i): DispenserState) -> bool {
        i < self.dispensers
    }

    fn invariant(&self, (passed, i): DispenserState) -> bool {
        passed <= i && i <= self.dispensers
    }

    fn variant(&self, (_, i): DispenserState) -> f64 {
        self.dispensers as f64 - i as f64
    }

    fn iteration_bound(&self) -> Option<usize> {
        Some(self.dispensers)
    }

    fn step(&mut self, (passed, i): DispenserState, trace: &mut Vec<String>) -> Step<DispenserState> {
        let ok = (self.test)(i);
        trace.push(format!(
            "Dispenser {} test: {}",
            i + 1,
            if ok { "PASSED" } else { "FAILED" }
        ));
        Step::Continue((passed + usize::from(ok), i + 1))
    }

    fn describe(&self, (passed, i): DispenserState) -> String {
        format!("testsPassed={}, i={}", passed, i)
    }

    fn iteration_line(&self, iteration: usize, _prev: DispenserState, (passed, _): DispenserState, variant: f64) -> String {
        format!("Iteration {}: testsPassed={} | variant: {}", iteration, passed, variant)
    }

    fn preamble(&self) -> Vec<String> {
        vec![
            "DISPENSER SELF-TEST STARTED".to_string(),
            format!("Dispensers: {}", self.dispensers),
        ]
    }

    fn summary(&self, _iterations: usize, (passed, i): DispenserState) -> Vec<String> {
        vec![
            format!("  - Dispensers tested: {}", i),
            format!("  - Tests passed: {}/{}", passed, self.dispensers),
        ]
    }

    fn final_value(&self, (passed, _): DispenserState) -> f64 {
        passed as f64
    }

    fn descriptor(&self) -> CycleProcess {
        CycleProcess {
            name: "Dispenser testing".to_string(),
            code: format!(
                "testsPassed := 0;\ni := 0;\nwhile (i < {}) {{\n    if (testDispenser(i)) testsPassed := testsPassed + 1;\n    i := i + 1;\n}}",
                self.dispensers
            ),
            invariant: format!("0 ≤ testsPassed ≤ i ≤ {}", self.dispensers),
            variant: format!("{} - i", self.dispensers),
            description: "Automatic self-test of every dispenser".to_string(),
        }
    }
}

pub fn analyze_water_heating(current: f64, target: f64, rate: f64, max_safe: f64) -> Result<CycleAnalysisResult> {
    analyze(&mut WaterHeating { current, target, rate, max_safe })
}

pub fn analyze_tank_cleaning(waste: f64, rate: f64) -> Result<CycleAnalysisResult> {
    analyze(&mut TankCleaning { waste, rate })
}

pub fn analyze_dispenser_testing<F>(dispensers: usize, test: F) -> Result<CycleAnalysisResult>
where
    F: FnMut(usize) -> bool,
{
    analyze(&mut DispenserTesting::new(dispensers, test))
}

/// Render a process description together with its analysis trace
pub fn generate_report(process: &CycleProcess, result: &CycleAnalysisResult) -> String {
    let mut output = String::new();

    output.push_str("CYCLIC PROCESS ANALYSIS\n");
    output.push_str("=======================\n");
    output.push_str(&format!("Process: {}\n", process.name));
    output.push_str(&format!("Description: {}\n\n", process.description));

    output.push_str("PROCESS CODE:\n");
    output.push_str(&process.code);
    output.push_str("\n\n");

    output.push_str("ANALYSIS PARAMETERS:\n");
    output.push_str(&format!("  - Invariant: {}\n", process.invariant));
    output.push_str(&format!("  - Variant: {}\n\n", process.variant));

    output.push_str("EXECUTION TRACE:\n");
    for step in &result.steps {
        output.push_str(step);
        output.push('\n');
    }
    output.push('\n');

    output.push_str("FINAL VERDICT:\n");
    output.push_str(&result.conclusion);
    output.push('\n');

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn has_line(result: &CycleAnalysisResult, needle: &str) -> bool {
        result.steps.iter().any(|s| s.contains(needle))
    }

    #[test]
    fn heating_reaches_target_in_fifteen_steps() {
        let result = analyze_water_heating(20.0, 95.0, 5.0, 100.0).unwrap();
        assert_eq!(result.iterations, 15);
        assert_eq!(result.final_value, 95.0);
        assert_eq!(result.outcome, CycleOutcome::Completed);
        assert!(result.invariant_maintained);
        assert!(result.variant_valid);
        assert!(has_line(&result, "Iteration 15: 90°C -> 95°C | variant: 0.00"));
        assert_eq!(result.conclusion, "Loop is correct: invariant maintained, variant decreases");
    }

    #[test]
    fn heating_overshoot_triggers_safety_cutoff() {
        let result = analyze_water_heating(90.0, 95.0, 20.0, 100.0).unwrap();
        assert_eq!(result.iterations, 1);
        assert_eq!(result.outcome, CycleOutcome::SafetyAborted);
        assert_eq!(result.final_value, 110.0);
        assert!(has_line(&result, "SAFETY CUTOFF: temperature 110°C exceeded safe limit 100°C"));
        assert!(!has_line(&result, "Iteration 1:"));
        assert!(result.invariant_maintained);
        assert!(result.variant_valid);
    }

    #[test]
    fn heating_already_hot_runs_zero_iterations() {
        let result = analyze_water_heating(96.0, 95.0, 5.0, 100.0).unwrap();
        assert_eq!(result.iterations, 0);
        assert_eq!(result.final_value, 96.0);
        assert!(result.is_correct());
    }

    #[test]
    fn heating_above_safe_limit_breaks_invariant() {
        let result = analyze_water_heating(120.0, 130.0, 5.0, 100.0).unwrap();
        assert!(!result.invariant_maintained);
        assert_eq!(result.outcome, CycleOutcome::SafetyAborted);
        assert!(has_line(&result, "INVARIANT VIOLATED before iteration 1: 120°C not in [120, 100]"));
        assert_eq!(result.conclusion, "Loop contains errors");
    }

    #[test]
    fn non_positive_rates_are_rejected() {
        assert_eq!(
            analyze_water_heating(20.0, 95.0, 0.0, 100.0),
            Err(MachineError::NonTerminatingRate { process: "water heating", rate: 0.0 })
        );
        assert!(matches!(
            analyze_tank_cleaning(50.0, -3.0),
            Err(MachineError::NonTerminatingRate { process: "tank cleaning", .. })
        ));
        assert!(analyze_tank_cleaning(50.0, f64::NAN).is_err());
    }

    #[test]
    fn non_finite_temperatures_are_rejected() {
        assert!(matches!(
            analyze_water_heating(20.0, f64::INFINITY, 5.0, 100.0),
            Err(MachineError::InvalidParameter { name: "target temperature", .. })
        ));
    }

    #[test]
    fn vanishing_rate_is_rejected() {
        assert_eq!(
            analyze_water_heating(20.0, 95.0, 1e-300, 100.0),
            Err(MachineError::NonTerminatingRate { process: "water heating", rate: 1e-300 })
        );
        assert!(matches!(
            analyze_tank_cleaning(1e20, 1.0),
            Err(MachineError::NonTerminatingRate { process: "tank cleaning", .. })
        ));
    }


    #[test]
    fn long_bounded_loops_run_past_the_fallback_ceiling() {
        let result = analyze_dispenser_testing(MAX_ITERATIONS + 1, |_| true).unwrap();
        assert_eq!(result.iterations, MAX_ITERATIONS + 1);
        assert_eq!(result.final_value, (MAX_ITERATIONS + 1) as f64);
        assert!(result.is_correct());

        let result = analyze_tank_cleaning(150_000.0, 1.0).unwrap();
        assert_eq!(result.iterations, 150_000);
        assert_eq!(result.final_value, 0.0);
        assert!(result.is_correct());
    }

    #[test]
    fn float_bound_covers_rounding_and_rejects_overflow() {
        assert_eq!(float_bound(75.0, 5.0), Some(31));
        assert_eq!(float_bound(-1.0, 5.0), Some(1));
        assert_eq!(float_bound(f64::INFINITY, 1.0), None);
    }

    #[test]
    fn cleaning_clamps_last_step_to_zero() {
        let result = analyze_tank_cleaning(50.0, 7.0).unwrap();
        assert_eq!(result.iterations, 8);
        assert_eq!(result.final_value, 0.0);
        assert!(result.invariant_maintained);
        assert!(result.variant_valid);
        assert!(has_line(&result, "CORRECTION: waste level clamped to 0%"));
        assert!(has_line(&result, "Iteration 8: 1% -> 0% | variant: 0.00"));
    }

    #[test]
    fn cleaning_empty_tank_does_nothing() {
        let result = analyze_tank_cleaning(0.0, 10.0).unwrap();
        assert_eq!(result.iterations, 0);
        assert!(result.is_correct());
    }

    #[test]
    fn dispenser_testing_with_even_predicate() {
        let result = analyze_dispenser_testing(5, |i| i % 2 == 0).unwrap();
        assert_eq!(result.iterations, 5);
        assert_eq!(result.final_value, 3.0);
        assert!(result.invariant_maintained);
        assert!(result.variant_valid);
        assert!(has_line(&result, "Dispenser 2 test: FAILED"));
        assert!(has_line(&result, "Tests passed: 3/5"));

        let variants: Vec<&String> = result.steps.iter().filter(|s| s.starts_with("Iteration")).collect();
        assert_eq!(variants.len(), 5);
        assert!(variants[0].ends_with("variant: 4"));
        assert!(variants[4].ends_with("variant: 0"));
    }

    #[test]
    fn dispenser_predicate_sees_each_index_once() {
        let mut seen = Vec::new();
        analyze_dispenser_testing(4, |i| {
            seen.push(i);
            true
        })
        .unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    /// Countdown whose body only makes progress on even iterations.
    struct StutteringCountdown {
        calls: usize,
    }

    impl CyclicProcess for StutteringCountdown {
        type State = i32;

        fn name(&self) -> &'static str {
            "stutter"
        }
        fn check_parameters(&self) -> Result<()> {
            Ok(())
        }
        fn initial(&self) -> i32 {
            2
        }
        fn guard(&self, n: i32) -> bool {
            n > 0
        }
        fn invariant(&self, n: i32) -> bool {
            n >= 0
        }
        fn variant(&self, n: i32) -> f64 {
            n as f64
        }
        fn step(&mut self, n: i32, _trace: &mut Vec<String>) -> Step<i32> {
            self.calls += 1;
            Step::Continue(if self.calls % 2 == 0 { n - 1 } else { n })
        }
        fn describe(&self, n: i32) -> String {
            n.to_string()
        }
        fn iteration_line(&self, iteration: usize, prev: i32, cur: i32, _variant: f64) -> String {
            format!("Iteration {}: {} -> {}", iteration, prev, cur)
        }
        fn preamble(&self) -> Vec<String> {
            Vec::new()
        }
        fn summary(&self, _iterations: usize, _last: i32) -> Vec<String> {
            Vec::new()
        }
        fn final_value(&self, n: i32) -> f64 {
            n as f64
        }
        fn descriptor(&self) -> CycleProcess {
            CycleProcess {
                name: "stutter".to_string(),
                code: String::new(),
                invariant: "n ≥ 0".to_string(),
                variant: "n".to_string(),
                description: String::new(),
            }
        }
    }

    #[test]
    fn stalled_variant_is_reported_not_fatal() {
        let result = analyze(&mut StutteringCountdown { calls: 0 }).unwrap();
        assert_eq!(result.iterations, 4);
        assert!(result.invariant_maintained);
        assert!(!result.variant_valid);
        assert!(has_line(&result, "VARIANT VIOLATED: 2 did not decrease from 2"));
        assert_eq!(result.conclusion, "Loop contains errors");
    }

    /// Loop whose body never changes the state and which has no bound.
    struct Frozen;

    impl CyclicProcess for Frozen {
        type State = i32;

        fn name(&self) -> &'static str {
            "frozen"
        }
        fn check_parameters(&self) -> Result<()> {
            Ok(())
        }
        fn initial(&self) -> i32 {
            1
        }
        fn guard(&self, n: i32) -> bool {
            n > 0
        }
        fn invariant(&self, _n: i32) -> bool {
            true
        }
        fn variant(&self, n: i32) -> f64 {
            n as f64
        }
        fn step(&mut self, n: i32, _trace: &mut Vec<String>) -> Step<i32> {
            Step::Continue(n)
        }
        fn describe(&self, n: i32) -> String {
            n.to_string()
        }
        fn iteration_line(&self, iteration: usize, _prev: i32, _cur: i32, _variant: f64) -> String {
            iteration.to_string()
        }
        fn preamble(&self) -> Vec<String> {
            Vec::new()
        }
        fn summary(&self, _iterations: usize, _last: i32) -> Vec<String> {
            Vec::new()
        }
        fn final_value(&self, n: i32) -> f64 {
            n as f64
        }
        fn descriptor(&self) -> CycleProcess {
            CycleProcess {
                name: "frozen".to_string(),
                code: String::new(),
                invariant: "true".to_string(),
                variant: "n".to_string(),
                description: String::new(),
            }
        }
    }

    #[test]
    fn unbounded_process_hits_iteration_limit() {
        let err = analyze(&mut Frozen).unwrap_err();
        assert_eq!(err, MachineError::IterationLimit { process: "frozen", limit: MAX_ITERATIONS });
    }

    #[test]
    fn report_contains_descriptor_and_trace() {
        let process = WaterHeating { current: 20.0, target: 95.0, rate: 5.0, max_safe: 100.0 };
        let result = analyze(&mut process.clone()).unwrap();
        let report = generate_report(&process.descriptor(), &result);

        assert!(report.starts_with("CYCLIC PROCESS ANALYSIS\n"));
        assert!(report.contains("Process: Water heating"));
        assert!(report.contains("while (temp < 95) {"));
        assert!(report.contains("  - Invariant: 20 ≤ temp ≤ 100"));
        assert!(report.contains("  - Variant: 95 - temp"));
        assert!(report.contains("Iteration 1: 20°C -> 25°C"));
        assert!(report.trim_end().ends_with("Loop is correct: invariant maintained, variant decreases"));
    }

    proptest! {
        #[test]
        fn cleaning_iterations_are_ceiling_of_waste_over_rate(waste in 1u32..=100, rate in 1u32..=30) {
            let result = analyze_tank_cleaning(waste as f64, rate as f64).unwrap();
            prop_assert_eq!(result.iterations as u32, waste.div_ceil(rate));
            prop_assert_eq!(result.final_value, 0.0);
            prop_assert!(result.is_correct());
        }

        #[test]
        fn heating_with_integral_steps_is_correct(start in 0u32..90, rate in 1u32..10) {
            // max_safe leaves room for the final overshoot
            let result = analyze_water_heating(start as f64, 95.0, rate as f64, 95.0 + rate as f64).unwrap();
            prop_assert_eq!(result.outcome, CycleOutcome::Completed);
            prop_assert_eq!(result.iterations as u32, (95 - start).div_ceil(rate));
            prop_assert!(result.is_correct());
        }

        #[test]
        fn dispenser_pass_count_matches_predicate(n in 0usize..40, modulus in 1usize..5) {
            let result = analyze_dispenser_testing(n, |i| i % modulus == 0).unwrap();
            prop_assert_eq!(result.iterations, n);
            prop_assert_eq!(result.final_value as usize, (0..n).filter(|i| i % modulus == 0).count());
            prop_assert!(result.is_correct());
        }
    }
}
