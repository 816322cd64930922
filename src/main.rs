//! Coffee Machine Verifier
//!
//! Simulates a coffee machine and prints pre/postcondition, weakest
//! precondition and loop invariant reports for its operations.

use std::collections::HashMap;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use coffee_verifier::cycle::{self, CyclicProcess, DispenserTesting, TankCleaning, WaterHeating};
use coffee_verifier::dispenser::{DEFAULT_PASS_RATE, RandomDispenserTester};
use coffee_verifier::machine::MachineState;
use coffee_verifier::models::{Conditions, CycleAnalysisResult, DrinkKind, Ingredient, MaintenanceKind};
use coffee_verifier::operations::{self, BrewOrder, MaintenanceRequest, RefillAmount};
use coffee_verifier::status::{MachineStatus, Priority};
use coffee_verifier::validator::{BrewingValidator, MilkPolicy};
use coffee_verifier::wp::{self, BASE_PRICE_KEY, WpRequest};

#[derive(Debug, Parser)]
#[command(name = "coffee-verifier")]
#[command(about = "Coffee machine simulator with WP and loop invariant analysis")]
struct Cli {
    #[command(flatten)]
    machine: MachineConfig,

    #[command(subcommand)]
    command: Commands,
}

/// Initial machine state; every run starts from these levels.
///
/// Stock options use a `stock-` prefix; `--sugar` and `--milk` belong to
/// the order.
#[derive(Args, Debug)]
struct MachineConfig {
    /// Water in the tank (ml)
    #[arg(long, global = true, default_value = "1000")]
    stock_water: u32,

    /// Ground coffee (g)
    #[arg(long, global = true, default_value = "500")]
    stock_coffee: u32,

    /// Milk (ml)
    #[arg(long, global = true, default_value = "1000")]
    stock_milk: u32,

    /// Cups in the dispenser
    #[arg(long, global = true, default_value = "50")]
    stock_cups: u32,

    /// Sugar (g)
    #[arg(long, global = true, default_value = "200")]
    stock_sugar: u32,

    /// Water temperature (°C)
    #[arg(long, global = true, default_value = "95", allow_negative_numbers = true)]
    temperature: f64,

    /// Waste tank fill level (%)
    #[arg(long, global = true, default_value = "15", value_parser = clap::value_parser!(u32).range(0..=100))]
    waste_level: u32,

    /// Accumulated wear (0-100)
    #[arg(long, global = true, default_value = "0", allow_negative_numbers = true)]
    wear: f64,

    /// Refuse milk in espresso and americano
    #[arg(long, global = true)]
    strict_milk: bool,
}

impl MachineConfig {
    fn build_state(&self) -> Result<MachineState> {
        if !self.temperature.is_finite() {
            bail!("--temperature must be a finite number, got {}", self.temperature);
        }
        if !(0.0..=100.0).contains(&self.wear) {
            bail!("--wear must be between 0 and 100, got {}", self.wear);
        }

        let mut state = MachineState::default();
        state.water = self.stock_water;
        state.coffee = self.stock_coffee;
        state.milk = self.stock_milk;
        state.cups = self.stock_cups;
        state.sugar = self.stock_sugar;
        state.temperature = self.temperature;
        state.set_waste_level(self.waste_level);
        state.increase_wear(self.wear);
        Ok(state)
    }

    fn validator(&self) -> BrewingValidator {
        let policy = if self.strict_milk {
            MilkPolicy::RejectForBlackCoffee
        } else {
            MilkPolicy::Permissive
        };
        BrewingValidator::new(policy)
    }
}

#[derive(Args, Debug, Clone, Copy)]
struct OrderArgs {
    /// Drink to brew (espresso, americano, cappuccino, latte)
    drink: DrinkKind,

    /// Sugar portions
    #[arg(short, long, default_value = "0")]
    sugar: u32,

    /// Add milk
    #[arg(short, long)]
    milk: bool,
}

impl OrderArgs {
    fn order(&self) -> BrewOrder {
        BrewOrder {
            kind: self.drink,
            sugar_level: self.sugar,
            add_milk: self.milk,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show machine mode, logical variables and notifications
    Status,

    /// List drink recipes
    Recipes,

    /// Estimate brewing time on the current machine
    BrewTime {
        drink: DrinkKind,

        #[arg(short, long, default_value = "0")]
        sugar: u32,
    },

    /// Check brewing preconditions
    Validate {
        #[command(flatten)]
        order: OrderArgs,
    },

    /// Weakest-precondition report for an order
    Wp {
        #[command(flatten)]
        order: OrderArgs,

        /// Base price of any drink
        #[arg(long, default_value = "20.0")]
        base_price: f64,
    },

    /// Brew a drink and report its postconditions
    Brew {
        #[command(flatten)]
        order: OrderArgs,

        #[arg(long, default_value = "20.0")]
        base_price: f64,
    },

    /// Refill an ingredient
    Refill {
        /// water, coffee, milk, cups or sugar
        ingredient: Ingredient,

        /// Amount to add
        #[arg(short, long, conflicts_with = "to_max", required_unless_present = "to_max")]
        amount: Option<u32>,

        /// Fill up to capacity
        #[arg(long)]
        to_max: bool,
    },

    /// Service the machine
    Maintain {
        /// cleaning, deep-cleaning, calibration or diagnostic
        kind: MaintenanceKind,

        /// Empty the water tank (deep cleaning only)
        #[arg(long)]
        drain_water: bool,

        /// Reset the session drink counter
        #[arg(long)]
        reset_stats: bool,
    },

    /// Loop invariant / variant analysis of a cyclic process
    Cycle {
        #[command(subcommand)]
        process: CycleCommand,

        /// Print the raw result as JSON instead of a report
        #[arg(long, global = true)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
enum CycleCommand {
    /// Heat water to a target temperature
    Heating {
        #[arg(long, default_value = "20", allow_negative_numbers = true)]
        current: f64,

        #[arg(long, default_value = "95", allow_negative_numbers = true)]
        target: f64,

        /// Degrees per iteration
        #[arg(long, default_value = "5", allow_negative_numbers = true)]
        rate: f64,

        #[arg(long, default_value = "100", allow_negative_numbers = true)]
        max_safe: f64,
    },

    /// Empty the waste tank
    Cleaning {
        /// Initial waste level (%)
        #[arg(long, default_value = "50", allow_negative_numbers = true)]
        waste: f64,

        /// Percent removed per iteration
        #[arg(long, default_value = "10", allow_negative_numbers = true)]
        rate: f64,
    },

    /// Self-test every dispenser
    Dispensers {
        #[arg(long, default_value = "5")]
        count: usize,

        /// Dispenser indices that fail; makes the run deterministic
        #[arg(long, value_delimiter = ',')]
        fail: Vec<usize>,

        /// Seed for the random tester
        #[arg(long)]
        seed: Option<u64>,

        /// Pass probability of the random tester
        #[arg(long, default_value_t = DEFAULT_PASS_RATE)]
        pass_rate: f64,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut state = cli.machine.build_state()?;
    let validator = cli.machine.validator();
    info!(config = ?cli.machine, "machine initialised");

    match cli.command {
        Commands::Status => {
            let status = MachineStatus::from_state(&state);
            if status.has(Priority::Critical) {
                warn!("machine has critical notifications");
            }
            println!("{}", status);
        }

        Commands::Recipes => {
            println!("{:<12} {:>10} {:>10} {:>10}", "Drink", "Water", "Coffee", "Milk");
            println!("{}", "-".repeat(45));
            for kind in DrinkKind::ALL {
                let r = kind.recipe();
                println!("{:<12} {:>8}ml {:>9}g {:>8}ml", kind, r.water, r.coffee, r.milk);
            }
        }

        Commands::BrewTime { drink, sugar } => {
            let time = state.calculate_brew_time(drink, sugar);
            println!("{} with {} sugar: {:.1} s", drink, sugar, time);
        }

        Commands::Validate { order } => {
            let result = validator.validate(&state, order.drink, order.sugar, order.milk);
            print!("{}", wp::precondition_section(&result.conditions));
            println!("Valid: {}", result.is_valid);
        }

        Commands::Wp { order, base_price } => {
            let prices = prices_with_base(base_price);
            let postconditions =
                operations::preview_brew(&state, &validator, order.order(), Instant::now());
            print_wp_report(&state, &validator, &order, &postconditions, &prices)?;
        }

        Commands::Brew { order, base_price } => {
            let prices = prices_with_base(base_price);
            let before = state.clone();

            let report = match operations::brew(&mut state, &validator, order.order(), Instant::now()) {
                Ok(report) => report,
                Err(err) => {
                    let postconditions = operations::preview_brew(&before, &validator, order.order(), Instant::now());
                    print_wp_report(&before, &validator, &order, &postconditions, &prices)?;
                    return Err(err).context("brewing failed");
                }
            };

            println!(
                "Brewed {} in {:.1} s (wear +{:.2})\n",
                report.order.kind, report.brew_time_s, report.wear_added
            );
            print_wp_report(&before, &validator, &order, &report.postconditions, &prices)?;
            println!("\n{}", MachineStatus::from_state(&state));
        }

        Commands::Refill {
            ingredient,
            amount,
            to_max,
        } => {
            let amount = match (to_max, amount) {
                (true, _) => RefillAmount::ToMax,
                (false, Some(n)) => RefillAmount::Exact(n),
                (false, None) => RefillAmount::Exact(0),
            };
            print!("{}", wp::precondition_section(&operations::refill_preconditions(&state, ingredient, amount)));

            let report = operations::refill(&mut state, ingredient, amount).context("refill failed")?;
            println!(
                "\nRefilled {}: {} -> {} {} (+{})\n",
                report.ingredient,
                report.before,
                report.after,
                report.ingredient.unit(),
                report.added
            );
            print!("{}", wp::postcondition_section(&report.postconditions));
        }

        Commands::Maintain {
            kind,
            drain_water,
            reset_stats,
        } => {
            print!("{}", wp::precondition_section(&operations::maintenance_preconditions(&state)));

            let request = MaintenanceRequest {
                kind,
                drain_water,
                reset_statistics: reset_stats,
            };
            let report = operations::maintain(&mut state, request).context("maintenance failed")?;
            println!(
                "\nMaintenance ({}): wear {:.1} -> {:.1}\n",
                report.request.kind, report.wear_before, report.wear_after
            );
            print!("{}", wp::postcondition_section(&report.postconditions));
            println!("\n{}", MachineStatus::from_state(&state));
        }

        Commands::Cycle { process, json } => run_cycle(process, json)?,
    }

    Ok(())
}

fn prices_with_base(base: f64) -> HashMap<String, f64> {
    HashMap::from([(BASE_PRICE_KEY.to_string(), base)])
}

fn print_wp_report(
    state: &MachineState,
    validator: &BrewingValidator,
    order: &OrderArgs,
    postconditions: &Conditions,
    prices: &HashMap<String, f64>,
) -> Result<()> {
    let validation = validator.validate(state, order.drink, order.sugar, order.milk);
    let resources = operations::resource_checks(state, &order.order());
    let request = WpRequest {
        preconditions: &validation.conditions,
        postconditions,
        kind: order.drink,
        sugar_level: order.sugar,
        resources: &resources,
        prices,
    };
    println!("{}", wp::full_report(&request)?);
    Ok(())
}

fn run_cycle(command: CycleCommand, json: bool) -> Result<()> {
    match command {
        CycleCommand::Heating {
            current,
            target,
            rate,
            max_safe,
        } => {
            let mut process = WaterHeating {
                current,
                target,
                rate,
                max_safe,
            };
            let result = cycle::analyze(&mut process)?;
            print_cycle(&process, &result, json)
        }

        CycleCommand::Cleaning { waste, rate } => {
            let mut process = TankCleaning { waste, rate };
            let result = cycle::analyze(&mut process)?;
            print_cycle(&process, &result, json)
        }

        CycleCommand::Dispensers {
            count,
            fail,
            seed,
            pass_rate,
        } => {
            if fail.is_empty() {
                let mut tester = RandomDispenserTester::new(pass_rate, seed)?;
                let mut process = DispenserTesting::new(count, |i| tester.test(i));
                let result = cycle::analyze(&mut process)?;
                print_cycle(&process, &result, json)
            } else {
                let mut process = DispenserTesting::new(count, |i| !fail.contains(&i));
                let result = cycle::analyze(&mut process)?;
                print_cycle(&process, &result, json)
            }
        }
    }
}

fn print_cycle<P: CyclicProcess>(process: &P, result: &CycleAnalysisResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        print!("{}", cycle::generate_report(&process.descriptor(), result));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("coffee-verifier").chain(args.iter().copied()))
            .unwrap_or_else(|e| panic!("{:?} failed to parse: {}", args, e))
    }

    fn rejects(args: &[&str]) -> bool {
        Cli::try_parse_from(std::iter::once("coffee-verifier").chain(args.iter().copied())).is_err()
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn status_uses_default_machine() {
        let cli = parse(&["status"]);
        assert!(matches!(cli.command, Commands::Status));
        let state = cli.machine.build_state().unwrap();
        assert_eq!(state, MachineState::default());
    }

    #[test]
    fn validate_keeps_order_and_stock_apart() {
        let cli = parse(&["validate", "latte", "--sugar", "2", "--milk"]);
        let Commands::Validate { order } = cli.command else {
            panic!("expected validate, got {:?}", cli.command);
        };
        assert_eq!(order.drink, DrinkKind::Latte);
        assert_eq!(order.sugar, 2);
        assert!(order.milk);
        assert_eq!(cli.machine.stock_sugar, 200);
        assert_eq!(cli.machine.stock_milk, 1000);
    }

    #[test]
    fn stock_options_work_before_and_after_the_subcommand() {
        for args in [
            &["--stock-sugar", "5", "brew-time", "espresso", "--sugar", "3"][..],
            &["brew-time", "espresso", "--sugar", "3", "--stock-sugar", "5"][..],
        ] {
            let cli = parse(args);
            assert_eq!(cli.machine.stock_sugar, 5);
            assert!(matches!(
                cli.command,
                Commands::BrewTime { drink: DrinkKind::Espresso, sugar: 3 }
            ));
        }
    }

    #[test]
    fn wp_and_brew_parse_orders() {
        let cli = parse(&["wp", "espresso", "--base-price", "30"]);
        let Commands::Wp { order, base_price } = cli.command else {
            panic!("expected wp, got {:?}", cli.command);
        };
        assert_eq!(order.order(), BrewOrder { kind: DrinkKind::Espresso, sugar_level: 0, add_milk: false });
        assert_eq!(base_price, 30.0);

        let cli = parse(&["--strict-milk", "brew", "latte", "-m", "-s", "1"]);
        let Commands::Brew { order, base_price } = cli.command else {
            panic!("expected brew, got {:?}", cli.command);
        };
        assert_eq!(order.order(), BrewOrder { kind: DrinkKind::Latte, sugar_level: 1, add_milk: true });
        assert_eq!(base_price, 20.0);
        assert_eq!(cli.machine.validator().milk_policy, MilkPolicy::RejectForBlackCoffee);
    }

    #[test]
    fn unknown_drink_is_a_parse_error() {
        assert!(rejects(&["validate", "mocha"]));
    }

    #[test]
    fn refill_needs_exactly_one_amount() {
        let cli = parse(&["refill", "water", "--to-max"]);
        assert!(matches!(
            cli.command,
            Commands::Refill { ingredient: Ingredient::Water, amount: None, to_max: true }
        ));

        let cli = parse(&["refill", "cups", "-a", "10"]);
        assert!(matches!(
            cli.command,
            Commands::Refill { ingredient: Ingredient::Cups, amount: Some(10), to_max: false }
        ));

        assert!(rejects(&["refill", "water"]));
        assert!(rejects(&["refill", "water", "--amount", "5", "--to-max"]));
    }

    #[test]
    fn maintain_parses_kind_and_flags() {
        let cli = parse(&["maintain", "deep-cleaning", "--drain-water"]);
        assert!(matches!(
            cli.command,
            Commands::Maintain { kind: MaintenanceKind::DeepCleaning, drain_water: true, reset_stats: false }
        ));
    }

    #[test]
    fn cycle_dispensers_takes_failure_list() {
        let cli = parse(&["cycle", "dispensers", "--fail", "0,2", "--json"]);
        let Commands::Cycle { process: CycleCommand::Dispensers { count, fail, seed, .. }, json } = cli.command
        else {
            panic!("expected cycle dispensers, got {:?}", cli.command);
        };
        assert_eq!(count, 5);
        assert_eq!(fail, vec![0, 2]);
        assert_eq!(seed, None);
        assert!(json);
    }

    #[test]
    fn cleaning_waste_and_machine_waste_are_separate() {
        let cli = parse(&["cycle", "cleaning", "--waste", "30", "--rate", "-2", "--waste-level", "50"]);
        assert_eq!(cli.machine.waste_level, 50);
        let Commands::Cycle { process: CycleCommand::Cleaning { waste, rate }, .. } = cli.command else {
            panic!("expected cycle cleaning, got {:?}", cli.command);
        };
        assert_eq!((waste, rate), (30.0, -2.0));
        assert!(rejects(&["--waste-level", "101", "status"]));
    }

    #[test]
    fn build_state_rejects_bad_wear_and_temperature() {
        let cli = parse(&["--wear=-5", "status"]);
        assert!(cli.machine.build_state().is_err());

        let cli = parse(&["--temperature", "NaN", "status"]);
        assert!(cli.machine.build_state().is_err());

        let cli = parse(&["--wear", "40", "--temperature", "-3", "status"]);
        let state = cli.machine.build_state().unwrap();
        assert_eq!(state.wear_level(), 40.0);
        assert_eq!(state.temperature, -3.0);
    }
}
