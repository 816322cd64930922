//! Error types for machine operations and analyses

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MachineError {
    #[error("unknown drink '{0}' (expected espresso, americano, cappuccino or latte)")]
    UnknownDrink(String),

    #[error("unknown ingredient '{0}' (expected water, coffee, milk, cups or sugar)")]
    UnknownIngredient(String),

    #[error("unknown maintenance type '{0}' (expected cleaning, deep-cleaning, calibration or diagnostic)")]
    UnknownMaintenance(String),

    /// The loop would never make progress with this rate.
    #[error("{process}: rate must be a positive finite number, got {rate}")]
    NonTerminatingRate { process: &'static str, rate: f64 },

    #[error("invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("{process}: gave up after {limit} iterations")]
    IterationLimit { process: &'static str, limit: usize },

    #[error("price table has no '{0}' entry")]
    MissingPrice(String),

    /// An operation refused to touch the machine state.
    #[error("{operation} rejected, unmet preconditions: {}", failed.join(", "))]
    PreconditionsFailed {
        operation: &'static str,
        failed: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, MachineError>;
