//! Coffee machine simulator with verification-style reports
//!
//! The machine state, brewing preconditions and operations live in
//! [`machine`], [`validator`] and [`operations`]. [`wp`] builds
//! weakest-precondition reports for a brewing order and [`cycle`] checks
//! loop invariants and variants of the machine's cyclic processes.

pub mod cycle;
pub mod dispenser;
pub mod error;
pub mod machine;
pub mod models;
pub mod operations;
pub mod status;
pub mod validator;
pub mod wp;
