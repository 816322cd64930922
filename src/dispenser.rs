//! Simulated dispenser hardware for the self-test loop

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{MachineError, Result};

/// Chance a healthy dispenser passes its self-test
pub const DEFAULT_PASS_RATE: f64 = 0.8;

/// Random pass/fail oracle; seed it for reproducible runs
#[derive(Debug, Clone)]
pub struct RandomDispenserTester {
    rng: StdRng,
    pass_rate: f64,
}

impl RandomDispenserTester {
    pub fn new(pass_rate: f64, seed: Option<u64>) -> Result<Self> {
        if !(0.0..=1.0).contains(&pass_rate) {
            return Err(MachineError::InvalidParameter {
                name: "pass rate",
                value: pass_rate,
            });
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(RandomDispenserTester { rng, pass_rate })
    }

    pub fn test(&mut self, _index: usize) -> bool {
        self.rng.gen_bool(self.pass_rate)
    }
}
