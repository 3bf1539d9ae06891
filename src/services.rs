//! Injectable services - logger and randomizer
//!
//! Both services are swappable on the horde at any point before a run
//! starts. Defaults: a logger forwarding to `tracing`, and a seedable
//! ChaCha8-backed randomizer.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Logging service exposed to gremlins, mogwais, and strategies
pub trait Logger: Send + Sync {
    fn log(&self, msg: &str);
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Shared handle to a logger
pub type SharedLogger = Arc<dyn Logger>;

/// Default logger, forwarding every level to the `tracing` macros
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, msg: &str) {
        tracing::debug!(target: "gremlins", "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!(target: "gremlins", "{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "gremlins", "{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!(target: "gremlins", "{msg}");
    }
}

/// Randomness service exposed to gremlins and strategies
///
/// Implementors provide the uniform draw; the bounded and weighted draws
/// have default implementations derived from it, so a deterministic test
/// randomizer only needs to script `uniform`.
pub trait Randomizer: Send + Sync {
    /// Uniform draw in [0, 1)
    fn uniform(&self) -> f64;

    /// Integer draw in [low, high], both bounds inclusive
    fn between(&self, low: i64, high: i64) -> i64 {
        let span = (high - low + 1) as f64;
        low + (self.uniform() * span).floor() as i64
    }

    /// Uniform index pick over a list of the given length
    fn pick(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.between(0, len as i64 - 1) as usize)
    }

    /// Weighted index pick: one uniform draw matched against cumulative
    /// weight shares. Weights are expected to sum to 1; this is not
    /// validated, an incorrect sum skews selection but never fails.
    fn weighted(&self, weights: &[f64]) -> Option<usize> {
        if weights.is_empty() {
            return None;
        }
        let draw = self.uniform();
        let mut cumulative = 0.0;
        for (idx, weight) in weights.iter().enumerate() {
            cumulative += weight;
            if draw < cumulative {
                return Some(idx);
            }
        }
        // Weights summing below 1 leave a dead zone at the top of the
        // range; land those draws on the last entry.
        Some(weights.len() - 1)
    }
}

/// Shared handle to a randomizer
pub type SharedRandomizer = Arc<dyn Randomizer>;

/// Default randomizer backed by a ChaCha8 PRNG
pub struct ChaChaRandomizer {
    rng: Mutex<ChaCha8Rng>,
}

impl ChaChaRandomizer {
    /// Entropy-seeded randomizer
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }

    /// Deterministically seeded randomizer, for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl Default for ChaChaRandomizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Randomizer for ChaChaRandomizer {
    fn uniform(&self) -> f64 {
        self.rng.lock().gen::<f64>()
    }

    fn between(&self, low: i64, high: i64) -> i64 {
        self.rng.lock().gen_range(low..=high)
    }
}

/// Test randomizer replaying a scripted sequence of uniform draws,
/// wrapping around when exhausted
#[cfg(test)]
pub(crate) struct ScriptedRandomizer {
    draws: Vec<f64>,
    next: Mutex<usize>,
}

#[cfg(test)]
impl ScriptedRandomizer {
    pub(crate) fn new(draws: Vec<f64>) -> Self {
        Self {
            draws,
            next: Mutex::new(0),
        }
    }
}

#[cfg(test)]
impl Randomizer for ScriptedRandomizer {
    fn uniform(&self) -> f64 {
        let mut next = self.next.lock();
        let draw = self.draws[*next % self.draws.len()];
        *next += 1;
        draw
    }
}
