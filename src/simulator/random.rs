//! Injectable randomness.
//!
//! Every random draw in the simulator and the scheduler goes through
//! [`RandomSource`], so tests can pin the sequence instead of relying on
//! thread-local entropy.

use std::collections::VecDeque;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A shareable source of uniform draws.
///
/// Ranges are half-open. An empty range (`low >= high`) yields `low`.
pub trait RandomSource: Send + Sync {
    /// Uniform integer in `[low, high)`.
    fn next_u64_in(&self, low: u64, high: u64) -> u64;

    /// Uniform signed integer in `[low, high)`.
    fn next_i64_in(&self, low: i64, high: i64) -> i64 {
        if low >= high {
            return low;
        }
        let span = high.abs_diff(low);
        low.wrapping_add(self.next_u64_in(0, span) as i64)
    }

    /// Uniform float in `[low, high)`.
    fn next_f64_in(&self, low: f64, high: f64) -> f64;
}

/// Thread-local entropy, the default in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_u64_in(&self, low: u64, high: u64) -> u64 {
        if low >= high {
            return low;
        }
        rand::thread_rng().gen_range(low..high)
    }

    fn next_f64_in(&self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        rand::thread_rng().gen_range(low..high)
    }
}

/// Reproducible stream from a fixed seed.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_u64_in(&self, low: u64, high: u64) -> u64 {
        if low >= high {
            return low;
        }
        let mut rng = self.rng.lock().expect("seeded rng mutex poisoned");
        rng.gen_range(low..high)
    }

    fn next_f64_in(&self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        let mut rng = self.rng.lock().expect("seeded rng mutex poisoned");
        rng.gen_range(low..high)
    }
}

/// Replays a fixed list of raw values, cycling when exhausted.
///
/// Each draw maps the next raw value `v` into the range as
/// `low + v % (high - low)`. Float draws use `v % 1000 / 1000` as the
/// fraction of the range.
#[derive(Debug)]
pub struct SequenceRandom {
    values: Mutex<VecDeque<u64>>,
}

impl SequenceRandom {
    pub fn new(values: impl IntoIterator<Item = u64>) -> Self {
        let values: VecDeque<u64> = values.into_iter().collect();
        assert!(!values.is_empty(), "SequenceRandom needs at least one value");
        Self {
            values: Mutex::new(values),
        }
    }

    fn next_raw(&self) -> u64 {
        let mut values = self.values.lock().expect("sequence mutex poisoned");
        let v = values.pop_front().unwrap_or_default();
        values.push_back(v);
        v
    }
}

impl RandomSource for SequenceRandom {
    fn next_u64_in(&self, low: u64, high: u64) -> u64 {
        if low >= high {
            return low;
        }
        low + self.next_raw() % (high - low)
    }

    fn next_f64_in(&self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        let fraction = (self.next_raw() % 1000) as f64 / 1000.0;
        low + (high - low) * fraction
    }
}
