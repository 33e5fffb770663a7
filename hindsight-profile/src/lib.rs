//! # hindsight-profile
//!
//! Welford's online mean/variance accumulator. This is the in-process form
//! of the per-memory quality profile; the persistent form is a single
//! `INSERT ... ON CONFLICT DO UPDATE` in hindsight-storage whose SET
//! expressions implement exactly the same recurrence, so the two can be
//! cross-checked in tests.

use serde::{Deserialize, Serialize};

/// Online mean/variance state.
///
/// The recurrence per observation x:
/// ```text
/// count' = count + 1
/// mean'  = mean + (x - mean) / count'
/// m2'    = m2 + (x - mean) * (x - mean')
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Welford {
    pub count: u64,
    pub mean: f64,
    pub m2: f64,
}

impl Welford {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one observation into the accumulator.
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    /// Combine two accumulators (Chan et al. parallel form).
    pub fn merge(&self, other: &Welford) -> Welford {
        if self.count == 0 {
            return *other;
        }
        if other.count == 0 {
            return *self;
        }
        let count = self.count + other.count;
        let delta = other.mean - self.mean;
        let mean = self.mean + delta * other.count as f64 / count as f64;
        let m2 = self.m2
            + other.m2
            + delta * delta * (self.count as f64 * other.count as f64) / count as f64;
        Welford { count, mean, m2 }
    }

    /// Sample variance, `m2 / (count - 1)`. None below two observations.
    pub fn variance(&self) -> Option<f64> {
        if self.count > 1 {
            Some(self.m2 / (self.count - 1) as f64)
        } else {
            None
        }
    }

    pub fn stddev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    /// Standard error of the mean.
    pub fn stderr(&self) -> Option<f64> {
        self.stddev().map(|s| s / (self.count as f64).sqrt())
    }
}

impl FromIterator<f64> for Welford {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut w = Welford::new();
        for x in iter {
            w.push(x);
        }
        w
    }
}
