// 2.0: rolling ratio indicators. two fixed-capacity windows over price_one / price_two.
// zscore = (short mean - long mean) / std(long window). undefined until both windows are full.

use crate::market::Observation;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fixed-capacity window. Pushing into a full window evicts the oldest value.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<Decimal>,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() >= self.capacity
    }

    /// Returns the evicted value, if any.
    pub fn push(&mut self, value: Decimal) -> Option<Decimal> {
        let evicted = if self.is_full() {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn latest(&self) -> Option<Decimal> {
        self.values.back().copied()
    }

    // None until full
    pub fn mean(&self) -> Option<Decimal> {
        if !self.is_full() || self.capacity == 0 {
            return None;
        }
        let sum: Decimal = self.values.iter().sum();
        sum.checked_div(Decimal::from(self.values.len()))
    }

    // population std (divide by n)
    pub fn std(&self) -> Option<Decimal> {
        let mean = self.mean()?;
        let n = Decimal::from(self.values.len());
        let sum_sq: Decimal = self
            .values
            .iter()
            .map(|v| {
                let diff = *v - mean;
                diff * diff
            })
            .sum();
        sum_sq.checked_div(n)?.sqrt()
    }
}

/// Point-in-time view of the indicator state. The z-score is a pure
/// function of these three numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub short_mean: Decimal,
    pub long_mean: Decimal,
    pub std: Decimal,
}

impl IndicatorSnapshot {
    pub fn new(short_mean: Decimal, long_mean: Decimal, std: Decimal) -> Self {
        Self {
            short_mean,
            long_mean,
            std,
        }
    }

    /// Zero std has no meaningful deviation. Callers treat it as "no signal".
    pub fn zscore(&self) -> Result<Decimal, IndicatorError> {
        if self.std.is_zero() {
            return Err(IndicatorError::DegenerateVariance);
        }
        (self.short_mean - self.long_mean)
            .checked_div(self.std)
            .ok_or(IndicatorError::DegenerateVariance)
    }
}

// 2.1: the engine. owns both windows; the long window also feeds the std.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    short: RollingWindow,
    long: RollingWindow,
}

impl IndicatorEngine {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        Self {
            short: RollingWindow::new(short_window),
            long: RollingWindow::new(long_window),
        }
    }

    pub fn warmup_len(&self) -> usize {
        self.short.capacity().max(self.long.capacity())
    }

    pub fn is_ready(&self) -> bool {
        self.short.is_full() && self.long.is_full()
    }

    /// Seeds both windows from history. Both series must have the same
    /// length and cover the longer window. Nothing changes on error.
    pub fn initialize(
        &mut self,
        seed_one: &[Observation],
        seed_two: &[Observation],
    ) -> Result<(), IndicatorError> {
        let required = self.warmup_len();
        if seed_one.len() != seed_two.len() || seed_one.len() < required {
            return Err(IndicatorError::MismatchedSeriesLength {
                one: seed_one.len(),
                two: seed_two.len(),
                required,
            });
        }

        let ratios = seed_one
            .iter()
            .zip(seed_two)
            .map(|(a, b)| price_ratio(a, b))
            .collect::<Result<Vec<_>, _>>()?;

        self.short.clear();
        self.long.clear();
        for ratio in ratios {
            self.short.push(ratio);
            self.long.push(ratio);
        }
        Ok(())
    }

    /// Pushes one ratio observation into both windows and returns it.
    pub fn append(&mut self, one: &Observation, two: &Observation) -> Result<Decimal, IndicatorError> {
        let ratio = price_ratio(one, two)?;
        self.short.push(ratio);
        self.long.push(ratio);
        Ok(ratio)
    }

    pub fn latest_ratio(&self) -> Option<Decimal> {
        self.long.latest()
    }

    pub fn short_mean(&self) -> Result<Decimal, IndicatorError> {
        self.short.mean().ok_or(IndicatorError::UninitializedIndicator)
    }

    pub fn long_mean(&self) -> Result<Decimal, IndicatorError> {
        self.long.mean().ok_or(IndicatorError::UninitializedIndicator)
    }

    pub fn std(&self) -> Result<Decimal, IndicatorError> {
        self.long.std().ok_or(IndicatorError::UninitializedIndicator)
    }

    /// Current (short, long) window means.
    pub fn latest_mean(&self) -> Result<(Decimal, Decimal), IndicatorError> {
        Ok((self.short_mean()?, self.long_mean()?))
    }

    pub fn snapshot(&self) -> Result<IndicatorSnapshot, IndicatorError> {
        Ok(IndicatorSnapshot::new(
            self.short_mean()?,
            self.long_mean()?,
            self.std()?,
        ))
    }

    pub fn zscore(&self) -> Result<Decimal, IndicatorError> {
        self.snapshot()?.zscore()
    }
}

fn price_ratio(one: &Observation, two: &Observation) -> Result<Decimal, IndicatorError> {
    let (Some(p1), Some(p2)) = (one.valid_price(), two.valid_price()) else {
        return Err(IndicatorError::InvalidObservation {
            one: one.price,
            two: two.price,
        });
    };
    p1.value()
        .checked_div(p2.value())
        .ok_or(IndicatorError::InvalidObservation {
            one: one.price,
            two: two.price,
        })
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("Seed series mismatched: {one} vs {two} observations, need equal lengths of at least {required}")]
    MismatchedSeriesLength { one: usize, two: usize, required: usize },

    #[error("Indicator has not completed warm-up")]
    UninitializedIndicator,

    #[error("Standard deviation is zero, z-score undefined")]
    DegenerateVariance,

    #[error("Cannot form a price ratio from {one} / {two}")]
    InvalidObservation { one: Decimal, two: Decimal },
}
