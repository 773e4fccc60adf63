//! Market data sources.
//!
//! A source supplies a seed history for warm-up, then one observation pair
//! per call until exhausted. `ReplaySource` serves a recorded history: the
//! first `warmup` pairs seed the indicators, the remainder are replayed as
//! ticks.

use crate::market::{Observation, PairHistory};
use std::collections::VecDeque;

pub trait MarketDataSource {
    /// Chronologically ordered seed series for both instruments.
    fn history(&mut self) -> Result<PairHistory, SourceError>;

    /// Next observation pair, `None` once the source is exhausted.
    fn current(&mut self) -> Result<Option<(Observation, Observation)>, SourceError>;
}

#[derive(Debug, Clone)]
pub struct ReplaySource {
    seed: PairHistory,
    ticks: VecDeque<(Observation, Observation)>,
}

impl ReplaySource {
    pub fn new(history: PairHistory, warmup: usize) -> Result<Self, SourceError> {
        if !history.is_balanced() {
            return Err(SourceError::Unbalanced {
                one: history.one.len(),
                two: history.two.len(),
            });
        }
        if history.len() < warmup {
            return Err(SourceError::InsufficientHistory {
                available: history.len(),
                required: warmup,
            });
        }

        let (seed, replay) = history.split_at(warmup);
        let ticks = replay.one.into_iter().zip(replay.two).collect();
        Ok(Self { seed, ticks })
    }

    /// Ticks not yet served.
    pub fn remaining(&self) -> usize {
        self.ticks.len()
    }
}

impl MarketDataSource for ReplaySource {
    fn history(&mut self) -> Result<PairHistory, SourceError> {
        Ok(self.seed.clone())
    }

    fn current(&mut self) -> Result<Option<(Observation, Observation)>, SourceError> {
        Ok(self.ticks.pop_front())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("Series lengths differ: {one} vs {two}")]
    Unbalanced { one: usize, two: usize },

    #[error("History has {available} observations, warm-up needs {required}")]
    InsufficientHistory { available: usize, required: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;
    use rust_decimal::Decimal;

    fn series(symbol: &str, len: i64) -> Vec<Observation> {
        (0..len)
            .map(|i| Observation::new(symbol, Decimal::from(100 + i), Timestamp::from_millis(i)))
            .collect()
    }

    #[test]
    fn replay_splits_seed_from_ticks() {
        let history = PairHistory::new(series("AMZN", 8), series("TSLA", 8));
        let mut source = ReplaySource::new(history, 5).unwrap();

        let seed = source.history().unwrap();
        assert_eq!(seed.len(), 5);
        assert_eq!(source.remaining(), 3);

        let (one, two) = source.current().unwrap().unwrap();
        assert_eq!(one.timestamp, Timestamp::from_millis(5));
        assert_eq!(two.symbol.as_str(), "TSLA");

        source.current().unwrap();
        source.current().unwrap();
        assert!(source.current().unwrap().is_none());
    }

    #[test]
    fn unbalanced_history_rejected() {
        let history = PairHistory::new(series("AMZN", 8), series("TSLA", 7));
        assert_eq!(
            ReplaySource::new(history, 5).unwrap_err(),
            SourceError::Unbalanced { one: 8, two: 7 }
        );
    }

    #[test]
    fn short_history_rejected() {
        let history = PairHistory::new(series("AMZN", 3), series("TSLA", 3));
        assert!(matches!(
            ReplaySource::new(history, 5),
            Err(SourceError::InsufficientHistory { available: 3, required: 5 })
        ));
    }
}
