//! Market observations and the instrument pair.
//!
//! The engine never fetches data. Upstream collaborators hand it
//! already-resolved observations, one per instrument per tick.

use crate::types::{Price, Symbol, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable price snapshot for one instrument.
///
/// The price is kept raw: upstream data is not trusted, so validation
/// happens where the price is consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub symbol: Symbol,
    pub price: Decimal,
    pub timestamp: Timestamp,
}

impl Observation {
    pub fn new(symbol: impl Into<Symbol>, price: Decimal, timestamp: Timestamp) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
        }
    }

    pub fn valid_price(&self) -> Option<Price> {
        Price::new(self.price)
    }
}

/// The two instruments a strategy trades. Order matters: the ratio is
/// always `one / two`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentPair {
    pub one: Symbol,
    pub two: Symbol,
}

impl InstrumentPair {
    pub fn new(one: impl Into<Symbol>, two: impl Into<Symbol>) -> Self {
        Self {
            one: one.into(),
            two: two.into(),
        }
    }

    /// Checks that a tick's observations arrive as (one, two).
    pub fn check_observations(&self, first: &Observation, second: &Observation) -> Result<(), MarketError> {
        if first.symbol != self.one {
            return Err(MarketError::UnknownInstrument(first.symbol.clone()));
        }
        if second.symbol != self.two {
            return Err(MarketError::UnknownInstrument(second.symbol.clone()));
        }
        Ok(())
    }
}

/// Current prices keyed by symbol. Built once per tick and shared by
/// valuation, risk checks and exits so they all see the same marks.
#[derive(Debug, Clone, Default)]
pub struct Quotes {
    prices: BTreeMap<Symbol, Decimal>,
}

impl Quotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_observations<'a>(observations: impl IntoIterator<Item = &'a Observation>) -> Self {
        let mut quotes = Self::new();
        for obs in observations {
            quotes.insert(obs.symbol.clone(), obs.price);
        }
        quotes
    }

    pub fn insert(&mut self, symbol: Symbol, price: Decimal) {
        self.prices.insert(symbol, price);
    }

    pub fn price(&self, symbol: &Symbol) -> Result<Price, MarketError> {
        let raw = self
            .prices
            .get(symbol)
            .ok_or_else(|| MarketError::MissingQuote(symbol.clone()))?;
        Price::new(*raw).ok_or_else(|| MarketError::InvalidPrice {
            symbol: symbol.clone(),
            price: *raw,
        })
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Two chronologically ordered series, one per instrument.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairHistory {
    pub one: Vec<Observation>,
    pub two: Vec<Observation>,
}

impl PairHistory {
    pub fn new(one: Vec<Observation>, two: Vec<Observation>) -> Self {
        Self { one, two }
    }

    pub fn is_balanced(&self) -> bool {
        self.one.len() == self.two.len()
    }

    /// Length of the shorter series.
    pub fn len(&self) -> usize {
        self.one.len().min(self.two.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Splits into (first `at` observations, remainder), clamping `at`.
    pub fn split_at(&self, at: usize) -> (PairHistory, PairHistory) {
        let one_at = at.min(self.one.len());
        let two_at = at.min(self.two.len());
        let (seed_one, rest_one) = self.one.split_at(one_at);
        let (seed_two, rest_two) = self.two.split_at(two_at);
        (
            PairHistory::new(seed_one.to_vec(), seed_two.to_vec()),
            PairHistory::new(rest_one.to_vec(), rest_two.to_vec()),
        )
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&Observation, &Observation)> {
        self.one.iter().zip(self.two.iter())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarketError {
    #[error("No quote for {0}")]
    MissingQuote(Symbol),

    #[error("Invalid price {price} for {symbol}")]
    InvalidPrice { symbol: Symbol, price: Decimal },

    #[error("Observation for unknown instrument {0}")]
    UnknownInstrument(Symbol),
}
