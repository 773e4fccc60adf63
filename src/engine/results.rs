// 8.0.2: result types and errors for engine operations.

use crate::account::AccountError;
use crate::config::ConfigError;
use crate::execution::ExecutionError;
use crate::indicator::IndicatorError;
use crate::ledger::LedgerError;
use crate::market::MarketError;
use crate::signal::PairSignal;
use crate::source::SourceError;
use crate::trade::Trade;
use crate::types::{Quote, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Orchestrator phase. Between ticks the engine rests in `Idle` or `Tracking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Idle,
    Evaluating,
    OpenPair,
    Tracking,
    Closing,
}

/// What one tick did.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub timestamp: Timestamp,
    pub state: EngineState,
    /// None while the variance is degenerate.
    pub zscore: Option<Decimal>,
    pub signal: PairSignal,
    pub opened: Vec<Trade>,
    pub stopped: Vec<Trade>,
    pub exited: Vec<Trade>,
}

impl TickReport {
    pub fn new(timestamp: Timestamp, zscore: Option<Decimal>, signal: PairSignal) -> Self {
        Self {
            timestamp,
            state: EngineState::Evaluating,
            zscore,
            signal,
            opened: Vec::new(),
            stopped: Vec::new(),
            exited: Vec::new(),
        }
    }

    pub fn opened_pair(&self) -> bool {
        !self.opened.is_empty()
    }

    pub fn closed_count(&self) -> usize {
        self.stopped.len() + self.exited.len()
    }
}

/// Per-tick valuation for downstream return analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuePoint {
    pub timestamp: Timestamp,
    /// Long value + short value of open trades.
    pub position_value: Quote,
    /// Cash + position value.
    pub equity: Quote,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Market error: {0}")]
    Market(#[from] MarketError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

impl EngineError {
    /// A pair leg that could not be sized. Aborts that attempt only.
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, EngineError::Execution(ExecutionError::InsufficientFunds { .. }))
    }

    /// Structural failures halt the run. Funding failures and degenerate
    /// variance do not.
    pub fn is_fatal(&self) -> bool {
        !self.is_insufficient_funds()
            && !matches!(self, EngineError::Indicator(IndicatorError::DegenerateVariance))
    }
}
