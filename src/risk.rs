//! Stop-loss risk control.
//!
//! Runs on every tick regardless of what the signal path decided. A trade
//! whose loss reaches the configured fraction of its entry price is
//! force-closed at the current quote.

use crate::execution::{ExecutionError, ExecutionPipeline};
use crate::market::Quotes;
use crate::trade::Trade;
use crate::types::{Price, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopLoss {
    /// Loss as a fraction of entry price, e.g. 0.10 for 10%.
    pub fraction: Decimal,
}

impl StopLoss {
    pub fn new(fraction: Decimal) -> Self {
        Self { fraction }
    }

    pub fn is_breached(&self, trade: &Trade, mark: Price) -> bool {
        trade.is_open() && trade.loss_fraction(mark) >= self.fraction
    }

    /// Price at which a trade hits the stop. Longs trigger at or below it,
    /// shorts at or above.
    pub fn trigger_price(&self, trade: &Trade) -> Decimal {
        let entry = trade.entry_price.value();
        entry - trade.side.sign() * self.fraction * entry
    }
}

/// Trades force-closed by one risk sweep, per leg.
#[derive(Debug, Clone, Default)]
pub struct RiskSweep {
    pub longs: Vec<Trade>,
    pub shorts: Vec<Trade>,
}

impl RiskSweep {
    pub fn is_empty(&self) -> bool {
        self.longs.is_empty() && self.shorts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.longs.len() + self.shorts.len()
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.shorts.into_iter().chain(self.longs).collect()
    }
}

#[derive(Debug, Clone)]
pub struct RiskManager {
    stop_loss: StopLoss,
}

impl RiskManager {
    pub fn new(stop_loss: StopLoss) -> Self {
        Self { stop_loss }
    }

    pub fn stop_loss(&self) -> &StopLoss {
        &self.stop_loss
    }

    /// Checks both legs. Closed trades are already moved to history; the
    /// caller still has to settle them.
    pub fn sweep(
        &self,
        longs: &mut ExecutionPipeline,
        shorts: &mut ExecutionPipeline,
        quotes: &Quotes,
        timestamp: Timestamp,
    ) -> Result<RiskSweep, ExecutionError> {
        let shorts_closed = shorts.manage_risk(quotes, &self.stop_loss, timestamp)?;
        let longs_closed = longs.manage_risk(quotes, &self.stop_loss, timestamp)?;
        Ok(RiskSweep {
            longs: longs_closed,
            shorts: shorts_closed,
        })
    }
}
