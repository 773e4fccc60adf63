//! Per-leg trade ledger.
//!
//! Open trades live in an id-keyed map; closed trades move to an append-only
//! history. An id is in exactly one of the two once created.

use crate::trade::{CloseReason, Trade};
use crate::types::{Price, Timestamp, TradeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hands out trade ids. One sequence is shared by both legs so ids are
/// unique across the whole engine.
#[derive(Debug, Clone)]
pub struct TradeIdSequence {
    next: u64,
}

impl TradeIdSequence {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> TradeId {
        let id = TradeId(self.next);
        self.next += 1;
        id
    }
}

impl Default for TradeIdSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeLedger {
    open: BTreeMap<TradeId, Trade>,
    closed: Vec<Trade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, trade: Trade) -> Result<(), LedgerError> {
        if self.contains(trade.id) {
            return Err(LedgerError::DuplicateTradeId(trade.id));
        }
        self.open.insert(trade.id, trade);
        Ok(())
    }

    pub fn get(&self, id: TradeId) -> Result<&Trade, LedgerError> {
        self.open.get(&id).ok_or(LedgerError::UnknownTradeId(id))
    }

    /// Closes an open trade and moves it to history. Returns the closed copy.
    pub fn close(
        &mut self,
        id: TradeId,
        exit_price: Price,
        reason: CloseReason,
        timestamp: Timestamp,
    ) -> Result<Trade, LedgerError> {
        let mut trade = self.open.remove(&id).ok_or(LedgerError::UnknownTradeId(id))?;
        trade.close(exit_price, reason, timestamp);
        self.closed.push(trade.clone());
        Ok(trade)
    }

    /// Drops an open trade without recording history. Only for undoing a
    /// trade whose pair never opened.
    pub fn rollback(&mut self, id: TradeId) -> Result<Trade, LedgerError> {
        self.open.remove(&id).ok_or(LedgerError::UnknownTradeId(id))
    }

    pub fn contains(&self, id: TradeId) -> bool {
        self.open.contains_key(&id) || self.closed.iter().any(|t| t.id == id)
    }

    pub fn is_open(&self, id: TradeId) -> bool {
        self.open.contains_key(&id)
    }

    pub fn open_trades(&self) -> impl Iterator<Item = &Trade> {
        self.open.values()
    }

    pub fn open_ids(&self) -> Vec<TradeId> {
        self.open.keys().copied().collect()
    }

    pub fn closed_trades(&self) -> &[Trade] {
        &self.closed
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn closed_count(&self) -> usize {
        self.closed.len()
    }

    pub fn has_open(&self) -> bool {
        !self.open.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Trade {0} not found among open trades")]
    UnknownTradeId(TradeId),

    #[error("Trade {0} already recorded")]
    DuplicateTradeId(TradeId),
}
