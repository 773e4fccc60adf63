// 11.0: every state change produces an event. used for audit trails and
// notifying external reporting. the EventPayload enum lists all event types.

use crate::signal::PairSignal;
use crate::trade::{CloseReason, Trade};
use crate::types::{Price, Quote, Side, Symbol, Timestamp, TradeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Pair events
    PairOpened(PairOpenedEvent),
    PairRejected(PairRejectedEvent),
    PairClosed(PairClosedEvent),

    // Trade events
    TradeOpened(TradeOpenedEvent),
    TradeClosed(TradeClosedEvent),

    // Cash events
    CashSettled(CashSettledEvent),
}

impl EventPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::PairOpened(_) => "pair_opened",
            EventPayload::PairRejected(_) => "pair_rejected",
            EventPayload::PairClosed(_) => "pair_closed",
            EventPayload::TradeOpened(_) => "trade_opened",
            EventPayload::TradeClosed(_) => "trade_closed",
            EventPayload::CashSettled(_) => "cash_settled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairOpenedEvent {
    pub signal: PairSignal,
    pub zscore: Decimal,
    pub short_trade: TradeId,
    pub long_trade: TradeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairRejectedEvent {
    pub signal: PairSignal,
    pub zscore: Decimal,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairClosedEvent {
    pub reason: CloseReason,
    pub trades: Vec<TradeId>,
    pub realized_pnl: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOpenedEvent {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Decimal,
    pub entry_price: Price,
    pub cost_basis: Quote,
}

impl From<&Trade> for TradeOpenedEvent {
    fn from(trade: &Trade) -> Self {
        Self {
            trade_id: trade.id,
            symbol: trade.symbol.clone(),
            side: trade.side,
            quantity: trade.quantity,
            entry_price: trade.entry_price,
            cost_basis: trade.cost_basis(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeClosedEvent {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub side: Side,
    pub exit_price: Option<Price>,
    pub realized_pnl: Quote,
    pub close_reason: Option<CloseReason>,
}

impl From<&Trade> for TradeClosedEvent {
    fn from(trade: &Trade) -> Self {
        Self {
            trade_id: trade.id,
            symbol: trade.symbol.clone(),
            side: trade.side,
            exit_price: trade.exit_price,
            realized_pnl: trade.realized_pnl.unwrap_or_else(Quote::zero),
            close_reason: trade.close_reason,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashSettledEvent {
    pub trade_id: TradeId,
    pub amount: Quote,
    pub new_cash: Quote,
}
