// 4.0: a single trade on one leg. pnl = sign * quantity * (mark - entry).
// 4.1 has the pnl and loss-fraction formulas at the bottom.

use crate::types::{Price, Quote, Side, Symbol, Timestamp, TradeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    /// |zscore| fell below the exit threshold.
    ExitSignal,
    StopLoss,
    /// Sibling leg hit its stop, so this leg went with it.
    PairUnwind,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Decimal,
    pub entry_price: Price,
    pub status: TradeStatus,
    pub exit_price: Option<Price>,
    pub realized_pnl: Option<Quote>,
    pub close_reason: Option<CloseReason>,
    pub opened_at: Timestamp,
    pub closed_at: Option<Timestamp>,
}

impl Trade {
    pub fn open(
        id: TradeId,
        symbol: Symbol,
        side: Side,
        quantity: Decimal,
        entry_price: Price,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            symbol,
            side,
            quantity,
            entry_price,
            status: TradeStatus::Open,
            exit_price: None,
            realized_pnl: None,
            close_reason: None,
            opened_at: timestamp,
            closed_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// Cash reserved when the trade opened. Same for both sides.
    pub fn cost_basis(&self) -> Quote {
        Quote::new(self.quantity * self.entry_price.value())
    }

    pub fn unrealized_pnl(&self, mark: Price) -> Quote {
        calculate_pnl(self.side, self.quantity, self.entry_price, mark)
    }

    /// Cash the trade would return if closed at `mark`.
    pub fn market_value(&self, mark: Price) -> Quote {
        self.cost_basis().add(self.unrealized_pnl(mark))
    }

    pub fn loss_fraction(&self, mark: Price) -> Decimal {
        calculate_loss_fraction(self.side, self.entry_price, mark)
    }

    /// Marks the trade closed and books its pnl. Closing twice is a no-op
    /// that returns the pnl booked the first time.
    pub fn close(&mut self, exit_price: Price, reason: CloseReason, timestamp: Timestamp) -> Quote {
        if let Some(pnl) = self.realized_pnl {
            return pnl;
        }
        let pnl = calculate_pnl(self.side, self.quantity, self.entry_price, exit_price);
        self.status = TradeStatus::Closed;
        self.exit_price = Some(exit_price);
        self.realized_pnl = Some(pnl);
        self.close_reason = Some(reason);
        self.closed_at = Some(timestamp);
        pnl
    }

    /// Signed cash effect of this trade's current lifecycle event.
    /// open: -cost basis. closed: cost basis + realized pnl.
    pub fn cash_effect(&self) -> Quote {
        match self.status {
            TradeStatus::Open => self.cost_basis().negate(),
            TradeStatus::Closed => self
                .cost_basis()
                .add(self.realized_pnl.unwrap_or_else(Quote::zero)),
        }
    }
}

// 4.1: long profits when mark > entry, short when mark < entry.
pub fn calculate_pnl(side: Side, quantity: Decimal, entry: Price, mark: Price) -> Quote {
    Quote::new(side.sign() * quantity * (mark.value() - entry.value()))
}

// 4.2: fraction of entry price lost. negative when the trade is in profit.
pub fn calculate_loss_fraction(side: Side, entry: Price, mark: Price) -> Decimal {
    -side.sign() * (mark.value() - entry.value()) / entry.value()
}
