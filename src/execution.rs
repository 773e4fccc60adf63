// 5.0: execution pipelines. one per side, each owning its leg's ledger.
// sizing: size = available cash * proportion, quantity = size / price.
// 5.1 stop-loss sweep, 5.2 valuation.

use crate::ledger::{LedgerError, TradeIdSequence, TradeLedger};
use crate::market::{MarketError, Observation, Quotes};
use crate::risk::StopLoss;
use crate::trade::{CloseReason, Trade};
use crate::types::{Price, Quote, Side, Symbol, Timestamp, TradeId};
use rust_decimal::{Decimal, RoundingStrategy};

// quantities are truncated to this many decimal places so cost basis never
// exceeds the sized amount and cash arithmetic stays exact
pub const QUANTITY_SCALE: u32 = 8;

#[derive(Debug, Clone)]
pub struct ExecutionPipeline {
    side: Side,
    ledger: TradeLedger,
}

impl ExecutionPipeline {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            ledger: TradeLedger::new(),
        }
    }

    pub fn long() -> Self {
        Self::new(Side::Long)
    }

    pub fn short() -> Self {
        Self::new(Side::Short)
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    /// Opens a trade sized as a fraction of `available_cash`. The ledger is
    /// untouched on error.
    pub fn execute_trade(
        &mut self,
        instrument: &Observation,
        trade_proportion: Decimal,
        available_cash: Quote,
        ids: &mut TradeIdSequence,
    ) -> Result<Trade, ExecutionError> {
        let size = available_cash.mul(trade_proportion);
        let insufficient = || ExecutionError::InsufficientFunds {
            symbol: instrument.symbol.clone(),
            size,
            available: available_cash,
            price: instrument.price,
        };

        let price = instrument.valid_price().ok_or_else(insufficient)?;
        if size.value() <= Decimal::ZERO || size > available_cash {
            return Err(insufficient());
        }
        let quantity = size
            .value()
            .checked_div(price.value())
            .ok_or_else(insufficient)?
            .round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::ToZero);
        if quantity.is_zero() {
            return Err(insufficient());
        }

        let trade = Trade::open(
            ids.next_id(),
            instrument.symbol.clone(),
            self.side,
            quantity,
            price,
            instrument.timestamp,
        );
        self.ledger.insert(trade.clone())?;
        Ok(trade)
    }

    pub fn close_trade(
        &mut self,
        id: TradeId,
        exit_price: Price,
        reason: CloseReason,
        timestamp: Timestamp,
    ) -> Result<Trade, ExecutionError> {
        Ok(self.ledger.close(id, exit_price, reason, timestamp)?)
    }

    /// Closes every open trade on this leg at current quotes.
    pub fn close_all(
        &mut self,
        quotes: &Quotes,
        reason: CloseReason,
        timestamp: Timestamp,
    ) -> Result<Vec<Trade>, ExecutionError> {
        let marks = self.open_marks(quotes)?;
        marks
            .into_iter()
            .map(|(id, mark)| self.close_trade(id, mark, reason, timestamp))
            .collect()
    }

    pub fn rollback(&mut self, id: TradeId) -> Result<Trade, ExecutionError> {
        Ok(self.ledger.rollback(id)?)
    }

    // 5.1: force-close every open trade whose loss fraction reached the stop.
    pub fn manage_risk(
        &mut self,
        quotes: &Quotes,
        stop_loss: &StopLoss,
        timestamp: Timestamp,
    ) -> Result<Vec<Trade>, ExecutionError> {
        let breached: Vec<(TradeId, Price)> = self
            .open_marks(quotes)?
            .into_iter()
            .filter(|(id, mark)| {
                self.ledger
                    .get(*id)
                    .map(|trade| stop_loss.is_breached(trade, *mark))
                    .unwrap_or(false)
            })
            .collect();

        breached
            .into_iter()
            .map(|(id, mark)| self.close_trade(id, mark, CloseReason::StopLoss, timestamp))
            .collect()
    }

    // 5.2: cash the open trades would return if closed now.
    pub fn calculate_value(&self, quotes: &Quotes) -> Result<Quote, ExecutionError> {
        let mut value = Quote::zero();
        for trade in self.ledger.open_trades() {
            value = value.add(trade.market_value(quotes.price(&trade.symbol)?));
        }
        Ok(value)
    }

    /// Realized pnl of closed trades plus unrealized pnl of open ones.
    pub fn calculate_profit(&self, quotes: &Quotes) -> Result<Quote, ExecutionError> {
        let mut profit = self.realized_pnl();
        for trade in self.ledger.open_trades() {
            profit = profit.add(trade.unrealized_pnl(quotes.price(&trade.symbol)?));
        }
        Ok(profit)
    }

    pub fn realized_pnl(&self) -> Quote {
        self.ledger
            .closed_trades()
            .iter()
            .filter_map(|t| t.realized_pnl)
            .sum()
    }

    pub fn open_cost_basis(&self) -> Quote {
        self.ledger.open_trades().map(|t| t.cost_basis()).sum()
    }

    fn open_marks(&self, quotes: &Quotes) -> Result<Vec<(TradeId, Price)>, ExecutionError> {
        self.ledger
            .open_trades()
            .map(|t| Ok((t.id, quotes.price(&t.symbol)?)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error("Insufficient funds for {symbol}: size {size} at price {price}, available {available}")]
    InsufficientFunds {
        symbol: Symbol,
        size: Quote,
        available: Quote,
        price: Decimal,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Market error: {0}")]
    Market(#[from] MarketError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::TradeStatus;
    use rust_decimal_macros::dec;

    fn obs(symbol: &str, price: Decimal) -> Observation {
        Observation::new(symbol, price, Timestamp::from_millis(0))
    }

    fn quotes(price: Decimal) -> Quotes {
        Quotes::from_observations(&[obs("AMZN", price)])
    }

    #[test]
    fn sizing_uses_proportion_of_cash() {
        let mut longs = ExecutionPipeline::long();
        let mut ids = TradeIdSequence::new();

        let trade = longs
            .execute_trade(&obs("AMZN", dec!(100)), dec!(0.05), Quote::new(dec!(100000)), &mut ids)
            .unwrap();

        assert_eq!(trade.side, Side::Long);
        assert_eq!(trade.quantity, dec!(50));
        assert_eq!(trade.cost_basis().value(), dec!(5000));
        assert_eq!(trade.status, TradeStatus::Open);
        assert!(longs.ledger().is_open(trade.id));
    }

    #[test]
    fn insufficient_funds_leaves_ledger_unchanged() {
        let mut shorts = ExecutionPipeline::short();
        let mut ids = TradeIdSequence::new();

        let zero_price = shorts.execute_trade(&obs("AMZN", dec!(0)), dec!(0.05), Quote::new(dec!(1000)), &mut ids);
        assert!(matches!(zero_price, Err(ExecutionError::InsufficientFunds { .. })));

        let no_cash = shorts.execute_trade(&obs("AMZN", dec!(10)), dec!(0.05), Quote::zero(), &mut ids);
        assert!(matches!(no_cash, Err(ExecutionError::InsufficientFunds { .. })));

        let overdrawn = shorts.execute_trade(&obs("AMZN", dec!(10)), dec!(1.5), Quote::new(dec!(1000)), &mut ids);
        assert!(matches!(overdrawn, Err(ExecutionError::InsufficientFunds { .. })));

        assert_eq!(shorts.ledger().open_count(), 0);
        assert_eq!(shorts.ledger().closed_count(), 0);
    }

    #[test]
    fn stop_loss_closes_only_breached_trades() {
        let mut longs = ExecutionPipeline::long();
        let mut ids = TradeIdSequence::new();
        longs
            .execute_trade(&obs("AMZN", dec!(100)), dec!(0.05), Quote::new(dec!(100000)), &mut ids)
            .unwrap();
        let stop = StopLoss::new(dec!(0.10));

        let closed = longs.manage_risk(&quotes(dec!(90.01)), &stop, Timestamp::from_millis(1)).unwrap();
        assert!(closed.is_empty());

        let closed = longs.manage_risk(&quotes(dec!(90)), &stop, Timestamp::from_millis(2)).unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].close_reason, Some(CloseReason::StopLoss));
        assert_eq!(closed[0].realized_pnl.unwrap().value(), dec!(-500));
        assert_eq!(longs.ledger().open_count(), 0);
        assert_eq!(longs.ledger().closed_count(), 1);
    }

    #[test]
    fn short_stop_triggers_on_rally() {
        let mut shorts = ExecutionPipeline::short();
        let mut ids = TradeIdSequence::new();
        shorts
            .execute_trade(&obs("AMZN", dec!(100)), dec!(0.05), Quote::new(dec!(100000)), &mut ids)
            .unwrap();
        let stop = StopLoss::new(dec!(0.10));

        assert!(shorts.manage_risk(&quotes(dec!(80)), &stop, Timestamp::from_millis(1)).unwrap().is_empty());
        assert_eq!(shorts.manage_risk(&quotes(dec!(110)), &stop, Timestamp::from_millis(2)).unwrap().len(), 1);
    }

    #[test]
    fn value_and_profit_aggregate_open_and_closed() {
        let mut longs = ExecutionPipeline::long();
        let mut ids = TradeIdSequence::new();
        let first = longs
            .execute_trade(&obs("AMZN", dec!(100)), dec!(0.05), Quote::new(dec!(100000)), &mut ids)
            .unwrap();
        longs
            .execute_trade(&obs("AMZN", dec!(100)), dec!(0.01), Quote::new(dec!(100000)), &mut ids)
            .unwrap();

        longs
            .close_trade(first.id, Price::new_unchecked(dec!(104)), CloseReason::Manual, Timestamp::from_millis(1))
            .unwrap();

        // open: 10 units @ 100, marked at 102
        let q = quotes(dec!(102));
        assert_eq!(longs.calculate_value(&q).unwrap().value(), dec!(1020));
        // realized 50 * 4 = 200, unrealized 10 * 2 = 20
        assert_eq!(longs.calculate_profit(&q).unwrap().value(), dec!(220));
        assert_eq!(longs.open_cost_basis().value(), dec!(1000));
    }

    #[test]
    fn missing_quote_is_reported() {
        let mut longs = ExecutionPipeline::long();
        let mut ids = TradeIdSequence::new();
        longs
            .execute_trade(&obs("AMZN", dec!(100)), dec!(0.05), Quote::new(dec!(100000)), &mut ids)
            .unwrap();

        let empty = Quotes::new();
        assert!(matches!(
            longs.calculate_value(&empty),
            Err(ExecutionError::Market(MarketError::MissingQuote(_)))
        ));
    }
}
