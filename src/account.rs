//! Cash account.
//!
//! A single balance settled by trade lifecycle events. Each event (open or
//! close of a given trade) moves cash exactly once.
//!
//! Cash convention, identical for both sides: opening reserves the cost
//! basis (`quantity * entry_price`) as a debit. For a short this is margin
//! held against the borrowed instrument, not proceeds received. Closing
//! credits the cost basis plus the realized pnl. Hence at all times
//! `cash + open cost basis == starting cash + realized pnl`.
//!
//! The balance is signed. Legs are sized off the cash held before a pair
//! opens, so a large trade proportion can take it below zero.

use crate::trade::{Trade, TradeStatus};
use crate::types::{Quote, TradeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub starting_cash: Quote,
    pub cash: Quote,
    pub realized_pnl: Quote,
    settled: HashSet<(TradeId, TradeStatus)>,
}

impl Account {
    pub fn new(starting_cash: Quote) -> Self {
        Self {
            starting_cash,
            cash: starting_cash,
            realized_pnl: Quote::zero(),
            settled: HashSet::new(),
        }
    }

    /// Applies the cash effect of the trade's current status. Returns the
    /// signed amount applied.
    pub fn execute_trade(&mut self, trade: &Trade) -> Result<Quote, AccountError> {
        let key = (trade.id, trade.status);
        if self.settled.contains(&key) {
            return Err(AccountError::DuplicateSettlement {
                trade_id: trade.id,
                status: trade.status,
            });
        }

        if trade.status == TradeStatus::Closed {
            if !self.settled.contains(&(trade.id, TradeStatus::Open)) {
                return Err(AccountError::NeverOpened(trade.id));
            }
            if let Some(pnl) = trade.realized_pnl {
                self.realized_pnl = self.realized_pnl.add(pnl);
            }
        }

        let effect = trade.cash_effect();
        self.cash = self.cash.add(effect);
        self.settled.insert(key);
        Ok(effect)
    }

    /// Cash plus what open positions would return if closed now.
    pub fn equity(&self, position_value: Quote) -> Quote {
        self.cash.add(position_value)
    }

    /// Zero while books balance.
    pub fn residual(&self, open_cost_basis: Quote) -> Quote {
        self.cash
            .add(open_cost_basis)
            .sub(self.realized_pnl)
            .sub(self.starting_cash)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccountError {
    #[error("Trade {trade_id} already settled as {status:?}")]
    DuplicateSettlement { trade_id: TradeId, status: TradeStatus },

    #[error("Trade {0} closed without an opening settlement")]
    NeverOpened(TradeId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::CloseReason;
    use crate::types::{Price, Side, Symbol, Timestamp};
    use rust_decimal_macros::dec;

    fn test_account() -> Account {
        Account::new(Quote::new(dec!(100000)))
    }

    fn trade(id: u64, side: Side) -> Trade {
        Trade::open(
            TradeId(id),
            Symbol::new("AMZN"),
            side,
            dec!(50),
            Price::new_unchecked(dec!(100)),
            Timestamp::from_millis(0),
        )
    }

    #[test]
    fn open_debits_cost_basis_for_both_sides() {
        let mut account = test_account();
        account.execute_trade(&trade(1, Side::Long)).unwrap();
        account.execute_trade(&trade(2, Side::Short)).unwrap();

        assert_eq!(account.cash.value(), dec!(90000));
        assert_eq!(account.residual(Quote::new(dec!(10000))), Quote::zero());
    }

    #[test]
    fn close_credits_cost_plus_pnl() {
        let mut account = test_account();
        let mut long = trade(1, Side::Long);
        let mut short = trade(2, Side::Short);
        account.execute_trade(&long).unwrap();
        account.execute_trade(&short).unwrap();

        long.close(Price::new_unchecked(dec!(110)), CloseReason::ExitSignal, Timestamp::from_millis(1));
        short.close(Price::new_unchecked(dec!(110)), CloseReason::ExitSignal, Timestamp::from_millis(1));

        assert_eq!(account.execute_trade(&long).unwrap().value(), dec!(5500));
        assert_eq!(account.execute_trade(&short).unwrap().value(), dec!(4500));

        assert_eq!(account.cash.value(), dec!(100000));
        assert_eq!(account.realized_pnl, Quote::zero());
        assert_eq!(account.residual(Quote::zero()), Quote::zero());
    }

    #[test]
    fn settlement_happens_once() {
        let mut account = test_account();
        let t = trade(1, Side::Long);
        account.execute_trade(&t).unwrap();

        let err = account.execute_trade(&t).unwrap_err();
        assert!(matches!(err, AccountError::DuplicateSettlement { .. }));
        assert_eq!(account.cash.value(), dec!(95000));
    }

    #[test]
    fn close_without_open_is_rejected() {
        let mut account = test_account();
        let mut t = trade(1, Side::Long);
        t.close(Price::new_unchecked(dec!(100)), CloseReason::Manual, Timestamp::from_millis(1));

        assert_eq!(account.execute_trade(&t), Err(AccountError::NeverOpened(TradeId(1))));
        assert_eq!(account.cash.value(), dec!(100000));
    }

    #[test]
    fn open_beyond_cash_goes_negative() {
        let mut account = Account::new(Quote::new(dec!(1000)));
        account.execute_trade(&trade(1, Side::Short)).unwrap();

        assert_eq!(account.cash.value(), dec!(-4000));
        assert_eq!(account.residual(Quote::new(dec!(5000))), Quote::zero());
    }

    #[test]
    fn equity_includes_position_value() {
        let mut account = test_account();
        account.execute_trade(&trade(1, Side::Long)).unwrap();
        assert_eq!(account.equity(Quote::new(dec!(5200))).value(), dec!(100200));
    }
}
