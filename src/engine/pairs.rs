//! Pair entry and pair unwind.
//!
//! Both legs open together or not at all. A pair closes as a unit: every
//! open trade on both ledgers is closed at the same quotes and settled.

use super::core::Engine;
use super::results::{EngineError, EngineState};
use crate::events::{EventPayload, PairClosedEvent, PairOpenedEvent, PairRejectedEvent, TradeClosedEvent, TradeOpenedEvent};
use crate::market::{Observation, Quotes};
use crate::signal::{PairDirective, PairSignal};
use crate::trade::{CloseReason, Trade};
use crate::types::{Quote, Symbol};
use rust_decimal::Decimal;
use tracing::{info, warn};

impl Engine {
    /// Opens the short leg then the long leg, both sized off the cash held
    /// before either opened. Each leg fails on its own terms; a failed long
    /// leg rolls back the short one. Cash only moves once both legs exist.
    pub(super) fn open_pair(
        &mut self,
        directive: &PairDirective,
        signal: PairSignal,
        zscore: Decimal,
        one: &Observation,
        two: &Observation,
    ) -> Result<Vec<Trade>, EngineError> {
        let available = self.account.cash;
        let proportion = self.strategy.trade_proportion;
        let short_obs = leg_observation(&directive.short.symbol, one, two);
        let long_obs = leg_observation(&directive.long.symbol, one, two);

        let short = match self
            .shorts
            .execute_trade(short_obs, proportion, available, &mut self.trade_ids)
        {
            Ok(trade) => trade,
            Err(e) => return Err(self.reject_pair(signal, zscore, e.into())),
        };

        let long = match self
            .longs
            .execute_trade(long_obs, proportion, available, &mut self.trade_ids)
        {
            Ok(trade) => trade,
            Err(e) => {
                self.shorts.rollback(short.id)?;
                return Err(self.reject_pair(signal, zscore, e.into()));
            }
        };

        for trade in [&short, &long] {
            self.settle(trade)?;
            self.emit_event(EventPayload::TradeOpened(TradeOpenedEvent::from(trade)));
        }
        self.emit_event(EventPayload::PairOpened(PairOpenedEvent {
            signal,
            zscore,
            short_trade: short.id,
            long_trade: long.id,
        }));
        self.state = EngineState::Tracking;

        info!(
            ?signal,
            %zscore,
            short = %short.symbol,
            long = %long.symbol,
            cost = %short.cost_basis().add(long.cost_basis()),
            cash = %self.account.cash,
            "pair opened"
        );
        Ok(vec![short, long])
    }

    fn reject_pair(&mut self, signal: PairSignal, zscore: Decimal, err: EngineError) -> EngineError {
        warn!(?signal, %zscore, error = %err, "pair rejected");
        self.emit_event(EventPayload::PairRejected(PairRejectedEvent {
            signal,
            zscore,
            reason: err.to_string(),
        }));
        err
    }

    /// Closes every open trade on both legs and settles each close. Quotes
    /// are checked for every open trade first so a missing price cannot
    /// leave the pair half closed.
    pub(super) fn close_all_open(
        &mut self,
        quotes: &Quotes,
        reason: CloseReason,
    ) -> Result<Vec<Trade>, EngineError> {
        self.ensure_quoted(quotes)?;
        let timestamp = self.current_time;

        let mut closed = self.shorts.close_all(quotes, reason, timestamp)?;
        closed.extend(self.longs.close_all(quotes, reason, timestamp)?);

        for trade in &closed {
            self.settle(trade)?;
            self.emit_event(EventPayload::TradeClosed(TradeClosedEvent::from(trade)));
        }
        Ok(closed)
    }

    /// Unwinds the tracked pair and records it as one close.
    pub(super) fn close_pair(&mut self, quotes: &Quotes, reason: CloseReason) -> Result<Vec<Trade>, EngineError> {
        if !self.has_open_pair() {
            return Ok(Vec::new());
        }
        self.state = EngineState::Closing;

        let closed = self.close_all_open(quotes, reason)?;
        let realized_pnl = total_realized(&closed);
        self.emit_event(EventPayload::PairClosed(PairClosedEvent {
            reason,
            trades: closed.iter().map(|t| t.id).collect(),
            realized_pnl,
        }));

        info!(?reason, trades = closed.len(), pnl = %realized_pnl, cash = %self.account.cash, "pair closed");
        Ok(closed)
    }

    /// Flattens the tracked pair at the given prices. Indicators are not
    /// updated.
    pub fn unwind_pair(&mut self, one: &Observation, two: &Observation) -> Result<Vec<Trade>, EngineError> {
        self.pair.check_observations(one, two)?;
        let quotes = Quotes::from_observations([one, two]);
        for observation in [one, two] {
            quotes.price(&observation.symbol)?;
        }

        self.current_time = one.timestamp;
        let closed = self.close_pair(&quotes, CloseReason::Manual)?;
        self.finish_tick(&quotes)?;
        Ok(closed)
    }
}

fn leg_observation<'a>(symbol: &Symbol, one: &'a Observation, two: &'a Observation) -> &'a Observation {
    if &one.symbol == symbol {
        one
    } else {
        two
    }
}

pub(super) fn total_realized(trades: &[Trade]) -> Quote {
    trades.iter().filter_map(|t| t.realized_pnl).sum()
}
