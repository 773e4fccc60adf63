//! Stop-loss sweep across both legs.

use super::core::Engine;
use super::pairs::total_realized;
use super::results::{EngineError, EngineState};
use crate::events::{EventPayload, PairClosedEvent, TradeClosedEvent};
use crate::market::Quotes;
use crate::trade::{CloseReason, Trade};
use tracing::warn;

impl Engine {
    /// Force-closes breached trades, then unwinds whatever is left of the
    /// pair so no leg survives its sibling.
    pub(super) fn run_risk_checks(&mut self, quotes: &Quotes) -> Result<Vec<Trade>, EngineError> {
        if !self.has_open_pair() {
            return Ok(Vec::new());
        }
        self.ensure_quoted(quotes)?;

        let sweep = self
            .risk
            .sweep(&mut self.longs, &mut self.shorts, quotes, self.current_time)?;
        if sweep.is_empty() {
            return Ok(Vec::new());
        }
        self.state = EngineState::Closing;

        let mut closed = sweep.into_trades();
        for trade in &closed {
            self.settle(trade)?;
            self.emit_event(EventPayload::TradeClosed(TradeClosedEvent::from(trade)));
        }
        let stopped = closed.len();

        if self.has_open_pair() {
            closed.extend(self.close_all_open(quotes, CloseReason::PairUnwind)?);
        }

        let realized_pnl = total_realized(&closed);
        self.emit_event(EventPayload::PairClosed(PairClosedEvent {
            reason: CloseReason::StopLoss,
            trades: closed.iter().map(|t| t.id).collect(),
            realized_pnl,
        }));

        warn!(
            stopped,
            unwound = closed.len() - stopped,
            pnl = %realized_pnl,
            cash = %self.account.cash,
            "stop-loss triggered"
        );
        Ok(closed)
    }
}
