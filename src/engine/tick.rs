// 8.2: tick processing. order matters:
//   1. indicators  2. entry (only when flat)  3. stop-loss sweep  4. exit check

use super::core::Engine;
use super::results::{EngineError, EngineState, TickReport, ValuePoint};
use crate::indicator::IndicatorError;
use crate::market::{Observation, Quotes};
use crate::signal::{evaluate_optional, should_exit};
use crate::trade::CloseReason;
use tracing::debug;

impl Engine {
    /// Processes one observation pair, ordered (instrument one, instrument two).
    ///
    /// Fails with `UninitializedIndicator` before warm-up and touches nothing.
    /// A funding failure on entry is returned after the tick has otherwise
    /// completed, so state stays consistent and the caller may continue.
    pub fn tick(&mut self, one: &Observation, two: &Observation) -> Result<TickReport, EngineError> {
        if !self.indicators.is_ready() {
            return Err(IndicatorError::UninitializedIndicator.into());
        }
        self.pair.check_observations(one, two)?;

        let ratio = self.indicators.append(one, two)?;
        self.current_time = one.timestamp;
        self.state = EngineState::Evaluating;

        let quotes = Quotes::from_observations([one, two]);
        let zscore = self.indicators.zscore().ok();
        let signal = evaluate_optional(zscore, &self.thresholds);
        debug!(%ratio, zscore = ?zscore, ?signal, "tick evaluated");

        let mut report = TickReport::new(self.current_time, zscore, signal);

        // 8.2.1: entry
        if !self.has_open_pair() {
            if let (Some(directive), Some(z)) = (signal.directive(&self.pair), zscore) {
                self.state = EngineState::OpenPair;
                match self.open_pair(&directive, signal, z, one, two) {
                    Ok(opened) => report.opened = opened,
                    Err(e) if e.is_insufficient_funds() => {
                        self.finish_tick(&quotes)?;
                        return Err(e);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        // 8.2.2: stop-loss runs every tick regardless of the signal path
        report.stopped = self.run_risk_checks(&quotes)?;

        // 8.2.3: exit
        if let Some(z) = zscore {
            if self.has_open_pair() && should_exit(z, &self.thresholds) {
                report.exited = self.close_pair(&quotes, CloseReason::ExitSignal)?;
            }
        }

        self.finish_tick(&quotes)?;
        report.state = self.state;
        Ok(report)
    }

    /// Settles the resting state and records the tick's valuation.
    pub(super) fn finish_tick(&mut self, quotes: &Quotes) -> Result<(), EngineError> {
        self.state = if self.has_open_pair() {
            EngineState::Tracking
        } else {
            EngineState::Idle
        };

        if self.config.record_values {
            let position_value = self.position_value(quotes)?;
            self.values.push(ValuePoint {
                timestamp: self.current_time,
                position_value,
                equity: self.account.equity(position_value),
            });
        }
        self.last_quotes = quotes.clone();
        Ok(())
    }
}
