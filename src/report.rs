// 9.0: read-only reporting over an engine. nothing here mutates state.

use crate::engine::{Engine, EngineError, ValuePoint};
use crate::market::Quotes;
use crate::types::{Quote, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-leg profit and value plus account totals, marked at one set of quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub long_profit: Quote,
    pub long_value: Quote,
    pub short_profit: Quote,
    pub short_value: Quote,
    /// (long profit + short profit) / starting cash
    pub roi: Decimal,
    /// (long value + short value) / starting cash
    pub value_ratio: Decimal,
    pub starting_cash: Quote,
    pub final_cash: Quote,
    pub final_equity: Quote,
    pub open_trades: usize,
    pub closed_trades: usize,
}

impl PerformanceSummary {
    pub fn from_engine(engine: &Engine, quotes: &Quotes) -> Result<Self, EngineError> {
        let long_profit = engine.longs().calculate_profit(quotes)?;
        let short_profit = engine.shorts().calculate_profit(quotes)?;
        let long_value = engine.longs().calculate_value(quotes)?;
        let short_value = engine.shorts().calculate_value(quotes)?;
        let starting_cash = engine.account().starting_cash;

        let roi = long_profit
            .add(short_profit)
            .value()
            .checked_div(starting_cash.value())
            .unwrap_or(Decimal::ZERO);
        let value_ratio = long_value
            .add(short_value)
            .value()
            .checked_div(starting_cash.value())
            .unwrap_or(Decimal::ZERO);

        let open_trades = engine.longs().ledger().open_count() + engine.shorts().ledger().open_count();
        let closed_trades = engine.longs().ledger().closed_count() + engine.shorts().ledger().closed_count();

        Ok(Self {
            long_profit,
            long_value,
            short_profit,
            short_value,
            roi,
            value_ratio,
            starting_cash,
            final_cash: engine.cash(),
            final_equity: engine.cash().add(long_value).add(short_value),
            open_trades,
            closed_trades,
        })
    }

    pub fn total_profit(&self) -> Quote {
        self.long_profit.add(self.short_profit)
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "long profit:  {}", self.long_profit)?;
        writeln!(f, "long value:   {}", self.long_value)?;
        writeln!(f, "short profit: {}", self.short_profit)?;
        writeln!(f, "short value:  {}", self.short_value)?;
        writeln!(f, "roi:          {}%", (self.roi * Decimal::ONE_HUNDRED).round_dp(4))?;
        writeln!(f, "value ratio:  {}", self.value_ratio.round_dp(6))?;
        writeln!(f, "cash:         {}", self.final_cash)?;
        writeln!(f, "equity:       {}", self.final_equity)?;
        write!(f, "trades:       {} open, {} closed", self.open_trades, self.closed_trades)
    }
}

/// Tick-over-tick returns on equity. Points whose previous equity is zero
/// are skipped.
pub fn simple_returns(series: &[ValuePoint]) -> Vec<(Timestamp, Decimal)> {
    series
        .windows(2)
        .filter_map(|w| {
            let prev = w[0].equity.value();
            let curr = w[1].equity.value();
            (curr - prev).checked_div(prev).map(|r| (w[1].timestamp, r))
        })
        .collect()
}

/// Compounded return across the whole series.
pub fn cumulative_return(series: &[ValuePoint]) -> Option<Decimal> {
    let first = series.first()?.equity.value();
    let last = series.last()?.equity.value();
    (last - first).checked_div(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyConfig;
    use crate::engine::EngineConfig;
    use crate::market::{Observation, PairHistory};
    use rust_decimal_macros::dec;

    fn point(ms: i64, equity: Decimal) -> ValuePoint {
        ValuePoint {
            timestamp: Timestamp::from_millis(ms),
            position_value: Quote::zero(),
            equity: Quote::new(equity),
        }
    }

    #[test]
    fn returns_follow_equity() {
        let series = [point(0, dec!(100)), point(1, dec!(110)), point(2, dec!(99))];
        let returns = simple_returns(&series);

        assert_eq!(returns.len(), 2);
        assert_eq!(returns[0], (Timestamp::from_millis(1), dec!(0.1)));
        assert_eq!(returns[1], (Timestamp::from_millis(2), dec!(-0.1)));
        assert_eq!(cumulative_return(&series), Some(dec!(-0.01)));
    }

    #[test]
    fn zero_equity_is_skipped() {
        let series = [point(0, dec!(0)), point(1, dec!(50)), point(2, dec!(100))];
        let returns = simple_returns(&series);
        assert_eq!(returns, vec![(Timestamp::from_millis(2), dec!(1))]);
    }

    #[test]
    fn summary_reports_profit_and_value_ratios() {
        let obs = |symbol: &str, price: Decimal, ms: i64| Observation::new(symbol, price, Timestamp::from_millis(ms));
        let strategy = StrategyConfig {
            short_window: 1,
            long_window: 4,
            ..StrategyConfig::development()
        };
        let mut engine = Engine::new(strategy, EngineConfig::default()).unwrap();
        engine
            .initialize(&PairHistory::new(
                (0..4).map(|i| obs("AMZN", dec!(100), i)).collect(),
                (0..4).map(|i| obs("TSLA", dec!(100), i)).collect(),
            ))
            .unwrap();
        // short AMZN 40 @ 125, long TSLA 50 @ 100
        engine.tick(&obs("AMZN", dec!(125), 4), &obs("TSLA", dec!(100), 4)).unwrap();

        let quotes = Quotes::from_observations(&[obs("AMZN", dec!(120), 5), obs("TSLA", dec!(102), 5)]);
        let summary = PerformanceSummary::from_engine(&engine, &quotes).unwrap();
        assert_eq!(summary.short_profit.value(), dec!(200));
        assert_eq!(summary.long_profit.value(), dec!(100));
        assert_eq!(summary.roi, dec!(0.003));
        assert_eq!(summary.value_ratio, dec!(0.103));
        assert!(summary.to_string().contains("value ratio:  0.103"));
    }

    #[test]
    fn empty_series() {
        assert!(simple_returns(&[]).is_empty());
        assert_eq!(cumulative_return(&[]), None);
    }
}
