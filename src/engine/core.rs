// 8.0 engine/core.rs: main engine. holds indicators, both legs, the account, and the audit log.

use super::config::EngineConfig;
use super::results::{EngineError, EngineState, ValuePoint};
use crate::account::Account;
use crate::config::StrategyConfig;
use crate::events::{CashSettledEvent, Event, EventId, EventPayload};
use crate::execution::ExecutionPipeline;
use crate::indicator::IndicatorEngine;
use crate::ledger::TradeIdSequence;
use crate::market::{InstrumentPair, PairHistory, Quotes};
use crate::risk::RiskManager;
use crate::signal::SignalThresholds;
use crate::trade::Trade;
use crate::types::{Quote, Timestamp};
use tracing::{debug, info};

/** 8.1: main engine struct. all state lives here */
#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) strategy: StrategyConfig,
    pub(super) pair: InstrumentPair,
    pub(super) thresholds: SignalThresholds,
    pub(super) indicators: IndicatorEngine,
    pub(super) longs: ExecutionPipeline,
    pub(super) shorts: ExecutionPipeline,
    pub(super) account: Account,
    pub(super) risk: RiskManager,
    pub(super) trade_ids: TradeIdSequence,
    pub(super) state: EngineState,
    pub(super) last_quotes: Quotes,
    pub(super) values: Vec<ValuePoint>,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
}

impl Engine {
    pub fn new(strategy: StrategyConfig, config: EngineConfig) -> Result<Self, EngineError> {
        strategy.validate()?;

        Ok(Self {
            indicators: IndicatorEngine::new(strategy.short_window, strategy.long_window),
            pair: strategy.pair(),
            thresholds: strategy.thresholds(),
            account: Account::new(strategy.starting_quote()),
            risk: RiskManager::new(strategy.stop_loss()),
            longs: ExecutionPipeline::long(),
            shorts: ExecutionPipeline::short(),
            trade_ids: TradeIdSequence::new(),
            state: EngineState::Idle,
            last_quotes: Quotes::new(),
            values: Vec::new(),
            events: Vec::new(),
            next_event_id: 1,
            current_time: Timestamp::from_millis(0),
            strategy,
            config,
        })
    }

    /// Seeds the indicators from history. Must complete before the first tick.
    pub fn initialize(&mut self, history: &PairHistory) -> Result<(), EngineError> {
        for (one, two) in history.pairs() {
            self.pair.check_observations(one, two)?;
        }
        self.indicators.initialize(&history.one, &history.two)?;

        if let Some(last) = history.one.last() {
            self.current_time = last.timestamp;
        }
        info!(
            one = %self.pair.one,
            two = %self.pair.two,
            seeded = history.len(),
            "indicators initialized"
        );
        Ok(())
    }

    pub fn strategy(&self) -> &StrategyConfig {
        &self.strategy
    }

    pub fn pair(&self) -> &InstrumentPair {
        &self.pair
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn indicators(&self) -> &IndicatorEngine {
        &self.indicators
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn cash(&self) -> Quote {
        self.account.cash
    }

    pub fn longs(&self) -> &ExecutionPipeline {
        &self.longs
    }

    pub fn shorts(&self) -> &ExecutionPipeline {
        &self.shorts
    }

    pub fn last_quotes(&self) -> &Quotes {
        &self.last_quotes
    }

    /// Per-tick position value and equity, oldest first.
    pub fn value_series(&self) -> &[ValuePoint] {
        &self.values
    }

    /// A pair is open while either ledger holds an open trade. The ledgers
    /// are the only record of what is open.
    pub fn has_open_pair(&self) -> bool {
        self.longs.ledger().has_open() || self.shorts.ledger().has_open()
    }

    /// Union of both legs' open trades, shorts first.
    pub fn open_positions(&self) -> Vec<&Trade> {
        self.shorts
            .ledger()
            .open_trades()
            .chain(self.longs.ledger().open_trades())
            .collect()
    }

    pub fn position_value(&self, quotes: &Quotes) -> Result<Quote, EngineError> {
        let long_value = self.longs.calculate_value(quotes)?;
        let short_value = self.shorts.calculate_value(quotes)?;
        Ok(long_value.add(short_value))
    }

    pub fn equity(&self, quotes: &Quotes) -> Result<Quote, EngineError> {
        Ok(self.account.equity(self.position_value(quotes)?))
    }

    /// `cash + open cost basis - realized pnl - starting cash`, with the pnl
    /// taken from the ledgers. Zero when account and ledgers agree.
    pub fn ledger_residual(&self) -> Quote {
        let open_cost = self.longs.open_cost_basis().add(self.shorts.open_cost_basis());
        let realized = self.longs.realized_pnl().add(self.shorts.realized_pnl());
        self.account
            .cash
            .add(open_cost)
            .sub(realized)
            .sub(self.account.starting_cash)
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Applies one trade event to the account and records it.
    pub(super) fn settle(&mut self, trade: &Trade) -> Result<Quote, EngineError> {
        let amount = self.account.execute_trade(trade)?;
        let new_cash = self.account.cash;
        self.emit_event(EventPayload::CashSettled(CashSettledEvent {
            trade_id: trade.id,
            amount,
            new_cash,
        }));
        Ok(amount)
    }

    pub(super) fn ensure_quoted(&self, quotes: &Quotes) -> Result<(), EngineError> {
        for trade in self.open_positions() {
            quotes.price(&trade.symbol)?;
        }
        Ok(())
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        if self.config.verbose {
            debug!(id = event.id.0, kind = event.payload.kind(), payload = ?event.payload, "event");
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Observation;
    use crate::types::Symbol;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn obs(symbol: &str, price: Decimal, ms: i64) -> Observation {
        Observation::new(symbol, price, Timestamp::from_millis(ms))
    }

    fn seeded(config: EngineConfig) -> Engine {
        let strategy = StrategyConfig {
            instrument_one: Symbol::new("AMZN"),
            instrument_two: Symbol::new("TSLA"),
            short_window: 1,
            long_window: 4,
            ..StrategyConfig::development()
        };
        let mut engine = Engine::new(strategy, config).unwrap();
        let history = PairHistory::new(
            (0..4).map(|i| obs("AMZN", dec!(100), i)).collect(),
            (0..4).map(|i| obs("TSLA", dec!(100), i)).collect(),
        );
        engine.initialize(&history).unwrap();
        engine
    }

    #[test]
    fn event_log_is_capped() {
        let mut engine = seeded(EngineConfig {
            max_events: 3,
            ..EngineConfig::default()
        });
        engine.tick(&obs("AMZN", dec!(125), 4), &obs("TSLA", dec!(100), 4)).unwrap();

        // two settlements, two trade opens, one pair open
        assert_eq!(engine.events().len(), 3);
        assert_eq!(engine.events()[0].id, EventId(3));
        assert_eq!(engine.recent_events(1)[0].payload.kind(), "pair_opened");
        assert_eq!(engine.recent_events(10).len(), 3);
    }

    #[test]
    fn value_recording_can_be_disabled() {
        let mut engine = seeded(EngineConfig {
            record_values: false,
            ..EngineConfig::default()
        });
        engine.tick(&obs("AMZN", dec!(125), 4), &obs("TSLA", dec!(100), 4)).unwrap();

        assert!(engine.value_series().is_empty());
        assert_eq!(engine.time(), Timestamp::from_millis(4));
        assert_eq!(engine.last_quotes().len(), 2);
    }

    #[test]
    fn residual_and_equity_while_tracking() {
        let mut engine = seeded(EngineConfig::default());
        engine.tick(&obs("AMZN", dec!(125), 4), &obs("TSLA", dec!(100), 4)).unwrap();
        assert_eq!(engine.state(), EngineState::Tracking);
        assert_eq!(engine.ledger_residual(), Quote::zero());

        // short AMZN 40 @ 125, long TSLA 50 @ 100
        let quotes = Quotes::from_observations(&[obs("AMZN", dec!(120), 5), obs("TSLA", dec!(102), 5)]);
        assert_eq!(engine.position_value(&quotes).unwrap().value(), dec!(10300));
        assert_eq!(engine.equity(&quotes).unwrap().value(), dec!(100300));

        let point = engine.value_series().last().unwrap();
        assert_eq!(point.position_value.value(), dec!(10000));
        assert_eq!(point.equity.value(), dec!(100000));
    }
}
