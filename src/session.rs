//! Drives an engine from a market data source.
//!
//! Recoverable tick errors (an unfundable pair) are logged and counted.
//! Structural errors end the run.

use crate::engine::{Engine, EngineError, TickReport};
use crate::source::MarketDataSource;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub ticks: usize,
    pub pairs_opened: usize,
    pub rejected: usize,
    pub trades_closed: usize,
}

pub struct Session<S: MarketDataSource> {
    engine: Engine,
    source: S,
    stats: SessionStats,
}

impl<S: MarketDataSource> Session<S> {
    pub fn new(engine: Engine, source: S) -> Self {
        Self {
            engine,
            source,
            stats: SessionStats::default(),
        }
    }

    /// Seeds the engine from the source's history.
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        let history = self.source.history()?;
        self.engine.initialize(&history)
    }

    /// Processes the next observation pair. `Ok(None)` once the source is
    /// exhausted.
    pub fn step(&mut self) -> Result<Option<TickReport>, EngineError> {
        let Some((one, two)) = self.source.current()? else {
            return Ok(None);
        };

        self.stats.ticks += 1;
        match self.engine.tick(&one, &two) {
            Ok(report) => {
                if report.opened_pair() {
                    self.stats.pairs_opened += 1;
                }
                self.stats.trades_closed += report.closed_count();
                Ok(Some(report))
            }
            Err(e) => {
                if !e.is_fatal() {
                    self.stats.rejected += 1;
                }
                Err(e)
            }
        }
    }

    /// Seeds, then ticks until the source runs dry or a structural error.
    pub fn run(&mut self) -> Result<SessionStats, EngineError> {
        self.initialize()?;
        info!(
            one = %self.engine.pair().one,
            two = %self.engine.pair().two,
            "session started"
        );

        loop {
            match self.step() {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) if !e.is_fatal() => {
                    warn!(tick = self.stats.ticks, error = %e, "tick rejected");
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            ticks = self.stats.ticks,
            pairs = self.stats.pairs_opened,
            rejected = self.stats.rejected,
            cash = %self.engine.cash(),
            "session finished"
        );
        Ok(self.stats)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }
}
