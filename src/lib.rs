// pairs-core: pairs trading engine for two correlated instruments.
// risk-first: the stop-loss sweep runs every tick, independent of signals.
// all computation is deterministic with no external I/O in the engine.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: Symbol, TradeId, Side, Price, Quote, Timestamp
//   2.x  indicator.rs: rolling ratio windows, means, std, z-score
//   3.x  signal.rs: z-score thresholds, pair directives
//   4.x  trade.rs + ledger.rs: trade lifecycle, per-leg open/closed books
//   5.x  execution.rs: per-side pipelines, sizing, stop sweep, valuation
//   6.x  risk.rs: stop-loss rule and two-leg sweep
//   7.x  config.rs: strategy settings, presets, TOML loading
//   8.x  engine/: orchestrator: tick, pair entry/unwind, stops, events
//   9.x  report.rs: performance summary, return series
//   10.x account.rs: cash settlement
//   11.x events.rs: state transition events for audit
//   12.x market.rs: observations, quotes, pair history
//   13.x source.rs + session.rs: data sources and the run loop

// core trading modules
pub mod account;
pub mod engine;
pub mod events;
pub mod execution;
pub mod indicator;
pub mod ledger;
pub mod market;
pub mod signal;
pub mod trade;
pub mod types;

// risk
pub mod risk;

// integration modules
pub mod config;
pub mod report;
pub mod session;
pub mod source;

// re exports for convenience
pub use account::*;
pub use engine::*;
pub use events::*;
pub use execution::*;
pub use indicator::*;
pub use ledger::*;
pub use market::*;
pub use risk::*;
pub use signal::*;
pub use trade::*;
pub use types::*;
pub use config::{ConfigError, StrategyConfig, MAX_STARTING_CASH};
pub use report::{cumulative_return, simple_returns, PerformanceSummary};
pub use session::{Session, SessionStats};
pub use source::{MarketDataSource, ReplaySource, SourceError};
