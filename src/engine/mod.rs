// 8.0: pairs engine. coordinates indicator updates, signal evaluation,
// paired execution, stop-loss sweeps, exits, and cash settlement.
// deterministic and tick-driven with no external I/O.

mod config;
mod core;
mod pairs;
mod results;
mod stops;
mod tick;

pub use config::EngineConfig;
pub use core::Engine;
pub use results::{EngineError, EngineState, TickReport, ValuePoint};
