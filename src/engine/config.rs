//! Engine mechanics options. Strategy parameters live in `crate::config`.

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Mirror every event to the debug log.
    pub verbose: bool,
    /// Append a value point after every tick.
    pub record_values: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_events: 100_000,
            verbose: false,
            record_values: true,
        }
    }
}
