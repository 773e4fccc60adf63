// 7.0 config.rs: strategy settings in one place. instruments, windows, thresholds, sizing, stop.
// 7.1 presets mirror the research defaults. 7.2 validation runs before any engine exists.

use crate::market::InstrumentPair;
use crate::risk::StopLoss;
use crate::signal::SignalThresholds;
use crate::types::{Quote, Symbol};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound on starting cash. Keeps every cash and pnl sum well inside
/// `Decimal`'s range.
pub const MAX_STARTING_CASH: Decimal = dec!(1000000000000000);

// Complete configuration for one pairs strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    // First instrument. the ratio is one / two
    pub instrument_one: Symbol,
    // Second instrument
    pub instrument_two: Symbol,
    // Cash available at start, in (0, MAX_STARTING_CASH]
    pub starting_cash: Decimal,
    // Short rolling window (observations)
    pub short_window: usize,
    // Long rolling window (observations), also used for the std
    pub long_window: usize,
    // Loss fraction of entry price that force-closes a trade, in (0, 1)
    pub stop_loss_fraction: Decimal,
    // Fraction of cash committed per leg, in (0, 1]
    pub trade_proportion: Decimal,
    // |zscore| at or above this opens a pair
    pub entry_zscore: Decimal,
    // |zscore| below this closes the pair
    pub exit_zscore: Decimal,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl StrategyConfig {
    /** 7.1: research defaults. AMZN/TSLA, 5/50 windows, 10% stop, 5% per leg */
    pub fn development() -> Self {
        Self {
            instrument_one: Symbol::new("AMZN"),
            instrument_two: Symbol::new("TSLA"),
            starting_cash: dec!(100000),
            short_window: 5,
            long_window: 50,
            stop_loss_fraction: dec!(0.10),
            trade_proportion: dec!(0.05),
            entry_zscore: dec!(1.0),
            exit_zscore: dec!(0.0),
        }
    }

    // same sizing, but actually exits on mean reversion
    pub fn reverting() -> Self {
        Self {
            exit_zscore: dec!(0.25),
            ..Self::development()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    // 7.2: every bound the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instrument_one == self.instrument_two {
            return Err(ConfigError::DuplicateInstrument(self.instrument_one.clone()));
        }
        if self.starting_cash <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveCash(self.starting_cash));
        }
        if self.starting_cash > MAX_STARTING_CASH {
            return Err(ConfigError::CashTooLarge(self.starting_cash));
        }
        if self.short_window == 0 || self.short_window >= self.long_window {
            return Err(ConfigError::InvalidWindows {
                short: self.short_window,
                long: self.long_window,
            });
        }
        if self.stop_loss_fraction <= Decimal::ZERO || self.stop_loss_fraction >= Decimal::ONE {
            return Err(ConfigError::StopLossOutOfRange(self.stop_loss_fraction));
        }
        if self.trade_proportion <= Decimal::ZERO || self.trade_proportion > Decimal::ONE {
            return Err(ConfigError::TradeProportionOutOfRange(self.trade_proportion));
        }
        if self.exit_zscore < Decimal::ZERO || self.entry_zscore <= self.exit_zscore {
            return Err(ConfigError::InvalidThresholds {
                entry: self.entry_zscore,
                exit: self.exit_zscore,
            });
        }
        Ok(())
    }

    pub fn pair(&self) -> InstrumentPair {
        InstrumentPair::new(self.instrument_one.clone(), self.instrument_two.clone())
    }

    pub fn thresholds(&self) -> SignalThresholds {
        SignalThresholds::new(self.entry_zscore, self.exit_zscore)
    }

    pub fn stop_loss(&self) -> StopLoss {
        StopLoss::new(self.stop_loss_fraction)
    }

    pub fn starting_quote(&self) -> Quote {
        Quote::new(self.starting_cash)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Starting cash must be positive, got {0}")]
    NonPositiveCash(Decimal),

    #[error("Starting cash must not exceed {max}, got {0}", max = MAX_STARTING_CASH)]
    CashTooLarge(Decimal),

    #[error("Windows must satisfy 0 < short < long, got short={short} long={long}")]
    InvalidWindows { short: usize, long: usize },

    #[error("Stop loss fraction must be in (0, 1), got {0}")]
    StopLossOutOfRange(Decimal),

    #[error("Trade proportion must be in (0, 1], got {0}")]
    TradeProportionOutOfRange(Decimal),

    #[error("Thresholds must satisfy entry > exit >= 0, got entry={entry} exit={exit}")]
    InvalidThresholds { entry: Decimal, exit: Decimal },

    #[error("Both legs use instrument {0}")]
    DuplicateInstrument(Symbol),

    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Config read error: {0}")]
    Io(String),
}
