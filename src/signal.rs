// 3.0: signal generation. two stages:
//   (a) thresholds: zscore -> PairSignal. pure, no state.
//   (b) mapping: PairSignal + instrument pair -> concrete (symbol, side) legs.

use crate::market::InstrumentPair;
use crate::types::{Side, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalThresholds {
    pub entry_zscore: Decimal,
    pub exit_zscore: Decimal,
}

impl SignalThresholds {
    pub fn new(entry_zscore: Decimal, exit_zscore: Decimal) -> Self {
        Self {
            entry_zscore,
            exit_zscore,
        }
    }
}

/// Outcome of the threshold stage. Names read as (instrument one, instrument two).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairSignal {
    /// Ratio rich: short instrument one, long instrument two.
    ShortLong,
    /// Ratio cheap: long instrument one, short instrument two.
    LongShort,
    Neutral,
}

pub fn evaluate_signal(zscore: Decimal, thresholds: &SignalThresholds) -> PairSignal {
    if zscore >= thresholds.entry_zscore {
        PairSignal::ShortLong
    } else if zscore <= -thresholds.entry_zscore {
        PairSignal::LongShort
    } else {
        PairSignal::Neutral
    }
}

/// Degenerate or missing z-scores never signal.
pub fn evaluate_optional(zscore: Option<Decimal>, thresholds: &SignalThresholds) -> PairSignal {
    zscore.map_or(PairSignal::Neutral, |z| evaluate_signal(z, thresholds))
}

// |z| < exit. with exit = 0 this never fires.
pub fn should_exit(zscore: Decimal, thresholds: &SignalThresholds) -> bool {
    zscore.abs() < thresholds.exit_zscore
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegDirective {
    pub symbol: Symbol,
    pub side: Side,
}

/// Both legs of a pair entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairDirective {
    pub short: LegDirective,
    pub long: LegDirective,
}

impl PairSignal {
    pub fn directive(&self, pair: &InstrumentPair) -> Option<PairDirective> {
        let (short, long) = match self {
            PairSignal::ShortLong => (&pair.one, &pair.two),
            PairSignal::LongShort => (&pair.two, &pair.one),
            PairSignal::Neutral => return None,
        };
        Some(PairDirective {
            short: LegDirective {
                symbol: short.clone(),
                side: Side::Short,
            },
            long: LegDirective {
                symbol: long.clone(),
                side: Side::Long,
            },
        })
    }
}
