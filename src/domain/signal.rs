//! Signal policy: maps reference-series indicator state to a direction.

use std::fmt;

use crate::domain::indicator::IndicatorRow;
use crate::domain::instrument::InstrumentRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    EnterLeveraged,
    EnterInverse,
    NoAction,
}

impl Direction {
    /// Instrument to buy for this direction, if any.
    pub fn role(&self) -> Option<InstrumentRole> {
        match self {
            Direction::EnterLeveraged => Some(InstrumentRole::Leveraged),
            Direction::EnterInverse => Some(InstrumentRole::Inverse),
            Direction::NoAction => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::EnterLeveraged => "BUY_LEVERAGE",
            Direction::EnterInverse => "BUY_INVERSE",
            Direction::NoAction => "NEUTRAL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry rule, evaluated in order:
/// 1. rsi > long threshold and (no filter or macd > signal) -> leveraged
/// 2. rsi < short threshold and (no filter or macd < signal) -> inverse
/// 3. otherwise no action
///
/// Rule 1 wins when misconfigured thresholds let both match. NaN inputs
/// fail every comparison and fall through to `NoAction`.
pub fn decide_direction(
    rsi: f64,
    macd: f64,
    macd_signal: f64,
    rsi_long_threshold: f64,
    rsi_short_threshold: f64,
    use_macd_filter: bool,
) -> Direction {
    let bullish_macd = !use_macd_filter || macd > macd_signal;
    if rsi > rsi_long_threshold && bullish_macd {
        return Direction::EnterLeveraged;
    }

    let bearish_macd = !use_macd_filter || macd < macd_signal;
    if rsi < rsi_short_threshold && bearish_macd {
        return Direction::EnterInverse;
    }

    Direction::NoAction
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalPolicy {
    pub rsi_long_threshold: f64,
    pub rsi_short_threshold: f64,
    pub use_macd_filter: bool,
}

impl Default for SignalPolicy {
    fn default() -> Self {
        SignalPolicy {
            rsi_long_threshold: 70.0,
            rsi_short_threshold: 30.0,
            use_macd_filter: true,
        }
    }
}

impl SignalPolicy {
    pub fn decide_direction(&self, rsi: f64, macd: f64, macd_signal: f64) -> Direction {
        decide_direction(
            rsi,
            macd,
            macd_signal,
            self.rsi_long_threshold,
            self.rsi_short_threshold,
            self.use_macd_filter,
        )
    }

    /// Rows still in RSI warmup decide `NoAction`.
    pub fn decide_row(&self, row: &IndicatorRow) -> Direction {
        match row.rsi {
            Some(rsi) => self.decide_direction(rsi, row.macd, row.macd_signal),
            None => Direction::NoAction,
        }
    }
}
