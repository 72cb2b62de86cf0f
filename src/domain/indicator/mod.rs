//! Technical indicators over the daily reference series.
//!
//! - `IndicatorPoint`: one value plus its warmup flag
//! - `IndicatorType`: indicator identity + parameters, used for display
//! - `IndicatorFrame`: per-date RSI/MACD rows for a reference series

pub mod ema;
pub mod macd;
pub mod rsi;

use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::ohlcv::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub valid: bool,
    pub value: f64,
}

impl IndicatorPoint {
    pub fn invalid() -> Self {
        IndicatorPoint {
            valid: false,
            value: 0.0,
        }
    }

    pub fn get(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        IndicatorSettings {
            rsi_period: rsi::DEFAULT_PERIOD,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
        }
    }
}

impl IndicatorSettings {
    pub fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::Rsi(self.rsi_period),
            IndicatorType::Macd {
                fast: self.macd_fast,
                slow: self.macd_slow,
                signal: self.macd_signal,
            },
        ]
    }
}

/// Indicator state for one daily reference bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    /// `None` while the RSI smoothing window is warming up.
    pub rsi: Option<f64>,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
}

/// RSI/MACD values for every bar of the reference series, keyed by the
/// bar's local calendar date.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    rows: BTreeMap<NaiveDate, IndicatorRow>,
}

impl IndicatorFrame {
    pub fn compute(reference: &PriceSeries, settings: &IndicatorSettings) -> Self {
        let closes = reference.closes();
        let rsi = rsi::calculate_rsi(&closes, settings.rsi_period);
        let macd = macd::calculate_macd(
            &closes,
            settings.macd_fast,
            settings.macd_slow,
            settings.macd_signal,
        );

        let mut rows = BTreeMap::new();
        for (i, bar) in reference.bars().iter().enumerate() {
            let date = reference.local_date(bar);
            let row = IndicatorRow {
                date,
                rsi: rsi.get(i).and_then(IndicatorPoint::get),
                macd: macd.line.get(i).copied().unwrap_or(f64::NAN),
                macd_signal: macd.signal.get(i).copied().unwrap_or(f64::NAN),
                macd_histogram: macd.histogram.get(i).copied().unwrap_or(f64::NAN),
            };
            rows.insert(date, row);
        }

        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&IndicatorRow> {
        self.rows.get(&date)
    }

    pub fn rows(&self) -> impl Iterator<Item = &IndicatorRow> {
        self.rows.values()
    }

    /// Rows re-keyed by the date they decide: the close of reference date D
    /// governs trading on calendar date D+1 (not the next trading day).
    pub fn decision_rows(&self) -> BTreeMap<NaiveDate, IndicatorRow> {
        self.rows
            .iter()
            .filter_map(|(date, row)| {
                date.checked_add_days(Days::new(1))
                    .map(|decision_date| (decision_date, *row))
            })
            .collect()
    }
}
