//! Price bars and per-instrument price series.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Chronologically ordered bars for one instrument at one sampling frequency.
///
/// Timestamps are absolute instants; `timezone` is the exchange timezone the
/// series is quoted in and decides which calendar date a bar belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    pub timezone: Tz,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Builds a series, sorting by timestamp and dropping repeated timestamps
    /// (the first bar seen for a timestamp is kept).
    pub fn new(symbol: impl Into<String>, timezone: Tz, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Self {
            symbol: symbol.into(),
            timezone,
            bars,
        }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Calendar date of `bar` in this series' own timezone.
    pub fn local_date(&self, bar: &PriceBar) -> NaiveDate {
        bar.timestamp.with_timezone(&self.timezone).date_naive()
    }

    /// Groups bars by local calendar date, each group in chronological order.
    pub fn bars_by_local_date(&self) -> BTreeMap<NaiveDate, Vec<&PriceBar>> {
        let mut days: BTreeMap<NaiveDate, Vec<&PriceBar>> = BTreeMap::new();
        for bar in &self.bars {
            days.entry(self.local_date(bar)).or_default().push(bar);
        }
        days
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|b| b.timestamp)
    }
}
