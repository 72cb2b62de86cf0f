#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Asia::Seoul;
use chrono_tz::Tz;
use std::collections::HashMap;
use switchback::domain::error::SwitchbackError;
pub use switchback::domain::ohlcv::{PriceBar, PriceSeries};
use switchback::ports::data_port::{DataPort, SeriesRequest};

pub const LEV: &str = "122630.KS";
pub const INV: &str = "252670.KS";
pub const REF: &str = "SPY";

/// In-memory price cache keyed by (symbol, interval).
pub struct MockDataPort {
    pub data: HashMap<(String, String), Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, interval: &str, series: &PriceSeries) -> Self {
        self.data.insert(
            (series.symbol.clone(), interval.to_string()),
            series.bars().to_vec(),
        );
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(&self, request: &SeriesRequest) -> Result<PriceSeries, SwitchbackError> {
        if let Some(reason) = self.errors.get(&request.symbol) {
            return Err(SwitchbackError::Database {
                reason: reason.clone(),
            });
        }
        let bars = self
            .data
            .get(&(request.symbol.clone(), request.interval.clone()))
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|bar| request.contains(bar.timestamp.with_timezone(&request.timezone).date_naive()))
            .collect();
        Ok(PriceSeries::new(&request.symbol, request.timezone, bars))
    }

    fn get_data_range(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, SwitchbackError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SwitchbackError::Database {
                reason: reason.clone(),
            });
        }
        match self.data.get(&(symbol.to_string(), interval.to_string())) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.timestamp).min().unwrap();
                let max = bars.iter().map(|b| b.timestamp).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn seoul(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    Seoul
        .from_local_datetime(&date.and_hms_opt(hour, minute, 0).unwrap())
        .unwrap()
        .with_timezone(&Utc)
}

pub fn make_bar(timestamp: DateTime<Utc>, open: f64, close: f64) -> PriceBar {
    PriceBar {
        timestamp,
        open,
        high: open.max(close),
        low: open.min(close),
        close,
        volume: 1_000,
    }
}

/// Five-minute Seoul bars from 09:00 on `date`. Each bar opens at the
/// previous close; the first opens at its own close.
pub fn session(date: NaiveDate, closes: &[f64]) -> Vec<PriceBar> {
    let start = seoul(date, 9, 0);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            make_bar(start + Duration::minutes(5 * i as i64), open, close)
        })
        .collect()
}

pub fn intraday(symbol: &str, sessions: Vec<Vec<PriceBar>>) -> PriceSeries {
    PriceSeries::new(symbol, Seoul, sessions.into_iter().flatten().collect())
}

/// New York daily closes at 16:00 ending on `last`, one per calendar day.
pub fn daily_reference(last: NaiveDate, closes: &[f64]) -> PriceSeries {
    let n = closes.len() as i64;
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let day = last - Duration::days(n - 1 - i as i64);
            let ts = New_York
                .from_local_datetime(&day.and_hms_opt(16, 0, 0).unwrap())
                .unwrap()
                .with_timezone(&Utc);
            make_bar(ts, close, close)
        })
        .collect();
    PriceSeries::new(REF, New_York, bars)
}

/// Strictly rising closes: RSI 100 and MACD above its signal, so every
/// decision after warmup is to buy the leveraged instrument.
pub fn bullish_reference(last: NaiveDate, days: usize) -> PriceSeries {
    let closes: Vec<f64> = (0..days).map(|i| 400.0 + i as f64).collect();
    daily_reference(last, &closes)
}

/// Strictly falling closes: every decision after warmup buys the inverse.
pub fn bearish_reference(last: NaiveDate, days: usize) -> PriceSeries {
    let closes: Vec<f64> = (0..days).map(|i| 400.0 - i as f64).collect();
    daily_reference(last, &closes)
}

pub fn market_timezone() -> Tz {
    Seoul
}
