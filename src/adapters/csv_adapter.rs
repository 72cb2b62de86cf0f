//! CSV price cache adapter.
//!
//! One file per symbol and interval: `<cache_dir>/<symbol>_<interval>.csv`.
//! Columns are matched by header name, case-insensitively; the timestamp
//! column may be called `timestamp`, `datetime` or `date`.

use crate::domain::error::SwitchbackError;
use crate::domain::ohlcv::{PriceBar, PriceSeries};
use crate::ports::data_port::{DataPort, SeriesRequest};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use std::fs;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, interval))
    }

    /// Every bar in the cache file for `symbol`/`interval`.
    pub fn read_series(
        &self,
        symbol: &str,
        interval: &str,
        timezone: Tz,
    ) -> Result<PriceSeries, SwitchbackError> {
        let path = self.csv_path(symbol, interval);
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SwitchbackError::DataUnavailable {
                    symbol: symbol.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let bars = parse_price_csv(file, &path.display().to_string(), timezone)?;
        Ok(PriceSeries::new(symbol, timezone, bars))
    }

    /// `(symbol, interval)` pairs of all cache files, sorted.
    pub fn list_series(&self) -> Result<Vec<(String, String)>, SwitchbackError> {
        let mut series = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            let Some(stem) = name.strip_suffix(".csv") else {
                continue;
            };
            if let Some((symbol, interval)) = stem.rsplit_once('_') {
                series.push((symbol.to_string(), interval.to_string()));
            }
        }
        series.sort();
        Ok(series)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_series(&self, request: &SeriesRequest) -> Result<PriceSeries, SwitchbackError> {
        let series = self.read_series(&request.symbol, &request.interval, request.timezone)?;
        let bars = series
            .bars()
            .iter()
            .filter(|bar| request.contains(series.local_date(bar)))
            .cloned()
            .collect();
        Ok(PriceSeries::new(&request.symbol, request.timezone, bars))
    }

    fn get_data_range(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, SwitchbackError> {
        // the range is timezone independent; UTC is enough to place date-only rows
        let series = match self.read_series(symbol, interval, Tz::UTC) {
            Ok(s) => s,
            Err(SwitchbackError::DataUnavailable { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(series
            .first_timestamp()
            .zip(series.last_timestamp())
            .map(|(first, last)| (first, last, series.len())))
    }
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, source_name: &str) -> Result<Self, SwitchbackError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let require = |name: &str| {
            find(&[name]).ok_or_else(|| malformed(source_name, format!("missing {} column", name)))
        };

        Ok(Columns {
            timestamp: find(&["timestamp", "datetime", "date"]).unwrap_or(0),
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: require("volume")?,
        })
    }
}

/// Parses price rows from any CSV source.
///
/// Timestamps are RFC 3339 (`T` or space separated, with offset) or a bare
/// `YYYY-MM-DD`, which is read as local midnight in `timezone`. Volume may
/// be fractional and is truncated.
pub fn parse_price_csv<R: Read>(
    reader: R,
    source_name: &str,
    timezone: Tz,
) -> Result<Vec<PriceBar>, SwitchbackError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| malformed(source_name, format!("CSV header error: {}", e)))?
        .clone();
    let columns = Columns::from_headers(&headers, source_name)?;

    let mut bars = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| malformed(source_name, format!("CSV parse error: {}", e)))?;
        let row = line + 2;

        let field = |idx: usize, name: &str| {
            record
                .get(idx)
                .map(str::trim)
                .ok_or_else(|| malformed(source_name, format!("row {}: missing {} value", row, name)))
        };
        let number = |idx: usize, name: &str| -> Result<f64, SwitchbackError> {
            let raw = field(idx, name)?;
            raw.parse().map_err(|e| {
                malformed(source_name, format!("row {}: invalid {} value {:?}: {}", row, name, raw, e))
            })
        };

        let raw_ts = field(columns.timestamp, "timestamp")?;
        let timestamp = parse_timestamp(raw_ts, timezone).ok_or_else(|| {
            malformed(source_name, format!("row {}: invalid timestamp {:?}", row, raw_ts))
        })?;

        bars.push(PriceBar {
            timestamp,
            open: number(columns.open, "open")?,
            high: number(columns.high, "high")?,
            low: number(columns.low, "low")?,
            close: number(columns.close, "close")?,
            volume: number(columns.volume, "volume")? as i64,
        });
    }

    Ok(bars)
}

fn parse_timestamp(raw: &str, timezone: Tz) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    timezone
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}

fn malformed(source_name: &str, reason: String) -> SwitchbackError {
    SwitchbackError::DataFormat {
        source_name: source_name.to_string(),
        reason,
    }
}
