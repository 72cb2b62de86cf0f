//! Price data access port trait.

use crate::domain::error::SwitchbackError;
use crate::domain::ohlcv::PriceSeries;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Bars of one symbol at one interval whose local date falls in
/// `[start_date, end_date)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    pub symbol: String,
    /// Sampling interval label, e.g. `1d` or `5m`.
    pub interval: String,
    /// Timezone the series is quoted in.
    pub timezone: Tz,
    pub start_date: NaiveDate,
    /// Exclusive.
    pub end_date: NaiveDate,
}

impl SeriesRequest {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date < self.end_date
    }
}

pub trait DataPort {
    fn fetch_series(&self, request: &SeriesRequest) -> Result<PriceSeries, SwitchbackError>;

    /// First timestamp, last timestamp and bar count of the stored series.
    fn get_data_range(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, SwitchbackError>;
}
