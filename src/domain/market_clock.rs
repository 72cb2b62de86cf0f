//! Conversion of a local wall-clock time on a trading date to an instant.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Localization {
    /// The local time mapped to exactly one instant.
    Localized,
    /// The local time was nonexistent or ambiguous; the naive time was
    /// taken as UTC instead.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInstant {
    pub instant: DateTime<Utc>,
    pub localization: Localization,
}

/// `date` + `time` read in `tz`, as an absolute instant.
///
/// Never fails: a wall-clock time inside a DST gap or overlap degrades to the
/// naive timestamp interpreted as UTC and is logged.
pub fn local_time_on_date(date: NaiveDate, time: NaiveTime, tz: Tz) -> EntryInstant {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) => EntryInstant {
            instant: local.with_timezone(&Utc),
            localization: Localization::Localized,
        },
        other => {
            let kind = match other {
                LocalResult::Ambiguous(..) => "ambiguous",
                _ => "nonexistent",
            };
            warn!(%date, %time, timezone = %tz, kind, "local time does not map to one instant, using naive UTC");
            EntryInstant {
                instant: Utc.from_utc_datetime(&naive),
                localization: Localization::Fallback,
            }
        }
    }
}
