//! SQLite price cache adapter.
//!
//! Bars live in one `price_bars` table keyed by (symbol, interval, ts), with
//! `ts` stored as UTC epoch seconds.

use crate::domain::error::SwitchbackError;
use crate::domain::market_clock::local_time_on_date;
use crate::domain::ohlcv::{PriceBar, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, SeriesRequest};
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> SwitchbackError {
    SwitchbackError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> SwitchbackError {
    SwitchbackError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn from_epoch(secs: i64) -> Result<DateTime<Utc>, SwitchbackError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| SwitchbackError::DatabaseQuery {
            reason: format!("timestamp {} out of range", secs),
        })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SwitchbackError> {
        let db_path = config
            .get_string("sqlite", "path")
            .ok_or_else(|| SwitchbackError::missing("sqlite", "path"))?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, SwitchbackError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), SwitchbackError> {
        let conn = self.pool.get().map_err(pool_error)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS price_bars (
                symbol TEXT NOT NULL,
                interval TEXT NOT NULL,
                ts INTEGER NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (symbol, interval, ts)
            );
            CREATE INDEX IF NOT EXISTS idx_price_bars_ts ON price_bars(ts);",
        )
        .map_err(query_error)?;

        Ok(())
    }

    /// Upserts every bar of `series` under `interval`. Returns the row count.
    pub fn insert_series(&self, series: &PriceSeries, interval: &str) -> Result<usize, SwitchbackError> {
        let mut conn = self.pool.get().map_err(pool_error)?;
        let tx = conn.transaction().map_err(query_error)?;

        for bar in series.bars() {
            tx.execute(
                "INSERT OR REPLACE INTO price_bars (symbol, interval, ts, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    series.symbol,
                    interval,
                    bar.timestamp.timestamp(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        Ok(series.len())
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_series(&self, request: &SeriesRequest) -> Result<PriceSeries, SwitchbackError> {
        let conn = self.pool.get().map_err(pool_error)?;

        // local-date bounds of the request as instants
        let start = local_time_on_date(request.start_date, NaiveTime::default(), request.timezone).instant;
        let end = local_time_on_date(request.end_date, NaiveTime::default(), request.timezone).instant;

        let mut stmt = conn
            .prepare(
                "SELECT ts, open, high, low, close, volume
                 FROM price_bars
                 WHERE symbol = ?1 AND interval = ?2 AND ts >= ?3 AND ts < ?4
                 ORDER BY ts ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(
                params![
                    request.symbol,
                    request.interval,
                    start.timestamp(),
                    end.timestamp()
                ],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, f64>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .map_err(query_error)?;

        let mut bars = Vec::new();
        for row in rows {
            let (ts, open, high, low, close, volume) = row.map_err(query_error)?;
            bars.push(PriceBar {
                timestamp: from_epoch(ts)?,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        Ok(PriceSeries::new(&request.symbol, request.timezone, bars))
    }

    fn get_data_range(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, SwitchbackError> {
        let conn = self.pool.get().map_err(pool_error)?;

        let result: (Option<i64>, Option<i64>, i64) = conn
            .query_row(
                "SELECT MIN(ts), MAX(ts), COUNT(*) FROM price_bars WHERE symbol = ?1 AND interval = ?2",
                params![symbol, interval],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_error)?;

        match result {
            (Some(min), Some(max), count) if count > 0 => {
                Ok(Some((from_epoch(min)?, from_epoch(max)?, count as usize)))
            }
            _ => Ok(None),
        }
    }
}
