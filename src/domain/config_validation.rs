//! Configuration validation.
//!
//! Validates all config fields before a backtest runs. The simulation core
//! trusts its parameters; this is the only place they are range-checked.

use crate::domain::error::SwitchbackError;
use crate::domain::instrument::InstrumentRole;
use crate::ports::config_port::ConfigPort;
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use std::str::FromStr;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), SwitchbackError> {
    validate_dates(config)?;
    validate_source(config)?;
    validate_tickers(config)?;
    if let Some(tz) = config.get_string("data", "reference_timezone") {
        parse_timezone("data", "reference_timezone", &tz)?;
    }
    Ok(())
}

pub fn validate_trading_config(config: &dyn ConfigPort) -> Result<(), SwitchbackError> {
    if let Some(raw) = config.get_string("trading", "entry_time") {
        parse_entry_time("trading", "entry_time", &raw)?;
    }
    if let Some(tz) = config.get_string("trading", "market_timezone") {
        parse_timezone("trading", "market_timezone", &tz)?;
    }

    validate_risk_section(config, "trading")?;
    for role in InstrumentRole::ALL {
        validate_risk_section(config, role.config_section())?;
    }
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SwitchbackError> {
    let long = parse_value::<f64>(config, "strategy", "rsi_long_threshold")?.unwrap_or(70.0);
    let short = parse_value::<f64>(config, "strategy", "rsi_short_threshold")?.unwrap_or(30.0);
    check_thresholds("strategy", long, short)?;

    if let Some(raw) = config.get_string("strategy", "use_macd_filter") {
        parse_flag("strategy", "use_macd_filter", &raw)?;
    }

    for key in ["rsi_period", "macd_fast", "macd_slow", "macd_signal"] {
        if let Some(period) = parse_value::<i64>(config, "strategy", key)? {
            if period < 1 {
                return Err(SwitchbackError::invalid(
                    "strategy",
                    key,
                    format!("{} must be at least 1", key),
                ));
            }
        }
    }

    let fast = parse_value::<i64>(config, "strategy", "macd_fast")?.unwrap_or(12);
    let slow = parse_value::<i64>(config, "strategy", "macd_slow")?.unwrap_or(26);
    if fast >= slow {
        return Err(SwitchbackError::invalid(
            "strategy",
            "macd_fast",
            "macd_fast must be shorter than macd_slow",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SwitchbackError> {
    let start_date = required_date(config, "start_date")?;
    let end_date = required_date(config, "end_date")?;

    if start_date >= end_date {
        return Err(SwitchbackError::invalid(
            "data",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub(crate) fn required_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, SwitchbackError> {
    let raw = config
        .get_string("data", key)
        .ok_or_else(|| SwitchbackError::missing("data", key))?;
    parse_date("data", key, &raw)
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), SwitchbackError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    match source.trim().to_lowercase().as_str() {
        "csv" => Ok(()),
        "sqlite" => match config.get_string("sqlite", "path") {
            Some(_) => Ok(()),
            None => Err(SwitchbackError::missing("sqlite", "path")),
        },
        other => Err(SwitchbackError::invalid(
            "data",
            "source",
            format!("unknown data source {:?}, expected csv or sqlite", other),
        )),
    }
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), SwitchbackError> {
    for key in ["leverage", "inverse"] {
        if config.get_string("tickers", key).is_none() {
            return Err(SwitchbackError::missing("tickers", key));
        }
    }
    Ok(())
}

/// Checks only the risk keys `section` sets itself.
fn validate_risk_section(config: &dyn ConfigPort, section: &str) -> Result<(), SwitchbackError> {
    if let Some(sl) = parse_value::<f64>(config, section, "stop_loss_pct")? {
        check_stop_loss(section, sl)?;
    }
    for key in ["max_hold_days", "cooldown_days"] {
        parse_value::<u32>(config, section, key)?;
    }
    Ok(())
}

pub(crate) fn check_stop_loss(section: &str, value: f64) -> Result<(), SwitchbackError> {
    if !(0.0..1.0).contains(&value) {
        return Err(SwitchbackError::invalid(
            section,
            "stop_loss_pct",
            "stop_loss_pct must be in [0, 1)",
        ));
    }
    Ok(())
}

pub(crate) fn check_thresholds(section: &str, long: f64, short: f64) -> Result<(), SwitchbackError> {
    for (key, value) in [("rsi_long_threshold", long), ("rsi_short_threshold", short)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(SwitchbackError::invalid(
                section,
                key,
                format!("{} must be between 0 and 100", key),
            ));
        }
    }
    if long <= short {
        return Err(SwitchbackError::invalid(
            section,
            "rsi_long_threshold",
            "rsi_long_threshold must be greater than rsi_short_threshold",
        ));
    }
    Ok(())
}

/// Parses `[section] key` when present. Present but unparseable is an error,
/// unlike the defaulting getters of `ConfigPort`.
pub(crate) fn parse_value<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, SwitchbackError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| SwitchbackError::invalid(section, key, format!("{:?}: {}", raw, e))),
    }
}

pub fn parse_date(section: &str, key: &str, raw: &str) -> Result<NaiveDate, SwitchbackError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        SwitchbackError::invalid(
            section,
            key,
            format!("invalid {} format, expected YYYY-MM-DD", key),
        )
    })
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_entry_time(section: &str, key: &str, raw: &str) -> Result<NaiveTime, SwitchbackError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| SwitchbackError::invalid(section, key, format!("invalid time {:?}, expected HH:MM", raw)))
}

/// IANA timezone name, e.g. `Asia/Seoul`.
pub fn parse_timezone(section: &str, key: &str, raw: &str) -> Result<Tz, SwitchbackError> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|_| SwitchbackError::invalid(section, key, format!("unknown timezone {:?}", raw)))
}

pub fn parse_flag(section: &str, key: &str, raw: &str) -> Result<bool, SwitchbackError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(SwitchbackError::invalid(
            section,
            key,
            format!("invalid boolean {:?}", raw),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const DATA: &str = "[data]\nstart_date = 2024-01-01\nend_date = 2024-06-30\n\n[tickers]\nreference = SPY\nleverage = 122630.KS\ninverse = 252670.KS\n";

    fn assert_invalid(err: SwitchbackError, expected_key: &str) {
        assert!(
            matches!(err, SwitchbackError::ConfigInvalid { ref key, .. } if key == expected_key),
            "expected invalid {expected_key}, got {err}"
        );
    }

    fn assert_missing(err: SwitchbackError, expected_key: &str) {
        assert!(
            matches!(err, SwitchbackError::ConfigMissing { ref key, .. } if key == expected_key),
            "expected missing {expected_key}, got {err}"
        );
    }

    #[test]
    fn valid_data_config_passes() {
        let config = make_config(
            &DATA.replace("[data]\n", "[data]\nreference_timezone = America/New_York\n"),
        );
        assert!(validate_data_config(&config).is_ok());
    }

    #[test]
    fn missing_end_date_fails() {
        let config = make_config("[data]\nstart_date = 2024-01-01\n[tickers]\nleverage = A\ninverse = B\n");
        assert_missing(validate_data_config(&config).unwrap_err(), "end_date");
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let config = make_config("[data]\nstart_date = 2024/01/01\nend_date = 2024-06-30\n");
        assert_invalid(validate_data_config(&config).unwrap_err(), "start_date");
    }

    #[test]
    fn start_date_after_end_date_fails() {
        let config = make_config("[data]\nstart_date = 2024-06-30\nend_date = 2024-01-01\n");
        assert_invalid(validate_data_config(&config).unwrap_err(), "start_date");
    }

    #[test]
    fn unknown_source_fails() {
        let config = make_config(&DATA.replace("[data]\n", "[data]\nsource = parquet\n"));
        assert_invalid(validate_data_config(&config).unwrap_err(), "source");
    }

    #[test]
    fn sqlite_source_requires_path() {
        let config = make_config(&DATA.replace("[data]\n", "[data]\nsource = sqlite\n"));
        assert_missing(validate_data_config(&config).unwrap_err(), "path");

        let config = make_config(&format!(
            "{}\n[sqlite]\npath = prices.db\n",
            DATA.replace("[data]\n", "[data]\nsource = sqlite\n")
        ));
        assert!(validate_data_config(&config).is_ok());
    }

    #[test]
    fn missing_inverse_ticker_fails() {
        let config = make_config("[data]\nstart_date = 2024-01-01\nend_date = 2024-06-30\n[tickers]\nleverage = A\n");
        assert_missing(validate_data_config(&config).unwrap_err(), "inverse");
    }

    #[test]
    fn bad_reference_timezone_fails() {
        let config = make_config(
            &DATA.replace("[data]\n", "[data]\nreference_timezone = Mars/Olympus\n"),
        );
        assert_invalid(validate_data_config(&config).unwrap_err(), "reference_timezone");
    }

    #[test]
    fn valid_trading_config_passes() {
        let config = make_config(
            "[trading]\nentry_time = 09:30\nmarket_timezone = Asia/Seoul\nstop_loss_pct = 0.03\nmax_hold_days = 5\ncooldown_days = 2\n\n[inverse]\nstop_loss_pct = 0.02\n",
        );
        assert!(validate_trading_config(&config).is_ok());
    }

    #[test]
    fn empty_trading_config_uses_defaults() {
        assert!(validate_trading_config(&make_config("[trading]\n")).is_ok());
    }

    #[test]
    fn bad_entry_time_fails() {
        let config = make_config("[trading]\nentry_time = 9am\n");
        assert_invalid(validate_trading_config(&config).unwrap_err(), "entry_time");
    }

    #[test]
    fn negative_stop_loss_fails() {
        let config = make_config("[trading]\nstop_loss_pct = -0.01\n");
        assert_invalid(validate_trading_config(&config).unwrap_err(), "stop_loss_pct");
    }

    #[test]
    fn per_role_override_is_checked() {
        let config = make_config("[trading]\nstop_loss_pct = 0.03\n\n[leverage]\nstop_loss_pct = 1.5\n");
        let err = validate_trading_config(&config).unwrap_err();
        assert!(
            matches!(err, SwitchbackError::ConfigInvalid { ref section, .. } if section == "leverage")
        );
    }

    #[test]
    fn negative_hold_days_fails() {
        let config = make_config("[inverse]\nmax_hold_days = -1\n");
        assert_invalid(validate_trading_config(&config).unwrap_err(), "max_hold_days");
    }

    #[test]
    fn valid_strategy_config_passes() {
        let config = make_config(
            "[strategy]\nrsi_long_threshold = 60\nrsi_short_threshold = 40\nuse_macd_filter = false\nrsi_period = 14\nmacd_fast = 12\nmacd_slow = 26\nmacd_signal = 9\n",
        );
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn threshold_out_of_range_fails() {
        let config = make_config("[strategy]\nrsi_long_threshold = 120\n");
        assert_invalid(validate_strategy_config(&config).unwrap_err(), "rsi_long_threshold");
    }

    #[test]
    fn inverted_thresholds_fail() {
        let config = make_config("[strategy]\nrsi_long_threshold = 30\nrsi_short_threshold = 70\n");
        assert_invalid(validate_strategy_config(&config).unwrap_err(), "rsi_long_threshold");
    }

    #[test]
    fn non_numeric_threshold_fails() {
        let config = make_config("[strategy]\nrsi_short_threshold = low\n");
        assert_invalid(validate_strategy_config(&config).unwrap_err(), "rsi_short_threshold");
    }

    #[test]
    fn bad_macd_filter_flag_fails() {
        let config = make_config("[strategy]\nuse_macd_filter = sometimes\n");
        assert_invalid(validate_strategy_config(&config).unwrap_err(), "use_macd_filter");
    }

    #[test]
    fn zero_period_fails() {
        let config = make_config("[strategy]\nrsi_period = 0\n");
        assert_invalid(validate_strategy_config(&config).unwrap_err(), "rsi_period");
    }

    #[test]
    fn macd_fast_must_be_shorter() {
        let config = make_config("[strategy]\nmacd_fast = 26\nmacd_slow = 12\n");
        assert_invalid(validate_strategy_config(&config).unwrap_err(), "macd_fast");
    }

    #[test]
    fn parse_entry_time_formats() {
        assert_eq!(
            parse_entry_time("trading", "entry_time", "08:40").unwrap(),
            NaiveTime::from_hms_opt(8, 40, 0).unwrap()
        );
        assert_eq!(
            parse_entry_time("trading", "entry_time", "08:40:30").unwrap(),
            NaiveTime::from_hms_opt(8, 40, 30).unwrap()
        );
    }

    #[test]
    fn parse_timezone_names() {
        assert_eq!(
            parse_timezone("trading", "market_timezone", "Asia/Seoul").unwrap(),
            chrono_tz::Asia::Seoul
        );
        assert!(parse_timezone("trading", "market_timezone", "Mars/Olympus").is_err());
    }
}
