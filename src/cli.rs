//! CLI definition and dispatch.

use chrono_tz::Tz;
use clap::{ArgAction, Parser, Subcommand};
use rayon::prelude::*;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self, SimulationOutcome, SimulationParams, SkipReason};
use crate::domain::config_validation::{
    parse_entry_time, parse_flag, parse_timezone, parse_value, required_date,
    validate_data_config, validate_strategy_config, validate_trading_config,
};
use crate::domain::error::SwitchbackError;
use crate::domain::indicator::IndicatorSettings;
use crate::domain::instrument::{InstrumentRole, RiskParams, RoleMap};
use crate::domain::metrics::{summarize, RoleResult, SummaryOutcome};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::scenario::{load_scenarios, select_scenario, Scenario};
use crate::domain::signal::{Direction, SignalPolicy};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, SeriesRequest};
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "switchback", about = "Daily-signal / intraday-execution ETF backtester")]
pub struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the base parameters or every configured scenario
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Run only this scenario
        #[arg(long)]
        scenario: Option<String>,
        /// Write the trade log of a single-scenario run to this CSV
        #[arg(long)]
        trades: Option<PathBuf>,
    },
    /// Validate a configuration and print the resolved parameters
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the cached data range of the configured series
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Load CSV cache files into the SQLite cache
    #[cfg(feature = "sqlite")]
    Import {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of `<symbol>_<interval>.csv` files
        #[arg(long)]
        from: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);
    match cli.command {
        Command::Backtest {
            config,
            scenario,
            trades,
        } => run_backtest(&config, scenario.as_deref(), trades.as_ref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config } => run_info(&config),
        #[cfg(feature = "sqlite")]
        Command::Import { config, from } => run_import(&config, &from),
    }
}

/// Installs the stderr subscriber. A second call is a no-op.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: SwitchbackError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

fn validate_all(config: &dyn ConfigPort) -> Result<(), SwitchbackError> {
    validate_data_config(config)?;
    validate_trading_config(config)?;
    validate_strategy_config(config)
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Base simulation parameters from `[trading]`, `[leverage]`, `[inverse]`
/// and `[strategy]`. Absent keys take their defaults.
pub fn build_simulation_params(
    config: &dyn ConfigPort,
) -> Result<SimulationParams, SwitchbackError> {
    let defaults = SimulationParams::default();

    let entry_time = match config.get_string("trading", "entry_time") {
        Some(raw) => parse_entry_time("trading", "entry_time", &raw)?,
        None => defaults.entry_time,
    };
    let market_timezone = match config.get_string("trading", "market_timezone") {
        Some(raw) => parse_timezone("trading", "market_timezone", &raw)?,
        None => defaults.market_timezone,
    };

    let risk = RoleMap::new(
        build_risk_params(config, InstrumentRole::Leveraged)?,
        build_risk_params(config, InstrumentRole::Inverse)?,
    );

    let policy = SignalPolicy {
        rsi_long_threshold: parse_value(config, "strategy", "rsi_long_threshold")?
            .unwrap_or(defaults.policy.rsi_long_threshold),
        rsi_short_threshold: parse_value(config, "strategy", "rsi_short_threshold")?
            .unwrap_or(defaults.policy.rsi_short_threshold),
        use_macd_filter: match config.get_string("strategy", "use_macd_filter") {
            Some(raw) => parse_flag("strategy", "use_macd_filter", &raw)?,
            None => defaults.policy.use_macd_filter,
        },
    };

    let indicators = IndicatorSettings {
        rsi_period: parse_value(config, "strategy", "rsi_period")?
            .unwrap_or(defaults.indicators.rsi_period),
        macd_fast: parse_value(config, "strategy", "macd_fast")?
            .unwrap_or(defaults.indicators.macd_fast),
        macd_slow: parse_value(config, "strategy", "macd_slow")?
            .unwrap_or(defaults.indicators.macd_slow),
        macd_signal: parse_value(config, "strategy", "macd_signal")?
            .unwrap_or(defaults.indicators.macd_signal),
    };

    Ok(SimulationParams {
        entry_time,
        market_timezone,
        risk,
        policy,
        indicators,
    })
}

/// Risk keys of `role`'s section, falling back to `[trading]`.
fn build_risk_params(
    config: &dyn ConfigPort,
    role: InstrumentRole,
) -> Result<RiskParams, SwitchbackError> {
    let section = role.config_section();
    let defaults = RiskParams::default();
    Ok(RiskParams {
        stop_loss_pct: risk_value(config, section, "stop_loss_pct", defaults.stop_loss_pct)?,
        max_hold_days: risk_value(config, section, "max_hold_days", defaults.max_hold_days)?,
        cooldown_days: risk_value(config, section, "cooldown_days", defaults.cooldown_days)?,
    })
}

fn risk_value<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, SwitchbackError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match config.get_string_or(section, "trading", key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| SwitchbackError::invalid(section, key, format!("{:?}: {}", raw, e))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Csv,
    Sqlite,
}

/// Where the price cache lives and which series to load from it.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub source: DataSource,
    pub cache_dir: PathBuf,
    pub reference: SeriesRequest,
    pub instruments: RoleMap<SeriesRequest>,
}

impl DataSettings {
    /// Reference request first, then leveraged and inverse.
    pub fn requests(&self) -> [&SeriesRequest; 3] {
        [
            &self.reference,
            &self.instruments.leveraged,
            &self.instruments.inverse,
        ]
    }
}

/// `[data]` and `[tickers]`. Intraday series are requested in
/// `market_timezone`, the reference series in `[data] reference_timezone`.
pub fn build_data_settings(
    config: &dyn ConfigPort,
    market_timezone: Tz,
) -> Result<DataSettings, SwitchbackError> {
    let source = match config
        .get_string("data", "source")
        .map(|s| s.trim().to_lowercase())
        .as_deref()
    {
        None | Some("csv") => DataSource::Csv,
        Some("sqlite") => DataSource::Sqlite,
        Some(other) => {
            return Err(SwitchbackError::invalid(
                "data",
                "source",
                format!("unknown data source {:?}, expected csv or sqlite", other),
            ));
        }
    };

    let start_date = required_date(config, "start_date")?;
    let end_date = required_date(config, "end_date")?;
    let reference_timezone = match config.get_string("data", "reference_timezone") {
        Some(raw) => parse_timezone("data", "reference_timezone", &raw)?,
        None => chrono_tz::America::New_York,
    };

    let ticker = |key: &str| {
        config
            .get_string("tickers", key)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| SwitchbackError::missing("tickers", key))
    };
    let request = |symbol: String, interval_key: &str, default_interval: &str, timezone: Tz| {
        SeriesRequest {
            symbol,
            interval: config
                .get_string("data", interval_key)
                .unwrap_or_else(|| default_interval.to_string()),
            timezone,
            start_date,
            end_date,
        }
    };

    Ok(DataSettings {
        source,
        cache_dir: PathBuf::from(
            config
                .get_string("data", "cache_dir")
                .unwrap_or_else(|| "data".to_string()),
        ),
        reference: request(
            ticker("reference").unwrap_or_else(|_| "SPY".to_string()),
            "reference_interval",
            "1d",
            reference_timezone,
        ),
        instruments: RoleMap::new(
            request(ticker("leverage")?, "leverage_interval", "5m", market_timezone),
            request(ticker("inverse")?, "inverse_interval", "5m", market_timezone),
        ),
    })
}

pub fn open_data_port(
    config: &dyn ConfigPort,
    settings: &DataSettings,
) -> Result<Box<dyn DataPort>, SwitchbackError> {
    match settings.source {
        DataSource::Csv => Ok(Box::new(CsvAdapter::new(settings.cache_dir.clone()))),
        #[cfg(feature = "sqlite")]
        DataSource::Sqlite => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;

            let adapter = SqliteAdapter::from_config(config)?;
            adapter.initialize_schema()?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "sqlite"))]
        DataSource::Sqlite => {
            let _ = config;
            Err(SwitchbackError::invalid(
                "data",
                "source",
                "sqlite feature is required for source = sqlite",
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Backtest
// ---------------------------------------------------------------------------

/// The three input series of a run.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub reference: PriceSeries,
    pub leveraged: PriceSeries,
    pub inverse: PriceSeries,
}

pub fn load_market_data(
    data_port: &dyn DataPort,
    settings: &DataSettings,
) -> Result<MarketData, SwitchbackError> {
    let fetch = |request: &SeriesRequest| -> Result<PriceSeries, SwitchbackError> {
        let series = data_port.fetch_series(request)?;
        eprintln!(
            "  {} ({}): {} bars",
            series.symbol,
            request.interval,
            series.len()
        );
        Ok(series)
    };
    Ok(MarketData {
        reference: fetch(&settings.reference)?,
        leveraged: fetch(&settings.instruments.leveraged)?,
        inverse: fetch(&settings.instruments.inverse)?,
    })
}

/// Result of one scenario of a sweep.
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub name: String,
    pub params: SimulationParams,
    pub outcome: SimulationOutcome,
    pub summary: SummaryOutcome,
}

/// Runs every scenario against the same data in parallel. Results come back
/// in scenario order.
pub fn run_scenarios(
    data: &MarketData,
    base: &SimulationParams,
    scenarios: &[Scenario],
) -> Vec<(String, Result<ScenarioRun, SwitchbackError>)> {
    scenarios
        .par_iter()
        .map(|scenario| {
            let result = scenario.apply(base).and_then(|params| {
                let outcome =
                    backtest::simulate(&data.reference, &data.leveraged, &data.inverse, &params)?;
                let summary = summarize(&outcome.trade_log);
                Ok(ScenarioRun {
                    name: scenario.name.clone(),
                    params,
                    outcome,
                    summary,
                })
            });
            (scenario.name.clone(), result)
        })
        .collect()
}

/// One line per scenario, in order.
pub fn format_summary_table(runs: &[(String, Result<ScenarioRun, SwitchbackError>)]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:>6} {:>8} {:>9} {:>10} {:>9}",
        "Scenario", "Trades", "WinRate", "AvgPnL", "CumReturn", "MaxDD"
    );
    for (name, result) in runs {
        let row = match result {
            Err(e) => format!("failed: {e}"),
            Ok(run) => match run.summary.summary() {
                None => run.summary.to_string(),
                Some(s) => format!(
                    "{:>6} {:>7.2}% {:>8.2}% {:>9.2}% {:>8.2}%",
                    s.total_trades,
                    s.win_rate * 100.0,
                    s.avg_pnl * 100.0,
                    s.cumulative_return * 100.0,
                    s.max_drawdown * 100.0,
                ),
            },
        };
        let _ = writeln!(out, "{:<16} {}", name, row);
    }
    out
}

fn print_run_details(run: &ScenarioRun) {
    eprintln!("\n=== {} ===", run.name);
    eprintln!("{}", run.summary);

    let trades = run.outcome.trade_log.closed_trades();
    let role_results = RoleResult::compute_per_role(&trades);
    for rr in &role_results {
        eprintln!(
            "  {} {}:  {} trades, {:.1}% win rate, {:+.2}%",
            rr.role,
            rr.symbol,
            rr.total_trades,
            rr.win_rate * 100.0,
            rr.compounded_return * 100.0,
        );
    }

    eprintln!(
        "  {} trading days, skipped {} in cooldown, {} missing intraday data",
        run.outcome.trading_days,
        run.outcome.skipped_for(SkipReason::Cooldown),
        run.outcome.skipped_for(SkipReason::MissingIntraday),
    );
    if let Some(ref position) = run.outcome.open_position {
        eprintln!(
            "  open position: {} {} since {}",
            position.role, position.symbol, position.entry_time
        );
    }
}

fn run_backtest(
    config_path: &PathBuf,
    scenario_name: Option<&str>,
    trades_path: Option<&PathBuf>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&config) {
        return fail(e);
    }

    let base = match build_simulation_params(&config) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let settings = match build_data_settings(&config, base.market_timezone) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let mut scenarios = match load_scenarios(&config) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if let Some(name) = scenario_name {
        match select_scenario(&scenarios, name) {
            Some(s) => scenarios = vec![s],
            None => {
                eprintln!("error: unknown scenario {:?}", name);
                return ExitCode::from(2);
            }
        }
    }
    if trades_path.is_some() && scenarios.len() > 1 {
        eprintln!("error: --trades needs a single scenario (use --scenario)");
        return ExitCode::from(2);
    }

    let data_port = match open_data_port(&config, &settings) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    eprintln!(
        "Loading data: {} to {}",
        settings.reference.start_date, settings.reference.end_date
    );
    let data = match load_market_data(data_port.as_ref(), &settings) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };

    eprintln!("Running {} scenario(s)", scenarios.len());
    let runs = run_scenarios(&data, &base, &scenarios);

    for (name, result) in &runs {
        match result {
            Ok(run) => print_run_details(run),
            Err(e) => warn!(scenario = %name, error = %e, "scenario skipped"),
        }
    }

    println!();
    print!("{}", format_summary_table(&runs));

    if let Some(path) = trades_path {
        let Some((_, result)) = runs.first() else {
            return ExitCode::SUCCESS;
        };
        let run = match result {
            Ok(run) => run,
            Err(e) => {
                eprintln!("error: {e}");
                return e.into();
            }
        };
        if let Err(e) = CsvReportAdapter::new().write(
            &run.outcome.trade_log,
            &run.summary,
            &path.to_string_lossy(),
        ) {
            return fail(e);
        }
        eprintln!("\nTrade log written to: {}", path.display());
    }

    match runs.iter().find_map(|(_, r)| r.as_ref().err()) {
        Some(e) if runs.iter().all(|(_, r)| r.is_err()) => e.into(),
        _ => ExitCode::SUCCESS,
    }
}

// ---------------------------------------------------------------------------
// Validate / info / import
// ---------------------------------------------------------------------------

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&config) {
        return fail(e);
    }

    let base = match build_simulation_params(&config) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let settings = match build_data_settings(&config, base.market_timezone) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let scenarios = match load_scenarios(&config) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    for section in config.sections() {
        if let Some(name) = section.strip_prefix("scenario.") {
            if !scenarios.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
                eprintln!("warning: [{}] is not listed in [scenarios] names", section);
            }
        }
    }

    eprintln!("\nData:");
    for request in settings.requests() {
        eprintln!(
            "  {} ({}, {}): {} to {}",
            request.symbol, request.interval, request.timezone, request.start_date, request.end_date
        );
    }

    for scenario in &scenarios {
        let params = match scenario.apply(&base) {
            Ok(p) => p,
            Err(e) => return fail(e),
        };
        eprintln!("\nScenario {}:", scenario.name);
        eprint!("{}", describe_params(&params));
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

/// Multi-line, indented rendering of resolved parameters.
pub fn describe_params(params: &SimulationParams) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  entry:      {} {}",
        params.entry_time.format("%H:%M"),
        params.market_timezone
    );
    let indicators: Vec<String> = params
        .indicators
        .indicator_types()
        .iter()
        .map(ToString::to_string)
        .collect();
    let _ = writeln!(out, "  indicators: {}", indicators.join(", "));
    let _ = writeln!(
        out,
        "  signal:     long above {}, short below {}, MACD filter {}",
        params.policy.rsi_long_threshold,
        params.policy.rsi_short_threshold,
        if params.policy.use_macd_filter { "on" } else { "off" },
    );
    for role in InstrumentRole::ALL {
        let risk = params.risk.get(role);
        let _ = writeln!(
            out,
            "  {}:        stop {:.2}%, hold {} days, cooldown {} days",
            role,
            risk.stop_loss_pct * 100.0,
            risk.max_hold_days,
            risk.cooldown_days,
        );
    }
    out
}

fn run_info(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let base = match build_simulation_params(&config) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let settings = match build_data_settings(&config, base.market_timezone) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let data_port = match open_data_port(&config, &settings) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    for request in settings.requests() {
        match data_port.get_data_range(&request.symbol, &request.interval) {
            Ok(Some((first, last, count))) => {
                println!(
                    "{} ({}): {} bars, {} to {}",
                    request.symbol, request.interval, count, first, last
                );
            }
            Ok(None) => {
                eprintln!("{} ({}): no data found", request.symbol, request.interval);
            }
            Err(e) => {
                eprintln!("error querying {} ({}): {}", request.symbol, request.interval, e);
            }
        }
    }

    // signal counts over the configured window, no execution
    match data_port.fetch_series(&settings.reference) {
        Ok(reference) if !reference.is_empty() => {
            let schedule =
                backtest::decision_schedule(&reference, &base.indicators, &base.policy);
            let count = |d: Direction| schedule.values().filter(|&&v| v == d).count();
            println!(
                "signals: {} {}, {} {}, {} {}",
                count(Direction::EnterLeveraged),
                Direction::EnterLeveraged,
                count(Direction::EnterInverse),
                Direction::EnterInverse,
                count(Direction::NoAction),
                Direction::NoAction,
            );
        }
        Ok(_) | Err(SwitchbackError::DataUnavailable { .. }) => {}
        Err(e) => eprintln!("error computing signals: {e}"),
    }

    ExitCode::SUCCESS
}

#[cfg(feature = "sqlite")]
fn run_import(config_path: &PathBuf, from: &PathBuf) -> ExitCode {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let base = match build_simulation_params(&config) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let settings = match build_data_settings(&config, base.market_timezone) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let sqlite = match SqliteAdapter::from_config(&config) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    if let Err(e) = sqlite.initialize_schema() {
        return fail(e);
    }

    match import_csv_cache(&CsvAdapter::new(from.clone()), &sqlite, &settings) {
        Ok(total) => {
            eprintln!("\nImported {} bars from {}", total, from.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Copies every cache file into SQLite. Date-only rows are read in the
/// timezone of the configured series with the same symbol, the market
/// timezone otherwise. Returns the total bar count.
#[cfg(feature = "sqlite")]
pub fn import_csv_cache(
    csv: &CsvAdapter,
    sqlite: &crate::adapters::sqlite_adapter::SqliteAdapter,
    settings: &DataSettings,
) -> Result<usize, SwitchbackError> {
    let mut total = 0;
    for (symbol, interval) in csv.list_series()? {
        let timezone = settings
            .requests()
            .iter()
            .find(|r| r.symbol == symbol)
            .map(|r| r.timezone)
            .unwrap_or(settings.instruments.leveraged.timezone);
        let series = csv.read_series(&symbol, &interval, timezone)?;
        let count = sqlite.insert_series(&series, &interval)?;
        eprintln!("  {} ({}): {} bars", symbol, interval, count);
        total += count;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const CONFIG: &str = r#"
[data]
start_date = 2024-01-01
end_date = 2024-06-30
cache_dir = /tmp/prices

[tickers]
leverage = 122630.KS
inverse = 252670.KS

[trading]
entry_time = 08:30
stop_loss_pct = 0.02
max_hold_days = 3

[inverse]
stop_loss_pct = 0.015
cooldown_days = 2

[strategy]
rsi_long_threshold = 65
use_macd_filter = false
"#;

    #[test]
    fn simulation_params_from_config() {
        let params = build_simulation_params(&make_config(CONFIG)).unwrap();
        assert_eq!(params.entry_time, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(params.market_timezone, chrono_tz::Asia::Seoul);
        assert_eq!(params.policy.rsi_long_threshold, 65.0);
        assert_eq!(params.policy.rsi_short_threshold, 30.0);
        assert!(!params.policy.use_macd_filter);
        assert_eq!(params.indicators, IndicatorSettings::default());

        assert_eq!(
            params.risk.leveraged,
            RiskParams {
                stop_loss_pct: 0.02,
                max_hold_days: 3,
                cooldown_days: 0
            }
        );
        assert_eq!(
            params.risk.inverse,
            RiskParams {
                stop_loss_pct: 0.015,
                max_hold_days: 3,
                cooldown_days: 2
            }
        );
    }

    #[test]
    fn empty_config_gives_defaults() {
        let params = build_simulation_params(&make_config("[data]\n")).unwrap();
        assert_eq!(params, SimulationParams::default());
    }

    #[test]
    fn bad_risk_value_reports_role_section() {
        let err = build_simulation_params(&make_config("[leverage]\nmax_hold_days = -1\n"))
            .unwrap_err();
        assert!(
            matches!(err, SwitchbackError::ConfigInvalid { ref section, .. } if section == "leverage")
        );
    }

    #[test]
    fn data_settings_from_config() {
        let settings =
            build_data_settings(&make_config(CONFIG), chrono_tz::Asia::Seoul).unwrap();
        assert_eq!(settings.source, DataSource::Csv);
        assert_eq!(settings.cache_dir, PathBuf::from("/tmp/prices"));

        assert_eq!(settings.reference.symbol, "SPY");
        assert_eq!(settings.reference.interval, "1d");
        assert_eq!(settings.reference.timezone, chrono_tz::America::New_York);

        let lev = &settings.instruments.leveraged;
        assert_eq!(lev.symbol, "122630.KS");
        assert_eq!(lev.interval, "5m");
        assert_eq!(lev.timezone, chrono_tz::Asia::Seoul);
        assert_eq!(settings.instruments.inverse.symbol, "252670.KS");
    }

    #[test]
    fn data_settings_require_tickers() {
        let err = build_data_settings(
            &make_config("[data]\nstart_date = 2024-01-01\nend_date = 2024-02-01\n"),
            chrono_tz::Asia::Seoul,
        )
        .unwrap_err();
        assert!(matches!(err, SwitchbackError::ConfigMissing { ref key, .. } if key == "leverage"));
    }

    #[test]
    fn describe_params_lists_both_roles() {
        let text = describe_params(&SimulationParams::default());
        assert!(text.contains("09:00 Asia/Seoul"));
        assert!(text.contains("LEV:"));
        assert!(text.contains("INV:"));
        assert!(text.contains("stop 3.00%"));
        assert!(text.contains("RSI(14), MACD(12,26,9)"));
    }
}
