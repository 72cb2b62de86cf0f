//! Daily-signal / intraday-execution simulation.
//!
//! The reference series is daily; its indicator row for date D decides
//! trading on calendar date D+1. The two tradeable series are intraday and
//! are walked one local trading date at a time:
//!
//! 1. cooldown check (skip while D < cooldown_until)
//! 2. skip the date unless both intraday series have bars on it
//! 3. when flat, evaluate the signal and fill at the open of the first bar
//!    at or after the entry instant
//! 4. when holding, scan bars after the entry fill for stop-loss, then
//!    holding-time exits

use chrono::{Days, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::domain::error::SwitchbackError;
use crate::domain::indicator::{IndicatorFrame, IndicatorRow, IndicatorSettings};
use crate::domain::instrument::{RiskParams, RoleMap};
use crate::domain::market_clock;
use crate::domain::ohlcv::{PriceBar, PriceSeries};
use crate::domain::position::{Position, TradeEvent, TradeKind, TradeLog};
use crate::domain::signal::{Direction, SignalPolicy};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    /// Wall-clock entry time in `market_timezone`.
    pub entry_time: NaiveTime,
    pub market_timezone: Tz,
    pub risk: RoleMap<RiskParams>,
    pub policy: SignalPolicy,
    pub indicators: IndicatorSettings,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            entry_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            market_timezone: chrono_tz::Asia::Seoul,
            risk: RoleMap::uniform(RiskParams::default()),
            policy: SignalPolicy::default(),
            indicators: IndicatorSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A stop-loss cooldown was still active.
    Cooldown,
    /// At least one of the intraday series had no bars on the date.
    MissingIntraday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedDate {
    pub date: NaiveDate,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub trade_log: TradeLog,
    pub skipped: Vec<SkippedDate>,
    /// Position still held when the data ran out.
    pub open_position: Option<Position>,
    /// Dates in the trading calendar, skipped ones included.
    pub trading_days: usize,
}

impl SimulationOutcome {
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }
}

/// Mutable state of one run. Owned by the run, never shared.
#[derive(Debug, Default)]
struct SimulationState {
    position: Option<Position>,
    cooldown_until: Option<NaiveDate>,
    log: TradeLog,
    skipped: Vec<SkippedDate>,
}

impl SimulationState {
    /// Clears an expired cooldown; returns true while it still blocks `date`.
    fn in_cooldown(&mut self, date: NaiveDate) -> bool {
        match self.cooldown_until {
            Some(until) if date < until => true,
            Some(_) => {
                self.cooldown_until = None;
                false
            }
            None => false,
        }
    }

    fn skip(&mut self, date: NaiveDate, reason: SkipReason) {
        debug!(%date, ?reason, "skipping date");
        self.skipped.push(SkippedDate { date, reason });
    }
}

/// Union of the local calendar dates of both intraday series, ascending.
pub fn build_trading_calendar(leveraged: &PriceSeries, inverse: &PriceSeries) -> Vec<NaiveDate> {
    let dates: BTreeSet<NaiveDate> = leveraged
        .bars()
        .iter()
        .map(|bar| leveraged.local_date(bar))
        .chain(inverse.bars().iter().map(|bar| inverse.local_date(bar)))
        .collect();
    dates.into_iter().collect()
}

/// Runs the simulation and returns only the trade log.
pub fn run(
    reference: &PriceSeries,
    leveraged: &PriceSeries,
    inverse: &PriceSeries,
    params: &SimulationParams,
) -> Result<TradeLog, SwitchbackError> {
    simulate(reference, leveraged, inverse, params).map(|outcome| outcome.trade_log)
}

pub fn simulate(
    reference: &PriceSeries,
    leveraged: &PriceSeries,
    inverse: &PriceSeries,
    params: &SimulationParams,
) -> Result<SimulationOutcome, SwitchbackError> {
    for series in [reference, leveraged, inverse] {
        if series.is_empty() {
            return Err(SwitchbackError::DataUnavailable {
                symbol: series.symbol.clone(),
            });
        }
    }

    let decisions = IndicatorFrame::compute(reference, &params.indicators).decision_rows();
    let sessions = RoleMap::new(leveraged.bars_by_local_date(), inverse.bars_by_local_date());
    let series = RoleMap::new(leveraged, inverse);
    let calendar = build_trading_calendar(leveraged, inverse);

    info!(
        reference = %reference.symbol,
        leveraged = %leveraged.symbol,
        inverse = %inverse.symbol,
        days = calendar.len(),
        "starting simulation"
    );

    let mut state = SimulationState::default();

    for &date in &calendar {
        if state.in_cooldown(date) {
            state.skip(date, SkipReason::Cooldown);
            continue;
        }

        let day = match (
            sessions.leveraged.get(&date),
            sessions.inverse.get(&date),
        ) {
            (Some(lev), Some(inv)) if !lev.is_empty() && !inv.is_empty() => {
                RoleMap::new(lev.as_slice(), inv.as_slice())
            }
            _ => {
                state.skip(date, SkipReason::MissingIntraday);
                continue;
            }
        };

        if state.position.is_none() {
            if let Some(row) = decisions.get(&date) {
                try_enter(&mut state, date, row, &day, &series, params);
            }
        }

        if let Some(position) = state.position.take() {
            let risk = params.risk.get(position.role);
            let bars = *day.get(position.role);
            state.position = monitor(&mut state, date, position, bars, risk);
        }
    }

    if let Some(ref position) = state.position {
        info!(
            symbol = %position.symbol,
            entry_price = position.entry_price,
            "position still open at end of data"
        );
    }

    Ok(SimulationOutcome {
        trade_log: state.log,
        skipped: state.skipped,
        open_position: state.position,
        trading_days: calendar.len(),
    })
}

fn try_enter(
    state: &mut SimulationState,
    date: NaiveDate,
    row: &IndicatorRow,
    day: &RoleMap<&[&PriceBar]>,
    series: &RoleMap<&PriceSeries>,
    params: &SimulationParams,
) {
    let signal = params.policy.decide_row(row);
    debug!(%date, rsi = ?row.rsi, macd = row.macd, macd_signal = row.macd_signal, %signal, "decision");

    let Some(role) = signal.role() else {
        return;
    };

    let entry = market_clock::local_time_on_date(date, params.entry_time, params.market_timezone);
    let Some(bar) = day
        .get(role)
        .iter()
        .find(|bar| bar.timestamp >= entry.instant)
    else {
        debug!(%date, %role, entry = %entry.instant, "no bar at or after entry time, signal dropped");
        return;
    };

    let position = Position {
        role,
        symbol: series.get(role).symbol.clone(),
        entry_price: bar.open,
        entry_time: bar.timestamp,
        entry_date: date,
    };
    info!(
        %date,
        symbol = %position.symbol,
        price = position.entry_price,
        time = %position.entry_time,
        "entry"
    );
    state.log.push(TradeEvent::entry(&position, signal));
    state.position = Some(position);
}

/// Scans the day's bars after the entry fill. Returns the position if it
/// survives the day.
fn monitor(
    state: &mut SimulationState,
    date: NaiveDate,
    position: Position,
    bars: &[&PriceBar],
    risk: &RiskParams,
) -> Option<Position> {
    for bar in bars.iter().filter(|bar| bar.timestamp > position.entry_time) {
        let kind = if position.should_stop_loss(bar.close, risk.stop_loss_pct) {
            TradeKind::ExitStopLoss
        } else if position.should_time_exit(bar.timestamp, risk.max_hold_days) {
            TradeKind::ExitTimeLimit
        } else {
            continue;
        };

        let event = TradeEvent::exit(&position, kind, bar.timestamp, bar.close);
        info!(
            %date,
            symbol = %event.symbol,
            %kind,
            price = event.price,
            pnl = ?event.pnl,
            "exit"
        );
        state.log.push(event);

        if kind == TradeKind::ExitStopLoss {
            state.cooldown_until = date.checked_add_days(Days::new(u64::from(risk.cooldown_days)));
        }
        return None;
    }

    Some(position)
}

/// Signal that the reference series would produce for each trading date,
/// without any execution. Used for diagnostics.
pub fn decision_schedule(
    reference: &PriceSeries,
    settings: &IndicatorSettings,
    policy: &SignalPolicy,
) -> BTreeMap<NaiveDate, Direction> {
    IndicatorFrame::compute(reference, settings)
        .decision_rows()
        .into_iter()
        .map(|(date, row)| (date, policy.decide_row(&row)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use chrono_tz::America::New_York;
    use chrono_tz::Asia::Seoul;

    fn bar(ts: DateTime<Utc>, open: f64, close: f64) -> PriceBar {
        PriceBar {
            timestamp: ts,
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: 100,
        }
    }

    fn seoul(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Seoul
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    /// Daily reference series whose last close dated `last` yields RSI 100
    /// and a bullish MACD.
    fn rising_reference(last: NaiveDate, days: i64) -> PriceSeries {
        let bars = (0..days)
            .map(|i| {
                let date = last - Duration::days(days - 1 - i);
                let ts = New_York
                    .from_local_datetime(&date.and_hms_opt(16, 0, 0).unwrap())
                    .unwrap()
                    .with_timezone(&Utc);
                bar(ts, 100.0 + i as f64, 100.0 + i as f64)
            })
            .collect();
        PriceSeries::new("SPY", New_York, bars)
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn trading_calendar_is_union_of_local_dates() {
        let lev = PriceSeries::new(
            "LEV",
            Seoul,
            vec![bar(seoul(2024, 3, 4, 9, 0), 1.0, 1.0), bar(seoul(2024, 3, 5, 9, 0), 1.0, 1.0)],
        );
        let inv = PriceSeries::new(
            "INV",
            Seoul,
            vec![bar(seoul(2024, 3, 5, 9, 0), 1.0, 1.0), bar(seoul(2024, 3, 6, 9, 0), 1.0, 1.0)],
        );
        assert_eq!(
            build_trading_calendar(&lev, &inv),
            vec![d(2024, 3, 4), d(2024, 3, 5), d(2024, 3, 6)]
        );
    }

    #[test]
    fn empty_series_is_data_unavailable() {
        let reference = rising_reference(d(2024, 3, 3), 20);
        let lev = PriceSeries::new("LEV", Seoul, vec![]);
        let inv = PriceSeries::new("INV", Seoul, vec![bar(seoul(2024, 3, 4, 9, 0), 1.0, 1.0)]);

        let err = run(&reference, &lev, &inv, &SimulationParams::default()).unwrap_err();
        assert!(matches!(err, SwitchbackError::DataUnavailable { ref symbol } if symbol == "LEV"));
    }

    #[test]
    fn enters_at_open_of_first_bar_at_entry_time() {
        let reference = rising_reference(d(2024, 3, 3), 20);
        let lev = PriceSeries::new(
            "LEV",
            Seoul,
            vec![
                bar(seoul(2024, 3, 4, 8, 55), 99.0, 99.0),
                bar(seoul(2024, 3, 4, 9, 0), 100.0, 101.0),
                bar(seoul(2024, 3, 4, 9, 5), 101.0, 102.0),
            ],
        );
        let inv = PriceSeries::new("INV", Seoul, vec![bar(seoul(2024, 3, 4, 9, 0), 50.0, 50.0)]);

        let outcome = simulate(&reference, &lev, &inv, &SimulationParams::default()).unwrap();
        let events = outcome.trade_log.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TradeKind::Entry);
        assert_eq!(events[0].price, 100.0);
        assert_eq!(events[0].timestamp, seoul(2024, 3, 4, 9, 0));
        assert_eq!(events[0].signal, Some(Direction::EnterLeveraged));
        assert!(outcome.open_position.is_some());
    }

    #[test]
    fn no_bar_after_entry_time_drops_signal() {
        let reference = rising_reference(d(2024, 3, 3), 20);
        let lev = PriceSeries::new("LEV", Seoul, vec![bar(seoul(2024, 3, 4, 8, 0), 100.0, 100.0)]);
        let inv = PriceSeries::new("INV", Seoul, vec![bar(seoul(2024, 3, 4, 8, 0), 50.0, 50.0)]);

        let outcome = simulate(&reference, &lev, &inv, &SimulationParams::default()).unwrap();
        assert!(outcome.trade_log.is_empty());
        assert!(outcome.open_position.is_none());
    }

    #[test]
    fn stop_loss_beats_time_limit_on_same_bar() {
        let reference = rising_reference(d(2024, 3, 3), 20);
        let mut params = SimulationParams::default();
        params.risk.leveraged.max_hold_days = 0;

        let lev = PriceSeries::new(
            "LEV",
            Seoul,
            vec![
                bar(seoul(2024, 3, 4, 9, 0), 100.0, 100.0),
                bar(seoul(2024, 3, 4, 9, 5), 100.0, 90.0),
            ],
        );
        let inv = PriceSeries::new("INV", Seoul, vec![bar(seoul(2024, 3, 4, 9, 0), 50.0, 50.0)]);

        let log = run(&reference, &lev, &inv, &params).unwrap();
        let exits: Vec<_> = log.exits().collect();
        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].kind, TradeKind::ExitStopLoss);
    }

    #[test]
    fn missing_intraday_day_is_skipped_with_reason() {
        let reference = rising_reference(d(2024, 3, 3), 20);
        let lev = PriceSeries::new("LEV", Seoul, vec![bar(seoul(2024, 3, 4, 9, 0), 100.0, 100.0)]);
        let inv = PriceSeries::new("INV", Seoul, vec![bar(seoul(2024, 3, 5, 9, 0), 50.0, 50.0)]);

        let outcome = simulate(&reference, &lev, &inv, &SimulationParams::default()).unwrap();
        assert!(outcome.trade_log.is_empty());
        assert_eq!(outcome.trading_days, 2);
        assert_eq!(outcome.skipped_for(SkipReason::MissingIntraday), 2);
    }

    #[test]
    fn decision_schedule_is_shifted_by_one_day() {
        let reference = rising_reference(d(2024, 3, 3), 20);
        let schedule = decision_schedule(
            &reference,
            &IndicatorSettings::default(),
            &SignalPolicy::default(),
        );
        assert_eq!(schedule.get(&d(2024, 3, 4)), Some(&Direction::EnterLeveraged));
        assert!(!schedule.contains_key(&d(2024, 2, 13)));
    }
}
