//! Open position, trade events and the append-only trade log.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

use crate::domain::instrument::InstrumentRole;
use crate::domain::signal::Direction;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub role: InstrumentRole,
    pub symbol: String,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    /// Trading date the position was opened on.
    pub entry_date: NaiveDate,
}

impl Position {
    /// Fractional return of `price` relative to the entry fill.
    pub fn pnl_pct(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price
    }

    /// Whole days elapsed between the entry fill and `timestamp`, truncated.
    pub fn held_days(&self, timestamp: DateTime<Utc>) -> i64 {
        (timestamp - self.entry_time).num_days()
    }

    pub fn should_stop_loss(&self, price: f64, stop_loss_pct: f64) -> bool {
        self.pnl_pct(price) <= -stop_loss_pct
    }

    pub fn should_time_exit(&self, timestamp: DateTime<Utc>, max_hold_days: u32) -> bool {
        self.held_days(timestamp) >= i64::from(max_hold_days)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeKind {
    Entry,
    ExitStopLoss,
    ExitTimeLimit,
}

impl TradeKind {
    pub fn is_exit(&self) -> bool {
        !matches!(self, TradeKind::Entry)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeKind::Entry => "ENTRY",
            TradeKind::ExitStopLoss => "EXIT_STOP_LOSS",
            TradeKind::ExitTimeLimit => "EXIT_TIME_LIMIT",
        }
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub kind: TradeKind,
    pub timestamp: DateTime<Utc>,
    pub role: InstrumentRole,
    pub symbol: String,
    pub price: f64,
    /// Realized return, set on exits only.
    pub pnl: Option<f64>,
    /// Signal that opened the trade, set on entries only.
    pub signal: Option<Direction>,
}

impl TradeEvent {
    pub fn entry(position: &Position, signal: Direction) -> Self {
        TradeEvent {
            kind: TradeKind::Entry,
            timestamp: position.entry_time,
            role: position.role,
            symbol: position.symbol.clone(),
            price: position.entry_price,
            pnl: None,
            signal: Some(signal),
        }
    }

    pub fn exit(position: &Position, kind: TradeKind, timestamp: DateTime<Utc>, price: f64) -> Self {
        TradeEvent {
            kind,
            timestamp,
            role: position.role,
            symbol: position.symbol.clone(),
            price,
            pnl: Some(position.pnl_pct(price)),
            signal: None,
        }
    }
}

/// An entry paired with the exit that closed it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub role: InstrumentRole,
    pub symbol: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub exit_kind: TradeKind,
    pub pnl: f64,
}

impl ClosedTrade {
    pub fn hold_hours(&self) -> f64 {
        (self.exit_time - self.entry_time).num_seconds() as f64 / 3600.0
    }
}

/// Chronological record of entries and exits. Events are appended only by
/// the simulation engine and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLog {
    events: Vec<TradeEvent>,
}

impl TradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, event: TradeEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[TradeEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &TradeEvent> {
        self.events.iter().filter(|e| e.kind == TradeKind::Entry)
    }

    pub fn exits(&self) -> impl Iterator<Item = &TradeEvent> {
        self.events.iter().filter(|e| e.kind.is_exit())
    }

    pub fn closed_trades(&self) -> Vec<ClosedTrade> {
        let mut trades = Vec::new();
        let mut open: Option<&TradeEvent> = None;

        for event in &self.events {
            if event.kind == TradeKind::Entry {
                open = Some(event);
                continue;
            }
            if let Some(entry) = open.take() {
                trades.push(ClosedTrade {
                    role: entry.role,
                    symbol: entry.symbol.clone(),
                    entry_price: entry.price,
                    exit_price: event.price,
                    entry_time: entry.timestamp,
                    exit_time: event.timestamp,
                    exit_kind: event.kind,
                    pnl: event.pnl.unwrap_or(0.0),
                });
            }
        }

        trades
    }
}
