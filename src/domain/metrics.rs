//! Summary statistics over a trade log.
//!
//! Returns are per-trade fractional pnls of closed trades only; open
//! entries never contribute numbers.

use std::fmt;

use crate::domain::instrument::InstrumentRole;
use crate::domain::position::{ClosedTrade, TradeKind, TradeLog};

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub avg_pnl: f64,
    /// Product of (1 + pnl) over exits, minus one.
    pub cumulative_return: f64,
    /// Worst peak-to-trough decline of the compounded curve; zero or negative.
    pub max_drawdown: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub stop_loss_exits: usize,
    pub time_limit_exits: usize,
    pub avg_hold_hours: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    NoTrades,
    OpenedNotClosed,
    Summary(Summary),
}

impl SummaryOutcome {
    pub fn summary(&self) -> Option<&Summary> {
        match self {
            SummaryOutcome::Summary(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SummaryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryOutcome::NoTrades => f.write_str("No trades executed."),
            SummaryOutcome::OpenedNotClosed => f.write_str("Trades opened but none closed."),
            SummaryOutcome::Summary(s) => {
                writeln!(f, "Total Trades:      {}", s.total_trades)?;
                writeln!(f, "Win Rate:          {:.2}%", s.win_rate * 100.0)?;
                writeln!(f, "Avg PnL:           {:.2}%", s.avg_pnl * 100.0)?;
                writeln!(f, "Cumulative Return: {:.2}%", s.cumulative_return * 100.0)?;
                write!(f, "Max Drawdown:      {:.2}%", s.max_drawdown * 100.0)
            }
        }
    }
}

pub fn summarize(log: &TradeLog) -> SummaryOutcome {
    if log.is_empty() {
        return SummaryOutcome::NoTrades;
    }

    let pnls: Vec<f64> = log.exits().map(|e| e.pnl.unwrap_or(0.0)).collect();
    if pnls.is_empty() {
        return SummaryOutcome::OpenedNotClosed;
    }

    let total_trades = pnls.len();
    let wins = pnls.iter().filter(|&&p| p > 0.0).count();
    let losses = pnls.iter().filter(|&&p| p < 0.0).count();
    let avg_pnl = pnls.iter().sum::<f64>() / total_trades as f64;

    let equity = compounded_curve(&pnls);
    let cumulative_return = equity.last().map(|e| e - 1.0).unwrap_or(0.0);

    let largest_win = pnls.iter().copied().filter(|&p| p > 0.0).fold(0.0, f64::max);
    let largest_loss = pnls.iter().copied().filter(|&p| p < 0.0).fold(0.0, f64::min);

    let stop_loss_exits = log
        .exits()
        .filter(|e| e.kind == TradeKind::ExitStopLoss)
        .count();
    let time_limit_exits = log
        .exits()
        .filter(|e| e.kind == TradeKind::ExitTimeLimit)
        .count();

    let closed = log.closed_trades();
    let avg_hold_hours = if closed.is_empty() {
        0.0
    } else {
        closed.iter().map(ClosedTrade::hold_hours).sum::<f64>() / closed.len() as f64
    };

    SummaryOutcome::Summary(Summary {
        total_trades,
        wins,
        losses,
        win_rate: wins as f64 / total_trades as f64,
        avg_pnl,
        cumulative_return,
        max_drawdown: compute_drawdown(&equity),
        largest_win,
        largest_loss,
        stop_loss_exits,
        time_limit_exits,
        avg_hold_hours,
    })
}

/// Running product of (1 + pnl).
fn compounded_curve(pnls: &[f64]) -> Vec<f64> {
    pnls.iter()
        .scan(1.0, |equity, pnl| {
            *equity *= 1.0 + pnl;
            Some(*equity)
        })
        .collect()
}

/// Minimum of (equity - running peak) / running peak. The peak starts at the
/// first point of the curve, not at 1.0.
fn compute_drawdown(equity: &[f64]) -> f64 {
    let Some(&first) = equity.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &value in equity {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            let dd = (value - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Per-instrument breakdown of closed trades.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleResult {
    pub role: InstrumentRole,
    pub symbol: String,
    pub total_trades: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub compounded_return: f64,
}

impl RoleResult {
    /// One result per role that has at least one closed trade, leveraged first.
    pub fn compute_per_role(trades: &[ClosedTrade]) -> Vec<RoleResult> {
        InstrumentRole::ALL
            .iter()
            .filter_map(|&role| {
                let role_trades: Vec<&ClosedTrade> =
                    trades.iter().filter(|t| t.role == role).collect();
                let first = role_trades.first()?;

                let total_trades = role_trades.len();
                let wins = role_trades.iter().filter(|t| t.pnl > 0.0).count();
                let compounded_return =
                    role_trades.iter().fold(1.0, |acc, t| acc * (1.0 + t.pnl)) - 1.0;

                Some(RoleResult {
                    role,
                    symbol: first.symbol.clone(),
                    total_trades,
                    wins,
                    win_rate: wins as f64 / total_trades as f64,
                    compounded_return,
                })
            })
            .collect()
    }
}
