//! CSV report adapter implementing ReportPort.
//!
//! Writes the trade log to `output_path` and the summary as key/value rows
//! to a sibling `<stem>.summary.csv`.

use std::path::{Path, PathBuf};

use crate::domain::error::SwitchbackError;
use crate::domain::metrics::SummaryOutcome;
use crate::domain::position::TradeLog;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }

    pub fn summary_path(output_path: &Path) -> PathBuf {
        let stem = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "trades".to_string());
        output_path.with_file_name(format!("{}.summary.csv", stem))
    }

    fn write_trades(log: &TradeLog, path: &Path) -> Result<(), SwitchbackError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
        wtr.write_record(["action", "timestamp", "role", "symbol", "price", "pnl", "signal"])
            .map_err(|e| csv_error(path, e))?;

        for event in log.events() {
            wtr.write_record([
                event.kind.to_string(),
                event.timestamp.to_rfc3339(),
                event.role.to_string(),
                event.symbol.clone(),
                format!("{:.4}", event.price),
                event.pnl.map(|p| format!("{:.6}", p)).unwrap_or_default(),
                event.signal.map(|s| s.to_string()).unwrap_or_default(),
            ])
            .map_err(|e| csv_error(path, e))?;
        }

        wtr.flush()?;
        Ok(())
    }

    fn write_summary(summary: &SummaryOutcome, path: &Path) -> Result<(), SwitchbackError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
        wtr.write_record(["metric", "value"])
            .map_err(|e| csv_error(path, e))?;

        let rows: Vec<(&str, String)> = match summary {
            SummaryOutcome::NoTrades | SummaryOutcome::OpenedNotClosed => {
                vec![("status", summary.to_string())]
            }
            SummaryOutcome::Summary(s) => vec![
                ("total_trades", s.total_trades.to_string()),
                ("wins", s.wins.to_string()),
                ("losses", s.losses.to_string()),
                ("win_rate", format!("{:.6}", s.win_rate)),
                ("avg_pnl", format!("{:.6}", s.avg_pnl)),
                ("cumulative_return", format!("{:.6}", s.cumulative_return)),
                ("max_drawdown", format!("{:.6}", s.max_drawdown)),
                ("largest_win", format!("{:.6}", s.largest_win)),
                ("largest_loss", format!("{:.6}", s.largest_loss)),
                ("stop_loss_exits", s.stop_loss_exits.to_string()),
                ("time_limit_exits", s.time_limit_exits.to_string()),
                ("avg_hold_hours", format!("{:.2}", s.avg_hold_hours)),
            ],
        };

        for (metric, value) in rows {
            wtr.write_record([metric, value.as_str()])
                .map_err(|e| csv_error(path, e))?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_error(path: &Path, e: csv::Error) -> SwitchbackError {
    SwitchbackError::DataFormat {
        source_name: path.display().to_string(),
        reason: e.to_string(),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        log: &TradeLog,
        summary: &SummaryOutcome,
        output_path: &str,
    ) -> Result<(), SwitchbackError> {
        let path = Path::new(output_path);
        Self::write_trades(log, path)?;
        Self::write_summary(summary, &Self::summary_path(path))
    }
}
