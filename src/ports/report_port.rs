//! Report generation port trait.

use crate::domain::error::SwitchbackError;
use crate::domain::metrics::SummaryOutcome;
use crate::domain::position::TradeLog;

/// Port for writing trade logs and their summaries.
pub trait ReportPort {
    fn write(
        &self,
        log: &TradeLog,
        summary: &SummaryOutcome,
        output_path: &str,
    ) -> Result<(), SwitchbackError>;
}
