//! Report generation port trait.

use crate::domain::error::QuantsimError;
use crate::domain::grid_search::ResultTable;
use crate::domain::ledger::Ledger;
use crate::domain::metrics::Metrics;
use std::path::PathBuf;

/// Port for persisting simulation and optimization output. Each method
/// returns the path it wrote.
pub trait ReportPort {
    fn write_ledger(&self, ledger: &Ledger, strategy_name: &str) -> Result<PathBuf, QuantsimError>;

    fn write_metrics(
        &self,
        metrics: &Metrics,
        strategy_name: &str,
    ) -> Result<PathBuf, QuantsimError>;

    fn write_optimization(
        &self,
        table: &ResultTable,
        strategy_name: &str,
    ) -> Result<PathBuf, QuantsimError>;
}
