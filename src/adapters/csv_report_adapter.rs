//! CSV and plain-text report adapter implementing ReportPort.
//!
//! Files land in one output directory, named after the strategy:
//! `portfolio_<name>.csv`, `metrics_<name>.txt` and
//! `optimization_results_<name>.csv`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::QuantsimError;
use crate::domain::grid_search::ResultTable;
use crate::domain::ledger::Ledger;
use crate::domain::metrics::{MetricName, Metrics};
use crate::ports::report_port::ReportPort;

const LEDGER_HEADER: [&str; 6] = ["date", "price", "cash", "holdings", "total", "returns"];

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn prepare(&self, file_name: String) -> Result<PathBuf, QuantsimError> {
        fs::create_dir_all(&self.output_dir).map_err(QuantsimError::Io)?;
        Ok(self.output_dir.join(file_name))
    }
}

fn csv_error(path: &Path, e: csv::Error) -> QuantsimError {
    QuantsimError::Io(std::io::Error::other(format!(
        "failed to write {}: {}",
        path.display(),
        e
    )))
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl ReportPort for CsvReportAdapter {
    fn write_ledger(&self, ledger: &Ledger, strategy_name: &str) -> Result<PathBuf, QuantsimError> {
        let path = self.prepare(format!("portfolio_{}.csv", strategy_name))?;
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| csv_error(&path, e))?;

        wtr.write_record(LEDGER_HEADER)
            .map_err(|e| csv_error(&path, e))?;
        for row in &ledger.rows {
            wtr.write_record([
                row.date.format("%Y-%m-%d").to_string(),
                row.price.to_string(),
                row.cash.to_string(),
                row.holdings.to_string(),
                row.total_equity.to_string(),
                optional(row.period_return),
            ])
            .map_err(|e| csv_error(&path, e))?;
        }
        wtr.flush().map_err(QuantsimError::Io)?;

        Ok(path)
    }

    fn write_metrics(
        &self,
        metrics: &Metrics,
        strategy_name: &str,
    ) -> Result<PathBuf, QuantsimError> {
        let path = self.prepare(format!("metrics_{}.txt", strategy_name))?;

        let body: String = metrics
            .entries()
            .into_iter()
            .map(|(name, value)| match value {
                Some(v) => format!("{}: {}\n", name, v),
                None => format!("{}: n/a\n", name),
            })
            .collect();
        fs::write(&path, body).map_err(QuantsimError::Io)?;

        Ok(path)
    }

    fn write_optimization(
        &self,
        table: &ResultTable,
        strategy_name: &str,
    ) -> Result<PathBuf, QuantsimError> {
        let path = self.prepare(format!("optimization_results_{}.csv", strategy_name))?;
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| csv_error(&path, e))?;

        let mut header = table.columns();
        header.push("error".to_string());
        wtr.write_record(&header).map_err(|e| csv_error(&path, e))?;

        for row in &table.rows {
            let mut record: Vec<String> = table
                .parameter_names
                .iter()
                .map(|name| {
                    row.parameters
                        .get(name)
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                })
                .collect();
            record.extend(
                MetricName::ALL
                    .iter()
                    .map(|&m| optional(row.metrics.as_ref().and_then(|metrics| metrics.get(m)))),
            );
            record.push(row.error.clone().unwrap_or_default());
            wtr.write_record(&record).map_err(|e| csv_error(&path, e))?;
        }
        wtr.flush().map_err(QuantsimError::Io)?;

        Ok(path)
    }
}
