//! Exhaustive parameter sweep.
//!
//! Every combination of a [`ParamGrid`] is turned into a signal source by a
//! caller-supplied factory, simulated and scored independently. Combinations
//! share no mutable state, so they may run on rayon's pool; results are
//! always reported in enumeration order. A combination that fails is kept
//! with its error and the sweep carries on.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::backtest::{simulate, DEFAULT_INITIAL_CAPITAL};
use super::error::QuantsimError;
use super::ledger::Ledger;
use super::metrics::{MetricName, Metrics, MetricsConfig};
use super::ohlcv::PricePoint;
use super::params::{ParamGrid, ParamSet};
use super::signal::SignalSource;

/// Metrics and ledger of one successful combination.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub metrics: Metrics,
    pub ledger: Ledger,
}

#[derive(Debug)]
pub struct OptimizationResult {
    /// Position in enumeration order.
    pub index: usize,
    pub parameters: ParamSet,
    pub outcome: Result<Evaluation, QuantsimError>,
}

impl OptimizationResult {
    pub fn metrics(&self) -> Option<&Metrics> {
        self.outcome.as_ref().ok().map(|e| &e.metrics)
    }

    pub fn ledger(&self) -> Option<&Ledger> {
        self.outcome.as_ref().ok().map(|e| &e.ledger)
    }
}

/// One flattened row: parameters plus metrics, or the failure message.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub parameters: ParamSet,
    pub metrics: Option<Metrics>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub parameter_names: Vec<String>,
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn from_results(grid: &ParamGrid, results: &[OptimizationResult]) -> Self {
        let rows = results
            .iter()
            .map(|r| ResultRow {
                parameters: r.parameters.clone(),
                metrics: r.metrics().cloned(),
                error: r.outcome.as_ref().err().map(|e| e.to_string()),
            })
            .collect();

        ResultTable {
            parameter_names: grid.names().map(str::to_string).collect(),
            rows,
        }
    }

    /// Parameter names followed by the six metric names.
    pub fn columns(&self) -> Vec<String> {
        self.parameter_names
            .iter()
            .cloned()
            .chain(MetricName::ALL.iter().map(|m| m.as_str().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter().filter(|r| r.error.is_some())
    }

    /// Row with the largest `metric`. Ties go to the earliest row; failed
    /// rows and undefined or NaN values are skipped.
    pub fn best_by(&self, metric: MetricName) -> Option<&ResultRow> {
        let mut best: Option<(&ResultRow, f64)> = None;
        for row in &self.rows {
            let Some(value) = row.metrics.as_ref().and_then(|m| m.get(metric)) else {
                continue;
            };
            if value.is_nan() {
                continue;
            }
            if best.is_none_or(|(_, v)| value > v) {
                best = Some((row, value));
            }
        }
        best.map(|(row, _)| row)
    }
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub table: ResultTable,
    pub results: Vec<OptimizationResult>,
}

#[derive(Debug, Clone)]
pub struct GridSearch {
    pub initial_capital: f64,
    pub metrics_config: MetricsConfig,
    pub parallel: bool,
}

impl Default for GridSearch {
    fn default() -> Self {
        GridSearch {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            metrics_config: MetricsConfig::default(),
            parallel: true,
        }
    }
}

impl GridSearch {
    pub fn new(initial_capital: f64, metrics_config: MetricsConfig) -> Self {
        GridSearch {
            initial_capital,
            metrics_config,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn search<F, S>(
        &self,
        prices: &[PricePoint],
        factory: F,
        grid: &ParamGrid,
    ) -> SearchOutcome
    where
        F: Fn(&ParamSet) -> Result<S, QuantsimError> + Sync,
        S: SignalSource,
    {
        let combinations = grid.combinations();
        info!(
            combinations = combinations.len(),
            parallel = self.parallel,
            "starting grid search"
        );

        let evaluate = |(index, parameters): (usize, ParamSet)| {
            let outcome = self.evaluate(prices, &factory, &parameters);
            match &outcome {
                Ok(e) => debug!(
                    index,
                    %parameters,
                    sharpe = e.metrics.sharpe_ratio,
                    "combination done"
                ),
                Err(err) if err.is_precondition() => {
                    warn!(index, %parameters, error = %err, "simulation rejected combination")
                }
                Err(err) => warn!(index, %parameters, error = %err, "combination failed"),
            }
            OptimizationResult {
                index,
                parameters,
                outcome,
            }
        };

        // indexed collect keeps enumeration order in both modes
        let results: Vec<OptimizationResult> = if self.parallel {
            combinations
                .into_par_iter()
                .enumerate()
                .map(evaluate)
                .collect()
        } else {
            combinations.into_iter().enumerate().map(evaluate).collect()
        };

        let table = ResultTable::from_results(grid, &results);
        info!(
            rows = table.len(),
            failed = table.failures().count(),
            "grid search complete"
        );

        SearchOutcome { table, results }
    }

    fn evaluate<F, S>(
        &self,
        prices: &[PricePoint],
        factory: &F,
        parameters: &ParamSet,
    ) -> Result<Evaluation, QuantsimError>
    where
        F: Fn(&ParamSet) -> Result<S, QuantsimError>,
        S: SignalSource,
    {
        let source = factory(parameters)?;
        let changes = source.generate_signals(prices);
        let ledger = simulate(prices, &changes, self.initial_capital)?;
        let metrics = Metrics::compute(&ledger, &self.metrics_config);
        Ok(Evaluation { metrics, ledger })
    }
}
