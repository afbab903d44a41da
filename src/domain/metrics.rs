//! Performance metrics computed from a finished ledger.

use std::fmt;
use std::str::FromStr;

use super::ledger::Ledger;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.01;
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Constants behind the annualised ratios.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    pub risk_free_rate: f64,
    pub trading_days_per_year: f64,
    /// Added to every volatility denominator.
    pub epsilon: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    SharpeRatio,
    SortinoRatio,
    MaxDrawdown,
    AnnualizedReturn,
    CalmarRatio,
    TotalReturn,
}

impl MetricName {
    /// Report order.
    pub const ALL: [MetricName; 6] = [
        MetricName::SharpeRatio,
        MetricName::MaxDrawdown,
        MetricName::AnnualizedReturn,
        MetricName::SortinoRatio,
        MetricName::CalmarRatio,
        MetricName::TotalReturn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SharpeRatio => "sharpe_ratio",
            MetricName::SortinoRatio => "sortino_ratio",
            MetricName::MaxDrawdown => "max_drawdown",
            MetricName::AnnualizedReturn => "annualized_return",
            MetricName::CalmarRatio => "calmar_ratio",
            MetricName::TotalReturn => "total_return",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricName::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| format!("unknown metric: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Non-positive; zero means equity never fell below a prior peak.
    pub max_drawdown: f64,
    /// `None` when the ledger has no return observations.
    pub annualized_return: Option<f64>,
    /// Zero when there was no drawdown; `None` with `annualized_return`.
    pub calmar_ratio: Option<f64>,
    pub total_return: f64,
}

impl Metrics {
    pub fn compute(ledger: &Ledger, config: &MetricsConfig) -> Self {
        let returns = ledger.returns();
        let equity = ledger.equity();

        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&returns, config);
        let max_drawdown = compute_max_drawdown(&equity);
        let annualized_return = compute_annualized_return(&returns, config.trading_days_per_year);

        let calmar_ratio = annualized_return.map(|annualized| {
            if max_drawdown != 0.0 {
                annualized / max_drawdown.abs()
            } else {
                0.0
            }
        });

        let total_return = match (equity.first(), equity.last()) {
            (Some(&first), Some(&last)) if first != 0.0 => last / first - 1.0,
            _ => 0.0,
        };

        Metrics {
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            annualized_return,
            calmar_ratio,
            total_return,
        }
    }

    pub fn get(&self, name: MetricName) -> Option<f64> {
        match name {
            MetricName::SharpeRatio => Some(self.sharpe_ratio),
            MetricName::SortinoRatio => Some(self.sortino_ratio),
            MetricName::MaxDrawdown => Some(self.max_drawdown),
            MetricName::AnnualizedReturn => self.annualized_return,
            MetricName::CalmarRatio => self.calmar_ratio,
            MetricName::TotalReturn => Some(self.total_return),
        }
    }

    /// `(name, value)` pairs in report order.
    pub fn entries(&self) -> Vec<(MetricName, Option<f64>)> {
        MetricName::ALL.into_iter().map(|m| (m, self.get(m))).collect()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1); zero below two observations.
fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn compute_risk_adjusted(returns: &[f64], config: &MetricsConfig) -> (f64, f64) {
    if returns.is_empty() {
        return (0.0, 0.0);
    }

    let days = config.trading_days_per_year;
    let daily_rf = config.risk_free_rate / days;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let mean_excess = mean(&excess);

    let sharpe = days.sqrt() * mean_excess / (sample_stddev(returns) + config.epsilon);

    let downside: Vec<f64> = excess.iter().copied().filter(|&e| e < 0.0).collect();
    let sortino = days.sqrt() * mean_excess / (sample_stddev(&downside) + config.epsilon);

    (sharpe, sortino)
}

fn compute_max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &value in equity {
        peak = peak.max(value);
        if peak > 0.0 {
            max_dd = max_dd.min((value - peak) / peak);
        }
    }

    max_dd
}

fn compute_annualized_return(returns: &[f64], trading_days_per_year: f64) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let growth: f64 = returns.iter().map(|r| 1.0 + r).product();
    Some(growth.powf(trading_days_per_year / returns.len() as f64) - 1.0)
}
