//! Built-in strategies.
//!
//! Each variant owns its parameters and is resolved once, at construction,
//! from a [`StrategyKind`] and a [`ParamSet`]. Every strategy computes a
//! desired position level per day (1 long, 0 flat, -1 exit) and emits its
//! first difference as the position-change series.

use std::fmt;
use std::str::FromStr;

use super::error::QuantsimError;
use super::indicator::bollinger::calculate_bollinger;
use super::indicator::rsi::calculate_rsi;
use super::indicator::sma::calculate_sma;
use super::ohlcv::PricePoint;
use super::params::{ParamGrid, ParamSet, ParamValue};
use super::signal::{position_changes, PositionChange, SignalSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Sma,
    MeanReversion,
    Momentum,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Sma,
        StrategyKind::MeanReversion,
        StrategyKind::Momentum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Sma => "SMA",
            StrategyKind::MeanReversion => "MeanReversion",
            StrategyKind::Momentum => "Momentum",
        }
    }

    /// Parameter names this kind understands, in declaration order.
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            StrategyKind::Sma => &["short_window", "long_window"],
            StrategyKind::MeanReversion => &["window", "threshold"],
            StrategyKind::Momentum => &["window", "overbought", "oversold"],
        }
    }

    pub fn default_params(&self) -> ParamSet {
        match self {
            StrategyKind::Sma => ParamSet::new()
                .with("short_window", 20)
                .with("long_window", 50),
            StrategyKind::MeanReversion => ParamSet::new()
                .with("window", 20)
                .with("threshold", 2.0),
            StrategyKind::Momentum => ParamSet::new()
                .with("window", 14)
                .with("overbought", 70)
                .with("oversold", 30),
        }
    }

    pub fn default_grid(&self) -> ParamGrid {
        match self {
            StrategyKind::Sma => ParamGrid::new()
                .with_values("short_window", [10, 20, 30])
                .with_values("long_window", [50, 100, 200]),
            StrategyKind::MeanReversion => ParamGrid::new()
                .with_values("window", [10, 20, 30])
                .with_values("threshold", [1.5, 2.0, 2.5]),
            StrategyKind::Momentum => ParamGrid::new()
                .with_values("window", [10, 14, 20])
                .with_values("overbought", [70, 80])
                .with_values("oversold", [20, 30]),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = QuantsimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| QuantsimError::UnknownStrategy {
                name: wanted.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Long while the short SMA is above the long SMA.
    Sma {
        short_window: usize,
        long_window: usize,
    },
    /// Long below the lower Bollinger band, exit above the upper band.
    MeanReversion { window: usize, threshold: f64 },
    /// Long when RSI is oversold, exit when overbought.
    Momentum {
        window: usize,
        overbought: f64,
        oversold: f64,
    },
}

impl Strategy {
    /// Builds a strategy of `kind`; parameters missing from `params` take
    /// their defaults, unknown names are rejected.
    pub fn from_params(kind: StrategyKind, params: &ParamSet) -> Result<Self, QuantsimError> {
        if let Some(unknown) = params
            .names()
            .find(|n| !kind.parameter_names().contains(n))
        {
            return Err(QuantsimError::InvalidParameter {
                name: unknown.to_string(),
                reason: format!("not a parameter of the {kind} strategy"),
            });
        }

        let mut resolved = kind.default_params();
        for (name, value) in params.iter() {
            resolved.set(name, value);
        }

        let strategy = match kind {
            StrategyKind::Sma => Strategy::Sma {
                short_window: window_param(&resolved, "short_window")?,
                long_window: window_param(&resolved, "long_window")?,
            },
            StrategyKind::MeanReversion => Strategy::MeanReversion {
                window: window_param(&resolved, "window")?,
                threshold: number_param(&resolved, "threshold")?,
            },
            StrategyKind::Momentum => Strategy::Momentum {
                window: window_param(&resolved, "window")?,
                overbought: number_param(&resolved, "overbought")?,
                oversold: number_param(&resolved, "oversold")?,
            },
        };
        strategy.validate()?;
        Ok(strategy)
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Sma { .. } => StrategyKind::Sma,
            Strategy::MeanReversion { .. } => StrategyKind::MeanReversion,
            Strategy::Momentum { .. } => StrategyKind::Momentum,
        }
    }

    pub fn params(&self) -> ParamSet {
        match *self {
            Strategy::Sma {
                short_window,
                long_window,
            } => ParamSet::new()
                .with("short_window", short_window as i64)
                .with("long_window", long_window as i64),
            Strategy::MeanReversion { window, threshold } => ParamSet::new()
                .with("window", window as i64)
                .with("threshold", threshold),
            Strategy::Momentum {
                window,
                overbought,
                oversold,
            } => ParamSet::new()
                .with("window", window as i64)
                .with("overbought", overbought)
                .with("oversold", oversold),
        }
    }

    fn validate(&self) -> Result<(), QuantsimError> {
        match *self {
            Strategy::Sma { .. } => Ok(()),
            Strategy::MeanReversion { window, threshold } => {
                if window < 2 {
                    return Err(invalid("window", "must be at least 2 for a sample deviation"));
                }
                if threshold <= 0.0 {
                    return Err(invalid("threshold", "must be positive"));
                }
                Ok(())
            }
            Strategy::Momentum {
                overbought,
                oversold,
                ..
            } => {
                for (name, level) in [("overbought", overbought), ("oversold", oversold)] {
                    if !(0.0..=100.0).contains(&level) {
                        return Err(invalid(name, "must be between 0 and 100"));
                    }
                }
                if oversold >= overbought {
                    return Err(invalid("oversold", "must be below overbought"));
                }
                Ok(())
            }
        }
    }

    /// Desired position level per price point.
    pub fn desired_positions(&self, prices: &[PricePoint]) -> Vec<f64> {
        match *self {
            Strategy::Sma {
                short_window,
                long_window,
            } => {
                let short = calculate_sma(prices, short_window);
                let long = calculate_sma(prices, long_window);
                short
                    .values
                    .iter()
                    .zip(&long.values)
                    .enumerate()
                    .map(|(i, (s, l))| match (s.simple(), l.simple()) {
                        (Some(s), Some(l)) if i >= short_window && s > l => 1.0,
                        _ => 0.0,
                    })
                    .collect()
            }
            Strategy::MeanReversion { window, threshold } => {
                let bands = calculate_bollinger(prices, window, threshold);
                prices
                    .iter()
                    .zip(&bands.values)
                    .map(|(p, b)| match b.bands() {
                        Some((upper, _, _)) if p.close > upper => -1.0,
                        Some((_, _, lower)) if p.close < lower => 1.0,
                        _ => 0.0,
                    })
                    .collect()
            }
            Strategy::Momentum {
                window,
                overbought,
                oversold,
            } => calculate_rsi(prices, window)
                .values
                .iter()
                .map(|p| match p.simple() {
                    Some(rsi) if rsi > overbought => -1.0,
                    Some(rsi) if rsi < oversold => 1.0,
                    _ => 0.0,
                })
                .collect(),
        }
    }
}

impl SignalSource for Strategy {
    /// `SMA_20_50`, `MeanReversion_20_2`, `Momentum_14_70_30`.
    fn name(&self) -> String {
        let mut name = self.kind().as_str().to_string();
        for (_, value) in self.params().iter() {
            name.push('_');
            name.push_str(&value.to_string());
        }
        name
    }

    fn generate_signals(&self, prices: &[PricePoint]) -> Vec<PositionChange> {
        position_changes(prices, &self.desired_positions(prices))
    }
}

fn invalid(name: &str, reason: &str) -> QuantsimError {
    QuantsimError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn window_param(params: &ParamSet, name: &str) -> Result<usize, QuantsimError> {
    match params.get(name).and_then(|v| v.as_usize()) {
        Some(w) if w >= 1 => Ok(w),
        _ => Err(invalid(name, "must be a positive whole number")),
    }
}

fn number_param(params: &ParamSet, name: &str) -> Result<f64, QuantsimError> {
    params
        .get(name)
        .map(|v: ParamValue| v.as_f64())
        .ok_or_else(|| invalid(name, "missing"))
}
