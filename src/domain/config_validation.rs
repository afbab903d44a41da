//! Configuration validation and resolution.
//!
//! Each resolver reads one group of settings through [`ConfigPort`] and
//! returns typed values, failing with `ConfigMissing`/`ConfigInvalid`. The
//! `validate_*` entry points run the resolvers up front so a bad file is
//! rejected before any data is loaded.

use crate::domain::backtest::DEFAULT_INITIAL_CAPITAL;
use crate::domain::error::QuantsimError;
use crate::domain::metrics::{
    MetricName, MetricsConfig, DEFAULT_EPSILON, DEFAULT_RISK_FREE_RATE, TRADING_DAYS_PER_YEAR,
};
use crate::domain::params::{parse_values, ParamGrid, ParamSet};
use crate::domain::strategy::{Strategy, StrategyKind};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = "results";

/// Keys in `[optimize]` that are settings rather than grid axes.
const OPTIMIZE_SETTINGS: [&str; 2] = ["select_by", "parallel"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), QuantsimError> {
    initial_capital(config)?;
    metrics_config(config)?;
    date_range(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), QuantsimError> {
    strategy_from_config(config, None)?;
    Ok(())
}

pub fn validate_optimize_config(config: &dyn ConfigPort) -> Result<(), QuantsimError> {
    select_by(config)?;
    let kind = strategy_kind(config)?;
    param_grid(config, kind)?;
    Ok(())
}

pub fn initial_capital(config: &dyn ConfigPort) -> Result<f64, QuantsimError> {
    let value = read_f64(config, "backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL)?;
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(value)
}

pub fn metrics_config(config: &dyn ConfigPort) -> Result<MetricsConfig, QuantsimError> {
    let risk_free_rate = read_f64(config, "backtest", "risk_free_rate", DEFAULT_RISK_FREE_RATE)?;
    if !(0.0..1.0).contains(&risk_free_rate) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }

    let trading_days_per_year = read_f64(
        config,
        "backtest",
        "trading_days_per_year",
        TRADING_DAYS_PER_YEAR,
    )?;
    if trading_days_per_year <= 0.0 {
        return Err(invalid(
            "backtest",
            "trading_days_per_year",
            "trading_days_per_year must be positive",
        ));
    }

    let epsilon = read_f64(config, "backtest", "epsilon", DEFAULT_EPSILON)?;
    if epsilon <= 0.0 {
        return Err(invalid("backtest", "epsilon", "epsilon must be positive"));
    }

    Ok(MetricsConfig {
        risk_free_rate,
        trading_days_per_year,
        epsilon,
    })
}

/// Optional inclusive bounds from `[data] start_date / end_date`.
pub fn date_range(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), QuantsimError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;

    if let (Some(s), Some(e)) = (start, end) {
        if s >= e {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok((start, end))
}

fn parse_date(config: &dyn ConfigPort, field: &str) -> Result<Option<NaiveDate>, QuantsimError> {
    match config.get_non_empty("data", field) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "data",
                    field,
                    &format!("invalid {} format, expected YYYY-MM-DD", field),
                )
            }),
    }
}

pub fn ticker(config: &dyn ConfigPort) -> Result<String, QuantsimError> {
    config
        .get_non_empty("data", "ticker")
        .ok_or_else(|| QuantsimError::ConfigMissing {
            section: "data".to_string(),
            key: "ticker".to_string(),
        })
}

pub fn data_dir(config: &dyn ConfigPort) -> String {
    config
        .get_non_empty("data", "dir")
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
}

pub fn output_dir(config: &dyn ConfigPort) -> String {
    config
        .get_non_empty("report", "output_dir")
        .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string())
}

/// `[strategy] kind`, defaulting to SMA.
pub fn strategy_kind(config: &dyn ConfigPort) -> Result<StrategyKind, QuantsimError> {
    match config.get_non_empty("strategy", "kind") {
        None => Ok(StrategyKind::Sma),
        Some(name) => name.parse(),
    }
}

/// Parameters listed under `[strategy]` for `kind`. Keys that are not
/// parameters of `kind` are rejected.
pub fn strategy_params(
    config: &dyn ConfigPort,
    kind: StrategyKind,
) -> Result<ParamSet, QuantsimError> {
    let mut params = ParamSet::new();
    for key in config.keys("strategy") {
        if key == "kind" {
            continue;
        }
        if !kind.parameter_names().contains(&key.as_str()) {
            return Err(invalid(
                "strategy",
                &key,
                &format!("not a parameter of {kind}"),
            ));
        }
        let raw = config.get_non_empty("strategy", &key).unwrap_or_default();
        let value = raw
            .parse()
            .map_err(|reason: String| invalid("strategy", &key, &reason))?;
        params.set(&key, value);
    }
    Ok(params)
}

/// Builds the configured strategy. When `kind_override` names a different
/// family than the file, the file's parameters are dropped and defaults apply.
pub fn strategy_from_config(
    config: &dyn ConfigPort,
    kind_override: Option<StrategyKind>,
) -> Result<Strategy, QuantsimError> {
    let configured = strategy_kind(config)?;
    let kind = kind_override.unwrap_or(configured);
    let params = if kind == configured {
        strategy_params(config, kind)?
    } else {
        ParamSet::new()
    };
    Strategy::from_params(kind, &params)
}

/// Grid axes from `[optimize]`, ordered as the strategy declares its
/// parameters. Falls back to the strategy's default grid when none are set.
pub fn param_grid(config: &dyn ConfigPort, kind: StrategyKind) -> Result<ParamGrid, QuantsimError> {
    let keys: Vec<String> = config
        .keys("optimize")
        .into_iter()
        .filter(|k| !OPTIMIZE_SETTINGS.contains(&k.as_str()))
        .collect();

    if let Some(unknown) = keys
        .iter()
        .find(|k| !kind.parameter_names().contains(&k.as_str()))
    {
        return Err(invalid(
            "optimize",
            unknown,
            &format!("not a parameter of {kind}"),
        ));
    }

    if keys.is_empty() {
        return Ok(kind.default_grid());
    }

    let mut grid = ParamGrid::new();
    for name in kind.parameter_names() {
        if !keys.iter().any(|k| k == name) {
            continue;
        }
        let raw = config.get_non_empty("optimize", name).unwrap_or_default();
        let values = parse_values(&raw).map_err(|reason| invalid("optimize", name, &reason))?;
        if values.is_empty() {
            return Err(invalid("optimize", name, "at least one value is required"));
        }
        grid.insert(name, values);
    }
    Ok(grid)
}

/// `[optimize] select_by`, defaulting to the Sharpe ratio.
pub fn select_by(config: &dyn ConfigPort) -> Result<MetricName, QuantsimError> {
    match config.get_non_empty("optimize", "select_by") {
        None => Ok(MetricName::SharpeRatio),
        Some(name) => name
            .parse()
            .map_err(|reason: String| invalid("optimize", "select_by", &reason)),
    }
}

pub fn parallel(config: &dyn ConfigPort) -> bool {
    config.get_bool("optimize", "parallel", true)
}

fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, QuantsimError> {
    match config.get_non_empty(section, key) {
        None => Ok(default),
        Some(raw) => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(invalid(
                section,
                key,
                &format!("{key} must be a number, got {raw:?}"),
            )),
        },
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> QuantsimError {
    QuantsimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::params::ParamValue;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[data]
ticker = AAPL
start_date = 2020-01-01
end_date = 2023-01-01

[backtest]
initial_capital = 10000.0
risk_free_rate = 0.01
trading_days_per_year = 252
epsilon = 0.00000001
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = make_config("[data]\nticker = AAPL\n");
        assert_eq!(initial_capital(&config).unwrap(), 10_000.0);
        assert_eq!(metrics_config(&config).unwrap(), MetricsConfig::default());
        assert_eq!(date_range(&config).unwrap(), (None, None));
        assert_eq!(data_dir(&config), "data");
        assert_eq!(output_dir(&config), "results");
        assert_eq!(select_by(&config).unwrap(), MetricName::SharpeRatio);
        assert!(parallel(&config));
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let config = make_config("[backtest]\ninitial_capital = -100\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, QuantsimError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn initial_capital_zero_fails() {
        let config = make_config("[backtest]\ninitial_capital = 0\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, QuantsimError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn non_numeric_capital_fails() {
        let config = make_config("[backtest]\ninitial_capital = lots\n");
        let err = initial_capital(&config).unwrap_err();
        assert!(
            matches!(err, QuantsimError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn risk_free_rate_out_of_range_fails() {
        let config = make_config("[backtest]\nrisk_free_rate = 1.5\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, QuantsimError::ConfigInvalid { key, .. } if key == "risk_free_rate")
        );
    }

    #[test]
    fn risk_free_rate_negative_fails() {
        let config = make_config("[backtest]\nrisk_free_rate = -0.05\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, QuantsimError::ConfigInvalid { key, .. } if key == "risk_free_rate")
        );
    }

    #[test]
    fn trading_days_and_epsilon_must_be_positive() {
        let config = make_config("[backtest]\ntrading_days_per_year = 0\n");
        let err = metrics_config(&config).unwrap_err();
        assert!(matches!(
            err,
            QuantsimError::ConfigInvalid { key, .. } if key == "trading_days_per_year"
        ));

        let config = make_config("[backtest]\nepsilon = -1e-8\n");
        let err = metrics_config(&config).unwrap_err();
        assert!(matches!(err, QuantsimError::ConfigInvalid { key, .. } if key == "epsilon"));
    }

    #[test]
    fn metrics_config_overrides() {
        let config = make_config(
            "[backtest]\nrisk_free_rate = 0.02\ntrading_days_per_year = 365\nepsilon = 0.001\n",
        );
        let metrics = metrics_config(&config).unwrap();
        assert_eq!(metrics.risk_free_rate, 0.02);
        assert_eq!(metrics.trading_days_per_year, 365.0);
        assert_eq!(metrics.epsilon, 0.001);
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let config = make_config("[data]\nstart_date = 2020/01/01\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, QuantsimError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_date_after_end_date_fails() {
        let config = make_config("[data]\nstart_date = 2024-12-31\nend_date = 2020-01-01\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, QuantsimError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn single_bound_is_allowed() {
        let config = make_config("[data]\nend_date = 2022-06-30\n");
        let (start, end) = date_range(&config).unwrap();
        assert_eq!(start, None);
        assert_eq!(end, NaiveDate::from_ymd_opt(2022, 6, 30));
    }

    #[test]
    fn missing_ticker_fails() {
        let config = make_config("[data]\ndir = prices\n");
        let err = ticker(&config).unwrap_err();
        assert!(matches!(err, QuantsimError::ConfigMissing { key, .. } if key == "ticker"));
    }

    #[test]
    fn valid_strategy_config_passes() {
        let config =
            make_config("[strategy]\nkind = MeanReversion\nwindow = 10\nthreshold = 1.5\n");
        let strategy = strategy_from_config(&config, None).unwrap();
        assert_eq!(
            strategy,
            Strategy::MeanReversion {
                window: 10,
                threshold: 1.5
            }
        );
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn missing_strategy_section_is_default_sma() {
        let config = make_config("[data]\nticker = AAPL\n");
        let strategy = strategy_from_config(&config, None).unwrap();
        assert_eq!(
            strategy,
            Strategy::Sma {
                short_window: 20,
                long_window: 50
            }
        );
    }

    #[test]
    fn unknown_strategy_kind_fails() {
        let config = make_config("[strategy]\nkind = Breakout\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, QuantsimError::UnknownStrategy { .. }));
    }

    #[test]
    fn foreign_strategy_parameter_fails() {
        let config = make_config("[strategy]\nkind = SMA\nthreshold = 2.0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, QuantsimError::ConfigInvalid { key, .. } if key == "threshold"));
    }

    #[test]
    fn invalid_strategy_parameter_fails() {
        let config = make_config("[strategy]\nkind = Momentum\noversold = 80\noverbought = 70\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, QuantsimError::InvalidParameter { .. }));
    }

    #[test]
    fn kind_override_drops_file_parameters() {
        let config = make_config("[strategy]\nkind = SMA\nshort_window = 5\n");
        let strategy = strategy_from_config(&config, Some(StrategyKind::Momentum)).unwrap();
        assert_eq!(
            strategy,
            Strategy::Momentum {
                window: 14,
                overbought: 70.0,
                oversold: 30.0
            }
        );

        let same = strategy_from_config(&config, Some(StrategyKind::Sma)).unwrap();
        assert_eq!(
            same,
            Strategy::Sma {
                short_window: 5,
                long_window: 50
            }
        );
    }

    #[test]
    fn param_grid_follows_parameter_order() {
        let config = make_config(
            "[optimize]\nselect_by = total_return\n\
             long_window = 100,200\nshort_window = 10,20,30\n",
        );
        let grid = param_grid(&config, StrategyKind::Sma).unwrap();
        let names: Vec<&str> = grid.names().collect();
        assert_eq!(names, vec!["short_window", "long_window"]);
        assert_eq!(grid.size(), 6);
        assert_eq!(
            grid.values("long_window").unwrap(),
            &[ParamValue::Int(100), ParamValue::Int(200)]
        );
    }

    #[test]
    fn param_grid_defaults_when_unset() {
        let config = make_config("[optimize]\nparallel = false\n");
        let grid = param_grid(&config, StrategyKind::Momentum).unwrap();
        assert_eq!(grid, StrategyKind::Momentum.default_grid());
        assert!(!parallel(&config));
    }

    #[test]
    fn grid_key_outside_strategy_fails() {
        let config = make_config("[optimize]\nthreshold = 1.5,2.0\n");
        let err = param_grid(&config, StrategyKind::Sma).unwrap_err();
        assert!(matches!(err, QuantsimError::ConfigInvalid { key, .. } if key == "threshold"));
    }

    #[test]
    fn grid_values_must_parse() {
        let config = make_config("[optimize]\nwindow = 10,abc\n");
        let err = param_grid(&config, StrategyKind::MeanReversion).unwrap_err();
        assert!(matches!(err, QuantsimError::ConfigInvalid { key, .. } if key == "window"));
    }

    #[test]
    fn unknown_select_by_fails() {
        let config = make_config("[optimize]\nselect_by = alpha\n");
        let err = validate_optimize_config(&config).unwrap_err();
        assert!(matches!(err, QuantsimError::ConfigInvalid { key, .. } if key == "select_by"));
    }
}
