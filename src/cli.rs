//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::Backtester;
use crate::domain::config_validation::{
    self, validate_backtest_config, validate_optimize_config, validate_strategy_config,
};
use crate::domain::error::QuantsimError;
use crate::domain::grid_search::{GridSearch, ResultTable};
use crate::domain::metrics::{MetricName, Metrics, MetricsConfig};
use crate::domain::ohlcv::{price_series, PricePoint};
use crate::domain::params::ParamGrid;
use crate::domain::signal::SignalSource;
use crate::domain::strategy::{Strategy, StrategyKind};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "quantsim",
    about = "Single-asset strategy backtester and parameter optimizer"
)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one strategy over a ticker's history
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// SMA, MeanReversion or Momentum
        #[arg(short, long)]
        strategy: Option<StrategyKind>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Grid-search a strategy's parameters
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        strategy: Option<StrategyKind>,
        /// Grid as `name=v1,v2;name2=v3,v4`
        #[arg(long)]
        param_grid: Option<String>,
        /// Metric used to pick the best combination
        #[arg(long)]
        select_by: Option<MetricName>,
        /// Evaluate combinations one at a time
        #[arg(long)]
        sequential: bool,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Validate a configuration file without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range available for a ticker
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ticker: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub strategy: Option<StrategyKind>,
    pub output_dir: Option<PathBuf>,
}

/// Everything one simulation run needs, resolved from config and overrides.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub ticker: String,
    pub data_dir: PathBuf,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub initial_capital: f64,
    pub metrics_config: MetricsConfig,
    pub strategy: Strategy,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct OptimizeSettings {
    pub grid: ParamGrid,
    pub select_by: MetricName,
    pub parallel: bool,
}

#[derive(Debug)]
pub struct OptimizeSummary {
    pub table: ResultTable,
    pub best: Strategy,
    pub best_metrics: Metrics,
}

pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            ticker,
            data_dir,
            strategy,
            output_dir,
        } => run_backtest(
            &config,
            &Overrides {
                ticker,
                data_dir,
                strategy,
                output_dir,
            },
        ),
        Command::Optimize {
            config,
            ticker,
            data_dir,
            strategy,
            param_grid,
            select_by,
            sequential,
            output_dir,
        } => run_optimize(
            &config,
            &Overrides {
                ticker,
                data_dir,
                strategy,
                output_dir,
            },
            param_grid.as_deref(),
            select_by,
            sequential,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, ticker } => run_info(&config, ticker.as_deref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: QuantsimError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn build_run_settings(
    config: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<RunSettings, QuantsimError> {
    let ticker = match &overrides.ticker {
        Some(t) => t.trim().to_uppercase(),
        None => config_validation::ticker(config)?.to_uppercase(),
    };
    let data_dir = overrides
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(config_validation::data_dir(config)));
    let output_dir = overrides
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(config_validation::output_dir(config)));
    let (start_date, end_date) = config_validation::date_range(config)?;

    Ok(RunSettings {
        ticker,
        data_dir,
        start_date,
        end_date,
        initial_capital: config_validation::initial_capital(config)?,
        metrics_config: config_validation::metrics_config(config)?,
        strategy: config_validation::strategy_from_config(config, overrides.strategy)?,
        output_dir,
    })
}

/// Resolves the sweep. A `--param-grid` replaces the file's grid; switching
/// strategy family on the command line falls back to that family's default
/// grid.
pub fn build_optimize_settings(
    config: &dyn ConfigPort,
    kind: StrategyKind,
    grid_override: Option<&str>,
    select_by_override: Option<MetricName>,
    sequential: bool,
) -> Result<OptimizeSettings, QuantsimError> {
    let grid = match grid_override {
        Some(spec) => {
            let grid = ParamGrid::parse(spec).map_err(|reason| QuantsimError::InvalidParameter {
                name: "param_grid".to_string(),
                reason,
            })?;
            if let Some(unknown) = grid
                .names()
                .find(|n| !kind.parameter_names().contains(n))
            {
                return Err(QuantsimError::InvalidParameter {
                    name: unknown.to_string(),
                    reason: format!("not a parameter of {kind}"),
                });
            }
            grid
        }
        None if config_validation::strategy_kind(config)? == kind => {
            config_validation::param_grid(config, kind)?
        }
        None => kind.default_grid(),
    };

    let select_by = match select_by_override {
        Some(m) => m,
        None => config_validation::select_by(config)?,
    };

    Ok(OptimizeSettings {
        grid,
        select_by,
        parallel: !sequential && config_validation::parallel(config),
    })
}

pub fn load_prices(
    data_port: &dyn DataPort,
    settings: &RunSettings,
) -> Result<Vec<PricePoint>, QuantsimError> {
    let bars = data_port.fetch_ohlcv(&settings.ticker, settings.start_date, settings.end_date)?;
    if bars.is_empty() {
        return Err(QuantsimError::NoData {
            ticker: settings.ticker.clone(),
        });
    }
    Ok(price_series(&bars))
}

fn run_backtest(config_path: &PathBuf, overrides: &Overrides) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate and resolve settings
    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    let settings = match build_run_settings(&adapter, overrides) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    // Stages 3-6: Load data, simulate, score, write reports
    let data_port = CsvAdapter::new(settings.data_dir.clone());
    let report_port = CsvReportAdapter::new(&settings.output_dir);
    match run_backtest_pipeline(&data_port, &report_port, &settings) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    settings: &RunSettings,
) -> Result<Metrics, QuantsimError> {
    // Stage 3: Load prices
    let prices = load_prices(data_port, settings)?;
    let name = settings.strategy.name();
    eprintln!(
        "Running {} on {}: {} bars, {} to {}",
        name,
        settings.ticker,
        prices.len(),
        prices[0].date,
        prices[prices.len() - 1].date,
    );

    // Stage 4: Simulate
    let mut backtester = Backtester::new(settings.initial_capital);
    let ledger = backtester.run_strategy(&prices, &settings.strategy)?;

    // Stage 5: Compute metrics and print summary
    let metrics = Metrics::compute(ledger, &settings.metrics_config);
    print_metrics(&name, &metrics);

    // Stage 6: Write reports
    let ledger_path = report_port.write_ledger(ledger, &name)?;
    let metrics_path = report_port.write_metrics(&metrics, &name)?;
    eprintln!("\nLedger written to: {}", ledger_path.display());
    eprintln!("Metrics written to: {}", metrics_path.display());

    Ok(metrics)
}

fn run_optimize(
    config_path: &PathBuf,
    overrides: &Overrides,
    grid_override: Option<&str>,
    select_by_override: Option<MetricName>,
    sequential: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    let settings = match build_run_settings(&adapter, overrides) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let optimize = match build_optimize_settings(
        &adapter,
        settings.strategy.kind(),
        grid_override,
        select_by_override,
        sequential,
    ) {
        Ok(o) => o,
        Err(e) => return fail(e),
    };

    let data_port = CsvAdapter::new(settings.data_dir.clone());
    let report_port = CsvReportAdapter::new(&settings.output_dir);
    match run_optimize_pipeline(&data_port, &report_port, &settings, &optimize) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

pub fn run_optimize_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    settings: &RunSettings,
    optimize: &OptimizeSettings,
) -> Result<OptimizeSummary, QuantsimError> {
    let prices = load_prices(data_port, settings)?;
    let kind = settings.strategy.kind();

    eprintln!(
        "Optimizing {} on {}: {} combinations over {} bars{}",
        kind,
        settings.ticker,
        optimize.grid.size(),
        prices.len(),
        if optimize.parallel { "" } else { " (sequential)" },
    );

    let search = GridSearch::new(settings.initial_capital, settings.metrics_config.clone())
        .with_parallelism(optimize.parallel);
    let outcome = search.search(
        &prices,
        |params| Strategy::from_params(kind, params),
        &optimize.grid,
    );

    let table_path = report_port.write_optimization(&outcome.table, kind.as_str())?;
    eprintln!("Results written to: {}", table_path.display());

    let failures: Vec<_> = outcome.table.failures().collect();
    if !failures.is_empty() {
        eprintln!("\n{} combination(s) failed:", failures.len());
        for row in &failures {
            eprintln!(
                "  {}: {}",
                row.parameters,
                row.error.as_deref().unwrap_or_default()
            );
        }
    }

    let best_row = outcome
        .table
        .best_by(optimize.select_by)
        .ok_or_else(|| QuantsimError::InvalidParameter {
            name: "param_grid".to_string(),
            reason: format!("no combination produced a usable {}", optimize.select_by),
        })?;
    let best = Strategy::from_params(kind, &best_row.parameters)?;
    println!(
        "Best by {}: {} {}",
        optimize.select_by,
        best.name(),
        best_row.parameters
    );

    // Re-run the winner for its full ledger
    let mut backtester = Backtester::new(settings.initial_capital);
    let ledger = backtester.run_strategy(&prices, &best)?;
    let best_metrics = Metrics::compute(ledger, &settings.metrics_config);
    let name = best.name();
    print_metrics(&name, &best_metrics);

    let ledger_path = report_port.write_ledger(ledger, &name)?;
    let metrics_path = report_port.write_metrics(&best_metrics, &name)?;
    eprintln!("\nLedger written to: {}", ledger_path.display());
    eprintln!("Metrics written to: {}", metrics_path.display());

    Ok(OptimizeSummary {
        table: outcome.table,
        best,
        best_metrics,
    })
}

fn print_metrics(name: &str, metrics: &Metrics) {
    println!("\n=== {} ===", name);
    for (metric, value) in metrics.entries() {
        match value {
            Some(v) => println!("{:<18} {:.4}", metric.as_str(), v),
            None => println!("{:<18} n/a", metric.as_str()),
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let checks = validate_backtest_config(&adapter)
        .and_then(|()| validate_strategy_config(&adapter))
        .and_then(|()| validate_optimize_config(&adapter));
    if let Err(e) = checks {
        return fail(e);
    }

    let strategy = match config_validation::strategy_from_config(&adapter, None) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let optimize = match build_optimize_settings(&adapter, strategy.kind(), None, None, false) {
        Ok(o) => o,
        Err(e) => return fail(e),
    };

    eprintln!("\nStrategy: {} {}", strategy.name(), strategy.params());
    match adapter.get_non_empty("data", "ticker") {
        Some(t) => eprintln!("Ticker:   {}", t.to_uppercase()),
        None => eprintln!("Ticker:   (not set, pass --ticker)"),
    }
    eprintln!(
        "Grid:     {} combinations, select by {}",
        optimize.grid.size(),
        optimize.select_by
    );
    for name in optimize.grid.names() {
        let values: Vec<String> = optimize
            .grid
            .values(name)
            .unwrap_or_default()
            .iter()
            .map(|v| v.to_string())
            .collect();
        eprintln!("  {}: {}", name, values.join(", "));
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf, ticker_override: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let ticker = match ticker_override {
        Some(t) => t.trim().to_uppercase(),
        None => match config_validation::ticker(&config) {
            Ok(t) => t.to_uppercase(),
            Err(e) => return fail(e),
        },
    };

    let data_port = CsvAdapter::new(PathBuf::from(config_validation::data_dir(&config)));
    match data_port.get_data_range(&ticker) {
        Ok(Some((min_date, max_date, count))) => {
            println!("{}: {} bars, {} to {}", ticker, count, min_date, max_date);
        }
        Ok(None) => {
            eprintln!("{}: no data found", ticker);
        }
        Err(e) => {
            eprintln!("error querying {}: {}", ticker, e);
            return (&e).into();
        }
    }
    ExitCode::SUCCESS
}
