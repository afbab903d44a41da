//! Property tests for engine and optimizer invariants.
//!
//! Uses proptest to verify:
//! 1. Ledger accounting: equity identity, non-negative cash, one row per bar
//! 2. Idempotence: identical inputs give identical ledgers
//! 3. Zero position changes leave capital untouched
//! 4. Grid search output does not depend on parallelism
//! 5. Metric ranges: drawdown in [-1, 0], finite ratios

mod common;

use common::*;
use proptest::prelude::*;
use proptest::strategy::Strategy as PropStrategy;
use quantsim::domain::backtest::simulate;
use quantsim::domain::grid_search::GridSearch;
use quantsim::domain::metrics::{Metrics, MetricsConfig};
use quantsim::domain::params::{ParamGrid, ParamSet};
use quantsim::domain::strategy::{Strategy, StrategyKind};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes() -> impl PropStrategy<Value = Vec<f64>> {
    prop::collection::vec((1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0), 1..80)
}

fn arb_series() -> impl PropStrategy<Value = (Vec<f64>, Vec<f64>)> {
    arb_closes().prop_flat_map(|closes| {
        let n = closes.len();
        (
            Just(closes),
            prop::collection::vec(arb_delta(), n),
        )
    })
}

/// Any finite delta; zero is weighted up so holds stay common.
fn arb_delta() -> impl PropStrategy<Value = f64> {
    prop_oneof![
        Just(0.0),
        prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO,
    ]
}

fn arb_capital() -> impl PropStrategy<Value = f64> {
    100.0..100_000.0_f64
}

// ── 1. Ledger accounting ─────────────────────────────────────────────

proptest! {
    #[test]
    fn ledger_identity_holds_every_row(
        (closes, deltas) in arb_series(),
        capital in arb_capital(),
    ) {
        let prices = make_prices(&closes);
        let changes = make_changes(&prices, &deltas);
        let ledger = simulate(&prices, &changes, capital).unwrap();

        prop_assert_eq!(ledger.len(), prices.len());
        prop_assert_eq!(ledger.rows[0].total_equity, capital);
        prop_assert!(ledger.rows[0].period_return.is_none());
        for row in &ledger.rows {
            prop_assert!(row.cash >= 0.0);
            prop_assert_eq!(row.total_equity, row.cash + row.holdings as f64 * row.price);
        }
        for row in &ledger.rows[1..] {
            prop_assert!(row.period_return.is_some());
        }
    }

    /// A sell always leaves the position flat.
    #[test]
    fn sells_liquidate((closes, deltas) in arb_series(), capital in arb_capital()) {
        let prices = make_prices(&closes);
        let changes = make_changes(&prices, &deltas);
        let ledger = simulate(&prices, &changes, capital).unwrap();

        for (row, delta) in ledger.rows.iter().zip(&deltas).skip(1) {
            if *delta < 0.0 {
                prop_assert_eq!(row.holdings, 0);
            }
        }
    }
}

// ── 2. Idempotence ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn simulation_is_idempotent((closes, deltas) in arb_series(), capital in arb_capital()) {
        let prices = make_prices(&closes);
        let changes = make_changes(&prices, &deltas);
        let first = simulate(&prices, &changes, capital).unwrap();
        let second = simulate(&prices, &changes, capital).unwrap();
        prop_assert_eq!(first, second);
    }
}

// ── 3. Zero position changes ─────────────────────────────────────────

proptest! {
    #[test]
    fn no_changes_keeps_capital(closes in arb_closes(), capital in arb_capital()) {
        let prices = make_prices(&closes);
        let changes = make_changes(&prices, &vec![0.0; closes.len()]);
        let ledger = simulate(&prices, &changes, capital).unwrap();

        for row in &ledger.rows {
            prop_assert_eq!(row.holdings, 0);
            prop_assert_eq!(row.total_equity, capital);
        }
        let metrics = Metrics::compute(&ledger, &MetricsConfig::default());
        prop_assert_eq!(metrics.total_return, 0.0);
        prop_assert_eq!(metrics.max_drawdown, 0.0);
    }
}

// ── 4. Grid search determinism ───────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn grid_results_do_not_depend_on_parallelism(
        closes in prop::collection::vec(20.0..200.0_f64, 30..90),
        shorts in prop::collection::vec(1i64..8, 1..4),
        longs in prop::collection::vec(5i64..20, 1..4),
    ) {
        let prices = make_prices(&closes);
        let kind = StrategyKind::Sma;
        let grid = ParamGrid::new()
            .with_values("short_window", shorts)
            .with_values("long_window", longs);
        let factory = |p: &ParamSet| Strategy::from_params(kind, p);

        let parallel = GridSearch::default().search(&prices, factory, &grid);
        let sequential = GridSearch::default()
            .with_parallelism(false)
            .search(&prices, factory, &grid);

        prop_assert_eq!(parallel.table.len(), grid.size());
        prop_assert_eq!(parallel.table, sequential.table);
    }
}

// ── 5. Metric ranges ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn metrics_stay_in_range((closes, deltas) in arb_series(), capital in arb_capital()) {
        let prices = make_prices(&closes);
        let changes = make_changes(&prices, &deltas);
        let ledger = simulate(&prices, &changes, capital).unwrap();
        let metrics = Metrics::compute(&ledger, &MetricsConfig::default());

        prop_assert!(metrics.max_drawdown <= 0.0);
        prop_assert!(metrics.max_drawdown >= -1.0);
        prop_assert!(metrics.sharpe_ratio.is_finite());
        prop_assert!(metrics.sortino_ratio.is_finite());
        prop_assert!(metrics.total_return >= -1.0);
        prop_assert_eq!(metrics.annualized_return.is_none(), ledger.len() == 1);
    }
}
