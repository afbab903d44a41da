//! Portfolio simulation engine.
//!
//! `simulate` validates its inputs, then folds the price series and the
//! aligned position changes into a [`Ledger`]. `Backtester` wraps it with a
//! fixed initial capital and keeps the most recent ledger for inspection.

use tracing::debug;

use super::error::QuantsimError;
use super::ledger::{Ledger, LedgerRow};
use super::ohlcv::PricePoint;
use super::signal::{PositionChange, SignalSource};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

pub fn simulate(
    prices: &[PricePoint],
    changes: &[PositionChange],
    initial_capital: f64,
) -> Result<Ledger, QuantsimError> {
    check_preconditions(prices, changes, initial_capital)?;

    let first = &prices[0];
    let opening = LedgerRow::opening(first.date, first.close, initial_capital);

    let rows = prices[1..].iter().zip(&changes[1..]).try_fold(
        vec![opening],
        |mut rows, (point, change)| {
            let next = rows[rows.len() - 1].advance(point.date, point.close, change.delta)?;
            rows.push(next);
            Ok::<_, QuantsimError>(rows)
        },
    )?;

    debug!(
        rows = rows.len(),
        final_equity = rows[rows.len() - 1].total_equity,
        "simulation complete"
    );

    Ok(Ledger {
        initial_capital,
        rows,
    })
}

fn check_preconditions(
    prices: &[PricePoint],
    changes: &[PositionChange],
    initial_capital: f64,
) -> Result<(), QuantsimError> {
    if prices.is_empty() {
        return Err(QuantsimError::EmptySeries);
    }
    if prices.len() != changes.len() {
        return Err(QuantsimError::LengthMismatch {
            prices: prices.len(),
            changes: changes.len(),
        });
    }
    if !(initial_capital.is_finite() && initial_capital > 0.0) {
        return Err(QuantsimError::InvalidCapital {
            capital: initial_capital,
        });
    }

    for (index, (point, change)) in prices.iter().zip(changes).enumerate() {
        if point.date != change.date {
            return Err(QuantsimError::DateMismatch {
                index,
                price_date: point.date,
                change_date: change.date,
            });
        }
        if !(point.close.is_finite() && point.close > 0.0) {
            return Err(QuantsimError::InvalidPrice {
                index,
                price: point.close,
            });
        }
        if index > 0 && point.date < prices[index - 1].date {
            return Err(QuantsimError::UnorderedDates { index });
        }
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct Backtester {
    pub initial_capital: f64,
    last_ledger: Option<Ledger>,
}

impl Default for Backtester {
    fn default() -> Self {
        Backtester::new(DEFAULT_INITIAL_CAPITAL)
    }
}

impl Backtester {
    pub fn new(initial_capital: f64) -> Self {
        Backtester {
            initial_capital,
            last_ledger: None,
        }
    }

    pub fn run(
        &mut self,
        prices: &[PricePoint],
        changes: &[PositionChange],
    ) -> Result<&Ledger, QuantsimError> {
        let ledger = simulate(prices, changes, self.initial_capital)?;
        Ok(&*self.last_ledger.insert(ledger))
    }

    pub fn run_strategy(
        &mut self,
        prices: &[PricePoint],
        source: &dyn SignalSource,
    ) -> Result<&Ledger, QuantsimError> {
        let changes = source.generate_signals(prices);
        debug!(strategy = %source.name(), "running backtest");
        self.run(prices, &changes)
    }

    pub fn last_ledger(&self) -> Option<&Ledger> {
        self.last_ledger.as_ref()
    }
}
