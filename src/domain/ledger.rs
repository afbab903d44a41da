//! Ledger rows and the single-asset state transition.
//!
//! A ledger is the day-by-day record of cash, share holdings and total
//! equity produced by one simulation run. Each row is derived only from the
//! previous row and the current price and position change, so the whole
//! ledger is a fold over the price series.

use chrono::NaiveDate;

use super::error::QuantsimError;

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub price: f64,
    pub cash: f64,
    pub holdings: u64,
    pub total_equity: f64,
    /// `None` on the first row and whenever the prior equity was zero.
    pub period_return: Option<f64>,
}

impl LedgerRow {
    /// Row 0: all cash, no shares, no prior-day comparison.
    pub fn opening(date: NaiveDate, price: f64, initial_capital: f64) -> Self {
        LedgerRow {
            date,
            price,
            cash: initial_capital,
            holdings: 0,
            total_equity: initial_capital,
            period_return: None,
        }
    }

    /// Applies one day's position change at `price` on top of `self`.
    ///
    /// Buys spend all available cash on whole shares, sells liquidate the
    /// full position, anything else (including NaN) holds. Fails when the
    /// share count no longer fits in a `u64`.
    pub fn advance(
        &self,
        date: NaiveDate,
        price: f64,
        delta: f64,
    ) -> Result<LedgerRow, QuantsimError> {
        let mut cash = self.cash;
        let holdings = if delta > 0.0 {
            let shares = affordable_shares(cash, price)
                .ok_or(QuantsimError::PositionOverflow { date })?;
            cash -= shares as f64 * price;
            self.holdings
                .checked_add(shares)
                .ok_or(QuantsimError::PositionOverflow { date })?
        } else if delta < 0.0 {
            cash += self.holdings as f64 * price;
            0
        } else {
            self.holdings
        };

        assert!(cash >= 0.0, "negative cash {cash} on {date}");

        let total_equity = cash + holdings as f64 * price;
        let period_return = if self.total_equity != 0.0 {
            Some(total_equity / self.total_equity - 1.0)
        } else {
            None
        };

        Ok(LedgerRow {
            date,
            price,
            cash,
            holdings,
            total_equity,
            period_return,
        })
    }
}

/// `floor(cash / price)`, stepped down if rounding would overspend.
/// `None` when the quotient does not fit in a `u64`.
fn affordable_shares(cash: f64, price: f64) -> Option<u64> {
    let quotient = (cash / price).floor();
    // u64::MAX as f64 rounds up to 2^64
    if !(quotient < u64::MAX as f64) {
        return None;
    }
    let mut shares = quotient as u64;
    while shares > 0 && shares as f64 * price > cash {
        // at least one ulp of `shares`, so large counts still move
        let step = ((shares as f64 * f64::EPSILON) as u64).max(1);
        shares = shares.saturating_sub(step);
    }
    Some(shares)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub initial_capital: f64,
    pub rows: Vec<LedgerRow>,
}

impl Ledger {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Defined period returns, in order; undefined rows are skipped.
    pub fn returns(&self) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.period_return).collect()
    }

    pub fn equity(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.total_equity).collect()
    }
}
