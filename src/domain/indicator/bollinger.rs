//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the sample standard deviation (divides by N-1), so a window of
//! one price has no bands.
//!
//! Warmup: first (period-1) points are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PricePoint;

pub fn calculate_bollinger(
    prices: &[PricePoint],
    period: usize,
    multiplier: f64,
) -> IndicatorSeries {
    let mut values = Vec::with_capacity(prices.len());
    let warmup = period.saturating_sub(1);

    for (i, point) in prices.iter().enumerate() {
        let valid = period >= 2 && i >= warmup;

        let (upper, middle, lower) = if valid {
            let window = &prices[i + 1 - period..=i];

            let middle_val: f64 = window.iter().map(|p| p.close).sum::<f64>() / period as f64;

            let variance: f64 = window
                .iter()
                .map(|p| {
                    let diff = p.close - middle_val;
                    diff * diff
                })
                .sum::<f64>()
                / (period - 1) as f64;

            let stddev = variance.sqrt();
            (
                middle_val + multiplier * stddev,
                middle_val,
                middle_val - multiplier * stddev,
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        values.push(IndicatorPoint {
            date: point.date,
            valid,
            value: IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger { period, multiplier },
        values,
    }
}
