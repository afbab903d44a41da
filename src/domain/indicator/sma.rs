//! Simple moving average of closes.
//!
//! Warmup: first (period-1) points are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PricePoint;

pub fn calculate_sma(prices: &[PricePoint], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(prices.len());
    let mut window_sum = 0.0;

    for (i, point) in prices.iter().enumerate() {
        window_sum += point.close;
        if period > 0 && i >= period {
            window_sum -= prices[i - period].close;
        }

        if period == 0 || i + 1 < period {
            values.push(IndicatorPoint::invalid(point.date, IndicatorValue::Simple(0.0)));
        } else {
            values.push(IndicatorPoint {
                date: point.date,
                valid: true,
                value: IndicatorValue::Simple(window_sum / period as f64),
            });
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
