//! RSI (Relative Strength Index) indicator.
//!
//! Average gain and loss are plain rolling means of the last n price changes
//! (no Wilder smoothing).
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100
//! If both are 0 the RSI is undefined and the point is invalid.
//!
//! Warmup: first n points are invalid (need n price changes).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PricePoint;

pub fn calculate_rsi(prices: &[PricePoint], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(prices.len());

    for (i, point) in prices.iter().enumerate() {
        if period == 0 || i < period {
            values.push(IndicatorPoint::invalid(point.date, IndicatorValue::Simple(0.0)));
            continue;
        }

        let (gain_sum, loss_sum) = (i + 1 - period..=i).fold((0.0, 0.0), |(g, l), j| {
            let change = prices[j].close - prices[j - 1].close;
            if change > 0.0 {
                (g + change, l)
            } else {
                (g, l - change)
            }
        });
        let avg_gain = gain_sum / period as f64;
        let avg_loss = loss_sum / period as f64;

        let rsi = if avg_loss == 0.0 {
            if avg_gain == 0.0 {
                values.push(IndicatorPoint::invalid(point.date, IndicatorValue::Simple(0.0)));
                continue;
            }
            100.0
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        };

        values.push(IndicatorPoint {
            date: point.date,
            valid: true,
            value: IndicatorValue::Simple(rsi),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}
