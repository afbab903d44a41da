//! Daily bars and the close-price series the engine consumes.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// One (date, close) observation of the price series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        PricePoint { date, close }
    }
}

/// Drops bars without a usable close, orders by date and keeps the first bar
/// seen for each date.
pub fn clean_bars(mut bars: Vec<OhlcvBar>) -> Vec<OhlcvBar> {
    bars.retain(|b| b.close.is_finite());
    // stable: duplicates keep their input order, so dedup keeps the first
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    bars
}

pub fn price_series(bars: &[OhlcvBar]) -> Vec<PricePoint> {
    bars.iter()
        .map(|b| PricePoint::new(b.date, b.close))
        .collect()
}
