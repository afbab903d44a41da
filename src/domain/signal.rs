//! Signal sources: anything that turns a price series into position changes.

use chrono::NaiveDate;

use super::ohlcv::PricePoint;

/// Desired position change for one date. `delta > 0` opens or adds to the
/// long position, `delta < 0` exits to flat, zero holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionChange {
    pub date: NaiveDate,
    pub delta: f64,
}

pub trait SignalSource {
    fn name(&self) -> String;

    /// One position change per price point, aligned by date.
    fn generate_signals(&self, prices: &[PricePoint]) -> Vec<PositionChange>;
}

impl<S: SignalSource + ?Sized> SignalSource for Box<S> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn generate_signals(&self, prices: &[PricePoint]) -> Vec<PositionChange> {
        (**self).generate_signals(prices)
    }
}

/// First difference of a desired-position series. The first element has no
/// predecessor and is a hold.
pub fn position_changes(prices: &[PricePoint], desired: &[f64]) -> Vec<PositionChange> {
    prices
        .iter()
        .zip(desired)
        .enumerate()
        .map(|(i, (point, &level))| PositionChange {
            date: point.date,
            delta: if i == 0 { 0.0 } else { level - desired[i - 1] },
        })
        .collect()
}
