//! Technical indicators over a close-price series.
//!
//! - `IndicatorPoint`: one dated value, flagged invalid during warm-up
//! - `IndicatorValue`: scalar or band-shaped output
//! - `IndicatorType`: indicator identity plus parameters
//! - `IndicatorSeries`: the full series, aligned 1:1 with the prices

pub mod bollinger;
pub mod rsi;
pub mod sma;

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

impl IndicatorPoint {
    pub fn invalid(date: NaiveDate, value: IndicatorValue) -> Self {
        IndicatorPoint {
            date,
            valid: false,
            value,
        }
    }

    /// The scalar value, if this point is valid and scalar.
    pub fn simple(&self) -> Option<f64> {
        match (self.valid, &self.value) {
            (true, IndicatorValue::Simple(v)) => Some(*v),
            _ => None,
        }
    }

    /// `(upper, middle, lower)`, if this point is a valid band.
    pub fn bands(&self) -> Option<(f64, f64, f64)> {
        match (self.valid, &self.value) {
            (
                true,
                IndicatorValue::Bollinger {
                    upper,
                    middle,
                    lower,
                },
            ) => Some((*upper, *middle, *lower)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Bollinger { upper: f64, middle: f64, lower: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    Bollinger { period: usize, multiplier: f64 },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}
