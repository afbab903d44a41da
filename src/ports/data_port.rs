//! Data access port trait.

use crate::domain::error::QuantsimError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `ticker` within the inclusive date bounds, cleaned and in
    /// date order. `None` leaves that side unbounded.
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, QuantsimError>;

    /// First date, last date and bar count, or `None` when there is no data.
    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, QuantsimError>;
}
