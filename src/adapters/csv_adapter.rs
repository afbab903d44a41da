//! CSV file data adapter.
//!
//! One file per ticker, `<base>/<TICKER>.csv`, with a header row. Columns are
//! found by name: `Date` and `Close` are required, `Open`, `High`, `Low` and
//! `Volume` are optional. `Adj Close` is never used as the close.

use crate::domain::error::QuantsimError;
use crate::domain::ohlcv::{clean_bars, OhlcvBar};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, QuantsimError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| QuantsimError::Data {
                reason: format!("missing {} column", name),
            })
        };

        Ok(Columns {
            date: required("date")?,
            close: required("close")?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            volume: find("volume"),
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    fn read_bars(&self, ticker: &str) -> Result<Vec<OhlcvBar>, QuantsimError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => QuantsimError::NoData {
                ticker: ticker.to_string(),
            },
            _ => QuantsimError::Data {
                reason: format!("failed to read {}: {}", path.display(), e),
            },
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| QuantsimError::Data {
            reason: format!("CSV header error: {}", e),
        })?;
        let columns = Columns::from_headers(headers)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| QuantsimError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(columns.date).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                QuantsimError::Data {
                    reason: format!("invalid date {:?}: {}", date_str, e),
                }
            })?;

            let close = parse_price(record.get(columns.close));
            let field = |column: Option<usize>| match column {
                Some(i) => parse_price(record.get(i)),
                None => close,
            };

            bars.push(OhlcvBar {
                date,
                open: field(columns.open),
                high: field(columns.high),
                low: field(columns.low),
                close,
                volume: columns
                    .volume
                    .and_then(|i| record.get(i))
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .filter(|v| v.is_finite())
                    .map_or(0, |v| v as i64),
            });
        }

        let raw = bars.len();
        let bars = clean_bars(bars);
        debug!(ticker, raw, kept = bars.len(), "loaded price file");
        Ok(bars)
    }
}

/// Blank and `null` cells become NaN so cleaning drops the bar.
fn parse_price(cell: Option<&str>) -> f64 {
    cell.and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, QuantsimError> {
        let mut bars = self.read_bars(ticker)?;
        bars.retain(|b| {
            start_date.is_none_or(|s| b.date >= s) && end_date.is_none_or(|e| b.date <= e)
        });
        Ok(bars)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, QuantsimError> {
        let bars = match self.read_bars(ticker) {
            Ok(bars) => bars,
            Err(QuantsimError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
