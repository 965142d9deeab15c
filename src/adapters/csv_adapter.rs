//! CSV file price store.
//!
//! One file per symbol, `<SYMBOL>.csv`, with the header
//! `id,timestamp,price,volume,trend` followed by one column per indicator
//! reading (`shortterm_average`, `overall`, `rsi`, ...).

use crate::domain::error::BarchartError;
use crate::domain::price::PriceBar;
use crate::domain::reading::Reading;
use crate::ports::price_port::PricePort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const FIXED_COLUMNS: [&str; 5] = ["id", "timestamp", "price", "volume", "trend"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<PriceBar>, BarchartError> {
        let path = self.csv_path(symbol);
        let mut rdr = csv::Reader::from_path(&path).map_err(|e| BarchartError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let headers = rdr
            .headers()
            .map_err(|e| BarchartError::Database {
                reason: format!("CSV header error: {}", e),
            })?
            .clone();

        for (i, expected) in FIXED_COLUMNS.iter().enumerate() {
            if headers.get(i).map(str::trim) != Some(*expected) {
                return Err(BarchartError::Database {
                    reason: format!("{}: column {} must be '{}'", path.display(), i + 1, expected),
                });
            }
        }

        let mut reading_columns = Vec::new();
        for name in headers.iter().skip(FIXED_COLUMNS.len()) {
            let reading: Reading = name.parse().map_err(|reason| BarchartError::Database {
                reason: format!("{}: bad reading column: {}", path.display(), reason),
            })?;
            reading_columns.push(reading);
        }

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| BarchartError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;

            let mut bar = PriceBar::new(
                parse_field(&record, 0, "id")?,
                parse_timestamp(field(&record, 1, "timestamp")?)?,
                parse_field(&record, 2, "price")?,
            );
            bar.volume = parse_field(&record, 3, "volume")?;
            bar.trend = parse_field(&record, 4, "trend")?;

            for (offset, reading) in reading_columns.iter().enumerate() {
                let raw = field(&record, FIXED_COLUMNS.len() + offset, "reading")?;
                if raw.is_empty() {
                    continue;
                }
                let value: f64 = raw.parse().map_err(|e| BarchartError::Database {
                    reason: format!("invalid {} value '{}': {}", reading, raw, e),
                })?;
                bar.readings.insert(reading.clone(), value);
            }

            bars.push(bar);
        }

        bars.sort_by_key(|b| b.id);
        Ok(bars)
    }
}

fn field<'r>(record: &'r csv::StringRecord, index: usize, name: &str) -> Result<&'r str, BarchartError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| BarchartError::Database {
            reason: format!("missing {} column", name),
        })
}

fn parse_field<T>(record: &csv::StringRecord, index: usize, name: &str) -> Result<T, BarchartError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = field(record, index, name)?;
    raw.parse().map_err(|e| BarchartError::Database {
        reason: format!("invalid {} value '{}': {}", name, raw, e),
    })
}

/// `%Y-%m-%d %H:%M:%S`, or a bare date at midnight.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, BarchartError> {
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| BarchartError::Database {
            reason: format!("invalid timestamp '{}'", raw),
        })
}

impl PricePort for CsvAdapter {
    fn fetch_prices_from_id(
        &self,
        symbol: &str,
        from_id: u64,
        count: usize,
    ) -> Result<Vec<PriceBar>, BarchartError> {
        Ok(self
            .read_all(symbol)?
            .into_iter()
            .filter(|b| b.id >= from_id)
            .take(count)
            .collect())
    }

    fn fetch_all_prices(&self, symbol: &str) -> Result<Vec<PriceBar>, BarchartError> {
        self.read_all(symbol)
    }

    fn list_symbols(&self) -> Result<Vec<String>, BarchartError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| BarchartError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BarchartError::Database {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
