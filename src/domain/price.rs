//! Price bar representation.

use crate::domain::error::BarchartError;
use crate::domain::reading::Reading;
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// One price observation with its precomputed indicator readings.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub id: u64,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub volume: i64,
    pub trend: i32,
    pub readings: HashMap<Reading, f64>,
}

impl PriceBar {
    pub fn new(id: u64, timestamp: NaiveDateTime, price: f64) -> Self {
        Self {
            id,
            timestamp,
            price,
            volume: 0,
            trend: 0,
            readings: HashMap::new(),
        }
    }

    pub fn with_volume(mut self, volume: i64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_trend(mut self, trend: i32) -> Self {
        self.trend = trend;
        self
    }

    pub fn with_reading(mut self, reading: Reading, value: f64) -> Self {
        self.readings.insert(reading, value);
        self
    }

    /// Value of `reading` on this bar. A missing reading means the strategy
    /// references an indicator the data does not carry.
    pub fn reading(&self, reading: &Reading) -> Result<f64, BarchartError> {
        self.readings
            .get(reading)
            .copied()
            .ok_or_else(|| BarchartError::MissingReading {
                bar_id: self.id,
                reading: reading.to_string(),
            })
    }
}

/// Ids and timestamps must both be strictly increasing, so a trade always
/// closes after it opens.
pub fn check_ordered(prices: &[PriceBar]) -> Result<(), BarchartError> {
    for w in prices.windows(2) {
        if w[1].id <= w[0].id {
            return Err(BarchartError::UnorderedPrices {
                previous: w[0].id,
                next: w[1].id,
            });
        }
        if w[1].timestamp <= w[0].timestamp {
            return Err(BarchartError::UnorderedTimestamps {
                previous: w[0].id,
                id: w[1].id,
                timestamp: w[1].timestamp.to_string(),
            });
        }
    }
    Ok(())
}
