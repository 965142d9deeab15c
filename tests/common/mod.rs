#![allow(dead_code)]

use barchart::domain::error::BarchartError;
pub use barchart::domain::price::PriceBar;
use barchart::domain::reading::{Indicator, IndicatorCondition, Reading};
use barchart::domain::signal::{Direction, Signal};
use barchart::domain::strategy::Strategy;
use barchart::ports::price_port::PricePort;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

pub struct MockPricePort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn check(&self, symbol: &str) -> Result<(), BarchartError> {
        match self.errors.get(symbol) {
            Some(reason) => Err(BarchartError::Database {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl PricePort for MockPricePort {
    fn fetch_prices_from_id(
        &self,
        symbol: &str,
        from_id: u64,
        count: usize,
    ) -> Result<Vec<PriceBar>, BarchartError> {
        self.check(symbol)?;
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.id >= from_id)
                    .take(count)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn fetch_all_prices(&self, symbol: &str) -> Result<Vec<PriceBar>, BarchartError> {
        self.check(symbol)?;
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, BarchartError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2014, 9, 22)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

/// Hourly bars with ids 1.. carrying an `overall` reading.
pub fn bars_with_overall(points: &[(f64, f64)]) -> Vec<PriceBar> {
    points
        .iter()
        .enumerate()
        .map(|(i, (price, overall))| {
            PriceBar::new(i as u64 + 1, start() + Duration::hours(i as i64), *price)
                .with_volume(1000)
                .with_reading(Reading::Overall, *overall)
        })
        .collect()
}

pub fn bars(prices: &[f64]) -> Vec<PriceBar> {
    let points: Vec<(f64, f64)> = prices.iter().map(|p| (*p, 0.0)).collect();
    bars_with_overall(&points)
}

pub fn overall_condition(threshold: f64) -> IndicatorCondition {
    IndicatorCondition::new(Indicator::new("Overall", Reading::Overall), threshold)
}

pub fn make_strategy(signals: Vec<Signal>) -> Strategy {
    Strategy {
        name: "Test".into(),
        symbol: "ES".into(),
        author: Some("tester".into()),
        signals,
    }
}

pub fn always(direction: Direction) -> Signal {
    Signal::new(direction, vec![])
}
