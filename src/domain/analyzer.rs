//! Analyzer service: binds the backtest engine to a price store and the
//! analyzer settings.

use crate::domain::backtest::{self, BacktestReport};
use crate::domain::error::BarchartError;
use crate::domain::filter;
use crate::domain::price::PriceBar;
use crate::domain::reading::Reading;
use crate::domain::settings::AnalyzerSettings;
use crate::domain::signal::Direction;
use crate::domain::strategy::Strategy;
use crate::domain::trade::Trade;
use crate::ports::price_port::PricePort;
use chrono::NaiveDateTime;

pub struct Analyzer<'a> {
    prices: &'a dyn PricePort,
    settings: AnalyzerSettings,
}

impl<'a> Analyzer<'a> {
    pub fn new(prices: &'a dyn PricePort, settings: AnalyzerSettings) -> Self {
        Self { prices, settings }
    }

    /// A window of `bars` bars starting at `from_id`. Zero bars means the
    /// configured horizon.
    pub fn get_prices(
        &self,
        symbol: &str,
        from_id: u64,
        bars: usize,
    ) -> Result<Vec<PriceBar>, BarchartError> {
        let bars = if bars == 0 {
            self.settings.horizon_bars()
        } else {
            bars
        };
        self.prices.fetch_prices_from_id(symbol, from_id, bars)
    }

    pub fn get_all_prices(&self, symbol: &str) -> Result<Vec<PriceBar>, BarchartError> {
        self.prices.fetch_all_prices(symbol)
    }

    /// Backtest `strategy` over the full series of its symbol.
    pub fn test_strategy(
        &self,
        strategy: &Strategy,
        volume: f64,
    ) -> Result<Vec<Trade>, BarchartError> {
        Ok(self.report(strategy, volume)?.trades)
    }

    /// Trade log plus aggregate figures and the series' date range.
    pub fn report(
        &self,
        strategy: &Strategy,
        volume: f64,
    ) -> Result<BacktestReport, BarchartError> {
        let prices = self.get_all_prices(&strategy.symbol)?;
        if prices.is_empty() {
            tracing::warn!(symbol = %strategy.symbol, "no prices to backtest");
        }
        backtest::run_report(strategy, &prices, volume)
    }

    pub fn first_price_date(
        &self,
        strategy: &Strategy,
    ) -> Result<Option<NaiveDateTime>, BarchartError> {
        Ok(backtest::first_date(&self.get_all_prices(&strategy.symbol)?))
    }

    pub fn last_price_date(
        &self,
        strategy: &Strategy,
    ) -> Result<Option<NaiveDateTime>, BarchartError> {
        Ok(backtest::last_date(&self.get_all_prices(&strategy.symbol)?))
    }

    /// Streak filter with a zero `streak` replaced by the configured series
    /// length.
    pub fn indicator_series_filter(
        &self,
        prices: &[PriceBar],
        reading: &Reading,
        direction: Direction,
        streak: usize,
    ) -> Result<Vec<PriceBar>, BarchartError> {
        let streak = if streak == 0 {
            self.settings.series
        } else {
            streak
        };
        filter::indicator_series_filter(prices, reading, direction, streak)
    }
}
