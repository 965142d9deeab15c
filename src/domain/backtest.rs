//! Backtest orchestration over a whole strategy and price series.
//!
//! Every bar is checked against every signal in strategy order. When a
//! signal fires, a trade opens on that bar and is simulated over the bars that
//! follow it. Trades are appended in the order they were triggered.

use crate::domain::error::BarchartError;
use crate::domain::metrics::{percent_profit, TradeSummary};
use crate::domain::price::{check_ordered, PriceBar};
use crate::domain::simulator::simulate;
use crate::domain::strategy::Strategy;
use crate::domain::trade::Trade;
use chrono::NaiveDateTime;

pub const DEFAULT_VOLUME: f64 = 1.0;

pub fn run(
    strategy: &Strategy,
    prices: &[PriceBar],
    volume: f64,
) -> Result<Vec<Trade>, BarchartError> {
    check_ordered(prices)?;

    let mut trades = Vec::new();
    for (index, bar) in prices.iter().enumerate() {
        for signal in &strategy.signals {
            if signal.fires(bar)? {
                let trade = simulate(signal, &strategy.symbol, bar, &prices[index + 1..], volume)?;
                trades.push(trade);
            }
        }
    }

    tracing::debug!(
        strategy = %strategy.name,
        bars = prices.len(),
        trades = trades.len(),
        "backtest finished"
    );
    Ok(trades)
}

pub fn first_date(prices: &[PriceBar]) -> Option<NaiveDateTime> {
    prices.first().map(|p| p.timestamp)
}

pub fn last_date(prices: &[PriceBar]) -> Option<NaiveDateTime> {
    prices.last().map(|p| p.timestamp)
}

#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub trades: Vec<Trade>,
    pub percent_profit: f64,
    pub summary: TradeSummary,
    pub first_date: Option<NaiveDateTime>,
    pub last_date: Option<NaiveDateTime>,
}

pub fn run_report(
    strategy: &Strategy,
    prices: &[PriceBar],
    volume: f64,
) -> Result<BacktestReport, BarchartError> {
    let trades = run(strategy, prices, volume)?;
    let percent_profit = percent_profit(&trades)?;
    let summary = TradeSummary::compute(&trades);
    Ok(BacktestReport {
        trades,
        percent_profit,
        summary,
        first_date: first_date(prices),
        last_date: last_date(prices),
    })
}
