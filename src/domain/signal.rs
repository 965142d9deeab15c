//! Entry signals and their evaluation against a bar.
//!
//! A signal fires when every one of its indicator conditions holds:
//! for `Buy` the reading must be at or above the threshold, for `Sell` at or
//! below it. A signal without conditions fires on every bar.

use crate::domain::error::BarchartError;
use crate::domain::price::PriceBar;
use crate::domain::reading::IndicatorCondition;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1 for `Buy`, -1 for `Sell`; the value a trend-style indicator takes
    /// when it points in this direction.
    pub fn sign(self) -> i32 {
        match self {
            Direction::Buy => 1,
            Direction::Sell => -1,
        }
    }

    /// Direction-adjusted move from `open` to `price`.
    pub fn excursion(self, open: f64, price: f64) -> f64 {
        match self {
            Direction::Buy => price - open,
            Direction::Sell => open - price,
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" | "long" | "1" => Ok(Direction::Buy),
            "sell" | "short" | "-1" => Ok(Direction::Sell),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => f.write_str("BUY"),
            Direction::Sell => f.write_str("SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub name: Option<String>,
    pub direction: Direction,
    pub conditions: Vec<IndicatorCondition>,
    pub stop_loss_percent: Option<f64>,
    pub take_profit_percent: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl Signal {
    pub fn new(direction: Direction, conditions: Vec<IndicatorCondition>) -> Self {
        Self {
            name: None,
            direction,
            conditions,
            stop_loss_percent: None,
            take_profit_percent: None,
            stop_loss: None,
            take_profit: None,
        }
    }

    pub fn fires(&self, bar: &PriceBar) -> Result<bool, BarchartError> {
        evaluate(&self.conditions, bar, self.direction)
    }

    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.direction.to_string())
    }
}

/// Zero and absent both disable an exit rule.
pub(crate) fn enabled(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

pub fn evaluate(
    conditions: &[IndicatorCondition],
    bar: &PriceBar,
    direction: Direction,
) -> Result<bool, BarchartError> {
    for condition in conditions {
        let value = bar.reading(&condition.indicator.strategy_method)?;
        let passed = match direction {
            Direction::Buy => value >= condition.threshold,
            Direction::Sell => value <= condition.threshold,
        };
        if !passed {
            return Ok(false);
        }
    }
    Ok(true)
}
