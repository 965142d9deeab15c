//! Simulated trades.

use crate::domain::error::BarchartError;
use crate::domain::signal::Direction;
use chrono::NaiveDateTime;
use std::fmt;

/// Exit rules in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitRule {
    StopLossPercent,
    TakeProfitPercent,
    StopLoss,
    TakeProfit,
}

impl fmt::Display for ExitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExitRule::StopLossPercent => "stop-loss %",
            ExitRule::TakeProfitPercent => "take-profit %",
            ExitRule::StopLoss => "stop-loss",
            ExitRule::TakeProfit => "take-profit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeState {
    AwaitingEntry,
    Open,
    Closed(ExitRule),
    /// The series ran out before any exit rule matched.
    EndOfSeries,
}

impl TradeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TradeState::Closed(_) | TradeState::EndOfSeries)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub signal: Option<String>,
    pub direction: Direction,
    pub open: f64,
    pub open_date: NaiveDateTime,
    pub close: Option<f64>,
    pub close_date: Option<NaiveDateTime>,
    pub high: f64,
    pub drawdown: f64,
    pub volume: f64,
    pub profit: f64,
    pub exit: Option<ExitRule>,
    pub bars_held: usize,
}

impl Trade {
    pub fn is_closed(&self) -> bool {
        self.close_date.is_some()
    }

    pub fn state(&self) -> TradeState {
        match self.exit {
            Some(rule) => TradeState::Closed(rule),
            None => TradeState::EndOfSeries,
        }
    }

    /// Profit as a percentage of the entry price.
    pub fn percent_profit(&self) -> Result<f64, BarchartError> {
        if self.open == 0.0 {
            return Err(BarchartError::ZeroOpenPrice {
                opened: self.open_date.to_string(),
            });
        }
        Ok(self.profit / self.open * 100.0)
    }
}
