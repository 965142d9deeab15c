//! Performance figures over a trade log.

use crate::domain::error::BarchartError;
use crate::domain::trade::Trade;

/// Percent return of a trade log: each trade adds `profit / open * 100` to a
/// running figure starting at 100. Contributions are summed, not compounded.
/// Rounded to two decimals.
pub fn percent_profit(trades: &[Trade]) -> Result<f64, BarchartError> {
    let mut running = 100.0_f64;
    for trade in trades {
        running += trade.percent_profit()?;
    }
    Ok(round2(running - 100.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeSummary {
    pub total_trades: usize,
    pub closed_trades: usize,
    pub open_at_end: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub net_profit: f64,
    pub best_high: f64,
    pub worst_drawdown: f64,
    pub avg_bars_held: f64,
}

impl TradeSummary {
    pub fn compute(trades: &[Trade]) -> Self {
        let mut closed_trades = 0usize;
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut best_high = 0.0_f64;
        let mut worst_drawdown = 0.0_f64;
        let mut total_bars = 0usize;

        for trade in trades {
            if trade.is_closed() {
                closed_trades += 1;
            }
            if trade.profit > 0.0 {
                trades_won += 1;
                gross_profit += trade.profit;
            } else if trade.profit < 0.0 {
                trades_lost += 1;
                gross_loss += trade.profit.abs();
            } else {
                trades_breakeven += 1;
            }
            best_high = best_high.max(trade.high);
            worst_drawdown = worst_drawdown.min(trade.drawdown);
            total_bars += trade.bars_held;
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };
        let avg_bars_held = if total_trades > 0 {
            total_bars as f64 / total_trades as f64
        } else {
            0.0
        };

        TradeSummary {
            total_trades,
            closed_trades,
            open_at_end: total_trades - closed_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            gross_profit,
            gross_loss,
            net_profit: gross_profit - gross_loss,
            best_high,
            worst_drawdown,
            avg_bars_held,
        }
    }
}
