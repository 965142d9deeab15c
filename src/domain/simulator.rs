//! Forward trade simulation.
//!
//! A trade opens at the triggering bar's price and is walked forward one bar
//! at a time. On each bar the direction-adjusted excursion from entry updates
//! `high` and `drawdown`, then the exit rules are checked in fixed order:
//!
//! 1. percent stop: `-percent >= stop_loss_percent`, profit `open * stop_loss_percent / 100`
//! 2. percent target: `percent >= take_profit_percent`, profit `open * take_profit_percent / 100`
//! 3. point stop: `stop_loss >= excursion`, profit `stop_loss`
//! 4. point target: `take_profit <= excursion`, profit `take_profit`
//!
//! The first rule that matches closes the trade on that bar. If none ever
//! matches, the last excursion becomes the profit and the trade stays without
//! a close price.

use crate::domain::error::BarchartError;
use crate::domain::price::PriceBar;
use crate::domain::signal::{enabled, Signal};
use crate::domain::trade::{ExitRule, Trade, TradeState};

#[derive(Debug)]
pub struct TradeSimulator<'a> {
    signal: &'a Signal,
    trade: Trade,
    state: TradeState,
}

impl<'a> TradeSimulator<'a> {
    /// Open a trade on `entry` for `signal`.
    pub fn enter(
        signal: &'a Signal,
        symbol: &str,
        entry: &PriceBar,
        volume: f64,
    ) -> Result<Self, BarchartError> {
        if entry.price == 0.0 {
            return Err(BarchartError::ZeroOpenPrice {
                opened: entry.timestamp.to_string(),
            });
        }

        let trade = Trade {
            symbol: symbol.to_string(),
            signal: signal.name.clone(),
            direction: signal.direction,
            open: entry.price,
            open_date: entry.timestamp,
            close: None,
            close_date: None,
            high: 0.0,
            drawdown: 0.0,
            volume,
            profit: 0.0,
            exit: None,
            bars_held: 0,
        };

        tracing::debug!(
            symbol,
            signal = %signal.label(),
            bar = entry.id,
            price = entry.price,
            "trade opened"
        );

        Ok(Self {
            signal,
            trade,
            state: TradeState::Open,
        })
    }

    pub fn state(&self) -> TradeState {
        self.state
    }

    pub fn trade(&self) -> &Trade {
        &self.trade
    }

    /// Step the open trade over the next bar. Bars after a terminal state
    /// are ignored.
    pub fn advance(&mut self, bar: &PriceBar) -> TradeState {
        if self.state != TradeState::Open {
            return self.state;
        }

        let open = self.trade.open;
        let excursion = self.trade.direction.excursion(open, bar.price);
        self.trade.bars_held += 1;

        if excursion > self.trade.high {
            self.trade.high = excursion;
        }
        if excursion < self.trade.drawdown {
            self.trade.drawdown = excursion;
        }

        let percent = excursion / open * 100.0;
        self.trade.profit = excursion;

        if let Some((rule, profit)) = self.matched_exit(excursion, percent) {
            self.trade.close = Some(bar.price);
            self.trade.close_date = Some(bar.timestamp);
            self.trade.profit = profit;
            self.trade.exit = Some(rule);
            self.state = TradeState::Closed(rule);

            tracing::debug!(
                symbol = %self.trade.symbol,
                bar = bar.id,
                rule = %rule,
                profit,
                "trade closed"
            );
        }

        self.state
    }

    fn matched_exit(&self, excursion: f64, percent: f64) -> Option<(ExitRule, f64)> {
        let open = self.trade.open;

        if let Some(stop) = enabled(self.signal.stop_loss_percent) {
            if -percent >= stop {
                return Some((ExitRule::StopLossPercent, open * stop / 100.0));
            }
        }
        if let Some(target) = enabled(self.signal.take_profit_percent) {
            if percent >= target {
                return Some((ExitRule::TakeProfitPercent, open * target / 100.0));
            }
        }
        if let Some(stop) = enabled(self.signal.stop_loss) {
            if stop >= excursion {
                return Some((ExitRule::StopLoss, stop));
            }
        }
        if let Some(target) = enabled(self.signal.take_profit) {
            if target <= excursion {
                return Some((ExitRule::TakeProfit, target));
            }
        }
        None
    }

    /// Finish the simulation. An open trade ends as `EndOfSeries` with its
    /// last excursion as profit.
    pub fn finish(mut self) -> Trade {
        if self.state == TradeState::Open {
            self.state = TradeState::EndOfSeries;
        }
        self.trade
    }
}

/// Open on `entry` and walk `rest` (the bars after the entry, in order) until
/// an exit rule closes the trade or the bars run out.
pub fn simulate(
    signal: &Signal,
    symbol: &str,
    entry: &PriceBar,
    rest: &[PriceBar],
    volume: f64,
) -> Result<Trade, BarchartError> {
    let mut sim = TradeSimulator::enter(signal, symbol, entry, volume)?;
    for bar in rest {
        if sim.advance(bar).is_terminal() {
            break;
        }
    }
    Ok(sim.finish())
}
