//! Integration tests for the backtest engine.
//!
//! Tests cover:
//! - Full backtest through the analyzer with a mock price port
//! - Exit rule priority, excursion tracking and end-of-series trades
//! - Percent profit over a trade log
//! - Sequence filters chained ahead of a backtest
//! - Bar ordering checks on CSV files with date-only timestamps
//! - Full backtest through SqliteAdapter with a seeded in-memory database
//! - Invariants over generated price paths

mod common;

use common::*;
use barchart::domain::analyzer::Analyzer;
use barchart::domain::backtest::{self, DEFAULT_VOLUME};
use barchart::domain::error::BarchartError;
use barchart::domain::filter::{self, AverageKind};
use barchart::domain::metrics::percent_profit;
use barchart::domain::reading::Reading;
use barchart::domain::settings::AnalyzerSettings;
use barchart::domain::signal::{Direction, Signal};
use barchart::domain::trade::{ExitRule, TradeState};
use barchart::ports::price_port::PricePort;
use proptest::prelude::*;

mod full_backtest_pipeline {
    use super::*;

    #[test]
    fn analyzer_with_mock_price_port() {
        let prices = bars_with_overall(&[
            (100.0, 60.0),
            (104.0, 10.0),
            (98.0, 10.0),
            (107.0, 70.0),
            (103.0, 10.0),
        ]);
        let port = MockPricePort::new().with_bars("ES", prices);
        let analyzer = Analyzer::new(&port, AnalyzerSettings::default());

        let mut signal = Signal::new(Direction::Buy, vec![overall_condition(50.0)]);
        signal.take_profit = Some(5.0);
        let strategy = make_strategy(vec![signal]);

        let trades = analyzer.test_strategy(&strategy, DEFAULT_VOLUME).unwrap();
        assert_eq!(trades.len(), 2);

        let first = &trades[0];
        assert_eq!(first.open, 100.0);
        assert_eq!(first.state(), TradeState::Closed(ExitRule::TakeProfit));
        assert_eq!(first.close, Some(107.0));
        assert_eq!(first.profit, 5.0);
        assert_eq!(first.high, 7.0);
        assert_eq!(first.drawdown, -2.0);

        let second = &trades[1];
        assert_eq!(second.open, 107.0);
        assert_eq!(second.state(), TradeState::EndOfSeries);
        assert_eq!(second.profit, -4.0);

        assert_eq!(percent_profit(&trades).unwrap(), round2(5.0 - 400.0 / 107.0));
    }

    #[test]
    fn price_port_error_propagates() {
        let port = MockPricePort::new().with_error("ES", "connection refused");
        let analyzer = Analyzer::new(&port, AnalyzerSettings::default());
        let strategy = make_strategy(vec![always(Direction::Buy)]);
        assert!(matches!(
            analyzer.test_strategy(&strategy, DEFAULT_VOLUME),
            Err(BarchartError::Database { .. })
        ));
    }

    #[test]
    fn empty_series_has_no_trades_and_no_dates() {
        let port = MockPricePort::new();
        let analyzer = Analyzer::new(&port, AnalyzerSettings::default());
        let strategy = make_strategy(vec![always(Direction::Buy)]);
        assert!(analyzer.test_strategy(&strategy, 1.0).unwrap().is_empty());
        assert_eq!(analyzer.first_price_date(&strategy).unwrap(), None);
        assert_eq!(analyzer.last_price_date(&strategy).unwrap(), None);
    }

    #[test]
    fn identical_inputs_give_identical_logs() {
        let prices = bars_with_overall(&[(100.0, 60.0), (90.0, 60.0), (120.0, 10.0), (80.0, 60.0)]);
        let mut buy = Signal::new(Direction::Buy, vec![overall_condition(50.0)]);
        buy.stop_loss_percent = Some(5.0);
        let mut sell = Signal::new(Direction::Sell, vec![overall_condition(50.0)]);
        sell.take_profit_percent = Some(10.0);
        let strategy = make_strategy(vec![buy, sell]);

        let a = backtest::run(&strategy, &prices, 1.0).unwrap();
        let b = backtest::run(&strategy, &prices, 1.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(format!("{a:?}"), format!("{b:?}"));
    }

    fn round2(v: f64) -> f64 {
        (v * 100.0).round() / 100.0
    }
}

mod exit_rules {
    use super::*;

    #[test]
    fn percent_stop_wins_over_point_stop_on_same_bar() {
        let prices = bars(&[100.0, 40.0]);
        let mut signal = always(Direction::Buy);
        signal.stop_loss_percent = Some(2.0);
        signal.stop_loss = Some(-50.0);
        let trades = backtest::run(&make_strategy(vec![signal]), &prices, 1.0).unwrap();
        assert_eq!(trades[0].exit, Some(ExitRule::StopLossPercent));
        assert_eq!(trades[0].profit, 2.0);
    }

    #[test]
    fn point_stop_when_percent_stop_not_reached() {
        let prices = bars(&[1000.0, 990.0]);
        let mut signal = always(Direction::Buy);
        signal.stop_loss_percent = Some(2.0);
        signal.stop_loss = Some(-5.0);
        let trades = backtest::run(&make_strategy(vec![signal]), &prices, 1.0).unwrap();
        assert_eq!(trades[0].exit, Some(ExitRule::StopLoss));
        assert_eq!(trades[0].profit, -5.0);
    }

    #[test]
    fn excursion_tracking_visits_in_order() {
        let prices = bars(&[100.0, 105.0, 95.0, 110.0]);
        let trades =
            backtest::run(&make_strategy(vec![always(Direction::Buy)]), &prices, 1.0).unwrap();
        let t = &trades[0];
        assert_eq!(t.high, 10.0);
        assert_eq!(t.drawdown, -5.0);
        assert_eq!(t.state(), TradeState::EndOfSeries);
        assert_eq!(t.profit, 10.0);
    }

    #[test]
    fn last_bar_trade_has_zero_profit() {
        let prices = bars(&[100.0, 101.0]);
        let trades =
            backtest::run(&make_strategy(vec![always(Direction::Sell)]), &prices, 1.0).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[1].profit, 0.0);
        assert_eq!(trades[1].bars_held, 0);
    }
}

mod filters_then_backtest {
    use super::*;

    #[test]
    fn average_filter_feeds_the_engine() {
        let prices = bars_with_overall(&[
            (100.0, -40.0),
            (101.0, 25.0),
            (102.0, -5.0),
            (103.0, 50.0),
        ]);
        let kept = filter::average_filter(&prices, AverageKind::Overall, 20.0).unwrap();
        assert_eq!(kept.iter().map(|b| b.id).collect::<Vec<_>>(), vec![2, 4]);

        let trades =
            backtest::run(&make_strategy(vec![always(Direction::Buy)]), &kept, 1.0).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].profit, 2.0);
    }

    #[test]
    fn volume_then_trend() {
        let mut prices = bars(&[100.0, 101.0, 102.0, 103.0]);
        for (bar, (volume, trend)) in prices
            .iter_mut()
            .zip([(10, 1), (20, -1), (30, 1), (40, 1)])
        {
            bar.volume = volume;
            bar.trend = trend;
        }
        let kept = filter::volume_filter(&prices, None, false);
        let kept = filter::trend_filter(&kept, 1);
        assert_eq!(kept.iter().map(|b| b.id).collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn series_filter_via_analyzer_default() {
        let mut prices = bars(&[100.0; 6]);
        for (bar, v) in prices.iter_mut().zip([1.0, 1.0, -1.0, 1.0, 1.0, -1.0]) {
            bar.readings.insert(Reading::Custom("macd".into()), v);
        }
        let port = MockPricePort::new().with_bars("ES", prices.clone());
        let settings = AnalyzerSettings {
            series: 2,
            ..AnalyzerSettings::default()
        };
        let analyzer = Analyzer::new(&port, settings);
        // tail counts of +1: 4, 3, 2, 2, 1, 0
        let kept = analyzer
            .indicator_series_filter(&prices, &Reading::Custom("macd".into()), Direction::Buy, 0)
            .unwrap();
        assert_eq!(kept.iter().map(|b| b.id).collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn window_defaults_to_horizon() {
        let prices = bars(&[100.0; 200]);
        let port = MockPricePort::new().with_bars("ES", prices);
        let analyzer = Analyzer::new(&port, AnalyzerSettings::default());
        let window = analyzer.get_prices("ES", 10, 0).unwrap();
        assert_eq!(window.len(), 95);
        assert_eq!(window[0].id, 10);
        assert_eq!(port.list_symbols().unwrap(), vec!["ES"]);
    }
}

mod csv_pipeline {
    use super::*;
    use barchart::adapters::csv_adapter::CsvAdapter;
    use tempfile::TempDir;

    fn store(rows: &str) -> (TempDir, CsvAdapter) {
        let dir = TempDir::new().unwrap();
        let content = format!("id,timestamp,price,volume,trend\n{rows}");
        std::fs::write(dir.path().join("ES.csv"), content).unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        (dir, adapter)
    }

    #[test]
    fn same_day_bars_are_rejected() {
        let (_dir, adapter) = store("1,2014-09-22,100,10,1\n2,2014-09-22,102,10,1\n");
        let analyzer = Analyzer::new(&adapter, AnalyzerSettings::default());
        let mut signal = always(Direction::Buy);
        signal.take_profit = Some(1.0);
        assert!(matches!(
            analyzer.test_strategy(&make_strategy(vec![signal]), 1.0),
            Err(BarchartError::UnorderedTimestamps { previous: 1, id: 2, .. })
        ));
    }

    #[test]
    fn trades_close_after_they_open() {
        let (_dir, adapter) =
            store("1,2014-09-22,100,10,1\n2,2014-09-23,102,10,1\n3,2014-09-24,99,10,1\n");
        let analyzer = Analyzer::new(&adapter, AnalyzerSettings::default());
        let mut signal = always(Direction::Buy);
        signal.take_profit = Some(1.0);
        let trades = analyzer
            .test_strategy(&make_strategy(vec![signal]), 1.0)
            .unwrap();
        let first = &trades[0];
        assert_eq!(first.exit, Some(ExitRule::TakeProfit));
        assert!(first.close_date.unwrap() > first.open_date);
    }
}

#[cfg(feature = "sqlite")]
mod sqlite_pipeline {
    use super::*;
    use barchart::adapters::sqlite_adapter::SqliteAdapter;

    #[test]
    fn backtest_through_sqlite_matches_in_memory_run() {
        let prices = bars_with_overall(&[
            (100.0, 60.0),
            (103.0, 60.0),
            (97.0, 10.0),
            (110.0, 60.0),
            (108.0, 10.0),
        ]);
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter.insert_bars("ES", &prices).unwrap();

        let mut signal = Signal::new(Direction::Buy, vec![overall_condition(50.0)]);
        signal.take_profit_percent = Some(5.0);
        let strategy = make_strategy(vec![signal]);

        let analyzer = Analyzer::new(&adapter, AnalyzerSettings::default());
        let from_db = analyzer.test_strategy(&strategy, 1.0).unwrap();
        let direct = backtest::run(&strategy, &prices, 1.0).unwrap();
        assert_eq!(from_db, direct);
        assert_eq!(from_db.len(), 3);
    }
}

fn price_path() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..1000.0, 1..40)
}

proptest! {
    #[test]
    fn high_and_drawdown_bracket_zero(path in price_path(), sell in any::<bool>()) {
        let direction = if sell { Direction::Sell } else { Direction::Buy };
        let prices = bars(&path);
        let trades = backtest::run(&make_strategy(vec![always(direction)]), &prices, 1.0).unwrap();
        prop_assert_eq!(trades.len(), prices.len());
        for t in &trades {
            prop_assert!(t.high >= 0.0);
            prop_assert!(t.drawdown <= 0.0);
            prop_assert!(t.profit <= t.high && t.profit >= t.drawdown);
        }
    }

    #[test]
    fn closed_trades_close_after_open(path in price_path(), target in 0.5f64..50.0) {
        let mut signal = always(Direction::Buy);
        signal.take_profit = Some(target);
        signal.stop_loss = Some(-target);
        let prices = bars(&path);
        let trades = backtest::run(&make_strategy(vec![signal]), &prices, 1.0).unwrap();
        for t in trades.iter().filter(|t| t.is_closed()) {
            prop_assert!(t.close_date.unwrap() > t.open_date);
            prop_assert!(t.exit.is_some());
        }
    }

    #[test]
    fn filters_return_subsequences(path in price_path(), lower in any::<bool>()) {
        let prices = bars(&path);
        let kept = filter::volume_filter(&prices, None, lower);
        prop_assert!(kept.len() <= prices.len());
        prop_assert!(kept.windows(2).all(|w| w[0].id < w[1].id));
    }
}
