//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::analyzer::Analyzer;
use crate::domain::backtest::BacktestReport;
use crate::domain::config_validation::{validate_data_config, validate_strategy_config};
use crate::domain::error::BarchartError;
use crate::domain::filter::{self, average_kind_names, AverageKind};
use crate::domain::price::PriceBar;
use crate::domain::reading::Reading;
use crate::domain::settings::AnalyzerSettings;
use crate::domain::signal::Direction;
use crate::domain::strategy::Strategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;

#[derive(Parser, Debug)]
#[command(name = "barchart", about = "Indicator-signal strategy backtester")]
pub struct Cli {
    /// Log engine events (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest a strategy over the full price series of its symbol
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: PathBuf,
        /// Trade volume (defaults to [analizer] volume)
        #[arg(long)]
        volume: Option<f64>,
        /// Override the strategy's symbol
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Print the bars of a price window that pass the given filters
    Filter(FilterArgs),
    /// Show first/last bar dates for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
    },
    /// List symbols available in the price store
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a strategy file
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// List the averaged indicator groups
    Averages,
}

#[derive(Args, Debug)]
pub struct FilterArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    #[arg(long)]
    pub symbol: String,
    /// First bar id of the window
    #[arg(long, default_value_t = 0)]
    pub from_id: u64,
    /// Window size in bars (0 = configured horizon)
    #[arg(long, default_value_t = 0)]
    pub bars: usize,
    /// Keep bars with this trend value
    #[arg(long, allow_hyphen_values = true)]
    pub trend: Option<i32>,
    /// Apply the volume filter
    #[arg(long)]
    pub by_volume: bool,
    /// Volume threshold (default: mean volume of the window)
    #[arg(long)]
    pub volume: Option<f64>,
    /// Keep bars at or below the volume threshold instead of above
    #[arg(long)]
    pub lower_than: bool,
    /// Averaged group: 1-4 or short-term/middle-term/long-term/overall
    #[arg(long, requires = "percent")]
    pub average: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub percent: Option<f64>,
    /// Indicator for the streak filter
    #[arg(long)]
    pub series: Option<String>,
    #[arg(long, default_value = "buy")]
    pub direction: String,
    /// Required streak length (0 = [analizer] series)
    #[arg(long, default_value_t = 0)]
    pub streak: usize,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            strategy,
            volume,
            symbol,
        } => run_backtest(&config, &strategy, volume, symbol.as_deref()),
        Command::Filter(args) => run_filter(&args),
        Command::Info { config, symbol } => run_info(&config, &symbol),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Validate { strategy } => run_validate(&strategy),
        Command::Averages => run_averages(),
    }
}

fn fail(err: BarchartError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(&err)
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

/// Price store selected by `[data] source`.
pub fn open_price_port(config: &dyn ConfigPort) -> Result<Box<dyn PricePort>, BarchartError> {
    validate_data_config(config)?;
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string())
        .trim()
        .to_lowercase();

    match source.as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let adapter = crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "sqlite"))]
        "sqlite" => Err(BarchartError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: "sqlite feature is required for the sqlite source".into(),
        }),
        _ => {
            let path = config
                .get_string("csv", "path")
                .ok_or_else(|| BarchartError::ConfigMissing {
                    section: "csv".into(),
                    key: "path".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(path))))
        }
    }
}

pub fn load_strategy(path: &PathBuf) -> Result<Strategy, BarchartError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_strategy_config(&adapter)?;
    Strategy::from_config(&adapter)
}

fn run_backtest(
    config_path: &PathBuf,
    strategy_path: &PathBuf,
    volume: Option<f64>,
    symbol_override: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let settings = match AnalyzerSettings::from_config(&config) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    eprintln!("Loading strategy from {}", strategy_path.display());
    let mut strategy = match load_strategy(strategy_path) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    if let Some(symbol) = symbol_override {
        strategy.symbol = symbol.trim().to_uppercase();
    }

    let port = match open_price_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let volume = volume.unwrap_or(settings.volume);
    let analyzer = Analyzer::new(port.as_ref(), settings);

    eprintln!(
        "Running backtest: {} on {} ({} signals)",
        strategy.name,
        strategy.symbol,
        strategy.signals.len()
    );
    let report = match analyzer.report(&strategy, volume) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    if report.first_date.is_none() {
        return fail(BarchartError::NoData {
            symbol: strategy.symbol.clone(),
        });
    }

    print_report(&report);
    ExitCode::SUCCESS
}

pub fn print_report(report: &BacktestReport) {
    println!("signal\tdirection\topen_date\topen\tclose_date\tclose\thigh\tdrawdown\tprofit\texit");
    for t in &report.trades {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{:.2}\t{:.2}\t{}",
            t.signal.as_deref().unwrap_or("-"),
            t.direction,
            t.open_date,
            t.open,
            t.close_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
            t.close.map(|c| c.to_string()).unwrap_or_else(|| "-".into()),
            t.high,
            t.drawdown,
            t.profit,
            t.exit.map(|e| e.to_string()).unwrap_or_else(|| "open".into()),
        );
    }

    let s = &report.summary;
    eprintln!("\n=== Results ===");
    if let (Some(first), Some(last)) = (report.first_date, report.last_date) {
        eprintln!("Period:           {} to {}", first, last);
    }
    eprintln!("Percent Profit:   {:.2}%", report.percent_profit);
    eprintln!(
        "Total Trades:     {} ({} closed, {} open at end)",
        s.total_trades, s.closed_trades, s.open_at_end
    );
    eprintln!("Win Rate:         {:.1}%", s.win_rate * 100.0);
    eprintln!("Net Profit:       {:.2} points", s.net_profit);
    eprintln!("Best High:        {:.2}", s.best_high);
    eprintln!("Worst Drawdown:   {:.2}", s.worst_drawdown);
    eprintln!("Avg Bars Held:    {:.1}", s.avg_bars_held);
}

/// Apply the filters requested in `args` to `prices`, in a fixed order:
/// trend, volume, average, streak.
pub fn apply_filters(
    analyzer: &Analyzer<'_>,
    prices: Vec<PriceBar>,
    args: &FilterArgs,
) -> Result<Vec<PriceBar>, BarchartError> {
    let mut prices = prices;

    if let Some(trend) = args.trend {
        prices = filter::trend_filter(&prices, trend);
    }
    if args.by_volume || args.volume.is_some() {
        prices = filter::volume_filter(&prices, args.volume, args.lower_than);
    }
    if let Some(average) = &args.average {
        let kind: AverageKind = average.parse()?;
        let percent = args.percent.unwrap_or(0.0);
        prices = filter::average_filter(&prices, kind, percent)?;
    }
    if let Some(series) = &args.series {
        let reading: Reading = series.parse().map_err(|reason| BarchartError::ConfigInvalid {
            section: "filter".into(),
            key: "series".into(),
            reason,
        })?;
        let direction: Direction =
            args.direction
                .parse()
                .map_err(|reason| BarchartError::ConfigInvalid {
                    section: "filter".into(),
                    key: "direction".into(),
                    reason,
                })?;
        prices = analyzer.indicator_series_filter(&prices, &reading, direction, args.streak)?;
    }

    Ok(prices)
}

fn run_filter(args: &FilterArgs) -> ExitCode {
    let config = match load_config(&args.config) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let settings = match AnalyzerSettings::from_config(&config) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let port = match open_price_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let analyzer = Analyzer::new(port.as_ref(), settings);

    let symbol = args.symbol.trim().to_uppercase();
    let window = match analyzer.get_prices(&symbol, args.from_id, args.bars) {
        Ok(w) => w,
        Err(e) => return fail(e),
    };
    let total = window.len();

    let kept = match apply_filters(&analyzer, window, args) {
        Ok(k) => k,
        Err(e) => return fail(e),
    };

    println!("id\ttimestamp\tprice\tvolume\ttrend");
    for bar in &kept {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            bar.id, bar.timestamp, bar.price, bar.volume, bar.trend
        );
    }
    eprintln!("{} of {} bars kept", kept.len(), total);
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf, symbol: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let port = match open_price_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let symbol = symbol.trim().to_uppercase();
    let prices = match port.fetch_all_prices(&symbol) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    match (
        crate::domain::backtest::first_date(&prices),
        crate::domain::backtest::last_date(&prices),
    ) {
        (Some(first), Some(last)) => {
            println!("{}: {} bars, {} to {}", symbol, prices.len(), first, last);
        }
        _ => eprintln!("{}: no data found", symbol),
    }
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let port = match open_price_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let symbols = match port.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_validate(strategy_path: &PathBuf) -> ExitCode {
    eprintln!("Validating strategy: {}", strategy_path.display());
    let strategy = match load_strategy(strategy_path) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    eprintln!("\nStrategy: {} on {}", strategy.name, strategy.symbol);
    for signal in &strategy.signals {
        let conditions: Vec<String> = signal.conditions.iter().map(|c| c.to_string()).collect();
        eprintln!("  {} ({})", signal.label(), signal.direction);
        eprintln!(
            "    conditions: {}",
            if conditions.is_empty() {
                "none (fires on every bar)".to_string()
            } else {
                conditions.join(", ")
            }
        );
        for (name, value) in [
            ("stop_loss_percent", signal.stop_loss_percent),
            ("take_profit_percent", signal.take_profit_percent),
            ("stop_loss", signal.stop_loss),
            ("take_profit", signal.take_profit),
        ] {
            if let Some(v) = value {
                eprintln!("    {}: {}", name, v);
            }
        }
    }

    eprintln!("\nStrategy configuration is valid.");
    ExitCode::SUCCESS
}

fn run_averages() -> ExitCode {
    for (code, description) in average_kind_names() {
        println!("{}\t{}", code, description);
    }
    ExitCode::SUCCESS
}
