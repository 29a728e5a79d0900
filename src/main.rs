use anyhow::Result;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use pairtrade_backtest::charts;
use pairtrade_backtest::config::BacktestConfig;
use pairtrade_backtest::ports::chart_csv::CsvChartWriter;
use pairtrade_backtest::ports::csv_prices::CsvPriceLoader;
use pairtrade_backtest::ports::timeseries_csv::CsvTimeseriesSink;
use pairtrade_backtest::PairBacktester;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

/// Backtest a z-score spread arbitrage strategy on a pair of price series.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// YAML config file (overrides PAIRBT_CONFIG_PATH)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    file1: Option<String>,
    #[arg(long)]
    file2: Option<String>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Rolling window for the z-score
    #[arg(long)]
    window: Option<usize>,
    #[arg(long, allow_negative_numbers = true)]
    z_entry: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    z_exit: Option<f64>,
    #[arg(long)]
    capital: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    hedge_ratio: Option<f64>,
    /// Write the full timeseries table to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,
    /// Write chart data for pnl, spread/z-score and drawdowns
    #[arg(long)]
    plots: bool,
    #[arg(long, default_value = "outputs")]
    plots_dir: PathBuf,
    /// Print metrics as JSON
    #[arg(long)]
    json: bool,
    /// Log progress at debug level only
    #[arg(long)]
    quiet: bool,
}

impl Args {
    fn apply(&self, cfg: &mut BacktestConfig) {
        if let Some(v) = &self.file1 {
            cfg.file1 = v.clone();
        }
        if let Some(v) = &self.file2 {
            cfg.file2 = v.clone();
        }
        if let Some(v) = &self.data_dir {
            cfg.data_dir = v.clone();
        }
        if let Some(v) = self.window {
            cfg.window = v;
        }
        if let Some(v) = self.z_entry {
            cfg.z_entry = v;
        }
        if let Some(v) = self.z_exit {
            cfg.z_exit = v;
        }
        if let Some(v) = self.capital {
            cfg.capital = v;
        }
        if let Some(v) = self.hedge_ratio {
            cfg.hedge_ratio = v;
        }
    }
}

fn init_logger() {
    // Initialize logging with local timezone
    let offset_seconds = env::var("TIMEZONE_OFFSET")
        .ok()
        .and_then(|v| v.parse::<i32>().ok())
        .unwrap_or(3600);
    let offset = FixedOffset::east_opt(offset_seconds).unwrap_or_else(|| Utc.fix());
    Builder::from_default_env()
        .format(move |buf, record| {
            let utc_now: DateTime<Utc> = Utc::now();
            let local_now = utc_now.with_timezone(&offset);
            writeln!(
                buf,
                "{} [{}] - {}",
                local_now.format("%Y-%m-%dT%H:%M:%S%z"),
                record.level(),
                record.args()
            )
        })
        .filter(
            None,
            LevelFilter::from_str(&env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
                .unwrap_or(LevelFilter::Info),
        )
        .init();
}

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => {
            let mut cfg = BacktestConfig::from_yaml_path(path)?;
            cfg.apply_env_overrides();
            cfg
        }
        None => BacktestConfig::from_env_or_yaml()?,
    };
    args.apply(&mut cfg);
    let params = cfg.validate()?;
    log::info!(
        "Backtesting {} vs {} (window={}, z_entry={}, z_exit={}, method={})",
        cfg.file1,
        cfg.file2,
        params.window,
        params.rule.z_entry,
        params.rule.z_exit,
        params.method
    );

    let loader = CsvPriceLoader::new(&cfg.data_dir);
    let mut backtester = PairBacktester::new(params).verbose(!args.quiet);
    let metrics = backtester.run_from(&loader, &cfg.file1, &cfg.file2)?;

    if let Some(path) = &args.export {
        let mut sink = CsvTimeseriesSink::create(path)?;
        backtester.export_timeseries(&mut sink)?;
    }
    if args.plots {
        let mut writer = CsvChartWriter::new(&args.plots_dir);
        charts::render_all(backtester.pnl_stage()?, &mut writer)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!("\n--- Metrics ---");
        for (key, value) in metrics.entries() {
            println!("{key}: {value:.2}");
        }
    }
    Ok(())
}
