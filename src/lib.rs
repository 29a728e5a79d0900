// src/lib.rs
pub mod ports {
    pub mod chart_csv;
    pub mod csv_prices;
    pub mod timeseries_csv;
}
pub mod backtest;
pub mod charts;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pnl;
pub mod series;
pub mod signal;
pub mod spread;

pub use backtest::{BacktestParams, PairBacktester, PipelineStage};
pub use config::BacktestConfig;
pub use error::BacktestError;
pub use metrics::Metrics;
