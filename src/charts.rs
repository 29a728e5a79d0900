//! Series behind the report charts. Rendering belongs to a [`ChartSink`].

use anyhow::Result;
use std::path::PathBuf;

use crate::backtest::PnlComputed;
use crate::series::{mean, sample_std, Series};

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub points: Series<f64>,
}

impl ChartSeries {
    pub fn new(name: impl Into<String>, points: Series<f64>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

/// Renders one named chart and reports where it went.
pub trait ChartSink {
    fn render(&mut self, name: &str, series: &[ChartSeries]) -> Result<PathBuf>;
}

pub fn pnl_curve(pnl: &Series<f64>) -> ChartSeries {
    ChartSeries::new("cumulative_pnl", pnl.cumsum())
}

/// The spread plus its z-score rescaled into spread units, for overlaying.
pub fn spread_zscore(spread: &Series<f64>, z_score: &Series<f64>) -> Vec<ChartSeries> {
    let s_mean = mean(spread.values());
    let s_std = sample_std(spread.values());
    vec![
        ChartSeries::new("spread", spread.clone()),
        ChartSeries::new("z_score_scaled", z_score.map(|z| z * s_std + s_mean)),
    ]
}

/// Drawdown of cumulative pnl relative to its running peak; undefined while
/// the peak is zero.
pub fn drawdowns(pnl: &Series<f64>) -> ChartSeries {
    let mut peak = f64::NEG_INFINITY;
    let pct = pnl.cumsum().map(|equity| {
        peak = peak.max(*equity);
        if peak == 0.0 {
            f64::NAN
        } else {
            (equity - peak) / peak
        }
    });
    ChartSeries::new("drawdown_pct", pct)
}

/// Renders the three standard charts of a finished run.
pub fn render_all<C: ChartSink + ?Sized>(run: &PnlComputed, sink: &mut C) -> Result<Vec<PathBuf>> {
    let pnl = &run.pnl.pnl;
    let outputs = vec![
        sink.render("pnl_curve", &[pnl_curve(pnl)])?,
        sink.render(
            "spread_zscore",
            &spread_zscore(&run.spread.spread, &run.spread.z_score),
        )?,
        sink.render("drawdowns", &[drawdowns(pnl)])?,
    ];
    for path in &outputs {
        log::info!("chart written to {}", path.display());
    }
    Ok(outputs)
}
