//! Pipeline driving one backtest run:
//! prices -> spread/z-score -> positions -> pnl -> returns -> metrics.
//!
//! Each stage is its own type holding shared handles to everything computed
//! before it, so a stage can only be built from its predecessor.
//! [`PairBacktester`] wraps the stages behind a runtime state machine for
//! callers that drive the steps one call at a time.

use std::fmt;
use std::sync::Arc;

use crate::error::{BacktestError, Result};
use crate::metrics::{Metrics, TRADING_DAYS_PER_YEAR};
use crate::pnl::{self, PnlFrame, PnlParams, PositioningMethod};
use crate::ports::csv_prices::PriceSource;
use crate::ports::timeseries_csv::TimeseriesSink;
use crate::series::{AlignedPrices, PriceSeries, Series, TimeIndex, Timestamp};
use crate::signal::{Position, ThresholdRule};
use crate::spread::{self, SpreadFrame};

/// Validated parameters of one run. Fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestParams {
    pub hedge_ratio: f64,
    pub transaction_cost_rate: f64,
    pub window: usize,
    pub rule: ThresholdRule,
    pub capital: f64,
    pub method: PositioningMethod,
    pub annualization_factor: f64,
}

impl BacktestParams {
    fn pnl_params(&self) -> PnlParams {
        PnlParams {
            hedge_ratio: self.hedge_ratio,
            transaction_cost_rate: self.transaction_cost_rate,
            capital: self.capital,
            method: self.method,
        }
    }
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            hedge_ratio: 1.0,
            transaction_cost_rate: 0.0001,
            window: 100,
            rule: ThresholdRule::new(2.0, 0.5),
            capital: 50_000_000.0,
            method: PositioningMethod::Net,
            annualization_factor: TRADING_DAYS_PER_YEAR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    Unloaded,
    DataLoaded,
    SpreadComputed,
    SignalsGenerated,
    PnlComputed,
    MetricsComputed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone)]
pub struct DataLoaded {
    pub prices: Arc<AlignedPrices>,
}

impl DataLoaded {
    pub fn new(leg1: &PriceSeries, leg2: &PriceSeries) -> Result<Self> {
        let prices = AlignedPrices::align(leg1, leg2)?;
        log::debug!(
            "aligned {} ({} rows) and {} ({} rows) into {} rows",
            leg1.label,
            leg1.len(),
            leg2.label,
            leg2.len(),
            prices.len()
        );
        Ok(Self {
            prices: Arc::new(prices),
        })
    }

    pub fn compute_spread(&self, params: &BacktestParams) -> Result<SpreadComputed> {
        let frame = spread::build(&self.prices, params.hedge_ratio, params.window)?;
        Ok(SpreadComputed {
            prices: Arc::clone(&self.prices),
            spread: Arc::new(frame),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SpreadComputed {
    pub prices: Arc<AlignedPrices>,
    pub spread: Arc<SpreadFrame>,
}

impl SpreadComputed {
    pub fn generate_signals(&self, params: &BacktestParams) -> SignalsGenerated {
        let positions = params.rule.positions(&self.spread.z_score);
        SignalsGenerated {
            prices: Arc::clone(&self.prices),
            spread: Arc::clone(&self.spread),
            positions: Arc::new(positions),
        }
    }

    fn loaded(&self) -> DataLoaded {
        DataLoaded {
            prices: Arc::clone(&self.prices),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignalsGenerated {
    pub prices: Arc<AlignedPrices>,
    pub spread: Arc<SpreadFrame>,
    pub positions: Arc<Series<Position>>,
}

impl SignalsGenerated {
    pub fn compute_pnl(&self, params: &BacktestParams) -> Result<PnlComputed> {
        let frame = pnl::simulate(
            &self.prices,
            &self.spread.spread,
            &self.positions,
            &params.pnl_params(),
        )?;
        let daily_returns = pnl::daily_returns(&frame.pnl, params.capital);
        Ok(PnlComputed {
            prices: Arc::clone(&self.prices),
            spread: Arc::clone(&self.spread),
            positions: Arc::clone(&self.positions),
            pnl: Arc::new(frame),
            daily_returns: Arc::new(daily_returns),
            capital: params.capital,
        })
    }

    fn spread_computed(&self) -> SpreadComputed {
        SpreadComputed {
            prices: Arc::clone(&self.prices),
            spread: Arc::clone(&self.spread),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PnlComputed {
    pub prices: Arc<AlignedPrices>,
    pub spread: Arc<SpreadFrame>,
    pub positions: Arc<Series<Position>>,
    pub pnl: Arc<PnlFrame>,
    /// Finite `pnl / capital` values only.
    pub daily_returns: Arc<Series<f64>>,
    capital: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestSummary {
    pub trades: usize,
    pub final_cumulative_pnl: f64,
    pub final_cumulative_return: f64,
}

impl PnlComputed {
    pub fn compute_metrics(&self, params: &BacktestParams) -> MetricsComputed {
        let metrics = Metrics::compute(self.daily_returns.values(), params.annualization_factor);
        MetricsComputed {
            run: self.clone(),
            metrics,
        }
    }

    pub fn summary(&self) -> BacktestSummary {
        let final_cumulative_pnl = self
            .pnl
            .pnl
            .cumsum()
            .values()
            .last()
            .copied()
            .unwrap_or(0.0);
        BacktestSummary {
            trades: self.pnl.trade_count(),
            final_cumulative_pnl,
            final_cumulative_return: final_cumulative_pnl / self.capital,
        }
    }

    pub fn timeseries(&self) -> TimeseriesTable {
        let index = self.prices.index().clone();
        TimeseriesTable {
            label1: self.prices.label1.clone(),
            label2: self.prices.label2.clone(),
            price1: self.prices.price1.values().to_vec(),
            price2: self.prices.price2.values().to_vec(),
            spread: self.spread.spread.values().to_vec(),
            z_score: self.spread.z_score.values().to_vec(),
            position: self.positions.values().iter().map(|p| p.as_i8()).collect(),
            units: self.pnl.units.values().to_vec(),
            transaction_cost: self.pnl.transaction_cost.values().to_vec(),
            pnl: self.pnl.pnl.values().to_vec(),
            daily_return: self.daily_returns.reindex(&index),
            trade_flag: self.pnl.trade_flags.values().to_vec(),
            index,
        }
    }

    fn signals(&self) -> SignalsGenerated {
        SignalsGenerated {
            prices: Arc::clone(&self.prices),
            spread: Arc::clone(&self.spread),
            positions: Arc::clone(&self.positions),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsComputed {
    pub run: PnlComputed,
    pub metrics: Metrics,
}

/// Every intermediate series of a finished run on one shared index.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesTable {
    pub index: TimeIndex,
    pub label1: String,
    pub label2: String,
    pub price1: Vec<f64>,
    pub price2: Vec<f64>,
    pub spread: Vec<f64>,
    pub z_score: Vec<f64>,
    pub position: Vec<i8>,
    pub units: Vec<f64>,
    pub transaction_cost: Vec<f64>,
    pub pnl: Vec<f64>,
    /// `None` where the return was undefined and dropped.
    pub daily_return: Vec<Option<f64>>,
    pub trade_flag: Vec<bool>,
}

/// One exported row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeseriesRow {
    pub timestamp: Timestamp,
    pub price1: f64,
    pub price2: f64,
    pub spread: f64,
    pub z_score: f64,
    pub position: i8,
    pub units: f64,
    pub transaction_cost: f64,
    pub pnl: f64,
    pub daily_return: Option<f64>,
    pub trade_flag: bool,
}

impl TimeseriesTable {
    pub fn headers(&self) -> Vec<String> {
        vec![
            "timestamp".to_string(),
            format!("{}_price", self.label1),
            format!("{}_price", self.label2),
            "spread".to_string(),
            "z_score".to_string(),
            "position".to_string(),
            "units".to_string(),
            "transaction_cost".to_string(),
            "pnl".to_string(),
            "daily_returns".to_string(),
            "trade_entry".to_string(),
        ]
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = TimeseriesRow> + '_ {
        self.index.iter().enumerate().map(move |(i, ts)| TimeseriesRow {
            timestamp: *ts,
            price1: self.price1[i],
            price2: self.price2[i],
            spread: self.spread[i],
            z_score: self.z_score[i],
            position: self.position[i],
            units: self.units[i],
            transaction_cost: self.transaction_cost[i],
            pnl: self.pnl[i],
            daily_return: self.daily_return[i],
            trade_flag: self.trade_flag[i],
        })
    }
}

#[derive(Debug, Clone, Default)]
enum Stage {
    #[default]
    Unloaded,
    DataLoaded(DataLoaded),
    SpreadComputed(SpreadComputed),
    SignalsGenerated(SignalsGenerated),
    PnlComputed(PnlComputed),
    MetricsComputed(MetricsComputed),
}

impl Stage {
    fn tag(&self) -> PipelineStage {
        match self {
            Stage::Unloaded => PipelineStage::Unloaded,
            Stage::DataLoaded(_) => PipelineStage::DataLoaded,
            Stage::SpreadComputed(_) => PipelineStage::SpreadComputed,
            Stage::SignalsGenerated(_) => PipelineStage::SignalsGenerated,
            Stage::PnlComputed(_) => PipelineStage::PnlComputed,
            Stage::MetricsComputed(_) => PipelineStage::MetricsComputed,
        }
    }

    fn loaded(&self) -> Option<DataLoaded> {
        match self {
            Stage::Unloaded => None,
            Stage::DataLoaded(s) => Some(s.clone()),
            Stage::SpreadComputed(s) => Some(s.loaded()),
            Stage::SignalsGenerated(s) => Some(s.spread_computed().loaded()),
            Stage::PnlComputed(s) => Some(s.signals().spread_computed().loaded()),
            Stage::MetricsComputed(s) => Some(s.run.signals().spread_computed().loaded()),
        }
    }

    fn spread_computed(&self) -> Option<SpreadComputed> {
        match self {
            Stage::Unloaded | Stage::DataLoaded(_) => None,
            Stage::SpreadComputed(s) => Some(s.clone()),
            Stage::SignalsGenerated(s) => Some(s.spread_computed()),
            Stage::PnlComputed(s) => Some(s.signals().spread_computed()),
            Stage::MetricsComputed(s) => Some(s.run.signals().spread_computed()),
        }
    }

    fn signals(&self) -> Option<SignalsGenerated> {
        match self {
            Stage::SignalsGenerated(s) => Some(s.clone()),
            Stage::PnlComputed(s) => Some(s.signals()),
            Stage::MetricsComputed(s) => Some(s.run.signals()),
            _ => None,
        }
    }

    fn pnl(&self) -> Option<&PnlComputed> {
        match self {
            Stage::PnlComputed(s) => Some(s),
            Stage::MetricsComputed(s) => Some(&s.run),
            _ => None,
        }
    }
}

/// Runtime driver over the stage types.
///
/// A step may be invoked once its prerequisite stage has been reached;
/// re-running a step recomputes from that point and discards later stages.
/// Loading data always starts a fresh run.
#[derive(Debug, Clone)]
pub struct PairBacktester {
    params: BacktestParams,
    verbose: bool,
    stage: Stage,
}

impl PairBacktester {
    pub fn new(params: BacktestParams) -> Self {
        Self {
            params,
            verbose: false,
            stage: Stage::Unloaded,
        }
    }

    /// Report progress at info level instead of debug.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn params(&self) -> &BacktestParams {
        &self.params
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage.tag()
    }

    fn sequence_error(&self, attempted: &'static str, required: PipelineStage) -> BacktestError {
        BacktestError::Sequence {
            attempted,
            required,
            current: self.stage.tag(),
        }
    }

    pub fn load_data(&mut self, leg1: &PriceSeries, leg2: &PriceSeries) -> Result<()> {
        let loaded = DataLoaded::new(leg1, leg2)?;
        self.stage = Stage::DataLoaded(loaded);
        Ok(())
    }

    pub fn load_from<S: PriceSource + ?Sized>(
        &mut self,
        source: &S,
        id1: &str,
        id2: &str,
    ) -> anyhow::Result<()> {
        let leg1 = source.load(id1)?;
        let leg2 = source.load(id2)?;
        self.load_data(&leg1, &leg2)?;
        Ok(())
    }

    pub fn compute_spread(&mut self) -> Result<()> {
        let loaded = self
            .stage
            .loaded()
            .ok_or_else(|| self.sequence_error("compute_spread", PipelineStage::DataLoaded))?;
        self.stage = Stage::SpreadComputed(loaded.compute_spread(&self.params)?);
        Ok(())
    }

    pub fn generate_signals(&mut self) -> Result<()> {
        let spread = self.stage.spread_computed().ok_or_else(|| {
            self.sequence_error("generate_signals", PipelineStage::SpreadComputed)
        })?;
        self.stage = Stage::SignalsGenerated(spread.generate_signals(&self.params));
        Ok(())
    }

    pub fn compute_pnl(&mut self) -> Result<()> {
        let signals = self
            .stage
            .signals()
            .ok_or_else(|| self.sequence_error("compute_pnl", PipelineStage::SignalsGenerated))?;
        let run = signals.compute_pnl(&self.params)?;
        self.report(&run.summary());
        self.stage = Stage::PnlComputed(run);
        Ok(())
    }

    pub fn compute_metrics(&mut self) -> Result<Metrics> {
        let computed = self
            .stage
            .pnl()
            .ok_or_else(|| self.sequence_error("compute_metrics", PipelineStage::PnlComputed))?
            .compute_metrics(&self.params);
        let metrics = computed.metrics;
        self.stage = Stage::MetricsComputed(computed);
        Ok(metrics)
    }

    /// Drives every step in order on already loaded series.
    pub fn run(&mut self, leg1: &PriceSeries, leg2: &PriceSeries) -> Result<Metrics> {
        self.load_data(leg1, leg2)?;
        self.compute_spread()?;
        self.generate_signals()?;
        self.compute_pnl()?;
        self.compute_metrics()
    }

    pub fn run_from<S: PriceSource + ?Sized>(
        &mut self,
        source: &S,
        id1: &str,
        id2: &str,
    ) -> anyhow::Result<Metrics> {
        self.load_from(source, id1, id2)?;
        self.compute_spread()?;
        self.generate_signals()?;
        self.compute_pnl()?;
        Ok(self.compute_metrics()?)
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        match &self.stage {
            Stage::MetricsComputed(s) => Some(&s.metrics),
            _ => None,
        }
    }

    pub fn pnl_stage(&self) -> Result<&PnlComputed> {
        self.stage
            .pnl()
            .ok_or_else(|| self.sequence_error("inspect pnl", PipelineStage::PnlComputed))
    }

    pub fn summary(&self) -> Result<BacktestSummary> {
        Ok(self.pnl_stage()?.summary())
    }

    pub fn timeseries(&self) -> Result<TimeseriesTable> {
        self.stage
            .pnl()
            .map(PnlComputed::timeseries)
            .ok_or_else(|| self.sequence_error("export_timeseries", PipelineStage::PnlComputed))
    }

    pub fn export_timeseries<W: TimeseriesSink + ?Sized>(&self, sink: &mut W) -> anyhow::Result<()> {
        let table = self.timeseries()?;
        sink.write_table(&table)?;
        log::info!("exported {} timeseries rows", table.len());
        Ok(())
    }

    fn report(&self, summary: &BacktestSummary) {
        let level = if self.verbose {
            log::Level::Info
        } else {
            log::Level::Debug
        };
        log::log!(level, "Backtest complete");
        log::log!(
            level,
            "Final cumulative PnL: ${:.2}",
            summary.final_cumulative_pnl
        );
        log::log!(
            level,
            "Final cumulative return: {:.2}%",
            summary.final_cumulative_return * 100.0
        );
        log::log!(level, "Total trades: {}", summary.trades);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::test_stamps;

    fn legs(p1: &[f64], p2: &[f64]) -> (PriceSeries, PriceSeries) {
        (
            PriceSeries::new("P1", test_stamps(p1.len()), p1.to_vec()).unwrap(),
            PriceSeries::new("P2", test_stamps(p2.len()), p2.to_vec()).unwrap(),
        )
    }

    fn scenario_params() -> BacktestParams {
        BacktestParams {
            hedge_ratio: 1.0,
            transaction_cost_rate: 0.0001,
            window: 2,
            rule: ThresholdRule::new(1.0, 0.2),
            capital: 1_000_000.0,
            method: PositioningMethod::Net,
            annualization_factor: TRADING_DAYS_PER_YEAR,
        }
    }

    fn scenario() -> (PriceSeries, PriceSeries) {
        legs(
            &[100.0, 101.0, 99.0, 102.0, 98.0],
            &[50.0, 50.5, 49.5, 51.0, 49.0],
        )
    }

    /// A mean-reverting pair that trades several times.
    fn trending_pair() -> (PriceSeries, PriceSeries) {
        let p1: Vec<f64> = (0..60)
            .map(|i| 100.0 + 3.0 * ((i as f64) * 0.7).sin() + 0.05 * i as f64)
            .collect();
        let p2: Vec<f64> = (0..60).map(|i| 50.0 + 0.02 * i as f64).collect();
        legs(&p1, &p2)
    }

    #[test]
    fn end_to_end_scenario() {
        let (a, b) = scenario();
        let mut bt = PairBacktester::new(scenario_params());
        let metrics = bt.run(&a, &b).unwrap();
        assert_eq!(bt.stage(), PipelineStage::MetricsComputed);

        // window 2 pins |z| at 1/sqrt(2): between exit and entry, so nothing trades
        let run = bt.pnl_stage().unwrap();
        assert!(run.positions.values().iter().all(|p| p.is_flat()));
        assert!(run.pnl.pnl.values()[0].is_nan());
        assert!(run.pnl.pnl.values()[1..].iter().all(|v| *v == 0.0));
        assert_eq!(run.daily_returns.len(), 4);
        assert_eq!(metrics, Metrics::default());

        let summary = bt.summary().unwrap();
        assert_eq!(summary.trades, 0);
        assert_eq!(summary.final_cumulative_pnl, 0.0);
    }

    #[test]
    fn reruns_are_bit_identical() {
        let (a, b) = trending_pair();
        let mut params = scenario_params();
        params.window = 10;
        params.rule = ThresholdRule::new(1.0, 0.25);

        let mut first = PairBacktester::new(params);
        let mut second = PairBacktester::new(params);
        let m1 = first.run(&a, &b).unwrap();
        let m2 = second.run(&a, &b).unwrap();
        let m3 = first.run(&a, &b).unwrap();
        assert_eq!(m1.sharpe.to_bits(), m2.sharpe.to_bits());
        assert_eq!(m1.entries().map(|(_, v)| v.to_bits()), m3.entries().map(|(_, v)| v.to_bits()));

        let t1 = first.timeseries().unwrap();
        let t2 = second.timeseries().unwrap();
        let bits = |t: &TimeseriesTable| t.pnl.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&t1), bits(&t2));
        assert!(first.summary().unwrap().trades > 0);
    }

    #[test]
    fn out_of_order_calls_fail_with_sequence_error() {
        let mut bt = PairBacktester::new(scenario_params());
        assert!(matches!(
            bt.compute_metrics(),
            Err(BacktestError::Sequence {
                required: PipelineStage::PnlComputed,
                current: PipelineStage::Unloaded,
                ..
            })
        ));
        assert!(bt.compute_spread().is_err());
        assert!(bt.timeseries().is_err());

        let (a, b) = scenario();
        bt.load_data(&a, &b).unwrap();
        assert!(matches!(
            bt.compute_pnl(),
            Err(BacktestError::Sequence {
                required: PipelineStage::SignalsGenerated,
                current: PipelineStage::DataLoaded,
                ..
            })
        ));
        // a failed step leaves the reached stage untouched
        assert_eq!(bt.stage(), PipelineStage::DataLoaded);
        bt.compute_spread().unwrap();
        assert!(bt.compute_metrics().is_err());
        assert!(bt.timeseries().is_err());
    }

    #[test]
    fn repeating_an_earlier_step_discards_later_stages() {
        let (a, b) = scenario();
        let mut bt = PairBacktester::new(scenario_params());
        bt.run(&a, &b).unwrap();
        bt.compute_spread().unwrap();
        assert_eq!(bt.stage(), PipelineStage::SpreadComputed);
        assert!(bt.metrics().is_none());
    }

    #[test]
    fn stage_types_chain_without_the_driver() {
        let (a, b) = trending_pair();
        let params = BacktestParams {
            window: 10,
            ..scenario_params()
        };
        let run = DataLoaded::new(&a, &b)
            .and_then(|d| d.compute_spread(&params))
            .map(|s| s.generate_signals(&params))
            .and_then(|s| s.compute_pnl(&params))
            .unwrap();
        let done = run.compute_metrics(&params);
        assert!(Arc::ptr_eq(&done.run.prices, &run.prices));
        assert!(done.metrics.volatility_pct >= 0.0);
    }

    #[test]
    fn timeseries_table_covers_every_row() {
        let (a, b) = trending_pair();
        let params = BacktestParams {
            window: 10,
            ..scenario_params()
        };
        let mut bt = PairBacktester::new(params);
        bt.run(&a, &b).unwrap();
        let table = bt.timeseries().unwrap();

        assert_eq!(table.len(), 60);
        assert_eq!(table.headers()[1], "P1_price");
        assert_eq!(table.headers().len(), 11);
        let rows: Vec<TimeseriesRow> = table.rows().collect();
        assert_eq!(rows.len(), 60);
        assert!(rows[0].daily_return.is_none());
        assert!(rows[0].z_score.is_nan());
        assert!(rows[59].daily_return.is_some());
        let flagged = rows.iter().filter(|r| r.trade_flag).count();
        assert_eq!(flagged, bt.summary().unwrap().trades);
    }

    #[test]
    fn price_change_never_moves_same_period_position() {
        let (a, b) = trending_pair();
        let params = BacktestParams {
            window: 10,
            ..scenario_params()
        };
        let t = 30;
        let mut shocked = a.prices.values().to_vec();
        shocked[t] *= 1.5;
        let a2 = PriceSeries::new("P1", test_stamps(60), shocked).unwrap();

        let mut base = PairBacktester::new(params);
        let mut alt = PairBacktester::new(params);
        base.run(&a, &b).unwrap();
        alt.run(&a2, &b).unwrap();
        let p1 = base.pnl_stage().unwrap().positions.values().to_vec();
        let p2 = alt.pnl_stage().unwrap().positions.values().to_vec();
        assert_eq!(p1[..=t], p2[..=t]);
    }

    #[test]
    fn constant_prices_complete_with_neutral_metrics() {
        let (a, b) = legs(&[10.0; 20], &[5.0; 20]);
        let params = BacktestParams {
            window: 5,
            ..scenario_params()
        };
        let mut bt = PairBacktester::new(params);
        let metrics = bt.run(&a, &b).unwrap();
        assert_eq!(metrics, Metrics::default());
    }

    #[test]
    fn constant_inexact_prices_never_trade() {
        let (a, b) = legs(&[0.2; 20], &[0.1; 20]);
        let params = BacktestParams {
            window: 3,
            rule: ThresholdRule::new(0.8, 0.5),
            ..scenario_params()
        };
        let mut bt = PairBacktester::new(params);
        let metrics = bt.run(&a, &b).unwrap();
        assert_eq!(bt.summary().unwrap().trades, 0);
        assert_eq!(metrics, Metrics::default());
    }
}
