use crate::error::{BacktestError, Result};
use crate::series::{AlignedPrices, Series};

/// Spread of an aligned pair and its rolling z-score.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadFrame {
    pub spread: Series<f64>,
    pub z_score: Series<f64>,
}

/// `price1 - hedge_ratio * price2`, elementwise over the common index.
/// A hedge ratio of zero is allowed and leaves the first leg alone.
pub fn spread(prices: &AlignedPrices, hedge_ratio: f64) -> Result<Series<f64>> {
    prices
        .price1
        .ensure_aligned(&prices.price2, "spread legs")?;
    let values = prices
        .price1
        .values()
        .iter()
        .zip(prices.price2.values())
        .map(|(p1, p2)| p1 - hedge_ratio * p2)
        .collect();
    Series::new(prices.index().clone(), values)
}

/// `(spread - rolling_mean) / rolling_std` over a trailing window.
///
/// The first `window - 1` values are undefined, as is every period whose
/// rolling standard deviation is exactly zero.
pub fn z_score(spread: &Series<f64>, window: usize) -> Result<Series<f64>> {
    if window == 0 {
        return Err(BacktestError::configuration(
            "rolling window must be a positive number of periods",
        ));
    }
    let mean = spread.rolling_mean(window);
    let std = spread.rolling_std(window);
    let values = spread
        .values()
        .iter()
        .zip(mean.values())
        .zip(std.values())
        .map(|((s, m), sd)| if *sd == 0.0 { f64::NAN } else { (s - m) / sd })
        .collect();
    Series::new(spread.index().clone(), values)
}

pub fn build(prices: &AlignedPrices, hedge_ratio: f64, window: usize) -> Result<SpreadFrame> {
    let spread = spread(prices, hedge_ratio)?;
    let z_score = z_score(&spread, window)?;
    log::debug!(
        "spread built over {} rows (hedge_ratio={}, window={})",
        spread.len(),
        hedge_ratio,
        window
    );
    Ok(SpreadFrame { spread, z_score })
}
