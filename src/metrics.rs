//! Risk/return statistics of a daily return series.
//!
//! Inputs are expected to be finite already; every function resolves a
//! degenerate input (empty, zero volatility, no drawdown) to `0.0`.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::series::{mean, sample_std};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

fn neutral(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// `mean * periods`.
pub fn annualized_return(returns: &[f64], periods_per_year: f64) -> f64 {
    neutral(mean(returns) * periods_per_year)
}

/// `std * sqrt(periods)`.
pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    neutral(sample_std(returns) * periods_per_year.sqrt())
}

fn ratio(numerator: f64, deviation: f64, periods_per_year: f64) -> f64 {
    if !deviation.is_finite() || deviation == 0.0 {
        return 0.0;
    }
    neutral(numerator * periods_per_year / (deviation * periods_per_year.sqrt()))
}

pub fn sharpe(returns: &[f64], periods_per_year: f64) -> f64 {
    ratio(mean(returns), sample_std(returns), periods_per_year)
}

/// Like [`sharpe`] but only the spread of negative returns counts as risk.
pub fn sortino(returns: &[f64], periods_per_year: f64) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    ratio(mean(returns), sample_std(&downside), periods_per_year)
}

/// Share of winning periods among periods that moved at all.
pub fn hit_ratio(returns: &[f64]) -> f64 {
    let moved = returns.iter().filter(|r| **r != 0.0).count();
    if moved == 0 {
        return 0.0;
    }
    let wins = returns.iter().filter(|r| **r > 0.0).count();
    wins as f64 / moved as f64
}

/// Deepest fall of the equity curve `1 + cumsum(returns)` below its running
/// peak, as a (negative) fraction of that peak. Periods whose peak is zero
/// are skipped.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut equity = 1.0;
    let mut peak = f64::NEG_INFINITY;
    let mut worst: Option<f64> = None;
    for r in returns {
        equity += r;
        peak = peak.max(equity);
        if peak == 0.0 || !peak.is_finite() {
            continue;
        }
        let dd = (equity - peak) / peak;
        if dd.is_finite() {
            worst = Some(worst.map_or(dd, |w: f64| w.min(dd)));
        }
    }
    worst.map_or(0.0, neutral)
}

pub fn calmar(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let dd = max_drawdown(returns);
    if dd == 0.0 {
        return 0.0;
    }
    neutral(mean(returns) * periods_per_year / dd.abs())
}

/// The fixed summary of one run. Percent fields are already scaled by 100.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    pub annualized_return_pct: f64,
    pub volatility_pct: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub max_drawdown_pct: f64,
    pub calmar: f64,
    pub hit_ratio_pct: f64,
}

impl Metrics {
    pub const KEYS: [&'static str; 7] = [
        "Annualized Return (%)",
        "Volatility (%)",
        "Sharpe Ratio",
        "Sortino Ratio",
        "Max Drawdown (%)",
        "Calmar Ratio",
        "Hit Ratio (%)",
    ];

    pub fn compute(returns: &[f64], periods_per_year: f64) -> Self {
        Self {
            annualized_return_pct: 100.0 * annualized_return(returns, periods_per_year),
            volatility_pct: 100.0 * annualized_volatility(returns, periods_per_year),
            sharpe: sharpe(returns, periods_per_year),
            sortino: sortino(returns, periods_per_year),
            max_drawdown_pct: 100.0 * max_drawdown(returns),
            calmar: calmar(returns, periods_per_year),
            hit_ratio_pct: 100.0 * hit_ratio(returns),
        }
    }

    /// `(key, value)` pairs in reporting order.
    pub fn entries(&self) -> [(&'static str, f64); 7] {
        let values = [
            self.annualized_return_pct,
            self.volatility_pct,
            self.sharpe,
            self.sortino,
            self.max_drawdown_pct,
            self.calmar,
            self.hit_ratio_pct,
        ];
        let mut out = [("", 0.0); 7];
        for (slot, (key, value)) in out.iter_mut().zip(Self::KEYS.into_iter().zip(values)) {
            *slot = (key, value);
        }
        out
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

impl Serialize for Metrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Self::KEYS.len()))?;
        for (key, value) in self.entries() {
            map.serialize_entry(key, &value)?;
        }
        map.end()
    }
}
