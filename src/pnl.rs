//! Per-period PnL of a spread position, net of transaction costs.

use std::fmt;
use std::str::FromStr;

use crate::error::{BacktestError, Result};
use crate::series::{AlignedPrices, Series};
use crate::signal::Position;

/// How much capital one unit of the spread ties up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositioningMethod {
    /// Both legs held outright: `p1 + |h * p2|`.
    Gross,
    /// Margin netted against the larger leg: `max(p1, |h * p2|)`.
    Net,
    /// Levered gross cost: `(p1 + |h * p2|) * rate`.
    Margin { rate: f64 },
}

impl PositioningMethod {
    /// Builds a method from its name. `margin` requires a strictly positive rate.
    pub fn parse(name: &str, margin_rate: Option<f64>) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gross" => Ok(PositioningMethod::Gross),
            "net" => Ok(PositioningMethod::Net),
            "margin" => match margin_rate {
                Some(rate) if rate.is_finite() && rate > 0.0 => {
                    Ok(PositioningMethod::Margin { rate })
                }
                Some(rate) => Err(BacktestError::configuration(format!(
                    "margin_rate must be a positive number, got {rate}"
                ))),
                None => Err(BacktestError::configuration(
                    "positioning_method 'margin' requires margin_rate",
                )),
            },
            other => Err(BacktestError::configuration(format!(
                "invalid positioning_method '{other}', use 'gross', 'net' or 'margin'"
            ))),
        }
    }

    /// Capital per spread unit. Zero cost is undefined rather than an
    /// unbounded position size.
    pub fn unit_cost(&self, price1: f64, price2: f64, hedge_ratio: f64) -> f64 {
        let hedge_leg = (hedge_ratio * price2).abs();
        let cost = match self {
            PositioningMethod::Gross => price1 + hedge_leg,
            PositioningMethod::Net => price1.max(hedge_leg),
            PositioningMethod::Margin { rate } => (price1 + hedge_leg) * rate,
        };
        if cost == 0.0 {
            f64::NAN
        } else {
            cost
        }
    }
}

impl FromStr for PositioningMethod {
    type Err = BacktestError;

    /// Parses `gross` or `net`; `margin` needs a rate and goes through [`PositioningMethod::parse`].
    fn from_str(s: &str) -> Result<Self> {
        PositioningMethod::parse(s, None)
    }
}

impl fmt::Display for PositioningMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositioningMethod::Gross => write!(f, "gross"),
            PositioningMethod::Net => write!(f, "net"),
            PositioningMethod::Margin { rate } => write!(f, "margin({rate})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PnlParams {
    pub hedge_ratio: f64,
    /// Fraction of traded spread notional paid per entry.
    pub transaction_cost_rate: f64,
    /// Fixed capital deployed every period; never compounded.
    pub capital: f64,
    pub method: PositioningMethod,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PnlFrame {
    pub unit_cost: Series<f64>,
    pub units: Series<f64>,
    /// Position at `t` is non-flat and differs from `t - 1`.
    pub trade_flags: Series<bool>,
    pub transaction_cost: Series<f64>,
    pub pnl: Series<f64>,
}

impl PnlFrame {
    pub fn trade_count(&self) -> usize {
        self.trade_flags.values().iter().filter(|f| **f).count()
    }
}

/// Simulates the pnl of holding `positions` on `spread`.
///
/// The position is lagged once more here: a decision taken at `t` earns the
/// spread move from `t` to `t + 1`. Costs are charged one period after the
/// trade flag, when the trade executes.
pub fn simulate(
    prices: &AlignedPrices,
    spread: &Series<f64>,
    positions: &Series<Position>,
    params: &PnlParams,
) -> Result<PnlFrame> {
    prices.price1.ensure_aligned(spread, "prices vs spread")?;
    spread.ensure_aligned(positions, "spread vs positions")?;

    let index = spread.index().clone();
    let unit_cost: Vec<f64> = prices
        .price1
        .values()
        .iter()
        .zip(prices.price2.values())
        .map(|(p1, p2)| params.method.unit_cost(*p1, *p2, params.hedge_ratio))
        .collect();
    let units: Vec<f64> = unit_cost.iter().map(|c| params.capital / c).collect();

    let spread_change = spread.diff();
    let held = positions.lag(Position::Flat);

    let trade_flags: Vec<bool> = positions
        .values()
        .iter()
        .zip(held.values())
        .map(|(now, prev)| !now.is_flat() && now != prev)
        .collect();
    let executed = Series::new(index.clone(), trade_flags.clone())?.lag(false);

    let transaction_cost: Vec<f64> = executed
        .values()
        .iter()
        .zip(spread.values())
        .zip(&units)
        .map(|((traded, s), u)| {
            if *traded {
                params.transaction_cost_rate * s.abs() * u
            } else {
                0.0
            }
        })
        .collect();

    let pnl: Vec<f64> = held
        .values()
        .iter()
        .zip(&units)
        .zip(spread_change.values())
        .zip(&transaction_cost)
        .map(|(((pos, u), ds), cost)| pos.as_f64() * u * ds - cost)
        .collect();

    let frame = PnlFrame {
        unit_cost: Series::new(index.clone(), unit_cost)?,
        units: Series::new(index.clone(), units)?,
        trade_flags: Series::new(index.clone(), trade_flags)?,
        transaction_cost: Series::new(index.clone(), transaction_cost)?,
        pnl: Series::new(index, pnl)?,
    };
    log::debug!(
        "pnl simulated over {} rows ({} entries, method={})",
        frame.pnl.len(),
        frame.trade_count(),
        params.method
    );
    Ok(frame)
}

/// `pnl / capital`, restricted to finite values.
pub fn daily_returns(pnl: &Series<f64>, capital: f64) -> Series<f64> {
    pnl.map(|v| v / capital).drop_non_finite()
}
