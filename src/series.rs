//! Time-indexed series shared by every pipeline stage.
//!
//! A [`TimeIndex`] is reference counted so the derived series of one run
//! (spread, z-score, positions, pnl, ...) share a single allocation, and
//! alignment checks between stages are usually a pointer comparison.

use chrono::NaiveDateTime;
use std::sync::Arc;

use crate::error::{BacktestError, Result};

pub type Timestamp = NaiveDateTime;

/// Unique, strictly increasing timestamps.
#[derive(Debug, Clone)]
pub struct TimeIndex(Arc<[Timestamp]>);

impl TimeIndex {
    pub fn new(stamps: Vec<Timestamp>) -> Result<Self> {
        if let Some(pos) = stamps.windows(2).position(|w| w[0] >= w[1]) {
            return Err(BacktestError::alignment(format!(
                "timestamps must be strictly increasing: {} is followed by {}",
                stamps[pos],
                stamps[pos + 1]
            )));
        }
        Ok(Self(stamps.into()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Timestamp] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Timestamp> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&Timestamp> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Timestamp> {
        self.0.last()
    }

    pub fn same_as(&self, other: &TimeIndex) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl PartialEq for TimeIndex {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

/// Values paired one-to-one with a [`TimeIndex`].
#[derive(Debug, Clone, PartialEq)]
pub struct Series<T> {
    index: TimeIndex,
    values: Vec<T>,
}

impl<T> Series<T> {
    pub fn new(index: TimeIndex, values: Vec<T>) -> Result<Self> {
        if index.len() != values.len() {
            return Err(BacktestError::alignment(format!(
                "index has {} timestamps but {} values were supplied",
                index.len(),
                values.len()
            )));
        }
        Ok(Self { index, values })
    }

    /// Caller guarantees `values.len() == index.len()`.
    pub(crate) fn from_parts(index: TimeIndex, values: Vec<T>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        Self { index, values }
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Timestamp, &T)> {
        self.index.iter().zip(self.values.iter())
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Series<U> {
        Series::from_parts(self.index.clone(), self.values.iter().map(f).collect())
    }

    /// Fails with an alignment error unless both series share one index.
    pub fn ensure_aligned<U>(&self, other: &Series<U>, what: &str) -> Result<()> {
        if self.index.same_as(&other.index) {
            Ok(())
        } else {
            Err(BacktestError::alignment(format!(
                "{what}: series indices differ ({} vs {} rows)",
                self.len(),
                other.len()
            )))
        }
    }
}

impl<T: Clone> Series<T> {
    /// Shifts values one period forward; the first slot takes `fill`.
    pub fn lag(&self, fill: T) -> Series<T> {
        let mut values = Vec::with_capacity(self.values.len());
        if !self.values.is_empty() {
            values.push(fill);
            values.extend_from_slice(&self.values[..self.values.len() - 1]);
        }
        Series::from_parts(self.index.clone(), values)
    }
}

impl Series<f64> {
    /// First difference; undefined in the first period.
    pub fn diff(&self) -> Series<f64> {
        let mut values = Vec::with_capacity(self.values.len());
        if !self.values.is_empty() {
            values.push(f64::NAN);
            values.extend(self.values.windows(2).map(|w| w[1] - w[0]));
        }
        Series::from_parts(self.index.clone(), values)
    }

    /// Trailing-window statistic. Undefined until `window` periods are
    /// available, and whenever the window holds an undefined value.
    fn rolling(&self, window: usize, stat: impl Fn(&[f64]) -> f64) -> Series<f64> {
        let values = (0..self.values.len())
            .map(|i| {
                if window == 0 || i + 1 < window {
                    return f64::NAN;
                }
                let slice = &self.values[i + 1 - window..=i];
                if slice.iter().any(|v| v.is_nan()) {
                    f64::NAN
                } else {
                    stat(slice)
                }
            })
            .collect();
        Series::from_parts(self.index.clone(), values)
    }

    pub fn rolling_mean(&self, window: usize) -> Series<f64> {
        self.rolling(window, mean)
    }

    pub fn rolling_std(&self, window: usize) -> Series<f64> {
        self.rolling(window, sample_std)
    }

    /// Running sum where undefined entries contribute nothing.
    pub fn cumsum(&self) -> Series<f64> {
        let mut acc = 0.0;
        let values = self
            .values
            .iter()
            .map(|v| {
                if !v.is_nan() {
                    acc += v;
                }
                acc
            })
            .collect();
        Series::from_parts(self.index.clone(), values)
    }

    /// Keeps only finite values, narrowing the index accordingly.
    pub fn drop_non_finite(&self) -> Series<f64> {
        let (stamps, values): (Vec<Timestamp>, Vec<f64>) = self
            .iter()
            .filter(|(_, v)| v.is_finite())
            .map(|(ts, v)| (*ts, *v))
            .unzip();
        Series::from_parts(TimeIndex(stamps.into()), values)
    }

    /// Looks every timestamp of `index` up in this series.
    pub fn reindex(&self, index: &TimeIndex) -> Vec<Option<f64>> {
        let mut own = self.iter().peekable();
        index
            .iter()
            .map(|ts| {
                while own.peek().is_some_and(|(own_ts, _)| *own_ts < ts) {
                    own.next();
                }
                match own.peek() {
                    Some((own_ts, v)) if *own_ts == ts => Some(**v),
                    _ => None,
                }
            })
            .collect()
    }
}

/// Arithmetic mean; not-a-number for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); not-a-number below two values.
/// Identical values give exactly zero.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    if values.iter().all(|v| *v == values[0]) {
        return 0.0;
    }
    let m = mean(values);
    let var = values
        .iter()
        .map(|v| {
            let d = v - m;
            d * d
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;
    var.sqrt()
}

/// Price history of one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub label: String,
    pub prices: Series<f64>,
}

impl PriceSeries {
    pub fn new(label: impl Into<String>, stamps: Vec<Timestamp>, values: Vec<f64>) -> Result<Self> {
        let index = TimeIndex::new(stamps)?;
        Ok(Self {
            label: label.into(),
            prices: Series::new(index, values)?,
        })
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Two price series restricted to their common, fully populated timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPrices {
    pub label1: String,
    pub label2: String,
    pub price1: Series<f64>,
    pub price2: Series<f64>,
}

impl AlignedPrices {
    /// Intersects both indices and drops rows where either price is missing.
    pub fn align(leg1: &PriceSeries, leg2: &PriceSeries) -> Result<Self> {
        let a = leg1.prices.values();
        let b = leg2.prices.values();
        let ia = leg1.prices.index().as_slice();
        let ib = leg2.prices.index().as_slice();

        let mut stamps = Vec::with_capacity(ia.len().min(ib.len()));
        let mut p1 = Vec::with_capacity(stamps.capacity());
        let mut p2 = Vec::with_capacity(stamps.capacity());
        let (mut i, mut j) = (0, 0);
        while i < ia.len() && j < ib.len() {
            match ia[i].cmp(&ib[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    if a[i].is_finite() && b[j].is_finite() {
                        stamps.push(ia[i]);
                        p1.push(a[i]);
                        p2.push(b[j]);
                    }
                    i += 1;
                    j += 1;
                }
            }
        }

        if stamps.is_empty() {
            return Err(BacktestError::alignment(format!(
                "{} and {} have no common timestamps with prices on both legs",
                leg1.label, leg2.label
            )));
        }

        let index = TimeIndex(stamps.into());
        Ok(Self {
            label1: leg1.label.clone(),
            label2: leg2.label.clone(),
            price1: Series::from_parts(index.clone(), p1),
            price2: Series::from_parts(index, p2),
        })
    }

    pub fn index(&self) -> &TimeIndex {
        self.price1.index()
    }

    pub fn len(&self) -> usize {
        self.price1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.price1.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_stamps(n: usize) -> Vec<Timestamp> {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    (0..n)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect()
}

#[cfg(test)]
pub(crate) fn test_series(values: &[f64]) -> Series<f64> {
    let index = TimeIndex::new(test_stamps(values.len())).unwrap();
    Series::new(index, values.to_vec()).unwrap()
}
