//! Exponential smoothing.
//!
//! Two formulas are provided because they give different signal timing:
//!
//! - [`SmoothedAverage`] (default): finite weighted window. For each
//!   `row >= period`, the trailing `period + 1` samples are weighted with
//!   `alpha^i` (most recent sample `i = 0`), `alpha = 1 - 2 / (period + 1)`,
//!   and normalised by the sum of weights. Recomputed from scratch per row,
//!   O(n * period). Lookback: period.
//! - [`RecursiveEma`]: textbook recursion `EMA[t] = k * x[t] + (1 - k) * EMA[t-1]`
//!   with `k = 2 / (period + 1)`, seeded with the SMA of the first `period`
//!   values. Lookback: period - 1.

use super::IndicatorError;

/// A smoothing indicator over an arbitrary numeric series.
pub trait Smoother: Send + Sync {
    /// Human-readable name (e.g., "wema_12").
    fn name(&self) -> &str;

    fn period(&self) -> usize;

    /// Number of leading positions that are always undefined.
    fn lookback(&self) -> usize;

    /// Total: returns an all-NaN output instead of failing when the series
    /// is too short.
    fn compute(&self, values: &[f64]) -> Vec<f64>;

    /// Like `compute`, but reports empty or too-short input.
    fn compute_checked(&self, values: &[f64]) -> Result<Vec<f64>, IndicatorError> {
        if values.is_empty() {
            return Err(IndicatorError::EmptySeries);
        }
        if self.period() >= values.len() {
            return Err(IndicatorError::InvalidPeriod {
                period: self.period(),
                len: values.len(),
            });
        }
        Ok(self.compute(values))
    }
}

/// Which smoothing formula the MACD pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMethod {
    #[default]
    WeightedWindow,
    Recursive,
}

impl SmoothingMethod {
    pub fn smoother(self, period: usize) -> Result<Box<dyn Smoother>, IndicatorError> {
        Ok(match self {
            SmoothingMethod::WeightedWindow => Box::new(SmoothedAverage::new(period)?),
            SmoothingMethod::Recursive => Box::new(RecursiveEma::new(period)?),
        })
    }
}

/// Finite weighted-window exponential average.
#[derive(Debug, Clone)]
pub struct SmoothedAverage {
    period: usize,
    name: String,
}

impl SmoothedAverage {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period < 1 {
            return Err(IndicatorError::InvalidPeriod { period, len: 0 });
        }
        Ok(Self {
            period,
            name: format!("wema_{period}"),
        })
    }
}

impl Smoother for SmoothedAverage {
    fn name(&self) -> &str {
        &self.name
    }

    fn period(&self) -> usize {
        self.period
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        weighted_ema(values, self.period)
    }
}

/// Compute the finite weighted-window average of `values`.
///
/// Positions `< period` are NaN. `period == 0` or `period >= len` yields an
/// all-NaN output.
pub fn weighted_ema(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || period >= n {
        return result;
    }

    let alpha = 1.0 - 2.0 / (period as f64 + 1.0);
    // powi(0) is 1 even for alpha == 0 (period 1).
    let weights: Vec<f64> = (0..=period).map(|i| alpha.powi(i as i32)).collect();
    let denominator: f64 = weights.iter().sum();

    for (row, slot) in result.iter_mut().enumerate().skip(period) {
        let numerator: f64 = weights
            .iter()
            .enumerate()
            .map(|(i, w)| values[row - i] * w)
            .sum();
        *slot = numerator / denominator;
    }

    result
}

/// Textbook recursive EMA seeded with an SMA.
#[derive(Debug, Clone)]
pub struct RecursiveEma {
    period: usize,
    name: String,
}

impl RecursiveEma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period < 1 {
            return Err(IndicatorError::InvalidPeriod { period, len: 0 });
        }
        Ok(Self {
            period,
            name: format!("ema_{period}"),
        })
    }
}

impl Smoother for RecursiveEma {
    fn name(&self) -> &str {
        &self.name
    }

    fn period(&self) -> usize {
        self.period
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        recursive_ema(values, self.period)
    }
}

/// Recursive EMA over a series that may start with undefined values.
///
/// The seed window begins at the first defined value, so a MACD line with
/// a NaN warmup can be smoothed again. A NaN after the seed taints the rest.
pub fn recursive_ema(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return result;
    }
    let start = match values.iter().position(|v| !v.is_nan()) {
        Some(start) => start,
        None => return result,
    };
    if n - start < period {
        return result;
    }

    let k = 2.0 / (period as f64 + 1.0);

    // Seed: SMA of the first `period` defined values
    let mut sum = 0.0;
    for &v in &values[start..start + period] {
        if v.is_nan() {
            return result;
        }
        sum += v;
    }
    let seed_index = start + period - 1;
    let mut prev = sum / period as f64;
    result[seed_index] = prev;

    for i in (seed_index + 1)..n {
        if values[i].is_nan() {
            return result;
        }
        let ema = k * values[i] + (1.0 - k) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}
