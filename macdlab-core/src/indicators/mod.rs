//! Smoothing and MACD indicators.
//!
//! Every indicator output is aligned to its input: same length, with
//! `f64::NAN` marking positions that are undefined (warmup, or any window
//! that touched an undefined input).

pub mod ema;
pub mod macd;

pub use ema::{weighted_ema, RecursiveEma, SmoothedAverage, Smoother, SmoothingMethod};
pub use macd::{Macd, MacdParams, MacdSeries};

use thiserror::Error;

/// Errors from the indicator stage. Fatal for one instrument's run only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("invalid smoothing period {period} for series of length {len}")]
    InvalidPeriod { period: usize, len: usize },

    #[error("empty input series")]
    EmptySeries,

    #[error("invalid MACD parameters: {0}")]
    InvalidParams(String),
}

/// Number of defined (non-NaN) values in an indicator output.
pub fn defined_count(values: &[f64]) -> usize {
    values.iter().filter(|v| !v.is_nan()).count()
}

/// Element-wise `a - b`; NaN wherever either side is undefined.
pub fn difference(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
