//! MACD line and Signal line.
//!
//! MACD   = smooth(price, fast) - smooth(price, slow)
//! Signal = smooth(MACD, signal)
//!
//! With the weighted-window smoother and default periods (12/26/9) the MACD
//! line is defined from index 26 and the Signal line from index 35.

use serde::{Deserialize, Serialize};

use super::ema::SmoothingMethod;
use super::{difference, IndicatorError};
use crate::domain::PriceSeries;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    #[serde(default)]
    pub smoothing: SmoothingMethod,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
            smoothing: SmoothingMethod::default(),
        }
    }
}

impl MacdParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.fast < 1 || self.slow < 1 || self.signal < 1 {
            return Err(IndicatorError::InvalidParams(format!(
                "periods must be >= 1 (fast={}, slow={}, signal={})",
                self.fast, self.slow, self.signal
            )));
        }
        if self.fast >= self.slow {
            return Err(IndicatorError::InvalidParams(format!(
                "fast period {} must be < slow period {}",
                self.fast, self.slow
            )));
        }
        Ok(())
    }
}

/// Indicator series aligned to the price index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

impl MacdSeries {
    pub fn len(&self) -> usize {
        self.macd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }

    /// MACD minus Signal (the histogram).
    pub fn histogram(&self) -> Vec<f64> {
        difference(&self.macd, &self.signal)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Macd {
    params: MacdParams,
}

impl Macd {
    pub fn new(params: MacdParams) -> Result<Self, IndicatorError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &MacdParams {
        &self.params
    }

    pub fn compute(&self, series: &PriceSeries) -> Result<MacdSeries, IndicatorError> {
        self.compute_values(&series.prices())
    }

    /// Compute over raw closing prices.
    ///
    /// Fails when the input is empty or not longer than the slow period. A
    /// series long enough for the MACD line but too short for the Signal
    /// line is not an error: the Signal line is simply all undefined.
    pub fn compute_values(&self, prices: &[f64]) -> Result<MacdSeries, IndicatorError> {
        let method = self.params.smoothing;
        let fast = method.smoother(self.params.fast)?;
        let slow = method.smoother(self.params.slow)?;
        let signal = method.smoother(self.params.signal)?;

        let ema_fast = fast.compute_checked(prices)?;
        let ema_slow = slow.compute_checked(prices)?;
        let macd = difference(&ema_fast, &ema_slow);
        let signal = signal.compute(&macd);

        Ok(MacdSeries {
            ema_fast,
            ema_slow,
            macd,
            signal,
        })
    }
}
