//! MACD / Signal crossover detection.
//!
//! Fires Buy when MACD crosses above Signal (upward cross).
//! Fires Sell when MACD crosses below Signal (downward cross).
//!
//! Both comparisons are strict on both bars, so a touch (equality) is not a
//! cross, and any undefined (NaN) value on either bar yields Hold. Index 0
//! has no previous bar and is always Hold.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Ledger, Operation, PriceSeries, SignalEvent};
use crate::indicators::MacdSeries;

/// Shape errors. Programmer errors: fail fast, abort only this instrument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrossoverError {
    #[error(
        "misaligned series: dates={dates}, prices={prices}, macd={macd}, signal={signal}"
    )]
    MisalignedSeries {
        dates: usize,
        prices: usize,
        macd: usize,
        signal: usize,
    },

    #[error("empty input series")]
    EmptySeries,
}

/// Crossover state machine over a MACD/Signal pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossoverDetector {
    /// Gate: ignore upward crosses until the first Sell has fired.
    pub require_prior_sell: bool,
}

impl Default for CrossoverDetector {
    fn default() -> Self {
        Self {
            require_prior_sell: true,
        }
    }
}

impl CrossoverDetector {
    pub fn new(require_prior_sell: bool) -> Self {
        Self { require_prior_sell }
    }

    /// Classify the bar at `index` from the current and previous values.
    pub fn classify(macd: &[f64], signal: &[f64], index: usize) -> Operation {
        if index == 0 || index >= macd.len() || index >= signal.len() {
            return Operation::Hold;
        }
        let (m, s) = (macd[index], signal[index]);
        let (m_prev, s_prev) = (macd[index - 1], signal[index - 1]);

        if m > s && m_prev < s_prev {
            Operation::Buy
        } else if m < s && m_prev > s_prev {
            Operation::Sell
        } else {
            Operation::Hold
        }
    }

    /// Build the full per-date ledger.
    pub fn detect(
        &self,
        dates: &[NaiveDate],
        prices: &[f64],
        macd: &[f64],
        signal: &[f64],
    ) -> Result<Ledger, CrossoverError> {
        let n = dates.len();
        if prices.len() != n || macd.len() != n || signal.len() != n {
            return Err(CrossoverError::MisalignedSeries {
                dates: n,
                prices: prices.len(),
                macd: macd.len(),
                signal: signal.len(),
            });
        }
        if n == 0 {
            return Err(CrossoverError::EmptySeries);
        }

        let mut events = Vec::with_capacity(n);
        let mut has_sell = false;
        let mut prev_buy: Option<NaiveDate> = None;
        let mut prev_sell: Option<NaiveDate> = None;

        for (i, &date) in dates.iter().enumerate() {
            let event = match Self::classify(macd, signal, i) {
                Operation::Buy if has_sell || !self.require_prior_sell => {
                    let event =
                        SignalEvent::fired(date, Operation::Buy, signal[i], prices[i], prev_sell);
                    prev_buy = Some(date);
                    event
                }
                Operation::Sell => {
                    let event =
                        SignalEvent::fired(date, Operation::Sell, signal[i], prices[i], prev_buy);
                    prev_sell = Some(date);
                    has_sell = true;
                    event
                }
                Operation::Buy | Operation::Hold => SignalEvent::hold(date),
            };
            events.push(event);
        }

        Ok(Ledger::from_events(events))
    }

    /// Convenience wrapper over a price series and its MACD output.
    pub fn detect_series(
        &self,
        series: &PriceSeries,
        macd: &MacdSeries,
    ) -> Result<Ledger, CrossoverError> {
        self.detect(&series.dates(), &series.prices(), &macd.macd, &macd.signal)
    }
}
