//! Trading operations and the per-date signal event record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What the strategy wants to do on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Operation {
    /// Buy and Sell are active operations; Hold is the absence of a signal.
    pub fn is_active(self) -> bool {
        match self {
            Operation::Buy | Operation::Sell => true,
            Operation::Hold => false,
        }
    }

    /// The closing leg type for a Buy or Sell. Hold has no opposite.
    pub fn opposite(self) -> Operation {
        match self {
            Operation::Buy => Operation::Sell,
            Operation::Sell => Operation::Buy,
            Operation::Hold => Operation::Hold,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Buy => "BUY",
            Operation::Sell => "SELL",
            Operation::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger row. Exactly one exists per series date.
///
/// Hold rows are placeholders with no price or indicator value. The
/// `predecessor` is a date key into the same ledger (the nearest earlier
/// event of the opposite type), never a live reference: the referenced event
/// may later be disabled without being removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub date: NaiveDate,
    pub operation: Operation,
    /// Signal-line value on this date.
    pub indicator_value: Option<f64>,
    /// Closing price on this date.
    pub price: Option<f64>,
    pub predecessor: Option<NaiveDate>,
    pub disabled: bool,
    /// Realized round-trip profit, set on executed Sell events only.
    pub profit: Option<f64>,
}

impl SignalEvent {
    pub fn hold(date: NaiveDate) -> Self {
        Self {
            date,
            operation: Operation::Hold,
            indicator_value: None,
            price: None,
            predecessor: None,
            disabled: false,
            profit: None,
        }
    }

    pub fn fired(
        date: NaiveDate,
        operation: Operation,
        indicator_value: f64,
        price: f64,
        predecessor: Option<NaiveDate>,
    ) -> Self {
        Self {
            date,
            operation,
            indicator_value: Some(indicator_value),
            price: Some(price),
            predecessor,
            disabled: false,
            profit: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.operation.is_active()
    }

    /// Active and not disabled: part of the filtered ledger.
    pub fn is_live(&self) -> bool {
        self.is_active() && !self.disabled
    }

    /// Whole days between this event and its predecessor.
    pub fn days_since_predecessor(&self) -> Option<i64> {
        self.predecessor.map(|prev| (self.date - prev).num_days())
    }
}
