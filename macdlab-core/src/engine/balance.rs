//! Balance snapshots and the per-date forward-filled balance history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Operation, PriceSeries};

/// Balances right after an active, non-disabled event was replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub date: NaiveDate,
    pub operation: Operation,
    pub instrument_balance: u64,
    pub money_balance: f64,
    /// False when the guard failed and the previous balances carried over.
    pub executed: bool,
}

/// Balances on one series date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub price: f64,
    pub instrument_balance: u64,
    pub money_balance: f64,
}

impl BalancePoint {
    pub fn value(&self) -> f64 {
        self.money_balance + self.instrument_balance as f64 * self.price
    }
}

/// Expand snapshots into one point per series date.
///
/// A step function: balances hold constant from one snapshot to the next,
/// starting from `initial_balance` units and no cash. Snapshots must be in
/// ascending date order; dates not in the series are ignored.
pub fn forward_fill(
    series: &PriceSeries,
    initial_balance: u64,
    snapshots: &[BalanceSnapshot],
) -> Vec<BalancePoint> {
    let mut instrument = initial_balance;
    let mut money = 0.0;
    let mut pending = snapshots.iter().peekable();

    series
        .points()
        .iter()
        .map(|point| {
            while let Some(snap) = pending.next_if(|s| s.date <= point.date) {
                instrument = snap.instrument_balance;
                money = snap.money_balance;
            }
            BalancePoint {
                date: point.date,
                price: point.price,
                instrument_balance: instrument,
                money_balance: money,
            }
        })
        .collect()
}
