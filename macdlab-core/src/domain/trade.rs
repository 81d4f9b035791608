//! TradeRecord: a completed Buy → Sell round-trip.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One executed Sell paired with the Buy leg it closed.
///
/// The first Sell of a run closes the initial holding, so its buy leg is the
/// first date and price of the whole series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Zero-based sequence number in execution order.
    pub sequence: usize,

    // ── Entry ──
    pub buy_date: NaiveDate,
    pub buy_price: f64,

    // ── Exit ──
    pub sell_date: NaiveDate,
    pub sell_price: f64,

    /// Whole units sold.
    pub units: u64,

    /// Money balance after the sell minus the cash value of the buy leg.
    pub profit: f64,
}

impl TradeRecord {
    pub fn is_loss(&self) -> bool {
        self.profit < 0.0
    }

    /// Calendar days the position was held.
    pub fn days_held(&self) -> i64 {
        (self.sell_date - self.buy_date).num_days()
    }
}
