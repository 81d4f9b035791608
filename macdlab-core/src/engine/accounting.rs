//! Cash / instrument holdings for the two-asset portfolio.
//!
//! Units are whole numbers: a buy spends `floor(money / price) * price` and
//! keeps the remainder as cash, so neither balance can go negative.

use serde::{Deserialize, Serialize};

/// Result of an executed buy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuyFill {
    pub units: u64,
    pub cost: f64,
}

/// Result of an executed sell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SellFill {
    pub units: u64,
    pub proceeds: f64,
    /// Money balance after the sell minus the cost of the last buy leg.
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holdings {
    instrument: u64,
    money: f64,
    /// Cash value of the most recent buy leg (profit reference).
    last_cost: f64,
}

impl Holdings {
    /// Start fully invested: `units` held, no cash. The opening position is
    /// valued at `opening_price` for the first sell's profit.
    pub fn new(units: u64, opening_price: f64) -> Self {
        Self {
            instrument: units,
            money: 0.0,
            last_cost: units as f64 * opening_price,
        }
    }

    pub fn instrument(&self) -> u64 {
        self.instrument
    }

    pub fn money(&self) -> f64 {
        self.money
    }

    pub fn last_cost(&self) -> f64 {
        self.last_cost
    }

    /// Spend all cash on whole units. No-op unless cash is positive and at
    /// least one unit is affordable.
    pub fn buy(&mut self, price: f64) -> Option<BuyFill> {
        if self.money <= 0.0 || price <= 0.0 {
            return None;
        }
        let units = (self.money / price).floor();
        if units < 1.0 {
            return None;
        }
        let cost = units * price;
        self.money = (self.money - cost).max(0.0);
        self.instrument += units as u64;
        self.last_cost = cost;
        Some(BuyFill {
            units: units as u64,
            cost,
        })
    }

    /// Liquidate all units. No-op when nothing is held.
    pub fn sell(&mut self, price: f64) -> Option<SellFill> {
        if self.instrument == 0 {
            return None;
        }
        let units = self.instrument;
        let proceeds = units as f64 * price;
        self.money += proceeds;
        self.instrument = 0;
        Some(SellFill {
            units,
            proceeds,
            profit: self.money - self.last_cost,
        })
    }

    /// Money plus units marked at `price`.
    pub fn value(&self, price: f64) -> f64 {
        self.money + self.instrument as f64 * price
    }
}
