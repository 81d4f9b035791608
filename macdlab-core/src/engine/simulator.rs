//! Portfolio simulator: replays the filtered ledger against cash and
//! instrument holdings.
//!
//! The run starts fully invested (`initial_balance` units, no cash). Each
//! active, non-disabled event is replayed in date order:
//! - Buy spends all cash on whole units (needs cash for at least one unit).
//! - Sell liquidates every unit; profit = money after the sell minus the
//!   cash value of the last buy leg, written back onto the Sell event.
//! - A failed guard is a no-op; balances carry forward.
//!
//! The simulator never touches an event's type, date or `disabled` flag.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::accounting::Holdings;
use super::balance::{forward_fill, BalancePoint, BalanceSnapshot};
use crate::domain::{Ledger, Operation, PriceSeries, TradeRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSimulator {
    /// Units held on the first date.
    pub initial_balance: u64,
}

impl Default for PortfolioSimulator {
    fn default() -> Self {
        Self {
            initial_balance: 1000,
        }
    }
}

/// Everything a simulation run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub initial_balance: u64,
    pub snapshots: Vec<BalanceSnapshot>,
    pub trades: Vec<TradeRecord>,
    /// `initial_balance * first price`.
    pub initial_value: f64,
    /// Money plus units marked at the last price.
    pub final_value: f64,
    pub profit: f64,
}

impl SimulationResult {
    fn empty(initial_balance: u64) -> Self {
        Self {
            initial_balance,
            snapshots: Vec::new(),
            trades: Vec::new(),
            initial_value: 0.0,
            final_value: 0.0,
            profit: 0.0,
        }
    }

    pub fn executed_count(&self) -> usize {
        self.snapshots.iter().filter(|s| s.executed).count()
    }

    /// Per-date balances for charting.
    pub fn balance_history(&self, series: &PriceSeries) -> Vec<BalancePoint> {
        forward_fill(series, self.initial_balance, &self.snapshots)
    }
}

impl PortfolioSimulator {
    pub fn new(initial_balance: u64) -> Self {
        Self { initial_balance }
    }

    /// Replay `ledger` over `series`. Never fails; an empty series yields a
    /// zero result.
    pub fn run(&self, series: &PriceSeries, ledger: &mut Ledger) -> SimulationResult {
        ledger.reset_profits();

        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return SimulationResult::empty(self.initial_balance);
        };

        let mut holdings = Holdings::new(self.initial_balance, first.price);
        // The initial position counts as bought on the first date.
        let mut open_leg: Option<(NaiveDate, f64)> = Some((first.date, first.price));
        let mut snapshots = Vec::new();
        let mut trades: Vec<TradeRecord> = Vec::new();

        for idx in ledger.active_indices() {
            let Some(event) = ledger.get(idx) else {
                continue;
            };
            if event.disabled {
                continue;
            }
            let (date, operation) = (event.date, event.operation);
            let Some(price) = event.price else {
                continue;
            };

            let executed = match operation {
                Operation::Buy => match holdings.buy(price) {
                    Some(fill) => {
                        debug!(%date, price, units = fill.units, cost = fill.cost, "buy");
                        open_leg = Some((date, price));
                        true
                    }
                    None => false,
                },
                Operation::Sell => match holdings.sell(price) {
                    Some(fill) => {
                        debug!(%date, price, units = fill.units, profit = fill.profit, "sell");
                        if let Some(e) = ledger.get_mut(idx) {
                            e.profit = Some(fill.profit);
                        }
                        let (buy_date, buy_price) =
                            open_leg.take().unwrap_or((first.date, first.price));
                        trades.push(TradeRecord {
                            sequence: trades.len(),
                            buy_date,
                            buy_price,
                            sell_date: date,
                            sell_price: price,
                            units: fill.units,
                            profit: fill.profit,
                        });
                        true
                    }
                    None => false,
                },
                Operation::Hold => false,
            };

            snapshots.push(BalanceSnapshot {
                date,
                operation,
                instrument_balance: holdings.instrument(),
                money_balance: holdings.money(),
                executed,
            });
        }

        let initial_value = self.initial_balance as f64 * first.price;
        let final_value = holdings.value(last.price);

        SimulationResult {
            initial_balance: self.initial_balance,
            snapshots,
            trades,
            initial_value,
            final_value,
            profit: final_value - initial_value,
        }
    }
}
