//! Holding-period filter.
//!
//! Disables signal pairs whose distance to the predecessor signal is shorter
//! than a minimum number of days, modelling a trader who ignores rapid
//! reversals. Operates in place on the ledger's `disabled` flags only.
//!
//! Walk order is the chronological list of active (Buy/Sell) events,
//! starting at the third one; the first two are never filtered. When an
//! event triggers, it is disabled together with the first later active
//! event of the opposite type (its closing leg). Cancellations cascade by
//! index look-ahead and are never undone within a pass. Predecessor keys
//! are left untouched, so a later event may still measure its gap against
//! a disabled predecessor.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Ledger;

/// Position in the active-event list where filtering begins.
pub const FIRST_FILTERED: usize = 2;

/// One triggered cancellation: the event that violated the threshold and
/// the closing leg disabled with it (if any).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    pub trigger: NaiveDate,
    pub gap_days: i64,
    pub closing_leg: Option<NaiveDate>,
}

/// Summary of a filter pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReport {
    /// Active events whose gap was evaluated.
    pub examined: usize,
    /// Events disabled in total (triggers plus closing legs).
    pub disabled: usize,
    pub cancellations: Vec<Cancellation>,
}

impl FilterReport {
    pub fn triggered(&self) -> usize {
        self.cancellations.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingPeriodFilter {
    /// Δ: minimum whole days between an event and its predecessor.
    pub min_gap_days: i64,
}

impl HoldingPeriodFilter {
    pub fn new(min_gap_days: i64) -> Self {
        Self { min_gap_days }
    }

    /// Reset all `disabled` flags, then run one pass. Never fails.
    pub fn apply(&self, ledger: &mut Ledger) -> FilterReport {
        ledger.reset_disabled();

        let active = ledger.active_indices();
        let mut report = FilterReport::default();

        for pos in FIRST_FILTERED..active.len() {
            let idx = active[pos];
            let Some(event) = ledger.get(idx) else {
                continue;
            };
            if event.disabled {
                continue;
            }
            // No predecessor, nothing to measure against.
            let Some(gap) = event.days_since_predecessor() else {
                continue;
            };
            report.examined += 1;
            if gap >= self.min_gap_days {
                continue;
            }

            let trigger = event.date;
            let closing_type = event.operation.opposite();
            if let Some(e) = ledger.get_mut(idx) {
                e.disabled = true;
                report.disabled += 1;
            }

            let closing_idx = active[pos + 1..]
                .iter()
                .copied()
                .find(|&j| ledger.get(j).is_some_and(|e| e.operation == closing_type));

            let mut closing_leg = None;
            if let Some(e) = closing_idx.and_then(|j| ledger.get_mut(j)) {
                if !e.disabled {
                    e.disabled = true;
                    report.disabled += 1;
                }
                closing_leg = Some(e.date);
            }

            debug!(
                %trigger,
                gap_days = gap,
                min_gap_days = self.min_gap_days,
                closing_leg = ?closing_leg,
                "signal pair cancelled"
            );
            report.cancellations.push(Cancellation {
                trigger,
                gap_days: gap,
                closing_leg,
            });
        }

        report
    }
}
