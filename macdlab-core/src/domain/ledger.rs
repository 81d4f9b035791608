//! Ledger: the owned, chronological sequence of signal events.
//!
//! Built once by the crossover detector, then mutated in place: the
//! holding-period filter flips `disabled`, the simulator writes `profit` on
//! Sell rows. Nothing else changes after construction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::event::{Operation, SignalEvent};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("ledger dates out of order: {current} follows {previous}")]
    UnsortedDates {
        previous: NaiveDate,
        current: NaiveDate,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    events: Vec<SignalEvent>,
}

impl Ledger {
    /// Build a ledger from events in strictly ascending date order.
    pub fn new(events: Vec<SignalEvent>) -> Result<Self, LedgerError> {
        if let Some(w) = events.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(LedgerError::UnsortedDates {
                previous: w[0].date,
                current: w[1].date,
            });
        }
        Ok(Self { events })
    }

    /// Unchecked constructor for events taken one per bar from a validated
    /// `PriceSeries`.
    pub(crate) fn from_events(events: Vec<SignalEvent>) -> Self {
        debug_assert!(events.windows(2).all(|w| w[0].date < w[1].date));
        Self { events }
    }

    pub fn events(&self) -> &[SignalEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SignalEvent> {
        self.events.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut SignalEvent> {
        self.events.get_mut(index)
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.events.binary_search_by_key(&date, |e| e.date).ok()
    }

    /// Resolve an event's predecessor key to the referenced event.
    pub fn predecessor_of(&self, event: &SignalEvent) -> Option<&SignalEvent> {
        event
            .predecessor
            .and_then(|date| self.index_of(date))
            .and_then(|idx| self.events.get(idx))
    }

    /// Indices of Buy/Sell rows in chronological order, disabled or not.
    pub fn active_indices(&self) -> Vec<usize> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_active())
            .map(|(i, _)| i)
            .collect()
    }

    /// The filtered ledger: active, non-disabled events in date order.
    pub fn filtered(&self) -> impl Iterator<Item = &SignalEvent> + '_ {
        self.events.iter().filter(|e| e.is_live())
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.events.iter().filter(|e| e.operation == operation).count()
    }

    pub fn disabled_count(&self) -> usize {
        self.events.iter().filter(|e| e.disabled).count()
    }

    pub fn reset_disabled(&mut self) {
        for event in &mut self.events {
            event.disabled = false;
        }
    }

    pub fn reset_profits(&mut self) {
        for event in &mut self.events {
            event.profit = None;
        }
    }
}
