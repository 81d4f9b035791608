//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Smoothing: n - p defined values, each a convex combination of its window
//! 2. Crossover: chronological ledger, predecessors are earlier opposite events
//! 3. Filter: Δ = 0 is a no-op; every trigger takes its closing leg with it
//! 4. Simulator: balances never go negative

use chrono::NaiveDate;
use macdlab_core::domain::{Ledger, Operation, PriceSeries};
use macdlab_core::indicators::{defined_count, weighted_ema};
use macdlab_core::{CrossoverDetector, HoldingPeriodFilter, PortfolioSimulator};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_values(min_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..500.0_f64, min_len..200)
}

/// Strictly increasing dates with gaps of 1..=5 days.
fn arb_dates(n: usize) -> impl Strategy<Value = Vec<NaiveDate>> {
    prop::collection::vec(1..=5_i64, n).prop_map(|gaps| {
        let mut date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        gaps.into_iter()
            .map(|g| {
                date += chrono::Duration::days(g);
                date
            })
            .collect()
    })
}

/// Dates, prices and MACD/Signal lines of equal length.
fn arb_inputs() -> impl Strategy<Value = (Vec<NaiveDate>, Vec<f64>, Vec<f64>, Vec<f64>)> {
    (2..150_usize).prop_flat_map(|n| {
        (
            arb_dates(n),
            prop::collection::vec(1.0..100.0_f64, n),
            prop::collection::vec(-2.0..2.0_f64, n),
            prop::collection::vec(-2.0..2.0_f64, n),
        )
    })
}

fn detect(
    dates: &[NaiveDate],
    prices: &[f64],
    macd: &[f64],
    signal: &[f64],
    gated: bool,
) -> Ledger {
    CrossoverDetector::new(gated)
        .detect(dates, prices, macd, signal)
        .unwrap()
}

// ── 1. Smoothing ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn smoothing_defines_n_minus_p_values(values in arb_values(2), p in 1..40_usize) {
        let out = weighted_ema(&values, p);
        prop_assert_eq!(out.len(), values.len());
        let expected = values.len().saturating_sub(p);
        prop_assert_eq!(defined_count(&out), expected);
    }

    /// Normalised weights: every output lies within its window's range.
    #[test]
    fn smoothing_is_convex_combination(values in arb_values(2), p in 1..40_usize) {
        let out = weighted_ema(&values, p);
        for row in p..values.len() {
            let window = &values[row - p..=row];
            let lo = window.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(out[row] >= lo - 1e-9 && out[row] <= hi + 1e-9);
        }
    }
}

// ── 2. Crossover ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn predecessors_are_earlier_opposite_events(
        (dates, prices, macd, signal) in arb_inputs(),
        gated in prop::bool::ANY,
    ) {
        let ledger = detect(&dates, &prices, &macd, &signal, gated);
        prop_assert_eq!(ledger.len(), dates.len());

        for pair in ledger.events().windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }

        let mut last_buy = None;
        let mut last_sell = None;
        for event in ledger.events() {
            match event.operation {
                Operation::Buy => {
                    prop_assert_eq!(event.predecessor, last_sell);
                    if let Some(prev) = ledger.predecessor_of(event) {
                        prop_assert_eq!(prev.operation, Operation::Sell);
                        prop_assert!(prev.date < event.date);
                    }
                    last_buy = Some(event.date);
                }
                Operation::Sell => {
                    prop_assert_eq!(event.predecessor, last_buy);
                    if let Some(prev) = ledger.predecessor_of(event) {
                        prop_assert_eq!(prev.operation, Operation::Buy);
                        prop_assert!(prev.date < event.date);
                    }
                    last_sell = Some(event.date);
                }
                Operation::Hold => {
                    prop_assert!(event.price.is_none());
                    prop_assert!(event.predecessor.is_none());
                }
            }
        }
    }

    #[test]
    fn gated_detector_never_buys_before_first_sell(
        (dates, prices, macd, signal) in arb_inputs(),
    ) {
        let ledger = detect(&dates, &prices, &macd, &signal, true);
        if let Some(&first) = ledger.active_indices().first() {
            prop_assert_eq!(ledger.get(first).unwrap().operation, Operation::Sell);
        }
    }
}

// ── 3. Filter ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn zero_threshold_disables_nothing((dates, prices, macd, signal) in arb_inputs()) {
        let mut ledger = detect(&dates, &prices, &macd, &signal, true);
        let report = HoldingPeriodFilter::new(0).apply(&mut ledger);
        prop_assert_eq!(report.disabled, 0);
        prop_assert_eq!(ledger.disabled_count(), 0);
    }

    /// Every triggering event's next later opposite-type event is disabled.
    #[test]
    fn cancellation_cascades_to_closing_leg(
        (dates, prices, macd, signal) in arb_inputs(),
        delay in 0..20_i64,
    ) {
        let mut ledger = detect(&dates, &prices, &macd, &signal, true);
        let report = HoldingPeriodFilter::new(delay).apply(&mut ledger);
        let active = ledger.active_indices();

        for cancellation in &report.cancellations {
            prop_assert!(cancellation.gap_days < delay);
            let pos = active
                .iter()
                .position(|&i| ledger.get(i).unwrap().date == cancellation.trigger)
                .unwrap();
            let trigger = ledger.get(active[pos]).unwrap();
            prop_assert!(trigger.disabled);
            prop_assert!(pos >= 2);

            let next_opposite = active[pos + 1..]
                .iter()
                .map(|&i| ledger.get(i).unwrap())
                .find(|e| e.operation == trigger.operation.opposite());
            match next_opposite {
                Some(leg) => {
                    prop_assert!(leg.disabled);
                    prop_assert_eq!(cancellation.closing_leg, Some(leg.date));
                }
                None => prop_assert_eq!(cancellation.closing_leg, None),
            }
        }

        // The first two active events are baseline, never disabled
        for &i in active.iter().take(2) {
            prop_assert!(!ledger.get(i).unwrap().disabled);
        }
    }

    #[test]
    fn filter_pass_is_repeatable(
        (dates, prices, macd, signal) in arb_inputs(),
        delay in 0..20_i64,
    ) {
        let mut once = detect(&dates, &prices, &macd, &signal, true);
        HoldingPeriodFilter::new(delay).apply(&mut once);
        let mut twice = once.clone();
        HoldingPeriodFilter::new(delay).apply(&mut twice);
        prop_assert_eq!(once, twice);
    }
}

// ── 4. Simulator ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn balances_never_go_negative(
        (dates, prices, macd, signal) in arb_inputs(),
        delay in 0..10_i64,
        initial in 1..5000_u64,
        gated in prop::bool::ANY,
    ) {
        let series = PriceSeries::from_parts("PROP", &dates, &prices).unwrap();
        let mut ledger = detect(&dates, &prices, &macd, &signal, gated);
        HoldingPeriodFilter::new(delay).apply(&mut ledger);

        let result = PortfolioSimulator::new(initial).run(&series, &mut ledger);
        for snap in &result.snapshots {
            prop_assert!(snap.money_balance >= 0.0);
        }
        prop_assert!(result.final_value >= 0.0);
        prop_assert_eq!(result.snapshots.len(), ledger.filtered().count());

        // Simulation never changes filtering state
        let mut refiltered = ledger.clone();
        HoldingPeriodFilter::new(delay).apply(&mut refiltered);
        for (a, b) in ledger.events().iter().zip(refiltered.events()) {
            prop_assert_eq!(a.disabled, b.disabled);
        }
    }
}
