//! Holding-period sweep: one simulation per Δ over a shared context.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::runner::{AnalysisContext, DelayOutcome};

/// Sweep executor. Runs the unfiltered baseline plus one outcome per Δ,
/// optionally in parallel.
#[derive(Debug, Clone)]
pub struct DelaySweep {
    parallel: bool,
}

impl Default for DelaySweep {
    fn default() -> Self {
        Self::new()
    }
}

impl DelaySweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn run(&self, ctx: &AnalysisContext, delays: &[i64], initial_balance: u64) -> SweepResults {
        let baseline = ctx.evaluate(None, initial_balance);

        // Each Δ clones the base ledger inside `evaluate`.
        let outcomes: Vec<DelayOutcome> = if self.parallel {
            delays
                .par_iter()
                .map(|&d| ctx.evaluate(Some(d), initial_balance))
                .collect()
        } else {
            delays
                .iter()
                .map(|&d| ctx.evaluate(Some(d), initial_balance))
                .collect()
        };

        for outcome in &outcomes {
            info!(
                symbol = ctx.series().symbol(),
                run = %outcome.label(),
                profit = outcome.profit(),
                trades = outcome.trades().len(),
                "delay done"
            );
        }

        SweepResults { baseline, outcomes }
    }
}

/// Baseline plus per-Δ outcomes, in the order the delays were given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    pub baseline: DelayOutcome,
    pub outcomes: Vec<DelayOutcome>,
}

impl SweepResults {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, delay: i64) -> Option<&DelayOutcome> {
        self.outcomes.iter().find(|o| o.delay == Some(delay))
    }

    /// `(Δ, profit)` pairs.
    pub fn profits(&self) -> Vec<(i64, f64)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.delay.map(|d| (d, o.profit())))
            .collect()
    }

    /// Most profitable Δ; ties go to the one listed first.
    pub fn best(&self) -> Option<&DelayOutcome> {
        self.outcomes.iter().fold(None, |best, o| match best {
            Some(b) if b.profit() >= o.profit() => Some(b),
            _ => Some(o),
        })
    }

    /// Runs whose losing trades get reported: the unfiltered baseline, then
    /// the best Δ when there is one.
    pub fn reported_runs(&self) -> Vec<&DelayOutcome> {
        std::iter::once(&self.baseline).chain(self.best()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MacdSettings;
    use chrono::NaiveDate;
    use macdlab_core::PriceSeries;

    fn context() -> AnalysisContext {
        let start = NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..500)
            .map(|i| start + chrono::Duration::days(i))
            .collect();
        let prices: Vec<f64> = (0..500)
            .map(|i| 50.0 + (i as f64 * 0.21).sin() * 6.0 + (i as f64 * 0.05).sin() * 9.0)
            .collect();
        let series = PriceSeries::from_parts("SWEEP", &dates, &prices).unwrap();
        AnalysisContext::build(series, &MacdSettings::default()).unwrap()
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let ctx = context();
        let delays = [0, 3, 6, 9, 12, 15, 18, 21, 24, 27];
        let seq = DelaySweep::new().with_parallelism(false).run(&ctx, &delays, 1000);
        let par = DelaySweep::new().with_parallelism(true).run(&ctx, &delays, 1000);
        assert_eq!(seq, par);
        assert_eq!(seq.len(), delays.len());
    }

    #[test]
    fn outcomes_follow_delay_order() {
        let ctx = context();
        let results = DelaySweep::new().run(&ctx, &[9, 0, 27], 1000);
        let delays: Vec<i64> = results.profits().iter().map(|(d, _)| *d).collect();
        assert_eq!(delays, vec![9, 0, 27]);
        assert!(results.get(27).is_some());
        assert!(results.get(3).is_none());
    }

    #[test]
    fn zero_delay_equals_baseline() {
        let ctx = context();
        let results = DelaySweep::new().run(&ctx, &[0], 1000);
        assert_eq!(results.get(0).unwrap().profit(), results.baseline.profit());
    }

    #[test]
    fn best_is_max_profit() {
        let ctx = context();
        let results = DelaySweep::new().run(&ctx, &[0, 5, 10, 20, 40], 1000);
        let best = results.best().unwrap();
        for (_, profit) in results.profits() {
            assert!(best.profit() >= profit);
        }
    }

    #[test]
    fn empty_delay_list_keeps_baseline() {
        let ctx = context();
        let results = DelaySweep::new().run(&ctx, &[], 1000);
        assert!(results.is_empty());
        assert!(results.best().is_none());
        assert!(results.baseline.filter.is_none());

        let reported = results.reported_runs();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].delay, None);
    }

    #[test]
    fn reported_runs_start_with_baseline() {
        let ctx = context();
        let results = DelaySweep::new().run(&ctx, &[3, 9, 15], 1000);
        let labels: Vec<String> = results.reported_runs().iter().map(|o| o.label()).collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0], "base");
        assert_eq!(labels[1], results.best().unwrap().label());
    }
}
