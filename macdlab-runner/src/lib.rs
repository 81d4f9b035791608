//! MACD Lab Runner — analysis orchestration on top of `macdlab-core`.
//!
//! This crate provides:
//! - TOML configuration with defaults for every section
//! - Quote CSV loading with a synthetic random-walk fallback
//! - Per-stock analysis contexts and (stock, Δ) evaluation
//! - Parallel holding-period sweeps
//! - Trade log, ledger, balance and manifest export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod sweep;

pub use config::{AnalysisConfig, ConfigError, MacdSettings, ProblemsConfig, SweepConfig, Window};
pub use data_loader::{load_series, DataSource, LoadError, LoadOptions, LoadedSeries};
pub use export::{save_artifacts, save_outcome, RunManifest, SCHEMA_VERSION};
pub use runner::{run_stock, AnalysisContext, DelayOutcome, Problem, RunError, StockRun};
pub use sweep::{DelaySweep, SweepResults};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn context_is_send_sync() {
        assert_send::<AnalysisContext>();
        assert_sync::<AnalysisContext>();
    }

    #[test]
    fn outcomes_are_send_sync() {
        assert_send::<DelayOutcome>();
        assert_sync::<DelayOutcome>();
        assert_send::<SweepResults>();
        assert_sync::<SweepResults>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<AnalysisConfig>();
        assert_sync::<AnalysisConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }
}
