//! MACD Lab Core — indicator, signal, filter and simulation pipeline.
//!
//! Data flows strictly one way:
//! - `PriceSeries` (validated daily closes)
//! - weighted exponential smoothing ×3 → MACD and Signal lines
//! - crossover detection → per-date `Ledger` of Buy/Sell/Hold events
//! - holding-period filter → disables rapid-reversal pairs in place
//! - portfolio simulation → balances, round-trip trades, profit
//!
//! Everything here is synchronous and I/O free. Loading, export and
//! orchestration live in `macdlab-runner`.

pub mod diagnostics;
pub mod domain;
pub mod engine;
pub mod filter;
pub mod indicators;
pub mod signals;

pub use domain::{Ledger, Operation, PricePoint, PriceSeries, SignalEvent, TradeRecord};
pub use engine::{PortfolioSimulator, SimulationResult};
pub use filter::{FilterReport, HoldingPeriodFilter};
pub use indicators::{IndicatorError, Macd, MacdParams, MacdSeries, SmoothedAverage};
pub use signals::{CrossoverDetector, CrossoverError};
