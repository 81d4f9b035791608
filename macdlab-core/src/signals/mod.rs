//! Signal generation: turns indicator series into discrete trading events.
//!
//! Signals depend on indicator values only, never on portfolio state.

pub mod crossover;

pub use crossover::{CrossoverDetector, CrossoverError};
