//! Simulation engine: replays surviving signals against a two-asset
//! (cash / instrument) portfolio.
//!
//! Pure and synchronous: the ledger in, balances, trades and profit out.
//! Forward-filling balances over non-event dates is post-processing
//! (`balance::forward_fill`), not part of the state transition.

pub mod accounting;
pub mod balance;
pub mod simulator;

pub use accounting::{BuyFill, Holdings, SellFill};
pub use balance::{forward_fill, BalancePoint, BalanceSnapshot};
pub use simulator::{PortfolioSimulator, SimulationResult};
