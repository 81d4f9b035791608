//! Domain types for MACD Lab

pub mod event;
pub mod ledger;
pub mod series;
pub mod trade;

pub use event::{Operation, SignalEvent};
pub use ledger::{Ledger, LedgerError};
pub use series::{PricePoint, PriceSeries, SeriesError};
pub use trade::TradeRecord;
