mod fund;
mod ledger;
mod lot;

pub use fund::{FundIdentity, Isin, IsinError, SchemeCode};
pub use ledger::{FundLedger, LedgerEvent, PortfolioLedger};
pub use lot::{Lot, TradeSide};
