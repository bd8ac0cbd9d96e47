mod import;

pub use import::{import_trades, ImportReport, MappedScheme, SchemeMap, TradeRow, UnmappedTrade};
