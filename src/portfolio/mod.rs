// src/portfolio/mod.rs
mod models;
mod pivot;
mod series;
mod service;

pub use models::*;
pub use pivot::*;
pub use series::*;
pub use service::*;

pub(crate) use models::pnl_percent;
