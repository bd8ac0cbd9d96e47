pub mod app;
pub mod clock;
pub mod config;
pub mod duration;
pub mod error;
pub mod format;
pub mod ledger;
pub mod models;
pub mod navdata;
pub mod portfolio;
pub mod storage;
