mod jsonl_store;
mod models;
mod provider;
pub mod providers;
mod service;
mod store;

pub use jsonl_store::JsonlNavStore;
pub use models::NavPoint;
pub use provider::{NavSource, NoopNavSource};
pub use service::{CoverageStatus, NavService};
pub use store::{MemoryNavStore, NavStore};
