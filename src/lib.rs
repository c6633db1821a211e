pub mod analytics;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod import;
pub mod metrics;
pub mod model;
pub mod ranking;
pub mod reliability;
pub mod snapshot_cache;
pub mod store;
pub mod web;

pub use config::Config;
pub use dashboard::Dashboard;
pub use error::{DashError, Result};
pub use ranking::ScoreBoard;
pub use reliability::SupplierScoreRecord;
