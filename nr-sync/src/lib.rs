pub mod config;
pub mod error;
pub mod newrelic;
pub mod project;
pub mod registry;
pub mod schema;
pub mod secrets;
pub mod sync;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use sync::{SyncReport, SyncService, run_sync};
