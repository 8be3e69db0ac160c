//! Shadowbook Core - client-side shadow balances for encrypted accounts
//!
//! Balances on the chain are encrypted under a key the owner doesn't hold,
//! so the client keeps its own record of every confirmed operation and
//! uses the account nonce to tell when that record has fallen behind.
//!
//! The crate follows hexagonal architecture:
//!
//! - **domain**: Assets, amounts, the BalanceTracker and its ledger
//! - **ports**: Trait definitions for external dependencies (TrackerStore)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::DuckDbStore;
use config::Config;
use ports::TrackerStore;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{
    check_decimals, format_units, parse_integer, parse_units, AmountPolicy, Asset, BalanceTracker,
    LedgerEntry, OperationKind, Owner, DEFAULT_DECIMALS, MAX_DECIMALS,
};
pub use services::{BalanceReport, EntryPoint, LogEvent, LoggingService, SharedTracker, SyncStatus};

/// Database file inside the data directory
pub const DB_FILENAME: &str = "shadowbook.duckdb";

/// Main context for Shadowbook operations
///
/// Holds the configuration, the DuckDB store and the services built on it.
pub struct ShadowbookContext {
    pub config: Config,
    pub store: Arc<DuckDbStore>,
    pub tracker_service: TrackerService,
    pub doctor_service: DoctorService,
}

impl ShadowbookContext {
    /// Create a context over the given data directory
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;

        let db_path = data_dir.join(DB_FILENAME);
        let store = Arc::new(DuckDbStore::new(&db_path)?);

        // Initialize schema
        store.ensure_schema()?;

        let shared: Arc<dyn TrackerStore> = store.clone();
        let tracker_service = TrackerService::new(Arc::clone(&shared), config.amount_policy());
        let doctor_service = DoctorService::new(shared);

        Ok(Self {
            config,
            store,
            tracker_service,
            doctor_service,
        })
    }
}
