//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod doctor;
pub mod logging;
pub mod migration;
mod shared;
mod tracker;

pub use doctor::{CheckResult, DoctorResult, DoctorService, DoctorSummary};
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use shared::SharedTracker;
pub use tracker::{AssetBalance, BalanceReport, SyncStatus, TrackerService};
