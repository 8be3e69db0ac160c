//! Event log migrations - embedded SQL files for logs.duckdb
//!
//! Kept separate from the ledger migrations so the log database can be
//! deleted or exported on its own. Applied by the same MigrationService.

/// All log migrations, embedded at compile time.
/// Format: (filename, sql_content)
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
