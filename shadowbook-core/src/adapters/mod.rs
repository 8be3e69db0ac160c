//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the TrackerStore port (the CLI's data directory)
//! - In-memory maps for embedding and tests

pub mod duckdb;
pub mod memory;
