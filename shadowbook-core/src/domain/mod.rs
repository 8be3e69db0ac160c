//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with their operations - no I/O or external dependencies.

pub mod amount;
mod asset;
mod ledger;
mod policy;
pub mod result;
mod tracker;

pub use amount::{
    check_decimals, format_units, parse_integer, parse_units, DEFAULT_DECIMALS, MAX_DECIMALS,
};
pub use asset::Asset;
pub use ledger::{LedgerEntry, OperationKind};
pub use policy::AmountPolicy;
pub use tracker::{BalanceTracker, Owner};
