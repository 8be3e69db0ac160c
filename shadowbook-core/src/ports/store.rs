//! Tracker store port - persistence abstraction

use crate::domain::result::Result;
use crate::domain::{BalanceTracker, LedgerEntry, Owner};

/// Persistence for tracker snapshots and their ledgers
///
/// A snapshot is the current tracker state for an owner. The ledger is the
/// ordered list of entries that produced it.
pub trait TrackerStore: Send + Sync {
    // === Trackers ===

    /// Get the stored tracker for an owner
    fn get_tracker(&self, owner: &Owner) -> Result<Option<BalanceTracker>>;

    /// Get every stored tracker, ordered by owner
    fn list_trackers(&self) -> Result<Vec<BalanceTracker>>;

    /// Store a new tracker. Fails if the owner already has one.
    fn insert_tracker(&self, tracker: &BalanceTracker) -> Result<()>;

    /// Delete a tracker and its whole ledger. Returns false if nothing was stored.
    fn delete_owner(&self, owner: &Owner) -> Result<bool>;

    // === Ledger ===

    /// Append an entry and overwrite the owner's snapshot in one step
    fn commit_entry(&self, entry: &LedgerEntry, tracker: &BalanceTracker) -> Result<()>;

    /// Get an owner's ledger in recording order
    fn get_entries(&self, owner: &Owner) -> Result<Vec<LedgerEntry>>;

    /// Total number of ledger entries across owners
    fn entry_count(&self) -> Result<u64>;
}
