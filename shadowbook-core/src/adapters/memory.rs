//! In-process tracker store
//!
//! Same semantics as the DuckDB store without touching disk. Used when the
//! host application keeps its own persistence, and throughout the tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::result::{Error, Result};
use crate::domain::{BalanceTracker, LedgerEntry, Owner};
use crate::ports::TrackerStore;

#[derive(Default)]
struct State {
    trackers: BTreeMap<Owner, BalanceTracker>,
    ledgers: BTreeMap<Owner, Vec<LedgerEntry>>,
}

/// Mutex-guarded in-memory store
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|e| Error::Other(format!("Lock poisoned: {}", e)))
    }
}

impl TrackerStore for MemoryStore {
    fn get_tracker(&self, owner: &Owner) -> Result<Option<BalanceTracker>> {
        Ok(self.lock()?.trackers.get(owner).cloned())
    }

    fn list_trackers(&self) -> Result<Vec<BalanceTracker>> {
        Ok(self.lock()?.trackers.values().cloned().collect())
    }

    fn insert_tracker(&self, tracker: &BalanceTracker) -> Result<()> {
        let mut state = self.lock()?;
        if state.trackers.contains_key(&tracker.owner) {
            return Err(Error::validation(format!(
                "owner {} is already tracked",
                tracker.owner
            )));
        }
        state.trackers.insert(tracker.owner.clone(), tracker.clone());
        Ok(())
    }

    fn delete_owner(&self, owner: &Owner) -> Result<bool> {
        let mut state = self.lock()?;
        state.ledgers.remove(owner);
        Ok(state.trackers.remove(owner).is_some())
    }

    fn commit_entry(&self, entry: &LedgerEntry, tracker: &BalanceTracker) -> Result<()> {
        let mut state = self.lock()?;
        state
            .ledgers
            .entry(entry.owner.clone())
            .or_default()
            .push(entry.clone());
        state.trackers.insert(tracker.owner.clone(), tracker.clone());
        Ok(())
    }

    fn get_entries(&self, owner: &Owner) -> Result<Vec<LedgerEntry>> {
        Ok(self.lock()?.ledgers.get(owner).cloned().unwrap_or_default())
    }

    fn entry_count(&self) -> Result<u64> {
        Ok(self.lock()?.ledgers.values().map(|l| l.len() as u64).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_twice_fails() {
        let store = MemoryStore::new();
        store.insert_tracker(&BalanceTracker::new("alice")).unwrap();
        assert!(store.insert_tracker(&BalanceTracker::new("alice")).is_err());
        assert_eq!(store.list_trackers().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_owner() {
        let store = MemoryStore::new();
        let mut tracker = BalanceTracker::new("alice");
        store.insert_tracker(&tracker).unwrap();
        let entry = LedgerEntry::nonce_sync(tracker.owner.clone(), 4.into());
        entry.apply(&mut tracker);
        store.commit_entry(&entry, &tracker).unwrap();
        assert_eq!(store.entry_count().unwrap(), 1);

        assert!(store.delete_owner(&tracker.owner).unwrap());
        assert_eq!(store.entry_count().unwrap(), 0);
        assert!(!store.delete_owner(&tracker.owner).unwrap());
    }
}
