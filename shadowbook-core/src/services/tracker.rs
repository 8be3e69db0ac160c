//! Tracker service - records confirmed on-chain operations
//!
//! Every tracked operation becomes a ledger entry committed together with
//! the updated tracker snapshot, so the ledger can always be replayed.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use num_bigint::BigInt;
use serde::Serialize;

use crate::domain::amount::serde_bigint;
use crate::domain::result::Error;
use crate::domain::{AmountPolicy, Asset, BalanceTracker, LedgerEntry, OperationKind, Owner};
use crate::ports::TrackerStore;

/// Tracker service for recording and reading shadow balances
pub struct TrackerService {
    store: Arc<dyn TrackerStore>,
    policy: AmountPolicy,
    /// Serializes read-modify-write cycles on snapshots
    write_lock: Mutex<()>,
}

impl TrackerService {
    pub fn new(store: Arc<dyn TrackerStore>, policy: AmountPolicy) -> Self {
        Self {
            store,
            policy,
            write_lock: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> AmountPolicy {
        self.policy
    }

    /// Start tracking a new owner with zero balances and nonce
    pub fn initialize(&self, owner: &Owner) -> Result<BalanceTracker> {
        let tracker = BalanceTracker::new(owner.clone());
        self.store.insert_tracker(&tracker)?;
        Ok(tracker)
    }

    /// Load the tracker of a known owner
    pub fn open(&self, owner: &Owner) -> Result<BalanceTracker> {
        let tracker = self
            .store
            .get_tracker(owner)?
            .ok_or_else(|| Error::not_found(format!("no tracker for owner {}", owner)))?;
        Ok(tracker)
    }

    /// Load the tracker, creating it on first use
    pub fn open_or_initialize(&self, owner: &Owner) -> Result<BalanceTracker> {
        match self.store.get_tracker(owner)? {
            Some(tracker) => Ok(tracker),
            None => self.initialize(owner),
        }
    }

    /// Record a balance operation confirmed on-chain with its resulting nonce
    pub fn track(
        &self,
        owner: &Owner,
        kind: OperationKind,
        asset: Asset,
        amount: BigInt,
        nonce: BigInt,
    ) -> Result<BalanceTracker> {
        if !kind.moves_balance() {
            return self.sync_nonce(owner, nonce);
        }
        self.policy.check(&amount)?;

        let entry = LedgerEntry::operation(owner.clone(), kind, asset, amount, nonce);
        self.commit(owner, entry)
    }

    pub fn deposit(&self, owner: &Owner, asset: Asset, amount: BigInt, nonce: BigInt) -> Result<BalanceTracker> {
        self.track(owner, OperationKind::Deposit, asset, amount, nonce)
    }

    pub fn withdraw(&self, owner: &Owner, asset: Asset, amount: BigInt, nonce: BigInt) -> Result<BalanceTracker> {
        self.track(owner, OperationKind::Withdrawal, asset, amount, nonce)
    }

    pub fn transfer_in(&self, owner: &Owner, asset: Asset, amount: BigInt, nonce: BigInt) -> Result<BalanceTracker> {
        self.track(owner, OperationKind::IncomingTransfer, asset, amount, nonce)
    }

    pub fn transfer_out(&self, owner: &Owner, asset: Asset, amount: BigInt, nonce: BigInt) -> Result<BalanceTracker> {
        self.track(owner, OperationKind::OutgoingTransfer, asset, amount, nonce)
    }

    /// Overwrite the tracked nonce with the on-chain one. Balances stay as
    /// they are and may be stale afterwards.
    pub fn sync_nonce(&self, owner: &Owner, on_chain_nonce: BigInt) -> Result<BalanceTracker> {
        let entry = LedgerEntry::nonce_sync(owner.clone(), on_chain_nonce);
        self.commit(owner, entry)
    }

    fn commit(&self, owner: &Owner, entry: LedgerEntry) -> Result<BalanceTracker> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {}", e))?;

        let mut tracker = self.open(owner)?;
        entry.apply(&mut tracker);
        self.store.commit_entry(&entry, &tracker)?;
        Ok(tracker)
    }

    /// Balances of every asset, raw and formatted
    pub fn balances(&self, owner: &Owner, decimals: u32) -> Result<BalanceReport> {
        let tracker = self.open(owner)?;
        Ok(BalanceReport::from_tracker(&tracker, decimals))
    }

    /// Compare the tracked nonce with the nonce read from the chain
    pub fn sync_status(&self, owner: &Owner, on_chain_nonce: &BigInt) -> Result<SyncStatus> {
        let tracker = self.open(owner)?;
        Ok(SyncStatus {
            owner: owner.clone(),
            tracked_nonce: tracker.last_known_nonce.clone(),
            on_chain_nonce: on_chain_nonce.clone(),
            in_sync: tracker.is_in_sync(on_chain_nonce),
            missed_operations: tracker.missed_operations(on_chain_nonce),
        })
    }

    /// Ledger entries in recording order, limited to the most recent `limit`
    pub fn history(&self, owner: &Owner, limit: Option<usize>) -> Result<Vec<LedgerEntry>> {
        // Surface a missing owner instead of an empty history
        self.open(owner)?;
        let mut entries = self.store.get_entries(owner)?;
        if let Some(limit) = limit {
            let skip = entries.len().saturating_sub(limit);
            entries.drain(..skip);
        }
        Ok(entries)
    }

    /// All tracked owners
    pub fn list(&self) -> Result<Vec<BalanceTracker>> {
        Ok(self.store.list_trackers()?)
    }

    /// Forget an owner's tracker and ledger
    pub fn reset(&self, owner: &Owner) -> Result<bool> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        Ok(self.store.delete_owner(owner)?)
    }

    /// Total ledger entries across owners
    pub fn entry_count(&self) -> Result<u64> {
        Ok(self.store.entry_count()?)
    }
}

#[derive(Debug, Serialize)]
pub struct AssetBalance {
    pub asset: Asset,
    #[serde(with = "serde_bigint")]
    pub raw: BigInt,
    pub formatted: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceReport {
    pub owner: Owner,
    #[serde(with = "serde_bigint")]
    pub last_known_nonce: BigInt,
    pub decimals: u32,
    pub balances: Vec<AssetBalance>,
}

impl BalanceReport {
    pub fn from_tracker(tracker: &BalanceTracker, decimals: u32) -> Self {
        Self {
            owner: tracker.owner.clone(),
            last_known_nonce: tracker.last_known_nonce.clone(),
            decimals,
            balances: Asset::ALL
                .into_iter()
                .map(|asset| AssetBalance {
                    asset,
                    raw: tracker.balance(asset).clone(),
                    formatted: tracker.balance_formatted(asset, decimals),
                })
                .collect(),
        }
    }

    pub fn get(&self, asset: Asset) -> Option<&AssetBalance> {
        self.balances.iter().find(|b| b.asset == asset)
    }
}

#[derive(Debug, Serialize)]
pub struct SyncStatus {
    pub owner: Owner,
    #[serde(with = "serde_bigint")]
    pub tracked_nonce: BigInt,
    #[serde(with = "serde_bigint")]
    pub on_chain_nonce: BigInt,
    pub in_sync: bool,
    #[serde(with = "serde_bigint")]
    pub missed_operations: BigInt,
}
