//! Shared tracker - mutual exclusion for concurrent callers
//!
//! `BalanceTracker` assumes a single owner. When several handlers update the
//! same tracker, they go through this wrapper, which holds the lock for the
//! whole of each operation.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use num_bigint::BigInt;

use crate::domain::{Asset, BalanceTracker, Owner};

/// Cloneable handle to a mutex-guarded tracker
#[derive(Clone)]
pub struct SharedTracker {
    inner: Arc<Mutex<BalanceTracker>>,
}

impl SharedTracker {
    pub fn new(owner: impl Into<Owner>) -> Self {
        Self::from_tracker(BalanceTracker::new(owner))
    }

    pub fn from_tracker(tracker: BalanceTracker) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BalanceTracker>> {
        self.inner.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
    }

    pub fn track_deposit(&self, asset: Asset, amount: impl Into<BigInt>, new_nonce: impl Into<BigInt>) -> Result<()> {
        self.lock()?.track_deposit(asset, amount, new_nonce);
        Ok(())
    }

    pub fn track_withdrawal(&self, asset: Asset, amount: impl Into<BigInt>, new_nonce: impl Into<BigInt>) -> Result<()> {
        self.lock()?.track_withdrawal(asset, amount, new_nonce);
        Ok(())
    }

    pub fn track_incoming_transfer(&self, asset: Asset, amount: impl Into<BigInt>, new_nonce: impl Into<BigInt>) -> Result<()> {
        self.lock()?.track_incoming_transfer(asset, amount, new_nonce);
        Ok(())
    }

    pub fn track_outgoing_transfer(&self, asset: Asset, amount: impl Into<BigInt>, new_nonce: impl Into<BigInt>) -> Result<()> {
        self.lock()?.track_outgoing_transfer(asset, amount, new_nonce);
        Ok(())
    }

    pub fn sync_nonce(&self, on_chain_nonce: impl Into<BigInt>) -> Result<()> {
        self.lock()?.sync_nonce(on_chain_nonce);
        Ok(())
    }

    pub fn balance(&self, asset: Asset) -> Result<BigInt> {
        Ok(self.lock()?.balance(asset).clone())
    }

    pub fn balance_formatted(&self, asset: Asset, decimals: u32) -> Result<String> {
        Ok(self.lock()?.balance_formatted(asset, decimals))
    }

    pub fn is_in_sync(&self, on_chain_nonce: &BigInt) -> Result<bool> {
        Ok(self.lock()?.is_in_sync(on_chain_nonce))
    }

    pub fn missed_operations(&self, on_chain_nonce: &BigInt) -> Result<BigInt> {
        Ok(self.lock()?.missed_operations(on_chain_nonce))
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> Result<BalanceTracker> {
        Ok(self.lock()?.clone())
    }
}
