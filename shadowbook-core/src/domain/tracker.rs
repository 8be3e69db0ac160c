//! Balance tracker domain model
//!
//! On-chain balances are encrypted under an MXE key, so the client cannot
//! read them back. The tracker keeps a local shadow of the four asset
//! balances plus the nonce of the last on-chain operation it reflects.

use std::fmt;

use num_bigint::BigInt;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use super::amount::{format_units, serde_bigint};
use super::asset::Asset;
use super::ledger::{LedgerEntry, OperationKind};

/// Owner identity (wallet public key). Opaque: never validated or parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(String);

impl Owner {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Owner {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Owner {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Local shadow of one owner's encrypted balances.
///
/// No invariants are enforced: amounts are not validated and balances may
/// go negative. The source of truth is on-chain and the nonce tells the
/// caller when the shadow has fallen behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTracker {
    pub owner: Owner,
    #[serde(with = "serde_bigint")]
    pub usdc: BigInt,
    #[serde(with = "serde_bigint")]
    pub tsla: BigInt,
    #[serde(with = "serde_bigint")]
    pub spy: BigInt,
    #[serde(with = "serde_bigint")]
    pub aapl: BigInt,
    #[serde(with = "serde_bigint")]
    pub last_known_nonce: BigInt,
}

impl BalanceTracker {
    /// Create a tracker with every balance and the nonce at zero
    pub fn new(owner: impl Into<Owner>) -> Self {
        Self {
            owner: owner.into(),
            usdc: BigInt::zero(),
            tsla: BigInt::zero(),
            spy: BigInt::zero(),
            aapl: BigInt::zero(),
            last_known_nonce: BigInt::zero(),
        }
    }

    /// Rebuild a tracker by applying ledger entries in order
    pub fn replay<'a>(
        owner: impl Into<Owner>,
        entries: impl IntoIterator<Item = &'a LedgerEntry>,
    ) -> Self {
        let mut tracker = Self::new(owner);
        for entry in entries {
            entry.apply(&mut tracker);
        }
        tracker
    }

    fn balance_mut(&mut self, asset: Asset) -> &mut BigInt {
        match asset {
            Asset::Usdc => &mut self.usdc,
            Asset::Tsla => &mut self.tsla,
            Asset::Spy => &mut self.spy,
            Asset::Aapl => &mut self.aapl,
        }
    }

    fn credit(&mut self, asset: Asset, amount: BigInt, new_nonce: BigInt) {
        *self.balance_mut(asset) += amount;
        self.last_known_nonce = new_nonce;
    }

    fn debit(&mut self, asset: Asset, amount: BigInt, new_nonce: BigInt) {
        *self.balance_mut(asset) -= amount;
        self.last_known_nonce = new_nonce;
    }

    /// Record a confirmed external deposit
    pub fn track_deposit(
        &mut self,
        asset: Asset,
        amount: impl Into<BigInt>,
        new_nonce: impl Into<BigInt>,
    ) {
        self.credit(asset, amount.into(), new_nonce.into());
    }

    /// Record a confirmed withdrawal
    pub fn track_withdrawal(
        &mut self,
        asset: Asset,
        amount: impl Into<BigInt>,
        new_nonce: impl Into<BigInt>,
    ) {
        self.debit(asset, amount.into(), new_nonce.into());
    }

    /// Record a peer-to-peer transfer credited to this owner
    pub fn track_incoming_transfer(
        &mut self,
        asset: Asset,
        amount: impl Into<BigInt>,
        new_nonce: impl Into<BigInt>,
    ) {
        self.credit(asset, amount.into(), new_nonce.into());
    }

    /// Record a peer-to-peer transfer sent by this owner
    pub fn track_outgoing_transfer(
        &mut self,
        asset: Asset,
        amount: impl Into<BigInt>,
        new_nonce: impl Into<BigInt>,
    ) {
        self.debit(asset, amount.into(), new_nonce.into());
    }

    /// Dispatch a balance operation by kind.
    ///
    /// `NonceSync` ignores asset and amount and only moves the nonce.
    pub fn track(&mut self, kind: OperationKind, asset: Asset, amount: BigInt, new_nonce: BigInt) {
        match kind {
            OperationKind::Deposit => self.track_deposit(asset, amount, new_nonce),
            OperationKind::Withdrawal => self.track_withdrawal(asset, amount, new_nonce),
            OperationKind::IncomingTransfer => {
                self.track_incoming_transfer(asset, amount, new_nonce)
            }
            OperationKind::OutgoingTransfer => {
                self.track_outgoing_transfer(asset, amount, new_nonce)
            }
            OperationKind::NonceSync => self.sync_nonce(new_nonce),
        }
    }

    /// Current balance of an asset in base units
    pub fn balance(&self, asset: Asset) -> &BigInt {
        match asset {
            Asset::Usdc => &self.usdc,
            Asset::Tsla => &self.tsla,
            Asset::Spy => &self.spy,
            Asset::Aapl => &self.aapl,
        }
    }

    /// Balance formatted with exactly `decimals` fractional digits
    pub fn balance_formatted(&self, asset: Asset, decimals: u32) -> String {
        format_units(self.balance(asset), decimals)
    }

    /// True iff the tracked nonce equals the on-chain nonce
    pub fn is_in_sync(&self, on_chain_nonce: &BigInt) -> bool {
        &self.last_known_nonce == on_chain_nonce
    }

    /// Number of on-chain operations not reflected locally. Never negative.
    pub fn missed_operations(&self, on_chain_nonce: &BigInt) -> BigInt {
        if on_chain_nonce > &self.last_known_nonce {
            on_chain_nonce - &self.last_known_nonce
        } else {
            BigInt::zero()
        }
    }

    /// Overwrite the tracked nonce. Balances are left as they are and may
    /// now be stale.
    pub fn sync_nonce(&mut self, on_chain_nonce: impl Into<BigInt>) {
        self.last_known_nonce = on_chain_nonce.into();
    }
}
