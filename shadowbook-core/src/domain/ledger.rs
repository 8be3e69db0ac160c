//! Ledger entry domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::amount::{serde_bigint, serde_bigint_opt};
use super::asset::Asset;
use super::result::Error;
use super::tracker::{BalanceTracker, Owner};

/// Category of on-chain instruction a ledger entry mirrors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Deposit,
    Withdrawal,
    IncomingTransfer,
    OutgoingTransfer,
    /// Nonce overwritten from on-chain state, balances untouched
    NonceSync,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Deposit => "deposit",
            OperationKind::Withdrawal => "withdrawal",
            OperationKind::IncomingTransfer => "incoming_transfer",
            OperationKind::OutgoingTransfer => "outgoing_transfer",
            OperationKind::NonceSync => "nonce_sync",
        }
    }

    /// Whether this kind moves a balance (and so carries asset and amount)
    pub fn moves_balance(&self) -> bool {
        !matches!(self, OperationKind::NonceSync)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(OperationKind::Deposit),
            "withdrawal" => Ok(OperationKind::Withdrawal),
            "incoming_transfer" => Ok(OperationKind::IncomingTransfer),
            "outgoing_transfer" => Ok(OperationKind::OutgoingTransfer),
            "nonce_sync" => Ok(OperationKind::NonceSync),
            other => Err(Error::validation(format!("unknown operation kind '{}'", other))),
        }
    }
}

/// One tracked operation in an owner's local ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub owner: Owner,
    pub kind: OperationKind,
    pub asset: Option<Asset>,
    #[serde(with = "serde_bigint_opt")]
    pub amount: Option<BigInt>,
    /// Nonce reported by the chain after this operation
    #[serde(with = "serde_bigint")]
    pub nonce: BigInt,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create an entry for a balance-moving operation
    pub fn operation(
        owner: Owner,
        kind: OperationKind,
        asset: Asset,
        amount: BigInt,
        nonce: BigInt,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            kind,
            asset: Some(asset),
            amount: Some(amount),
            nonce,
            recorded_at: Utc::now(),
        }
    }

    /// Create an entry for a nonce resync
    pub fn nonce_sync(owner: Owner, nonce: BigInt) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            kind: OperationKind::NonceSync,
            asset: None,
            amount: None,
            nonce,
            recorded_at: Utc::now(),
        }
    }

    /// Apply this entry to a tracker.
    ///
    /// A balance entry missing its asset or amount only moves the nonce.
    pub fn apply(&self, tracker: &mut BalanceTracker) {
        match (self.kind.moves_balance(), self.asset, &self.amount) {
            (true, Some(asset), Some(amount)) => {
                tracker.track(self.kind, asset, amount.clone(), self.nonce.clone())
            }
            _ => tracker.sync_nonce(self.nonce.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Owner {
        Owner::new("owner-1")
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [
            OperationKind::Deposit,
            OperationKind::Withdrawal,
            OperationKind::IncomingTransfer,
            OperationKind::OutgoingTransfer,
            OperationKind::NonceSync,
        ] {
            assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
        }
        assert!("mint".parse::<OperationKind>().is_err());
    }

    #[test]
    fn test_replay_reproduces_tracker() {
        let entries = vec![
            LedgerEntry::operation(owner(), OperationKind::Deposit, Asset::Usdc, 1_000.into(), 1.into()),
            LedgerEntry::operation(owner(), OperationKind::IncomingTransfer, Asset::Tsla, 30.into(), 2.into()),
            LedgerEntry::operation(owner(), OperationKind::Withdrawal, Asset::Usdc, 400.into(), 3.into()),
            LedgerEntry::nonce_sync(owner(), 10.into()),
            LedgerEntry::operation(owner(), OperationKind::OutgoingTransfer, Asset::Tsla, 5.into(), 11.into()),
        ];

        let replayed = BalanceTracker::replay(owner(), &entries);

        let mut direct = BalanceTracker::new(owner());
        direct.track_deposit(Asset::Usdc, 1_000, 1);
        direct.track_incoming_transfer(Asset::Tsla, 30, 2);
        direct.track_withdrawal(Asset::Usdc, 400, 3);
        direct.sync_nonce(10);
        direct.track_outgoing_transfer(Asset::Tsla, 5, 11);

        assert_eq!(replayed, direct);
    }

    #[test]
    fn test_nonce_sync_entry_has_no_amount() {
        let entry = LedgerEntry::nonce_sync(owner(), 3.into());
        assert_eq!(entry.kind, OperationKind::NonceSync);
        assert!(entry.asset.is_none());
        assert!(entry.amount.is_none());
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = LedgerEntry::operation(
            owner(),
            OperationKind::IncomingTransfer,
            Asset::Spy,
            7.into(),
            4.into(),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "incoming_transfer");
        assert_eq!(json["asset"], "spy");
        assert_eq!(json["amount"], "7");
        assert_eq!(json["nonce"], "4");
    }
}
