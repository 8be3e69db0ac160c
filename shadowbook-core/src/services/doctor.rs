//! Doctor service - ledger health checks

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use num_traits::Signed;
use serde::Serialize;
use serde_json::json;

use crate::domain::{Asset, BalanceTracker};
use crate::ports::TrackerStore;

/// Doctor service for health checks
pub struct DoctorService {
    store: Arc<dyn TrackerStore>,
}

impl DoctorService {
    pub fn new(store: Arc<dyn TrackerStore>) -> Self {
        Self { store }
    }

    /// Run all health checks over every tracked owner
    pub fn run_checks(&self) -> Result<DoctorResult> {
        let trackers = self.store.list_trackers()?;

        let mut replay_mismatches = Vec::new();
        let mut negative = Vec::new();
        let mut out_of_order = Vec::new();

        for tracker in &trackers {
            let entries = self.store.get_entries(&tracker.owner)?;

            // Replaying the ledger must reproduce the stored snapshot
            let replayed = BalanceTracker::replay(tracker.owner.clone(), &entries);
            if &replayed != tracker {
                replay_mismatches.push(json!({
                    "owner": tracker.owner,
                    "stored": tracker,
                    "replayed": replayed,
                }));
            }

            for asset in Asset::ALL {
                let balance = tracker.balance(asset);
                if balance.is_negative() {
                    negative.push(json!({
                        "owner": tracker.owner,
                        "asset": asset,
                        "balance": balance.to_string(),
                    }));
                }
            }

            for pair in entries.windows(2) {
                if pair[1].nonce < pair[0].nonce {
                    out_of_order.push(json!({
                        "owner": tracker.owner,
                        "entry_id": pair[1].id,
                        "nonce": pair[1].nonce.to_string(),
                        "previous_nonce": pair[0].nonce.to_string(),
                    }));
                }
            }
        }

        let mut checks = BTreeMap::new();

        checks.insert(
            "ledger_replay".to_string(),
            CheckResult::from_findings(
                replay_mismatches,
                "error",
                format!("Ledger replay matches all {} tracker(s)", trackers.len()),
                |n| format!("{} tracker(s) differ from their replayed ledger", n),
            ),
        );

        checks.insert(
            "negative_balances".to_string(),
            CheckResult::from_findings(
                negative,
                "warning",
                "No negative balances".to_string(),
                |n| format!("{} balance(s) below zero", n),
            ),
        );

        checks.insert(
            "nonce_order".to_string(),
            CheckResult::from_findings(
                out_of_order,
                "warning",
                "Ledger nonces never decrease".to_string(),
                |n| format!("{} ledger entr(ies) recorded with a lower nonce than the previous one", n),
            ),
        );

        let passed = checks.values().filter(|c| c.status == "pass").count() as i64;
        let warnings = checks.values().filter(|c| c.status == "warning").count() as i64;
        let errors = checks.values().filter(|c| c.status == "error").count() as i64;

        Ok(DoctorResult {
            checks,
            summary: DoctorSummary {
                passed,
                warnings,
                errors,
            },
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DoctorResult {
    pub checks: BTreeMap<String, CheckResult>,
    pub summary: DoctorSummary,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<serde_json::Value>>,
}

impl CheckResult {
    /// Pass when there are no findings, otherwise `failing_status`
    fn from_findings(
        findings: Vec<serde_json::Value>,
        failing_status: &str,
        pass_message: String,
        fail_message: impl Fn(usize) -> String,
    ) -> Self {
        if findings.is_empty() {
            Self {
                status: "pass".to_string(),
                message: pass_message,
                details: None,
            }
        } else {
            Self {
                status: failing_status.to_string(),
                message: fail_message(findings.len()),
                details: Some(findings),
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DoctorSummary {
    pub passed: i64,
    pub warnings: i64,
    pub errors: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::{LedgerEntry, OperationKind, Owner};
    use num_bigint::BigInt;

    fn record(store: &MemoryStore, tracker: &mut BalanceTracker, entry: LedgerEntry) {
        entry.apply(tracker);
        store.commit_entry(&entry, tracker).unwrap();
    }

    #[test]
    fn test_healthy_ledger_passes() {
        let store = Arc::new(MemoryStore::new());
        let mut tracker = BalanceTracker::new("alice");
        store.insert_tracker(&tracker).unwrap();
        let owner = tracker.owner.clone();
        record(
            &store,
            &mut tracker,
            LedgerEntry::operation(owner.clone(), OperationKind::Deposit, Asset::Usdc, 5.into(), 1.into()),
        );
        record(&store, &mut tracker, LedgerEntry::nonce_sync(owner, 2.into()));

        let result = DoctorService::new(store).run_checks().unwrap();
        assert_eq!(result.summary.passed, 3);
        assert_eq!(result.summary.errors, 0);
    }

    #[test]
    fn test_detects_snapshot_drift_and_warnings() {
        let store = Arc::new(MemoryStore::new());
        let owner = Owner::new("bob");
        let mut tracker = BalanceTracker::new(owner.clone());
        store.insert_tracker(&tracker).unwrap();

        record(
            &store,
            &mut tracker,
            LedgerEntry::operation(owner.clone(), OperationKind::Withdrawal, Asset::Spy, 3.into(), 5.into()),
        );
        record(&store, &mut tracker, LedgerEntry::nonce_sync(owner.clone(), 4.into()));

        // Snapshot written without a matching ledger entry
        let mut drifted = tracker.clone();
        drifted.track_deposit(Asset::Usdc, 1, 4);
        let stray = LedgerEntry::nonce_sync(owner, BigInt::from(4));
        store.commit_entry(&stray, &drifted).unwrap();

        let result = DoctorService::new(store).run_checks().unwrap();
        assert_eq!(result.checks["ledger_replay"].status, "error");
        assert_eq!(result.checks["negative_balances"].status, "warning");
        assert_eq!(result.checks["nonce_order"].status, "warning");
        assert_eq!(result.summary.errors, 1);
        assert_eq!(result.summary.warnings, 2);
    }
}
