//! Integration tests for shadowbook-core services
//!
//! These tests verify critical data integrity scenarios using real DuckDB
//! files in temporary directories.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;
use tempfile::TempDir;

use num_bigint::BigInt;
use num_traits::Zero;

use shadowbook_core::adapters::duckdb::DuckDbStore;
use shadowbook_core::config::Config;
use shadowbook_core::ports::TrackerStore;
use shadowbook_core::services::{DoctorService, EntryPoint, LogEvent, LoggingService, TrackerService};
use shadowbook_core::{
    parse_units, AmountPolicy, Asset, BalanceTracker, Error, Owner, ShadowbookContext,
    DB_FILENAME,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Create a test store with schema initialized
fn create_test_store(temp_dir: &TempDir) -> Arc<DuckDbStore> {
    let db_path = temp_dir.path().join("test.duckdb");
    let store = DuckDbStore::new(&db_path).expect("Failed to create store");
    store.ensure_schema().expect("Failed to initialize schema");
    Arc::new(store)
}

fn create_service(store: &Arc<DuckDbStore>, policy: AmountPolicy) -> TrackerService {
    let store: Arc<dyn TrackerStore> = store.clone();
    TrackerService::new(store, policy)
}

fn units(human: &str) -> BigInt {
    parse_units(human, 6).expect("valid amount")
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_tracker_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let owner = Owner::new("wallet-1");

    {
        let store = create_test_store(&temp_dir);
        let service = create_service(&store, AmountPolicy::Permissive);
        service.initialize(&owner).unwrap();
        service.deposit(&owner, Asset::Usdc, units("250"), 1.into()).unwrap();
        service.transfer_in(&owner, Asset::Aapl, units("1.5"), 2.into()).unwrap();
        service.transfer_out(&owner, Asset::Usdc, units("0.25"), 3.into()).unwrap();
    }

    let store = create_test_store(&temp_dir);
    let service = create_service(&store, AmountPolicy::Permissive);
    let tracker = service.open(&owner).unwrap();

    assert_eq!(tracker.usdc, units("249.75"));
    assert_eq!(tracker.aapl, units("1.5"));
    assert_eq!(tracker.last_known_nonce, BigInt::from(3));
    assert_eq!(tracker.balance_formatted(Asset::Usdc, 6), "249.750000");
    assert_eq!(service.history(&owner, None).unwrap().len(), 3);
}

#[test]
fn test_replay_matches_stored_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let service = create_service(&store, AmountPolicy::Permissive);
    let owner = Owner::new("wallet-2");

    service.initialize(&owner).unwrap();
    service.deposit(&owner, Asset::Tsla, 10.into(), 1.into()).unwrap();
    service.withdraw(&owner, Asset::Tsla, 4.into(), 2.into()).unwrap();
    service.sync_nonce(&owner, 7.into()).unwrap();
    service.transfer_in(&owner, Asset::Spy, 3.into(), 8.into()).unwrap();

    let stored = service.open(&owner).unwrap();
    let entries = store.get_entries(&owner).unwrap();
    let replayed = BalanceTracker::replay(owner.clone(), &entries);

    assert_eq!(replayed, stored);
    assert_eq!(replayed.last_known_nonce, BigInt::from(8));

    let doctor = DoctorService::new(store).run_checks().unwrap();
    assert_eq!(doctor.summary.errors, 0);
    assert_eq!(doctor.summary.warnings, 0);
}

#[test]
fn test_values_beyond_128_bits_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let service = create_service(&store, AmountPolicy::Permissive);
    let owner = Owner::new("whale");

    let huge: BigInt = "340282366920938463463374607431768211456123".parse().unwrap();
    let nonce: BigInt = "18446744073709551616".parse().unwrap();

    service.initialize(&owner).unwrap();
    service.deposit(&owner, Asset::Usdc, huge.clone(), nonce.clone()).unwrap();

    let tracker = service.open(&owner).unwrap();
    assert_eq!(tracker.usdc, huge);
    assert_eq!(tracker.last_known_nonce, nonce);
}

// ============================================================================
// Policy
// ============================================================================

#[test]
fn test_reject_negative_leaves_database_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let service = create_service(&store, AmountPolicy::RejectNegative);
    let owner = Owner::new("careful");

    service.initialize(&owner).unwrap();
    let err = service
        .withdraw(&owner, Asset::Spy, (-10).into(), 1.into())
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Validation(_))));

    assert_eq!(store.entry_count().unwrap(), 0);
    let tracker = service.open(&owner).unwrap();
    assert!(tracker.spy.is_zero());
    assert!(tracker.last_known_nonce.is_zero());
}

#[test]
fn test_permissive_records_negative_amounts() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let service = create_service(&store, AmountPolicy::Permissive);
    let owner = Owner::new("loose");

    service.initialize(&owner).unwrap();
    let tracker = service
        .deposit(&owner, Asset::Aapl, (-2).into(), 1.into())
        .unwrap();
    assert_eq!(tracker.aapl, BigInt::from(-2));
    assert_eq!(tracker.balance_formatted(Asset::Aapl, 2), "-0.02");

    let doctor = DoctorService::new(store).run_checks().unwrap();
    assert_eq!(doctor.checks["negative_balances"].status, "warning");
}

// ============================================================================
// Owners
// ============================================================================

#[test]
fn test_owners_are_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let store = create_test_store(&temp_dir);
    let service = create_service(&store, AmountPolicy::Permissive);
    let alice = Owner::new("alice");
    let bob = Owner::new("bob");

    service.initialize(&alice).unwrap();
    service.initialize(&bob).unwrap();
    service.deposit(&alice, Asset::Usdc, 5.into(), 1.into()).unwrap();
    service.deposit(&bob, Asset::Usdc, 9.into(), 4.into()).unwrap();

    assert_eq!(service.open(&alice).unwrap().usdc, BigInt::from(5));
    assert_eq!(service.open(&bob).unwrap().usdc, BigInt::from(9));

    assert!(service.reset(&alice).unwrap());
    let remaining = service.list().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].owner, bob);
    assert_eq!(store.get_entries(&alice).unwrap().len(), 0);
    assert_eq!(store.get_entries(&bob).unwrap().len(), 1);
}

// ============================================================================
// Context
// ============================================================================

#[test]
fn test_context_creates_database_and_uses_config() {
    let temp_dir = TempDir::new().unwrap();

    let config = Config {
        reject_negative_amounts: true,
        ..Config::default()
    };
    config.save(temp_dir.path()).unwrap();

    let ctx = ShadowbookContext::new(temp_dir.path()).unwrap();
    assert!(temp_dir.path().join(DB_FILENAME).exists());
    assert_eq!(ctx.tracker_service.policy(), AmountPolicy::RejectNegative);

    let owner = Owner::new("ctx-owner");
    ctx.tracker_service.initialize(&owner).unwrap();
    ctx.tracker_service
        .deposit(&owner, Asset::Usdc, 1.into(), 1.into())
        .unwrap();
    drop(ctx);

    // Migrations are idempotent across reopen
    let ctx = ShadowbookContext::new(temp_dir.path()).unwrap();
    assert_eq!(ctx.store.run_migrations().unwrap().applied.len(), 0);
    assert_eq!(ctx.tracker_service.open(&owner).unwrap().usdc, BigInt::from(1));
}

#[test]
fn test_event_log_lives_beside_database() {
    let temp_dir = TempDir::new().unwrap();
    let _ctx = ShadowbookContext::new(temp_dir.path()).unwrap();
    let logger = LoggingService::new(temp_dir.path(), EntryPoint::Embedded, "test").unwrap();

    logger
        .log(LogEvent::new("command_executed").with_command("deposit"))
        .unwrap();
    assert_eq!(logger.count().unwrap(), 1);
    assert!(temp_dir.path().join("logs.duckdb").exists());
}
