//! DuckDB tracker store implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use duckdb::{params, Connection, OptionalExt};
use num_bigint::BigInt;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Asset, BalanceTracker, LedgerEntry, OperationKind, Owner};
use crate::migrations::MIGRATIONS;
use crate::ports::TrackerStore;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
        || lower.contains("could not set lock on file")
}

/// Raw tracker row, read as strings so big integers keep full precision
struct TrackerRow {
    owner: String,
    balances: [String; 4],
    nonce: String,
}

/// Raw ledger row
struct EntryRow {
    id: String,
    owner: String,
    kind: String,
    asset: Option<String>,
    amount: Option<String>,
    nonce: String,
    recorded_at: String,
}

/// DuckDB tracker store
pub struct DuckDbStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbStore {
    /// Open (or create) the store at `db_path`
    ///
    /// Retries with exponential backoff on file locking errors, which occur
    /// when another `sb` process holds the database.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[shadowbook] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// In-memory store, mostly for tests and embedding
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off: nothing here needs one
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Run pending schema migrations
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn, MIGRATIONS)
            .run_pending()
            .map_err(|e| Error::database(format!("Migration failed: {:#}", e)))
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    /// Path of the database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn upsert_tracker_row(conn: &Connection, tracker: &BalanceTracker) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO sys_trackers (owner, usdc, tsla, spy, aapl, last_known_nonce, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (owner) DO UPDATE SET
                usdc = excluded.usdc,
                tsla = excluded.tsla,
                spy = excluded.spy,
                aapl = excluded.aapl,
                last_known_nonce = excluded.last_known_nonce,
                updated_at = excluded.updated_at",
            params![
                tracker.owner.as_str(),
                tracker.usdc.to_string(),
                tracker.tsla.to_string(),
                tracker.spy.to_string(),
                tracker.aapl.to_string(),
                tracker.last_known_nonce.to_string(),
                now,
                now,
            ],
        )?;
        Ok(())
    }

    fn read_tracker_row(row: &duckdb::Row) -> duckdb::Result<TrackerRow> {
        Ok(TrackerRow {
            owner: row.get(0)?,
            balances: [row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?],
            nonce: row.get(5)?,
        })
    }

    fn read_entry_row(row: &duckdb::Row) -> duckdb::Result<EntryRow> {
        Ok(EntryRow {
            id: row.get(0)?,
            owner: row.get(1)?,
            kind: row.get(2)?,
            asset: row.get(3)?,
            amount: row.get(4)?,
            nonce: row.get(5)?,
            recorded_at: row.get(6)?,
        })
    }
}

fn parse_stored_int(column: &str, value: &str) -> Result<BigInt> {
    value
        .parse()
        .map_err(|_| Error::database(format!("corrupt {} value '{}'", column, value)))
}

fn tracker_from_row(row: TrackerRow) -> Result<BalanceTracker> {
    let [usdc, tsla, spy, aapl] = row.balances;
    Ok(BalanceTracker {
        owner: Owner::new(row.owner),
        usdc: parse_stored_int("usdc", &usdc)?,
        tsla: parse_stored_int("tsla", &tsla)?,
        spy: parse_stored_int("spy", &spy)?,
        aapl: parse_stored_int("aapl", &aapl)?,
        last_known_nonce: parse_stored_int("last_known_nonce", &row.nonce)?,
    })
}

fn entry_from_row(row: EntryRow) -> Result<LedgerEntry> {
    let id = Uuid::parse_str(&row.id)
        .map_err(|_| Error::database(format!("corrupt entry id '{}'", row.id)))?;
    let recorded_at = DateTime::parse_from_rfc3339(&row.recorded_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::database(format!("corrupt timestamp '{}'", row.recorded_at)))?;

    Ok(LedgerEntry {
        id,
        owner: Owner::new(row.owner),
        kind: row.kind.parse::<OperationKind>()?,
        asset: row.asset.as_deref().map(str::parse::<Asset>).transpose()?,
        amount: row
            .amount
            .as_deref()
            .map(|a| parse_stored_int("amount", a))
            .transpose()?,
        nonce: parse_stored_int("nonce", &row.nonce)?,
        recorded_at,
    })
}

impl TrackerStore for DuckDbStore {
    fn get_tracker(&self, owner: &Owner) -> Result<Option<BalanceTracker>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT owner, usdc, tsla, spy, aapl, last_known_nonce
                 FROM sys_trackers WHERE owner = ?",
                [owner.as_str()],
                Self::read_tracker_row,
            )
            .optional()?;
        row.map(tracker_from_row).transpose()
    }

    fn list_trackers(&self) -> Result<Vec<BalanceTracker>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT owner, usdc, tsla, spy, aapl, last_known_nonce
             FROM sys_trackers ORDER BY owner",
        )?;
        let rows = stmt.query_map([], Self::read_tracker_row)?;

        let mut trackers = Vec::new();
        for row in rows {
            trackers.push(tracker_from_row(row?)?);
        }
        Ok(trackers)
    }

    fn insert_tracker(&self, tracker: &BalanceTracker) -> Result<()> {
        let conn = self.lock()?;
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sys_trackers WHERE owner = ?",
            [tracker.owner.as_str()],
            |row| row.get(0),
        )?;
        if exists > 0 {
            return Err(Error::validation(format!(
                "owner {} is already tracked",
                tracker.owner
            )));
        }
        Self::upsert_tracker_row(&conn, tracker)
    }

    fn delete_owner(&self, owner: &Owner) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM sys_ledger_entries WHERE owner = ?",
            [owner.as_str()],
        )?;
        let deleted = tx.execute("DELETE FROM sys_trackers WHERE owner = ?", [owner.as_str()])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn commit_entry(&self, entry: &LedgerEntry, tracker: &BalanceTracker) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO sys_ledger_entries (entry_id, owner, kind, asset, amount, nonce, recorded_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                entry.id.to_string(),
                entry.owner.as_str(),
                entry.kind.as_str(),
                entry.asset.map(|a| a.as_str()),
                entry.amount.as_ref().map(|a| a.to_string()),
                entry.nonce.to_string(),
                entry.recorded_at.to_rfc3339(),
            ],
        )?;
        Self::upsert_tracker_row(&tx, tracker)?;
        tx.commit()?;
        Ok(())
    }

    fn get_entries(&self, owner: &Owner) -> Result<Vec<LedgerEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT entry_id, owner, kind, asset, amount, nonce, recorded_at
             FROM sys_ledger_entries WHERE owner = ? ORDER BY seq",
        )?;
        let rows = stmt.query_map([owner.as_str()], Self::read_entry_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(entry_from_row(row?)?);
        }
        Ok(entries)
    }

    fn entry_count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM sys_ledger_entries", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DuckDbStore {
        let store = DuckDbStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    #[test]
    fn test_insert_and_get_tracker() {
        let store = store();
        let tracker = BalanceTracker::new("alice");
        store.insert_tracker(&tracker).unwrap();

        let loaded = store.get_tracker(&Owner::new("alice")).unwrap();
        assert_eq!(loaded, Some(tracker));
        assert!(store.get_tracker(&Owner::new("bob")).unwrap().is_none());
    }

    #[test]
    fn test_insert_duplicate_owner_fails() {
        let store = store();
        store.insert_tracker(&BalanceTracker::new("alice")).unwrap();
        let err = store.insert_tracker(&BalanceTracker::new("alice")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_commit_entry_updates_snapshot_and_ledger() {
        let store = store();
        let mut tracker = BalanceTracker::new("alice");
        store.insert_tracker(&tracker).unwrap();

        let entry = LedgerEntry::operation(
            tracker.owner.clone(),
            OperationKind::Deposit,
            Asset::Usdc,
            BigInt::from(2_500_000),
            BigInt::from(1),
        );
        entry.apply(&mut tracker);
        store.commit_entry(&entry, &tracker).unwrap();

        let loaded = store.get_tracker(&tracker.owner).unwrap().unwrap();
        assert_eq!(loaded.usdc, BigInt::from(2_500_000));
        assert_eq!(loaded.last_known_nonce, BigInt::from(1));

        let entries = store.get_entries(&tracker.owner).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, entry.id);
        assert_eq!(entries[0].kind, OperationKind::Deposit);
        assert_eq!(entries[0].asset, Some(Asset::Usdc));
        assert_eq!(store.entry_count().unwrap(), 1);
    }

    #[test]
    fn test_big_values_keep_precision() {
        let store = store();
        let huge: BigInt = "123456789012345678901234567890123456789012345".parse().unwrap();
        let mut tracker = BalanceTracker::new("whale");
        store.insert_tracker(&tracker).unwrap();

        let entry = LedgerEntry::operation(
            tracker.owner.clone(),
            OperationKind::IncomingTransfer,
            Asset::Aapl,
            huge.clone(),
            huge.clone(),
        );
        entry.apply(&mut tracker);
        store.commit_entry(&entry, &tracker).unwrap();

        let loaded = store.get_tracker(&tracker.owner).unwrap().unwrap();
        assert_eq!(loaded.aapl, huge);
        assert_eq!(loaded.last_known_nonce, huge);
        assert_eq!(store.get_entries(&tracker.owner).unwrap()[0].amount, Some(huge));
    }

    #[test]
    fn test_entries_keep_recording_order() {
        let store = store();
        let mut tracker = BalanceTracker::new("alice");
        store.insert_tracker(&tracker).unwrap();

        for nonce in 1..=5 {
            let entry = LedgerEntry::nonce_sync(tracker.owner.clone(), BigInt::from(nonce));
            entry.apply(&mut tracker);
            store.commit_entry(&entry, &tracker).unwrap();
        }

        let nonces: Vec<BigInt> = store
            .get_entries(&tracker.owner)
            .unwrap()
            .into_iter()
            .map(|e| e.nonce)
            .collect();
        assert_eq!(nonces, (1..=5).map(BigInt::from).collect::<Vec<_>>());
    }

    #[test]
    fn test_delete_owner_removes_ledger() {
        let store = store();
        let mut tracker = BalanceTracker::new("alice");
        store.insert_tracker(&tracker).unwrap();
        store.insert_tracker(&BalanceTracker::new("bob")).unwrap();

        let entry = LedgerEntry::nonce_sync(tracker.owner.clone(), BigInt::from(3));
        entry.apply(&mut tracker);
        store.commit_entry(&entry, &tracker).unwrap();

        assert!(store.delete_owner(&tracker.owner).unwrap());
        assert!(store.get_tracker(&tracker.owner).unwrap().is_none());
        assert!(store.get_entries(&tracker.owner).unwrap().is_empty());
        assert_eq!(store.list_trackers().unwrap().len(), 1);
        assert!(!store.delete_owner(&tracker.owner).unwrap());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable_error("IO Error: Could not set lock on file"));
        assert!(is_retryable_error("The process cannot access the file because it is being used by another process"));
        assert!(!is_retryable_error("Catalog Error: Table does not exist"));
    }
}
