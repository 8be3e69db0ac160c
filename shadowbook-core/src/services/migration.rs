//! Migration service - applies embedded SQL migrations
//!
//! Used for both shadowbook.duckdb and logs.duckdb. Applied migrations are
//! recorded in sys_migrations, created by the first migration of each set.
//! Each migration runs in its own transaction together with its record.

use anyhow::{bail, Context, Result};
use duckdb::Connection;

/// An embedded migration: (filename, sql_content)
pub type Migration = (&'static str, &'static str);

/// Result of running migrations
#[derive(Debug)]
pub struct MigrationResult {
    /// Names of newly applied migrations
    pub applied: Vec<String>,
    /// Count of migrations that were already applied
    pub already_applied: usize,
}

/// Service for managing database migrations
pub struct MigrationService<'a> {
    conn: &'a Connection,
    migrations: &'static [Migration],
}

impl<'a> MigrationService<'a> {
    pub fn new(conn: &'a Connection, migrations: &'static [Migration]) -> Self {
        Self { conn, migrations }
    }

    /// Apply every migration not yet recorded, in order
    pub fn run_pending(&self) -> Result<MigrationResult> {
        let recorded = self.get_applied()?;
        if recorded.is_empty() && !self.migrations.is_empty() && !self.migrations[0].1.contains("sys_migrations") {
            bail!("First migration must create sys_migrations");
        }

        let mut result = MigrationResult {
            applied: Vec::new(),
            already_applied: 0,
        };

        for (name, sql) in self.migrations {
            if recorded.iter().any(|r| r == name) {
                result.already_applied += 1;
                continue;
            }
            self.apply(name, sql)
                .with_context(|| format!("Migration {} failed", name))?;
            result.applied.push(name.to_string());
        }

        Ok(result)
    }

    fn apply(&self, name: &str, sql: &str) -> Result<()> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;

        let outcome = self.conn.execute_batch(sql).and_then(|_| {
            self.conn
                .execute("INSERT INTO sys_migrations (migration_name) VALUES (?)", [name])
                .map(|_| ())
        });

        match outcome {
            Ok(()) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(())
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e.into())
            }
        }
    }

    fn migrations_table_exists(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'sys_migrations'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Names of applied migrations; empty on a fresh database
    pub fn get_applied(&self) -> Result<Vec<String>> {
        if !self.migrations_table_exists()? {
            return Ok(Vec::new());
        }

        let mut stmt = self
            .conn
            .prepare("SELECT migration_name FROM sys_migrations ORDER BY migration_name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Names of migrations still to apply
    pub fn get_pending(&self) -> Result<Vec<String>> {
        let applied = self.get_applied()?;
        Ok(self
            .migrations
            .iter()
            .map(|(name, _)| name.to_string())
            .filter(|name| !applied.contains(name))
            .collect())
    }
}
