//! Logs command - inspect and prune the event log

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use serde_json::json;

use shadowbook_core::services::logging::now_ms;
use shadowbook_core::services::LogEntry;
use shadowbook_core::{EntryPoint, LoggingService};

use super::get_shadowbook_dir;
use crate::output;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only failures
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete old log entries
    Clear {
        /// Delete entries older than N days
        #[arg(long, default_value = "30")]
        older_than_days: u32,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show log statistics and database path
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn open_log() -> Result<LoggingService> {
    let data_dir = get_shadowbook_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

fn format_timestamp(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

pub fn run(command: LogsCommands) -> Result<()> {
    let log = open_log()?;
    match command {
        LogsCommands::List { limit, errors, json } => list(&log, limit, errors, json),
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => clear(&log, older_than_days, force, json, |days| {
            Ok(Confirm::new()
                .with_prompt(format!("Delete log entries older than {} days?", days))
                .default(false)
                .interact()?)
        })
        .map(|_| ()),
        LogsCommands::Stats { json } => stats(&log, json),
    }
}

fn list(log: &LoggingService, limit: usize, errors_only: bool, json: bool) -> Result<()> {
    let entries: Vec<LogEntry> = if errors_only {
        log.get_errors(limit)?
    } else {
        log.get_recent(limit)?
    };

    if json {
        return output::json(&entries);
    }
    if entries.is_empty() {
        output::info("No log entries found.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Event", "Command", "Asset", "Error"]);
    for entry in &entries {
        table.add_row(vec![
            format_timestamp(entry.timestamp),
            entry.event.clone(),
            entry.command.clone().unwrap_or_default(),
            entry.asset.clone().unwrap_or_default(),
            entry
                .error_message
                .as_deref()
                .map(|e| e.red().to_string())
                .unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

/// Returns the number of deleted entries, or None when cancelled.
/// Only --force skips the confirmation.
fn clear(
    log: &LoggingService,
    older_than_days: u32,
    force: bool,
    json: bool,
    confirm: impl FnOnce(u32) -> Result<bool>,
) -> Result<Option<u64>> {
    if !force && !confirm(older_than_days)? {
        if json {
            output::json(&json!({ "deleted": 0, "cancelled": true }))?;
        } else {
            println!("{}", "Cancelled".dimmed());
        }
        return Ok(None);
    }

    let cutoff_ms = now_ms() - i64::from(older_than_days) * DAY_MS;
    let deleted = log.delete_before(cutoff_ms)?;

    if json {
        output::json(&json!({ "deleted": deleted }))?;
    } else {
        output::success(&format!("Deleted {} log entries", deleted));
    }
    Ok(Some(deleted))
}

fn stats(log: &LoggingService, json: bool) -> Result<()> {
    let total = log.count()?;
    let errors = log.error_count()?;
    let by_event = log.event_counts()?;
    let db_path = log.db_path();
    let size_bytes = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    if json {
        let events: serde_json::Map<String, serde_json::Value> = by_event
            .into_iter()
            .map(|(event, n)| (event, json!(n)))
            .collect();
        return output::json(&json!({
            "total_entries": total,
            "error_count": errors,
            "events": events,
            "database_path": db_path.to_string_lossy(),
            "database_size_bytes": size_bytes,
        }));
    }

    println!("{}", "Event Log".bold());
    println!("  Entries:  {}", total);
    println!("  Failures: {}", errors);
    println!("  Database: {} ({} bytes)", db_path.display(), size_bytes);

    if !by_event.is_empty() {
        println!();
        let mut table = output::create_table();
        table.set_header(vec!["Event", "Count"]);
        for (event, n) in by_event {
            table.add_row(vec![event, n.to_string()]);
        }
        println!("{}", table);
    }
    Ok(())
}
