//! CLI command implementations

pub mod balance;
pub mod doctor;
pub mod history;
pub mod init;
pub mod list;
pub mod logs;
pub mod reset;
pub mod status;
pub mod track;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use shadowbook_core::{EntryPoint, Error, LogEvent, LoggingService, Owner, ShadowbookContext};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_shadowbook_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the data directory from environment or default
pub fn get_shadowbook_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SHADOWBOOK_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".shadowbook"))
        .ok_or_else(|| anyhow!("Could not find home directory; set SHADOWBOOK_DIR"))
}

/// Get or create the shadowbook context
pub fn get_context() -> Result<ShadowbookContext> {
    let data_dir = get_shadowbook_dir()?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    ShadowbookContext::new(&data_dir).context("Failed to initialize shadowbook context")
}

/// Pick the owner for a command: --owner, then the configured default
/// (SHADOWBOOK_OWNER overrides settings.json)
pub fn resolve_owner(ctx: &ShadowbookContext, owner: Option<String>) -> Result<Owner> {
    owner
        .map(Owner::new)
        .or_else(|| ctx.config.default_owner.clone())
        .ok_or_else(|| {
            anyhow!("No owner given. Pass --owner, set SHADOWBOOK_OWNER, or run `sb init <owner> --default`")
        })
}

/// Category of a failure, safe to write to the event log
fn error_kind(e: &anyhow::Error) -> &'static str {
    match e.downcast_ref::<Error>() {
        Some(Error::Database(_)) => "database",
        Some(Error::NotFound(_)) => "not_found",
        Some(Error::Validation(_)) => "validation",
        Some(Error::Config(_)) => "config",
        Some(Error::Io(_)) => "io",
        Some(Error::Json(_)) => "json",
        Some(Error::Other(_)) => "other",
        None => "unclassified",
    }
}

/// Run a command body, recording a failure in the event log before
/// handing the error back. Messages can name owners, so only the error
/// category is logged.
pub fn logged<T>(command: &str, body: impl FnOnce() -> Result<T>) -> Result<T> {
    let result = body();
    if let Err(e) = &result {
        let logger = get_logger();
        log_event(
            &logger,
            LogEvent::new("command_failed")
                .with_command(command)
                .with_error(error_kind(e)),
        );
    }
    result
}
