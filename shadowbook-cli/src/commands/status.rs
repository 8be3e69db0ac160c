//! Status commands - compare and sync the account nonce

use anyhow::{Context, Result};
use colored::Colorize;
use num_bigint::BigInt;

use shadowbook_core::{parse_integer, LogEvent};

use super::{get_context, get_logger, log_event, logged, resolve_owner};
use crate::output;

fn parse_nonce(input: &str) -> Result<BigInt> {
    parse_integer(input).with_context(|| format!("Invalid nonce '{}'", input))
}

pub fn run(on_chain_nonce: &str, owner: Option<String>, json: bool) -> Result<()> {
    logged("status", || {
        let ctx = get_context()?;
        let owner = resolve_owner(&ctx, owner)?;
        let on_chain_nonce = parse_nonce(on_chain_nonce)?;

        let status = ctx.tracker_service.sync_status(&owner, &on_chain_nonce)?;

        if json {
            return output::json(&status);
        }

        let mut table = output::create_table();
        table.add_row(vec!["Owner".to_string(), status.owner.to_string()]);
        table.add_row(vec!["Tracked nonce".to_string(), status.tracked_nonce.to_string()]);
        table.add_row(vec!["On-chain nonce".to_string(), status.on_chain_nonce.to_string()]);
        println!("{}", table);
        println!();

        if status.in_sync {
            output::success("In sync");
        } else {
            output::warning(&format!(
                "Out of sync: {} operation(s) not tracked",
                status.missed_operations
            ));
            println!(
                "{}",
                "Balances may be stale. Run `sb sync-nonce` after reconciling.".dimmed()
            );
        }

        Ok(())
    })
}

pub fn run_sync(nonce: &str, owner: Option<String>, json: bool) -> Result<()> {
    logged("sync_nonce", || {
        let ctx = get_context()?;
        let owner = resolve_owner(&ctx, owner)?;
        let nonce = parse_nonce(nonce)?;

        let tracker = ctx.tracker_service.sync_nonce(&owner, nonce)?;

        let logger = get_logger();
        log_event(&logger, LogEvent::new("nonce_synced").with_command("sync_nonce"));

        if json {
            return output::json(&tracker);
        }

        output::success(&format!("Nonce set to {}", tracker.last_known_nonce));
        println!("{}", "Balances were not changed.".dimmed());
        Ok(())
    })
}
