//! Reset command - forget an owner's balances and history

use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::Confirm;

use shadowbook_core::LogEvent;

use super::{get_context, get_logger, log_event, logged, resolve_owner};
use crate::output;

pub fn run(owner: Option<String>, force: bool) -> Result<()> {
    logged("reset", || {
        let ctx = get_context()?;
        let owner = resolve_owner(&ctx, owner)?;

        // Confirm removal unless --force
        if !force {
            output::warning(&format!(
                "\nThis will delete all tracked balances and history for '{}'.",
                owner
            ));
            println!("{}\n", "Balances can only be rebuilt by replaying every operation.".dimmed());

            if !Confirm::new()
                .with_prompt("Are you sure?")
                .default(false)
                .interact()?
            {
                println!("{}\n", "Cancelled".dimmed());
                return Ok(());
            }
        }

        if !ctx.tracker_service.reset(&owner)? {
            bail!("Owner '{}' is not tracked", owner);
        }

        let logger = get_logger();
        log_event(&logger, LogEvent::new("tracker_reset").with_command("reset"));

        output::success(&format!("Reset {}", owner));
        Ok(())
    })
}
