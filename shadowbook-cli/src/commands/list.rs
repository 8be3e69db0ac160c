//! List command - show tracked owners

use anyhow::Result;
use colored::Colorize;

use shadowbook_core::Asset;

use super::{get_context, logged};
use crate::output;

pub fn run(json: bool) -> Result<()> {
    logged("list", || {
        let ctx = get_context()?;
        let trackers = ctx.tracker_service.list()?;

        if json {
            return output::json(&trackers);
        }

        if trackers.is_empty() {
            output::info("No owners tracked. Run `sb init <owner>` to start.");
            return Ok(());
        }

        let decimals = ctx.config.decimals;
        let default_owner = ctx.config.default_owner.as_ref();

        let mut table = output::create_table();
        let mut header = vec!["Owner".to_string(), "Nonce".to_string()];
        header.extend(Asset::ALL.iter().map(|a| a.to_string()));
        table.set_header(header);

        for tracker in &trackers {
            let name = if Some(&tracker.owner) == default_owner {
                format!("{} {}", tracker.owner, "(default)".dimmed())
            } else {
                tracker.owner.to_string()
            };
            let mut row = vec![name, tracker.last_known_nonce.to_string()];
            row.extend(
                Asset::ALL
                    .iter()
                    .map(|&asset| tracker.balance_formatted(asset, decimals)),
            );
            table.add_row(row);
        }
        println!("{}", table);

        Ok(())
    })
}
