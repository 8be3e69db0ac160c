//! History command - show recorded operations

use anyhow::Result;
use comfy_table::Cell;

use shadowbook_core::format_units;

use super::{get_context, logged, resolve_owner};
use crate::output;

pub fn run(owner: Option<String>, limit: Option<usize>, json: bool) -> Result<()> {
    logged("history", || {
        let ctx = get_context()?;
        let owner = resolve_owner(&ctx, owner)?;

        let entries = ctx.tracker_service.history(&owner, limit)?;

        if json {
            return output::json(&entries);
        }

        if entries.is_empty() {
            output::info("No operations recorded yet.");
            return Ok(());
        }

        let mut table = output::create_table();
        table.set_header(vec!["Recorded", "Operation", "Asset", "Amount", "Nonce"]);
        for entry in &entries {
            let asset = entry.asset.map(|a| a.to_string()).unwrap_or_default();
            let amount = match (entry.asset, &entry.amount) {
                (Some(asset), Some(amount)) => format_units(amount, asset.decimals()),
                _ => String::new(),
            };
            table.add_row(vec![
                Cell::new(entry.recorded_at.format("%Y-%m-%d %H:%M:%S")),
                Cell::new(entry.kind),
                Cell::new(asset),
                Cell::new(amount),
                Cell::new(&entry.nonce),
            ]);
        }
        println!("{}", table);

        Ok(())
    })
}
