//! Balance command - show tracked balances

use anyhow::{anyhow, Result};
use colored::Colorize;

use shadowbook_core::{check_decimals, Asset};

use super::{get_context, logged, resolve_owner};
use crate::output;

pub fn run(asset: Option<&str>, owner: Option<String>, decimals: Option<u32>, json: bool) -> Result<()> {
    logged("balance", || {
        let ctx = get_context()?;
        let owner = resolve_owner(&ctx, owner)?;
        let decimals = check_decimals(decimals.unwrap_or(ctx.config.decimals))?;
        let asset = asset.map(str::parse::<Asset>).transpose()?;

        let report = ctx.tracker_service.balances(&owner, decimals)?;

        if let Some(asset) = asset {
            let entry = report
                .get(asset)
                .ok_or_else(|| anyhow!("No balance reported for {}", asset))?;
            if json {
                return output::json(entry);
            }
            println!("{} {}", entry.formatted.bold(), asset);
            return Ok(());
        }

        if json {
            return output::json(&report);
        }

        println!("{} {}", "Balances for".bold(), owner.to_string().bold());
        println!();

        let mut table = output::create_table();
        table.set_header(vec!["Asset", "Balance", "Base units"]);
        for entry in &report.balances {
            table.add_row(vec![
                entry.asset.to_string(),
                entry.formatted.clone(),
                entry.raw.to_string(),
            ]);
        }
        println!("{}", table);
        println!();
        println!("Last known nonce: {}", report.last_known_nonce);

        Ok(())
    })
}
