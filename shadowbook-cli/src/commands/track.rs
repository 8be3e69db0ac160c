//! Track commands - record confirmed deposits, withdrawals and transfers

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::json;

use shadowbook_core::{format_units, parse_integer, parse_units, Asset, LogEvent, OperationKind};

use super::{get_context, get_logger, log_event, logged, resolve_owner};
use crate::output;

#[derive(Args)]
pub struct TrackArgs {
    /// Asset symbol (usdc, tsla, spy, aapl) or id
    pub asset: String,
    /// Amount, in whole units (e.g. 12.5) unless --raw
    #[arg(allow_negative_numbers = true)]
    pub amount: String,
    /// Account nonce after the operation was confirmed
    #[arg(long)]
    pub nonce: String,
    /// Owner key (defaults to the configured owner)
    #[arg(long)]
    pub owner: Option<String>,
    /// Amount is already in base units
    #[arg(long)]
    pub raw: bool,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(kind: OperationKind, args: TrackArgs) -> Result<()> {
    logged(kind.as_str(), || record(kind, args))
}

fn record(kind: OperationKind, args: TrackArgs) -> Result<()> {
    let ctx = get_context()?;
    let owner = resolve_owner(&ctx, args.owner)?;

    let asset: Asset = args.asset.parse()?;
    let amount = if args.raw {
        parse_integer(&args.amount)?
    } else {
        parse_units(&args.amount, asset.decimals())?
    };
    let nonce = parse_integer(&args.nonce).context("Invalid --nonce")?;

    let tracker = ctx
        .tracker_service
        .track(&owner, kind, asset, amount.clone(), nonce)?;

    let logger = get_logger();
    log_event(
        &logger,
        LogEvent::new("operation_tracked")
            .with_command(kind.as_str())
            .with_asset(asset),
    );

    let decimals = ctx.config.decimals;
    if args.json {
        return output::json(&json!({
            "operation": kind,
            "asset": asset,
            "amount": amount.to_string(),
            "balance": tracker.balance(asset).to_string(),
            "balance_formatted": tracker.balance_formatted(asset, decimals),
            "last_known_nonce": tracker.last_known_nonce.to_string(),
        }));
    }

    output::success(&format!(
        "Recorded {} of {} {}",
        kind.as_str().replace('_', " "),
        format_units(&amount, asset.decimals()),
        asset
    ));
    println!(
        "  {} balance: {}  {}",
        asset,
        tracker.balance_formatted(asset, decimals).bold(),
        format!("(nonce {})", tracker.last_known_nonce).dimmed()
    );

    Ok(())
}
