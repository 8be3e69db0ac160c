//! Shadowbook CLI - shadow balances for encrypted accounts

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{balance, doctor, history, init, list, logs, reset, status, track};
use shadowbook_core::OperationKind;

/// Shadowbook - track balances the chain won't show you
#[derive(Parser)]
#[command(name = "sb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking an owner
    Init {
        /// Owner key (account address or public key)
        owner: String,
        /// Make this the default owner for later commands
        #[arg(long)]
        default: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a confirmed deposit
    Deposit(track::TrackArgs),

    /// Record a confirmed withdrawal
    Withdraw(track::TrackArgs),

    /// Record a confirmed incoming transfer
    TransferIn(track::TrackArgs),

    /// Record a confirmed outgoing transfer
    TransferOut(track::TrackArgs),

    /// Show tracked balances
    Balance {
        /// Asset symbol (usdc, tsla, spy, aapl) or id; all assets if omitted
        asset: Option<String>,
        /// Owner key (defaults to the configured owner)
        #[arg(long)]
        owner: Option<String>,
        /// Decimal places for formatting
        #[arg(long)]
        decimals: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare the tracked nonce with the on-chain nonce
    Status {
        /// Nonce currently reported by the chain
        #[arg(long)]
        on_chain_nonce: String,
        /// Owner key (defaults to the configured owner)
        #[arg(long)]
        owner: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Adopt the on-chain nonce without touching balances
    SyncNonce {
        /// Nonce currently reported by the chain
        nonce: String,
        /// Owner key (defaults to the configured owner)
        #[arg(long)]
        owner: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recorded operations
    History {
        /// Owner key (defaults to the configured owner)
        #[arg(long)]
        owner: Option<String>,
        /// Only show the most recent N entries
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tracked owners
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forget an owner's balances and history
    Reset {
        /// Owner key (defaults to the configured owner)
        #[arg(long)]
        owner: Option<String>,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Run ledger health checks
    Doctor {
        /// Show verbose output
        #[arg(long, short)]
        verbose: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { owner, default, json } => init::run(&owner, default, json),
        Commands::Deposit(args) => track::run(OperationKind::Deposit, args),
        Commands::Withdraw(args) => track::run(OperationKind::Withdrawal, args),
        Commands::TransferIn(args) => track::run(OperationKind::IncomingTransfer, args),
        Commands::TransferOut(args) => track::run(OperationKind::OutgoingTransfer, args),
        Commands::Balance { asset, owner, decimals, json } => {
            balance::run(asset.as_deref(), owner, decimals, json)
        }
        Commands::Status { on_chain_nonce, owner, json } => status::run(&on_chain_nonce, owner, json),
        Commands::SyncNonce { nonce, owner, json } => status::run_sync(&nonce, owner, json),
        Commands::History { owner, limit, json } => history::run(owner, limit, json),
        Commands::List { json } => list::run(json),
        Commands::Reset { owner, force } => reset::run(owner, force),
        Commands::Doctor { verbose, json } => doctor::run(verbose, json),
        Commands::Logs { command } => logs::run(command),
    }
}
