use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use pvl_types::{BatchStatus, Role};

/// Data directory used when `--data-dir` is not given.
pub const DEFAULT_DATA_DIR: &str = "pvl-data";

#[derive(Parser)]
#[command(
    name = "pvl",
    about = "Provenance Ledger: tamper-evident supply-chain traceability",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Directory holding the ledger's write-ahead log
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register, list, or inspect actors
    #[command(subcommand)]
    Actor(ActorCommand),
    /// Create, inspect, or list batches
    #[command(subcommand)]
    Batch(BatchCommand),
    /// Move a batch to its next status
    Transition(TransitionArgs),
    /// Show a batch's ledger entries
    History(HistoryArgs),
    /// Verify chain integrity for one batch or the whole ledger
    Verify(VerifyArgs),
    /// Show ledger-wide counts and totals
    Stats,
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Subcommand)]
pub enum ActorCommand {
    /// Register a new actor
    Register(RegisterArgs),
    /// List all actors in registration order
    List,
    /// Show an actor by id or external identity
    Show { actor: String },
}

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub role: Role,
    /// External identity, e.g. an e-mail address
    #[arg(long)]
    pub identity: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
}

#[derive(Subcommand)]
pub enum BatchCommand {
    /// Register a new batch and its genesis entry
    Create(CreateBatchArgs),
    /// Show a batch by id or lookup key
    Show { batch: String },
    /// List batches, optionally only those of one owner
    List {
        #[arg(long)]
        owner: Option<String>,
    },
}

#[derive(Args)]
pub struct CreateBatchArgs {
    /// Owning actor (id or external identity)
    #[arg(long)]
    pub owner: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub origin: String,
    /// Harvest or production date (YYYY-MM-DD)
    #[arg(long)]
    pub produced_on: NaiveDate,
    #[arg(long)]
    pub quantity: u64,
    #[arg(long)]
    pub unit: String,
    /// Price per unit in minor currency units
    #[arg(long, default_value = "0")]
    pub unit_price: u64,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct TransitionArgs {
    /// Batch id or lookup key
    pub batch: String,
    pub status: BatchStatus,
    /// Acting actor (id or external identity)
    #[arg(long = "as")]
    pub actor: String,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
}

#[derive(Args)]
pub struct HistoryArgs {
    pub batch: String,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub batch: Option<String>,
    /// Audit every chain and every batch view
    #[arg(long, conflicts_with = "batch")]
    pub all: bool,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML server configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<std::net::SocketAddr>,
}
