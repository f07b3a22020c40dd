//! Command-line surface for the interval store.
//!
//! | Command  | Effect                                           |
//! |----------|--------------------------------------------------|
//! | `list`   | Print every interval ordered by start date       |
//! | `get`    | Print one interval by id                         |
//! | `insert` | Reconcile and store a new interval               |
//! | `update` | Reconcile and store new dates/price for an id    |
//! | `delete` | Remove one interval                              |
//! | `clear`  | Remove every interval                            |
//!
//! Global options fall back to `PRICEBOOK_DB`, `PRICEBOOK_LOG_LEVEL` and
//! `PRICEBOOK_LOG_DIR`.

use clap::{Args, Parser, Subcommand};
use pricebook_core::IntervalInput;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "pricebook",
    version,
    about = "Keep priced date ranges free of overlaps"
)]
pub struct Cli {
    /// SQLite database file.
    #[arg(long, env = "PRICEBOOK_DB", default_value = "pricebook.sqlite3", global = true)]
    pub db: PathBuf,

    /// Log level (trace|debug|info|warn|error). Defaults by build mode.
    #[arg(long, env = "PRICEBOOK_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "PRICEBOOK_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    List,
    Get {
        id: String,
    },
    Insert(IntervalArgs),
    Update {
        #[arg(long)]
        id: String,
        #[command(flatten)]
        interval: IntervalArgs,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
    Clear,
}

/// Raw interval parameters; validation happens in the core request layer.
#[derive(Debug, Clone, Args)]
pub struct IntervalArgs {
    /// First day, `YYYY-MM-DD`.
    #[arg(long)]
    pub start_date: Option<String>,
    /// Last day (inclusive), `YYYY-MM-DD`.
    #[arg(long)]
    pub end_date: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub price: Option<String>,
}

impl IntervalArgs {
    pub fn to_input(&self, id: Option<String>) -> IntervalInput {
        IntervalInput {
            id,
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            price: self.price.clone(),
        }
    }
}
