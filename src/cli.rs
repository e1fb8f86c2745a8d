//! CLI argument parsing for the journaling tool.
//!
//! One survey per invocation; flags pick the input strategy, the target date,
//! or a sync direction instead of recording.
use crate::sync::Direction;
use clap::Parser;
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "bag",
    version,
    about = "Structured personal journaling from the terminal",
    after_help = "Examples:\n  bag mood                 Answer the mood survey for today\n  bag mood -o 1            Record yesterday's entry\n  bag mood -e              Fill in the entry with $EDITOR\n  bag mood --sync          Merge local and remote copies\n  bag mood --tail 5        Show the last five rows"
)]
pub struct RootArgs {
    /// Survey name (matches surveys/<name>.yaml)
    pub survey: Option<String>,

    /// Collect answers in an external editor instead of prompting
    #[arg(short, long)]
    pub editor: bool,

    /// Record for N days in the past
    #[arg(
        short,
        long,
        value_name = "N",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub offset: i64,

    /// Merge local and remote tables and write the result to both
    #[arg(long, conflicts_with_all = ["sync_up", "sync_down"])]
    pub sync: bool,

    /// Overwrite the remote table with the local one
    #[arg(long, conflicts_with = "sync_down")]
    pub sync_up: bool,

    /// Overwrite the local table with the remote one
    #[arg(long)]
    pub sync_down: bool,

    /// Print the last N rows of the data file (default 10)
    #[arg(
        long,
        value_name = "N",
        num_args = 0..=1,
        default_missing_value = "10"
    )]
    pub tail: Option<usize>,

    /// Seed a new entry from the JSON object in PATH
    #[arg(long, value_name = "PATH")]
    pub from_file: Option<PathBuf>,

    /// Data root (defaults to $BAG_PATH, then the platform data directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

impl RootArgs {
    /// Requested sync direction, if any.
    pub fn sync_direction(&self) -> Option<Direction> {
        if self.sync {
            Some(Direction::Both)
        } else if self.sync_up {
            Some(Direction::Up)
        } else if self.sync_down {
            Some(Direction::Down)
        } else {
            None
        }
    }
}
