//! Reconciliation of a local survey table with its remote copy.
//!
//! The bidirectional merge concatenates local then remote rows, drops exact
//! duplicates, and refuses to write anything if the result would hold fewer
//! rows than the local table. Two concurrent runs against the same survey
//! file are not supported; there is no locking.
mod remote;

#[cfg(test)]
pub(crate) use remote::{testing, RemoteCommandFailed};
pub use remote::{CommandRemote, Remote};

use crate::paths::{data_file_name, BagPaths};
use crate::table::HistoryTable;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Which way data flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Overwrite the remote with the local table.
    Up,
    /// Overwrite the local table with the remote.
    Down,
    /// Merge both and write the result to both sides.
    Both,
}

/// What a sync run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Pushed,
    Pulled,
    /// The remote had no copy yet; the local table was pushed as-is.
    FirstPush,
    Merged {
        local: usize,
        remote: usize,
        merged: usize,
    },
}

/// Merging would have dropped local rows; nothing was written.
#[derive(Debug)]
pub struct MergeLoss {
    pub local: usize,
    pub merged: usize,
}

impl std::fmt::Display for MergeLoss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sync aborted: merged table has {} rows but local has {}; local and remote left untouched",
            self.merged, self.local
        )
    }
}

impl std::error::Error for MergeLoss {}

/// Fetched remote copy, removed when dropped.
struct StagedCopy {
    path: PathBuf,
}

impl Drop for StagedCopy {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

pub struct SyncEngine<'a> {
    paths: &'a BagPaths,
    remote: &'a dyn Remote,
}

impl<'a> SyncEngine<'a> {
    pub fn new(paths: &'a BagPaths, remote: &'a dyn Remote) -> Self {
        Self { paths, remote }
    }

    pub fn sync(&self, survey: &str, direction: Direction) -> Result<SyncOutcome> {
        let local = self.paths.data_path(survey);
        let outcome = match direction {
            Direction::Up => {
                require_local(&local)?;
                self.remote.push(&local)?;
                SyncOutcome::Pushed
            }
            Direction::Down => {
                let data_dir = self.paths.data_dir();
                fs::create_dir_all(&data_dir)
                    .with_context(|| format!("create {}", data_dir.display()))?;
                self.remote.fetch(&data_file_name(survey), &data_dir)?;
                SyncOutcome::Pulled
            }
            Direction::Both => self.merge(survey, &local)?,
        };
        tracing::info!(survey, ?direction, ?outcome, "sync complete");
        Ok(outcome)
    }

    fn merge(&self, survey: &str, local_path: &Path) -> Result<SyncOutcome> {
        let file_name = data_file_name(survey);
        if !self.remote.exists(&file_name)? {
            require_local(local_path)?;
            self.remote.push(local_path)?;
            return Ok(SyncOutcome::FirstPush);
        }

        let staging = self.paths.staging_dir();
        fs::create_dir_all(&staging).with_context(|| format!("create {}", staging.display()))?;
        let staged = StagedCopy {
            path: staging.join(&file_name),
        };
        self.remote.fetch(&file_name, &staging)?;
        let remote = HistoryTable::read(&staged.path).context("load fetched remote table")?;
        let local = if local_path.is_file() {
            HistoryTable::read(local_path)?
        } else {
            HistoryTable::default()
        };
        if local.is_empty() {
            tracing::info!(survey, "no local rows; adopting the remote table");
        }

        let merged = merge_tables(&local, &remote)?;
        merged.save(local_path)?;
        self.remote.push(local_path)?;
        drop(staged);

        Ok(SyncOutcome::Merged {
            local: local.len(),
            remote: remote.len(),
            merged: merged.len(),
        })
    }
}

/// Concatenate local then remote rows, drop exact duplicates, and sort by
/// date and time. Fails with [`MergeLoss`] if local rows would be lost.
pub fn merge_tables(local: &HistoryTable, remote: &HistoryTable) -> Result<HistoryTable> {
    let mut merged = local.clone();
    merged.extend_from(remote);
    merged.dedup_rows();
    if merged.len() < local.len() {
        return Err(MergeLoss {
            local: local.len(),
            merged: merged.len(),
        }
        .into());
    }
    merged.sort_by_date_time();
    Ok(merged)
}

fn require_local(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(anyhow!("no local data at {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
