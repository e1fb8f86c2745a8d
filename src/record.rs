//! One recording run and the read-only helpers around it.
//!
//! Recording loads the survey and its history, decides replace-vs-append for
//! the target date, collects answers with the chosen strategy, and writes the
//! table back in one atomic save.
use crate::clock::{format_date, shift_days, Clock};
use crate::config::BagConfig;
use crate::daily::{self, TargetMode};
use crate::paths::BagPaths;
use crate::row::Row;
use crate::session::{Input, InputStrategy, Prompter, SessionContext};
use crate::survey::Survey;
use crate::sync::{Direction, Remote, SyncEngine};
use crate::table::HistoryTable;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Inputs for a single recording run.
#[derive(Debug, Clone, Default)]
pub struct RecordRequest<'a> {
    pub survey: &'a str,
    /// Days before today to record for.
    pub offset: i64,
    pub use_editor: bool,
    /// JSON document seeding a new row.
    pub from_file: Option<&'a Path>,
}

/// What a recording run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub mode: TargetMode,
    pub row: Row,
}

/// Record one entry and save the table.
pub fn run_record(
    paths: &BagPaths,
    config: &BagConfig,
    request: &RecordRequest<'_>,
    clock: &dyn Clock,
    prompter: &mut dyn Prompter,
) -> Result<Recorded> {
    let name = request.survey;
    let survey = Survey::load(name, &paths.survey_path(name))?;
    let data_path = paths.data_path(name);
    let mut history = HistoryTable::load(&data_path, &survey)?;

    let target_date = shift_days(clock.today(), request.offset.saturating_neg());
    let target = daily::resolve_target(&survey, &history, target_date, clock)?;
    let seed = match (target.mode, request.from_file) {
        (TargetMode::Append, Some(path)) => overlay_seed_file(target.seed, path)?,
        _ => target.seed,
    };

    let strategy = if request.use_editor {
        InputStrategy::Editor {
            command: config.editor_command()?,
            scratch: paths.editor_scratch_path(name),
        }
    } else {
        InputStrategy::Incremental
    };
    let ctx = SessionContext {
        survey: &survey,
        history: &history,
        clock,
    };
    let row = strategy.collect(&ctx, seed, prompter)?;

    daily::commit(&mut history, target.mode, &row);
    let data_dir = paths.data_dir();
    fs::create_dir_all(&data_dir).with_context(|| format!("create {}", data_dir.display()))?;
    history.save(&data_path)?;
    tracing::info!(
        survey = %survey.name,
        date = %format_date(target_date),
        replaced = matches!(target.mode, TargetMode::Replace { .. }),
        rows = history.len(),
        "entry recorded"
    );
    Ok(Recorded {
        mode: target.mode,
        row,
    })
}

/// Values from a JSON document layered over the blank seed. The seed's
/// `date` and `time` stay unless the document sets them.
fn overlay_seed_file(mut seed: Row, path: &Path) -> Result<Row> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let values: Row = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse seed JSON {}", path.display()))?;
    for (name, value) in values.iter() {
        seed.set(name, value);
    }
    Ok(seed)
}

/// Ask whether to sync after a write; only `y`/`Y` syncs. A failed sync is
/// reported and leaves the committed local write in place.
pub fn offer_sync<R, F>(
    paths: &BagPaths,
    survey: &str,
    prompter: &mut dyn Prompter,
    connect: F,
) -> Result<bool>
where
    R: Remote,
    F: FnOnce() -> Result<R>,
{
    prompter.show("sync? (y/N)");
    let accepted = matches!(
        prompter.read_line("> ", "", &[])?,
        Input::Line(reply) if matches!(reply.trim(), "y" | "Y")
    );
    if !accepted {
        return Ok(false);
    }
    let result = connect().and_then(|remote| {
        print_progress("syncing ... ");
        SyncEngine::new(paths, &remote).sync(survey, Direction::Both)
    });
    match result {
        Ok(_) => println!("done"),
        Err(err) => {
            tracing::warn!(survey, error = %err, "post-record sync failed");
            eprintln!("sync failed: {err:#}");
        }
    }
    Ok(true)
}

/// Print without a newline so the result lands on the same line.
pub fn print_progress(message: &str) {
    print!("{message}");
    let _ = std::io::stdout().flush();
}

/// Last `count` lines of the survey's data file.
pub fn tail_lines(paths: &BagPaths, survey: &str, count: usize) -> Result<Vec<String>> {
    let path = paths.data_path(survey);
    if !path.is_file() {
        return Err(anyhow!("no data for survey {survey} at {}", path.display()));
    }
    let text = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    Ok(lines[start..].iter().map(|line| line.to_string()).collect())
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
