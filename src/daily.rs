//! Replace-or-append decision for the row being recorded.
//!
//! Daily surveys hold at most one row per date: recording again for a date
//! edits that row. Other surveys always append.
use crate::clock::{format_date, format_time, Clock};
use crate::row::{Row, DATE_COLUMN, TIME_COLUMN};
use crate::survey::Survey;
use crate::table::HistoryTable;
use chrono::NaiveDate;

/// More than one row already exists for a daily survey's date.
#[derive(Debug)]
pub struct DuplicateDailyRows {
    pub date: String,
    pub count: usize,
}

impl std::fmt::Display for DuplicateDailyRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "daily survey has {} rows dated {}; fix the data file before recording",
            self.count, self.date
        )
    }
}

impl std::error::Error for DuplicateDailyRows {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMode {
    /// Drop the row at `index` and append the new one.
    Replace { index: usize },
    Append,
}

/// Where the new row goes and what it starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTarget {
    pub mode: TargetMode,
    pub seed: Row,
}

/// Decide replace-vs-append for `target_date`.
pub fn resolve_target(
    survey: &Survey,
    history: &HistoryTable,
    target_date: NaiveDate,
    clock: &dyn Clock,
) -> Result<DailyTarget, DuplicateDailyRows> {
    let date = format_date(target_date);
    if survey.daily {
        let matches = history.rows_dated(&date);
        match matches.as_slice() {
            [] => {}
            [index] => {
                let mut seed = history.row(*index).unwrap_or_default();
                for name in survey.question_names() {
                    seed.ensure(name);
                }
                tracing::info!(date = %date, row = index, "editing existing daily entry");
                return Ok(DailyTarget {
                    mode: TargetMode::Replace { index: *index },
                    seed,
                });
            }
            many => {
                return Err(DuplicateDailyRows {
                    date,
                    count: many.len(),
                })
            }
        }
    }
    Ok(DailyTarget {
        mode: TargetMode::Append,
        seed: blank_row(survey, &date, &format_time(clock.now())),
    })
}

/// Blank answers for every question plus `date` and `time`.
pub fn blank_row(survey: &Survey, date: &str, time: &str) -> Row {
    let mut row: Row = survey.question_names().map(|name| (name, "")).collect();
    row.set(DATE_COLUMN, date);
    row.set(TIME_COLUMN, time);
    row
}

/// Apply the decision: drop the replaced row, then append `row`.
pub fn commit(history: &mut HistoryTable, mode: TargetMode, row: &Row) {
    if let TargetMode::Replace { index } = mode {
        history.remove_row(index);
    }
    history.push_row(row);
}
