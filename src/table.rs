//! Tabular store for survey answers.
//!
//! Tables are read and written whole as CSV. Every cell is text and the empty
//! string is an ordinary value, never a missing-value marker. The column set
//! only grows: columns dropped from a survey stay in the file.
use crate::row::{Row, DATE_COLUMN, TIME_COLUMN};
use crate::survey::Survey;
use anyhow::{anyhow, Context, Result};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Rows of one survey, every row carrying every column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl HistoryTable {
    /// Empty table with exactly the survey's columns plus `date`/`time`.
    #[cfg(test)]
    pub fn for_survey(survey: &Survey) -> Self {
        let mut table = Self::default();
        table.reconcile(survey);
        table
    }

    /// Load `path` for `survey` and reconcile its columns.
    ///
    /// A missing file yields an empty table; it is not an error.
    pub fn load(path: &Path, survey: &Survey) -> Result<Self> {
        let mut table = if path.is_file() {
            Self::read(path)?
        } else {
            Self::default()
        };
        table.reconcile(survey);
        tracing::debug!(
            path = %path.display(),
            rows = table.len(),
            columns = table.columns.len(),
            "history loaded"
        );
        Ok(table)
    }

    /// Read a CSV file as-is, without any schema.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_csv(&bytes).with_context(|| format!("parse CSV {}", path.display()))
    }

    /// Parse CSV bytes; the first record is the header.
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(|byte| byte.is_ascii_whitespace()) {
            return Ok(Self::default());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(bytes);
        let columns: Vec<String> = reader
            .headers()
            .context("read CSV header")?
            .iter()
            .map(str::to_string)
            .collect();
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(anyhow!("duplicate column {column:?}"));
            }
        }
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("read CSV record")?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { columns, rows })
    }

    /// Render the table as CSV bytes.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        writer
            .write_record(&self.columns)
            .context("write CSV header")?;
        for row in &self.rows {
            writer.write_record(row).context("write CSV record")?;
        }
        writer.into_inner().context("flush CSV writer")
    }

    /// Replace the file at `path` with this table.
    ///
    /// The table is written to a sibling temporary file and renamed into
    /// place, so readers see either the old file or the new one.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        let bytes = self.to_csv()?;
        let mut staged = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("create temp file in {}", parent.display()))?;
        staged
            .write_all(&bytes)
            .with_context(|| format!("write {}", staged.path().display()))?;
        staged
            .as_file()
            .sync_all()
            .with_context(|| format!("sync {}", staged.path().display()))?;
        staged
            .persist(path)
            .map_err(|err| err.error)
            .with_context(|| format!("replace {}", path.display()))?;
        tracing::debug!(path = %path.display(), rows = self.len(), "history saved");
        Ok(())
    }

    /// Add every survey question, `date`, and `time` missing from the
    /// columns, filling existing rows with empty strings.
    pub fn reconcile(&mut self, survey: &Survey) {
        for name in survey.question_names() {
            self.ensure_column(name);
        }
        self.ensure_column(DATE_COLUMN);
        self.ensure_column(TIME_COLUMN);
    }

    /// Append `name` as an empty column unless present; returns its index.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.columns.len() - 1
    }

    #[cfg(test)]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (`index`, `column`); empty when the column does not exist.
    pub fn value(&self, index: usize, column: &str) -> &str {
        match (self.rows.get(index), self.column_index(column)) {
            (Some(row), Some(col)) => row[col].as_str(),
            _ => "",
        }
    }

    /// Values of `column` from the newest row to the oldest.
    pub fn column_values_newest_first<'a>(
        &'a self,
        column: &str,
    ) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        let col = self.column_index(column);
        self.rows
            .iter()
            .enumerate()
            .rev()
            .filter_map(move |(index, row)| col.map(|col| (index, row[col].as_str())))
    }

    /// Indices of rows whose `date` equals `date`.
    pub fn rows_dated(&self, date: &str) -> Vec<usize> {
        let Some(col) = self.column_index(DATE_COLUMN) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row[col] == date)
            .map(|(index, _)| index)
            .collect()
    }

    /// Row `index` as a name-to-value mapping in column order.
    pub fn row(&self, index: usize) -> Option<Row> {
        let row = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect(),
        )
    }

    /// Append `row`; fields naming unknown columns add those columns.
    pub fn push_row(&mut self, row: &Row) {
        for (name, _) in row.iter() {
            self.ensure_column(name);
        }
        let cells = self
            .columns
            .iter()
            .map(|column| row.get(column).unwrap_or_default().to_string())
            .collect();
        self.rows.push(cells);
    }

    pub fn remove_row(&mut self, index: usize) -> Option<Row> {
        let row = self.row(index)?;
        self.rows.remove(index);
        Some(row)
    }

    /// Append all rows of `other`, aligning columns by name.
    pub fn extend_from(&mut self, other: &HistoryTable) {
        for column in &other.columns {
            self.ensure_column(column);
        }
        for row in &other.rows {
            let cells = self
                .columns
                .iter()
                .map(|column| match other.column_index(column) {
                    Some(col) => row[col].clone(),
                    None => String::new(),
                })
                .collect();
            self.rows.push(cells);
        }
    }

    /// Drop rows equal in every column to an earlier row.
    pub fn dedup_rows(&mut self) {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.clone()));
    }

    /// Stable sort by (`date`, `time`), rows without a date first.
    pub fn sort_by_date_time(&mut self) {
        let date = self.column_index(DATE_COLUMN);
        let time = self.column_index(TIME_COLUMN);
        self.rows.sort_by(|left, right| {
            let by_date = match (cell(left, date), cell(right, date)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            };
            by_date.then_with(|| cell(left, time).cmp(&cell(right, time)))
        });
    }
}

fn cell(row: &[String], col: Option<usize>) -> Option<&str> {
    col.map(|col| row[col].as_str())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
