//! Hand a whole row to an external editor.
use crate::row::Row;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Scratch document that is removed on every exit path.
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    fn create(path: &Path, contents: &[u8]) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Write `seed` to `scratch` as JSON, run `command` on it, and read the
/// edited document back as the row.
pub fn edit_row(command: &[String], scratch: &Path, seed: &Row) -> Result<Row> {
    let text = serde_json::to_string_pretty(seed).context("serialize row for editor")?;
    let file = ScratchFile::create(scratch, text.as_bytes())?;

    run_editor(command, &file.path)?;

    let edited = fs::read_to_string(&file.path)
        .with_context(|| format!("read edited row {}", file.path.display()))?;
    let row: Row = serde_json::from_str(&edited)
        .with_context(|| format!("parse edited row {}", file.path.display()))?;
    Ok(row)
}

fn run_editor(command: &[String], path: &Path) -> Result<()> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| anyhow!("missing editor command"))?;
    tracing::debug!(program = %program, path = %path.display(), "launching editor");
    let status = Command::new(program)
        .args(args)
        .arg(path)
        .status()
        .with_context(|| format!("run editor {program}"))?;
    if !status.success() {
        return Err(anyhow!("editor {program} exited with {status}"));
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into(), "editor".into()]
    }

    fn seed() -> Row {
        [("mood", ""), ("date", "2024-06-01"), ("time", "08:00")]
            .into_iter()
            .collect()
    }

    #[test]
    fn unchanged_document_returns_seed() {
        let dir = TempDir::new().expect("tempdir");
        let scratch = dir.path().join(".mood.tmp");
        let row = edit_row(&sh("exit 0"), &scratch, &seed()).expect("edit");
        assert_eq!(row, seed());
        assert!(!scratch.exists());
    }

    #[test]
    fn edited_document_is_read_back_verbatim() {
        let dir = TempDir::new().expect("tempdir");
        let scratch = dir.path().join(".mood.tmp");
        let script = r#"printf '{"mood": "good", "date": "2024-06-01", "time": "08:00", "extra": 3}' > "$1""#;
        let row = edit_row(&sh(script), &scratch, &seed()).expect("edit");
        assert_eq!(row.get("mood"), Some("good"));
        assert_eq!(row.get("extra"), Some("3"));
        assert!(!scratch.exists());
    }

    #[test]
    fn failing_editor_is_surfaced_and_cleaned_up() {
        let dir = TempDir::new().expect("tempdir");
        let scratch = dir.path().join(".mood.tmp");
        let err = edit_row(&sh("exit 4"), &scratch, &seed()).expect_err("editor failure");
        assert!(err.to_string().contains("exited"));
        assert!(!scratch.exists());
    }

    #[test]
    fn malformed_document_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let scratch = dir.path().join(".mood.tmp");
        let err = edit_row(&sh(r#"echo 'not json' > "$1""#), &scratch, &seed())
            .expect_err("parse failure");
        assert!(format!("{err:#}").contains("parse edited row"));
        assert!(!scratch.exists());
    }
}
