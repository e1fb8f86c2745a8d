//! Typed paths into a bag data root.
//!
//! Centralizing path construction keeps the recorder, the tail view, and the
//! sync engine pointed at the same files.
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding the data root.
pub const ROOT_ENV: &str = "BAG_PATH";

/// Convenience wrapper for locating survey schemas and data files.
#[derive(Debug, Clone)]
pub struct BagPaths {
    root: PathBuf,
}

impl BagPaths {
    /// Create a new path helper rooted at the data root.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve the data root from an explicit flag, `BAG_PATH`, or the
    /// platform data directory, in that order.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::new(path.to_path_buf()));
        }
        if let Some(value) = std::env::var_os(ROOT_ENV) {
            if !value.is_empty() {
                return Ok(Self::new(PathBuf::from(value)));
            }
        }
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow!("cannot determine home directory"))?;
        Ok(Self::new(data_dir.join("bag")))
    }

    /// Return the data root used for path derivation.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `config.json` path.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Return the `surveys/` directory path.
    pub fn surveys_dir(&self) -> PathBuf {
        self.root.join("surveys")
    }

    /// Return the `data/` directory path.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Return the `surveys/<name>.yaml` path.
    pub fn survey_path(&self, name: &str) -> PathBuf {
        self.surveys_dir().join(format!("{name}.yaml"))
    }

    /// Return the `data/<name>.csv` path.
    pub fn data_path(&self, name: &str) -> PathBuf {
        self.data_dir().join(data_file_name(name))
    }

    /// Return the staging directory remote copies are fetched into.
    pub fn staging_dir(&self) -> PathBuf {
        self.data_dir().join("tmp")
    }

    /// Return the scratch document used for editor hand-off.
    pub fn editor_scratch_path(&self, name: &str) -> PathBuf {
        self.data_dir().join(format!(".{name}.tmp"))
    }
}

/// File name of a survey's tabular store, shared by local and remote sides.
pub fn data_file_name(name: &str) -> String {
    format!("{name}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_at_data_root() {
        let paths = BagPaths::new(PathBuf::from("/srv/bag"));
        assert_eq!(
            paths.survey_path("mood"),
            PathBuf::from("/srv/bag/surveys/mood.yaml")
        );
        assert_eq!(paths.data_path("mood"), PathBuf::from("/srv/bag/data/mood.csv"));
        assert_eq!(paths.staging_dir(), PathBuf::from("/srv/bag/data/tmp"));
        assert_eq!(
            paths.editor_scratch_path("mood"),
            PathBuf::from("/srv/bag/data/.mood.tmp")
        );
    }

    #[test]
    fn explicit_root_wins() {
        let paths = BagPaths::resolve(Some(Path::new("/tmp/elsewhere"))).expect("resolve");
        assert_eq!(paths.root(), Path::new("/tmp/elsewhere"));
    }
}
