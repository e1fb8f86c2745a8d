//! Shared test infrastructure for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Environment the binary reads; cleared so the host setup cannot leak in.
const HOST_ENV: [&str; 6] = [
    "BAG_PATH",
    "BAG_REMOTE",
    "BAG_REMOTE_COMMAND",
    "VISUAL",
    "EDITOR",
    "RUST_LOG",
];

/// A throwaway data root plus helpers to run `bag` against it.
pub struct BagFixture {
    dir: TempDir,
    envs: Vec<(String, String)>,
}

impl BagFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        fs::create_dir_all(dir.path().join("bag/surveys")).expect("create surveys dir");
        fs::create_dir_all(dir.path().join("bag/data")).expect("create data dir");
        Self {
            dir,
            envs: Vec::new(),
        }
    }

    /// Scratch space outside the data root.
    pub fn scratch(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("bag")
    }

    pub fn data_path(&self, survey: &str) -> PathBuf {
        self.root().join("data").join(format!("{survey}.csv"))
    }

    pub fn write_survey(&self, name: &str, yaml: &str) {
        let path = self.root().join("surveys").join(format!("{name}.yaml"));
        fs::write(&path, yaml).expect("write survey");
    }

    pub fn write_data(&self, survey: &str, csv: &str) {
        fs::write(self.data_path(survey), csv).expect("write data");
    }

    pub fn write_config(&self, config: &serde_json::Value) {
        let text = serde_json::to_string_pretty(config).expect("serialize config");
        fs::write(self.root().join("config.json"), text).expect("write config");
    }

    pub fn data(&self, survey: &str) -> String {
        fs::read_to_string(self.data_path(survey)).expect("read data")
    }

    /// Set an environment variable for every later run.
    pub fn env(&mut self, key: &str, value: &str) {
        self.envs.push((key.to_string(), value.to_string()));
    }

    /// Run `bag` with stdin closed.
    pub fn run(&self, args: &[&str]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_bag"));
        for key in HOST_ENV {
            command.env_remove(key);
        }
        command
            .env("BAG_PATH", self.root())
            .envs(self.envs.iter().map(|(key, value)| (key, value)))
            .args(args)
            .stdin(Stdio::null())
            .output()
            .expect("run bag")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
