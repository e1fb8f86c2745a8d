//! Remote copies of survey tables, reached through an external transfer
//! command (rclone by default).
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

/// Exit status the transfer command uses for "file or directory not found".
pub const NOT_FOUND_EXIT: i32 = 3;

/// A place holding remote copies of survey tables.
pub trait Remote {
    /// Whether `file_name` exists remotely.
    fn exists(&self, file_name: &str) -> Result<bool>;
    /// Copy remote `file_name` into the local directory `dest_dir`.
    fn fetch(&self, file_name: &str, dest_dir: &Path) -> Result<()>;
    /// Copy `local` to the remote, overwriting the remote file of that name.
    fn push(&self, local: &Path) -> Result<()>;
}

/// The transfer command exited unsuccessfully.
#[derive(Debug)]
pub struct RemoteCommandFailed {
    pub command: String,
    pub code: Option<i32>,
    pub stderr: String,
}

impl std::fmt::Display for RemoteCommandFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "`{}` exited with status {code}", self.command)?,
            None => write!(f, "`{}` was terminated by a signal", self.command)?,
        }
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            write!(f, ": {stderr}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RemoteCommandFailed {}

/// Remote driven by an rclone-compatible command line.
#[derive(Debug, Clone)]
pub struct CommandRemote {
    program: PathBuf,
    args: Vec<String>,
    location: String,
}

impl CommandRemote {
    /// `command` is the program plus leading arguments; `location` is the
    /// remote directory in the tool's own syntax (e.g. `gdrive:bag`).
    pub fn new(command: &[String], location: &str) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow!("remote command is empty"))?;
        let program = which::which(program)
            .with_context(|| format!("remote command `{program}` not found on PATH"))?;
        Ok(Self {
            program,
            args: args.to_vec(),
            location: location.to_string(),
        })
    }

    fn remote_file(&self, file_name: &str) -> String {
        if self.location.ends_with(':') || self.location.ends_with('/') {
            format!("{}{file_name}", self.location)
        } else {
            format!("{}/{file_name}", self.location)
        }
    }

    /// Run one transfer subcommand, returning its exit code on failure.
    fn run(&self, verb: &str, operands: &[&str]) -> Result<Result<(), RemoteCommandFailed>> {
        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(verb)
            .args(operands)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("spawn remote command {}", self.program.display()))?;
        tracing::info!(
            program = %self.program.display(),
            verb,
            operands = ?operands,
            code = ?output.status.code(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "remote command complete"
        );
        if output.status.success() {
            return Ok(Ok(()));
        }
        let mut rendered = vec![self.program.display().to_string()];
        rendered.extend(self.args.iter().cloned());
        rendered.push(verb.to_string());
        rendered.extend(operands.iter().map(|operand| operand.to_string()));
        Ok(Err(RemoteCommandFailed {
            command: shell_words::join(rendered),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }))
    }
}

impl Remote for CommandRemote {
    fn exists(&self, file_name: &str) -> Result<bool> {
        let target = self.remote_file(file_name);
        match self.run("lsf", &[target.as_str()])? {
            Ok(()) => Ok(true),
            Err(failed) if failed.code == Some(NOT_FOUND_EXIT) => Ok(false),
            Err(failed) => Err(failed.into()),
        }
    }

    fn fetch(&self, file_name: &str, dest_dir: &Path) -> Result<()> {
        let source = self.remote_file(file_name);
        let dest = dest_dir.to_string_lossy();
        self.run("copy", &[source.as_str(), &*dest])??;
        Ok(())
    }

    fn push(&self, local: &Path) -> Result<()> {
        let source = local.to_string_lossy();
        self.run("copy", &[&*source, self.location.as_str()])??;
        Ok(())
    }
}

impl<T: Remote + ?Sized> Remote for &T {
    fn exists(&self, file_name: &str) -> Result<bool> {
        (**self).exists(file_name)
    }

    fn fetch(&self, file_name: &str, dest_dir: &Path) -> Result<()> {
        (**self).fetch(file_name, dest_dir)
    }

    fn push(&self, local: &Path) -> Result<()> {
        (**self).push(local)
    }
}
