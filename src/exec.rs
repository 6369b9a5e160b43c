// src/exec.rs

//! External command execution
//!
//! The bootstrap never interprets command output; the exit status is the
//! only success signal. Output goes to a log file when one is given.

use crate::error::Result;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs shell commands synchronously
pub trait CommandRunner {
    /// Run `command`, appending combined output to `log_file` if given.
    /// Returns whether the command exited successfully.
    fn run(&self, command: &str, log_file: Option<&Path>) -> Result<bool>;
}

/// [`CommandRunner`] backed by `bash -c`
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }

    fn open_log(path: &Path) -> std::io::Result<File> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, log_file: Option<&Path>) -> Result<bool> {
        debug!("Running: bash -c \"{}\"", command);

        let mut cmd = Command::new("bash");
        cmd.arg("-c").arg(command).stdin(Stdio::null());

        match log_file {
            Some(path) => {
                let stdout = Self::open_log(path)?;
                let stderr = stdout.try_clone()?;
                cmd.stdout(stdout).stderr(stderr);
                let status = cmd.status()?;
                Ok(status.success())
            }
            None => {
                let output = cmd.output()?;
                if !output.stdout.is_empty() {
                    debug!("stdout:\n{}", String::from_utf8_lossy(&output.stdout));
                }
                if !output.stderr.is_empty() {
                    debug!("stderr:\n{}", String::from_utf8_lossy(&output.stderr));
                }
                Ok(output.status.success())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_runner_exit_status() {
        let runner = ShellRunner::new();
        assert!(runner.run("true", None).unwrap());
        assert!(!runner.run("exit 3", None).unwrap());
    }

    #[test]
    fn test_shell_runner_writes_log() {
        let temp = tempfile::tempdir().unwrap();
        let log = temp.path().join("logs/step.log");

        let ok = ShellRunner::new()
            .run("echo out; echo err >&2", Some(&log))
            .unwrap();
        assert!(ok);

        let content = fs::read_to_string(&log).unwrap();
        assert!(content.contains("out"));
        assert!(content.contains("err"));
    }
}
