// src/container.rs

//! Handles to already-running build containers
//!
//! The bootstrap does not create or manage containers. It only executes
//! install commands through a container's command channel.

use crate::error::Result;
use std::process::Command;
use tracing::debug;

/// Output of a command executed inside a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    /// Combined stdout and stderr
    pub output: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Command channel of a running container
pub trait ContainerHandle {
    /// Short identifier for logging
    fn short_id(&self) -> &str;

    /// Execute `command` inside the container and wait for it
    fn exec(&self, command: &str) -> Result<ExecOutput>;
}

/// Container reached through the `docker` CLI
#[derive(Debug, Clone)]
pub struct DockerContainer {
    id: String,
}

impl DockerContainer {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl ContainerHandle for DockerContainer {
    fn short_id(&self) -> &str {
        self.id.get(..12).unwrap_or(&self.id)
    }

    fn exec(&self, command: &str) -> Result<ExecOutput> {
        debug!("docker exec {} sh -c \"{}\"", self.short_id(), command);
        let output = Command::new("docker")
            .args(["exec", &self.id, "sh", "-c", command])
            .output()?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            output: combined,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docker_short_id() {
        let container = DockerContainer::new("0123456789abcdef0123");
        assert_eq!(container.short_id(), "0123456789ab");
        assert_eq!(DockerContainer::new("abc").short_id(), "abc");
    }

    #[test]
    fn test_exec_output_success() {
        let ok = ExecOutput { exit_code: 0, output: String::new() };
        let failed = ExecOutput { exit_code: 1, output: "error".to_string() };
        assert!(ok.success());
        assert!(!failed.success());
    }
}
