// src/error.rs

//! Error types for the toolchain bootstrap
//!
//! Every variant is fatal to the running bootstrap. "Nothing found" is never
//! an error here: lookups return `Option` and callers decide whether an
//! absent artifact is acceptable.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the bootstrap core
#[derive(Debug, Error)]
pub enum Error {
    /// A required artifact or lookup target does not exist
    #[error("Input error: {0}")]
    Input(String),

    /// More than one artifact file matches a package name in one location
    #[error("Found {} rpm files for package {package} in {}: {}", .candidates.len(), .location.display(), join_paths(.candidates))]
    AmbiguousArtifact {
        package: String,
        location: PathBuf,
        candidates: Vec<PathBuf>,
    },

    /// Root skeleton creation or the preparation script failed
    #[error("Build root {}: {message}", .root.display())]
    BuildRoot { root: PathBuf, message: String },

    /// The forced package install exited non-zero
    #[error("Installing toolchain into {target} failed: {command}")]
    Install { target: String, command: String },

    /// The external package build failed
    #[error("Build failed for {package}: {message}")]
    BuildFailure { package: String, message: String },

    /// Configuration file could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Package spec could not be parsed
    #[error("Spec parse error in {}: {message}", .path.display())]
    Spec { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
