// src/lib.rs

//! Core toolchain bootstrap for an rpm-based distribution
//!
//! Builds the compiler and build-essential packages, in a fixed order, each
//! inside a fresh isolated build root populated from previously published
//! binary artifacts and from artifacts built earlier in the same run.
//!
//! # Architecture
//!
//! - `config`: one immutable configuration value passed to every component
//! - `spec`: queries over parsed package specs
//! - `artifact`: locating binary artifacts across repositories
//! - `buildroot`: build root lifecycle (create, prepare, destroy)
//! - `toolchain`: installing toolchain artifacts into roots or containers
//! - `bootstrap`: the per-package orchestration loop

pub mod artifact;
pub mod bootstrap;
pub mod buildroot;
pub mod config;
pub mod container;
mod error;
pub mod exec;
pub mod spec;
pub mod toolchain;

pub use artifact::{ArtifactCandidate, ArtifactLocator, Resolution};
pub use bootstrap::{
    BootstrapOrchestrator, BootstrapProgress, PackageBuilder, PackagePhase, RpmBuilder,
};
pub use buildroot::{BuildRootHandle, BuildRootManager, RootState};
pub use config::{AliasRule, BootstrapConfig, OverrideRoute, Repository, TargetArch, ToolchainPlan};
pub use container::{ContainerHandle, DockerContainer, ExecOutput};
pub use error::{Error, Result};
pub use exec::{CommandRunner, ShellRunner};
pub use spec::{PackageSpec, SpecMetadata, SpecParser, TomlSpecParser};
pub use toolchain::{InstallTarget, ToolchainInstaller};
