// src/config.rs

//! Bootstrap configuration types
//!
//! The configuration is loaded once before orchestration starts and is
//! read-only for the duration of a run. Components receive it through
//! their constructors.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Target architecture for bootstrap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetArch {
    /// x86_64 / AMD64
    X86_64,
    /// AArch64 / ARM64
    Aarch64,
    /// RISC-V 64-bit
    Riscv64,
}

impl TargetArch {
    /// Architecture of the running host, x86_64 if unknown
    pub fn host() -> Self {
        Self::parse(std::env::consts::ARCH).unwrap_or(Self::X86_64)
    }

    /// Name used in artifact file names and output directories
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
            Self::Riscv64 => "riscv64",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some(Self::X86_64),
            "aarch64" | "arm64" => Some(Self::Aarch64),
            "riscv64" => Some(Self::Riscv64),
            _ => None,
        }
    }
}

impl Default for TargetArch {
    fn default() -> Self {
        Self::host()
    }
}

impl std::fmt::Display for TargetArch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Binary artifact repositories known to the bootstrap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Repository {
    /// Output of the current build run
    Current,
    /// Previously published main repository
    PreviousMain,
    /// Previously published extended repository
    PreviousExtended,
}

impl Repository {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::PreviousMain => "previous-main",
            Self::PreviousExtended => "previous-extended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "current" => Some(Self::Current),
            "previous-main" | "main" => Some(Self::PreviousMain),
            "previous-extended" | "extended" => Some(Self::PreviousExtended),
            _ => None,
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Host locations of the artifact repositories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryPaths {
    /// Current build output (contains `<arch>/` and `noarch/`)
    pub current: PathBuf,
    pub previous_main: PathBuf,
    pub previous_extended: PathBuf,
}

impl Default for RepositoryPaths {
    fn default() -> Self {
        Self {
            current: PathBuf::from("stage/RPMS"),
            previous_main: PathBuf::from("stage/PUBLISHRPMS"),
            previous_extended: PathBuf::from("stage/PUBLISHXRPMS"),
        }
    }
}

impl RepositoryPaths {
    pub fn path(&self, repo: Repository) -> &Path {
        match repo {
            Repository::Current => &self.current,
            Repository::PreviousMain => &self.previous_main,
            Repository::PreviousExtended => &self.previous_extended,
        }
    }
}

/// Where each repository is visible inside a build container
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerMounts {
    pub previous_main: PathBuf,
    pub previous_extended: PathBuf,
}

impl Default for ContainerMounts {
    fn default() -> Self {
        Self {
            previous_main: PathBuf::from("/publishrpms"),
            previous_extended: PathBuf::from("/publishxrpms"),
        }
    }
}

/// Renaming rule for packages published under another name
///
/// Example: `sqlite` is still published as `sqlite-autoconf` on x86_64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    pub package: String,
    pub alias: String,
    pub arch: TargetArch,
    /// Repositories the rule applies to; empty means all
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

impl AliasRule {
    /// Whether this rule renames `package` for a lookup on `arch` in `repo`
    pub fn applies(&self, package: &str, arch: TargetArch, repo: Repository) -> bool {
        self.package == package
            && self.arch == arch
            && (self.repositories.is_empty() || self.repositories.contains(&repo))
    }
}

/// Resolve `package` through `rules`, returning the first matching alias
pub fn apply_aliases<'a>(
    rules: &'a [AliasRule],
    package: &'a str,
    arch: TargetArch,
    repo: Repository,
) -> &'a str {
    rules
        .iter()
        .find(|r| r.applies(package, arch, repo))
        .map(|r| r.alias.as_str())
        .unwrap_or(package)
}

/// Routing of per-package override lists for a category of targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRoute {
    /// Target name fragments selecting this route (substring match)
    pub targets: Vec<String>,
    /// Repository the override packages are taken from
    pub repository: Repository,
    #[serde(default)]
    pub aliases: Vec<AliasRule>,
}

impl OverrideRoute {
    pub fn matches(&self, target: &str) -> bool {
        self.targets.iter().any(|t| target.contains(t.as_str()))
    }
}

/// Bootstrap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Target architecture
    pub arch: TargetArch,

    /// Build topology root inside each build root
    pub top_dir: PathBuf,

    /// Directory under which build roots are created
    pub build_root_base: PathBuf,

    /// Directory for bootstrap logs
    pub log_dir: PathBuf,

    /// Repository locations on the host
    pub repositories: RepositoryPaths,

    /// Repository locations inside a container
    pub container_mounts: ContainerMounts,

    /// Script that finishes build root population, called with the root path
    pub prepare_script: PathBuf,

    /// Script run inside the root to adjust compiler specs
    pub adjust_script: PathBuf,

    /// Package spec directories, one `<package>/` per package
    pub specs_dir: PathBuf,

    /// Downloaded source archives
    pub sources_dir: PathBuf,

    /// Always search current output for every toolchain package
    pub strict_artifact_check: bool,

    /// Core toolchain packages in build order
    pub core_packages: Vec<String>,

    /// Toolchain packages installed into every build root
    pub toolchain_packages: Vec<String>,

    /// Toolchain packages installed into build containers
    pub container_toolchain_packages: Vec<String>,

    /// Packages with no published version yet, produced later in the run
    pub provided_after_build: Vec<String>,

    /// Extra toolchain packages keyed by target package
    pub per_package_toolchain: BTreeMap<String, Vec<String>>,

    /// Architecture-conditional renaming rules
    pub aliases: Vec<AliasRule>,

    /// Override routes checked before the default previous-main lookup
    pub override_routes: Vec<OverrideRoute>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            arch: TargetArch::host(),
            top_dir: PathBuf::from("/usr/src/photon"),
            build_root_base: PathBuf::from("/mnt"),
            log_dir: PathBuf::from("stage/LOGS"),
            repositories: RepositoryPaths::default(),
            container_mounts: ContainerMounts::default(),
            prepare_script: PathBuf::from("./prepare-build-root.sh"),
            adjust_script: PathBuf::from("adjust-tool-chain.sh"),
            specs_dir: PathBuf::from("SPECS"),
            sources_dir: PathBuf::from("stage/SOURCES"),
            strict_artifact_check: false,
            core_packages: Vec::new(),
            toolchain_packages: Vec::new(),
            container_toolchain_packages: Vec::new(),
            provided_after_build: Vec::new(),
            per_package_toolchain: BTreeMap::new(),
            aliases: Vec::new(),
            override_routes: Vec::new(),
        }
    }
}

impl BootstrapConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Set the target architecture
    pub fn with_arch(mut self, arch: TargetArch) -> Self {
        self.arch = arch;
        self
    }

    pub fn with_build_root_base(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_root_base = path.into();
        self
    }

    pub fn with_log_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_dir = path.into();
        self
    }

    pub fn with_repositories(mut self, repositories: RepositoryPaths) -> Self {
        self.repositories = repositories;
        self
    }

    pub fn with_strict_artifact_check(mut self, strict: bool) -> Self {
        self.strict_artifact_check = strict;
        self
    }

    pub fn with_core_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core_packages = packages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_toolchain_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.toolchain_packages = packages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prepare_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.prepare_script = path.into();
        self
    }

    pub fn with_container_toolchain_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.container_toolchain_packages = packages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_provided_after_build<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provided_after_build = packages.into_iter().map(Into::into).collect();
        self
    }

    /// Add an extra toolchain list installed when building `target`
    pub fn with_package_toolchain<I, S>(mut self, target: impl Into<String>, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.per_package_toolchain
            .insert(target.into(), packages.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_override_route(mut self, route: OverrideRoute) -> Self {
        self.override_routes.push(route);
        self
    }

    pub fn with_alias(mut self, rule: AliasRule) -> Self {
        self.aliases.push(rule);
        self
    }

    /// Override route for a target package, if any
    pub fn override_route(&self, target: &str) -> Option<&OverrideRoute> {
        self.override_routes.iter().find(|r| r.matches(target))
    }

    /// Freeze the package lists into a plan
    pub fn plan(&self) -> ToolchainPlan {
        ToolchainPlan {
            default_packages: self.toolchain_packages.clone(),
            container_packages: self.container_toolchain_packages.clone(),
            overrides: self.per_package_toolchain.clone(),
        }
    }
}

/// Toolchain package lists for one bootstrap run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainPlan {
    default_packages: Vec<String>,
    container_packages: Vec<String>,
    overrides: BTreeMap<String, Vec<String>>,
}

impl ToolchainPlan {
    pub fn default_packages(&self) -> &[String] {
        &self.default_packages
    }

    pub fn container_packages(&self) -> &[String] {
        &self.container_packages
    }

    /// Override list for a target package
    pub fn overrides_for(&self, target: &str) -> Option<&[String]> {
        self.overrides.get(target).map(Vec::as_slice)
    }

    /// Position of `package` in the default list
    pub fn position(&self, package: &str) -> Option<usize> {
        self.default_packages.iter().position(|p| p == package)
    }
}
