// src/toolchain.rs

//! Toolchain installation into build roots and containers
//!
//! Resolves the toolchain package lists to artifact files and installs them
//! in one forced batch. Dependency checks are skipped on purpose: the target
//! root is not self-consistent until the toolchain is complete.
//!
//! # Lookup precedence
//!
//! With strict artifact checking every package is searched in the current
//! build output first, then in the previously published repository. Without
//! it, only packages that come *before* the target in the toolchain list
//! may come from the current build; the target itself and everything after
//! it must come from previously published artifacts.

use crate::artifact::{ArtifactCandidate, ArtifactLocator, Resolution};
use crate::buildroot::{BuildRootHandle, BuildRootManager};
use crate::config::{BootstrapConfig, Repository, ToolchainPlan};
use crate::container::ContainerHandle;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Repository order for toolchain packages that may come from this run
pub const TOOLCHAIN_SEARCH_ORDER: &[Repository] = &[Repository::Current, Repository::PreviousMain];

/// Repository order for toolchain packages that must be previously published
pub const PUBLISHED_SEARCH_ORDER: &[Repository] = &[Repository::PreviousMain];

/// Where toolchain artifacts are installed
#[derive(Clone, Copy)]
pub enum InstallTarget<'a> {
    Root(&'a BuildRootHandle),
    Container(&'a dyn ContainerHandle),
}

impl InstallTarget<'_> {
    pub fn describe(&self) -> String {
        match self {
            Self::Root(root) => root.path().display().to_string(),
            Self::Container(container) => format!("container {}", container.short_id()),
        }
    }
}

/// Host rpm invocation; unprivileged runs go through fakeroot-ng
pub fn rpm_command(as_root: bool) -> &'static str {
    if as_root { "rpm" } else { "fakeroot-ng rpm" }
}

/// Installs default and per-package toolchains
pub struct ToolchainInstaller {
    config: BootstrapConfig,
    locator: ArtifactLocator,
    roots: Arc<BuildRootManager>,
    plan: ToolchainPlan,
    rpm_command: &'static str,
}

impl ToolchainInstaller {
    pub fn new(config: &BootstrapConfig, roots: Arc<BuildRootManager>) -> Self {
        Self {
            config: config.clone(),
            locator: ArtifactLocator::new(config),
            roots,
            plan: config.plan(),
            rpm_command: rpm_command(nix::unistd::geteuid().is_root()),
        }
    }

    pub fn plan(&self) -> &ToolchainPlan {
        &self.plan
    }

    pub fn locator(&self) -> &ArtifactLocator {
        &self.locator
    }

    /// Per-package log directory
    pub fn package_log_dir(&self, package: &str) -> PathBuf {
        self.config.log_dir.join(format!("build-{}", package))
    }

    /// Repositories searched for `candidate` when building `target`
    pub fn search_order(&self, list: &[String], candidate: &str, target: &str) -> &'static [Repository] {
        if self.config.strict_artifact_check {
            return TOOLCHAIN_SEARCH_ORDER;
        }
        let target_pos = list.iter().position(|p| p == target);
        let candidate_pos = list.iter().position(|p| p == candidate);
        match (target_pos, candidate_pos) {
            (None, _) => TOOLCHAIN_SEARCH_ORDER,
            (Some(t), Some(c)) if c < t => TOOLCHAIN_SEARCH_ORDER,
            _ => PUBLISHED_SEARCH_ORDER,
        }
    }

    /// Install the default toolchain list for building `package`
    pub fn install_default(
        &self,
        target: InstallTarget<'_>,
        package: &str,
    ) -> Result<Vec<ArtifactCandidate>> {
        info!("Installing tool chain RPMS into {}", target.describe());

        let list = match target {
            InstallTarget::Root(_) => self.plan.default_packages(),
            InstallTarget::Container(_) => self.plan.container_packages(),
        };

        let mut artifacts = Vec::new();
        for name in list {
            let order = self.search_order(list, name, package);
            match self.locator.find_across_repositories(name, order)? {
                Resolution::Found(candidate) => artifacts.push(candidate),
                Resolution::Deferred => continue,
                Resolution::NotFound => {
                    error!("Unable to find rpm {} in current and previous versions", name);
                    return Err(Error::Input(format!(
                        "Unable to find rpm {} in current and previous versions",
                        name
                    )));
                }
            }
        }

        let command = match target {
            InstallTarget::Root(root) => self.root_install_command(root, &artifacts),
            InstallTarget::Container(_) => format!(
                "/usr/bin/bash -l -c '/usr/bin/rpm -Uvh --force --nodeps {}'",
                self.container_files(&artifacts)
            ),
        };
        self.execute(target, &artifacts, &command, package, "install_toolchain_rpms.log")?;

        info!("Successfully installed default tool chain RPMS into {}", target.describe());
        Ok(artifacts)
    }

    /// Install a per-package override list for building `package`
    pub fn install_custom(
        &self,
        target: InstallTarget<'_>,
        packages: &[String],
        package: &str,
    ) -> Result<Vec<ArtifactCandidate>> {
        info!("Installing package specific tool chain RPMs for {}", package);

        let (repo, aliases) = match self.config.override_route(package) {
            Some(route) => (route.repository, route.aliases.as_slice()),
            None => (Repository::PreviousMain, &[][..]),
        };

        let mut artifacts = Vec::new();
        for name in packages {
            match self.locator.find_in_repository(name, repo, aliases)? {
                Some(candidate) => artifacts.push(candidate),
                None => {
                    error!("Unable to find rpm {} in {} repository", name, repo);
                    return Err(Error::Input(format!(
                        "Unable to find rpm {} in {} repository",
                        name, repo
                    )));
                }
            }
        }

        let command = match target {
            InstallTarget::Root(root) => self.root_install_command(root, &artifacts),
            InstallTarget::Container(_) => format!(
                "rpm -Uvh --nodeps --force {}",
                self.container_files(&artifacts)
            ),
        };
        self.execute(target, &artifacts, &command, package, "install_custom_toolchain_rpms.log")?;

        info!("Successfully installed all tool chain override RPMS for {}", package);
        Ok(artifacts)
    }

    fn execute(
        &self,
        target: InstallTarget<'_>,
        artifacts: &[ArtifactCandidate],
        command: &str,
        package: &str,
        log_name: &str,
    ) -> Result<()> {
        if artifacts.is_empty() {
            info!("No tool chain RPMS to install into {}", target.describe());
            return Ok(());
        }

        let names: Vec<&str> = artifacts.iter().map(|a| a.package.as_str()).collect();
        debug!("Installing rpms: {}", names.join(" "));
        info!("Install command for {}: {}", target.describe(), command);

        match target {
            InstallTarget::Root(root) => {
                let log_file = self.package_log_dir(package).join(log_name);
                self.roots.install_into_root(root, command, &log_file)
            }
            InstallTarget::Container(container) => self.roots.install_into(container, command),
        }
    }

    fn root_install_command(&self, root: &BuildRootHandle, artifacts: &[ArtifactCandidate]) -> String {
        let files: Vec<String> = artifacts.iter().map(|a| a.path.display().to_string()).collect();
        format!(
            "{} -i -v --nodeps --noorder --force --root {} --define '_dbpath /var/lib/rpm' {}",
            self.rpm_command,
            root.path().display(),
            files.join(" ")
        )
    }

    fn container_files(&self, artifacts: &[ArtifactCandidate]) -> String {
        artifacts
            .iter()
            .map(|a| self.container_path(&a.path).display().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Translate a host artifact path to where the container sees it
    pub fn container_path(&self, host_path: &Path) -> PathBuf {
        let repositories = &self.config.repositories;
        let mounts = &self.config.container_mounts;
        let mappings = [
            (&repositories.previous_main, mounts.previous_main.clone()),
            (&repositories.previous_extended, mounts.previous_extended.clone()),
            (&repositories.current, self.config.top_dir.join("RPMS")),
        ];

        for (host_root, mount) in mappings {
            if let Ok(rest) = host_path.strip_prefix(host_root) {
                return mount.join(rest);
            }
        }
        host_path.to_path_buf()
    }
}
