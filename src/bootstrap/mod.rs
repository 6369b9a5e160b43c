// src/bootstrap/mod.rs

//! Core toolchain bootstrap
//!
//! Builds the core toolchain packages one at a time, in the configured
//! order, each in its own throwaway build root:
//!
//! ```text
//! for each core package:
//!     artifact already in current output? -> skip
//!     create root -> prepare -> install toolchain -> adjust compiler
//!         -> build -> destroy root
//! ```
//!
//! The list order is the dependency order. Later packages are installed
//! with artifacts produced earlier in the same run, so the loop is strictly
//! sequential and any failure aborts the whole run. The root of the failing
//! package is destroyed before the error is returned.

mod builder;
mod progress;

pub use builder::{PackageBuilder, RpmBuilder};
pub use progress::{BootstrapProgress, PackagePhase};

use crate::buildroot::{BuildRootHandle, BuildRootManager, RootState};
use crate::config::BootstrapConfig;
use crate::error::Result;
use crate::exec::CommandRunner;
use crate::toolchain::{InstallTarget, ToolchainInstaller};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Drives the core toolchain build
pub struct BootstrapOrchestrator {
    core_packages: Vec<String>,
    roots: Arc<BuildRootManager>,
    installer: ToolchainInstaller,
    builder: Box<dyn PackageBuilder>,
    progress: BootstrapProgress,
    last_root: Option<BuildRootHandle>,
}

impl BootstrapOrchestrator {
    /// Create an orchestrator using the rpm-based builder
    pub fn new(config: &BootstrapConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let builder = RpmBuilder::new(config, runner.clone());
        Self::with_builder(config, runner, Box::new(builder))
    }

    pub fn with_builder(
        config: &BootstrapConfig,
        runner: Arc<dyn CommandRunner>,
        builder: Box<dyn PackageBuilder>,
    ) -> Self {
        let roots = Arc::new(BuildRootManager::new(config, runner));
        Self {
            core_packages: config.core_packages.clone(),
            installer: ToolchainInstaller::new(config, roots.clone()),
            roots,
            builder,
            progress: BootstrapProgress::new(config.core_packages.iter().cloned()),
            last_root: None,
        }
    }

    pub fn progress(&self) -> &BootstrapProgress {
        &self.progress
    }

    /// Root of the most recently attempted package
    pub fn last_root(&self) -> Option<&BuildRootHandle> {
        self.last_root.as_ref()
    }

    /// Build every core package not yet present in the current output
    ///
    /// Returns the number of packages built. Skipped packages are not
    /// counted.
    pub fn build_core_toolchain(
        &mut self,
        build_option_packages: &[String],
        build_option_file: Option<&Path>,
    ) -> Result<usize> {
        info!("Building core tool chain packages.....");
        self.progress = BootstrapProgress::new(self.core_packages.iter().cloned());
        self.last_root = None;

        let packages = self.core_packages.clone();
        let total = packages.len();
        let mut built = 0;

        for (idx, package) in packages.iter().enumerate() {
            let existing = match self.installer.locator().find_in_current_build(package) {
                Ok(existing) => existing,
                Err(e) => {
                    error!("Unable to check existing artifacts for {}: {}", package, e);
                    self.progress.set(package, PackagePhase::Failed(e.to_string()));
                    return Err(e);
                }
            };
            if existing.is_some() {
                info!("Skipping building the package: {}", package);
                self.progress.set(package, PackagePhase::Skipped);
                continue;
            }

            info!("[{}/{}] Building {}", idx + 1, total, package);
            if let Err(e) = self.build_package(package, build_option_packages, build_option_file) {
                error!("Unable to build tool chain package {}: {}", package, e);
                self.progress.set(package, PackagePhase::Failed(e.to_string()));
                return Err(e);
            }
            built += 1;
        }

        info!("Successfully built core tool chain packages: {}", self.progress.summary());
        Ok(built)
    }

    fn build_package(
        &mut self,
        package: &str,
        build_option_packages: &[String],
        build_option_file: Option<&Path>,
    ) -> Result<()> {
        let log_dir = self.installer.package_log_dir(package);
        fs::create_dir_all(&log_dir)?;

        let mut root = self.roots.create(&format!("build-{}", package))?;
        self.progress.set(package, PackagePhase::RootCreated);

        let result = self.build_in_root(
            package,
            &mut root,
            build_option_packages,
            build_option_file,
            &log_dir,
        );
        let teardown = self.roots.destroy(&mut root);
        self.last_root = Some(root);

        match (result, teardown) {
            (Ok(()), Ok(())) => {
                self.progress.set(package, PackagePhase::RootDestroyed);
                Ok(())
            }
            (Ok(()), Err(e)) => Err(e),
            (Err(e), teardown) => {
                if let Err(cleanup) = teardown {
                    error!("Failed to destroy build root for {}: {}", package, cleanup);
                }
                Err(e)
            }
        }
    }

    fn build_in_root(
        &mut self,
        package: &str,
        root: &mut BuildRootHandle,
        build_option_packages: &[String],
        build_option_file: Option<&Path>,
        log_dir: &Path,
    ) -> Result<()> {
        self.roots.prepare(root)?;

        self.installer.install_default(InstallTarget::Root(root), package)?;
        if let Some(overrides) = self.installer.plan().overrides_for(package) {
            self.installer
                .install_custom(InstallTarget::Root(root), overrides, package)?;
        }
        self.progress.set(package, PackagePhase::DefaultToolchainInstalled);

        self.builder.adjust_compiler(package, root.path(), log_dir)?;
        self.progress.set(package, PackagePhase::CompilerAdjusted);

        self.builder.build(
            package,
            root.path(),
            build_option_packages,
            build_option_file,
            log_dir,
        )?;
        self.progress.set(package, PackagePhase::PackageBuilt);
        Ok(())
    }

    /// State of the most recent root, `None` before the first build
    pub fn last_root_state(&self) -> Option<RootState> {
        self.last_root.as_ref().map(BuildRootHandle::state)
    }
}
