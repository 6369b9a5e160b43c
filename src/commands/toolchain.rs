// src/commands/toolchain.rs
//! Core toolchain build commands

use super::load_config;
use anyhow::{Context, Result};
use bootforge::{
    BootstrapOrchestrator, BuildRootManager, DockerContainer, InstallTarget, ShellRunner,
    ToolchainInstaller,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Build the core toolchain packages
pub fn cmd_toolchain(
    config_path: &str,
    build_options: Option<&str>,
    option_packages: &[String],
    strict: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if strict {
        config.strict_artifact_check = true;
    }

    info!(
        "Bootstrapping {} core packages for {}",
        config.core_packages.len(),
        config.arch
    );

    let mut orchestrator = BootstrapOrchestrator::new(&config, Arc::new(ShellRunner::new()));
    let result = orchestrator.build_core_toolchain(option_packages, build_options.map(Path::new));

    for (package, phase) in orchestrator.progress().iter() {
        println!("  {:<24} {}", package, phase);
    }

    let built = result.context("Core toolchain bootstrap failed")?;
    println!("\nBuilt {} core toolchain package(s)", built);
    println!("{}", orchestrator.progress().summary());
    Ok(())
}

/// Install the container toolchain (and any overrides) for `package`
pub fn cmd_container_install(container_id: &str, package: &str, config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let runner = Arc::new(ShellRunner::new());
    let roots = Arc::new(BuildRootManager::new(&config, runner));
    let installer = ToolchainInstaller::new(&config, roots);
    let container = DockerContainer::new(container_id);
    let target = InstallTarget::Container(&container);

    let mut installed = installer
        .install_default(target, package)
        .with_context(|| format!("Failed to install toolchain into {}", target.describe()))?;
    if let Some(overrides) = installer.plan().overrides_for(package) {
        installed.extend(
            installer
                .install_custom(target, overrides, package)
                .with_context(|| format!("Failed to install overrides for {}", package))?,
        );
    }

    println!("Installed {} package(s) into {}:", installed.len(), target.describe());
    for artifact in &installed {
        println!("  {}", artifact.nvr());
    }
    Ok(())
}
