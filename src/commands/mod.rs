// src/commands/mod.rs
//! Command handlers for the bootforge CLI

mod find;
mod spec;
mod toolchain;

pub use find::cmd_find;
pub use spec::cmd_spec;
pub use toolchain::{cmd_container_install, cmd_toolchain};

use anyhow::{Context, Result};
use bootforge::BootstrapConfig;

/// Load the bootstrap configuration named on the command line
fn load_config(path: &str) -> Result<BootstrapConfig> {
    BootstrapConfig::load(path)
        .with_context(|| format!("Failed to load bootstrap configuration from {}", path))
}
