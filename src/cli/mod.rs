// src/cli/mod.rs
//! CLI definitions for bootforge
//!
//! The command implementations live in the `commands` module.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bootforge")]
#[command(version)]
#[command(about = "Build the core toolchain packages in isolated build roots", long_about = None)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build every core toolchain package not yet present in the current output
    Toolchain {
        /// Bootstrap configuration file (TOML)
        #[arg(short, long)]
        config: String,

        /// Build options file handed to the listed packages
        #[arg(long)]
        build_options: Option<String>,

        /// Package that receives the build options file (repeatable)
        #[arg(long = "option-package")]
        option_packages: Vec<String>,

        /// Search the current output for every toolchain package
        #[arg(long)]
        strict: bool,
    },

    /// Show metadata of a package spec
    Spec {
        /// Spec file (TOML)
        file: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Locate the artifact of a package
    Find {
        /// Package name
        package: String,

        /// Bootstrap configuration file (TOML)
        #[arg(short, long)]
        config: String,

        /// Repositories to search, in order (current, previous-main, previous-extended)
        #[arg(short, long = "repo")]
        repos: Vec<String>,
    },

    /// Install the container toolchain into a running container
    ContainerInstall {
        /// Container id
        container: String,

        /// Package the container will build
        package: String,

        /// Bootstrap configuration file (TOML)
        #[arg(short, long)]
        config: String,
    },
}
