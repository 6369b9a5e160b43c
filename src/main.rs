// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Toolchain {
            config,
            build_options,
            option_packages,
            strict,
        } => commands::cmd_toolchain(&config, build_options.as_deref(), &option_packages, strict),
        Commands::Spec { file, json } => commands::cmd_spec(&file, json),
        Commands::Find {
            package,
            config,
            repos,
        } => commands::cmd_find(&package, &config, &repos),
        Commands::ContainerInstall {
            container,
            package,
            config,
        } => commands::cmd_container_install(&container, &package, &config),
    }
}
