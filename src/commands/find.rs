// src/commands/find.rs
//! Artifact lookup command

use super::load_config;
use anyhow::{anyhow, Result};
use bootforge::{ArtifactLocator, Repository, Resolution};

/// Locate the artifact for `package`
pub fn cmd_find(package: &str, config_path: &str, repos: &[String]) -> Result<()> {
    let config = load_config(config_path)?;
    let locator = ArtifactLocator::new(&config);

    let order: Vec<Repository> = if repos.is_empty() {
        vec![
            Repository::Current,
            Repository::PreviousMain,
            Repository::PreviousExtended,
        ]
    } else {
        repos
            .iter()
            .map(|r| Repository::parse(r).ok_or_else(|| anyhow!("Unknown repository: {}", r)))
            .collect::<Result<_>>()?
    };

    match locator.find_across_repositories(package, &order)? {
        Resolution::Found(candidate) => {
            println!("{}", candidate.path.display());
            println!("  Version: {}", candidate.version);
            println!("  Release: {}", candidate.release);
            println!("  Arch:    {}", candidate.arch);
        }
        Resolution::Deferred => {
            println!("{} is not published yet; it is provided later in the build", package);
        }
        Resolution::NotFound => {
            let searched: Vec<&str> = order.iter().map(Repository::name).collect();
            return Err(anyhow!(
                "No artifact for {} in {}",
                package,
                searched.join(", ")
            ));
        }
    }
    Ok(())
}
