// src/artifact.rs

//! Binary artifact lookup
//!
//! Finds the rpm file for a package name in one directory or across an
//! ordered list of repositories. A lookup yields exactly one file or
//! nothing; several matches in one location are an error because the
//! caller cannot tell which one to install.

use crate::config::{apply_aliases, AliasRule, BootstrapConfig, Repository, RepositoryPaths, TargetArch};
use crate::error::{Error, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// File extension of binary artifacts
pub const ARTIFACT_EXTENSION: &str = "rpm";

/// A resolved binary artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCandidate {
    pub path: PathBuf,
    /// Package name the lookup was made for
    pub package: String,
    pub version: String,
    pub release: String,
    pub arch: String,
}

impl ArtifactCandidate {
    /// Canonical `name-version-release` identifier
    pub fn nvr(&self) -> String {
        format!("{}-{}-{}", self.package, self.version, self.release)
    }
}

/// Outcome of a multi-repository lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ArtifactCandidate),
    /// Not published yet; built later in this run
    Deferred,
    NotFound,
}

impl Resolution {
    pub fn found(self) -> Option<ArtifactCandidate> {
        match self {
            Self::Found(candidate) => Some(candidate),
            _ => None,
        }
    }
}

/// Split `<package>-<version>-<release>.<arch>.rpm` for `package`
///
/// Returns `(version, release, arch)` only when the file belongs to exactly
/// this package, so `foo` does not match `foo-bar-1.0-1.x86_64.rpm`.
pub fn parse_artifact_file_name(package: &str, file_name: &str) -> Option<(String, String, String)> {
    let rest = file_name.strip_prefix(package)?.strip_prefix('-')?;
    let rest = rest.strip_suffix(ARTIFACT_EXTENSION)?.strip_suffix('.')?;

    let segments: Vec<&str> = rest.split('-').collect();
    let [version, release_arch] = segments.as_slice() else {
        return None;
    };
    let (release, arch) = release_arch.rsplit_once('.')?;
    if version.is_empty() || release.is_empty() || arch.is_empty() {
        return None;
    }
    Some((version.to_string(), release.to_string(), arch.to_string()))
}

/// Find the single artifact for `package` under `dir` (searched recursively)
pub fn find_in_directory(package: &str, dir: &Path) -> Result<Option<ArtifactCandidate>> {
    if !dir.is_dir() {
        debug!("Artifact directory does not exist: {}", dir.display());
        return Ok(None);
    }

    let pattern = Pattern::new(&format!("{}-*.{}", Pattern::escape(package), ARTIFACT_EXTENSION))
        .map_err(|e| Error::Input(format!("Invalid package name {}: {}", package, e)))?;

    let mut candidates: Vec<ArtifactCandidate> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|entry| {
            let file_name = entry.file_name().to_str()?;
            if !pattern.matches(file_name) {
                return None;
            }
            let (version, release, arch) = parse_artifact_file_name(package, file_name)?;
            Some(ArtifactCandidate {
                path: entry.path().to_path_buf(),
                package: package.to_string(),
                version,
                release,
                arch,
            })
        })
        .collect();

    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        _ => {
            let mut paths: Vec<PathBuf> = candidates.into_iter().map(|c| c.path).collect();
            paths.sort();
            error!(
                "Found multiple rpm files for package {} in {}. Unable to determine the rpm file",
                package,
                dir.display()
            );
            Err(Error::AmbiguousArtifact {
                package: package.to_string(),
                location: dir.to_path_buf(),
                candidates: paths,
            })
        }
    }
}

/// Artifact lookup across the configured repositories
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    arch: TargetArch,
    repositories: RepositoryPaths,
    aliases: Vec<AliasRule>,
    provided_after_build: Vec<String>,
}

impl ArtifactLocator {
    pub fn new(config: &BootstrapConfig) -> Self {
        Self {
            arch: config.arch,
            repositories: config.repositories.clone(),
            aliases: config.aliases.clone(),
            provided_after_build: config.provided_after_build.clone(),
        }
    }

    pub fn is_provided_after_build(&self, package: &str) -> bool {
        self.provided_after_build.iter().any(|p| p == package)
    }

    /// Find `package` in one repository, applying `aliases` for it
    pub fn find_in_repository(
        &self,
        package: &str,
        repo: Repository,
        aliases: &[AliasRule],
    ) -> Result<Option<ArtifactCandidate>> {
        let name = apply_aliases(aliases, package, self.arch, repo);
        if name != package {
            debug!("Looking up {} as {} in {} repository", package, name, repo);
        }
        find_in_directory(name, self.repositories.path(repo))
    }

    /// Artifact already produced by the current build, if any
    pub fn find_in_current_build(&self, package: &str) -> Result<Option<ArtifactCandidate>> {
        self.find_in_repository(package, Repository::Current, &self.aliases)
    }

    /// First match for `package` following `order`
    pub fn find_across_repositories(&self, package: &str, order: &[Repository]) -> Result<Resolution> {
        for repo in order {
            if let Some(candidate) = self.find_in_repository(package, *repo, &self.aliases)? {
                debug!("Resolved {} to {}", package, candidate.path.display());
                return Ok(Resolution::Found(candidate));
            }
        }

        if self.is_provided_after_build(package) {
            info!(
                "No old version of {} exists, skip until the new version is built",
                package
            );
            return Ok(Resolution::Deferred);
        }
        Ok(Resolution::NotFound)
    }
}
