// src/spec/mod.rs

//! Package spec metadata
//!
//! [`SpecMetadata`] answers read-only questions about one package spec:
//! sources, patches, checksums, artifact names and dependency edges. It is
//! consulted by the dependency-ordering layer above the bootstrap core.
//!
//! A spec that cannot be loaded (missing file, wrong extension, parse
//! failure, no main package) leaves the resolver empty. Every query then
//! returns `None` or an empty list instead of failing.

mod model;
mod parser;

pub use model::{Dependency, DependencyKind, PackageSpec, SubPackage, DEFAULT_PACKAGE};
pub use parser::{parse_spec_str, SpecParser, TomlSpecParser};

use crate::config::TargetArch;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Last path segment of a URL or path
pub fn file_name_from_url(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Read-only view over one parsed spec
#[derive(Debug, Clone, Default)]
pub struct SpecMetadata {
    path: Option<PathBuf>,
    spec: Option<PackageSpec>,
}

impl SpecMetadata {
    /// Load the spec at `path` with `parser`
    pub fn open(path: impl AsRef<Path>, parser: &dyn SpecParser) -> Self {
        let path = path.as_ref();
        let is_spec = path.is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(parser.extension());
        if !is_spec {
            debug!("Not a spec file: {}", path.display());
            return Self::default();
        }

        match parser.parse(path) {
            Ok(spec) => {
                let mut metadata = Self::from_spec(spec);
                if metadata.spec.is_some() {
                    metadata.path = Some(path.to_path_buf());
                }
                metadata
            }
            Err(e) => {
                warn!("Failed to parse spec {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Wrap an already parsed spec
    pub fn from_spec(spec: PackageSpec) -> Self {
        if spec.default_package().is_none() {
            warn!("Spec has no main package, ignoring it");
            return Self::default();
        }
        Self {
            path: None,
            spec: Some(spec),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.spec.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn spec(&self) -> Option<&PackageSpec> {
        self.spec.as_ref()
    }

    fn main(&self) -> Option<&SubPackage> {
        self.spec.as_ref().and_then(PackageSpec::default_package)
    }

    fn sub_packages(&self) -> impl Iterator<Item = &SubPackage> {
        self.spec.iter().flat_map(PackageSpec::sub_packages)
    }

    /// Sub-package by name; `default` names the main package
    fn find(&self, name: &str) -> Option<&SubPackage> {
        self.spec.as_ref().and_then(|s| s.get(name))
    }

    /// File names of the main package's sources
    pub fn source_file_names(&self) -> Option<Vec<String>> {
        self.main().map(|p| {
            p.sources
                .iter()
                .map(|s| file_name_from_url(s).to_string())
                .collect()
        })
    }

    /// Source entries of the main package as written
    pub fn source_urls(&self) -> Option<Vec<String>> {
        self.main().map(|p| p.sources.clone())
    }

    /// File names of the main package's patches
    pub fn patch_file_names(&self) -> Option<Vec<String>> {
        self.main().map(|p| {
            p.patches
                .iter()
                .map(|s| file_name_from_url(s).to_string())
                .collect()
        })
    }

    pub fn checksums(&self) -> Option<&BTreeMap<String, String>> {
        self.main().map(|p| &p.checksums)
    }

    pub fn checksum(&self, source: &str) -> Option<&str> {
        self.main()
            .and_then(|p| p.checksums.get(source))
            .map(String::as_str)
    }

    /// First source, if it is fetchable over http(s) or ftp
    pub fn source_url(&self) -> Option<&str> {
        let first = self.main()?.sources.first()?;
        if first.starts_with("http") || first.starts_with("ftp") {
            Some(first)
        } else {
            None
        }
    }

    /// Names of every sub-package, main package included
    pub fn package_names(&self) -> Vec<String> {
        self.sub_packages().map(|p| p.name.clone()).collect()
    }

    /// `name-version-release` for every sub-package
    pub fn artifact_names(&self) -> Vec<String> {
        self.sub_packages().map(SubPackage::artifact_name).collect()
    }

    pub fn artifact_name(&self, package: &str) -> Option<String> {
        self.find(package).map(SubPackage::artifact_name)
    }

    pub fn version_of(&self, package: &str) -> Option<&str> {
        self.find(package).map(|p| p.version.as_str())
    }

    pub fn release_of(&self, package: &str) -> Option<&str> {
        self.find(package).map(|p| p.release.as_str())
    }

    pub fn license(&self) -> Option<&str> {
        self.main().and_then(|p| p.license.as_deref())
    }

    pub fn url(&self) -> Option<&str> {
        self.main().and_then(|p| p.url.as_deref())
    }

    /// Build architecture of a sub-package, host architecture by default
    pub fn build_arch(&self, package: &str) -> String {
        self.find(package)
            .and_then(|p| p.build_arch.clone())
            .unwrap_or_else(|| TargetArch::host().to_string())
    }

    /// Union of one dependency kind across all sub-packages, excluding
    /// packages produced by this spec
    pub fn dependency_closure(&self, kind: DependencyKind) -> Vec<String> {
        let produced: BTreeSet<&str> = self.sub_packages().map(|p| p.name.as_str()).collect();
        let closure: BTreeSet<&str> = self
            .sub_packages()
            .flat_map(|p| p.dependencies(kind))
            .map(|d| d.package.as_str())
            .filter(|name| !produced.contains(name))
            .collect();
        closure.into_iter().map(String::from).collect()
    }

    pub fn requires(&self, package: &str) -> Vec<String> {
        self.dependency_names(package, DependencyKind::Requires)
    }

    pub fn build_requires(&self, package: &str) -> Vec<String> {
        self.dependency_names(package, DependencyKind::BuildRequires)
    }

    fn dependency_names(&self, package: &str, kind: DependencyKind) -> Vec<String> {
        self.find(package)
            .map(|p| p.dependencies(kind).iter().map(|d| d.package.clone()).collect())
            .unwrap_or_default()
    }

    /// Whether `package` exists and produces an installable artifact
    pub fn is_real_package(&self, package: &str) -> bool {
        self.find(package).is_some_and(|p| p.files_macro.is_some())
    }

    /// Provides declared by `package`
    pub fn provides(&self, package: &str) -> Option<Vec<String>> {
        match self.find(package) {
            Some(p) => Some(p.provides.iter().map(|d| d.package.clone()).collect()),
            None => {
                warn!("Package not found: {}", package);
                None
            }
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.main().map(|p| p.version.as_str())
    }

    pub fn release(&self) -> Option<&str> {
        self.main().map(|p| p.release.as_str())
    }

    pub fn base_package_name(&self) -> Option<&str> {
        self.main().map(|p| p.name.as_str())
    }

    pub fn security_hardening(&self) -> Option<&str> {
        self.spec.as_ref().and_then(|s| s.security_hardening.as_deref())
    }

    /// Whether the spec declares a check section
    pub fn is_check_available(&self) -> bool {
        self.spec.as_ref().is_some_and(|s| s.check_macro.is_some())
    }

    pub fn definitions(&self) -> Option<&BTreeMap<String, String>> {
        self.spec.as_ref().map(|s| &s.definitions)
    }
}
