// src/spec/model.rs

//! Parsed package spec data model
//!
//! A [`PackageSpec`] owns one or more [`SubPackage`]s keyed by name. The main
//! package is stored under the reserved key `"default"`; every other
//! sub-package is stored under its own name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the main package in [`PackageSpec::packages`]
pub const DEFAULT_PACKAGE: &str = "default";

/// Kind of dependency edge declared by a sub-package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Requires,
    BuildRequires,
    CheckBuildRequires,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requires => "requires",
            Self::BuildRequires => "buildrequires",
            Self::CheckBuildRequires => "checkbuildrequires",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "requires" => Some(Self::Requires),
            "buildrequires" => Some(Self::BuildRequires),
            "checkbuildrequires" => Some(Self::CheckBuildRequires),
            _ => None,
        }
    }
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One dependency entry, referencing its target by package name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub package: String,
    /// Comparison operator (`>=`, `=`, ...) if versioned
    pub compare: Option<String>,
    pub version: Option<String>,
}

impl Dependency {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            compare: None,
            version: None,
        }
    }

    /// Parse `name [op version]`
    pub fn parse(entry: &str) -> Option<Self> {
        let mut parts = entry.split_whitespace();
        let package = parts.next()?.to_string();
        match (parts.next(), parts.next()) {
            (Some(op), Some(version)) => Some(Self {
                package,
                compare: Some(op.to_string()),
                version: Some(version.to_string()),
            }),
            _ => Some(Self::new(package)),
        }
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.compare, &self.version) {
            (Some(op), Some(v)) => write!(f, "{} {} {}", self.package, op, v),
            _ => write!(f, "{}", self.package),
        }
    }
}

/// One installable (or virtual) package produced by a spec
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubPackage {
    pub name: String,
    pub version: String,
    pub release: String,
    pub license: Option<String>,
    pub url: Option<String>,
    pub build_arch: Option<String>,
    /// Contents of the `%files` section; `None` for virtual groupings
    pub files_macro: Option<String>,
    pub sources: Vec<String>,
    pub patches: Vec<String>,
    /// Source identifier to checksum
    pub checksums: BTreeMap<String, String>,
    pub requires: Vec<Dependency>,
    pub build_requires: Vec<Dependency>,
    pub check_build_requires: Vec<Dependency>,
    pub provides: Vec<Dependency>,
}

impl SubPackage {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        release: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            release: release.into(),
            ..Default::default()
        }
    }

    /// Canonical `name-version-release` identifier
    pub fn artifact_name(&self) -> String {
        format!("{}-{}-{}", self.name, self.version, self.release)
    }

    pub fn dependencies(&self, kind: DependencyKind) -> &[Dependency] {
        match kind {
            DependencyKind::Requires => &self.requires,
            DependencyKind::BuildRequires => &self.build_requires,
            DependencyKind::CheckBuildRequires => &self.check_build_requires,
        }
    }
}

/// A parsed package spec
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub packages: BTreeMap<String, SubPackage>,
    pub security_hardening: Option<String>,
    /// Contents of the `%check` section
    pub check_macro: Option<String>,
    pub definitions: BTreeMap<String, String>,
}

impl PackageSpec {
    /// Spec with `main` as its default sub-package
    pub fn with_default(main: SubPackage) -> Self {
        let mut spec = Self::default();
        spec.packages.insert(DEFAULT_PACKAGE.to_string(), main);
        spec
    }

    /// Add a non-default sub-package under its own name
    pub fn add_subpackage(&mut self, package: SubPackage) {
        self.packages.insert(package.name.clone(), package);
    }

    pub fn default_package(&self) -> Option<&SubPackage> {
        self.packages.get(DEFAULT_PACKAGE)
    }

    /// Look up a sub-package by key or name; the main package's own name
    /// resolves to the default entry
    pub fn get(&self, name: &str) -> Option<&SubPackage> {
        match self.default_package() {
            Some(main) if main.name == name => Some(main),
            _ => self.packages.get(name),
        }
    }

    pub fn sub_packages(&self) -> impl Iterator<Item = &SubPackage> {
        self.packages.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_parse() {
        let dep = Dependency::parse("glibc >= 2.36").unwrap();
        assert_eq!(dep.package, "glibc");
        assert_eq!(dep.compare.as_deref(), Some(">="));
        assert_eq!(dep.version.as_deref(), Some("2.36"));
        assert_eq!(dep.to_string(), "glibc >= 2.36");

        let dep = Dependency::parse("zlib").unwrap();
        assert_eq!(dep, Dependency::new("zlib"));

        assert!(Dependency::parse("   ").is_none());
    }

    #[test]
    fn test_default_aliasing() {
        let mut spec = PackageSpec::with_default(SubPackage::new("gcc", "12.2.0", "1"));
        spec.add_subpackage(SubPackage::new("libgcc", "12.2.0", "1"));

        assert_eq!(spec.get("gcc"), spec.get(DEFAULT_PACKAGE));
        assert_eq!(spec.get("libgcc").unwrap().name, "libgcc");
        assert!(spec.get("g++").is_none());
    }

    #[test]
    fn test_artifact_name() {
        let pkg = SubPackage::new("binutils", "2.39", "3.ph5");
        assert_eq!(pkg.artifact_name(), "binutils-2.39-3.ph5");
    }

    #[test]
    fn test_dependency_kind_parse() {
        assert_eq!(DependencyKind::parse("BuildRequires"), Some(DependencyKind::BuildRequires));
        assert_eq!(DependencyKind::parse("provides"), None);
    }
}
