// src/spec/parser.rs

//! Package spec parsing
//!
//! The spec grammar itself lives behind [`SpecParser`]. [`TomlSpecParser`]
//! reads a TOML rendition of a spec:
//!
//! ```toml
//! [package]
//! name = "gcc"
//! version = "12.2.0"
//! release = "1"
//! license = "GPLv3+"
//! sources = ["https://ftp.gnu.org/gnu/gcc/gcc-12.2.0/gcc-12.2.0.tar.xz"]
//! buildrequires = ["gmp-devel", "mpfr-devel >= 4.1"]
//! files = "%{_bindir}/*"
//!
//! [checksums]
//! "gcc-12.2.0.tar.xz" = "sha512=..."
//!
//! [[subpackages]]
//! name = "libgcc"
//! files = "%{_libdir}/libgcc_s.so.*"
//! ```
//!
//! Sub-packages inherit version, release, license and URL from `[package]`
//! unless they set their own.

use super::model::{Dependency, PackageSpec, SubPackage, DEFAULT_PACKAGE};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Black-box spec grammar
pub trait SpecParser {
    /// File extension (without dot) this parser accepts
    fn extension(&self) -> &str;

    /// Parse the file at `path`
    fn parse(&self, path: &Path) -> Result<PackageSpec>;
}

/// Parser for TOML package specs
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlSpecParser;

impl SpecParser for TomlSpecParser {
    fn extension(&self) -> &str {
        "toml"
    }

    fn parse(&self, path: &Path) -> Result<PackageSpec> {
        let content = std::fs::read_to_string(path)?;
        parse_spec_str(&content).map_err(|message| Error::Spec {
            path: path.to_path_buf(),
            message,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawSpec {
    package: RawPackage,
    #[serde(default)]
    subpackages: Vec<RawPackage>,
    #[serde(default)]
    checksums: BTreeMap<String, String>,
    security_hardening: Option<String>,
    check: Option<String>,
    #[serde(default)]
    definitions: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
    version: Option<String>,
    release: Option<String>,
    license: Option<String>,
    url: Option<String>,
    buildarch: Option<String>,
    files: Option<String>,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    patches: Vec<String>,
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    buildrequires: Vec<String>,
    #[serde(default)]
    checkbuildrequires: Vec<String>,
    #[serde(default)]
    provides: Vec<String>,
}

fn dependencies(entries: &[String]) -> Vec<Dependency> {
    entries.iter().filter_map(|e| Dependency::parse(e)).collect()
}

impl RawPackage {
    fn into_subpackage(self, parent: Option<&SubPackage>) -> std::result::Result<SubPackage, String> {
        let version = self
            .version
            .or_else(|| parent.map(|p| p.version.clone()))
            .ok_or_else(|| format!("package {} has no version", self.name))?;
        let release = self
            .release
            .or_else(|| parent.map(|p| p.release.clone()))
            .ok_or_else(|| format!("package {} has no release", self.name))?;

        Ok(SubPackage {
            license: self.license.or_else(|| parent.and_then(|p| p.license.clone())),
            url: self.url.or_else(|| parent.and_then(|p| p.url.clone())),
            build_arch: self.buildarch,
            files_macro: self.files,
            sources: self.sources,
            patches: self.patches,
            checksums: BTreeMap::new(),
            requires: dependencies(&self.requires),
            build_requires: dependencies(&self.buildrequires),
            check_build_requires: dependencies(&self.checkbuildrequires),
            provides: dependencies(&self.provides),
            name: self.name,
            version,
            release,
        })
    }
}

/// Parse a TOML spec from a string
pub fn parse_spec_str(content: &str) -> std::result::Result<PackageSpec, String> {
    let raw: RawSpec = toml::from_str(content).map_err(|e| e.to_string())?;

    let mut main = raw.package.into_subpackage(None)?;
    main.checksums = raw.checksums;

    let mut spec = PackageSpec {
        packages: BTreeMap::new(),
        security_hardening: raw.security_hardening,
        check_macro: raw.check,
        definitions: raw.definitions,
    };

    for sub in raw.subpackages {
        if sub.name == DEFAULT_PACKAGE || sub.name == main.name {
            return Err(format!("sub-package name {} is reserved", sub.name));
        }
        if spec.packages.contains_key(&sub.name) {
            return Err(format!("duplicate sub-package {}", sub.name));
        }
        let sub = sub.into_subpackage(Some(&main))?;
        spec.add_subpackage(sub);
    }
    spec.packages.insert(DEFAULT_PACKAGE.to_string(), main);

    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GCC_SPEC: &str = r#"
security_hardening = "nopie"
check = "make check"

[package]
name = "gcc"
version = "12.2.0"
release = "1"
license = "GPLv3+"
url = "https://gcc.gnu.org"
files = "%{_bindir}/*"
sources = ["https://ftp.gnu.org/gnu/gcc/gcc-12.2.0/gcc-12.2.0.tar.xz"]
patches = ["patches/gcc-fix-pie.patch"]
requires = ["libgcc = 12.2.0", "binutils"]
buildrequires = ["gmp-devel", "mpfr-devel >= 4.1"]

[checksums]
"gcc-12.2.0.tar.xz" = "sha512=abc"

[definitions]
_gcc_target = "x86_64-unknown-linux-gnu"

[[subpackages]]
name = "libgcc"
files = "%{_libdir}/libgcc_s.so.*"

[[subpackages]]
name = "gcc-doc"
release = "2"
"#;

    #[test]
    fn test_parse_spec_str() {
        let spec = parse_spec_str(GCC_SPEC).unwrap();
        assert_eq!(spec.packages.len(), 3);

        let main = spec.default_package().unwrap();
        assert_eq!(main.name, "gcc");
        assert_eq!(main.checksums.get("gcc-12.2.0.tar.xz").map(String::as_str), Some("sha512=abc"));
        assert_eq!(main.requires[0].compare.as_deref(), Some("="));
        assert_eq!(main.build_requires[1].package, "mpfr-devel");

        let libgcc = spec.get("libgcc").unwrap();
        assert_eq!(libgcc.version, "12.2.0");
        assert_eq!(libgcc.license.as_deref(), Some("GPLv3+"));

        let doc = spec.get("gcc-doc").unwrap();
        assert_eq!(doc.release, "2");
        assert!(doc.files_macro.is_none());

        assert_eq!(spec.security_hardening.as_deref(), Some("nopie"));
        assert_eq!(spec.definitions.len(), 1);
    }

    #[test]
    fn test_parse_rejects_missing_version() {
        let err = parse_spec_str("[package]\nname = \"x\"\nrelease = \"1\"\n").unwrap_err();
        assert!(err.contains("no version"));
    }

    #[test]
    fn test_parse_rejects_reserved_subpackage() {
        let content = r#"
[package]
name = "x"
version = "1"
release = "1"

[[subpackages]]
name = "default"
"#;
        assert!(parse_spec_str(content).unwrap_err().contains("reserved"));
    }

    #[test]
    fn test_parser_reads_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("gcc.toml");
        std::fs::write(&path, GCC_SPEC).unwrap();

        let spec = TomlSpecParser.parse(&path).unwrap();
        assert_eq!(spec.default_package().unwrap().name, "gcc");

        std::fs::write(&path, "not toml [").unwrap();
        assert!(matches!(TomlSpecParser.parse(&path), Err(Error::Spec { .. })));
    }
}
