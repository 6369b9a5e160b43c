// src/commands/spec.rs
//! Spec inspection command

use anyhow::{bail, Result};
use bootforge::spec::{DependencyKind, SpecMetadata, TomlSpecParser};

/// Print the metadata of a spec file
pub fn cmd_spec(file: &str, json: bool) -> Result<()> {
    let metadata = SpecMetadata::open(file, &TomlSpecParser);
    if !metadata.is_loaded() {
        bail!("{} is not a readable spec", file);
    }

    let build_requires = metadata.dependency_closure(DependencyKind::BuildRequires);
    let requires = metadata.dependency_closure(DependencyKind::Requires);
    let check_requires = metadata.dependency_closure(DependencyKind::CheckBuildRequires);

    if json {
        let value = serde_json::json!({
            "name": metadata.base_package_name(),
            "version": metadata.version(),
            "release": metadata.release(),
            "license": metadata.license(),
            "url": metadata.url(),
            "packages": metadata.package_names(),
            "artifacts": metadata.artifact_names(),
            "sources": metadata.source_file_names(),
            "patches": metadata.patch_file_names(),
            "checksums": metadata.checksums(),
            "requires": requires,
            "build_requires": build_requires,
            "check_build_requires": check_requires,
            "check_available": metadata.is_check_available(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "{} {}-{}",
        metadata.base_package_name().unwrap_or("?"),
        metadata.version().unwrap_or("?"),
        metadata.release().unwrap_or("?")
    );
    if let Some(license) = metadata.license() {
        println!("  License: {}", license);
    }
    if let Some(url) = metadata.source_url() {
        println!("  Source URL: {}", url);
    }

    println!("\nPackages:");
    for (name, artifact) in metadata.package_names().iter().zip(metadata.artifact_names()) {
        println!("  {:<24} {} ({})", name, artifact, metadata.build_arch(name));
    }

    let sections = [
        ("Sources", metadata.source_file_names().unwrap_or_default()),
        ("Patches", metadata.patch_file_names().unwrap_or_default()),
        ("Build requires", build_requires),
        ("Requires", requires),
        ("Check requires", check_requires),
    ];
    for (title, entries) in sections {
        if entries.is_empty() {
            continue;
        }
        println!("\n{}:", title);
        for entry in entries {
            println!("  {}", entry);
        }
    }
    Ok(())
}
