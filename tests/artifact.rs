// tests/artifact.rs

//! Integration tests for artifact lookup across repositories.

mod common;

use bootforge::artifact::find_in_directory;
use bootforge::{AliasRule, ArtifactLocator, Repository, Resolution, TargetArch};
use common::Workspace;

const ORDER: [Repository; 3] = [
    Repository::Current,
    Repository::PreviousMain,
    Repository::PreviousExtended,
];

#[test]
fn test_priority_order_holds_for_every_placement() {
    // Every non-empty subset of repositories holding the package
    for mask in 1u8..8 {
        let workspace = Workspace::new();
        let holders: Vec<Repository> = ORDER
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, repo)| *repo)
            .collect();
        for repo in &holders {
            workspace.publish(*repo, "zlib", "1.3");
        }

        let locator = ArtifactLocator::new(&workspace.config());
        let found = locator
            .find_across_repositories("zlib", &ORDER)
            .unwrap()
            .found()
            .unwrap();

        let expected = workspace.repo_path(holders[0]);
        assert!(
            found.path.starts_with(&expected),
            "mask {mask:03b}: {} not under {}",
            found.path.display(),
            expected.display()
        );
    }
}

#[test]
fn test_not_found_and_deferred() {
    let workspace = Workspace::new();
    let config = workspace.config().with_provided_after_build(["ca-certificates"]);
    let locator = ArtifactLocator::new(&config);

    assert_eq!(
        locator.find_across_repositories("zlib", &ORDER).unwrap(),
        Resolution::NotFound
    );
    assert_eq!(
        locator
            .find_across_repositories("ca-certificates", &ORDER)
            .unwrap(),
        Resolution::Deferred
    );

    // A published copy wins over the skip list
    workspace.publish(Repository::PreviousMain, "ca-certificates", "20230315");
    assert!(matches!(
        locator.find_across_repositories("ca-certificates", &ORDER).unwrap(),
        Resolution::Found(_)
    ));
}

fn sqlite_alias() -> AliasRule {
    AliasRule {
        package: "sqlite".to_string(),
        alias: "sqlite-autoconf".to_string(),
        arch: TargetArch::X86_64,
        repositories: vec![Repository::PreviousMain],
    }
}

#[test]
fn test_alias_applies_only_on_its_architecture() {
    for arch in [TargetArch::X86_64, TargetArch::Aarch64] {
        let workspace = Workspace::with_arch(arch);
        workspace.publish(Repository::PreviousMain, "sqlite-autoconf", "3.40.1");

        let config = workspace.config().with_alias(sqlite_alias());
        let locator = ArtifactLocator::new(&config);
        let result = locator
            .find_across_repositories("sqlite", &[Repository::PreviousMain])
            .unwrap();

        match arch {
            TargetArch::X86_64 => {
                let found = result.found().unwrap();
                assert_eq!(found.package, "sqlite-autoconf");
                assert_eq!(found.version, "3.40.1");
            }
            _ => assert_eq!(result, Resolution::NotFound),
        }
    }
}

#[test]
fn test_alias_disabled_resolves_unaliased_name() {
    let workspace = Workspace::new();
    let aliased = workspace.publish(Repository::PreviousMain, "sqlite-autoconf", "3.40.1");
    let plain = workspace.publish(Repository::PreviousMain, "sqlite", "3.42.0");

    let with_alias = ArtifactLocator::new(&workspace.config().with_alias(sqlite_alias()));
    let without_alias = ArtifactLocator::new(&workspace.config());

    let a = with_alias
        .find_across_repositories("sqlite", &[Repository::PreviousMain])
        .unwrap()
        .found()
        .unwrap();
    let b = without_alias
        .find_across_repositories("sqlite", &[Repository::PreviousMain])
        .unwrap()
        .found()
        .unwrap();
    assert_eq!(a.path, aliased);
    assert_eq!(b.path, plain);

    // The rule is scoped to the published repository
    workspace.publish(Repository::Current, "sqlite", "3.43.0");
    let current = with_alias.find_in_current_build("sqlite").unwrap().unwrap();
    assert_eq!(current.version, "3.43.0");
}

#[test]
fn test_find_in_directory_boundary_cases() {
    let workspace = Workspace::new();
    let dir = workspace.repo_path(Repository::Current);
    let foo = workspace.publish(Repository::Current, "foo", "1.2");
    workspace.publish(Repository::Current, "foobar", "1.0");

    assert_eq!(find_in_directory("foo", &dir).unwrap().unwrap().path, foo);

    workspace.publish(Repository::Current, "foo", "1.3");
    assert!(find_in_directory("foo", &dir).is_err());
}
