// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use bootforge::{
    BootstrapConfig, CommandRunner, ContainerHandle, Error, ExecOutput, PackageBuilder,
    Repository, Result, TargetArch,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Temporary bootstrap workspace with the three repositories on disk.
///
/// Keep the value alive for the duration of the test; dropping it removes
/// every repository, root and log created under it.
pub struct Workspace {
    pub dir: TempDir,
    pub arch: TargetArch,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_arch(TargetArch::X86_64)
    }

    pub fn with_arch(arch: TargetArch) -> Self {
        let dir = TempDir::new().unwrap();
        let workspace = Self { dir, arch };
        for repo in [
            Repository::Current,
            Repository::PreviousMain,
            Repository::PreviousExtended,
        ] {
            fs::create_dir_all(workspace.repo_path(repo).join(arch.as_str())).unwrap();
        }
        workspace
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn repo_path(&self, repo: Repository) -> PathBuf {
        let name = match repo {
            Repository::Current => "RPMS",
            Repository::PreviousMain => "PUBLISHRPMS",
            Repository::PreviousExtended => "PUBLISHXRPMS",
        };
        self.path().join("stage").join(name)
    }

    pub fn roots_dir(&self) -> PathBuf {
        self.path().join("roots")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.path().join("logs")
    }

    /// Place `<package>-<version>-1.<arch>.rpm` in `repo`
    pub fn publish(&self, repo: Repository, package: &str, version: &str) -> PathBuf {
        let dir = self.repo_path(repo).join(self.arch.as_str());
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{}-{}-1.{}.rpm", package, version, self.arch));
        fs::write(&path, b"rpm").unwrap();
        path
    }

    /// Configuration pointing every location into this workspace
    pub fn config(&self) -> BootstrapConfig {
        let mut config = BootstrapConfig::new()
            .with_arch(self.arch)
            .with_build_root_base(self.roots_dir())
            .with_log_dir(self.log_dir())
            .with_prepare_script("/opt/prepare-build-root.sh");
        config.repositories.current = self.repo_path(Repository::Current);
        config.repositories.previous_main = self.repo_path(Repository::PreviousMain);
        config.repositories.previous_extended = self.repo_path(Repository::PreviousExtended);
        config
    }
}

type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Records every command and fails those matching a predicate
pub struct FakeRunner {
    commands: Mutex<Vec<(String, Option<PathBuf>)>>,
    fail_when: Option<Predicate>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            fail_when: None,
        }
    }

    pub fn failing_when(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            fail_when: Some(Box::new(predicate)),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|(c, _)| c.clone())
            .collect()
    }

    pub fn log_files(&self) -> Vec<PathBuf> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, log)| log.clone())
            .collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, command: &str, log_file: Option<&Path>) -> Result<bool> {
        self.commands
            .lock()
            .unwrap()
            .push((command.to_string(), log_file.map(Path::to_path_buf)));
        Ok(!self.fail_when.as_ref().is_some_and(|f| f(command)))
    }
}

/// Package builder that records builds and publishes their output
pub struct FakeBuilder {
    pub built: std::sync::Arc<Mutex<Vec<String>>>,
    /// Directory built artifacts are written to, if any
    pub output: Option<PathBuf>,
    pub arch: TargetArch,
    pub fail_on: Option<String>,
}

impl FakeBuilder {
    pub fn new() -> Self {
        Self {
            built: Default::default(),
            output: None,
            arch: TargetArch::X86_64,
            fail_on: None,
        }
    }

    pub fn publishing_to(mut self, output: PathBuf) -> Self {
        self.output = Some(output);
        self
    }

    pub fn failing_on(mut self, package: &str) -> Self {
        self.fail_on = Some(package.to_string());
        self
    }
}

impl PackageBuilder for FakeBuilder {
    fn adjust_compiler(&self, _package: &str, root: &Path, _log_dir: &Path) -> Result<()> {
        assert!(root.exists(), "compiler adjusted outside a live root");
        Ok(())
    }

    fn build(
        &self,
        package: &str,
        root: &Path,
        _build_option_packages: &[String],
        _build_option_file: Option<&Path>,
        _log_dir: &Path,
    ) -> Result<()> {
        assert!(root.exists(), "package built outside a live root");
        if self.fail_on.as_deref() == Some(package) {
            return Err(Error::BuildFailure {
                package: package.to_string(),
                message: "rpmbuild exited with status 1".to_string(),
            });
        }
        self.built.lock().unwrap().push(package.to_string());
        if let Some(output) = &self.output {
            let dir = output.join(self.arch.as_str());
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(format!("{}-2.0-1.{}.rpm", package, self.arch)), b"rpm").unwrap();
        }
        Ok(())
    }
}

/// Container that records executed commands and returns a fixed exit code
pub struct FakeContainer {
    pub exit_code: i32,
    pub executed: Mutex<Vec<String>>,
}

impl FakeContainer {
    pub fn new(exit_code: i32) -> Self {
        Self {
            exit_code,
            executed: Mutex::new(Vec::new()),
        }
    }
}

impl ContainerHandle for FakeContainer {
    fn short_id(&self) -> &str {
        "fake01234567"
    }

    fn exec(&self, command: &str) -> Result<ExecOutput> {
        self.executed.lock().unwrap().push(command.to_string());
        Ok(ExecOutput {
            exit_code: self.exit_code,
            output: "Preparing packages...".to_string(),
        })
    }
}

/// Sorted relative paths of every directory below `root`
pub fn directory_tree(root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();
    dirs.sort();
    dirs
}
