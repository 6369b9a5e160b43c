// src/buildroot.rs

//! Isolated build root lifecycle
//!
//! Each core toolchain package is built inside its own ephemeral root
//! directory. The lifecycle is:
//!
//! ```text
//! create() -> Empty -> prepare() -> Populated -> destroy() -> Destroyed
//! ```
//!
//! `destroy` is valid from any state and unmounts whatever the preparation
//! script mounted below the root before removing the tree.

use crate::config::{BootstrapConfig, TargetArch};
use crate::container::ContainerHandle;
use crate::error::{Error, Result};
use crate::exec::CommandRunner;
use nix::mount::{umount2, MntFlags};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Mount points created at the top of every build root
pub const ROOT_MOUNT_POINTS: &[&str] = &["dev", "etc", "proc", "run", "sys", "tmp"];

/// Lifecycle state of a build root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootState {
    Empty,
    Populated,
    Destroyed,
}

/// One ephemeral build root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRootHandle {
    name: String,
    path: PathBuf,
    state: RootState,
}

impl BuildRootHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> RootState {
        self.state
    }
}

/// Creates, populates and tears down build roots
pub struct BuildRootManager {
    base: PathBuf,
    top_dir: PathBuf,
    arch: TargetArch,
    prepare_script: PathBuf,
    log_dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl BuildRootManager {
    pub fn new(config: &BootstrapConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            base: config.build_root_base.clone(),
            top_dir: config.top_dir.clone(),
            arch: config.arch,
            prepare_script: config.prepare_script.clone(),
            log_dir: config.log_dir.clone(),
            runner,
        }
    }

    /// Path a root with identifier `name` lives at
    pub fn root_path(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }

    /// Allocate an empty root, discarding any stale tree with the same name
    pub fn create(&self, name: &str) -> Result<BuildRootHandle> {
        let path = self.root_path(name);
        if path.exists() {
            warn!("Removing stale build root {}", path.display());
            let mut stale = BuildRootHandle {
                name: name.to_string(),
                path: path.clone(),
                state: RootState::Populated,
            };
            self.destroy(&mut stale)?;
        }

        fs::create_dir_all(&path).map_err(|e| Error::BuildRoot {
            root: path.clone(),
            message: format!("cannot create root directory: {}", e),
        })?;
        info!("Created build root {}", path.display());

        Ok(BuildRootHandle {
            name: name.to_string(),
            path,
            state: RootState::Empty,
        })
    }

    /// Directories every prepared root contains, relative to the root
    pub fn skeleton(&self) -> Vec<PathBuf> {
        let top = self.top_dir.strip_prefix("/").unwrap_or(&self.top_dir);
        let mut dirs: Vec<PathBuf> = ROOT_MOUNT_POINTS.iter().map(PathBuf::from).collect();
        dirs.push(top.to_path_buf());
        dirs.push(top.join("RPMS").join(self.arch.as_str()));
        for sub in ["RPMS/noarch", "SOURCES", "SPECS", "LOGS", "BUILD", "BUILDROOT"] {
            dirs.push(top.join(sub));
        }
        dirs
    }

    /// Create the directory skeleton and run the preparation script
    pub fn prepare(&self, root: &mut BuildRootHandle) -> Result<()> {
        info!("Preparing build environment in {}", root.path.display());

        for dir in self.skeleton() {
            let target = root.path.join(&dir);
            fs::create_dir_all(&target).map_err(|e| Error::BuildRoot {
                root: root.path.clone(),
                message: format!("cannot create {}: {}", target.display(), e),
            })?;
        }

        let command = format!("{} {}", self.prepare_script.display(), root.path.display());
        let log_file = self.log_dir.join("prepareBuildRoot.log");
        if !self.runner.run(&command, Some(&log_file))? {
            error!("Prepare build root script failed. Unable to prepare chroot: {}", command);
            return Err(Error::BuildRoot {
                root: root.path.clone(),
                message: format!("prepare build root script failed: {}", command),
            });
        }

        root.state = RootState::Populated;
        info!("Successfully prepared chroot: {}", root.path.display());
        Ok(())
    }

    /// Unmount everything below the root and remove it
    pub fn destroy(&self, root: &mut BuildRootHandle) -> Result<()> {
        if root.state == RootState::Destroyed {
            return Ok(());
        }

        if root.path.exists() {
            unmount_below(&root.path);
            let remaining = mounts_below(&root.path);
            if !remaining.is_empty() {
                error!("Build root {} still has mounts: {:?}", root.path.display(), remaining);
                return Err(Error::BuildRoot {
                    root: root.path.clone(),
                    message: format!("{} mount(s) could not be detached", remaining.len()),
                });
            }
            fs::remove_dir_all(&root.path).map_err(|e| Error::BuildRoot {
                root: root.path.clone(),
                message: format!("cannot remove root: {}", e),
            })?;
        }

        root.state = RootState::Destroyed;
        info!("Destroyed build root {}", root.path.display());
        Ok(())
    }

    /// Run an install command against a root from the host
    pub fn install_into_root(
        &self,
        root: &BuildRootHandle,
        command: &str,
        log_file: &Path,
    ) -> Result<()> {
        if !self.runner.run(command, Some(log_file))? {
            debug!("Command executed: {}", command);
            error!("Installing tool chain into {} failed", root.path.display());
            return Err(Error::Install {
                target: root.path.display().to_string(),
                command: command.to_string(),
            });
        }
        Ok(())
    }

    /// Run an install command through a running container's command channel
    pub fn install_into(&self, container: &dyn ContainerHandle, command: &str) -> Result<()> {
        let result = container.exec(command)?;
        info!("{}", result.output.trim_end());
        if !result.success() {
            debug!("Command executed: {}", command);
            error!(
                "Installing tool chain in container {} failed with exit code {}",
                container.short_id(),
                result.exit_code
            );
            return Err(Error::Install {
                target: format!("container {}", container.short_id()),
                command: command.to_string(),
            });
        }
        Ok(())
    }
}

/// Decode the octal escapes the kernel uses in mount tables
fn unescape_mount_path(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 4 <= bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
                let value = digits.iter().fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
                if let Ok(value) = u8::try_from(value) {
                    out.push(value);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Mount points in `table` (mounts(5) format) at or below `root`,
/// deepest first
pub fn parse_mounts_below(table: &str, root: &Path) -> Vec<PathBuf> {
    let mut mounts: Vec<PathBuf> = table
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(|field| PathBuf::from(unescape_mount_path(field)))
        .filter(|mount| mount.starts_with(root))
        .collect();
    mounts.sort_by(|a, b| {
        b.components()
            .count()
            .cmp(&a.components().count())
            .then_with(|| a.cmp(b))
    });
    mounts.dedup();
    mounts
}

fn mounts_below(root: &Path) -> Vec<PathBuf> {
    let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    match fs::read_to_string("/proc/self/mounts") {
        Ok(table) => parse_mounts_below(&table, &root),
        Err(e) => {
            debug!("Cannot read mount table: {}", e);
            Vec::new()
        }
    }
}

fn unmount_below(root: &Path) {
    for mount in mounts_below(root) {
        debug!("Unmounting {}", mount.display());
        if let Err(e) = umount2(&mount, MntFlags::MNT_DETACH) {
            warn!("Failed to unmount {}: {}", mount.display(), e);
        }
    }
}
