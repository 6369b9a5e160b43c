// src/bootstrap/builder.rs

//! Package build invocation inside a prepared build root

use crate::config::BootstrapConfig;
use crate::error::{Error, Result};
use crate::exec::CommandRunner;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Builds one package inside a populated root
pub trait PackageBuilder {
    /// Adjust the installed compiler so it targets the root
    fn adjust_compiler(&self, package: &str, root: &Path, log_dir: &Path) -> Result<()>;

    /// Build `package` inside `root`
    ///
    /// `build_option_file` applies only to packages named in
    /// `build_option_packages`.
    fn build(
        &self,
        package: &str,
        root: &Path,
        build_option_packages: &[String],
        build_option_file: Option<&Path>,
        log_dir: &Path,
    ) -> Result<()>;
}

/// [`PackageBuilder`] that runs `rpmbuild` through `chroot`
pub struct RpmBuilder {
    runner: Arc<dyn CommandRunner>,
    top_dir: PathBuf,
    adjust_script: PathBuf,
    specs_dir: PathBuf,
    sources_dir: PathBuf,
    output_dir: PathBuf,
}

impl RpmBuilder {
    pub fn new(config: &BootstrapConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            top_dir: config.top_dir.clone(),
            adjust_script: config.adjust_script.clone(),
            specs_dir: config.specs_dir.clone(),
            sources_dir: config.sources_dir.clone(),
            output_dir: config.repositories.current.clone(),
        }
    }

    /// Build topology directory as seen from the host
    fn top_in_root(&self, root: &Path) -> PathBuf {
        root.join(self.top_dir.strip_prefix("/").unwrap_or(&self.top_dir))
    }

    /// Command that builds `package` inside `root`
    pub fn build_command(
        &self,
        package: &str,
        root: &Path,
        build_option_packages: &[String],
        build_option_file: Option<&Path>,
    ) -> String {
        let host_top = self.top_in_root(root);
        let spec = self.top_dir.join("SPECS").join(format!("{}.spec", package));

        let mut rpmbuild = format!(
            "rpmbuild -ba --nocheck --define '_topdir {}'",
            self.top_dir.display()
        );
        if let Some(file) = build_option_file
            && build_option_packages.iter().any(|p| p == package)
        {
            rpmbuild.push_str(&format!(" --define 'build_options_file {}'", file.display()));
        }
        rpmbuild.push_str(&format!(" {}", spec.display()));

        let package_specs = self.specs_dir.join(package);
        [
            format!(
                "cp {} {}/SPECS/",
                package_specs.join(format!("{}.spec", package)).display(),
                host_top.display()
            ),
            format!("cp -r {}/. {}/SOURCES/", package_specs.display(), host_top.display()),
            format!("cp -r {}/. {}/SOURCES/", self.sources_dir.display(), host_top.display()),
            format!("chroot {} /bin/bash -l -c \"{}\"", root.display(), rpmbuild),
            format!("mkdir -p {}", self.output_dir.display()),
            format!("cp -r {}/RPMS/. {}/", host_top.display(), self.output_dir.display()),
        ]
        .join(" && ")
    }
}

impl PackageBuilder for RpmBuilder {
    fn adjust_compiler(&self, package: &str, root: &Path, log_dir: &Path) -> Result<()> {
        let script_name = self
            .adjust_script
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.adjust_script.display().to_string());
        let command = format!(
            "cp {} {}/tmp/ && chroot {} /bin/bash -c /tmp/{}",
            self.adjust_script.display(),
            root.display(),
            root.display(),
            script_name
        );

        info!("Adjusting compiler for {}", package);
        if !self.runner.run(&command, Some(&log_dir.join("adjustGCCSpecs.log")))? {
            error!("Failed while adjusting compiler for {}: {}", package, command);
            return Err(Error::BuildFailure {
                package: package.to_string(),
                message: format!("compiler adjustment failed: {}", command),
            });
        }
        Ok(())
    }

    fn build(
        &self,
        package: &str,
        root: &Path,
        build_option_packages: &[String],
        build_option_file: Option<&Path>,
        log_dir: &Path,
    ) -> Result<()> {
        let command = self.build_command(package, root, build_option_packages, build_option_file);
        info!("Building {} in {}", package, root.display());

        let log_file = log_dir.join(format!("{}.log", package));
        if !self.runner.run(&command, Some(&log_file))? {
            error!("Building {} failed, see {}", package, log_file.display());
            return Err(Error::BuildFailure {
                package: package.to_string(),
                message: format!("build command failed: {}", command),
            });
        }
        info!("Built {}", package);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        commands: Mutex<Vec<(String, Option<PathBuf>)>>,
        succeed: bool,
    }

    impl CommandRunner for Recorder {
        fn run(&self, command: &str, log_file: Option<&Path>) -> Result<bool> {
            self.commands
                .lock()
                .unwrap()
                .push((command.to_string(), log_file.map(Path::to_path_buf)));
            Ok(self.succeed)
        }
    }

    fn builder(succeed: bool) -> (RpmBuilder, Arc<Recorder>) {
        let runner = Arc::new(Recorder { succeed, ..Default::default() });
        let config = BootstrapConfig::new();
        (RpmBuilder::new(&config, runner.clone()), runner)
    }

    #[test]
    fn test_build_command_layout() {
        let (builder, _) = builder(true);
        let command = builder.build_command("gcc", Path::new("/mnt/build-gcc"), &[], None);

        assert!(command.contains("cp SPECS/gcc/gcc.spec /mnt/build-gcc/usr/src/photon/SPECS/"));
        assert!(command.contains("chroot /mnt/build-gcc /bin/bash -l -c"));
        assert!(command.contains("/usr/src/photon/SPECS/gcc.spec"));
        assert!(command.ends_with("cp -r /mnt/build-gcc/usr/src/photon/RPMS/. stage/RPMS/"));
        assert!(!command.contains("build_options_file"));
    }

    #[test]
    fn test_build_options_only_for_listed_packages() {
        let (builder, _) = builder(true);
        let options = vec!["glibc".to_string()];
        let file = Path::new("/etc/build-options.json");

        let glibc = builder.build_command("glibc", Path::new("/r"), &options, Some(file));
        let gcc = builder.build_command("gcc", Path::new("/r"), &options, Some(file));
        assert!(glibc.contains("--define 'build_options_file /etc/build-options.json'"));
        assert!(!gcc.contains("build_options_file"));
    }

    #[test]
    fn test_build_failure_is_reported() {
        let (builder, runner) = builder(false);
        let err = builder
            .build("gcc", Path::new("/r"), &[], None, Path::new("/logs"))
            .unwrap_err();

        assert!(matches!(err, Error::BuildFailure { ref package, .. } if package == "gcc"));
        let commands = runner.commands.lock().unwrap();
        assert_eq!(commands[0].1.as_deref(), Some(Path::new("/logs/gcc.log")));
    }

    #[test]
    fn test_adjust_compiler_runs_script_in_root() {
        let (builder, runner) = builder(true);
        builder
            .adjust_compiler("gcc", Path::new("/mnt/build-gcc"), Path::new("/logs"))
            .unwrap();

        let commands = runner.commands.lock().unwrap();
        assert_eq!(
            commands[0].0,
            "cp adjust-tool-chain.sh /mnt/build-gcc/tmp/ && chroot /mnt/build-gcc /bin/bash -c /tmp/adjust-tool-chain.sh"
        );
    }
}
