// src/bootstrap/progress.rs

//! Per-package progress of a core toolchain run

use serde::Serialize;

/// Where a core package is in its build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "phase", content = "error")]
pub enum PackagePhase {
    NotStarted,
    /// Artifact already present in the current build output
    Skipped,
    RootCreated,
    DefaultToolchainInstalled,
    CompilerAdjusted,
    PackageBuilt,
    /// Built and its root torn down
    RootDestroyed,
    Failed(String),
}

impl PackagePhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::Skipped => "skipped",
            Self::RootCreated => "root created",
            Self::DefaultToolchainInstalled => "toolchain installed",
            Self::CompilerAdjusted => "compiler adjusted",
            Self::PackageBuilt => "built",
            Self::RootDestroyed => "done",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl std::fmt::Display for PackagePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Phases of every core package, in build order
#[derive(Debug, Clone, Default, Serialize)]
pub struct BootstrapProgress {
    packages: Vec<(String, PackagePhase)>,
}

impl BootstrapProgress {
    pub fn new<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            packages: packages
                .into_iter()
                .map(|p| (p.into(), PackagePhase::NotStarted))
                .collect(),
        }
    }

    pub fn set(&mut self, package: &str, phase: PackagePhase) {
        match self.packages.iter_mut().find(|(name, _)| name == package) {
            Some((_, current)) => *current = phase,
            None => self.packages.push((package.to_string(), phase)),
        }
    }

    pub fn phase(&self, package: &str) -> Option<&PackagePhase> {
        self.packages
            .iter()
            .find(|(name, _)| name == package)
            .map(|(_, phase)| phase)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PackagePhase)> {
        self.packages.iter().map(|(name, phase)| (name.as_str(), phase))
    }

    fn with_phase(&self, wanted: &PackagePhase) -> Vec<&str> {
        self.iter()
            .filter(|(_, phase)| *phase == wanted)
            .map(|(name, _)| name)
            .collect()
    }

    /// Packages fully built, in build order
    pub fn built(&self) -> Vec<&str> {
        self.with_phase(&PackagePhase::RootDestroyed)
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.with_phase(&PackagePhase::Skipped)
    }

    pub fn pending(&self) -> Vec<&str> {
        self.with_phase(&PackagePhase::NotStarted)
    }

    /// The package that aborted the run and why
    pub fn failed(&self) -> Option<(&str, &str)> {
        self.iter().find_map(|(name, phase)| match phase {
            PackagePhase::Failed(reason) => Some((name, reason.as_str())),
            _ => None,
        })
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} built, {} skipped, {} not started",
            self.built().len(),
            self.skipped().len(),
            self.pending().len()
        );
        if let Some((name, _)) = self.failed() {
            summary.push_str(&format!(", failed at {}", name));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_tracking() {
        let mut progress = BootstrapProgress::new(["a", "b", "c"]);
        progress.set("a", PackagePhase::Skipped);
        progress.set("b", PackagePhase::RootDestroyed);
        progress.set("c", PackagePhase::Failed("install failed".to_string()));

        assert_eq!(progress.skipped(), vec!["a"]);
        assert_eq!(progress.built(), vec!["b"]);
        assert_eq!(progress.failed(), Some(("c", "install failed")));
        assert_eq!(progress.summary(), "1 built, 1 skipped, 0 not started, failed at c");
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(PackagePhase::CompilerAdjusted.to_string(), "compiler adjusted");
        assert_eq!(PackagePhase::Failed("boom".to_string()).to_string(), "failed: boom");
    }

    #[test]
    fn test_progress_serializes() {
        let mut progress = BootstrapProgress::new(["gcc"]);
        progress.set("gcc", PackagePhase::Failed("boom".to_string()));
        let json = serde_json::to_string(&progress).unwrap();
        assert_eq!(json, r#"{"packages":[["gcc",{"phase":"failed","error":"boom"}]]}"#);
    }
}
