//! Branch detection through the system git binary.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::DeployError;

/// Branch assumed when the default branch cannot be detected
pub const FALLBACK_MAIN_BRANCH: &str = "main";

/// Remote HEAD reference used for default branch detection
const ORIGIN_HEAD: &str = "refs/remotes/origin/HEAD";

/// Source of branch information for a deployment
pub trait BranchSource {
    /// Name of the checked-out branch
    fn current_branch(&self) -> Result<String, DeployError>;

    /// Default branch of the `origin` remote, if it can be determined
    fn default_branch(&self) -> Option<String>;
}

/// Branch queries against a repository using the `git` executable
#[derive(Debug, Clone)]
pub struct SystemGit {
    repo_path: PathBuf,
}

impl SystemGit {
    pub fn new(repo_path: &Path) -> Self {
        Self {
            repo_path: repo_path.to_path_buf(),
        }
    }

    fn git(&self, args: &[&str]) -> Result<String, DeployError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_path)
            .args(args)
            .output()
            .map_err(|source| DeployError::GitUnavailable { source })?;

        if !output.status.success() {
            return Err(DeployError::GitFailed {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl BranchSource for SystemGit {
    fn current_branch(&self) -> Result<String, DeployError> {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn default_branch(&self) -> Option<String> {
        match self.git(&["symbolic-ref", ORIGIN_HEAD]) {
            Ok(reference) => parse_remote_head(&reference),
            Err(e) => {
                debug!("Default branch detection failed: {e}");
                None
            }
        }
    }
}

/// `refs/remotes/origin/main` -> `main`
pub fn parse_remote_head(reference: &str) -> Option<String> {
    reference
        .trim()
        .strip_prefix("refs/remotes/origin/")
        .filter(|b| !b.is_empty())
        .map(str::to_string)
}

/// Current branch plus the branch considered the production line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchContext {
    pub current: String,
    pub main: String,
}

impl BranchContext {
    /// Resolve branch names. An explicit main branch wins over detection,
    /// and detection falls back to `main`.
    pub fn resolve(
        source: &dyn BranchSource,
        explicit_main: Option<&str>,
    ) -> Result<Self, DeployError> {
        let current = source.current_branch()?;
        let main = match explicit_main {
            Some(main) => main.to_string(),
            None => source
                .default_branch()
                .unwrap_or_else(|| FALLBACK_MAIN_BRANCH.to_string()),
        };

        Ok(Self { current, main })
    }

    /// Release branches: `main`, `master`, `release/*`, or the main branch
    pub fn is_release_branch(&self) -> bool {
        is_release_branch(&self.current) || self.current == self.main
    }
}

/// Branch-name heuristic for production deployments
pub fn is_release_branch(branch: &str) -> bool {
    branch == "main" || branch == "master" || branch.starts_with("release/")
}
