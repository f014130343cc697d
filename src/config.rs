//! CLI configuration and runtime settings for library deployment.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::debug;

use crate::manifest::DEFAULT_MANIFEST;
use crate::prompt::is_ci_env;
use crate::publisher::ApiToken;
use crate::selector::ReleaseChannel;
use crate::version::DEFAULT_VERSION_FILE;

/// Options that take a value
const VALUE_FLAGS: &[&str] = &[
    "--version-file",
    "--manifest",
    "--api-token",
    "--main-branch",
    "--project-dir",
];

/// Options without a value
const SWITCH_FLAGS: &[&str] = &[
    "--release",
    "--prerelease",
    "--is-prerelease",
    "--no-input",
    "--strict-version",
    "--verbose",
    "-v",
    "--help",
    "-h",
    "--version",
    "-V",
];

/// Deploy Webflow component libraries
#[derive(Parser, Debug)]
#[command(name = "webflow-deploy")]
#[command(version)]
#[command(about = "Deploy Webflow component libraries with branch-aware versioning")]
#[command(after_help = "Examples:
  webflow-deploy
  webflow-deploy --version-file src/constants/version.ts
  webflow-deploy --main-branch master
  webflow-deploy --api-token abc123 --manifest webflow.json
  webflow-deploy --api-token abc123 --is-prerelease")]
pub struct Cli {
    /// Path to version file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_VERSION_FILE)]
    pub version_file: PathBuf,

    /// Path to webflow.json manifest
    #[arg(long, value_name = "PATH", default_value = DEFAULT_MANIFEST)]
    pub manifest: PathBuf,

    /// Webflow API token for deployment
    #[arg(long, value_name = "TOKEN")]
    pub api_token: Option<String>,

    /// Name of main branch (default: detected from origin, else main)
    #[arg(long, value_name = "NAME")]
    pub main_branch: Option<String>,

    /// Deploy as a production release regardless of branch
    #[arg(long)]
    pub release: bool,

    /// Mark this as a prerelease deployment (adds warnings)
    #[arg(long, visible_alias = "is-prerelease")]
    pub prerelease: bool,

    /// Never prompt; also passed through to the Webflow CLI
    #[arg(long)]
    pub no_input: bool,

    /// Fail instead of falling back when the version file is missing or invalid
    #[arg(long)]
    pub strict_version: bool,

    /// Project root directory
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub project_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Drop arguments the CLI does not know, so stray flags never abort a deploy.
///
/// The program name is kept. Value options are rewritten to `--flag=value`
/// and dropped when their value is missing.
pub fn retain_known_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args = args.into_iter();
    let mut kept: Vec<OsString> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        let Some(text) = arg.to_str() else {
            debug!("Ignoring non UTF-8 argument");
            continue;
        };

        if SWITCH_FLAGS.contains(&text) {
            kept.push(arg);
            continue;
        }

        if let Some((flag, _)) = text.split_once('=') {
            if VALUE_FLAGS.contains(&flag) {
                kept.push(arg);
            } else {
                debug!("Ignoring unknown argument: {text}");
            }
            continue;
        }

        if VALUE_FLAGS.contains(&text) {
            match args.next() {
                Some(value) => {
                    let mut joined = OsString::from(format!("{text}="));
                    joined.push(value);
                    kept.push(joined);
                }
                None => debug!("Ignoring {text} without a value"),
            }
            continue;
        }

        debug!("Ignoring unknown argument: {text}");
    }

    kept
}

/// Runtime configuration parsed from CLI
#[derive(Debug, Clone)]
pub struct Config {
    /// Project root; every relative path below resolves against it
    pub project_dir: PathBuf,
    /// Version file, relative to the project
    pub version_file: PathBuf,
    /// Canonical manifest, relative to the project
    pub manifest: PathBuf,
    pub api_token: Option<ApiToken>,
    /// Explicit main branch (None = detect)
    pub main_branch: Option<String>,
    /// Forced channel (None = decided by branch)
    pub channel: Option<ReleaseChannel>,
    pub no_input: bool,
    pub strict_version: bool,
    pub verbose: bool,
    /// Running under continuous integration
    pub ci: bool,
}

impl Config {
    /// Defaults for a project directory
    pub fn new(project_dir: &Path) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            version_file: PathBuf::from(DEFAULT_VERSION_FILE),
            manifest: PathBuf::from(DEFAULT_MANIFEST),
            api_token: None,
            main_branch: None,
            channel: None,
            no_input: false,
            strict_version: false,
            verbose: false,
            ci: false,
        }
    }

    /// Create Config from CLI arguments and the process environment
    pub fn from_cli(cli: Cli, get_env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let project_dir = cli.project_dir.canonicalize().unwrap_or(cli.project_dir);
        if !project_dir.is_dir() {
            anyhow::bail!("Project directory not found: {}", project_dir.display());
        }

        // Prerelease wins when both are given
        let channel = if cli.prerelease {
            Some(ReleaseChannel::Prerelease)
        } else if cli.release {
            Some(ReleaseChannel::Release)
        } else {
            None
        };

        Ok(Config {
            project_dir,
            version_file: cli.version_file,
            manifest: cli.manifest,
            api_token: non_empty(cli.api_token).map(|t| ApiToken::new(&t)),
            main_branch: non_empty(cli.main_branch),
            channel,
            no_input: cli.no_input,
            strict_version: cli.strict_version,
            verbose: cli.verbose,
            ci: is_ci_env(get_env),
        })
    }

    /// Absolute path of the canonical manifest
    pub fn manifest_path(&self) -> PathBuf {
        self.project_dir.join(&self.manifest)
    }

    /// Release deployments ask first unless told not to or running in CI
    pub fn confirmation_required(&self) -> bool {
        !self.no_input && !self.ci
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
