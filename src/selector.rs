//! Release channel decision and manifest selection.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::DeployError;
use crate::git::BranchContext;
use crate::manifest::{main_manifest_path, Manifest};

/// Production or test deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseChannel {
    /// Production library, published under its own name and id
    Release,
    /// Test library with warning markers
    Prerelease,
}

impl ReleaseChannel {
    /// An explicit override wins; otherwise the branch decides
    pub fn resolve(forced: Option<ReleaseChannel>, branch: &BranchContext) -> Self {
        match forced {
            Some(channel) => channel,
            None if branch.is_release_branch() => ReleaseChannel::Release,
            None => ReleaseChannel::Prerelease,
        }
    }

    #[inline]
    pub fn is_prerelease(&self) -> bool {
        matches!(self, ReleaseChannel::Prerelease)
    }

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseChannel::Release => "release",
            ReleaseChannel::Prerelease => "prerelease",
        }
    }
}

impl fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Component pattern rewrite applied when sources were staged
#[derive(Debug, Clone, Copy)]
pub struct ComponentRetarget<'a> {
    pub from: &'a str,
    pub to: &'a str,
}

/// The manifest written to the canonical target path
#[derive(Debug)]
pub struct SelectedManifest {
    /// File the configuration was read from
    pub source: PathBuf,
    /// Canonical manifest path that was written
    pub target: PathBuf,
    pub manifest: Manifest,
}

/// Manifest the configuration for `channel` is read from.
///
/// A release may fall back to the target manifest when there is no
/// `<stem>.main.json`. A prerelease always reads `<stem>.main.json`, since
/// deriving from the target would derive from the previous run's test
/// manifest.
pub fn source_manifest_path(target: &Path, channel: ReleaseChannel) -> PathBuf {
    let main = main_manifest_path(target);
    match channel {
        ReleaseChannel::Release if !main.exists() => target.to_path_buf(),
        _ => main,
    }
}

/// Write the manifest variant for `channel` to `target`.
///
/// Release keeps the production configuration; prerelease derives the test
/// library from it. Nothing is written if the source cannot be read.
pub fn select_manifest(
    target: &Path,
    channel: ReleaseChannel,
    retarget: Option<ComponentRetarget<'_>>,
) -> Result<SelectedManifest, DeployError> {
    let source = source_manifest_path(target, channel);
    let production = Manifest::load(&source)?;

    let mut manifest = match channel {
        ReleaseChannel::Release => production,
        ReleaseChannel::Prerelease => production.to_test_manifest(),
    };

    if let Some(rule) = retarget {
        manifest.retarget_components(rule.from, rule.to);
    }

    manifest.save(target)?;

    let label = file_label(&source);
    match channel {
        ReleaseChannel::Release => info!("✓ Using {label}"),
        ReleaseChannel::Prerelease => info!("✓ Using {label} (auto-generated test config)"),
    }

    Ok(SelectedManifest {
        source,
        target: target.to_path_buf(),
        manifest,
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
