//! Library name stamping.

use std::path::Path;

use tracing::info;

use crate::error::DeployError;
use crate::manifest::Manifest;
use crate::selector::ReleaseChannel;
use crate::version::{Version, VersionKind};

/// Marker appended to prerelease names
pub const WARNING_MARKER: &str = "⚠️";

/// Library name before and after stamping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedName {
    pub original: String,
    pub stamped: String,
}

/// Append the version suffix to a library name.
///
/// Semver renders as ` v1.2.3`, dates as ` (2025-10-29)`; prereleases get a
/// trailing warning marker. Existing suffixes are not detected, so stamping
/// twice appends twice.
pub fn stamped_name(name: &str, version: &Version, channel: ReleaseChannel) -> String {
    let suffix = match version.kind() {
        VersionKind::Date => format!("({version})"),
        VersionKind::Semver => format!("v{version}"),
    };

    if channel.is_prerelease() {
        format!("{name} {suffix} {WARNING_MARKER}")
    } else {
        format!("{name} {suffix}")
    }
}

/// Rewrite the library name of the manifest at `path` in place
pub fn stamp_library_name(
    path: &Path,
    version: &Version,
    channel: ReleaseChannel,
) -> Result<StampedName, DeployError> {
    let mut manifest = Manifest::load(path)?;

    let original = manifest.library.name.clone();
    let stamped = stamped_name(&original, version, channel);
    manifest.library.name = stamped.clone();
    manifest.save(path)?;

    info!("✓ Updated library name: \"{original}\" → \"{stamped}\"");
    Ok(StampedName { original, stamped })
}
