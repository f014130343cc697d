//! Version resolution for library name stamping.
//!
//! The version is read from an exported `VERSION` constant in a source file.
//! When that is missing or unusable, resolution falls back to the project's
//! `package.json` version and finally to today's date.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::DeployError;

/// Default location of the version constant, relative to the project
pub const DEFAULT_VERSION_FILE: &str = "src/version.ts";

/// Project descriptor consulted for the fallback version
pub const PROJECT_DESCRIPTOR: &str = "package.json";

/// Date format used for date-based versions
const DATE_FORMAT: &str = "%Y-%m-%d";

#[allow(clippy::expect_used)]
fn version_constant_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"export\s+const\s+VERSION\s*=\s*['"]([^'"]*)['"]"#)
            .expect("version constant pattern is valid")
    })
}

#[allow(clippy::expect_used)]
fn semver_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d+(\.\d+)?(\.\d+)?(-[a-zA-Z0-9.-]+)?$").expect("semver pattern is valid")
    })
}

#[allow(clippy::expect_used)]
fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"))
}

/// How a version is rendered in the library name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionKind {
    /// Semantic version such as `1.2.3` or `2.0.0-beta.1`
    Semver,
    /// Calendar date in `YYYY-MM-DD` form
    Date,
}

/// A resolved library version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(String);

impl Version {
    /// Create a Version without validation
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }

    /// Date-based version for the given day
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format(DATE_FORMAT).to_string())
    }

    /// Create a validated Version (partial semver with optional prerelease suffix)
    pub fn validated(s: &str) -> Result<Self, String> {
        if is_valid_version(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(format!("invalid semver format \"{s}\""))
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Date-shaped versions take precedence over semver, since `2025-10-29`
    /// also satisfies the semver pattern.
    pub fn kind(&self) -> VersionKind {
        if date_pattern().is_match(&self.0) {
            VersionKind::Date
        } else {
            VersionKind::Semver
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check a candidate against the accepted semver pattern
pub fn is_valid_version(s: &str) -> bool {
    semver_pattern().is_match(s)
}

/// Where the resolved version came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    /// The `VERSION` constant in the version file
    VersionFile(PathBuf),
    /// The `version` field of `package.json`
    Descriptor(PathBuf),
    /// Today's date
    Date,
}

/// A version together with its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: Version,
    pub source: VersionSource,
}

/// Why the version file could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
enum Unusable {
    Missing,
    NoConstant,
    Invalid(String),
}

impl fmt::Display for Unusable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unusable::Missing => write!(f, "file not found"),
            Unusable::NoConstant => write!(f, "VERSION constant not found or empty"),
            Unusable::Invalid(v) => write!(f, "invalid semver format \"{v}\""),
        }
    }
}

/// Extract the first `export const VERSION = "..."` value from file content.
/// Returns None when the constant is absent or blank.
pub fn parse_version_constant(content: &str) -> Option<&str> {
    let captures = version_constant_pattern().captures(content)?;
    let value = captures.get(1)?.as_str().trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn read_version_file(path: &Path) -> Result<Result<Version, Unusable>, DeployError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Err(Unusable::Missing)),
        Err(e) => return Err(DeployError::Io(e)),
    };

    let Some(value) = parse_version_constant(&content) else {
        return Ok(Err(Unusable::NoConstant));
    };

    Ok(Version::validated(value).map_err(|_| Unusable::Invalid(value.to_string())))
}

#[derive(Deserialize)]
struct PackageDescriptor {
    version: Option<String>,
}

/// Read a non-empty `version` field from `package.json` in the project root
pub fn read_descriptor_version(project_dir: &Path) -> Option<String> {
    let path = project_dir.join(PROJECT_DESCRIPTOR);
    let content = fs::read_to_string(&path).ok()?;

    match serde_json::from_str::<PackageDescriptor>(&content) {
        Ok(descriptor) => descriptor
            .version
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()),
        Err(e) => {
            warn!("Failed to read {}: {e}", path.display());
            None
        }
    }
}

/// Fallback chain: project descriptor version, then today's date
pub fn fallback_version(project_dir: &Path, today: NaiveDate) -> ResolvedVersion {
    if let Some(version) = read_descriptor_version(project_dir) {
        info!("Using version from {PROJECT_DESCRIPTOR}: {version}");
        return ResolvedVersion {
            version: Version(version),
            source: VersionSource::Descriptor(project_dir.join(PROJECT_DESCRIPTOR)),
        };
    }

    let version = Version::from_date(today);
    info!("Using date-based fallback version: {version}");
    ResolvedVersion {
        version,
        source: VersionSource::Date,
    }
}

/// Resolve the library version.
///
/// `version_file` is relative to `project_dir` unless absolute. With `strict`
/// set, an unusable version file is an error instead of triggering the
/// fallback chain.
pub fn resolve_version(
    project_dir: &Path,
    version_file: &Path,
    today: NaiveDate,
    strict: bool,
) -> Result<ResolvedVersion, DeployError> {
    let path = project_dir.join(version_file);

    let reason = match read_version_file(&path) {
        Ok(Ok(version)) => {
            return Ok(ResolvedVersion {
                version,
                source: VersionSource::VersionFile(path),
            })
        }
        Ok(Err(reason)) => reason,
        Err(e) if strict => return Err(e),
        Err(e) => {
            warn!("Failed to read {}: {e}", path.display());
            Unusable::Missing
        }
    };

    if strict {
        return Err(match reason {
            Unusable::Missing => DeployError::VersionFileNotFound { path },
            other => DeployError::InvalidVersion {
                path,
                reason: other.to_string(),
            },
        });
    }

    info!("{}: {reason}", version_file.display());
    Ok(fallback_version(project_dir, today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 29).unwrap()
    }

    fn project_with_version_file(content: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src").join("version.ts"), content).unwrap();
        temp
    }

    fn resolve(temp: &TempDir) -> ResolvedVersion {
        resolve_version(temp.path(), Path::new(DEFAULT_VERSION_FILE), day(), false).unwrap()
    }

    // ==================== validation tests ====================

    #[test]
    fn test_valid_versions_round_trip_unchanged() {
        for v in ["1", "1.2", "1.2.3", "1.2.3-beta.1", "10.20.30-rc-1", "0.0.1-alpha"] {
            assert!(is_valid_version(v), "{v} should be valid");
            let temp = project_with_version_file(&format!("export const VERSION = \"{v}\";\n"));
            assert_eq!(resolve(&temp).version.as_str(), v);
        }
    }

    #[test]
    fn test_invalid_versions_rejected() {
        for v in ["v1.2.3", "1.2.3.4", "latest", "1.2.3+build", "1..2", ""] {
            assert!(!is_valid_version(v), "{v} should be invalid");
        }
    }

    #[test]
    fn test_version_kind() {
        assert_eq!(Version::new("2.1.0").kind(), VersionKind::Semver);
        assert_eq!(Version::new("2025-10-29").kind(), VersionKind::Date);
        assert_eq!(Version::new("2025-10").kind(), VersionKind::Semver);
    }

    #[test]
    fn test_version_from_date() {
        assert_eq!(Version::from_date(day()).as_str(), "2025-10-29");
    }

    // ==================== parse_version_constant tests ====================

    #[test]
    fn test_parse_double_quotes() {
        assert_eq!(parse_version_constant("export const VERSION = \"2.1.0\";"), Some("2.1.0"));
    }

    #[test]
    fn test_parse_single_quotes() {
        assert_eq!(parse_version_constant("export const VERSION = '0.3';"), Some("0.3"));
    }

    #[test]
    fn test_parse_first_match_only() {
        let content = "export const VERSION = \"1.0.0\";\nexport const VERSION = \"2.0.0\";\n";
        assert_eq!(parse_version_constant(content), Some("1.0.0"));
    }

    #[test]
    fn test_parse_blank_value() {
        assert_eq!(parse_version_constant("export const VERSION = \"  \";"), None);
        assert_eq!(parse_version_constant("export const VERSION = '';"), None);
    }

    #[test]
    fn test_parse_absent() {
        assert_eq!(parse_version_constant("export const NAME = \"lib\";"), None);
    }

    // ==================== resolve_version tests ====================

    #[test]
    fn test_resolve_from_version_file() {
        let temp = project_with_version_file("export const VERSION = \"2.1.0\";\n");
        let resolved = resolve(&temp);

        assert_eq!(resolved.version.as_str(), "2.1.0");
        assert!(matches!(resolved.source, VersionSource::VersionFile(_)));
    }

    #[test]
    fn test_resolve_missing_constant_uses_descriptor() {
        let temp = project_with_version_file("export const NAME = \"x\";\n");
        fs::write(
            temp.path().join("package.json"),
            r#"{ "name": "lib", "version": "3.4.5" }"#,
        )
        .unwrap();

        let resolved = resolve(&temp);

        assert_eq!(resolved.version.as_str(), "3.4.5");
        assert!(matches!(resolved.source, VersionSource::Descriptor(_)));
    }

    #[test]
    fn test_resolve_invalid_constant_uses_descriptor() {
        let temp = project_with_version_file("export const VERSION = \"next\";\n");
        fs::write(temp.path().join("package.json"), r#"{ "version": "1.0.0" }"#).unwrap();

        assert_eq!(resolve(&temp).version.as_str(), "1.0.0");
    }

    #[test]
    fn test_resolve_empty_descriptor_version_uses_date() {
        let temp = project_with_version_file("// nothing here\n");
        fs::write(temp.path().join("package.json"), r#"{ "version": "  " }"#).unwrap();

        let resolved = resolve(&temp);

        assert_eq!(resolved.version.as_str(), "2025-10-29");
        assert_eq!(resolved.source, VersionSource::Date);
    }

    #[test]
    fn test_resolve_malformed_descriptor_uses_date() {
        let temp = project_with_version_file("");
        fs::write(temp.path().join("package.json"), "{ not json").unwrap();

        assert_eq!(resolve(&temp).source, VersionSource::Date);
    }

    #[test]
    fn test_resolve_missing_file_no_descriptor_uses_date() {
        let temp = TempDir::new().unwrap();
        let resolved = resolve(&temp);

        assert_eq!(resolved.version.as_str(), "2025-10-29");
        assert_eq!(resolved.version.kind(), VersionKind::Date);
    }

    #[test]
    fn test_resolve_date_shaped_constant_accepted() {
        let temp = project_with_version_file("export const VERSION = \"2024-01-15\";\n");
        let resolved = resolve(&temp);

        assert_eq!(resolved.version.as_str(), "2024-01-15");
        assert!(matches!(resolved.source, VersionSource::VersionFile(_)));
    }

    #[test]
    fn test_resolve_custom_version_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src").join("constants")).unwrap();
        fs::write(
            temp.path().join("src").join("constants").join("version.ts"),
            "export const VERSION = '4.0.0';",
        )
        .unwrap();

        let resolved = resolve_version(
            temp.path(),
            Path::new("src/constants/version.ts"),
            day(),
            false,
        )
        .unwrap();

        assert_eq!(resolved.version.as_str(), "4.0.0");
    }

    // ==================== strict mode tests ====================

    #[test]
    fn test_strict_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let result = resolve_version(temp.path(), Path::new(DEFAULT_VERSION_FILE), day(), true);

        assert!(matches!(result, Err(DeployError::VersionFileNotFound { .. })));
    }

    #[test]
    fn test_strict_invalid_constant_is_error() {
        let temp = project_with_version_file("export const VERSION = \"latest\";\n");
        let result = resolve_version(temp.path(), Path::new(DEFAULT_VERSION_FILE), day(), true);

        match result {
            Err(DeployError::InvalidVersion { reason, .. }) => assert!(reason.contains("latest")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_strict_valid_constant_ok() {
        let temp = project_with_version_file("export const VERSION = \"1.2\";\n");
        let resolved =
            resolve_version(temp.path(), Path::new(DEFAULT_VERSION_FILE), day(), true).unwrap();

        assert_eq!(resolved.version.as_str(), "1.2");
    }
}
