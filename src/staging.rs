//! Prerelease staging directory.
//!
//! Copies the component sources into a scratch directory and marks every
//! component's display name with a warning glyph, so a test library is easy
//! to tell apart from production inside the Webflow designer.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::OnceLock;

use indicatif::ProgressBar;
use regex::{Captures, Regex};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::copier::{copy_directory, remove_directory};
use crate::error::DeployError;
use crate::stamper::WARNING_MARKER;

/// Component source directory, relative to the project
pub const SOURCE_DIR: &str = "src";

/// Scratch directory, relative to the project
pub const STAGING_DIR: &str = "deploy";

/// File name suffixes of component declaration files
const COMPONENT_SUFFIXES: &[&str] = &[".webflow.ts", ".webflow.tsx", ".webflow.js", ".webflow.jsx"];

#[allow(clippy::expect_used)]
fn component_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(\bdeclareComponent\([^,]+,\s*\{\s*)name:\s*['"`]([^'"`]+)['"`]"#)
            .expect("component name pattern is valid")
    })
}

/// Whether a file holds a component declaration
pub fn is_component_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| COMPONENT_SUFFIXES.iter().any(|s| name.ends_with(s)))
}

/// Add the warning marker to the first `declareComponent` name in `content`.
///
/// Returns None when there is no declaration or the name is already marked.
/// Later declarations in the same file are not touched.
pub fn mark_component_name(content: &str) -> Option<String> {
    let captures = component_name_pattern().captures(content)?;
    let name = &captures[2];
    if name.contains(WARNING_MARKER) {
        return None;
    }

    let whole = captures.get(0)?;
    let replacement = marked_declaration(&captures);

    let mut marked = String::with_capacity(content.len() + WARNING_MARKER.len() + 4);
    marked.push_str(&content[..whole.start()]);
    marked.push_str(&replacement);
    marked.push_str(&content[whole.end()..]);
    Some(marked)
}

fn marked_declaration(captures: &Captures<'_>) -> String {
    format!("{}name: '{} {}'", &captures[1], &captures[2], WARNING_MARKER)
}

/// Component files under `dir`, in walk order. An unreadable entry is an
/// error, since components below it would ship unmarked.
pub fn find_component_files(dir: &Path) -> Result<Vec<PathBuf>, DeployError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| DeployError::RewriteFailed {
            path: e.path().unwrap_or(dir).to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() && is_component_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Mark every component file under `dir`. Returns the number of files changed.
pub fn mark_component_files(dir: &Path) -> Result<usize, DeployError> {
    let mut modified = 0usize;

    for path in find_component_files(dir)? {
        let content = fs::read_to_string(&path).map_err(|e| DeployError::RewriteFailed {
            path: path.clone(),
            source: e,
        })?;

        if let Some(marked) = mark_component_name(&content) {
            fs::write(&path, marked).map_err(|e| DeployError::RewriteFailed {
                path: path.clone(),
                source: e,
            })?;
            debug!("Marked component in {}", path.display());
            modified += 1;
        }
    }

    Ok(modified)
}

/// Staging layout for a project
#[derive(Debug, Clone)]
pub struct StagingLayout {
    /// Original sources, e.g. `<project>/src`
    pub source: PathBuf,
    /// Scratch root, e.g. `<project>/deploy`
    pub root: PathBuf,
}

impl StagingLayout {
    pub fn for_project(project_dir: &Path) -> Self {
        Self {
            source: project_dir.join(SOURCE_DIR),
            root: project_dir.join(STAGING_DIR),
        }
    }

    /// Where the sources land inside the scratch root
    pub fn staged_source(&self) -> PathBuf {
        self.root.join(SOURCE_DIR)
    }

    /// Manifest pattern prefix of the original sources
    pub fn source_pattern() -> String {
        format!("./{SOURCE_DIR}")
    }

    /// Manifest pattern prefix of the staged sources
    pub fn staged_pattern() -> String {
        format!("./{STAGING_DIR}/{SOURCE_DIR}")
    }
}

/// A prepared staging directory, owned by the current run
#[derive(Debug)]
pub struct StagingDir {
    pub root: PathBuf,
    pub files_copied: u64,
    pub components_marked: usize,
}

impl StagingDir {
    /// Remove the staging directory
    pub fn cleanup(self) -> Result<(), DeployError> {
        cleanup_staging_dir(&self.root)
    }
}

/// Copy sources into a fresh staging directory and mark component names.
///
/// Leftovers from an earlier run are deleted first.
pub fn prepare_staging(
    layout: &StagingLayout,
    add_warnings: bool,
    shutdown: &AtomicBool,
    progress: Option<&ProgressBar>,
) -> Result<StagingDir, DeployError> {
    if !layout.source.is_dir() {
        return Err(DeployError::SourceNotFound {
            path: layout.source.clone(),
        });
    }

    if remove_directory(&layout.root)? {
        info!("Cleaning up old deploy directory...");
    }

    info!("Copying source files to deploy directory...");
    let staged = layout.staged_source();
    let (files_copied, bytes_copied) = copy_directory(&layout.source, &staged, shutdown, progress)?;
    debug!("Copied {files_copied} files ({bytes_copied} bytes) to {}", staged.display());

    let components_marked = if add_warnings {
        mark_component_files(&staged)?
    } else {
        0
    };

    if components_marked > 0 {
        let plural = if components_marked > 1 { "s" } else { "" };
        info!("✓ Added warning icons to {components_marked} component{plural}");
    }

    info!("✓ Deploy directory prepared at: {}", layout.root.display());
    Ok(StagingDir {
        root: layout.root.clone(),
        files_copied,
        components_marked,
    })
}

/// Remove a staging directory if present
pub fn cleanup_staging_dir(root: &Path) -> Result<(), DeployError> {
    if remove_directory(root)? {
        info!("✓ Cleaned up deploy directory");
    }
    Ok(())
}
