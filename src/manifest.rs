//! The `webflow.json` library manifest.
//!
//! Only the fields this tool touches are typed. The whole document is kept
//! as read, and the typed fields are patched back into it in place, so every
//! key keeps its position.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::DeployError;

/// Default manifest path, relative to the project
pub const DEFAULT_MANIFEST: &str = "webflow.json";

/// Suffix appended to the library name of the test manifest
pub const TEST_NAME_SUFFIX: &str = " Test";

/// Suffix appended to the library id of the test manifest
pub const TEST_ID_SUFFIX: &str = "-test";

/// Library section of the manifest
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Library {
    pub name: String,
    pub id: String,
    /// Glob-like source patterns, e.g. `./src/**/*.webflow.tsx`
    #[serde(default)]
    pub components: Option<Vec<String>>,
}

/// A Webflow library manifest
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub library: Library,
    document: Map<String, Value>,
}

impl Manifest {
    /// Load and parse a manifest from disk
    pub fn load(path: &Path) -> Result<Self, DeployError> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                DeployError::ManifestNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                DeployError::ManifestRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, DeployError> {
        let invalid = |e: serde_json::Error| DeployError::ManifestInvalid {
            path: path.to_path_buf(),
            source: e,
        };

        let document: Map<String, Value> = serde_json::from_str(content).map_err(invalid)?;
        let section = document.get("library").cloned().unwrap_or(Value::Null);
        let library = serde_json::from_value(section).map_err(invalid)?;

        Ok(Self { library, document })
    }

    /// Top-level value by key, as read from disk
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// The document with the typed library fields written back
    pub fn to_value(&self) -> Value {
        let mut document = self.document.clone();
        let section = document
            .entry("library")
            .or_insert_with(|| Value::Object(Map::new()));

        if let Value::Object(library) = section {
            library.insert("name".to_string(), Value::from(self.library.name.clone()));
            library.insert("id".to_string(), Value::from(self.library.id.clone()));
            if let Some(components) = &self.library.components {
                library.insert("components".to_string(), Value::from(components.clone()));
            }
        }

        Value::Object(document)
    }

    /// Serialize with two-space indentation
    pub fn to_json(&self, path: &Path) -> Result<String, DeployError> {
        serde_json::to_string_pretty(&self.to_value()).map_err(|e| {
            DeployError::ManifestInvalid {
                path: path.to_path_buf(),
                source: e,
            }
        })
    }

    /// Write the whole document. Serialization happens before the file is
    /// touched, so a failure never leaves a truncated manifest behind.
    pub fn save(&self, path: &Path) -> Result<(), DeployError> {
        let json = self.to_json(path)?;
        fs::write(path, json).map_err(|e| DeployError::ManifestWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Derive the test/prerelease manifest: `<name> Test` and `<id>-test`
    pub fn to_test_manifest(&self) -> Self {
        let mut test = self.clone();
        test.library.name = format!("{}{}", self.library.name, TEST_NAME_SUFFIX);
        test.library.id = format!("{}{}", self.library.id, TEST_ID_SUFFIX);
        test
    }

    /// Point component patterns at a staged copy of the sources.
    /// Only the first occurrence of `from` in each pattern is replaced.
    pub fn retarget_components(&mut self, from: &str, to: &str) {
        if let Some(components) = self.library.components.as_mut() {
            for pattern in components.iter_mut() {
                if pattern.contains(from) {
                    *pattern = pattern.replacen(from, to, 1);
                }
            }
        }
    }
}

/// Sibling manifest holding the production configuration,
/// e.g. `webflow.json` -> `webflow.main.json`
pub fn main_manifest_path(manifest: &Path) -> PathBuf {
    let stem = manifest
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "webflow".to_string());

    let file_name = match manifest.extension() {
        Some(ext) => format!("{stem}.main.{}", ext.to_string_lossy()),
        None => format!("{stem}.main"),
    };

    manifest.with_file_name(file_name)
}
