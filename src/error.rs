use std::path::PathBuf;
use thiserror::Error;

/// Deployment error types
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Manifest not found: {path}")]
    ManifestNotFound { path: PathBuf },

    #[error("Failed to read manifest: {path}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest JSON: {path}")]
    ManifestInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write manifest: {path}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Version file not found: {path}")]
    VersionFileNotFound { path: PathBuf },

    #[error("No valid VERSION constant in {path}: {reason}")]
    InvalidVersion { path: PathBuf, reason: String },

    #[error("git {command} failed: {stderr}")]
    GitFailed { command: String, stderr: String },

    #[error("Failed to run git")]
    GitUnavailable {
        #[source]
        source: std::io::Error,
    },

    #[error("Source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("No space left on device for {path}")]
    DiskFull { path: PathBuf },

    #[error("Failed to copy {src} to {dst}")]
    CopyFailed {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory: {path}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove directory: {path}")]
    RemoveDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rewrite component file: {path}")]
    RewriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start {program}")]
    PublishSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("webflow library share failed with {}", describe_exit(.code))]
    PublishFailed { code: Option<i32> },

    #[error("Confirmation prompt failed")]
    Prompt(#[source] dialoguer::Error),

    #[error("Deployment cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            DeployError::Cancelled => 130,
            _ => 1,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_string(),
    }
}
