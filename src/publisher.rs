//! Invocation of the Webflow CLI.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::DeployError;

/// Webflow API token, redacted in debug output
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }

    #[inline]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

/// Everything the publish step needs
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Working directory of the publish command
    pub project_dir: PathBuf,
    /// Manifest path, passed through as given on the command line
    pub manifest: Option<PathBuf>,
    pub api_token: Option<ApiToken>,
    /// Suppress the Webflow CLI's own prompts
    pub no_input: bool,
}

impl PublishRequest {
    pub fn new(project_dir: &Path) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            manifest: None,
            api_token: None,
            no_input: true,
        }
    }
}

/// Publishes a library to Webflow
pub trait Publisher {
    fn publish(&self, request: &PublishRequest) -> Result<(), DeployError>;
}

/// Runs `npx webflow library share` with inherited standard streams
#[derive(Debug, Clone)]
pub struct CommandPublisher {
    program: String,
    base_args: Vec<String>,
}

impl CommandPublisher {
    /// Publisher for an arbitrary command prefix
    pub fn new(program: &str, base_args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            base_args: base_args.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// The Webflow CLI through npx
    pub fn webflow() -> Self {
        let npx = if cfg!(windows) { "npx.cmd" } else { "npx" };
        Self::new(npx, &["webflow", "library", "share"])
    }

    /// Full argument list for a request
    pub fn args(&self, request: &PublishRequest) -> Vec<String> {
        let mut args = self.base_args.clone();

        if let Some(ref manifest) = request.manifest {
            args.push("--manifest".to_string());
            args.push(manifest.display().to_string());
        }
        if let Some(ref token) = request.api_token {
            args.push("--api-token".to_string());
            args.push(token.expose().to_string());
        }
        if request.no_input {
            args.push("--no-input".to_string());
        }

        args
    }

    /// Command line for logs, with the token masked
    pub fn display_command(&self, request: &PublishRequest) -> String {
        let masked = request.api_token.as_ref().map(|t| t.expose());
        let args: Vec<String> = self
            .args(request)
            .into_iter()
            .map(|a| if Some(a.as_str()) == masked { "***".to_string() } else { a })
            .collect();
        format!("{} {}", self.program, args.join(" "))
    }
}

impl Default for CommandPublisher {
    fn default() -> Self {
        Self::webflow()
    }
}

impl Publisher for CommandPublisher {
    fn publish(&self, request: &PublishRequest) -> Result<(), DeployError> {
        info!("Running webflow library share...");
        debug!("Executing: {}", self.display_command(request));

        let status = Command::new(&self.program)
            .args(self.args(request))
            .current_dir(&request.project_dir)
            .status()
            .map_err(|e| DeployError::PublishSpawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !status.success() {
            return Err(DeployError::PublishFailed {
                code: status.code(),
            });
        }

        info!("✓ Successfully shared library to Webflow");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn request() -> PublishRequest {
        PublishRequest::new(Path::new("."))
    }

    // ==================== args tests ====================

    #[test]
    fn test_args_default_no_input() {
        let publisher = CommandPublisher::webflow();
        assert_eq!(
            publisher.args(&request()),
            vec!["webflow", "library", "share", "--no-input"]
        );
    }

    #[test]
    fn test_args_with_manifest_and_token() {
        let publisher = CommandPublisher::webflow();
        let mut req = request();
        req.manifest = Some(PathBuf::from("webflow.json"));
        req.api_token = Some(ApiToken::new("abc123"));

        assert_eq!(
            publisher.args(&req),
            vec![
                "webflow",
                "library",
                "share",
                "--manifest",
                "webflow.json",
                "--api-token",
                "abc123",
                "--no-input"
            ]
        );
    }

    #[test]
    fn test_args_interactive() {
        let publisher = CommandPublisher::new("webflow", &["library", "share"]);
        let mut req = request();
        req.no_input = false;

        assert_eq!(publisher.args(&req), vec!["library", "share"]);
    }

    #[test]
    fn test_display_command_masks_token() {
        let publisher = CommandPublisher::new("npx", &["webflow", "library", "share"]);
        let mut req = request();
        req.api_token = Some(ApiToken::new("secret-token"));

        let shown = publisher.display_command(&req);

        assert!(!shown.contains("secret-token"));
        assert_eq!(
            shown,
            "npx webflow library share --api-token *** --no-input"
        );
    }

    #[test]
    fn test_api_token_debug_redacted() {
        let token = ApiToken::new("secret-token");
        assert_eq!(format!("{token:?}"), "ApiToken(***)");
    }

    // ==================== publish tests ====================

    #[test]
    fn test_publish_missing_program() {
        let temp = TempDir::new().unwrap();
        let publisher = CommandPublisher::new("webflow-deploy-no-such-program", &[]);

        let result = publisher.publish(&PublishRequest::new(temp.path()));

        assert!(matches!(result, Err(DeployError::PublishSpawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_publish_success() {
        let temp = TempDir::new().unwrap();
        let publisher = CommandPublisher::new("sh", &["-c", "exit 0", "share"]);

        assert!(publisher.publish(&PublishRequest::new(temp.path())).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_publish_nonzero_exit() {
        let temp = TempDir::new().unwrap();
        let publisher = CommandPublisher::new("sh", &["-c", "exit 3", "share"]);

        let result = publisher.publish(&PublishRequest::new(temp.path()));

        assert!(matches!(
            result,
            Err(DeployError::PublishFailed { code: Some(3) })
        ));
    }
}
