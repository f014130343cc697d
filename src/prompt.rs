//! Operator confirmation and CI detection.

use dialoguer::Confirm;

use crate::error::DeployError;

/// Environment variables that mark a continuous-integration run
const CI_ENV_KEYS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "JENKINS_HOME",
    "BUILDKITE",
    "CIRCLECI",
    "TRAVIS",
    "TEAMCITY_VERSION",
];

/// Whether the environment looks like a CI runner
pub fn is_ci_env(get_env: impl Fn(&str) -> Option<String>) -> bool {
    CI_ENV_KEYS.iter().any(|k| get_env(k).is_some())
}

/// Asks the operator a yes/no question
pub trait ConfirmPrompt {
    fn confirm(&self, question: &str) -> Result<bool, DeployError>;
}

/// Terminal prompt, blocks until answered
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl ConfirmPrompt for TerminalPrompt {
    fn confirm(&self, question: &str) -> Result<bool, DeployError> {
        Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .map_err(DeployError::Prompt)
    }
}

/// Fixed answer, for non-interactive callers and tests
#[derive(Debug, Clone, Copy)]
pub struct ScriptedPrompt(pub bool);

impl ConfirmPrompt for ScriptedPrompt {
    fn confirm(&self, _question: &str) -> Result<bool, DeployError> {
        Ok(self.0)
    }
}
