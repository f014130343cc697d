//! Deployment orchestration for Webflow component libraries.
//!
//! A run moves through these stages:
//! - branch resolution and release/prerelease decision
//! - optional staging of warning-marked sources (prerelease only)
//! - manifest selection, version resolution and name stamping
//! - publishing through the Webflow CLI
//!
//! The staging directory is always removed when a run fails.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{NaiveDate, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::DeployError;
use crate::git::{BranchContext, BranchSource};
use crate::prompt::ConfirmPrompt;
use crate::publisher::{PublishRequest, Publisher};
use crate::selector::{select_manifest, ComponentRetarget, ReleaseChannel};
use crate::staging::{cleanup_staging_dir, prepare_staging, StagingDir, StagingLayout};
use crate::stamper::stamp_library_name;
use crate::version::{resolve_version, ResolvedVersion};

/// Where a deployment run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStage {
    Idle,
    BranchResolved,
    Staged,
    ConfigSelected,
    VersionResolved,
    NameStamped,
    Published,
    Cleaned,
    Failed,
}

impl DeployStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployStage::Idle => "idle",
            DeployStage::BranchResolved => "branch resolved",
            DeployStage::Staged => "staged",
            DeployStage::ConfigSelected => "config selected",
            DeployStage::VersionResolved => "version resolved",
            DeployStage::NameStamped => "name stamped",
            DeployStage::Published => "published",
            DeployStage::Cleaned => "cleaned",
            DeployStage::Failed => "failed",
        }
    }
}

impl fmt::Display for DeployStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a successful deployment
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub branch: BranchContext,
    pub channel: ReleaseChannel,
    pub version: ResolvedVersion,
    /// Manifest that was published
    pub manifest: PathBuf,
    /// Final library name
    pub library_name: String,
    /// Whether sources were staged
    pub staged: bool,
    /// Last stage reached
    pub stage: DeployStage,
}

/// Deployment outcome
#[derive(Debug)]
pub enum DeployOutcome {
    /// Library was shared to Webflow
    Published(DeployReport),
    /// Operator declined the release confirmation
    Declined,
}

/// Runs one deployment
pub struct Deployer<'a> {
    config: &'a Config,
    branches: &'a dyn BranchSource,
    prompt: &'a dyn ConfirmPrompt,
    publisher: &'a dyn Publisher,
    shutdown: &'a AtomicBool,
    today: NaiveDate,
}

impl<'a> Deployer<'a> {
    pub fn new(
        config: &'a Config,
        branches: &'a dyn BranchSource,
        prompt: &'a dyn ConfirmPrompt,
        publisher: &'a dyn Publisher,
        shutdown: &'a AtomicBool,
    ) -> Self {
        Self {
            config,
            branches,
            prompt,
            publisher,
            shutdown,
            today: Utc::now().date_naive(),
        }
    }

    /// Date used for the version fallback
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    fn layout(&self) -> StagingLayout {
        StagingLayout::for_project(&self.config.project_dir)
    }

    fn check_cancelled(&self) -> Result<(), DeployError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(DeployError::Cancelled);
        }
        Ok(())
    }

    /// Run the deployment. On failure the staging directory is removed
    /// before the error is returned.
    pub fn run(&self) -> Result<DeployOutcome, DeployError> {
        let mut stage = DeployStage::Idle;
        let mut staging: Option<StagingDir> = None;

        match self.execute(&mut stage, &mut staging) {
            Ok(DeployOutcome::Published(mut report)) => {
                if let Some(dir) = staging.take() {
                    match dir.cleanup() {
                        Ok(()) => advance(&mut stage, DeployStage::Cleaned),
                        Err(e) => warn!("Failed to clean up deploy directory: {e}"),
                    }
                }
                report.stage = stage;
                Ok(DeployOutcome::Published(report))
            }
            Ok(DeployOutcome::Declined) => Ok(DeployOutcome::Declined),
            Err(e) => {
                error!("Deployment failed during stage '{stage}'");
                advance(&mut stage, DeployStage::Failed);
                let root = staging.map(|s| s.root).unwrap_or_else(|| self.layout().root);
                if let Err(cleanup) = cleanup_staging_dir(&root) {
                    warn!("Failed to clean up deploy directory: {cleanup}");
                }
                Err(e)
            }
        }
    }

    fn execute(
        &self,
        stage: &mut DeployStage,
        staging: &mut Option<StagingDir>,
    ) -> Result<DeployOutcome, DeployError> {
        let config = self.config;

        self.check_cancelled()?;
        let branch = BranchContext::resolve(self.branches, config.main_branch.as_deref())?;
        let channel = ReleaseChannel::resolve(config.channel, &branch);
        info!("Current branch: {}", branch.current);
        info!("Deploying as {channel} (main branch: {})", branch.main);
        advance(stage, DeployStage::BranchResolved);

        if channel == ReleaseChannel::Release && config.confirmation_required() {
            let question = format!(
                "Publish a production release from branch '{}'?",
                branch.current
            );
            if !self.prompt.confirm(&question)? {
                info!("Deployment cancelled by user");
                return Ok(DeployOutcome::Declined);
            }
        }

        let retarget = if channel.is_prerelease() {
            self.check_cancelled()?;
            let progress = self.staging_progress();
            let prepared = prepare_staging(&self.layout(), true, self.shutdown, progress.as_ref());
            if let Some(pb) = progress {
                pb.finish_and_clear();
            }
            *staging = Some(prepared?);
            advance(stage, DeployStage::Staged);
            Some(StagingLayout::staged_pattern())
        } else {
            None
        };

        self.check_cancelled()?;
        let source_pattern = StagingLayout::source_pattern();
        let selected = select_manifest(
            &config.manifest_path(),
            channel,
            retarget.as_deref().map(|to| ComponentRetarget {
                from: &source_pattern,
                to,
            }),
        )?;
        advance(stage, DeployStage::ConfigSelected);

        let resolved = resolve_version(
            &config.project_dir,
            &config.version_file,
            self.today,
            config.strict_version,
        )?;
        info!("Found VERSION: {}", resolved.version);
        advance(stage, DeployStage::VersionResolved);

        let name = stamp_library_name(&selected.target, &resolved.version, channel)?;
        advance(stage, DeployStage::NameStamped);

        self.check_cancelled()?;
        let request = PublishRequest {
            project_dir: config.project_dir.clone(),
            manifest: Some(config.manifest.clone()),
            api_token: config.api_token.clone(),
            no_input: true,
        };
        if let Err(e) = self.publisher.publish(&request) {
            // Ctrl+C reaches the child too; report the interrupt, not its exit status
            self.check_cancelled()?;
            return Err(e);
        }
        advance(stage, DeployStage::Published);

        Ok(DeployOutcome::Published(DeployReport {
            branch,
            channel,
            version: resolved,
            manifest: selected.target,
            library_name: name.stamped,
            staged: staging.is_some(),
            stage: *stage,
        }))
    }

    fn staging_progress(&self) -> Option<ProgressBar> {
        if !self.config.verbose {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} Staging {pos} files...")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Some(pb)
    }
}

fn advance(stage: &mut DeployStage, next: DeployStage) {
    debug!("Stage: {} -> {}", stage, next);
    *stage = next;
}
