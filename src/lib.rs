//! # Webflow Deploy
//!
//! Branch-aware deployment of Webflow component libraries.
//!
//! Production branches publish the library as-is, stamped with its version.
//! Every other branch publishes a separate test library whose name, id and
//! component names are marked so it cannot be mistaken for production.
//!
//! ## Features
//!
//! - Version resolution from `src/version.ts` with `package.json` and date fallbacks
//! - Test manifest derivation from `webflow.main.json`
//! - Staged, warning-marked copy of component sources for prereleases
//! - Confirmation before production releases outside CI
//!
//! ## Usage
//!
//! ```ignore
//! use webflow_deploy::config::Config;
//! use webflow_deploy::deployer::Deployer;
//!
//! let outcome = Deployer::new(&config, &git, &prompt, &publisher, &shutdown).run()?;
//! ```

/// CLI configuration and argument parsing
pub mod config;

/// Recursive directory copying
pub mod copier;

/// Deployment orchestration
pub mod deployer;

/// Error types for deployment operations
pub mod error;

/// Branch detection
pub mod git;

/// Manifest model
pub mod manifest;

/// Operator confirmation and CI detection
pub mod prompt;

/// Webflow CLI invocation
pub mod publisher;

/// Release channel and manifest selection
pub mod selector;

/// Prerelease source staging
pub mod staging;

/// Library name stamping
pub mod stamper;

/// Version resolution
pub mod version;
