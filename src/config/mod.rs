//! Configuration management module
//!
//! Resolves the YAML file, `GIT_*` environment and command-line layers into
//! a single immutable [`FetchRequest`] before any fetch work starts.

pub mod request;
pub mod validation;
pub mod yaml;

pub use request::*;

use crate::cli::Args;
use crate::error::FetchError;
use crate::system::System;
use serde::{Deserialize, Serialize};

/// Environment key for the source repository
pub const ENV_REPOSITORY_URL: &str = "GIT_REPOSITORY_URL";
/// Environment key for the destination directory
pub const ENV_TARGET_PATH: &str = "GIT_TARGET_PATH";
/// Environment key for the path inside the repository
pub const ENV_SPARSE_PATH: &str = "GIT_SPARSE_PATH";
/// Environment key for the branch to pull
pub const ENV_BRANCH: &str = "GIT_BRANCH";
/// Environment key for the subfolder below the destination
pub const ENV_SUBFOLDER: &str = "GIT_SUBFOLDER";
/// Environment key for the git subprocess timeout in seconds
pub const ENV_PULL_TIMEOUT: &str = "GIT_PULL_TIMEOUT";
/// Environment key enabling the existence probe
pub const ENV_PROBE: &str = "GIT_PROBE";

/// One layer of fetch configuration; every field is optional
///
/// Credentials are not part of any layer; they only come from
/// `GIT_USERNAME` / `GIT_TOKEN`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,

    #[serde(alias = "target_path", skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sparse_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subfolder: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<bool>,
}

impl FetchConfig {
    /// Load a configuration layer from a YAML file
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed
    pub fn load_from_file(system: &dyn System, path: &str) -> Result<Self, FetchError> {
        yaml::load_config(system, path)
    }

    /// Read the `GIT_*` environment layer; empty values count as unset
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `GIT_PULL_TIMEOUT` or `GIT_PROBE`
    /// cannot be parsed
    pub fn from_env(system: &dyn System) -> Result<Self, FetchError> {
        let var = |key: &str| system.env_var(key).ok().filter(|v| !v.is_empty());

        Ok(Self {
            repository_url: var(ENV_REPOSITORY_URL),
            destination_path: var(ENV_TARGET_PATH),
            sparse_path: var(ENV_SPARSE_PATH),
            branch: var(ENV_BRANCH),
            subfolder: var(ENV_SUBFOLDER),
            timeout_secs: var(ENV_PULL_TIMEOUT)
                .map(|v| validation::parse_timeout(ENV_PULL_TIMEOUT, &v))
                .transpose()?,
            probe: var(ENV_PROBE)
                .map(|v| validation::parse_flag(ENV_PROBE, &v))
                .transpose()?,
        })
    }

    /// Build the command-line layer
    ///
    /// # Errors
    ///
    /// Returns a configuration error if only some of the required
    /// positional arguments were given
    pub fn from_args(args: &Args) -> Result<Self, FetchError> {
        validation::validate_positionals(args)?;

        Ok(Self {
            repository_url: args.repository_url.clone(),
            destination_path: args.destination_path.clone(),
            sparse_path: args.sparse_path.clone(),
            branch: args.branch.clone(),
            subfolder: args.subfolder.clone(),
            timeout_secs: args.timeout,
            probe: args.probe.then_some(true),
        })
    }

    /// Layer `overlay` on top of `self`; values set in `overlay` win
    #[must_use]
    pub fn merge(self, overlay: Self) -> Self {
        Self {
            repository_url: overlay.repository_url.or(self.repository_url),
            destination_path: overlay.destination_path.or(self.destination_path),
            sparse_path: overlay.sparse_path.or(self.sparse_path),
            branch: overlay.branch.or(self.branch),
            subfolder: overlay.subfolder.or(self.subfolder),
            timeout_secs: overlay.timeout_secs.or(self.timeout_secs),
            probe: overlay.probe.or(self.probe),
        }
    }

    /// Resolve every layer: file (if `--config` was given) < env < CLI
    ///
    /// # Errors
    ///
    /// Returns a configuration error from any layer
    pub fn resolve(system: &dyn System, args: &Args) -> Result<Self, FetchError> {
        let file = match &args.config {
            Some(path) => Self::load_from_file(system, path)?,
            None => Self::default(),
        };

        Ok(file
            .merge(Self::from_env(system)?)
            .merge(Self::from_args(args)?))
    }

    /// Turn the merged configuration into a request plus run settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming every missing required field,
    /// or describing the first malformed value
    pub fn into_request(
        self,
        system: &dyn System,
    ) -> Result<(FetchRequest, FetchSettings), FetchError> {
        validation::build_request(system, self)
    }
}
