//! Configuration validation logic

use crate::cli::Args;
use crate::config::{
    Credentials, DEFAULT_BRANCH, FetchConfig, FetchRequest, FetchSettings, MAX_PULL_TIMEOUT_SECS,
};
use crate::error::FetchError;
use crate::system::System;
use crate::utils::path::{resolve_destination, sparse_segments};
use core::time::Duration;

/// Usage line reported when positional arguments are incomplete
pub const POSITIONAL_USAGE: &str =
    "expected <REPOSITORY_URL> <DESTINATION_PATH> <SPARSE_PATH> [BRANCH], or no arguments to read GIT_* variables";

/// Reject a partial set of required positionals
///
/// # Errors
///
/// Returns a configuration error carrying the usage line
pub fn validate_positionals(args: &Args) -> Result<(), FetchError> {
    let given = [
        args.repository_url.is_some(),
        args.destination_path.is_some(),
        args.sparse_path.is_some(),
    ]
    .into_iter()
    .filter(|present| *present)
    .count();

    if given != 0 && given != 3 {
        return Err(FetchError::configuration(format!(
            "Incomplete positional arguments: {POSITIONAL_USAGE}"
        )));
    }
    Ok(())
}

/// Parse a timeout in whole seconds, between 1 and [`MAX_PULL_TIMEOUT_SECS`]
///
/// # Errors
///
/// Returns a configuration error naming `key` if the value is not an
/// integer in range
pub fn parse_timeout(key: &str, value: &str) -> Result<u64, FetchError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if (1..=MAX_PULL_TIMEOUT_SECS).contains(&secs) => Ok(secs),
        _ => Err(FetchError::configuration(format!(
            "{key} must be between 1 and {MAX_PULL_TIMEOUT_SECS} seconds, got '{value}'"
        ))),
    }
}

/// Reject values git would read as an option rather than an argument
///
/// # Errors
///
/// Returns a configuration error naming `field` if `value` starts with `-`
pub fn reject_option_like(field: &str, value: &str) -> Result<(), FetchError> {
    if value.trim_start().starts_with('-') {
        return Err(FetchError::configuration(format!(
            "{field} must not start with '-': '{value}'"
        )));
    }
    Ok(())
}

/// Parse a boolean switch
///
/// # Errors
///
/// Returns a configuration error naming `key` for unrecognized values
pub fn parse_flag(key: &str, value: &str) -> Result<bool, FetchError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(FetchError::configuration(format!(
            "{key} must be a boolean (true/false), got '{value}'"
        ))),
    }
}

/// Validate the merged configuration and resolve it into a request
///
/// # Errors
///
/// Returns a configuration error listing every missing required field, or
/// the first malformed value
pub fn build_request(
    system: &dyn System,
    config: FetchConfig,
) -> Result<(FetchRequest, FetchSettings), FetchError> {
    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    let repository_url = non_blank(config.repository_url);
    let destination = non_blank(config.destination_path);

    let mut missing = Vec::new();
    if repository_url.is_none() {
        missing.push("repository_url".to_owned());
    }
    if destination.is_none() {
        missing.push("destination_path".to_owned());
    }
    let (Some(repository_url), Some(destination)) = (repository_url, destination) else {
        return Err(FetchError::missing_configuration(missing));
    };

    reject_option_like("repository_url", &repository_url)?;
    let branch = non_blank(config.branch).unwrap_or_else(|| DEFAULT_BRANCH.to_owned());
    reject_option_like("branch", &branch)?;

    let sparse_path = config.sparse_path.unwrap_or_default();
    sparse_segments(&sparse_path)?;

    let subfolder = non_blank(config.subfolder);
    if let Some(subfolder) = &subfolder {
        let segments = sparse_segments(subfolder)?;
        if segments.is_empty() || subfolder.starts_with('/') {
            return Err(FetchError::configuration(format!(
                "Subfolder must be a relative path below the destination: '{subfolder}'"
            )));
        }
    }

    if let Some(secs) = config.timeout_secs
        && !(1..=MAX_PULL_TIMEOUT_SECS).contains(&secs)
    {
        return Err(FetchError::configuration(format!(
            "Timeout must be between 1 and {MAX_PULL_TIMEOUT_SECS} seconds, got {secs}"
        )));
    }

    let request = FetchRequest {
        repository_url: repository_url.trim().to_owned(),
        destination_path: resolve_destination(system, &destination)?,
        sparse_path,
        branch,
        subfolder,
        credentials: Credentials::from_env(system),
    };

    let defaults = FetchSettings::default();
    let settings = FetchSettings {
        pull_timeout: config
            .timeout_secs
            .map_or(defaults.pull_timeout, Duration::from_secs),
        probe: config.probe.unwrap_or(defaults.probe),
    };

    Ok((request, settings))
}
