//! `sparsefetch` - fetch a single path from a Git repository branch
//!
//! The library stages a shallow sparse checkout next to the destination,
//! moves only the requested file or directory contents into place and
//! removes the staging directory on every path. Repeated runs replace the
//! destination's contents, so a failed run can simply be retried.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod git;
pub mod system;
pub mod utils;

use anyhow::{Context as _, Result};
use cli::Args;
use config::{ENV_REPOSITORY_URL, ENV_TARGET_PATH, FetchConfig};
use error::FetchError;
use fetch::SparseFetcher;
use git::{DEFAULT_PROBE_TIMEOUT, GitCommand, HttpProbe, check_git_availability};
use system::{RealSystem, System};
use tracing::{debug, info};

/// Main entry point for the sparsefetch library
///
/// # Errors
///
/// Returns the [`FetchError`] of the first failing step, wrapped in
/// `anyhow` for the binary boundary
pub fn run(args: &Args) -> Result<()> {
    let system = RealSystem::new();
    run_with_system(args, &system)
}

/// Resolve configuration against `system` and perform the fetch
///
/// # Errors
///
/// Returns the [`FetchError`] of the first failing step
pub fn run_with_system(args: &Args, system: &dyn System) -> Result<()> {
    let (request, settings) = FetchConfig::resolve(system, args)
        .and_then(|config| config.into_request(system))
        .inspect_err(|err| {
            if !err.missing_fields().is_empty() {
                info!(
                    "Provide positionals `repository_url destination_path sparse_path [branch]` \
                     or set {ENV_REPOSITORY_URL} and {ENV_TARGET_PATH}"
                );
            }
        })?;
    debug!(
        "Destination {} (timeout {}s)",
        request.target_dir().display(),
        settings.pull_timeout.as_secs()
    );

    check_git_availability(system)?;

    let git = GitCommand::new(system, settings.pull_timeout);
    let probe = if settings.probe {
        Some(
            HttpProbe::new(DEFAULT_PROBE_TIMEOUT)
                .map_err(|e| FetchError::configuration(format!("Failed to build HTTP client: {e}")))?,
        )
    } else {
        None
    };

    let mut fetcher = SparseFetcher::new(system, &git);
    if let Some(probe) = &probe {
        fetcher = fetcher.with_probe(probe);
    }

    let outcome = fetcher.fetch(&request)?;

    if args.json {
        let report =
            serde_json::to_string_pretty(&outcome).context("Failed to serialize fetch outcome")?;
        println!("{report}");
    }

    Ok(())
}
