//! # `sparsefetch`
//!
//! Fetch one file or directory from one branch of a remote Git repository
//! into a local directory, using a shallow sparse checkout.
//!
//! ## Usage
//!
//! ```sh
//! sparsefetch https://github.com/org/repo.git ./vendor/schemas schemas/v2 release
//! ```
//!
//! or, with the configuration in the environment:
//!
//! ```sh
//! GIT_REPOSITORY_URL=https://github.com/org/repo.git \
//! GIT_TARGET_PATH=./vendor/schemas \
//! GIT_SPARSE_PATH=schemas/v2 \
//! sparsefetch
//! ```
//!
//! `GIT_USERNAME` and `GIT_TOKEN` are embedded into HTTP(S) URLs when both
//! are set. Exit status is 0 on success and 1 on any failure.

use clap::Parser as _;
use sparsefetch::cli::Args;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let args = Args::parse();

    // Keep stdout clean for the JSON report
    let log_level = if args.verbose {
        "debug"
    } else if args.json {
        "error"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    match sparsefetch::run(&args) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    }
}
