//! The narrow version-control interface the fetch pipeline depends on

use crate::error::FetchError;
use std::path::Path;

/// Name under which the single remote is registered
pub const REMOTE_NAME: &str = "origin";

/// Location of the sparse-checkout pattern file inside a working copy
pub const SPARSE_CHECKOUT_FILE: &str = ".git/info/sparse-checkout";

/// The five discrete steps of a sparse pull
///
/// `GitCommand` drives the real `git` executable; tests substitute a fake
/// that populates an in-memory filesystem instead.
pub trait VersionControl {
    /// Initialize an empty repository in `repo`
    fn init(&self, repo: &Path) -> Result<(), FetchError>;

    /// Register `url` as the remote `name`
    fn add_remote(&self, repo: &Path, name: &str, url: &str) -> Result<(), FetchError>;

    /// Turn on sparse-checkout mode
    fn enable_sparse_checkout(&self, repo: &Path) -> Result<(), FetchError>;

    /// Write the pattern file, one pattern per line
    fn write_sparse_patterns(&self, repo: &Path, patterns: &[String]) -> Result<(), FetchError>;

    /// Fetch and merge `branch` from `remote` into the working copy
    fn pull(&self, repo: &Path, remote: &str, branch: &str) -> Result<(), FetchError>;
}

/// Render patterns as the pattern file's contents
#[must_use]
pub fn render_patterns(patterns: &[String]) -> String {
    let mut contents = String::new();
    for pattern in patterns {
        contents.push_str(pattern);
        contents.push('\n');
    }
    contents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_are_newline_terminated() {
        assert_eq!(render_patterns(&["docs/api".to_owned()]), "docs/api\n");
        assert_eq!(render_patterns(&[]), "");
    }
}
