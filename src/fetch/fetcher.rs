//! The fetch pipeline: probe, staged sparse checkout, relocation, cleanup

use super::relocate::{METADATA_DIR, relocate};
use super::staging::StagingArea;
use crate::config::FetchRequest;
use crate::error::FetchError;
use crate::git::{
    ProbeVerdict, REMOTE_NAME, RepositoryProbe, SPARSE_CHECKOUT_FILE, VersionControl,
    authenticate_url, redact_url,
};
use crate::system::System;
use crate::utils::path::{join_segments, sparse_pattern, sparse_segments};
use core::fmt::Write as _;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Whether the sparse path named a file or a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchedKind {
    File,
    Directory,
}

/// Summary of a successful fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchOutcome {
    /// Repository URL with any credentials masked
    pub repository: String,
    pub branch: String,
    pub sparse_path: String,
    /// Directory now holding the fetched entries
    pub target: PathBuf,
    pub kind: FetchedKind,
    /// Names of the entries placed in `target`
    pub entries: Vec<String>,
    /// Number of previously present entries that were replaced
    pub superseded: usize,
}

/// Fetches one path of one branch into a local directory
///
/// ```no_run
/// use sparsefetch::config::FetchRequest;
/// use sparsefetch::fetch::SparseFetcher;
/// use sparsefetch::git::GitCommand;
/// use sparsefetch::system::RealSystem;
/// use std::time::Duration;
///
/// let system = RealSystem::new();
/// let git = GitCommand::new(&system, Duration::from_secs(300));
/// let request = FetchRequest::new("https://github.com/org/repo.git", "/tmp/docs", "docs");
/// let outcome = SparseFetcher::new(&system, &git).fetch(&request)?;
/// println!("{} entries", outcome.entries.len());
/// # Ok::<(), sparsefetch::error::FetchError>(())
/// ```
pub struct SparseFetcher<'src> {
    system: &'src dyn System,
    vcs: &'src dyn VersionControl,
    probe: Option<&'src dyn RepositoryProbe>,
}

impl<'src> SparseFetcher<'src> {
    #[must_use]
    pub fn new(system: &'src dyn System, vcs: &'src dyn VersionControl) -> Self {
        Self {
            system,
            vcs,
            probe: None,
        }
    }

    /// Run `probe` before any filesystem work (builder pattern)
    #[must_use]
    pub fn with_probe(mut self, probe: &'src dyn RepositoryProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Fetch `request.sparse_path` into `request.target_dir()`
    ///
    /// Whatever was in the target before is replaced. On failure the target
    /// is left as it was, and the staging directory and any parent
    /// directories created for it are gone.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the sparse path escapes the repository
    /// - `RepositoryUnreachable` if the probe reports the repository absent
    /// - `VersionControl` if a git step fails
    /// - `Relocation` if the path is missing from the branch or a move fails
    pub fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        let segments = sparse_segments(&request.sparse_path)?;
        let remote_url = authenticate_url(&request.repository_url, request.credentials.as_ref());

        info!(
            "Fetching '{}' from {} (branch: {})",
            display_sparse_path(&request.sparse_path),
            redact_url(&remote_url),
            request.branch
        );

        self.check_exists(&request.repository_url)?;

        let staging = StagingArea::prepare(self.system, &request.destination_path)?;
        let result = self.checkout_and_relocate(&staging, request, &remote_url, &segments);

        match result {
            Ok(outcome) => {
                staging.close()?;
                info!(
                    "\u{2713} Fetched {} entr{} into {}",
                    outcome.entries.len(),
                    if outcome.entries.len() == 1 { "y" } else { "ies" },
                    outcome.target.display()
                );
                Ok(outcome)
            }
            Err(err) => {
                if let Err(cleanup) = staging.discard() {
                    warn!("Cleanup after failed fetch also failed: {cleanup}");
                }
                Err(err)
            }
        }
    }

    fn check_exists(&self, repository_url: &str) -> Result<(), FetchError> {
        let Some(probe) = self.probe else {
            return Ok(());
        };

        match probe.probe(repository_url) {
            ProbeVerdict::Reachable => {
                debug!("Repository reachable");
                Ok(())
            }
            ProbeVerdict::Absent => Err(FetchError::unreachable(redact_url(repository_url))),
            ProbeVerdict::Inconclusive(reason) => {
                warn!("Could not confirm the repository exists, continuing: {reason}");
                Ok(())
            }
        }
    }

    fn checkout_and_relocate(
        &self,
        staging: &StagingArea<'_>,
        request: &FetchRequest,
        remote_url: &str,
        segments: &[String],
    ) -> Result<FetchOutcome, FetchError> {
        let root = staging.path();

        self.vcs.init(root)?;
        self.vcs.add_remote(root, REMOTE_NAME, remote_url)?;
        self.vcs.enable_sparse_checkout(root)?;
        self.vcs
            .write_sparse_patterns(root, &[sparse_pattern(segments)])?;
        self.vcs.pull(root, REMOTE_NAME, &request.branch)?;

        let source = join_segments(root, segments);
        if !self.system.exists(&source) {
            return Err(FetchError::relocation(format!(
                "Path '{}' not found on branch '{}' of {}\n{}",
                request.sparse_path,
                request.branch,
                redact_url(&request.repository_url),
                checkout_diagnostics(self.system, root)
            )));
        }

        let kind = if self.system.is_dir(&source) {
            FetchedKind::Directory
        } else {
            FetchedKind::File
        };
        debug!("Resolved {} ({kind:?})", source.display());

        let target = request.target_dir();
        let report = relocate(
            self.system,
            &source,
            segments.is_empty(),
            &target,
            &staging.displaced_dir(),
        )?;
        if report.superseded > 0 {
            info!(
                "Replaced {} existing entr{} in {}",
                report.superseded,
                if report.superseded == 1 { "y" } else { "ies" },
                target.display()
            );
        }

        Ok(FetchOutcome {
            repository: redact_url(&request.repository_url),
            branch: request.branch.clone(),
            sparse_path: request.sparse_path.clone(),
            target,
            kind,
            entries: report.entries,
            superseded: report.superseded,
        })
    }
}

fn display_sparse_path(sparse_path: &str) -> &str {
    if sparse_path.trim().is_empty() {
        "/"
    } else {
        sparse_path
    }
}

/// Describe what the checkout actually produced, for the not-found error
fn checkout_diagnostics(system: &dyn System, root: &Path) -> String {
    let mut diagnostics = String::from("  Checked out entries:\n");

    match system.read_dir(root) {
        Ok(entries) => {
            let names: Vec<String> = entries
                .iter()
                .filter_map(|p| p.file_name())
                .filter(|name| *name != METADATA_DIR)
                .map(|name| name.to_string_lossy().into_owned())
                .collect();
            if names.is_empty() {
                diagnostics.push_str("    (empty - nothing was checked out)\n");
            }
            for name in names {
                let _ = writeln!(diagnostics, "    - {name}");
            }
        }
        Err(_) => diagnostics.push_str("    (unable to read directory)\n"),
    }

    if let Ok(patterns) = system.read_to_string(&root.join(SPARSE_CHECKOUT_FILE)) {
        diagnostics.push_str("  Sparse-checkout patterns:\n");
        for line in patterns.lines() {
            let _ = writeln!(diagnostics, "    {line}");
        }
    }

    diagnostics
}
