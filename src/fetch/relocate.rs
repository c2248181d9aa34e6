//! Moving fetched entries from staging into the target directory
//!
//! Relocation either completes or leaves the target as it was. Entries
//! already in the target are moved aside into a holding directory inside
//! staging, then the fetched entries are moved in. Every move is recorded so
//! a failure part way through can be undone in reverse order.

use crate::error::FetchError;
use crate::system::System;
use crate::utils::fs::{move_path, remove_path};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the version-control metadata directory skipped when relocating a
/// whole checkout
pub const METADATA_DIR: &str = ".git";

/// What a completed relocation changed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RelocationReport {
    /// Names of the entries now in the target, sorted
    pub entries: Vec<String>,
    /// Number of entries of the target that were replaced
    pub superseded: usize,
}

/// One reversible filesystem change
enum Step {
    Moved { from: PathBuf, to: PathBuf },
    Created(PathBuf),
}

/// Record of applied steps, replayed backwards on failure
struct Journal<'src> {
    system: &'src dyn System,
    steps: Vec<Step>,
}

impl<'src> Journal<'src> {
    const fn new(system: &'src dyn System) -> Self {
        Self {
            system,
            steps: Vec::new(),
        }
    }

    fn apply(&mut self, from: &Path, to: &Path) -> Result<(), FetchError> {
        move_path(self.system, from, to).map_err(|e| {
            FetchError::relocation(format!(
                "Failed to move {} to {}: {e}",
                from.display(),
                to.display()
            ))
        })?;
        debug!("Moved {} -> {}", from.display(), to.display());
        self.steps.push(Step::Moved {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        Ok(())
    }

    /// Create `dir` and its missing ancestors, remembering the topmost one
    /// created so it can be removed again
    fn create_dir_all(&mut self, dir: &Path) -> Result<(), FetchError> {
        let created_root = dir
            .ancestors()
            .take_while(|ancestor| !self.system.exists(ancestor))
            .last()
            .map(Path::to_path_buf);

        self.system.create_dir_all(dir).map_err(|e| {
            FetchError::relocation(format!(
                "Failed to create target directory {}: {e}",
                dir.display()
            ))
        })?;

        if let Some(root) = created_root {
            self.steps.push(Step::Created(root));
        }
        Ok(())
    }

    fn rollback(self) {
        let count = self.steps.len();
        for step in self.steps.into_iter().rev() {
            match step {
                Step::Moved { from, to } => {
                    if let Err(e) = move_path(self.system, &to, &from) {
                        warn!(
                            "Failed to restore {} from {}: {e}",
                            from.display(),
                            to.display()
                        );
                    }
                }
                Step::Created(root) => {
                    if let Err(e) = remove_path(self.system, &root) {
                        warn!("Failed to remove {}: {e}", root.display());
                    }
                }
            }
        }
        debug!("Rolled back {count} step(s)");
    }
}

/// Replace the contents of `target` with the fetched `source`
///
/// A directory source contributes its immediate children; a file source
/// contributes itself. With `skip_metadata` the `.git` directory of a whole
/// checkout is left behind. Entries the target held before are parked in
/// `displaced_dir`, which the caller discards with staging.
///
/// # Errors
///
/// Returns a relocation error if any move fails. The target is restored
/// before the error is returned.
pub fn relocate(
    system: &dyn System,
    source: &Path,
    skip_metadata: bool,
    target: &Path,
    displaced_dir: &Path,
) -> Result<RelocationReport, FetchError> {
    let incoming = incoming_entries(system, source, skip_metadata)?;

    let mut journal = Journal::new(system);
    match supersede(&mut journal, &incoming, target, displaced_dir) {
        Ok(superseded) => {
            let mut entries: Vec<String> = incoming.iter().filter_map(|p| entry_name(p)).collect();
            entries.sort();
            Ok(RelocationReport {
                entries,
                superseded,
            })
        }
        Err(err) => {
            journal.rollback();
            Err(err)
        }
    }
}

fn supersede(
    journal: &mut Journal<'_>,
    incoming: &[PathBuf],
    target: &Path,
    displaced_dir: &Path,
) -> Result<usize, FetchError> {
    let system = journal.system;
    system.create_dir_all(displaced_dir).map_err(|e| {
        FetchError::relocation(format!(
            "Failed to create {}: {e}",
            displaced_dir.display()
        ))
    })?;

    let mut superseded = 0;
    if system.exists(target) && !system.is_dir(target) {
        // A file sits where the target directory belongs
        let parked = displaced_dir.join(entry_name(target).unwrap_or_default());
        journal.apply(target, &parked)?;
        superseded += 1;
    }

    if system.is_dir(target) {
        for existing in system.read_dir(target).map_err(|e| read_error(target, &e))? {
            let Some(name) = entry_name(&existing) else {
                continue;
            };
            journal.apply(&existing, &displaced_dir.join(name))?;
            superseded += 1;
        }
    } else {
        journal.create_dir_all(target)?;
    }

    for entry in incoming {
        let Some(name) = entry_name(entry) else {
            continue;
        };
        journal.apply(entry, &target.join(name))?;
    }

    Ok(superseded)
}

fn incoming_entries(
    system: &dyn System,
    source: &Path,
    skip_metadata: bool,
) -> Result<Vec<PathBuf>, FetchError> {
    if !system.is_dir(source) {
        return Ok(vec![source.to_path_buf()]);
    }

    let entries = system.read_dir(source).map_err(|e| read_error(source, &e))?;
    Ok(entries
        .into_iter()
        .filter(|entry| !(skip_metadata && entry.file_name().is_some_and(|n| n == METADATA_DIR)))
        .collect())
}

fn entry_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

fn read_error(path: &Path, err: &io::Error) -> FetchError {
    FetchError::relocation(format!("Failed to read {}: {err}", path.display()))
}
