//! Scoped staging directory beside the destination

use crate::error::FetchError;
use crate::system::System;
use crate::utils::fs::remove_path;
use crate::utils::path::staging_path_for;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where superseded destination entries wait until the fetch completes
const DISPLACED_DIR: &str = ".git/sparsefetch-displaced";

/// The throwaway working copy of one fetch
///
/// Created empty by [`StagingArea::prepare`]. A successful fetch removes it
/// with [`StagingArea::close`]; a failed one with [`StagingArea::discard`],
/// which also removes the destination's parent directories that `prepare`
/// had to create. Dropping it unclosed behaves like `discard`.
pub struct StagingArea<'src> {
    system: &'src dyn System,
    path: PathBuf,
    /// Topmost missing ancestor created to hold the staging directory
    created_parent: Option<PathBuf>,
    closed: bool,
}

impl<'src> StagingArea<'src> {
    /// Allocate the staging sibling of `destination`, clearing any leftover
    /// from an earlier run first
    ///
    /// # Errors
    ///
    /// Returns a relocation error if the leftover cannot be removed or the
    /// directory cannot be created
    pub fn prepare(system: &'src dyn System, destination: &Path) -> Result<Self, FetchError> {
        let path = staging_path_for(destination)?;

        if system.exists(&path) {
            warn!(
                "Removing leftover staging directory from a previous run: {}",
                path.display()
            );
            remove_path(system, &path).map_err(|e| {
                FetchError::relocation(format!(
                    "Failed to remove leftover staging directory {}: {e}",
                    path.display()
                ))
            })?;
        }

        let created_parent = path.parent().and_then(|parent| {
            parent
                .ancestors()
                .take_while(|ancestor| !system.exists(ancestor))
                .last()
                .map(Path::to_path_buf)
        });

        system.create_dir_all(&path).map_err(|e| {
            FetchError::relocation(format!(
                "Failed to create staging directory {}: {e}",
                path.display()
            ))
        })?;
        debug!("Staging directory ready: {}", path.display());

        Ok(Self {
            system,
            path,
            created_parent,
            closed: false,
        })
    }

    /// Root of the staging working copy
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Holding area for destination entries being superseded
    #[must_use]
    pub fn displaced_dir(&self) -> PathBuf {
        self.path.join(DISPLACED_DIR)
    }

    /// Remove the staging directory after a successful fetch
    ///
    /// Parent directories created by `prepare` now hold the destination and
    /// are kept.
    ///
    /// # Errors
    ///
    /// Returns a relocation error if the directory cannot be removed
    pub fn close(mut self) -> Result<(), FetchError> {
        self.closed = true;
        self.remove().map_err(|e| self.removal_error(&e))
    }

    /// Remove the staging directory after a failed fetch, along with the
    /// parent directories `prepare` created
    ///
    /// # Errors
    ///
    /// Returns a relocation error if a directory cannot be removed
    pub fn discard(mut self) -> Result<(), FetchError> {
        self.closed = true;
        self.remove().map_err(|e| self.removal_error(&e))?;
        self.remove_created_parents().map_err(|e| self.removal_error(&e))
    }

    fn remove(&self) -> io::Result<()> {
        if !self.system.exists(&self.path) {
            return Ok(());
        }
        remove_path(self.system, &self.path)?;
        debug!("Staging directory removed: {}", self.path.display());
        Ok(())
    }

    /// Remove created parents bottom-up, stopping at the first one that
    /// still holds something
    fn remove_created_parents(&self) -> io::Result<()> {
        let Some(top) = &self.created_parent else {
            return Ok(());
        };

        for dir in self.path.ancestors().skip(1) {
            if !self.system.exists(dir) {
                continue;
            }
            match self.system.remove_dir(dir) {
                Ok(()) => debug!("Removed created directory {}", dir.display()),
                Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty => return Ok(()),
                Err(e) => return Err(e),
            }
            if dir == top.as_path() {
                break;
            }
        }
        Ok(())
    }

    fn removal_error(&self, err: &io::Error) -> FetchError {
        FetchError::relocation(format!(
            "Failed to remove staging directory {}: {err}",
            self.path.display()
        ))
    }
}

impl Drop for StagingArea<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.remove().and_then(|()| self.remove_created_parents()) {
            warn!(
                "Failed to remove staging directory {}: {e}",
                self.path.display()
            );
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;
    use crate::system::MockSystem;

    #[test]
    fn prepare_clears_leftovers() {
        let system = MockSystem::new()
            .with_file("/data/out.sparse-staging/stale.txt", b"old")
            .unwrap();

        let staging = StagingArea::prepare(&system, Path::new("/data/out")).unwrap();

        assert_eq!(staging.path(), Path::new("/data/out.sparse-staging"));
        assert!(system.is_dir(staging.path()));
        assert!(system.read_dir(staging.path()).unwrap().is_empty());
        staging.close().unwrap();
    }

    #[test]
    fn prepare_replaces_leftover_file() {
        let system = MockSystem::new()
            .with_file("/data/out.sparse-staging", b"not a dir")
            .unwrap();

        let staging = StagingArea::prepare(&system, Path::new("/data/out")).unwrap();
        assert!(system.is_dir(staging.path()));
    }

    #[test]
    fn close_removes_directory() {
        let system = MockSystem::new();
        let staging = StagingArea::prepare(&system, Path::new("/data/out")).unwrap();
        system
            .write(&staging.path().join("file.txt"), b"x")
            .unwrap();

        staging.close().unwrap();

        assert!(!system.exists(Path::new("/data/out.sparse-staging")));
    }

    #[test]
    fn drop_removes_directory() {
        let system = MockSystem::new();
        {
            let _staging = StagingArea::prepare(&system, Path::new("/data/out")).unwrap();
            assert!(system.exists(Path::new("/data/out.sparse-staging")));
        }
        assert!(!system.exists(Path::new("/data/out.sparse-staging")));
    }

    #[test]
    fn close_reports_removal_failure() {
        let system = MockSystem::new()
            .with_failing_removal("/data/out.sparse-staging")
            .unwrap();
        let staging = StagingArea::prepare(&system, Path::new("/data/out")).unwrap();

        let err = staging.close().unwrap_err();
        assert!(matches!(err, FetchError::Relocation { .. }));
    }

    #[test]
    fn discard_removes_created_parents() {
        let system = MockSystem::new().with_dir("/data").unwrap();
        let staging = StagingArea::prepare(&system, Path::new("/data/a/b/out")).unwrap();
        assert!(system.is_dir(Path::new("/data/a/b")));

        staging.discard().unwrap();

        assert!(!system.exists(Path::new("/data/a")));
        assert!(system.is_dir(Path::new("/data")));
    }

    #[test]
    fn close_keeps_created_parents() {
        let system = MockSystem::new().with_dir("/data").unwrap();
        let staging = StagingArea::prepare(&system, Path::new("/data/a/b/out")).unwrap();

        staging.close().unwrap();

        assert!(system.is_dir(Path::new("/data/a/b")));
        assert!(!system.exists(Path::new("/data/a/b/out.sparse-staging")));
    }

    #[test]
    fn discard_keeps_parents_that_gained_content() {
        let system = MockSystem::new().with_dir("/data").unwrap();
        let staging = StagingArea::prepare(&system, Path::new("/data/a/b/out")).unwrap();
        system.write(Path::new("/data/a/other.txt"), b"x").unwrap();

        staging.discard().unwrap();

        assert!(!system.exists(Path::new("/data/a/b")));
        assert!(system.exists(Path::new("/data/a/other.txt")));
    }
}
