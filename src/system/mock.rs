//! Mock system implementation for testing

use super::{System, WalkEntry};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::env::VarError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory implementation of System trait for testing
///
/// `MockSystem` provides an in-memory filesystem and environment,
/// perfect for fast, isolated unit tests without side effects.
///
/// # Example
/// ```
/// use sparsefetch::system::{mock::MockSystem, System};
/// use std::path::Path;
///
/// let system = MockSystem::new()
///     .with_env("GIT_BRANCH", "develop").unwrap()
///     .with_file("/work/file.txt", b"Hello, world!").unwrap()
///     .with_dir("/work/subdir").unwrap();
///
/// assert_eq!(system.env_var("GIT_BRANCH").unwrap(), "develop");
/// assert!(system.exists(Path::new("/work/file.txt")));
/// ```
#[derive(Clone)]
pub struct MockSystem {
    state: Arc<RwLock<MockSystemState>>,
}

struct MockSystemState {
    env_vars: HashMap<String, String>,
    current_dir: PathBuf,
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    /// Paths whose rename (as source or target) fails with `PermissionDenied`
    failing_renames: HashSet<PathBuf>,
    /// Paths whose removal fails with `PermissionDenied`
    failing_removals: HashSet<PathBuf>,
}

impl MockSystem {
    /// Create a new `MockSystem` with default state
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockSystemState {
                env_vars: HashMap::new(),
                current_dir: PathBuf::from("/"),
                files: BTreeMap::new(),
                dirs: BTreeSet::from([PathBuf::from("/")]),
                failing_renames: HashSet::new(),
                failing_removals: HashSet::new(),
            })),
        }
    }

    /// Set an environment variable (builder pattern)
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned
    #[inline]
    pub fn with_env(self, key: &str, value: &str) -> io::Result<Self> {
        let mut state = self.write_state()?;
        state.env_vars.insert(key.to_owned(), value.to_owned());
        drop(state);
        Ok(self)
    }

    /// Set the current working directory (builder pattern)
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned
    #[inline]
    pub fn with_current_dir<P: AsRef<Path>>(self, dir: P) -> io::Result<Self> {
        let mut state = self.write_state()?;
        state.current_dir = dir.as_ref().to_path_buf();
        drop(state);
        Ok(self)
    }

    /// Add a file with contents (builder pattern)
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned
    #[inline]
    pub fn with_file<P: AsRef<Path>>(self, path: P, contents: &[u8]) -> io::Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let mut state = self.write_state()?;

        // Ensure parent directories exist
        if let Some(parent) = path_buf.parent() {
            Self::ensure_parent_dirs(&mut state.dirs, parent);
        }

        state.files.insert(path_buf, contents.to_vec());
        drop(state);
        Ok(self)
    }

    /// Add a directory (builder pattern)
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned
    #[inline]
    pub fn with_dir<P: AsRef<Path>>(self, path: P) -> io::Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let mut state = self.write_state()?;
        Self::ensure_parent_dirs(&mut state.dirs, &path_buf);
        drop(state);
        Ok(self)
    }

    /// Make every rename touching `path` fail (builder pattern)
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned
    #[inline]
    pub fn with_failing_rename<P: AsRef<Path>>(self, path: P) -> io::Result<Self> {
        let mut state = self.write_state()?;
        state.failing_renames.insert(path.as_ref().to_path_buf());
        drop(state);
        Ok(self)
    }

    /// Make removal of `path` fail (builder pattern)
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned
    #[inline]
    pub fn with_failing_removal<P: AsRef<Path>>(self, path: P) -> io::Result<Self> {
        let mut state = self.write_state()?;
        state.failing_removals.insert(path.as_ref().to_path_buf());
        drop(state);
        Ok(self)
    }

    /// Every file path currently stored, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the state lock is poisoned
    #[inline]
    pub fn file_paths(&self) -> io::Result<Vec<PathBuf>> {
        let state = self.read_state()?;
        Ok(state.files.keys().cloned().collect())
    }

    fn read_state(&self) -> io::Result<RwLockReadGuard<'_, MockSystemState>> {
        self.state
            .read()
            .map_err(|e| io::Error::other(e.to_string()))
    }

    fn write_state(&self) -> io::Result<RwLockWriteGuard<'_, MockSystemState>> {
        self.state
            .write()
            .map_err(|e| io::Error::other(e.to_string()))
    }

    fn ensure_parent_dirs(dirs: &mut BTreeSet<PathBuf>, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor == Path::new("") {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }

    fn not_found(what: &str, path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{what} not found: {}", path.display()),
        )
    }

    fn denied(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("Permission denied: {}", path.display()),
        )
    }
}

impl Default for MockSystem {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl System for MockSystem {
    #[inline]
    fn env_var(&self, key: &str) -> Result<String, VarError> {
        let state = self.state.read().map_err(|_| VarError::NotPresent)?;
        state.env_vars.get(key).cloned().ok_or(VarError::NotPresent)
    }

    #[inline]
    fn current_dir(&self) -> io::Result<PathBuf> {
        let state = self.read_state()?;
        Ok(state.current_dir.clone())
    }

    #[inline]
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let state = self.read_state()?;
        let bytes = state
            .files
            .get(path)
            .ok_or_else(|| Self::not_found("File", path))?
            .clone();
        drop(state);
        String::from_utf8(bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {e}")))
    }

    #[inline]
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut state = self.write_state()?;

        if let Some(parent) = path.parent()
            && !state.dirs.contains(parent)
        {
            return Err(Self::not_found("Parent directory", parent));
        }
        if state.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("Is a directory: {}", path.display()),
            ));
        }

        state.files.insert(path.to_path_buf(), contents.to_vec());
        drop(state);
        Ok(())
    }

    #[inline]
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.write_state()?;
        if let Some(file) = path.ancestors().find(|p| state.files.contains_key(*p)) {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("Not a directory: {}", file.display()),
            ));
        }
        Self::ensure_parent_dirs(&mut state.dirs, path);
        drop(state);
        Ok(())
    }

    #[inline]
    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        let mut state = self.write_state()?;
        if !state.dirs.contains(path) {
            return Err(Self::not_found("Directory", path));
        }
        let has_children = state.files.keys().any(|p| p.parent() == Some(path))
            || state.dirs.iter().any(|p| p.parent() == Some(path));
        if has_children {
            return Err(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                format!("Directory not empty: {}", path.display()),
            ));
        }
        state.dirs.remove(path);
        drop(state);
        Ok(())
    }

    #[inline]
    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.write_state()?;
        if state.failing_removals.contains(path) {
            return Err(Self::denied(path));
        }
        if !state.dirs.contains(path) {
            return Err(Self::not_found("Directory", path));
        }

        // Remove the directory and everything below it
        state.files.retain(|p, _| !p.starts_with(path));
        state.dirs.retain(|p| !p.starts_with(path));
        drop(state);
        Ok(())
    }

    #[inline]
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut state = self.write_state()?;
        if state.failing_removals.contains(path) {
            return Err(Self::denied(path));
        }
        if state.files.remove(path).is_none() {
            return Err(Self::not_found("File", path));
        }
        drop(state);
        Ok(())
    }

    #[inline]
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.write_state()?;

        if state.failing_renames.contains(from) || state.failing_renames.contains(to) {
            return Err(Self::denied(to));
        }
        if state.files.contains_key(to) || state.dirs.contains(to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Destination exists: {}", to.display()),
            ));
        }
        if let Some(parent) = to.parent()
            && !state.dirs.contains(parent)
        {
            return Err(Self::not_found("Parent directory", parent));
        }

        if let Some(contents) = state.files.remove(from) {
            state.files.insert(to.to_path_buf(), contents);
            drop(state);
            return Ok(());
        }

        if !state.dirs.contains(from) {
            return Err(Self::not_found("Path", from));
        }

        let moved_dirs: Vec<PathBuf> = state
            .dirs
            .iter()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        for dir in moved_dirs {
            state.dirs.remove(&dir);
            if let Ok(relative) = dir.strip_prefix(from) {
                state.dirs.insert(to.join(relative));
            }
        }

        let moved_files: Vec<PathBuf> = state
            .files
            .keys()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        for file in moved_files {
            if let Some(contents) = state.files.remove(&file)
                && let Ok(relative) = file.strip_prefix(from)
            {
                state.files.insert(to.join(relative), contents);
            }
        }

        drop(state);
        Ok(())
    }

    #[inline]
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        let contents = {
            let state = self.read_state()?;
            state
                .files
                .get(from)
                .ok_or_else(|| Self::not_found("Source file", from))?
                .clone()
        };

        let size = u64::try_from(contents.len()).unwrap_or(u64::MAX);
        self.write(to, &contents)?;
        Ok(size)
    }

    #[inline]
    fn exists(&self, path: &Path) -> bool {
        self.read_state()
            .is_ok_and(|state| state.files.contains_key(path) || state.dirs.contains(path))
    }

    #[inline]
    fn is_file(&self, path: &Path) -> bool {
        self.read_state()
            .is_ok_and(|state| state.files.contains_key(path))
    }

    #[inline]
    fn is_dir(&self, path: &Path) -> bool {
        self.read_state().is_ok_and(|state| state.dirs.contains(path))
    }

    #[inline]
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.read_state()?;

        if !state.dirs.contains(path) {
            return Err(Self::not_found("Directory", path));
        }

        let mut entries: Vec<PathBuf> = state
            .files
            .keys()
            .filter(|p| p.parent() == Some(path))
            .chain(
                state
                    .dirs
                    .iter()
                    .filter(|p| p.parent() == Some(path) && p.as_path() != path),
            )
            .cloned()
            .collect();
        drop(state);

        entries.sort();
        Ok(entries)
    }

    #[inline]
    fn walk_dir(&self, path: &Path) -> io::Result<Vec<WalkEntry>> {
        let state = self.read_state()?;

        if !state.dirs.contains(path) {
            return Err(Self::not_found("Directory", path));
        }

        let mut entries: Vec<WalkEntry> = state
            .dirs
            .iter()
            .filter(|p| p.starts_with(path) && p.as_path() != path)
            .map(|p| WalkEntry {
                path: p.clone(),
                is_file: false,
                is_dir: true,
            })
            .chain(
                state
                    .files
                    .keys()
                    .filter(|p| p.starts_with(path))
                    .map(|p| WalkEntry {
                        path: p.clone(),
                        is_file: true,
                        is_dir: false,
                    }),
            )
            .collect();
        drop(state);

        // Sorting by path puts every parent before its children
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
