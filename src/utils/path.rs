//! Path manipulation and validation utilities

use crate::error::FetchError;
use crate::system::System;
use std::path::{Component, Path, PathBuf};

/// Suffix appended to the destination's name to form its staging sibling
pub const STAGING_SUFFIX: &str = ".sparse-staging";

/// Sparse-checkout pattern used when no sparse path is configured
pub const WHOLE_TREE_PATTERN: &str = "/*";

/// Normalize a path by resolving `.` and `..` components lexically
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

/// Split a repository-relative sparse path into its `/`-delimited segments
///
/// Surrounding whitespace is trimmed, then empty and `.` segments are
/// dropped. A `..` segment is rejected so the joined path can never leave
/// the checkout root.
///
/// # Errors
///
/// Returns a configuration error if any segment is `..`
pub fn sparse_segments(sparse_path: &str) -> Result<Vec<String>, FetchError> {
    let mut segments = Vec::new();
    for segment in sparse_path.trim().split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                return Err(FetchError::configuration(format!(
                    "Sparse path contains unsafe directory traversal: '{sparse_path}'"
                )));
            }
            _ => segments.push(segment.to_owned()),
        }
    }
    Ok(segments)
}

/// The single line written to the sparse-checkout pattern file, built from
/// the same segments the fetched source is resolved with
#[must_use]
pub fn sparse_pattern(segments: &[String]) -> String {
    if segments.is_empty() {
        WHOLE_TREE_PATTERN.to_owned()
    } else {
        segments.join("/")
    }
}

/// Join `segments` below `root`
#[must_use]
pub fn join_segments(root: &Path, segments: &[String]) -> PathBuf {
    segments
        .iter()
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Expand a leading `~` against the home directory
///
/// # Errors
///
/// Returns a configuration error if the path starts with `~` and neither
/// `HOME` nor `USERPROFILE` is set
pub fn expand_home(system: &dyn System, path: &str) -> Result<String, FetchError> {
    if path != "~" && !path.starts_with("~/") {
        return Ok(path.to_owned());
    }

    let home = system
        .env_var("HOME")
        .or_else(|_| system.env_var("USERPROFILE"))
        .map_err(|_| {
            FetchError::configuration("Cannot determine home directory for ~ expansion")
        })?;
    Ok(path.replacen('~', &home, 1))
}

/// Resolve a destination into an absolute, lexically normalized path
///
/// # Errors
///
/// Returns a configuration error if the home directory or the current
/// directory cannot be determined, or if the path resolves to a
/// filesystem root
pub fn resolve_destination(system: &dyn System, raw: &str) -> Result<PathBuf, FetchError> {
    let expanded = PathBuf::from(expand_home(system, raw.trim())?);

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        system
            .current_dir()
            .map_err(|e| {
                FetchError::configuration(format!("Cannot get current directory: {e}"))
            })?
            .join(expanded)
    };

    let resolved = normalize_path(&absolute);
    if resolved.file_name().is_none() {
        return Err(FetchError::configuration(format!(
            "Destination must not be a filesystem root: '{raw}'"
        )));
    }
    Ok(resolved)
}

/// Staging directory for a destination: a sibling sharing its name plus
/// [`STAGING_SUFFIX`]
///
/// # Errors
///
/// Returns a configuration error if the destination has no final component
pub fn staging_path_for(destination: &Path) -> Result<PathBuf, FetchError> {
    let name = destination.file_name().ok_or_else(|| {
        FetchError::configuration(format!(
            "Destination has no directory name: '{}'",
            destination.display()
        ))
    })?;

    let mut staging_name = name.to_os_string();
    staging_name.push(STAGING_SUFFIX);
    Ok(destination.with_file_name(staging_name))
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;
    use crate::system::MockSystem;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("./a/../b/./c")),
            PathBuf::from("b/c")
        );
        assert_eq!(normalize_path(Path::new("../a/b")), PathBuf::from("../a/b"));
        assert_eq!(normalize_path(Path::new("a/b/../..")), PathBuf::from(""));
        assert_eq!(normalize_path(Path::new("/../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn test_sparse_segments() {
        assert_eq!(
            sparse_segments("jovyan/tests").unwrap(),
            vec!["jovyan".to_owned(), "tests".to_owned()]
        );
        assert_eq!(
            sparse_segments("/docs//./api/").unwrap(),
            vec!["docs".to_owned(), "api".to_owned()]
        );
        assert!(sparse_segments("").unwrap().is_empty());
        assert!(sparse_segments("docs/../../etc").is_err());
    }

    #[test]
    fn test_sparse_pattern() {
        let pattern = |raw: &str| sparse_pattern(&sparse_segments(raw).unwrap());
        assert_eq!(pattern("docs/schema.yaml"), "docs/schema.yaml");
        assert_eq!(pattern("./docs/"), "docs");
        assert_eq!(pattern(" docs"), "docs");
        assert_eq!(pattern(""), WHOLE_TREE_PATTERN);
        assert_eq!(pattern("  "), WHOLE_TREE_PATTERN);
    }

    #[test]
    fn test_resolve_destination() {
        let system = MockSystem::new()
            .with_env("HOME", "/home/jovyan")
            .unwrap()
            .with_current_dir("/work")
            .unwrap();

        assert_eq!(
            resolve_destination(&system, "~/git_source").unwrap(),
            PathBuf::from("/home/jovyan/git_source")
        );
        assert_eq!(
            resolve_destination(&system, "./out/../schemas/").unwrap(),
            PathBuf::from("/work/schemas")
        );
        assert!(resolve_destination(&system, "/").is_err());
        assert!(resolve_destination(&system, "/..").is_err());
    }

    #[test]
    fn test_expand_home_without_home() {
        let system = MockSystem::new();
        assert!(expand_home(&system, "~/x").is_err());
        assert_eq!(expand_home(&system, "x/~").unwrap(), "x/~");
    }

    #[test]
    fn test_staging_path_for() {
        assert_eq!(
            staging_path_for(Path::new("/data/schemas")).unwrap(),
            PathBuf::from("/data/schemas.sparse-staging")
        );
        assert!(staging_path_for(Path::new("/")).is_err());
    }
}
