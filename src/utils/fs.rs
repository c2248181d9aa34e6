//! File system utilities

use crate::system::System;
use std::io;
use std::path::Path;

/// Remove a file or a directory tree
pub fn remove_path(system: &dyn System, path: &Path) -> io::Result<()> {
    if system.is_dir(path) {
        system.remove_dir_all(path)
    } else {
        system.remove_file(path)
    }
}

/// Move a file or directory, copying across filesystems when a plain
/// rename is refused
pub fn move_path(system: &dyn System, from: &Path, to: &Path) -> io::Result<()> {
    match system.rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if is_cross_device(&err) => {
            copy_tree(system, from, to)?;
            remove_path(system, from)
        }
        Err(err) => Err(err),
    }
}

/// Copy a file, or a directory and everything below it, to `to`
pub fn copy_tree(system: &dyn System, from: &Path, to: &Path) -> io::Result<()> {
    if !system.is_dir(from) {
        system.copy(from, to)?;
        return Ok(());
    }

    system.create_dir_all(to)?;
    for entry in system.walk_dir(from)? {
        let relative = entry
            .path
            .strip_prefix(from)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let target = to.join(relative);

        if entry.is_dir {
            system.create_dir_all(&target)?;
        } else {
            system.copy(&entry.path, &target)?;
        }
    }
    Ok(())
}

/// Whether an I/O error reports a rename across filesystems
#[must_use]
pub fn is_cross_device(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::CrossesDevices {
        return true;
    }
    let Some(code) = err.raw_os_error() else {
        return false;
    };

    #[cfg(unix)]
    {
        const EXDEV: i32 = 18;
        code == EXDEV
    }

    #[cfg(windows)]
    {
        const ERROR_NOT_SAME_DEVICE: i32 = 17;
        code == ERROR_NOT_SAME_DEVICE
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = code;
        false
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;
    use crate::system::{MockSystem, RealSystem};
    use tempfile::TempDir;

    #[test]
    fn test_copy_tree_copies_nested_directories() {
        let system = MockSystem::new()
            .with_file("/src/a.txt", b"a")
            .unwrap()
            .with_file("/src/nested/b.txt", b"b")
            .unwrap()
            .with_dir("/src/empty")
            .unwrap();

        copy_tree(&system, Path::new("/src"), Path::new("/dst")).unwrap();

        assert_eq!(system.read_to_string(Path::new("/dst/a.txt")).unwrap(), "a");
        assert_eq!(
            system.read_to_string(Path::new("/dst/nested/b.txt")).unwrap(),
            "b"
        );
        assert!(system.is_dir(Path::new("/dst/empty")));
    }

    #[test]
    fn test_move_path_on_real_filesystem() {
        let system = RealSystem::new();
        let temp_dir = TempDir::new().unwrap();
        let from = temp_dir.path().join("from");
        let to = temp_dir.path().join("to");
        system.create_dir_all(&from.join("inner")).unwrap();
        system.write(&from.join("inner/file.txt"), b"content").unwrap();

        move_path(&system, &from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(
            system.read_to_string(&to.join("inner/file.txt")).unwrap(),
            "content"
        );
    }

    #[test]
    fn test_is_cross_device() {
        assert!(is_cross_device(&io::Error::from(io::ErrorKind::CrossesDevices)));
        #[cfg(unix)]
        assert!(is_cross_device(&io::Error::from_raw_os_error(18)));
        assert!(!is_cross_device(&io::Error::from(io::ErrorKind::NotFound)));
    }

    #[test]
    fn test_remove_path_handles_files_and_dirs() {
        let system = MockSystem::new()
            .with_file("/x/file.txt", b"")
            .unwrap()
            .with_file("/y/nested/file.txt", b"")
            .unwrap();

        remove_path(&system, Path::new("/x/file.txt")).unwrap();
        remove_path(&system, Path::new("/y")).unwrap();

        assert!(!system.exists(Path::new("/x/file.txt")));
        assert!(!system.exists(Path::new("/y")));
    }
}
