use crate::constants::MAX_PATH;
use crate::core_fs::error::PathError;
use log::debug;
use nix::unistd::{access, AccessFlags};
use std::ffi::OsString;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

/// Joins a client supplied path onto the session directory.
///
/// Absolute arguments are returned untouched, relative ones are appended with
/// exactly one separator. Nothing is normalised here.
pub fn join_path(current_dir: &Path, arg: &str) -> PathBuf {
    if arg.starts_with('/') {
        return PathBuf::from(arg);
    }

    let mut bytes = current_dir.as_os_str().as_bytes().to_vec();
    while bytes.last() == Some(&b'/') {
        bytes.pop();
    }
    bytes.push(b'/');
    bytes.extend_from_slice(arg.as_bytes());
    PathBuf::from(OsString::from_vec(bytes))
}

/// Resolves the argument of a directory change into a canonical directory.
///
/// The result is not confined to any root: `..` and symlinks may lead
/// anywhere the server process can enter.
pub async fn resolve_directory(current_dir: &Path, arg: &str) -> Result<PathBuf, PathError> {
    let joined = join_path(current_dir, arg);
    let display = joined.display().to_string();

    if joined.as_os_str().len() >= MAX_PATH {
        return Err(PathError::TooLong {
            path: display,
            limit: MAX_PATH,
        });
    }

    let resolved = tokio::fs::canonicalize(&joined)
        .await
        .map_err(|source| PathError::Unresolvable {
            path: display.clone(),
            source,
        })?;

    let metadata = tokio::fs::metadata(&resolved)
        .await
        .map_err(|source| PathError::Unresolvable {
            path: display.clone(),
            source,
        })?;
    if !metadata.is_dir() {
        return Err(PathError::NotADirectory(resolved.display().to_string()));
    }

    // Entering a directory needs search permission.
    if access(&resolved, AccessFlags::X_OK).is_err() {
        return Err(PathError::NotAccessible(resolved.display().to_string()));
    }

    debug!("Resolved {:?} against {:?} to {:?}", arg, current_dir, resolved);
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_join_relative() {
        assert_eq!(
            join_path(Path::new("/srv/ftp"), "pub"),
            PathBuf::from("/srv/ftp/pub")
        );
        assert_eq!(join_path(Path::new("/"), "etc"), PathBuf::from("/etc"));
        assert_eq!(
            join_path(Path::new("/srv/ftp/"), "a/b"),
            PathBuf::from("/srv/ftp/a/b")
        );
    }

    #[test]
    fn test_join_absolute() {
        assert_eq!(join_path(Path::new("/srv/ftp"), "/tmp"), PathBuf::from("/tmp"));
    }

    #[tokio::test]
    async fn test_resolve_relative_and_parent() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::create_dir_all(root.join("a/b")).unwrap();

        let resolved = resolve_directory(&root, "a/b").await.unwrap();
        assert_eq!(resolved, root.join("a/b"));

        let parent = resolve_directory(&resolved, "..").await.unwrap();
        assert_eq!(parent, root.join("a"));

        let same = resolve_directory(&parent, "./b/.").await.unwrap();
        assert_eq!(same, root.join("a/b"));
    }

    #[tokio::test]
    async fn test_resolve_absolute() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let arg = root.to_str().unwrap().to_string();

        let resolved = resolve_directory(Path::new("/"), &arg).await.unwrap();
        assert_eq!(resolved, root);
    }

    #[tokio::test]
    async fn test_resolve_follows_symlinks() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::create_dir(root.join("real")).unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("link")).unwrap();

        let resolved = resolve_directory(&root, "link").await.unwrap();
        assert_eq!(resolved, root.join("real"));
    }

    #[tokio::test]
    async fn test_resolve_missing_directory() {
        let dir = tempdir().unwrap();
        let err = resolve_directory(dir.path(), "nonexistent").await.unwrap_err();
        assert!(matches!(err, PathError::Unresolvable { .. }));
        assert_eq!(err.to_ftp_response(), "550 Failed to change directory\r\n");
    }

    #[tokio::test]
    async fn test_resolve_regular_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), b"x").unwrap();
        let err = resolve_directory(dir.path(), "file.txt").await.unwrap_err();
        assert!(matches!(err, PathError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_resolve_too_long() {
        let long = "x".repeat(MAX_PATH);
        let err = resolve_directory(Path::new("/tmp"), &long).await.unwrap_err();
        assert!(matches!(err, PathError::TooLong { .. }));
    }
}
