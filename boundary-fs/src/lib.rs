//! Capability-based filesystem helpers for boundary database paths.
//!
//! Every lookup goes through a `cap-std` directory handle opened for the
//! path's anchor (the filesystem root, a Windows prefix, or the current
//! directory) so that callers never touch ambient `std::fs` directly.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::Metadata, fs_utf8};
use std::io;
use std::path::Component;

/// Return whether `path` names an existing regular file.
///
/// A missing file, or a missing parent directory, yields `Ok(false)`.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    Ok(metadata(path)?.is_some_and(|meta| meta.is_file()))
}

/// Return whether anything exists at `path`.
pub fn path_exists(path: &Utf8Path) -> io::Result<bool> {
    Ok(metadata(path)?.is_some())
}

fn metadata(path: &Utf8Path) -> io::Result<Option<Metadata>> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("path {path} has no file name")))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = match fs_utf8::Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    match dir.metadata(file_name) {
        Ok(meta) => Ok(Some(meta)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Create every missing directory above `path`.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() {
        return Ok(());
    }
    let (anchor, relative) = anchor_and_relative(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    anchor.create_dir_all(&relative)
}

/// Split `dir` into a handle on its anchor directory plus the remaining
/// relative path.
pub fn anchor_and_relative(dir: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_dir = dir.as_std_path();
    let (anchor, relative) = match std_dir.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix_text = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let anchor =
                Utf8PathBuf::from(prefix_text).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_dir
                .strip_prefix(anchor.as_std_path())
                .or_else(|_| std_dir.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other(format!("cannot strip prefix from {dir}")))?
                .to_path_buf();
            (anchor, relative)
        }
        Some(Component::RootDir) => {
            let anchor = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_dir
                .strip_prefix(anchor.as_std_path())
                .map_err(|_| io::Error::other(format!("cannot strip root from {dir}")))?
                .to_path_buf();
            (anchor, relative)
        }
        _ => (Utf8PathBuf::from("."), std_dir.to_path_buf()),
    };

    let handle = fs_utf8::Dir::open_ambient_dir(&anchor, ambient_authority())?;
    let relative =
        Utf8PathBuf::from_path_buf(relative).map_err(|_| io::Error::other("non-UTF-8 path"))?;
    Ok((handle, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir")
    }

    #[rstest]
    fn creates_nested_parents_for_absolute_paths() {
        let temp = TempDir::new().expect("temp dir");
        let target = utf8_root(&temp).join("a/b/boundaries.db");
        ensure_parent_dir(&target).expect("create parents");
        assert!(target.parent().expect("parent").is_dir());
    }

    #[rstest]
    fn file_checks_distinguish_files_directories_and_missing_paths() {
        let temp = TempDir::new().expect("temp dir");
        let root = utf8_root(&temp);
        let file = root.join("boundaries.db");
        std::fs::write(&file, b"").expect("write file");

        assert!(file_is_file(&file).expect("check file"));
        assert!(!file_is_file(&root.join("missing.db")).expect("check missing"));
        assert!(!file_is_file(&root.join("nowhere/missing.db")).expect("check missing dir"));

        let nested = root.join("nested");
        std::fs::create_dir(&nested).expect("create dir");
        assert!(!file_is_file(&nested).expect("check dir"));
        assert!(path_exists(&nested).expect("dir exists"));
        assert!(!path_exists(&root.join("missing.db")).expect("missing path"));
    }
}
