use std::ffi::{CString, OsString};
use std::io;
use std::os::unix::ffi::OsStringExt;
use std::path::{Path, PathBuf};

use crate::log::dev_warn;

/// A private directory created with `mkdtemp(3)`; it is removed, with everything in it, when
/// the value is dropped.
#[derive(Debug)]
pub(crate) struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub(crate) fn create(root: &Path, prefix: &str) -> io::Result<Self> {
        let template = root.join(format!("{prefix}-XXXXXX")).into_os_string().into_vec();
        let template = CString::new(template)?;

        // SAFETY: mkdtemp is passed a valid null-terminated C string
        let ptr = unsafe { libc::mkdtemp(template.into_raw()) };

        if ptr.is_null() {
            return Err(io::Error::last_os_error());
        }

        // SAFETY: ptr is the same pointer produced by into_raw() above, and it
        // is still pointing to a zero-terminated C string
        let path = OsString::from_vec(unsafe { CString::from_raw(ptr) }.into_bytes()).into();

        Ok(Self { path })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now, reporting any failure instead of only logging it.
    pub(crate) fn remove(self) -> io::Result<()> {
        let result = std::fs::remove_dir_all(&self.path);
        std::mem::forget(self);
        result
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_dir_all(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                dev_warn!("cannot remove {}: {err}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TempDir;
    use std::{os::unix::fs::PermissionsExt, path::Path};

    #[test]
    fn is_private_unique_and_removed_on_drop() {
        let first = TempDir::create(Path::new("/tmp"), "setfsuid-test").unwrap();
        let second = TempDir::create(Path::new("/tmp"), "setfsuid-test").unwrap();
        assert_ne!(first.path(), second.path());

        let path = first.path().to_owned();
        assert!(path.starts_with("/tmp"));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("setfsuid-test-"));
        let meta = std::fs::metadata(&path).unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.permissions().mode() & 0o777, 0o700);

        std::fs::write(path.join("inner"), b"data").unwrap();
        drop(first);
        assert!(!path.exists());

        let path = second.path().to_owned();
        second.remove().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = TempDir::create(Path::new("/nonexistent/setfsuid"), "x").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
