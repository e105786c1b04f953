//! Archive deletion with a forced fallback for protected files

use crate::{Error, Result};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error, warn};

/// How an archive was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// A plain `remove_file` succeeded
    Standard,
    /// The file was removed by the [`ForceRemover`] after access was denied
    Forced,
}

/// Last-resort deletion of a file that refused a normal delete
pub trait ForceRemover {
    /// Clear whatever blocks deletion of `path` and delete it
    fn force_remove(&self, path: &Path) -> Result<()>;
}

/// Performs no fallback; permission errors are reported as-is
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRemover;

impl ForceRemover for NoopRemover {
    fn force_remove(&self, path: &Path) -> Result<()> {
        Err(Error::PermissionDenied(path.to_path_buf()))
    }
}

/// Uses the platform's attribute and delete primitives
#[derive(Debug, Default, Clone, Copy)]
pub struct PlatformRemover;

#[cfg(windows)]
impl ForceRemover for PlatformRemover {
    fn force_remove(&self, path: &Path) -> Result<()> {
        use std::os::windows::ffi::OsStrExt;
        use winapi::um::fileapi::{DeleteFileW, SetFileAttributesW};
        use winapi::um::winnt::FILE_ATTRIBUTE_NORMAL;

        let wide: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        // SAFETY: `wide` is a NUL-terminated UTF-16 string that outlives both calls.
        if unsafe { SetFileAttributesW(wide.as_ptr(), FILE_ATTRIBUTE_NORMAL) } == 0 {
            let err = io::Error::last_os_error();
            warn!(path = ?path, error = %err, "Failed to clear file attributes");
        }

        // SAFETY: as above.
        if unsafe { DeleteFileW(wide.as_ptr()) } == 0 {
            let err = io::Error::last_os_error();
            error!(path = ?path, error = %err, "Forced delete failed");
            return Err(err.into());
        }

        Ok(())
    }
}

#[cfg(unix)]
impl ForceRemover for PlatformRemover {
    fn force_remove(&self, path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::symlink_metadata(path).map_err(|e| {
            error!(path = ?path, error = %e, "Cannot stat file for forced delete");
            e
        })?;
        if metadata.file_type().is_file() {
            let mode = metadata.permissions().mode();
            if mode & 0o200 == 0 {
                if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o200))
                {
                    warn!(path = ?path, error = %e, "Failed to clear read-only bit");
                }
            }
        }

        // Unlinking needs write and search permission on the directory
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let restore = match fs::metadata(parent) {
            Ok(meta) => {
                let mode = meta.permissions().mode();
                if mode & 0o300 == 0o300 {
                    None
                } else {
                    match fs::set_permissions(parent, fs::Permissions::from_mode(mode | 0o300)) {
                        Ok(()) => Some(mode),
                        Err(e) => {
                            warn!(dir = ?parent, error = %e, "Failed to make directory writable");
                            None
                        }
                    }
                }
            }
            Err(e) => {
                warn!(dir = ?parent, error = %e, "Cannot stat parent directory");
                None
            }
        };

        let result = fs::remove_file(path);

        if let Some(mode) = restore {
            if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(mode)) {
                warn!(dir = ?parent, error = %e, "Failed to restore directory permissions");
            }
        }

        result.map_err(|e| {
            error!(path = ?path, error = %e, "Forced delete failed");
            e.into()
        })
    }
}

#[cfg(not(any(unix, windows)))]
impl ForceRemover for PlatformRemover {
    fn force_remove(&self, path: &Path) -> Result<()> {
        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_readonly(false);
        if let Err(e) = fs::set_permissions(path, permissions) {
            warn!(path = ?path, error = %e, "Failed to clear read-only attribute");
        }
        fs::remove_file(path).map_err(|e| {
            error!(path = ?path, error = %e, "Forced delete failed");
            e.into()
        })
    }
}

/// Delete an extracted archive, falling back to `remover` on permission errors
///
/// Any failure is returned as [`Error::DeletionFailed`].
pub fn remove_archive(path: &Path, remover: &dyn ForceRemover) -> Result<Removal> {
    match fs::remove_file(path) {
        Ok(()) => Ok(Removal::Standard),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            debug!(path = ?path, "Permission denied, forcing delete");
            remover
                .force_remove(path)
                .map(|()| Removal::Forced)
                .map_err(|forced| Error::DeletionFailed {
                    path: path.to_path_buf(),
                    message: format!("{}; forced delete: {}", e, forced),
                })
        }
        Err(e) => Err(Error::DeletionFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}
