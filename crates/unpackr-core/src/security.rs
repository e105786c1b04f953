//! Entry path validation for archive contents

use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tracing::error;

/// Resolve an untrusted entry path under `base`, refusing anything that escapes
///
/// `base` must exist. Absolute paths, drive prefixes and `..` components are
/// rejected rather than stripped.
pub fn sanitize_path(base: &Path, untrusted: &Path) -> Result<PathBuf> {
    let canonical_base = base
        .canonicalize()
        .map_err(|e| Error::InvalidPath(format!("Cannot canonicalize base path: {}", e)))?;
    let mut result = canonical_base.clone();

    for component in untrusted.components() {
        match component {
            Component::Normal(name) => result.push(name),
            Component::CurDir => {}
            Component::ParentDir => {
                error!(path = ?untrusted, "Path contains parent directory component");
                return Err(Error::InvalidPath(format!(
                    "Path traversal attempt detected: {:?}",
                    untrusted
                )));
            }
            Component::RootDir => {
                error!(path = ?untrusted, "Path is absolute");
                return Err(Error::InvalidPath(format!(
                    "Absolute path not allowed: {:?}",
                    untrusted
                )));
            }
            Component::Prefix(_) => {
                error!(path = ?untrusted, "Path contains Windows prefix");
                return Err(Error::InvalidPath(format!(
                    "Windows path prefix not allowed: {:?}",
                    untrusted
                )));
            }
        }
    }

    if result == canonical_base {
        return Err(Error::InvalidPath(format!(
            "Entry path is empty: {:?}",
            untrusted
        )));
    }

    Ok(result)
}
