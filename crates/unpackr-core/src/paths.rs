//! Path helpers: archive suffix matching, base names and unique targets

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffixes that mark a file as an archive candidate
pub const DEFAULT_ARCHIVE_SUFFIXES: &[&str] =
    &[".7z", ".zip", ".tar.gz", ".tgz", ".bz2", ".tar", ".tbz", ".gz"];

/// Suffixes removed when naming an extraction target, longest first
const STRIPPABLE_SUFFIXES: &[&str] = &[
    ".tar.bz2", ".tar.gz", ".tbz2", ".tgz", ".tbz", ".tar", ".zip", ".bz2", ".7z", ".gz",
];

/// Check whether the file name of `path` ends with one of `suffixes`
///
/// Matching is ASCII case-insensitive, so `DATA.ZIP` matches `.zip`.
pub fn has_archive_suffix<S: AsRef<str>>(path: &Path, suffixes: &[S]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    suffixes
        .iter()
        .any(|suffix| ends_with_ignore_case(name, suffix.as_ref()))
}

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name
            .get(name.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

fn strip_known_suffix(name: &str) -> Option<&str> {
    STRIPPABLE_SUFFIXES
        .iter()
        .find(|suffix| ends_with_ignore_case(name, suffix))
        .map(|suffix| &name[..name.len() - suffix.len()])
}

/// Name of the folder an archive is extracted into
///
/// The longest known archive suffix is removed (`logs.tar.gz` becomes `logs`).
/// Names without a known suffix lose their last extension only.
pub fn archive_base_name(path: &Path) -> OsString {
    let Some(name) = path.file_name() else {
        return OsString::new();
    };

    if let Some(stem) = name.to_str().and_then(strip_known_suffix) {
        if !stem.is_empty() {
            return OsString::from(stem);
        }
    }

    match path.file_stem() {
        Some(stem) if !stem.is_empty() => stem.to_os_string(),
        _ => name.to_os_string(),
    }
}

/// Return `base` if nothing exists there, otherwise the first free `base_<n>`
///
/// The check is not atomic: another process may create the returned path
/// before the caller does. The walk is single-threaded, so only external
/// writers can race with it.
pub fn ensure_unique(base: &Path) -> PathBuf {
    if !path_exists(base) {
        return base.to_path_buf();
    }

    let mut counter: u64 = 1;
    loop {
        let mut candidate = base.as_os_str().to_os_string();
        candidate.push(format!("_{}", counter));
        let candidate = PathBuf::from(candidate);
        if !path_exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
