//! Recursive unpacking of a directory tree
//!
//! The walker visits every file under the root, extracts the ones carrying an
//! archive suffix next to themselves, optionally deletes the source archive and
//! then descends into the folder that was just created, so nested archives are
//! unpacked before the next sibling file is looked at.
//!
//! Each directory is listed once, up front. Folders created while that
//! directory is being processed are reached only through the extraction that
//! created them, never a second time through the listing.

use crate::archive::Dispatcher;
use crate::config::Config;
use crate::observer::{TracingObserver, WalkEvent, WalkObserver};
use crate::paths::{has_archive_suffix, DEFAULT_ARCHIVE_SUFFIXES};
use crate::remove::{remove_archive, ForceRemover, PlatformRemover, Removal};
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Walk behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Delete each archive after a successful extraction
    pub delete_after_extract: bool,
    /// Descend into extracted folders
    pub recursive: bool,
    /// Maximum archive nesting depth; 0 never descends into extracted content
    pub max_depth: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            delete_after_extract: false,
            recursive: true,
            max_depth: 32,
        }
    }
}

impl From<&crate::config::WalkConfig> for WalkOptions {
    fn from(config: &crate::config::WalkConfig) -> Self {
        Self {
            delete_after_extract: config.delete_after_extract,
            recursive: config.recursive,
            max_depth: config.max_depth,
        }
    }
}

/// Summary of one walk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkReport {
    /// Files with an archive suffix that were visited
    pub archives_found: usize,
    /// Folders created by successful extractions
    pub extracted: Vec<PathBuf>,
    /// Archives no probe could decode
    pub failed: Vec<PathBuf>,
    /// Archives deleted after extraction
    pub deleted: usize,
    /// Archives that could not be deleted
    pub deletion_failures: Vec<PathBuf>,
    /// Paths that could not be read at all
    pub errors: Vec<PathBuf>,
}

impl WalkReport {
    /// Number of paths that failed in any way
    pub fn failure_count(&self) -> usize {
        self.failed.len() + self.deletion_failures.len() + self.errors.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Walks a tree and unpacks every archive in it
pub struct Walker {
    options: WalkOptions,
    suffixes: Vec<String>,
    dispatcher: Dispatcher,
    remover: Box<dyn ForceRemover>,
    observer: Arc<dyn WalkObserver>,
}

impl Walker {
    /// Create a walker with the default suffixes, probe order and remover
    pub fn new(options: WalkOptions) -> Self {
        Self {
            options,
            suffixes: DEFAULT_ARCHIVE_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            dispatcher: Dispatcher::default(),
            remover: Box::new(PlatformRemover),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Create a walker from a loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(WalkOptions::from(&config.walk))
            .with_suffixes(config.formats.extensions.clone())
            .with_dispatcher(Dispatcher::with_order(&config.formats.probe_order))
    }

    pub fn with_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.suffixes = suffixes;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_remover(mut self, remover: Box<dyn ForceRemover>) -> Self {
        self.remover = remover;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn WalkObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Unpack every archive reachable from `root`
    ///
    /// Only a root that is not a directory is an error. Failures on single
    /// files are reported to the observer and collected in the report.
    pub fn unpack_tree(&self, root: &Path) -> Result<WalkReport> {
        if !root.is_dir() {
            return Err(Error::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let mut report = WalkReport::default();
        self.walk_dir(root, 0, &mut report);
        Ok(report)
    }

    fn walk_dir(&self, dir: &Path, depth: usize, report: &mut WalkReport) {
        self.observer.on_event(&WalkEvent::DirectoryEntered {
            path: dir.to_path_buf(),
            depth,
        });

        let (files, subdirs) = self.list_dir(dir, report);

        for file in &files {
            self.visit_file(file, depth, report);
        }
        for subdir in &subdirs {
            self.walk_dir(subdir, depth, report);
        }
    }

    /// Snapshot the files and subdirectories of `dir`, skipping symlinks
    fn list_dir(&self, dir: &Path, report: &mut WalkReport) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let mut files = Vec::new();
        let mut subdirs = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            match entry {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_file() {
                        files.push(entry.into_path());
                    } else if file_type.is_dir() {
                        subdirs.push(entry.into_path());
                    }
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| dir.to_path_buf());
                    self.observer.on_event(&WalkEvent::UnexpectedError {
                        path: path.clone(),
                        message: err.to_string(),
                    });
                    report.errors.push(path);
                }
            }
        }

        (files, subdirs)
    }

    fn visit_file(&self, path: &Path, depth: usize, report: &mut WalkReport) {
        if !has_archive_suffix(path, &self.suffixes) {
            return;
        }

        report.archives_found += 1;
        self.observer.on_event(&WalkEvent::ArchiveFound {
            archive: path.to_path_buf(),
        });

        let extract_to = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let Some(extraction) =
            self.dispatcher
                .extract_archive(path, extract_to, self.observer.as_ref())
        else {
            report.failed.push(path.to_path_buf());
            return;
        };
        report.extracted.push(extraction.target.clone());

        if self.options.delete_after_extract {
            self.delete_archive(path, report);
        }

        if !self.options.recursive || !extraction.target.is_dir() {
            return;
        }
        if depth >= self.options.max_depth {
            self.observer.on_event(&WalkEvent::DepthLimitReached {
                target: extraction.target,
                depth: depth + 1,
            });
            return;
        }
        self.walk_dir(&extraction.target, depth + 1, report);
    }

    fn delete_archive(&self, path: &Path, report: &mut WalkReport) {
        match remove_archive(path, self.remover.as_ref()) {
            Ok(removal) => {
                report.deleted += 1;
                self.observer.on_event(&WalkEvent::ArchiveDeleted {
                    archive: path.to_path_buf(),
                    forced: removal == Removal::Forced,
                });
            }
            Err(err) => {
                report.deletion_failures.push(path.to_path_buf());
                self.observer.on_event(&WalkEvent::DeletionFailed {
                    archive: path.to_path_buf(),
                    message: err.to_string(),
                });
            }
        }
    }
}

/// Unpack every archive under `root` with default settings
pub fn unpack_tree(root: &Path, delete_after_extract: bool) -> Result<WalkReport> {
    Walker::new(WalkOptions {
        delete_after_extract,
        ..WalkOptions::default()
    })
    .unpack_tree(root)
}
