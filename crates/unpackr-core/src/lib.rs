//! unpackr - recursively unpack every archive in a directory tree
//!
//! This library finds 7z, zip and tar archives by file name, decodes each one
//! into a uniquely named sibling folder by probing formats in order, and
//! optionally descends into the extracted content and deletes the originals.

pub mod archive;
pub mod config;
pub mod error;
pub mod observer;
pub mod paths;
pub mod remove;
pub mod security;
pub mod walk;

pub use error::{Error, Result};

// Re-export commonly used types
pub use archive::{ArchiveFormat, Dispatcher, Extraction, FormatProbe};
pub use observer::{RecordingObserver, TracingObserver, WalkEvent, WalkObserver};
pub use paths::ensure_unique;
pub use remove::{ForceRemover, NoopRemover, PlatformRemover};
pub use walk::{unpack_tree, WalkOptions, WalkReport, Walker};
