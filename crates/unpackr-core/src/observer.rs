//! Walk events and the observers that receive them
//!
//! Components never log walk progress through a global logger directly.
//! They hand [`WalkEvent`]s to an injected [`WalkObserver`]; the default
//! [`TracingObserver`] turns them into `tracing` records, and
//! [`RecordingObserver`] keeps them in memory for inspection.

use crate::archive::ArchiveFormat;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Something that happened while unpacking a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    /// A directory listing is about to be processed
    DirectoryEntered { path: PathBuf, depth: usize },
    /// A file with an archive suffix was found
    ArchiveFound { archive: PathBuf },
    /// One format probe rejected the archive
    ProbeFailed {
        archive: PathBuf,
        format: ArchiveFormat,
        message: String,
    },
    /// The archive was decoded into `target`
    ExtractionSucceeded {
        archive: PathBuf,
        format: ArchiveFormat,
        target: PathBuf,
    },
    /// Every probe rejected the archive
    ExtractionFailed { archive: PathBuf, reason: String },
    /// The source archive was removed after extraction
    ArchiveDeleted { archive: PathBuf, forced: bool },
    /// The source archive could not be removed
    DeletionFailed { archive: PathBuf, message: String },
    /// Extracted content was not descended into because of the nesting limit
    DepthLimitReached { target: PathBuf, depth: usize },
    /// Any other error while processing a single path
    UnexpectedError { path: PathBuf, message: String },
}

/// Receiver for walk events
pub trait WalkObserver {
    fn on_event(&self, event: &WalkEvent);
}

impl<T: WalkObserver + ?Sized> WalkObserver for Arc<T> {
    fn on_event(&self, event: &WalkEvent) {
        (**self).on_event(event);
    }
}

/// Logs every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl WalkObserver for TracingObserver {
    fn on_event(&self, event: &WalkEvent) {
        match event {
            WalkEvent::DirectoryEntered { path, depth } => {
                debug!(depth, "Checking folder for archives: {:?}", path)
            }
            WalkEvent::ArchiveFound { archive } => debug!("Found archive: {:?}", archive),
            WalkEvent::ProbeFailed {
                archive, message, ..
            } => debug!("{:?}: {}", archive, message),
            WalkEvent::ExtractionSucceeded {
                archive,
                format,
                target,
            } => info!(%format, "Extracted {:?} to {:?}", archive, target),
            WalkEvent::ExtractionFailed { archive, reason } => {
                warn!("Extraction FAILED: {:?}. Reason: {}", archive, reason)
            }
            WalkEvent::ArchiveDeleted { archive, forced } => {
                info!(forced, "Deleted archive {:?}", archive)
            }
            WalkEvent::DeletionFailed { archive, message } => {
                error!("Failed to delete {:?}: {}", archive, message)
            }
            WalkEvent::DepthLimitReached { target, depth } => {
                warn!(depth, "Nesting limit reached, not descending into {:?}", target)
            }
            WalkEvent::UnexpectedError { path, message } => {
                error!("Error processing {:?}: {}", path, message)
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<WalkEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far
    pub fn events(&self) -> Vec<WalkEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn probe_failures(&self) -> usize {
        self.count(|e| matches!(e, WalkEvent::ProbeFailed { .. }))
    }

    pub fn extraction_failures(&self) -> usize {
        self.count(|e| matches!(e, WalkEvent::ExtractionFailed { .. }))
    }

    fn count(&self, predicate: impl Fn(&WalkEvent) -> bool) -> usize {
        self.events
            .lock()
            .map(|events| events.iter().filter(|e| predicate(e)).count())
            .unwrap_or(0)
    }
}

impl WalkObserver for RecordingObserver {
    fn on_event(&self, event: &WalkEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Forwards each event to several observers in order
pub struct FanoutObserver {
    observers: Vec<Box<dyn WalkObserver + Send + Sync>>,
}

impl FanoutObserver {
    pub fn new(observers: Vec<Box<dyn WalkObserver + Send + Sync>>) -> Self {
        Self { observers }
    }
}

impl WalkObserver for FanoutObserver {
    fn on_event(&self, event: &WalkEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
