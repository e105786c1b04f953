//! Archive extraction: format probes and the fallback dispatcher
//!
//! The file extension of an archive is not trusted. The [`Dispatcher`] asks
//! each [`FormatProbe`] in turn to decode the file and stops at the first one
//! that succeeds. Every probe validates its own format before it creates
//! anything on disk, so the order only affects how fast a match is found.

pub mod sevenz;
pub mod tar;
pub mod zip;

use crate::observer::{WalkEvent, WalkObserver};
use crate::paths;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

pub use self::sevenz::SevenZProbe;
pub use self::tar::{TarCompression, TarProbe};
pub use self::zip::ZipProbe;

/// Archive formats the dispatcher can probe for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveFormat {
    #[serde(rename = "7z")]
    SevenZ,
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "tar.gz")]
    TarGz,
    #[serde(rename = "tar.bz2")]
    TarBz2,
    #[serde(rename = "tar")]
    Tar,
}

impl ArchiveFormat {
    /// Probe order used when nothing else is configured
    pub const DEFAULT_ORDER: [ArchiveFormat; 5] = [
        ArchiveFormat::SevenZ,
        ArchiveFormat::Zip,
        ArchiveFormat::TarGz,
        ArchiveFormat::TarBz2,
        ArchiveFormat::Tar,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ArchiveFormat::SevenZ => "7z",
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::TarBz2 => "tar.bz2",
            ArchiveFormat::Tar => "tar",
        }
    }

    /// Build the probe that decodes this format
    pub fn probe(self) -> Box<dyn FormatProbe> {
        match self {
            ArchiveFormat::SevenZ => Box::new(SevenZProbe::new()),
            ArchiveFormat::Zip => Box::new(ZipProbe::new()),
            ArchiveFormat::TarGz => Box::new(TarProbe::gzip()),
            ArchiveFormat::TarBz2 => Box::new(TarProbe::bzip2()),
            ArchiveFormat::Tar => Box::new(TarProbe::plain()),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArchiveFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "7z" | "7zip" => Ok(ArchiveFormat::SevenZ),
            "zip" => Ok(ArchiveFormat::Zip),
            "tar.gz" | "tgz" | "gzip" => Ok(ArchiveFormat::TarGz),
            "tar.bz2" | "tbz" | "tbz2" | "bzip2" => Ok(ArchiveFormat::TarBz2),
            "tar" => Ok(ArchiveFormat::Tar),
            other => Err(Error::Config(format!("Unknown archive format: {}", other))),
        }
    }
}

/// One format-specific extractor tried by the dispatcher
pub trait FormatProbe {
    /// Format this probe decodes
    fn format(&self) -> ArchiveFormat;

    /// Decode `archive` into a fresh folder under `extract_to`
    ///
    /// Returns the folder that was created. Fails with [`Error::Decode`] when
    /// the file is not a valid instance of this format; in that case nothing
    /// is left behind under `extract_to`.
    fn try_extract(&self, archive: &Path, extract_to: &Path) -> Result<PathBuf>;
}

/// Successful extraction of one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub format: ArchiveFormat,
    pub target: PathBuf,
}

/// Tries an ordered list of probes until one decodes the archive
pub struct Dispatcher {
    probes: Vec<Box<dyn FormatProbe>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_order(&ArchiveFormat::DEFAULT_ORDER)
    }
}

impl Dispatcher {
    /// Create a dispatcher over explicit probes, tried in the given order
    pub fn new(probes: Vec<Box<dyn FormatProbe>>) -> Self {
        Self { probes }
    }

    /// Create a dispatcher with the built-in probe for each listed format
    pub fn with_order(formats: &[ArchiveFormat]) -> Self {
        Self::new(formats.iter().map(|format| format.probe()).collect())
    }

    /// Formats in the order they are probed
    pub fn order(&self) -> Vec<ArchiveFormat> {
        self.probes.iter().map(|probe| probe.format()).collect()
    }

    /// Extract `archive` into a unique folder under `extract_to`
    ///
    /// Each failed probe is reported as [`WalkEvent::ProbeFailed`]. When all
    /// probes fail the collected messages are returned in
    /// [`Error::ExtractionFailed`].
    pub fn try_extract_archive(
        &self,
        archive: &Path,
        extract_to: &Path,
        observer: &dyn WalkObserver,
    ) -> Result<Extraction> {
        let mut reasons = Vec::with_capacity(self.probes.len());

        for probe in &self.probes {
            match probe.try_extract(archive, extract_to) {
                Ok(target) => {
                    let extraction = Extraction {
                        format: probe.format(),
                        target,
                    };
                    observer.on_event(&WalkEvent::ExtractionSucceeded {
                        archive: archive.to_path_buf(),
                        format: extraction.format,
                        target: extraction.target.clone(),
                    });
                    return Ok(extraction);
                }
                Err(err) => {
                    let message = if matches!(err, Error::Decode { .. }) {
                        err.to_string()
                    } else {
                        format!("{} extraction failed: {}", probe.format(), err)
                    };
                    observer.on_event(&WalkEvent::ProbeFailed {
                        archive: archive.to_path_buf(),
                        format: probe.format(),
                        message: message.clone(),
                    });
                    reasons.push(message);
                }
            }
        }

        Err(Error::ExtractionFailed {
            path: archive.to_path_buf(),
            reasons,
        })
    }

    /// Extract `archive`, reporting failure to the observer instead of the caller
    pub fn extract_archive(
        &self,
        archive: &Path,
        extract_to: &Path,
        observer: &dyn WalkObserver,
    ) -> Option<Extraction> {
        match self.try_extract_archive(archive, extract_to, observer) {
            Ok(extraction) => Some(extraction),
            Err(err) => {
                observer.on_event(&WalkEvent::ExtractionFailed {
                    archive: archive.to_path_buf(),
                    reason: err.to_string(),
                });
                None
            }
        }
    }
}

/// Create the unique target folder for `archive` and run `decode` into it
///
/// If `decode` fails the partially written folder is removed again, so the
/// next probe resolves the same name.
pub(crate) fn unpack_into<F>(archive: &Path, extract_to: &Path, decode: F) -> Result<PathBuf>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let target = paths::ensure_unique(&extract_to.join(paths::archive_base_name(archive)));
    fs::create_dir_all(&target)?;

    match decode(&target) {
        Ok(()) => Ok(target),
        Err(err) => {
            if let Err(cleanup) = fs::remove_dir_all(&target) {
                warn!(target = ?target, error = %cleanup, "Failed to remove partial extraction");
            }
            Err(err)
        }
    }
}
