//! Zip probe

use super::{unpack_into, ArchiveFormat, FormatProbe};
use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

/// Zip extractor
pub struct ZipProbe;

impl Default for ZipProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipProbe {
    /// Create a new zip probe
    pub fn new() -> Self {
        Self
    }
}

impl FormatProbe for ZipProbe {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn try_extract(&self, archive: &Path, extract_to: &Path) -> Result<PathBuf> {
        let file = File::open(archive)?;
        let mut zip = ZipArchive::new(BufReader::new(file))
            .map_err(|e| Error::decode(ArchiveFormat::Zip, e))?;

        unpack_into(archive, extract_to, |target| extract_entries(&mut zip, target))
    }
}

fn extract_entries<R: io::Read + io::Seek>(zip: &mut ZipArchive<R>, target: &Path) -> Result<()> {
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| Error::decode(ArchiveFormat::Zip, e))?;

        // enclosed_name rejects absolute paths and `..` components
        let relative = match entry.enclosed_name() {
            Some(path) => path.to_owned(),
            None => {
                warn!(entry = entry.name(), "Skipping zip entry with unsafe path");
                continue;
            }
        };
        let dest = target.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest)?;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        debug!("Extracting: {:?}", relative);
        let mut output = File::create(&dest)?;
        io::copy(&mut entry, &mut output).map_err(|e| Error::decode(ArchiveFormat::Zip, e))?;

        #[cfg(unix)]
        {
            if let Some(mode) = entry.unix_mode().map(|m| m & 0o7777).filter(|m| *m != 0) {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&dest, fs::Permissions::from_mode(mode))?;
            }
        }
    }

    Ok(())
}
