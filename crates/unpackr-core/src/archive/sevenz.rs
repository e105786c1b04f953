//! 7z probe

use super::{unpack_into, ArchiveFormat, FormatProbe};
use crate::security::sanitize_path;
use crate::{Error, Result};
use sevenz_rust::{Password, SevenZReader};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 7z extractor
pub struct SevenZProbe;

impl Default for SevenZProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SevenZProbe {
    /// Create a new 7z probe
    pub fn new() -> Self {
        Self
    }
}

impl FormatProbe for SevenZProbe {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::SevenZ
    }

    fn try_extract(&self, archive: &Path, extract_to: &Path) -> Result<PathBuf> {
        // Encrypted archives are not supported, so an empty password is enough
        let mut reader = SevenZReader::open(archive, Password::empty())
            .map_err(|e| Error::decode(ArchiveFormat::SevenZ, e))?;

        unpack_into(archive, extract_to, |target| {
            reader
                .for_each_entries(|entry, data| {
                    if entry.name.is_empty() {
                        return Ok(true);
                    }

                    let dest = match sanitize_path(target, Path::new(&entry.name)) {
                        Ok(dest) => dest,
                        Err(e) => {
                            warn!(entry = %entry.name, error = %e, "Skipping 7z entry");
                            io::copy(data, &mut io::sink())?;
                            return Ok(true);
                        }
                    };

                    if entry.is_directory {
                        fs::create_dir_all(&dest)?;
                    } else {
                        if let Some(parent) = dest.parent() {
                            fs::create_dir_all(parent)?;
                        }

                        debug!("Extracting: {:?}", entry.name);
                        let mut output_file = File::create(&dest)?;
                        io::copy(data, &mut output_file)?;
                    }

                    Ok(true)
                })
                .map_err(|e| Error::decode(ArchiveFormat::SevenZ, e))
        })
    }
}
