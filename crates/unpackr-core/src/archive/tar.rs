//! Tar probes: gzip-compressed, bzip2-compressed and plain tar

use super::{unpack_into, ArchiveFormat, FormatProbe};
use crate::{Error, Result};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::{debug, warn};

/// Gzip magic bytes (RFC 1952)
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Bzip2 stream header: 'B' 'Z' 'h'
const BZIP2_MAGIC: [u8; 3] = [0x42, 0x5a, 0x68];

/// POSIX ustar magic, found at offset 257 of the first header block
const USTAR_MAGIC: &[u8; 5] = b"ustar";

const BLOCK_SIZE: usize = 512;

/// Compression wrapped around the tar stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarCompression {
    None,
    Gzip,
    Bzip2,
}

/// Tar extractor
pub struct TarProbe {
    compression: TarCompression,
}

impl TarProbe {
    /// Probe for `.tar.gz` / `.tgz` content
    pub fn gzip() -> Self {
        Self {
            compression: TarCompression::Gzip,
        }
    }

    /// Probe for `.tar.bz2` / `.tbz` content
    pub fn bzip2() -> Self {
        Self {
            compression: TarCompression::Bzip2,
        }
    }

    /// Probe for uncompressed tar content
    pub fn plain() -> Self {
        Self {
            compression: TarCompression::None,
        }
    }

    /// Check the leading bytes of the file against this probe's format
    fn check_magic(&self, file: &mut File) -> Result<()> {
        let format = self.format();
        let mut head = [0u8; BLOCK_SIZE];
        let read = read_up_to(file, &mut head)?;
        file.seek(SeekFrom::Start(0))?;

        let valid = match self.compression {
            TarCompression::Gzip => head[..read].starts_with(&GZIP_MAGIC),
            TarCompression::Bzip2 => head[..read].starts_with(&BZIP2_MAGIC),
            TarCompression::None => read == BLOCK_SIZE && looks_like_tar_header(&head),
        };

        if valid {
            Ok(())
        } else {
            Err(Error::decode(format, "unrecognized stream header"))
        }
    }

    /// Open the decoded tar stream, refusing one shorter than a header block
    fn open_stream(&self, file: File) -> Result<Box<dyn Read>> {
        let reader = BufReader::new(file);
        let mut stream: Box<dyn Read> = match self.compression {
            TarCompression::None => Box::new(reader),
            TarCompression::Gzip => Box::new(GzDecoder::new(reader)),
            TarCompression::Bzip2 => Box::new(BzDecoder::new(reader)),
        };

        let mut head = vec![0u8; BLOCK_SIZE];
        let read =
            read_up_to(&mut stream, &mut head).map_err(|e| Error::decode(self.format(), e))?;
        if read < BLOCK_SIZE {
            return Err(Error::decode(self.format(), "empty or truncated tar stream"));
        }

        Ok(Box::new(Cursor::new(head).chain(stream)))
    }
}

impl FormatProbe for TarProbe {
    fn format(&self) -> ArchiveFormat {
        match self.compression {
            TarCompression::None => ArchiveFormat::Tar,
            TarCompression::Gzip => ArchiveFormat::TarGz,
            TarCompression::Bzip2 => ArchiveFormat::TarBz2,
        }
    }

    fn try_extract(&self, archive: &Path, extract_to: &Path) -> Result<PathBuf> {
        let mut file = File::open(archive)?;
        self.check_magic(&mut file)?;

        let format = self.format();
        let mut tar = Archive::new(self.open_stream(file)?);
        unpack_into(archive, extract_to, |target| {
            unpack_entries(&mut tar, target).map_err(|e| Error::decode(format, e))
        })
    }
}

fn unpack_entries<R: Read>(tar: &mut Archive<R>, target: &Path) -> io::Result<()> {
    let mut entries = 0usize;
    // Directory modes are applied last so read-only directories can still be filled
    let mut directories = Vec::new();
    for entry in tar.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type().is_dir() {
            directories.push(entry);
            continue;
        }

        let path = entry.path()?.to_path_buf();
        // unpack_in refuses paths that would land outside `target`
        if entry.unpack_in(target)? {
            debug!("Extracting: {:?}", path);
            entries += 1;
        } else {
            warn!(entry = ?path, "Skipping tar entry with unsafe path");
        }
    }

    // Children before parents
    directories.sort_by(|a, b| b.path_bytes().cmp(&a.path_bytes()));
    for mut dir in directories {
        let path = dir.path()?.to_path_buf();
        if !dir.unpack_in(target)? {
            warn!(entry = ?path, "Skipping tar entry with unsafe path");
        }
    }

    debug!(entries, "Tar stream unpacked");
    Ok(())
}

fn read_up_to<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Recognize a tar header block by its ustar magic or, for old v7 archives,
/// by a matching header checksum
fn looks_like_tar_header(block: &[u8; BLOCK_SIZE]) -> bool {
    if &block[257..262] == USTAR_MAGIC {
        return true;
    }
    if block.iter().all(|b| *b == 0) {
        return false;
    }

    let Ok(stored) = tar::Header::from_byte_slice(block).cksum() else {
        return false;
    };
    let computed: u32 = block
        .iter()
        .enumerate()
        .map(|(i, b)| {
            if (148..156).contains(&i) {
                u32::from(b' ')
            } else {
                u32::from(*b)
            }
        })
        .sum();
    stored == computed
}
