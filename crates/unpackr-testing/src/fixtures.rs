//! Archive builders for tests
//!
//! Every builder takes `(name, content)` pairs; names use `/` separators and
//! intermediate directories are implied.

use anyhow::Result;
use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// A single file inside a fixture archive
pub type Entry<'a> = (&'a str, &'a [u8]);

/// Build zip archive bytes
pub fn zip_bytes(entries: &[Entry<'_>]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer.start_file(*name, SimpleFileOptions::default())?;
        writer.write_all(content)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Build uncompressed tar bytes
pub fn tar_bytes(entries: &[Entry<'_>]) -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, name, *content)?;
    }
    Ok(builder.into_inner()?)
}

/// Build gzip-compressed tar bytes
pub fn tar_gz_bytes(entries: &[Entry<'_>]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&tar_bytes(entries)?)?;
    Ok(encoder.finish()?)
}

/// Build bzip2-compressed tar bytes
pub fn tar_bz2_bytes(entries: &[Entry<'_>]) -> Result<Vec<u8>> {
    let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(&tar_bytes(entries)?)?;
    Ok(encoder.finish()?)
}

pub fn write_zip(path: &Path, entries: &[Entry<'_>]) -> Result<()> {
    fs::write(path, zip_bytes(entries)?)?;
    Ok(())
}

pub fn write_tar(path: &Path, entries: &[Entry<'_>]) -> Result<()> {
    fs::write(path, tar_bytes(entries)?)?;
    Ok(())
}

pub fn write_tar_gz(path: &Path, entries: &[Entry<'_>]) -> Result<()> {
    fs::write(path, tar_gz_bytes(entries)?)?;
    Ok(())
}

pub fn write_tar_bz2(path: &Path, entries: &[Entry<'_>]) -> Result<()> {
    fs::write(path, tar_bz2_bytes(entries)?)?;
    Ok(())
}

/// Write a 7z archive whose root holds `entries`
pub fn write_7z(path: &Path, entries: &[Entry<'_>]) -> Result<()> {
    let staging = tempfile::tempdir()?;
    for (name, content) in entries {
        let file = staging.path().join(name);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        File::create(&file)?.write_all(content)?;
    }
    sevenz_rust::compress_to_path(staging.path(), path)
        .map_err(|e| anyhow::anyhow!("Failed to create 7z archive: {}", e))?;
    Ok(())
}

/// Bytes that no supported format accepts
pub fn corrupt_bytes() -> Vec<u8> {
    b"this is not an archive of any kind\n".repeat(32)
}
