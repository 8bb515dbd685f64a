//! Input archive reader.
//!
//! Opening validates the archive as a whole (size, ZIP structure,
//! declared expansion) without decompressing anything. Entry data is then
//! pulled one entry at a time with [`ArchiveReader::read`].

use super::{ArchiveLimits, EntryHeader};
use crate::error::ArchiveError;
use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::result::ZipError;
use zip::ZipArchive;

/// Upper bound on the buffer reserved before an entry is read
const INITIAL_READ_CAPACITY: u64 = 1 << 20;

pub struct ArchiveReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    headers: Vec<EntryHeader>,
    source: PathBuf,
    size_bytes: u64,
}

impl ArchiveReader<BufReader<File>> {
    /// Open and validate an archive on disk
    pub fn open(path: &Path, limits: &ArchiveLimits) -> Result<Self, ArchiveError> {
        if !path.is_file() {
            return Err(ArchiveError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let io_error = |source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Checked against the file system before the archive is parsed
        let size = fs::metadata(path).map_err(io_error)?.len();
        limits.check_archive_size(size)?;

        let file = File::open(path).map_err(io_error)?;
        Self::from_reader(BufReader::new(file), size, path.to_path_buf(), limits)
    }
}

impl ArchiveReader<Cursor<Vec<u8>>> {
    /// Validate an archive held in memory
    pub fn from_bytes(bytes: Vec<u8>, limits: &ArchiveLimits) -> Result<Self, ArchiveError> {
        let size = bytes.len() as u64;
        limits.check_archive_size(size)?;
        Self::from_reader(Cursor::new(bytes), size, PathBuf::from("<memory>"), limits)
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    fn from_reader(
        reader: R,
        size_bytes: u64,
        source: PathBuf,
        limits: &ArchiveLimits,
    ) -> Result<Self, ArchiveError> {
        let mut archive = ZipArchive::new(reader).map_err(|e| zip_error(&source, e))?;

        let mut headers = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive
                .by_index_raw(index)
                .map_err(|e| zip_error(&source, e))?;
            headers.push(EntryHeader {
                index,
                path: file.name().to_string(),
                size: file.size(),
                compressed_size: file.compressed_size(),
                is_dir: file.is_dir(),
                is_safe: file.enclosed_name().is_some(),
            });
        }

        let declared: u64 = headers
            .iter()
            .fold(0u64, |total, h| total.saturating_add(h.size));
        limits.check_expansion(declared)?;

        info!(
            archive = %source.display(),
            entries = headers.len(),
            size_bytes,
            "Opened archive"
        );

        Ok(Self {
            archive,
            headers,
            source,
            size_bytes,
        })
    }

    /// Entries in stored order
    pub fn headers(&self) -> &[EntryHeader] {
        &self.headers
    }

    /// Where the archive came from, for messages
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Size of the archive itself (compressed)
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Decompress one entry's content.
    ///
    /// Fails if the data does not match its checksum or its declared size;
    /// both mean the archive is corrupted.
    pub fn read(&mut self, header: &EntryHeader) -> Result<Vec<u8>, ArchiveError> {
        let corrupted = |reason: String| ArchiveError::Corrupted {
            entry: header.path.clone(),
            reason,
        };

        let mut file = self
            .archive
            .by_index(header.index)
            .map_err(|e| corrupted(e.to_string()))?;

        // The declared size is untrusted until the read below confirms it
        let mut bytes = Vec::with_capacity(header.size.min(INITIAL_READ_CAPACITY) as usize);
        (&mut file)
            .take(header.size.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| corrupted(e.to_string()))?;

        if bytes.len() as u64 != header.size {
            return Err(corrupted(format!(
                "expected {} bytes, found {}",
                header.size,
                bytes.len()
            )));
        }

        debug!(entry = %header.path, bytes = bytes.len(), "Read entry");
        Ok(bytes)
    }
}

fn zip_error(source: &Path, error: ZipError) -> ArchiveError {
    match error {
        ZipError::Io(e) => ArchiveError::Io {
            path: source.to_path_buf(),
            source: e,
        },
        other => ArchiveError::Invalid {
            reason: other.to_string(),
        },
    }
}
