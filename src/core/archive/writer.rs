//! Output archive assembly.

use crate::error::WriteError;
use std::fs;
use std::io::{self, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Default output file name inside the destination directory
pub const DEFAULT_OUTPUT_NAME: &str = "unique_images.zip";

/// Writes entries, in call order, under exactly the given paths
pub struct ArchiveWriter<W: Write + Seek> {
    inner: ZipWriter<W>,
    options: SimpleFileOptions,
    entries: usize,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: ZipWriter::new(writer),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            entries: 0,
        }
    }

    pub fn add_entry(&mut self, path: &str, bytes: &[u8]) -> Result<(), WriteError> {
        self.add_reader(path, &mut &bytes[..])
    }

    /// Stream an entry's content from `reader`
    pub fn add_reader<R: Read + ?Sized>(
        &mut self,
        path: &str,
        reader: &mut R,
    ) -> Result<(), WriteError> {
        let archive_error = |reason: String| WriteError::Archive {
            entry: path.to_string(),
            reason,
        };

        self.inner
            .start_file(path, self.options)
            .map_err(|e| archive_error(e.to_string()))?;
        io::copy(reader, &mut self.inner).map_err(|e| archive_error(e.to_string()))?;
        self.entries += 1;
        Ok(())
    }

    /// Number of entries written so far
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Write the central directory and hand back the underlying writer
    pub fn finish(self) -> Result<W, WriteError> {
        self.inner.finish().map_err(|e| WriteError::Archive {
            entry: "<central directory>".to_string(),
            reason: e.to_string(),
        })
    }
}

/// An output archive on disk that only appears once complete.
///
/// Entries go to a temporary file in the destination directory; the file
/// is renamed into place by [`OutputArchive::persist`] and deleted if the
/// value is dropped first.
pub struct OutputArchive {
    writer: ArchiveWriter<BufWriter<NamedTempFile>>,
    destination: PathBuf,
}

impl OutputArchive {
    /// Prepare `<dir>/<name>`, creating `dir` if needed
    pub fn create(dir: &Path, name: &str) -> Result<Self, WriteError> {
        fs::create_dir_all(dir).map_err(|source| WriteError::CreateOutputDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let temp = NamedTempFile::new_in(dir).map_err(|source| WriteError::CreateOutputDir {
            path: dir.to_path_buf(),
            source,
        })?;

        Ok(Self {
            writer: ArchiveWriter::new(BufWriter::new(temp)),
            destination: dir.join(name),
        })
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn add_reader<R: Read + ?Sized>(
        &mut self,
        path: &str,
        reader: &mut R,
    ) -> Result<(), WriteError> {
        self.writer.add_reader(path, reader)
    }

    /// Finish the archive and move it to its destination
    pub fn persist(self) -> Result<PathBuf, WriteError> {
        let entries = self.writer.len();
        let persist_error = |source| WriteError::Persist {
            path: self.destination.clone(),
            source,
        };

        let buffered = self.writer.finish()?;
        let temp = buffered
            .into_inner()
            .map_err(|e| persist_error(e.into_error()))?;
        temp.as_file().sync_all().map_err(persist_error)?;
        temp.persist(&self.destination)
            .map_err(|e| persist_error(e.error))?;

        info!(path = %self.destination.display(), entries, "Wrote output archive");
        Ok(self.destination)
    }
}
