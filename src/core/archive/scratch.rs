//! Scratch storage for retained entries.
//!
//! Bytes of kept entries are spooled to disk while the rest of the
//! archive is still being fingerprinted, so memory holds at most one
//! entry at a time. The directory is owner-only and removed on drop.

use crate::error::WriteError;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Handle to one spooled entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchFile {
    path: PathBuf,
}

pub struct ScratchSpace {
    dir: TempDir,
    next: usize,
}

impl ScratchSpace {
    pub fn new() -> Result<Self, WriteError> {
        let dir = tempfile::Builder::new()
            .prefix("zip-dedup-")
            .tempdir()
            .map_err(|source| WriteError::Scratch { source })?;
        Ok(Self { dir, next: 0 })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Spool `bytes`; files are numbered so entry names never touch the
    /// file system
    pub fn store(&mut self, bytes: &[u8]) -> Result<ScratchFile, WriteError> {
        let path = self.dir.path().join(format!("{:08}", self.next));
        fs::write(&path, bytes).map_err(|source| WriteError::Scratch { source })?;
        self.next += 1;
        Ok(ScratchFile { path })
    }

    pub fn open(&self, file: &ScratchFile) -> Result<BufReader<File>, WriteError> {
        File::open(&file.path)
            .map(BufReader::new)
            .map_err(|source| WriteError::Scratch { source })
    }
}
