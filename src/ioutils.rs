use std::fmt::Display;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// What finalizing an [`AvoidWriteFile`] did to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// The destination existed (and was readable) before finalizing.
    pub existed: bool,
    /// The destination was written, or would have been in dry-run mode.
    pub updated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    Unchanged,
    Created,
    Overwritten,
}

impl WriteOutcome {
    pub fn status(&self) -> OutputStatus {
        match (self.existed, self.updated) {
            (true, false) => OutputStatus::Unchanged,
            (false, _) => OutputStatus::Created,
            (true, true) => OutputStatus::Overwritten,
        }
    }
}

impl Display for OutputStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputStatus::Unchanged => "unchanged",
            OutputStatus::Created => "created",
            OutputStatus::Overwritten => "updated",
        };
        write!(f, "{s}")
    }
}

/// Buffered output file that only touches the disk when its content changes.
///
/// Bytes written through [`Write`] are accumulated in memory. [`finalize`]
/// compares them with the current destination content and rewrites the
/// destination only when they differ, so file watchers and incremental
/// builds do not see spurious modifications.
///
/// If the value is dropped without being finalized, the same flush runs from
/// `Drop` and any error is logged.
///
/// There is no locking: two sinks targeting the same path must not be
/// finalized concurrently.
///
/// [`finalize`]: AvoidWriteFile::finalize
#[derive(Debug)]
pub struct AvoidWriteFile {
    path: PathBuf,
    buf: Vec<u8>,
    dry_run: bool,
    finalized: bool,
}

impl AvoidWriteFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf(), buf: Vec::new(), dry_run: false, finalized: false }
    }

    /// A sink that compares but never writes; the outcome is what a real
    /// finalize would report.
    pub fn dry_run<P: AsRef<Path>>(path: P) -> Self {
        let mut sink = Self::new(path);
        sink.dry_run = true;
        sink
    }

    /// Compares the buffered bytes with the destination and writes on difference.
    pub fn finalize(mut self) -> Result<WriteOutcome> {
        self.finalized = true;
        self.flush_to_disk()
    }

    fn flush_to_disk(&mut self) -> Result<WriteOutcome> {
        let existing = read_existing(&self.path);
        let existed = existing.is_some();

        if existing.as_deref() == Some(self.buf.as_slice()) {
            log::debug!("'{}' is unchanged, skipping write", self.path.display());
            return Ok(WriteOutcome { existed, updated: false });
        }

        if self.dry_run {
            log::debug!("[DRY RUN] would write '{}'", self.path.display());
        } else {
            write_bytes(&self.buf, &self.path)?;
            log::debug!("Wrote {} bytes to '{}'", self.buf.len(), self.path.display());
        }
        Ok(WriteOutcome { existed, updated: true })
    }
}

impl Write for AvoidWriteFile {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for AvoidWriteFile {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        if let Err(e) = self.flush_to_disk() {
            log::error!("Failed to flush '{}': {e}", self.path.display());
        }
    }
}

/// Reads the destination for comparison. Anything other than a successful
/// read counts as "does not exist"; the write that follows recreates it.
fn read_existing(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            log::warn!("Cannot read '{}' for comparison: {e}", path.display());
            None
        }
    }
}

pub fn create_dir_all<P: AsRef<Path>>(dest_path: P) -> Result<()> {
    let dest_path = dest_path.as_ref();
    if dest_path.as_os_str().is_empty() {
        return Ok(());
    }
    match fs::create_dir_all(dest_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dest_path.is_dir() => Ok(()),
        Err(e) => Err(Error::NotFoundError {
            path: dest_path.to_path_buf(),
            reason: format!("Cannot create directory: {e}."),
        }),
    }
}

pub fn write_bytes<P: AsRef<Path>>(content: &[u8], dest_path: P) -> Result<()> {
    let dest_path = dest_path.as_ref();
    if let Some(parent) = dest_path.parent() {
        create_dir_all(parent)?;
    }
    fs::write(dest_path, content).map_err(Error::IoError)
}

pub fn copy_file<P: AsRef<Path>>(source_path: P, dest_path: P) -> Result<()> {
    let dest_path = dest_path.as_ref();
    if let Some(parent) = dest_path.parent() {
        create_dir_all(parent)?;
    }
    fs::copy(source_path, dest_path).map(|_| ()).map_err(Error::IoError)
}
