//! Staged replacement of a file.
//!
//! The full replacement is written to a uniquely named temp file, synced,
//! closed, and only then swapped over the target.  Until [`StagedFile::commit`]
//! succeeds the target is never opened for writing; dropping an uncommitted
//! stage deletes the temp file.
//!
//! A temp file on another volume cannot be renamed over the target.  In that
//! case it is first copied into a second temp file next to the target, and
//! that copy is renamed instead.  The temp file takes the target's
//! permissions, so a replaced file keeps its mode.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StorageError;

/// A temp file that will replace `target` on commit.
pub(crate) struct StagedFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    committed: bool,
}

impl StagedFile {
    /// Creates `.<file>.<uuid>.tmp` in `temp_dir`, or next to `target`.
    pub(crate) fn create(target: &Path, temp_dir: Option<&Path>) -> Result<Self, StorageError> {
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config".to_string());
        let dir = match temp_dir {
            Some(dir) => dir.to_path_buf(),
            None => match target.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        };
        let path = dir.join(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

        let file = File::create(&path).map_err(|e| StorageError::io(&path, e))?;
        if let Ok(metadata) = fs::metadata(target) {
            file.set_permissions(metadata.permissions())
                .map_err(|e| StorageError::io(&path, e))?;
        }
        debug!("staging replacement for {} at {}", target.display(), path.display());
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            committed: false,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes and closes the temp file, then swaps it over `target`.
    ///
    /// # Errors
    ///
    /// [`StorageError::Io`] if the temp file cannot be finished or the swap
    /// fails.  The target is left as it was and the temp file is removed.
    pub(crate) fn commit(mut self, target: &Path) -> Result<(), StorageError> {
        self.finish()?;

        match fs::rename(&self.path, target) {
            Ok(()) => {
                self.committed = true;
                Ok(())
            }
            Err(e) if is_cross_device(&e) => {
                warn!(
                    "{} is on another volume than {}; copying next to the target",
                    self.path.display(),
                    target.display()
                );
                // The staged file itself is removed on drop.
                copy_into_place(&self.path, target)
            }
            Err(e) => Err(StorageError::io(target, e)),
        }
    }

    /// Flushes, syncs and closes the temp file.
    fn finish(&mut self) -> Result<(), StorageError> {
        let writer = self.writer.take().ok_or_else(|| {
            StorageError::InvalidOperation("staged file already closed".to_string())
        })?;
        let file = writer
            .into_inner()
            .map_err(|e| StorageError::io(&self.path, e.into_error()))?;
        file.sync_all().map_err(|e| StorageError::io(&self.path, e))
    }
}

/// Copies `source` into a fresh temp file beside `target` and renames that
/// over `target`.
fn copy_into_place(source: &Path, target: &Path) -> Result<(), StorageError> {
    let mut local = StagedFile::create(target, None)?;
    let mut input = File::open(source).map_err(|e| StorageError::io(source, e))?;
    io::copy(&mut input, &mut local).map_err(|e| StorageError::io(local.path(), e))?;
    local.finish()?;

    fs::rename(&local.path, target).map_err(|e| StorageError::io(target, e))?;
    local.committed = true;
    Ok(())
}

/// Whether a rename failed only because source and target are on
/// different volumes.
fn is_cross_device(error: &io::Error) -> bool {
    // EXDEV on Linux and the BSDs, ERROR_NOT_SAME_DEVICE on Windows.
    #[cfg(unix)]
    const CROSS_DEVICE: Option<i32> = Some(18);
    #[cfg(windows)]
    const CROSS_DEVICE: Option<i32> = Some(17);
    #[cfg(not(any(unix, windows)))]
    const CROSS_DEVICE: Option<i32> = None;

    CROSS_DEVICE.is_some() && error.raw_os_error() == CROSS_DEVICE
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.writer.as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(io::Error::new(io::ErrorKind::Other, "staged file closed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Close the handle first so the file can be removed on every platform.
        self.writer = None;
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("failed to remove temp file {}: {e}", self.path.display());
            }
        }
    }
}
