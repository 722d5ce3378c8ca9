use std::fs::File;
use std::io::{ErrorKind, Read};
use std::os::unix::fs::{FileTypeExt, MetadataExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{PipeError, Result};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Read side of a host-owned named pipe.
///
/// Created at host startup and held for the lifetime of the process. The
/// FIFO is opened `O_RDONLY | O_NONBLOCK` — a blocking open would stall
/// until a writer appears, and both ends must open non-blocking to avoid
/// deadlock. Dropping the guard removes the pipe file (best effort,
/// identity-checked) so every exit path cleans up.
pub struct Fifo {
    file: File,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
}

impl Fifo {
    /// Permission mode for created pipes. The filesystem is the only
    /// access control on this channel.
    pub const DEFAULT_PIPE_MODE: u32 = 0o600;

    /// Create the FIFO at `path` if absent and open its read side.
    ///
    /// An existing FIFO at the path is reused; an existing non-FIFO file
    /// is refused rather than clobbered.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            let metadata =
                std::fs::symlink_metadata(&path).map_err(|e| PipeError::Create {
                    path: path.clone(),
                    source: e,
                })?;
            if !metadata.file_type().is_fifo() {
                return Err(PipeError::NotAFifo { path });
            }
            debug!(?path, "reusing existing fifo");
        } else {
            mkfifo(&path, Self::DEFAULT_PIPE_MODE)?;
            debug!(?path, "created fifo");
        }

        let file = std::fs::OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)
            .map_err(|e| PipeError::Open {
                path: path.clone(),
                source: e,
            })?;

        let created_inode = std::fs::symlink_metadata(&path)
            .ok()
            .map(|m| (m.dev(), m.ino()));

        info!(?path, "listening on fifo");

        Ok(Self {
            file,
            path,
            created_inode,
        })
    }

    /// Drain whatever bytes are currently available, without blocking.
    ///
    /// Appends to `buf` and returns the number of bytes read. Zero means
    /// nothing is pending right now (no data from a connected writer, or
    /// no writer at all); the caller is expected to sleep and retry.
    pub fn read_available(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        let mut total = 0usize;
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.file.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    total += n;
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(PipeError::Io(err)),
            }
        }
        Ok(total)
    }

    /// The path this pipe lives at.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Fifo {
    fn drop(&mut self) {
        if let Some((expected_dev, expected_ino)) = self.created_inode {
            if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
                if metadata.file_type().is_fifo()
                    && metadata.dev() == expected_dev
                    && metadata.ino() == expected_ino
                {
                    debug!(path = ?self.path, "cleaning up fifo");
                    let _ = std::fs::remove_file(&self.path);
                } else {
                    debug!(
                        path = ?self.path,
                        "fifo path identity changed; skipping cleanup"
                    );
                }
            }
        }
    }
}

/// Open the write side of a host's pipe, non-blocking.
///
/// A non-blocking write-side open fails immediately with `ENXIO` when no
/// process has the FIFO open for reading — the host disappeared between
/// discovery and open. That case is surfaced as [`PipeError::NoReader`]
/// so callers can skip the dead pipe.
pub fn open_writer(path: impl AsRef<Path>) -> Result<File> {
    let path = path.as_ref();
    std::fs::OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
        .map_err(|err| {
            if err.raw_os_error() == Some(libc::ENXIO) {
                PipeError::NoReader {
                    path: path.to_path_buf(),
                }
            } else {
                PipeError::Open {
                    path: path.to_path_buf(),
                    source: err,
                }
            }
        })
}

fn mkfifo(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::ffi::OsStrExt;

    let cpath =
        std::ffi::CString::new(path.as_os_str().as_bytes()).map_err(|_| PipeError::Create {
            path: path.to_path_buf(),
            source: std::io::Error::new(ErrorKind::InvalidInput, "path contains NUL byte"),
        })?;

    // SAFETY: `cpath` is a valid NUL-terminated C string for the duration
    // of the call.
    let rc = unsafe { libc::mkfifo(cpath.as_ptr(), mode as libc::mode_t) };
    if rc != 0 {
        return Err(PipeError::Create {
            path: path.to_path_buf(),
            source: std::io::Error::last_os_error(),
        });
    }
    Ok(())
}
