use std::path::PathBuf;

/// Errors that can occur in FIFO transport operations.
#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    /// Failed to create a FIFO at the specified path.
    #[error("failed to create fifo at {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to open an existing FIFO.
    #[error("failed to open fifo at {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The path exists but is not a FIFO.
    #[error("existing path is not a fifo: {path}")]
    NotAFifo { path: PathBuf },

    /// No process has the FIFO open for reading.
    ///
    /// Raised when a non-blocking write-side open fails with `ENXIO`; the
    /// host that owned this pipe is gone. Callers treat this as benign.
    #[error("no reader on fifo at {path}")]
    NoReader { path: PathBuf },

    /// Failed to scan a directory for host pipes.
    #[error("failed to scan {path} for pipes: {source}")]
    Discover {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on an open pipe.
    #[error("pipe I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipeError>;
