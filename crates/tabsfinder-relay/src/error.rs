use tabsfinder_frame::FrameError;
use tabsfinder_pipe::PipeError;

/// Errors that can occur while running a relay host or client.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A pipe transport operation failed.
    #[error(transparent)]
    Pipe(#[from] PipeError),

    /// A framing operation on the browser channel failed.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// An I/O error outside the pipe and frame layers.
    #[error("relay I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;
