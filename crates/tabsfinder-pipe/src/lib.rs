//! Unix FIFO transport for the tabsfinder relay.
//!
//! Each running host owns one named pipe at a well-known, pid-parameterized
//! path; clients discover live hosts by scanning for that naming pattern.
//! Both ends open the FIFO non-blocking: a blocking open would stall until
//! the other side shows up.
//!
//! This is the lowest layer of tabsfinder. Everything else builds on the
//! [`Fifo`] guard and [`PipeNaming`] paths provided here.

pub mod error;
pub mod naming;

#[cfg(unix)]
pub mod fifo;

pub use error::{PipeError, Result};
pub use naming::{discover, PipeNaming, PIPE_PREFIX};

#[cfg(unix)]
pub use fifo::{open_writer, Fifo};
