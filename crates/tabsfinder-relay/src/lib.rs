//! The behavior layer of tabsfinder.
//!
//! A **host** owns one named pipe and bridges two directions: payloads
//! arriving on the pipe are forwarded to the browser as framed envelopes,
//! and framed requests from the browser are handed to a pluggable handler.
//! A **client** discovers every live host pipe and delivers one message to
//! each of them concurrently, best effort, joined against a deadline.

pub mod envelope;
pub mod error;
pub mod inbound;

#[cfg(unix)]
pub mod fanout;
#[cfg(unix)]
pub mod host;

pub use envelope::{coerce_message, Envelope};
pub use error::{RelayError, Result};
pub use inbound::{read_browser_requests, spawn_inbound_reader, InboundHandler, LogHandler, QueueHandler};

#[cfg(unix)]
pub use fanout::{deliver_all, join_all, DeliveryReport, FanoutConfig, JoinTimeout};
#[cfg(unix)]
pub use host::{Host, HostConfig};
