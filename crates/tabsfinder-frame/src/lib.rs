//! Length-prefixed framing for the browser native-messaging channel.
//!
//! Every message exchanged with the browser over stdio is framed with a
//! 4-byte native-endian payload length followed by exactly that many bytes
//! of UTF-8 JSON. A zero-byte read where the prefix should be means the
//! peer closed the channel.
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_frame, encode_frame, FrameConfig, DEFAULT_MAX_PAYLOAD, LENGTH_PREFIX_SIZE};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
