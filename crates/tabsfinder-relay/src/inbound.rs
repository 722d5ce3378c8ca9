use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use tabsfinder_frame::{FrameError, FrameReader};

use crate::error::Result;

/// Consumer for requests arriving from the browser.
///
/// The original host enqueued these into a queue nothing drained; the
/// consumer is an explicit extension point here instead. Embedders decide
/// what a browser request means.
pub trait InboundHandler: Send {
    /// Called once per decoded request, in arrival order.
    fn handle(&mut self, text: &str);
}

/// Forwards each request into an mpsc channel for an embedder to drain.
pub struct QueueHandler {
    tx: mpsc::Sender<String>,
}

impl QueueHandler {
    /// Handler plus the receiving end the embedder drains.
    pub fn new() -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl InboundHandler for QueueHandler {
    fn handle(&mut self, text: &str) {
        if self.tx.send(text.to_string()).is_err() {
            warn!("inbound queue receiver dropped; discarding browser request");
        }
    }
}

/// Records each request in the log and otherwise drops it.
///
/// The default for the standalone host binary, which has no consumer for
/// browser requests.
#[derive(Debug, Default)]
pub struct LogHandler;

impl InboundHandler for LogHandler {
    fn handle(&mut self, text: &str) {
        info!(request = text, "browser request received (no consumer configured)");
    }
}

/// Read framed browser requests until the channel closes.
///
/// A zero-byte read where a length prefix belongs means the browser closed
/// the channel: the shutdown flag is raised and the function returns
/// cleanly. Any other error also raises the flag so the poll loop winds
/// down, but is propagated to the caller.
pub fn read_browser_requests<R: Read, H: InboundHandler>(
    input: R,
    mut handler: H,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    let mut reader = FrameReader::new(input);
    loop {
        match reader.read_frame() {
            Ok(payload) => match std::str::from_utf8(payload.as_ref()) {
                Ok(text) => {
                    debug!(request = text, "read browser request");
                    handler.handle(text);
                }
                Err(err) => {
                    warn!(%err, "browser request is not valid UTF-8; dropping");
                }
            },
            Err(FrameError::ConnectionClosed) => {
                info!("browser channel closed; shutting down");
                shutdown.store(true, Ordering::SeqCst);
                return Ok(());
            }
            Err(err) => {
                shutdown.store(true, Ordering::SeqCst);
                return Err(err.into());
            }
        }
    }
}

/// Run [`read_browser_requests`] on its own thread.
///
/// The reader blocks on the input channel; running it off the poll loop's
/// thread keeps a silent browser from stalling pipe forwarding. The two
/// share nothing but the shutdown flag.
pub fn spawn_inbound_reader<R, H>(
    input: R,
    handler: H,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<Result<()>>
where
    R: Read + Send + 'static,
    H: InboundHandler + 'static,
{
    std::thread::spawn(move || read_browser_requests(input, handler, shutdown))
}
