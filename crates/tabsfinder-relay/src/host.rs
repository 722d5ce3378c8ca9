use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use tabsfinder_frame::{FrameConfig, FrameWriter};
use tabsfinder_pipe::Fifo;

use crate::envelope::Envelope;
use crate::error::Result;

/// Host behavior knobs.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Sleep between pipe polls when nothing is pending. Bounds CPU usage
    /// while keeping forwarding latency low.
    pub poll_interval: Duration,
    /// Framing limits for the browser channel.
    pub frame: FrameConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            frame: FrameConfig::default(),
        }
    }
}

/// One relay host: owns a FIFO, forwards its payloads to the browser as
/// framed envelopes.
///
/// The output channel is generic so tests can capture frames in memory;
/// production hands in stdout. Dropping the host (any exit path) removes
/// the pipe file via the [`Fifo`] guard.
pub struct Host<W: Write> {
    fifo: Fifo,
    out: FrameWriter<W>,
    poll_interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl<W: Write> Host<W> {
    /// Build a host over an already-created FIFO and an output channel.
    pub fn new(fifo: Fifo, out: W, config: HostConfig, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            fifo,
            out: FrameWriter::with_config(out, config.frame),
            poll_interval: config.poll_interval,
            shutdown,
        }
    }

    /// The shutdown flag this host polls.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the polling loop until the shutdown flag is raised.
    ///
    /// Per-message failures (malformed payloads) never end the loop; only
    /// shutdown or an unexpected I/O error does.
    pub fn run(&mut self) -> Result<()> {
        info!(pipe = ?self.fifo.path(), "host relay started");
        while !self.shutdown.load(Ordering::SeqCst) {
            if !self.poll_once()? {
                std::thread::sleep(self.poll_interval);
            }
        }
        info!("host relay stopped");
        Ok(())
    }

    /// One non-blocking poll: drain the pipe and forward if anything was
    /// pending. Returns whether a payload was read.
    pub fn poll_once(&mut self) -> Result<bool> {
        let mut buf = Vec::new();
        let read = self.fifo.read_available(&mut buf)?;
        if read == 0 {
            return Ok(false);
        }
        self.forward(&buf)?;
        Ok(true)
    }

    /// Parse one pipe payload and emit it as a framed envelope.
    ///
    /// The whole buffer is treated as a single JSON document. Parse
    /// failures are logged and swallowed; nothing malformed ever reaches
    /// the browser channel.
    fn forward(&mut self, raw: &[u8]) -> Result<()> {
        let text = match std::str::from_utf8(raw) {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, len = raw.len(), "dropping non-UTF-8 pipe payload");
                return Ok(());
            }
        };

        match Envelope::parse(text) {
            Ok(envelope) => {
                let bytes = match envelope.to_bytes() {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        warn!(%err, "failed to serialize envelope; dropping");
                        return Ok(());
                    }
                };
                self.out.send(&bytes)?;
                debug!(payload = text, "forwarded message to browser");
            }
            Err(err) => {
                warn!(payload = text, %err, "dropping malformed payload");
            }
        }
        Ok(())
    }
}
