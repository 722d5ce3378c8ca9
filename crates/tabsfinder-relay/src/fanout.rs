use std::io::{ErrorKind, Write};
use std::path::Path;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use tabsfinder_pipe::{discover, open_writer, PipeError};

use crate::error::Result;

/// Client fan-out knobs.
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    /// Overall bound on waiting for delivery threads.
    pub join_timeout: Duration,
    /// Interval between completion checks while waiting.
    pub join_poll: Duration,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            join_timeout: Duration::from_secs(60),
            join_poll: Duration::from_millis(100),
        }
    }
}

/// What happened to one fan-out invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// How many pipes the discovery scan found.
    pub discovered: usize,
    /// Delivery threads still running when the join deadline passed.
    pub stragglers: Vec<String>,
}

impl DeliveryReport {
    /// True when every delivery attempt finished before the deadline.
    pub fn is_complete(&self) -> bool {
        self.stragglers.is_empty()
    }
}

/// One or more delivery threads outlived the join deadline.
#[derive(Debug, thiserror::Error)]
#[error("timed out waiting on {} deliveries: {stragglers:?}", stragglers.len())]
pub struct JoinTimeout {
    /// Names of the pipes whose deliveries never finished.
    pub stragglers: Vec<String>,
}

/// Deliver one message to every currently-live host pipe under `base_dir`.
///
/// One thread per discovered pipe, each performing a single best-effort
/// open/write/close. Hosts that vanished between scan and open, or whose
/// reader closed mid-write, are skipped silently. A join timeout is logged
/// and reflected in the report, never raised — the stragglers are
/// abandoned, each holds at most one bounded syscall sequence.
///
/// An empty discovery set is a successful no-op.
pub fn deliver_all(
    base_dir: impl AsRef<Path>,
    message: &str,
    config: &FanoutConfig,
) -> Result<DeliveryReport> {
    let pipes = discover(base_dir)?;
    debug!(count = pipes.len(), "discovered host pipes");

    let mut tasks = Vec::with_capacity(pipes.len());
    for path in pipes {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = message.as_bytes().to_vec();
        let handle = std::thread::spawn(move || deliver_one(&path, &bytes));
        tasks.push((name, handle));
    }
    let discovered = tasks.len();

    let stragglers = match join_all(tasks, config.join_timeout, config.join_poll) {
        Ok(()) => Vec::new(),
        Err(timeout) => {
            warn!(%timeout, "abandoning unfinished deliveries");
            timeout.stragglers
        }
    };

    Ok(DeliveryReport {
        discovered,
        stragglers,
    })
}

/// Single best-effort delivery to one pipe. Never fails the fan-out.
fn deliver_one(path: &Path, bytes: &[u8]) {
    let mut pipe = match open_writer(path) {
        Ok(pipe) => pipe,
        Err(PipeError::NoReader { .. }) => {
            debug!(?path, "no reader on pipe; host gone since scan");
            return;
        }
        Err(err) => {
            warn!(?path, %err, "failed to open pipe for writing");
            return;
        }
    };

    let mut offset = 0usize;
    while offset < bytes.len() {
        match pipe.write(&bytes[offset..]) {
            Ok(0) => {
                warn!(?path, "pipe accepted no bytes; giving up");
                return;
            }
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                debug!(?path, "reader closed mid-write; skipping");
                return;
            }
            Err(err) => {
                warn!(?path, %err, "pipe write failed");
                return;
            }
        }
    }
    debug!(?path, len = bytes.len(), "delivered message");
}

/// Wait for every named task, bounded by `timeout`.
///
/// Polls completion every `poll` rather than blocking in `join`, so a hung
/// task cannot pin the caller past the deadline. Returns promptly once all
/// tasks finish; on timeout, names exactly the tasks still running.
/// Stragglers are not cancelled, merely no longer waited on.
pub fn join_all(
    tasks: Vec<(String, JoinHandle<()>)>,
    timeout: Duration,
    poll: Duration,
) -> std::result::Result<(), JoinTimeout> {
    let deadline = Instant::now() + timeout;
    let mut pending = tasks;

    loop {
        let mut still_running = Vec::new();
        for (name, handle) in pending {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                still_running.push((name, handle));
            }
        }
        pending = still_running;

        if pending.is_empty() {
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(JoinTimeout {
                stragglers: pending.into_iter().map(|(name, _)| name).collect(),
            });
        }
        std::thread::sleep(poll.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tabsfinder_pipe::Fifo;

    use super::*;

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tffan-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    fn bare_fifo(path: &Path) {
        use std::os::unix::ffi::OsStrExt;
        let cpath = std::ffi::CString::new(path.as_os_str().as_bytes()).unwrap();
        // A FIFO with no read side open, standing in for a crashed host.
        let rc = unsafe { libc::mkfifo(cpath.as_ptr(), 0o600) };
        assert_eq!(rc, 0, "mkfifo failed: {}", std::io::Error::last_os_error());
    }

    fn quick_config() -> FanoutConfig {
        FanoutConfig {
            join_timeout: Duration::from_secs(5),
            join_poll: Duration::from_millis(10),
        }
    }

    #[test]
    fn zero_pipes_completes_without_error() {
        let dir = unique_temp_dir("none");
        let report =
            deliver_all(&dir, "\"getAllTabs\"", &quick_config()).expect("no-op should succeed");
        assert_eq!(report.discovered, 0);
        assert!(report.is_complete());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_base_dir_completes_without_error() {
        let dir = unique_temp_dir("gone").join("never-created");
        let report =
            deliver_all(&dir, "\"getAllTabs\"", &quick_config()).expect("no-op should succeed");
        assert_eq!(report.discovered, 0);
    }

    #[test]
    fn delivers_to_live_pipe_and_skips_dead_one() {
        let dir = unique_temp_dir("race");
        let live_path = dir.join("chrometabsfinder.100.pipe");
        let dead_path = dir.join("chrometabsfinder.200.pipe");

        let mut live = Fifo::create(&live_path).expect("live fifo should be created");
        bare_fifo(&dead_path);

        let message = r#""focus {\"url\":\"*gmail.com*\"}""#;
        let report =
            deliver_all(&dir, message, &quick_config()).expect("fan-out should succeed");
        assert_eq!(report.discovered, 2);
        assert!(report.is_complete());

        let mut buf = Vec::new();
        live.read_available(&mut buf)
            .expect("live pipe should be readable");
        assert_eq!(buf, message.as_bytes());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn join_all_returns_promptly_when_tasks_finish() {
        let tasks = (0..4)
            .map(|i| {
                (
                    format!("task-{i}"),
                    std::thread::spawn(|| std::thread::sleep(Duration::from_millis(20))),
                )
            })
            .collect();

        let start = Instant::now();
        join_all(tasks, Duration::from_secs(30), Duration::from_millis(10))
            .expect("all tasks finish well before the deadline");
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "join must not wait out the full timeout"
        );
    }

    #[test]
    fn join_all_names_stragglers_on_timeout() {
        let tasks = vec![
            (
                "quick".to_string(),
                std::thread::spawn(|| std::thread::sleep(Duration::from_millis(10))),
            ),
            (
                "hung".to_string(),
                std::thread::spawn(|| std::thread::sleep(Duration::from_secs(30))),
            ),
        ];

        let start = Instant::now();
        let err = join_all(tasks, Duration::from_millis(200), Duration::from_millis(10))
            .expect_err("hung task should trip the deadline");

        assert_eq!(err.stragglers, vec!["hung".to_string()]);
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(err.to_string().contains("1 deliveries"));
    }

    #[test]
    fn join_all_with_no_tasks_is_immediate() {
        join_all(Vec::new(), Duration::from_secs(60), Duration::from_millis(100))
            .expect("empty task set should join immediately");
    }
}
