#![cfg(unix)]

use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tabsfinder_frame::{FrameError, FrameReader};
use tabsfinder_pipe::{open_writer, Fifo, PipeNaming};
use tabsfinder_relay::{
    coerce_message, deliver_all, spawn_inbound_reader, FanoutConfig, Host, HostConfig, LogHandler,
};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "tfrelay-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }

    fn wait_for_bytes(&self, timeout: Duration) -> Vec<u8> {
        let deadline = Instant::now() + timeout;
        loop {
            let contents = self.contents();
            if !contents.is_empty() {
                return contents;
            }
            assert!(Instant::now() < deadline, "no frame emitted before deadline");
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn quick_host_config() -> HostConfig {
    HostConfig {
        poll_interval: Duration::from_millis(10),
        ..HostConfig::default()
    }
}

#[test]
fn fresh_host_creates_pipe_and_relays_bare_string() {
    let dir = unique_temp_dir("fresh");
    let naming = PipeNaming::new(&dir, "501");
    let pipe_path = naming.pipe_path();
    assert!(!pipe_path.exists());

    let fifo = Fifo::create(&pipe_path).expect("host should create its pipe");
    assert!(pipe_path.exists());

    let out = SharedBuf::default();
    let mut host = Host::new(
        fifo,
        out.clone(),
        quick_host_config(),
        Arc::new(AtomicBool::new(false)),
    );
    let shutdown = host.shutdown_flag();
    let runner = std::thread::spawn(move || host.run());

    let mut writer = open_writer(&pipe_path).expect("client side should open");
    writer.write_all(b"\"getAllTabs\"").unwrap();
    drop(writer);

    let wire = out.wait_for_bytes(Duration::from_secs(5));
    shutdown.store(true, Ordering::SeqCst);
    runner
        .join()
        .expect("host thread should not panic")
        .expect("host loop should exit cleanly");

    let mut reader = FrameReader::new(Cursor::new(wire));
    let frame = reader.read_frame().expect("exactly one frame expected");
    assert_eq!(frame.as_ref(), br#"{"msg":"getAllTabs"}"#);
    assert!(matches!(
        reader.read_frame(),
        Err(FrameError::ConnectionClosed)
    ));

    assert!(!pipe_path.exists(), "pipe should be cleaned up");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn client_fanout_reaches_running_host() {
    let dir = unique_temp_dir("endtoend");
    let naming = PipeNaming::new(&dir, "502");
    let fifo = Fifo::create(naming.pipe_path()).expect("host should create its pipe");

    let out = SharedBuf::default();
    let mut host = Host::new(
        fifo,
        out.clone(),
        quick_host_config(),
        Arc::new(AtomicBool::new(false)),
    );
    let shutdown = host.shutdown_flag();
    let runner = std::thread::spawn(move || host.run());

    // The client joins argv words and wraps non-JSON text as a string.
    let message = coerce_message("focus");
    assert_eq!(message, "\"focus\"");
    let report = deliver_all(
        &dir,
        &message,
        &FanoutConfig {
            join_timeout: Duration::from_secs(5),
            join_poll: Duration::from_millis(10),
        },
    )
    .expect("fan-out should succeed");
    assert_eq!(report.discovered, 1);
    assert!(report.is_complete());

    let wire = out.wait_for_bytes(Duration::from_secs(5));
    shutdown.store(true, Ordering::SeqCst);
    runner
        .join()
        .expect("host thread should not panic")
        .expect("host loop should exit cleanly");

    let mut reader = FrameReader::new(Cursor::new(wire));
    let frame = reader.read_frame().expect("one frame expected");
    assert_eq!(frame.as_ref(), br#"{"msg":"focus"}"#);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn browser_channel_eof_stops_host_and_removes_pipe() {
    let dir = unique_temp_dir("eof");
    let naming = PipeNaming::new(&dir, "503");
    let pipe_path = naming.pipe_path();
    let fifo = Fifo::create(&pipe_path).expect("host should create its pipe");

    let mut host = Host::new(
        fifo,
        SharedBuf::default(),
        quick_host_config(),
        Arc::new(AtomicBool::new(false)),
    );
    let shutdown = host.shutdown_flag();

    // Browser closes its end immediately: zero bytes where a length prefix
    // should be.
    let inbound = spawn_inbound_reader(
        Cursor::new(Vec::<u8>::new()),
        LogHandler,
        Arc::clone(&shutdown),
    );

    let result = host.run();
    drop(host);
    result.expect("EOF is a clean shutdown");
    inbound
        .join()
        .expect("inbound thread should not panic")
        .expect("EOF is a clean exit");

    assert!(!pipe_path.exists(), "pipe should be removed after shutdown");
    let _ = std::fs::remove_dir_all(&dir);
}
