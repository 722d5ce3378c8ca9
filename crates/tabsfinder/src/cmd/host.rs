use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use tabsfinder_pipe::{Fifo, PipeNaming};
use tabsfinder_relay::{spawn_inbound_reader, Host, HostConfig, LogHandler};

use crate::cmd::{parse_duration, HostArgs};
use crate::exit::{pipe_error, relay_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::logging::{self, LogLevel};

pub fn run(args: HostArgs, dir: &Path, log_level: LogLevel) -> CliResult<i32> {
    let poll_interval = parse_duration(&args.poll_interval)?;

    let naming = match args.id {
        Some(id) => PipeNaming::new(dir, id),
        None => PipeNaming::for_current_process(dir),
    };

    let log_path = naming.log_path();
    logging::init_file(&log_path, log_level).map_err(|err| {
        CliError::new(
            INTERNAL,
            format!("failed to open log file {}: {err}", log_path.display()),
        )
    })?;
    info!(id = naming.id(), "starting host");

    let fifo =
        Fifo::create(naming.pipe_path()).map_err(|err| pipe_error("pipe setup failed", err))?;

    let shutdown = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(Arc::clone(&shutdown))?;

    // Browser requests arrive framed on stdin; the reader raises the
    // shutdown flag on EOF. It is daemon-like: if shutdown comes from a
    // signal instead, the thread stays blocked on stdin and process exit
    // reaps it, so it is deliberately not joined.
    let _inbound = spawn_inbound_reader(std::io::stdin(), LogHandler, Arc::clone(&shutdown));

    let mut host = Host::new(
        fifo,
        std::io::stdout(),
        HostConfig {
            poll_interval,
            ..HostConfig::default()
        },
        shutdown,
    );
    host.run().map_err(|err| relay_error("relay loop failed", err))?;

    Ok(SUCCESS)
}

fn install_ctrlc_handler(shutdown: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        shutdown.store(true, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
