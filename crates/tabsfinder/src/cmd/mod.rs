use std::path::Path;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::logging::{self, LogFormat, LogLevel};
use crate::output::OutputFormat;

pub mod host;
pub mod list;
pub mod send;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a relay host: bridge one named pipe to the browser over stdio.
    Host(HostArgs),
    /// Deliver a message to every running host.
    Send(SendArgs),
    /// Show the currently discoverable host pipes.
    List(ListArgs),
}

pub fn run(
    command: Command,
    dir: &Path,
    format: OutputFormat,
    log_format: LogFormat,
    log_level: LogLevel,
) -> CliResult<i32> {
    match command {
        // The host logs to its own file; stdout is the browser protocol.
        Command::Host(args) => host::run(args, dir, log_level),
        Command::Send(args) => {
            logging::init_stderr(log_format, log_level);
            send::run(args, dir)
        }
        Command::List(args) => {
            logging::init_stderr(log_format, log_level);
            list::run(args, dir, format)
        }
    }
}

#[derive(Args, Debug)]
pub struct HostArgs {
    /// Instance identifier used in pipe and log file names.
    /// Defaults to the process id.
    #[arg(long, value_name = "ID")]
    pub id: Option<String>,
    /// Sleep between pipe polls (e.g. 500ms, 1s).
    #[arg(long, default_value = "500ms")]
    pub poll_interval: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Message words; joined with single spaces. If the result is not
    /// valid JSON it is sent as a JSON string literal.
    #[arg(value_name = "MESSAGE")]
    pub message: Vec<String>,
    /// Overall bound on waiting for deliveries (e.g. 60s, 500ms).
    #[arg(long, default_value = "60s")]
    pub timeout: String,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
