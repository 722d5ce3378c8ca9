use std::path::Path;

use tracing::{debug, warn};

use tabsfinder_relay::{coerce_message, deliver_all, FanoutConfig};

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: SendArgs, dir: &Path) -> CliResult<i32> {
    let join_timeout = parse_duration(&args.timeout)?;
    let message = coerce_message(&args.message.join(" "));

    let config = FanoutConfig {
        join_timeout,
        ..FanoutConfig::default()
    };

    // Best effort: partial failures and timeouts are logged, never turned
    // into a non-zero exit.
    match deliver_all(dir, &message, &config) {
        Ok(report) => {
            if report.is_complete() {
                debug!(
                    discovered = report.discovered,
                    "all deliveries finished"
                );
            } else {
                warn!(
                    unfinished = report.stragglers.len(),
                    stragglers = ?report.stragglers,
                    "gave up waiting on some deliveries"
                );
            }
        }
        Err(err) => {
            warn!(%err, "pipe discovery failed; nothing delivered");
        }
    }

    Ok(SUCCESS)
}
