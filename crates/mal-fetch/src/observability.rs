//! Per-fetch outcome logging.

use crate::error::MalError;
use crate::queue::TaskQueue;
use std::time::Duration;
use tracing::{info, warn};

/// Log target for HTTP traffic, so it can be filtered on its own
pub const TARGET: &str = "mal_fetch::http";

/// Emit the single terminal log line for a fetch.
///
/// `elapsed` spans queueing, all attempts and decoding. Queue occupancy is
/// read at the moment of logging.
pub fn log_fetch<T>(
    queue: &TaskQueue,
    enabled: bool,
    url: &str,
    outcome: &Result<T, MalError>,
    elapsed: Duration,
) {
    if !enabled {
        return;
    }

    let elapsed_ms = elapsed.as_millis() as u64;
    let running = queue.running();
    let pending = queue.pending();

    match outcome {
        Ok(_) => info!(
            target: TARGET,
            url = %url,
            elapsed_ms = elapsed_ms,
            running = running,
            pending = pending,
            "ok"
        ),
        Err(e) => warn!(
            target: TARGET,
            url = %url,
            elapsed_ms = elapsed_ms,
            running = running,
            pending = pending,
            status = e.status_code,
            kind = e.kind.as_str(),
            error = %e.message,
            "request failed"
        ),
    }
}
