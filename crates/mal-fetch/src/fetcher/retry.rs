//! Retry classification and delay policy.
//!
//! Both are pure functions so the policy can be tested without a network.

use rand::Rng;
use reqwest::StatusCode;
use shared::{EndpointKind, RetryDelay};
use std::error::Error as StdError;
use std::time::Duration;

/// Minimum wait after a mirror answers 503
pub const MIRROR_UNAVAILABLE_FLOOR: Duration = Duration::from_millis(30_000);

/// Why one attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The server answered with something other than 200
    Status(StatusCode),
    /// No usable response; `transient` marks unreachable hosts and
    /// temporary DNS failures
    Transport { transient: bool, message: String },
}

impl AttemptFailure {
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        AttemptFailure::Transport {
            transient: is_transient_network_error(err),
            message: err.to_string(),
        }
    }
}

/// Outcome of classifying a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Terminal,
    /// Retry, waiting at least `floor` if set
    Retry { floor: Option<Duration> },
}

/// Decide whether a failed attempt may be retried
pub fn classify(failure: &AttemptFailure, endpoint: EndpointKind) -> RetryDecision {
    match failure {
        AttemptFailure::Status(status) if *status == StatusCode::TOO_MANY_REQUESTS => {
            RetryDecision::Retry { floor: None }
        }
        AttemptFailure::Status(status)
            if *status == StatusCode::SERVICE_UNAVAILABLE && endpoint == EndpointKind::Mirror =>
        {
            RetryDecision::Retry {
                floor: Some(MIRROR_UNAVAILABLE_FLOOR),
            }
        }
        AttemptFailure::Transport { transient: true, .. } => RetryDecision::Retry { floor: None },
        _ => RetryDecision::Terminal,
    }
}

/// Delay before the next attempt.
///
/// A fixed policy is used as is; a range draws `min + uniform * (max - min)`
/// in whole milliseconds. The result is raised to `floor` when that is larger.
pub fn next_delay<R: Rng>(
    policy: &RetryDelay,
    floor: Option<Duration>,
    rng: &mut R,
) -> Duration {
    let millis = match *policy {
        RetryDelay::Fixed(ms) => ms,
        RetryDelay::Range(min, max) if max > min => rng.gen_range(min..max),
        RetryDelay::Range(min, _) => min,
    };
    let delay = Duration::from_millis(millis);
    match floor {
        Some(floor) => delay.max(floor),
        None => delay,
    }
}

/// Host-unreachable and temporary DNS failures are worth another try;
/// refused connections, TLS errors and timeouts are not.
fn is_transient_network_error(err: &(dyn StdError + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::HostUnreachable {
                return true;
            }
        }
        if is_temporary_dns_failure(&cause.to_string()) {
            return true;
        }
        source = cause.source();
    }
    false
}

/// getaddrinfo's EAI_AGAIN, as rendered by the resolver
fn is_temporary_dns_failure(message: &str) -> bool {
    message
        .to_ascii_lowercase()
        .contains("temporary failure in name resolution")
}
