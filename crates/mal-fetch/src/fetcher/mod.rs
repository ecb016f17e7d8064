//! Retrying HTTP fetcher.
//!
//! Every request goes through the shared [`TaskQueue`](crate::queue::TaskQueue)
//! and is retried on rate limiting, mirror unavailability and transient
//! network failures.

pub mod client;
pub mod retry;

pub use client::{Fetcher, HeadInfo};
pub use retry::{AttemptFailure, RetryDecision, MIRROR_UNAVAILABLE_FLOOR};
