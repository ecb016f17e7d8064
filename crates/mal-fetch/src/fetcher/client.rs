//! Queued HTTP client with retry logic.

use super::retry::{self, AttemptFailure, RetryDecision};
use crate::error::{ErrorKind, MalError, Result};
use crate::observability;
use crate::queue::TaskQueue;
use anyhow::Context;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use shared::FetcherConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;

/// Metadata returned by a HEAD request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadInfo {
    /// URL after redirects
    pub url: String,
    pub status: u16,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
}

/// MyAnimeList fetcher: one shared queue, one HTTP client, one retry policy
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    queue: TaskQueue,
    options: Arc<FetcherConfig>,
}

impl Fetcher {
    /// Create a fetcher with its own HTTP client
    pub fn new(options: FetcherConfig) -> anyhow::Result<Self> {
        options.validate().context("Invalid fetcher configuration")?;

        let mut builder = Client::builder().timeout(Duration::from_secs(options.request_timeout_secs));
        if let Some(user_agent) = &options.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self::with_client(client, options))
    }

    /// Create a fetcher around an existing HTTP client
    pub fn with_client(client: Client, options: FetcherConfig) -> Self {
        let queue = TaskQueue::new(options.max_concurrent, options.max_queue_depth);
        Self {
            client,
            queue,
            options: Arc::new(options),
        }
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn options(&self) -> &FetcherConfig {
        &self.options
    }

    /// Fetch a URL and return the raw body
    pub async fn load_url(&self, url: &str) -> Result<String> {
        self.load_with(url, Ok).await
    }

    /// Fetch a URL and decode the body with `decode`.
    ///
    /// The task keeps its queue slot across every attempt and the decode
    /// step. Elapsed time starts when the slot is granted, so backlog wait
    /// is not counted, and is reported on a single log line written while
    /// the slot is still held.
    pub async fn load_with<T, D>(&self, url: &str, decode: D) -> Result<T>
    where
        D: FnOnce(String) -> Result<T>,
    {
        let task = self.queue.enqueue(async move {
            let started = Instant::now();
            let outcome = get_with_retry(&self.client, &self.options, url)
                .await
                .and_then(decode);
            self.log(url, &outcome, started.elapsed());
            outcome
        });

        match task {
            Ok(task) => task.await,
            Err(e) => self.refused(url, e),
        }
    }

    /// Issue a queued HEAD request. HEAD requests are never retried.
    pub async fn head_url(&self, url: &str) -> Result<HeadInfo> {
        let task = self.queue.enqueue(async move {
            let started = Instant::now();
            let outcome = head_once(&self.client, url).await;
            self.log(url, &outcome, started.elapsed());
            outcome
        });

        match task {
            Ok(task) => task.await,
            Err(e) => self.refused(url, e),
        }
    }

    fn log<T>(&self, url: &str, outcome: &Result<T>, elapsed: Duration) {
        observability::log_fetch(&self.queue, self.options.log_http, url, outcome, elapsed);
    }

    /// Admission failed; nothing was sent
    fn refused<T>(&self, url: &str, err: MalError) -> Result<T> {
        let outcome = Err(err.with_url(url));
        self.log(url, &outcome, Duration::ZERO);
        outcome
    }
}

async fn get_with_retry(client: &Client, options: &FetcherConfig, url: &str) -> Result<String> {
    let mut retry: Option<u32> = None;

    loop {
        let failure = match get_once(client, url).await {
            Ok(body) => return Ok(body),
            Err(failure) => failure,
        };

        let next_retry = retry.map_or(0, |r| r + 1);
        match retry::classify(&failure, options.endpoint) {
            RetryDecision::Retry { floor } if next_retry < options.max_retries => {
                let delay = retry::next_delay(&options.retry_delay, floor, &mut rand::thread_rng());
                if options.log_http {
                    debug!(
                        target: observability::TARGET,
                        url = %url,
                        retry = next_retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retry #{} after {}ms",
                        next_retry + 1,
                        delay.as_millis()
                    );
                }
                sleep(delay).await;
                retry = Some(next_retry);
            }
            _ => return Err(into_error(failure, url)),
        }
    }
}

async fn get_once(client: &Client, url: &str) -> std::result::Result<String, AttemptFailure> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AttemptFailure::from_reqwest(&e))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(AttemptFailure::Status(status));
    }

    response
        .text()
        .await
        .map_err(|e| AttemptFailure::from_reqwest(&e))
}

async fn head_once(client: &Client, url: &str) -> Result<HeadInfo> {
    let response = client
        .head(url)
        .send()
        .await
        .map_err(|e| into_error(AttemptFailure::from_reqwest(&e), url))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(MalError::from_status(status, url));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let content_length = response
        .headers()
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());

    Ok(HeadInfo {
        url: response.url().to_string(),
        status: status.as_u16(),
        content_length,
        content_type,
    })
}

/// Strip an attempt failure down to what callers see
fn into_error(failure: AttemptFailure, url: &str) -> MalError {
    match failure {
        AttemptFailure::Status(status) => MalError::from_status(status, url),
        AttemptFailure::Transport { transient, message } => {
            let kind = if transient {
                ErrorKind::TransportTransient
            } else {
                ErrorKind::NonOkStatus
            };
            MalError::new(message, 0, Some(url.to_string()), kind)
        }
    }
}
