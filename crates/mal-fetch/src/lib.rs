//! Request queueing, retry and decoding engine for MyAnimeList data.
//!
//! This library provides a bounded request queue, a fetcher that retries
//! rate-limited and transiently failing requests, decoders for JSON, XML,
//! feeds and HTML, and the contract data providers implement on top of it.

pub mod decode;
pub mod error;
pub mod fetcher;
pub mod observability;
pub mod provider;
pub mod queue;

pub use decode::{FeedItem, HtmlPage, XmlElement};
pub use error::{ErrorKind, MalError, Result};
pub use fetcher::{Fetcher, HeadInfo};
pub use provider::{LoginLookup, MalDataProvider};
pub use queue::TaskQueue;
