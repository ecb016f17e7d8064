//! Response decoding.
//!
//! Every mode goes through the same queued, retrying fetch and differs only
//! in what it does with a successful body. Decode failures are `BadPayload`
//! and are never retried.

pub mod feed;
pub mod html;
pub mod xml;

pub use feed::FeedItem;
pub use html::HtmlPage;
pub use xml::XmlElement;

use crate::error::{MalError, Result};
use crate::fetcher::Fetcher;
use serde::de::DeserializeOwned;

impl Fetcher {
    /// Fetch and deserialize JSON. Use `serde_json::Value` for an untyped tree.
    pub async fn load_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.load_with(url, |body| {
            serde_json::from_str(&body)
                .map_err(|e| MalError::bad_payload(url, format!("invalid JSON: {}", e)))
        })
        .await
    }

    /// Fetch and parse an XML document
    pub async fn load_xml(&self, url: &str) -> Result<XmlElement> {
        self.load_with(url, |body| {
            xml::parse_xml(&body)
                .map_err(|e| MalError::bad_payload(url, format!("invalid XML: {:#}", e)))
        })
        .await
    }

    /// Fetch an RSS or Atom feed and return its items
    pub async fn load_rss(&self, url: &str) -> Result<Vec<FeedItem>> {
        self.load_with(url, |body| {
            feed::parse_feed(&body).map_err(|e| MalError::bad_payload(url, format!("{:#}", e)))
        })
        .await
    }

    /// Fetch an HTML page
    pub async fn load_html(&self, url: &str) -> Result<HtmlPage> {
        self.load_with(url, |body| Ok(HtmlPage::parse(body))).await
    }
}
