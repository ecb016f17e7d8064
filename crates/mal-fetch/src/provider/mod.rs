//! Data provider contract.
//!
//! A provider turns MyAnimeList pages (or a mirror's API) into the values in
//! [`types`]. Implementations hold a [`Fetcher`] and do all network access
//! through it, so they share its queue, retry policy and logging.

pub mod types;

pub use types::*;

use crate::error::Result;
use crate::fetcher::Fetcher;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Capability set every MyAnimeList data source implements.
///
/// "Does not exist" is a value (`None`, `LoginLookup::Unknown`), not an
/// error; errors are reserved for fetch and decode failures.
#[async_trait]
pub trait MalDataProvider: Send + Sync {
    /// Fetcher all requests must go through
    fn fetcher(&self) -> &Fetcher;

    /// Change how many requests may run at once
    fn set_queue_concurrent_size(&self, size: usize) {
        self.fetcher().queue().resize(size);
    }

    /// Whether the provider's queue has room for more work
    fn can_add_more_to_queue(&self) -> bool {
        self.fetcher().queue().can_accept_more()
    }

    async fn user_id_to_login(&self, user_id: u64) -> Result<LoginLookup>;

    /// When the user's list was last updated
    async fn last_user_list_update(&self, login: &str) -> Result<Option<DateTime<Utc>>>;

    async fn profile_info(&self, login: &str) -> Result<Option<ProfileInfo>>;

    async fn user_social_info(&self, login: &str) -> Result<Option<SocialInfo>>;

    /// `alt_json` selects the alternate JSON list endpoint
    async fn user_list(&self, login: &str, alt_json: bool) -> Result<Option<UserList>>;

    /// Rough upper bound of current anime ids, optionally scoped to a season page
    async fn approx_max_anime_id(&self, season_url: Option<&str>) -> Result<u32>;

    /// Genre id to name
    async fn genres(&self) -> Result<BTreeMap<u32, String>>;

    async fn anime_info(&self, anime_id: u32) -> Result<Option<AnimeInfo>>;

    /// Recommended anime id to recommendation weight
    async fn anime_userrecs(&self, anime_id: u32) -> Result<BTreeMap<u32, u32>>;

    /// Club id to member count
    async fn scan_clubs(&self) -> Result<BTreeMap<u32, ClubSummary>>;

    async fn club_info(&self, club_id: u32) -> Result<Option<ClubInfo>>;
}
