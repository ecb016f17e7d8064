//! Values returned by data providers.
//!
//! Field names serialize in camelCase to match the API payloads consumers
//! already parse.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of resolving a numeric user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum LoginLookup {
    Found(String),
    /// No user with this id
    Unknown,
    /// The user exists but the page could not be parsed
    Unparseable,
}

impl From<LoginLookup> for Option<String> {
    fn from(lookup: LoginLookup) -> Self {
        match lookup {
            LoginLookup::Found(login) => Some(login),
            LoginLookup::Unknown => None,
            LoginLookup::Unparseable => Some(String::new()),
        }
    }
}

impl From<Option<String>> for LoginLookup {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(login) if login.is_empty() => LoginLookup::Unparseable,
            Some(login) => LoginLookup::Found(login),
            None => LoginLookup::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[serde(rename = "Non-Binary")]
    NonBinary,
}

/// Public profile of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInfo {
    pub id: u64,
    pub login: String,
    pub joined_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    /// Favorite anime ids
    pub favs: Vec<u32>,
    pub friends_logins: Vec<String>,
    pub clubs_ids: Vec<u32>,
}

/// Social subset of a profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialInfo {
    pub friends_logins: Vec<String>,
    pub clubs_ids: Vec<u32>,
}

/// A user's anime list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserList {
    /// Anime id to score (1-10)
    pub ratings: BTreeMap<u32, u8>,
    pub list_updated: Option<DateTime<Utc>>,
    /// Anime on the list without a score
    pub unrated_anime_ids_in_list: Vec<u32>,
}

/// Anime metadata and its graph edges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeInfo {
    pub id: u32,
    pub name: String,
    /// TV, OVA, Movie, Special, ONA, ...
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub genres: Vec<u32>,
    /// Related anime id to relation label (Sequel, Prequel, Side story, ...)
    pub rels: BTreeMap<u32, String>,
    /// Recommended anime id to number of recommending users
    pub recs: BTreeMap<u32, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubSummary {
    pub members_cnt: u32,
}

/// A club with its anime and members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub club_type: Option<String>,
    pub anime_ids: Vec<u32>,
    pub members_logins: Vec<String>,
}
