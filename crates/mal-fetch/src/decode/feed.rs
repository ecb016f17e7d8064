//! Syndication feeds (RSS 2.0, with Atom as fallback).

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One entry of a feed, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub title: String,
    pub link: Option<String>,
    /// Stable identifier: guid, else link, else title
    pub guid: String,
    pub published: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

/// Parse a feed body into its items
pub fn parse_feed(content: &str) -> Result<Vec<FeedItem>> {
    let rss_err = match parse_as_rss(content) {
        Ok(items) => return Ok(items),
        Err(e) => e,
    };
    match parse_as_atom(content) {
        Ok(items) => Ok(items),
        Err(atom_err) => bail!(
            "not a valid feed (RSS: {}; Atom: {})",
            rss_err,
            atom_err
        ),
    }
}

fn parse_as_rss(content: &str) -> Result<Vec<FeedItem>> {
    let channel = rss::Channel::read_from(content.as_bytes()).map_err(|e| anyhow!("{}", e))?;

    let items = channel
        .items()
        .iter()
        .map(|item| {
            let title = item.title().unwrap_or("").to_string();
            let link = item.link().map(str::to_string);
            let guid = item
                .guid()
                .map(|g| g.value().to_string())
                .or_else(|| link.clone())
                .unwrap_or_else(|| title.clone());
            let published = item.pub_date().and_then(|date| {
                DateTime::parse_from_rfc2822(date)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            });

            FeedItem {
                title,
                link,
                guid,
                published,
                description: item.description().map(str::to_string),
            }
        })
        .collect();

    Ok(items)
}

fn parse_as_atom(content: &str) -> Result<Vec<FeedItem>> {
    let feed = atom_syndication::Feed::read_from(content.as_bytes()).map_err(|e| anyhow!("{}", e))?;

    let items = feed
        .entries()
        .iter()
        .map(|entry| {
            let published = entry
                .published()
                .unwrap_or_else(|| entry.updated())
                .with_timezone(&Utc);
            let description = entry
                .summary()
                .map(|s| s.as_str().to_string())
                .or_else(|| entry.content().and_then(|c| c.value().map(str::to_string)));

            FeedItem {
                title: entry.title().as_str().to_string(),
                link: entry.links().first().map(|l| l.href().to_string()),
                guid: entry.id().to_string(),
                published: Some(published),
                description,
            }
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECENT_ANIME_RSS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0">
  <channel>
    <title>someone's Recent Anime</title>
    <link>https://myanimelist.net/profile/someone</link>
    <description>Latest updates</description>
    <item>
      <title>Cowboy Bebop - TV</title>
      <link>https://myanimelist.net/anime/1/Cowboy_Bebop</link>
      <guid>https://myanimelist.net/anime/1/Cowboy_Bebop</guid>
      <description><![CDATA[Completed - 26 of 26 episodes]]></description>
      <pubDate>Sat, 01 Jun 2019 10:20:30 -0700</pubDate>
    </item>
    <item>
      <title>Trigun - TV</title>
      <link>https://myanimelist.net/anime/6/Trigun</link>
      <description>Watching - 3 of 26 episodes</description>
    </item>
  </channel>
</rss>"#;

    const ATOM_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>News</title>
  <id>urn:mal:news</id>
  <updated>2019-06-01T10:00:00Z</updated>
  <entry>
    <title>Season announced</title>
    <id>urn:mal:news:1</id>
    <updated>2019-06-01T10:00:00Z</updated>
    <link href="https://myanimelist.net/news/1"/>
    <summary>Details inside</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parses_rss_items_in_order() {
        let items = parse_feed(RECENT_ANIME_RSS).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "Cowboy Bebop - TV");
        assert_eq!(
            items[0].description.as_deref(),
            Some("Completed - 26 of 26 episodes")
        );
        let published = items[0].published.unwrap();
        assert_eq!(published.to_rfc3339(), "2019-06-01T17:20:30+00:00");

        // No guid: falls back to link
        assert_eq!(items[1].guid, "https://myanimelist.net/anime/6/Trigun");
        assert!(items[1].published.is_none());
    }

    #[test]
    fn test_falls_back_to_atom() {
        let items = parse_feed(ATOM_FEED).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].guid, "urn:mal:news:1");
        assert_eq!(items[0].link.as_deref(), Some("https://myanimelist.net/news/1"));
        assert_eq!(items[0].description.as_deref(), Some("Details inside"));
        assert!(items[0].published.is_some());
    }

    #[test]
    fn test_rejects_non_feeds() {
        assert!(parse_feed("").is_err());
        assert!(parse_feed("{\"not\": \"a feed\"}").is_err());
        assert!(parse_feed("<html><body>Maintenance</body></html>").is_err());
    }
}
