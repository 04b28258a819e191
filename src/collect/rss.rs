// src/collect/rss.rs
//! RSS 2.0 collector (fixture string or HTTP).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use super::{normalize_text, Collector};
use crate::candidate::RawRecord;
use crate::error::CurationError;

const TITLE_MAX_CHARS: usize = 300;
const SUMMARY_MAX_CHARS: usize = 1_500;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// RFC 2822 `pubDate` → UTC. Unparseable dates become `None`.
pub fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    let parsed = OffsetDateTime::parse(ts.trim(), &Rfc2822).ok()?;
    DateTime::from_timestamp(parsed.unix_timestamp(), parsed.nanosecond())
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

pub struct RssCollector {
    name: String,
    mode: Mode,
}

impl RssCollector {
    pub fn from_fixture(name: impl Into<String>, xml: &str) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(name: impl Into<String>, url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        }
    }

    fn fetch_error(&self, message: impl Into<String>) -> CurationError {
        CurationError::SourceFetch {
            source_name: self.name.clone(),
            message: message.into(),
        }
    }

    /// Parse a feed body. Items missing a title or link are passed through so the
    /// boundary validation counts them.
    pub fn parse_items(&self, body: &str) -> Result<Vec<RawRecord>, CurationError> {
        let xml = scrub_entities_for_xml(body);
        let rss: Rss = from_str(&xml).map_err(|e| self.fetch_error(format!("rss parse: {e}")))?;

        Ok(rss
            .channel
            .items
            .into_iter()
            .map(|it| RawRecord {
                title: normalize_text(it.title.as_deref().unwrap_or_default(), TITLE_MAX_CHARS),
                summary: normalize_text(
                    it.description.as_deref().unwrap_or_default(),
                    SUMMARY_MAX_CHARS,
                ),
                content: None,
                link: it.link.unwrap_or_default().trim().to_string(),
                source_name: self.name.clone(),
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822),
            })
            .collect())
    }
}

#[async_trait]
impl Collector for RssCollector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, CurationError> {
        match &self.mode {
            Mode::Fixture(xml) => self.parse_items(xml),
            Mode::Http { url, client } => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| self.fetch_error(format!("http get: {e}")))?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(self.fetch_error(format!("http status {status}")));
                }
                let body = resp
                    .text()
                    .await
                    .map_err(|e| self.fetch_error(format!("http body: {e}")))?;
                self.parse_items(&body)
            }
        }
    }
}

/// HTML named entities are not defined in XML; replace the common ones before parsing.
fn scrub_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&laquo;", "\"")
        .replace("&raquo;", "\"")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&eacute;", "é")
        .replace("&egrave;", "è")
        .replace("&agrave;", "à")
        .replace("&ccedil;", "ç")
        .replace("&hellip;", "...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test</title>
  <item>
    <title>Canicule&nbsp;: alerte rouge à Paris</title>
    <link>https://news.example/canicule</link>
    <pubDate>Tue, 01 Jul 2025 08:30:00 +0200</pubDate>
    <description><![CDATA[<p>Les écoles ferment <b>mardi</b>.</p>]]></description>
  </item>
  <item>
    <title>Sans date</title>
    <link>https://news.example/sans-date</link>
    <pubDate>someday</pubDate>
  </item>
  <item>
    <description>no title, no link</description>
  </item>
</channel></rss>"#;

    #[tokio::test]
    async fn parses_items_and_dates() {
        let c = RssCollector::from_fixture("Le Test", FEED);
        let items = c.fetch().await.unwrap();
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].title, "Canicule : alerte rouge à Paris");
        assert_eq!(items[0].summary, "Les écoles ferment mardi .");
        assert_eq!(items[0].source_name, "Le Test");
        assert_eq!(
            items[0].published_at,
            Some(Utc.with_ymd_and_hms(2025, 7, 1, 6, 30, 0).unwrap())
        );

        assert_eq!(items[1].published_at, None);
        assert!(items[2].title.is_empty() && items[2].link.is_empty());
    }

    #[test]
    fn empty_channel_is_ok() {
        let c = RssCollector::from_fixture("x", "");
        assert!(c
            .parse_items("<rss><channel><title>t</title></channel></rss>")
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn malformed_feed_is_a_source_error() {
        let c = RssCollector::from_fixture("broken", "<rss><channel><item></channel></rss>");
        let err = c.fetch().await.unwrap_err();
        assert!(matches!(err, CurationError::SourceFetch { ref source_name, .. } if source_name == "broken"));
    }
}
