// src/collect/feeds.rs
//! Feed list loading (`[[feeds]] name, url`).

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use super::{Collector, RssCollector};

pub const ENV_FEEDS_PATH: &str = "CURATOR_FEEDS_PATH";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedSpec {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct FeedFile {
    #[serde(default)]
    feeds: Vec<FeedSpec>,
}

/// Load feeds from an explicit path.
pub fn load_feeds_from(path: &Path) -> Result<Vec<FeedSpec>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feeds from {}", path.display()))?;
    parse_feeds(&content).with_context(|| format!("parsing feeds in {}", path.display()))
}

/// Load feeds using env var + fallback:
/// 1) $CURATOR_FEEDS_PATH (must exist)
/// 2) `fallback` if present
/// 3) no feeds
pub fn load_feeds_default(fallback: &Path) -> Result<Vec<FeedSpec>> {
    if let Ok(p) = std::env::var(ENV_FEEDS_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_FEEDS_PATH} points to non-existent path"));
        }
        return load_feeds_from(&pb);
    }
    if fallback.exists() {
        return load_feeds_from(fallback);
    }
    tracing::warn!(target: "curator::config", path = %fallback.display(), "no feed list found");
    Ok(Vec::new())
}

fn parse_feeds(s: &str) -> Result<Vec<FeedSpec>> {
    let file: FeedFile = toml::from_str(s)?;
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(file.feeds.len());
    for f in file.feeds {
        let name = f.name.trim().to_string();
        let url = f.url.trim().to_string();
        if name.is_empty() {
            return Err(anyhow!("feed with empty name ({url})"));
        }
        let parsed = Url::parse(&url).with_context(|| format!("feed `{name}` has invalid url"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!("feed `{name}` must use http(s)"));
        }
        if seen.insert(name.clone()) {
            out.push(FeedSpec { name, url });
        }
    }
    Ok(out)
}

/// One RSS collector per feed, sharing a single HTTP client.
pub fn build_collectors(feeds: &[FeedSpec], timeout_secs: u64) -> Result<Vec<Box<dyn Collector>>> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("news-curator/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .context("building http client")?;
    Ok(feeds
        .iter()
        .map(|f| {
            Box::new(RssCollector::from_url(f.name.clone(), f.url.clone(), client.clone()))
                as Box<dyn Collector>
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn parses_trims_and_dedups_by_name() {
        let toml = r#"
            [[feeds]]
            name = " Le Monde "
            url = "https://www.lemonde.fr/rss/une.xml"

            [[feeds]]
            name = "Le Monde"
            url = "https://www.lemonde.fr/rss/doublon.xml"

            [[feeds]]
            name = "France Info"
            url = "https://www.francetvinfo.fr/titres.rss"
        "#;
        let feeds = parse_feeds(toml).unwrap();
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[0].name, "Le Monde");
        assert_eq!(feeds[0].url, "https://www.lemonde.fr/rss/une.xml");
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(parse_feeds("[[feeds]]\nname = \"x\"\nurl = \"not a url\"").is_err());
        assert!(parse_feeds("[[feeds]]\nname = \"x\"\nurl = \"ftp://a.example/f\"").is_err());
        assert!(parse_feeds("[[feeds]]\nname = \"\"\nurl = \"https://a.example\"").is_err());
        assert!(parse_feeds("").unwrap().is_empty());
    }

    #[serial_test::serial]
    #[test]
    fn env_path_wins_and_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let fallback = tmp.path().join("feeds.toml");

        env::remove_var(ENV_FEEDS_PATH);
        assert!(load_feeds_default(&fallback).unwrap().is_empty());

        fs::write(&fallback, "[[feeds]]\nname = \"a\"\nurl = \"https://a.example/rss\"").unwrap();
        assert_eq!(load_feeds_default(&fallback).unwrap()[0].name, "a");

        let other = tmp.path().join("other.toml");
        fs::write(&other, "[[feeds]]\nname = \"b\"\nurl = \"https://b.example/rss\"").unwrap();
        env::set_var(ENV_FEEDS_PATH, other.display().to_string());
        assert_eq!(load_feeds_default(&fallback).unwrap()[0].name, "b");

        env::set_var(ENV_FEEDS_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(load_feeds_default(&fallback).is_err());
        env::remove_var(ENV_FEEDS_PATH);
    }

    #[test]
    fn one_collector_per_feed() {
        let feeds = vec![
            FeedSpec {
                name: "a".into(),
                url: "https://a.example/rss".into(),
            },
            FeedSpec {
                name: "b".into(),
                url: "https://b.example/rss".into(),
            },
        ];
        let collectors = build_collectors(&feeds, 10).unwrap();
        let names: Vec<&str> = collectors.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
