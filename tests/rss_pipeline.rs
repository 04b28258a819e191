// tests/rss_pipeline.rs
//
// Fixture feed through collection and curation, without network access.

use chrono::{TimeZone, Utc};
use std::collections::HashMap;

use news_curator::collect::{collect_all, Collector, RssCollector};
use news_curator::config::CollectConfig;
use news_curator::{CurationConfig, CurationEngine};

const FEED: &str = include_str!("fixtures/le_test.xml");

#[tokio::test]
async fn fixture_feed_is_collected_and_curated() {
    let collectors: Vec<Box<dyn Collector>> = vec![Box::new(RssCollector::from_fixture("Le Test", FEED))];
    let collected = collect_all(&collectors, &CollectConfig::default()).await;

    assert_eq!(collected.fetched, 7);
    assert_eq!(collected.rejected_by_validation, 2, "untitled + javascript link");
    assert_eq!(collected.source_errors, 0);
    assert_eq!(collected.candidates.len(), 5);
    assert_eq!(
        collected.candidates[0].published_at,
        Some(Utc.with_ymd_and_hms(2025, 7, 1, 4, 0, 0).unwrap())
    );
    assert!(!collected.candidates[0].summary.contains('<'));

    let cfg = CurationConfig::default();
    let engine = CurationEngine::new(&cfg).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap();
    let curation = engine.curate(collected.candidates, &[], HashMap::new(), None, now);

    let links: Vec<&str> = curation
        .selected
        .iter()
        .map(|c| c.link.trim_start_matches("https://news.example/"))
        .collect();
    assert!(links.contains(&"greve-sncf"), "{links:?}");
    assert!(links.contains(&"smic"), "{links:?}");
    assert!(!links.contains(&"chat"), "{links:?}");
    let heat = links.iter().filter(|l| l.starts_with("canicule")).count();
    assert_eq!(heat, 1, "{links:?}");

    assert_eq!(curation.report.rejected_by_dedup, 1);
    assert!(curation.report.rejected_by_score >= 1);
    assert_eq!(curation.report.selection.as_ref().unwrap().strategy, "diversity");
}

#[tokio::test]
async fn broken_feed_is_isolated() {
    let collectors: Vec<Box<dyn Collector>> = vec![
        Box::new(RssCollector::from_fixture("broken", "<rss><channel><item></channel></rss>")),
        Box::new(RssCollector::from_fixture("Le Test", FEED)),
    ];
    let collected = collect_all(&collectors, &CollectConfig::default()).await;
    assert_eq!(collected.source_errors, 1);
    assert_eq!(collected.candidates.len(), 5);
}
