// tests/config_load.rs
//
// Config resolution: shipped file vs built-in seed, env path, env overrides.

use std::{env, fs};

use news_curator::config::{
    parse_daily_cap, CurationConfig, StrategyKind, ENV_CONFIG_PATH, ENV_DAILY_CAP,
    ENV_MIN_RULE_SCORE, ENV_PER_RUN_CAP, ENV_QUALITY_THRESHOLD,
};
use news_curator::CurationError;

const OVERRIDES: [&str; 4] = [
    ENV_QUALITY_THRESHOLD,
    ENV_PER_RUN_CAP,
    ENV_DAILY_CAP,
    ENV_MIN_RULE_SCORE,
];

fn clear_env() {
    env::remove_var(ENV_CONFIG_PATH);
    for k in OVERRIDES {
        env::remove_var(k);
    }
}

#[test]
fn shipped_config_matches_builtin_seed() {
    let shipped = CurationConfig::from_path(std::path::Path::new("config/curation.toml")).unwrap();
    let seed = CurationConfig::default();

    assert_eq!(shipped.scoring.high_relevance, seed.scoring.high_relevance);
    assert_eq!(shipped.scoring.medium_relevance, seed.scoring.medium_relevance);
    assert_eq!(shipped.scoring.national_terms, seed.scoring.national_terms);
    assert_eq!(shipped.scoring.boosts.breaking, seed.scoring.boosts.breaking);
    assert_eq!(shipped.scoring.boosts.geopolitical, seed.scoring.boosts.geopolitical);
    assert_eq!(shipped.topics, seed.topics);
    assert_eq!(shipped.markers.location, seed.markers.location);
    assert_eq!(shipped.markers.urgency, seed.markers.urgency);
    assert_eq!(shipped.source_trust, seed.source_trust);
    assert_eq!(shipped.selection.bucketed.buckets, seed.selection.bucketed.buckets);
    assert_eq!(shipped.selection.strategy, StrategyKind::Diversity);
    assert!(!shipped.enrichment.enabled);
}

#[serial_test::serial]
#[test]
fn env_path_and_overrides_apply() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("curation.toml");
    fs::write(
        &path,
        r#"
[selection]
strategy = "bucketed"
quality_threshold = 5.5

[selection.bucketed]
per_run_cap = 8
daily_cap = 40
"#,
    )
    .unwrap();

    env::set_var(ENV_CONFIG_PATH, path.display().to_string());
    let cfg = CurationConfig::from_toml().unwrap();
    assert_eq!(cfg.selection.strategy, StrategyKind::Bucketed);
    assert_eq!(cfg.selection.quality_threshold, 5.5);
    assert_eq!(cfg.selection.bucketed.per_run_cap, 8);
    assert_eq!(cfg.selection.bucketed.daily_cap, Some(40));

    env::set_var(ENV_QUALITY_THRESHOLD, "6.5");
    env::set_var(ENV_PER_RUN_CAP, "3");
    env::set_var(ENV_DAILY_CAP, "unlimited");
    env::set_var(ENV_MIN_RULE_SCORE, "14");
    let cfg = CurationConfig::from_toml().unwrap();
    assert_eq!(cfg.selection.quality_threshold, 6.5);
    assert_eq!(cfg.selection.bucketed.per_run_cap, 3);
    assert_eq!(cfg.selection.bucketed.daily_cap, None);
    assert_eq!(cfg.selection.bucketed.min_rule_score, 14.0);

    clear_env();
}

#[serial_test::serial]
#[test]
fn bad_env_values_are_configuration_errors() {
    clear_env();
    env::set_var(ENV_PER_RUN_CAP, "many");
    let err = CurationConfig::from_toml().unwrap_err();
    assert!(matches!(err, CurationError::Configuration(_)));
    assert!(err.is_fatal());

    clear_env();
    env::set_var(ENV_QUALITY_THRESHOLD, "11");
    assert!(CurationConfig::from_toml().is_err(), "threshold outside 0..=10");

    clear_env();
    env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
    assert!(CurationConfig::from_toml().is_err());
    clear_env();
}

#[serial_test::serial]
#[test]
fn explicit_path_validates_after_env_overrides() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("curation.toml");
    fs::write(&path, "[selection]\nquality_threshold = 5.0\n").unwrap();

    env::set_var(ENV_QUALITY_THRESHOLD, "7.5");
    let cfg = CurationConfig::from_path_with_env(&path).unwrap();
    assert_eq!(cfg.selection.quality_threshold, 7.5);

    // the file alone is fine; the override pushes it out of range
    env::set_var(ENV_QUALITY_THRESHOLD, "12");
    assert_eq!(
        CurationConfig::from_path(&path).unwrap().selection.quality_threshold,
        5.0
    );
    let err = CurationConfig::from_path_with_env(&path).unwrap_err();
    assert!(matches!(err, CurationError::Configuration(_)));
    clear_env();
}

#[test]
fn daily_cap_spellings() {
    for unlimited in ["", "0", "none", "Unlimited", " NONE "] {
        assert_eq!(parse_daily_cap(unlimited).unwrap(), None, "{unlimited:?}");
    }
    assert_eq!(parse_daily_cap("25").unwrap(), Some(25));
    assert!(parse_daily_cap("-1").is_err());
}

#[test]
fn invalid_documents_are_rejected() {
    let cases = [
        "[scoring]\nmedium_relevance = []\n",
        "[publish]\nrolling_cap = 0\n",
        "[publish]\nrolling_cap = 1001\n",
        "[scoring.practical.patterns]\nmoney = \"([unclosed\"\n",
        "[dedup]\ntoken_weight = 0.9\ntopic_weight = 0.3\nthreshold = 0.7\n",
        "not toml at all = = =",
    ];
    for doc in cases {
        let err = CurationConfig::from_toml_str(doc).unwrap_err();
        assert!(matches!(err, CurationError::Configuration(_)), "{doc}");
    }
}
