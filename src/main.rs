//! news-curator: binary entrypoint.
//!
//! `run` performs one curation run and prints the run report as JSON,
//! `serve` exposes the published snapshot read-only over HTTP,
//! `score` prints the score breakdown of a single headline.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_curator::api::{self, AppState};
use news_curator::collect::{build_collectors, load_feeds_default};
use news_curator::config::{CurationConfig, StrategyKind};
use news_curator::enrichment::build_service;
use news_curator::metrics::Metrics;
use news_curator::scoring::Scorer;
use news_curator::Curator;

#[derive(Parser, Debug)]
#[command(name = "news-curator", version, about = "Curate news feeds into a bounded, diverse published batch")]
struct Cli {
    /// Curation config (TOML). Defaults to $CURATOR_CONFIG_PATH, then config/curation.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One curation run: collect, select, enhance, publish.
    Run {
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Diversity strategy target count.
        #[arg(long)]
        target: Option<usize>,
        #[arg(long)]
        max_per_topic: Option<usize>,
        #[arg(long)]
        quality_threshold: Option<f64>,
        #[arg(long)]
        per_run_cap: Option<usize>,
        /// 0 means unlimited.
        #[arg(long)]
        daily_cap: Option<usize>,
        /// Skip the enrichment service entirely.
        #[arg(long)]
        no_enrichment: bool,
    },
    /// Serve the published snapshot, backlog and /metrics.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
    },
    /// Score one headline and print the breakdown.
    Score {
        text: String,
        #[arg(long, default_value = "")]
        source: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Diversity,
    Bucketed,
}

impl From<StrategyArg> for StrategyKind {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::Diversity => StrategyKind::Diversity,
            StrategyArg::Bucketed => StrategyKind::Bucketed,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_curator=info,warn"));
    let json = std::env::var("CURATOR_LOG_JSON").is_ok_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<CurationConfig> {
    let cfg = match path {
        Some(p) => CurationConfig::from_path_with_env(p)?,
        None => CurationConfig::from_toml()?,
    };
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let mut cfg = load_config(cli.config.as_ref()).context("loading curation config")?;

    match cli.command {
        Command::Run {
            strategy,
            target,
            max_per_topic,
            quality_threshold,
            per_run_cap,
            daily_cap,
            no_enrichment,
        } => {
            let sel = &mut cfg.selection;
            if let Some(s) = strategy {
                sel.strategy = s.into();
            }
            if let Some(n) = target {
                sel.target_count = n;
            }
            if let Some(n) = max_per_topic {
                sel.max_per_topic = n;
            }
            if let Some(q) = quality_threshold {
                sel.quality_threshold = q;
            }
            if let Some(n) = per_run_cap {
                sel.bucketed.per_run_cap = n;
            }
            if let Some(n) = daily_cap {
                sel.bucketed.daily_cap = (n > 0).then_some(n);
            }
            if no_enrichment {
                cfg.enrichment.enabled = false;
            }
            cfg.validate().context("validating command-line overrides")?;

            let feeds = load_feeds_default(&cfg.collect.feeds_path)?;
            let collectors = build_collectors(&feeds, cfg.collect.timeout_secs)?;
            let service = build_service(&cfg.enrichment)?;
            let curator = Curator::new(cfg, collectors, service)?;

            let report = curator.run_once(Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Serve { addr } => {
            let metrics = Metrics::init()?;
            let state = AppState::new(&cfg)?;
            let app = api::router(state).merge(metrics.router());

            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding {addr}"))?;
            info!(target: "curator::api", %addr, "serving");
            axum::serve(listener, app).await.context("http server")?;
        }
        Command::Score { text, source } => {
            let scorer = Scorer::new(&cfg)?;
            let explanation = scorer.explain_text(&text, &source);
            println!("{}", serde_json::to_string_pretty(&explanation)?);
        }
    }
    Ok(())
}
