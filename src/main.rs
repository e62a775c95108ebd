//! # News Scrape
//!
//! A news ingestion pipeline that fetches listing pages from configured
//! sources, follows their article links, extracts and cleans each article,
//! and produces a deduplicated, quality-filtered result per source.
//!
//! ## Usage
//!
//! ```sh
//! news_scrape --config sources.yaml --output-dir ./out
//! ```
//!
//! ## Architecture
//!
//! Each source is scraped by one sequential job:
//! 1. **Session**: Acquire a fetch session for the job
//! 2. **Listing**: Load the listing page and extract article links (capped)
//! 3. **Articles**: For each link, wait, fetch, extract and normalize
//! 4. **Aggregation**: Drop empty and duplicate articles
//!
//! Sources run one after another; a failed source never stops the run.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod coordinator;
mod error;
mod fetcher;
mod filter;
mod models;
mod normalize;
mod orchestrator;
mod outputs;
mod scrapers;

use cli::Cli;
use config::ScraperConfig;
use coordinator::{Pipeline, run_all, run_source, select_source};
use models::ApiResponse;
use outputs::json;
use serde::Serialize;

/// Print `envelope` to stdout, or save it when an output dir was given.
async fn emit<T: Serialize>(args: &Cli, envelope: &ApiResponse<T>, name: &str) -> Result<(), Box<dyn Error>> {
    match &args.output_dir {
        Some(dir) => {
            let path = json::write_envelope(envelope, dir, name).await?;
            info!(path = %path.display(), "Results saved");
        }
        None => println!("{}", json::to_pretty_json(envelope)?),
    }
    Ok(())
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = match &args.config {
        Some(path) => ScraperConfig::load(path).await?,
        None => ScraperConfig::default(),
    };
    if let Some(delay_ms) = args.delay_ms {
        config.request_delay_ms = delay_ms;
    }
    if let Some(max_links) = args.max_links {
        config.max_links_per_job = max_links;
    }
    config.validate()?;

    if args.list_sources {
        for source in &config.sources {
            let state = if source.enabled { "enabled" } else { "disabled" };
            println!("{}\t{}\t{}\t{}", source.id, source.name, source.url, state);
        }
        return Ok(());
    }

    info!(
        sources = config.sources.len(),
        enabled = config.enabled_sources().count(),
        delay_ms = config.request_delay_ms,
        max_links = config.max_links_per_job,
        "Configuration ready"
    );
    let pipeline = Pipeline::from_config(&config);

    match &args.source {
        Some(id) => {
            let source = match select_source(&config.sources, id) {
                Ok(source) => source,
                Err(e) => {
                    error!(source = %id, error = %e, "Cannot scrape source");
                    let envelope: ApiResponse<()> =
                        ApiResponse::err(e.to_string(), "Source selection failed");
                    emit(&args, &envelope, id).await?;
                    return Err(e.into());
                }
            };

            let result = run_source(&pipeline, source).await;
            let envelope = if result.success {
                let message = format!("Scraped {} articles from {}", result.total_count, result.source);
                ApiResponse::ok(result, message)
            } else {
                let error = result.errors.join("; ");
                ApiResponse {
                    data: Some(result),
                    ..ApiResponse::err(error, "Scraping failed")
                }
            };
            emit(&args, &envelope, &source.id).await?;
        }
        None => {
            let summary = run_all(&config.sources, &pipeline).await;
            let message = format!(
                "{}/{} sources succeeded, {} articles",
                summary.successful_sources, summary.total_sources, summary.total_articles
            );
            let envelope = if summary.success {
                ApiResponse::ok(summary, message)
            } else {
                ApiResponse {
                    data: Some(summary),
                    ..ApiResponse::err("No source succeeded", message)
                }
            };
            emit(&args, &envelope, "all").await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        open_sessions = pipeline.fetcher().open_sessions(),
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
