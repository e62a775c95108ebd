//! Sequential runs over every enabled source.
//!
//! Sources are scraped one after another, never concurrently, which bounds
//! the load on remote hosts and on the local fetch session. A source whose
//! job errors or panics gets a degraded result (`success = false`, no
//! articles, the failure message) and the run carries on with the next one.

use crate::config::{ScrapeSettings, ScraperConfig};
use crate::error::ScrapeError;
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::models::{RunSummary, ScrapingResult, Source};
use crate::orchestrator::scrape_articles;
use crate::scrapers::profile_for;
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, instrument};

/// Runs one job for one source.
pub trait SourceRunner {
    async fn run(&self, source: &Source) -> Result<ScrapingResult, ScrapeError>;
}

/// The production runner: resolves each source's profile and scrapes it
/// through a shared fetcher.
pub struct Pipeline<F> {
    fetcher: F,
    settings: ScrapeSettings,
}

impl<F: PageFetcher> Pipeline<F> {
    pub fn new(fetcher: F, settings: ScrapeSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}

impl Pipeline<HttpFetcher> {
    pub fn from_config(config: &ScraperConfig) -> Self {
        let fetcher = HttpFetcher::new(
            config.user_agent.clone(),
            config.accept_language.clone(),
            config.page_timeout(),
        );
        Self::new(fetcher, config.settings())
    }
}

impl<F: PageFetcher> SourceRunner for Pipeline<F> {
    async fn run(&self, source: &Source) -> Result<ScrapingResult, ScrapeError> {
        let parser = profile_for(source)?;
        Ok(scrape_articles(&self.fetcher, &parser, source, &self.settings).await)
    }
}

/// Look up a source by id for a single-source run.
pub fn select_source<'a>(sources: &'a [Source], id: &str) -> Result<&'a Source, ScrapeError> {
    let source = sources
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| ScrapeError::UnknownSource(id.to_string()))?;
    if !source.enabled {
        return Err(ScrapeError::SourceDisabled(id.to_string()));
    }
    Ok(source)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run the job for a single source.
///
/// Errors and panics raised by `runner` are caught and turned into a degraded
/// result, so the caller always gets a [`ScrapingResult`] back.
///
/// # Arguments
///
/// * `runner` - Executes the job
/// * `source` - The source to scrape
///
/// # Returns
///
/// The job's own result, or a failed result whose only error is the
/// runner's error message or `"Scraping job panicked: <message>"`.
pub async fn run_source<R: SourceRunner>(runner: &R, source: &Source) -> ScrapingResult {
    match AssertUnwindSafe(runner.run(source)).catch_unwind().await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            error!(source = %source.id, error = %e, "Source job errored");
            ScrapingResult::degraded(source, e.to_string())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(source = %source.id, %message, "Source job panicked");
            ScrapingResult::degraded(source, format!("Scraping job panicked: {message}"))
        }
    }
}

/// Scrape every enabled source in order.
///
/// # Arguments
///
/// * `sources` - All configured sources; disabled ones are skipped
/// * `runner` - Executes each source's job
///
/// # Returns
///
/// A [`RunSummary`] with one result per enabled source, in configuration
/// order. It is successful when at least one source succeeded.
#[instrument(level = "info", skip_all)]
pub async fn run_all<R: SourceRunner>(sources: &[Source], runner: &R) -> RunSummary {
    let started_at = Utc::now();
    let enabled: Vec<&Source> = sources.iter().filter(|s| s.enabled).collect();
    info!(sources = enabled.len(), "Starting scraping run");

    let mut results = Vec::with_capacity(enabled.len());
    for source in enabled {
        let result = run_source(runner, source).await;
        info!(
            source = %source.id,
            success = result.success,
            articles = result.total_count,
            errors = result.errors.len(),
            "Source finished"
        );
        results.push(result);
    }

    let successful_sources = results.iter().filter(|r| r.success).count();
    let total_articles = results.iter().map(|r| r.total_count).sum();
    let summary = RunSummary {
        success: successful_sources > 0,
        total_sources: results.len(),
        successful_sources,
        total_articles,
        results,
        started_at,
    };
    info!(
        total = summary.total_sources,
        successful = summary.successful_sources,
        articles = summary.total_articles,
        "Scraping run complete"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::tests::{parser, settings, site};
    use std::sync::Mutex;

    fn source(id: &str, enabled: bool) -> Source {
        Source {
            id: id.to_string(),
            name: format!("{id} news"),
            url: "https://news.example/list".to_string(),
            enabled,
            profile: None,
        }
    }

    /// Scrapes `good` against a canned three-article site; every other
    /// source errors, and `boom` panics.
    struct ScriptedRunner {
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl SourceRunner for ScriptedRunner {
        async fn run(&self, source: &Source) -> Result<ScrapingResult, ScrapeError> {
            self.calls.lock().unwrap().push(source.id.clone());
            match source.id.as_str() {
                "good" => Ok(scrape_articles(&site(3), &parser(), source, &settings()).await),
                "boom" => panic!("parser exploded"),
                _ => Err(ScrapeError::UnknownProfile {
                    source_id: source.id.clone(),
                    profile: source.id.clone(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_one_failing_one_succeeding() {
        let sources = vec![source("bad", true), source("good", true)];
        let runner = ScriptedRunner::new();
        let summary = run_all(&sources, &runner).await;

        assert!(summary.success);
        assert_eq!(summary.total_sources, 2);
        assert_eq!(summary.successful_sources, 1);
        assert_eq!(summary.total_articles, 3);

        let bad = &summary.results[0];
        assert!(!bad.success);
        assert!(bad.articles.is_empty());
        assert_eq!(bad.source_id, "bad");
        assert_eq!(bad.errors, vec!["No scraper profile named 'bad' for source bad"]);

        let good = &summary.results[1];
        assert!(good.success);
        assert_eq!(good.total_count, 3);
    }

    #[tokio::test]
    async fn test_panicking_job_is_degraded() {
        let sources = vec![source("boom", true), source("good", true)];
        let summary = run_all(&sources, &ScriptedRunner::new()).await;

        assert_eq!(summary.successful_sources, 1);
        assert_eq!(
            summary.results[0].errors,
            vec!["Scraping job panicked: parser exploded"]
        );
    }

    #[tokio::test]
    async fn test_disabled_sources_skipped_in_order() {
        let sources = vec![
            source("good", true),
            source("off", false),
            source("bad", true),
        ];
        let runner = ScriptedRunner::new();
        let summary = run_all(&sources, &runner).await;

        assert_eq!(*runner.calls.lock().unwrap(), vec!["good", "bad"]);
        assert_eq!(summary.total_sources, 2);
    }

    #[tokio::test]
    async fn test_all_failing_run_is_unsuccessful() {
        let sources = vec![source("bad", true), source("worse", true)];
        let summary = run_all(&sources, &ScriptedRunner::new()).await;
        assert!(!summary.success);
        assert_eq!(summary.total_articles, 0);
    }

    #[tokio::test]
    async fn test_pipeline_unknown_profile_errors() {
        let pipeline = Pipeline::new(site(1), settings());
        let err = pipeline.run(&source("mystery", true)).await.unwrap_err();
        assert!(matches!(err, ScrapeError::UnknownProfile { .. }));
    }

    #[tokio::test]
    async fn test_pipeline_runs_yonhap_profile() {
        let fetcher = site(2);
        let pipeline = Pipeline::new(fetcher, settings());
        let mut yonhap = source("yonhap", true);
        yonhap.url = "https://news.example/list".to_string();
        // The mock listing has no /view/AKR links, so nothing matches the profile.
        let result = pipeline.run(&yonhap).await.unwrap();
        assert!(result.success);
        assert_eq!(result.total_count, 0);
    }

    #[tokio::test]
    async fn test_run_source_captures_panic() {
        let result = run_source(&ScriptedRunner::new(), &source("boom", true)).await;
        assert!(!result.success);
        assert_eq!(result.source_id, "boom");
        assert_eq!(result.errors, vec!["Scraping job panicked: parser exploded"]);
    }

    #[tokio::test]
    async fn test_run_source_passes_result_through() {
        let result = run_source(&ScriptedRunner::new(), &source("good", true)).await;
        assert!(result.success);
        assert_eq!(result.total_count, 3);
    }

    #[test]
    fn test_select_source() {
        let sources = vec![source("a", true), source("b", false)];
        assert_eq!(select_source(&sources, "a").unwrap().id, "a");
        assert!(matches!(
            select_source(&sources, "b"),
            Err(ScrapeError::SourceDisabled(_))
        ));
        assert_eq!(
            select_source(&sources, "zzz").unwrap_err().to_string(),
            "Unknown source: zzz"
        );
    }
}
