//! The per-source scraping job.
//!
//! [`scrape_articles`] drives one source from start to finish:
//!
//! ```text
//! Idle -> SessionAcquired -> ListingLoaded -> PerLinkProcessing -> Aggregating -> Done
//! ```
//!
//! Failing to acquire a session or load the listing page ends the job with
//! `success = false` and a single top-level error. Once links are known, each
//! one is processed in isolation: fetch and extraction failures are recorded
//! in the result's error list and the loop moves on. Every article fetch,
//! including the first, is preceded by the configured delay.
//!
//! The whole job runs inside a `scrape_job` tracing span carrying the job id
//! and source id.

use crate::config::ScrapeSettings;
use crate::error::ScrapeError;
use crate::fetcher::{PageFetcher, SessionGuard};
use crate::filter::filter_articles;
use crate::models::{Article, Job, ScrapingResult, Source};
use crate::normalize::{Rejected, normalize};
use crate::scrapers::ArticleSource;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// What happened to a single listing link.
enum LinkOutcome {
    Accepted(Article),
    Rejected(Rejected),
    Failed(ScrapeError),
}

/// Fetch, extract and normalize one article.
async fn process_link<F, S>(
    session: &SessionGuard<'_, F>,
    parser: &S,
    url: &str,
    settings: &ScrapeSettings,
) -> LinkOutcome
where
    F: PageFetcher,
    S: ArticleSource,
{
    let html = match session.load_page(url).await {
        Ok(html) => html,
        Err(source) => {
            return LinkOutcome::Failed(ScrapeError::ArticleFetch {
                url: url.to_string(),
                source,
            });
        }
    };

    let raw = match parser.extract_article(&html, url) {
        Ok(raw) => raw,
        Err(e) => return LinkOutcome::Failed(e),
    };

    match normalize(raw, parser.rules(), settings.min_content_chars) {
        Ok(article) => LinkOutcome::Accepted(article),
        Err(rejected) => LinkOutcome::Rejected(rejected),
    }
}

/// Everything up to and including aggregation. An `Err` is a job-level failure.
async fn run_job<F, S>(
    fetcher: &F,
    parser: &S,
    source: &Source,
    settings: &ScrapeSettings,
    result: &mut ScrapingResult,
) -> Result<(), ScrapeError>
where
    F: PageFetcher,
    S: ArticleSource,
{
    let session = SessionGuard::acquire(fetcher)
        .await
        .map_err(ScrapeError::Session)?;
    debug!("Fetch session acquired");

    let listing = session
        .load_page(&source.url)
        .await
        .map_err(|source_err| ScrapeError::ListingFetch {
            url: source.url.clone(),
            source: source_err,
        })?;

    let links = parser.extract_links(&listing, &source.url);
    let total_links = links.len();
    let links: Vec<String> = links.into_iter().take(settings.max_links).collect();
    info!(
        found = total_links,
        processing = links.len(),
        max = settings.max_links,
        "Listing page loaded"
    );

    let mut articles = Vec::with_capacity(links.len());
    for (index, url) in links.iter().enumerate() {
        sleep(settings.request_delay).await;

        match process_link(&session, parser, url, settings).await {
            LinkOutcome::Accepted(article) => {
                debug!(index, %url, title = %article.title, score = article.quality_score, "Article accepted");
                articles.push(article);
            }
            LinkOutcome::Rejected(rejected) => {
                debug!(index, %url, reason = %rejected, "Article rejected by quality gate");
                result.reject(rejected.to_string());
            }
            LinkOutcome::Failed(e) => {
                warn!(index, %url, error = %e, "Article failed; continuing");
                result.errors.push(e.to_string());
            }
        }
    }
    session.release();

    let candidates = articles.len();
    let filtered = filter_articles(articles);
    for reason in filtered.empty {
        result.reject(reason);
    }
    info!(
        candidates,
        kept = filtered.articles.len(),
        rejected = result.rejected_count,
        failed = result.errors.len(),
        "Aggregated job results"
    );
    result.complete(filtered.articles);
    Ok(())
}

/// Run the scraping pipeline for one source.
///
/// Acquires one session, loads the listing page, then fetches at most
/// `settings.max_links` article links one at a time, sleeping
/// `settings.request_delay` before each. The session is released before
/// the collected articles are filtered.
///
/// # Arguments
///
/// * `fetcher` - Provides the session and page loads
/// * `parser` - Source-specific link and article extraction
/// * `source` - The source being scraped
/// * `settings` - Delay, link cap and content floor for this job
///
/// # Returns
///
/// A [`ScrapingResult`]. Never fails outright: job-level failures are
/// reported through `success = false`, per-link failures through `errors`
/// and dropped articles through `rejections`.
pub async fn scrape_articles<F, S>(
    fetcher: &F,
    parser: &S,
    source: &Source,
    settings: &ScrapeSettings,
) -> ScrapingResult
where
    F: PageFetcher,
    S: ArticleSource,
{
    let job = Job::new(source);
    let span = info_span!("scrape_job", job_id = %job.id, source = %job.source_id);

    async move {
        let t0 = Instant::now();
        info!(url = %source.url, "Scraping job started");
        let mut result = ScrapingResult::begin(&job, source);

        match run_job(fetcher, parser, source, settings, &mut result).await {
            Ok(()) => info!(
                articles = result.total_count,
                errors = result.errors.len(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Scraping job finished"
            ),
            Err(e) => {
                error!(error = %e, elapsed_ms = t0.elapsed().as_millis() as u64, "Scraping job failed");
                result.fail(e.to_string());
            }
        }
        result
    }
    .instrument(span)
    .await
}
