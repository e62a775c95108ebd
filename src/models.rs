//! Data models for sources, scraped articles and job results.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`Source`]: A configured news site with its listing page
//! - [`RawArticle`]: Unvalidated fields pulled out of an article page
//! - [`Article`]: A cleaned, classified and quality-gated article
//! - [`Job`]: The ephemeral context of one scraping run
//! - [`ScrapingResult`]: The outcome of one job
//! - [`RunSummary`]: The outcome of a run over every enabled source
//! - [`ApiResponse`]: The response envelope handed to callers
//!
//! Everything that leaves the process serializes in camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A news site to scrape.
///
/// Sources are loaded once from configuration and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Source {
    /// Stable identifier, e.g. `"yonhap"`.
    pub id: String,
    /// Display name, e.g. `"연합뉴스"`.
    pub name: String,
    /// The listing page that links to individual articles.
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Name of the scraper profile to use. Falls back to `id` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Source {
    /// The scraper profile this source resolves to.
    pub fn profile_name(&self) -> &str {
        self.profile.as_deref().unwrap_or(&self.id)
    }
}

/// Fields extracted from an article page before any cleanup.
///
/// Every field except `source_url` is best effort: a missing element yields
/// `None` rather than an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawArticle {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    /// The URL the page was fetched from.
    pub source_url: String,
}

/// A normalized article ready for storage.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    /// At most five keywords, in keyword-list order.
    pub tags: Vec<String>,
    pub source_url: String,
    /// Advisory completeness score in `0..=100`.
    pub quality_score: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The ephemeral context of one scraping run for one source.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub source_id: String,
}

impl Job {
    pub fn new(source: &Source) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            source_id: source.id.clone(),
        }
    }
}

/// The outcome of a single scraping job.
///
/// `total_count` always equals `articles.len()`. `success` is `false` only
/// when the pipeline itself failed (no session, no listing page); failed
/// individual links show up in `errors` without affecting it. Articles that
/// were fetched and extracted but then dropped for quality reasons are
/// listed in `rejections`, one reason per article.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingResult {
    pub success: bool,
    pub articles: Vec<Article>,
    pub errors: Vec<String>,
    pub source: String,
    pub source_id: String,
    pub job_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub total_count: usize,
    /// Why each dropped article was dropped, with its URL.
    pub rejections: Vec<String>,
    /// Always `rejections.len()`.
    pub rejected_count: usize,
}

impl ScrapingResult {
    /// An in-progress result for `job`, not yet successful.
    pub fn begin(job: &Job, source: &Source) -> Self {
        Self {
            success: false,
            articles: Vec::new(),
            errors: Vec::new(),
            source: source.name.clone(),
            source_id: source.id.clone(),
            job_id: job.id,
            started_at: job.started_at,
            total_count: 0,
            rejections: Vec::new(),
            rejected_count: 0,
        }
    }

    /// Record an article dropped by the quality gate or the empty filter.
    pub fn reject(&mut self, reason: impl Into<String>) {
        self.rejections.push(reason.into());
        self.rejected_count = self.rejections.len();
    }

    /// A failed result for a job that never produced one of its own.
    pub fn degraded(source: &Source, message: impl Into<String>) -> Self {
        let mut result = Self::begin(&Job::new(source), source);
        result.errors.push(message.into());
        result
    }

    /// Mark the job done with the final, filtered article list.
    pub fn complete(&mut self, articles: Vec<Article>) {
        self.total_count = articles.len();
        self.articles = articles;
        self.success = true;
    }

    /// Mark the job failed. Any collected articles are discarded.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.articles.clear();
        self.total_count = 0;
        self.success = false;
        self.errors.push(message.into());
    }
}

/// The outcome of running every enabled source once.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// `true` when at least one source succeeded.
    pub success: bool,
    pub total_sources: usize,
    pub successful_sources: usize,
    pub total_articles: usize,
    pub results: Vec<ScrapingResult>,
    pub started_at: DateTime<Utc>,
}

/// Response envelope: `{success, data|error, message, timestamp}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn err(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
