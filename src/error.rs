//! Error types for the scraping pipeline.
//!
//! Errors fall into three classes:
//! - **Fatal to a job**: [`ScrapeError::Session`] and [`ScrapeError::ListingFetch`]
//!   end the job with `success = false`.
//! - **Per link**: [`ScrapeError::ArticleFetch`] and [`ScrapeError::Extraction`]
//!   are recorded verbatim in the job's error list and the job moves on.
//! - **Configuration**: unknown or disabled sources, unknown profiles and
//!   invalid settings, raised before a job starts.
//!
//! The `Display` output of each variant is exactly the string recorded in
//! [`ScrapingResult::errors`](crate::models::ScrapingResult).

use std::time::Duration;

/// Failures of the fetch layer.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The page did not finish loading within the configured timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// The session could not be created.
    #[error("{0}")]
    Session(String),
}

/// Errors raised while running or configuring a scraping job.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("Failed to acquire fetch session: {0}")]
    Session(#[source] FetchError),

    #[error("Failed to load listing page: {url} - {source}")]
    ListingFetch { url: String, source: FetchError },

    #[error("Failed to fetch article: {url} - {source}")]
    ArticleFetch { url: String, source: FetchError },

    #[error("Failed to extract article: {url} - {reason}")]
    Extraction { url: String, reason: String },

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Source is disabled: {0}")]
    SourceDisabled(String),

    #[error("No scraper profile named '{profile}' for source {source_id}")]
    UnknownProfile { source_id: String, profile: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
