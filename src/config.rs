//! Scraper configuration loaded from YAML.
//!
//! Every field is optional in the file; missing fields take the defaults
//! below. [`ScraperConfig::settings`] projects the tunables into the
//! [`ScrapeSettings`] the orchestrator consumes.
//!
//! ```yaml
//! request_delay_ms: 1000
//! max_links_per_job: 20
//! min_content_chars: 100
//! page_timeout_secs: 30
//! sources:
//!   - id: yonhap
//!     name: 연합뉴스
//!     url: https://www.yna.co.kr/news
//! ```

use crate::error::ScrapeError;
use crate::models::Source;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// On-disk configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Pause before every article fetch.
    pub request_delay_ms: u64,
    /// How many listing links a single job follows.
    pub max_links_per_job: usize,
    /// Cleaned content shorter than this many characters is rejected.
    pub min_content_chars: usize,
    /// Upper bound for a single page load.
    pub page_timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
    pub sources: Vec<Source>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 1000,
            max_links_per_job: 20,
            min_content_chars: 100,
            page_timeout_secs: 30,
            user_agent: concat!("Mozilla/5.0 (compatible; news_scrape/", env!("CARGO_PKG_VERSION"), ")")
                .to_string(),
            accept_language: "ko-KR,ko;q=0.9,en;q=0.8".to_string(),
            sources: vec![Source {
                id: "yonhap".to_string(),
                name: "연합뉴스".to_string(),
                url: "https://www.yna.co.kr/news".to_string(),
                enabled: true,
                profile: None,
            }],
        }
    }
}

/// Runtime tunables for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSettings {
    pub request_delay: Duration,
    pub max_links: usize,
    pub min_content_chars: usize,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        ScraperConfig::default().settings()
    }
}

impl ScraperConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ScrapeError> {
        let config: ScraperConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config file at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ScrapeError> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        let config = Self::from_yaml(&text)?;
        info!(sources = config.sources.len(), "Loaded scraper configuration");
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.max_links_per_job == 0 {
            return Err(ScrapeError::Config(
                "max_links_per_job must be greater than zero".to_string(),
            ));
        }
        if self.page_timeout_secs == 0 {
            return Err(ScrapeError::Config(
                "page_timeout_secs must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.id.as_str()) {
                return Err(ScrapeError::Config(format!(
                    "duplicate source id: {}",
                    source.id
                )));
            }
            if let Err(e) = url::Url::parse(&source.url) {
                return Err(ScrapeError::Config(format!(
                    "source {} has an invalid url '{}': {}",
                    source.id, source.url, e
                )));
            }
        }
        Ok(())
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn settings(&self) -> ScrapeSettings {
        ScrapeSettings {
            request_delay: Duration::from_millis(self.request_delay_ms),
            max_links: self.max_links_per_job,
            min_content_chars: self.min_content_chars,
        }
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter().filter(|s| s.enabled)
    }
}
