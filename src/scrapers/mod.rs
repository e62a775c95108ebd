//! Per-source parsing rules.
//!
//! Each news site is described by a [`SourceProfile`]: the CSS selectors that
//! locate article links and fields, and the [`NormalizeRules`] (category
//! mapping, tag keywords) applied afterwards. [`profile_for`] resolves a
//! configured [`Source`] to its profile and compiles it into an
//! [`ArticleSource`] the orchestrator can drive.
//!
//! # Supported Profiles
//!
//! | Profile | Module | Listing page |
//! |---------|--------|--------------|
//! | `yonhap` | [`yonhap`] | `https://www.yna.co.kr/news` |
//!
//! # Adding a Source
//!
//! Write a module exporting a `profile()` constructor and register its name
//! in [`profile_for`]. Sources in configuration may point at an existing
//! profile with `profile:` to reuse its selectors under a different id.

pub mod html;
pub mod yonhap;

use crate::error::ScrapeError;
use crate::models::{RawArticle, Source};
use crate::normalize::NormalizeRules;
use html::HtmlSource;

/// The parsing half of a news source: links out of listing pages, fields out
/// of article pages, and the rules its articles are normalized with.
pub trait ArticleSource {
    /// Absolute article URLs in document order, without duplicates.
    ///
    /// Never fails: an unparseable page yields an empty list.
    fn extract_links(&self, listing_html: &str, listing_url: &str) -> Vec<String>;

    /// Best-effort fields of a single article page.
    fn extract_article(&self, html: &str, url: &str) -> Result<RawArticle, ScrapeError>;

    fn rules(&self) -> &NormalizeRules;
}

/// CSS selectors for one site.
#[derive(Debug, Clone, Default)]
pub struct Selectors {
    /// Anchors on the listing page.
    pub links: String,
    /// Regex an absolute link must match to count as an article.
    pub article_url_pattern: Option<String>,
    pub title: String,
    /// Body paragraphs; joined with newlines.
    pub content: String,
    pub author: Option<String>,
    pub published_at: Option<String>,
    pub category: Option<String>,
}

/// Everything source-specific about scraping one site.
#[derive(Debug, Clone)]
pub struct SourceProfile {
    pub selectors: Selectors,
    pub rules: NormalizeRules,
}

/// Resolve and compile the profile a source is configured with.
pub fn profile_for(source: &Source) -> Result<HtmlSource, ScrapeError> {
    let profile = match source.profile_name() {
        "yonhap" => yonhap::profile(),
        other => {
            return Err(ScrapeError::UnknownProfile {
                source_id: source.id.clone(),
                profile: other.to_string(),
            });
        }
    };
    HtmlSource::new(profile)
}
