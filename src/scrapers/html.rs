//! Selector-driven link and article extraction.
//!
//! [`HtmlSource`] turns a [`SourceProfile`] (CSS selectors plus normalization
//! rules) into an [`ArticleSource`]. Listing pages are scanned for anchors,
//! article pages for title, body paragraphs and metadata, with `<meta>` tag
//! fallbacks for each field the profile's selectors miss.

use super::{ArticleSource, SourceProfile};
use crate::error::ScrapeError;
use crate::models::RawArticle;
use crate::normalize::NormalizeRules;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

static DOC_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("valid selector"));
static DATE_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[-./](\d{2})[-./](\d{2})\s+(\d{2}):(\d{2})").expect("valid regex"));

/// Pages without an explicit offset are dated in Korea Standard Time.
const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Compiled selectors for one source.
#[derive(Debug)]
pub struct HtmlSource {
    links: Selector,
    link_pattern: Option<Regex>,
    title: Selector,
    content: Selector,
    author: Option<Selector>,
    published_at: Option<Selector>,
    category: Option<Selector>,
    rules: NormalizeRules,
}

fn compile(field: &str, css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css)
        .map_err(|e| ScrapeError::Config(format!("invalid {field} selector '{css}': {e}")))
}

fn compile_opt(field: &str, css: Option<&str>) -> Result<Option<Selector>, ScrapeError> {
    css.map(|css| compile(field, css)).transpose()
}

/// Text content of an element with whitespace runs collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).join(" ")
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// `content` of `<meta property=..>` or `<meta name=..>`.
fn meta_content(document: &Html, key: &str) -> Option<String> {
    let css = format!(r#"meta[property="{key}"], meta[name="{key}"]"#);
    let selector = Selector::parse(&css).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Parse either an RFC 3339 timestamp or a `YYYY-MM-DD HH:MM` string in KST.
pub fn parse_published_at(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text.trim()) {
        return Some(dt.with_timezone(&Utc));
    }
    let caps = DATE_TIME.captures(text)?;
    let stamp = format!("{}-{}-{} {}:{}", &caps[1], &caps[2], &caps[3], &caps[4], &caps[5]);
    let naive = NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M").ok()?;
    let kst = FixedOffset::east_opt(KST_OFFSET_SECS)?;
    kst.from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

impl HtmlSource {
    /// Compile the profile's selectors.
    pub fn new(profile: SourceProfile) -> Result<Self, ScrapeError> {
        let selectors = &profile.selectors;
        let link_pattern = selectors
            .article_url_pattern
            .as_deref()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    ScrapeError::Config(format!("invalid article url pattern '{p}': {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            links: compile("links", &selectors.links)?,
            link_pattern,
            title: compile("title", &selectors.title)?,
            content: compile("content", &selectors.content)?,
            author: compile_opt("author", selectors.author.as_deref())?,
            published_at: compile_opt("published_at", selectors.published_at.as_deref())?,
            category: compile_opt("category", selectors.category.as_deref())?,
            rules: profile.rules,
        })
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        first_text(document, &self.title)
            .or_else(|| meta_content(document, "og:title"))
            .or_else(|| first_text(document, &DOC_TITLE))
    }

    fn extract_content(&self, document: &Html) -> Option<String> {
        let paragraphs: Vec<String> = document
            .select(&self.content)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect();
        if paragraphs.is_empty() {
            None
        } else {
            Some(paragraphs.join("\n"))
        }
    }

    fn extract_author(&self, document: &Html) -> Option<String> {
        self.author
            .as_ref()
            .and_then(|sel| first_text(document, sel))
            .or_else(|| meta_content(document, "author"))
    }

    fn extract_published_at(&self, document: &Html) -> Option<DateTime<Utc>> {
        meta_content(document, "article:published_time")
            .and_then(|text| parse_published_at(&text))
            .or_else(|| {
                self.published_at
                    .as_ref()
                    .and_then(|sel| first_text(document, sel))
                    .and_then(|text| parse_published_at(&text))
            })
    }

    fn extract_category(&self, document: &Html) -> Option<String> {
        meta_content(document, "article:section").or_else(|| {
            self.category
                .as_ref()
                .and_then(|sel| first_text(document, sel))
        })
    }

    fn extract_image(document: &Html, page_url: &Url) -> Option<String> {
        let image = meta_content(document, "og:image")?;
        page_url.join(&image).ok().map(|u| u.to_string())
    }
}

impl ArticleSource for HtmlSource {
    fn extract_links(&self, listing_html: &str, listing_url: &str) -> Vec<String> {
        let base = match Url::parse(listing_url) {
            Ok(base) => base,
            Err(e) => {
                warn!(%listing_url, error = %e, "Listing URL does not parse; no links extracted");
                return Vec::new();
            }
        };
        if listing_html.trim().is_empty() {
            warn!(%listing_url, "Listing page is empty; no links extracted");
            return Vec::new();
        }

        let document = Html::parse_document(listing_html);
        let links: Vec<String> = document
            .select(&self.links)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| base.join(href.trim()).ok())
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .map(|mut url| {
                url.set_fragment(None);
                url.to_string()
            })
            .filter(|url| self.link_pattern.as_ref().is_none_or(|p| p.is_match(url)))
            .unique()
            .collect();

        debug!(count = links.len(), %listing_url, "Extracted article links");
        links
    }

    fn extract_article(&self, html: &str, url: &str) -> Result<RawArticle, ScrapeError> {
        let extraction_error = |reason: &str| ScrapeError::Extraction {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        if html.trim().is_empty() {
            return Err(extraction_error("empty document"));
        }
        let page_url = Url::parse(url).map_err(|e| extraction_error(&e.to_string()))?;

        let document = Html::parse_document(html);
        let title = self.extract_title(&document);
        let content = self.extract_content(&document);
        if title.is_none() && content.is_none() {
            return Err(extraction_error("no title or body found"));
        }

        Ok(RawArticle {
            title,
            content,
            author: self.extract_author(&document),
            published_at: self.extract_published_at(&document),
            category: self.extract_category(&document),
            image_url: Self::extract_image(&document, &page_url),
            source_url: url.to_string(),
        })
    }

    fn rules(&self) -> &NormalizeRules {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::{Selectors, SourceProfile};

    fn source() -> HtmlSource {
        HtmlSource::new(SourceProfile {
            selectors: Selectors {
                links: "a.headline[href]".to_string(),
                article_url_pattern: Some(r"/view/\d+".to_string()),
                title: "h1.title".to_string(),
                content: "div.story p".to_string(),
                author: Some(".byline".to_string()),
                published_at: Some(".updated".to_string()),
                category: Some(".section".to_string()),
            },
            rules: NormalizeRules::default(),
        })
        .unwrap()
    }

    const LISTING: &str = r##"
        <html><body>
          <a class="headline" href="/view/1">one</a>
          <a class="headline" href="https://news.example/view/2#comments">two</a>
          <a class="headline" href="/view/1">one again</a>
          <a class="headline" href="/about">about</a>
          <a class="headline" href="mailto:desk@news.example">mail</a>
          <a class="other" href="/view/9">not a headline</a>
          <a class="headline" href="/view/3">three</a>
        </body></html>
    "##;

    #[test]
    fn test_links_in_document_order_without_duplicates() {
        let links = source().extract_links(LISTING, "https://news.example/news");
        assert_eq!(
            links,
            vec![
                "https://news.example/view/1",
                "https://news.example/view/2",
                "https://news.example/view/3",
            ]
        );
    }

    #[test]
    fn test_link_extraction_is_idempotent() {
        let s = source();
        let first = s.extract_links(LISTING, "https://news.example/news");
        let second = s.extract_links(LISTING, "https://news.example/news");
        assert_eq!(first, second);
        assert_eq!(first.iter().unique().count(), first.len());
    }

    #[test]
    fn test_links_fail_softly() {
        let s = source();
        assert!(s.extract_links("", "https://news.example").is_empty());
        assert!(s.extract_links("<<<not html", "https://news.example").is_empty());
        assert!(s.extract_links(LISTING, "not a url").is_empty());
    }

    #[test]
    fn test_extract_full_article() {
        let html = r#"
            <html><head>
              <meta property="og:image" content="/img/photo.jpg">
              <meta property="article:published_time" content="2024-10-19T10:15:00+09:00">
            </head><body>
              <h1 class="title">  [속보] 큰   뉴스 </h1>
              <span class="byline">홍길동 기자</span>
              <span class="section">정치 일반</span>
              <div class="story"><p>첫 문단.</p><p>  </p><p>둘째   문단.</p></div>
            </body></html>
        "#;
        let raw = source()
            .extract_article(html, "https://news.example/view/1")
            .unwrap();
        assert_eq!(raw.title.as_deref(), Some("[속보] 큰 뉴스"));
        assert_eq!(raw.content.as_deref(), Some("첫 문단.\n둘째 문단."));
        assert_eq!(raw.author.as_deref(), Some("홍길동 기자"));
        assert_eq!(raw.category.as_deref(), Some("정치 일반"));
        assert_eq!(raw.image_url.as_deref(), Some("https://news.example/img/photo.jpg"));
        assert_eq!(
            raw.published_at.unwrap().to_rfc3339(),
            "2024-10-19T01:15:00+00:00"
        );
        assert_eq!(raw.source_url, "https://news.example/view/1");
    }

    #[test]
    fn test_missing_fields_are_absent_not_errors() {
        let html = r#"<html><head><meta property="og:title" content="메타 제목"></head>
            <body><div class="story"><p>본문</p></div></body></html>"#;
        let raw = source()
            .extract_article(html, "https://news.example/view/5")
            .unwrap();
        assert_eq!(raw.title.as_deref(), Some("메타 제목"));
        assert!(raw.author.is_none());
        assert!(raw.published_at.is_none());
        assert!(raw.category.is_none());
        assert!(raw.image_url.is_none());
    }

    #[test]
    fn test_empty_document_is_extraction_error() {
        let err = source()
            .extract_article("   ", "https://news.example/view/1")
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Extraction { .. }));

        let err = source()
            .extract_article("<html><body><div>nothing</div></body></html>", "https://news.example/view/1")
            .unwrap_err();
        assert!(err.to_string().contains("no title or body found"));
    }

    #[test]
    fn test_parse_published_at_kst_text() {
        let dt = parse_published_at("송고시간 2024-10-19 10:15").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-10-19T01:15:00+00:00");
        assert!(parse_published_at("yesterday").is_none());
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let err = HtmlSource::new(SourceProfile {
            selectors: Selectors {
                links: "a[".to_string(),
                ..Selectors::default()
            },
            rules: NormalizeRules::default(),
        })
        .unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }
}
