//! Cleanup, classification and quality scoring of extracted articles.
//!
//! [`normalize`] turns a [`RawArticle`] into an [`Article`]:
//!
//! 1. Title: bracketed and parenthesized segments removed, whitespace collapsed.
//! 2. Content: reporter bylines (`홍길동 기자 =`, `[홍길동 기자]`) removed and
//!    every whitespace run, line breaks included, collapsed to one space.
//! 3. Content shorter than the minimum length is [`Rejected`].
//! 4. Category mapped through the source's keyword rules.
//! 5. Up to [`MAX_TAGS`] tags derived from the source's keyword list.
//! 6. A fresh id and timestamps.
//!
//! Each cleanup helper is idempotent. Lengths are counted in characters, not
//! bytes.

use crate::models::{Article, RawArticle};
use chrono::Utc;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

pub const MAX_TAGS: usize = 5;

static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]|\([^)]*\)").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static BYLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+\s+기자\s*=").expect("valid regex"));
static BRACKETED_BYLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*기자[^\]]*\]").expect("valid regex"));

/// Maps a raw category containing `keyword` to `label`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub keyword: String,
    pub label: String,
}

/// The source-specific half of normalization.
#[derive(Debug, Clone, Default)]
pub struct NormalizeRules {
    /// Checked in order; the first keyword found in the raw category wins.
    pub categories: Vec<CategoryRule>,
    /// Tag candidates in output order.
    pub tag_keywords: Vec<String>,
}

impl NormalizeRules {
    pub fn new(categories: &[(&str, &str)], tag_keywords: &[&str]) -> Self {
        Self {
            categories: categories
                .iter()
                .map(|(keyword, label)| CategoryRule {
                    keyword: keyword.to_string(),
                    label: label.to_string(),
                })
                .collect(),
            tag_keywords: tag_keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// An article whose cleaned content fell below the minimum length.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("content too short: {content_chars} < {min_chars} characters ({source_url})")]
pub struct Rejected {
    pub source_url: String,
    pub content_chars: usize,
    pub min_chars: usize,
}

pub fn clean_title(title: &str) -> String {
    let stripped = BRACKETED.replace_all(title, " ");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

pub fn clean_content(content: &str) -> String {
    let text = strip_bylines(content);
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Remove bylines until none are left. Removing one can expose another, and
/// every removal shortens the text, so the loop ends.
fn strip_bylines(content: &str) -> String {
    let mut text = content.to_string();
    while BRACKETED_BYLINE.is_match(&text) || BYLINE.is_match(&text) {
        text = BRACKETED_BYLINE.replace_all(&text, " ").into_owned();
        text = BYLINE.replace_all(&text, " ").into_owned();
    }
    text
}

/// Replace `raw` with the label of the first matching rule, or keep it as is.
pub fn map_category(raw: &str, rules: &NormalizeRules) -> String {
    rules
        .categories
        .iter()
        .find(|rule| raw.contains(rule.keyword.as_str()))
        .map(|rule| rule.label.clone())
        .unwrap_or_else(|| raw.to_string())
}

/// Keywords present in the lower-cased title and content, in keyword order.
pub fn derive_tags(title: &str, content: &str, rules: &NormalizeRules) -> Vec<String> {
    let haystack = format!("{title} {content}").to_lowercase();
    rules
        .tag_keywords
        .iter()
        .filter(|keyword| haystack.contains(&keyword.to_lowercase()))
        .unique()
        .take(MAX_TAGS)
        .cloned()
        .collect()
}

/// Advisory completeness score, `0..=100`. Never used to reject articles.
///
/// | Condition | Points |
/// |-----------|--------|
/// | title longer than 10 characters | 20 |
/// | content longer than 200 characters | 30 |
/// | author, published time, category, image (each) | 10 |
/// | at least one tag | 10 |
pub fn quality_score(article: &Article) -> u8 {
    let mut score: u8 = 0;
    if article.title.chars().count() > 10 {
        score += 20;
    }
    if article.content.chars().count() > 200 {
        score += 30;
    }
    score += 10 * [
        article.author.is_some(),
        article.published_at.is_some(),
        article.category.is_some(),
        article.image_url.is_some(),
        !article.tags.is_empty(),
    ]
    .iter()
    .filter(|present| **present)
    .count() as u8;
    score.min(100)
}

/// Clean, gate and classify one extracted article.
///
/// # Arguments
///
/// * `raw` - Fields as extracted from the page
/// * `rules` - The source's category map and tag keywords
/// * `min_content_chars` - Cleaned content shorter than this is rejected
///
/// # Returns
///
/// The finished [`Article`] with a fresh id, timestamps and quality score,
/// or [`Rejected`] when the cleaned content is too short.
pub fn normalize(
    raw: RawArticle,
    rules: &NormalizeRules,
    min_content_chars: usize,
) -> Result<Article, Rejected> {
    let title = clean_title(raw.title.as_deref().unwrap_or_default());
    let content = clean_content(raw.content.as_deref().unwrap_or_default());

    let content_chars = content.chars().count();
    if content_chars < min_content_chars {
        return Err(Rejected {
            source_url: raw.source_url,
            content_chars,
            min_chars: min_content_chars,
        });
    }

    let category = raw
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| map_category(c, rules));
    let tags = derive_tags(&title, &content, rules);

    let now = Utc::now();
    let mut article = Article {
        id: Uuid::new_v4(),
        title,
        content,
        author: raw.author,
        published_at: raw.published_at,
        category,
        image_url: raw.image_url,
        tags,
        source_url: raw.source_url,
        quality_score: 0,
        created_at: now,
        updated_at: now,
    };
    article.quality_score = quality_score(&article);
    Ok(article)
}
