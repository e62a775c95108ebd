//! Final filtering of a job's articles.
//!
//! Articles with an empty title or body are dropped, and the reason is
//! reported back to the caller. Two titles are treated as the same story
//! when, after removing all whitespace and lower-casing, one is a substring
//! of the other. Of such a pair the article discovered first is kept, so
//! results follow listing order and are reproducible.

use crate::models::Article;
use tracing::debug;

/// Comparison key for duplicate detection.
pub fn title_key(title: &str) -> String {
    title
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn is_duplicate_title(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// The articles that survived filtering, plus why the empty ones did not.
#[derive(Debug, Default)]
pub struct Filtered {
    pub articles: Vec<Article>,
    /// One `"empty title or content (<url>)"` entry per empty article.
    /// Duplicates are not listed here.
    pub empty: Vec<String>,
}

/// Drop empty articles and later duplicates, preserving order.
///
/// # Arguments
///
/// * `articles` - Normalized articles in discovery (listing) order
///
/// # Returns
///
/// The kept articles in their original order, and a reason for every
/// article dropped as empty.
pub fn filter_articles(articles: Vec<Article>) -> Filtered {
    let mut kept: Vec<Article> = Vec::with_capacity(articles.len());
    let mut keys: Vec<String> = Vec::with_capacity(articles.len());
    let mut empty = Vec::new();

    for article in articles {
        if article.title.trim().is_empty() || article.content.trim().is_empty() {
            debug!(url = %article.source_url, "Dropping article with empty title or content");
            empty.push(format!("empty title or content ({})", article.source_url));
            continue;
        }

        let key = title_key(&article.title);
        if let Some(pos) = keys.iter().position(|seen| is_duplicate_title(seen, &key)) {
            debug!(
                url = %article.source_url,
                kept = %kept[pos].source_url,
                title = %article.title,
                "Dropping duplicate article"
            );
            continue;
        }

        keys.push(key);
        kept.push(article);
    }
    Filtered {
        articles: kept,
        empty,
    }
}
