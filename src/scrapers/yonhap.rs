//! Yonhap News (연합뉴스) profile.
//!
//! The listing page at `https://www.yna.co.kr/news` links to articles under
//! `/view/AKR…`. Article bodies are plain `<p>` elements inside the story
//! container; the publish time is exposed both as an
//! `article:published_time` meta tag and as a `YYYY-MM-DD HH:MM` KST string.

use super::{Selectors, SourceProfile};
use crate::normalize::NormalizeRules;

/// Section keywords and the label they map to. First match wins.
const CATEGORIES: &[(&str, &str)] = &[
    ("정치", "정치"),
    ("북한", "북한"),
    ("경제", "경제"),
    ("산업", "경제"),
    ("마켓", "경제"),
    ("사회", "사회"),
    ("전국", "사회"),
    ("세계", "국제"),
    ("국제", "국제"),
    ("문화", "문화"),
    ("연예", "연예"),
    ("스포츠", "스포츠"),
    ("IT", "IT/과학"),
    ("과학", "IT/과학"),
    ("politics", "정치"),
    ("economy", "경제"),
    ("society", "사회"),
    ("international", "국제"),
    ("culture", "문화"),
    ("sports", "스포츠"),
];

const TAG_KEYWORDS: &[&str] = &[
    "정부", "경제", "건강", "의료", "교육", "삼성", "LG", "현대", "SK", "북한", "미국", "중국",
    "일본",
];

pub fn rules() -> NormalizeRules {
    NormalizeRules::new(CATEGORIES, TAG_KEYWORDS)
}

pub fn profile() -> SourceProfile {
    SourceProfile {
        selectors: Selectors {
            links: "a[href]".to_string(),
            article_url_pattern: Some(r"^https?://(www\.)?yna\.co\.kr/view/AKR\d+".to_string()),
            title: "h1.tit, .title-article01 h1".to_string(),
            content: "article.story-news p, .article-txt p".to_string(),
            author: Some(".writer-zone01 .tit-name, .tit-name a".to_string()),
            published_at: Some(".update-time, p.txt-time".to_string()),
            category: Some(".nav-path01 a:last-child".to_string()),
        },
        rules: rules(),
    }
}
