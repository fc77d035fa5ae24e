use std::cmp::Ordering;
use std::collections::HashSet;
use url::Url;

use super::Article;

/// Articles mentioning any of these are treated as advertising and dropped
const AD_KEYWORDS: &[&str] = &[
    "advertisement",
    "sponsored",
    "promo",
    "sale",
    "discount",
    "реклама",
    "промо",
    "акция",
    "скидка",
];

/// Canonical form of an article URL used as the deduplication key.
///
/// Scheme and host are lower-cased, a leading `www.` is removed, the
/// fragment and `utm_*` tracking parameters are dropped and a trailing
/// slash is trimmed from the path.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_lowercase();
    };

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !key.to_lowercase().starts_with("utm_"))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let host = url
        .host_str()
        .map(|h| h.trim_start_matches("www.").to_string())
        .unwrap_or_default();
    let path = url.path().trim_end_matches('/');
    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
    let query = url.query().map(|q| format!("?{q}")).unwrap_or_default();

    format!("{}://{}{}{}{}", url.scheme(), host, port, path, query)
}

/// Key an article is deduplicated by: its URL, or its title when it has none
pub fn dedup_key(article: &Article) -> String {
    if article.url.trim().is_empty() {
        format!("title:{}", article.title.trim().to_lowercase())
    } else {
        normalize_url(&article.url)
    }
}

fn searchable_text(article: &Article) -> String {
    format!("{} {}", article.title, article.summary).to_lowercase()
}

pub fn is_advertisement(article: &Article) -> bool {
    let text = searchable_text(article);
    text.split(|c: char| !c.is_alphanumeric())
        .any(|word| AD_KEYWORDS.contains(&word))
}

/// Case-insensitive substring match on title and summary
pub fn matches_topic(article: &Article, topic: &str) -> bool {
    let topic = topic.trim().to_lowercase();
    topic.is_empty() || searchable_text(article).contains(&topic)
}

/// Keeps the first occurrence of every dedup key, preserving order
pub fn dedup<T, F>(items: Vec<T>, article_of: F) -> Vec<T>
where
    F: Fn(&T) -> &Article,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(dedup_key(article_of(item))))
        .collect()
}

/// Most recent first, undated last, ties by provider priority.
///
/// The sort is stable so fully tied articles keep their merge order.
pub fn rank(items: &mut [(usize, Article)]) {
    items.sort_by(|(a_priority, a), (b_priority, b)| {
        let by_date = match (a.published_at, b.published_at) {
            (Some(a_time), Some(b_time)) => b_time.cmp(&a_time),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_date.then(a_priority.cmp(b_priority))
    });
}

/// Renders an HTML fragment (common in feed summaries) as plain text
pub fn html_to_text(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return collapse_whitespace(html);
    }
    match html2text::from_read(html.as_bytes(), 10_000) {
        Ok(text) => collapse_whitespace(&text),
        Err(_) => collapse_whitespace(html),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
