//! Plain-text rendering of article lists and digests.
//!
//! Messages are sent without a parse mode, so nothing here needs escaping.

use chrono::{DateTime, FixedOffset, Utc};

use crate::news::Article;
use crate::storage::SavedArticle;
use crate::utils::datetime::format_datetime;

/// Telegram rejects messages longer than this many characters
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

const SUMMARY_PREVIEW_CHARS: usize = 100;

/// Numbered list used by `/top`
pub fn format_news_list(articles: &[Article], heading: &str, offset: FixedOffset) -> String {
    if articles.is_empty() {
        return "📰 No news found. Try another topic or check back later.".to_string();
    }

    let mut message = format!("📰 {}\n\n", heading);
    for (i, article) in articles.iter().enumerate() {
        message.push_str(&format!("{}. {}\n", i + 1, article.title));
        if !article.summary.is_empty() {
            message.push_str(&format!("   📝 {}\n", preview(&article.summary, SUMMARY_PREVIEW_CHARS)));
        }
        if let Some(published) = &article.published_at {
            message.push_str(&format!("   📅 {}\n", format_datetime(published, offset)));
        }
        message.push_str(&format!("   📡 {}\n", article.source_label()));
        if !article.url.is_empty() {
            message.push_str(&format!("   🔗 {}\n", article.url));
        }
        message.push('\n');
    }

    truncate_message(message.trim_end())
}

/// `/search` results grouped by topic, numbered across groups for `/save`
pub fn format_search_results(groups: &[(String, Vec<Article>)], offset: FixedOffset) -> String {
    let mut message = "🔎 News for your topics\n".to_string();
    let mut number = 0;

    for (topic, articles) in groups {
        message.push_str(&format!("\n🏷️ {}\n", topic));
        for article in articles {
            number += 1;
            message.push_str(&format!("{}. {}\n", number, article.title));
            if let Some(published) = &article.published_at {
                message.push_str(&format!("   📅 {}\n", format_datetime(published, offset)));
            }
            message.push_str(&format!("   📡 {}\n", article.source_label()));
            if !article.url.is_empty() {
                message.push_str(&format!("   🔗 {}\n", article.url));
            }
        }
    }

    message.push_str("\nKeep one with /save <number>.");
    truncate_message(&message)
}

pub fn format_saved(saved: &[SavedArticle], offset: FixedOffset) -> String {
    if saved.is_empty() {
        return "📚 You have no saved articles. Use /save <number> after /top or /search.".to_string();
    }

    let mut message = "📚 Saved articles:\n\n".to_string();
    for (i, item) in saved.iter().enumerate() {
        message.push_str(&format!("{}. {}\n", i + 1, item.title));
        if !item.url.is_empty() && item.url != item.title {
            message.push_str(&format!("   🔗 {}\n", item.url));
        }
        message.push_str(&format!("   💾 {} • {}\n\n", format_datetime(&item.saved_at, offset), item.source));
    }

    truncate_message(message.trim_end())
}

/// Scheduled digest body, one entry per article in ranked order
pub fn format_digest(articles: &[Article], now: DateTime<Utc>, offset: FixedOffset) -> String {
    let date = now.with_timezone(&offset).format("%d.%m.%Y");
    let mut message = format!("📧 Your digest for {}\n\n", date);

    for (i, article) in articles.iter().enumerate() {
        message.push_str(&format!("{}. {} ({})\n", i + 1, article.title, article.source_label()));
        if !article.url.is_empty() {
            message.push_str(&format!("   🔗 {}\n", article.url));
        }
    }

    message.push_str("\nUse /top to see the latest news at any time.");
    truncate_message(&message)
}

/// Shortens `text` to `max_chars` characters, appending an ellipsis
pub fn preview(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>().trim_end())
    }
}

/// Keeps a message within Telegram's size limit
pub fn truncate_message(text: &str) -> String {
    if text.chars().count() <= TELEGRAM_MESSAGE_LIMIT {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(TELEGRAM_MESSAGE_LIMIT - 1).collect();
    truncated.push('…');
    truncated
}
