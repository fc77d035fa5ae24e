use super::{sources_unavailable, CommandDispatcher};
use crate::news::{FetchOptions, NewsError};
use crate::utils::format::format_news_list;
use crate::utils::logging::{log_command_error, log_command_start, log_command_success};

pub async fn handle_top(ctx: &CommandDispatcher, user_id: i64, topic: &str) -> String {
    let topic = topic.trim();
    log_command_start("top", user_id, (!topic.is_empty()).then_some(topic));

    let limit = ctx.settings.top_limit;
    let profile = ctx.profile(user_id).await;
    let options = FetchOptions::for_profile(&profile);
    let (result, heading) = if topic.is_empty() {
        let heading = if profile.topics.is_empty() {
            "Top news".to_string()
        } else {
            format!("Top news for your topics: {}", profile.topics.join(", "))
        };
        (ctx.news.fetch_for_topics(&profile.topics, limit, &options).await, heading)
    } else {
        (ctx.news.fetch_top_with(Some(topic), limit, &options).await, format!("Top news: {topic}"))
    };

    match result {
        Ok(articles) => {
            log_command_success("top", user_id, Some(&format!("{} articles", articles.len())));
            let reply = format_news_list(&articles, &heading, ctx.settings.utc_offset);
            ctx.remember_results(user_id, articles).await;
            reply
        }
        Err(e @ NewsError::AllSourcesUnavailable { .. }) => {
            log_command_error("top", user_id, &e.to_string());
            sources_unavailable()
        }
    }
}
