use super::{sources_unavailable, CommandDispatcher};
use crate::news::{FetchOptions, NewsError};
use crate::utils::feedback;
use crate::utils::format::format_search_results;
use crate::utils::logging::{log_command_error, log_command_start, log_command_success};

/// Articles shown per topic
const SEARCH_PER_TOPIC: usize = 5;

pub async fn handle_search(ctx: &CommandDispatcher, user_id: i64, arg: &str) -> String {
    let arg = arg.trim();
    log_command_start("search", user_id, (!arg.is_empty()).then_some(arg));

    let profile = ctx.profile(user_id).await;
    let topics: Vec<String> = if arg.is_empty() {
        profile.topics.clone()
    } else {
        arg.split(',').map(str::trim).filter(|t| !t.is_empty()).map(str::to_string).collect()
    };
    if topics.is_empty() {
        return feedback::info("Add topics first with /topic add <topic>, or search directly: /search bitcoin, space");
    }

    let options = FetchOptions::for_profile(&profile);
    match ctx.news.search(&topics, SEARCH_PER_TOPIC, &options).await {
        Ok(groups) if groups.is_empty() => {
            log_command_success("search", user_id, Some("no matches"));
            feedback::info("No fresh news for your topics right now.")
        }
        Ok(groups) => {
            let found: Vec<_> = groups.iter().flat_map(|(_, articles)| articles.iter().cloned()).collect();
            log_command_success("search", user_id, Some(&format!("{} articles in {} topics", found.len(), groups.len())));
            ctx.remember_results(user_id, found).await;
            format_search_results(&groups, ctx.settings.utc_offset)
        }
        Err(e @ NewsError::AllSourcesUnavailable { .. }) => {
            log_command_error("search", user_id, &e.to_string());
            sources_unavailable()
        }
    }
}
