use super::CommandDispatcher;
use crate::utils::logging::{log_command_start, log_command_success};

pub async fn handle_start(ctx: &CommandDispatcher, user_id: i64) -> String {
    log_command_start("start", user_id, None);

    let created = ctx.store.get(user_id).await.is_none();
    if created {
        ctx.store.update(user_id, |_| ()).await;
        ctx.persist_after("start").await;
    }

    log_command_success("start", user_id, Some(if created { "profile created" } else { "existing profile" }));

    "👋 Welcome to News Digest Bot!\n\n\
    📰 /top shows the latest headlines, /top <topic> searches a topic.\n\
    🏷️ /topic add <topic> tailors your news.\n\
    📧 /digest 09:00 sends you a daily digest at 09:00.\n\n\
    Use /help to see all commands."
        .to_string()
}

pub fn handle_about(ctx: &CommandDispatcher, user_id: i64) -> String {
    log_command_start("about", user_id, None);

    let providers = ctx.news.provider_names();
    let providers = if providers.is_empty() {
        "none configured".to_string()
    } else {
        providers.join(", ")
    };

    format!(
        "ℹ️ News Digest Bot v{}\n\n\
        📡 News sources: {}\n\
        🕐 Digest times use UTC{}",
        env!("CARGO_PKG_VERSION"),
        providers,
        ctx.settings.utc_offset
    )
}
