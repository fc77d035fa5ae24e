use url::Url;

use super::CommandDispatcher;
use crate::storage::SavedArticle;
use crate::utils::feedback;
use crate::utils::format::format_saved;
use crate::utils::logging::{log_command_start, log_command_success, log_validation_error};
use crate::utils::validation::MAX_SAVED;

const SAVE_HINT: &str = "Send /save 2 to keep the second article of your last /top or /search, or /save <url>.";

enum SaveOutcome {
    Saved(String),
    AlreadySaved,
    Full,
}

pub async fn handle_save(ctx: &CommandDispatcher, user_id: i64, arg: &str) -> String {
    let arg = arg.trim();
    log_command_start("save", user_id, (!arg.is_empty()).then_some(arg));

    if arg.is_empty() {
        return feedback::validation_error("Tell me what to save", SAVE_HINT);
    }

    let now = ctx.clock.now();
    let article = if arg.starts_with("http://") || arg.starts_with("https://") {
        if let Err(e) = Url::parse(arg) {
            log_validation_error("save", "url", arg, &e.to_string(), user_id);
            return feedback::validation_error(&format!("'{arg}' is not a valid link"), SAVE_HINT);
        }
        SavedArticle {
            title: arg.to_string(),
            url: arg.to_string(),
            source: "manual".to_string(),
            saved_at: now,
        }
    } else {
        let Ok(number) = arg.parse::<usize>() else {
            log_validation_error("save", "target", arg, "not a number or link", user_id);
            return feedback::validation_error(&format!("'{arg}' is not an article number or link"), SAVE_HINT);
        };
        let Some(found) = ctx.recent_result(user_id, number).await else {
            return feedback::info(&format!(
                "There is no article {number} in your last list. Run /top or /search first."
            ));
        };
        SavedArticle {
            title: found.title.clone(),
            url: found.url.clone(),
            source: found.source_label().to_string(),
            saved_at: now,
        }
    };

    let outcome = ctx
        .store
        .update(user_id, |profile| {
            if profile.saved.len() >= MAX_SAVED {
                SaveOutcome::Full
            } else if profile.save_article(article.clone()) {
                SaveOutcome::Saved(article.title.clone())
            } else {
                SaveOutcome::AlreadySaved
            }
        })
        .await;

    match outcome {
        SaveOutcome::Saved(title) => {
            ctx.persist_after("save").await;
            log_command_success("save", user_id, Some(&title));
            feedback::success(&format!("Saved: {title}"))
        }
        SaveOutcome::AlreadySaved => feedback::info("This article is already saved. See /saved."),
        SaveOutcome::Full => feedback::warning(&format!(
            "You already keep {MAX_SAVED} articles. Clean up with /saved clear."
        )),
    }
}

pub async fn handle_saved(ctx: &CommandDispatcher, user_id: i64, arg: &str) -> String {
    let arg = arg.trim();
    log_command_start("saved", user_id, (!arg.is_empty()).then_some(arg));

    if arg.eq_ignore_ascii_case("clear") {
        let cleared = ctx
            .store
            .update(user_id, |profile| std::mem::take(&mut profile.saved).len())
            .await;
        if cleared > 0 {
            ctx.persist_after("saved").await;
            log_command_success("saved", user_id, Some(&format!("cleared {cleared}")));
        }
        return feedback::success("Saved articles cleared.");
    }

    let saved = ctx.profile(user_id).await.saved;
    format_saved(&saved, ctx.settings.utc_offset)
}
