use super::CommandDispatcher;
use crate::utils::feedback;
use crate::utils::logging::{log_command_start, log_command_success, log_validation_error};

pub async fn handle_sources(ctx: &CommandDispatcher, user_id: i64, arg: &str) -> String {
    let arg = arg.trim();
    log_command_start("sources", user_id, (!arg.is_empty()).then_some(arg));

    let available = ctx.news.provider_names();
    if available.is_empty() {
        return feedback::warning("No news sources are configured for this bot.");
    }

    if arg.is_empty() {
        let selected = ctx.profile(user_id).await.sources;
        return describe_sources(&available, &selected);
    }

    let mut sources: Vec<String> = Vec::new();
    if !arg.eq_ignore_ascii_case("all") {
        for name in arg.split(|c: char| c == ',' || c.is_whitespace()).filter(|s| !s.is_empty()) {
            let name = name.to_lowercase();
            if !available.contains(&name) {
                log_validation_error("sources", "source", &name, "not configured", user_id);
                return feedback::validation_error(
                    &format!("Source '{name}' is not available"),
                    &format!("Available sources: {}. Example: /sources {}", available.join(", "), available[0]),
                );
            }
            if !sources.contains(&name) {
                sources.push(name);
            }
        }
    }

    // Picking every source is the same as not filtering
    if available.iter().all(|name| sources.contains(name)) {
        sources.clear();
    }

    let changed = ctx
        .store
        .update(user_id, |profile| {
            let changed = profile.sources != sources;
            profile.sources = sources.clone();
            changed
        })
        .await;
    if changed {
        ctx.persist_after("sources").await;
    }

    log_command_success("sources", user_id, Some(&if sources.is_empty() { "all".to_string() } else { sources.join(",") }));

    if sources.is_empty() {
        feedback::success("You will get news from all sources.")
    } else {
        feedback::success(&format!("You will get news from: {}.", sources.join(", ")))
    }
}

fn describe_sources(available: &[String], selected: &[String]) -> String {
    let mut message = "📡 News sources:\n\n".to_string();
    for name in available {
        let on = selected.is_empty() || selected.contains(name);
        message.push_str(&format!("{} {}\n", if on { "✅" } else { "▫️" }, name));
    }
    message.push_str("\nPick with /sources <name, ...> or reset with /sources all.");
    message
}
