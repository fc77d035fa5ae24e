use super::CommandDispatcher;
use crate::utils::feedback;
use crate::utils::logging::{log_command_start, log_command_success, log_validation_error};
use crate::utils::validation::{validate_topic, MAX_TOPICS};

const USAGE: &str =
    "Usage: /topic add <topic>, /topic remove <topic|number>, /topic rename <number> <new name>, /topic list or /topic clear";

pub async fn handle_topic(ctx: &CommandDispatcher, user_id: i64, arg: &str) -> String {
    let arg = arg.trim();
    log_command_start("topic", user_id, (!arg.is_empty()).then_some(arg));

    let (action, rest) = match arg.split_once(char::is_whitespace) {
        Some((action, rest)) => (action, rest.trim()),
        None => (arg, ""),
    };

    match action.to_lowercase().as_str() {
        "add" => add_topic(ctx, user_id, rest).await,
        "remove" | "rm" | "del" => remove_topic(ctx, user_id, rest).await,
        "rename" | "mv" => rename_topic(ctx, user_id, rest).await,
        "list" | "" => list_topics(ctx, user_id).await,
        "clear" => clear_topics(ctx, user_id).await,
        _ => feedback::validation_error(&format!("Unknown topic action '{action}'"), USAGE),
    }
}

async fn add_topic(ctx: &CommandDispatcher, user_id: i64, raw: &str) -> String {
    let topic = match validate_topic(raw) {
        Ok(topic) => topic,
        Err(e) => {
            log_validation_error("topic", "topic", raw, &e.to_string(), user_id);
            return feedback::validation_error(&e.to_string(), "Example: /topic add technology");
        }
    };

    let outcome = ctx
        .store
        .update(user_id, |profile| {
            if profile.has_topic(&topic) {
                Ok(false)
            } else if profile.topics.len() >= MAX_TOPICS {
                Err(profile.topics.len())
            } else {
                Ok(profile.add_topic(&topic))
            }
        })
        .await;

    match outcome {
        Ok(true) => {
            ctx.persist_after("topic").await;
            log_command_success("topic", user_id, Some(&format!("added {topic}")));
            feedback::success(&format!("Topic '{topic}' added."))
        }
        Ok(false) => feedback::info(&format!("You already follow '{topic}'.")),
        Err(count) => feedback::warning(&format!(
            "You already follow {count} topics, the maximum is {MAX_TOPICS}. Remove one first."
        )),
    }
}

async fn remove_topic(ctx: &CommandDispatcher, user_id: i64, raw: &str) -> String {
    let topic = raw.trim();
    if topic.is_empty() {
        return feedback::validation_error("Topic cannot be empty", "Example: /topic remove technology");
    }

    let removed = ctx
        .store
        .update(user_id, |profile| {
            // A number picks from /topic list unless a topic has that exact name
            if !profile.has_topic(topic) {
                let index = topic.parse::<usize>().ok().and_then(|n| n.checked_sub(1));
                return index
                    .filter(|&i| i < profile.topics.len())
                    .map(|i| profile.topics.remove(i));
            }
            let needle = topic.to_lowercase();
            let position = profile.topics.iter().position(|t| t.to_lowercase() == needle)?;
            Some(profile.topics.remove(position))
        })
        .await;

    let Some(removed) = removed else {
        return feedback::info(&format!("You don't follow '{topic}'."));
    };

    ctx.persist_after("topic").await;
    log_command_success("topic", user_id, Some(&format!("removed {removed}")));
    feedback::success(&format!("Topic '{removed}' removed."))
}

async fn rename_topic(ctx: &CommandDispatcher, user_id: i64, raw: &str) -> String {
    const HINT: &str = "Example: /topic rename 1 space exploration";

    let (number, new_name) = match raw.split_once(char::is_whitespace) {
        Some((number, new_name)) => (number, new_name.trim()),
        None => (raw, ""),
    };
    let Some(index) = number.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
        log_validation_error("topic", "number", number, "not a topic number", user_id);
        return feedback::validation_error("The first argument must be a topic number from /topic list", HINT);
    };
    let new_name = match validate_topic(new_name) {
        Ok(name) => name,
        Err(e) => {
            log_validation_error("topic", "topic", new_name, &e.to_string(), user_id);
            return feedback::validation_error(&e.to_string(), HINT);
        }
    };

    let outcome = ctx
        .store
        .update(user_id, |profile| profile.rename_topic(index, &new_name))
        .await;

    match outcome {
        Ok(old) if old == new_name => feedback::info(&format!("Topic '{new_name}' is unchanged.")),
        Ok(old) => {
            ctx.persist_after("topic").await;
            log_command_success("topic", user_id, Some(&format!("renamed {old} to {new_name}")));
            feedback::success(&format!("Topic '{old}' renamed to '{new_name}'."))
        }
        Err(reason) => feedback::validation_error(&reason, "See your topics with /topic list"),
    }
}

async fn list_topics(ctx: &CommandDispatcher, user_id: i64) -> String {
    let topics = ctx.store.get(user_id).await.map(|p| p.topics).unwrap_or_default();
    if topics.is_empty() {
        return feedback::info("You don't follow any topics, so you get the general news feed.\n\nAdd one with /topic add <topic>.");
    }

    let mut message = "🏷️ Your topics:\n\n".to_string();
    for (i, topic) in topics.iter().enumerate() {
        message.push_str(&format!("{}. {}\n", i + 1, topic));
    }
    message.trim_end().to_string()
}

async fn clear_topics(ctx: &CommandDispatcher, user_id: i64) -> String {
    let cleared = ctx
        .store
        .update(user_id, |profile| {
            let count = profile.topics.len();
            profile.topics.clear();
            count
        })
        .await;

    if cleared > 0 {
        ctx.persist_after("topic").await;
        log_command_success("topic", user_id, Some(&format!("cleared {cleared}")));
    }
    feedback::success("Topics cleared. You will get the general news feed.")
}
