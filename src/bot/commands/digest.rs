use super::CommandDispatcher;
use crate::storage::UserProfile;
use crate::utils::datetime::{format_datetime, format_digest_time, next_delivery, parse_digest_time};
use crate::utils::feedback;
use crate::utils::logging::{log_command_start, log_command_success, log_validation_error};

pub async fn handle_digest(ctx: &CommandDispatcher, user_id: i64, arg: &str) -> String {
    let arg = arg.trim();
    log_command_start("digest", user_id, (!arg.is_empty()).then_some(arg));

    if arg.is_empty() {
        return digest_status(ctx, user_id).await;
    }

    if arg.eq_ignore_ascii_case("off") {
        let was_subscribed = ctx
            .store
            .update(user_id, |profile| profile.digest_time.take().is_some())
            .await;
        if !was_subscribed {
            return feedback::info("You are not subscribed to digests. Use /digest HH:MM to subscribe.");
        }
        ctx.persist_after("digest").await;
        log_command_success("digest", user_id, Some("unsubscribed"));
        return feedback::success("Digest turned off. Use /digest HH:MM to turn it back on.");
    }

    let time = match parse_digest_time(arg) {
        Ok(time) => time,
        Err(e) => {
            log_validation_error("digest", "time", arg, &e.to_string(), user_id);
            return feedback::validation_error(
                &e.to_string(),
                "Send /digest 09:00 to get your digest at 09:00, or /digest off to stop it.",
            );
        }
    };

    let (changed, profile) = ctx
        .store
        .update(user_id, |profile| {
            let changed = profile.digest_time != Some(time);
            profile.digest_time = Some(time);
            (changed, profile.clone())
        })
        .await;
    if changed {
        ctx.persist_after("digest").await;
    }

    log_command_success("digest", user_id, Some(&format_digest_time(time)));

    let mut reply = feedback::success(&format!(
        "Digest scheduled at {} (UTC{}), {}.",
        format_digest_time(time),
        ctx.settings.utc_offset,
        profile.frequency.describe()
    ));
    if let Some(next) = next_delivery(&profile, ctx.clock.now(), ctx.settings.utc_offset) {
        reply.push_str(&format!("\n📅 Next delivery: {}", format_datetime(&next, ctx.settings.utc_offset)));
    }
    reply
}

async fn digest_status(ctx: &CommandDispatcher, user_id: i64) -> String {
    let profile = ctx
        .store
        .get(user_id)
        .await
        .unwrap_or_else(|| UserProfile::new(user_id));

    let Some(time) = profile.digest_time else {
        return feedback::info("You are not subscribed to digests.\n\nUse /digest HH:MM to get a digest every day, for example /digest 09:00.");
    };

    let offset = ctx.settings.utc_offset;
    let topics = if profile.topics.is_empty() {
        "all news".to_string()
    } else {
        profile.topics.join(", ")
    };

    let mut status = format!(
        "📧 Digest settings\n\n\
        🕐 Time: {} (UTC{})\n\
        🔁 Frequency: {}\n\
        🏷️ Topics: {}",
        format_digest_time(time),
        offset,
        profile.frequency.describe(),
        topics
    );
    if let Some(next) = next_delivery(&profile, ctx.clock.now(), offset) {
        status.push_str(&format!("\n📅 Next delivery: {}", format_datetime(&next, offset)));
    }
    if let Some(last) = profile.last_sent {
        status.push_str(&format!("\n✉️ Last sent: {}", format_datetime(&last, offset)));
    }
    status
}
