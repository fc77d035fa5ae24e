use super::CommandDispatcher;
use crate::storage::DigestFrequency;
use crate::utils::feedback;
use crate::utils::logging::{log_command_start, log_command_success, log_validation_error};

pub async fn handle_freq(ctx: &CommandDispatcher, user_id: i64, arg: &str) -> String {
    let arg = arg.trim();
    log_command_start("freq", user_id, (!arg.is_empty()).then_some(arg));

    if arg.is_empty() {
        let current = ctx.store.get(user_id).await.map(|p| p.frequency).unwrap_or_default();
        return feedback::info(&format!(
            "Digest frequency: {} ({}).\n\nChange it with /freq daily, /freq weekly or /freq weekdays.",
            current,
            current.describe()
        ));
    }

    let frequency: DigestFrequency = match arg.parse() {
        Ok(frequency) => frequency,
        Err(e) => {
            log_validation_error("freq", "frequency", arg, &e.to_string(), user_id);
            return feedback::validation_error(&e.to_string(), "Example: /freq weekdays");
        }
    };

    let (changed, subscribed) = ctx
        .store
        .update(user_id, |profile| {
            let changed = profile.frequency != frequency;
            profile.frequency = frequency;
            (changed, profile.is_subscribed())
        })
        .await;
    if changed {
        ctx.persist_after("freq").await;
    }

    log_command_success("freq", user_id, Some(frequency.as_str()));

    let mut reply = feedback::success(&format!("Digests will be sent {}.", frequency.describe()));
    if !subscribed {
        reply.push_str("\n\nSet a delivery time with /digest HH:MM to start receiving them.");
    }
    reply
}
