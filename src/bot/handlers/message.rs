use std::sync::Arc;
use teloxide::prelude::*;

use super::HandlerError;
use crate::bot::commands::CommandDispatcher;
use crate::bot::transport::MessageTransport;
use crate::utils::feedback;
use crate::utils::logging::log_delivery_error;
use crate::utils::validation::validate_telegram_chat_id;

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dispatcher: Arc<CommandDispatcher>,
) -> Result<(), HandlerError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat_id = msg.chat.id.0;
    if let Err(e) = validate_telegram_chat_id(chat_id) {
        tracing::warn!("Ignoring message from chat {}: {}", chat_id, e);
        return Ok(());
    }

    respond(&bot, &dispatcher, chat_id, text).await;
    Ok(())
}

/// Sends the reply to `text`, if any. Send failures are logged for this chat only.
pub async fn respond(transport: &dyn MessageTransport, dispatcher: &CommandDispatcher, chat_id: i64, text: &str) {
    let Some(reply) = reply_for(dispatcher, chat_id, text).await else {
        return;
    };

    if let Err(e) = transport.send_message(chat_id, &reply).await {
        log_delivery_error(chat_id, "reply", &e.to_string());
    }
}

/// The reply to an incoming text, or `None` when the bot stays silent
pub async fn reply_for(dispatcher: &CommandDispatcher, chat_id: i64, text: &str) -> Option<String> {
    let text = text.trim();
    if text.starts_with('/') {
        // In groups, commands for other bots are none of our business
        if dispatcher.addressed_elsewhere(text) {
            return None;
        }
        return Some(dispatcher.dispatch(chat_id, text).await);
    }

    // Plain chatter gets a pointer only when it asks for help
    if text.to_lowercase().contains("help") {
        return Some(feedback::info("Use /help to see all available commands."));
    }
    None
}
