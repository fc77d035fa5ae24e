pub mod message;

use std::sync::Arc;
use teloxide::{dispatching::UpdateHandler, prelude::*};

use crate::bot::commands::CommandDispatcher;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub struct BotHandler {
    pub dispatcher: Arc<CommandDispatcher>,
}

impl BotHandler {
    pub fn new(dispatcher: Arc<CommandDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn schema(&self) -> UpdateHandler<HandlerError> {
        let dispatcher = self.dispatcher.clone();

        Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
            let dispatcher = dispatcher.clone();
            async move { message::message_handler(bot, msg, dispatcher).await }
        })
    }
}
