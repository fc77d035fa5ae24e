use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::RequestError;
use thiserror::Error;

use crate::utils::format::truncate_message;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("telegram request failed: {0}")]
    Telegram(#[from] RequestError),
}

/// Outbound plain-text channel to a user
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send_message(&self, user_id: i64, text: &str) -> Result<(), TransportError>;
}

#[async_trait]
impl MessageTransport for Bot {
    async fn send_message(&self, user_id: i64, text: &str) -> Result<(), TransportError> {
        Requester::send_message(self, ChatId(user_id), truncate_message(text)).await?;
        Ok(())
    }
}
