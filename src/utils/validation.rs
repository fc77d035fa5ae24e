use anyhow::{anyhow, Result};

/// Longest topic a user may subscribe to
pub const MAX_TOPIC_LENGTH: usize = 50;

/// Most topics a single profile may hold
pub const MAX_TOPICS: usize = 20;

pub fn validate_topic(topic: &str) -> Result<String> {
    let topic = topic.trim();

    if topic.is_empty() {
        return Err(anyhow!("Topic cannot be empty"));
    }

    if topic.chars().count() > MAX_TOPIC_LENGTH {
        return Err(anyhow!(
            "Topic cannot be longer than {} characters",
            MAX_TOPIC_LENGTH
        ));
    }

    if topic.contains('\n') || topic.contains('\r') {
        return Err(anyhow!("Topic cannot contain line breaks"));
    }

    if topic.starts_with('/') {
        return Err(anyhow!("Topic cannot start with '/'"));
    }

    Ok(topic.to_string())
}

pub fn validate_telegram_chat_id(chat_id: i64) -> Result<()> {
    if chat_id == 0 {
        return Err(anyhow!("Chat ID cannot be zero"));
    }

    // Private chat ids are user ids, which fit in 52 bits
    if chat_id > (1_i64 << 52) {
        return Err(anyhow!("Invalid user chat ID range"));
    }

    // Supergroups go down to around -10^12
    if chat_id < -2000000000000 {
        return Err(anyhow!("Chat ID out of valid range"));
    }

    Ok(())
}

/// Languages users can pick with `/lang`
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "ru", "de", "fr", "es"];

/// Regions users can pick with `/region`
pub const SUPPORTED_REGIONS: &[&str] = &["us", "gb", "ru", "ua", "de", "fr"];

/// Normalizes a two-letter code and checks it against `supported`
pub fn validate_code(kind: &str, code: &str, supported: &[&str]) -> Result<String> {
    let code = code.trim().to_lowercase();
    if supported.contains(&code.as_str()) {
        Ok(code)
    } else {
        Err(anyhow!(
            "Unsupported {} '{}'. Choose one of: {}",
            kind,
            code,
            supported.join(", ")
        ))
    }
}

/// Most articles a user may keep with `/save`
pub const MAX_SAVED: usize = 50;

/// Splits a comma separated environment value, dropping empty entries
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
