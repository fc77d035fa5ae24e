use tracing::{debug, error, info, warn};

/// Logs command start with consistent format
pub fn log_command_start(command: &str, user_id: i64, details: Option<&str>) {
    match details {
        Some(d) => info!("CMD_START: {} by user {} - {}", command, user_id, d),
        None => info!("CMD_START: {} by user {}", command, user_id),
    }
}

/// Logs command completion with consistent format
pub fn log_command_success(command: &str, user_id: i64, details: Option<&str>) {
    match details {
        Some(d) => info!("CMD_SUCCESS: {} by user {} - {}", command, user_id, d),
        None => info!("CMD_SUCCESS: {} by user {}", command, user_id),
    }
}

/// Logs command errors with consistent format
pub fn log_command_error(command: &str, user_id: i64, error: &str) {
    error!("CMD_ERROR: {} by user {} - {}", command, user_id, error);
}

/// Logs validation errors with consistent format
pub fn log_validation_error(command: &str, field: &str, value: &str, error: &str, user_id: i64) {
    warn!(
        "VALIDATION_ERROR: {} - {} field '{}' invalid: {} - user {}",
        command, field, value, error, user_id
    );
}

/// Logs state store operations with consistent format
pub fn log_storage_operation(operation: &str, details: Option<&str>) {
    match details {
        Some(d) => debug!("STORE_OP: {} - {}", operation, d),
        None => debug!("STORE_OP: {}", operation),
    }
}

/// Logs state store errors with consistent format
pub fn log_storage_error(operation: &str, error: &str, details: Option<&str>) {
    match details {
        Some(d) => error!("STORE_ERROR: {} failed: {} - {}", operation, error, d),
        None => error!("STORE_ERROR: {} failed: {}", operation, error),
    }
}

/// Logs a news provider failure that was excluded from a fetch
pub fn log_provider_error(provider: &str, error: &str) {
    warn!("PROVIDER_ERROR: {} excluded from fetch - {}", provider, error);
}

/// Logs a failed digest delivery for one subscriber
pub fn log_delivery_error(user_id: i64, stage: &str, error: &str) {
    error!("DELIVERY_ERROR: message to user {} failed at {} - {}", user_id, stage, error);
}

/// Logs timeout events with consistent format
pub fn log_timeout(operation: &str, duration_secs: u64, details: Option<&str>) {
    match details {
        Some(d) => warn!("TIMEOUT: {} after {}s - {}", operation, duration_secs, d),
        None => warn!("TIMEOUT: {} after {}s", operation, duration_secs),
    }
}

/// Logs system events with consistent format
pub fn log_system_event(event: &str, details: Option<&str>) {
    match details {
        Some(d) => info!("SYSTEM: {} - {}", event, d),
        None => info!("SYSTEM: {}", event),
    }
}
