/// Feedback types for different command outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackType {
    Success,
    Warning,
    Error,
    Info,
}

impl FeedbackType {
    pub fn emoji(&self) -> &'static str {
        match self {
            FeedbackType::Success => "✅",
            FeedbackType::Warning => "⚠️",
            FeedbackType::Error => "❌",
            FeedbackType::Info => "ℹ️",
        }
    }
}

/// Formats a plain-text reply with the feedback emoji prefix
pub fn feedback(feedback_type: FeedbackType, message: &str) -> String {
    format!("{} {}", feedback_type.emoji(), message)
}

pub fn success(message: &str) -> String {
    feedback(FeedbackType::Success, message)
}

pub fn error(message: &str) -> String {
    feedback(FeedbackType::Error, message)
}

pub fn warning(message: &str) -> String {
    feedback(FeedbackType::Warning, message)
}

pub fn info(message: &str) -> String {
    feedback(FeedbackType::Info, message)
}

/// Error reply with a hint on how to fix the input
pub fn validation_error(error: &str, suggestion: &str) -> String {
    feedback(FeedbackType::Error, &format!("{error}\n\n💡 {suggestion}"))
}
