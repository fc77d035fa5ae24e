use news_digest_bot::utils::datetime::{parse_digest_time, parse_utc_offset};
use news_digest_bot::utils::validation::*;

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_valid_topics() {
        let valid_topics = vec![
            "technology".to_string(),
            "Rust programming".to_string(),
            "AI & ML".to_string(),
            "Формула-1".to_string(),
            "x".repeat(MAX_TOPIC_LENGTH),
            "  climate  ".to_string(),
        ];

        for topic in valid_topics {
            assert!(validate_topic(&topic).is_ok(), "Should accept topic: {}", topic);
        }
    }

    #[test]
    fn test_invalid_topics() {
        let invalid_topics = vec![
            "".to_string(),
            "   ".to_string(),
            "x".repeat(MAX_TOPIC_LENGTH + 1),
            "two\nlines".to_string(),
            "/digest".to_string(),
        ];

        for topic in invalid_topics {
            assert!(validate_topic(&topic).is_err(), "Should reject topic: {:?}", topic);
        }
    }

    #[test]
    fn test_topic_error_messages() {
        let err = validate_topic("").unwrap_err().to_string();
        assert!(err.contains("cannot be empty"));

        let err = validate_topic(&"x".repeat(MAX_TOPIC_LENGTH + 1)).unwrap_err().to_string();
        assert!(err.contains(&MAX_TOPIC_LENGTH.to_string()));
    }

    #[test]
    fn test_valid_telegram_chat_ids() {
        let valid_chat_ids = vec![1, 123456789, 5_000_000_000, -123456789, -1001234567890];

        for chat_id in valid_chat_ids {
            assert!(validate_telegram_chat_id(chat_id).is_ok(), "Should accept chat_id: {}", chat_id);
        }
    }

    #[test]
    fn test_invalid_telegram_chat_ids() {
        let invalid_chat_ids = vec![0, (1_i64 << 52) + 1, -2000000000001, i64::MIN, i64::MAX];

        for chat_id in invalid_chat_ids {
            assert!(validate_telegram_chat_id(chat_id).is_err(), "Should reject chat_id: {}", chat_id);
        }
    }

    #[test]
    fn test_valid_digest_times() {
        for time in ["00:00", "09:00", "9:05", "12:30", "23:59", " 18:45 "] {
            assert!(parse_digest_time(time).is_ok(), "Should accept time: {}", time);
        }
    }

    #[test]
    fn test_invalid_digest_times() {
        for time in ["", "24:00", "12:60", "9", "09-00", "9am", "09:00:00", "noon"] {
            assert!(parse_digest_time(time).is_err(), "Should reject time: {}", time);
        }
    }

    #[test]
    fn test_utc_offsets() {
        assert_eq!(parse_utc_offset("+00:00").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("+03:00").unwrap().local_minus_utc(), 10800);
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_utc_offset("Europe/Moscow").is_err());
    }

    #[test]
    fn test_split_list_whitespace_handling() {
        let items = split_list(" https://a.com/rss ,https://b.com/feed,, ");
        assert_eq!(items, vec!["https://a.com/rss", "https://b.com/feed"]);
    }
}
