mod common;

use chrono::{FixedOffset, NaiveTime};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use common::{article, monday_at, MockProvider, RecordingTransport};
use news_digest_bot::bot::commands::{help_text, CommandDispatcher, CommandSettings};
use news_digest_bot::bot::handlers::message::{reply_for, respond};
use news_digest_bot::news::{NewsAggregator, NewsProvider};
use news_digest_bot::services::clock::ManualClock;
use news_digest_bot::storage::{DigestFrequency, StateStore};

/// Helper function to create a dispatcher over a fresh state file
fn create_test_dispatcher(providers: Vec<Arc<dyn NewsProvider>>) -> (CommandDispatcher, Arc<StateStore>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let store = Arc::new(StateStore::empty(temp_dir.path().join("bot_data.json")));
    let news = Arc::new(NewsAggregator::new(providers, Duration::from_secs(2)));
    let clock = Arc::new(ManualClock::new(monday_at(8, 0)));

    let dispatcher = CommandDispatcher::new(
        store.clone(),
        news,
        clock,
        CommandSettings {
            top_limit: 2,
            utc_offset: FixedOffset::east_opt(3 * 3600).unwrap(),
            language: "en".to_string(),
            region: "us".to_string(),
        },
        "testbot",
    );
    (dispatcher, store, temp_dir)
}

fn default_providers() -> Vec<Arc<dyn NewsProvider>> {
    vec![Arc::new(MockProvider::returning(
        "feed",
        vec![
            article("feed", "https://n.com/1", "Bitcoin climbs", Some(monday_at(7, 0))),
            article("feed", "https://n.com/2", "Football final tonight", Some(monday_at(6, 0))),
            article("feed", "https://n.com/3", "Bitcoin miners expand", Some(monday_at(5, 0))),
        ],
    ))]
}

#[tokio::test]
async fn test_unknown_command_gets_help() {
    let (dispatcher, store, _temp_dir) = create_test_dispatcher(default_providers());

    let reply = dispatcher.dispatch(1, "/subscribe now").await;

    assert_eq!(reply, help_text());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_help_lists_commands() {
    let (dispatcher, _store, _temp_dir) = create_test_dispatcher(default_providers());

    let reply = dispatcher.dispatch(1, "/help").await;

    assert!(reply.contains("/digest"));
    assert!(reply.contains("/top"));
}

#[tokio::test]
async fn test_start_creates_and_persists_profile() {
    let (dispatcher, store, _temp_dir) = create_test_dispatcher(default_providers());

    let reply = dispatcher.dispatch(5, "/start").await;
    assert!(reply.contains("Welcome"));
    assert!(store.get(5).await.is_some());
    assert!(!store.is_dirty().await);

    // A second /start changes nothing
    dispatcher.dispatch(5, "/start").await;
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_digest_set_status_and_off() {
    let (dispatcher, store, _temp_dir) = create_test_dispatcher(default_providers());

    let status = dispatcher.dispatch(7, "/digest").await;
    assert!(status.contains("not subscribed"));

    let reply = dispatcher.dispatch(7, "/digest 09:30").await;
    assert!(reply.contains("09:30"));
    assert!(reply.contains("UTC+03:00"));
    // 08:00 UTC is 11:00 local, so the next delivery is tomorrow
    assert!(reply.contains("05.03.2024 09:30"), "unexpected reply: {reply}");

    let status = dispatcher.dispatch(7, "/digest").await;
    assert!(status.contains("Time: 09:30"));
    assert!(status.contains("every day"));
    assert!(status.contains("all news"));

    let reply = dispatcher.dispatch(7, "/digest off").await;
    assert!(reply.contains("turned off"));
    assert!(!store.get(7).await.unwrap().is_subscribed());

    let reply = dispatcher.dispatch(7, "/digest off").await;
    assert!(reply.contains("not subscribed"));
}

#[tokio::test]
async fn test_digest_invalid_time() {
    let (dispatcher, store, _temp_dir) = create_test_dispatcher(default_providers());

    let reply = dispatcher.dispatch(7, "/digest 25:00").await;

    assert!(reply.starts_with("❌"));
    assert!(reply.contains("HH:MM"));
    assert!(store.get(7).await.is_none());
}

#[tokio::test]
async fn test_repeated_digest_commands_keep_one_profile() {
    let (dispatcher, store, _temp_dir) = create_test_dispatcher(default_providers());

    for text in ["/digest 09:00", "/digest 09:00", "/digest 10:15", "/digest 09:00"] {
        dispatcher.dispatch(11, text).await;
    }

    assert_eq!(store.len().await, 1);
    assert_eq!(store.get(11).await.unwrap().digest_time, NaiveTime::from_hms_opt(9, 0, 0));

    let reloaded = StateStore::load(store.path()).await.unwrap();
    assert_eq!(reloaded.len().await, 1);
}

#[tokio::test]
async fn test_topic_add_is_idempotent() {
    let (dispatcher, store, _temp_dir) = create_test_dispatcher(default_providers());

    let first = dispatcher.dispatch(3, "/topic add Bitcoin").await;
    let second = dispatcher.dispatch(3, "/topic add bitcoin").await;

    assert!(first.contains("added"));
    assert!(second.contains("already follow"));
    assert_eq!(store.get(3).await.unwrap().topics, vec!["Bitcoin"]);
}

#[tokio::test]
async fn test_topic_list_remove_clear() {
    let (dispatcher, store, _temp_dir) = create_test_dispatcher(default_providers());

    dispatcher.dispatch(3, "/topic add space").await;
    dispatcher.dispatch(3, "/topic add climate change").await;

    let list = dispatcher.dispatch(3, "/topic list").await;
    assert!(list.contains("1. space"));
    assert!(list.contains("2. climate change"));

    let removed = dispatcher.dispatch(3, "/topic remove SPACE").await;
    assert!(removed.contains("removed"));
    let missing = dispatcher.dispatch(3, "/topic remove space").await;
    assert!(missing.contains("don't follow"));

    dispatcher.dispatch(3, "/topic clear").await;
    assert!(store.get(3).await.unwrap().topics.is_empty());

    let unknown = dispatcher.dispatch(3, "/topic shuffle").await;
    assert!(unknown.contains("Unknown topic action"));
}

#[tokio::test]
async fn test_topic_add_rejects_invalid_topic() {
    let (dispatcher, store, _temp_dir) = create_test_dispatcher(default_providers());

    let reply = dispatcher.dispatch(3, "/topic add").await;

    assert!(reply.starts_with("❌"));
    assert!(store.get(3).await.map(|p| p.topics.is_empty()).unwrap_or(true));
}

#[tokio::test]
async fn test_freq_command() {
    let (dispatcher, store, _temp_dir) = create_test_dispatcher(default_providers());

    let reply = dispatcher.dispatch(4, "/freq weekly").await;
    assert!(reply.contains("every Monday"));
    assert!(reply.contains("/digest HH:MM"));
    assert_eq!(store.get(4).await.unwrap().frequency, DigestFrequency::Weekly);

    let reply = dispatcher.dispatch(4, "/freq hourly").await;
    assert!(reply.contains("Unknown frequency"));
    assert_eq!(store.get(4).await.unwrap().frequency, DigestFrequency::Weekly);

    let reply = dispatcher.dispatch(4, "/freq").await;
    assert!(reply.contains("weekly"));
}

#[tokio::test]
async fn test_top_with_topic() {
    let (dispatcher, _store, _temp_dir) = create_test_dispatcher(default_providers());

    let reply = dispatcher.dispatch(8, "/top bitcoin").await;

    assert!(reply.contains("1. Bitcoin climbs"));
    assert!(reply.contains("2. Bitcoin miners expand"));
    assert!(!reply.contains("Football"));
}

#[tokio::test]
async fn test_top_uses_saved_topics() {
    let (dispatcher, _store, _temp_dir) = create_test_dispatcher(default_providers());
    dispatcher.dispatch(8, "/topic add football").await;

    let reply = dispatcher.dispatch(8, "/top").await;

    assert!(reply.contains("Football final tonight"));
    assert!(!reply.contains("Bitcoin"));
}

#[tokio::test]
async fn test_top_respects_limit() {
    let (dispatcher, _store, _temp_dir) = create_test_dispatcher(default_providers());

    let reply = dispatcher.dispatch(8, "/top").await;

    assert!(reply.contains("1. Bitcoin climbs"));
    assert!(reply.contains("2. Football final tonight"));
    assert!(!reply.contains("Bitcoin miners"));
}

#[tokio::test]
async fn test_top_when_sources_are_down() {
    let (dispatcher, _store, _temp_dir) =
        create_test_dispatcher(vec![Arc::new(MockProvider::failing("down", "dns error"))]);

    let reply = dispatcher.dispatch(8, "/top").await;

    assert!(reply.contains("unavailable"));
    assert!(!reply.contains("dns error"));
}

#[tokio::test]
async fn test_about_lists_providers() {
    let (dispatcher, _store, _temp_dir) = create_test_dispatcher(default_providers());

    let reply = dispatcher.dispatch(1, "/about").await;

    assert!(reply.contains(env!("CARGO_PKG_VERSION")));
    assert!(reply.contains("feed"));
}

#[tokio::test]
async fn test_reply_for_plain_text() {
    let (dispatcher, _store, _temp_dir) = create_test_dispatcher(default_providers());

    assert!(reply_for(&dispatcher, 1, "good morning").await.is_none());
    assert!(reply_for(&dispatcher, 1, "help me please").await.unwrap().contains("/help"));
    assert_eq!(reply_for(&dispatcher, 1, "/help").await.unwrap(), help_text());
}

#[tokio::test]
async fn test_topic_rename_and_remove_by_number() {
    let (dispatcher, store, _temp_dir) = create_test_dispatcher(default_providers());
    dispatcher.dispatch(3, "/topic add space").await;
    dispatcher.dispatch(3, "/topic add climate").await;

    let reply = dispatcher.dispatch(3, "/topic rename 1 space exploration").await;
    assert!(reply.contains("'space' renamed to 'space exploration'"), "unexpected reply: {reply}");

    let taken = dispatcher.dispatch(3, "/topic rename 1 Climate").await;
    assert!(taken.starts_with("❌"));
    let missing = dispatcher.dispatch(3, "/topic rename 9 anything").await;
    assert!(missing.contains("no topic number 9"));
    let not_a_number = dispatcher.dispatch(3, "/topic rename space moon").await;
    assert!(not_a_number.starts_with("❌"));

    let removed = dispatcher.dispatch(3, "/topic remove 2").await;
    assert!(removed.contains("'climate' removed"));
    assert_eq!(store.get(3).await.unwrap().topics, vec!["space exploration"]);

    let reloaded = StateStore::load(store.path()).await.unwrap();
    assert_eq!(reloaded.get(3).await.unwrap().topics, vec!["space exploration"]);
}

fn two_providers() -> Vec<Arc<dyn NewsProvider>> {
    vec![
        Arc::new(MockProvider::returning(
            "newsapi",
            vec![article("newsapi", "https://a.com/1", "Markets open higher", Some(monday_at(7, 0)))],
        )),
        Arc::new(MockProvider::returning(
            "rss",
            vec![article("rss", "https://b.com/1", "Local weather warning", Some(monday_at(6, 0)))],
        )),
    ]
}

#[tokio::test]
async fn test_sources_selection() {
    let (dispatcher, store, _temp_dir) = create_test_dispatcher(two_providers());

    let list = dispatcher.dispatch(2, "/sources").await;
    assert!(list.contains("✅ newsapi"));
    assert!(list.contains("✅ rss"));

    let reply = dispatcher.dispatch(2, "/sources RSS").await;
    assert!(reply.contains("from: rss"), "unexpected reply: {reply}");
    assert_eq!(store.get(2).await.unwrap().sources, vec!["rss"]);

    let top = dispatcher.dispatch(2, "/top").await;
    assert!(top.contains("Local weather warning"));
    assert!(!top.contains("Markets"));

    let invalid = dispatcher.dispatch(2, "/sources bbc").await;
    assert!(invalid.starts_with("❌"));
    assert!(invalid.contains("newsapi, rss"));
    assert_eq!(store.get(2).await.unwrap().sources, vec!["rss"]);

    // Naming every source means no filter
    dispatcher.dispatch(2, "/sources rss, newsapi").await;
    assert!(store.get(2).await.unwrap().sources.is_empty());

    dispatcher.dispatch(2, "/sources newsapi").await;
    let reply = dispatcher.dispatch(2, "/sources all").await;
    assert!(reply.contains("all sources"));
    assert!(store.get(2).await.unwrap().sources.is_empty());
}

#[tokio::test]
async fn test_lang_and_region() {
    let (dispatcher, store, _temp_dir) = create_test_dispatcher(default_providers());

    let current = dispatcher.dispatch(6, "/lang").await;
    assert!(current.contains("en (default)"));

    let reply = dispatcher.dispatch(6, "/lang DE").await;
    assert!(reply.contains("set to de"));
    assert_eq!(store.get(6).await.unwrap().language.as_deref(), Some("de"));

    let invalid = dispatcher.dispatch(6, "/region xx").await;
    assert!(invalid.starts_with("❌"));
    assert!(invalid.contains("Unsupported region"));
    assert!(store.get(6).await.unwrap().region.is_none());

    dispatcher.dispatch(6, "/region gb").await;
    let reloaded = StateStore::load(store.path()).await.unwrap();
    assert_eq!(reloaded.get(6).await.unwrap().region.as_deref(), Some("gb"));

    let reset = dispatcher.dispatch(6, "/lang default").await;
    assert!(reset.contains("reset to the default (en)"));
    assert!(store.get(6).await.unwrap().language.is_none());
}

#[tokio::test]
async fn test_save_from_last_list_and_by_link() {
    let (dispatcher, store, _temp_dir) = create_test_dispatcher(default_providers());

    let early = dispatcher.dispatch(9, "/save 1").await;
    assert!(early.contains("Run /top or /search first"));

    dispatcher.dispatch(9, "/top").await;
    let reply = dispatcher.dispatch(9, "/save 2").await;
    assert!(reply.contains("Saved: Football final tonight"), "unexpected reply: {reply}");
    let again = dispatcher.dispatch(9, "/save 2").await;
    assert!(again.contains("already saved"));
    let beyond = dispatcher.dispatch(9, "/save 3").await;
    assert!(beyond.contains("no article 3"));

    let link = dispatcher.dispatch(9, "/save https://example.com/story").await;
    assert!(link.contains("Saved: https://example.com/story"));
    let junk = dispatcher.dispatch(9, "/save later").await;
    assert!(junk.starts_with("❌"));

    let saved = dispatcher.dispatch(9, "/saved").await;
    assert!(saved.contains("1. Football final tonight"));
    assert!(saved.contains("🔗 https://n.com/2"));
    assert!(saved.contains("2. https://example.com/story"));

    let reloaded = StateStore::load(store.path()).await.unwrap();
    assert_eq!(reloaded.get(9).await.unwrap().saved.len(), 2);

    dispatcher.dispatch(9, "/saved clear").await;
    assert!(store.get(9).await.unwrap().saved.is_empty());
    assert!(dispatcher.dispatch(9, "/saved").await.contains("no saved articles"));
}

#[tokio::test]
async fn test_search_groups_results_by_topic() {
    let (dispatcher, _store, _temp_dir) = create_test_dispatcher(default_providers());

    let hint = dispatcher.dispatch(4, "/search").await;
    assert!(hint.contains("/topic add"));

    dispatcher.dispatch(4, "/topic add bitcoin").await;
    dispatcher.dispatch(4, "/topic add football").await;
    dispatcher.dispatch(4, "/topic add volcanoes").await;

    let reply = dispatcher.dispatch(4, "/search").await;
    let bitcoin = reply.find("🏷️ bitcoin").expect("bitcoin group");
    let football = reply.find("🏷️ football").expect("football group");
    assert!(bitcoin < football);
    assert!(!reply.contains("volcanoes"));
    assert!(reply.contains("1. Bitcoin climbs"));
    assert!(reply.contains("2. Bitcoin miners expand"));
    assert!(reply.contains("3. Football final tonight"));

    // Numbers keep counting across groups for /save
    let saved = dispatcher.dispatch(4, "/save 3").await;
    assert!(saved.contains("Football final tonight"));

    let none = dispatcher.dispatch(4, "/search volcanoes").await;
    assert!(none.contains("No fresh news"));
}

#[tokio::test]
async fn test_commands_for_other_bots_are_ignored() {
    let (dispatcher, store, _temp_dir) = create_test_dispatcher(default_providers());

    assert!(reply_for(&dispatcher, 1, "/top@otherbot").await.is_none());
    assert!(reply_for(&dispatcher, 1, "/digest@OtherBot 09:00").await.is_none());
    assert!(store.get(1).await.is_none());

    let ours = reply_for(&dispatcher, 1, "/top@testbot").await.unwrap();
    assert!(ours.contains("Bitcoin climbs"));
}

#[tokio::test]
async fn test_failed_reply_is_logged_not_raised() {
    let (dispatcher, _store, _temp_dir) = create_test_dispatcher(default_providers());

    let blocked = RecordingTransport::failing_for(&[1]);
    respond(&blocked, &dispatcher, 1, "/help").await;
    assert!(blocked.messages().is_empty());

    let open = RecordingTransport::new();
    respond(&open, &dispatcher, 2, "/help").await;
    respond(&open, &dispatcher, 2, "just chatting").await;
    assert_eq!(open.messages_to(2), vec![help_text()]);
}
