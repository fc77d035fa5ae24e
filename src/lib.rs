//! # News Digest Bot
//!
//! A Telegram bot that aggregates news from several providers and sends
//! scheduled digests to subscribers.
//!
//! ## Features
//! - `/top` headlines merged from NewsAPI, Mediastack and RSS feeds
//! - Per-user topics with deduplicated, recency-ranked results
//! - Daily, weekday or weekly digests at a chosen time
//! - Crash-safe JSON state file
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Bot commands, update handlers and the outbound message transport
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// News providers, merging, deduplication and ranking
pub mod news;
/// Background services: digest scheduling, clock and health checks
pub mod services;
/// Per-user state and its JSON persistence
pub mod storage;
/// Utility functions for datetime, validation, formatting and logging
pub mod utils;
