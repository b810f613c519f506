//! # trustcheck
//!
//! Look up the public review rating of the website behind a URL.
//!
//! ## Architecture
//!
//! ```text
//! URL → domain → cache ─(miss)→ resolver → [api →] scraper → extractor
//!                   ↑                                          │
//!                   └──────────────── rating ──────────────────┘
//! ```
//!
//! - [`domain`]: Turns URLs into canonical and root domains
//! - [`resolver`]: Picks retrieval strategies and falls back between them
//! - [`cache`]: TTL cache mirrored to durable storage
//! - [`lookup`]: Cache-aware, deduplicated lookups
//!
//! ## Quick Start
//!
//! ```bash
//! # Rating for the site behind a URL
//! trustcheck lookup https://shop.example.co.uk/cart
//!
//! # Query a rating API first, fall back to the profile page
//! trustcheck config set base_url https://api.example.com
//!
//! # What is cached and for how long
//! trustcheck cache list
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// config, store, cache, resolver, lookup service.
pub mod app;

/// Rating cache with per-entry TTL.
///
/// - [`RatingCache`](cache::RatingCache): in-memory map persisted as one record
/// - [`Clock`](cache::Clock): time source, swappable in tests
pub mod cache;

/// Command-line interface using clap.
///
/// - `lookup <url-or-domain>...` - Look up ratings
/// - `cache list|info|clear|reset-ttl|sweep` - Manage the cache
/// - `config show|path|set|reset` - Manage configuration
pub mod cli;

/// Configuration loaded from `~/.config/trustcheck/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Rating`](domain::Rating): A validated rating snapshot
/// - Domain normalization: [`extract_domain`](domain::extract_domain),
///   [`extract_root_domain`](domain::extract_root_domain)
pub mod domain;

/// Rating extraction from review profile HTML.
pub mod extractor;

/// HTTP access and the two retrieval strategies.
///
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based client
/// - [`ApiStrategy`](fetcher::ApiStrategy): JSON rating endpoint
/// - [`ScraperStrategy`](fetcher::ScraperStrategy): profile page plus extractor
pub mod fetcher;

pub mod lookup;

/// Strategy selection with fallback.
pub mod resolver;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Key/value record storage
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
