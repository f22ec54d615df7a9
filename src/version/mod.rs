//! Version tracking layer for watched releases
//!
//! This module provides the core functionality for fetching, normalizing,
//! classifying and persisting versions across platforms (App Store, Google Play,
//! TapTap, GitHub, RSS).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Fetcher   │────▶│   Checker   │◀────│   History   │
//! │   (fetch)   │     │ (classify)  │     │  (storage)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │  Fetchers   │     │   Policy    │
//! │ (per store) │     │ (overrides) │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`checker`]: Update classification against history records
//! - [`error`]: Error types for fetching, history, delivery and configuration
//! - [`fetcher`]: Fetcher trait for reading versions from remote sources
//! - [`fetchers`]: Concrete fetcher implementations
//! - [`history`]: JSON-file version history with atomic saves
//! - [`http`]: Shared HTTP client and retry policy
//! - [`normalize`]: Build-number stripping and unusable-value detection
//! - [`policy`]: App, group and global override resolution
//! - [`types`]: Platforms and watched items

pub mod checker;
pub mod error;
pub mod fetcher;
pub mod fetchers;
pub mod history;
pub mod http;
pub mod normalize;
pub mod policy;
pub mod types;
