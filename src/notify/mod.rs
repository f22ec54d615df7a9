//! Notification layer: grouping updated apps into messages and pushing them
//!
//! # Modules
//!
//! - [`format`]: Group partitioning, line rendering, dedup and shared image selection
//! - [`notifier`]: `Notifier` trait and paced batch delivery
//! - [`bark`]: Bark push transport

pub mod bark;
pub mod format;
pub mod notifier;
