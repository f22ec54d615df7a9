//! One monitoring run: fetch every platform batch, classify, persist and notify
//!
//! # Modules
//!
//! - [`refresh`]: Bounded concurrent fetching of one platform batch
//! - [`aggregate`]: Folds fetch results into history, display state and update buffer
//! - [`runner`]: Orchestrates a full run

pub mod aggregate;
pub mod refresh;
pub mod runner;
