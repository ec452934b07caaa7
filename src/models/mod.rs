// src/models/mod.rs

//! Domain models for the feed splitter.
//!
//! This module contains the data structures shared between the scanning,
//! editing, publishing and serving layers.

mod config;
mod edit;
mod feed;

// Re-export all public types
pub use config::{
    Config, LoggingConfig, OutputConfig, RefreshConfig, ServerConfig, ShowRule, SourceConfig,
};
pub use edit::Edit;
pub use feed::{ShowFeed, ShowSummary, Snapshot, SplitStats};
