//! Service layer for the feed splitter.
//!
//! This module contains the document-level logic for:
//! - Region scanning (`FeedScanner`)
//! - Title classification (`TitleClassifier`)
//! - Header edit planning and application (`editor`)
//! - Per-show feed assembly (`assembler`)

pub mod assembler;
pub mod classifier;
pub mod editor;
pub mod scanner;

pub use classifier::TitleClassifier;
pub use scanner::{Episode, FeedScanner, ParsedFeed};
