// src/lib.rs

//! feedsplit Library
//!
//! Splits one aggregated podcast feed into one feed per show. Episode blocks
//! are copied byte for byte; only the channel title, `<itunes:name>` and
//! `<itunes:block>` of each per-show header are rewritten.

pub mod error;
pub mod models;
pub mod pipeline;
#[cfg(feature = "server")]
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;
