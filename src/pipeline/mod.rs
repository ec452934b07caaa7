//! Pipeline entry points for feed splitting.
//!
//! - `split_feed`: Turn one aggregated feed document into a snapshot
//! - `Refresher`: Keep the published snapshot current

pub mod refresh;
pub mod split;

pub use refresh::Refresher;
pub use split::split_feed;
