//! Discovery of exportable training sessions in the diary.
//!
//! This module walks diary month pages through a logged-in [`Session`](crate::session::Session)
//! and extracts training session identifiers from their markup. The main entry points are
//! [`discover`], [`discover_range`] and the pure [`parse_exercise_ids`].

mod diary_crawler;
mod link_extractor;
mod period_range;

// Re-export public API
pub use diary_crawler::{discover, discover_range, DiscoveryOutcome};
pub use link_extractor::parse_exercise_ids;
pub use period_range::{parse_period, periods_between, validate_period_format};
