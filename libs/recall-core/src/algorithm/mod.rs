//! Spaced repetition scheduling.

pub mod sm2;

pub use sm2::{review_priority, Sm2};
