//! # Utilities

pub mod merge;

pub use merge::{deep_merge, merge_into};
