#![deny(clippy::print_stderr)]

//! Core text types shared by the tokenizer and the event index.
//!
//! Coordinates are zero-based. A [`Position`] column is a byte offset into
//! its line, and lines follow ropey's line-break model.

/// Text edits reported by the host editor.
pub mod change;
/// Host document snapshot with versioning.
pub mod document;
/// Line/column positions and ranges.
pub mod position;

pub use change::TextChange;
pub use document::{EditError, Location, TextDocument};
pub use position::{Position, TextRange};
pub use ropey::{Rope, RopeSlice};
pub use url::Url;
