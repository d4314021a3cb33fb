use std::ops::Range;

use crate::position::TextRange;

/// A single content change, in pre-change coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
	/// The range that was replaced.
	pub range: TextRange,
	/// The text that replaced the range.
	pub text: String,
}

impl TextChange {
	/// Creates a change replacing `range` with `text`.
	pub fn new(range: TextRange, text: impl Into<String>) -> Self {
		Self { range, text: text.into() }
	}

	/// Creates a pure insertion at a position.
	pub fn insert(at: crate::Position, text: impl Into<String>) -> Self {
		Self::new(TextRange::point(at), text)
	}

	/// Number of line breaks in the inserted text.
	pub fn inserted_line_breaks(&self) -> usize {
		ropey::str_utils::byte_to_line_idx(&self.text, self.text.len())
	}

	/// Net change in document line count caused by this edit.
	pub fn line_delta(&self) -> isize {
		self.inserted_line_breaks() as isize - self.range.line_span() as isize
	}

	/// Lines touched by the inserted text, in post-change coordinates
	/// relative to an unshifted start line.
	pub fn new_line_range(&self) -> Range<usize> {
		let start = self.range.start.line;
		start..start + self.inserted_line_breaks() + 1
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Position;

	#[test]
	fn test_single_line_replace() {
		let change = TextChange::new(TextRange::on_line(4, 2, 6), "abc");
		assert_eq!(change.inserted_line_breaks(), 0);
		assert_eq!(change.line_delta(), 0);
		assert_eq!(change.new_line_range(), 4..5);
	}

	#[test]
	fn test_insert_lines() {
		let change = TextChange::insert(Position::new(2, 0), "a\nb\nc");
		assert_eq!(change.inserted_line_breaks(), 2);
		assert_eq!(change.line_delta(), 2);
		assert_eq!(change.new_line_range(), 2..5);
	}

	#[test]
	fn test_delete_lines() {
		let change = TextChange::new(TextRange::new(Position::new(1, 3), Position::new(4, 0)), "");
		assert_eq!(change.line_delta(), -3);
		assert_eq!(change.new_line_range(), 1..2);
	}

	#[test]
	fn test_crlf_counts_once() {
		let change = TextChange::insert(Position::new(0, 0), "x\r\ny\r\n");
		assert_eq!(change.inserted_line_breaks(), 2);
	}
}
