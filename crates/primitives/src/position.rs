use std::fmt;

/// Position in line/column coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
	/// Zero-based line index.
	pub line: usize,
	/// Zero-based byte offset in the line.
	pub column: usize,
}

impl Position {
	/// Creates a new position.
	pub const fn new(line: usize, column: usize) -> Self {
		Self { line, column }
	}
}

impl fmt::Display for Position {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.line + 1, self.column + 1)
	}
}

/// Range with start and end positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextRange {
	/// Start position (inclusive).
	pub start: Position,
	/// End position (exclusive).
	pub end: Position,
}

impl TextRange {
	/// Creates a new range.
	pub const fn new(start: Position, end: Position) -> Self {
		Self { start, end }
	}

	/// Creates a zero-length range at a position.
	pub const fn point(pos: Position) -> Self {
		Self { start: pos, end: pos }
	}

	/// Creates a range covering `start..end` columns on a single line.
	pub const fn on_line(line: usize, start: usize, end: usize) -> Self {
		Self {
			start: Position::new(line, start),
			end: Position::new(line, end),
		}
	}

	/// Returns true if the range has zero length.
	pub fn is_empty(&self) -> bool {
		self.start == self.end
	}

	/// Number of line breaks spanned by the range.
	pub fn line_span(&self) -> usize {
		self.end.line.saturating_sub(self.start.line)
	}
}
