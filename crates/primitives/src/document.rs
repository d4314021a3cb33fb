use std::borrow::Cow;
use std::path::PathBuf;

use ropey::Rope;
use thiserror::Error;
use url::Url;

use crate::change::TextChange;
use crate::position::Position;

const LINE_ENDINGS: &[char] = &['\n', '\r', '\u{000B}', '\u{000C}', '\u{0085}', '\u{2028}', '\u{2029}'];

/// A source location: document plus position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
	/// Document URI.
	pub uri: Url,
	/// Position inside the document.
	pub position: Position,
}

impl Location {
	/// Creates a new location.
	pub fn new(uri: Url, position: Position) -> Self {
		Self { uri, position }
	}
}

/// Errors produced when applying edits to a [`TextDocument`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
	#[error("position {0} is outside the document")]
	OutOfBounds(Position),
	#[error("edit range ends before it starts: {start} > {end}")]
	Inverted { start: Position, end: Position },
}

/// Snapshot of a host document.
///
/// The host owns document contents; this type is the view the tokenizer
/// and extractor read from. `version` increases on every content change.
#[derive(Debug, Clone)]
pub struct TextDocument {
	uri: Url,
	language_id: String,
	version: i32,
	text: Rope,
}

impl TextDocument {
	/// Creates a document snapshot.
	pub fn new(uri: Url, language_id: impl Into<String>, version: i32, text: &str) -> Self {
		Self {
			uri,
			language_id: language_id.into(),
			version,
			text: Rope::from_str(text),
		}
	}

	/// Document URI.
	pub fn uri(&self) -> &Url {
		&self.uri
	}

	/// Language identifier (e.g. "lua").
	pub fn language_id(&self) -> &str {
		&self.language_id
	}

	/// Current content version.
	pub fn version(&self) -> i32 {
		self.version
	}

	/// Full document text.
	pub fn text(&self) -> &Rope {
		&self.text
	}

	/// Filesystem path for `file:` URIs, otherwise the URI path component.
	pub fn path(&self) -> PathBuf {
		self.uri.to_file_path().unwrap_or_else(|_| PathBuf::from(self.uri.path()))
	}

	/// Number of lines, including the empty line after a trailing newline.
	pub fn line_count(&self) -> usize {
		self.text.len_lines()
	}

	/// Returns line `idx` without its line ending.
	///
	/// Out-of-range indices yield an empty line.
	pub fn line(&self, idx: usize) -> Cow<'_, str> {
		if idx >= self.line_count() {
			return Cow::Borrowed("");
		}
		match Cow::<str>::from(self.text.line(idx)) {
			Cow::Borrowed(s) => Cow::Borrowed(s.trim_end_matches(LINE_ENDINGS)),
			Cow::Owned(mut s) => {
				let trimmed = s.trim_end_matches(LINE_ENDINGS).len();
				s.truncate(trimmed);
				Cow::Owned(s)
			}
		}
	}

	/// Converts an absolute byte offset into a position.
	pub fn byte_to_position(&self, byte: usize) -> Position {
		let byte = byte.min(self.text.len_bytes());
		let line = self.text.byte_to_line(byte);
		Position::new(line, byte - self.text.line_to_byte(line))
	}

	/// Converts a position into an absolute byte offset.
	pub fn position_to_byte(&self, pos: Position) -> Result<usize, EditError> {
		if pos.line >= self.line_count() {
			return Err(EditError::OutOfBounds(pos));
		}
		let line_start = self.text.line_to_byte(pos.line);
		let line_len = self.text.line(pos.line).len_bytes();
		if pos.column > line_len {
			return Err(EditError::OutOfBounds(pos));
		}
		Ok(line_start + pos.column)
	}

	/// Clamps a position to the document, like an editor's validate step.
	pub fn clamp_position(&self, pos: Position) -> Position {
		let line = pos.line.min(self.line_count() - 1);
		Position::new(line, pos.column.min(self.line(line).len()))
	}

	/// Applies pre-change-coordinate edits and bumps the version.
	///
	/// Changes are applied back-to-front so earlier ranges stay valid.
	pub fn apply_changes(&mut self, changes: &[TextChange]) -> Result<(), EditError> {
		let mut sorted: Vec<&TextChange> = changes.iter().collect();
		sorted.sort_by(|a, b| b.range.start.cmp(&a.range.start));

		let mut resolved = Vec::with_capacity(sorted.len());
		for change in sorted {
			let start = self.position_to_byte(change.range.start)?;
			let end = self.position_to_byte(change.range.end)?;
			if end < start {
				return Err(EditError::Inverted {
					start: change.range.start,
					end: change.range.end,
				});
			}
			resolved.push((start, end, change.text.as_str()));
		}

		for (start, end, text) in resolved {
			let start_char = self.text.byte_to_char(start);
			let end_char = self.text.byte_to_char(end);
			self.text.remove(start_char..end_char);
			self.text.insert(start_char, text);
		}
		self.version += 1;
		Ok(())
	}
}
