use std::fmt;

use eventlens_primitives::{Location, Position, Url};

/// Which side of an event a call site is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
	/// Raises a named event.
	Trigger,
	/// Registers a handler for a named event.
	Listener,
}

impl EventKind {
	/// The kind a call site cross-references: triggers resolve to listeners
	/// and vice versa.
	pub const fn opposite(self) -> Self {
		match self {
			Self::Trigger => Self::Listener,
			Self::Listener => Self::Trigger,
		}
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Trigger => "trigger",
			Self::Listener => "listener",
		}
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One trigger or listener call site for a named event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventOccurrence {
	pub kind: EventKind,
	/// Event name without quotes.
	pub name: String,
	/// Position of the called function's name.
	pub location: Location,
}

impl EventOccurrence {
	pub fn new(kind: EventKind, name: impl Into<String>, uri: Url, position: Position) -> Self {
		Self {
			kind,
			name: name.into(),
			location: Location::new(uri, position),
		}
	}

	pub fn uri(&self) -> &Url {
		&self.location.uri
	}
}
