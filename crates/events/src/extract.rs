//! Event call-site extraction.
//!
//! Candidates come from the language's compiled regex. Each candidate is
//! confirmed by the scope classifier: the token at the function name must
//! be exactly that name and sit in a function-call scope, which rejects
//! matches inside strings, comments and longer identifiers.

use std::ops::Range;
use std::sync::Arc;

use eventlens_primitives::TextDocument;
use eventlens_syntax::ScopeClassifier;
use tokio_util::sync::CancellationToken;

use crate::occurrence::EventOccurrence;
use crate::pattern::PatternTable;

/// Substring the innermost scope of a genuine call must contain.
const FUNCTION_SCOPE_MARKER: &str = "function";

const QUOTES: &[char] = &['"', '\'', '`'];

/// Result of one extraction run.
#[derive(Debug)]
pub enum Extracted {
	/// Every candidate was examined.
	Complete(Vec<EventOccurrence>),
	/// Cancellation stopped the run before the last candidate.
	Partial(Vec<EventOccurrence>),
}

impl Extracted {
	pub fn is_complete(&self) -> bool {
		matches!(self, Self::Complete(_))
	}

	pub fn occurrences(&self) -> &[EventOccurrence] {
		match self {
			Self::Complete(found) | Self::Partial(found) => found,
		}
	}

	pub fn into_occurrences(self) -> Vec<EventOccurrence> {
		match self {
			Self::Complete(found) | Self::Partial(found) => found,
		}
	}
}

/// A regex match awaiting scope confirmation.
struct Candidate {
	function: Range<usize>,
	event: Range<usize>,
}

/// Finds trigger and listener call sites in documents.
pub struct EventExtractor {
	patterns: Arc<PatternTable>,
	max_file_size: usize,
}

impl EventExtractor {
	pub fn new(patterns: Arc<PatternTable>, max_file_size: usize) -> Self {
		Self { patterns, max_file_size }
	}

	pub fn patterns(&self) -> &PatternTable {
		&self.patterns
	}

	/// Extracts every confirmed occurrence in `doc`.
	///
	/// Documents larger than the size ceiling are skipped only when no
	/// `cancel` token is given. A cancelled extraction stops between
	/// candidates and returns what it found so far as [`Extracted::Partial`].
	/// A token cancelled after the last candidate does not discard the result.
	pub async fn extract(
		&self,
		doc: &TextDocument,
		classifier: &dyn ScopeClassifier,
		cancel: Option<&CancellationToken>,
	) -> Extracted {
		let Some(pattern) = self.patterns.get(doc.language_id()) else {
			tracing::debug!(uri = %doc.uri(), language = doc.language_id(), "events.extract.no_patterns");
			return Extracted::Complete(Vec::new());
		};

		let size = doc.text().len_bytes();
		if cancel.is_none() && size > self.max_file_size {
			tracing::warn!(
				uri = %doc.uri(),
				size_kib = size / 1024,
				limit_kib = self.max_file_size / 1024,
				"events.extract.too_large"
			);
			return Extracted::Complete(Vec::new());
		}

		let text = doc.text().to_string();
		let candidates: Vec<Candidate> = pattern
			.regex()
			.captures_iter(&text)
			.filter_map(|caps| {
				Some(Candidate {
					function: caps.get(pattern.function_group())?.range(),
					event: caps.get(pattern.event_group())?.range(),
				})
			})
			.collect();

		let mut occurrences = Vec::new();
		for candidate in candidates {
			if cancel.is_some_and(CancellationToken::is_cancelled) {
				tracing::debug!(uri = %doc.uri(), found = occurrences.len(), "events.extract.cancelled");
				return Extracted::Partial(occurrences);
			}

			let function = &text[candidate.function.clone()];
			let position = doc.byte_to_position(candidate.function.start);
			let Some(scope) = classifier.scope_at(doc, position).await else {
				continue;
			};
			if scope.text != function || !scope.innermost_contains(FUNCTION_SCOPE_MARKER) {
				tracing::trace!(uri = %doc.uri(), %position, function, scope = ?scope.innermost(), "events.extract.rejected");
				continue;
			}

			let Some(kind) = pattern.classify(function) else {
				tracing::warn!(uri = %doc.uri(), %position, function, "events.extract.unclassified");
				continue;
			};
			let name = strip_quotes(&text[candidate.event]);
			occurrences.push(EventOccurrence::new(kind, name, doc.uri().clone(), position));
		}

		tracing::debug!(uri = %doc.uri(), version = doc.version(), count = occurrences.len(), "events.extract");
		Extracted::Complete(occurrences)
	}
}

/// Removes one pair of matching enclosing quotes.
fn strip_quotes(literal: &str) -> &str {
	let mut chars = literal.chars();
	match (chars.next(), chars.next_back()) {
		(Some(open), Some(close)) if open == close && QUOTES.contains(&open) => &literal[1..literal.len() - 1],
		_ => literal,
	}
}
