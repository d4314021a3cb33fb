use std::iter;
use std::ops::Range;
use std::sync::Arc;

use eventlens_primitives::{TextChange, TextDocument, Url};

use crate::grammar::{Grammar, LineState, Token};

/// Lines tokenized between cooperative yields.
const LINES_PER_YIELD: usize = 16;

/// Per-document line-state array.
///
/// `lines[i]` is the grammar state at the end of line `i`, or `None` when the
/// line has not been tokenized since it was created.
pub(super) struct DocumentLines {
	pub(super) uri: Url,
	pub(super) grammar: Arc<dyn Grammar>,
	pub(super) version: i32,
	pub(super) lines: Vec<Option<LineState>>,
	pub(super) generation: u64,
}

impl DocumentLines {
	pub(super) fn new(doc: &TextDocument, grammar: Arc<dyn Grammar>) -> Self {
		Self {
			uri: doc.uri().clone(),
			grammar,
			version: doc.version(),
			lines: vec![None; doc.line_count()],
			generation: 0,
		}
	}

	/// Drops every stored state and adopts the document's version.
	pub(super) fn reset(&mut self, doc: &TextDocument) {
		self.lines.clear();
		self.lines.resize(doc.line_count(), None);
		self.version = doc.version();
		self.generation += 1;
	}

	/// Resets when the stored states were computed for other content.
	pub(super) fn sync_with(&mut self, doc: &TextDocument) -> bool {
		if self.version == doc.version() && self.lines.len() == doc.line_count() {
			return false;
		}
		tracing::debug!(
			uri = %self.uri,
			stored_version = self.version,
			version = doc.version(),
			"tokenizer.resync"
		);
		self.reset(doc);
		true
	}

	fn prev_state(&self, line: usize) -> LineState {
		match line.checked_sub(1) {
			None => self.grammar.initial_state(),
			Some(prev) => self.lines[prev].clone().unwrap_or_else(|| self.grammar.initial_state()),
		}
	}

	/// First line at or before `line` whose predecessor state is known.
	fn backfill_start(&self, line: usize) -> usize {
		let mut start = line.min(self.lines.len());
		while start > 0 && self.lines[start - 1].is_none() {
			start -= 1;
		}
		start
	}

	/// Tokenizes one line and stores its end state; returns whether it changed.
	fn refresh_line(&mut self, doc: &TextDocument, line: usize) -> bool {
		let prev = self.prev_state(line);
		let out = self.grammar.tokenize_line(&doc.line(line), &prev);
		let invalidated = self.lines[line].as_ref() != Some(&out.end_state);
		self.lines[line] = Some(out.end_state);
		invalidated
	}

	/// Tokenizes `range`, then keeps going while end states keep changing.
	///
	/// Propagation past the range stops at the first line that was never
	/// tokenized: nothing beyond it holds a state that could be stale.
	/// Returns true if any stored line state changed.
	pub(super) async fn reparse(&mut self, doc: &TextDocument, range: Range<usize>) -> bool {
		let line_count = self.lines.len();
		let start = self.backfill_start(range.start);
		let end = range.end.min(line_count);

		let mut idx = start;
		let mut invalidated = false;
		let mut changed = false;
		while idx < end || (invalidated && idx < line_count && self.lines[idx].is_some()) {
			if idx > start && (idx - start) % LINES_PER_YIELD == 0 {
				tokio::task::yield_now().await;
			}
			invalidated = self.refresh_line(doc, idx);
			changed |= invalidated;
			idx += 1;
		}

		self.generation += 1;
		tracing::trace!(
			uri = %self.uri,
			requested = ?range,
			from = start,
			to = idx,
			changed,
			"tokenizer.reparse"
		);
		changed
	}

	/// Replaces the states of the lines covered by `change` (pre-change
	/// coordinates) with slots for the inserted lines.
	///
	/// The last replaced line's state moves to the last inserted line so an
	/// edit that leaves nesting untouched converges immediately.
	pub(super) fn splice(&mut self, change: &TextChange) {
		let len = self.lines.len();
		if len == 0 {
			return;
		}
		let start = change.range.start.line.min(len - 1);
		let end = change.range.end.line.clamp(start, len - 1);
		let tail = self.lines[end].take();
		let fresh = iter::repeat_n(None, change.inserted_line_breaks()).chain(iter::once(tail));
		self.lines.splice(start..=end, fresh);
	}

	/// Tokens for `line`, tokenizing any missing prefix first.
	pub(super) async fn tokens_at(&mut self, doc: &TextDocument, line: usize) -> Vec<Token> {
		let needs_prefix = line > 0 && self.lines[line - 1].is_none();
		if self.lines[line].is_none() || needs_prefix {
			self.reparse(doc, line..line + 1).await;
		}
		let prev = self.prev_state(line);
		self.grammar.tokenize_line(&doc.line(line), &prev).tokens
	}
}
