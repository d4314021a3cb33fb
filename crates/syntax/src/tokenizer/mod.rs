//! Incremental per-document tokenization.
//!
//! Each tracked document owns an array of end-of-line grammar states behind
//! its own async mutex. Edits splice the array and re-tokenize only the
//! touched lines, continuing forward until a line's end state converges
//! with the one stored before the edit.
//!
//! Documents are independent: there is no ordering across documents and the
//! shared map is only locked long enough to look up or insert an entry.

mod lines;

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use eventlens_primitives::{Position, TextChange, TextDocument, TextRange, Url};
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use self::lines::DocumentLines;
use crate::grammar::{GrammarEngine, GrammarError, GrammarProvider};
use crate::registry::GrammarRegistry;
use crate::scope::{ScopeClassifier, ScopeInfo};

type DocEntry = Arc<AsyncMutex<DocumentLines>>;

/// Owns line states for every tracked document.
pub struct Tokenizer {
	registry: GrammarRegistry,
	documents: Mutex<HashMap<Url, DocEntry>>,
}

impl Tokenizer {
	pub fn new(provider: Arc<dyn GrammarProvider>, engine: Arc<dyn GrammarEngine>) -> Self {
		Self {
			registry: GrammarRegistry::new(provider, engine),
			documents: Mutex::new(HashMap::new()),
		}
	}

	pub fn registry(&self) -> &GrammarRegistry {
		&self.registry
	}

	/// Returns the document's entry, creating it on first use.
	async fn entry(&self, doc: &TextDocument) -> Result<DocEntry, GrammarError> {
		if let Some(entry) = self.documents.lock().get(doc.uri()) {
			return Ok(entry.clone());
		}

		let grammar = self.registry.grammar_for_language(doc.language_id()).await?;
		let entry = self
			.documents
			.lock()
			.entry(doc.uri().clone())
			.or_insert_with(|| {
				tracing::debug!(uri = %doc.uri(), scope = grammar.scope_name(), "tokenizer.track");
				Arc::new(AsyncMutex::new(DocumentLines::new(doc, grammar.clone())))
			})
			.clone();
		Ok(entry)
	}

	/// Starts tracking a document and tokenizes it in full.
	pub async fn open(&self, doc: &TextDocument) -> Result<(), GrammarError> {
		let entry = self.entry(doc).await?;
		let mut state = entry.lock().await;
		state.sync_with(doc);
		let line_count = state.lines.len();
		state.reparse(doc, 0..line_count).await;
		Ok(())
	}

	/// Tokenizes `lines`, propagating forward past the range while line
	/// end states keep changing.
	///
	/// Returns true if any stored line state changed.
	pub async fn ensure_tokenized(&self, doc: &TextDocument, lines: Range<usize>) -> Result<bool, GrammarError> {
		let entry = self.entry(doc).await?;
		let mut state = entry.lock().await;
		state.sync_with(doc);
		Ok(state.reparse(doc, lines).await)
	}

	/// Applies host edits to a tracked document.
	///
	/// `doc` is the post-edit snapshot and `changes` are in pre-edit
	/// coordinates. Untracked documents are ignored; they are tokenized
	/// lazily on the next query.
	pub async fn apply_changes(&self, doc: &TextDocument, changes: &[TextChange]) {
		let Some(entry) = self.documents.lock().get(doc.uri()).cloned() else {
			return;
		};
		let mut state = entry.lock().await;
		if doc.version() <= state.version {
			tracing::trace!(uri = %doc.uri(), version = doc.version(), "tokenizer.changes.stale");
			return;
		}

		let mut sorted: Vec<&TextChange> = changes.iter().collect();
		sorted.sort_by(|a, b| b.range.start.cmp(&a.range.start));
		for change in &sorted {
			state.splice(change);
		}

		if state.lines.len() != doc.line_count() {
			tracing::warn!(
				uri = %doc.uri(),
				tracked = state.lines.len(),
				actual = doc.line_count(),
				"tokenizer.changes.line_count_mismatch"
			);
			state.reset(doc);
			return;
		}

		// Shift each change's line range by the deltas of the changes before it.
		let mut shift = 0isize;
		let mut ranges = Vec::with_capacity(sorted.len());
		for change in sorted.iter().rev() {
			let local = change.new_line_range();
			let start = local.start.saturating_add_signed(shift);
			ranges.push(start..start + local.len());
			shift += change.line_delta();
		}

		for range in ranges.into_iter().rev() {
			state.reparse(doc, range).await;
		}
		state.version = doc.version();
	}

	/// Discards a document's line states and re-tokenizes it in full.
	pub async fn refresh(&self, doc: &TextDocument) -> Result<(), GrammarError> {
		let entry = self.entry(doc).await?;
		let mut state = entry.lock().await;
		state.reset(doc);
		let line_count = state.lines.len();
		state.reparse(doc, 0..line_count).await;
		Ok(())
	}

	/// Stops tracking a document. Returns false if it was not tracked.
	pub fn close(&self, uri: &Url) -> bool {
		let removed = self.documents.lock().remove(uri).is_some();
		if removed {
			tracing::debug!(%uri, "tokenizer.untrack");
		}
		removed
	}

	/// Returns true if the document has line state.
	pub fn is_tracked(&self, uri: &Url) -> bool {
		self.documents.lock().contains_key(uri)
	}

	/// Mutation counter for a tracked document's line states.
	pub async fn generation(&self, uri: &Url) -> Option<u64> {
		let entry = self.documents.lock().get(uri).cloned()?;
		Some(entry.lock().await.generation)
	}

	/// Number of lines with a stored end state.
	pub async fn tokenized_line_count(&self, uri: &Url) -> Option<usize> {
		let entry = self.documents.lock().get(uri).cloned()?;
		let state = entry.lock().await;
		Some(state.lines.iter().filter(|line| line.is_some()).count())
	}
}

#[async_trait]
impl ScopeClassifier for Tokenizer {
	async fn scope_at(&self, doc: &TextDocument, position: Position) -> Option<ScopeInfo> {
		let entry = match self.entry(doc).await {
			Ok(entry) => entry,
			Err(err) => {
				tracing::warn!(uri = %doc.uri(), language = doc.language_id(), error = %err, "tokenizer.grammar_unavailable");
				return None;
			}
		};
		let mut state = entry.lock().await;
		state.sync_with(doc);

		let pos = doc.clamp_position(position);
		let tokens = state.tokens_at(doc, pos.line).await;
		let token = match tokens.iter().find(|t| t.contains(pos.column)) {
			Some(token) => token,
			None => {
				tracing::trace!(uri = %doc.uri(), %pos, "tokenizer.scope.fallback_last_token");
				tokens.last()?
			}
		};

		let line = doc.line(pos.line);
		Some(ScopeInfo {
			range: TextRange::on_line(pos.line, token.start, token.end),
			text: line.get(token.start..token.end).unwrap_or_default().to_string(),
			scopes: token.scopes.clone(),
		})
	}
}
