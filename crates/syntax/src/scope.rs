//! Scope classification at a text position.

use async_trait::async_trait;
use eventlens_primitives::{Position, TextDocument, TextRange};

/// The token covering a position, with its scope stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeInfo {
	/// Token range on its line.
	pub range: TextRange,
	/// Token text.
	pub text: String,
	/// Scope names from least to most specific.
	pub scopes: Vec<String>,
}

impl ScopeInfo {
	/// The innermost scope name.
	pub fn innermost(&self) -> Option<&str> {
		self.scopes.last().map(String::as_str)
	}

	/// Returns true if the innermost scope name contains `marker`.
	pub fn innermost_contains(&self, marker: &str) -> bool {
		self.innermost().is_some_and(|scope| scope.contains(marker))
	}
}

/// Resolves the lexical scope at a document position.
#[async_trait]
pub trait ScopeClassifier: Send + Sync {
	/// Returns `None` when the document's grammar cannot be resolved or the
	/// line has no tokens.
	async fn scope_at(&self, document: &TextDocument, position: Position) -> Option<ScopeInfo>;
}
