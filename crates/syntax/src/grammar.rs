//! Grammar engine seam.
//!
//! Grammars are supplied by an embeddable lexical grammar interpreter. This
//! crate never inspects a grammar's rule stack; it only stores and compares
//! the [`LineState`] each line ends in.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when resolving or compiling a grammar.
#[derive(Error, Debug)]
pub enum GrammarError {
	#[error("no language registered for extension: {0}")]
	UnknownExtension(String),

	#[error("no grammar scope registered for language: {0}")]
	UnknownLanguage(String),

	#[error("grammar not found: {0}")]
	NotFound(String),

	#[error("failed to compile grammar {scope}: {message}")]
	Compile { scope: String, message: String },

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

/// Engine-defined parser state carried by a [`LineState`].
///
/// Implemented for every `PartialEq` type, so engines wrap their own state
/// type directly.
pub trait EngineState: Any + fmt::Debug + Send + Sync {
	/// Structural equality against a state of any engine.
	fn eq_state(&self, other: &dyn EngineState) -> bool;

	fn as_any(&self) -> &dyn Any;
}

impl<T: Any + PartialEq + fmt::Debug + Send + Sync> EngineState for T {
	fn eq_state(&self, other: &dyn EngineState) -> bool {
		other.as_any().downcast_ref::<T>().is_some_and(|other| self == other)
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

/// Opaque lexical nesting at the end of a line.
///
/// Produced by a [`Grammar`]; consumers only clone and compare it. States of
/// different engines never compare equal.
#[derive(Clone)]
pub struct LineState(Arc<dyn EngineState>);

impl LineState {
	pub fn new<S: EngineState>(state: S) -> Self {
		Self(Arc::new(state))
	}

	/// The wrapped state, if it was built by the engine that defines `S`.
	pub fn downcast_ref<S: EngineState>(&self) -> Option<&S> {
		(*self.0).as_any().downcast_ref::<S>()
	}
}

impl PartialEq for LineState {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0) || (*self.0).eq_state(&*other.0)
	}
}

impl Eq for LineState {}

impl fmt::Debug for LineState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("LineState").field(&self.0).finish()
	}
}

/// A classified span of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
	/// Start byte offset in the line (inclusive).
	pub start: usize,
	/// End byte offset in the line (exclusive).
	pub end: usize,
	/// Scope names from least to most specific.
	pub scopes: Vec<String>,
}

impl Token {
	/// Returns true if `column` lies in `[start, end)`.
	pub fn contains(&self, column: usize) -> bool {
		self.start <= column && column < self.end
	}

	/// The token's innermost classification.
	pub fn innermost(&self) -> Option<&str> {
		self.scopes.last().map(String::as_str)
	}
}

/// Result of tokenizing one line.
#[derive(Debug, Clone)]
pub struct LineTokens {
	pub tokens: Vec<Token>,
	pub end_state: LineState,
}

/// A compiled grammar for a single scope.
pub trait Grammar: Send + Sync {
	/// Root scope name (e.g. `source.lua`).
	fn scope_name(&self) -> &str;

	/// State preceding the first line of a document.
	fn initial_state(&self) -> LineState;

	/// Tokenizes `line` (without its line ending) starting from `prev`.
	fn tokenize_line(&self, line: &str, prev: &LineState) -> LineTokens;
}

/// Compiles grammar sources into [`Grammar`]s.
pub trait GrammarEngine: Send + Sync {
	fn compile(&self, scope_name: &str, source: &str) -> Result<Arc<dyn Grammar>, GrammarError>;
}

/// Host-supplied language and grammar metadata.
#[async_trait]
pub trait GrammarProvider: Send + Sync {
	/// Maps a file extension (with leading dot, e.g. `.lua`) to a language id.
	fn language_for_extension(&self, extension: &str) -> Option<String>;

	/// Maps a language id to its root grammar scope name.
	fn scope_for_language(&self, language_id: &str) -> Option<String>;

	/// Loads the grammar source for a scope.
	async fn grammar_source(&self, scope_name: &str) -> Result<String, GrammarError>;
}
