//! Line-based grammar engine for tests.
//!
//! Understands line comments, one block comment pair, quoted strings and
//! identifiers. An identifier followed by `(` is classified as a function
//! call. The only state carried across lines is "inside a block comment".
//!
//! Grammar sources are `key=value` lines:
//!
//! ```text
//! line_comment=--
//! block_comment=--[[ ]]
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::grammar::{Grammar, GrammarEngine, GrammarError, LineState, LineTokens, Token};

/// Lua-flavoured test grammar source.
pub const LUA_GRAMMAR: &str = "line_comment=--\nblock_comment=--[[ ]]\n";
/// JavaScript-flavoured test grammar source.
pub const JS_GRAMMAR: &str = "line_comment=//\nblock_comment=/* */\n";
/// `.sublime-syntax` Lua subset for the syntect engine.
pub const LUA_SUBLIME_SYNTAX: &str = include_str!("../grammars/lua.sublime-syntax");

/// Compiles [`LineGrammar`]s and counts compile/tokenize calls.
#[derive(Debug, Default)]
pub struct TestGrammarEngine {
	pub compile_count: AtomicUsize,
	tokenize_count: Arc<AtomicUsize>,
}

impl TestGrammarEngine {
	pub fn new() -> Self {
		Self::default()
	}

	/// Total `tokenize_line` calls across all grammars compiled by this engine.
	pub fn tokenize_calls(&self) -> usize {
		self.tokenize_count.load(Ordering::SeqCst)
	}

	/// Resets the tokenize call counter.
	pub fn reset_calls(&self) {
		self.tokenize_count.store(0, Ordering::SeqCst);
	}
}

impl GrammarEngine for TestGrammarEngine {
	fn compile(&self, scope_name: &str, source: &str) -> Result<Arc<dyn Grammar>, GrammarError> {
		self.compile_count.fetch_add(1, Ordering::SeqCst);
		let grammar = LineGrammar::parse(scope_name, source)?.counting(self.tokenize_count.clone());
		Ok(Arc::new(grammar))
	}
}

/// The only state a [`LineGrammar`] carries across lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineMode {
	Code,
	BlockComment,
}

/// A compiled test grammar.
#[derive(Debug)]
pub struct LineGrammar {
	scope: String,
	line_comment: Option<String>,
	block_comment: Option<(String, String)>,
	calls: Arc<AtomicUsize>,
}

impl LineGrammar {
	/// Parses a `key=value` grammar source.
	pub fn parse(scope_name: &str, source: &str) -> Result<Self, GrammarError> {
		let compile_error = |message: String| GrammarError::Compile {
			scope: scope_name.to_string(),
			message,
		};

		let mut grammar = Self {
			scope: scope_name.to_string(),
			line_comment: None,
			block_comment: None,
			calls: Arc::default(),
		};
		for line in source.lines().map(str::trim).filter(|l| !l.is_empty()) {
			let (key, value) = line
				.split_once('=')
				.ok_or_else(|| compile_error(format!("expected key=value, got {line:?}")))?;
			match key.trim() {
				"line_comment" => grammar.line_comment = Some(value.trim().to_string()),
				"block_comment" => {
					let (open, close) = value
						.trim()
						.split_once(' ')
						.ok_or_else(|| compile_error("block_comment needs open and close markers".into()))?;
					grammar.block_comment = Some((open.to_string(), close.trim().to_string()));
				}
				other => return Err(compile_error(format!("unknown key {other:?}"))),
			}
		}
		Ok(grammar)
	}

	fn counting(mut self, calls: Arc<AtomicUsize>) -> Self {
		self.calls = calls;
		self
	}

	fn token(&self, start: usize, end: usize, scope: &str) -> Token {
		Token {
			start,
			end,
			scopes: vec![self.scope.clone(), scope.to_string()],
		}
	}

	/// Scans a block comment body starting at `from`; returns its end and
	/// whether the comment is still open at end of line.
	fn block_comment_end(&self, line: &str, from: usize) -> (usize, bool) {
		let Some((_, close)) = &self.block_comment else {
			return (line.len(), false);
		};
		match line[from..].find(close.as_str()) {
			Some(i) => (from + i + close.len(), false),
			None => (line.len(), true),
		}
	}
}

fn run_len(rest: &str, pred: impl Fn(char) -> bool) -> usize {
	rest.char_indices().find(|&(_, c)| !pred(c)).map_or(rest.len(), |(i, _)| i)
}

fn string_end(line: &str, start: usize, quote: char) -> usize {
	let mut escaped = false;
	for (i, c) in line[start + 1..].char_indices() {
		match c {
			'\\' if !escaped => escaped = true,
			c if c == quote && !escaped => return start + 1 + i + c.len_utf8(),
			_ => escaped = false,
		}
	}
	line.len()
}

impl Grammar for LineGrammar {
	fn scope_name(&self) -> &str {
		&self.scope
	}

	fn initial_state(&self) -> LineState {
		LineState::new(LineMode::Code)
	}

	fn tokenize_line(&self, line: &str, prev: &LineState) -> LineTokens {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let mut tokens = Vec::new();
		let mut in_block = prev.downcast_ref::<LineMode>() == Some(&LineMode::BlockComment);
		let mut pos = 0;

		while pos < line.len() {
			let rest = &line[pos..];

			if in_block {
				let (end, open) = self.block_comment_end(line, pos);
				tokens.push(self.token(pos, end, "comment.block"));
				in_block = open;
				pos = end;
				continue;
			}

			if let Some((open, _)) = &self.block_comment
				&& rest.starts_with(open.as_str())
			{
				let (end, still_open) = self.block_comment_end(line, pos + open.len());
				tokens.push(self.token(pos, end, "comment.block"));
				in_block = still_open;
				pos = end;
				continue;
			}

			if let Some(marker) = &self.line_comment
				&& rest.starts_with(marker.as_str())
			{
				tokens.push(self.token(pos, line.len(), "comment.line"));
				break;
			}

			let Some(c) = rest.chars().next() else {
				break;
			};
			let end = if c == '"' || c == '\'' {
				let end = string_end(line, pos, c);
				tokens.push(self.token(pos, end, "string.quoted"));
				end
			} else if c.is_whitespace() {
				let end = pos + run_len(rest, char::is_whitespace);
				tokens.push(self.token(pos, end, "whitespace"));
				end
			} else if c.is_alphabetic() || c == '_' {
				let end = pos + run_len(rest, |c| c.is_alphanumeric() || c == '_');
				let is_call = line[end..].trim_start().starts_with('(');
				let scope = if is_call { "entity.name.function.call" } else { "variable.other" };
				tokens.push(self.token(pos, end, scope));
				end
			} else {
				let end = pos + c.len_utf8();
				tokens.push(self.token(pos, end, "punctuation"));
				end
			};
			pos = end;
		}

		let end_state = if in_block { LineMode::BlockComment } else { LineMode::Code };
		LineTokens {
			tokens,
			end_state: LineState::new(end_state),
		}
	}
}
