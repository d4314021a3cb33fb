//! [`GrammarEngine`] for Sublime Text `.sublime-syntax` grammars, interpreted
//! by syntect.
//!
//! The [`LineState`] of a line is syntect's parser state together with the
//! scope stack open at its end. An empty grammar source selects a syntax the
//! engine was preloaded with.

use std::fmt;
use std::sync::Arc;

use syntect::parsing::{ParseState, Scope, ScopeStack, SyntaxDefinition, SyntaxSet};

use crate::grammar::{Grammar, GrammarEngine, GrammarError, LineState, LineTokens, Token};

/// Parser position plus the scopes still open at the end of a line.
#[derive(Debug, Clone, PartialEq)]
struct SublimeState {
	parse: ParseState,
	scopes: ScopeStack,
}

/// Compiles `.sublime-syntax` sources into [`SublimeGrammar`]s.
pub struct SublimeSyntaxEngine {
	preloaded: SyntaxSet,
}

impl SublimeSyntaxEngine {
	/// An engine with no preloaded syntaxes; every grammar comes from its source.
	pub fn new() -> Self {
		Self::with_syntax_set(SyntaxSet::default())
	}

	/// An engine preloaded with syntect's bundled syntaxes (Lua, JavaScript
	/// and others), for providers that serve [`crate::GrammarSource::Builtin`].
	pub fn with_bundled_syntaxes() -> Self {
		Self::with_syntax_set(SyntaxSet::load_defaults_nonewlines())
	}

	/// Grammar sources may include any syntax in `preloaded` by scope.
	pub fn with_syntax_set(preloaded: SyntaxSet) -> Self {
		Self { preloaded }
	}
}

impl Default for SublimeSyntaxEngine {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for SublimeSyntaxEngine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SublimeSyntaxEngine")
			.field("preloaded", &self.preloaded.syntaxes().len())
			.finish()
	}
}

impl GrammarEngine for SublimeSyntaxEngine {
	fn compile(&self, scope_name: &str, source: &str) -> Result<Arc<dyn Grammar>, GrammarError> {
		let compile_error = |message: String| GrammarError::Compile {
			scope: scope_name.to_string(),
			message,
		};
		let scope = Scope::new(scope_name).map_err(|err| compile_error(err.to_string()))?;

		let set = if source.trim().is_empty() {
			self.preloaded.clone()
		} else {
			let definition = SyntaxDefinition::load_from_str(source, false, Some(scope_name))
				.map_err(|err| compile_error(err.to_string()))?;
			let mut builder = self.preloaded.clone().into_builder();
			builder.add(definition);
			builder.build()
		};

		let syntax = set
			.find_syntax_by_scope(scope)
			.ok_or_else(|| GrammarError::NotFound(scope_name.to_string()))?;
		let initial = SublimeState {
			parse: ParseState::new(syntax),
			scopes: ScopeStack::new(),
		};
		tracing::debug!(scope = scope_name, syntax = %syntax.name, "grammar.sublime.compile");

		Ok(Arc::new(SublimeGrammar {
			scope: scope_name.to_string(),
			set,
			initial,
		}))
	}
}

/// A syntect syntax bound to the set it was compiled in.
pub struct SublimeGrammar {
	scope: String,
	set: SyntaxSet,
	initial: SublimeState,
}

impl fmt::Debug for SublimeGrammar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SublimeGrammar").field("scope", &self.scope).finish()
	}
}

fn token(start: usize, end: usize, scopes: &ScopeStack) -> Token {
	Token {
		start,
		end,
		scopes: scopes.as_slice().iter().map(|scope| scope.build_string()).collect(),
	}
}

impl Grammar for SublimeGrammar {
	fn scope_name(&self) -> &str {
		&self.scope
	}

	fn initial_state(&self) -> LineState {
		LineState::new(self.initial.clone())
	}

	fn tokenize_line(&self, line: &str, prev: &LineState) -> LineTokens {
		let mut state = prev
			.downcast_ref::<SublimeState>()
			.cloned()
			.unwrap_or_else(|| self.initial.clone());

		let ops = match state.parse.parse_line(line, &self.set) {
			Ok(ops) => ops,
			Err(err) => {
				tracing::warn!(scope = %self.scope, error = %err, "grammar.sublime.parse_failed");
				return LineTokens {
					tokens: vec![token(0, line.len(), &state.scopes)],
					end_state: prev.clone(),
				};
			}
		};

		let mut tokens = Vec::new();
		let mut start = 0;
		for (offset, op) in ops {
			if offset > start {
				tokens.push(token(start, offset, &state.scopes));
				start = offset;
			}
			if let Err(err) = state.scopes.apply(&op) {
				tracing::warn!(scope = %self.scope, error = ?err, "grammar.sublime.scope_stack");
			}
		}
		if start < line.len() {
			tokens.push(token(start, line.len(), &state.scopes));
		}

		LineTokens {
			tokens,
			end_state: LineState::new(state),
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::testing::LUA_SUBLIME_SYNTAX;

	fn lua() -> Arc<dyn Grammar> {
		SublimeSyntaxEngine::new().compile("source.lua", LUA_SUBLIME_SYNTAX).unwrap()
	}

	/// State after a line that opens nothing.
	fn top_level(grammar: &dyn Grammar) -> LineState {
		grammar.tokenize_line("x", &grammar.initial_state()).end_state
	}

	/// Innermost scope per token, with the token's text.
	fn classify<'a>(line: &'a str, tokens: &LineTokens) -> Vec<(&'a str, String)> {
		tokens
			.tokens
			.iter()
			.map(|t| (&line[t.start..t.end], t.innermost().unwrap_or_default().to_string()))
			.collect()
	}

	#[test]
	fn test_lua_call_string_and_comment() {
		let grammar = lua();
		let line = "TriggerServerEvent('bank:deposit', x) -- TriggerEvent('no')";
		let out = grammar.tokenize_line(line, &grammar.initial_state());

		let classified = classify(line, &out);
		assert_eq!(classified[0], ("TriggerServerEvent", "variable.function.lua".to_string()));
		assert!(classified.contains(&("bank:deposit", "string.quoted.single.lua".to_string())));
		assert!(classified.contains(&("x", "variable.other.lua".to_string())));
		assert_eq!(
			classified.last(),
			Some(&("-- TriggerEvent('no')", "comment.line.double-dash.lua".to_string()))
		);
		assert!(out.tokens.iter().all(|t| t.scopes.first().map(String::as_str) == Some("source.lua")));
		assert_eq!(out.end_state, top_level(grammar.as_ref()));
	}

	#[test]
	fn test_block_comment_spans_lines() {
		let grammar = lua();
		let lines = ["local a --[[ start", "AddEventHandler('x')", "]] RegisterNetEvent('y')"];

		let first = grammar.tokenize_line(lines[0], &grammar.initial_state());
		assert_ne!(first.end_state, top_level(grammar.as_ref()));

		let second = grammar.tokenize_line(lines[1], &first.end_state);
		assert_eq!(classify(lines[1], &second), vec![(lines[1], "comment.block.lua".to_string())]);
		assert_eq!(second.end_state, first.end_state);

		let third = grammar.tokenize_line(lines[2], &second.end_state);
		assert!(classify(lines[2], &third).contains(&("RegisterNetEvent", "variable.function.lua".to_string())));
		assert_eq!(third.end_state, top_level(grammar.as_ref()));
	}

	#[test]
	fn test_bundled_lua_syntax() {
		let grammar = SublimeSyntaxEngine::with_bundled_syntaxes().compile("source.lua", "").unwrap();
		let lines = ["--[[ TriggerEvent('a')", "TriggerEvent('b') ]]", "print('c')"];

		let first = grammar.tokenize_line(lines[0], &grammar.initial_state());
		let second = grammar.tokenize_line(lines[1], &first.end_state);
		assert!(second.tokens[0].scopes.iter().any(|s| s.starts_with("comment.block")));

		let third = grammar.tokenize_line(lines[2], &second.end_state);
		let string = third.tokens.iter().find(|t| t.contains(lines[2].find('c').unwrap())).unwrap();
		assert!(string.scopes.iter().any(|s| s.starts_with("string.quoted")));
		assert!(third.tokens.iter().all(|t| !t.scopes.iter().any(|s| s.starts_with("comment"))));
	}

	#[test]
	fn test_missing_or_broken_grammar() {
		let engine = SublimeSyntaxEngine::new();
		assert!(matches!(engine.compile("source.lua", ""), Err(GrammarError::NotFound(_))));
		assert!(matches!(
			engine.compile("source.lua", "contexts: [not a map"),
			Err(GrammarError::Compile { .. })
		));
		assert!(matches!(
			engine.compile("source.js", LUA_SUBLIME_SYNTAX),
			Err(GrammarError::NotFound(_))
		));
	}
}
