//! Shared test setup: a tokenizer over the line-based test grammars.

use std::sync::Arc;

use eventlens_primitives::TextDocument;
use eventlens_syntax::testing::{JS_GRAMMAR, LUA_GRAMMAR, TestGrammarEngine};
use eventlens_syntax::{GrammarSource, LanguageGrammar, StaticGrammarProvider, Tokenizer};

pub(crate) fn provider() -> StaticGrammarProvider {
	StaticGrammarProvider::new()
		.with(LanguageGrammar {
			language_id: "lua".into(),
			extensions: vec![".lua".into()],
			scope_name: "source.lua".into(),
			source: GrammarSource::Inline(LUA_GRAMMAR.into()),
		})
		.with(LanguageGrammar {
			language_id: "javascript".into(),
			extensions: vec![".js".into()],
			scope_name: "source.js".into(),
			source: GrammarSource::Inline(JS_GRAMMAR.into()),
		})
}

pub(crate) fn tokenizer() -> Tokenizer {
	Tokenizer::new(Arc::new(provider()), Arc::new(TestGrammarEngine::new()))
}

pub(crate) fn lua_doc(name: &str, version: i32, text: &str) -> TextDocument {
	TextDocument::new(format!("file:///resources/demo/{name}").parse().unwrap(), "lua", version, text)
}

pub(crate) fn js_doc(name: &str, version: i32, text: &str) -> TextDocument {
	TextDocument::new(format!("file:///resources/demo/{name}").parse().unwrap(), "javascript", version, text)
}
