use std::sync::Arc;

use eventlens_events::{EventLensConfig, EventServer};
use eventlens_syntax::testing::{JS_GRAMMAR, LUA_GRAMMAR, LUA_SUBLIME_SYNTAX, TestGrammarEngine};
use eventlens_syntax::{GrammarSource, LanguageGrammar, StaticGrammarProvider, SublimeSyntaxEngine};

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}

pub fn server(config: EventLensConfig) -> EventServer {
	init_tracing();
	let provider = StaticGrammarProvider::new()
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
		});
	EventServer::new(config, Arc::new(provider), Arc::new(TestGrammarEngine::new())).unwrap()
}

/// Lua only, tokenized by the syntect engine.
#[allow(dead_code)]
pub fn sublime_server(config: EventLensConfig) -> EventServer {
	init_tracing();
	let provider = StaticGrammarProvider::new().with(LanguageGrammar {
		language_id: "lua".into(),
		extensions: vec![".lua".into()],
		scope_name: "source.lua".into(),
		source: GrammarSource::Inline(LUA_SUBLIME_SYNTAX.into()),
	});
	EventServer::new(config, Arc::new(provider), Arc::new(SublimeSyntaxEngine::new())).unwrap()
}
