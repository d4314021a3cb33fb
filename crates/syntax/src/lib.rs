// Tokenization runs inside host processes - report through tracing, not stderr.
#![deny(clippy::print_stderr)]

//! Incremental lexical tokenization and scope classification.
//!
//! * [`grammar`]: the grammar engine seam ([`Grammar`], [`GrammarEngine`], [`GrammarProvider`])
//! * [`provider`]: table-backed grammar provider
//! * [`registry`]: per-scope grammar compilation cache
//! * [`tokenizer`]: per-document line states with convergent re-tokenization
//! * [`scope`]: scope lookup at a text position
//! * [`sublime`]: syntect-backed engine for `.sublime-syntax` grammars

pub mod grammar;
pub mod provider;
pub mod registry;
pub mod scope;
pub mod sublime;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tokenizer;

pub use grammar::{EngineState, Grammar, GrammarEngine, GrammarError, GrammarProvider, LineState, LineTokens, Token};
pub use provider::{GrammarSource, LanguageGrammar, StaticGrammarProvider};
pub use registry::GrammarRegistry;
pub use scope::{ScopeClassifier, ScopeInfo};
pub use sublime::{SublimeGrammar, SublimeSyntaxEngine};
pub use tokenizer::Tokenizer;
