//! Table-backed [`GrammarProvider`].

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::grammar::{GrammarError, GrammarProvider};

/// Where a grammar's source text comes from.
#[derive(Debug, Clone)]
pub enum GrammarSource {
	/// Read from a grammar file on disk.
	File(PathBuf),
	/// Source held in memory.
	Inline(String),
	/// A grammar the engine ships with, looked up by scope name. Served as an
	/// empty source.
	Builtin,
}

/// Language registration for [`StaticGrammarProvider`].
#[derive(Debug, Clone)]
pub struct LanguageGrammar {
	/// Language identifier (e.g. "lua").
	pub language_id: String,
	/// File extensions with leading dot.
	pub extensions: Vec<String>,
	/// Root scope name (e.g. "source.lua").
	pub scope_name: String,
	/// Grammar source for the scope.
	pub source: GrammarSource,
}

/// Grammar provider built from explicit registrations.
#[derive(Debug, Default)]
pub struct StaticGrammarProvider {
	by_extension: HashMap<String, String>,
	scopes: HashMap<String, String>,
	sources: HashMap<String, GrammarSource>,
}

impl StaticGrammarProvider {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a language; later registrations win on conflicts.
	pub fn register(&mut self, language: LanguageGrammar) -> &mut Self {
		for ext in &language.extensions {
			self.by_extension.insert(normalize_extension(ext), language.language_id.clone());
		}
		self.scopes.insert(language.language_id, language.scope_name.clone());
		self.sources.insert(language.scope_name, language.source);
		self
	}

	/// Builder-style variant of [`Self::register`].
	pub fn with(mut self, language: LanguageGrammar) -> Self {
		self.register(language);
		self
	}
}

fn normalize_extension(ext: &str) -> String {
	let ext = ext.trim();
	let ext = if ext.starts_with('.') { ext.to_string() } else { format!(".{ext}") };
	ext.to_ascii_lowercase()
}

#[async_trait]
impl GrammarProvider for StaticGrammarProvider {
	fn language_for_extension(&self, extension: &str) -> Option<String> {
		self.by_extension.get(&normalize_extension(extension)).cloned()
	}

	fn scope_for_language(&self, language_id: &str) -> Option<String> {
		self.scopes.get(language_id).cloned()
	}

	async fn grammar_source(&self, scope_name: &str) -> Result<String, GrammarError> {
		match self.sources.get(scope_name) {
			Some(GrammarSource::Inline(source)) => Ok(source.clone()),
			Some(GrammarSource::Builtin) => Ok(String::new()),
			Some(GrammarSource::File(path)) => {
				tracing::debug!(scope = scope_name, path = %path.display(), "grammar.read");
				Ok(tokio::fs::read_to_string(path).await?)
			}
			None => Err(GrammarError::NotFound(scope_name.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn lua() -> LanguageGrammar {
		LanguageGrammar {
			language_id: "lua".into(),
			extensions: vec!["lua".into(), ".LUAU".into()],
			scope_name: "source.lua".into(),
			source: GrammarSource::Inline("line_comment=--".into()),
		}
	}

	#[tokio::test]
	async fn test_lookups() {
		let provider = StaticGrammarProvider::new().with(lua());

		assert_eq!(provider.language_for_extension(".lua").as_deref(), Some("lua"));
		assert_eq!(provider.language_for_extension("luau").as_deref(), Some("lua"));
		assert_eq!(provider.language_for_extension(".js"), None);
		assert_eq!(provider.scope_for_language("lua").as_deref(), Some("source.lua"));
		assert_eq!(provider.grammar_source("source.lua").await.unwrap(), "line_comment=--");
		assert!(matches!(
			provider.grammar_source("source.js").await,
			Err(GrammarError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn test_builtin_source_is_empty() {
		let provider = StaticGrammarProvider::new().with(LanguageGrammar {
			source: GrammarSource::Builtin,
			..lua()
		});
		assert_eq!(provider.grammar_source("source.lua").await.unwrap(), "");
	}

	#[tokio::test]
	async fn test_file_source_missing_is_io_error() {
		let provider = StaticGrammarProvider::new().with(LanguageGrammar {
			source: GrammarSource::File(PathBuf::from("/nonexistent/lua.grammar")),
			..lua()
		});
		assert!(matches!(provider.grammar_source("source.lua").await, Err(GrammarError::Io(_))));
	}
}
