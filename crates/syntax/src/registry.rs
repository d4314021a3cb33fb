use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::grammar::{Grammar, GrammarEngine, GrammarError, GrammarProvider};

type GrammarSlot = Arc<OnceCell<Arc<dyn Grammar>>>;

/// Resolves languages to compiled grammars, compiling each scope at most once.
///
/// Concurrent requests for the same scope share one load. A failed load
/// leaves the slot empty so the next request retries.
pub struct GrammarRegistry {
	provider: Arc<dyn GrammarProvider>,
	engine: Arc<dyn GrammarEngine>,
	grammars: Mutex<HashMap<String, GrammarSlot>>,
}

impl GrammarRegistry {
	pub fn new(provider: Arc<dyn GrammarProvider>, engine: Arc<dyn GrammarEngine>) -> Self {
		Self {
			provider,
			engine,
			grammars: Mutex::new(HashMap::new()),
		}
	}

	/// The provider this registry resolves metadata through.
	pub fn provider(&self) -> &Arc<dyn GrammarProvider> {
		&self.provider
	}

	/// Returns the compiled grammar for a language, loading it on first use.
	pub async fn grammar_for_language(&self, language_id: &str) -> Result<Arc<dyn Grammar>, GrammarError> {
		let scope = self
			.provider
			.scope_for_language(language_id)
			.ok_or_else(|| GrammarError::UnknownLanguage(language_id.to_string()))?;

		let slot = self.grammars.lock().entry(scope.clone()).or_default().clone();
		let grammar = slot
			.get_or_try_init(|| async {
				tracing::debug!(language = language_id, scope = %scope, "grammar.load");
				let source = self.provider.grammar_source(&scope).await?;
				self.engine.compile(&scope, &source)
			})
			.await?;
		Ok(grammar.clone())
	}

	/// Number of successfully compiled grammars.
	pub fn loaded_count(&self) -> usize {
		self.grammars.lock().values().filter(|slot| slot.initialized()).count()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::Ordering;

	use super::*;
	use crate::provider::{GrammarSource, LanguageGrammar, StaticGrammarProvider};
	use crate::testing::{LUA_GRAMMAR, TestGrammarEngine};

	fn registry(source: &str) -> (GrammarRegistry, Arc<TestGrammarEngine>) {
		let provider = StaticGrammarProvider::new().with(LanguageGrammar {
			language_id: "lua".into(),
			extensions: vec![".lua".into()],
			scope_name: "source.lua".into(),
			source: GrammarSource::Inline(source.into()),
		});
		let engine = Arc::new(TestGrammarEngine::new());
		(GrammarRegistry::new(Arc::new(provider), engine.clone()), engine)
	}

	#[tokio::test]
	async fn test_compiles_once() {
		let (registry, engine) = registry(LUA_GRAMMAR);

		let a = registry.grammar_for_language("lua").await.unwrap();
		let b = registry.grammar_for_language("lua").await.unwrap();

		assert!(Arc::ptr_eq(&a, &b));
		assert_eq!(engine.compile_count.load(Ordering::SeqCst), 1);
		assert_eq!(registry.loaded_count(), 1);
	}

	#[tokio::test]
	async fn test_unknown_language() {
		let (registry, _) = registry(LUA_GRAMMAR);
		assert!(matches!(
			registry.grammar_for_language("python").await,
			Err(GrammarError::UnknownLanguage(_))
		));
	}

	#[tokio::test]
	async fn test_failed_compile_is_retried() {
		let (registry, engine) = registry("line_comment");

		assert!(matches!(
			registry.grammar_for_language("lua").await,
			Err(GrammarError::Compile { .. })
		));
		assert!(registry.grammar_for_language("lua").await.is_err());
		assert_eq!(engine.compile_count.load(Ordering::SeqCst), 2);
		assert_eq!(registry.loaded_count(), 0);
	}
}
