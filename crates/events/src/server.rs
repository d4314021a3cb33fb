//! Host-facing facade.
//!
//! [`EventServer`] wires the tokenizer, extractor, cache and index together
//! and exposes them as document lifecycle hooks plus cross-reference
//! queries. Every per-document failure is logged and yields no occurrences;
//! only construction and workspace scans return errors.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use eventlens_primitives::{Location, Position, TextChange, TextDocument, Url};
use eventlens_syntax::{GrammarEngine, GrammarProvider, ScopeClassifier, ScopeInfo, Tokenizer};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio_util::sync::CancellationToken;

use crate::cache::{CLOSED_VERSION, DocumentCache};
use crate::config::EventLensConfig;
use crate::deadline::with_soft_deadline;
use crate::error::{ConfigError, ScanError};
use crate::extract::EventExtractor;
use crate::index::EventIndex;
use crate::lens::LensSummary;
use crate::occurrence::EventOccurrence;
use crate::pattern::PatternTable;
use crate::progress::{Progress, ProgressReporter};
use crate::scan::{BulkScanner, ScanTarget, resource_display_path};

fn build_excludes(globs: &[String]) -> Result<GlobSet, ConfigError> {
	let mut builder = GlobSetBuilder::new();
	for glob in globs {
		let compiled = Glob::new(glob).map_err(|source| ConfigError::Glob {
			glob: glob.clone(),
			source,
		})?;
		builder.add(compiled);
	}
	builder.build().map_err(|source| ConfigError::Glob {
		glob: globs.join(", "),
		source,
	})
}

/// Event lens engine for one workspace.
pub struct EventServer {
	config: EventLensConfig,
	tokenizer: Tokenizer,
	extractor: EventExtractor,
	cache: DocumentCache,
	index: EventIndex,
	excludes: GlobSet,
	progress: Progress,
}

impl EventServer {
	/// Validates `config` and builds the engine. Invalid pattern tables or
	/// exclusion globs fail here rather than per query.
	pub fn new(
		config: EventLensConfig,
		provider: Arc<dyn GrammarProvider>,
		engine: Arc<dyn GrammarEngine>,
	) -> Result<Self, ConfigError> {
		let patterns = PatternTable::compile(&config)?;
		let excludes = build_excludes(&config.document_exclude_globs)?;
		tracing::info!(
			languages = ?patterns.languages(),
			excludes = config.document_exclude_globs.len(),
			"events.server.init"
		);
		Ok(Self {
			extractor: EventExtractor::new(Arc::new(patterns), config.max_file_size),
			tokenizer: Tokenizer::new(provider, engine),
			cache: DocumentCache::new(),
			index: EventIndex::new(),
			excludes,
			progress: Progress::default(),
			config,
		})
	}

	/// Routes progress indicators to a host reporter.
	pub fn with_progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
		self.progress = Progress::new(reporter);
		self
	}

	/// Sets the roots scanned by [`rescan_workspace`](Self::rescan_workspace).
	pub fn with_workspace_folders(mut self, folders: Vec<PathBuf>) -> Self {
		self.config.workspace_folders = folders;
		self
	}

	pub fn config(&self) -> &EventLensConfig {
		&self.config
	}

	pub fn tokenizer(&self) -> &Tokenizer {
		&self.tokenizer
	}

	pub fn cache(&self) -> &DocumentCache {
		&self.cache
	}

	pub fn index(&self) -> &EventIndex {
		&self.index
	}

	/// Languages with a pattern table; hosts register annotations for these.
	pub fn languages(&self) -> Vec<&str> {
		self.extractor.patterns().languages()
	}

	/// Returns true when a document should not be parsed at all.
	///
	/// Without a language id the extension decides, through the grammar
	/// provider.
	pub fn should_skip(&self, path: &Path, language_id: Option<&str>) -> bool {
		if self.excludes.is_match(path) {
			return true;
		}
		let patterns = self.extractor.patterns();
		match language_id {
			Some(language) => !patterns.contains(language),
			None => {
				let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
					return false;
				};
				self.tokenizer
					.registry()
					.provider()
					.language_for_extension(&format!(".{extension}"))
					.is_none_or(|language| !patterns.contains(&language))
			}
		}
	}

	/// Path relative to the resources root of the first workspace folder
	/// containing it, for logs and progress messages.
	fn display_path(&self, path: &Path) -> String {
		self.config
			.workspace_folders
			.iter()
			.map(|folder| folder.join(&self.config.resources_dir))
			.find(|root| path.starts_with(root))
			.map_or_else(|| path.display().to_string(), |root| resource_display_path(&root, path))
	}

	/// Tokenizes a newly opened document in full, then parses it.
	pub async fn did_open(&self, doc: &TextDocument) -> Arc<[EventOccurrence]> {
		if self.should_skip(&doc.path(), Some(doc.language_id())) {
			return Arc::from(Vec::new());
		}
		if let Err(err) = self.tokenizer.open(doc).await {
			tracing::warn!(uri = %doc.uri(), error = %err, "events.open.grammar");
		}
		self.parse_document(doc, None).await
	}

	/// Extracts `doc`'s occurrences, reusing the cache when its version is
	/// unchanged, and updates the index when they changed.
	///
	/// A parse slower than the configured timeout shows a progress indicator
	/// until it finishes; it is never cut short.
	pub async fn parse_document(&self, doc: &TextDocument, cancel: Option<&CancellationToken>) -> Arc<[EventOccurrence]> {
		let file = doc.path();
		let path = file.as_path();
		if self.should_skip(path, Some(doc.language_id())) {
			tracing::trace!(uri = %doc.uri(), "events.parse.skipped");
			return Arc::from(Vec::new());
		}

		let extract = move || async move {
			tracing::debug!(file = %self.display_path(path), version = doc.version(), "events.parse");
			self.extractor.extract(doc, &self.tokenizer, cancel).await
		};
		let on_slow = move || {
			let guard = self.progress.begin("Parsing events");
			guard.report(&self.display_path(path));
			guard
		};
		let (occurrences, changed) =
			with_soft_deadline(self.cache.get_or_extract(doc, extract), self.config.parse_timeout, on_slow).await;

		if changed {
			self.index.apply(doc.uri(), &occurrences);
		}
		occurrences
	}

	/// Applies host edits to the tokenizer and re-parses.
	///
	/// `doc` is the post-edit snapshot; `changes` are in pre-edit coordinates.
	pub async fn did_change(
		&self,
		doc: &TextDocument,
		changes: &[TextChange],
		cancel: Option<&CancellationToken>,
	) -> Arc<[EventOccurrence]> {
		self.tokenizer.apply_changes(doc, changes).await;
		self.parse_document(doc, cancel).await
	}

	/// Drops line states and marks the cache entry closed. The document's
	/// occurrences stay in the index.
	pub fn did_close(&self, uri: &Url) {
		self.tokenizer.close(uri);
		self.cache.close(uri);
		tracing::debug!(%uri, "events.close");
	}

	/// Parses a file that appeared on disk.
	pub async fn did_create(&self, uri: &Url) -> Arc<[EventOccurrence]> {
		let Ok(path) = uri.to_file_path() else {
			tracing::warn!(%uri, "events.create.not_file");
			return Arc::from(Vec::new());
		};
		match self.read_and_extract(&path).await {
			Some((uri, occurrences)) => {
				self.index.apply(&uri, &occurrences);
				occurrences
			}
			None => Arc::from(Vec::new()),
		}
	}

	pub fn did_delete(&self, uri: &Url) {
		self.remove_document(uri);
	}

	pub async fn did_rename(&self, old: &Url, new: &Url) -> Arc<[EventOccurrence]> {
		self.remove_document(old);
		self.did_create(new).await
	}

	/// Forgets everything known about `uri`.
	pub fn remove_document(&self, uri: &Url) {
		self.tokenizer.close(uri);
		self.cache.remove(uri);
		self.index.remove(uri);
		tracing::debug!(%uri, "events.remove");
	}

	/// Discards a document's state and parses it from scratch.
	pub async fn reload_document(&self, doc: &TextDocument) -> Arc<[EventOccurrence]> {
		self.remove_document(doc.uri());
		self.did_open(doc).await
	}

	/// Reads a file from disk and extracts it as a closed document.
	///
	/// Documents open in the host keep their live cached occurrences. One
	/// whose line states are tracked but that has no live entry yet is left
	/// to the host's next parse, so its buffer state is not replaced by disk
	/// content.
	async fn read_and_extract(&self, path: &Path) -> Option<(Url, Arc<[EventOccurrence]>)> {
		if self.should_skip(path, None) {
			return None;
		}
		let uri = match Url::from_file_path(path) {
			Ok(uri) => uri,
			Err(()) => {
				tracing::warn!(path = %path.display(), "events.read.not_absolute");
				return None;
			}
		};
		if let Some((version, occurrences)) = self.cache.cached(&uri)
			&& version != CLOSED_VERSION
		{
			return Some((uri, occurrences));
		}
		if self.tokenizer.is_tracked(&uri) {
			tracing::debug!(file = %self.display_path(path), "events.read.open_in_host");
			return None;
		}

		let extension = path.extension().and_then(|e| e.to_str())?;
		let language = self
			.tokenizer
			.registry()
			.provider()
			.language_for_extension(&format!(".{extension}"))?;
		let text = match tokio::fs::read_to_string(path).await {
			Ok(text) => text,
			Err(err) => {
				tracing::warn!(file = %self.display_path(path), error = %err, "events.read.failed");
				return None;
			}
		};

		let doc = TextDocument::new(uri.clone(), language, CLOSED_VERSION, &text);
		tracing::debug!(file = %self.display_path(path), "events.parse");
		let found: Arc<[EventOccurrence]> = self
			.extractor
			.extract(&doc, &self.tokenizer, None)
			.await
			.into_occurrences()
			.into();
		self.tokenizer.close(&uri);
		self.cache.insert_closed(uri.clone(), found.clone());
		Some((uri, found))
	}

	/// Re-reads every resource under the workspace folders and rebuilds the
	/// index from scratch.
	///
	/// On error or cancellation the previous index is left untouched.
	pub async fn rescan_workspace(&self, cancel: &CancellationToken) -> Result<Vec<EventOccurrence>, ScanError> {
		let guard = self.progress.begin("Parsing resources");
		self.cache.clear_closed();

		let scanner = BulkScanner::new(self, &self.config.manifest_files).with_progress(&guard);
		let mut found = Vec::new();
		for folder in &self.config.workspace_folders {
			let root = folder.join(&self.config.resources_dir);
			found.extend(scanner.scan(&root, cancel).await?);
		}

		let mut by_document: HashMap<Url, Vec<EventOccurrence>> = HashMap::new();
		for occurrence in &found {
			by_document.entry(occurrence.uri().clone()).or_default().push(occurrence.clone());
		}
		for (uri, occurrences) in self.cache.open_entries() {
			by_document.insert(uri, occurrences.to_vec());
		}
		self.index.replace_all(by_document);

		tracing::info!(
			folders = self.config.workspace_folders.len(),
			count = found.len(),
			documents = self.index.document_count(),
			"events.rescan"
		);
		Ok(found)
	}

	/// Cross-references for a call site: listeners of a trigger, triggers
	/// of a listener.
	pub fn locations_for(&self, occurrence: &EventOccurrence) -> BTreeSet<Location> {
		self.index.lookup(occurrence.kind, &occurrence.name)
	}

	pub fn resolve_lens(&self, occurrence: &EventOccurrence) -> LensSummary {
		LensSummary::new(occurrence.kind, self.locations_for(occurrence).len())
	}

	pub async fn scope_at(&self, doc: &TextDocument, position: Position) -> Option<ScopeInfo> {
		self.tokenizer.scope_at(doc, position).await
	}
}

#[async_trait]
impl ScanTarget for EventServer {
	fn is_excluded(&self, path: &Path) -> bool {
		self.excludes.is_match(path)
	}

	async fn parse_file(&self, path: &Path) -> Vec<EventOccurrence> {
		match self.read_and_extract(path).await {
			Some((_, occurrences)) => occurrences.to_vec(),
			None => Vec::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use eventlens_syntax::testing::TestGrammarEngine;
	use eventlens_syntax::{GrammarError, StaticGrammarProvider};
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::fixtures;
	use crate::occurrence::EventKind;
	use crate::progress::tests::RecordingProgress;

	fn server() -> EventServer {
		EventServer::new(
			EventLensConfig::default(),
			Arc::new(fixtures::provider()),
			Arc::new(TestGrammarEngine::new()),
		)
		.unwrap()
	}

	#[test]
	fn test_invalid_glob_fails_construction() {
		let mut config = EventLensConfig::default();
		config.document_exclude_globs = vec!["a[".into()];
		let result = EventServer::new(config, Arc::new(fixtures::provider()), Arc::new(TestGrammarEngine::new()));
		assert!(matches!(result, Err(ConfigError::Glob { .. })));
	}

	#[test]
	fn test_should_skip() {
		let server = server();

		assert!(server.should_skip(Path::new("/w/resources/a/node_modules/x.js"), Some("javascript")));
		assert!(server.should_skip(Path::new("/w/resources/a/main.py"), Some("python")));
		assert!(!server.should_skip(Path::new("/w/resources/a/client.lua"), Some("lua")));

		assert!(!server.should_skip(Path::new("/w/resources/a/client.lua"), None));
		assert!(server.should_skip(Path::new("/w/resources/a/readme.md"), None));
		assert!(!server.should_skip(Path::new("/w/resources/a/Makefile"), None));
		assert_eq!(server.languages(), vec!["javascript", "lua"]);
	}

	#[tokio::test]
	async fn test_parse_updates_index_once_per_version() {
		let server = server();
		let trigger = fixtures::lua_doc("a.lua", 1, "TriggerEvent('explode', 1)\n");
		let listener = fixtures::lua_doc("b.lua", 1, "AddEventHandler('explode', function() end)\n");

		let triggers = server.did_open(&trigger).await;
		server.did_open(&listener).await;
		assert_eq!(triggers.len(), 1);

		let listeners = server.locations_for(&triggers[0]);
		assert_eq!(listeners.into_iter().map(|l| l.uri).collect::<Vec<_>>(), vec![listener.uri().clone()]);
		assert_eq!(server.resolve_lens(&triggers[0]).title, "1 Event Listener");

		let again = server.parse_document(&trigger, None).await;
		assert!(Arc::ptr_eq(&triggers, &again));
	}

	#[tokio::test]
	async fn test_edit_replaces_contribution() {
		let server = server();
		let mut doc = fixtures::lua_doc("a.lua", 1, "TriggerEvent('old')\n");
		server.did_open(&doc).await;

		let changes = vec![TextChange::new(
			eventlens_primitives::TextRange::new(Position::new(0, 14), Position::new(0, 17)),
			"new",
		)];
		doc.apply_changes(&changes).unwrap();
		let found = server.did_change(&doc, &changes, None).await;

		assert_eq!(found.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(), vec!["new"]);
		assert!(server.index().locations(EventKind::Trigger, "old").is_empty());
		assert_eq!(server.index().locations(EventKind::Trigger, "new").len(), 1);
	}

	#[tokio::test]
	async fn test_close_keeps_index_and_remove_clears_it() {
		let server = server();
		let doc = fixtures::lua_doc("a.lua", 1, "RegisterNetEvent('bank:open')\n");
		server.did_open(&doc).await;

		server.did_close(doc.uri());
		assert!(!server.tokenizer().is_tracked(doc.uri()));
		assert_eq!(server.index().names(EventKind::Listener), vec!["bank:open".to_string()]);

		server.remove_document(doc.uri());
		assert!(server.index().names(EventKind::Listener).is_empty());
		assert!(server.cache().cached(doc.uri()).is_none());
	}

	#[tokio::test]
	async fn test_cancelled_parse_leaves_index_alone() {
		let server = server();
		let doc = fixtures::lua_doc("a.lua", 1, "TriggerEvent('x')\n");
		let token = CancellationToken::new();
		token.cancel();

		let found = server.parse_document(&doc, Some(&token)).await;

		assert!(found.is_empty());
		assert_eq!(server.index().document_count(), 0);
		assert!(server.cache().cached(doc.uri()).is_none());
	}

	/// Delays every grammar load.
	struct SlowProvider(StaticGrammarProvider);

	#[async_trait]
	impl GrammarProvider for SlowProvider {
		fn language_for_extension(&self, extension: &str) -> Option<String> {
			self.0.language_for_extension(extension)
		}

		fn scope_for_language(&self, language_id: &str) -> Option<String> {
			self.0.scope_for_language(language_id)
		}

		async fn grammar_source(&self, scope_name: &str) -> Result<String, GrammarError> {
			tokio::time::sleep(Duration::from_secs(1)).await;
			self.0.grammar_source(scope_name).await
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_slow_parse_shows_progress() {
		let recorder = Arc::new(RecordingProgress::default());
		let mut config = EventLensConfig::default();
		config.parse_timeout = Duration::from_millis(100);
		let provider = SlowProvider(fixtures::provider());
		let server = EventServer::new(config, Arc::new(provider), Arc::new(TestGrammarEngine::new()))
			.unwrap()
			.with_progress(recorder.clone());

		let doc = fixtures::lua_doc("slow.lua", 1, "TriggerEvent('late')\n");
		let found = server.parse_document(&doc, None).await;

		assert_eq!(found.len(), 1);
		assert_eq!(
			*recorder.events.lock(),
			vec!["begin 1 Parsing events", "report 1 /resources/demo/slow.lua", "end 1"]
		);
	}
}
