//! Per-document extraction memo keyed by content version.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use eventlens_primitives::{TextDocument, Url};
use parking_lot::Mutex;

use crate::extract::Extracted;
use crate::occurrence::EventOccurrence;

/// Version of an entry that is retained after its document closed, or that
/// was read from disk by a workspace scan. Never equals a live version.
pub const CLOSED_VERSION: i32 = -1;

#[derive(Debug, Clone)]
struct CacheEntry {
	version: i32,
	occurrences: Arc<[EventOccurrence]>,
}

/// Occurrences per document URI.
///
/// The lock is never held across the extraction itself, so concurrent
/// requests for one document may both extract; the newer version wins.
#[derive(Debug, Default)]
pub struct DocumentCache {
	entries: Mutex<HashMap<Url, CacheEntry>>,
}

impl DocumentCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the cached occurrences when `doc`'s version matches, otherwise
	/// runs `extract` and stores its result.
	///
	/// The flag is true when a complete extraction replaced the entry, i.e.
	/// when the index must be updated. Partial results are returned but
	/// neither cached nor reported as a change.
	pub async fn get_or_extract<F, Fut>(&self, doc: &TextDocument, extract: F) -> (Arc<[EventOccurrence]>, bool)
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Extracted>,
	{
		if let Some(entry) = self.entries.lock().get(doc.uri())
			&& entry.version == doc.version()
		{
			tracing::trace!(uri = %doc.uri(), version = doc.version(), "events.cache.hit");
			return (entry.occurrences.clone(), false);
		}

		match extract().await {
			Extracted::Complete(found) => {
				let occurrences: Arc<[EventOccurrence]> = found.into();
				self.store(doc.uri(), doc.version(), occurrences.clone());
				(occurrences, true)
			}
			Extracted::Partial(found) => (found.into(), false),
		}
	}

	/// Stores an entry unless a newer version is already cached.
	fn store(&self, uri: &Url, version: i32, occurrences: Arc<[EventOccurrence]>) {
		let mut entries = self.entries.lock();
		if let Some(existing) = entries.get(uri)
			&& existing.version > version
		{
			tracing::trace!(%uri, version, cached = existing.version, "events.cache.stale_result");
			return;
		}
		entries.insert(uri.clone(), CacheEntry { version, occurrences });
	}

	/// Stores occurrences read from disk for a document that is not open.
	pub fn insert_closed(&self, uri: Url, occurrences: Arc<[EventOccurrence]>) {
		self.entries.lock().insert(
			uri,
			CacheEntry {
				version: CLOSED_VERSION,
				occurrences,
			},
		);
	}

	/// Keeps the entry but forces the next lookup to re-extract.
	pub fn close(&self, uri: &Url) -> bool {
		match self.entries.lock().get_mut(uri) {
			Some(entry) => {
				entry.version = CLOSED_VERSION;
				true
			}
			None => false,
		}
	}

	/// Drops the entry entirely.
	pub fn remove(&self, uri: &Url) -> Option<Arc<[EventOccurrence]>> {
		self.entries.lock().remove(uri).map(|entry| entry.occurrences)
	}

	/// The cached version and occurrences for `uri`.
	pub fn cached(&self, uri: &Url) -> Option<(i32, Arc<[EventOccurrence]>)> {
		self.entries
			.lock()
			.get(uri)
			.map(|entry| (entry.version, entry.occurrences.clone()))
	}

	/// Drops every closed entry, keeping documents that are open.
	pub fn clear_closed(&self) {
		self.entries.lock().retain(|_, entry| entry.version != CLOSED_VERSION);
	}

	/// Live (non-closed) entries.
	pub fn open_entries(&self) -> Vec<(Url, Arc<[EventOccurrence]>)> {
		self.entries
			.lock()
			.iter()
			.filter(|(_, entry)| entry.version != CLOSED_VERSION)
			.map(|(uri, entry)| (uri.clone(), entry.occurrences.clone()))
			.collect()
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}
