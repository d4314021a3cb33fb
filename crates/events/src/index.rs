//! Bidirectional event-name index.
//!
//! A derived view of the cached occurrences: every mutation replaces one
//! document's whole contribution under a single write lock, so readers never
//! see a document half removed.

use std::collections::{BTreeSet, HashMap};

use eventlens_primitives::{Location, Url};
use parking_lot::RwLock;

use crate::occurrence::{EventKind, EventOccurrence};

type NameMap = HashMap<String, BTreeSet<Location>>;

#[derive(Debug, Default)]
struct IndexState {
	triggers: NameMap,
	listeners: NameMap,
	/// Occurrences each document contributed, for removal.
	documents: HashMap<Url, Vec<EventOccurrence>>,
}

impl IndexState {
	fn names_mut(&mut self, kind: EventKind) -> &mut NameMap {
		match kind {
			EventKind::Trigger => &mut self.triggers,
			EventKind::Listener => &mut self.listeners,
		}
	}

	fn names(&self, kind: EventKind) -> &NameMap {
		match kind {
			EventKind::Trigger => &self.triggers,
			EventKind::Listener => &self.listeners,
		}
	}

	fn remove(&mut self, uri: &Url) -> bool {
		let Some(previous) = self.documents.remove(uri) else {
			return false;
		};
		for occurrence in previous {
			let names = self.names_mut(occurrence.kind);
			if let Some(locations) = names.get_mut(&occurrence.name) {
				locations.remove(&occurrence.location);
				if locations.is_empty() {
					names.remove(&occurrence.name);
				}
			}
		}
		true
	}

	fn insert(&mut self, uri: Url, occurrences: &[EventOccurrence]) {
		for occurrence in occurrences {
			self.names_mut(occurrence.kind)
				.entry(occurrence.name.clone())
				.or_default()
				.insert(occurrence.location.clone());
		}
		if !occurrences.is_empty() {
			self.documents.insert(uri, occurrences.to_vec());
		}
	}
}

/// Trigger and listener locations by event name.
#[derive(Debug, Default)]
pub struct EventIndex {
	state: RwLock<IndexState>,
}

impl EventIndex {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces `uri`'s contribution with `occurrences`.
	pub fn apply(&self, uri: &Url, occurrences: &[EventOccurrence]) {
		let mut state = self.state.write();
		state.remove(uri);
		state.insert(uri.clone(), occurrences);
		tracing::trace!(%uri, count = occurrences.len(), "events.index.apply");
	}

	/// Drops `uri`'s contribution. Returns false if it had none.
	pub fn remove(&self, uri: &Url) -> bool {
		let removed = self.state.write().remove(uri);
		if removed {
			tracing::trace!(%uri, "events.index.remove");
		}
		removed
	}

	pub fn clear(&self) {
		*self.state.write() = IndexState::default();
	}

	/// Clears the index and repopulates it in one step.
	pub fn replace_all<I>(&self, documents: I)
	where
		I: IntoIterator<Item = (Url, Vec<EventOccurrence>)>,
	{
		let mut fresh = IndexState::default();
		for (uri, occurrences) in documents {
			fresh.remove(&uri);
			fresh.insert(uri, &occurrences);
		}
		*self.state.write() = fresh;
	}

	/// Cross-reference lookup: the locations of the opposite kind for `name`.
	///
	/// A trigger resolves to its listeners and a listener to its triggers.
	/// Unused names yield an empty set.
	pub fn lookup(&self, kind: EventKind, name: &str) -> BTreeSet<Location> {
		self.locations(kind.opposite(), name)
	}

	/// Locations of `kind` registered for `name`.
	pub fn locations(&self, kind: EventKind, name: &str) -> BTreeSet<Location> {
		self.state.read().names(kind).get(name).cloned().unwrap_or_default()
	}

	/// Distinct event names of `kind`, sorted.
	pub fn names(&self, kind: EventKind) -> Vec<String> {
		let mut names: Vec<String> = self.state.read().names(kind).keys().cloned().collect();
		names.sort_unstable();
		names
	}

	/// Documents contributing at least one occurrence.
	pub fn document_count(&self) -> usize {
		self.state.read().documents.len()
	}
}
