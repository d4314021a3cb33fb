//! Progress feedback for slow parses and workspace scans.
//!
//! Hosts plug in their own indicator through [`ProgressReporter`]; the
//! default [`TracingProgress`] only logs.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgressId(pub u64);

/// Host-side progress surface.
pub trait ProgressReporter: Send + Sync {
	/// Shows a new indicator.
	fn begin(&self, id: ProgressId, title: &str);
	/// Updates the indicator's message.
	fn report(&self, id: ProgressId, message: &str);
	/// Hides the indicator.
	fn end(&self, id: ProgressId);
}

/// Reports progress as tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
	fn begin(&self, id: ProgressId, title: &str) {
		tracing::info!(id = id.0, title, "events.progress.begin");
	}

	fn report(&self, id: ProgressId, message: &str) {
		tracing::debug!(id = id.0, message, "events.progress.report");
	}

	fn end(&self, id: ProgressId) {
		tracing::debug!(id = id.0, "events.progress.end");
	}
}

/// Hands out progress ids and ties indicators to guards.
#[derive(Clone)]
pub struct Progress {
	reporter: Arc<dyn ProgressReporter>,
	next: Arc<AtomicU64>,
}

impl Progress {
	pub fn new(reporter: Arc<dyn ProgressReporter>) -> Self {
		Self {
			reporter,
			next: Arc::default(),
		}
	}

	/// Begins an indicator that ends when the guard drops.
	pub fn begin(&self, title: &str) -> ProgressGuard {
		let id = ProgressId(self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1));
		self.reporter.begin(id, title);
		ProgressGuard {
			id,
			reporter: self.reporter.clone(),
		}
	}
}

impl Default for Progress {
	fn default() -> Self {
		Self::new(Arc::new(TracingProgress))
	}
}

/// Live indicator; ends it on drop.
pub struct ProgressGuard {
	id: ProgressId,
	reporter: Arc<dyn ProgressReporter>,
}

impl ProgressGuard {
	pub fn id(&self) -> ProgressId {
		self.id
	}

	pub fn report(&self, message: &str) {
		self.reporter.report(self.id, message);
	}
}

impl Drop for ProgressGuard {
	fn drop(&mut self) {
		self.reporter.end(self.id);
	}
}
