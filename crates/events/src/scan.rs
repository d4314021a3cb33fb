//! Workspace resource traversal.
//!
//! A resources root holds resource directories, optionally nested inside
//! bracketed grouping folders (`[core]`, `[maps]`). Grouping folders are walked
//! through; any other directory is a scan unit only if it directly contains
//! one of the manifest files. Inside a unit every file and subdirectory is
//! parsed concurrently, and the first failure aborts the unit's batch.

use std::future::Future;
use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use tokio_util::sync::CancellationToken;

use crate::error::ScanError;
use crate::occurrence::EventOccurrence;
use crate::progress::ProgressGuard;

/// What the scanner parses files with.
#[async_trait]
pub trait ScanTarget: Send + Sync {
	/// Returns true when `path` matches an exclusion glob.
	fn is_excluded(&self, path: &Path) -> bool;

	/// Reads and extracts one file. Per-file failures are logged and yield
	/// nothing.
	async fn parse_file(&self, path: &Path) -> Vec<EventOccurrence>;
}

/// Runs every future concurrently and concatenates their results.
///
/// The first error wins and the results of the rest of the batch are
/// discarded.
pub async fn fan_out<I, F, T, E>(batch: I) -> Result<Vec<T>, E>
where
	I: IntoIterator<Item = F>,
	F: Future<Output = Result<Vec<T>, E>>,
{
	let results = try_join_all(batch).await?;
	Ok(results.into_iter().flatten().collect())
}

/// Returns true for `[grouping]` folder names.
pub fn is_grouping_folder(name: &str) -> bool {
	name.len() >= 2 && name.starts_with('[') && name.ends_with(']')
}

/// Short path for a file or unit under `resources_root`, without leading
/// grouping folders: `resources/[core]/bank/client.lua` shows as
/// `bank/client.lua`. Paths outside the root are shown in full.
pub fn resource_display_path(resources_root: &Path, path: &Path) -> String {
	let Ok(relative) = path.strip_prefix(resources_root) else {
		return path.display().to_string();
	};
	let segments: Vec<&str> = relative
		.components()
		.filter_map(|c| match c {
			Component::Normal(s) => s.to_str(),
			_ => None,
		})
		.collect();
	let kept = segments.iter().position(|s| !is_grouping_folder(s)).unwrap_or(segments.len());
	if kept == segments.len() {
		return segments.join("/");
	}
	segments[kept..].join("/")
}

#[derive(Debug)]
struct Entry {
	path: PathBuf,
	name: String,
	is_dir: bool,
}

async fn read_entries(dir: &Path) -> Result<Vec<Entry>, ScanError> {
	let read_err = |source: io::Error| ScanError::ReadDir {
		path: dir.to_path_buf(),
		source,
	};
	let mut reader = tokio::fs::read_dir(dir).await.map_err(read_err)?;
	let mut entries = Vec::new();
	while let Some(entry) = reader.next_entry().await.map_err(read_err)? {
		let file_type = entry.file_type().await.map_err(read_err)?;
		if !file_type.is_dir() && !file_type.is_file() {
			tracing::trace!(path = %entry.path().display(), "events.scan.skip_special");
			continue;
		}
		entries.push(Entry {
			path: entry.path(),
			name: entry.file_name().to_string_lossy().into_owned(),
			is_dir: file_type.is_dir(),
		});
	}
	entries.sort_by(|a, b| a.name.cmp(&b.name));
	Ok(entries)
}

/// Walks one resources root.
pub struct BulkScanner<'a> {
	target: &'a dyn ScanTarget,
	manifest_files: &'a [String],
	progress: Option<&'a ProgressGuard>,
}

impl<'a> BulkScanner<'a> {
	pub fn new(target: &'a dyn ScanTarget, manifest_files: &'a [String]) -> Self {
		Self {
			target,
			manifest_files,
			progress: None,
		}
	}

	/// Reports each scan unit on `progress`.
	pub fn with_progress(mut self, progress: &'a ProgressGuard) -> Self {
		self.progress = Some(progress);
		self
	}

	/// Scans every resource under `root`. A missing root yields nothing.
	pub async fn scan(&self, root: &Path, cancel: &CancellationToken) -> Result<Vec<EventOccurrence>, ScanError> {
		if tokio::fs::metadata(root).await.is_err() {
			tracing::debug!(root = %root.display(), "events.scan.no_root");
			return Ok(Vec::new());
		}
		tracing::info!(root = %root.display(), "events.scan.begin");
		let found = self.scan_groups(root, root.to_path_buf(), cancel).await?;
		tracing::info!(root = %root.display(), count = found.len(), "events.scan.done");
		Ok(found)
	}

	/// Walks grouping folders sequentially looking for resource directories.
	fn scan_groups<'s>(
		&'s self,
		root: &'s Path,
		dir: PathBuf,
		cancel: &'s CancellationToken,
	) -> BoxFuture<'s, Result<Vec<EventOccurrence>, ScanError>> {
		async move {
			if self.target.is_excluded(&dir) {
				return Ok(Vec::new());
			}

			let mut found = Vec::new();
			for entry in read_entries(&dir).await? {
				if cancel.is_cancelled() {
					return Err(ScanError::Cancelled);
				}
				if !entry.is_dir || self.target.is_excluded(&entry.path) {
					continue;
				}

				if is_grouping_folder(&entry.name) {
					found.extend(self.scan_groups(root, entry.path, cancel).await?);
				} else if self.is_resource(&entry.path).await? {
					let unit_path = resource_display_path(root, &entry.path);
					tracing::info!(unit = %unit_path, "events.scan.unit");
					if let Some(progress) = self.progress {
						progress.report(&format!("Parsing: {unit_path}"));
					}
					found.extend(self.scan_unit(entry.path, cancel).await?);
				} else {
					tracing::trace!(dir = %entry.path.display(), "events.scan.not_resource");
				}
			}
			Ok(found)
		}
		.boxed()
	}

	async fn is_resource(&self, dir: &Path) -> Result<bool, ScanError> {
		let entries = read_entries(dir).await?;
		Ok(entries.iter().any(|e| !e.is_dir && self.manifest_files.contains(&e.name)))
	}

	/// Parses everything inside one resource, fanning out per directory.
	fn scan_unit<'s>(&'s self, dir: PathBuf, cancel: &'s CancellationToken) -> BoxFuture<'s, Result<Vec<EventOccurrence>, ScanError>> {
		async move {
			if cancel.is_cancelled() {
				return Err(ScanError::Cancelled);
			}
			if self.target.is_excluded(&dir) {
				return Ok(Vec::new());
			}

			let entries = read_entries(&dir).await?;
			let batch = entries.into_iter().filter(|e| !self.target.is_excluded(&e.path)).map(|entry| {
				async move {
					if cancel.is_cancelled() {
						return Err(ScanError::Cancelled);
					}
					if entry.is_dir {
						tracing::trace!(dir = %entry.path.display(), "events.scan.folder");
						self.scan_unit(entry.path, cancel).await
					} else {
						Ok(self.target.parse_file(&entry.path).await)
					}
				}
				.boxed()
			});
			fan_out(batch).await
		}
		.boxed()
	}
}
