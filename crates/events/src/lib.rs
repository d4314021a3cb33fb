// Runs inside editor hosts - report through tracing, not stderr.
#![deny(clippy::print_stderr)]

//! Event trigger/listener cross-referencing.
//!
//! * [`config`]: TOML configuration and FiveM defaults
//! * [`pattern`]: per-language call-site matchers compiled from the configuration
//! * [`extract`]: regex candidates confirmed by scope classification
//! * [`cache`]: per-document occurrences keyed by content version
//! * [`index`]: name to location maps for both event kinds
//! * [`scan`]: workspace resource traversal
//! * [`server`]: the [`EventServer`] facade hosts talk to

pub mod cache;
pub mod config;
pub mod deadline;
pub mod error;
pub mod extract;
#[cfg(test)]
mod fixtures;
pub mod index;
pub mod lens;
pub mod occurrence;
pub mod pattern;
pub mod progress;
pub mod scan;
pub mod server;

pub use cache::{CLOSED_VERSION, DocumentCache};
pub use config::{EventLensConfig, EventsRegex, LanguageEvents};
pub use deadline::with_soft_deadline;
pub use error::{ConfigError, ScanError};
pub use extract::{EventExtractor, Extracted};
pub use index::EventIndex;
pub use lens::LensSummary;
pub use occurrence::{EventKind, EventOccurrence};
pub use pattern::{LanguagePattern, PatternTable};
pub use progress::{Progress, ProgressGuard, ProgressId, ProgressReporter, TracingProgress};
pub use scan::{BulkScanner, ScanTarget, resource_display_path};
pub use server::EventServer;
pub use tokio_util::sync::CancellationToken;
