use std::path::PathBuf;

use thiserror::Error;

/// Invalid or missing event configuration. Fatal at construction.
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("could not get the events from configuration")]
	MissingEvents,

	#[error("could not get the events regex from configuration")]
	MissingEventsRegex,

	#[error("events regex template has no {{EVENTS}} placeholder")]
	MissingPlaceholder,

	#[error("language {0:?} defines no trigger or listener functions")]
	EmptyLanguage(String),

	#[error("language {0:?} is configured more than once")]
	DuplicateLanguage(String),

	#[error("invalid events regex for language {language:?}: {source}")]
	Regex {
		language: String,
		#[source]
		source: regex::Error,
	},

	#[error("capture group {index} ({role}) does not exist; the regex has {available} groups")]
	GroupIndex {
		role: &'static str,
		index: usize,
		available: usize,
	},

	#[error("invalid document exclude glob {glob:?}: {source}")]
	Glob {
		glob: String,
		#[source]
		source: globset::Error,
	},

	#[error("failed to parse configuration: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("failed to read configuration {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Failure of a bulk workspace scan batch.
#[derive(Error, Debug)]
pub enum ScanError {
	#[error("failed to read directory {path}: {source}")]
	ReadDir {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("workspace scan cancelled")]
	Cancelled,
}
