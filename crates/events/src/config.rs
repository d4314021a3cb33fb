//! Event lens configuration.
//!
//! Configuration is loaded from TOML. The pattern tables (`events`) and the
//! shared regex template (`events_regex`) are required; everything else has
//! defaults. Validation happens when the tables are compiled into a
//! [`PatternTable`](crate::PatternTable).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Placeholder in the regex template replaced by the function-name alternation.
pub const EVENTS_PLACEHOLDER: &str = "{EVENTS}";

/// Default call-site template: function name in group 1, quoted event name in group 2.
pub const DEFAULT_EVENTS_REGEX: &str = r#"\b({EVENTS})\s*\(\s*("[^"\r\n]*"|'[^'\r\n]*')"#;

const DEFAULT_MAX_FILE_SIZE: usize = 512 * 1024;
const DEFAULT_PARSE_TIMEOUT: Duration = Duration::from_millis(3000);

/// Trigger and listener function names for one language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageEvents {
	pub language_id: String,
	#[serde(default)]
	pub event_triggers: Vec<String>,
	#[serde(default)]
	pub event_listeners: Vec<String>,
}

/// Regex template shared by all languages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventsRegex {
	/// Template containing [`EVENTS_PLACEHOLDER`].
	pub regex: String,
	/// Capture group holding the called function's name.
	pub function_name_index: usize,
	/// Capture group holding the quoted event name.
	pub event_name_index: usize,
}

impl Default for EventsRegex {
	fn default() -> Self {
		Self {
			regex: DEFAULT_EVENTS_REGEX.to_string(),
			function_name_index: 1,
			event_name_index: 2,
		}
	}
}

/// Complete engine configuration.
#[derive(Debug, Clone)]
pub struct EventLensConfig {
	pub events: Vec<LanguageEvents>,
	pub events_regex: EventsRegex,
	/// Globs tested against document paths; any match skips the document.
	pub document_exclude_globs: Vec<String>,
	/// Byte ceiling for extractions that carry no cancellation token.
	pub max_file_size: usize,
	/// Soft deadline after which a slow parse is reported as in progress.
	pub parse_timeout: Duration,
	/// Directory under each workspace folder holding resources.
	pub resources_dir: String,
	/// Files marking a directory as a resource.
	pub manifest_files: Vec<String>,
	/// Roots scanned by a workspace rescan.
	pub workspace_folders: Vec<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
	events: Option<Vec<LanguageEvents>>,
	events_regex: Option<EventsRegex>,
	document_exclude_globs: Option<Vec<String>>,
	max_file_size: Option<usize>,
	parse_timeout_ms: Option<u64>,
	resources_dir: Option<String>,
	manifest_files: Option<Vec<String>>,
	workspace_folders: Option<Vec<PathBuf>>,
}

impl Default for EventLensConfig {
	/// FiveM trigger/listener tables for Lua and JavaScript.
	fn default() -> Self {
		Self {
			events: vec![
				LanguageEvents {
					language_id: "lua".into(),
					event_triggers: strings(&[
						"TriggerEvent",
						"TriggerServerEvent",
						"TriggerClientEvent",
						"TriggerLatentServerEvent",
						"TriggerLatentClientEvent",
					]),
					event_listeners: strings(&["AddEventHandler", "RegisterNetEvent", "RegisterServerEvent"]),
				},
				LanguageEvents {
					language_id: "javascript".into(),
					event_triggers: strings(&["emit", "emitNet", "TriggerEvent", "TriggerServerEvent", "TriggerClientEvent"]),
					event_listeners: strings(&["on", "onNet", "AddEventHandler", "RegisterNetEvent"]),
				},
			],
			events_regex: EventsRegex::default(),
			document_exclude_globs: strings(&["**/node_modules/**", "**/.git/**"]),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
			parse_timeout: DEFAULT_PARSE_TIMEOUT,
			resources_dir: "resources".into(),
			manifest_files: strings(&["fxmanifest.lua", "__resource.lua"]),
			workspace_folders: Vec::new(),
		}
	}
}

fn strings(items: &[&str]) -> Vec<String> {
	items.iter().map(|s| s.to_string()).collect()
}

impl EventLensConfig {
	/// Parses a TOML configuration document.
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		let raw: RawConfig = toml::from_str(text)?;
		let defaults = Self::default();
		Ok(Self {
			events: raw.events.ok_or(ConfigError::MissingEvents)?,
			events_regex: raw.events_regex.ok_or(ConfigError::MissingEventsRegex)?,
			document_exclude_globs: raw.document_exclude_globs.unwrap_or(defaults.document_exclude_globs),
			max_file_size: raw.max_file_size.unwrap_or(defaults.max_file_size),
			parse_timeout: raw.parse_timeout_ms.map(Duration::from_millis).unwrap_or(defaults.parse_timeout),
			resources_dir: raw.resources_dir.unwrap_or(defaults.resources_dir),
			manifest_files: raw.manifest_files.unwrap_or(defaults.manifest_files),
			workspace_folders: raw.workspace_folders.unwrap_or_default(),
		})
	}

	/// Reads and parses a TOML configuration file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		tracing::debug!(path = %path.display(), "config.load");
		Self::from_toml_str(&text)
	}

	/// Languages with a pattern table.
	pub fn languages(&self) -> impl Iterator<Item = &str> {
		self.events.iter().map(|e| e.language_id.as_str())
	}
}
