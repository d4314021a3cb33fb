//! Compiled per-language call-site matchers.

use std::collections::{HashMap, HashSet};

use regex::{Regex, RegexBuilder};

use crate::config::{EVENTS_PLACEHOLDER, EventLensConfig};
use crate::error::ConfigError;
use crate::occurrence::EventKind;

/// Immutable matcher for one language.
#[derive(Debug)]
pub struct LanguagePattern {
	regex: Regex,
	function_group: usize,
	event_group: usize,
	triggers: HashSet<String>,
	listeners: HashSet<String>,
}

impl LanguagePattern {
	pub fn regex(&self) -> &Regex {
		&self.regex
	}

	pub fn function_group(&self) -> usize {
		self.function_group
	}

	pub fn event_group(&self) -> usize {
		self.event_group
	}

	/// Classifies a called function; listeners are checked first.
	pub fn classify(&self, function: &str) -> Option<EventKind> {
		if self.listeners.contains(function) {
			Some(EventKind::Listener)
		} else if self.triggers.contains(function) {
			Some(EventKind::Trigger)
		} else {
			None
		}
	}
}

/// Pattern tables for every configured language, built once at startup.
#[derive(Debug, Default)]
pub struct PatternTable {
	languages: HashMap<String, LanguagePattern>,
}

impl PatternTable {
	/// Compiles every language's matcher, failing on the first invalid one.
	pub fn compile(config: &EventLensConfig) -> Result<Self, ConfigError> {
		let template = &config.events_regex;
		if !template.regex.contains(EVENTS_PLACEHOLDER) {
			return Err(ConfigError::MissingPlaceholder);
		}

		let mut languages = HashMap::new();
		for events in &config.events {
			if events.event_triggers.is_empty() && events.event_listeners.is_empty() {
				return Err(ConfigError::EmptyLanguage(events.language_id.clone()));
			}

			let alternation = events
				.event_triggers
				.iter()
				.chain(&events.event_listeners)
				.map(|name| regex::escape(name))
				.collect::<Vec<_>>()
				.join("|");
			let source = template.regex.replace(EVENTS_PLACEHOLDER, &alternation);
			let regex = RegexBuilder::new(&source)
				.multi_line(true)
				.build()
				.map_err(|source| ConfigError::Regex {
					language: events.language_id.clone(),
					source,
				})?;

			// captures_len counts the implicit whole-match group 0.
			let available = regex.captures_len() - 1;
			for (role, index) in [
				("function name", template.function_name_index),
				("event name", template.event_name_index),
			] {
				if index == 0 || index > available {
					return Err(ConfigError::GroupIndex { role, index, available });
				}
			}

			let pattern = LanguagePattern {
				regex,
				function_group: template.function_name_index,
				event_group: template.event_name_index,
				triggers: events.event_triggers.iter().cloned().collect(),
				listeners: events.event_listeners.iter().cloned().collect(),
			};
			if languages.insert(events.language_id.clone(), pattern).is_some() {
				return Err(ConfigError::DuplicateLanguage(events.language_id.clone()));
			}
		}

		tracing::debug!(languages = languages.len(), "events.patterns.compiled");
		Ok(Self { languages })
	}

	pub fn get(&self, language_id: &str) -> Option<&LanguagePattern> {
		self.languages.get(language_id)
	}

	pub fn contains(&self, language_id: &str) -> bool {
		self.languages.contains_key(language_id)
	}

	/// Languages with a matcher, sorted.
	pub fn languages(&self) -> Vec<&str> {
		let mut ids: Vec<&str> = self.languages.keys().map(String::as_str).collect();
		ids.sort_unstable();
		ids
	}
}
