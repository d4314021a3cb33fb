use crate::occurrence::EventKind;

/// Annotation shown above a call site: how many cross-references it has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LensSummary {
	pub count: usize,
	pub title: String,
}

impl LensSummary {
	/// Summarizes `count` locations found for a call site of `kind`.
	///
	/// The title names what was found, so a trigger's lens counts listeners.
	pub fn new(kind: EventKind, count: usize) -> Self {
		let noun = match kind.opposite() {
			EventKind::Trigger => "Event Trigger",
			EventKind::Listener => "Event Listener",
		};
		let title = match count {
			0 => format!("No {noun}s Found"),
			1 => format!("1 {noun}"),
			n => format!("{n} {noun}s"),
		};
		Self { count, title }
	}
}
