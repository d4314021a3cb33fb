#![allow(unused_crate_dependencies)]

mod common;

use eventlens_events::{EventKind, EventLensConfig};
use eventlens_primitives::{Position, TextChange, TextDocument, TextRange};
use pretty_assertions::assert_eq;

fn lua(path: &str, version: i32, text: &str) -> TextDocument {
	TextDocument::new(format!("file:///srv/resources/{path}").parse().unwrap(), "lua", version, text)
}

#[tokio::test]
async fn test_trigger_and_listener_cross_reference() {
	let server = common::server(EventLensConfig::default());
	let client = lua("game/client.lua", 1, "local pos = GetPos()\nTriggerEvent('explode', pos)\n");
	let server_side = lua(
		"game/server.lua",
		1,
		"-- TriggerEvent('explode') in a comment\nAddEventHandler('explode', function(pos)\n  print('boom')\nend)\n",
	);

	let triggers = server.did_open(&client).await;
	let listeners = server.did_open(&server_side).await;
	assert_eq!(triggers.len(), 1);
	assert_eq!(listeners.len(), 1);
	assert_eq!(triggers[0].location.position, Position::new(1, 0));
	assert_eq!(listeners[0].location.position, Position::new(1, 0));

	let from_trigger = server.locations_for(&triggers[0]);
	assert_eq!(from_trigger.into_iter().collect::<Vec<_>>(), vec![listeners[0].location.clone()]);
	let from_listener = server.locations_for(&listeners[0]);
	assert_eq!(from_listener.into_iter().collect::<Vec<_>>(), vec![triggers[0].location.clone()]);

	server.did_delete(server_side.uri());
	assert!(server.locations_for(&triggers[0]).is_empty());
	assert_eq!(server.resolve_lens(&triggers[0]).title, "No Event Listeners Found");
}

#[tokio::test]
async fn test_commenting_out_a_call_removes_it() {
	let server = common::server(EventLensConfig::default());
	let mut doc = lua("game/client.lua", 1, "TriggerServerEvent('bank:deposit', 5)\nRegisterNetEvent('bank:deposit')\n");
	server.did_open(&doc).await;
	assert_eq!(server.index().names(EventKind::Trigger), vec!["bank:deposit".to_string()]);

	let changes = vec![TextChange::insert(Position::new(0, 0), "-- ")];
	doc.apply_changes(&changes).unwrap();
	let found = server.did_change(&doc, &changes, None).await;

	assert_eq!(found.iter().map(|o| o.kind).collect::<Vec<_>>(), vec![EventKind::Listener]);
	assert!(server.index().names(EventKind::Trigger).is_empty());
	assert_eq!(server.resolve_lens(&found[0]).title, "No Event Triggers Found");
}

#[tokio::test]
async fn test_block_comment_edit_hides_following_calls() {
	let server = common::server(EventLensConfig::default());
	let mut doc = lua("game/client.lua", 1, "TriggerEvent('a')\nTriggerEvent('b')\nTriggerEvent('c')\n");
	assert_eq!(server.did_open(&doc).await.len(), 3);

	// Open an unterminated block comment on line 1.
	let changes = vec![TextChange::insert(Position::new(1, 0), "--[[ ")];
	doc.apply_changes(&changes).unwrap();
	let found = server.did_change(&doc, &changes, None).await;
	assert_eq!(found.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(), vec!["a"]);

	// Close it again at the end of line 1.
	let end = doc.line(1).len();
	let changes = vec![TextChange::insert(Position::new(1, end), " ]]")];
	doc.apply_changes(&changes).unwrap();
	let found = server.did_change(&doc, &changes, None).await;
	assert_eq!(found.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(), vec!["a", "c"]);
}

#[tokio::test]
async fn test_javascript_and_lua_share_event_names() {
	let server = common::server(EventLensConfig::default());
	let script = TextDocument::new(
		"file:///srv/resources/ui/main.js".parse().unwrap(),
		"javascript",
		1,
		"const label = \"emitNet('ui:open')\";\nemitNet('ui:open', 1);\n",
	);
	let handler = lua("ui/server.lua", 1, "RegisterNetEvent('ui:open')\n");

	let emitted = server.did_open(&script).await;
	server.did_open(&handler).await;

	assert_eq!(emitted.len(), 1);
	assert_eq!(emitted[0].location.position, Position::new(1, 0));
	assert_eq!(server.resolve_lens(&emitted[0]).title, "1 Event Listener");
}

#[tokio::test]
async fn test_reopen_after_close_reparses() {
	let server = common::server(EventLensConfig::default());
	let doc = lua("game/client.lua", 3, "TriggerEvent('x')\n");
	let first = server.did_open(&doc).await;
	server.did_close(doc.uri());

	let reopened = server.did_open(&doc).await;
	assert_eq!(first, reopened);
	assert!(!std::sync::Arc::ptr_eq(&first, &reopened));
	assert_eq!(server.index().document_count(), 1);
}

#[tokio::test]
async fn test_scope_at_reports_token() {
	let server = common::server(EventLensConfig::default());
	let doc = lua("game/client.lua", 1, "print('hi') -- note\n");

	let call = server.scope_at(&doc, Position::new(0, 2)).await.unwrap();
	assert_eq!(call.text, "print");
	assert_eq!(call.range, TextRange::on_line(0, 0, 5));
	assert!(call.innermost_contains("function"));

	let comment = server.scope_at(&doc, Position::new(0, 15)).await.unwrap();
	assert_eq!(comment.innermost(), Some("comment.line"));
}
