//! Events published to host listeners.
//!
//! There are three event kinds, each with its own payload:
//!
//! - [`TokenReceived`] - a session's push delivery token rotated
//! - [`PushToStartTokenReceived`] - the process-wide push-to-start token rotated
//! - [`StateChange`] - a session changed [`ActivityState`]

use serde::{Deserialize, Serialize};

use crate::state::ActivityState;

/// Discriminant used to subscribe to one event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
	#[serde(rename = "onTokenReceived")]
	TokenReceived,
	#[serde(rename = "onPushToStartTokenReceived")]
	PushToStartTokenReceived,
	#[serde(rename = "onStateChange")]
	StateChange,
}

impl EventKind {
	pub const ALL: [EventKind; 3] = [
		EventKind::TokenReceived,
		EventKind::PushToStartTokenReceived,
		EventKind::StateChange,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::TokenReceived => "onTokenReceived",
			Self::PushToStartTokenReceived => "onPushToStartTokenReceived",
			Self::StateChange => "onStateChange",
		}
	}
}

impl std::fmt::Display for EventKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A session's push token, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenReceived {
	#[serde(rename = "activityID")]
	pub activity_id: String,
	pub activity_name: String,
	pub activity_push_token: String,
}

/// The push-to-start token, hex encoded. `None` where the OS has none to offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushToStartTokenReceived {
	pub activity_push_to_start_token: Option<String>,
}

/// A lifecycle transition for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
	#[serde(rename = "activityID")]
	pub activity_id: String,
	pub activity_name: String,
	pub activity_state: ActivityState,
}

/// Any event delivered through the listener registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "params")]
pub enum ActivityEvent {
	#[serde(rename = "onTokenReceived")]
	TokenReceived(TokenReceived),
	#[serde(rename = "onPushToStartTokenReceived")]
	PushToStartTokenReceived(PushToStartTokenReceived),
	#[serde(rename = "onStateChange")]
	StateChange(StateChange),
}

impl ActivityEvent {
	pub fn kind(&self) -> EventKind {
		match self {
			Self::TokenReceived(_) => EventKind::TokenReceived,
			Self::PushToStartTokenReceived(_) => EventKind::PushToStartTokenReceived,
			Self::StateChange(_) => EventKind::StateChange,
		}
	}
}

impl From<TokenReceived> for ActivityEvent {
	fn from(event: TokenReceived) -> Self {
		Self::TokenReceived(event)
	}
}

impl From<PushToStartTokenReceived> for ActivityEvent {
	fn from(event: PushToStartTokenReceived) -> Self {
		Self::PushToStartTokenReceived(event)
	}
}

impl From<StateChange> for ActivityEvent {
	fn from(event: StateChange) -> Self {
		Self::StateChange(event)
	}
}
