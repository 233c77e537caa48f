//! Background tasks that turn OS streams into published events.
//!
//! One bridge runs per [`EventKind`] while that kind has subscribers. Bridges
//! hold only a weak reference to the manager and exit when it is dropped.

use std::collections::HashSet;
use std::sync::Weak;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use liveact_protocol::{
	ActivityEvent, ActivityState, EventKind, PushToStartTokenReceived, StateChange, TokenReceived, encode_token,
};
use liveact_runtime::{ActivityHandle, OsVersion};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};

use super::ManagerInner;

/// A running bridge task.
pub(super) struct Bridge {
	cancel: oneshot::Sender<()>,
	task: JoinHandle<()>,
}

impl Bridge {
	pub(super) fn spawn(kind: EventKind, manager: Weak<ManagerInner>, runtime: &Handle) -> Self {
		let (cancel, cancel_rx) = oneshot::channel();
		let task = match kind {
			EventKind::TokenReceived => runtime.spawn(session_bridge(kind, manager, cancel_rx)),
			EventKind::StateChange => runtime.spawn(session_bridge(kind, manager, cancel_rx)),
			EventKind::PushToStartTokenReceived => runtime.spawn(push_to_start_bridge(manager, cancel_rx)),
		};
		tracing::debug!(%kind, "Event bridge started");
		Self { cancel, task }
	}

	/// Signals the task to stop. The task aborts its per-session watchers
	/// before exiting.
	pub(super) fn stop(self) -> JoinHandle<()> {
		let _ = self.cancel.send(());
		self.task
	}
}

/// Discovers sessions and runs one watcher per session.
async fn session_bridge(kind: EventKind, manager: Weak<ManagerInner>, mut cancel: oneshot::Receiver<()>) {
	let Some(mut updates) = manager.upgrade().map(|m| m.platform.activity_updates()) else {
		return;
	};
	let mut watchers = JoinSet::new();
	let mut seen = HashSet::new();
	let mut discovering = true;

	loop {
		tokio::select! {
			_ = &mut cancel => break,
			next = updates.next(), if discovering => match next {
				Some(handle) => {
					if !seen.insert(handle.id.clone()) {
						continue;
					}
					tracing::debug!(%kind, session_id = %handle.id, state = %handle.state, "Session discovered");
					match kind {
						EventKind::TokenReceived => watchers.spawn(watch_tokens(manager.clone(), handle)),
						_ => watchers.spawn(watch_states(manager.clone(), handle)),
					};
				}
				None => {
					tracing::debug!(%kind, "Activity stream ended");
					discovering = false;
				}
			},
			Some(result) = watchers.join_next(), if !watchers.is_empty() => {
				if let Err(e) = result {
					if e.is_panic() {
						tracing::error!(%kind, error = %e, "Session watcher panicked");
					}
				}
			}
		}
	}

	watchers.shutdown().await;
	tracing::debug!(%kind, "Event bridge stopped");
}

/// Publishes every state change of one session.
async fn watch_states(manager: Weak<ManagerInner>, handle: ActivityHandle) {
	let Some(mut states) = track(&manager, &handle) else {
		return;
	};
	let mut last = handle.state;

	while let Some(state) = states.next().await {
		let Some(m) = manager.upgrade() else {
			return;
		};
		m.record_state(&handle.id, state);
		if state != last {
			m.registry.publish(
				StateChange {
					activity_id: handle.id.clone(),
					activity_name: handle.name.clone(),
					activity_state: state,
				}
				.into(),
			);
			last = state;
		}
	}
}

/// Waits for the session to become active, then publishes its push tokens
/// until it reaches a terminal state.
async fn watch_tokens(manager: Weak<ManagerInner>, handle: ActivityHandle) {
	let Some(mut states) = track(&manager, &handle) else {
		return;
	};

	loop {
		let Some(state) = states.next().await else {
			return;
		};
		let Some(m) = manager.upgrade() else {
			return;
		};
		m.record_state(&handle.id, state);
		if state == ActivityState::Active {
			break;
		}
		if state.is_terminal() {
			return;
		}
	}

	let mut tokens = {
		let Some(m) = manager.upgrade() else {
			return;
		};
		if !m.capabilities.push_notifications_enabled() {
			tracing::debug!(session_id = %handle.id, "Push notifications disabled, not observing push token");
			return;
		}
		tracing::debug!(session_id = %handle.id, "Observing push token");
		m.platform.push_token_updates(&handle.id)
	};

	loop {
		tokio::select! {
			token = tokens.next() => {
				let Some(bytes) = token else { break };
				let Some(m) = manager.upgrade() else { break };
				m.registry.publish(
					TokenReceived {
						activity_id: handle.id.clone(),
						activity_name: handle.name.clone(),
						activity_push_token: encode_token(&bytes),
					}
					.into(),
				);
			}
			state = states.next() => {
				let Some(state) = state else { break };
				let Some(m) = manager.upgrade() else { break };
				m.record_state(&handle.id, state);
				if state.is_terminal() {
					break;
				}
			}
		}
	}
}

/// Registers the session with the manager and opens its state stream.
fn track(manager: &Weak<ManagerInner>, handle: &ActivityHandle) -> Option<BoxStream<'static, ActivityState>> {
	let m = manager.upgrade()?;
	m.track_discovered(handle);
	Some(m.platform.state_updates(&handle.id))
}

/// Publishes the current push-to-start token, then every rotation.
async fn push_to_start_bridge(manager: Weak<ManagerInner>, mut cancel: oneshot::Receiver<()>) {
	let tokens = manager.upgrade().and_then(|m| {
		let caps = &m.capabilities;
		if !caps.push_notifications_enabled() {
			tracing::debug!("Push notifications disabled, push-to-start token unavailable");
			return None;
		}
		if caps.os_version().is_none_or(|v| v < OsVersion::PUSH_TO_START) || !caps.activities_enabled() {
			tracing::warn!(required = %OsVersion::PUSH_TO_START, "Push-to-start token unavailable on this device");
			return None;
		}

		let updates = m.platform.push_to_start_token_updates();
		// Subscribers were already replayed the stored token; only a newer one is news.
		match m.platform.push_to_start_token().map(|bytes| push_to_start_event(&bytes)) {
			Some(event) if m.registry.last_push_to_start().as_ref() != Some(&event) => m.registry.publish(event),
			_ => {}
		}
		Some(updates)
	});

	let Some(mut tokens) = tokens else {
		let _ = cancel.await;
		return;
	};

	loop {
		tokio::select! {
			_ = &mut cancel => break,
			token = tokens.next() => match token {
				Some(bytes) => {
					let Some(m) = manager.upgrade() else { break };
					m.registry.publish(push_to_start_event(&bytes));
				}
				None => {
					let _ = (&mut cancel).await;
					break;
				}
			}
		}
	}

	tracing::debug!(kind = %EventKind::PushToStartTokenReceived, "Event bridge stopped");
}

fn push_to_start_event(bytes: &[u8]) -> ActivityEvent {
	PushToStartTokenReceived {
		activity_push_to_start_token: Some(encode_token(bytes)),
	}
	.into()
}
