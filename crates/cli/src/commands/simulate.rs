//! Scripted sessions against the in-memory platform.
//!
//! A scenario is a JSON document with an optional `config` and a list of
//! `steps`, each tagged by `op`:
//!
//! ```json
//! {
//!   "config": { "imageSize": { "width": "40%" } },
//!   "steps": [
//!     { "op": "start", "state": { "title": "Order placed", "imageName": "bag" } },
//!     { "op": "rotateToken", "token": "0aff" },
//!     { "op": "update", "state": { "title": "Out for delivery" } },
//!     { "op": "setState", "to": "stale" },
//!     { "op": "end", "state": { "title": "Delivered" }, "dismissal": { "type": "default" } }
//!   ]
//! }
//! ```
//!
//! Steps that operate on a session target the most recently started one.
//! Failing steps are reported and the scenario continues.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use liveact::{
	ActivityConfig, ActivityEvent, ActivityManager, ActivityState, ContentState, DismissalPolicy, EventKind,
	ManagerOptions,
};
use liveact_protocol::{DeliveryToken, NativeContentState};
use liveact_runtime::{Capabilities, Commit, MemoryAssets, MemoryPlatform, OsVersion};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::cli::SimulateArgs;
use crate::error::{CliError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
	#[serde(default)]
	pub config: Option<ActivityConfig>,
	pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
	Start {
		state: ContentState,
	},
	Update {
		state: ContentState,
	},
	End {
		state: ContentState,
		#[serde(default)]
		dismissal: DismissalPolicy,
	},
	/// OS-driven lifecycle transition.
	SetState {
		to: ActivityState,
	},
	/// OS issues a new push token for the current session.
	RotateToken {
		token: DeliveryToken,
	},
	PushToStartToken {
		token: DeliveryToken,
	},
	/// A session started by a push-to-start notification rather than by this process.
	RemoteStart {
		name: String,
		state: ContentState,
	},
	Wait {
		ms: u64,
	},
}

impl Step {
	pub fn op(&self) -> &'static str {
		match self {
			Step::Start { .. } => "start",
			Step::Update { .. } => "update",
			Step::End { .. } => "end",
			Step::SetState { .. } => "setState",
			Step::RotateToken { .. } => "rotateToken",
			Step::PushToStartToken { .. } => "pushToStartToken",
			Step::RemoteStart { .. } => "remoteStart",
			Step::Wait { .. } => "wait",
		}
	}
}

/// Simulated device capabilities.
#[derive(Debug, Clone)]
pub struct Device {
	pub os_version: Option<OsVersion>,
	pub activities_enabled: bool,
	pub push_enabled: bool,
	pub attributes_name: String,
	/// Pause after every step so bridges can deliver.
	pub settle: Duration,
}

impl Default for Device {
	fn default() -> Self {
		Self {
			os_version: Some(OsVersion::PUSH_TO_START),
			activities_enabled: true,
			push_enabled: true,
			attributes_name: liveact::session::DEFAULT_ATTRIBUTES_NAME.to_string(),
			settle: Duration::from_millis(25),
		}
	}
}

impl From<&SimulateArgs> for Device {
	fn from(args: &SimulateArgs) -> Self {
		Self {
			os_version: (!args.unsupported).then_some(args.os_version),
			activities_enabled: !args.disabled,
			push_enabled: !args.no_push,
			attributes_name: args.attributes_name.clone(),
			settle: Duration::from_millis(args.settle_ms),
		}
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
	pub sessions: Vec<SessionReport>,
	pub events: Vec<ActivityEvent>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub failures: Vec<StepFailure>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
	pub id: String,
	pub name: String,
	pub state: Option<ActivityState>,
	pub commits: Vec<CommitRecord>,
}

/// Serializable view of a [`Commit`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CommitRecord {
	Request { state: NativeContentState },
	Update { state: NativeContentState },
	End { state: NativeContentState, dismissal: DismissalPolicy },
}

impl From<Commit> for CommitRecord {
	fn from(commit: Commit) -> Self {
		match commit {
			Commit::Request(state) => CommitRecord::Request { state },
			Commit::Update(state) => CommitRecord::Update { state },
			Commit::End(state, dismissal) => CommitRecord::End { state, dismissal },
		}
	}
}

#[derive(Debug, Serialize)]
pub struct StepFailure {
	pub step: usize,
	pub op: &'static str,
	pub error: String,
}

pub(super) async fn execute(args: &SimulateArgs) -> Result<SimulationReport> {
	let raw = std::fs::read_to_string(&args.scenario)
		.with_context(|| format!("failed to read scenario {}", args.scenario.display()))?;
	let scenario: Scenario = serde_json::from_str(&raw)?;
	run(scenario, &Device::from(args)).await
}

/// Plays `scenario` on a fresh simulated device and collects every commit
/// and published event.
pub async fn run(scenario: Scenario, device: &Device) -> Result<SimulationReport> {
	let platform = Arc::new(MemoryPlatform::new());
	let caps = Arc::new(Capabilities::new(device.os_version));
	caps.set_activities_enabled(device.activities_enabled);
	caps.set_push_notifications_enabled(device.push_enabled);
	let manager = ActivityManager::with_options(
		platform.clone(),
		caps,
		Arc::new(MemoryAssets::passthrough()),
		ManagerOptions::default().with_attributes_name(device.attributes_name.clone()),
	);

	let (tx, mut rx) = mpsc::unbounded_channel();
	let mut subscriptions = Vec::new();
	for kind in EventKind::ALL {
		let tx = tx.clone();
		match manager.subscribe(kind, move |event| {
			let _ = tx.send(event);
		}) {
			Ok(subscription) => subscriptions.push(subscription),
			Err(err) => {
				tracing::warn!(%kind, error = %err, "Not observing events");
				break;
			}
		}
	}
	drop(tx);

	let Scenario { config, steps } = scenario;
	let mut current = None;
	let mut failures = Vec::new();
	for (index, step) in steps.into_iter().enumerate() {
		let op = step.op();
		tracing::info!(step = index, op, "Applying step");
		if let Err(err) = apply(&manager, &platform, &mut current, config.as_ref(), step).await {
			tracing::warn!(step = index, op, error = %err, "Step failed");
			failures.push(StepFailure {
				step: index,
				op,
				error: err.to_string(),
			});
		}
		tokio::time::sleep(device.settle).await;
	}

	manager.shutdown().await;
	drop(subscriptions);

	let mut events = Vec::new();
	while let Ok(event) = rx.try_recv() {
		events.push(event);
	}

	let sessions = platform
		.session_ids()
		.into_iter()
		.map(|id| SessionReport {
			name: platform.attributes(&id).map(|a| a.name).unwrap_or_default(),
			state: platform.state(&id),
			commits: platform.commits(&id).into_iter().map(CommitRecord::from).collect(),
			id,
		})
		.collect();

	Ok(SimulationReport {
		sessions,
		events,
		failures,
	})
}

async fn apply(
	manager: &ActivityManager,
	platform: &MemoryPlatform,
	current: &mut Option<String>,
	config: Option<&ActivityConfig>,
	step: Step,
) -> Result<()> {
	match step {
		Step::Start { state } => {
			*current = Some(manager.start(&state, config).await?);
		}
		Step::Update { state } => manager.update(session(current.as_deref())?, &state).await?,
		Step::End { state, dismissal } => {
			manager
				.end_with(session(current.as_deref())?, &state, dismissal)
				.await?
		}
		Step::SetState { to } => {
			let id = session(current.as_deref())?;
			if !platform.set_state(id, to) {
				return Err(liveact::Error::SessionNotFound(id.to_string()).into());
			}
		}
		Step::RotateToken { token } => {
			let id = session(current.as_deref())?;
			if !platform.rotate_push_token(id, token.as_bytes()) {
				return Err(liveact::Error::SessionNotFound(id.to_string()).into());
			}
		}
		Step::PushToStartToken { token } => platform.set_push_to_start_token(token.as_bytes()),
		Step::RemoteStart { name, state } => {
			let config = config.map(liveact::normalize).transpose()?.unwrap_or_default();
			*current = Some(platform.start_remote(&name, config, state.to_native()));
		}
		Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(ms)).await,
	}
	Ok(())
}

fn session(current: Option<&str>) -> Result<&str> {
	current.ok_or_else(|| CliError::InvalidInput("no session has been started".into()))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn scenario(value: serde_json::Value) -> Scenario {
		serde_json::from_value(value).unwrap()
	}

	#[tokio::test]
	async fn full_lifecycle_is_recorded() {
		let report = run(
			scenario(json!({
				"steps": [
					{ "op": "start", "state": { "title": "Order placed", "imageName": "bag" } },
					{ "op": "rotateToken", "token": "0aff" },
					{ "op": "update", "state": { "title": "Out for delivery" } },
					{ "op": "setState", "to": "stale" },
					{ "op": "end", "state": { "title": "Delivered" } }
				]
			})),
			&Device::default(),
		)
		.await
		.unwrap();

		assert!(report.failures.is_empty());
		let session = &report.sessions[0];
		assert_eq!(session.name, "LiveActivity");
		assert_eq!(session.state, Some(ActivityState::Ended));
		assert!(matches!(session.commits.first(), Some(CommitRecord::Request { .. })));
		assert!(matches!(
			session.commits.last(),
			Some(CommitRecord::End { state, dismissal: DismissalPolicy::Immediate }) if state.title == "Delivered"
		));

		assert!(report.events.iter().any(|e| matches!(
			e,
			ActivityEvent::TokenReceived(t) if t.activity_push_token == "0aff"
		)));
		assert!(report.events.iter().any(|e| matches!(
			e,
			ActivityEvent::StateChange(c) if c.activity_state == ActivityState::Stale
		)));
	}

	#[tokio::test]
	async fn steps_without_a_session_fail_and_continue() {
		let report = run(
			scenario(json!({
				"steps": [
					{ "op": "update", "state": { "title": "too early" } },
					{ "op": "start", "state": { "title": "now" } }
				]
			})),
			&Device::default(),
		)
		.await
		.unwrap();

		assert_eq!(report.failures.len(), 1);
		assert_eq!(report.failures[0].op, "update");
		assert_eq!(report.sessions.len(), 1);
	}

	#[tokio::test]
	async fn unsupported_device_rejects_start() {
		let device = Device {
			os_version: None,
			..Device::default()
		};
		let report = run(
			scenario(json!({ "steps": [{ "op": "start", "state": { "title": "x" } }] })),
			&device,
		)
		.await
		.unwrap();

		assert!(report.sessions.is_empty());
		assert!(report.events.is_empty());
		assert_eq!(report.failures[0].error, liveact::Error::UnsupportedPlatform.to_string());
	}

	#[tokio::test]
	async fn push_to_start_token_is_published() {
		let report = run(
			scenario(json!({ "steps": [{ "op": "pushToStartToken", "token": "beef" }] })),
			&Device::default(),
		)
		.await
		.unwrap();

		assert!(report.events.contains(&ActivityEvent::PushToStartTokenReceived(
			liveact::PushToStartTokenReceived {
				activity_push_to_start_token: Some("beef".into()),
			}
		)));
	}

	#[test]
	fn malformed_token_is_rejected() {
		let result = serde_json::from_value::<Scenario>(json!({
			"steps": [{ "op": "rotateToken", "token": "xyz" }]
		}));
		assert!(result.is_err());
	}
}
