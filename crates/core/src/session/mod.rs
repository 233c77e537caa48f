//! Session lifecycle manager.
//!
//! [`ActivityManager`] creates, updates and ends sessions and exposes the OS
//! event streams through a [`ListenerRegistry`].
//!
//! # Commit ordering
//!
//! Each tracked session owns a lane (see `lane.rs`): a worker task that
//! applies that session's commits in call order. `start`, `update` and `end`
//! return once their raw commit reached the OS; the commit with resolved
//! image references follows on the same lane and is skipped if a newer call
//! was queued meanwhile.
//!
//! # Event bridges
//!
//! The first subscriber of an [`EventKind`] starts a bridge task consuming
//! the matching OS stream; the bridge stops when the last subscriber of that
//! kind leaves.

mod bridge;
mod lane;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use liveact_protocol::{
	ActivityConfig, ActivityEvent, ActivityState, CanonicalConfig, ContentState, DismissalPolicy, EventKind,
	PushToStartTokenReceived, StateChange, TokenReceived,
};
use liveact_runtime::{
	ActivityHandle, AssetResolver, CapabilityProvider, Error, OsVersion, Platform, PushType, Result, SessionAttributes,
	request_error,
};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use self::bridge::Bridge;
use self::lane::{JobKind, Lane, LaneContext};
use crate::handlers::Subscription;
use crate::normalize::normalize;
use crate::registry::{ListenerRegistry, StreamDemand};

/// Name stored in session attributes unless overridden.
pub const DEFAULT_ATTRIBUTES_NAME: &str = "LiveActivity";

/// Upper bound for resolving one image reference.
pub const DEFAULT_ASSET_TIMEOUT: Duration = Duration::from_secs(5);

/// Manager settings.
#[derive(Debug, Clone)]
pub struct ManagerOptions {
	/// `name` stored in every session's attributes.
	pub attributes_name: String,
	/// Per-reference asset resolution timeout.
	pub asset_timeout: Duration,
}

impl Default for ManagerOptions {
	fn default() -> Self {
		Self {
			attributes_name: DEFAULT_ATTRIBUTES_NAME.to_string(),
			asset_timeout: DEFAULT_ASSET_TIMEOUT,
		}
	}
}

impl ManagerOptions {
	pub fn with_attributes_name(mut self, name: impl Into<String>) -> Self {
		self.attributes_name = name.into();
		self
	}

	pub fn with_asset_timeout(mut self, timeout: Duration) -> Self {
		self.asset_timeout = timeout;
		self
	}
}

struct TrackedSession {
	state: Option<ActivityState>,
	lane: Lane,
}

pub(crate) struct ManagerInner {
	this: Weak<ManagerInner>,
	platform: Arc<dyn Platform>,
	capabilities: Arc<dyn CapabilityProvider>,
	assets: Arc<dyn AssetResolver>,
	options: ManagerOptions,
	registry: ListenerRegistry,
	sessions: Mutex<HashMap<String, TrackedSession>>,
	/// Workers of sessions no longer tracked, joined on shutdown.
	retired: Mutex<Vec<JoinHandle<()>>>,
	bridges: Mutex<HashMap<EventKind, Bridge>>,
	runtime: Option<Handle>,
	closed: AtomicBool,
}

impl ManagerInner {
	fn lane_context(&self) -> LaneContext {
		LaneContext {
			platform: Arc::clone(&self.platform),
			assets: Arc::clone(&self.assets),
			asset_timeout: self.options.asset_timeout,
		}
	}

	fn ensure_open(&self) -> Result<()> {
		if self.closed.load(Ordering::SeqCst) {
			return Err(Error::ChannelClosed);
		}
		Ok(())
	}

	fn require_platform(&self) -> Result<OsVersion> {
		self.capabilities.os_version().ok_or(Error::UnsupportedPlatform)
	}

	fn require_version(version: OsVersion) -> Result<()> {
		if version < OsVersion::SESSIONS {
			return Err(Error::UnsupportedPlatformVersion {
				required: OsVersion::SESSIONS,
			});
		}
		Ok(())
	}

	fn require_sessions(&self) -> Result<()> {
		self.ensure_open()?;
		Self::require_version(self.require_platform()?)
	}

	fn retire(&self, worker: JoinHandle<()>) {
		let mut retired = self.retired.lock();
		retired.retain(|handle| !handle.is_finished());
		retired.push(worker);
	}

	/// Tracks a session announced by the OS, e.g. one started remotely.
	fn track_discovered(&self, handle: &ActivityHandle) {
		if handle.state.is_terminal() || self.closed.load(Ordering::SeqCst) {
			return;
		}
		let mut sessions = self.sessions.lock();
		if !sessions.contains_key(&handle.id) {
			tracing::debug!(session_id = %handle.id, name = %handle.name, "Tracking discovered session");
			sessions.insert(
				handle.id.clone(),
				TrackedSession {
					state: Some(handle.state),
					lane: Lane::spawn(handle.id.clone(), self.lane_context()),
				},
			);
		}
	}

	/// Records an observed state. Terminal sessions stop being tracked.
	fn record_state(&self, id: &str, state: ActivityState) {
		let removed = {
			let mut sessions = self.sessions.lock();
			if state.is_terminal() {
				sessions.remove(id)
			} else {
				if let Some(session) = sessions.get_mut(id) {
					session.state = Some(state);
				}
				None
			}
		};

		if let Some(session) = removed {
			tracing::debug!(session_id = id, %state, "Session no longer tracked");
			self.retire(session.lane.into_worker());
		}
	}

	fn spawn_bridge(&self, kind: EventKind) -> Option<Bridge> {
		let runtime = self.runtime.clone().or_else(|| Handle::try_current().ok());
		let Some(runtime) = runtime else {
			tracing::warn!(%kind, "No tokio runtime available, event bridge not started");
			return None;
		};
		Some(Bridge::spawn(kind, self.this.clone(), &runtime))
	}
}

impl StreamDemand for ManagerInner {
	fn demand_changed(&self, kind: EventKind) {
		let mut bridges = self.bridges.lock();
		let wanted = !self.closed.load(Ordering::SeqCst) && self.registry.has_subscribers(kind);

		match (wanted, bridges.contains_key(&kind)) {
			(true, false) => {
				if let Some(bridge) = self.spawn_bridge(kind) {
					bridges.insert(kind, bridge);
				}
			}
			(false, true) => {
				if let Some(bridge) = bridges.remove(&kind) {
					tracing::debug!(%kind, "Last listener left, stopping event bridge");
					self.retire(bridge.stop());
				}
			}
			_ => {}
		}
	}
}

/// Creates, updates and ends sessions and publishes OS events to listeners.
///
/// Cloning is cheap; clones share the same sessions and listeners.
///
/// # Example
///
/// ```ignore
/// let manager = ActivityManager::new(platform, capabilities, assets);
/// let _states = manager.on_state_change(|change| println!("{change:?}"))?;
///
/// let id = manager.start(&ContentState::new("Order #7").with_image("courier"), None).await?;
/// manager.update(&id, &ContentState::new("Order #7").with_subtitle("Arriving")).await?;
/// manager.end(&id, &ContentState::new("Delivered")).await?;
/// ```
#[derive(Clone)]
pub struct ActivityManager {
	inner: Arc<ManagerInner>,
}

impl ActivityManager {
	pub fn new(
		platform: Arc<dyn Platform>,
		capabilities: Arc<dyn CapabilityProvider>,
		assets: Arc<dyn AssetResolver>,
	) -> Self {
		Self::with_options(platform, capabilities, assets, ManagerOptions::default())
	}

	pub fn with_options(
		platform: Arc<dyn Platform>,
		capabilities: Arc<dyn CapabilityProvider>,
		assets: Arc<dyn AssetResolver>,
		options: ManagerOptions,
	) -> Self {
		let inner = Arc::new_cyclic(|this: &Weak<ManagerInner>| {
			let demand: Weak<dyn StreamDemand> = this.clone();
			ManagerInner {
				this: this.clone(),
				platform,
				capabilities,
				assets,
				options,
				registry: ListenerRegistry::with_demand(demand),
				sessions: Mutex::new(HashMap::new()),
				retired: Mutex::new(Vec::new()),
				bridges: Mutex::new(HashMap::new()),
				runtime: Handle::try_current().ok(),
				closed: AtomicBool::new(false),
			}
		});
		Self { inner }
	}

	/// Starts a session and returns its id once the raw state is committed.
	///
	/// Image references are committed verbatim first; a follow-up commit
	/// replaces them with resolved handles.
	///
	/// # Errors
	///
	/// - [`Error::UnsupportedPlatform`] when live activities do not exist here
	/// - [`Error::InvalidConfiguration`] for a malformed `config`
	/// - [`Error::UnsupportedPlatformVersion`] below OS 16.2
	/// - [`Error::ActivitiesDisabled`] when the user turned them off
	/// - [`Error::PlatformRequestFailed`] when the OS refuses the request
	pub async fn start(&self, state: &ContentState, config: Option<&ActivityConfig>) -> Result<String> {
		let inner = &self.inner;
		inner.ensure_open()?;
		let version = inner.require_platform()?;
		let config = match config {
			Some(config) => normalize(config)?,
			None => CanonicalConfig::default(),
		};
		ManagerInner::require_version(version)?;
		if !inner.capabilities.activities_enabled() {
			return Err(Error::ActivitiesDisabled);
		}

		let attributes = SessionAttributes {
			name: inner.options.attributes_name.clone(),
			config,
		};
		let push_type = if inner.capabilities.push_notifications_enabled() {
			PushType::Token
		} else {
			PushType::None
		};
		let native = state.to_native();

		let id = inner
			.platform
			.request_session(&attributes, &native, push_type)
			.await
			.map_err(|e| request_error("request_session", e))?;
		tracing::info!(session_id = %id, ?push_type, "Session requested");

		let mut sessions = inner.sessions.lock();
		let session = sessions.entry(id.clone()).or_insert_with(|| TrackedSession {
			state: None,
			lane: Lane::spawn(id.clone(), inner.lane_context()),
		});
		session.lane.submit(JobKind::Refine, native)?;
		Ok(id)
	}

	/// Replaces a session's content state.
	///
	/// Returns once the raw state is committed. Calls for the same session are
	/// applied in call order.
	pub async fn update(&self, id: &str, state: &ContentState) -> Result<()> {
		self.inner.require_sessions()?;
		let ack = {
			let sessions = self.inner.sessions.lock();
			let session = sessions.get(id).ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
			session.lane.submit(JobKind::Update, state.to_native())?
		};
		tracing::info!(session_id = id, "Update queued");
		await_ack(ack).await
	}

	/// Commits the final state and dismisses the session immediately.
	pub async fn end(&self, id: &str, state: &ContentState) -> Result<()> {
		self.end_with(id, state, DismissalPolicy::Immediate).await
	}

	/// Commits the final state and ends the session with `policy`.
	///
	/// The session stops being tracked as soon as teardown is queued.
	pub async fn end_with(&self, id: &str, state: &ContentState, policy: DismissalPolicy) -> Result<()> {
		self.inner.require_sessions()?;
		let (ack, worker) = {
			let mut sessions = self.inner.sessions.lock();
			let session = sessions.remove(id).ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
			let ack = session.lane.submit(JobKind::End(policy), state.to_native());
			(ack, session.lane.into_worker())
		};
		self.inner.retire(worker);
		tracing::info!(session_id = id, ?policy, "End queued");
		await_ack(ack?).await
	}

	/// Registers `handler` for events of `kind`.
	///
	/// The first subscriber of a kind starts consuming the matching OS
	/// stream. Push-to-start subscribers immediately receive the last known
	/// token, if any.
	pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Result<Subscription>
	where
		F: Fn(ActivityEvent) + Send + Sync + 'static,
	{
		self.inner.require_platform()?;
		Ok(self.inner.registry.subscribe(kind, handler))
	}

	/// Stops delivery to one subscriber. Same as dropping the subscription.
	pub fn unsubscribe(&self, subscription: Subscription) {
		subscription.unsubscribe();
	}

	pub fn on_token_received<F>(&self, handler: F) -> Result<Subscription>
	where
		F: Fn(TokenReceived) + Send + Sync + 'static,
	{
		self.subscribe(EventKind::TokenReceived, move |event| {
			if let ActivityEvent::TokenReceived(event) = event {
				handler(event);
			}
		})
	}

	pub fn on_state_change<F>(&self, handler: F) -> Result<Subscription>
	where
		F: Fn(StateChange) + Send + Sync + 'static,
	{
		self.subscribe(EventKind::StateChange, move |event| {
			if let ActivityEvent::StateChange(event) = event {
				handler(event);
			}
		})
	}

	pub fn on_push_to_start_token<F>(&self, handler: F) -> Result<Subscription>
	where
		F: Fn(PushToStartTokenReceived) + Send + Sync + 'static,
	{
		self.subscribe(EventKind::PushToStartTokenReceived, move |event| {
			if let ActivityEvent::PushToStartTokenReceived(event) = event {
				handler(event);
			}
		})
	}

	/// Ids of tracked sessions, sorted.
	pub fn tracked_sessions(&self) -> Vec<String> {
		let mut ids: Vec<String> = self.inner.sessions.lock().keys().cloned().collect();
		ids.sort();
		ids
	}

	pub fn is_tracked(&self, id: &str) -> bool {
		self.inner.sessions.lock().contains_key(id)
	}

	/// Last observed state of a tracked session. `None` until a state-change
	/// or token bridge has observed it.
	pub fn session_state(&self, id: &str) -> Option<ActivityState> {
		self.inner.sessions.lock().get(id).and_then(|session| session.state)
	}

	/// Returns true while a bridge for `kind` is running.
	pub fn is_bridging(&self, kind: EventKind) -> bool {
		self.inner.bridges.lock().contains_key(&kind)
	}

	pub fn options(&self) -> &ManagerOptions {
		&self.inner.options
	}

	/// Stops every bridge, lets session lanes drain their queued commits and
	/// waits for all of it. Later calls to `start`, `update` and `end` fail
	/// with [`Error::ChannelClosed`].
	pub async fn shutdown(&self) {
		self.inner.closed.store(true, Ordering::SeqCst);

		let bridges: Vec<Bridge> = self.inner.bridges.lock().drain().map(|(_, bridge)| bridge).collect();
		let mut handles: Vec<JoinHandle<()>> = bridges.into_iter().map(Bridge::stop).collect();

		let sessions: Vec<TrackedSession> = self.inner.sessions.lock().drain().map(|(_, session)| session).collect();
		handles.extend(sessions.into_iter().map(|session| session.lane.into_worker()));
		handles.extend(self.inner.retired.lock().drain(..));

		for handle in handles {
			if let Err(e) = handle.await {
				if e.is_panic() {
					tracing::error!(error = %e, "Task panicked before shutdown");
				}
			}
		}
		tracing::debug!("Activity manager shut down");
	}
}

impl std::fmt::Debug for ActivityManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ActivityManager")
			.field("sessions", &self.inner.sessions.lock().len())
			.field("bridges", &self.inner.bridges.lock().len())
			.field("options", &self.inner.options)
			.finish()
	}
}

async fn await_ack(ack: Option<tokio::sync::oneshot::Receiver<Result<()>>>) -> Result<()> {
	match ack {
		Some(rx) => rx.await.map_err(|_| Error::ChannelClosed)?,
		None => Ok(()),
	}
}
