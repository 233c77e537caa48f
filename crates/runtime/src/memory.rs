//! In-process OS simulator.
//!
//! [`MemoryPlatform`] and [`MemoryAssets`] implement the capability traits
//! without any device. They record every commit for later assertion and
//! expose `set_*` / `rotate_*` controls to drive the event streams the way
//! the OS would. Used by the test suites and by `liveact simulate`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use liveact_protocol::{ActivityState, CanonicalConfig, DismissalPolicy, NativeContentState};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::{PlatformError, PlatformResult};
use crate::platform::{ActivityHandle, AssetResolver, ImageHandle, Platform, PushType, SessionAttributes};

const STREAM_CAPACITY: usize = 64;

/// One content commit received by the simulated OS.
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
	Request(NativeContentState),
	Update(NativeContentState),
	End(NativeContentState, DismissalPolicy),
}

impl Commit {
	pub fn state(&self) -> &NativeContentState {
		match self {
			Commit::Request(state) | Commit::Update(state) | Commit::End(state, _) => state,
		}
	}
}

/// Platform operation that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
	Request,
	Update,
	End,
}

struct MemorySession {
	attributes: SessionAttributes,
	state: ActivityState,
	push_type: PushType,
	push_token: Option<Vec<u8>>,
	commits: Vec<Commit>,
	state_tx: broadcast::Sender<ActivityState>,
	token_tx: broadcast::Sender<Vec<u8>>,
}

/// Simulated OS session store.
pub struct MemoryPlatform {
	sessions: DashMap<String, MemorySession>,
	/// Creation order; also serializes creation against `activity_updates` snapshots.
	order: Mutex<Vec<String>>,
	activity_tx: broadcast::Sender<ActivityHandle>,
	push_to_start: Mutex<Option<Vec<u8>>>,
	push_to_start_tx: broadcast::Sender<Vec<u8>>,
	next_id: AtomicU64,
	initial_state: Mutex<ActivityState>,
	failures: Mutex<HashMap<Operation, PlatformError>>,
}

impl Default for MemoryPlatform {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryPlatform {
	/// New sessions start [`ActivityState::Active`].
	pub fn new() -> Self {
		let (activity_tx, _) = broadcast::channel(STREAM_CAPACITY);
		let (push_to_start_tx, _) = broadcast::channel(STREAM_CAPACITY);
		Self {
			sessions: DashMap::new(),
			order: Mutex::new(Vec::new()),
			activity_tx,
			push_to_start: Mutex::new(None),
			push_to_start_tx,
			next_id: AtomicU64::new(1),
			initial_state: Mutex::new(ActivityState::Active),
			failures: Mutex::new(HashMap::new()),
		}
	}

	/// Sets the state new sessions are created in.
	pub fn with_initial_state(self, state: ActivityState) -> Self {
		*self.initial_state.lock() = state;
		self
	}

	/// Makes the next call of `operation` fail with `error`.
	pub fn fail_next(&self, operation: Operation, error: PlatformError) {
		self.failures.lock().insert(operation, error);
	}

	/// Simulates a session started remotely through a push-to-start token.
	pub fn start_remote(&self, name: &str, config: CanonicalConfig, state: NativeContentState) -> String {
		let attributes = SessionAttributes {
			name: name.to_string(),
			config,
		};
		self.create(attributes, state, PushType::Token)
	}

	/// Moves a session to `state` and notifies its state stream.
	///
	/// Returns `false` for unknown ids.
	pub fn set_state(&self, id: &str, state: ActivityState) -> bool {
		let Some(mut session) = self.sessions.get_mut(id) else {
			return false;
		};
		session.state = state;
		let _ = session.state_tx.send(state);
		tracing::debug!(session_id = id, %state, "Simulated state transition");
		true
	}

	/// Issues a new push token for a session.
	pub fn rotate_push_token(&self, id: &str, token: impl Into<Vec<u8>>) -> bool {
		let Some(mut session) = self.sessions.get_mut(id) else {
			return false;
		};
		let token = token.into();
		session.push_token = Some(token.clone());
		let _ = session.token_tx.send(token);
		true
	}

	/// Issues a new push-to-start token.
	pub fn set_push_to_start_token(&self, token: impl Into<Vec<u8>>) {
		let token = token.into();
		*self.push_to_start.lock() = Some(token.clone());
		let _ = self.push_to_start_tx.send(token);
	}

	/// Open `activity_updates` streams.
	pub fn activity_listeners(&self) -> usize {
		self.activity_tx.receiver_count()
	}

	/// Open `push_to_start_token_updates` streams.
	pub fn push_to_start_listeners(&self) -> usize {
		self.push_to_start_tx.receiver_count()
	}

	pub fn session_ids(&self) -> Vec<String> {
		self.order.lock().clone()
	}

	pub fn state(&self, id: &str) -> Option<ActivityState> {
		self.sessions.get(id).map(|s| s.state)
	}

	pub fn attributes(&self, id: &str) -> Option<SessionAttributes> {
		self.sessions.get(id).map(|s| s.attributes.clone())
	}

	pub fn push_type(&self, id: &str) -> Option<PushType> {
		self.sessions.get(id).map(|s| s.push_type)
	}

	/// Every commit received for a session, oldest first.
	pub fn commits(&self, id: &str) -> Vec<Commit> {
		self.sessions.get(id).map(|s| s.commits.clone()).unwrap_or_default()
	}

	/// The most recently committed content state.
	pub fn content(&self, id: &str) -> Option<NativeContentState> {
		self.sessions
			.get(id)
			.and_then(|s| s.commits.last().map(|c| c.state().clone()))
	}

	fn take_failure(&self, operation: Operation) -> PlatformResult<()> {
		match self.failures.lock().remove(&operation) {
			Some(error) => Err(error),
			None => Ok(()),
		}
	}

	fn create(&self, attributes: SessionAttributes, state: NativeContentState, push_type: PushType) -> String {
		let id = format!("activity-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
		let initial = *self.initial_state.lock();
		let (state_tx, _) = broadcast::channel(STREAM_CAPACITY);
		let (token_tx, _) = broadcast::channel(STREAM_CAPACITY);
		let handle = ActivityHandle {
			id: id.clone(),
			name: attributes.name.clone(),
			state: initial,
		};

		let mut order = self.order.lock();
		self.sessions.insert(
			id.clone(),
			MemorySession {
				attributes,
				state: initial,
				push_type,
				push_token: None,
				commits: vec![Commit::Request(state)],
				state_tx,
				token_tx,
			},
		);
		order.push(id.clone());
		let _ = self.activity_tx.send(handle);
		drop(order);

		tracing::debug!(session_id = %id, state = %initial, "Simulated session created");
		id
	}

	fn live_session(&self, id: &str) -> PlatformResult<dashmap::mapref::one::RefMut<'_, String, MemorySession>> {
		match self.sessions.get_mut(id) {
			Some(session) if !session.state.is_terminal() => Ok(session),
			Some(_) => Err(PlatformError::not_found(format!("session {id} has ended"))),
			None => Err(PlatformError::not_found(format!("no session with id {id}"))),
		}
	}
}

#[async_trait]
impl Platform for MemoryPlatform {
	async fn request_session(
		&self,
		attributes: &SessionAttributes,
		state: &NativeContentState,
		push_type: PushType,
	) -> PlatformResult<String> {
		self.take_failure(Operation::Request)?;
		Ok(self.create(attributes.clone(), state.clone(), push_type))
	}

	async fn update_session(&self, id: &str, state: &NativeContentState) -> PlatformResult<()> {
		self.take_failure(Operation::Update)?;
		let mut session = self.live_session(id)?;
		session.commits.push(Commit::Update(state.clone()));
		Ok(())
	}

	async fn end_session(&self, id: &str, state: &NativeContentState, policy: DismissalPolicy) -> PlatformResult<()> {
		self.take_failure(Operation::End)?;
		let mut session = self.live_session(id)?;
		session.commits.push(Commit::End(state.clone(), policy));
		session.state = ActivityState::Ended;
		let _ = session.state_tx.send(ActivityState::Ended);
		Ok(())
	}

	fn activity_updates(&self) -> BoxStream<'static, ActivityHandle> {
		let order = self.order.lock();
		let rx = self.activity_tx.subscribe();
		let known: Vec<ActivityHandle> = order
			.iter()
			.filter_map(|id| {
				self.sessions.get(id).map(|s| ActivityHandle {
					id: id.clone(),
					name: s.attributes.name.clone(),
					state: s.state,
				})
			})
			.collect();
		drop(order);

		stream::iter(known).chain(broadcast_stream(rx)).boxed()
	}

	fn state_updates(&self, id: &str) -> BoxStream<'static, ActivityState> {
		let Some(session) = self.sessions.get(id) else {
			return stream::empty().boxed();
		};
		let current = session.state;
		let rx = session.state_tx.subscribe();
		drop(session);

		stream::unfold((Some(current), rx, false), |(pending, mut rx, done)| async move {
			if done {
				return None;
			}
			let next = match pending {
				Some(state) => state,
				None => recv_next(&mut rx).await?,
			};
			Some((next, (None, rx, next.is_terminal())))
		})
		.boxed()
	}

	fn push_token_updates(&self, id: &str) -> BoxStream<'static, Vec<u8>> {
		let Some(session) = self.sessions.get(id) else {
			return stream::empty().boxed();
		};
		let current = session.push_token.clone();
		let rx = session.token_tx.subscribe();
		drop(session);

		stream::iter(current).chain(broadcast_stream(rx)).boxed()
	}

	fn push_to_start_token(&self) -> Option<Vec<u8>> {
		self.push_to_start.lock().clone()
	}

	fn push_to_start_token_updates(&self) -> BoxStream<'static, Vec<u8>> {
		broadcast_stream(self.push_to_start_tx.subscribe()).boxed()
	}
}

async fn recv_next<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Option<T> {
	loop {
		match rx.recv().await {
			Ok(item) => return Some(item),
			Err(broadcast::error::RecvError::Lagged(n)) => {
				tracing::warn!(dropped = n, "Simulated stream lagged, dropped items");
			}
			Err(broadcast::error::RecvError::Closed) => return None,
		}
	}
}

fn broadcast_stream<T: Clone + Send + 'static>(rx: broadcast::Receiver<T>) -> BoxStream<'static, T> {
	stream::unfold(rx, |mut rx| async move {
		let item = recv_next(&mut rx).await?;
		Some((item, rx))
	})
	.boxed()
}

struct AssetEntry {
	handle: Option<ImageHandle>,
	delay: Duration,
}

/// Simulated asset catalog.
///
/// Unknown references fail with [`PlatformErrorKind::AssetMissing`] unless
/// the catalog was created with [`MemoryAssets::passthrough`].
///
/// [`PlatformErrorKind::AssetMissing`]: crate::PlatformErrorKind::AssetMissing
#[derive(Default)]
pub struct MemoryAssets {
	entries: DashMap<String, AssetEntry>,
	passthrough: bool,
	calls: Mutex<Vec<String>>,
}

impl MemoryAssets {
	pub fn new() -> Self {
		Self::default()
	}

	/// Resolves every unknown reference to `asset://<reference>`.
	pub fn passthrough() -> Self {
		Self {
			passthrough: true,
			..Self::default()
		}
	}

	pub fn insert(&self, reference: impl Into<String>, handle: impl Into<String>) {
		self.insert_delayed(reference, handle, Duration::ZERO);
	}

	/// Registers a reference that takes `delay` to resolve.
	pub fn insert_delayed(&self, reference: impl Into<String>, handle: impl Into<String>, delay: Duration) {
		self.entries.insert(
			reference.into(),
			AssetEntry {
				handle: Some(ImageHandle(handle.into())),
				delay,
			},
		);
	}

	/// Registers a reference that fails after `delay`.
	pub fn insert_missing(&self, reference: impl Into<String>, delay: Duration) {
		self.entries.insert(reference.into(), AssetEntry { handle: None, delay });
	}

	/// References passed to `resolve`, in call order.
	pub fn calls(&self) -> Vec<String> {
		self.calls.lock().clone()
	}
}

#[async_trait]
impl AssetResolver for MemoryAssets {
	async fn resolve(&self, reference: &str) -> PlatformResult<ImageHandle> {
		self.calls.lock().push(reference.to_string());

		let entry = self.entries.get(reference).map(|e| (e.handle.clone(), e.delay));
		match entry {
			Some((handle, delay)) => {
				if !delay.is_zero() {
					tokio::time::sleep(delay).await;
				}
				handle.ok_or_else(|| PlatformError::asset_missing(format!("asset '{reference}' not found")))
			}
			None if self.passthrough => Ok(ImageHandle(format!("asset://{reference}"))),
			None => Err(PlatformError::asset_missing(format!("asset '{reference}' not found"))),
		}
	}
}
