//! The OS capability surface consumed by the session manager.
//!
//! Three seams are injected rather than looked up globally:
//!
//! - [`Platform`] - session requests and the OS event streams
//! - [`CapabilityProvider`] - OS version, activity and push authorization flags
//! - [`AssetResolver`] - maps an image name or path to a renderable handle
//!
//! [`crate::memory`] provides in-process implementations of all three.

use std::str::FromStr;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use liveact_protocol::{ActivityState, CanonicalConfig, DismissalPolicy, NativeContentState};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::PlatformResult;

/// Immutable attributes fixed when a session is requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAttributes {
	pub name: String,
	pub config: CanonicalConfig,
}

/// A session as announced by [`Platform::activity_updates`].
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityHandle {
	pub id: String,
	pub name: String,
	pub state: ActivityState,
}

/// Whether the OS should issue a push token for a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushType {
	None,
	Token,
}

/// Opaque renderable image reference produced by an [`AssetResolver`]
/// (an asset-catalog name or a file path in the shared container).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageHandle(pub String);

impl ImageHandle {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// Session requests and event streams provided by the host OS.
///
/// Streams are `'static` so they can be moved into background tasks.
#[async_trait]
pub trait Platform: Send + Sync {
	/// Requests a new session and returns its OS-assigned id.
	async fn request_session(
		&self,
		attributes: &SessionAttributes,
		state: &NativeContentState,
		push_type: PushType,
	) -> PlatformResult<String>;

	/// Replaces a session's content state.
	async fn update_session(&self, id: &str, state: &NativeContentState) -> PlatformResult<()>;

	/// Commits the final content state and tears the session down.
	async fn end_session(&self, id: &str, state: &NativeContentState, policy: DismissalPolicy) -> PlatformResult<()>;

	/// Sessions known to the OS followed by every newly created one,
	/// including those started remotely.
	fn activity_updates(&self) -> BoxStream<'static, ActivityHandle>;

	/// The session's current state followed by each transition. Ends after a
	/// terminal state or when the session is unknown.
	fn state_updates(&self, id: &str) -> BoxStream<'static, ActivityState>;

	/// Push token rotations for one session. Only meaningful once the
	/// session is active.
	fn push_token_updates(&self, id: &str) -> BoxStream<'static, Vec<u8>>;

	/// The current push-to-start token, if the OS has issued one.
	fn push_to_start_token(&self) -> Option<Vec<u8>>;

	/// Push-to-start token rotations.
	fn push_to_start_token_updates(&self) -> BoxStream<'static, Vec<u8>>;
}

/// Maps image names or paths to renderable handles.
#[async_trait]
pub trait AssetResolver: Send + Sync {
	async fn resolve(&self, reference: &str) -> PlatformResult<ImageHandle>;
}

/// Queried at call time for environment-dependent switches.
pub trait CapabilityProvider: Send + Sync {
	/// `None` when running somewhere live activities do not exist at all.
	fn os_version(&self) -> Option<OsVersion>;

	fn activities_enabled(&self) -> bool;

	fn push_notifications_enabled(&self) -> bool;
}

/// `major.minor` OS version used for feature gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OsVersion {
	pub major: u32,
	pub minor: u32,
}

impl OsVersion {
	/// Minimum version for requesting, updating and ending sessions.
	pub const SESSIONS: OsVersion = OsVersion::new(16, 2);
	/// Minimum version for the push-to-start token.
	pub const PUSH_TO_START: OsVersion = OsVersion::new(17, 2);

	pub const fn new(major: u32, minor: u32) -> Self {
		Self { major, minor }
	}
}

impl std::fmt::Display for OsVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}.{}", self.major, self.minor)
	}
}

impl FromStr for OsVersion {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut parts = s.trim().splitn(3, '.');
		let major = parts
			.next()
			.and_then(|p| p.parse().ok())
			.ok_or_else(|| format!("invalid OS version: {s}"))?;
		let minor = match parts.next() {
			Some(p) => p.parse().map_err(|_| format!("invalid OS version: {s}"))?,
			None => 0,
		};
		Ok(Self { major, minor })
	}
}

/// Mutable capability flags, for hosts that read them once and for tests
/// that flip them between calls.
#[derive(Debug)]
pub struct Capabilities {
	os_version: RwLock<Option<OsVersion>>,
	activities_enabled: RwLock<bool>,
	push_notifications_enabled: RwLock<bool>,
}

impl Capabilities {
	pub fn new(os_version: Option<OsVersion>) -> Self {
		Self {
			os_version: RwLock::new(os_version),
			activities_enabled: RwLock::new(true),
			push_notifications_enabled: RwLock::new(false),
		}
	}

	/// Everything on, at the newest gated version.
	pub fn full() -> Self {
		let caps = Self::new(Some(OsVersion::PUSH_TO_START));
		caps.set_push_notifications_enabled(true);
		caps
	}

	pub fn set_os_version(&self, version: Option<OsVersion>) {
		*self.os_version.write() = version;
	}

	pub fn set_activities_enabled(&self, enabled: bool) {
		*self.activities_enabled.write() = enabled;
	}

	pub fn set_push_notifications_enabled(&self, enabled: bool) {
		*self.push_notifications_enabled.write() = enabled;
	}
}

impl CapabilityProvider for Capabilities {
	fn os_version(&self) -> Option<OsVersion> {
		*self.os_version.read()
	}

	fn activities_enabled(&self) -> bool {
		*self.activities_enabled.read()
	}

	fn push_notifications_enabled(&self) -> bool {
		*self.push_notifications_enabled.read()
	}
}
