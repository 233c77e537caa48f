//! Error types for live activity operations.

use thiserror::Error;

use crate::platform::OsVersion;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type returned by [`Platform`](crate::Platform) and
/// [`AssetResolver`](crate::AssetResolver) implementations.
pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// Errors surfaced to the host application.
#[derive(Debug, Error)]
pub enum Error {
	/// Malformed configuration (e.g. a bad percentage string). Raised before
	/// any session is touched.
	#[error("Invalid configuration: {0}")]
	InvalidConfiguration(String),

	/// The current platform has no live activity support at all.
	#[error("Live activities are not available on this platform")]
	UnsupportedPlatform,

	/// The platform exists but its OS version is too old.
	#[error("Live activities require OS version {required} or later")]
	UnsupportedPlatformVersion { required: OsVersion },

	/// The user or system has turned live activities off.
	#[error("Live activities are disabled on this device")]
	ActivitiesDisabled,

	/// No tracked session has this id.
	#[error("Session not found: {0}")]
	SessionNotFound(String),

	/// The OS rejected a request. The underlying cause is preserved as source.
	#[error("Platform request '{operation}' failed: {source}")]
	PlatformRequestFailed {
		operation: &'static str,
		#[source]
		source: PlatformError,
	},

	/// An image reference could not be resolved. Never aborts a commit.
	#[error("Asset resolution failed for '{reference}': {reason}")]
	AssetResolutionFailed { reference: String, reason: String },

	/// Resolving an image reference exceeded the configured timeout.
	#[error("Timeout after {timeout_ms}ms resolving asset '{reference}'")]
	AssetResolutionTimeout { reference: String, timeout_ms: u64 },

	/// A session worker or bridge went away unexpectedly.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,
}

impl Error {
	pub(crate) fn platform(operation: &'static str, source: PlatformError) -> Self {
		Error::PlatformRequestFailed { operation, source }
	}

	/// Returns true if the caller can reasonably continue (feature-detect,
	/// drop the stale id, retry later) rather than treat this as a bug.
	pub fn is_recoverable(&self) -> bool {
		!matches!(self, Error::InvalidConfiguration(_) | Error::ChannelClosed)
	}

	/// Returns true if this is a session-not-found error.
	pub fn is_session_not_found(&self) -> bool {
		matches!(self, Error::SessionNotFound(_))
	}

	/// Returns true for capability errors that feature detection would have caught.
	pub fn is_unsupported(&self) -> bool {
		matches!(
			self,
			Error::UnsupportedPlatform | Error::UnsupportedPlatformVersion { .. } | Error::ActivitiesDisabled
		)
	}
}

/// Broad classification of a [`PlatformError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorKind {
	/// The OS does not know the session (already ended or never existed).
	NotFound,
	/// The OS refused the request (quota, payload size, permissions).
	Rejected,
	/// The asset could not be located.
	AssetMissing,
	Other,
}

/// Failure reported by the OS layer.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PlatformError {
	pub kind: PlatformErrorKind,
	pub message: String,
}

impl PlatformError {
	pub fn new(kind: PlatformErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
		}
	}

	pub fn not_found(message: impl Into<String>) -> Self {
		Self::new(PlatformErrorKind::NotFound, message)
	}

	pub fn rejected(message: impl Into<String>) -> Self {
		Self::new(PlatformErrorKind::Rejected, message)
	}

	pub fn asset_missing(message: impl Into<String>) -> Self {
		Self::new(PlatformErrorKind::AssetMissing, message)
	}
}

/// Maps an OS failure for a known session id, turning "not found" into
/// [`Error::SessionNotFound`].
pub fn session_request_error(operation: &'static str, id: &str, source: PlatformError) -> Error {
	match source.kind {
		PlatformErrorKind::NotFound => Error::SessionNotFound(id.to_string()),
		_ => Error::platform(operation, source),
	}
}

/// Maps an OS failure that has no session id attached.
pub fn request_error(operation: &'static str, source: PlatformError) -> Error {
	Error::platform(operation, source)
}
