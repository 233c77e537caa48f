//! Live activity runtime - capability boundary and error taxonomy
//!
//! This crate defines everything the session manager needs from the host OS
//! without depending on any particular OS binding:
//!
//! - **Platform**: session requests plus the state, push token and
//!   push-to-start token streams
//! - **Capabilities**: OS version and authorization flags, queried per call
//! - **Assets**: image reference resolution
//! - **Errors**: the [`Error`] taxonomy surfaced to host applications
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   liveact    │  Session manager, listener registry, layout
//! └──────┬───────┘
//!        │ calls through trait objects
//! ┌──────▼───────┐
//! │   runtime    │  This crate
//! │  ┌────────┐  │
//! │  │Platform│  │  OS binding (native or memory)
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Assets │  │  Image resolution
//! │  └────────┘  │
//! └──────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod platform;

pub use error::{Error, PlatformError, PlatformErrorKind, PlatformResult, Result, request_error, session_request_error};
pub use memory::{Commit, MemoryAssets, MemoryPlatform, Operation};
pub use platform::{
	ActivityHandle, AssetResolver, Capabilities, CapabilityProvider, ImageHandle, OsVersion, Platform, PushType,
	SessionAttributes,
};
