//! liveact: live activity sessions and adaptive card layout
//!
//! This crate turns host calls into OS session requests and OS event streams
//! into host callbacks, and resolves the card's image geometry at render time.
//!
//! # Main Types
//!
//! - [`ActivityManager`] - start, update and end sessions; subscribe to events
//! - [`ListenerRegistry`] / [`Subscription`] - event fan-out to host callbacks
//! - [`ImageLayout`] - image frame resolution with a container measurement cache
//! - [`normalize`] - host configuration to [`CanonicalConfig`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use liveact::{ActivityManager, ContentState};
//! use liveact_runtime::{Capabilities, MemoryAssets, MemoryPlatform};
//!
//! let manager = ActivityManager::new(
//!     Arc::new(MemoryPlatform::new()),
//!     Arc::new(Capabilities::full()),
//!     Arc::new(MemoryAssets::passthrough()),
//! );
//!
//! let _tokens = manager.on_token_received(|event| {
//!     println!("{} -> {}", event.activity_id, event.activity_push_token);
//! })?;
//! let id = manager.start(&ContentState::new("Pizza").with_subtitle("In the oven"), None).await?;
//! manager.end(&id, &ContentState::new("Delivered")).await?;
//! ```

pub mod assets;
pub mod geometry;
pub mod handlers;
pub mod link;
pub mod normalize;
pub mod registry;
pub mod session;

pub use assets::{ResolvedState, resolve_state};
pub use geometry::{
	DEFAULT_IMAGE_SIZE, FittedImage, ImageAlignment, ImageBox, ImageFrame, ImageLayout, ImagePlacement, Size,
};
pub use handlers::{HandlerId, Subscription};
pub use link::widget_url;
pub use liveact_protocol::{
	ActivityConfig, ActivityEvent, ActivityState, CanonicalConfig, ContentState, DismissalPolicy, EventKind,
	ProgressBar, PushToStartTokenReceived, StateChange, TokenReceived,
};
pub use liveact_runtime::{Error, Result};
pub use normalize::normalize;
pub use registry::{ListenerRegistry, StreamDemand};
pub use session::{ActivityManager, ManagerOptions};
