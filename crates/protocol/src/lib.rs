//! Wire types shared between the host application and the session manager.
//!
//! # Main Types
//!
//! - [`ActivityConfig`] / [`CanonicalConfig`] - visual configuration before and after normalization
//! - [`ContentState`] / [`NativeContentState`] - replaceable session content
//! - [`ActivityState`] - OS-observed lifecycle state
//! - [`ActivityEvent`] - events published to host listeners
//! - [`encode_token`] - delivery token hex encoding

pub mod config;
pub mod event;
pub mod state;
pub mod token;

pub use config::{
	ActivityConfig, CanonicalConfig, CanonicalPadding, ContentFit, DEFAULT_PADDING, Dimension, EdgeInsets, HorizontalSide,
	ImageAlign, ImageDimension, ImagePosition, ImageSize, ImageSizing, Padding, PaddingDetails, TimerType,
};
pub use event::{ActivityEvent, EventKind, PushToStartTokenReceived, StateChange, TokenReceived};
pub use state::{ActivityState, ContentState, DismissalPolicy, ImageSlot, NativeContentState, ProgressBar};
pub use token::{DeliveryToken, encode_token};
