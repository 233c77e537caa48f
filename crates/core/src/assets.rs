//! Image reference resolution ahead of a refined commit.

use std::time::Duration;

use futures_util::future::join_all;
use liveact_protocol::{ImageSlot, NativeContentState};
use liveact_runtime::{AssetResolver, Error, ImageHandle, Result};

/// A content state with every resolvable image reference replaced.
#[derive(Debug)]
pub struct ResolvedState {
	pub state: NativeContentState,
	/// One entry per reference left unresolved.
	pub failures: Vec<Error>,
}

impl ResolvedState {
	pub fn is_complete(&self) -> bool {
		self.failures.is_empty()
	}
}

/// Resolves every image reference in `state` concurrently.
///
/// Each lookup is bounded by `timeout`. A failed or timed-out reference keeps
/// its raw value and is reported in [`ResolvedState::failures`]; the rest of
/// the state is unaffected.
pub async fn resolve_state(resolver: &dyn AssetResolver, mut state: NativeContentState, timeout: Duration) -> ResolvedState {
	let references = state.image_references();
	if references.is_empty() {
		return ResolvedState {
			state,
			failures: Vec::new(),
		};
	}

	let lookups = references.iter().map(|(slot, reference)| async move {
		(*slot, resolve_reference(resolver, reference, timeout).await)
	});

	let mut failures = Vec::new();
	for (slot, result) in join_all(lookups).await {
		match result {
			Ok(handle) => *state.image_mut(slot) = Some(handle.0),
			Err(e) => {
				tracing::warn!(slot = slot.as_str(), error = %e, "Image reference left unresolved");
				failures.push(e);
			}
		}
	}

	ResolvedState { state, failures }
}

/// Resolves one reference, mapping failures into the session error taxonomy.
pub async fn resolve_reference(
	resolver: &dyn AssetResolver,
	reference: &str,
	timeout: Duration,
) -> Result<ImageHandle> {
	match tokio::time::timeout(timeout, resolver.resolve(reference)).await {
		Ok(Ok(handle)) => Ok(handle),
		Ok(Err(e)) => Err(Error::AssetResolutionFailed {
			reference: reference.to_string(),
			reason: e.to_string(),
		}),
		Err(_) => Err(Error::AssetResolutionTimeout {
			reference: reference.to_string(),
			timeout_ms: timeout.as_millis() as u64,
		}),
	}
}

/// Returns true if `state` carries any image reference.
pub fn has_references(state: &NativeContentState) -> bool {
	ImageSlot::ALL.iter().any(|slot| state.image(*slot).is_some())
}
