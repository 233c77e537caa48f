//! Listener registry multiplexing one upstream stream per event kind to many
//! host callbacks.
//!
//! The registry only stores callbacks. Whoever owns the upstream streams
//! implements [`StreamDemand`] and is told whenever the subscriber set of a
//! kind changes, so it can start or stop the matching bridge.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use liveact_protocol::{ActivityEvent, EventKind};
use parking_lot::{Mutex, ReentrantMutex};

use crate::handlers::{HandlerEntry, HandlerFn, HandlerId, HandlerMap, Subscription, next_handler_id};

/// Notified after a subscriber of `kind` was added or removed.
///
/// Called with no registry lock held; implementations re-read
/// [`ListenerRegistry::has_subscribers`] to decide what to do.
pub trait StreamDemand: Send + Sync {
	fn demand_changed(&self, kind: EventKind);
}

struct RegistryInner {
	handlers: HandlerMap<ActivityEvent, EventKind>,
	/// Last push-to-start event, replayed to every new subscriber of that kind.
	last_push_to_start: Mutex<Option<ActivityEvent>>,
	/// Serializes push-to-start delivery so a replay never overtakes a newer
	/// publish. Reentrant so callbacks may subscribe again.
	push_to_start_delivery: ReentrantMutex<()>,
	demand: Option<Weak<dyn StreamDemand>>,
}

impl RegistryInner {
	fn remove(&self, id: HandlerId) {
		let removed = self.handlers.lock().shift_remove(&id);
		if let Some(entry) = removed {
			tracing::debug!(handler_id = id, kind = %entry.meta, "Listener removed");
			self.notify(entry.meta);
		}
	}

	fn notify(&self, kind: EventKind) {
		if let Some(demand) = self.demand.as_ref().and_then(Weak::upgrade) {
			demand.demand_changed(kind);
		}
	}

	fn snapshot(&self, kind: EventKind) -> Vec<HandlerFn<ActivityEvent>> {
		self.handlers
			.lock()
			.values()
			.filter(|entry| entry.meta == kind)
			.map(|entry| Arc::clone(&entry.handler))
			.collect()
	}
}

/// Subscribe/publish surface for [`ActivityEvent`]s.
///
/// Each subscriber receives every event of its kind published after it
/// subscribed. Push-to-start subscribers additionally receive the last known
/// push-to-start event immediately.
#[derive(Clone)]
pub struct ListenerRegistry {
	inner: Arc<RegistryInner>,
}

impl Default for ListenerRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl ListenerRegistry {
	pub fn new() -> Self {
		Self::build(None)
	}

	/// Creates a registry that reports subscriber changes to `demand`.
	pub fn with_demand(demand: Weak<dyn StreamDemand>) -> Self {
		Self::build(Some(demand))
	}

	fn build(demand: Option<Weak<dyn StreamDemand>>) -> Self {
		Self {
			inner: Arc::new(RegistryInner {
				handlers: Arc::new(Mutex::new(IndexMap::new())),
				last_push_to_start: Mutex::new(None),
				push_to_start_delivery: ReentrantMutex::new(()),
				demand,
			}),
		}
	}

	/// Registers `handler` for events of `kind`.
	///
	/// The returned [`Subscription`] removes the handler when dropped.
	pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
	where
		F: Fn(ActivityEvent) + Send + Sync + 'static,
	{
		let id = next_handler_id();
		let handler: HandlerFn<ActivityEvent> = Arc::new(handler);
		let entry = HandlerEntry {
			id,
			meta: kind,
			handler: Arc::clone(&handler),
		};

		if kind == EventKind::PushToStartTokenReceived {
			let _delivery = self.inner.push_to_start_delivery.lock();
			let replay = {
				let last = self.inner.last_push_to_start.lock();
				self.inner.handlers.lock().insert(id, entry);
				last.clone()
			};
			if let Some(event) = replay {
				tracing::debug!(handler_id = id, "Replaying last push-to-start token");
				(handler)(event);
			}
		} else {
			self.inner.handlers.lock().insert(id, entry);
		}
		tracing::debug!(handler_id = id, %kind, "Listener added");

		self.inner.notify(kind);

		let weak = Arc::downgrade(&self.inner);
		Subscription::new(
			id,
			Arc::new(move |id: HandlerId| {
				if let Some(inner) = weak.upgrade() {
					inner.remove(id);
				}
			}),
		)
	}

	/// Delivers `event` to every subscriber of its kind, in subscription order.
	pub fn publish(&self, event: ActivityEvent) {
		let kind = event.kind();

		if kind == EventKind::PushToStartTokenReceived {
			let _delivery = self.inner.push_to_start_delivery.lock();
			let handlers = {
				let mut last = self.inner.last_push_to_start.lock();
				*last = Some(event.clone());
				self.inner.snapshot(kind)
			};
			deliver(&handlers, &event);
		} else {
			let handlers = self.inner.snapshot(kind);
			deliver(&handlers, &event);
		}
	}

	pub fn has_subscribers(&self, kind: EventKind) -> bool {
		self.inner.handlers.lock().values().any(|entry| entry.meta == kind)
	}

	pub fn subscriber_count(&self, kind: EventKind) -> usize {
		self.inner.handlers.lock().values().filter(|entry| entry.meta == kind).count()
	}

	/// The event a new push-to-start subscriber would be replayed.
	pub fn last_push_to_start(&self) -> Option<ActivityEvent> {
		self.inner.last_push_to_start.lock().clone()
	}
}

fn deliver(handlers: &[HandlerFn<ActivityEvent>], event: &ActivityEvent) {
	for handler in handlers {
		(handler)(event.clone());
	}
}
