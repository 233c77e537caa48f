//! Per-session commit lane.
//!
//! Every session owns one worker task that applies its jobs strictly in
//! submission order. A job commits the raw state first, acknowledges the
//! caller, then resolves image references and commits the refined state
//! unless a newer job was submitted in the meantime.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use liveact_protocol::{DismissalPolicy, NativeContentState};
use liveact_runtime::{AssetResolver, Error, Platform, Result, session_request_error};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::assets::{has_references, resolve_state};

/// What a job commits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum JobKind {
	/// Resolved follow-up of the state committed by `request_session`.
	Refine,
	/// Raw update, then its resolved follow-up.
	Update,
	/// Final commit and teardown. The worker exits afterwards.
	End(DismissalPolicy),
}

struct Job {
	generation: u64,
	kind: JobKind,
	state: NativeContentState,
	ack: Option<oneshot::Sender<Result<()>>>,
}

/// Collaborators a worker needs, cloned out of the manager.
#[derive(Clone)]
pub(super) struct LaneContext {
	pub(super) platform: Arc<dyn Platform>,
	pub(super) assets: Arc<dyn AssetResolver>,
	pub(super) asset_timeout: Duration,
}

/// Handle to a session worker.
pub(super) struct Lane {
	tx: mpsc::UnboundedSender<Job>,
	generation: Arc<AtomicU64>,
	worker: JoinHandle<()>,
}

impl Lane {
	/// Spawns the worker on the current runtime.
	pub(super) fn spawn(id: String, ctx: LaneContext) -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		let generation = Arc::new(AtomicU64::new(0));
		let worker = tokio::spawn(run(id, ctx, Arc::clone(&generation), rx));
		Self { tx, generation, worker }
	}

	/// Queues a job. The receiver resolves once the raw commit finished;
	/// [`JobKind::Refine`] jobs have nothing to acknowledge and return `None`.
	///
	/// Callers serialize submissions so generation order matches queue order.
	pub(super) fn submit(
		&self,
		kind: JobKind,
		state: NativeContentState,
	) -> Result<Option<oneshot::Receiver<Result<()>>>> {
		let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
		let (ack, rx) = match kind {
			JobKind::Refine => (None, None),
			_ => {
				let (tx, rx) = oneshot::channel();
				(Some(tx), Some(rx))
			}
		};

		self.tx
			.send(Job {
				generation,
				kind,
				state,
				ack,
			})
			.map_err(|_| Error::ChannelClosed)?;
		Ok(rx)
	}

	/// Closes the queue. The worker drains pending jobs and exits.
	pub(super) fn into_worker(self) -> JoinHandle<()> {
		self.worker
	}
}

async fn run(id: String, ctx: LaneContext, generation: Arc<AtomicU64>, mut rx: mpsc::UnboundedReceiver<Job>) {
	tracing::debug!(session_id = %id, "Session lane started");

	while let Some(job) = rx.recv().await {
		match job.kind {
			JobKind::Refine => refine(&id, &ctx, &generation, job.generation, job.state).await,
			JobKind::Update => {
				let result = ctx
					.platform
					.update_session(&id, &job.state)
					.await
					.map_err(|e| session_request_error("update_session", &id, e));
				let committed = result.is_ok();
				acknowledge(job.ack, result);
				if committed {
					refine(&id, &ctx, &generation, job.generation, job.state).await;
				}
			}
			JobKind::End(policy) => {
				end(&id, &ctx, job.state, policy, job.ack).await;
				break;
			}
		}
	}

	tracing::debug!(session_id = %id, "Session lane closed");
}

async fn refine(id: &str, ctx: &LaneContext, generation: &AtomicU64, job_generation: u64, raw: NativeContentState) {
	if !has_references(&raw) {
		return;
	}

	let resolved = resolve_state(ctx.assets.as_ref(), raw.clone(), ctx.asset_timeout).await;
	if generation.load(Ordering::SeqCst) != job_generation {
		tracing::debug!(session_id = id, generation = job_generation, "Resolved commit superseded");
		return;
	}
	if resolved.state == raw {
		return;
	}

	match ctx.platform.update_session(id, &resolved.state).await {
		Ok(()) => tracing::debug!(session_id = id, generation = job_generation, "Resolved state committed"),
		Err(e) => tracing::warn!(session_id = id, error = %e, "Resolved state commit failed"),
	}
}

async fn end(
	id: &str,
	ctx: &LaneContext,
	raw: NativeContentState,
	policy: DismissalPolicy,
	ack: Option<oneshot::Sender<Result<()>>>,
) {
	if !has_references(&raw) {
		let result = ctx
			.platform
			.end_session(id, &raw, policy)
			.await
			.map_err(|e| session_request_error("end_session", id, e));
		acknowledge(ack, result);
		return;
	}

	let result = ctx
		.platform
		.update_session(id, &raw)
		.await
		.map_err(|e| session_request_error("update_session", id, e));
	let committed = result.is_ok();
	acknowledge(ack, result);
	if !committed {
		return;
	}

	let resolved = resolve_state(ctx.assets.as_ref(), raw, ctx.asset_timeout).await;
	match ctx.platform.end_session(id, &resolved.state, policy).await {
		Ok(()) => tracing::info!(session_id = id, "Session ended"),
		Err(e) => tracing::warn!(session_id = id, error = %e, "Session teardown failed"),
	}
}

fn acknowledge(ack: Option<oneshot::Sender<Result<()>>>, result: Result<()>) {
	match ack {
		Some(tx) => {
			let _ = tx.send(result);
		}
		None => {
			if let Err(e) = result {
				tracing::warn!(error = %e, "Unacknowledged commit failed");
			}
		}
	}
}
