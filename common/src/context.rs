use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, oneshot};
use tokio::time::Instant;

/// Why a [`Context`] finished.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CancelReason {
	Deadline,
	Cancel,
}

impl Display for CancelReason {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Deadline => write!(f, "deadline exceeded"),
			Self::Cancel => write!(f, "cancelled"),
		}
	}
}

struct Inner {
	// Dropped together with the last clone of the context, which is what
	// `Handler::cancel` waits for.
	_alive: oneshot::Sender<()>,
	deadline: Option<Instant>,
	cancel: broadcast::Receiver<()>,
}

/// A cloneable shutdown signal shared by every long lived task.
#[derive(Clone)]
pub struct Context(Arc<Inner>);

/// The owning side of a [`Context`].
pub struct Handler {
	alive: oneshot::Receiver<()>,
	cancel: broadcast::Sender<()>,
}

impl Context {
	pub fn new() -> (Self, Handler) {
		Self::build(None)
	}

	pub fn with_timeout(timeout: Duration) -> (Self, Handler) {
		Self::build(Some(Instant::now() + timeout))
	}

	fn build(deadline: Option<Instant>) -> (Self, Handler) {
		let (alive_send, alive) = oneshot::channel();
		let (cancel, cancel_recv) = broadcast::channel(1);

		(
			Self(Arc::new(Inner {
				_alive: alive_send,
				deadline,
				cancel: cancel_recv,
			})),
			Handler { alive, cancel },
		)
	}

	/// Resolves once the handler cancels or the deadline passes.
	pub async fn done(&self) -> CancelReason {
		let mut recv = self.0.cancel.resubscribe();

		match self.0.deadline {
			Some(deadline) => {
				tokio::select! {
					_ = recv.recv() => CancelReason::Cancel,
					_ = tokio::time::sleep_until(deadline) => CancelReason::Deadline,
				}
			}
			None => {
				let _ = recv.recv().await;
				CancelReason::Cancel
			}
		}
	}
}

impl Handler {
	/// Waits until every clone of the context has been dropped.
	pub async fn done(&mut self) {
		let _ = (&mut self.alive).await;
	}

	/// Signals cancellation and waits until every clone of the context has
	/// been dropped.
	pub async fn cancel(self) {
		drop(self.cancel);

		let _ = self.alive.await;
	}
}
