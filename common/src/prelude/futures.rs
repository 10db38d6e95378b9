use std::future::Future;
use std::time::Duration;

use tokio::time::Timeout;

pub trait FutureTimeout: Future {
	/// Bounds the future by `duration`, see [`tokio::time::timeout`].
	#[inline(always)]
	fn timeout(self, duration: Duration) -> Timeout<Self>
	where
		Self: Sized,
	{
		tokio::time::timeout(duration, self)
	}
}

impl<F: Future> FutureTimeout for F {}
