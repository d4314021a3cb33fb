use std::future::Future;
use std::time::Duration;

/// Awaits `fut`, calling `on_slow` once if it is still pending after
/// `timeout`.
///
/// The deadline never cancels `fut`: the value returned is always its own
/// output. The guard produced by `on_slow` lives until `fut` completes, so a
/// progress indicator can be tied to it.
pub async fn with_soft_deadline<F, G, S>(fut: F, timeout: Duration, on_slow: S) -> F::Output
where
	F: Future,
	S: FnOnce() -> G,
{
	tokio::pin!(fut);
	tokio::select! {
		biased;
		out = &mut fut => return out,
		_ = tokio::time::sleep(timeout) => {}
	}

	tracing::debug!(timeout_ms = timeout.as_millis() as u64, "events.deadline.slow");
	let _guard = on_slow();
	fut.await
}
