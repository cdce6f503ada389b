use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;

pub const CHUNK_SIZE: usize = 100;

/// Advisory progress for long-running bulk operations.
///
/// Percentages are in `[0, 100]` and non-decreasing within one operation, one
/// callback per completed chunk.
pub trait ImportProgress: Send + Sync {
    fn on_progress(&self, percent: f64);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ImportProgress for NoProgress {
    fn on_progress(&self, _percent: f64) {}
}

/// How a chunk gets off the caller's scheduling context. Selected once per
/// operation by capability detection.
#[derive(Debug, Clone)]
pub enum DispatchStrategy {
    /// A tokio runtime is current; chunks run on its blocking pool.
    Background(Handle),
    /// No runtime available; yield once per chunk, then run inline.
    Deferred,
}

impl DispatchStrategy {
    pub fn detect() -> Self {
        match Handle::try_current() {
            Ok(handle) => DispatchStrategy::Background(handle),
            Err(_) => DispatchStrategy::Deferred,
        }
    }

    pub async fn run<T, F>(&self, task: F) -> Result<T, String>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        match self {
            DispatchStrategy::Background(handle) => match handle.spawn_blocking(task).await {
                Ok(value) => Ok(value),
                Err(err) if err.is_panic() => Err(format!("worker task panicked: {err}")),
                Err(err) => Err(format!("worker pool unavailable: {err}")),
            },
            DispatchStrategy::Deferred => {
                tokio::task::yield_now().await;
                catch_unwind(AssertUnwindSafe(task))
                    .map_err(|_| "worker task panicked".to_string())
            }
        }
    }
}

/// Run `task` on a non-blocking execution context where one exists, inline
/// after a cooperative yield otherwise. Callers observe only the outcome.
pub async fn run_on_worker<T, F>(task: F) -> Result<T, String>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    DispatchStrategy::detect().run(task).await
}

/// Apply `transform` to every item in fixed-size chunks, suspending exactly
/// once per chunk so an interactive host loop is never starved. Output keeps
/// the input length and order; a panicking transform rejects the whole call
/// with no partial result.
pub async fn process_in_chunks<T, R, F>(
    items: Vec<T>,
    transform: F,
    progress: &dyn ImportProgress,
) -> Result<Vec<R>, String>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let total = items.len();
    let dispatch = DispatchStrategy::detect();
    let transform = Arc::new(transform);
    let mut output = Vec::with_capacity(total);
    let mut done = 0usize;
    let mut iter = items.into_iter();

    loop {
        let batch: Vec<T> = iter.by_ref().take(CHUNK_SIZE).collect();
        if batch.is_empty() {
            break;
        }
        let transform = Arc::clone(&transform);
        let produced = dispatch
            .run(move || {
                batch
                    .into_iter()
                    .map(|item| transform(item))
                    .collect::<Vec<R>>()
            })
            .await?;
        done += produced.len();
        output.extend(produced);
        let percent = (done as f64 * 100.0 / total as f64).min(100.0);
        debug!(done, total, percent, "processed chunk");
        progress.on_progress(percent);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<f64>>);

    impl ImportProgress for Recorder {
        fn on_progress(&self, percent: f64) {
            self.0.lock().expect("progress lock").push(percent);
        }
    }

    #[tokio::test]
    async fn round_trip_preserves_length_and_order() {
        let items: Vec<i64> = (0..250).collect();
        let progress = Recorder::default();
        let out = process_in_chunks(items.clone(), |x| x * 2, &progress)
            .await
            .expect("chunked transform");
        assert_eq!(out.len(), 250);
        assert_eq!(out[0], items[0] * 2);
        assert_eq!(out[249], items[249] * 2);

        // one dispatch (and one callback) per 100-item chunk
        let seen = progress.0.lock().unwrap().clone();
        assert_eq!(seen, vec![40.0, 80.0, 100.0]);
    }

    #[tokio::test]
    async fn empty_input_resolves_without_progress() {
        let progress = Recorder::default();
        let out: Vec<i64> = process_in_chunks(Vec::new(), |x: i64| x, &progress)
            .await
            .expect("empty input");
        assert!(out.is_empty());
        assert!(progress.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn panicking_transform_rejects_the_whole_call() {
        let items: Vec<i64> = (0..150).collect();
        let result = process_in_chunks(
            items,
            |x| {
                if x == 120 {
                    panic!("boom");
                }
                x
            },
            &NoProgress,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn run_on_worker_returns_the_task_result() {
        let value = run_on_worker(|| 21 * 2).await.expect("worker task");
        assert_eq!(value, 42);
    }

    #[test]
    fn deferred_strategy_runs_without_a_runtime() {
        let items: Vec<i64> = (0..250).collect();
        let progress = Recorder::default();
        let out = futures::executor::block_on(process_in_chunks(items, |x| x + 1, &progress))
            .expect("deferred transform");
        assert_eq!(out.len(), 250);
        assert_eq!(out[249], 250);
        assert_eq!(progress.0.lock().unwrap().len(), 3);
    }

    #[test]
    fn deferred_strategy_converts_panics_into_errors() {
        let result =
            futures::executor::block_on(run_on_worker(|| -> i64 { panic!("boom") }));
        assert!(result.is_err());
    }
}
