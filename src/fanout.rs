use crate::error::{AnalyticsError, Result};
use futures::future::join_all;
use log::warn;
use std::future::Future;

/// Runs every task on the runtime and waits for all of them.
///
/// Results come back in task order. When one or more tasks fail, the error of the
/// earliest failing task is returned and the others are discarded. Siblings are
/// never cancelled early. A task that panics surfaces as [`AnalyticsError::Aggregate`].
pub async fn join_all_or_first_error<T, F>(tasks: Vec<F>) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    let handles: Vec<_> = tasks.into_iter().map(tokio::spawn).collect();
    let outcomes = join_all(handles).await;

    let mut values = Vec::with_capacity(outcomes.len());
    let mut first_error = None;

    for outcome in outcomes {
        let result = outcome.map_err(|e| AnalyticsError::Aggregate(format!("task failed: {}", e)));
        match result.and_then(|inner| inner) {
            Ok(value) => values.push(value),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    warn!("Discarding additional fan-out failure: {}", e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(values),
    }
}

/// Runs a CPU-bound closure on the blocking pool.
pub async fn run_blocking<T, F>(job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| AnalyticsError::Aggregate(format!("computation task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_all_successes_keep_task_order() {
        let tasks: Vec<_> = (0..5u64)
            .map(|i| async move {
                tokio::time::sleep(Duration::from_millis(10 * (5 - i))).await;
                Ok(i)
            })
            .collect();

        let values = join_all_or_first_error(tasks).await.unwrap();
        assert_eq!(values, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_first_error_wins_and_siblings_finish() {
        let finished = Arc::new(AtomicUsize::new(0));
        let tasks: Vec<_> = (0..4)
            .map(|i| {
                let finished = finished.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                    if i == 1 || i == 3 {
                        Err(AnalyticsError::Aggregate(format!("task {}", i)))
                    } else {
                        Ok(i)
                    }
                }
            })
            .collect();

        let err = join_all_or_first_error(tasks).await.unwrap_err();
        assert_eq!(err.to_string(), "Consolidation aborted: task 1");
        assert_eq!(finished.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let tasks: Vec<std::future::Ready<Result<u8>>> = Vec::new();
        assert!(join_all_or_first_error(tasks).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_blocking() {
        let total = run_blocking(|| (1..=10).sum::<u32>()).await.unwrap();
        assert_eq!(total, 55);
    }
}
