//! Bounded worker pool with per-item failure isolation
//!
//! Every item runs as its own task in a `JoinSet`; a semaphore caps how many
//! execute at once. An item settles exactly once, as its own result, an error,
//! a panic, a timeout, or a cancellation, and never affects its siblings.

use crate::error::{FinanceError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Bounded executor for named items
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    max_concurrency: usize,
    task_timeout: Option<Duration>,
    batch_timeout: Option<Duration>,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_CONCURRENCY)
    }
}

impl WorkerPool {
    /// Create a pool running at most `max_concurrency` items at once (minimum 1)
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            task_timeout: None,
            batch_timeout: None,
        }
    }

    /// Time budget for each item, measured from when it starts executing
    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// Time budget for the whole run; pending items settle as cancelled
    pub fn with_batch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.batch_timeout = timeout;
        self
    }

    /// Concurrency cap
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Execute every item and wait for all of them to settle
    ///
    /// Returns one entry per item, keyed by name. Fails up front only when two
    /// items share a name.
    pub async fn run<T, O, F, Fut>(
        &self,
        items: Vec<(String, T)>,
        execute: F,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<String, Result<O>>>
    where
        T: Send + 'static,
        O: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O>> + Send + 'static,
    {
        {
            let mut seen = HashSet::with_capacity(items.len());
            if let Some((name, _)) = items.iter().find(|(name, _)| !seen.insert(name.as_str())) {
                return Err(FinanceError::DuplicateSubTask(name.clone()));
            }
        }

        let token = cancel.child_token();
        let _deadline = self.batch_timeout.map(|timeout| {
            let token = token.clone();
            DeadlineGuard(tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                warn!(?timeout, "Batch deadline reached, cancelling pending items");
                token.cancel();
            }))
        });

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let execute = Arc::new(execute);
        let mut join_set = JoinSet::new();
        let mut names = HashMap::with_capacity(items.len());

        for (name, item) in items {
            let semaphore = Arc::clone(&semaphore);
            let execute = Arc::clone(&execute);
            let token = token.clone();
            let task_timeout = self.task_timeout;
            let task_name = name.clone();

            let handle = join_set.spawn(async move {
                let work = async {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|_| FinanceError::Cancelled(task_name.clone()))?;
                    debug!(name = %task_name, "Item started");

                    match task_timeout {
                        Some(timeout) => tokio::time::timeout(timeout, (*execute)(item))
                            .await
                            .map_err(|_| FinanceError::TimedOut {
                                name: task_name.clone(),
                                timeout,
                            })?,
                        None => (*execute)(item).await,
                    }
                };

                let outcome = tokio::select! {
                    biased;
                    () = token.cancelled() => Err(FinanceError::Cancelled(task_name.clone())),
                    outcome = work => outcome,
                };
                (task_name, outcome)
            });
            names.insert(handle.id(), name);
        }

        let mut results = BTreeMap::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, outcome)) => {
                    results.insert(name, outcome);
                }
                Err(err) => {
                    let Some(name) = names.remove(&err.id()) else {
                        warn!(error = %err, "Untracked worker task failed");
                        continue;
                    };
                    warn!(%name, error = %err, "Worker task panicked");
                    let message = panic_message(err);
                    results.insert(
                        name.clone(),
                        Err(FinanceError::SubTaskExecution { name, message }),
                    );
                }
            }
        }

        Ok(results)
    }
}

/// Aborts the deadline timer when the run finishes first
struct DeadlineGuard(tokio::task::JoinHandle<()>);

impl Drop for DeadlineGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return "task aborted".to_string();
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn items(names: &[&str]) -> Vec<(String, String)> {
        names
            .iter()
            .map(|n| ((*n).to_string(), (*n).to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_siblings() {
        let pool = WorkerPool::new(4);
        let results = pool
            .run(
                items(&["a", "b", "c", "d"]),
                |name: String| async move {
                    if name == "c" {
                        Err(FinanceError::SubTaskExecution {
                            name,
                            message: "bad input".to_string(),
                        })
                    } else {
                        Ok(name.to_uppercase())
                    }
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(results.values().filter(|r| r.is_err()).count(), 1);
        assert!(results["c"].is_err());
        assert_eq!(results["a"].as_ref().unwrap(), "A");
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let pool = WorkerPool::new(2);
        let results = pool
            .run(
                items(&["ok", "boom"]),
                |name: String| async move {
                    assert!(name != "boom", "exploded");
                    Ok(name)
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results["ok"].is_ok());
        match &results["boom"] {
            Err(FinanceError::SubTaskExecution { name, message }) => {
                assert_eq!(name, "boom");
                assert!(message.contains("exploded"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected() {
        let pool = WorkerPool::new(2);
        let err = pool
            .run(
                items(&["a", "b", "a"]),
                |name: String| async move { Ok(name) },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FinanceError::DuplicateSubTask(name) if name == "a"));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let results = WorkerPool::default()
            .run(
                Vec::<(String, ())>::new(),
                |()| async { Ok(()) },
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let execute = {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            move |_: String| {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(25)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            }
        };

        let results = WorkerPool::new(2)
            .run(
                items(&["1", "2", "3", "4", "5", "6", "7", "8"]),
                execute,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_clamped() {
        assert_eq!(WorkerPool::new(0).max_concurrency(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_settles_everything() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let results = WorkerPool::new(1)
            .run(
                items(&["a", "b", "c"]),
                |name: String| async move {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(name)
                },
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.values().all(|r| matches!(r, Err(e) if e.is_cancelled())));
    }

    #[tokio::test]
    async fn test_already_cancelled_token() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let results = WorkerPool::new(2)
            .run(items(&["a", "b"]), |name: String| async move { Ok(name) }, &cancel)
            .await
            .unwrap();
        assert!(results.values().all(|r| matches!(r, Err(FinanceError::Cancelled(_)))));
    }

    #[tokio::test]
    async fn test_task_timeout() {
        let results = WorkerPool::new(2)
            .with_task_timeout(Some(Duration::from_millis(20)))
            .run(
                items(&["fast", "slow"]),
                |name: String| async move {
                    if name == "slow" {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                    Ok(name)
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(results["fast"].is_ok());
        assert!(matches!(&results["slow"], Err(e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_batch_timeout_cancels_pending_items() {
        let results = WorkerPool::new(4)
            .with_batch_timeout(Some(Duration::from_millis(20)))
            .run(
                items(&["x", "y"]),
                |name: String| async move {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(name)
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.values().all(|r| matches!(r, Err(e) if e.is_cancelled())));
    }
}
