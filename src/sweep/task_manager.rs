//! Task Manager
//!
//! Bounded concurrent execution of per-document sweep tasks. Each task gets a
//! child of the sweep's cancellation token and its result is kept until
//! [`TaskManager::wait_all`] collects it.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::error::{SweepError, SweepResult};

/// Handle of one spawned task; the task reports its own run time
#[derive(Debug)]
pub struct TaskHandle<T> {
    pub name: String,
    pub handle: JoinHandle<(SweepResult<T>, Duration)>,
}

/// Result of one finished task
#[derive(Debug)]
pub struct TaskOutcome<T> {
    pub name: String,
    pub elapsed: Duration,
    pub result: SweepResult<T>,
}

/// Runs at most `max_concurrent_tasks` tasks at a time
pub struct TaskManager<T> {
    semaphore: Arc<Semaphore>,
    cancellation_token: CancellationToken,
    tasks: Mutex<Vec<TaskHandle<T>>>,
}

impl<T: Send + 'static> TaskManager<T> {
    pub fn new(max_concurrent_tasks: usize, cancellation_token: CancellationToken) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent_tasks.max(1))),
            cancellation_token,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawn a task once a permit is free
    ///
    /// Waits for a permit, so a caller spawning in a loop is held back to the
    /// concurrency limit. Fails with [`SweepError::Cancelled`] if cancellation
    /// is requested while waiting.
    pub async fn spawn_task<F, Fut>(&self, task_name: String, task_fn: F) -> SweepResult<()>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = SweepResult<T>> + Send + 'static,
    {
        let permit = tokio::select! {
            biased;
            _ = self.cancellation_token.cancelled() => return Err(SweepError::Cancelled),
            permit = self.semaphore.clone().acquire_owned() => {
                permit.map_err(|_| SweepError::Task("task semaphore closed".to_string()))?
            }
        };

        let cancellation = self.cancellation_token.child_token();
        let handle = tokio::spawn(async move {
            let _permit = permit;
            let started_at = Instant::now();
            let result = task_fn(cancellation).await;
            (result, started_at.elapsed())
        });

        self.tasks.lock().await.push(TaskHandle { name: task_name, handle });
        Ok(())
    }

    /// Request cancellation and wait briefly for every task to stop
    pub async fn cancel_all(&self) {
        self.cancellation_token.cancel();

        let handles: Vec<_> = self.tasks.lock().await.drain(..).collect();
        for task in handles {
            let _ = tokio::time::timeout(Duration::from_secs(5), task.handle).await;
        }
    }

    /// Wait for every spawned task, in spawn order
    pub async fn wait_all(&self) -> Vec<TaskOutcome<T>> {
        let tasks: Vec<_> = self.tasks.lock().await.drain(..).collect();
        let (names, handles): (Vec<_>, Vec<_>) = tasks.into_iter().map(|t| (t.name, t.handle)).unzip();

        names
            .into_iter()
            .zip(join_all(handles).await)
            .map(|(name, joined)| {
                let (result, elapsed) = match joined {
                    Ok(finished) => finished,
                    Err(join_err) => (Err(SweepError::from(join_err)), Duration::ZERO),
                };
                TaskOutcome { name, elapsed, result }
            })
            .collect()
    }

    /// Number of spawned tasks that have not finished yet
    pub async fn active_task_count(&self) -> usize {
        self.tasks.lock().await.iter().filter(|t| !t.handle.is_finished()).count()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_results_are_collected_in_spawn_order() {
        let manager = TaskManager::new(2, CancellationToken::new());

        for i in 0..4u64 {
            manager
                .spawn_task(format!("task-{i}"), move |_cancel| async move {
                    tokio::time::sleep(Duration::from_millis(10 * (4 - i))).await;
                    Ok(i)
                })
                .await
                .unwrap();
        }

        let outcomes = manager.wait_all().await;
        let values: Vec<u64> = outcomes.iter().map(|o| *o.result.as_ref().unwrap()).collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
        assert_eq!(outcomes[2].name, "task-2");
        assert_eq!(manager.active_task_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let manager = TaskManager::new(2, CancellationToken::new());
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for i in 0..6 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            manager
                .spawn_task(format!("task-{i}"), move |_cancel| async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
                .unwrap();
        }

        manager.wait_all().await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_elapsed_is_measured_by_the_task() {
        let outcomes = tokio_test::block_on(async {
            let manager = TaskManager::new(1, CancellationToken::new());
            manager
                .spawn_task("sleepy".to_string(), |_cancel| async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(())
                })
                .await
                .unwrap();
            manager.wait_all().await
        });

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].elapsed >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_task_errors_are_reported() {
        let manager: TaskManager<()> = TaskManager::new(1, CancellationToken::new());
        manager
            .spawn_task("failing".to_string(), |_cancel| async { Err(SweepError::Task("boom".to_string())) })
            .await
            .unwrap();

        let outcomes = manager.wait_all().await;
        assert!(matches!(outcomes[0].result, Err(SweepError::Task(_))));
    }

    #[tokio::test]
    async fn test_cancellation() {
        let token = CancellationToken::new();
        let manager = TaskManager::new(5, token.clone());

        manager
            .spawn_task("long-task".to_string(), |cancel| async move {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(10)) => Ok(false),
                    _ = cancel.cancelled() => Ok(true),
                }
            })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        manager.cancel_all().await;

        assert!(manager.is_cancelled());
        assert!(token.is_cancelled());
        assert_eq!(manager.active_task_count().await, 0);

        let result = manager.spawn_task("late".to_string(), |_cancel| async { Ok(true) }).await;
        assert!(matches!(result, Err(SweepError::Cancelled)));
    }
}
