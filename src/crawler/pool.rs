//! Fixed-size worker pool draining the frontier
//!
//! The pool knows nothing about crawling: it pulls tasks, hands them to a
//! [`TaskHandler`] and reports every task done. Each task runs in two stages.
//! `prepare` covers the waits that belong to the site rather than the page
//! (robots lookup, crawl delay) and is bounded only by cancellation.
//! `process` runs under the per-task deadline.

use crate::crawler::frontier::{Frontier, Task};
use crate::CrawlError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Per-task work run by the pool
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    /// Runs before the task's deadline starts; `Ok(false)` skips the task
    async fn prepare(&self, task: &Task, cancel: &CancellationToken) -> Result<bool, CrawlError>;

    /// Runs under the per-task deadline
    async fn process(&self, task: Task, cancel: &CancellationToken) -> Result<(), CrawlError>;
}

/// Generic executor running `workers` concurrent task loops
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    task_timeout: Duration,
}

impl WorkerPool {
    pub fn new(workers: usize, task_timeout: Duration) -> Self {
        Self {
            workers: workers.max(1),
            task_timeout,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs the workers until `cancel` fires or the frontier closes and drains
    ///
    /// A task whose `process` stage outlives `task_timeout` is abandoned with a
    /// warning; one that fails is logged, unless the run is already shutting
    /// down. Neither stops the pool. Only a panicking worker surfaces as an
    /// error, after all workers have stopped.
    pub async fn run<H: TaskHandler>(
        &self,
        frontier: Arc<Frontier>,
        handler: Arc<H>,
        cancel: CancellationToken,
    ) -> Result<(), CrawlError> {
        let mut workers = JoinSet::new();

        for worker_id in 0..self.workers {
            let frontier = Arc::clone(&frontier);
            let handler = Arc::clone(&handler);
            let cancel = cancel.clone();
            let task_timeout = self.task_timeout;

            workers.spawn(async move {
                worker_loop(worker_id, frontier, handler, cancel, task_timeout).await;
            });
        }

        let mut first_failure = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Worker terminated abnormally");
                first_failure.get_or_insert(e);
            }
        }

        match first_failure {
            Some(e) => Err(CrawlError::TaskJoin(e)),
            None => Ok(()),
        }
    }
}

async fn worker_loop<H: TaskHandler>(
    worker_id: usize,
    frontier: Arc<Frontier>,
    handler: Arc<H>,
    cancel: CancellationToken,
    task_timeout: Duration,
) {
    debug!(worker_id, "Worker started");

    loop {
        let task = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = frontier.dequeue() => match next {
                Some(task) => task,
                None => break,
            },
        };

        let url = task.url.clone();
        let depth = task.depth;

        let result = match handler.prepare(&task, &cancel).await {
            Ok(true) => tokio::time::timeout(task_timeout, handler.process(task, &cancel)).await,
            Ok(false) => Ok(Ok(())),
            Err(e) => Ok(Err(e)),
        };

        match result {
            Ok(Ok(())) => {}
            Err(_) => {
                warn!(worker_id, url = %url, depth, timeout_secs = task_timeout.as_secs(), "Task timed out");
            }
            Ok(Err(e)) if cancel.is_cancelled() => {
                debug!(worker_id, url = %url, error = %e, "Task aborted during shutdown");
            }
            Ok(Err(e)) => {
                error!(worker_id, url = %url, depth, error = %e, "Task failed");
            }
        }

        frontier.task_done();
    }

    debug!(worker_id, "Worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn task(n: usize) -> Task {
        Task {
            url: format!("https://example.com/{}", n),
            depth: 0,
            domain: "example.com".to_string(),
        }
    }

    /// Counts processed tasks; behaviour keyed off the task URL
    #[derive(Default)]
    struct Recorder {
        prepared: AtomicUsize,
        processed: AtomicUsize,
        prepare_wait: Duration,
    }

    #[async_trait]
    impl TaskHandler for Recorder {
        async fn prepare(&self, task: &Task, _cancel: &CancellationToken) -> Result<bool, CrawlError> {
            self.prepared.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.prepare_wait).await;
            Ok(task.url != "https://example.com/3")
        }

        async fn process(&self, task: Task, _cancel: &CancellationToken) -> Result<(), CrawlError> {
            match task.url.as_str() {
                "https://example.com/1" => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                }
                "https://example.com/2" => Err(CrawlError::Fetch(FetchError::Status {
                    url: task.url.clone(),
                    status: 500,
                })),
                _ => {
                    self.processed.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }
        }
    }

    fn filled_frontier(tasks: usize) -> Arc<Frontier> {
        let frontier = Arc::new(Frontier::new(100));
        for n in 0..tasks {
            frontier.enqueue(task(n));
        }
        frontier.close();
        frontier
    }

    #[tokio::test]
    async fn test_processes_every_task_then_stops_on_close() {
        let frontier = filled_frontier(20);
        let recorder = Arc::new(Recorder::default());

        WorkerPool::new(4, Duration::from_secs(1))
            .run(Arc::clone(&frontier), Arc::clone(&recorder), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(recorder.prepared.load(Ordering::SeqCst), 20);
        // 1 times out, 2 fails, 3 is skipped in prepare
        assert_eq!(recorder.processed.load(Ordering::SeqCst), 17);
        assert_eq!(frontier.pending(), 0);
    }

    #[tokio::test]
    async fn test_errors_and_timeouts_do_not_stop_the_pool() {
        let frontier = filled_frontier(6);
        let recorder = Arc::new(Recorder::default());

        WorkerPool::new(2, Duration::from_millis(50))
            .run(Arc::clone(&frontier), Arc::clone(&recorder), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(recorder.processed.load(Ordering::SeqCst), 3);
        assert_eq!(frontier.pending(), 0);
    }

    #[tokio::test]
    async fn test_prepare_is_outside_the_deadline() {
        let frontier = Arc::new(Frontier::new(4));
        frontier.enqueue(task(9));
        frontier.close();

        let recorder = Arc::new(Recorder {
            prepare_wait: Duration::from_millis(200),
            ..Recorder::default()
        });

        WorkerPool::new(1, Duration::from_millis(50))
            .run(Arc::clone(&frontier), Arc::clone(&recorder), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(recorder.processed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_stops_idle_workers() {
        let frontier = Arc::new(Frontier::new(10));
        let cancel = CancellationToken::new();

        let run = {
            let cancel = cancel.clone();
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move {
                WorkerPool::new(3, Duration::from_secs(1))
                    .run(frontier, Arc::new(Recorder::default()), cancel)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn test_zero_workers_clamped() {
        assert_eq!(WorkerPool::new(0, Duration::from_secs(1)).workers(), 1);
    }
}
