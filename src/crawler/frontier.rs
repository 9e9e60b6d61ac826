//! Bounded crawl frontier
//!
//! A FIFO of pending tasks with drop-on-full admission. Producers never wait:
//! a task offered to a full frontier is discarded and counted. Consumers wait
//! until a task arrives or the frontier is closed and drained.

use crate::url::extract_domain;
use crate::UrlError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;

/// A unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Absolute URL to process
    pub url: String,
    /// Link distance from the seed (seeds are 0)
    pub depth: u32,
    /// Host the task belongs to, used as the result key
    pub domain: String,
}

impl Task {
    /// Builds a depth-0 task for a seed URL
    pub fn seed(url: &Url) -> Result<Self, UrlError> {
        let domain = extract_domain(url).ok_or(UrlError::MissingDomain)?;
        Ok(Self {
            url: url.to_string(),
            depth: 0,
            domain,
        })
    }

    /// Builds the task for a link found while processing this one
    pub fn child(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: self.depth + 1,
            domain: self.domain.clone(),
        }
    }
}

/// Outcome of offering a task to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// Frontier at capacity; the task was discarded
    Dropped,
    /// Frontier closed; the task was discarded
    Closed,
}

/// Bounded multi-producer multi-consumer task queue
#[derive(Debug)]
pub struct Frontier {
    queue: Mutex<VecDeque<Task>>,
    capacity: usize,
    available: Notify,
    idle: Notify,
    closed: AtomicBool,
    /// Admitted tasks not yet reported done
    pending: AtomicUsize,
    dropped: AtomicUsize,
}

impl Frontier {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            available: Notify::new(),
            idle: Notify::new(),
            closed: AtomicBool::new(false),
            pending: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Offers a task without blocking
    pub fn enqueue(&self, task: Task) -> Admission {
        if self.is_closed() {
            return Admission::Closed;
        }

        {
            let mut queue = match self.queue.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };

            if queue.len() >= self.capacity {
                drop(queue);
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(url = %task.url, depth = task.depth, "Frontier full, dropping task");
                return Admission::Dropped;
            }

            self.pending.fetch_add(1, Ordering::AcqRel);
            queue.push_back(task);
        }

        self.available.notify_one();
        Admission::Accepted
    }

    /// Waits for the next task; `None` once the frontier is closed and empty
    pub async fn dequeue(&self) -> Option<Task> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            // Register before checking so a notify between check and await is not lost
            notified.as_mut().enable();

            if let Some(task) = self.try_dequeue() {
                return Some(task);
            }

            if self.is_closed() {
                return None;
            }

            notified.await;
        }
    }

    /// Takes the next task if one is ready
    pub fn try_dequeue(&self) -> Option<Task> {
        let mut queue = match self.queue.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        queue.pop_front()
    }

    /// Reports that a dequeued task finished (successfully or not)
    ///
    /// Every accepted task must be reported exactly once.
    pub fn task_done(&self) {
        let previous = self.pending.fetch_sub(1, Ordering::AcqRel);
        if previous == 1 {
            self.idle.notify_waiters();
        }
    }

    /// Counts work outside the queue as pending until the returned hold drops
    ///
    /// Used for background work that may still enqueue tasks, so the frontier
    /// is not reported idle while it runs.
    pub fn hold(self: &Arc<Self>) -> PendingHold {
        self.pending.fetch_add(1, Ordering::AcqRel);
        PendingHold {
            frontier: Arc::clone(self),
        }
    }

    /// Waits until no admitted task is queued or in flight
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }

            notified.await;
        }
    }

    /// Stops admission and wakes every waiting consumer
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.available.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Tasks currently queued (not yet dequeued)
    pub fn len(&self) -> usize {
        match self.queue.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Admitted tasks that are queued or being processed
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Tasks discarded because the frontier was full
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Pending slot taken by [`Frontier::hold`], released on drop
#[derive(Debug)]
pub struct PendingHold {
    frontier: Arc<Frontier>,
}

impl Drop for PendingHold {
    fn drop(&mut self) {
        self.frontier.task_done();
    }
}
