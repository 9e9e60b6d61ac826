//! Robots.txt caching implementation
//!
//! Policies are cached per origin for the lifetime of a run. Each origin owns
//! a `OnceCell`, so concurrent workers hitting a new site trigger a single
//! robots.txt fetch and the rest wait for its result.

use crate::robots::ParsedRobots;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

type PolicyCell = Arc<OnceCell<Arc<ParsedRobots>>>;

/// Per-origin cache of parsed robots.txt policies
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: DashMap<String, PolicyCell>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached policy for `origin`, running `fetch` if there is none
    ///
    /// `fetch` is awaited at most once per origin while it keeps succeeding,
    /// even under concurrent calls. A failed fetch leaves the origin
    /// unresolved, so the next caller tries again.
    pub async fn get_or_fetch<F, Fut, E>(&self, origin: &str, fetch: F) -> Result<Arc<ParsedRobots>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ParsedRobots, E>>,
    {
        // Clone the cell out so the map shard lock is not held across the await
        let cell = self
            .entries
            .entry(origin.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        cell.get_or_try_init(|| async move { fetch().await.map(Arc::new) })
            .await
            .cloned()
    }

    /// Returns the cached policy without fetching
    pub fn get(&self, origin: &str) -> Option<Arc<ParsedRobots>> {
        self.entries
            .get(origin)
            .and_then(|cell| cell.get().cloned())
    }

    /// Number of origins with a resolved policy
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
