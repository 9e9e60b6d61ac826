//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt files, and the politeness controller that turns a policy into
//! an allow/deny verdict plus the delay to observe before fetching.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::ParsedRobots;

use crate::crawler::Fetcher;
use crate::url::{origin_of, robots_url};
use crate::{CrawlError, FetchError, Task, UrlError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fetches robots.txt for the origin of `url`
///
/// Any failure (network error, timeout, non-200 status) yields an allow-all
/// policy: an unreachable robots file never blocks crawling. No retries are
/// made, so a slow robots file costs one timeout. The only error is
/// cancellation, which leaves the policy unresolved.
pub async fn fetch_robots(
    fetcher: &Fetcher,
    url: &url::Url,
    cancel: &CancellationToken,
) -> Result<ParsedRobots, FetchError> {
    let robots_url = match robots_url(url) {
        Ok(u) => u,
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "Cannot derive robots.txt location");
            return Ok(ParsedRobots::allow_all());
        }
    };

    match fetcher.fetch(robots_url.as_str(), cancel).await {
        Ok(body) => Ok(ParsedRobots::from_content(&body)),
        Err(e) if e.is_cancelled() => Err(e),
        Err(e) => {
            tracing::debug!(url = %robots_url, error = %e, "robots.txt unavailable, allowing all");
            Ok(ParsedRobots::allow_all())
        }
    }
}

/// Outcome of a politeness check for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolitenessDecision {
    /// Whether robots.txt permits fetching the task URL
    pub allowed: bool,
    /// Delay to observe before fetching (robots crawl-delay or the default)
    pub delay: Duration,
}

/// Robots.txt compliance and crawl-delay controller
pub struct Politeness {
    fetcher: Fetcher,
    cache: RobotsCache,
    user_agent: String,
    default_delay: Duration,
}

impl Politeness {
    /// Creates a controller that fetches robots.txt through `fetcher`
    ///
    /// `fetcher` should carry the short robots timeout.
    pub fn new(fetcher: Fetcher, user_agent: impl Into<String>, default_delay: Duration) -> Self {
        Self {
            fetcher,
            cache: RobotsCache::new(),
            user_agent: user_agent.into(),
            default_delay,
        }
    }

    /// Decides whether `task` may be fetched and how long to wait first
    ///
    /// Fails with [`FetchError::Cancelled`] if `cancel` fires while the
    /// robots.txt of a new origin is being fetched.
    pub async fn check(
        &self,
        task: &Task,
        cancel: &CancellationToken,
    ) -> Result<PolitenessDecision, CrawlError> {
        let url = url::Url::parse(&task.url).map_err(|e| UrlError::Parse(e.to_string()))?;
        let robots = self.policy_for(&url, cancel).await?;

        let allowed = robots.is_allowed(url.as_str(), &self.user_agent);
        let delay = robots
            .crawl_delay(&self.user_agent)
            .unwrap_or(self.default_delay);

        Ok(PolitenessDecision { allowed, delay })
    }

    /// Returns the cached policy for the origin of `url`, fetching it once
    pub async fn policy_for(
        &self,
        url: &url::Url,
        cancel: &CancellationToken,
    ) -> Result<Arc<ParsedRobots>, CrawlError> {
        let origin = origin_of(url).ok_or(UrlError::MissingDomain)?;

        let robots = self
            .cache
            .get_or_fetch(&origin, || async {
                tracing::debug!(origin = %origin, "Fetching robots.txt");
                fetch_robots(&self.fetcher, url, cancel).await
            })
            .await?;

        Ok(robots)
    }

    /// Number of origins whose policy has been resolved
    pub fn cached_origins(&self) -> usize {
        self.cache.len()
    }
}
