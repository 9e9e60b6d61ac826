//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl lifecycle that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier from the configured domains
//! - Running the worker pool, stall monitor, idle watcher and deadline
//! - The per-task pipeline (dedup, robots, delay, then fetch, classify, extract)
//! - Background sitemap discovery for each seed
//! - Draining on cancellation and materializing the results once

use crate::config::{validate, Config, CrawlerConfig, SeedEntry};
use crate::crawler::classifier::ProductClassifier;
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::frontier::{Admission, Frontier, Task};
use crate::crawler::parser::extract_links;
use crate::crawler::pool::{TaskHandler, WorkerPool};
use crate::crawler::sitemap::SitemapDiscoverer;
use crate::output::{CrawlStatistics, JsonOutput, OutputHandler, ProductUrls};
use crate::robots::Politeness;
use crate::state::{CrawlPhase, PhaseTracker, ProductMap, VisitedSet};
use crate::url::normalize_url;
use crate::{CrawlError, Result, UrlError};
use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// State shared by every worker for the duration of a run
struct CrawlContext {
    fetcher: Fetcher,
    politeness: Politeness,
    sitemaps: SitemapDiscoverer,
    classifier: ProductClassifier,
    frontier: Arc<Frontier>,
    visited: VisitedSet,
    products: ProductMap,
    max_depth: u32,
}

#[async_trait]
impl TaskHandler for CrawlContext {
    /// Claims the URL and waits out politeness before the task's deadline starts
    ///
    /// This method:
    /// 1. Claims the normalized URL in the visited set (dedup gate)
    /// 2. Checks robots.txt
    /// 3. Waits out the crawl delay
    /// 4. Starts sitemap discovery in the background when the task is a seed
    async fn prepare(&self, task: &Task, cancel: &CancellationToken) -> Result<bool> {
        let key = normalize_url(&task.url)?.to_string();

        if !self.visited.insert(&key) {
            trace!(url = %key, "Already visited");
            return Ok(false);
        }

        let decision = self.politeness.check(task, cancel).await?;
        if !decision.allowed {
            debug!(url = %task.url, "Disallowed by robots.txt");
            return Ok(false);
        }

        if !decision.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(false),
                _ = tokio::time::sleep(decision.delay) => {}
            }
        }

        if task.depth == 0 && self.max_depth >= 1 {
            self.spawn_sitemap_bootstrap(task, cancel)?;
        }

        Ok(true)
    }

    /// Fetches and classifies the page, then records it or enqueues its links
    async fn process(&self, task: Task, cancel: &CancellationToken) -> Result<()> {
        let page_url = Url::parse(&task.url).map_err(|e| UrlError::Parse(e.to_string()))?;
        let key = normalize_url(&task.url)?.to_string();

        let body = match self.fetcher.fetch(&task.url, cancel).await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                warn!(url = %task.url, depth = task.depth, "Fetch timed out, skipping");
                return Ok(());
            }
            Err(e) if e.is_cancelled() => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let classification = self.classifier.classify(&task.url, &body);
        if classification.is_product {
            if self.products.insert(&task.domain, &key) {
                info!(
                    url = %key,
                    domain = %task.domain,
                    score = classification.score,
                    "Found product page"
                );
            }
            // Product pages are leaves
            return Ok(());
        }

        if task.depth >= self.max_depth {
            trace!(url = %task.url, depth = task.depth, "Max depth reached, not following links");
            return Ok(());
        }

        let links = extract_links(&page_url, &body, cancel);
        let mut admitted = 0usize;
        for link in links {
            if cancel.is_cancelled() {
                break;
            }
            if self.visited.contains(&link) {
                continue;
            }
            if self.frontier.enqueue(task.child(link)) == Admission::Accepted {
                admitted += 1;
            }
        }

        debug!(
            url = %task.url,
            depth = task.depth,
            score = classification.score,
            enqueued = admitted,
            "Page processed"
        );
        Ok(())
    }
}

impl CrawlContext {
    /// Discovers sitemap URLs for a seed off the worker, enqueueing them as depth-1 tasks
    ///
    /// Runs outside the seed's deadline so slow sitemaps never cost the seed
    /// page. The frontier counts the discovery as pending until it finishes,
    /// and it stops when the run is cancelled.
    fn spawn_sitemap_bootstrap(&self, seed: &Task, cancel: &CancellationToken) -> Result<()> {
        let seed_url = Url::parse(&seed.url).map_err(|e| UrlError::Parse(e.to_string()))?;
        let hold = self.frontier.hold();
        let frontier = Arc::clone(&self.frontier);
        let sitemaps = self.sitemaps.clone();
        let seed = seed.clone();
        let cancel = cancel.clone();

        tokio::spawn(async move {
            let _hold = hold;
            let urls = tokio::select! {
                _ = cancel.cancelled() => return,
                urls = sitemaps.discover(&seed_url) => urls,
            };

            for raw in urls {
                match normalize_url(&raw) {
                    Ok(url) => {
                        frontier.enqueue(seed.child(url.to_string()));
                    }
                    Err(e) => trace!(url = %raw, error = %e, "Skipping sitemap entry"),
                }
            }
        });

        Ok(())
    }
}

/// Product-page discovery crawler
pub struct Crawler {
    ctx: Arc<CrawlContext>,
    settings: CrawlerConfig,
    seeds: Vec<SeedEntry>,
    pool: WorkerPool,
    output: Box<dyn OutputHandler>,
    phase: PhaseTracker,
    started_at: OnceLock<Instant>,
    elapsed: OnceLock<Duration>,
}

impl Crawler {
    /// Creates a new crawler instance
    ///
    /// Validates the configuration and builds the shared HTTP client. Results
    /// go to a [`JsonOutput`] at the configured path unless replaced with
    /// [`Crawler::with_output`].
    pub fn new(config: Config) -> Result<Self> {
        validate(&config)?;

        let settings = config.crawler.clone();
        let client = build_http_client(&config.user_agent, settings.fetch_timeout())?;
        let fetcher = Fetcher::new(client, settings.fetch_timeout());
        let politeness = Politeness::new(
            fetcher.with_timeout(settings.robots_timeout()),
            config.user_agent.header_value(),
            settings.crawl_delay(),
        );

        let ctx = CrawlContext {
            sitemaps: SitemapDiscoverer::new(fetcher.clone()),
            fetcher,
            politeness,
            classifier: ProductClassifier::new(),
            frontier: Arc::new(Frontier::new(settings.queue_capacity)),
            visited: VisitedSet::new(),
            products: ProductMap::new(),
            max_depth: settings.max_depth,
        };

        Ok(Self {
            ctx: Arc::new(ctx),
            pool: WorkerPool::new(settings.workers as usize, settings.task_timeout()),
            output: Box::new(JsonOutput::new(&config.output.path)),
            seeds: config.seeds,
            settings,
            phase: PhaseTracker::new(),
            started_at: OnceLock::new(),
            elapsed: OnceLock::new(),
        })
    }

    /// Replaces the output handler
    pub fn with_output(mut self, output: impl OutputHandler + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Runs the crawl until `cancel` fires, the frontier goes idle or the deadline passes
    ///
    /// The output handler is called exactly once, after in-flight tasks have
    /// drained. Per-task failures never abort the run; only an unseedable
    /// configuration or a failed output write is returned as an error.
    pub async fn start(&self, cancel: CancellationToken) -> Result<()> {
        self.phase.advance(CrawlPhase::Seeding)?;
        let started = *self.started_at.get_or_init(Instant::now);

        let seeded = self.seed();
        if seeded == 0 {
            self.phase.advance(CrawlPhase::Done)?;
            let _ = self.elapsed.set(started.elapsed());
            return Err(CrawlError::NoSeeds);
        }
        info!(seeds = seeded, workers = self.pool.workers(), max_depth = self.settings.max_depth, "Starting crawl");

        self.phase.advance(CrawlPhase::Running)?;
        let run = cancel.child_token();
        let helpers = self.spawn_helpers(&run);

        let pool = self.pool.clone();
        let frontier = Arc::clone(&self.ctx.frontier);
        let handler = Arc::clone(&self.ctx);
        let pool_cancel = run.clone();
        let mut pool_handle =
            tokio::spawn(async move { pool.run(frontier, handler, pool_cancel).await });

        let pool_result = tokio::select! {
            _ = run.cancelled() => None,
            joined = &mut pool_handle => Some(joined),
        };

        self.phase.advance(CrawlPhase::Draining)?;
        run.cancel();
        self.ctx.frontier.close();
        info!(
            visited = self.ctx.visited.len(),
            queued = self.ctx.frontier.len(),
            "Draining crawl"
        );

        let pool_result = match pool_result {
            Some(joined) => joined,
            None => pool_handle.await,
        };
        match pool_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "Worker pool failed"),
            Err(e) => error!(error = %e, "Worker pool task failed"),
        }

        for helper in helpers {
            if let Err(e) = helper.await {
                debug!(error = %e, "Helper task ended abnormally");
            }
        }

        let _ = self.elapsed.set(started.elapsed());
        let written = self.output.write_products(&self.product_urls());
        self.phase.advance(CrawlPhase::Done)?;
        self.statistics().log();

        if let Err(e) = &written {
            error!(output = %self.output.describe(), error = %e, "Failed to write results");
        }
        written.map_err(CrawlError::from)
    }

    /// Turns each configured seed into a depth-0 task; returns how many were admitted
    fn seed(&self) -> usize {
        let mut seeded = 0;

        for seed in &self.seeds {
            let url = match Url::parse(seed.url.trim()) {
                Ok(url) => url,
                Err(e) => {
                    warn!(seed = %seed.url, error = %e, "Skipping unparsable seed");
                    continue;
                }
            };

            if let Err(e) = normalize_url(url.as_str()) {
                warn!(seed = %seed.url, error = %e, "Skipping unusable seed");
                continue;
            }

            match Task::seed(&url) {
                Ok(task) => {
                    if self.ctx.frontier.enqueue(task) == Admission::Accepted {
                        seeded += 1;
                    }
                }
                Err(e) => warn!(seed = %seed.url, error = %e, "Skipping seed without domain"),
            }
        }

        seeded
    }

    /// Spawns the stall monitor, idle watcher and deadline timer
    ///
    /// Each exits once `run` is cancelled; the idle watcher and deadline
    /// cancel `run` themselves when they fire.
    fn spawn_helpers(&self, run: &CancellationToken) -> Vec<JoinHandle<()>> {
        let mut helpers = vec![tokio::spawn(monitor(
            Arc::clone(&self.ctx),
            self.settings.monitor_interval(),
            run.clone(),
        ))];

        if self.settings.stop_when_idle {
            let frontier = Arc::clone(&self.ctx.frontier);
            let run = run.clone();
            helpers.push(tokio::spawn(async move {
                tokio::select! {
                    _ = run.cancelled() => {}
                    _ = frontier.wait_idle() => {
                        info!("Frontier is empty, crawl complete");
                        run.cancel();
                    }
                }
            }));
        }

        if let Some(limit) = self.settings.max_runtime() {
            let run = run.clone();
            helpers.push(tokio::spawn(async move {
                tokio::select! {
                    _ = run.cancelled() => {}
                    _ = tokio::time::sleep(limit) => {
                        warn!(limit_secs = limit.as_secs(), "Maximum runtime reached, stopping crawl");
                        run.cancel();
                    }
                }
            }));
        }

        helpers
    }

    /// Discovered product URLs, domain to sorted URL list
    pub fn product_urls(&self) -> ProductUrls {
        self.ctx.products.snapshot()
    }

    /// Every URL claimed by a worker, sorted
    pub fn visited_urls(&self) -> Vec<String> {
        self.ctx.visited.to_sorted_vec()
    }

    pub fn visited_count(&self) -> usize {
        self.ctx.visited.len()
    }

    pub fn product_count(&self) -> usize {
        self.ctx.products.len()
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase.current()
    }

    /// Snapshot of the run's counters
    pub fn statistics(&self) -> CrawlStatistics {
        let elapsed = self
            .elapsed
            .get()
            .copied()
            .or_else(|| self.started_at.get().map(Instant::elapsed))
            .unwrap_or(Duration::ZERO);

        CrawlStatistics {
            visited: self.ctx.visited.len(),
            products_by_domain: self.ctx.products.counts(),
            dropped_tasks: self.ctx.frontier.dropped(),
            robots_origins: self.ctx.politeness.cached_origins(),
            elapsed,
            phase: self.phase.current(),
        }
    }
}

/// Logs progress every `interval` and warns when the visited count stops moving
async fn monitor(ctx: Arc<CrawlContext>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately
    ticker.tick().await;
    let mut last_visited = ctx.visited.len();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let visited = ctx.visited.len();
                if visited == last_visited {
                    warn!(
                        visited,
                        queued = ctx.frontier.len(),
                        in_flight = ctx.frontier.pending(),
                        "Crawl appears stalled, no new URLs visited"
                    );
                } else {
                    info!(
                        visited,
                        products = ctx.products.len(),
                        queued = ctx.frontier.len(),
                        "Crawl progress"
                    );
                }
                last_visited = visited;
            }
        }
    }
}
