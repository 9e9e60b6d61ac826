//! Run statistics
//!
//! A snapshot of counters taken when a run finishes, logged by the crawler
//! and printed by the CLI.

use crate::state::CrawlPhase;
use std::collections::BTreeMap;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Number of distinct URLs claimed by workers
    pub visited: usize,

    /// Product pages found per domain
    pub products_by_domain: BTreeMap<String, usize>,

    /// Tasks discarded because the frontier was full
    pub dropped_tasks: usize,

    /// Origins whose robots.txt policy was resolved
    pub robots_origins: usize,

    /// Wall time from start to materialization
    pub elapsed: Duration,

    /// Phase the run ended in
    pub phase: CrawlPhase,
}

impl CrawlStatistics {
    /// Total product pages across all domains
    pub fn total_products(&self) -> usize {
        self.products_by_domain.values().sum()
    }

    /// Share of visited URLs that were product pages, as a percentage
    pub fn product_rate(&self) -> f64 {
        if self.visited == 0 {
            return 0.0;
        }
        (self.total_products() as f64 / self.visited as f64) * 100.0
    }

    /// Visited URLs per second of run time
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.visited as f64 / secs
    }

    /// Emits the statistics as one structured log event
    pub fn log(&self) {
        tracing::info!(
            visited = self.visited,
            products = self.total_products(),
            domains = self.products_by_domain.len(),
            dropped_tasks = self.dropped_tasks,
            robots_origins = self.robots_origins,
            elapsed_secs = self.elapsed.as_secs_f64(),
            phase = %self.phase,
            "Crawl finished"
        );
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  URLs visited: {}", stats.visited);
    println!("  Product pages found: {}", stats.total_products());
    println!("  Tasks dropped (frontier full): {}", stats.dropped_tasks);
    println!("  robots.txt policies fetched: {}", stats.robots_origins);
    println!(
        "  Elapsed: {:.1}s ({:.2} pages/sec)",
        stats.elapsed.as_secs_f64(),
        stats.pages_per_second()
    );
    println!();

    if !stats.products_by_domain.is_empty() {
        println!("Products by Domain:");
        // Sort domains by count (descending), then name
        let mut domain_counts: Vec<_> = stats.products_by_domain.iter().collect();
        domain_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (domain, count) in domain_counts {
            println!("  {}: {}", domain, count);
        }
        println!();
    }

    println!(
        "Product Rate: {:.1}% ({} / {} visited URLs)",
        stats.product_rate(),
        stats.total_products(),
        stats.visited
    );
}
