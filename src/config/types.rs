use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Product Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(rename = "seed", default)]
    pub seeds: Vec<SeedEntry>,
}

impl Config {
    /// Builds a configuration with default settings for the given seed URLs
    pub fn with_seeds<I, S>(seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            crawler: CrawlerConfig::default(),
            user_agent: UserAgentConfig::default(),
            output: OutputConfig::default(),
            seeds: seeds
                .into_iter()
                .map(|url| SeedEntry { url: url.into() })
                .collect(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Number of concurrent workers draining the frontier
    pub workers: u32,

    /// Maximum depth to crawl from seed URLs
    pub max_depth: u32,

    /// Default politeness delay before each fetch (milliseconds)
    pub crawl_delay_ms: u64,

    /// Deadline for processing a single task (seconds)
    pub task_timeout_secs: u64,

    /// HTTP client timeout for page and sitemap fetches (seconds)
    pub fetch_timeout_secs: u64,

    /// HTTP timeout for robots.txt fetches (seconds)
    pub robots_timeout_secs: u64,

    /// Frontier capacity; tasks beyond it are dropped
    pub queue_capacity: usize,

    /// Interval between stall checks (seconds)
    pub monitor_interval_secs: u64,

    /// Finish the run once the frontier is empty and no task is in flight
    pub stop_when_idle: bool,

    /// Optional overall run deadline (seconds)
    pub max_runtime_secs: Option<u64>,
}

impl CrawlerConfig {
    pub fn crawl_delay(&self) -> Duration {
        Duration::from_millis(self.crawl_delay_ms)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn robots_timeout(&self) -> Duration {
        Duration::from_secs(self.robots_timeout_secs)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }

    pub fn max_runtime(&self) -> Option<Duration> {
        self.max_runtime_secs.map(Duration::from_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            max_depth: 3,
            crawl_delay_ms: 1000,
            task_timeout_secs: 30,
            fetch_timeout_secs: 10,
            robots_timeout_secs: 5,
            queue_capacity: 1000,
            monitor_interval_secs: 30,
            stop_when_idle: true,
            max_runtime_secs: None,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "EcommerceCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://github.com/product-scout/product-scout".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the JSON file mapping domains to product URLs
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "outputs/product_urls.json".to_string(),
        }
    }
}

/// Seed domain entry
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    /// Absolute URL the crawl of this domain starts from
    pub url: String,
}
