//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use product_scout::config::Config;
use product_scout::output::ProductUrls;
use product_scout::{CrawlError, CrawlPhase, Crawler};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration crawling `seeds` and writing to `output`
fn create_test_config(seeds: &[String], output: &Path) -> Config {
    let mut config = Config::with_seeds(seeds.iter().cloned());
    config.crawler.workers = 4;
    config.crawler.max_depth = 3;
    config.crawler.crawl_delay_ms = 0;
    config.crawler.task_timeout_secs = 10;
    config.crawler.fetch_timeout_secs = 2;
    config.crawler.robots_timeout_secs = 1;
    config.crawler.monitor_interval_secs = 1;
    config.crawler.stop_when_idle = true;
    config.crawler.max_runtime_secs = Some(30);
    config.user_agent.crawler_name = "TestBot".to_string();
    config.output.path = output.display().to_string();
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><head><title>Page</title></head><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

/// A page scoring URL pattern + og:type + ld+json + buy intent
fn product_page(name: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            r#"<html><head>
            <meta property="og:type" content="product">
            <script type="application/ld+json">{{"@type":"Product","name":"{name}"}}</script>
            </head><body><h1>{name}</h1><button>Add to cart</button></body></html>"#
        ))
        .insert_header("content-type", "text/html")
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

fn read_output(path: &Path) -> ProductUrls {
    let written = std::fs::read_to_string(path).expect("output file should exist");
    serde_json::from_str(&written).expect("output should be valid JSON")
}

#[tokio::test]
async fn test_discovers_product_pages() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("products.json");

    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/category/shoes">Shoes</a>
               <a href="/product/red-sneaker">Red Sneaker</a>
               <a href="/about">About</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/category/shoes"))
        .respond_with(html(r#"<a href="/product/blue-boot">Blue Boot</a><a href="/">Home</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html("<p>About us</p>"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/red-sneaker"))
        .respond_with(product_page("Red Sneaker"))
        .expect(1)
        .mount(&server)
        .await;

    // Linked only from a product page, which is a leaf
    Mock::given(method("GET"))
        .and(path("/product/blue-boot"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><head><meta property="og:type" content="product">
            <script type="application/ld+json">{{"@type":"Product"}}</script></head>
            <body><a href="{}/product/hidden-gem">Also viewed</a></body></html>"#,
            base
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/hidden-gem"))
        .respond_with(product_page("Hidden Gem"))
        .expect(0)
        .mount(&server)
        .await;

    let crawler = Crawler::new(create_test_config(&[format!("{}/", base)], &output)).unwrap();
    crawler.start(CancellationToken::new()).await.unwrap();

    assert_eq!(crawler.phase(), CrawlPhase::Done);

    let products = read_output(&output);
    assert_eq!(products.len(), 1);
    assert_eq!(
        products.get("127.0.0.1"),
        Some(&vec![
            format!("{}/product/blue-boot", base),
            format!("{}/product/red-sneaker", base),
        ])
    );
    assert_eq!(products, crawler.product_urls());
    assert_eq!(crawler.product_count(), 2);
}

#[tokio::test]
async fn test_robots_disallow_prevents_fetch() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("products.json");

    mount_robots(&server, "User-agent: *\nDisallow: /private\n").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/private/product/secret">Secret</a>
               <a href="/product/public">Public</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private/product/secret"))
        .respond_with(product_page("Secret"))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/public"))
        .respond_with(product_page("Public"))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = Crawler::new(create_test_config(&[format!("{}/", base)], &output)).unwrap();
    crawler.start(CancellationToken::new()).await.unwrap();

    let products = read_output(&output);
    assert_eq!(
        products.get("127.0.0.1"),
        Some(&vec![format!("{}/product/public", base)])
    );
    // Disallowed URLs are still claimed, just never fetched
    assert!(crawler
        .visited_urls()
        .contains(&format!("{}/private/product/secret", base)));
}

#[tokio::test]
async fn test_depth_bound() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("products.json");

    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/level1">Level 1</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/level1"))
        .respond_with(html(r#"<a href="/level2">Level 2</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(html("<p>Too deep</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&[format!("{}/", base)], &output);
    config.crawler.max_depth = 1;

    let crawler = Crawler::new(config).unwrap();
    crawler.start(CancellationToken::new()).await.unwrap();

    assert_eq!(crawler.visited_count(), 2);
    assert!(read_output(&output).is_empty());
}

#[tokio::test]
async fn test_sitemap_index_bootstrap() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("products.json");

    mount_robots(&server, "User-agent: *\nAllow: /").await;

    // The home page links nowhere; products are only reachable via sitemaps
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>Welcome</p>"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{base}/sitemap-products.xml</loc></sitemap>
  <sitemap><loc>{base}/sitemap-blog.xml</loc></sitemap>
</sitemapindex>"#
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap-products.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/product/from-sitemap</loc></url>
  <url><loc>https://elsewhere.example.com/product/offsite</loc></url>
</urlset>"#
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap-blog.xml"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/from-sitemap"))
        .respond_with(product_page("From Sitemap"))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = Crawler::new(create_test_config(&[format!("{}/", base)], &output)).unwrap();
    crawler.start(CancellationToken::new()).await.unwrap();

    let products = read_output(&output);
    assert_eq!(
        products.get("127.0.0.1"),
        Some(&vec![format!("{}/product/from-sitemap", base)])
    );
}

#[tokio::test]
async fn test_equivalent_urls_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("products.json");

    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/a">A</a><a href="/b">B</a>
               <a href="/shared/">Shared</a><a href="/shared#reviews">Reviews</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    for page in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html(r#"<a href="/shared">Shared</a><a href="/">Home</a>"#))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(html(r#"<a href="/a">A</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = Crawler::new(create_test_config(&[format!("{}/", base)], &output)).unwrap();
    crawler.start(CancellationToken::new()).await.unwrap();

    assert_eq!(crawler.visited_count(), 4);
    assert_eq!(
        crawler.visited_urls(),
        vec![
            format!("{}/", base),
            format!("{}/a", base),
            format!("{}/b", base),
            format!("{}/shared", base),
        ]
    );
}

#[tokio::test]
async fn test_full_frontier_drops_tasks() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("products.json");

    mount_robots(&server, "User-agent: *\nAllow: /").await;

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/page/{i}">Page {i}</a>"#))
        .collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&links))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(html("<p>Leaf</p>"))
        .mount(&server)
        .await;

    let mut config = create_test_config(&[format!("{}/", base)], &output);
    config.crawler.workers = 1;
    config.crawler.queue_capacity = 2;

    let crawler = Crawler::new(config).unwrap();
    crawler.start(CancellationToken::new()).await.unwrap();

    let stats = crawler.statistics();
    assert!(stats.dropped_tasks >= 8, "dropped {}", stats.dropped_tasks);
    assert_eq!(stats.phase, CrawlPhase::Done);
    assert!(output.exists());
}

#[tokio::test]
async fn test_cancellation_drains_and_writes_output() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out").join("products.json");

    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/slow">Slow</a>"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<p>Slow</p>").set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let mut config = create_test_config(&[format!("{}/", base)], &output);
    config.crawler.stop_when_idle = false;
    config.crawler.max_runtime_secs = None;
    config.crawler.fetch_timeout_secs = 20;

    let crawler = Crawler::new(config).unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), crawler.start(cancel)).await;
    assert!(result.expect("crawl should stop promptly").is_ok());

    assert_eq!(crawler.phase(), CrawlPhase::Done);
    assert!(read_output(&output).is_empty());
}

#[tokio::test]
async fn test_max_runtime_stops_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("products.json");

    Mock::given(method("GET"))
        .respond_with(html(r#"<a href="/">Home</a>"#))
        .mount(&server)
        .await;

    let mut config = create_test_config(&[format!("{}/", base)], &output);
    // Never idle-stops; only the deadline ends the run
    config.crawler.stop_when_idle = false;
    config.crawler.max_runtime_secs = Some(1);

    let crawler = Crawler::new(config).unwrap();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        crawler.start(CancellationToken::new()),
    )
    .await;

    assert!(result.expect("deadline should end the crawl").is_ok());
    assert_eq!(crawler.phase(), CrawlPhase::Done);
    assert!(output.exists());
}

#[tokio::test]
async fn test_no_usable_seeds() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("products.json");

    let config = create_test_config(&["not a url".to_string()], &output);
    let crawler = Crawler::new(config).unwrap();

    let result = crawler.start(CancellationToken::new()).await;
    assert!(matches!(result, Err(CrawlError::NoSeeds)));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_unreachable_robots_allows_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("products.json");

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/product/only">Only</a>"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/only"))
        .respond_with(product_page("Only"))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = Crawler::new(create_test_config(&[format!("{}/", base)], &output)).unwrap();
    crawler.start(CancellationToken::new()).await.unwrap();

    assert_eq!(crawler.product_count(), 1);
}

#[tokio::test]
async fn test_slow_sitemaps_do_not_cost_the_seed_page() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("products.json");

    mount_robots(&server, "User-agent: *\nAllow: /").await;

    for candidate in ["/sitemap.xml", "/sitemap_index.xml", "/sitemap-index.xml"] {
        Mock::given(method("GET"))
            .and(path(candidate))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(20)))
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/product/1">Product</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/1"))
        .respond_with(product_page("Product"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&[format!("{}/", base)], &output);
    config.crawler.fetch_timeout_secs = 1;
    config.crawler.task_timeout_secs = 3;
    // Sitemap retries would keep the run busy; the deadline ends it
    config.crawler.max_runtime_secs = Some(4);

    let crawler = Crawler::new(config).unwrap();
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        crawler.start(CancellationToken::new()),
    )
    .await;
    assert!(result.expect("deadline should end the crawl").is_ok());

    assert_eq!(
        read_output(&output).get("127.0.0.1"),
        Some(&vec![format!("{}/product/1", base)])
    );
}

#[tokio::test]
async fn test_crawl_delay_longer_than_task_timeout() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("products.json");

    mount_robots(&server, "User-agent: *\nCrawl-delay: 2\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/product/1">Product</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/1"))
        .respond_with(product_page("Product"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&[format!("{}/", base)], &output);
    config.crawler.task_timeout_secs = 1;

    let crawler = Crawler::new(config).unwrap();
    crawler.start(CancellationToken::new()).await.unwrap();

    assert_eq!(crawler.product_count(), 1);
    assert_eq!(
        read_output(&output).get("127.0.0.1"),
        Some(&vec![format!("{}/product/1", base)])
    );
}

#[tokio::test]
async fn test_cancellation_reaches_robots_fetch() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("products.json");

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nAllow: /")
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>Home</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&[format!("{}/", base)], &output);
    config.crawler.robots_timeout_secs = 5;
    config.crawler.stop_when_idle = false;
    config.crawler.max_runtime_secs = None;

    let crawler = Crawler::new(config).unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    crawler.start(cancel).await.unwrap();

    assert!(
        started.elapsed() < Duration::from_secs(2),
        "drain waited {:?}",
        started.elapsed()
    );
    assert_eq!(crawler.phase(), CrawlPhase::Done);
    assert!(read_output(&output).is_empty());
}
