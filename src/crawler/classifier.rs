//! Product-page classifier
//!
//! Every signal is an independent predicate over the page URL and its parsed
//! document. Matching signals add their weight to the score, and a page is a
//! product page once the score reaches [`PRODUCT_THRESHOLD`].

use regex::Regex;
use scraper::{Html, Selector};
use std::fmt;
use url::Url;

/// Minimum score for a page to count as a product page
pub const PRODUCT_THRESHOLD: u32 = 50;

/// Anchor-to-element ratio above which the anchor density signal fires
pub const ANCHOR_DENSITY_RATIO: f64 = 0.3;

/// Independent evidence that a page is a product page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// The URL itself looks like a product URL
    UrlPattern,
    /// `og:type` is `product`, or some meta name/property mentions products
    MetaTags,
    /// Breadcrumb text mentions products, items or details
    Breadcrumbs,
    /// A query key mentions product, item, prod or sku
    QueryParams,
    /// An anchor or button carries buy-intent text
    BuyIntentText,
    /// A JSON-LD block declares a Product
    StructuredData,
    /// The canonical link looks like a product URL
    CanonicalTag,
    /// Anchors make up a large share of all elements
    AnchorDensity,
}

/// Signal weights, evaluated in this order
pub const SIGNAL_WEIGHTS: [(Signal, u32); 8] = [
    (Signal::UrlPattern, 20),
    (Signal::MetaTags, 15),
    (Signal::Breadcrumbs, 10),
    (Signal::QueryParams, 10),
    (Signal::BuyIntentText, 10),
    (Signal::StructuredData, 20),
    (Signal::CanonicalTag, 10),
    (Signal::AnchorDensity, 5),
];

impl Signal {
    pub fn weight(&self) -> u32 {
        SIGNAL_WEIGHTS
            .iter()
            .find(|(signal, _)| signal == self)
            .map(|(_, weight)| *weight)
            .unwrap_or(0)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UrlPattern => "url_pattern",
            Self::MetaTags => "meta_tags",
            Self::Breadcrumbs => "breadcrumbs",
            Self::QueryParams => "query_params",
            Self::BuyIntentText => "buy_intent_text",
            Self::StructuredData => "structured_data",
            Self::CanonicalTag => "canonical_tag",
            Self::AnchorDensity => "anchor_density",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of scoring one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub score: u32,
    pub matched: Vec<Signal>,
    pub is_product: bool,
}

const URL_PATTERNS: &[&str] = &[
    r"/product/",
    r"/item/",
    r"/p/",
    r"/prod/",
    r"-prod\d+",
    r"/buy/",
    r"/shop/",
    r"/product\.html",
];

const BREADCRUMB_SELECTOR: &str = ".breadcrumb, .breadcrumbs, .bc, .breadcrumb-trail";
const BREADCRUMB_TERMS: &[&str] = &["product", "item", "detail"];
const QUERY_KEY_TERMS: &[&str] = &["product", "item", "prod", "sku"];
const BUY_PHRASES: &[&str] = &[
    "buy now",
    "add to cart",
    "add to bag",
    "view product",
    "product details",
    "shop now",
];
const PRODUCT_TYPE_MARKERS: &[&str] = &[r#""@type":"product""#, "'@type':'product'"];

/// Weighted heuristic product-page classifier
#[derive(Debug, Clone)]
pub struct ProductClassifier {
    url_patterns: Vec<Regex>,
}

impl Default for ProductClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductClassifier {
    pub fn new() -> Self {
        let url_patterns = URL_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Self { url_patterns }
    }

    /// Returns true if the (lowercased) URL matches any product URL pattern
    pub fn url_pattern_match(&self, url: &str) -> bool {
        let lowered = url.to_lowercase();
        self.url_patterns.iter().any(|re| re.is_match(&lowered))
    }

    /// Scores a page against every signal
    pub fn classify(&self, url: &str, html: &str) -> Classification {
        let document = Html::parse_document(html);
        let mut score = 0;
        let mut matched = Vec::new();

        for (signal, weight) in SIGNAL_WEIGHTS {
            if self.detect(signal, url, &document) {
                score += weight;
                matched.push(signal);
            }
        }

        Classification {
            score,
            matched,
            is_product: score >= PRODUCT_THRESHOLD,
        }
    }

    /// Convenience wrapper returning only the verdict
    pub fn is_product_page(&self, url: &str, html: &str) -> bool {
        self.classify(url, html).is_product
    }

    fn detect(&self, signal: Signal, url: &str, document: &Html) -> bool {
        match signal {
            Signal::UrlPattern => self.url_pattern_match(url),
            Signal::MetaTags => has_product_meta(document),
            Signal::Breadcrumbs => has_product_breadcrumbs(document),
            Signal::QueryParams => has_product_query_key(url),
            Signal::BuyIntentText => has_buy_intent_text(document),
            Signal::StructuredData => has_product_structured_data(document),
            Signal::CanonicalTag => self.canonical_matches(document),
            Signal::AnchorDensity => anchor_density(document) > ANCHOR_DENSITY_RATIO,
        }
    }

    fn canonical_matches(&self, document: &Html) -> bool {
        let Ok(selector) = Selector::parse("link[rel='canonical']") else {
            return false;
        };

        document
            .select(&selector)
            .next()
            .and_then(|link| link.value().attr("href"))
            .map(|href| self.url_pattern_match(href))
            .unwrap_or(false)
    }
}

fn has_product_meta(document: &Html) -> bool {
    if let Ok(selector) = Selector::parse("meta[property='og:type']") {
        let og_type = document
            .select(&selector)
            .next()
            .and_then(|meta| meta.value().attr("content"));
        if og_type.map(|c| c.trim().eq_ignore_ascii_case("product")) == Some(true) {
            return true;
        }
    }

    let Ok(selector) = Selector::parse("meta") else {
        return false;
    };

    document.select(&selector).any(|meta| {
        ["name", "property"].iter().any(|attr| {
            meta.value()
                .attr(attr)
                .map(|value| value.to_lowercase().contains("product"))
                .unwrap_or(false)
        })
    })
}

fn has_product_breadcrumbs(document: &Html) -> bool {
    let Ok(selector) = Selector::parse(BREADCRUMB_SELECTOR) else {
        return false;
    };

    let text = document
        .select(&selector)
        .flat_map(|element| element.text())
        .collect::<String>()
        .to_lowercase();

    BREADCRUMB_TERMS.iter().any(|term| text.contains(term))
}

fn has_product_query_key(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    parsed.query_pairs().any(|(key, _)| {
        let key = key.to_lowercase();
        QUERY_KEY_TERMS.iter().any(|term| key.contains(term))
    })
}

fn has_buy_intent_text(document: &Html) -> bool {
    let Ok(selector) = Selector::parse("a, button") else {
        return false;
    };

    document.select(&selector).any(|element| {
        let text = element.text().collect::<String>().to_lowercase();
        BUY_PHRASES.iter().any(|phrase| text.contains(phrase))
    })
}

fn has_product_structured_data(document: &Html) -> bool {
    let Ok(selector) = Selector::parse("script[type='application/ld+json']") else {
        return false;
    };

    document.select(&selector).any(|script| {
        let text = script.text().collect::<String>().to_lowercase();
        PRODUCT_TYPE_MARKERS.iter().any(|marker| text.contains(marker))
    })
}

/// Share of anchors among all elements (0.0 for an empty document)
fn anchor_density(document: &Html) -> f64 {
    let Ok(all) = Selector::parse("*") else {
        return 0.0;
    };

    let (total, anchors) = document
        .select(&all)
        .fold((0usize, 0usize), |(total, anchors), element| {
            let is_anchor = element.value().name() == "a";
            (total + 1, anchors + usize::from(is_anchor))
        });

    if total == 0 {
        return 0.0;
    }

    anchors as f64 / total as f64
}
