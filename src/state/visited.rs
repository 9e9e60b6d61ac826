use dashmap::{DashMap, DashSet};
use std::collections::BTreeMap;

/// Set of normalized URLs already claimed by a worker
///
/// [`VisitedSet::insert`] is the dedup gate: it checks and marks in one
/// atomic step, so among workers racing on the same URL exactly one wins.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: DashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` visited, returning true if it was not visited before
    pub fn insert(&self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// All visited URLs, sorted
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.urls.iter().map(|u| u.key().clone()).collect();
        urls.sort();
        urls
    }
}

/// Domain to product-page URLs multimap
///
/// Domains appear lazily on their first product hit; URL sets never shrink.
#[derive(Debug, Default)]
pub struct ProductMap {
    by_domain: DashMap<String, DashSet<String>>,
}

impl ProductMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a product URL, returning true if it was new for the domain
    pub fn insert(&self, domain: &str, url: &str) -> bool {
        self.by_domain
            .entry(domain.to_string())
            .or_default()
            .insert(url.to_string())
    }

    /// Total number of product URLs across all domains
    pub fn len(&self) -> usize {
        self.by_domain.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of product URLs per domain
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.by_domain
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().len()))
            .collect()
    }

    /// Snapshot as domain to sorted URL list
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.by_domain
            .iter()
            .map(|entry| {
                let mut urls: Vec<String> =
                    entry.value().iter().map(|u| u.key().clone()).collect();
                urls.sort();
                (entry.key().clone(), urls)
            })
            .collect()
    }
}
