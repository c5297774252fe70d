//! In-memory stand-ins for the encyclopedia and the embedding model.

use crate::embeddings::Embedder;
use crate::error::{Result, WikibaconError};
use crate::wiki::{Page, PageDetail, PageSource};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Page source backed by a fixed set of pages, counting every call.
#[derive(Default)]
pub(crate) struct FakeWiki {
    pages: HashMap<String, Page>,
    search_hits: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    failing_summaries: HashSet<String>,
    fetches: AtomicUsize,
    full_fetches: AtomicUsize,
    searches: AtomicUsize,
}

impl FakeWiki {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, title: &str, summary: &str, links: &[&str], categories: &[&str]) -> Self {
        self.pages.insert(
            title.to_string(),
            Page {
                title: title.to_string(),
                summary: summary.to_string(),
                links: links.iter().map(|s| s.to_string()).collect(),
                categories: categories.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    pub(crate) fn search_results(mut self, query: &str, hits: &[&str]) -> Self {
        self.search_hits
            .insert(query.to_string(), hits.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Every fetch of `title` fails with a transport error.
    pub(crate) fn failing(mut self, title: &str) -> Self {
        self.failing.insert(title.to_string());
        self
    }

    /// Summary fetches of `title` fail; full fetches still succeed.
    pub(crate) fn failing_summary(mut self, title: &str) -> Self {
        self.failing_summaries.insert(title.to_string());
        self
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn full_fetch_calls(&self) -> usize {
        self.full_fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn search_calls(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for FakeWiki {
    async fn fetch(&self, title: &str, detail: PageDetail) -> Result<Option<Page>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if detail == PageDetail::Full {
            self.full_fetches.fetch_add(1, Ordering::SeqCst);
        }
        let summary_down = detail == PageDetail::Summary && self.failing_summaries.contains(title);
        if self.failing.contains(title) || summary_down {
            return Err(WikibaconError::Fetch(format!("connection reset fetching {title}")));
        }
        Ok(self.pages.get(title).map(|page| match detail {
            PageDetail::Full => page.clone(),
            PageDetail::Summary => Page {
                links: Vec::new(),
                categories: Vec::new(),
                ..page.clone()
            },
        }))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .search_hits
            .get(query)
            .map(|hits| hits.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

const AXES: [&[&str]; 3] = [
    &["animal", "mammal", "dog", "cat", "wolf", "lion", "canid", "feline", "pet"],
    &["fruit", "banana", "pear", "apple"],
    &["europe", "capital", "city", "paris", "berlin", "france", "germany"],
];

/// Embeds text as keyword counts along a few topic axes, plus a constant
/// component so no vector is ever zero.
#[derive(Default)]
pub(crate) struct KeywordEmbedder {
    calls: AtomicUsize,
    broken: bool,
}

impl KeywordEmbedder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the model endpoint were down.
    pub(crate) fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut v: Vec<f32> = AXES
            .iter()
            .map(|words| words.iter().filter(|w| lower.contains(*w)).count() as f32)
            .collect();
        v.push(0.1);
        v
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(WikibaconError::Embedding("Embeddings API error 401: invalid key".to_string()));
        }
        Ok(Self::vector(text))
    }

    fn dimensions(&self) -> usize {
        AXES.len() + 1
    }
}
