//! Encyclopedia access: the page source abstraction, the MediaWiki client,
//! and the exact-then-search resolution wrapper.

mod client;
mod resolve;

pub use client::WikiClient;
pub use resolve::{Resolution, resolve};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Namespace marker carried by category titles, e.g. `Category:Mammals`.
pub const CATEGORY_PREFIX: &str = "Category:";

/// True if `title` names a category rather than an article.
pub fn is_category(title: &str) -> bool {
    title.starts_with(CATEGORY_PREFIX)
}

/// How much of a page to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDetail {
    /// Canonical title and summary only.
    Summary,
    /// Summary plus outbound article links and categories.
    Full,
}

/// A resolved article. `links` and `categories` are empty for
/// [`PageDetail::Summary`] fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    pub summary: String,
    pub links: Vec<String>,
    pub categories: Vec<String>,
}

/// Source of encyclopedia pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Exact, non-redirecting lookup of `title`.
    ///
    /// `Ok(None)` when the title is missing, a redirect, or a disambiguation
    /// page. `Err` only for transport or protocol failures.
    async fn fetch(&self, title: &str, detail: PageDetail) -> Result<Option<Page>>;

    /// Full-text search, best match first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_category() {
        assert!(is_category("Category:Mammals"));
        assert!(!is_category("Mammal"));
        assert!(!is_category("category:lowercase is not the namespace"));
    }
}
