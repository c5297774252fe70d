//! Lazily populated, durable cache of each article's outbound links.

pub mod filter;
pub mod storage;

pub use filter::{is_regular, prune};
pub use storage::{CacheRecord, count_records, load_record, store_record};

use crate::db::Db;
use crate::error::{Result, WikibaconError};
use crate::wiki::{PageDetail, PageSource, Resolution, is_category, resolve};
use std::collections::HashSet;
use std::sync::Arc;

/// Cache-or-fetch access to article link sets.
pub struct LinkStore<S: ?Sized> {
    db: Db,
    source: Arc<S>,
    search_limit: usize,
}

impl<S: PageSource + ?Sized> LinkStore<S> {
    pub fn new(db: Db, source: Arc<S>, search_limit: usize) -> Self {
        Self {
            db,
            source,
            search_limit,
        }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn search_limit(&self) -> usize {
        self.search_limit
    }

    /// Outbound links of `title`, never including `title` itself.
    ///
    /// Normal mode returns links followed by categories; hard mode returns
    /// article links only. A title that does not resolve yields an empty list
    /// and writes nothing. `Err` is reserved for cache store failures.
    pub async fn get_links(&self, title: &str, hard_mode: bool) -> Result<Vec<String>> {
        match load_record(&self.db, title).await {
            Ok(Some(record)) => {
                log::debug!("Link cache hit for '{}'", title);
                return Ok(link_list(&record, hard_mode));
            }
            Ok(None) => log::debug!("Link cache miss for '{}', fetching", title),
            // the upsert below replaces the unreadable row
            Err(WikibaconError::Serialization(e)) => {
                log::warn!("Cached links for '{}' are unreadable, refetching: {}", title, e);
            }
            Err(e) => return Err(e),
        }

        let page = match resolve(self.source.as_ref(), title, PageDetail::Full, self.search_limit).await {
            Resolution::Resolved(page) => page,
            Resolution::NotFound => {
                log::debug!("No page for '{}', treating as dead end", title);
                return Ok(Vec::new());
            }
            Resolution::TransientError(err) => {
                log::warn!("Fetching links for '{}' failed: {}", title, err);
                return Ok(Vec::new());
            }
        };

        let own = [title, page.title.as_str()];
        let record = CacheRecord {
            title: title.to_string(),
            canonical_title: page.title.clone(),
            links: dedup_excluding(&page.links, &own),
            categories: dedup_excluding(&page.categories, &own),
        };
        store_record(&self.db, &record).await?;

        Ok(link_list(&record, hard_mode))
    }
}

/// Order-preserving dedup that also drops any title in `exclude`.
fn dedup_excluding(titles: &[String], exclude: &[&str]) -> Vec<String> {
    let mut seen: HashSet<&str> = exclude.iter().copied().collect();
    titles
        .iter()
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}

/// Apply the traversal mode to a cached record.
fn link_list(record: &CacheRecord, hard_mode: bool) -> Vec<String> {
    let own = [record.title.as_str(), record.canonical_title.as_str()];
    let combined: Vec<String> = if hard_mode {
        record
            .links
            .iter()
            .filter(|t| !is_category(t))
            .cloned()
            .collect()
    } else {
        record
            .links
            .iter()
            .chain(record.categories.iter())
            .cloned()
            .collect()
    };
    dedup_excluding(&combined, &own)
}
