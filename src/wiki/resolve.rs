use crate::wiki::{Page, PageDetail, PageSource};

/// Outcome of resolving a user- or link-supplied title to an article.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Page),
    /// Nothing resolved, exact lookup and search fallback included.
    NotFound,
    /// Nothing resolved and at least one collaborator call failed on the way.
    TransientError(String),
}

impl Resolution {
    pub fn into_page(self) -> Option<Page> {
        match self {
            Resolution::Resolved(page) => Some(page),
            _ => None,
        }
    }
}

/// Resolve `title` to a page.
///
/// Tries an exact lookup first. If that yields nothing (missing, redirect,
/// disambiguation) or fails, runs a full-text search for `title` and tries the
/// hits in rank order until one resolves exactly.
pub async fn resolve<S>(source: &S, title: &str, detail: PageDetail, search_limit: usize) -> Resolution
where
    S: PageSource + ?Sized,
{
    let title = title.trim();
    if title.is_empty() {
        return Resolution::NotFound;
    }

    let mut last_error: Option<String> = None;

    match source.fetch(title, detail).await {
        Ok(Some(page)) => return Resolution::Resolved(page),
        Ok(None) => log::debug!("No exact page for '{}', falling back to search", title),
        Err(e) => {
            log::warn!("Exact lookup for '{}' failed: {}", title, e);
            last_error = Some(e.to_string());
        }
    }

    let hits = match source.search(title, search_limit).await {
        Ok(hits) => hits,
        Err(e) => {
            log::warn!("Search for '{}' failed: {}", title, e);
            return Resolution::TransientError(e.to_string());
        }
    };

    for hit in hits.iter().filter(|hit| hit.as_str() != title) {
        match source.fetch(hit, detail).await {
            Ok(Some(page)) => {
                log::debug!("Resolved '{}' via search hit '{}'", title, page.title);
                return Resolution::Resolved(page);
            }
            Ok(None) => continue,
            Err(e) => {
                log::warn!("Lookup of search hit '{}' failed: {}", hit, e);
                last_error = Some(e.to_string());
            }
        }
    }

    match last_error {
        Some(err) => Resolution::TransientError(err),
        None => Resolution::NotFound,
    }
}
