//! Meta/navigational page detection.

/// Lower-case fragments that mark maintenance, tracking and disambiguation
/// pages rather than article content.
const DENYLIST: &[&str] = &[
    "disambiguation",
    "articles with",
    "pages with",
    "pages using",
    "all articles",
    "all pages",
    "wikipedia articles",
    "wikipedia pages",
    "short description",
    "identifiers",
    "authority control",
    "wikidata",
    "use dmy dates",
    "use mdy dates",
    "use british english",
    "use american english",
    "cs1",
    "webarchive",
    "harv and sfn",
];

/// True if `title` looks like a regular content page.
///
/// Plain substring matching on the lower-cased title; a title is rejected as
/// soon as it contains any denylisted fragment.
pub fn is_regular(title: &str) -> bool {
    let lower = title.to_lowercase();
    !DENYLIST.iter().any(|marker| lower.contains(marker))
}

/// Keep only regular pages, preserving order.
pub fn prune(titles: &[String]) -> Vec<String> {
    titles.iter().filter(|t| is_regular(t)).cloned().collect()
}
