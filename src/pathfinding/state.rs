use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// A walk across the link graph: non-empty, no consecutive duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArticlePath(Vec<String>);

impl ArticlePath {
    /// Build a path, collapsing consecutive repeats. `None` if `titles` is empty.
    pub fn new(mut titles: Vec<String>) -> Option<Self> {
        titles.dedup();
        if titles.is_empty() {
            None
        } else {
            Some(Self(titles))
        }
    }

    pub fn titles(&self) -> &[String] {
        &self.0
    }

    /// Number of titles on the path.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of edges traversed.
    pub fn hops(&self) -> usize {
        self.0.len().saturating_sub(1)
    }
}

impl fmt::Display for ArticlePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" -> "))
    }
}

/// Per-search accumulator: the two half-paths and the clock.
///
/// `backward` is stored head-to-tail, so its front is the frontier nearest
/// the end article and its back is the end article itself.
pub(crate) struct SearchState {
    forward: Vec<String>,
    backward: VecDeque<String>,
    started: Instant,
    pub(crate) rounds: usize,
}

impl SearchState {
    pub(crate) fn new(start: &str, end: &str, started: Instant) -> Self {
        Self {
            forward: vec![start.to_string()],
            backward: VecDeque::from([end.to_string()]),
            started,
            rounds: 0,
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Titles held across both half-paths.
    pub(crate) fn total_len(&self) -> usize {
        self.forward.len() + self.backward.len()
    }

    pub(crate) fn forward_frontier(&self) -> &str {
        // both halves start non-empty and only ever grow
        &self.forward[self.forward.len() - 1]
    }

    pub(crate) fn backward_frontier(&self) -> &str {
        &self.backward[0]
    }

    pub(crate) fn on_forward(&self, title: &str) -> bool {
        self.forward.iter().any(|t| t == title)
    }

    pub(crate) fn on_backward(&self, title: &str) -> bool {
        self.backward.iter().any(|t| t == title)
    }

    /// `F ++ B[1..]`, for when the frontiers are the same article.
    pub(crate) fn met(&self) -> Option<ArticlePath> {
        let titles = self
            .forward
            .iter()
            .chain(self.backward.iter().skip(1))
            .cloned()
            .collect();
        ArticlePath::new(titles)
    }

    /// `F ++ B`, for when one frontier links straight to the other.
    pub(crate) fn joined(&self) -> Option<ArticlePath> {
        let titles = self.forward.iter().chain(self.backward.iter()).cloned().collect();
        ArticlePath::new(titles)
    }

    /// `F ++ [shared] ++ B`.
    pub(crate) fn spliced(&self, shared: &str) -> Option<ArticlePath> {
        let titles = self
            .forward
            .iter()
            .cloned()
            .chain(std::iter::once(shared.to_string()))
            .chain(self.backward.iter().cloned())
            .collect();
        ArticlePath::new(titles)
    }

    pub(crate) fn advance(&mut self, next_forward: String, next_backward: String) {
        self.forward.push(next_forward);
        self.backward.push_front(next_backward);
        self.rounds += 1;
    }
}
