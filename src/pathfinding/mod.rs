//! Bidirectional greedy path search between two articles.
//!
//! Two half-paths grow one hop per round, one from the start and one walking
//! back from the end. Each round checks for a meeting point, a direct link
//! between the frontiers, or a shared neighbour; failing those, each side takes
//! the single neighbour whose title is semantically closest to the opposite
//! frontier's summary. The search never backtracks, so it is not guaranteed to
//! find the shortest path, or any path.

mod finder;
mod state;

pub use finder::PathFinder;
pub use state::ArticlePath;

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Caller-chosen limits and traversal mode for one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Give up once the two half-paths together hold more titles than this.
    pub max_depth: usize,
    /// Wall-clock budget, measured from the start of the call.
    pub timeout: Duration,
    /// Links-only traversal (no category edges).
    pub hard_mode: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_depth: 15,
            timeout: Duration::from_secs(10),
            hard_mode: false,
        }
    }
}

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The two frontiers reached the same article.
    Met,
    /// The forward frontier links to the backward frontier.
    DirectForward,
    /// The backward frontier links to the forward frontier.
    DirectBackward,
    /// Both frontiers link to a common article.
    Intersection,
    StartNotFound,
    EndNotFound,
    Timeout,
    DepthExceeded,
    /// A frontier has no regular outbound links.
    DeadEnd,
    /// The opposite frontier's summary could not be fetched.
    SummaryUnavailable,
    /// Nothing left to rank on one side.
    NoCandidates,
    /// The link cache could not be read or written.
    LinkFetchFailed,
    /// The embedding model failed while ranking.
    ScoringFailed,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Termination::Met => "frontiers met",
            Termination::DirectForward => "direct link forward",
            Termination::DirectBackward => "direct link backward",
            Termination::Intersection => "shared neighbour",
            Termination::StartNotFound => "start page not found",
            Termination::EndNotFound => "end page not found",
            Termination::Timeout => "timed out",
            Termination::DepthExceeded => "maximum depth exceeded",
            Termination::DeadEnd => "dead end",
            Termination::SummaryUnavailable => "summary unavailable",
            Termination::NoCandidates => "no candidates left",
            Termination::LinkFetchFailed => "link cache failure",
            Termination::ScoringFailed => "scoring failed",
        };
        f.write_str(text)
    }
}

/// Result of one search, with the path if one was found.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub path: Option<ArticlePath>,
    pub termination: Termination,
    /// Greedy hops taken on each side.
    pub rounds: usize,
    pub elapsed: Duration,
}

impl SearchReport {
    pub(crate) fn new(
        path: Option<ArticlePath>,
        termination: Termination,
        rounds: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            path,
            termination,
            rounds,
            elapsed,
        }
    }

    pub(crate) fn gave_up(termination: Termination, rounds: usize, elapsed: Duration) -> Self {
        Self::new(None, termination, rounds, elapsed)
    }
}
