//! WikiBacon: name a page farther from a random start page than the computer's.

use crate::embeddings::Embedder;
use crate::error::Result;
use crate::pathfinding::{ArticlePath, PathFinder, SearchOptions, SearchReport};
use crate::wiki::{Page, PageDetail, PageSource, resolve};
use rand::Rng;
use rand::seq::SliceRandom;
use std::path::Path;

/// Score for a pair with no known path.
pub const UNREACHABLE_SCORE: usize = 100;

/// Characters of summary shown for each page.
pub const PREVIEW_CHARS: usize = 500;

/// Random draws before giving up on finding a page.
pub const DEFAULT_PICK_ATTEMPTS: usize = 20;

/// Path length in titles, or [`UNREACHABLE_SCORE`] without a path.
pub fn path_score(path: Option<&ArticlePath>) -> usize {
    path.map(ArticlePath::len).unwrap_or(UNREACHABLE_SCORE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    ComputerWins,
    PlayerWins,
    Tie,
}

impl Verdict {
    /// Farther page wins.
    pub fn decide(computer_score: usize, player_score: usize) -> Self {
        match computer_score.cmp(&player_score) {
            std::cmp::Ordering::Greater => Verdict::ComputerWins,
            std::cmp::Ordering::Less => Verdict::PlayerWins,
            std::cmp::Ordering::Equal => Verdict::Tie,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Verdict::ComputerWins => "I win!",
            Verdict::PlayerWins => "You win!",
            Verdict::Tie => "It's a tie!",
        }
    }
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn summary_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// One word per line; blank lines are skipped.
pub fn load_dictionary(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Draw dictionary words until one resolves to a page, up to `attempts` draws.
pub async fn pick_random_page<S, R>(
    source: &S,
    words: &[String],
    rng: &mut R,
    attempts: usize,
    search_limit: usize,
) -> Option<Page>
where
    S: PageSource + ?Sized,
    R: Rng + ?Sized,
{
    for _ in 0..attempts {
        let word = words.choose(rng)?;
        if let Some(page) = resolve(source, word, PageDetail::Summary, search_limit)
            .await
            .into_page()
        {
            return Some(page);
        }
        log::debug!("Dictionary word '{}' did not resolve, drawing again", word);
    }
    None
}

/// Both searches of a round and who won.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    pub computer: SearchReport,
    pub player: SearchReport,
    pub verdict: Verdict,
}

impl RoundOutcome {
    pub fn computer_score(&self) -> usize {
        path_score(self.computer.path.as_ref())
    }

    pub fn player_score(&self) -> usize {
        path_score(self.player.path.as_ref())
    }
}

/// Search from `start` to each of the two picks and score them.
pub async fn play_round<S, E>(
    finder: &PathFinder<S, E>,
    start: &Page,
    computer: &Page,
    player: &Page,
    opts: &SearchOptions,
) -> RoundOutcome
where
    S: PageSource + ?Sized,
    E: Embedder + ?Sized,
{
    let computer_report = finder.search_titles(&start.title, &computer.title, opts).await;
    let player_report = finder.search_titles(&start.title, &player.title, opts).await;

    let verdict = Verdict::decide(
        path_score(computer_report.path.as_ref()),
        path_score(player_report.path.as_ref()),
    );

    RoundOutcome {
        computer: computer_report,
        player: player_report,
        verdict,
    }
}
