use crate::embeddings::Embedder;
use crate::links::{LinkStore, prune};
use crate::pathfinding::state::SearchState;
use crate::pathfinding::{ArticlePath, SearchOptions, SearchReport, Termination};
use crate::search::SimilarityScorer;
use crate::wiki::{PageDetail, PageSource, Resolution, resolve};
use std::collections::HashSet;
use std::time::Instant;

/// Drives the bidirectional search over a link store and a similarity scorer.
pub struct PathFinder<S: ?Sized, E: ?Sized> {
    links: LinkStore<S>,
    scorer: SimilarityScorer<E>,
}

impl<S, E> PathFinder<S, E>
where
    S: PageSource + ?Sized,
    E: Embedder + ?Sized,
{
    pub fn new(links: LinkStore<S>, scorer: SimilarityScorer<E>) -> Self {
        Self { links, scorer }
    }

    /// Shortest-effort path from `start` to `end`, or `None`.
    pub async fn find_path(&self, start: &str, end: &str, opts: &SearchOptions) -> Option<ArticlePath> {
        self.search(start, end, opts).await.path
    }

    /// Resolve both endpoints, then search between their canonical titles.
    pub async fn search(&self, start: &str, end: &str, opts: &SearchOptions) -> SearchReport {
        let started = Instant::now();

        let Some(start_page) = self.summary(start).await else {
            log::info!("Start page '{}' not found", start);
            return SearchReport::gave_up(Termination::StartNotFound, 0, started.elapsed());
        };
        let Some(end_page) = self.summary(end).await else {
            log::info!("End page '{}' not found", end);
            return SearchReport::gave_up(Termination::EndNotFound, 0, started.elapsed());
        };

        self.run(SearchState::new(&start_page.title, &end_page.title, started), opts)
            .await
    }

    /// Search between titles already known to be canonical.
    pub async fn search_titles(&self, start: &str, end: &str, opts: &SearchOptions) -> SearchReport {
        self.run(SearchState::new(start, end, Instant::now()), opts).await
    }

    async fn summary(&self, title: &str) -> Option<crate::wiki::Page> {
        match resolve(
            self.links.source().as_ref(),
            title,
            PageDetail::Summary,
            self.links.search_limit(),
        )
        .await
        {
            Resolution::Resolved(page) => Some(page),
            Resolution::NotFound => None,
            Resolution::TransientError(err) => {
                log::warn!("Could not resolve '{}': {}", title, err);
                None
            }
        }
    }

    async fn run(&self, mut state: SearchState, opts: &SearchOptions) -> SearchReport {
        loop {
            let outcome = self.step(&mut state, opts).await;
            if let Some((path, termination)) = outcome {
                let report = SearchReport::new(path, termination, state.rounds, state.elapsed());
                match &report.path {
                    Some(path) => log::info!(
                        "Found {}-hop path after {} rounds ({}): {}",
                        path.hops(),
                        report.rounds,
                        termination,
                        path
                    ),
                    None => log::info!(
                        "No path after {} rounds in {:?}: {}",
                        report.rounds,
                        report.elapsed,
                        termination
                    ),
                }
                return report;
            }
        }
    }

    /// One round. `None` means both sides advanced and the search continues.
    async fn step(
        &self,
        state: &mut SearchState,
        opts: &SearchOptions,
    ) -> Option<(Option<ArticlePath>, Termination)> {
        if state.elapsed() >= opts.timeout {
            log::debug!("Timeout after {:?}", state.elapsed());
            return Some((None, Termination::Timeout));
        }

        if state.total_len() > opts.max_depth {
            log::debug!("Depth {} exceeds {}", state.total_len(), opts.max_depth);
            return Some((None, Termination::DepthExceeded));
        }

        if state.forward_frontier() == state.backward_frontier() {
            return Some((state.met(), Termination::Met));
        }

        let forward = state.forward_frontier().to_string();
        let backward = state.backward_frontier().to_string();

        let forward_links = match self.links.get_links(&forward, opts.hard_mode).await {
            Ok(links) => links,
            Err(e) => {
                log::warn!("Link lookup for '{}' failed: {}", forward, e);
                return Some((None, Termination::LinkFetchFailed));
            }
        };
        if forward_links.contains(&backward) {
            return Some((state.joined(), Termination::DirectForward));
        }

        let backward_links = match self.links.get_links(&backward, opts.hard_mode).await {
            Ok(links) => links,
            Err(e) => {
                log::warn!("Link lookup for '{}' failed: {}", backward, e);
                return Some((None, Termination::LinkFetchFailed));
            }
        };
        if backward_links.contains(&forward) {
            return Some((state.joined(), Termination::DirectBackward));
        }

        let forward_links = prune(&forward_links);
        let backward_links = prune(&backward_links);

        if let Some(shared) = shared_title(&forward_links, &backward_links, state) {
            log::debug!("'{}' and '{}' share '{}'", forward, backward, shared);
            return Some((state.spliced(&shared), Termination::Intersection));
        }

        if forward_links.is_empty() || backward_links.is_empty() {
            log::debug!(
                "Dead end: '{}' has {} links, '{}' has {}",
                forward,
                forward_links.len(),
                backward,
                backward_links.len()
            );
            return Some((None, Termination::DeadEnd));
        }

        let forward_candidates: Vec<String> = forward_links
            .into_iter()
            .filter(|t| !state.on_forward(t))
            .collect();
        let next_forward = match self.best_hop(&forward_candidates, &backward).await {
            Ok(hop) => hop,
            Err(termination) => return Some((None, termination)),
        };

        let backward_candidates: Vec<String> = backward_links
            .into_iter()
            .filter(|t| !state.on_backward(t))
            .collect();
        let next_backward = match self.best_hop(&backward_candidates, &forward).await {
            Ok(hop) => hop,
            Err(termination) => return Some((None, termination)),
        };

        log::debug!(
            "Round {}: '{}' -> '{}', '{}' <- '{}'",
            state.rounds + 1,
            forward,
            next_forward,
            next_backward,
            backward
        );
        state.advance(next_forward, next_backward);
        None
    }

    /// Highest-scoring candidate against `toward`'s summary.
    async fn best_hop(&self, candidates: &[String], toward: &str) -> Result<String, Termination> {
        let Some(page) = self.summary(toward).await else {
            return Err(Termination::SummaryUnavailable);
        };
        if candidates.is_empty() {
            return Err(Termination::NoCandidates);
        }

        let reference = if page.summary.trim().is_empty() {
            page.title.as_str()
        } else {
            page.summary.as_str()
        };

        let ranked = self.scorer.rank(candidates, reference).await.map_err(|e| {
            log::warn!("Ranking candidates toward '{}' failed: {}", toward, e);
            Termination::ScoringFailed
        })?;

        ranked
            .into_iter()
            .next()
            .map(|best| {
                log::debug!("Best hop toward '{}': '{}' ({:.3})", toward, best.title, best.score);
                best.title
            })
            .ok_or(Termination::NoCandidates)
    }
}

/// Lexicographically smallest title linked from both frontiers that is not
/// already on either half-path.
fn shared_title(forward: &[String], backward: &[String], state: &SearchState) -> Option<String> {
    let backward: HashSet<&str> = backward.iter().map(String::as_str).collect();
    forward
        .iter()
        .filter(|t| backward.contains(t.as_str()))
        .filter(|t| !state.on_forward(t) && !state.on_backward(t))
        .min()
        .cloned()
}
