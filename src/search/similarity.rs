use crate::embeddings::Embedder;
use crate::error::{Result, WikibaconError};
use serde::Serialize;
use std::sync::Arc;

/// Candidates beyond this many are ignored when ranking.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 50;

/// A candidate title with its cosine similarity to the reference text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTitle {
    pub title: String,
    pub score: f32,
}

/// Ranks candidate titles by semantic closeness to a reference text.
pub struct SimilarityScorer<E: ?Sized> {
    embedder: Arc<E>,
    candidate_limit: usize,
}

impl<E: Embedder + ?Sized> SimilarityScorer<E> {
    pub fn new(embedder: Arc<E>, candidate_limit: usize) -> Self {
        Self {
            embedder,
            candidate_limit: candidate_limit.max(1),
        }
    }

    /// Rank the first `candidate_limit` candidates against `reference_text`,
    /// best first. Equal scores keep input order. An empty candidate list
    /// returns an empty ranking without calling the model.
    pub async fn rank(&self, candidates: &[String], reference_text: &str) -> Result<Vec<ScoredTitle>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let considered = &candidates[..candidates.len().min(self.candidate_limit)];

        let reference = self.embedder.embed(reference_text).await?;
        let vectors = self.embedder.embed_batch(considered.to_vec()).await?;
        if vectors.len() != considered.len() {
            return Err(WikibaconError::Embedding(format!(
                "Expected {} candidate embeddings, got {}",
                considered.len(),
                vectors.len()
            )));
        }

        let mut ranked = considered
            .iter()
            .zip(vectors.iter())
            .map(|(title, vector)| {
                Ok(ScoredTitle {
                    title: title.clone(),
                    score: cosine_similarity(&reference, vector)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // sort_by is stable, so ties stay in input order
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(ranked)
    }
}

/// Compute cosine similarity between two vectors
///
/// # Returns
///
/// Score in [-1.0, 1.0], or 0.0 if either vector has zero magnitude.
/// Vectors of different lengths are an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(WikibaconError::Embedding(format!(
            "Vectors must have same length for cosine similarity ({} vs {})",
            a.len(),
            b.len()
        )));
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (mag_a * mag_b))
}
