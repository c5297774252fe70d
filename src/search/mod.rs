pub mod similarity;

pub use similarity::{DEFAULT_CANDIDATE_LIMIT, ScoredTitle, SimilarityScorer, cosine_similarity};
