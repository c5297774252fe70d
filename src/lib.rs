pub mod config;
pub mod error;
pub mod db;
pub mod wiki;
pub mod links;
pub mod search;
pub mod embeddings;
pub mod cache;
pub mod pathfinding;
pub mod game;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{Result, WikibaconError};
pub use links::LinkStore;
pub use pathfinding::{ArticlePath, PathFinder, SearchOptions, SearchReport, Termination};
pub use search::SimilarityScorer;
