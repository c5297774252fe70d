use crate::cache::EmbeddingCache;
use crate::embeddings::Embedder;
use crate::error::{Result, WikibaconError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// OpenAI caps `input` at 2048 entries per request
const MAX_BATCH_SIZE: usize = 2048;

/// Retries per request on 429/5xx
const MAX_RETRIES: usize = 3;

/// First backoff delay; doubles on every retry
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Request structure for OpenAI embeddings API
#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

/// Response structure from OpenAI embeddings API
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embeddings client for OpenAI-compatible `/embeddings` endpoints
///
/// Batches requests, retries every request on rate limits and server errors,
/// and optionally keeps an LRU cache of text -> vector so repeated titles and
/// summaries are embedded once per process.
pub struct OpenAIEmbedder {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    batch_size: usize,
    dimensions: usize,
    cache: Option<Arc<EmbeddingCache>>,
}

impl OpenAIEmbedder {
    /// Create a new embedder
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL, e.g. `https://api.openai.com/v1`
    /// * `api_key` - Bearer token
    /// * `model` - Model name (e.g., "text-embedding-3-small")
    /// * `batch_size` - Maximum texts per request (capped at 2048)
    /// * `dimensions` - Expected vector length
    pub fn new(
        api_base: String,
        api_key: String,
        model: String,
        batch_size: usize,
        dimensions: usize,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WikibaconError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
            dimensions,
            cache: None,
        })
    }

    /// Attach an LRU cache consulted before every API call
    pub fn with_cache(mut self, cache: Arc<EmbeddingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// One API request for `texts`
    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            // Only the text-embedding-3 family accepts a dimensions override
            dimensions: self
                .model
                .starts_with("text-embedding-3")
                .then_some(self.dimensions),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| WikibaconError::Embedding(format!("Network error: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(WikibaconError::Embedding(format!(
                "Embeddings API error {}: {}",
                status.as_u16(),
                body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| WikibaconError::Embedding(format!("Failed to parse response: {}", e)))?;

        if result.data.len() != texts.len() {
            return Err(WikibaconError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                result.data.len()
            )));
        }

        let embeddings: Vec<Vec<f32>> = result.data.into_iter().map(|d| d.embedding).collect();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(WikibaconError::Embedding(format!(
                "Unexpected embedding dimension: expected {}, got {}",
                self.dimensions,
                bad.len()
            )));
        }

        Ok(embeddings)
    }

    /// Request with exponential backoff on retryable errors
    async fn request_with_retry(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = std::time::Instant::now();
        let embeddings = with_backoff(MAX_RETRIES, INITIAL_BACKOFF, || self.request(texts)).await?;
        log::debug!("Embedding API call for {} texts took {:?}", texts.len(), start.elapsed());
        Ok(embeddings)
    }
}

/// Run `op`, retrying retryable failures up to `max_retries` times with a
/// doubling delay.
async fn with_backoff<T, F, Fut>(max_retries: usize, initial_delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    let mut delay = initial_delay;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_retries && is_retryable(&e) => {
                log::warn!("Retry {}/{} after error: {}", attempt + 1, max_retries, e);
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Rate limits and server-side failures are worth another attempt
fn is_retryable(err: &WikibaconError) -> bool {
    let msg = err.to_string();
    ["error 429", "error 500", "error 502", "error 503", "error 504"]
        .iter()
        .any(|code| msg.contains(code))
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(text) {
                log::debug!("Embedding cache hit for: {}", text);
                return Ok(cached);
            }
        }

        let embedding = self
            .request_with_retry(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| WikibaconError::Embedding("Empty response from embeddings API".to_string()))?;

        if let Some(cache) = &self.cache {
            cache.put(text.to_string(), embedding.clone());
        }

        Ok(embedding)
    }

    /// Cached texts are served locally; the rest go out in `batch_size` requests.
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let mut results: Vec<Option<Vec<f32>>> = texts
            .iter()
            .map(|t| self.cache.as_ref().and_then(|c| c.get(t)))
            .collect();

        let missing: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_none())
            .map(|(i, _)| i)
            .collect();

        for chunk in missing.chunks(self.batch_size) {
            let inputs: Vec<String> = chunk.iter().map(|&i| texts[i].clone()).collect();
            let embeddings = self.request_with_retry(&inputs).await?;
            for (&i, embedding) in chunk.iter().zip(embeddings) {
                if let Some(cache) = &self.cache {
                    cache.put(texts[i].clone(), embedding.clone());
                }
                results[i] = Some(embedding);
            }
        }

        results
            .into_iter()
            .map(|r| r.ok_or_else(|| WikibaconError::Embedding("Missing embedding in batch".to_string())))
            .collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
