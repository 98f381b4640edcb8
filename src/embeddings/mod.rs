// src/embeddings/mod.rs
// The external embedding function, treated per §1 as an opaque
// `embed(text) -> vector` collaborator. Grounded on
// crates/mira-server/src/embeddings/mod.rs's EmbeddingClient wrapper
// (provider selection) and crates/mira-server/src/embeddings/openai.rs's
// HTTP client shape (timeout, retry count, batch size), trimmed to a
// single HTTP-based provider since the spec does not call for
// multi-provider fallback.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::error::{AidisError, Result};

const TIMEOUT_SECS: u64 = 30;
// §7: "retried at most once with exponential backoff up to 1 second."
const RETRY_ATTEMPTS: usize = 1;

/// The embed(text) -> vector collaborator. A trait so handlers can be
/// exercised against a deterministic fake in tests without a network call.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// The dimensionality this embedder produces; used to fail fast
    /// before even calling the network (§4.5 step 3, P8).
    fn dimensions(&self) -> usize;
}

/// HTTP-based embedding client. Talks to any OpenAI-compatible embeddings
/// endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbedder {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponseRow {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingResponseRow>,
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let mut last_err = None;
        for attempt in 0..=RETRY_ATTEMPTS {
            let result = self
                .client
                .post(&self.api_url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().is_success() => {
                    match resp.json::<EmbeddingResponse>().await {
                        Ok(parsed) => {
                            return parsed
                                .data
                                .into_iter()
                                .next()
                                .map(|row| row.embedding)
                                .ok_or(AidisError::EmbeddingUnavailable);
                        }
                        Err(e) => {
                            warn!(error = %e, "embedding response body was not valid");
                            last_err = Some(AidisError::EmbeddingUnavailable);
                        }
                    }
                }
                Ok(_) => {
                    last_err = Some(AidisError::EmbeddingUnavailable);
                }
                Err(e) => {
                    // §4.5/§7: an unreachable embedding endpoint is
                    // EmbeddingUnavailable, not an internal error.
                    warn!(error = %e, "embedding endpoint unreachable");
                    last_err = Some(AidisError::EmbeddingUnavailable);
                }
            }

            if attempt < RETRY_ATTEMPTS {
                let backoff_ms = 100u64.saturating_mul(1 << attempt).min(1000);
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_err.unwrap_or(AidisError::EmbeddingUnavailable))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A deterministic embedder for tests: hashes the input into a fixed-size
/// vector so `context.store`/`context.search` can be exercised without a
/// network dependency.
#[cfg(test)]
pub struct FakeEmbedder {
    pub dimensions: usize,
}

#[cfg(test)]
#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vec = vec![0.0f32; self.dimensions];
        for (i, byte) in text.bytes().enumerate() {
            vec[i % self.dimensions] += byte as f32 / 255.0;
        }
        Ok(vec)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_embedder_reports_its_dimensions() {
        let embedder = FakeEmbedder { dimensions: 16 };
        let v = embedder.embed("hello world").await.expect("embed");
        assert_eq!(v.len(), 16);
    }

    #[tokio::test]
    async fn fake_embedder_is_deterministic() {
        let embedder = FakeEmbedder { dimensions: 8 };
        let a = embedder.embed("same input").await.expect("embed");
        let b = embedder.embed("same input").await.expect("embed");
        assert_eq!(a, b);
    }
}
