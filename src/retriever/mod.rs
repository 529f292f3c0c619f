//! Request/response collaborators for the readmissions backend
//!
//! Retrievers are stateless: no retry, no caching, no deduplication. They know
//! nothing about selection sessions; staleness is handled by the coordinator.

mod episode;
mod insights;
pub mod wire;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use url::Url;

use crate::model::{EnrichmentResult, EpisodeDetail, EpisodeSummary, RiskLevel};

pub use episode::EpisodeClient;
pub use insights::InsightClient;

#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    #[error("Episode not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Backend error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Filter for the episode listing. `None` means no filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeFilter {
    pub unit: Option<String>,
    pub risk_level: Option<RiskLevel>,
}

/// Source of base episode records
#[async_trait]
pub trait EpisodeRetriever: Send + Sync {
    /// Fetch one full record
    async fn get_episode(&self, episode_id: &str) -> Result<EpisodeDetail, RetrieverError>;

    /// Fetch the ordered listing matching the filter
    async fn list_episodes(
        &self,
        filter: &EpisodeFilter,
    ) -> Result<Vec<EpisodeSummary>, RetrieverError>;
}

/// Generator of narrative insights for an episode
#[async_trait]
pub trait InsightRequester: Send + Sync {
    async fn request_insights(&self, episode_id: &str) -> Result<EnrichmentResult, RetrieverError>;
}

/// Build `{base}/{prefix}/{id}` with the id percent-encoded
fn episode_url(base: &Url, prefix: &str, episode_id: &str) -> Result<Url, RetrieverError> {
    let path = format!(
        "{}/{}",
        prefix.trim_matches('/'),
        urlencoding::encode(episode_id)
    );
    join(base, &path)
}

fn join(base: &Url, path: &str) -> Result<Url, RetrieverError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
        .map_err(|e| RetrieverError::ParseError(format!("Invalid request URL {}: {}", path, e)))
}

/// Turn a non-success response into an error, keeping the backend's message
async fn error_from_response(response: Response, episode_id: &str) -> RetrieverError {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return RetrieverError::NotFound(episode_id.to_string());
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<wire::ErrorPayload>(&body)
        .map(|payload| payload.message())
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body
            }
        });

    RetrieverError::Service {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_url_encodes_id() {
        let base = Url::parse("http://localhost:8000").unwrap();
        let url = episode_url(&base, "/readmissions", "EP 1/2").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/readmissions/EP%201%2F2");
    }

    #[test]
    fn test_join_keeps_base_path() {
        let base = Url::parse("http://gateway/analytics").unwrap();
        let url = join(&base, "/llm/generate-all/EP1").unwrap();
        assert_eq!(url.as_str(), "http://gateway/analytics/llm/generate-all/EP1");
    }
}
