//! Insight generation client
//!
//! Asks the backend to generate the narrative summary, risk explanation and
//! recommendations for an episode in one call.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::wire::InsightsPayload;
use super::{InsightRequester, RetrieverError, episode_url, error_from_response};
use crate::model::EnrichmentResult;

/// Client for `/llm/generate-all`
pub struct InsightClient {
    client: Client,
    base_url: Url,
}

impl InsightClient {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl InsightRequester for InsightClient {
    async fn request_insights(&self, episode_id: &str) -> Result<EnrichmentResult, RetrieverError> {
        let url = episode_url(&self.base_url, "llm/generate-all", episode_id)?;

        tracing::debug!(episode_id = %episode_id, url = %url, "Requesting insights");

        let start_time = std::time::Instant::now();
        let response = self.client.post(url).send().await?;

        if !response.status().is_success() {
            let err = error_from_response(response, episode_id).await;
            tracing::warn!(
                episode_id = %episode_id,
                elapsed_ms = start_time.elapsed().as_millis(),
                error = %err,
                "Insight generation failed"
            );
            return Err(err);
        }

        let payload: InsightsPayload = response.json().await.map_err(|e| {
            RetrieverError::ParseError(format!("Failed to deserialize insights: {}", e))
        })?;

        let result = payload.into_result(episode_id);

        tracing::info!(
            episode_id = %episode_id,
            elapsed_ms = start_time.elapsed().as_millis(),
            fields = result.field_count(),
            "Insights generated"
        );

        Ok(result)
    }
}
