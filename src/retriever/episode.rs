//! Readmissions backend client for base episode records

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::wire::{EpisodePayload, EpisodeRow};
use super::{
    EpisodeFilter, EpisodeRetriever, RetrieverError, episode_url, error_from_response, join,
};
use crate::model::{EpisodeDetail, EpisodeSummary};

/// Client for `/readmissions` endpoints
pub struct EpisodeClient {
    client: Client,
    base_url: Url,
}

impl EpisodeClient {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Check that the backend answers its health endpoint
    pub async fn health(&self) -> Result<(), RetrieverError> {
        let url = join(&self.base_url, "health")?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "health").await);
        }

        Ok(())
    }
}

#[async_trait]
impl EpisodeRetriever for EpisodeClient {
    async fn get_episode(&self, episode_id: &str) -> Result<EpisodeDetail, RetrieverError> {
        let url = episode_url(&self.base_url, "readmissions", episode_id)?;

        tracing::debug!(episode_id = %episode_id, url = %url, "Fetching episode");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, episode_id).await);
        }

        let payload: EpisodePayload = response.json().await.map_err(|e| {
            RetrieverError::ParseError(format!("Failed to deserialize episode: {}", e))
        })?;

        let detail = payload.into_detail()?;

        tracing::debug!(
            episode_id = %detail.episode.id,
            unit = %detail.episode.unit,
            has_summary = detail.narrative_summary.is_some(),
            "Fetched episode"
        );

        Ok(detail)
    }

    async fn list_episodes(
        &self,
        filter: &EpisodeFilter,
    ) -> Result<Vec<EpisodeSummary>, RetrieverError> {
        let url = join(&self.base_url, "readmissions/list")?;

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(unit) = &filter.unit {
            params.push(("unit", unit.clone()));
        }
        if let Some(level) = filter.risk_level {
            params.push(("risk_level", level.as_str().to_string()));
        }

        tracing::debug!(
            url = %url,
            unit = ?filter.unit,
            risk_level = ?filter.risk_level,
            "Listing episodes"
        );

        let response = self.client.get(url).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "list").await);
        }

        let rows: Vec<EpisodeRow> = response.json().await.map_err(|e| {
            RetrieverError::ParseError(format!("Failed to deserialize episode list: {}", e))
        })?;

        let episodes = rows
            .into_iter()
            .map(EpisodeRow::into_summary)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = episodes.len(), "Listed episodes");

        Ok(episodes)
    }
}
