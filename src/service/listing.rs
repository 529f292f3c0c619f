//! Episode listing with filters
//!
//! Each filter change is a fresh backend request and the latest response
//! replaces the held listing. No caching across filters.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::model::{EpisodeSummary, RiskLevel};
use crate::retriever::{EpisodeFilter, EpisodeRetriever, RetrieverError};

/// Filter value meaning "no filter"
const ALL: &str = "all";

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Retriever error: {0}")]
    RetrieverError(#[from] RetrieverError),
}

/// Build a filter from raw query values. Blank values and `All` are dropped.
pub fn parse_filter(
    unit: Option<&str>,
    risk_level: Option<&str>,
) -> Result<EpisodeFilter, ListingError> {
    let unit = unit
        .map(str::trim)
        .filter(|u| !u.is_empty() && !u.eq_ignore_ascii_case(ALL))
        .map(str::to_string);

    let risk_level = risk_level
        .map(str::trim)
        .filter(|r| !r.is_empty() && !r.eq_ignore_ascii_case(ALL))
        .map(|r| r.parse::<RiskLevel>())
        .transpose()
        .map_err(ListingError::InvalidFilter)?;

    Ok(EpisodeFilter { unit, risk_level })
}

#[derive(Debug, Clone)]
struct Listing {
    filter: EpisodeFilter,
    episodes: Vec<EpisodeSummary>,
}

/// Holds the most recently received listing
pub struct ListingService {
    retriever: Arc<dyn EpisodeRetriever>,
    latest: RwLock<Option<Listing>>,
}

impl ListingService {
    pub fn new(retriever: Arc<dyn EpisodeRetriever>) -> Self {
        Self {
            retriever,
            latest: RwLock::new(None),
        }
    }

    /// Fetch the listing for a filter and make it the current one
    pub async fn refresh(
        &self,
        filter: EpisodeFilter,
    ) -> Result<Vec<EpisodeSummary>, ListingError> {
        let episodes = self.retriever.list_episodes(&filter).await?;

        tracing::debug!(
            unit = ?filter.unit,
            risk_level = ?filter.risk_level,
            count = episodes.len(),
            "Listing replaced"
        );

        *self.latest.write().await = Some(Listing {
            filter,
            episodes: episodes.clone(),
        });

        Ok(episodes)
    }

    /// Filter of the listing currently held, if any
    pub async fn current_filter(&self) -> Option<EpisodeFilter> {
        self.latest.read().await.as_ref().map(|l| l.filter.clone())
    }

    /// Distinct units of the current listing in first-seen order
    pub async fn units(&self) -> Vec<String> {
        let latest = self.latest.read().await;
        let mut units: Vec<String> = Vec::new();

        for episode in latest.iter().flat_map(|l| l.episodes.iter()) {
            if !units.contains(&episode.unit) {
                units.push(episode.unit.clone());
            }
        }

        units
    }
}
