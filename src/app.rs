//! Application state and service initialization
//!
//! Builds the shared HTTP client, the backend collaborators and the
//! coordinator, and hands them to the Actix-web handlers.

use std::sync::Arc;

use crate::model::Config;
use crate::retriever::{EpisodeClient, InsightClient};
use crate::service::{EnrichmentCoordinator, ListingService};

/// Application state containing all services
pub struct AppState {
    /// Base record client, also used for readiness checks
    pub episode_client: Arc<EpisodeClient>,
    /// Owner of the single active selection
    pub coordinator: EnrichmentCoordinator,
    /// Last-response-wins episode listing
    pub listing: Arc<ListingService>,
}

impl AppState {
    /// Build application state. Must run inside a tokio runtime.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.backend.request_timeout)
            .user_agent(concat!("episode-lens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::HttpClient(e.to_string()))?;

        let base_url = config.backend.base_url.clone();

        let episode_client = Arc::new(EpisodeClient::new(http.clone(), base_url.clone()));
        let insight_client = Arc::new(InsightClient::new(http, base_url));

        let coordinator = EnrichmentCoordinator::spawn(episode_client.clone(), insight_client);
        let listing = Arc::new(ListingService::new(episode_client.clone()));

        tracing::info!(
            backend_url = %config.backend.base_url,
            timeout_secs = config.backend.request_timeout.as_secs(),
            "Services initialized"
        );

        Ok(Self {
            episode_client,
            coordinator,
            listing,
        })
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// HTTP client could not be built
    #[error("HTTP client initialization failed: {0}")]
    HttpClient(String),
}
