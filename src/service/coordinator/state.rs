//! Selection state machine
//!
//! Owns the current session, the token counter and the observable view. Every
//! entry point runs to completion and returns the request (if any) the caller
//! must issue. Responses are matched against the current token when consumed;
//! anything else is dropped without touching state.

use crate::model::{
    EnrichmentResult, EpisodeDetail, FailureKind, SelectionView, SessionFailure, SessionPhase,
    SessionToken,
};
use crate::retriever::RetrieverError;
use crate::service::coordinator::CoordinatorError;

/// Request the driver must issue on behalf of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchBase {
        token: SessionToken,
        episode_id: String,
    },
    RequestInsights {
        token: SessionToken,
        episode_id: String,
    },
}

impl Effect {
    pub fn token(&self) -> SessionToken {
        match self {
            Effect::FetchBase { token, .. } | Effect::RequestInsights { token, .. } => *token,
        }
    }
}

#[derive(Debug, Clone)]
struct Session {
    token: SessionToken,
    episode_id: String,
}

#[derive(Debug, Default)]
pub struct SelectionState {
    last_token: u64,
    current: Option<Session>,
    view: SelectionView,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &SelectionView {
        &self.view
    }

    /// Start a new session, superseding any previous one
    pub fn select(&mut self, episode_id: &str) -> Effect {
        if let Some(previous) = self.current.take() {
            tracing::debug!(
                token = %previous.token,
                episode_id = %previous.episode_id,
                phase = ?self.view.phase,
                "Session superseded"
            );
        }

        self.last_token += 1;
        let token = SessionToken::new(self.last_token);

        self.current = Some(Session {
            token,
            episode_id: episode_id.to_string(),
        });
        self.view = SelectionView {
            token: Some(token),
            episode_id: Some(episode_id.to_string()),
            phase: SessionPhase::LoadingBase,
            ..Default::default()
        };

        tracing::debug!(token = %token, episode_id = %episode_id, "Session started");

        Effect::FetchBase {
            token,
            episode_id: episode_id.to_string(),
        }
    }

    /// Close the view. The closed session can never match a later response.
    pub fn close(&mut self) {
        if let Some(previous) = self.current.take() {
            tracing::debug!(
                token = %previous.token,
                episode_id = %previous.episode_id,
                "Session closed"
            );
        }

        self.view = SelectionView {
            phase: SessionPhase::Closed,
            ..Default::default()
        };
    }

    pub fn on_base_fetched(
        &mut self,
        token: SessionToken,
        result: Result<EpisodeDetail, RetrieverError>,
    ) -> Option<Effect> {
        if !self.accepts(token, SessionPhase::LoadingBase) {
            tracing::debug!(token = %token, "Discarding stale base record");
            return None;
        }

        match result {
            Ok(detail) => {
                self.view.phase = SessionPhase::BaseLoaded;
                self.view.detail = Some(detail);
                tracing::debug!(token = %token, "Base record loaded");

                self.start_enrichment()
            }
            Err(e) => {
                tracing::warn!(token = %token, error = %e, "Base record fetch failed");

                self.view.phase = SessionPhase::BaseFailed;
                self.view.detail = None;
                self.view.base_error = Some(session_failure(&e));
                None
            }
        }
    }

    pub fn on_enrichment_settled(
        &mut self,
        token: SessionToken,
        outcome: Result<EnrichmentResult, RetrieverError>,
    ) {
        if !self.accepts(token, SessionPhase::EnrichmentPending) {
            tracing::debug!(token = %token, "Discarding stale insights");
            return;
        }

        match outcome {
            Ok(result) => {
                let merged = self
                    .view
                    .detail
                    .as_mut()
                    .map(|detail| detail.merge_insights(&result))
                    .unwrap_or_default();

                tracing::debug!(token = %token, merged_fields = merged, "Insights merged");
                self.view.phase = SessionPhase::EnrichmentSucceeded;
            }
            Err(e) => {
                tracing::warn!(token = %token, error = %e, "Insight generation failed");

                self.view.phase = SessionPhase::EnrichmentFailed;
                self.view.enrichment_error = Some(display_message(&e));
            }
        }
    }

    /// Re-issue enrichment after a failure without re-fetching the base record
    pub fn retry_enrichment(&mut self) -> Result<Effect, CoordinatorError> {
        if self.view.phase != SessionPhase::EnrichmentFailed {
            return Err(CoordinatorError::NothingToRetry);
        }

        self.start_enrichment().ok_or(CoordinatorError::NothingToRetry)
    }

    fn start_enrichment(&mut self) -> Option<Effect> {
        let session = self.current.as_ref()?;

        self.view.phase = SessionPhase::EnrichmentPending;
        self.view.enrichment_error = None;

        Some(Effect::RequestInsights {
            token: session.token,
            episode_id: session.episode_id.clone(),
        })
    }

    /// A response is consumed only by the current session in the phase that awaits it
    fn accepts(&self, token: SessionToken, phase: SessionPhase) -> bool {
        self.current
            .as_ref()
            .is_some_and(|session| session.token == token)
            && self.view.phase == phase
    }
}

fn session_failure(error: &RetrieverError) -> SessionFailure {
    let kind = match error {
        RetrieverError::NotFound(_) => FailureKind::NotFound,
        _ => FailureKind::Service,
    };

    SessionFailure {
        kind,
        message: display_message(error),
    }
}

fn display_message(error: &RetrieverError) -> String {
    match error {
        RetrieverError::Service { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
