use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

use crate::model::EpisodeDetail;

/// Identifies one selection. Strictly increasing across selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    LoadingBase,
    BaseLoaded,
    EnrichmentPending,
    EnrichmentSucceeded,
    EnrichmentFailed,
    BaseFailed,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Service,
}

/// Base fetch failure kept for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Read-only view of the current selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct SelectionView {
    pub token: Option<SessionToken>,
    pub episode_id: Option<String>,
    pub phase: SessionPhase,
    pub detail: Option<EpisodeDetail>,
    pub base_error: Option<SessionFailure>,
    pub enrichment_error: Option<String>,
}
