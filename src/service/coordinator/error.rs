//! Error types for the enrichment coordinator

use thiserror::Error;

use crate::model::SessionToken;

/// Error type for coordinator commands
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoordinatorError {
    #[error("Episode id must not be blank")]
    InvalidEpisodeId,

    #[error("No failed enrichment to retry for the current selection")]
    NothingToRetry,

    #[error("Selection {0} was superseded by a newer one")]
    Superseded(SessionToken),

    #[error("Enrichment coordinator is not running")]
    Stopped,
}
