//! OpenAPI specification endpoints

use actix_web::{HttpResponse, Responder, get};
use utoipa::OpenApi;

use crate::api::{episode, health, selection};
use crate::model::{
    EnrichedText, EpisodeDetail, EpisodeSummary, FailureKind, Provenance, RiskLevel,
    SelectionView, SessionFailure, SessionPhase, SessionToken,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Episode Lens",
        description = "Episode detail service with insight enrichment for the readmissions dashboard"
    ),
    paths(
        episode::list_episodes,
        episode::list_units,
        selection::select_episode,
        selection::get_selection,
        selection::close_selection,
        selection::retry_enrichment,
        health::liveness,
        health::readiness,
    ),
    components(schemas(
        EpisodeSummary,
        EpisodeDetail,
        EnrichedText,
        Provenance,
        RiskLevel,
        SelectionView,
        SessionToken,
        SessionPhase,
        SessionFailure,
        FailureKind,
        crate::api::ErrorResponse,
        health::HealthStatus,
        health::ReadinessStatus,
        health::DependencyHealth,
    )),
    tags(
        (name = "episodes", description = "Episode listing and filters"),
        (name = "selection", description = "Selected episode with generated insights"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
#[get("/openapi.json")]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Serve OpenAPI YAML specification
#[get("/openapi.yaml")]
pub async fn openapi_yaml() -> HttpResponse {
    match ApiDoc::openapi().to_yaml() {
        Ok(yaml) => HttpResponse::Ok().content_type("text/yaml").body(yaml),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render OpenAPI YAML");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Configure OpenAPI routes
pub fn configure(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(openapi_json).service(openapi_yaml);
}
