//! REST API endpoints for the selected episode
//!
//! The selection is a single server-side session owned by the coordinator.
//! Mutating endpoints answer 202 with the view as it stands once the
//! transition has been applied; network results arrive later.

use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::api::ApiError;
use crate::service::EnrichmentCoordinator;

/// Select an episode and start loading it
#[utoipa::path(
    put,
    path = "/v1/selection/{id}",
    params(
        ("id" = String, Path, description = "Episode ID")
    ),
    responses(
        (status = 202, description = "Selection accepted, base record loading",
            body = crate::model::SelectionView),
        (status = 400, description = "Blank episode ID", body = crate::api::ErrorResponse),
        (status = 409, description = "Superseded by a newer selection",
            body = crate::api::ErrorResponse),
        (status = 503, description = "Coordinator stopped", body = crate::api::ErrorResponse)
    ),
    tag = "selection"
)]
#[put("/v1/selection/{id}")]
pub async fn select_episode(
    coordinator: web::Data<EnrichmentCoordinator>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let episode_id = path.into_inner();
    let token = coordinator.select(&episode_id).await?;
    let view = coordinator.view_of(token)?;

    Ok(HttpResponse::Accepted().json(view))
}

/// Current selection view
#[utoipa::path(
    get,
    path = "/v1/selection",
    responses(
        (status = 200, description = "Current view", body = crate::model::SelectionView)
    ),
    tag = "selection"
)]
#[get("/v1/selection")]
pub async fn get_selection(coordinator: web::Data<EnrichmentCoordinator>) -> HttpResponse {
    HttpResponse::Ok().json(coordinator.view())
}

/// Close the detail view
#[utoipa::path(
    delete,
    path = "/v1/selection",
    responses(
        (status = 204, description = "Selection closed"),
        (status = 503, description = "Coordinator stopped", body = crate::api::ErrorResponse)
    ),
    tag = "selection"
)]
#[delete("/v1/selection")]
pub async fn close_selection(
    coordinator: web::Data<EnrichmentCoordinator>,
) -> Result<HttpResponse, ApiError> {
    coordinator.close().await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Retry insight generation after a failure
#[utoipa::path(
    post,
    path = "/v1/selection/retry",
    responses(
        (status = 202, description = "Enrichment requested again",
            body = crate::model::SelectionView),
        (status = 409, description = "Nothing to retry, or superseded by a newer selection",
            body = crate::api::ErrorResponse),
        (status = 503, description = "Coordinator stopped", body = crate::api::ErrorResponse)
    ),
    tag = "selection"
)]
#[post("/v1/selection/retry")]
pub async fn retry_enrichment(
    coordinator: web::Data<EnrichmentCoordinator>,
) -> Result<HttpResponse, ApiError> {
    let token = coordinator.retry_enrichment().await?;
    let view = coordinator.view_of(token)?;

    Ok(HttpResponse::Accepted().json(view))
}

/// Configure selection routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(retry_enrichment)
        .service(select_episode)
        .service(get_selection)
        .service(close_selection);
}
