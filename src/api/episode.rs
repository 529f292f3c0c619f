//! REST API endpoints for the episode listing

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::ApiError;
use crate::service::ListingService;
use crate::service::listing::parse_filter;

/// Query parameters for listing episodes
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListEpisodesParams {
    /// Care unit, or `All` for no filter
    pub unit: Option<String>,
    /// Risk level (Low, Medium, High), or `All` for no filter
    pub risk_level: Option<String>,
}

/// List episodes matching the filters
///
/// Every call hits the backend; the response replaces the held listing.
#[utoipa::path(
    get,
    path = "/v1/episodes",
    params(ListEpisodesParams),
    responses(
        (status = 200, description = "Episodes retrieved successfully",
            body = Vec<crate::model::EpisodeSummary>),
        (status = 400, description = "Invalid filter", body = crate::api::ErrorResponse),
        (status = 502, description = "Backend error", body = crate::api::ErrorResponse)
    ),
    tag = "episodes"
)]
#[get("/v1/episodes")]
pub async fn list_episodes(
    listing: web::Data<ListingService>,
    query: web::Query<ListEpisodesParams>,
) -> Result<HttpResponse, ApiError> {
    let filter = parse_filter(query.unit.as_deref(), query.risk_level.as_deref())?;
    let episodes = listing.refresh(filter).await?;

    Ok(HttpResponse::Ok().json(episodes))
}

/// Distinct care units of the latest listing
#[utoipa::path(
    get,
    path = "/v1/episodes/units",
    responses(
        (status = 200, description = "Units in first-seen order", body = Vec<String>)
    ),
    tag = "episodes"
)]
#[get("/v1/episodes/units")]
pub async fn list_units(listing: web::Data<ListingService>) -> HttpResponse {
    HttpResponse::Ok().json(listing.units().await)
}

/// Configure episode listing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_units).service(list_episodes);
}
