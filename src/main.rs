use actix_web::{App, HttpServer, web};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;
mod model;
mod retriever;
mod service;

use app::AppState;
use model::Config;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr();

    let state = AppState::new(&config).map_err(|e| std::io::Error::other(e.to_string()))?;

    let episode_client = web::Data::from(state.episode_client);
    let listing = web::Data::from(state.listing);
    let coordinator = web::Data::new(state.coordinator);

    tracing::info!("Starting Episode Lens server on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(episode_client.clone())
            .app_data(listing.clone())
            .app_data(coordinator.clone())
            .configure(api::episode::configure)
            .configure(api::selection::configure)
            .configure(api::health::configure)
            .configure(api::openapi::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
