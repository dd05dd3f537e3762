use axum::{
    routing::{get, post},
    Router,
};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tandem_shared::middleware::init_tracing("tandem-api");

    let config = AppConfig::load()?;
    let port = config.port;

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let state = Arc::new(AppState { db, config });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/register", post(routes::register::register))
        .route("/auth/login", post(routes::login::login))
        .route("/auth/check-username", get(routes::availability::check_username))
        .route("/auth/check-email", get(routes::availability::check_email))
        .route("/me", get(routes::profile::get_profile).patch(routes::profile::update_profile))
        .route("/rooms", get(routes::rooms::list_rooms).post(routes::rooms::create_room))
        .route("/rooms/popular-topics", get(routes::rooms::popular_topics))
        .route("/rooms/:id", get(routes::rooms::room_detail))
        .route("/rooms/:id/join", post(routes::rooms::join_room))
        .route("/rooms/:id/leave", post(routes::rooms::leave_room))
        .route("/rooms/:id/rating", post(routes::rooms::rate_room))
        .route("/rooms/:id/deactivate", post(routes::rooms::deactivate_room))
        .route("/my/rooms", get(routes::rooms::my_rooms))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "tandem-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
