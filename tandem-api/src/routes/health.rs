use axum::Json;
use tandem_shared::types::api::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("tandem-api", env!("CARGO_PKG_VERSION")))
}
