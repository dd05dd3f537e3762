use axum::extract::{Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tandem_shared::errors::{AppError, AppResult};
use tandem_shared::types::ApiResponse;

use crate::schema::users;
use crate::services::account_service;
use crate::AppState;

// --- GET /auth/check-username ---

#[derive(Debug, Deserialize)]
pub struct CheckUsernameQuery {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

pub async fn check_username(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CheckUsernameQuery>,
) -> AppResult<Json<ApiResponse<AvailabilityResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let taken: bool = users::table
        .filter(users::username.eq(&query.username))
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);

    Ok(Json(ApiResponse::ok(AvailabilityResponse { available: !taken })))
}

// --- GET /auth/check-email ---

#[derive(Debug, Deserialize)]
pub struct CheckEmailQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct EmailAvailabilityResponse {
    pub available: bool,
    pub valid: bool,
}

pub async fn check_email(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CheckEmailQuery>,
) -> AppResult<Json<ApiResponse<EmailAvailabilityResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let taken: bool = users::table
        .filter(users::email.eq(query.email.to_lowercase()))
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);

    let valid = account_service::validate_email(&query.email).is_ok();

    Ok(Json(ApiResponse::ok(EmailAvailabilityResponse {
        available: !taken,
        valid,
    })))
}
