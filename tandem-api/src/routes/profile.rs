use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tandem_shared::errors::{AppError, AppResult};
use tandem_shared::types::auth::AuthUser;
use tandem_shared::types::ApiResponse;

use crate::models::{UpdateUserProfile, User};
use crate::schema::users;
use crate::services::room_service;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_meetings: i64,
    pub total_hours: i64,
    pub total_languages: usize,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub learning_language_list: Vec<String>,
    pub stats: DashboardStats,
}

// --- GET /me ---

pub async fn get_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<ProfileResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let record: User = users::table
        .find(user.id)
        .first(&mut conn)
        .map_err(|_| AppError::not_found("user not found"))?;

    let total_meetings = room_service::user_meeting_count(&mut conn, user.id)?;
    let learning_language_list = record.learning_language_list();

    // A meeting is booked in one-hour slots.
    let stats = DashboardStats {
        total_meetings,
        total_hours: total_meetings,
        total_languages: learning_language_list.len(),
    };

    Ok(Json(ApiResponse::ok(ProfileResponse {
        user: record,
        learning_language_list,
        stats,
    })))
}

// --- PATCH /me ---

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub learning_languages: Option<Vec<String>>,
    pub interests: Option<String>,
}

pub async fn update_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let changes = UpdateUserProfile {
        first_name: req.first_name,
        last_name: req.last_name,
        country: req.country,
        learning_languages: req.learning_languages.map(|l| l.join(",")),
        interests: req.interests,
    };

    // An all-None changeset would make diesel error out instead of no-op.
    if changes.first_name.is_none()
        && changes.last_name.is_none()
        && changes.country.is_none()
        && changes.learning_languages.is_none()
        && changes.interests.is_none()
    {
        let current: User = users::table
            .find(user.id)
            .first(&mut conn)
            .map_err(|_| AppError::not_found("user not found"))?;
        return Ok(Json(ApiResponse::ok(current)));
    }

    let updated: User = diesel::update(users::table.find(user.id))
        .set(&changes)
        .get_result(&mut conn)
        .map_err(|_| AppError::not_found("user not found"))?;

    tracing::info!(user_id = %user.id, "profile updated");

    Ok(Json(ApiResponse::ok(updated)))
}
