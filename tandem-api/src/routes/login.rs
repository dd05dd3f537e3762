use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use std::sync::Arc;

use tandem_shared::errors::{AppError, AppResult, ErrorCode};
use tandem_shared::types::auth::{AccessToken, UserRole};
use tandem_shared::types::ApiResponse;

use crate::models::User;
use crate::schema::users;
use crate::services::{account_service, token_service};
use crate::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct LoginRequest {
    /// Username or email address.
    pub identifier: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AccessToken>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // Username lookup first, email as fallback. The failure message never
    // says which of identifier/password was wrong.
    let invalid = || AppError::new(ErrorCode::InvalidCredentials, "invalid username or password");

    let user: User = users::table
        .filter(users::username.eq(&req.identifier))
        .first(&mut conn)
        .or_else(|_| {
            users::table
                .filter(users::email.eq(req.identifier.to_lowercase()))
                .first(&mut conn)
        })
        .map_err(|_| invalid())?;

    let valid = account_service::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AppError::new(ErrorCode::AccountDeactivated, "account is deactivated"));
    }

    diesel::update(users::table.find(user.id))
        .set(users::last_login.eq(chrono::Utc::now()))
        .execute(&mut conn)?;

    let role = user.role.parse::<UserRole>().unwrap_or(UserRole::User);
    let token = token_service::create_access_token(
        user.id,
        role,
        &state.config.jwt_secret,
        state.config.jwt_access_ttl,
    )?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(ApiResponse::ok(token)))
}
