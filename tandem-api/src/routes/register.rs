use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

use tandem_shared::errors::{AppError, AppResult, ErrorCode};
use tandem_shared::types::auth::{AccessToken, UserRole};
use tandem_shared::types::ApiResponse;

use crate::models::{NewUser, User};
use crate::schema::users;
use crate::services::{account_service, token_service};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Form field, so it arrives as a string and is validated as one.
    pub age: String,
    pub country: String,
    pub native_language: String,
    #[serde(default)]
    pub learning_languages: Vec<String>,
    #[serde(default)]
    pub interests: Option<String>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<AccessToken>>> {
    // Validators run in a fixed order; the first failure is the one reported.
    account_service::validate_email(&req.email)?;
    account_service::validate_username(&req.username)?;
    account_service::validate_password(&req.password)?;
    let age = account_service::validate_age(&req.age)?;

    let password_hash = account_service::hash_password(&req.password)?;
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let username_taken: bool = users::table
        .filter(users::username.eq(&req.username))
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);

    if username_taken {
        return Err(AppError::new(ErrorCode::UsernameTaken, "username is already taken"));
    }

    let email_taken: bool = users::table
        .filter(users::email.eq(&req.email.to_lowercase()))
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);

    if email_taken {
        return Err(AppError::new(ErrorCode::EmailAlreadyExists, "email already registered"));
    }

    let learning_languages = if req.learning_languages.is_empty() {
        None
    } else {
        Some(req.learning_languages.join(","))
    };

    let new_user = NewUser {
        username: req.username,
        email: req.email.to_lowercase(),
        password_hash,
        first_name: req.first_name,
        last_name: req.last_name,
        age,
        country: req.country,
        native_language: req.native_language,
        learning_languages,
        interests: req.interests,
    };

    let user: User = diesel::insert_into(users::table)
        .values(&new_user)
        .get_result(&mut conn)?;

    let token = token_service::create_access_token(
        user.id,
        UserRole::User,
        &state.config.jwt_secret,
        state.config.jwt_access_ttl,
    )?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");

    Ok(Json(ApiResponse::ok_with_message(token, "registration successful")))
}
