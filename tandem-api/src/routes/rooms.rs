use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use tandem_shared::errors::{AppError, AppResult, ErrorCode};
use tandem_shared::middleware::{AdminUser, OptionalAuthUser};
use tandem_shared::types::auth::AuthUser;
use tandem_shared::types::{ApiResponse, Paginated, PaginationParams};

use crate::models::{MeetingRoom, RoomStatus, RoomSummary};
use crate::services::room_service::{self, CreateRoomParams, RoomFilters};
use crate::AppState;

// --- POST /rooms ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100, message = "topic is required"))]
    pub topic: String,
    #[validate(length(min = 1, max = 50, message = "language is required"))]
    pub language: String,
    #[validate(length(min = 1, max = 20, message = "level is required"))]
    pub level: String,
    pub scheduled_time: DateTime<Utc>,
    #[serde(default = "default_max_participants")]
    #[validate(range(min = 2, max = 20, message = "rooms hold between 2 and 20 participants"))]
    pub max_participants: i32,
    #[serde(default = "default_duration")]
    #[validate(range(min = 15, max = 240, message = "duration must be between 15 and 240 minutes"))]
    pub duration_minutes: i32,
}

fn default_max_participants() -> i32 { 6 }
fn default_duration() -> i32 { 60 }

pub async fn create_room(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoomRequest>,
) -> AppResult<Json<ApiResponse<MeetingRoom>>> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let room = room_service::create_room(
        &mut conn,
        user.id,
        CreateRoomParams {
            title: req.title,
            description: req.description,
            topic: req.topic,
            language: req.language,
            level: req.level,
            scheduled_time: req.scheduled_time,
            max_participants: req.max_participants,
            duration_minutes: req.duration_minutes,
        },
    )?;

    tracing::info!(room_id = %room.id, moderator_id = %user.id, topic = %room.topic, "room created");

    Ok(Json(ApiResponse::ok_with_message(room, "room created")))
}

// --- GET /rooms ---

pub async fn list_rooms(
    viewer: OptionalAuthUser,
    State(state): State<Arc<AppState>>,
    Query(filters): Query<RoomFilters>,
    Query(pagination): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<RoomSummary>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let viewer_id = viewer.0.map(|u| u.id);
    let (rooms, total) = room_service::upcoming_rooms(&mut conn, viewer_id, &filters, &pagination)?;

    let now = Utc::now();
    let summaries = rooms.iter().map(|r| RoomSummary::from_room(r, now)).collect();

    Ok(Json(ApiResponse::ok(Paginated::new(summaries, total, &pagination))))
}

// --- GET /rooms/popular-topics ---

#[derive(Debug, Deserialize)]
pub struct PopularTopicsQuery {
    #[serde(default = "default_topic_limit")]
    pub limit: usize,
}

fn default_topic_limit() -> usize { 10 }

pub async fn popular_topics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PopularTopicsQuery>,
) -> Json<ApiResponse<Vec<String>>> {
    let topics = state
        .db
        .get()
        .map_err(|e| AppError::internal(e.to_string()))
        .and_then(|mut conn| room_service::popular_topics(&mut conn, query.limit));

    // Popularity is decorative; serve the static list rather than a 500.
    let topics = match topics {
        Ok(topics) => topics,
        Err(e) => {
            tracing::warn!(error = %e, "topic aggregation failed, serving fallback list");
            room_service::FALLBACK_TOPICS
                .iter()
                .take(query.limit)
                .map(|t| t.to_string())
                .collect()
        }
    };

    Json(ApiResponse::ok(topics))
}

// --- GET /rooms/:id ---

#[derive(Debug, Serialize)]
pub struct ParticipantSummary {
    pub user_id: Uuid,
    pub username: String,
    pub first_name: String,
    pub country: String,
    pub native_language: String,
    pub joined_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct RoomDetailResponse {
    #[serde(flatten)]
    pub room: MeetingRoom,
    pub status: RoomStatus,
    pub participants: Vec<ParticipantSummary>,
}

pub async fn room_detail(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RoomDetailResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let room = room_service::find_room(&mut conn, room_id)?;
    let participants = room_service::find_participants_by_room(&mut conn, room_id)?
        .into_iter()
        .map(|(p, u)| ParticipantSummary {
            user_id: u.id,
            username: u.username,
            first_name: u.first_name,
            country: u.country,
            native_language: u.native_language,
            joined_at: p.joined_at,
            rating: p.rating,
        })
        .collect();

    let status = room.status(Utc::now());

    Ok(Json(ApiResponse::ok(RoomDetailResponse { room, status, participants })))
}

// --- POST /rooms/:id/join ---

pub async fn join_room(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RoomSummary>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let room = room_service::join_room(&mut conn, user.id, room_id)?;

    tracing::info!(
        room_id = %room.id,
        user_id = %user.id,
        participants = room.current_participants,
        "user joined room"
    );

    Ok(Json(ApiResponse::ok_with_message(
        RoomSummary::from_room(&room, Utc::now()),
        "you have joined the meeting",
    )))
}

// --- POST /rooms/:id/leave ---

#[derive(Debug, Serialize)]
pub struct LeftRoomResponse {
    pub left: bool,
}

pub async fn leave_room(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<LeftRoomResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    room_service::leave_room(&mut conn, user.id, room_id)?;

    tracing::info!(room_id = %room_id, user_id = %user.id, "user left room");

    Ok(Json(ApiResponse::ok(LeftRoomResponse { left: true })))
}

// --- POST /rooms/:id/rating ---

#[derive(Debug, Deserialize)]
pub struct RateRoomRequest {
    pub rating: i32,
}

#[derive(Debug, Serialize)]
pub struct RatedResponse {
    pub rated: bool,
}

pub async fn rate_room(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
    Json(req): Json<RateRoomRequest>,
) -> AppResult<Json<ApiResponse<RatedResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    room_service::rate_room(&mut conn, user.id, room_id, req.rating)?;

    Ok(Json(ApiResponse::ok(RatedResponse { rated: true })))
}

// --- POST /rooms/:id/deactivate ---

pub async fn deactivate_room(
    admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MeetingRoom>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let room = room_service::deactivate_room(&mut conn, room_id)?;

    tracing::info!(room_id = %room.id, admin_id = %admin.0.id, "room deactivated");

    Ok(Json(ApiResponse::ok(room)))
}

// --- GET /my/rooms ---

pub async fn my_rooms(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<RoomSummary>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rooms = room_service::user_rooms(&mut conn, user.id)?;
    let now = Utc::now();
    let summaries = rooms.iter().map(|r| RoomSummary::from_room(r, now)).collect();

    Ok(Json(ApiResponse::ok(summaries)))
}
