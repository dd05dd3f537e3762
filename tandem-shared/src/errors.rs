use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Account errors
/// - E2xxx: Room errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    BadRequest,

    // Account (E1xxx)
    InvalidCredentials,
    InvalidEmail,
    InvalidUsername,
    PasswordTooWeak,
    InvalidAge,
    UsernameTaken,
    EmailAlreadyExists,
    AccountDeactivated,
    TokenExpired,
    TokenInvalid,

    // Rooms (E2xxx)
    RoomNotFound,
    RoomInactive,
    RoomFull,
    RoomStarted,
    AlreadyJoined,
    NotParticipant,
    ModeratorTooYoung,
    ScheduleNotFuture,
    RoomNotStarted,
    RatingOutOfRange,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::BadRequest => "E0006",

            // Account
            Self::InvalidCredentials => "E1001",
            Self::InvalidEmail => "E1002",
            Self::InvalidUsername => "E1003",
            Self::PasswordTooWeak => "E1004",
            Self::InvalidAge => "E1005",
            Self::UsernameTaken => "E1006",
            Self::EmailAlreadyExists => "E1007",
            Self::AccountDeactivated => "E1008",
            Self::TokenExpired => "E1009",
            Self::TokenInvalid => "E1010",

            // Rooms
            Self::RoomNotFound => "E2001",
            Self::RoomInactive => "E2002",
            Self::RoomFull => "E2003",
            Self::RoomStarted => "E2004",
            Self::AlreadyJoined => "E2005",
            Self::NotParticipant => "E2006",
            Self::ModeratorTooYoung => "E2007",
            Self::ScheduleNotFuture => "E2008",
            Self::RoomNotStarted => "E2009",
            Self::RatingOutOfRange => "E2010",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::InvalidEmail
            | Self::InvalidUsername | Self::PasswordTooWeak | Self::InvalidAge
            | Self::RatingOutOfRange => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::RoomNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::AccountDeactivated | Self::ModeratorTooYoung
            | Self::NotParticipant => StatusCode::FORBIDDEN,
            Self::UsernameTaken | Self::EmailAlreadyExists | Self::AlreadyJoined => {
                StatusCode::CONFLICT
            }
            Self::RoomInactive | Self::RoomFull | Self::RoomStarted
            | Self::ScheduleNotFuture | Self::RoomNotStarted => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Known { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
