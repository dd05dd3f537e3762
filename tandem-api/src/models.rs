use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{meeting_rooms, room_participants, users};

// --- Users ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub country: String,
    pub native_language: String,
    pub learning_languages: Option<String>,
    pub interests: Option<String>,
    pub is_active: bool,
    pub role: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Languages the user is learning, split out of the comma-joined column.
    pub fn learning_language_list(&self) -> Vec<String> {
        self.learning_languages
            .as_deref()
            .unwrap_or("")
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| s.trim().to_string())
            .collect()
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub country: String,
    pub native_language: String,
    pub learning_languages: Option<String>,
    pub interests: Option<String>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub struct UpdateUserProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub learning_languages: Option<String>,
    pub interests: Option<String>,
}

// --- Meeting rooms ---

/// Logical room state, derived from the row and the clock on every read.
/// Never persisted, so it cannot drift from `scheduled_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Scheduled,
    Full,
    Closed,
    Deactivated,
}

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = meeting_rooms)]
pub struct MeetingRoom {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub topic: String,
    pub language: String,
    pub level: String,
    pub max_participants: i32,
    pub current_participants: i32,
    pub is_active: bool,
    pub moderator_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
}

impl MeetingRoom {
    pub fn status(&self, now: DateTime<Utc>) -> RoomStatus {
        if !self.is_active {
            RoomStatus::Deactivated
        } else if self.scheduled_time <= now {
            RoomStatus::Closed
        } else if self.current_participants >= self.max_participants {
            RoomStatus::Full
        } else {
            RoomStatus::Scheduled
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = meeting_rooms)]
pub struct NewMeetingRoom {
    pub title: String,
    pub description: Option<String>,
    pub topic: String,
    pub language: String,
    pub level: String,
    pub max_participants: i32,
    pub current_participants: i32,
    pub moderator_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: i32,
}

/// Listing shape for room browse endpoints.
#[derive(Debug, Serialize)]
pub struct RoomSummary {
    pub id: Uuid,
    pub title: String,
    pub topic: String,
    pub language: String,
    pub level: String,
    pub scheduled_time: DateTime<Utc>,
    pub participant_count: i32,
    pub max_participants: i32,
    pub status: RoomStatus,
}

impl RoomSummary {
    pub fn from_room(room: &MeetingRoom, now: DateTime<Utc>) -> Self {
        Self {
            id: room.id,
            title: room.title.clone(),
            topic: room.topic.clone(),
            language: room.language.clone(),
            level: room.level.clone(),
            scheduled_time: room.scheduled_time,
            participant_count: room.current_participants,
            max_participants: room.max_participants,
            status: room.status(now),
        }
    }
}

// --- Room participants ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = room_participants)]
pub struct RoomParticipant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub room_id: Uuid,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub rating: Option<i32>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = room_participants)]
pub struct NewRoomParticipant {
    pub user_id: Uuid,
    pub room_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn room(is_active: bool, starts_in_mins: i64, current: i32, max: i32) -> MeetingRoom {
        let now = Utc::now();
        MeetingRoom {
            id: Uuid::now_v7(),
            title: "Small talk".into(),
            description: None,
            topic: "Travel".into(),
            language: "English".into(),
            level: "B1".into(),
            max_participants: max,
            current_participants: current,
            is_active,
            moderator_id: Uuid::now_v7(),
            scheduled_time: now + Duration::minutes(starts_in_mins),
            duration_minutes: 60,
            created_at: now,
        }
    }

    #[test]
    fn status_scheduled_when_future_active_and_open() {
        let r = room(true, 30, 2, 6);
        assert_eq!(r.status(Utc::now()), RoomStatus::Scheduled);
    }

    #[test]
    fn status_full_when_at_capacity() {
        let r = room(true, 30, 6, 6);
        assert_eq!(r.status(Utc::now()), RoomStatus::Full);
    }

    #[test]
    fn status_closed_once_start_time_passes() {
        // Closed wins over Full: a past room is over regardless of capacity.
        let r = room(true, -5, 6, 6);
        assert_eq!(r.status(Utc::now()), RoomStatus::Closed);
    }

    #[test]
    fn status_deactivated_overrides_everything() {
        let r = room(false, 30, 0, 6);
        assert_eq!(r.status(Utc::now()), RoomStatus::Deactivated);
    }

    #[test]
    fn learning_language_list_splits_and_trims() {
        let mut u = User {
            id: Uuid::now_v7(),
            username: "mika".into(),
            email: "mika@example.com".into(),
            password_hash: String::new(),
            first_name: "Mika".into(),
            last_name: "K".into(),
            age: 16,
            country: "Finland".into(),
            native_language: "Finnish".into(),
            learning_languages: Some("English, Korean".into()),
            interests: None,
            is_active: true,
            role: "user".into(),
            last_login: None,
            created_at: Utc::now(),
        };
        assert_eq!(u.learning_language_list(), vec!["English", "Korean"]);

        u.learning_languages = None;
        assert!(u.learning_language_list().is_empty());
    }
}
