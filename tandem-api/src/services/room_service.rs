use chrono::{DateTime, Utc};
use diesel::dsl::count;
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use tandem_shared::errors::{AppError, ErrorCode};
use tandem_shared::types::PaginationParams;

use crate::models::{MeetingRoom, NewMeetingRoom, NewRoomParticipant, RoomParticipant, User};
use crate::schema::{meeting_rooms, room_participants, users};

/// Room creation is gated to the older half of the age band.
pub const MIN_MODERATOR_AGE: i32 = 16;

/// Served when topic aggregation fails, so the browse page still renders.
pub const FALLBACK_TOPICS: [&str; 6] = [
    "🎮 Video games",
    "🎵 K-pop and J-pop",
    "🎬 Movies and series",
    "🌍 Ecology",
    "⚽ Sports",
    "🍿 Food culture",
];

#[derive(Debug)]
pub struct CreateRoomParams {
    pub title: String,
    pub description: Option<String>,
    pub topic: String,
    pub language: String,
    pub level: String,
    pub scheduled_time: DateTime<Utc>,
    pub max_participants: i32,
    pub duration_minutes: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct RoomFilters {
    pub topic: Option<String>,
    pub language: Option<String>,
    pub level: Option<String>,
}

/// Creates a room with the creator as moderator and first participant.
///
/// The room insert, the moderator's participant row, and the counter bump
/// commit in one transaction; a failure leaves zero rows behind.
pub fn create_room(
    conn: &mut PgConnection,
    creator_id: Uuid,
    params: CreateRoomParams,
) -> Result<MeetingRoom, AppError> {
    let creator: User = users::table
        .find(creator_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    if creator.age < MIN_MODERATOR_AGE {
        return Err(AppError::new(
            ErrorCode::ModeratorTooYoung,
            format!("only users aged {MIN_MODERATOR_AGE} and over can create rooms"),
        ));
    }

    if params.scheduled_time <= Utc::now() {
        return Err(AppError::new(
            ErrorCode::ScheduleNotFuture,
            "scheduled time must be in the future",
        ));
    }

    conn.transaction::<_, AppError, _>(|conn| {
        let room: MeetingRoom = diesel::insert_into(meeting_rooms::table)
            .values(&NewMeetingRoom {
                title: params.title,
                description: params.description,
                topic: params.topic,
                language: params.language,
                level: params.level,
                max_participants: params.max_participants,
                current_participants: 0,
                moderator_id: creator_id,
                scheduled_time: params.scheduled_time,
                duration_minutes: params.duration_minutes,
            })
            .get_result(conn)?;

        diesel::insert_into(room_participants::table)
            .values(&NewRoomParticipant {
                user_id: creator_id,
                room_id: room.id,
            })
            .execute(conn)?;

        let room = diesel::update(meeting_rooms::table.find(room.id))
            .set(meeting_rooms::current_participants.eq(meeting_rooms::current_participants + 1))
            .get_result::<MeetingRoom>(conn)?;

        Ok(room)
    })
}

/// Join guards, evaluated in a fixed order so callers get a stable reason.
/// Room existence is checked by the caller before this runs.
fn check_joinable(
    room: &MeetingRoom,
    now: DateTime<Utc>,
    already_joined: bool,
) -> Result<(), AppError> {
    if !room.is_active {
        return Err(AppError::new(ErrorCode::RoomInactive, "this meeting is no longer active"));
    }
    if room.current_participants >= room.max_participants {
        return Err(AppError::new(ErrorCode::RoomFull, "the room is full"));
    }
    if room.scheduled_time <= now {
        return Err(AppError::new(ErrorCode::RoomStarted, "the meeting has already started"));
    }
    if already_joined {
        return Err(AppError::new(ErrorCode::AlreadyJoined, "you have already joined this meeting"));
    }
    Ok(())
}

/// Adds the user to the room.
///
/// The room row is locked with `FOR UPDATE` for the duration of the
/// transaction, which serializes concurrent joins on the same room: the
/// capacity check and the counter increment happen under one lock, so
/// `current_participants` can never exceed `max_participants`.
pub fn join_room(
    conn: &mut PgConnection,
    user_id: Uuid,
    room_id: Uuid,
) -> Result<MeetingRoom, AppError> {
    conn.transaction::<_, AppError, _>(|conn| {
        let room: MeetingRoom = meeting_rooms::table
            .find(room_id)
            .for_update()
            .first(conn)
            .optional()?
            .ok_or_else(|| AppError::new(ErrorCode::RoomNotFound, "room not found"))?;

        let already_joined: i64 = room_participants::table
            .filter(room_participants::room_id.eq(room_id))
            .filter(room_participants::user_id.eq(user_id))
            .filter(room_participants::left_at.is_null())
            .count()
            .get_result(conn)?;

        check_joinable(&room, Utc::now(), already_joined > 0)?;

        diesel::insert_into(room_participants::table)
            .values(&NewRoomParticipant { user_id, room_id })
            .execute(conn)?;

        let room = diesel::update(meeting_rooms::table.find(room_id))
            .set(meeting_rooms::current_participants.eq(meeting_rooms::current_participants + 1))
            .get_result::<MeetingRoom>(conn)?;

        Ok(room)
    })
}

/// Marks the caller's participation as left and releases their seat.
/// Re-joining later is allowed: the active-participation check only looks
/// at rows where `left_at` is null.
pub fn leave_room(conn: &mut PgConnection, user_id: Uuid, room_id: Uuid) -> Result<(), AppError> {
    conn.transaction::<_, AppError, _>(|conn| {
        let exists: Option<MeetingRoom> = meeting_rooms::table
            .find(room_id)
            .for_update()
            .first(conn)
            .optional()?;
        if exists.is_none() {
            return Err(AppError::new(ErrorCode::RoomNotFound, "room not found"));
        }

        let left = diesel::update(
            room_participants::table
                .filter(room_participants::room_id.eq(room_id))
                .filter(room_participants::user_id.eq(user_id))
                .filter(room_participants::left_at.is_null()),
        )
        .set(room_participants::left_at.eq(Utc::now()))
        .execute(conn)?;

        if left == 0 {
            return Err(AppError::new(
                ErrorCode::NotParticipant,
                "you are not a participant of this meeting",
            ));
        }

        diesel::update(meeting_rooms::table.find(room_id))
            .set(meeting_rooms::current_participants.eq(meeting_rooms::current_participants - 1))
            .execute(conn)?;

        Ok(())
    })
}

pub fn find_room(conn: &mut PgConnection, room_id: Uuid) -> Result<MeetingRoom, AppError> {
    meeting_rooms::table
        .find(room_id)
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::RoomNotFound, "room not found"))
}

/// Active participants with their user records, in join order.
pub fn find_participants_by_room(
    conn: &mut PgConnection,
    room_id: Uuid,
) -> Result<Vec<(RoomParticipant, User)>, AppError> {
    room_participants::table
        .inner_join(users::table)
        .filter(room_participants::room_id.eq(room_id))
        .filter(room_participants::left_at.is_null())
        .order(room_participants::joined_at.asc())
        .select((room_participants::all_columns, users::all_columns))
        .load(conn)
        .map_err(Into::into)
}

fn upcoming_query(
    viewer: Option<Uuid>,
    filters: &RoomFilters,
    now: DateTime<Utc>,
) -> meeting_rooms::BoxedQuery<'static, Pg> {
    let mut query = meeting_rooms::table
        .filter(meeting_rooms::is_active.eq(true))
        .filter(meeting_rooms::scheduled_time.gt(now))
        .filter(meeting_rooms::current_participants.lt(meeting_rooms::max_participants))
        .into_boxed();

    if let Some(topic) = filters.topic.as_deref().filter(|t| !t.is_empty()) {
        query = query.filter(meeting_rooms::topic.ilike(format!("%{topic}%")));
    }
    if let Some(language) = filters.language.as_deref().filter(|l| !l.is_empty()) {
        query = query.filter(meeting_rooms::language.eq(language.to_string()));
    }
    if let Some(level) = filters.level.as_deref().filter(|l| !l.is_empty()) {
        query = query.filter(meeting_rooms::level.eq(level.to_string()));
    }

    if let Some(viewer) = viewer {
        let joined = room_participants::table
            .filter(room_participants::user_id.eq(viewer))
            .filter(room_participants::left_at.is_null())
            .select(room_participants::room_id);
        query = query.filter(meeting_rooms::id.ne_all(joined));
    }

    query
}

/// Future, active, not-full rooms, soonest first. Rooms the viewer already
/// joined are excluded when a viewer is given.
pub fn upcoming_rooms(
    conn: &mut PgConnection,
    viewer: Option<Uuid>,
    filters: &RoomFilters,
    pagination: &PaginationParams,
) -> Result<(Vec<MeetingRoom>, u64), AppError> {
    let now = Utc::now();

    let total: i64 = upcoming_query(viewer, filters, now)
        .count()
        .get_result(conn)?;

    let rooms = upcoming_query(viewer, filters, now)
        .order(meeting_rooms::scheduled_time.asc())
        .limit(pagination.limit() as i64)
        .offset(pagination.offset() as i64)
        .load::<MeetingRoom>(conn)?;

    Ok((rooms, total as u64))
}

/// Active rooms where the user holds an active participation row, soonest
/// first. The moderator is always their room's first participant, so this
/// is already the deduplicated union of joined and moderated rooms.
pub fn user_rooms(conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<MeetingRoom>, AppError> {
    meeting_rooms::table
        .inner_join(room_participants::table)
        .filter(room_participants::user_id.eq(user_id))
        .filter(room_participants::left_at.is_null())
        .filter(meeting_rooms::is_active.eq(true))
        .order(meeting_rooms::scheduled_time.asc())
        .select(meeting_rooms::all_columns)
        .load(conn)
        .map_err(Into::into)
}

/// Total meetings the user has ever joined, for dashboard stats.
pub fn user_meeting_count(conn: &mut PgConnection, user_id: Uuid) -> Result<i64, AppError> {
    room_participants::table
        .filter(room_participants::user_id.eq(user_id))
        .count()
        .get_result(conn)
        .map_err(Into::into)
}

/// Topics of active future rooms, ranked by how many rooms carry them.
pub fn popular_topics(conn: &mut PgConnection, limit: usize) -> Result<Vec<String>, AppError> {
    let counts: Vec<(String, i64)> = meeting_rooms::table
        .filter(meeting_rooms::is_active.eq(true))
        .filter(meeting_rooms::scheduled_time.gt(Utc::now()))
        .group_by(meeting_rooms::topic)
        .select((meeting_rooms::topic, count(meeting_rooms::id)))
        .load(conn)?;

    Ok(rank_topics(counts, limit))
}

fn rank_topics(mut counts: Vec<(String, i64)>, limit: usize) -> Vec<String> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(limit).map(|(topic, _)| topic).collect()
}

/// Rates the caller's own participation once the meeting has started.
pub fn rate_room(
    conn: &mut PgConnection,
    user_id: Uuid,
    room_id: Uuid,
    rating: i32,
) -> Result<(), AppError> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::new(ErrorCode::RatingOutOfRange, "rating must be between 1 and 5"));
    }

    let room = find_room(conn, room_id)?;
    if room.scheduled_time > Utc::now() {
        return Err(AppError::new(
            ErrorCode::RoomNotStarted,
            "you can rate a meeting only after it has started",
        ));
    }

    // A user who left and re-joined has several participation rows; the
    // rating lands on exactly one of them.
    let stays: Vec<RoomParticipant> = room_participants::table
        .filter(room_participants::room_id.eq(room_id))
        .filter(room_participants::user_id.eq(user_id))
        .load(conn)?;

    let target = rating_target(&stays).ok_or_else(|| {
        AppError::new(
            ErrorCode::NotParticipant,
            "you did not participate in this meeting",
        )
    })?;

    diesel::update(room_participants::table.find(target))
        .set(room_participants::rating.eq(rating))
        .execute(conn)?;

    Ok(())
}

/// Picks the participation row a rating should land on: the active stay if
/// there is one, otherwise the most recent stay.
fn rating_target(stays: &[RoomParticipant]) -> Option<Uuid> {
    stays
        .iter()
        .find(|p| p.left_at.is_none())
        .or_else(|| stays.iter().max_by_key(|p| p.joined_at))
        .map(|p| p.id)
}

/// Administrative off-switch. Deactivated rooms disappear from every
/// listing; the rows stay for history.
pub fn deactivate_room(conn: &mut PgConnection, room_id: Uuid) -> Result<MeetingRoom, AppError> {
    diesel::update(meeting_rooms::table.find(room_id))
        .set(meeting_rooms::is_active.eq(false))
        .get_result(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::RoomNotFound, "room not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn room(is_active: bool, starts_in_mins: i64, current: i32, max: i32) -> MeetingRoom {
        let now = Utc::now();
        MeetingRoom {
            id: Uuid::now_v7(),
            title: "Debate club".into(),
            description: None,
            topic: "Ecology".into(),
            language: "German".into(),
            level: "B2".into(),
            max_participants: max,
            current_participants: current,
            is_active,
            moderator_id: Uuid::now_v7(),
            scheduled_time: now + Duration::minutes(starts_in_mins),
            duration_minutes: 60,
            created_at: now,
        }
    }

    fn reason(result: Result<(), AppError>) -> Option<ErrorCode> {
        result.err().and_then(|e| e.error_code())
    }

    #[test]
    fn joinable_room_passes_all_guards() {
        assert!(check_joinable(&room(true, 30, 3, 6), Utc::now(), false).is_ok());
    }

    #[test]
    fn inactive_wins_over_every_other_guard() {
        let r = room(false, -10, 6, 6);
        assert_eq!(reason(check_joinable(&r, Utc::now(), true)), Some(ErrorCode::RoomInactive));
    }

    #[test]
    fn full_is_reported_before_started() {
        let r = room(true, -10, 6, 6);
        assert_eq!(reason(check_joinable(&r, Utc::now(), false)), Some(ErrorCode::RoomFull));
    }

    #[test]
    fn started_room_rejects_join() {
        let r = room(true, -1, 2, 6);
        assert_eq!(reason(check_joinable(&r, Utc::now(), false)), Some(ErrorCode::RoomStarted));
    }

    #[test]
    fn second_join_by_same_user_is_rejected() {
        let r = room(true, 30, 2, 6);
        assert_eq!(reason(check_joinable(&r, Utc::now(), true)), Some(ErrorCode::AlreadyJoined));
    }

    #[test]
    fn rank_topics_orders_by_count_and_truncates() {
        let counts = vec![
            ("D".to_string(), 1),
            ("B".to_string(), 3),
            ("A".to_string(), 5),
            ("C".to_string(), 3),
        ];
        let top = rank_topics(counts, 3);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0], "A");
        assert!(top.contains(&"B".to_string()));
        assert!(top.contains(&"C".to_string()));
        assert!(!top.contains(&"D".to_string()));
    }

    #[test]
    fn rank_topics_handles_fewer_topics_than_limit() {
        let top = rank_topics(vec![("A".to_string(), 2)], 10);
        assert_eq!(top, vec!["A"]);
    }

    fn stay(joined_mins_ago: i64, left: bool) -> RoomParticipant {
        let joined_at = Utc::now() - Duration::minutes(joined_mins_ago);
        RoomParticipant {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            room_id: Uuid::now_v7(),
            joined_at,
            left_at: left.then(|| joined_at + Duration::minutes(5)),
            rating: None,
        }
    }

    #[test]
    fn rating_lands_on_the_active_stay() {
        let earlier = stay(60, true);
        let current = stay(10, false);
        let target = rating_target(&[earlier, current.clone()]);
        assert_eq!(target, Some(current.id));
    }

    #[test]
    fn rating_falls_back_to_the_most_recent_stay() {
        let first = stay(60, true);
        let second = stay(10, true);
        let target = rating_target(&[second.clone(), first]);
        assert_eq!(target, Some(second.id));
    }

    #[test]
    fn rating_has_no_target_without_a_stay() {
        assert_eq!(rating_target(&[]), None);
    }
}
