use chrono::{Duration, NaiveDateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::actions;
use crate::errors::ServiceError;
use crate::models::{User, UserSession};
use crate::policy::Identity;
use crate::schema::{user_sessions, users};

/// Issues a new bearer token for `user`, dropping any expired sessions first.
pub fn open_session(conn: &mut PgConnection, user: i32, ttl: Duration) -> Result<UserSession, ServiceError> {
    let now = Utc::now().naive_utc();

    let purged = diesel::delete(user_sessions::table.filter(user_sessions::expires_at.le(now))).execute(conn)?;
    if purged > 0 {
        log::debug!("purged {} expired sessions", purged);
    }

    let session = UserSession {
        token: Uuid::new_v4(),
        user_id: user,
        created_at: now,
        expires_at: now + ttl,
    };
    diesel::insert_into(user_sessions::table)
        .values(&session)
        .execute(conn)?;

    Ok(session)
}

/// Turns a verified login draft into a session: the draft is consumed,
/// `last_login` recorded and a token issued together, or not at all.
pub fn complete_login(
    conn: &mut PgConnection,
    flow_token: Uuid,
    user: i32,
    ttl: Duration,
) -> Result<UserSession, ServiceError> {
    conn.transaction(|conn| {
        actions::auth_flows::finish_flow(conn, flow_token)?;
        actions::users::record_login(conn, user)?;
        open_session(conn, user, ttl)
    })
}

fn identity_for(session: &UserSession, user: &User, now: NaiveDateTime) -> Result<Identity, ServiceError> {
    if session.expires_at <= now || !user.is_active {
        return Err(ServiceError::Unauthenticated);
    }
    Ok(Identity {
        user_id: user.id,
        username: user.username.clone(),
        is_staff: user.is_staff,
        is_superuser: user.is_superuser,
        session_token: session.token,
    })
}

/// Looks up a live session. Unknown, expired and deactivated accounts all
/// answer `Unauthenticated`.
pub fn resolve_identity(conn: &mut PgConnection, token: Uuid) -> Result<Identity, ServiceError> {
    let row: Option<(UserSession, User)> = user_sessions::table
        .inner_join(users::table)
        .filter(user_sessions::token.eq(token))
        .select((UserSession::as_select(), User::as_select()))
        .first(conn)
        .optional()?;

    let (session, user) = row.ok_or(ServiceError::Unauthenticated)?;
    identity_for(&session, &user, Utc::now().naive_utc())
}

pub fn close_session(conn: &mut PgConnection, token: Uuid) -> Result<(), ServiceError> {
    diesel::delete(user_sessions::table.find(token)).execute(conn)?;
    Ok(())
}

/// Signs the user out everywhere except the session identified by `keep`.
pub fn close_other_sessions(conn: &mut PgConnection, user: i32, keep: Uuid) -> Result<usize, ServiceError> {
    let closed = diesel::delete(
        user_sessions::table
            .filter(user_sessions::user_id.eq(user))
            .filter(user_sessions::token.ne(keep)),
    )
    .execute(conn)?;
    Ok(closed)
}

pub fn close_all_sessions(conn: &mut PgConnection, user: i32) -> Result<usize, ServiceError> {
    let closed = diesel::delete(user_sessions::table.filter(user_sessions::user_id.eq(user))).execute(conn)?;
    Ok(closed)
}
