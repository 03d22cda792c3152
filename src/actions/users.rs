use chrono::Utc;
use diesel::prelude::*;

use crate::errors::ServiceError;
use crate::models::{NewUser, User, UserChanges};
use crate::schema::users;

define_sql_function! {
    fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

pub fn get_user(conn: &mut PgConnection, user_id: i32) -> Result<User, ServiceError> {
    users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("User"))
}

/// Accounts a login identifier may refer to: the username match first, then
/// the account owning it as an email, if different.
pub fn login_candidates(conn: &mut PgConnection, identifier: &str) -> Result<Vec<User>, ServiceError> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Ok(Vec::new());
    }

    let mut candidates = Vec::with_capacity(2);

    let by_username = users::table
        .filter(users::username.eq(identifier))
        .select(User::as_select())
        .first(conn)
        .optional()?;
    candidates.extend(by_username);

    let by_email = users::table
        .filter(users::email.ne(""))
        .filter(lower(users::email).eq(identifier.to_lowercase()))
        .select(User::as_select())
        .first(conn)
        .optional()?;
    if let Some(user) = by_email {
        if candidates.iter().all(|c| c.id != user.id) {
            candidates.push(user);
        }
    }

    Ok(candidates)
}

pub fn username_taken(conn: &mut PgConnection, username: &str) -> Result<bool, ServiceError> {
    let found: Option<i32> = users::table
        .filter(users::username.eq(username))
        .select(users::id)
        .first(conn)
        .optional()?;
    Ok(found.is_some())
}

/// Whether another account already uses `email`. Blank emails never clash.
pub fn email_taken(conn: &mut PgConnection, email: &str, except: Option<i32>) -> Result<bool, ServiceError> {
    if email.trim().is_empty() {
        return Ok(false);
    }

    let mut query = users::table
        .filter(lower(users::email).eq(email.trim().to_lowercase()))
        .select(users::id)
        .into_boxed();
    if let Some(user_id) = except {
        query = query.filter(users::id.ne(user_id));
    }

    let found: Option<i32> = query.first(conn).optional()?;
    Ok(found.is_some())
}

pub fn insert_user(conn: &mut PgConnection, new_user: &NewUser) -> Result<User, ServiceError> {
    let user = diesel::insert_into(users::table)
        .values(new_user)
        .returning(User::as_returning())
        .get_result(conn)?;
    Ok(user)
}

/// Newest accounts first.
pub fn list_users(conn: &mut PgConnection) -> Result<Vec<User>, ServiceError> {
    let all = users::table
        .order((users::date_joined.desc(), users::id.desc()))
        .select(User::as_select())
        .load(conn)?;
    Ok(all)
}

pub fn update_user(conn: &mut PgConnection, user_id: i32, changes: &UserChanges) -> Result<User, ServiceError> {
    if changes.is_empty() {
        return get_user(conn, user_id);
    }
    diesel::update(users::table.find(user_id))
        .set(changes)
        .returning(User::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("User"))
}

pub fn set_password(conn: &mut PgConnection, user_id: i32, password_hash: &str) -> Result<(), ServiceError> {
    let updated = diesel::update(users::table.find(user_id))
        .set(users::password_hash.eq(password_hash))
        .execute(conn)?;
    if updated == 0 {
        return Err(ServiceError::NotFound("User"));
    }
    Ok(())
}

pub fn record_login(conn: &mut PgConnection, user_id: i32) -> Result<(), ServiceError> {
    diesel::update(users::table.find(user_id))
        .set(users::last_login.eq(Some(Utc::now().naive_utc())))
        .execute(conn)?;
    Ok(())
}

/// Deletes the account; its sessions go with it through the foreign key.
pub fn delete_user(conn: &mut PgConnection, user_id: i32) -> Result<(), ServiceError> {
    let deleted = diesel::delete(users::table.find(user_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ServiceError::NotFound("User"));
    }
    Ok(())
}
