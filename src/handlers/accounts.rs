//! Account administration, mounted under `/dashboard/users` for superusers.

use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

use crate::actions;
use crate::auth::hash_password;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::models::{AdminUserCreateRequest, AdminUserUpdateRequest, ApiResponse, NewUser, UserChanges, UserView};
use crate::policy::Identity;
use crate::validation;

#[get("")]
pub async fn list_users(pool: web::Data<DbPool>) -> actix_web::Result<impl Responder> {
    let users = web::block(move || {
        let mut conn = pool.get()?;
        actions::users::list_users(&mut conn)
    })
    .await??;

    let users: Vec<UserView> = users.iter().map(UserView::from).collect();
    Ok(HttpResponse::Ok().json(users))
}

#[post("")]
pub async fn create_user(
    pool: web::Data<DbPool>,
    identity: web::ReqData<Identity>,
    form: web::Json<AdminUserCreateRequest>,
) -> actix_web::Result<impl Responder> {
    let form = form.into_inner();
    let username = validation::validate_username(&form.username)?;
    validation::validate_new_password(&form.password1, &form.password2)?;
    let email = validation::validate_optional_email(&form.email)?;
    let first_name = validation::validate_profile_name("First name", &form.first_name)?;
    let last_name = validation::validate_profile_name("Last name", &form.last_name)?;

    let user = web::block(move || {
        let mut conn = pool.get()?;
        if actions::users::username_taken(&mut conn, &username)? {
            return Err(ServiceError::Conflict("Username already taken".to_string()));
        }
        if actions::users::email_taken(&mut conn, &email, None)? {
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }
        let new_user = NewUser {
            username,
            email,
            first_name,
            last_name,
            password_hash: hash_password(&form.password1)?,
            is_staff: form.is_staff,
            is_superuser: form.is_superuser,
            is_active: form.is_active,
        };
        actions::users::insert_user(&mut conn, &new_user)
    })
    .await??;

    log::info!("User '{}' created by {}", user.username, identity.username);
    Ok(HttpResponse::Created().json(UserView::from(&user)))
}

#[get("/{user_id}")]
pub async fn get_user(pool: web::Data<DbPool>, path: web::Path<i32>) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();

    let user = web::block(move || {
        let mut conn = pool.get()?;
        actions::users::get_user(&mut conn, user_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

/// Deactivating an account also ends its sessions.
#[put("/{user_id}")]
pub async fn update_user(
    pool: web::Data<DbPool>,
    identity: web::ReqData<Identity>,
    path: web::Path<i32>,
    form: web::Json<AdminUserUpdateRequest>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    let form = form.into_inner();

    let changes = UserChanges {
        email: form.email.map(|v| validation::validate_optional_email(&v)).transpose()?,
        first_name: form
            .first_name
            .map(|v| validation::validate_profile_name("First name", &v))
            .transpose()?,
        last_name: form
            .last_name
            .map(|v| validation::validate_profile_name("Last name", &v))
            .transpose()?,
        is_staff: form.is_staff,
        is_superuser: form.is_superuser,
        is_active: form.is_active,
    };

    let user = web::block(move || {
        let mut conn = pool.get()?;
        if let Some(email) = changes.email.as_deref() {
            if actions::users::email_taken(&mut conn, email, Some(user_id))? {
                return Err(ServiceError::Conflict("Email already registered".to_string()));
            }
        }
        let user = actions::users::update_user(&mut conn, user_id, &changes)?;
        if !user.is_active {
            actions::sessions::close_all_sessions(&mut conn, user.id)?;
        }
        Ok(user)
    })
    .await??;

    log::info!("User '{}' updated by {}", user.username, identity.username);
    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

#[delete("/{user_id}")]
pub async fn delete_user(
    pool: web::Data<DbPool>,
    identity: web::ReqData<Identity>,
    path: web::Path<i32>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();

    web::block(move || {
        let mut conn = pool.get()?;
        actions::users::delete_user(&mut conn, user_id)
    })
    .await??;

    log::info!("User {} deleted by {}", user_id, identity.username);
    Ok(HttpResponse::Ok().json(ApiResponse::new("User deleted successfully")))
}
