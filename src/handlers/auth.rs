//! Multi-step login and registration, sessions and the caller's own profile.

use actix_web::{post, web, HttpResponse, Responder};
use diesel::{Connection, PgConnection};

use crate::actions;
use crate::auth::{hash_password, verify_password, FlowDraft, FlowKind};
use crate::config::AuthSettings;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::models::{
    ApiResponse, ChangePasswordRequest, FlowResponse, FlowTokenRequest, LoginIdentifierRequest, LoginPasswordRequest,
    NewUser, ProfileUpdateRequest, RegisterPasswordRequest, RegisterProfileRequest, SessionResponse, User,
    UserChanges, UserSession, UserView,
};
use crate::policy::Identity;
use crate::validation;

fn session_response(user: &User, session: &UserSession, message: String) -> SessionResponse {
    SessionResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: UserView::from(user),
        message,
    }
}

#[post("/login/step1")]
pub async fn login_step1(
    pool: web::Data<DbPool>,
    settings: web::Data<AuthSettings>,
    form: web::Json<LoginIdentifierRequest>,
) -> actix_web::Result<impl Responder> {
    let identifier = form.login_identifier.trim().to_string();
    if identifier.is_empty() {
        return Err(ServiceError::validation("Please enter your email or username").into());
    }

    let draft = FlowDraft::Login { identifier };
    let ttl = settings.flow_ttl;
    let flow = web::block(move || {
        let mut conn = pool.get()?;
        actions::auth_flows::start_flow(&mut conn, &draft, ttl)
    })
    .await??;

    Ok(HttpResponse::Ok().json(FlowResponse {
        flow_token: flow.token,
        next_step: "password",
        expires_at: flow.expires_at,
    }))
}

/// A failed attempt keeps the draft so the password can be retried.
#[post("/login/step2")]
pub async fn login_step2(
    pool: web::Data<DbPool>,
    settings: web::Data<AuthSettings>,
    form: web::Json<LoginPasswordRequest>,
) -> actix_web::Result<impl Responder> {
    let LoginPasswordRequest { flow_token, password } = form.into_inner();
    if password.is_empty() {
        return Err(ServiceError::validation("Please enter your password").into());
    }

    let ttl = settings.session_ttl;
    let (user, session) = web::block(move || {
        let mut conn = pool.get()?;
        let (draft, _) = actions::auth_flows::load_flow(&mut conn, flow_token, FlowKind::Login)?;
        let FlowDraft::Login { identifier } = draft else {
            return Err(ServiceError::FlowExpired);
        };

        let user = actions::users::login_candidates(&mut conn, &identifier)?
            .into_iter()
            .find(|u| u.is_active && verify_password(&password, &u.password_hash))
            .ok_or_else(|| {
                log::warn!("Failed login attempt for '{}'", identifier);
                ServiceError::InvalidCredentials
            })?;

        let session = actions::sessions::complete_login(&mut conn, flow_token, user.id, ttl)?;
        Ok((user, session))
    })
    .await??;

    log::info!("User '{}' logged in", user.username);
    let message = format!("Welcome {}!", user.display_name());
    Ok(HttpResponse::Ok().json(session_response(&user, &session, message)))
}

#[post("/register/step1")]
pub async fn register_step1(
    pool: web::Data<DbPool>,
    settings: web::Data<AuthSettings>,
    form: web::Json<RegisterProfileRequest>,
) -> actix_web::Result<impl Responder> {
    let first_name = validation::validate_required_profile("First name", &form.first_name)?;
    let last_name = validation::validate_required_profile("Last name", &form.last_name)?;
    let email = validation::validate_required_email(&form.email)?;
    let username = match form.username.as_deref().map(str::trim) {
        Some(chosen) if !chosen.is_empty() => validation::validate_username(chosen)?,
        _ => validation::validate_username(&email)?,
    };

    let draft = FlowDraft::Register {
        first_name,
        last_name,
        email,
        username,
        password_hash: None,
    };
    let ttl = settings.flow_ttl;
    let flow = web::block(move || {
        let mut conn = pool.get()?;
        actions::auth_flows::start_flow(&mut conn, &draft, ttl)
    })
    .await??;

    Ok(HttpResponse::Ok().json(FlowResponse {
        flow_token: flow.token,
        next_step: "password",
        expires_at: flow.expires_at,
    }))
}

fn ensure_identity_free(conn: &mut PgConnection, username: &str, email: &str) -> Result<(), ServiceError> {
    if actions::users::username_taken(conn, username)? {
        return Err(ServiceError::Conflict(
            "Username already taken, choose another or leave it blank".to_string(),
        ));
    }
    if actions::users::email_taken(conn, email, None)? {
        return Err(ServiceError::Conflict("Email already registered".to_string()));
    }
    Ok(())
}

#[post("/register/step2")]
pub async fn register_step2(
    pool: web::Data<DbPool>,
    form: web::Json<RegisterPasswordRequest>,
) -> actix_web::Result<impl Responder> {
    let RegisterPasswordRequest {
        flow_token,
        password1,
        password2,
    } = form.into_inner();
    validation::validate_new_password(&password1, &password2)?;

    let expires_at = web::block(move || {
        let mut conn = pool.get()?;
        let (draft, expires_at) = actions::auth_flows::load_flow(&mut conn, flow_token, FlowKind::Register)?;
        let FlowDraft::Register {
            first_name,
            last_name,
            email,
            username,
            ..
        } = draft
        else {
            return Err(ServiceError::FlowExpired);
        };

        ensure_identity_free(&mut conn, &username, &email)?;

        let updated = FlowDraft::Register {
            first_name,
            last_name,
            email,
            username,
            password_hash: Some(hash_password(&password1)?),
        };
        actions::auth_flows::save_flow(&mut conn, flow_token, &updated)?;
        Ok(expires_at)
    })
    .await??;

    Ok(HttpResponse::Ok().json(FlowResponse {
        flow_token,
        next_step: "confirm",
        expires_at,
    }))
}

#[post("/register/step3")]
pub async fn register_step3(
    pool: web::Data<DbPool>,
    settings: web::Data<AuthSettings>,
    form: web::Json<FlowTokenRequest>,
) -> actix_web::Result<impl Responder> {
    let flow_token = form.flow_token;
    let ttl = settings.session_ttl;

    let (user, session) = web::block(move || {
        let mut conn = pool.get()?;
        let (draft, _) = actions::auth_flows::load_flow(&mut conn, flow_token, FlowKind::Register)?;
        let FlowDraft::Register {
            first_name,
            last_name,
            email,
            username,
            password_hash,
        } = draft
        else {
            return Err(ServiceError::FlowExpired);
        };
        let password_hash =
            password_hash.ok_or_else(|| ServiceError::validation("Please choose a password before confirming"))?;

        conn.transaction::<_, ServiceError, _>(|conn| {
            ensure_identity_free(conn, &username, &email)?;
            let user = actions::users::insert_user(
                conn,
                &NewUser {
                    username,
                    email,
                    first_name,
                    last_name,
                    password_hash,
                    is_staff: false,
                    is_superuser: false,
                    is_active: true,
                },
            )?;
            actions::auth_flows::finish_flow(conn, flow_token)?;
            actions::users::record_login(conn, user.id)?;
            let session = actions::sessions::open_session(conn, user.id, ttl)?;
            Ok((user, session))
        })
    })
    .await?
    .map_err(|e| {
        if e.is_internal() {
            log::error!("Account creation failed: {}", e);
        }
        e
    })?;

    log::info!("User '{}' registered", user.username);
    Ok(HttpResponse::Created().json(session_response(&user, &session, "Account created successfully".to_string())))
}

pub async fn logout(pool: web::Data<DbPool>, identity: web::ReqData<Identity>) -> actix_web::Result<impl Responder> {
    let identity = identity.into_inner();
    let token = identity.session_token;

    web::block(move || {
        let mut conn = pool.get()?;
        actions::sessions::close_session(&mut conn, token)
    })
    .await??;

    log::info!("User '{}' logged out", identity.username);
    Ok(HttpResponse::Ok().json(ApiResponse::new("Logged out successfully")))
}

pub async fn profile(pool: web::Data<DbPool>, identity: web::ReqData<Identity>) -> actix_web::Result<impl Responder> {
    let user_id = identity.user_id;

    let user = web::block(move || {
        let mut conn = pool.get()?;
        actions::users::get_user(&mut conn, user_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

pub async fn update_profile(
    pool: web::Data<DbPool>,
    identity: web::ReqData<Identity>,
    form: web::Json<ProfileUpdateRequest>,
) -> actix_web::Result<impl Responder> {
    let user_id = identity.user_id;
    let form = form.into_inner();

    let changes = UserChanges {
        first_name: form
            .first_name
            .map(|v| validation::validate_profile_name("First name", &v))
            .transpose()?,
        last_name: form
            .last_name
            .map(|v| validation::validate_profile_name("Last name", &v))
            .transpose()?,
        email: form.email.map(|v| validation::validate_optional_email(&v)).transpose()?,
        ..UserChanges::default()
    };

    let user = web::block(move || {
        let mut conn = pool.get()?;
        if let Some(email) = changes.email.as_deref() {
            if actions::users::email_taken(&mut conn, email, Some(user_id))? {
                return Err(ServiceError::Conflict("Email already registered".to_string()));
            }
        }
        actions::users::update_user(&mut conn, user_id, &changes)
    })
    .await??;

    Ok(HttpResponse::Ok().json(UserView::from(&user)))
}

/// Changing the password signs out every other session of the account.
pub async fn change_password(
    pool: web::Data<DbPool>,
    identity: web::ReqData<Identity>,
    form: web::Json<ChangePasswordRequest>,
) -> actix_web::Result<impl Responder> {
    let identity = identity.into_inner();
    let ChangePasswordRequest {
        current_password,
        new_password1,
        new_password2,
    } = form.into_inner();

    let user_id = identity.user_id;
    let keep = identity.session_token;
    let closed = web::block(move || {
        let mut conn = pool.get()?;
        let user = actions::users::get_user(&mut conn, user_id)?;
        if !verify_password(&current_password, &user.password_hash) {
            return Err(ServiceError::validation("Current password is incorrect"));
        }
        validation::validate_new_password(&new_password1, &new_password2)?;

        let password_hash = hash_password(&new_password1)?;
        actions::users::set_password(&mut conn, user_id, &password_hash)?;
        actions::sessions::close_other_sessions(&mut conn, user_id, keep)
    })
    .await??;

    log::info!(
        "User '{}' changed password, {} other sessions closed",
        identity.username,
        closed
    );
    Ok(HttpResponse::Ok().json(ApiResponse::new("Password changed successfully")))
}
