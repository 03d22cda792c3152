//! Routing-level authorization.
//!
//! Scopes are wrapped with one of the `require_*` middlewares; each resolves
//! the bearer session once per request and checks it against a
//! [`Capability`]. Handlers behind a gate read the caller through
//! `web::ReqData<Identity>`.

use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    middleware::Next,
    web, Error, HttpMessage,
};
use uuid::Uuid;

use crate::actions;
use crate::db::DbPool;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Authenticated,
    Staff,
    Superuser,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Authenticated => "authenticated",
            Capability::Staff => "staff",
            Capability::Superuser => "superuser",
        }
    }

    pub fn permits(&self, identity: &Identity) -> bool {
        match self {
            Capability::Authenticated => true,
            Capability::Staff => identity.is_staff || identity.is_superuser,
            Capability::Superuser => identity.is_superuser,
        }
    }
}

/// The authenticated caller, attached to request extensions by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub username: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub session_token: Uuid,
}

pub fn parse_bearer(value: &str) -> Option<Uuid> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Uuid::parse_str(token.trim()).ok()
}

async fn resolve_identity(req: &ServiceRequest) -> Result<Identity, ServiceError> {
    if let Some(identity) = req.extensions().get::<Identity>() {
        return Ok(identity.clone());
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_bearer)
        .ok_or(ServiceError::Unauthenticated)?;

    let pool = req
        .app_data::<web::Data<DbPool>>()
        .cloned()
        .ok_or_else(|| ServiceError::Internal("database pool not configured".to_string()))?;

    let identity = web::block(move || {
        let mut conn = pool.get()?;
        actions::sessions::resolve_identity(&mut conn, token)
    })
    .await??;

    req.extensions_mut().insert(identity.clone());
    Ok(identity)
}

pub async fn authorize(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
    required: Capability,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let identity = resolve_identity(&req).await?;
    if !required.permits(&identity) {
        log::warn!(
            "User '{}' lacks {} capability for {} {}",
            identity.username,
            required.as_str(),
            req.method(),
            req.path()
        );
        return Err(ServiceError::Forbidden.into());
    }
    next.call(req).await
}

pub async fn require_authenticated(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    authorize(req, next, Capability::Authenticated).await
}

pub async fn require_staff(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    authorize(req, next, Capability::Staff).await
}

pub async fn require_superuser(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    authorize(req, next, Capability::Superuser).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(is_staff: bool, is_superuser: bool) -> Identity {
        Identity {
            user_id: 1,
            username: "nour".into(),
            is_staff,
            is_superuser,
            session_token: Uuid::nil(),
        }
    }

    #[test]
    fn capability_matrix() {
        let member = identity(false, false);
        let staff = identity(true, false);
        let root = identity(false, true);

        assert!(Capability::Authenticated.permits(&member));
        assert!(!Capability::Staff.permits(&member));
        assert!(!Capability::Superuser.permits(&member));

        assert!(Capability::Staff.permits(&staff));
        assert!(!Capability::Superuser.permits(&staff));

        assert!(Capability::Staff.permits(&root));
        assert!(Capability::Superuser.permits(&root));
    }

    #[actix_web::test]
    async fn identity_already_on_the_request_is_reused() {
        let req = actix_web::test::TestRequest::default().to_srv_request();
        req.extensions_mut().insert(identity(true, false));

        let resolved = resolve_identity(&req).await.unwrap();
        assert_eq!(resolved, identity(true, false));
    }

    #[actix_web::test]
    async fn missing_bearer_is_unauthenticated() {
        let req = actix_web::test::TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic Zm9vOmJhcg=="))
            .to_srv_request();

        assert!(matches!(resolve_identity(&req).await, Err(ServiceError::Unauthenticated)));
    }

    #[test]
    fn bearer_header_parsing() {
        let token = Uuid::new_v4();
        assert_eq!(parse_bearer(&format!("Bearer {}", token)), Some(token));
        assert_eq!(parse_bearer(&format!("bearer   {}", token)), Some(token));
        assert_eq!(parse_bearer(&format!("Basic {}", token)), None);
        assert_eq!(parse_bearer("Bearer not-a-uuid"), None);
        assert_eq!(parse_bearer("Bearer"), None);
    }
}
