use actix_web::{error::BlockingError, http::StatusCode, HttpResponse, ResponseError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::availability::{OVERLAP_CONSTRAINT, UNAVAILABLE_MESSAGE};
use crate::models::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid username, email or password")]
    InvalidCredentials,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("This step has expired or is unknown, please start again")]
    FlowExpired,

    #[error("database error: {0}")]
    Database(DieselError),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("blocking task failed: {0}")]
    Blocking(#[from] BlockingError),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ServiceError::Database(_)
                | ServiceError::Pool(_)
                | ServiceError::Blocking(_)
                | ServiceError::Internal(_)
        )
    }
}

fn unique_violation_message(constraint: Option<&str>) -> String {
    match constraint {
        Some("users_username_key") => "Username already taken".to_string(),
        Some("users_email_unique") => "Email already registered".to_string(),
        Some("bookings_booking_ref_key") => "Booking reference collision, please retry".to_string(),
        _ => "Record already exists".to_string(),
    }
}

impl From<DieselError> for ServiceError {
    fn from(e: DieselError) -> Self {
        let conflict = match &e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Some(unique_violation_message(info.constraint_name()))
            }
            DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
                Some("The request conflicted with a concurrent update, please retry".to_string())
            }
            DieselError::DatabaseError(_, info) if info.constraint_name() == Some(OVERLAP_CONSTRAINT) => {
                Some(UNAVAILABLE_MESSAGE.to_string())
            }
            _ => None,
        };

        match conflict {
            Some(message) => ServiceError::Conflict(message),
            None if matches!(e, DieselError::NotFound) => ServiceError::NotFound("Record"),
            None => ServiceError::Database(e),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::FlowExpired => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Unauthenticated | ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::Database(_)
            | ServiceError::Pool(_)
            | ServiceError::Blocking(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.is_internal() {
            log::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(self.status_code()).json(ApiResponse::new(message))
    }
}
