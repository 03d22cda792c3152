//! Password hashing and the drafts behind the multi-step login and
//! registration flows.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Login,
    Register,
}

impl FlowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::Login => "login",
            FlowKind::Register => "register",
        }
    }
}

/// Server-side state carried between the steps of a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FlowDraft {
    Login {
        identifier: String,
    },
    Register {
        first_name: String,
        last_name: String,
        email: String,
        username: String,
        /// Set once the password step succeeds.
        #[serde(default)]
        password_hash: Option<String>,
    },
}

impl FlowDraft {
    pub fn kind(&self) -> FlowKind {
        match self {
            FlowDraft::Login { .. } => FlowKind::Login,
            FlowDraft::Register { .. } => FlowKind::Register,
        }
    }

    pub fn to_payload(&self) -> Result<serde_json::Value, ServiceError> {
        serde_json::to_value(self).map_err(|e| ServiceError::Internal(format!("draft encoding failed: {}", e)))
    }

    /// Decodes a stored payload, refusing drafts of another flow.
    pub fn from_payload(payload: serde_json::Value, expected: FlowKind) -> Result<Self, ServiceError> {
        let draft: FlowDraft = serde_json::from_value(payload).map_err(|_| ServiceError::FlowExpired)?;
        if draft.kind() != expected {
            return Err(ServiceError::FlowExpired);
        }
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn drafts_are_tagged_by_kind() {
        let draft = FlowDraft::Login {
            identifier: "omar".into(),
        };
        let payload = draft.to_payload().unwrap();
        assert_eq!(payload["kind"], "login");
        assert_eq!(FlowDraft::from_payload(payload, FlowKind::Login).unwrap(), draft);
    }

    #[test]
    fn draft_of_other_flow_is_refused() {
        let payload = FlowDraft::Login {
            identifier: "omar".into(),
        }
        .to_payload()
        .unwrap();
        assert!(matches!(
            FlowDraft::from_payload(payload, FlowKind::Register),
            Err(ServiceError::FlowExpired)
        ));
    }

    #[test]
    fn register_draft_without_password_decodes() {
        let payload = serde_json::json!({
            "kind": "register",
            "first_name": "Mona",
            "last_name": "Adel",
            "email": "mona@example.com",
            "username": "mona"
        });
        let draft = FlowDraft::from_payload(payload, FlowKind::Register).unwrap();
        assert!(matches!(draft, FlowDraft::Register { password_hash: None, .. }));
    }
}
