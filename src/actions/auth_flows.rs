use chrono::{Duration, NaiveDateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::auth::{FlowDraft, FlowKind};
use crate::errors::ServiceError;
use crate::models::AuthFlow;
use crate::schema::auth_flows;

/// Stores a fresh draft and returns its row; expired drafts are purged first.
pub fn start_flow(conn: &mut PgConnection, draft: &FlowDraft, ttl: Duration) -> Result<AuthFlow, ServiceError> {
    let now = Utc::now().naive_utc();

    diesel::delete(auth_flows::table.filter(auth_flows::expires_at.le(now))).execute(conn)?;

    let flow = AuthFlow {
        token: Uuid::new_v4(),
        kind: draft.kind().as_str().to_string(),
        payload: draft.to_payload()?,
        created_at: now,
        expires_at: now + ttl,
    };
    diesel::insert_into(auth_flows::table)
        .values(&flow)
        .execute(conn)?;

    Ok(flow)
}

/// Loads a live draft of the given kind along with its expiry. Missing,
/// expired or mismatched drafts all answer `FlowExpired`.
pub fn load_flow(
    conn: &mut PgConnection,
    token: Uuid,
    kind: FlowKind,
) -> Result<(FlowDraft, NaiveDateTime), ServiceError> {
    let now = Utc::now().naive_utc();

    let flow = auth_flows::table
        .find(token)
        .filter(auth_flows::kind.eq(kind.as_str()))
        .filter(auth_flows::expires_at.gt(now))
        .select(AuthFlow::as_select())
        .first(conn)
        .optional()?
        .ok_or(ServiceError::FlowExpired)?;

    let draft = FlowDraft::from_payload(flow.payload, kind)?;
    Ok((draft, flow.expires_at))
}

/// Replaces the payload of a live draft; its expiry is left unchanged.
pub fn save_flow(conn: &mut PgConnection, token: Uuid, draft: &FlowDraft) -> Result<(), ServiceError> {
    let updated = diesel::update(auth_flows::table.find(token))
        .set(auth_flows::payload.eq(draft.to_payload()?))
        .execute(conn)?;
    if updated == 0 {
        return Err(ServiceError::FlowExpired);
    }
    Ok(())
}

pub fn finish_flow(conn: &mut PgConnection, token: Uuid) -> Result<(), ServiceError> {
    diesel::delete(auth_flows::table.find(token)).execute(conn)?;
    Ok(())
}
