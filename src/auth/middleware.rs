//! Gate in front of the profile routes: only a verified access token gets through.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenError};
use crate::error::ApiError;

/// External user id of the caller, placed in request extensions by the gate.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

/// Token from an `Authorization` value of exactly `Bearer <token>`.
pub fn bearer_token(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

pub fn authorize(headers: &HeaderMap, keys: &JwtKeys) -> Result<AuthUser, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("missing token".into()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("invalid token format".into()))?;
    if value.is_empty() {
        return Err(ApiError::Unauthorized("missing token".into()));
    }

    let token =
        bearer_token(value).ok_or_else(|| ApiError::Unauthorized("invalid token format".into()))?;

    match keys.subject(token) {
        Ok(sub) => Ok(AuthUser(sub)),
        Err(e @ TokenError::WrongKind) => {
            warn!("refresh token presented to access-only route");
            Err(e.into())
        }
        Err(e) => {
            warn!(error = %e, "token rejected");
            Err(e.into())
        }
    }
}

pub async fn require_access_token(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authorize(req.headers(), &keys)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
