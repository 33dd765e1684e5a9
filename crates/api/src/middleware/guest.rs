//! Guest identity for the session-less transaction routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the client-generated guest id.
pub const GUEST_HEADER: &str = "x-guest-id";

/// Id of a guest, taken from the `X-Guest-Id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestId(pub Uuid);

impl<S> FromRequestParts<S> for GuestId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(GUEST_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::validation("X-Guest-Id header is required"))?;
        Uuid::parse_str(raw.trim())
            .map(GuestId)
            .map_err(|_| ApiError::validation("X-Guest-Id must be a UUID"))
    }
}
