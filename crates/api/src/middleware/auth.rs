//! Authentication middleware for household routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use nestegg_shared::types::{HouseholdId, UserId};
use nestegg_shared::{Claims, JwtError};

use crate::AppState;
use crate::error::ApiError;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates JWT tokens.
///
/// Valid claims are stored in the request extensions for [`AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return ApiError::unauthorized("Authorization header with Bearer token is required")
            .into_response();
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(JwtError::Expired) => {
            ApiError::unauthorized("Session has expired, sign in again").into_response()
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected session token");
            ApiError::unauthorized("Invalid or malformed token").into_response()
        }
    }
}

/// Extractor for the authenticated session.
///
/// ```ignore
/// async fn handler(auth: AuthUser, ApiPath(hh): ApiPath<HouseholdId>) -> ApiResult<...> {
///     let household = auth.authorize(hh)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the user ID from the claims.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.0.user_id()
    }

    /// Returns the household the session belongs to.
    #[must_use]
    pub const fn household_id(&self) -> HouseholdId {
        self.0.household_id()
    }

    /// Checks that the household in the path is the session's household.
    pub fn authorize(&self, household: HouseholdId) -> Result<HouseholdId, ApiError> {
        if household == self.household_id() {
            Ok(household)
        } else {
            Err(ApiError::forbidden(
                "This session does not belong to the requested household",
            ))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_authorize_requires_matching_household() {
        let household = Uuid::now_v7();
        let auth = AuthUser(Claims::new(
            Uuid::now_v7(),
            household,
            Utc::now() + Duration::minutes(5),
        ));

        assert!(auth.authorize(HouseholdId::from_uuid(household)).is_ok());
        let err = auth.authorize(HouseholdId::new()).unwrap_err();
        assert_eq!(err.0.status_code(), 403);
    }
}
