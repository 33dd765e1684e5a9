//! Session claims issued by the authentication provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{HouseholdId, UserId};

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Household the session is scoped to.
    pub hh: Uuid,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a household member.
    #[must_use]
    pub fn new(user_id: Uuid, household_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            hh: household_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }

    /// Returns the household ID from claims.
    #[must_use]
    pub const fn household_id(&self) -> HouseholdId {
        HouseholdId::from_uuid(self.hh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_accessors() {
        let user = Uuid::new_v4();
        let household = Uuid::new_v4();
        let claims = Claims::new(user, household, Utc::now() + Duration::minutes(5));

        assert_eq!(claims.user_id().into_inner(), user);
        assert_eq!(claims.household_id().into_inner(), household);
        assert!(claims.exp > claims.iat);
    }
}
