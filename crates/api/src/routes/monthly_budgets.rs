//! Monthly budget routes.
//!
//! A month is addressed by `{year}/{month}` and is created from the active
//! template the first time it is read.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use nestegg_core::budget::{BudgetComparison, MonthlyBudget};
use nestegg_core::period::YearMonth;
use nestegg_db::MonthlyBudgetRepository;
use nestegg_shared::types::HouseholdId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::retrying;
use crate::{
    AppState,
    error::ApiResult,
    extractors::{ApiJson, ApiPath},
    middleware::AuthUser,
};

/// Creates the monthly budget routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/households/{household_id}/monthly-budgets/{year}/{month}",
            get(get_month),
        )
        .route(
            "/households/{household_id}/monthly-budgets/{year}/{month}/categories/{category}",
            put(update_category_limit),
        )
        .route(
            "/households/{household_id}/monthly-budgets/{year}/{month}/lock",
            post(lock_month),
        )
        .route(
            "/households/{household_id}/monthly-budgets/{year}/{month}/unlock",
            post(unlock_month),
        )
        .route(
            "/households/{household_id}/monthly-budgets/{year}/{month}/resync",
            post(resync_month),
        )
        .route(
            "/households/{household_id}/monthly-budgets/{year}/{month}/comparison",
            get(compare_month),
        )
}

/// Request body for changing one category's limit.
#[derive(Debug, Deserialize)]
pub struct UpdateLimitRequest {
    /// New limit; zero is allowed.
    pub monthly_limit: Decimal,
    /// Revision the client last saw. A mismatch is a conflict.
    pub expected_revision: Option<i32>,
}

/// Response for a changed category limit.
#[derive(Debug, Serialize)]
pub struct UpdateLimitResponse {
    /// The month after the change.
    pub monthly: MonthlyBudget,
    /// Limit before the change.
    pub previous_limit: Decimal,
}

type MonthPath = (HouseholdId, i32, u32);

fn scope(auth: &AuthUser, (household_id, year, month): MonthPath) -> ApiResult<(HouseholdId, YearMonth)> {
    let household = auth.authorize(household_id)?;
    Ok((household, YearMonth::new(year, month)?))
}

/// GET `/households/{household_id}/monthly-budgets/{year}/{month}`
async fn get_month(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(path): ApiPath<MonthPath>,
) -> ApiResult<Json<MonthlyBudget>> {
    let (household, period) = scope(&auth, path)?;
    let repo = MonthlyBudgetRepository::new(state.conn());
    let monthly = retrying(&state, "get_or_sync_month", || repo.get_or_sync(household, period)).await?;
    Ok(Json(monthly))
}

/// PUT `/households/{household_id}/monthly-budgets/{year}/{month}/categories/{category}`
async fn update_category_limit(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((household_id, year, month, category)): ApiPath<(HouseholdId, i32, u32, String)>,
    ApiJson(body): ApiJson<UpdateLimitRequest>,
) -> ApiResult<Json<UpdateLimitResponse>> {
    let (household, period) = scope(&auth, (household_id, year, month))?;
    let repo = MonthlyBudgetRepository::new(state.conn());
    let (monthly, previous_limit) = retrying(&state, "update_month_category_limit", || {
        repo.update_category_limit(
            household,
            period,
            &category,
            body.monthly_limit,
            body.expected_revision,
        )
    })
    .await?;
    state.views.invalidate_household(household);
    Ok(Json(UpdateLimitResponse {
        monthly,
        previous_limit,
    }))
}

/// POST `/households/{household_id}/monthly-budgets/{year}/{month}/lock`
async fn lock_month(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(path): ApiPath<MonthPath>,
) -> ApiResult<Json<MonthlyBudget>> {
    let (household, period) = scope(&auth, path)?;
    let repo = MonthlyBudgetRepository::new(state.conn());
    let monthly = retrying(&state, "lock_month", || repo.lock(household, period)).await?;
    state.views.invalidate_household(household);
    Ok(Json(monthly))
}

/// POST `/households/{household_id}/monthly-budgets/{year}/{month}/unlock`
async fn unlock_month(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(path): ApiPath<MonthPath>,
) -> ApiResult<Json<MonthlyBudget>> {
    let (household, period) = scope(&auth, path)?;
    let repo = MonthlyBudgetRepository::new(state.conn());
    let monthly = retrying(&state, "unlock_month", || repo.unlock(household, period)).await?;
    state.views.invalidate_household(household);
    Ok(Json(monthly))
}

/// POST `/households/{household_id}/monthly-budgets/{year}/{month}/resync`
async fn resync_month(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(path): ApiPath<MonthPath>,
) -> ApiResult<Json<MonthlyBudget>> {
    let (household, period) = scope(&auth, path)?;
    let repo = MonthlyBudgetRepository::new(state.conn());
    let monthly = retrying(&state, "resync_month", || repo.resync(household, period)).await?;
    state.views.invalidate_household(household);
    Ok(Json(monthly))
}

/// GET `/households/{household_id}/monthly-budgets/{year}/{month}/comparison`
async fn compare_month(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(path): ApiPath<MonthPath>,
) -> ApiResult<Json<BudgetComparison>> {
    let (household, period) = scope(&auth, path)?;
    let repo = MonthlyBudgetRepository::new(state.conn());
    let comparison = retrying(&state, "compare_month", || repo.compare(household, period)).await?;
    Ok(Json(comparison))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, send, token};
    use axum::body::Body;
    use axum::http::Request;
    use rstest::rstest;
    use uuid::Uuid;

    #[rstest]
    #[case("2026/13")]
    #[case("2026/0")]
    #[case("1800/5")]
    #[tokio::test]
    async fn test_invalid_month_is_rejected(#[case] period: &str) {
        let (app, state) = app();
        let household = Uuid::now_v7();
        let request = Request::get(format!("/api/v1/households/{household}/monthly-budgets/{period}"))
            .header("Authorization", format!("Bearer {}", token(&state, household)))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_non_numeric_limit_is_rejected() {
        let (app, state) = app();
        let household = Uuid::now_v7();
        let request = Request::put(format!(
            "/api/v1/households/{household}/monthly-budgets/2026/1/categories/Food"
        ))
        .header("Authorization", format!("Bearer {}", token(&state, household)))
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"monthly_limit": "lots"}"#))
        .unwrap();

        let (status, _) = send(&app, request).await;

        assert_eq!(status, 400);
    }
}
