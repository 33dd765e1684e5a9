//! Scheduled adjustment routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
};
use nestegg_core::budget::{
    AdjustmentStatus, BudgetAdjustment, CategoryActivity, HistoryEntry, ScheduleAdjustment,
    Scheduled,
};
use nestegg_core::period::YearMonth;
use nestegg_db::{AdjustmentRepository, ApplyOutcome};
use nestegg_shared::types::{AdjustmentId, HouseholdId};
use serde::{Deserialize, Serialize};

use super::retrying;
use crate::{
    AppState,
    error::ApiResult,
    extractors::{ApiJson, ApiPath, ApiQuery},
    middleware::AuthUser,
};

const DEFAULT_TOP_LIMIT: usize = 5;
const MAX_TOP_LIMIT: usize = 50;

/// Creates the adjustment routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/households/{household_id}/adjustments",
            get(list_adjustments).post(schedule_adjustment),
        )
        .route(
            "/households/{household_id}/adjustments/apply",
            post(apply_adjustments),
        )
        .route(
            "/households/{household_id}/adjustments/most-adjusted",
            get(most_adjusted),
        )
        .route(
            "/households/{household_id}/adjustments/history/{category}",
            get(category_history),
        )
        .route(
            "/households/{household_id}/adjustments/{adjustment_id}",
            delete(cancel_adjustment),
        )
}

/// Query parameters for listing adjustments.
#[derive(Debug, Deserialize)]
pub struct ListAdjustmentsQuery {
    /// `pending` or `applied`.
    pub status: Option<AdjustmentStatus>,
}

/// Request body for applying a month's adjustments.
#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    /// Target year.
    pub year: i32,
    /// Target month, 1-12.
    pub month: u32,
}

/// Query parameters for the most adjusted categories.
#[derive(Debug, Deserialize)]
pub struct MostAdjustedQuery {
    /// Number of categories to return.
    pub limit: Option<usize>,
}

/// Response for a scheduled adjustment.
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    /// The stored pending adjustment.
    pub adjustment: BudgetAdjustment,
    /// True if an earlier pending adjustment for the same category and
    /// month was replaced.
    pub superseded: bool,
}

/// GET `/households/{household_id}/adjustments` - Optionally filtered by `?status=`.
async fn list_adjustments(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(household_id): ApiPath<HouseholdId>,
    ApiQuery(query): ApiQuery<ListAdjustmentsQuery>,
) -> ApiResult<Json<Vec<BudgetAdjustment>>> {
    let household = auth.authorize(household_id)?;
    let repo = AdjustmentRepository::new(state.conn());
    let adjustments =
        retrying(&state, "list_adjustments", || repo.list(household, query.status)).await?;
    Ok(Json(adjustments))
}

/// POST `/households/{household_id}/adjustments` - Schedule a limit change.
async fn schedule_adjustment(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(household_id): ApiPath<HouseholdId>,
    ApiJson(input): ApiJson<ScheduleAdjustment>,
) -> ApiResult<(StatusCode, Json<ScheduleResponse>)> {
    let household = auth.authorize(household_id)?;
    let repo = AdjustmentRepository::new(state.conn());
    let scheduled = retrying(&state, "schedule_adjustment", || {
        repo.schedule(household, auth.user_id(), input.clone())
    })
    .await?;

    let (status, response) = match scheduled {
        Scheduled::Created(adjustment) => (
            StatusCode::CREATED,
            ScheduleResponse {
                adjustment,
                superseded: false,
            },
        ),
        Scheduled::Superseded(adjustment) => (
            StatusCode::OK,
            ScheduleResponse {
                adjustment,
                superseded: true,
            },
        ),
    };
    Ok((status, Json(response)))
}

/// POST `/households/{household_id}/adjustments/apply` - Apply a month's due adjustments.
async fn apply_adjustments(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(household_id): ApiPath<HouseholdId>,
    ApiJson(body): ApiJson<ApplyRequest>,
) -> ApiResult<Json<ApplyOutcome>> {
    let household = auth.authorize(household_id)?;
    let period = YearMonth::new(body.year, body.month)?;
    let repo = AdjustmentRepository::new(state.conn());
    let outcome = retrying(&state, "apply_adjustments", || repo.apply(household, period)).await?;
    if !outcome.applied.is_empty() {
        state.views.invalidate_household(household);
    }
    Ok(Json(outcome))
}

/// DELETE `/households/{household_id}/adjustments/{adjustment_id}` - Cancel a pending adjustment.
async fn cancel_adjustment(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((household_id, adjustment_id)): ApiPath<(HouseholdId, AdjustmentId)>,
) -> ApiResult<StatusCode> {
    let household = auth.authorize(household_id)?;
    let repo = AdjustmentRepository::new(state.conn());
    retrying(&state, "cancel_adjustment", || {
        repo.cancel(household, adjustment_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/households/{household_id}/adjustments/history/{category}`
async fn category_history(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((household_id, category)): ApiPath<(HouseholdId, String)>,
) -> ApiResult<Json<Vec<HistoryEntry>>> {
    let household = auth.authorize(household_id)?;
    let repo = AdjustmentRepository::new(state.conn());
    let history = retrying(&state, "category_history", || {
        repo.category_history(household, category.trim())
    })
    .await?;
    Ok(Json(history))
}

/// GET `/households/{household_id}/adjustments/most-adjusted` - Top categories by `?limit=`.
async fn most_adjusted(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(household_id): ApiPath<HouseholdId>,
    ApiQuery(query): ApiQuery<MostAdjustedQuery>,
) -> ApiResult<Json<Vec<CategoryActivity>>> {
    let household = auth.authorize(household_id)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TOP_LIMIT)
        .clamp(1, MAX_TOP_LIMIT);
    let repo = AdjustmentRepository::new(state.conn());
    let ranked = retrying(&state, "most_adjusted", || repo.most_adjusted(household, limit)).await?;
    Ok(Json(ranked))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, send, token};
    use axum::body::Body;
    use axum::http::Request;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_unknown_status_filter_is_rejected() {
        let (app, state) = app();
        let household = Uuid::now_v7();
        let request = Request::get(format!("/api/v1/households/{household}/adjustments?status=done"))
            .header("Authorization", format!("Bearer {}", token(&state, household)))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_apply_rejects_invalid_month() {
        let (app, state) = app();
        let household = Uuid::now_v7();
        let request = Request::post(format!("/api/v1/households/{household}/adjustments/apply"))
            .header("Authorization", format!("Bearer {}", token(&state, household)))
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"year": 2026, "month": 14}"#))
            .unwrap();

        let (status, _) = send(&app, request).await;

        assert_eq!(status, 400);
    }
}
