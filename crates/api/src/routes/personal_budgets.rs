//! Personal budget (template) routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use nestegg_core::budget::{NewPersonalBudget, PersonalBudget, UpdatePersonalBudget};
use nestegg_db::PersonalBudgetRepository;
use nestegg_shared::types::{HouseholdId, PersonalBudgetId};
use serde::Serialize;

use super::retrying;
use crate::{
    AppState,
    error::ApiResult,
    extractors::{ApiJson, ApiPath},
    middleware::AuthUser,
};

/// Creates the personal budget routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/households/{household_id}/personal-budgets",
            get(list_budgets).post(create_budget),
        )
        .route(
            "/households/{household_id}/personal-budgets/active",
            get(get_active_budget),
        )
        .route(
            "/households/{household_id}/personal-budgets/{budget_id}",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
        .route(
            "/households/{household_id}/personal-budgets/{budget_id}/activate",
            post(activate_budget),
        )
}

/// Response for a deleted version.
#[derive(Debug, Serialize)]
pub struct DeleteBudgetResponse {
    /// The deleted version.
    pub deleted: PersonalBudgetId,
    /// Version that became active, if the deleted one was active.
    pub promoted: Option<PersonalBudget>,
}

/// GET `/households/{household_id}/personal-budgets` - All versions, newest first.
async fn list_budgets(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(household_id): ApiPath<HouseholdId>,
) -> ApiResult<Json<Vec<PersonalBudget>>> {
    let household = auth.authorize(household_id)?;
    let repo = PersonalBudgetRepository::new(state.conn());
    let budgets = retrying(&state, "list_personal_budgets", || repo.list(household)).await?;
    Ok(Json(budgets))
}

/// POST `/households/{household_id}/personal-budgets` - New active version.
async fn create_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(household_id): ApiPath<HouseholdId>,
    ApiJson(input): ApiJson<NewPersonalBudget>,
) -> ApiResult<(StatusCode, Json<PersonalBudget>)> {
    let household = auth.authorize(household_id)?;
    let repo = PersonalBudgetRepository::new(state.conn());
    let budget = retrying(&state, "create_personal_budget", || {
        repo.create(household, auth.user_id(), input.clone())
    })
    .await?;
    state.views.invalidate_household(household);
    Ok((StatusCode::CREATED, Json(budget)))
}

/// GET `/households/{household_id}/personal-budgets/active` - The active version.
async fn get_active_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(household_id): ApiPath<HouseholdId>,
) -> ApiResult<Json<PersonalBudget>> {
    let household = auth.authorize(household_id)?;
    let repo = PersonalBudgetRepository::new(state.conn());
    let budget = retrying(&state, "get_active_budget", || repo.get_active(household)).await?;
    Ok(Json(budget))
}

/// GET `/households/{household_id}/personal-budgets/{budget_id}` - One version.
async fn get_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((household_id, budget_id)): ApiPath<(HouseholdId, PersonalBudgetId)>,
) -> ApiResult<Json<PersonalBudget>> {
    let household = auth.authorize(household_id)?;
    let repo = PersonalBudgetRepository::new(state.conn());
    let budget = retrying(&state, "get_personal_budget", || repo.get(household, budget_id)).await?;
    Ok(Json(budget))
}

/// PUT `/households/{household_id}/personal-budgets/{budget_id}` - Edit or re-version.
///
/// Changing limits, active flags or the category set returns a new version.
async fn update_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((household_id, budget_id)): ApiPath<(HouseholdId, PersonalBudgetId)>,
    ApiJson(updates): ApiJson<UpdatePersonalBudget>,
) -> ApiResult<Json<PersonalBudget>> {
    let household = auth.authorize(household_id)?;
    let repo = PersonalBudgetRepository::new(state.conn());
    let budget = retrying(&state, "update_personal_budget", || {
        repo.update(household, auth.user_id(), budget_id, updates.clone())
    })
    .await?;
    state.views.invalidate_household(household);
    Ok(Json(budget))
}

/// POST `/households/{household_id}/personal-budgets/{budget_id}/activate`
async fn activate_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((household_id, budget_id)): ApiPath<(HouseholdId, PersonalBudgetId)>,
) -> ApiResult<Json<PersonalBudget>> {
    let household = auth.authorize(household_id)?;
    let repo = PersonalBudgetRepository::new(state.conn());
    let budget = retrying(&state, "activate_personal_budget", || {
        repo.set_active(household, budget_id)
    })
    .await?;
    state.views.invalidate_household(household);
    Ok(Json(budget))
}

/// DELETE `/households/{household_id}/personal-budgets/{budget_id}`
async fn delete_budget(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((household_id, budget_id)): ApiPath<(HouseholdId, PersonalBudgetId)>,
) -> ApiResult<Json<DeleteBudgetResponse>> {
    let household = auth.authorize(household_id)?;
    let repo = PersonalBudgetRepository::new(state.conn());
    let promoted = retrying(&state, "delete_personal_budget", || {
        repo.delete(household, budget_id)
    })
    .await?;
    state.views.invalidate_household(household);
    Ok(Json(DeleteBudgetResponse {
        deleted: budget_id,
        promoted,
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, send, token};
    use axum::body::Body;
    use axum::http::Request;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (app, _) = app();
        let request = Request::get(format!("/api/v1/households/{}/personal-budgets", Uuid::now_v7()))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, 401);
        assert_eq!(body["error"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_other_household_is_forbidden() {
        let (app, state) = app();
        let request = Request::get(format!("/api/v1/households/{}/personal-budgets", Uuid::now_v7()))
            .header("Authorization", format!("Bearer {}", token(&state, Uuid::now_v7())))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, 403);
        assert_eq!(body["error"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let (app, state) = app();
        let household = Uuid::now_v7();
        let request = Request::post(format!("/api/v1/households/{household}/personal-budgets"))
            .header("Authorization", format!("Bearer {}", token(&state, household)))
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"name": 42}"#))
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_bad_budget_id_is_validation_error() {
        let (app, state) = app();
        let household = Uuid::now_v7();
        let request = Request::get(format!("/api/v1/households/{household}/personal-budgets/not-a-uuid"))
            .header("Authorization", format!("Bearer {}", token(&state, household)))
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(&app, request).await;

        assert_eq!(status, 400);
    }
}
