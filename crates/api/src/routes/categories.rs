//! Category routes.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use nestegg_core::budget::BudgetError;
use nestegg_core::category::CategoryMap;
use nestegg_core::color;
use nestegg_db::{
    CategoryRepository, PersonalBudgetRepository, RenameReport, StoreError, with_retry,
};
use nestegg_shared::types::HouseholdId;
use serde::{Deserialize, Serialize};

use super::retrying;
use crate::{
    AppState,
    error::ApiResult,
    extractors::{ApiJson, ApiPath},
    middleware::AuthUser,
};

/// Creates the category routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/households/{household_id}/categories", get(list_categories))
        .route(
            "/households/{household_id}/categories/next-color",
            get(next_color),
        )
        .route(
            "/households/{household_id}/categories/rename",
            post(rename_category),
        )
}

/// Request body for renaming or merging a category.
#[derive(Debug, Clone, Deserialize)]
pub struct RenameRequest {
    /// Current name.
    pub from: String,
    /// New name. Merges into an existing category of that name.
    pub to: String,
}

/// Suggested color for a new category.
#[derive(Debug, Serialize)]
pub struct ColorSuggestion {
    /// Hex color, `#RRGGBB`.
    pub color: String,
}

/// GET `/households/{household_id}/categories` - Categories of the active template.
async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(household_id): ApiPath<HouseholdId>,
) -> ApiResult<Json<CategoryMap>> {
    let household = auth.authorize(household_id)?;
    let repo = PersonalBudgetRepository::new(state.conn());
    let active = retrying(&state, "get_active_budget", || repo.get_active(household)).await?;
    Ok(Json(active.categories))
}

/// GET `/households/{household_id}/categories/next-color`
async fn next_color(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(household_id): ApiPath<HouseholdId>,
) -> ApiResult<Json<ColorSuggestion>> {
    let household = auth.authorize(household_id)?;
    let repo = PersonalBudgetRepository::new(state.conn());
    let used: Vec<String> =
        match with_retry(state.retry, "get_active_budget", || repo.get_active(household)).await {
            Ok(active) => active
                .categories
                .into_values()
                .map(|config| config.color)
                .filter(|color| !color.is_empty())
                .collect(),
            Err(StoreError::Budget(BudgetError::NoActiveBudget)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };
    Ok(Json(ColorSuggestion {
        color: color::next_color(&used),
    }))
}

/// POST `/households/{household_id}/categories/rename` - Cascade a rename or merge.
async fn rename_category(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(household_id): ApiPath<HouseholdId>,
    ApiJson(request): ApiJson<RenameRequest>,
) -> ApiResult<Json<RenameReport>> {
    let household = auth.authorize(household_id)?;
    let repo = CategoryRepository::new(state.conn());
    let report = retrying(&state, "rename_category", || {
        repo.rename(household, &request.from, &request.to)
    })
    .await?;
    if report.touched() > 0 {
        state.views.invalidate_household(household);
    }
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, send, token};
    use axum::body::Body;
    use axum::http::Request;
    use nestegg_shared::types::HouseholdId;

    #[tokio::test]
    async fn test_rename_rejects_missing_fields() {
        let (app, state) = app();
        let household = HouseholdId::new();
        let request = Request::post(format!("/api/v1/households/{household}/categories/rename"))
            .header("Authorization", format!("Bearer {}", token(&state, household.into_inner())))
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"from":"Food"}"#))
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_categories_require_token() {
        let (app, _) = app();
        let request = Request::get(format!("/api/v1/households/{}/categories", HouseholdId::new()))
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(&app, request).await;

        assert_eq!(status, 401);
    }
}
