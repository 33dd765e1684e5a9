//! API route definitions.

use std::future::Future;

use axum::{Router, middleware};
use nestegg_db::{StoreResult, with_retry};

use crate::{AppState, error::ApiResult, middleware::auth_middleware};

pub mod adjustments;
pub mod categories;
pub mod dashboard;
pub mod health;
pub mod monthly_budgets;
pub mod personal_budgets;
pub mod transactions;

/// Creates the API router; household routes sit behind the auth middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(personal_budgets::routes())
        .merge(monthly_budgets::routes())
        .merge(adjustments::routes())
        .merge(transactions::routes())
        .merge(categories::routes())
        .merge(dashboard::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(transactions::guest_routes())
        .merge(protected_routes)
}

/// Runs a repository call with the configured retry policy.
pub(crate) async fn retrying<F, Fut, T>(state: &AppState, operation: &str, f: F) -> ApiResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    Ok(with_retry(state.retry, operation, f).await?)
}
