//! Dashboard routes.
//!
//! Monthly overviews are served from the view cache when possible and
//! rebuilt from the month's snapshot and transactions otherwise.

use std::str::FromStr;
use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;
use nestegg_core::budget::{BudgetError, BudgetSettings};
use nestegg_core::dashboard::{self, MonthlyOverview, TrendPoint};
use nestegg_core::period::YearMonth;
use nestegg_core::transaction::MonthWindow;
use nestegg_db::{
    MonthlyBudgetRepository, PersonalBudgetRepository, StoreError, TransactionRepository,
    TransactionStore, with_retry,
};
use nestegg_shared::types::HouseholdId;
use serde::Deserialize;

use super::retrying;
use crate::{
    AppState,
    error::ApiResult,
    extractors::{ApiPath, ApiQuery},
    middleware::AuthUser,
};

const DEFAULT_TREND_MONTHS: u32 = 6;
const MAX_TREND_MONTHS: u32 = 24;

/// Creates the dashboard routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/households/{household_id}/dashboard/trend",
            get(get_trend),
        )
        .route(
            "/households/{household_id}/dashboard/{year}/{month}",
            get(get_overview),
        )
}

/// Query parameters for the trend chart.
#[derive(Debug, Default, Deserialize)]
pub struct TrendQuery {
    /// Number of months, newest last.
    pub months: Option<u32>,
    /// Last month of the chart, `YYYY-MM`. Defaults to the current month.
    pub anchor: Option<String>,
}

impl TrendQuery {
    /// Months to chart, oldest first.
    fn periods(&self, today: YearMonth) -> ApiResult<Vec<YearMonth>> {
        let anchor = match self.anchor.as_deref() {
            Some(raw) => YearMonth::from_str(raw.trim())?,
            None => today,
        };
        let count = self
            .months
            .unwrap_or(DEFAULT_TREND_MONTHS)
            .clamp(1, MAX_TREND_MONTHS);
        Ok((0..count).rev().map(|back| anchor.minus_months(back)).collect())
    }
}

async fn template_settings(state: &AppState, household: HouseholdId) -> ApiResult<BudgetSettings> {
    let repo = PersonalBudgetRepository::new(state.conn());
    match with_retry(state.retry, "get_active_budget", || repo.get_active(household)).await {
        Ok(active) => Ok(active.settings),
        Err(StoreError::Budget(BudgetError::NoActiveBudget)) => Ok(BudgetSettings::default()),
        Err(e) => Err(e.into()),
    }
}

/// GET `/households/{household_id}/dashboard/{year}/{month}` - Monthly overview.
async fn get_overview(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((household_id, year, month)): ApiPath<(HouseholdId, i32, u32)>,
) -> ApiResult<Json<MonthlyOverview>> {
    let household = auth.authorize(household_id)?;
    let period = YearMonth::new(year, month)?;

    if let Some(cached) = state.views.overview(household, period).await {
        tracing::debug!(household_id = %household, %period, "Dashboard cache hit");
        return Ok(Json(cached.as_ref().clone()));
    }

    let months = MonthlyBudgetRepository::new(state.conn());
    let monthly = retrying(&state, "get_or_sync_month", || {
        months.get_or_sync(household, period)
    })
    .await?;
    let settings = template_settings(&state, household).await?;

    let store = TransactionRepository::new(state.conn());
    let window = Some(MonthWindow::of(period));
    let transactions = retrying(&state, "list_transactions", || {
        store.list(household.into_inner(), window)
    })
    .await?;

    let overview = Arc::new(dashboard::build_overview(&monthly, &transactions, &settings)?);
    state
        .views
        .store_overview(household, period, Arc::clone(&overview))
        .await;
    Ok(Json(overview.as_ref().clone()))
}

/// GET `/households/{household_id}/dashboard/trend` - Income and expense per month.
async fn get_trend(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(household_id): ApiPath<HouseholdId>,
    ApiQuery(query): ApiQuery<TrendQuery>,
) -> ApiResult<Json<Vec<TrendPoint>>> {
    let household = auth.authorize(household_id)?;
    let periods = query.periods(YearMonth::from_date(Utc::now().date_naive()))?;
    let (Some(first), Some(last)) = (periods.first(), periods.last()) else {
        return Ok(Json(Vec::new()));
    };
    let window = Some(MonthWindow {
        start: first.first_day(),
        end: last.last_day(),
    });

    let store = TransactionRepository::new(state.conn());
    let transactions = retrying(&state, "list_transactions", || {
        store.list(household.into_inner(), window)
    })
    .await?;
    Ok(Json(dashboard::monthly_trend(&transactions, &periods)))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, send, token};
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use rstest::rstest;
    use uuid::Uuid;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn test_trend_periods_oldest_first() {
        let query = TrendQuery {
            months: Some(3),
            anchor: Some("2026-02".into()),
        };
        let periods = query.periods(ym(2030, 1)).unwrap();
        assert_eq!(periods, vec![ym(2025, 12), ym(2026, 1), ym(2026, 2)]);
    }

    #[rstest]
    #[case(None, DEFAULT_TREND_MONTHS as usize)]
    #[case(Some(0), 1)]
    #[case(Some(500), MAX_TREND_MONTHS as usize)]
    fn test_trend_month_count_is_clamped(#[case] months: Option<u32>, #[case] expected: usize) {
        let query = TrendQuery { months, anchor: None };
        let periods = query.periods(ym(2026, 6)).unwrap();
        assert_eq!(periods.len(), expected);
        assert_eq!(periods.last(), Some(&ym(2026, 6)));
    }

    #[test]
    fn test_trend_rejects_bad_anchor() {
        let query = TrendQuery {
            months: None,
            anchor: Some("06/2026".into()),
        };
        assert!(query.periods(ym(2026, 6)).is_err());
    }

    #[rstest]
    #[case("2026/0")]
    #[case("2026/13")]
    #[case("1969/5")]
    #[tokio::test]
    async fn test_overview_rejects_invalid_month(#[case] suffix: &str) {
        let (app, state) = app();
        let household = Uuid::now_v7();
        let request = Request::get(format!("/api/v1/households/{household}/dashboard/{suffix}"))
            .header("Authorization", format!("Bearer {}", token(&state, household)))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, request).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}
