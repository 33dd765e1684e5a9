//! Transaction routes for households and guests.
//!
//! Household transactions are stored in PostgreSQL. Requests without a
//! session use the `/guest` routes, which keep data in process memory keyed
//! by the `X-Guest-Id` header.

use std::collections::BTreeSet;
use std::str::FromStr;

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use chrono::Utc;
use nestegg_core::period::YearMonth;
use nestegg_core::transaction::{
    self, MonthSelector, MonthWindow, Transaction, TransactionFilters, TransactionInput,
    TransactionType, carousel_months,
};
use nestegg_db::{TransactionRepository, TransactionStore};
use nestegg_shared::types::{HouseholdId, PageRequest, PageResponse, TransactionId};
use serde::Deserialize;
use uuid::Uuid;

use super::retrying;
use crate::{
    AppState,
    error::ApiResult,
    extractors::{ApiJson, ApiPath, ApiQuery},
    middleware::{AuthUser, GuestId},
};

const DEFAULT_SPAN: usize = 12;
const MAX_SPAN: usize = 120;

/// Creates the household transaction routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/households/{household_id}/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/households/{household_id}/transactions/{transaction_id}",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
}

/// Creates the session-less guest routes.
pub fn guest_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/guest/transactions",
            get(list_guest_transactions).post(create_guest_transaction),
        )
        .route(
            "/guest/transactions/{transaction_id}",
            get(get_guest_transaction)
                .put(update_guest_transaction)
                .delete(delete_guest_transaction),
        )
}

/// Query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// `carousel-N` or `YYYY-MM`.
    pub month: Option<String>,
    /// First carousel month, `YYYY-MM`. Defaults to the current month.
    pub anchor: Option<String>,
    /// Number of carousel months.
    pub span: Option<usize>,
    /// Comma-separated types.
    pub types: Option<String>,
    /// Comma-separated family members.
    pub members: Option<String>,
    /// Comma-separated categories.
    pub categories: Option<String>,
    /// Page number, 1-indexed.
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

fn split_list(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// A parsed list request.
#[derive(Debug)]
struct ListPlan {
    filters: TransactionFilters,
    months: Vec<MonthWindow>,
    page: PageRequest,
}

impl ListPlan {
    fn parse(query: &ListTransactionsQuery, today: YearMonth) -> ApiResult<Self> {
        let anchor = match query.anchor.as_deref() {
            Some(raw) => YearMonth::from_str(raw.trim())?,
            None => today,
        };
        let span = query.span.unwrap_or(DEFAULT_SPAN).clamp(1, MAX_SPAN);
        let types = split_list(query.types.as_deref())
            .iter()
            .map(|raw| TransactionType::from_str(raw))
            .collect::<Result<BTreeSet<_>, _>>()?;

        let defaults = PageRequest::default();
        Ok(Self {
            filters: TransactionFilters {
                month: query.month.as_deref().map(MonthSelector::parse),
                types,
                members: split_list(query.members.as_deref()),
                categories: split_list(query.categories.as_deref()),
            },
            months: carousel_months(anchor, span),
            page: PageRequest {
                page: query.page.unwrap_or(defaults.page),
                per_page: query.per_page.unwrap_or(defaults.per_page),
            },
        })
    }

    /// Date range worth loading from storage. `Err(())` means the selection
    /// cannot match anything.
    fn window(&self) -> Result<Option<MonthWindow>, ()> {
        match &self.filters.month {
            Some(MonthSelector::Carousel(index)) => {
                self.months.get(*index).copied().map(Some).ok_or(())
            }
            Some(MonthSelector::Literal(period)) => Ok(Some(MonthWindow::of(*period))),
            Some(MonthSelector::Malformed(_)) | None => Ok(None),
        }
    }
}

async fn list_from<S: TransactionStore + ?Sized>(
    state: &AppState,
    store: &S,
    owner: Uuid,
    query: &ListTransactionsQuery,
) -> ApiResult<PageResponse<Transaction>> {
    let plan = ListPlan::parse(query, YearMonth::from_date(Utc::now().date_naive()))?;
    let Ok(window) = plan.window() else {
        return Ok(PageResponse::from_items(Vec::new(), &plan.page));
    };
    let loaded = retrying(state, "list_transactions", || store.list(owner, window)).await?;
    let filtered = transaction::apply(loaded, &plan.filters, &plan.months);
    Ok(PageResponse::from_items(filtered, &plan.page))
}

// ============================================================================
// Household routes
// ============================================================================

/// GET `/households/{household_id}/transactions` - Filtered and paginated.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(household_id): ApiPath<HouseholdId>,
    ApiQuery(query): ApiQuery<ListTransactionsQuery>,
) -> ApiResult<Json<PageResponse<Transaction>>> {
    let household = auth.authorize(household_id)?;
    let store = TransactionRepository::new(state.conn());
    let page = list_from(&state, &store, household.into_inner(), &query).await?;
    Ok(Json(page))
}

/// POST `/households/{household_id}/transactions`
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(household_id): ApiPath<HouseholdId>,
    ApiJson(input): ApiJson<TransactionInput>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let household = auth.authorize(household_id)?;
    let store = TransactionRepository::new(state.conn());
    let created_by = Some(auth.user_id().into_inner());
    let transaction = retrying(&state, "create_transaction", || {
        store.create(household.into_inner(), created_by, input.clone())
    })
    .await?;
    state.views.invalidate_household(household);
    tracing::info!(household_id = %household, transaction_id = %transaction.id, "Transaction recorded");
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// GET `/households/{household_id}/transactions/{transaction_id}`
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((household_id, transaction_id)): ApiPath<(HouseholdId, TransactionId)>,
) -> ApiResult<Json<Transaction>> {
    let household = auth.authorize(household_id)?;
    let store = TransactionRepository::new(state.conn());
    let transaction = retrying(&state, "get_transaction", || {
        store.get(household.into_inner(), transaction_id)
    })
    .await?;
    Ok(Json(transaction))
}

/// PUT `/households/{household_id}/transactions/{transaction_id}`
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((household_id, transaction_id)): ApiPath<(HouseholdId, TransactionId)>,
    ApiJson(input): ApiJson<TransactionInput>,
) -> ApiResult<Json<Transaction>> {
    let household = auth.authorize(household_id)?;
    let store = TransactionRepository::new(state.conn());
    let transaction = retrying(&state, "update_transaction", || {
        store.update(household.into_inner(), transaction_id, input.clone())
    })
    .await?;
    state.views.invalidate_household(household);
    Ok(Json(transaction))
}

/// DELETE `/households/{household_id}/transactions/{transaction_id}`
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((household_id, transaction_id)): ApiPath<(HouseholdId, TransactionId)>,
) -> ApiResult<StatusCode> {
    let household = auth.authorize(household_id)?;
    let store = TransactionRepository::new(state.conn());
    retrying(&state, "delete_transaction", || {
        store.delete(household.into_inner(), transaction_id)
    })
    .await?;
    state.views.invalidate_household(household);
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Guest routes
// ============================================================================

/// GET `/guest/transactions`
async fn list_guest_transactions(
    State(state): State<AppState>,
    GuestId(guest): GuestId,
    ApiQuery(query): ApiQuery<ListTransactionsQuery>,
) -> ApiResult<Json<PageResponse<Transaction>>> {
    let page = list_from(&state, &state.guest_transactions, guest, &query).await?;
    Ok(Json(page))
}

/// POST `/guest/transactions`
async fn create_guest_transaction(
    State(state): State<AppState>,
    GuestId(guest): GuestId,
    ApiJson(input): ApiJson<TransactionInput>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let transaction = state.guest_transactions.create(guest, None, input).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// GET `/guest/transactions/{transaction_id}`
async fn get_guest_transaction(
    State(state): State<AppState>,
    GuestId(guest): GuestId,
    ApiPath(transaction_id): ApiPath<TransactionId>,
) -> ApiResult<Json<Transaction>> {
    Ok(Json(state.guest_transactions.get(guest, transaction_id).await?))
}

/// PUT `/guest/transactions/{transaction_id}`
async fn update_guest_transaction(
    State(state): State<AppState>,
    GuestId(guest): GuestId,
    ApiPath(transaction_id): ApiPath<TransactionId>,
    ApiJson(input): ApiJson<TransactionInput>,
) -> ApiResult<Json<Transaction>> {
    let transaction = state
        .guest_transactions
        .update(guest, transaction_id, input)
        .await?;
    Ok(Json(transaction))
}

/// DELETE `/guest/transactions/{transaction_id}`
async fn delete_guest_transaction(
    State(state): State<AppState>,
    GuestId(guest): GuestId,
    ApiPath(transaction_id): ApiPath<TransactionId>,
) -> ApiResult<StatusCode> {
    state.guest_transactions.delete(guest, transaction_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
