//! Dashboard view caching using Moka.
//!
//! Overviews are cached per (household, month) and dropped for a whole
//! household whenever any of its data changes.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use nestegg_core::dashboard::MonthlyOverview;
use nestegg_core::period::YearMonth;
use nestegg_shared::types::HouseholdId;

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Default time-to-live for cache entries (1 minute).
const DEFAULT_TTL_SECS: u64 = 60;

/// Cache for dashboard overviews.
#[derive(Clone)]
pub struct ViewCache {
    overviews: Cache<(HouseholdId, YearMonth), Arc<MonthlyOverview>>,
}

impl ViewCache {
    /// Creates a cache with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and time-to-live.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let overviews = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .support_invalidation_closures()
            .build();
        Self { overviews }
    }

    /// Cached overview, if present.
    pub async fn overview(
        &self,
        household: HouseholdId,
        period: YearMonth,
    ) -> Option<Arc<MonthlyOverview>> {
        self.overviews.get(&(household, period)).await
    }

    /// Stores an overview.
    pub async fn store_overview(
        &self,
        household: HouseholdId,
        period: YearMonth,
        overview: Arc<MonthlyOverview>,
    ) {
        self.overviews.insert((household, period), overview).await;
    }

    /// Drops every cached view of a household.
    pub fn invalidate_household(&self, household: HouseholdId) {
        if let Err(e) = self
            .overviews
            .invalidate_entries_if(move |(owner, _), _| *owner == household)
        {
            tracing::warn!(household_id = %household, error = %e, "Falling back to full cache flush");
            self.overviews.invalidate_all();
        }
    }

    /// Runs pending maintenance so counts and evictions are up to date.
    pub async fn run_pending_tasks(&self) {
        self.overviews.run_pending_tasks().await;
    }

    /// Number of cached entries.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.overviews.entry_count()
    }
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestegg_core::dashboard::MonthlyOverview;
    use rust_decimal::Decimal;

    fn overview(period: YearMonth) -> Arc<MonthlyOverview> {
        Arc::new(MonthlyOverview {
            period,
            currency: "USD".into(),
            total_income: Decimal::ZERO,
            total_expense: Decimal::ZERO,
            net: Decimal::ZERO,
            total_limit: Decimal::ZERO,
            income_label: "$0.00".into(),
            expense_label: "$0.00".into(),
            net_label: "$0.00".into(),
            is_locked: false,
            categories: Vec::new(),
        })
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = ViewCache::new();
        let household = HouseholdId::new();
        let jan = YearMonth::new(2026, 1).unwrap();

        assert!(cache.overview(household, jan).await.is_none());
        cache.store_overview(household, jan, overview(jan)).await;
        assert_eq!(cache.overview(household, jan).await.unwrap().period, jan);
    }

    #[tokio::test]
    async fn test_invalidate_household_keeps_others() {
        let cache = ViewCache::new();
        let alice = HouseholdId::new();
        let bob = HouseholdId::new();
        let jan = YearMonth::new(2026, 1).unwrap();
        let feb = YearMonth::new(2026, 2).unwrap();

        cache.store_overview(alice, jan, overview(jan)).await;
        cache.store_overview(alice, feb, overview(feb)).await;
        cache.store_overview(bob, jan, overview(jan)).await;

        cache.invalidate_household(alice);
        cache.run_pending_tasks().await;

        assert!(cache.overview(alice, jan).await.is_none());
        assert!(cache.overview(alice, feb).await.is_none());
        assert!(cache.overview(bob, jan).await.is_some());
    }
}
