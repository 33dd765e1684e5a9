//! Scheduled category limit changes.
//!
//! An adjustment targets one category in one future month. It sits pending
//! until someone applies the month's adjustments; applying is idempotent.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::BudgetError;
use super::monthly::MonthlyBudget;
use crate::category;
use crate::period::YearMonth;

/// Maximum length of an adjustment reason, in characters.
pub const MAX_REASON_LEN: usize = 500;

/// Lifecycle of an adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentStatus {
    /// Waiting for its month.
    Pending,
    /// Written into the monthly budget.
    Applied,
}

/// A scheduled change to one category's limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAdjustment {
    /// Adjustment ID.
    pub id: Uuid,
    /// Owning household.
    pub household_id: Uuid,
    /// Category the change applies to.
    pub category: String,
    /// Limit when the change was scheduled.
    pub current_limit: Decimal,
    /// Limit after the change.
    pub new_limit: Decimal,
    /// Optional note.
    pub reason: Option<String>,
    /// Month the change lands in.
    pub target: YearMonth,
    /// Pending or applied.
    pub status: AdjustmentStatus,
    /// When it was applied.
    pub applied_at: Option<DateTime<Utc>>,
    /// User who scheduled it.
    pub created_by: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl BudgetAdjustment {
    /// New limit minus the limit at scheduling time.
    #[must_use]
    pub fn change(&self) -> Decimal {
        self.new_limit - self.current_limit
    }

    /// Returns true if still waiting to be applied.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == AdjustmentStatus::Pending
    }
}

/// Input for scheduling an adjustment.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleAdjustment {
    /// Category to change.
    pub category: String,
    /// Limit the caller sees today.
    pub current_limit: Decimal,
    /// Limit to set.
    pub new_limit: Decimal,
    /// Optional note.
    #[serde(default)]
    pub reason: Option<String>,
    /// Target month; next month when omitted.
    #[serde(default)]
    pub target: Option<YearMonth>,
}

/// Result of scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheduled {
    /// A new pending record.
    Created(BudgetAdjustment),
    /// An existing pending record for the same category and month was
    /// overwritten.
    Superseded(BudgetAdjustment),
}

impl Scheduled {
    /// The stored record.
    #[must_use]
    pub fn adjustment(&self) -> &BudgetAdjustment {
        match self {
            Self::Created(a) | Self::Superseded(a) => a,
        }
    }
}

/// Validates and builds a pending adjustment.
///
/// `pending` holds the household's pending adjustments; if one already
/// targets the same category and month it is updated instead of adding a
/// second record. `today` decides the default target and the earliest
/// allowed one.
pub fn schedule(
    input: ScheduleAdjustment,
    pending: &[BudgetAdjustment],
    household_id: Uuid,
    created_by: Uuid,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Scheduled, BudgetError> {
    let category = category::normalize_category_name(&input.category)?;
    category::check_limit(&category, input.new_limit)?;
    if input.current_limit < Decimal::ZERO {
        return Err(BudgetError::InvalidAdjustment(
            "current_limit cannot be negative".to_string(),
        ));
    }
    category::check_limit(&category, input.current_limit)?;
    let reason = input
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    if reason
        .as_ref()
        .is_some_and(|r| r.chars().count() > MAX_REASON_LEN)
    {
        return Err(BudgetError::InvalidAdjustment(
            "reason must be at most 500 characters".to_string(),
        ));
    }

    let current = YearMonth::from_date(today);
    let target = input.target.unwrap_or_else(|| current.next());
    if target < current {
        return Err(BudgetError::TargetInPast { target, current });
    }

    if let Some(existing) = pending
        .iter()
        .find(|a| a.is_pending() && a.category == category && a.target == target)
    {
        let mut superseded = existing.clone();
        superseded.current_limit = input.current_limit;
        superseded.new_limit = input.new_limit;
        superseded.reason = reason;
        superseded.updated_at = now;
        return Ok(Scheduled::Superseded(superseded));
    }

    Ok(Scheduled::Created(BudgetAdjustment {
        id: Uuid::now_v7(),
        household_id,
        category,
        current_limit: input.current_limit,
        new_limit: input.new_limit,
        reason,
        target,
        status: AdjustmentStatus::Pending,
        applied_at: None,
        created_by,
        created_at: now,
        updated_at: now,
    }))
}

/// Applies the pending adjustments that target `monthly`'s month.
///
/// Adjustments for other months and already-applied ones are ignored.
/// Returns the ids that were applied; an empty result leaves `monthly`
/// untouched. Fails without changing anything if the month has not started
/// yet or is locked.
pub fn apply_due(
    monthly: &mut MonthlyBudget,
    adjustments: &mut [BudgetAdjustment],
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Vec<Uuid>, BudgetError> {
    let period = monthly.period;
    ensure_due(period, today)?;

    let mut due: Vec<&mut BudgetAdjustment> = adjustments
        .iter_mut()
        .filter(|a| a.is_pending() && a.target == period)
        .collect();
    if due.is_empty() {
        return Ok(Vec::new());
    }
    monthly.ensure_unlocked()?;

    due.sort_by_key(|a| a.created_at);
    let mut applied = Vec::with_capacity(due.len());
    for adjustment in due {
        monthly.set_limit_or_insert(&adjustment.category, adjustment.new_limit);
        adjustment.status = AdjustmentStatus::Applied;
        adjustment.applied_at = Some(now);
        adjustment.updated_at = now;
        applied.push(adjustment.id);
    }
    monthly.record_adjustments(applied.len(), now);
    Ok(applied)
}

/// Fails if `period` has not started on `today`.
pub fn ensure_due(period: YearMonth, today: NaiveDate) -> Result<(), BudgetError> {
    if period > YearMonth::from_date(today) {
        return Err(BudgetError::AdjustmentNotDue(period));
    }
    Ok(())
}

/// Fails unless the adjustment can still be cancelled.
pub fn ensure_cancellable(adjustment: &BudgetAdjustment) -> Result<(), BudgetError> {
    if adjustment.is_pending() {
        Ok(())
    } else {
        Err(BudgetError::AdjustmentAlreadyApplied(adjustment.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::personal::{BudgetSettings, PersonalBudget};
    use crate::category::CategoryConfig;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    fn month(period: YearMonth) -> MonthlyBudget {
        let now = Utc::now();
        let template = PersonalBudget {
            id: Uuid::now_v7(),
            household_id: Uuid::now_v7(),
            name: "Family".into(),
            description: None,
            categories: [("Groceries".to_string(), CategoryConfig::with_limit(dec!(500)))]
                .into_iter()
                .collect(),
            settings: BudgetSettings::default(),
            version: 1,
            is_active: true,
            created_by: Uuid::now_v7(),
            created_at: now,
            updated_at: now,
        };
        MonthlyBudget::snapshot(period, &template, now)
    }

    fn request(category: &str, new_limit: Decimal, target: Option<YearMonth>) -> ScheduleAdjustment {
        ScheduleAdjustment {
            category: category.into(),
            current_limit: dec!(500),
            new_limit,
            reason: None,
            target,
        }
    }

    fn scheduled(input: ScheduleAdjustment, today: NaiveDate) -> BudgetAdjustment {
        match schedule(input, &[], Uuid::now_v7(), Uuid::now_v7(), today, Utc::now()).unwrap() {
            Scheduled::Created(a) => a,
            Scheduled::Superseded(_) => panic!("expected a new adjustment"),
        }
    }

    #[test]
    fn test_default_target_is_next_month() {
        let a = scheduled(request("Groceries", dec!(650), None), date(2026, 12, 20));
        assert_eq!(a.target, ym(2027, 1));
        assert_eq!(a.status, AdjustmentStatus::Pending);
        assert_eq!(a.change(), dec!(150));
    }

    #[test]
    fn test_current_month_target_is_allowed_past_is_not() {
        let today = date(2026, 3, 5);
        assert_eq!(
            scheduled(request("Groceries", dec!(1), Some(ym(2026, 3))), today).target,
            ym(2026, 3)
        );
        assert_eq!(
            schedule(
                request("Groceries", dec!(1), Some(ym(2026, 2))),
                &[],
                Uuid::now_v7(),
                Uuid::now_v7(),
                today,
                Utc::now()
            ),
            Err(BudgetError::TargetInPast {
                target: ym(2026, 2),
                current: ym(2026, 3)
            })
        );
    }

    #[test]
    fn test_schedule_validation() {
        let today = date(2026, 1, 1);
        let run = |input| schedule(input, &[], Uuid::now_v7(), Uuid::now_v7(), today, Utc::now());
        assert!(matches!(
            run(request("Groceries", dec!(-5), None)),
            Err(BudgetError::NegativeLimit { .. })
        ));
        assert!(matches!(
            run(request("  ", dec!(5), None)),
            Err(BudgetError::InvalidCategoryName { .. })
        ));
        let mut long = request("Groceries", dec!(5), None);
        long.reason = Some("x".repeat(501));
        assert!(matches!(run(long), Err(BudgetError::InvalidAdjustment(_))));
    }

    #[test]
    fn test_schedule_rejects_limits_out_of_range() {
        let today = date(2026, 1, 1);
        let run = |input| schedule(input, &[], Uuid::now_v7(), Uuid::now_v7(), today, Utc::now());
        assert!(matches!(
            run(request("Groceries", Decimal::MAX, None)),
            Err(BudgetError::LimitOutOfRange { .. })
        ));
        assert!(matches!(
            run(request("Groceries", Decimal::new(1, 28), None)),
            Err(BudgetError::LimitOutOfRange { .. })
        ));
        let mut huge_current = request("Groceries", dec!(5), None);
        huge_current.current_limit = Decimal::MAX;
        assert!(matches!(
            run(huge_current),
            Err(BudgetError::LimitOutOfRange { .. })
        ));
    }

    #[test]
    fn test_second_schedule_supersedes_pending() {
        let today = date(2026, 1, 10);
        let first = scheduled(request("Groceries", dec!(600), None), today);

        let again = schedule(
            request("Groceries", dec!(650), None),
            std::slice::from_ref(&first),
            first.household_id,
            first.created_by,
            today,
            Utc::now(),
        )
        .unwrap();

        let Scheduled::Superseded(updated) = again else {
            panic!("expected supersede");
        };
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.new_limit, dec!(650));
    }

    #[test]
    fn test_apply_before_month_starts_is_rejected() {
        let mut feb = month(ym(2026, 2));
        let mut adjustments = vec![scheduled(
            request("Groceries", dec!(650), Some(ym(2026, 2))),
            date(2026, 1, 15),
        )];

        assert_eq!(
            apply_due(&mut feb, &mut adjustments, date(2026, 1, 31), Utc::now()),
            Err(BudgetError::AdjustmentNotDue(ym(2026, 2)))
        );
        assert!(adjustments[0].is_pending());
        assert_eq!(feb.categories["Groceries"].monthly_limit, dec!(500));
    }

    #[test]
    fn test_apply_writes_limits_and_marks_applied() {
        let mut feb = month(ym(2026, 2));
        let mut adjustments = vec![
            scheduled(request("Groceries", dec!(650), Some(ym(2026, 2))), date(2026, 1, 15)),
            scheduled(request("Pets", dec!(40), Some(ym(2026, 2))), date(2026, 1, 15)),
            scheduled(request("Groceries", dec!(700), Some(ym(2026, 3))), date(2026, 1, 15)),
        ];

        let applied = apply_due(&mut feb, &mut adjustments, date(2026, 2, 1), Utc::now()).unwrap();

        assert_eq!(applied, vec![adjustments[0].id, adjustments[1].id]);
        assert_eq!(feb.categories["Groceries"].monthly_limit, dec!(650));
        assert_eq!(feb.categories["Pets"].monthly_limit, dec!(40));
        assert!(!feb.categories["Pets"].color.is_empty());
        assert_eq!(feb.adjustment_count, 2);
        assert_eq!(feb.revision, 1);
        assert_eq!(adjustments[0].status, AdjustmentStatus::Applied);
        assert!(adjustments[0].applied_at.is_some());
        assert!(adjustments[2].is_pending());
    }

    #[test]
    fn test_apply_twice_equals_apply_once() {
        let mut feb = month(ym(2026, 2));
        let mut adjustments = vec![scheduled(
            request("Groceries", dec!(650), Some(ym(2026, 2))),
            date(2026, 1, 15),
        )];
        apply_due(&mut feb, &mut adjustments, date(2026, 2, 3), Utc::now()).unwrap();
        let (month_once, adjustments_once) = (feb.clone(), adjustments.clone());

        let second = apply_due(&mut feb, &mut adjustments, date(2026, 2, 4), Utc::now()).unwrap();

        assert!(second.is_empty());
        assert_eq!(feb, month_once);
        assert_eq!(adjustments, adjustments_once);
    }

    #[test]
    fn test_apply_on_locked_month_changes_nothing() {
        let mut feb = month(ym(2026, 2));
        feb.lock(Utc::now());
        let before = feb.clone();
        let mut adjustments = vec![scheduled(
            request("Groceries", dec!(650), Some(ym(2026, 2))),
            date(2026, 1, 15),
        )];

        assert_eq!(
            apply_due(&mut feb, &mut adjustments, date(2026, 2, 3), Utc::now()),
            Err(BudgetError::MonthLocked(ym(2026, 2)))
        );
        assert_eq!(feb, before);
        assert!(adjustments[0].is_pending());
    }

    #[test]
    fn test_cancel_only_pending() {
        let mut a = scheduled(request("Groceries", dec!(1), None), date(2026, 1, 1));
        assert!(ensure_cancellable(&a).is_ok());
        a.status = AdjustmentStatus::Applied;
        assert_eq!(
            ensure_cancellable(&a),
            Err(BudgetError::AdjustmentAlreadyApplied(a.id))
        );
    }
}
