//! Property and scenario tests across the budget rules.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::*;
use crate::category::{CategoryConfig, CategoryMap};
use crate::period::YearMonth;

fn actor() -> Actor {
    Actor {
        household_id: Uuid::now_v7(),
        user_id: Uuid::now_v7(),
        now: Utc::now(),
    }
}

fn categories(entries: &[(&str, Decimal)]) -> CategoryMap {
    entries
        .iter()
        .map(|(n, l)| ((*n).to_string(), CategoryConfig::with_limit(*l)))
        .collect()
}

fn ym(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).unwrap()
}

#[derive(Debug, Clone)]
enum Op {
    Create(i64),
    Reshape(i64),
    Rename,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0i64..10_000).prop_map(Op::Create),
        (0i64..10_000).prop_map(Op::Reshape),
        Just(Op::Rename),
    ]
}

fn plan(limit: i64) -> NewPersonalBudget {
    NewPersonalBudget {
        name: "Plan".into(),
        categories: categories(&[("Food", Decimal::from(limit))]),
        ..Default::default()
    }
}

proptest! {
    /// After any mix of creates and updates exactly one version is active and
    /// it carries the highest version number.
    #[test]
    fn prop_single_active_with_max_version(ops in prop::collection::vec(op(), 1..20)) {
        let a = actor();
        let mut set = PersonalBudgetSet::default();

        for op in ops {
            match (op, set.active().map(|b| b.id)) {
                (Op::Create(limit), _) | (Op::Reshape(limit), None) => {
                    set.create(plan(limit), a).unwrap();
                }
                (Op::Rename, None) => {
                    set.create(plan(100), a).unwrap();
                }
                (Op::Reshape(limit), Some(id)) => {
                    let update = UpdatePersonalBudget {
                        categories: Some(categories(&[
                            ("Food", Decimal::from(limit)),
                            ("Extra", Decimal::from(limit)),
                        ])),
                        ..Default::default()
                    };
                    set.update(id, update, a).unwrap();
                }
                (Op::Rename, Some(id)) => {
                    let update = UpdatePersonalBudget {
                        name: Some(format!("Plan {}", set.max_version())),
                        ..Default::default()
                    };
                    set.update(id, update, a).unwrap();
                }
            }

            let active: Vec<_> = set.budgets().iter().filter(|b| b.is_active).collect();
            prop_assert_eq!(active.len(), 1);
            prop_assert_eq!(active[0].version, set.max_version());
        }
    }

    /// A rejected edit on a locked month leaves it exactly as it was.
    #[test]
    fn prop_locked_month_is_immutable(limit in -1000i64..1000, category in "[A-Za-z]{1,8}") {
        let a = actor();
        let mut set = PersonalBudgetSet::default();
        let change = set
            .create(
                NewPersonalBudget {
                    name: "Plan".into(),
                    categories: categories(&[("Food", dec!(100))]),
                    ..Default::default()
                },
                a,
            )
            .unwrap();
        let template = change.inserted.unwrap();
        let mut month = MonthlyBudget::snapshot(ym(2026, 1), &template, a.now);
        month.lock(a.now);
        let before = month.clone();

        let result = month.update_category_limit(&category, Decimal::from(limit), None, a.now);

        prop_assert_eq!(result, Err(BudgetError::MonthLocked(ym(2026, 1))));
        prop_assert_eq!(month, before);
    }
}

#[test]
fn scenario_reduced_to_zero_is_not_removed() {
    let a = actor();
    let mut set = PersonalBudgetSet::default();
    set.create(
        NewPersonalBudget {
            name: "Family".into(),
            categories: categories(&[("Groceries", dec!(500)), ("Entertainment", dec!(200))]),
            ..Default::default()
        },
        a,
    )
    .unwrap();
    let template = set.active().unwrap().clone();

    let mut january = MonthlyBudget::snapshot(ym(2026, 1), &template, a.now);
    january
        .update_category_limit("Entertainment", dec!(0), None, a.now)
        .unwrap();

    let comparison = compare(&january, &template).unwrap();
    assert_eq!(comparison.differences.len(), 1);
    assert_eq!(comparison.differences[0].category, "Entertainment");
    assert_eq!(comparison.differences[0].kind, DiffKind::ReducedToZero);
    assert_eq!(comparison.differences[0].difference, dec!(-200));
}

#[test]
fn scenario_scheduled_increase_lands_in_february() {
    let a = actor();
    let mut set = PersonalBudgetSet::default();
    set.create(
        NewPersonalBudget {
            name: "Family".into(),
            categories: categories(&[("Groceries", dec!(500))]),
            ..Default::default()
        },
        a,
    )
    .unwrap();
    let template = set.active().unwrap().clone();
    let mid_january = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();

    let scheduled = schedule(
        ScheduleAdjustment {
            category: "Groceries".into(),
            current_limit: dec!(500),
            new_limit: dec!(650),
            reason: Some("School lunches".into()),
            target: Some(ym(2026, 2)),
        },
        &[],
        a.household_id,
        a.user_id,
        mid_january,
        a.now,
    )
    .unwrap();
    let mut adjustments = vec![scheduled.adjustment().clone()];

    // Before February the snapshot still shows the old limit.
    let mut february = MonthlyBudget::snapshot(ym(2026, 2), &template, a.now);
    assert_eq!(february.categories["Groceries"].monthly_limit, dec!(500));
    assert!(apply_due(&mut february, &mut adjustments, mid_january, a.now).is_err());

    let first_of_feb = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    let applied = apply_due(&mut february, &mut adjustments, first_of_feb, a.now).unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(february.categories["Groceries"].monthly_limit, dec!(650));
    assert_eq!(adjustments[0].status, AdjustmentStatus::Applied);

    let snapshot = february.clone();
    assert!(
        apply_due(&mut february, &mut adjustments, first_of_feb, a.now)
            .unwrap()
            .is_empty()
    );
    assert_eq!(february, snapshot);
}
