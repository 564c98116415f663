//! Monthly leave accrual, usage and loss-of-pay.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::{EmploymentFacts, EmploymentType};
use crate::model::leave_request::HalfActivity;

pub const INTERN_MONTHLY: Decimal = dec!(1.0);
pub const FULL_TIMER_MONTHLY: Decimal = dec!(1.5);
/// Joining after this day of the month forfeits that month's accrual.
pub const JOIN_CUTOFF_DAY: u32 = 10;
/// Hard stop for the month walk (fifty years).
pub const MAX_ACCRUAL_MONTHS: usize = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        YearMonth { year, month }
    }

    pub fn of(day: NaiveDate) -> Self {
        YearMonth::new(day.year(), day.month())
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            YearMonth::new(self.year + 1, 1)
        } else {
            YearMonth::new(self.year, self.month + 1)
        }
    }
}

/// A month counts as full-timer once it starts on or after the conversion
/// date, so a conversion part-way through a month takes effect the month after.
pub fn classify(facts: &EmploymentFacts, month: YearMonth) -> EmploymentType {
    match (facts.conversion_date, month.first_day()) {
        (Some(converted), Some(start)) if start >= converted => EmploymentType::FullTimer,
        (Some(_), _) => EmploymentType::Intern,
        (None, _) => facts.base_type(),
    }
}

pub fn monthly_accrual(facts: &EmploymentFacts, month: YearMonth) -> Decimal {
    let joined = YearMonth::of(facts.joining_date);
    if month < joined {
        return Decimal::ZERO;
    }
    if month == joined && facts.joining_date.day() > JOIN_CUTOFF_DAY {
        return Decimal::ZERO;
    }
    match classify(facts, month) {
        EmploymentType::Intern => INTERN_MONTHLY,
        EmploymentType::FullTimer => FULL_TIMER_MONTHLY,
    }
}

/// Days of leave one ledger row consumes.
pub fn day_usage(record: &AttendanceRecord) -> Decimal {
    if record.first_half.is_some() || record.second_half.is_some() {
        return [record.first_half, record.second_half]
            .into_iter()
            .filter(|half| matches!(half, Some(HalfActivity::Leave | HalfActivity::Absent)))
            .map(|_| dec!(0.5))
            .sum();
    }
    match record.status {
        Some(AttendanceStatus::Leave | AttendanceStatus::Absent) => dec!(1),
        Some(AttendanceStatus::HalfDay) => dec!(0.5),
        _ => Decimal::ZERO,
    }
}

pub fn usage_by_month<'a>(
    records: impl IntoIterator<Item = &'a AttendanceRecord>,
) -> BTreeMap<YearMonth, Decimal> {
    let mut usage = BTreeMap::new();
    for record in records {
        *usage
            .entry(YearMonth::of(record.working_date))
            .or_insert(Decimal::ZERO) += day_usage(record);
    }
    usage
}

pub fn round1(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthlyBalance {
    pub year: i32,
    pub month: u32,
    pub employment_type: EmploymentType,
    #[schema(value_type = String, example = "1.5")]
    pub carry_over: Decimal,
    #[schema(value_type = String, example = "1.5")]
    pub accrual: Decimal,
    #[schema(value_type = String, example = "0.5")]
    pub used: Decimal,
    #[schema(value_type = String, example = "0")]
    pub lop: Decimal,
    #[schema(value_type = String, example = "2.5")]
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaveBalance {
    pub year: i32,
    #[schema(value_type = String, example = "9")]
    pub entitlement: Decimal,
    #[schema(value_type = String, example = "2.5")]
    pub used: Decimal,
    /// Leave days still awaiting a decision.
    #[schema(value_type = String, example = "1")]
    pub pending: Decimal,
    #[schema(value_type = String, example = "0")]
    pub lop: Decimal,
    #[schema(value_type = String, example = "6.5")]
    pub balance: Decimal,
}

/// First month the walk considers.
pub fn walk_start(facts: &EmploymentFacts, baseline_year: i32) -> YearMonth {
    YearMonth::of(facts.joining_date).max(YearMonth::new(baseline_year, 1))
}

/// Walks month by month from [`walk_start`] through `target`, carrying the
/// balance for full-timers and resetting it after every intern month.
pub fn walk(
    facts: &EmploymentFacts,
    target: YearMonth,
    baseline_year: i32,
    usage: &BTreeMap<YearMonth, Decimal>,
) -> Vec<MonthlyBalance> {
    let mut months = Vec::new();
    let mut carry = Decimal::ZERO;
    let mut cursor = walk_start(facts, baseline_year);

    while cursor <= target && months.len() < MAX_ACCRUAL_MONTHS {
        let employment_type = classify(facts, cursor);
        let accrual = monthly_accrual(facts, cursor);
        let available = carry + accrual;
        let used = round1(usage.get(&cursor).copied().unwrap_or(Decimal::ZERO));
        let (balance, lop) = if used > available {
            (Decimal::ZERO, used - available)
        } else {
            (available - used, Decimal::ZERO)
        };
        months.push(MonthlyBalance {
            year: cursor.year,
            month: cursor.month,
            employment_type,
            carry_over: carry,
            accrual,
            used,
            lop,
            balance,
        });
        carry = match employment_type {
            EmploymentType::Intern => Decimal::ZERO,
            EmploymentType::FullTimer => balance,
        };
        cursor = cursor.next();
    }
    if cursor <= target {
        tracing::warn!(
            employee_id = facts.employee_id,
            "Accrual walk stopped at the month limit"
        );
    }
    months
}

/// Year-to-date totals for `year` out of a completed walk.
pub fn summarize(year: i32, months: &[MonthlyBalance], pending: Decimal) -> LeaveBalance {
    let in_year = months.iter().filter(|m| m.year == year);
    let (entitlement, used, lop) = in_year.fold(
        (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
        |(e, u, l), m| (e + m.accrual, u + m.used, l + m.lop),
    );
    let balance = months
        .last()
        .filter(|m| m.year == year)
        .map(|m| m.balance)
        .unwrap_or(Decimal::ZERO);
    LeaveBalance {
        year,
        entitlement,
        used,
        pending,
        lop,
        balance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveId;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn intern(joined: &str, converted: Option<&str>) -> EmploymentFacts {
        EmploymentFacts {
            employee_id: 1,
            employment_type: Some(EmploymentType::Intern),
            designation: None,
            joining_date: d(joined),
            conversion_date: converted.map(d),
        }
    }

    fn full_timer(joined: &str) -> EmploymentFacts {
        EmploymentFacts {
            employment_type: Some(EmploymentType::FullTimer),
            ..intern(joined, None)
        }
    }

    fn row(day: &str, first: Option<HalfActivity>, second: Option<HalfActivity>, status: Option<AttendanceStatus>) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            employee_id: 1,
            working_date: d(day),
            total_hours: None,
            work_location: None,
            status,
            first_half: first,
            second_half: second,
            source_request_id: Some(LeaveId(9)),
            updated_at: d(day).and_hms_opt(18, 0, 0).unwrap(),
        }
    }

    fn leave_days(days: &[&str]) -> BTreeMap<YearMonth, Decimal> {
        let rows: Vec<_> = days
            .iter()
            .map(|day| row(day, Some(HalfActivity::Leave), Some(HalfActivity::Leave), None))
            .collect();
        usage_by_month(&rows)
    }

    #[test]
    fn intern_joining_early_january_accrues_one_day_a_month() {
        let facts = intern("2025-01-05", None);
        let months = walk(&facts, YearMonth::new(2025, 5), 2024, &BTreeMap::new());
        assert_eq!(months.len(), 5);
        assert!(months.iter().all(|m| m.accrual == dec!(1.0)));
    }

    #[test]
    fn conversion_before_the_tenth_switches_the_following_month() {
        let facts = intern("2025-01-05", Some("2025-06-08"));
        let months = walk(&facts, YearMonth::new(2025, 7), 2024, &BTreeMap::new());
        let june = &months[5];
        let july = &months[6];
        assert_eq!((june.month, june.accrual), (6, dec!(1.0)));
        assert_eq!(june.employment_type, EmploymentType::Intern);
        assert_eq!((july.month, july.accrual), (7, dec!(1.5)));
        assert_eq!(july.employment_type, EmploymentType::FullTimer);
    }

    #[test]
    fn conversion_on_the_first_counts_that_month() {
        let facts = intern("2025-01-05", Some("2025-06-01"));
        assert_eq!(monthly_accrual(&facts, YearMonth::new(2025, 6)), dec!(1.5));
        let late = intern("2025-01-05", Some("2025-06-20"));
        assert_eq!(monthly_accrual(&late, YearMonth::new(2025, 6)), dec!(1.0));
    }

    #[test]
    fn joining_after_the_tenth_forfeits_the_first_month() {
        let facts = full_timer("2025-03-11");
        assert_eq!(monthly_accrual(&facts, YearMonth::new(2025, 3)), Decimal::ZERO);
        assert_eq!(monthly_accrual(&facts, YearMonth::new(2025, 4)), dec!(1.5));
        assert_eq!(monthly_accrual(&facts, YearMonth::new(2025, 2)), Decimal::ZERO);
        let on_tenth = full_timer("2025-03-10");
        assert_eq!(monthly_accrual(&on_tenth, YearMonth::new(2025, 3)), dec!(1.5));
    }

    #[test]
    fn intern_balance_resets_every_month() {
        let facts = intern("2025-01-05", None);
        let months = walk(&facts, YearMonth::new(2025, 4), 2024, &BTreeMap::new());
        for m in &months {
            assert_eq!(m.carry_over, Decimal::ZERO);
            assert_eq!(m.balance, dec!(1.0));
        }
    }

    #[test]
    fn full_timer_balance_carries_forward() {
        let facts = full_timer("2025-01-05");
        let usage = leave_days(&["2025-02-10"]);
        let months = walk(&facts, YearMonth::new(2025, 3), 2024, &usage);
        assert_eq!(months[0].balance, dec!(1.5));
        assert_eq!(months[1].carry_over, dec!(1.5));
        assert_eq!(months[1].used, dec!(1));
        assert_eq!(months[1].balance, dec!(2.0));
        assert_eq!(months[2].carry_over, dec!(2.0));
        assert_eq!(months[2].balance, dec!(3.5));
    }

    #[test]
    fn overuse_becomes_loss_of_pay_and_clamps() {
        let facts = intern("2025-01-05", None);
        let usage = leave_days(&["2025-02-03", "2025-02-04", "2025-02-05"]);
        let months = walk(&facts, YearMonth::new(2025, 3), 2024, &usage);
        let feb = &months[1];
        assert_eq!(feb.used, dec!(3));
        assert_eq!(feb.lop, dec!(2.0));
        assert_eq!(feb.balance, Decimal::ZERO);
        assert_eq!(months[2].carry_over, Decimal::ZERO);
    }

    #[test]
    fn usage_counts_halves_and_falls_back_to_status() {
        assert_eq!(
            day_usage(&row("2025-06-10", Some(HalfActivity::Leave), Some(HalfActivity::Office), None)),
            dec!(0.5)
        );
        assert_eq!(
            day_usage(&row("2025-06-10", Some(HalfActivity::Absent), Some(HalfActivity::Leave), None)),
            dec!(1.0)
        );
        assert_eq!(
            day_usage(&row("2025-06-10", None, None, Some(AttendanceStatus::Leave))),
            dec!(1)
        );
        assert_eq!(
            day_usage(&row("2025-06-10", None, None, Some(AttendanceStatus::HalfDay))),
            dec!(0.5)
        );
        assert_eq!(
            day_usage(&row("2025-06-10", None, None, Some(AttendanceStatus::FullDay))),
            Decimal::ZERO
        );
    }

    #[test]
    fn walk_starts_at_the_baseline_year() {
        let facts = full_timer("2019-04-01");
        let months = walk(&facts, YearMonth::new(2024, 2), 2024, &BTreeMap::new());
        assert_eq!(months.len(), 2);
        assert_eq!((months[0].year, months[0].month), (2024, 1));
    }

    #[test]
    fn year_summary_only_counts_the_target_year() {
        let facts = full_timer("2024-11-01");
        let usage = leave_days(&["2024-12-02", "2025-01-06"]);
        let months = walk(&facts, YearMonth::new(2025, 2), 2024, &usage);
        let summary = summarize(2025, &months, dec!(0.5));
        assert_eq!(summary.entitlement, dec!(3.0));
        assert_eq!(summary.used, dec!(1));
        assert_eq!(summary.pending, dec!(0.5));
        // Nov 1.5, Dec 1.5 - 1, Jan +1.5 - 1, Feb +1.5
        assert_eq!(summary.balance, dec!(4.0));
    }
}
