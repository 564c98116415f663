//! Attendance status derivation, write priority and the month-lock rule.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::engine::calendar::CalendarSnapshot;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, WorkLocation};
use crate::model::leave_request::HalfActivity;

const WORK_KEYWORDS: [&str; 5] = ["office", "wfh", "work from home", "client visit", "present"];

pub const FULL_DAY_HOURS: Decimal = dec!(9);
pub const HALF_DAY_HOURS: Decimal = dec!(6);

/// A half counts as worked when it names a work activity and is not leave/absence.
pub fn half_is_work(value: Option<&str>) -> bool {
    let Some(value) = value else {
        return false;
    };
    let value = value.trim().to_lowercase();
    if value.is_empty() || value == "leave" || value == "absent" {
        return false;
    }
    WORK_KEYWORDS.iter().any(|keyword| value.contains(keyword))
}

pub fn calculate_total_hours(first: Option<&str>, second: Option<&str>) -> Decimal {
    match (half_is_work(first), half_is_work(second)) {
        (true, true) => FULL_DAY_HOURS,
        (true, false) | (false, true) => HALF_DAY_HOURS,
        (false, false) => Decimal::ZERO,
    }
}

pub fn halves_total_hours(first: Option<HalfActivity>, second: Option<HalfActivity>) -> Decimal {
    calculate_total_hours(first.map(HalfActivity::label), second.map(HalfActivity::label))
}

/// Status written by reconciliation: 9 → Full Day, 6 → Half Day, 0 → Leave.
pub fn status_from_hours(hours: Decimal) -> AttendanceStatus {
    if hours >= FULL_DAY_HOURS {
        AttendanceStatus::FullDay
    } else if hours > Decimal::ZERO {
        AttendanceStatus::HalfDay
    } else {
        AttendanceStatus::Leave
    }
}

/// Client visit outranks WFH when the halves disagree.
pub fn location_from_halves(first: HalfActivity, second: HalfActivity) -> Option<WorkLocation> {
    let halves = [first, second];
    if halves.contains(&HalfActivity::ClientVisit) {
        Some(WorkLocation::ClientVisit)
    } else if halves.contains(&HalfActivity::Wfh) {
        Some(WorkLocation::Wfh)
    } else {
        None
    }
}

pub fn determine_status(
    hours: Option<Decimal>,
    day: NaiveDate,
    location: Option<WorkLocation>,
    calendar: &CalendarSnapshot,
    today: NaiveDate,
) -> AttendanceStatus {
    let no_hours = hours.is_none_or(|h| h.is_zero());
    if no_hours {
        if location.is_some() {
            // remote day declared but nothing logged yet
            return AttendanceStatus::NotUpdated;
        }
        if calendar.is_holiday(day) {
            return AttendanceStatus::Holiday;
        }
        if calendar.is_weekend(day) {
            return AttendanceStatus::Weekend;
        }
        if day <= today {
            return AttendanceStatus::Absent;
        }
        return AttendanceStatus::NotUpdated;
    }
    match hours {
        Some(h) if h >= HALF_DAY_HOURS => AttendanceStatus::FullDay,
        _ => AttendanceStatus::HalfDay,
    }
}

/// Halves implied by logged hours when the caller gives none.
pub fn derive_halves(
    hours: Option<Decimal>,
    location: Option<WorkLocation>,
) -> (Option<HalfActivity>, Option<HalfActivity>) {
    let activity = WorkLocation::activity(location);
    match hours {
        Some(h) if h >= HALF_DAY_HOURS => (Some(activity), Some(activity)),
        Some(h) if h > Decimal::ZERO => (Some(activity), Some(HalfActivity::Absent)),
        _ => (None, None),
    }
}

pub fn priority(status: Option<AttendanceStatus>, location: Option<WorkLocation>) -> u8 {
    if status == Some(AttendanceStatus::Leave) {
        return 3;
    }
    match location {
        Some(WorkLocation::ClientVisit) => 2,
        Some(WorkLocation::Wfh) => 1,
        None => 0,
    }
}

/// Priority of what is already stored; a half on leave makes it a leave day.
pub fn record_priority(record: &AttendanceRecord) -> u8 {
    let leave_half = [record.first_half, record.second_half].contains(&Some(HalfActivity::Leave));
    if leave_half {
        3
    } else {
        priority(record.status, record.work_location)
    }
}

/// Lower-priority writes are dropped unless a reviewer makes them or they clear the day.
pub fn should_apply(
    existing: Option<&AttendanceRecord>,
    incoming_status: Option<AttendanceStatus>,
    incoming_location: Option<WorkLocation>,
    privileged: bool,
    is_clear: bool,
) -> bool {
    if privileged || is_clear {
        return true;
    }
    match existing {
        Some(record) => priority(incoming_status, incoming_location) >= record_priority(record),
        None => true,
    }
}

/// Current and future months are open; the previous month stays open until
/// `cutoff` on the 1st.
pub fn is_editable_month(day: NaiveDate, now: NaiveDateTime, cutoff: NaiveTime) -> bool {
    let target = (day.year(), day.month());
    let current = (now.year(), now.month());
    if target >= current {
        return true;
    }
    let previous = if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    };
    target == previous && now.day() == 1 && now.time() < cutoff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::date_range::DateRange;
    use crate::store::memory::StaticCalendar;
    use chrono::NaiveDateTime;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    async fn june_calendar() -> CalendarSnapshot {
        let oracle = StaticCalendar::with_holidays(&["2025-06-11"]);
        let range = DateRange::new(d("2025-06-01"), d("2025-06-30")).unwrap();
        CalendarSnapshot::capture(&oracle, range).await.unwrap()
    }

    fn record(
        status: Option<AttendanceStatus>,
        location: Option<WorkLocation>,
        halves: (Option<HalfActivity>, Option<HalfActivity>),
    ) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            employee_id: 7,
            working_date: d("2025-06-10"),
            total_hours: None,
            work_location: location,
            status,
            first_half: halves.0,
            second_half: halves.1,
            source_request_id: None,
            updated_at: at("2025-06-10 09:00"),
        }
    }

    #[test]
    fn total_hours_is_symmetric_over_every_half_value() {
        let values = [
            Some("Office"),
            Some("WFH"),
            Some("Client Visit"),
            Some("Leave"),
            Some("Absent"),
            None,
        ];
        for a in values {
            for b in values {
                let hours = calculate_total_hours(a, b);
                assert_eq!(hours, calculate_total_hours(b, a), "{a:?} / {b:?}");
                let expected = match (half_is_work(a), half_is_work(b)) {
                    (true, true) => dec!(9),
                    (false, false) => dec!(0),
                    _ => dec!(6),
                };
                assert_eq!(hours, expected, "{a:?} / {b:?}");
            }
        }
    }

    #[test]
    fn work_keywords() {
        assert!(half_is_work(Some("Office")));
        assert!(half_is_work(Some("work from home")));
        assert!(half_is_work(Some("Present")));
        assert!(!half_is_work(Some("Leave")));
        assert!(!half_is_work(Some("absent")));
        assert!(!half_is_work(Some("Sick")));
        assert!(!half_is_work(None));
        assert_eq!(
            calculate_total_hours(Some("Leave"), Some("Office")),
            dec!(6)
        );
    }

    #[test]
    fn hours_map_to_reconciled_status() {
        assert_eq!(status_from_hours(dec!(9)), AttendanceStatus::FullDay);
        assert_eq!(status_from_hours(dec!(6)), AttendanceStatus::HalfDay);
        assert_eq!(status_from_hours(dec!(0)), AttendanceStatus::Leave);
    }

    #[test]
    fn location_prefers_client_visit() {
        assert_eq!(
            location_from_halves(HalfActivity::Wfh, HalfActivity::ClientVisit),
            Some(WorkLocation::ClientVisit)
        );
        assert_eq!(
            location_from_halves(HalfActivity::Leave, HalfActivity::Wfh),
            Some(WorkLocation::Wfh)
        );
        assert_eq!(
            location_from_halves(HalfActivity::Office, HalfActivity::Leave),
            None
        );
    }

    #[actix_web::test]
    async fn zero_hours_rules_apply_in_order() {
        let cal = june_calendar().await;
        let today = d("2025-06-12");
        // remote day with nothing logged
        assert_eq!(
            determine_status(None, d("2025-06-11"), Some(WorkLocation::Wfh), &cal, today),
            AttendanceStatus::NotUpdated
        );
        // holiday beats everything else
        assert_eq!(
            determine_status(Some(dec!(0)), d("2025-06-11"), None, &cal, today),
            AttendanceStatus::Holiday
        );
        assert_eq!(
            determine_status(None, d("2025-06-07"), None, &cal, today),
            AttendanceStatus::Weekend
        );
        assert_eq!(
            determine_status(None, d("2025-06-12"), None, &cal, today),
            AttendanceStatus::Absent
        );
        assert_eq!(
            determine_status(None, d("2025-06-13"), None, &cal, today),
            AttendanceStatus::NotUpdated
        );
    }

    #[actix_web::test]
    async fn logged_hours_split_at_six() {
        let cal = june_calendar().await;
        let today = d("2025-06-12");
        assert_eq!(
            determine_status(Some(dec!(6)), d("2025-06-10"), None, &cal, today),
            AttendanceStatus::FullDay
        );
        assert_eq!(
            determine_status(Some(dec!(5.5)), d("2025-06-10"), Some(WorkLocation::Wfh), &cal, today),
            AttendanceStatus::HalfDay
        );
    }

    #[test]
    fn derived_halves_follow_hours() {
        assert_eq!(
            derive_halves(Some(dec!(8)), Some(WorkLocation::Wfh)),
            (Some(HalfActivity::Wfh), Some(HalfActivity::Wfh))
        );
        assert_eq!(
            derive_halves(Some(dec!(4)), None),
            (Some(HalfActivity::Office), Some(HalfActivity::Absent))
        );
        assert_eq!(derive_halves(None, None), (None, None));
    }

    #[test]
    fn priority_ladder() {
        assert_eq!(priority(Some(AttendanceStatus::Leave), None), 3);
        assert_eq!(priority(Some(AttendanceStatus::FullDay), Some(WorkLocation::ClientVisit)), 2);
        assert_eq!(priority(Some(AttendanceStatus::FullDay), Some(WorkLocation::Wfh)), 1);
        assert_eq!(priority(Some(AttendanceStatus::FullDay), None), 0);
        assert_eq!(priority(None, None), 0);
    }

    #[test]
    fn wfh_write_never_downgrades_leave_for_employees() {
        let leave = record(Some(AttendanceStatus::Leave), None, (None, None));
        assert!(!should_apply(
            Some(&leave),
            Some(AttendanceStatus::FullDay),
            Some(WorkLocation::Wfh),
            false,
            false
        ));
        assert!(should_apply(
            Some(&leave),
            Some(AttendanceStatus::FullDay),
            Some(WorkLocation::Wfh),
            true,
            false
        ));
        assert!(should_apply(Some(&leave), None, None, false, true));
    }

    #[test]
    fn half_day_leave_record_counts_as_leave_priority() {
        let half_leave = record(
            Some(AttendanceStatus::HalfDay),
            None,
            (Some(HalfActivity::Leave), Some(HalfActivity::Office)),
        );
        assert_eq!(record_priority(&half_leave), 3);
        assert!(!should_apply(
            Some(&half_leave),
            Some(AttendanceStatus::FullDay),
            None,
            false,
            false
        ));
    }

    #[test]
    fn equal_or_higher_priority_writes_apply() {
        let wfh = record(Some(AttendanceStatus::FullDay), Some(WorkLocation::Wfh), (None, None));
        assert!(should_apply(
            Some(&wfh),
            Some(AttendanceStatus::HalfDay),
            Some(WorkLocation::Wfh),
            false,
            false
        ));
        assert!(should_apply(
            Some(&wfh),
            Some(AttendanceStatus::FullDay),
            Some(WorkLocation::ClientVisit),
            false,
            false
        ));
        assert!(!should_apply(
            Some(&wfh),
            Some(AttendanceStatus::FullDay),
            None,
            false,
            false
        ));
        assert!(should_apply(None, Some(AttendanceStatus::FullDay), None, false, false));
    }

    #[test]
    fn month_lock() {
        let cutoff = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        // current and future months
        assert!(is_editable_month(d("2025-06-01"), at("2025-06-20 12:00"), cutoff));
        assert!(is_editable_month(d("2025-08-01"), at("2025-06-20 12:00"), cutoff));
        // previous month only on the 1st before the cutoff
        assert!(is_editable_month(d("2025-05-31"), at("2025-06-01 17:59"), cutoff));
        assert!(!is_editable_month(d("2025-05-31"), at("2025-06-01 18:00"), cutoff));
        assert!(!is_editable_month(d("2025-05-31"), at("2025-06-02 09:00"), cutoff));
        // anything older is locked
        assert!(!is_editable_month(d("2025-04-30"), at("2025-06-01 09:00"), cutoff));
        // year boundary
        assert!(is_editable_month(d("2024-12-31"), at("2025-01-01 08:00"), cutoff));
    }
}
