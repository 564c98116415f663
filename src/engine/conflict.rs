//! Overlap resolution between a new claim and existing requests.

use serde::Serialize;
use strum_macros::Display;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::date_range::DateRange;
use crate::model::leave_request::{HalfActivity, LeaveId, LeaveRequest, RequestType};

/// Which halves of each day a request occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotSet {
    pub first: bool,
    pub second: bool,
}

impl SlotSet {
    pub const BOTH: SlotSet = SlotSet {
        first: true,
        second: true,
    };

    /// Full days take both halves; half days take every half that is not Office.
    pub fn of(is_half_day: bool, first: HalfActivity, second: HalfActivity) -> Self {
        if !is_half_day {
            return SlotSet::BOTH;
        }
        SlotSet {
            first: first != HalfActivity::Office,
            second: second != HalfActivity::Office,
        }
    }

    pub fn of_request(request: &LeaveRequest) -> Self {
        SlotSet::of(request.is_half_day, request.first_half, request.second_half)
    }

    pub fn is_empty(&self) -> bool {
        !self.first && !self.second
    }

    pub fn intersects(&self, other: &SlotSet) -> bool {
        (self.first && other.first) || (self.second && other.second)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, Display)]
pub enum SlotLabel {
    #[serde(rename = "Full Day")]
    #[strum(to_string = "Full Day")]
    FullDay,
    #[serde(rename = "First Half")]
    #[strum(to_string = "First Half")]
    FirstHalf,
    #[serde(rename = "Second Half")]
    #[strum(to_string = "Second Half")]
    SecondHalf,
    #[serde(rename = "Split Day")]
    #[strum(to_string = "Split Day")]
    SplitDay,
}

impl SlotLabel {
    pub fn of_request(request: &LeaveRequest) -> Self {
        let slots = SlotSet::of_request(request);
        match (request.is_half_day, slots.first, slots.second) {
            (false, _, _) => SlotLabel::FullDay,
            (true, true, false) => SlotLabel::FirstHalf,
            (true, false, true) => SlotLabel::SecondHalf,
            (true, _, _) => SlotLabel::SplitDay,
        }
    }
}

/// What a new request (or segment) wants to occupy.
#[derive(Debug, Clone)]
pub struct Claim<'a> {
    pub request_type: &'a RequestType,
    pub range: DateRange,
    pub slots: SlotSet,
}

/// The first existing request found in the way of a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotConflict {
    pub request_id: LeaveId,
    pub request_type: RequestType,
    pub range: DateRange,
    pub label: SlotLabel,
}

impl std::fmt::Display for SlotConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "A {} request already exists for {} ({})",
            self.request_type, self.range, self.label
        )
    }
}

impl From<SlotConflict> for AppError {
    fn from(conflict: SlotConflict) -> Self {
        AppError::Conflict(conflict.to_string())
    }
}

/// Returns the first candidate whose type, dates and half-day slots collide
/// with `claim`. Candidates in `exclude` (and their segments) are ignored.
pub fn find_conflict(
    claim: &Claim<'_>,
    candidates: &[LeaveRequest],
    exclude: &[LeaveId],
) -> Option<SlotConflict> {
    let conflicting = claim.request_type.conflicting_types();
    let mut ordered: Vec<&LeaveRequest> = candidates.iter().collect();
    ordered.sort_by_key(|candidate| (candidate.from_date, candidate.id));

    ordered
        .into_iter()
        .filter(|candidate| {
            !exclude.contains(&candidate.id) && !exclude.contains(&candidate.root_id())
        })
        .filter(|candidate| conflicting.contains(&candidate.request_type))
        .filter(|candidate| candidate.range().overlaps(&claim.range))
        .find(|candidate| SlotSet::of_request(candidate).intersects(&claim.slots))
        .map(|candidate| SlotConflict {
            request_id: candidate.id,
            request_type: candidate.request_type.clone(),
            range: candidate.range(),
            label: SlotLabel::of_request(candidate),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::{LeaveStatus, NewLeaveRequest};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn existing(
        id: u64,
        request_type: RequestType,
        from: &str,
        to: &str,
        halves: Option<(HalfActivity, HalfActivity)>,
    ) -> LeaveRequest {
        let activity = request_type.activity().unwrap_or(HalfActivity::Leave);
        let (first_half, second_half) = halves.unwrap_or((activity, activity));
        NewLeaveRequest {
            employee_id: 7,
            request_type,
            from_date: d(from),
            to_date: d(to),
            title: "existing".into(),
            description: None,
            status: LeaveStatus::Approved,
            duration: dec!(1),
            first_half,
            second_half,
            is_half_day: halves.is_some(),
            submitted_at: d("2025-06-01").and_hms_opt(9, 0, 0).unwrap(),
            request_modified_from: None,
        }
        .into_request(LeaveId(id))
    }

    fn claim<'a>(request_type: &'a RequestType, from: &str, to: &str, slots: SlotSet) -> Claim<'a> {
        Claim {
            request_type,
            range: DateRange::new(d(from), d(to)).unwrap(),
            slots,
        }
    }

    #[test]
    fn same_type_full_days_overlapping_conflict() {
        let leave = RequestType::Leave;
        let candidates = [existing(1, RequestType::Leave, "2025-06-09", "2025-06-11", None)];
        let found = find_conflict(
            &claim(&leave, "2025-06-11", "2025-06-12", SlotSet::BOTH),
            &candidates,
            &[],
        )
        .expect("conflict");
        assert_eq!(found.request_id, LeaveId(1));
        assert_eq!(found.label, SlotLabel::FullDay);
        assert!(found.to_string().contains("2025-06-09 to 2025-06-11"));
    }

    #[test]
    fn non_conflicting_type_pairs_pass() {
        // an existing WFH does not block a new Leave
        let leave = RequestType::Leave;
        let candidates = [existing(1, RequestType::WorkFromHome, "2025-06-10", "2025-06-10", None)];
        assert!(
            find_conflict(&claim(&leave, "2025-06-10", "2025-06-10", SlotSet::BOTH), &candidates, &[])
                .is_none()
        );
        // but an existing Leave blocks a new WFH
        let wfh = RequestType::WorkFromHome;
        let candidates = [existing(2, RequestType::Leave, "2025-06-10", "2025-06-10", None)];
        assert!(
            find_conflict(&claim(&wfh, "2025-06-10", "2025-06-10", SlotSet::BOTH), &candidates, &[])
                .is_some()
        );
        // client visit vs WFH never collide
        let visit = RequestType::ClientVisit;
        let candidates = [existing(3, RequestType::WorkFromHome, "2025-06-10", "2025-06-10", None)];
        assert!(
            find_conflict(&claim(&visit, "2025-06-10", "2025-06-10", SlotSet::BOTH), &candidates, &[])
                .is_none()
        );
    }

    #[test]
    fn disjoint_dates_pass() {
        let leave = RequestType::Leave;
        let candidates = [existing(1, RequestType::Leave, "2025-06-09", "2025-06-10", None)];
        assert!(
            find_conflict(&claim(&leave, "2025-06-11", "2025-06-13", SlotSet::BOTH), &candidates, &[])
                .is_none()
        );
    }

    #[test]
    fn opposite_halves_do_not_collide() {
        let leave = RequestType::Leave;
        let morning = existing(
            1,
            RequestType::Leave,
            "2025-06-10",
            "2025-06-10",
            Some((HalfActivity::Leave, HalfActivity::Office)),
        );
        let afternoon = SlotSet::of(true, HalfActivity::Office, HalfActivity::Leave);
        assert!(
            find_conflict(
                &claim(&leave, "2025-06-10", "2025-06-10", afternoon),
                &[morning.clone()],
                &[]
            )
            .is_none()
        );
        let found = find_conflict(
            &claim(&leave, "2025-06-10", "2025-06-10", SlotSet::BOTH),
            &[morning],
            &[],
        )
        .expect("full day hits the morning");
        assert_eq!(found.label, SlotLabel::FirstHalf);
    }

    #[test]
    fn labels() {
        let second = existing(
            1,
            RequestType::HalfDay,
            "2025-06-10",
            "2025-06-10",
            Some((HalfActivity::Office, HalfActivity::Leave)),
        );
        assert_eq!(SlotLabel::of_request(&second), SlotLabel::SecondHalf);
        let split = existing(
            2,
            RequestType::Composite("WFH + Leave".into()),
            "2025-06-10",
            "2025-06-10",
            Some((HalfActivity::Wfh, HalfActivity::Leave)),
        );
        assert_eq!(SlotLabel::of_request(&split), SlotLabel::SplitDay);
    }

    #[test]
    fn first_conflict_by_date_wins() {
        let leave = RequestType::Leave;
        let candidates = [
            existing(5, RequestType::Leave, "2025-06-12", "2025-06-12", None),
            existing(4, RequestType::Leave, "2025-06-10", "2025-06-10", None),
        ];
        let found = find_conflict(
            &claim(&leave, "2025-06-09", "2025-06-13", SlotSet::BOTH),
            &candidates,
            &[],
        )
        .unwrap();
        assert_eq!(found.request_id, LeaveId(4));
    }

    #[test]
    fn excluded_family_is_ignored() {
        let leave = RequestType::Leave;
        let parent = existing(1, RequestType::Leave, "2025-06-09", "2025-06-13", None);
        let mut child = existing(2, RequestType::Leave, "2025-06-10", "2025-06-10", None);
        child.request_modified_from = Some(LeaveId(1));
        assert!(
            find_conflict(
                &claim(&leave, "2025-06-10", "2025-06-10", SlotSet::BOTH),
                &[parent, child],
                &[LeaveId(1)]
            )
            .is_none()
        );
    }
}
