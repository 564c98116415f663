use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use utoipa::ToSchema;

use crate::model::date_range::DateRange;

/// Strongly typed leave request id; also used as the parent back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct LeaveId(pub u64);

impl std::fmt::Display for LeaveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an employee does in one half of a day.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString,
    Display, IntoStaticStr, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum HalfActivity {
    #[strum(to_string = "Office", serialize = "Present")]
    Office,
    #[serde(rename = "WFH", alias = "Work From Home")]
    #[strum(to_string = "WFH", serialize = "Work From Home")]
    Wfh,
    #[serde(rename = "Client Visit")]
    #[strum(to_string = "Client Visit")]
    ClientVisit,
    Leave,
    Absent,
}

impl HalfActivity {
    pub fn label(self) -> &'static str {
        self.into()
    }
}

/// One of the two halves of a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, Display)]
pub enum HalfSlot {
    #[serde(rename = "First Half")]
    #[strum(to_string = "First Half")]
    FirstHalf,
    #[serde(rename = "Second Half")]
    #[strum(to_string = "Second Half")]
    SecondHalf,
}

/// Kind of request. Composite kinds ("WFH + Leave") describe split days.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RequestType {
    Leave,
    WorkFromHome,
    ClientVisit,
    HalfDay,
    Composite(String),
}

impl RequestType {
    /// Activity written into both halves of a full-day request of this kind.
    pub fn activity(&self) -> Option<HalfActivity> {
        match self {
            RequestType::Leave | RequestType::HalfDay => Some(HalfActivity::Leave),
            RequestType::WorkFromHome => Some(HalfActivity::Wfh),
            RequestType::ClientVisit => Some(HalfActivity::ClientVisit),
            RequestType::Composite(_) => None,
        }
    }

    /// Splits "A + B" into the activities of the first and second half.
    pub fn composite_halves(&self) -> Option<(HalfActivity, HalfActivity)> {
        let RequestType::Composite(raw) = self else {
            return None;
        };
        let (a, b) = raw.split_once('+')?;
        let parse = |part: &str| -> Option<HalfActivity> {
            let part = part.trim();
            match part.parse::<RequestType>().ok()?.activity() {
                Some(activity) => Some(activity),
                None => part.parse::<HalfActivity>().ok(),
            }
        };
        Some((parse(a)?, parse(b)?))
    }

    /// Request kinds that collide with a new request of this kind.
    pub fn conflicting_types(&self) -> Vec<RequestType> {
        match self {
            RequestType::Leave => vec![RequestType::Leave],
            RequestType::WorkFromHome => vec![RequestType::Leave, RequestType::WorkFromHome],
            RequestType::ClientVisit => vec![RequestType::Leave, RequestType::ClientVisit],
            RequestType::HalfDay => vec![RequestType::Leave, RequestType::HalfDay],
            other => vec![other.clone()],
        }
    }

    /// Whether approved requests of this kind consume leave balance.
    pub fn consumes_leave(&self) -> bool {
        match self {
            RequestType::Leave | RequestType::HalfDay => true,
            RequestType::Composite(_) => self
                .composite_halves()
                .is_some_and(|(a, b)| a == HalfActivity::Leave || b == HalfActivity::Leave),
            _ => false,
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestType::Leave => write!(f, "Leave"),
            RequestType::WorkFromHome => write!(f, "Work From Home"),
            RequestType::ClientVisit => write!(f, "Client Visit"),
            RequestType::HalfDay => write!(f, "Half Day"),
            RequestType::Composite(raw) => write!(f, "{}", raw),
        }
    }
}

impl std::str::FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Request type must not be empty".to_string());
        }
        match trimmed.to_lowercase().as_str() {
            "leave" => Ok(RequestType::Leave),
            "work from home" | "wfh" => Ok(RequestType::WorkFromHome),
            "client visit" => Ok(RequestType::ClientVisit),
            "half day" => Ok(RequestType::HalfDay),
            _ => Ok(RequestType::Composite(trimmed.to_string())),
        }
    }
}

impl TryFrom<String> for RequestType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RequestType> for String {
    fn from(value: RequestType) -> Self {
        value.to_string()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString,
    Display, IntoStaticStr, EnumIter,
)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    #[serde(rename = "Requesting for Cancellation")]
    #[strum(to_string = "Requesting for Cancellation")]
    RequestingForCancellation,
    #[serde(rename = "Requesting for Modification")]
    #[strum(to_string = "Requesting for Modification")]
    RequestingForModification,
    #[serde(rename = "Cancellation Approved")]
    #[strum(to_string = "Cancellation Approved")]
    CancellationApproved,
    #[serde(rename = "Cancellation Rejected")]
    #[strum(to_string = "Cancellation Rejected")]
    CancellationRejected,
    #[serde(rename = "Modification Approved")]
    #[strum(to_string = "Modification Approved")]
    ModificationApproved,
    #[serde(rename = "Modification Rejected")]
    #[strum(to_string = "Modification Rejected")]
    ModificationRejected,
    #[serde(rename = "Modification Cancelled")]
    #[strum(to_string = "Modification Cancelled")]
    ModificationCancelled,
    /// Approved request with some days replaced by approved modification segments.
    #[serde(rename = "Request Modified")]
    #[strum(to_string = "Request Modified")]
    RequestModified,
}

impl LeaveStatus {
    /// Statuses that still claim their half-day slots.
    pub const ACTIVE: [LeaveStatus; 3] = [
        LeaveStatus::Pending,
        LeaveStatus::Approved,
        LeaveStatus::RequestModified,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LeaveStatus::Rejected
                | LeaveStatus::Cancelled
                | LeaveStatus::CancellationApproved
                | LeaveStatus::ModificationApproved
                | LeaveStatus::ModificationCancelled
        )
    }

    /// Approved grants that currently own attendance.
    pub fn is_granted(self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::RequestModified)
    }
}

/// Proposed halves parked on a request while a full modification awaits review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProposedChange {
    #[schema(value_type = String, example = "Work From Home")]
    pub request_type: RequestType,
    pub first_half: HalfActivity,
    pub second_half: HalfActivity,
    pub is_half_day: bool,
    /// Status restored when the modification is rejected or withdrawn.
    pub prior_status: LeaveStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    pub id: LeaveId,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(value_type = String, example = "Leave")]
    pub request_type: RequestType,
    #[schema(example = "2025-06-10", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2025-06-10", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    pub title: String,
    pub description: Option<String>,
    pub status: LeaveStatus,
    /// Working days, 0.5 granularity.
    #[schema(value_type = String, example = "0.5")]
    pub duration: Decimal,
    pub first_half: HalfActivity,
    pub second_half: HalfActivity,
    pub is_half_day: bool,
    #[schema(value_type = String, format = "date-time")]
    pub submitted_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
    /// Parent request when this row is a cancellation/modification segment.
    pub request_modified_from: Option<LeaveId>,
    pub reviewed_by: Option<u64>,
    pub is_read: bool,
    pub is_read_employee: bool,
    pub proposed: Option<ProposedChange>,
}

impl LeaveRequest {
    pub fn range(&self) -> DateRange {
        DateRange {
            from: self.from_date,
            to: self.to_date,
        }
    }

    pub fn is_segment(&self) -> bool {
        self.request_modified_from.is_some()
    }

    /// The root of this request's family: the parent for segments, itself otherwise.
    pub fn root_id(&self) -> LeaveId {
        self.request_modified_from.unwrap_or(self.id)
    }
}

/// Insert payload; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub request_type: RequestType,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub title: String,
    pub description: Option<String>,
    pub status: LeaveStatus,
    pub duration: Decimal,
    pub first_half: HalfActivity,
    pub second_half: HalfActivity,
    pub is_half_day: bool,
    pub submitted_at: NaiveDateTime,
    pub request_modified_from: Option<LeaveId>,
}

impl NewLeaveRequest {
    pub fn into_request(self, id: LeaveId) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: self.employee_id,
            request_type: self.request_type,
            from_date: self.from_date,
            to_date: self.to_date,
            title: self.title,
            description: self.description,
            status: self.status,
            duration: self.duration,
            first_half: self.first_half,
            second_half: self.second_half,
            is_half_day: self.is_half_day,
            submitted_at: self.submitted_at,
            updated_at: self.submitted_at,
            request_modified_from: self.request_modified_from,
            reviewed_by: None,
            is_read: false,
            is_read_employee: true,
            proposed: None,
        }
    }
}

/// A root request with its segments, ordered by start date.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveTree {
    pub request: LeaveRequest,
    pub segments: Vec<LeaveRequest>,
}
