//! Leave request state machine.
//!
//! Every legal move is one row in the rule tables, keyed on `(status, action)`. A row
//! says who may take the action, which deadline gates it, and what happens to
//! a root request versus a cancellation/modification segment.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::role::Actor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, ToSchema, EnumString, Display, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LeaveAction {
    Approve,
    Reject,
    Cancel,
    RequestCancellation,
    RequestModification,
    ApproveCancellation,
    RejectCancellation,
    ApproveModification,
    RejectModification,
    UndoCancellation,
    UndoModification,
}

impl LeaveAction {
    pub fn is_review(self) -> bool {
        matches!(
            self,
            LeaveAction::Approve
                | LeaveAction::Reject
                | LeaveAction::ApproveCancellation
                | LeaveAction::RejectCancellation
                | LeaveAction::ApproveModification
                | LeaveAction::RejectModification
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Who {
    /// The requesting employee (admins may act for them).
    Owner,
    Reviewer,
    OwnerOrReviewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    None,
    /// Before the cutoff on the request's first day.
    BeforeStart,
    /// Before the cutoff on the day after the request last changed state.
    BeforeNextDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    To(LeaveStatus),
    /// Back to the status parked with the proposed change.
    Restore,
}

/// Follow-up work the engine performs once the new status is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Move a parked full modification onto the request itself.
    ApplyProposal,
    /// Write the ledger rows for every non-weekend day.
    Reconcile,
    /// Drop `source_request_id` locks held by this request (and its parent, for segments).
    ReleaseLock,
    /// Best-effort null of status/hours/location over the request's dates.
    WipeRange,
    /// Give the segment's duration back to the master request.
    RestoreParentDuration,
    /// Flag the parent as partially modified.
    MarkParentModified,
}

#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub target: Target,
    pub effects: &'static [Effect],
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub from: LeaveStatus,
    pub action: LeaveAction,
    pub who: Who,
    pub deadline: Deadline,
    pub root: Option<Step>,
    pub segment: Option<Step>,
}

const fn to(status: LeaveStatus, effects: &'static [Effect]) -> Option<Step> {
    Some(Step {
        target: Target::To(status),
        effects,
    })
}

const RESTORE: Option<Step> = Some(Step {
    target: Target::Restore,
    effects: &[],
});

/// Used instead of the approval step when another grant now overlaps.
pub const CANCELLATION_OVERLAP_STEP: Step = Step {
    target: Target::To(LeaveStatus::CancellationRejected),
    effects: &[Effect::RestoreParentDuration],
};

use Effect::*;
use LeaveAction as A;
use LeaveStatus as S;

macro_rules! granted_rules {
    ($status:expr) => {
        [
            Rule {
                from: $status,
                action: A::RequestCancellation,
                who: Who::Owner,
                deadline: Deadline::BeforeStart,
                root: to(S::RequestingForCancellation, &[]),
                segment: None,
            },
            Rule {
                from: $status,
                action: A::RequestModification,
                who: Who::Owner,
                deadline: Deadline::None,
                root: to(S::RequestingForModification, &[]),
                segment: None,
            },
            Rule {
                from: $status,
                action: A::Cancel,
                who: Who::Reviewer,
                deadline: Deadline::BeforeStart,
                root: to(S::Cancelled, &[ReleaseLock, WipeRange]),
                segment: None,
            },
        ]
    };
}

static APPROVED_RULES: [Rule; 3] = granted_rules!(S::Approved);
static MODIFIED_RULES: [Rule; 3] = granted_rules!(S::RequestModified);

static REVIEW_RULES: [Rule; 10] = [
    Rule {
        from: S::Pending,
        action: A::Approve,
        who: Who::Reviewer,
        deadline: Deadline::None,
        root: to(S::Approved, &[Reconcile]),
        segment: None,
    },
    Rule {
        from: S::Pending,
        action: A::Reject,
        who: Who::Reviewer,
        deadline: Deadline::None,
        root: to(S::Rejected, &[ReleaseLock]),
        segment: None,
    },
    Rule {
        from: S::Pending,
        action: A::Cancel,
        who: Who::OwnerOrReviewer,
        deadline: Deadline::None,
        root: to(S::Cancelled, &[ReleaseLock, WipeRange]),
        segment: None,
    },
    Rule {
        from: S::Pending,
        action: A::RequestModification,
        who: Who::Owner,
        deadline: Deadline::None,
        root: to(S::RequestingForModification, &[]),
        segment: None,
    },
    Rule {
        from: S::RequestingForCancellation,
        action: A::ApproveCancellation,
        who: Who::Reviewer,
        deadline: Deadline::None,
        // rows stay locked until the explicit attendance clear
        root: to(S::CancellationApproved, &[]),
        segment: to(S::CancellationApproved, &[]),
    },
    Rule {
        from: S::RequestingForCancellation,
        action: A::RejectCancellation,
        who: Who::Reviewer,
        deadline: Deadline::None,
        root: to(S::Approved, &[]),
        segment: to(S::CancellationRejected, &[RestoreParentDuration]),
    },
    Rule {
        from: S::RequestingForCancellation,
        action: A::UndoCancellation,
        who: Who::Owner,
        deadline: Deadline::BeforeNextDay,
        root: to(S::Approved, &[]),
        segment: to(S::Cancelled, &[RestoreParentDuration]),
    },
    Rule {
        from: S::RequestingForModification,
        action: A::ApproveModification,
        who: Who::Reviewer,
        deadline: Deadline::None,
        root: to(S::ModificationApproved, &[ApplyProposal, Reconcile]),
        segment: to(S::ModificationApproved, &[Reconcile, MarkParentModified]),
    },
    Rule {
        from: S::RequestingForModification,
        action: A::RejectModification,
        who: Who::Reviewer,
        deadline: Deadline::None,
        root: RESTORE,
        segment: to(S::ModificationRejected, &[ReleaseLock]),
    },
    Rule {
        from: S::RequestingForModification,
        action: A::UndoModification,
        who: Who::Owner,
        deadline: Deadline::None,
        root: RESTORE,
        segment: to(S::ModificationCancelled, &[]),
    },
];

pub fn rule_for(from: LeaveStatus, action: LeaveAction) -> Option<&'static Rule> {
    REVIEW_RULES
        .iter()
        .chain(APPROVED_RULES.iter())
        .chain(MODIFIED_RULES.iter())
        .find(|rule| rule.from == from && rule.action == action)
}

impl Rule {
    pub fn step_for(&self, request: &LeaveRequest) -> Option<Step> {
        if request.is_segment() {
            self.segment
        } else {
            self.root
        }
    }
}

/// Looks up the step for `action` on `request`, or explains why it is illegal.
pub fn plan(request: &LeaveRequest, action: LeaveAction) -> Result<(&'static Rule, Step), AppError> {
    let illegal = || {
        AppError::forbidden(format!(
            "Cannot {} a request that is {}",
            action, request.status
        ))
    };
    let rule = rule_for(request.status, action).ok_or_else(illegal)?;
    let step = rule.step_for(request).ok_or_else(illegal)?;
    Ok((rule, step))
}

impl Target {
    pub fn resolve(self, request: &LeaveRequest) -> Result<LeaveStatus, AppError> {
        match self {
            Target::To(status) => Ok(status),
            Target::Restore => request
                .proposed
                .as_ref()
                .map(|proposal| proposal.prior_status)
                .ok_or_else(|| {
                    AppError::internal(format!(
                        "Request {} has no parked modification to restore from",
                        request.id
                    ))
                }),
        }
    }
}

pub fn authorize(who: Who, request: &LeaveRequest, actor: &Actor) -> Result<(), AppError> {
    let owner = actor.owns(request.employee_id) || actor.is_admin();
    let allowed = match who {
        Who::Owner => owner,
        Who::Reviewer => actor.is_reviewer(),
        Who::OwnerOrReviewer => owner || actor.is_reviewer(),
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::forbidden(match who {
            Who::Owner => "Only the requesting employee can do this",
            Who::Reviewer => "Admin/Manager only",
            Who::OwnerOrReviewer => "Not allowed to change this request",
        }))
    }
}

pub fn check_deadline(
    deadline: Deadline,
    request: &LeaveRequest,
    now: NaiveDateTime,
    cutoff: NaiveTime,
) -> Result<(), AppError> {
    let limit = match deadline {
        Deadline::None => return Ok(()),
        Deadline::BeforeStart => request.from_date.and_time(cutoff),
        Deadline::BeforeNextDay => (request.updated_at.date() + Duration::days(1)).and_time(cutoff),
    };
    require_before(limit, now)
}

pub fn require_before(limit: NaiveDateTime, now: NaiveDateTime) -> Result<(), AppError> {
    if now < limit {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "Deadline passed: this had to be done before {}",
            limit.format("%Y-%m-%d %H:%M")
        )))
    }
}
