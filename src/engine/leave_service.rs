use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::engine::calendar::CalendarSnapshot;
use crate::engine::conflict::{Claim, SlotSet, find_conflict};
use crate::engine::lifecycle::{self, CANCELLATION_OVERLAP_STEP, Effect, LeaveAction, Who};
use crate::engine::reconcile::{ReconcileReport, reconcile_request};
use crate::engine::segmenter::{DateRun, segment_dates};
use crate::engine::{LeaveEngine, acting_employee};
use crate::error::AppError;
use crate::model::attendance::ResetScope;
use crate::model::date_range::DateRange;
use crate::model::leave_request::{
    HalfActivity, HalfSlot, LeaveId, LeaveRequest, LeaveStatus, LeaveTree, NewLeaveRequest,
    ProposedChange, RequestType,
};
use crate::model::role::Actor;
use crate::store::LeaveEvent;

/// Segment statuses whose days no longer follow the master request.
const CARVED_OUT: [LeaveStatus; 2] = [
    LeaveStatus::CancellationApproved,
    LeaveStatus::ModificationApproved,
];

/// Segment statuses that keep their days out of further partial operations.
const CLAIMING: [LeaveStatus; 4] = [
    LeaveStatus::RequestingForCancellation,
    LeaveStatus::CancellationApproved,
    LeaveStatus::RequestingForModification,
    LeaveStatus::ModificationApproved,
];

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitLeave {
    /// Defaults to the caller's own employee id.
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(value_type = String, example = "Leave")]
    pub request_type: RequestType,
    #[schema(example = "2025-06-10", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2025-06-10", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    #[schema(example = "Dentist")]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_half_day: bool,
    /// Which half a half-day request takes when the halves are not given.
    pub half_day_type: Option<HalfSlot>,
    pub first_half: Option<HalfActivity>,
    pub second_half: Option<HalfActivity>,
}

/// New shape for the selected days of a modification.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ModificationChanges {
    /// Keeps the current type when omitted.
    #[schema(value_type = Option<String>, example = "Work From Home")]
    pub request_type: Option<RequestType>,
    #[serde(default)]
    pub is_half_day: bool,
    pub half_day_type: Option<HalfSlot>,
    pub first_half: Option<HalfActivity>,
    pub second_half: Option<HalfActivity>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransitionOutcome {
    pub request: LeaveRequest,
    /// Present when the transition wrote attendance.
    pub reconciliation: Option<ReconcileReport>,
}

/// Per-half activities of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub first_half: HalfActivity,
    pub second_half: HalfActivity,
    pub is_half_day: bool,
}

impl Shape {
    pub fn slots(&self) -> SlotSet {
        SlotSet::of(self.is_half_day, self.first_half, self.second_half)
    }
}

/// Works out both halves from the request type and whatever the caller gave.
///
/// Composite types split the day; explicit halves win next; otherwise a
/// half-day request puts the type's activity in the chosen half and Office in
/// the other.
pub fn resolve_shape(
    request_type: &RequestType,
    is_half_day: bool,
    half_day_type: Option<HalfSlot>,
    first_half: Option<HalfActivity>,
    second_half: Option<HalfActivity>,
) -> Result<Shape, AppError> {
    let shape = if let Some((first_half, second_half)) = request_type.composite_halves() {
        Shape {
            first_half,
            second_half,
            is_half_day: true,
        }
    } else {
        let activity = request_type.activity().ok_or_else(|| {
            AppError::validation(format!("Unknown request type '{request_type}'"))
        })?;
        match (first_half, second_half) {
            (Some(first_half), Some(second_half)) => Shape {
                first_half,
                second_half,
                is_half_day: is_half_day || first_half != second_half,
            },
            _ if !is_half_day && *request_type != RequestType::HalfDay => Shape {
                first_half: activity,
                second_half: activity,
                is_half_day: false,
            },
            _ => match half_day_type {
                Some(HalfSlot::FirstHalf) => Shape {
                    first_half: activity,
                    second_half: HalfActivity::Office,
                    is_half_day: true,
                },
                Some(HalfSlot::SecondHalf) => Shape {
                    first_half: HalfActivity::Office,
                    second_half: activity,
                    is_half_day: true,
                },
                None => {
                    return Err(AppError::validation(
                        "half_day_type is required for half-day requests",
                    ));
                }
            },
        }
    };
    if shape.slots().is_empty() {
        return Err(AppError::validation(
            "A half-day request must take at least one half",
        ));
    }
    Ok(shape)
}

/// Dates picked for a partial operation, checked against the parent.
struct Selection {
    dates: BTreeSet<NaiveDate>,
    calendar: CalendarSnapshot,
    /// Every working day of the parent was picked.
    is_full: bool,
}

impl Selection {
    fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }
}

struct SegmentTemplate {
    request_type: RequestType,
    shape: Shape,
    status: LeaveStatus,
}

impl LeaveEngine {
    async fn load(&self, id: LeaveId) -> Result<LeaveRequest, AppError> {
        self.deps
            .leaves
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Leave request {id} not found")))
    }

    pub async fn submit(&self, actor: &Actor, input: SubmitLeave) -> Result<LeaveRequest, AppError> {
        let employee_id = acting_employee(actor, input.employee_id)?;
        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::validation("title is required"));
        }
        let range = DateRange::new(input.from_date, input.to_date)?;
        let shape = resolve_shape(
            &input.request_type,
            input.is_half_day,
            input.half_day_type,
            input.first_half,
            input.second_half,
        )?;

        let claim = Claim {
            request_type: &input.request_type,
            range,
            slots: shape.slots(),
        };
        let active = self
            .deps
            .leaves
            .find_overlapping(employee_id, range, &LeaveStatus::ACTIVE)
            .await?;
        if let Some(conflict) = find_conflict(&claim, &active, &[]) {
            tracing::info!(employee_id, conflict = %conflict, "Submission blocked by existing request");
            return Err(conflict.into());
        }

        let calendar = self.snapshot(range).await?;
        let duration = calendar.request_duration(range, shape.is_half_day);
        let request = self
            .deps
            .leaves
            .insert(NewLeaveRequest {
                employee_id,
                request_type: input.request_type,
                from_date: range.from,
                to_date: range.to,
                title: title.to_string(),
                description: input.description,
                status: LeaveStatus::Pending,
                duration,
                first_half: shape.first_half,
                second_half: shape.second_half,
                is_half_day: shape.is_half_day,
                submitted_at: self.deps.clock.now(),
                request_modified_from: None,
            })
            .await?;

        tracing::info!(leave_id = %request.id, employee_id, %duration, "Leave request submitted");
        let recipient = self.manager_of(employee_id).await;
        self.notify(LeaveEvent {
            request_id: request.id,
            employee_id,
            status: request.status,
            recipient,
        });
        Ok(request)
    }

    /// Moves a request along the lifecycle table. Full modifications carry a
    /// proposal and go through [`LeaveEngine::modify_dates`] instead.
    pub async fn transition(
        &self,
        id: LeaveId,
        action: LeaveAction,
        actor: &Actor,
    ) -> Result<TransitionOutcome, AppError> {
        if action == LeaveAction::RequestModification {
            return Err(AppError::validation(
                "Modification needs the new shape; use modify-dates",
            ));
        }
        let request = self.load(id).await?;
        self.apply(request, action, actor).await
    }

    /// Pending requests are never removed; they become Cancelled.
    pub async fn delete(&self, id: LeaveId, actor: &Actor) -> Result<LeaveRequest, AppError> {
        let request = self.load(id).await?;
        if request.status != LeaveStatus::Pending {
            return Err(AppError::forbidden(format!(
                "Only pending requests can be deleted, this one is {}",
                request.status
            )));
        }
        Ok(self.apply(request, LeaveAction::Cancel, actor).await?.request)
    }

    async fn apply(
        &self,
        mut request: LeaveRequest,
        action: LeaveAction,
        actor: &Actor,
    ) -> Result<TransitionOutcome, AppError> {
        let (rule, mut step) = lifecycle::plan(&request, action)?;
        lifecycle::authorize(rule.who, &request, actor)?;
        let now = self.deps.clock.now();
        lifecycle::check_deadline(rule.deadline, &request, now, self.policy.cancel_cutoff)?;
        if action == LeaveAction::ApproveCancellation {
            if let Some(grant) = self.overlapping_grant(&request).await? {
                tracing::info!(
                    leave_id = %request.id,
                    overlapping = %grant.id,
                    "Cancellation rejected, another approved request overlaps"
                );
                step = CANCELLATION_OVERLAP_STEP;
            }
        }
        let status = step.target.resolve(&request)?;
        let has = |effect: Effect| step.effects.contains(&effect);

        if has(Effect::ApplyProposal) {
            self.apply_proposal(&mut request).await?;
        }
        if has(Effect::ReleaseLock) {
            self.release_lock(&request).await?;
        }
        if has(Effect::RestoreParentDuration) || has(Effect::MarkParentModified) {
            self.update_parent(
                &request,
                has(Effect::RestoreParentDuration),
                has(Effect::MarkParentModified),
            )
            .await?;
        }

        let previous = request.status;
        request.status = status;
        request.updated_at = now;
        if status != LeaveStatus::RequestingForModification {
            request.proposed = None;
        }
        if action.is_review() {
            request.reviewed_by = Some(actor.user_id);
        }
        flag_unread(&mut request, actor);
        self.deps.leaves.update(&request).await?;
        tracing::info!(
            leave_id = %request.id,
            %action,
            from = %previous,
            to = %status,
            actor = actor.user_id,
            "Leave request transitioned"
        );

        let reconciliation = if has(Effect::Reconcile) {
            Some(self.reconcile_now(&request).await?)
        } else {
            None
        };
        if has(Effect::WipeRange) {
            self.wipe_range(&request).await;
        }
        self.notify_change(&request, actor).await;
        Ok(TransitionOutcome {
            request,
            reconciliation,
        })
    }

    /// Another grant of the same employee over these dates, outside this family.
    async fn overlapping_grant(&self, request: &LeaveRequest) -> Result<Option<LeaveRequest>, AppError> {
        let granted = self
            .deps
            .leaves
            .find_overlapping(
                request.employee_id,
                request.range(),
                &[LeaveStatus::Approved, LeaveStatus::RequestModified],
            )
            .await?;
        Ok(granted
            .into_iter()
            .find(|other| other.root_id() != request.root_id()))
    }

    async fn apply_proposal(&self, request: &mut LeaveRequest) -> Result<(), AppError> {
        let proposal = request.proposed.clone().ok_or_else(|| {
            AppError::internal(format!("Request {} has no parked modification", request.id))
        })?;
        let calendar = self.snapshot(request.range()).await?;
        request.request_type = proposal.request_type;
        request.first_half = proposal.first_half;
        request.second_half = proposal.second_half;
        request.is_half_day = proposal.is_half_day;
        request.duration = calendar.request_duration(request.range(), proposal.is_half_day);
        Ok(())
    }

    /// Frees the days this request (or, for a segment, its parent) locked.
    async fn release_lock(&self, request: &LeaveRequest) -> Result<(), AppError> {
        let mut sources = vec![request.id];
        sources.extend(request.request_modified_from);
        let within = request.is_segment().then(|| request.range());
        let released = self
            .deps
            .attendance
            .reset_by_source(&sources, within, ResetScope::Lock)
            .await?;
        tracing::debug!(leave_id = %request.id, released, "Attendance locks released");
        Ok(())
    }

    async fn update_parent(
        &self,
        segment: &LeaveRequest,
        restore_duration: bool,
        mark_modified: bool,
    ) -> Result<(), AppError> {
        let Some(parent_id) = segment.request_modified_from else {
            return Ok(());
        };
        let mut parent = self.load(parent_id).await?;
        if restore_duration {
            let ceiling = Decimal::from(parent.range().len_days());
            parent.duration = (parent.duration + segment.duration).min(ceiling);
        }
        if mark_modified && parent.status.is_granted() {
            parent.status = LeaveStatus::RequestModified;
        }
        self.deps.leaves.update(&parent).await
    }

    async fn reconcile_now(&self, request: &LeaveRequest) -> Result<ReconcileReport, AppError> {
        let calendar = self.snapshot(request.range()).await?;
        let carved_out: Vec<DateRange> = if request.is_segment() {
            Vec::new()
        } else {
            self.deps
                .leaves
                .children(request.id)
                .await?
                .iter()
                .filter(|child| CARVED_OUT.contains(&child.status))
                .map(LeaveRequest::range)
                .collect()
        };
        Ok(reconcile_request(
            self.deps.attendance.as_ref(),
            request,
            &calendar,
            &carved_out,
        )
        .await)
    }

    async fn wipe_range(&self, request: &LeaveRequest) {
        if let Err(e) = self
            .deps
            .attendance
            .reset_range(request.employee_id, request.range(), ResetScope::Worked)
            .await
        {
            tracing::error!(error = %e, leave_id = %request.id, "Failed to wipe attendance range");
        }
    }

    async fn notify_change(&self, request: &LeaveRequest, actor: &Actor) {
        let recipient = if actor.owns(request.employee_id) {
            self.manager_of(request.employee_id).await
        } else {
            Some(request.employee_id)
        };
        self.notify(LeaveEvent {
            request_id: request.id,
            employee_id: request.employee_id,
            status: request.status,
            recipient,
        });
    }

    async fn select_dates(&self, parent: &LeaveRequest, dates: &[NaiveDate]) -> Result<Selection, AppError> {
        if dates.is_empty() {
            return Err(AppError::validation("Select at least one date"));
        }
        let range = parent.range();
        let calendar = self.snapshot(range).await?;
        let dates: BTreeSet<NaiveDate> = dates.iter().copied().collect();
        for day in &dates {
            if !range.contains(*day) {
                return Err(AppError::validation(format!(
                    "{day} is outside the request ({range})"
                )));
            }
            if !calendar.is_working_day(*day) {
                return Err(AppError::validation(format!("{day} is not a working day")));
            }
        }
        let is_full = dates.len() == calendar.working_days(range);
        Ok(Selection {
            dates,
            calendar,
            is_full,
        })
    }

    /// Refuses days a live or approved segment of `parent` already holds.
    async fn check_unclaimed(
        &self,
        parent: &LeaveRequest,
        dates: &BTreeSet<NaiveDate>,
    ) -> Result<(), AppError> {
        let children = self.deps.leaves.children(parent.id).await?;
        let taken = children.iter().find_map(|child| {
            let held = CLAIMING.contains(&child.status);
            dates
                .iter()
                .find(|day| held && child.range().contains(**day))
                .map(|day| (child, *day))
        });
        match taken {
            Some((child, day)) => Err(AppError::conflict(format!(
                "{day} is already held by request {} ({})",
                child.id, child.status
            ))),
            None => Ok(()),
        }
    }

    async fn create_segments(
        &self,
        parent: &LeaveRequest,
        runs: &[DateRun],
        template: &SegmentTemplate,
        now: NaiveDateTime,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        let mut segments = Vec::with_capacity(runs.len());
        for run in runs {
            let segment = self
                .deps
                .leaves
                .insert(NewLeaveRequest {
                    employee_id: parent.employee_id,
                    request_type: template.request_type.clone(),
                    from_date: run.range.from,
                    to_date: run.range.to,
                    title: parent.title.clone(),
                    description: parent.description.clone(),
                    status: template.status,
                    duration: run.duration(template.shape.is_half_day),
                    first_half: template.shape.first_half,
                    second_half: template.shape.second_half,
                    is_half_day: template.shape.is_half_day,
                    submitted_at: now,
                    request_modified_from: Some(parent.id),
                })
                .await?;
            match self.deps.documents.copy(parent.id, segment.id).await {
                Ok(copied) => {
                    tracing::debug!(parent = %parent.id, segment = %segment.id, copied, "Documents copied")
                }
                Err(e) => tracing::warn!(
                    error = %e,
                    parent = %parent.id,
                    segment = %segment.id,
                    "Document copy failed"
                ),
            }
            segments.push(segment);
        }
        let recipient = self.manager_of(parent.employee_id).await;
        for segment in &segments {
            self.notify(LeaveEvent {
                request_id: segment.id,
                employee_id: segment.employee_id,
                status: segment.status,
                recipient,
            });
        }
        tracing::info!(parent = %parent.id, segments = segments.len(), status = %template.status, "Segments created");
        Ok(segments)
    }

    /// Cancels some days of a granted request. Picking every working day is
    /// a full cancellation request on the parent itself.
    pub async fn cancel_dates(
        &self,
        id: LeaveId,
        dates: &[NaiveDate],
        actor: &Actor,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        let parent = self.load(id).await?;
        let (rule, _) = lifecycle::plan(&parent, LeaveAction::RequestCancellation)?;
        lifecycle::authorize(rule.who, &parent, actor)?;
        let selection = self.select_dates(&parent, dates).await?;
        if selection.is_full {
            let outcome = self
                .apply(parent, LeaveAction::RequestCancellation, actor)
                .await?;
            return Ok(vec![outcome.request]);
        }

        let now = self.deps.clock.now();
        if let Some(first) = selection.first() {
            lifecycle::require_before(first.and_time(self.policy.cancel_cutoff), now)?;
        }
        self.check_unclaimed(&parent, &selection.dates).await?;
        let runs = segment_dates(&selection.dates, &selection.calendar);

        let template = SegmentTemplate {
            request_type: parent.request_type.clone(),
            shape: Shape {
                first_half: parent.first_half,
                second_half: parent.second_half,
                is_half_day: parent.is_half_day,
            },
            status: LeaveStatus::RequestingForCancellation,
        };
        let segments = self.create_segments(&parent, &runs, &template, now).await?;

        let removed: Decimal = segments.iter().map(|segment| segment.duration).sum();
        let mut parent = parent;
        parent.duration = (parent.duration - removed).max(Decimal::ZERO);
        parent.is_read = false;
        self.deps.leaves.update(&parent).await?;
        Ok(segments)
    }

    /// Changes the shape of some or all days. A full selection parks the
    /// proposal on the request; a partial one creates modification segments.
    pub async fn modify_dates(
        &self,
        id: LeaveId,
        dates: &[NaiveDate],
        changes: ModificationChanges,
        actor: &Actor,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        let parent = self.load(id).await?;
        let (rule, _) = lifecycle::plan(&parent, LeaveAction::RequestModification)?;
        lifecycle::authorize(rule.who, &parent, actor)?;
        let request_type = changes
            .request_type
            .clone()
            .unwrap_or_else(|| parent.request_type.clone());
        let shape = resolve_shape(
            &request_type,
            changes.is_half_day,
            changes.half_day_type,
            changes.first_half,
            changes.second_half,
        )?;
        let selection = self.select_dates(&parent, dates).await?;
        let active = self
            .deps
            .leaves
            .find_overlapping(parent.employee_id, parent.range(), &LeaveStatus::ACTIVE)
            .await?;

        if selection.is_full {
            let claim = Claim {
                request_type: &request_type,
                range: parent.range(),
                slots: shape.slots(),
            };
            if let Some(conflict) = find_conflict(&claim, &active, &[parent.id]) {
                return Err(conflict.into());
            }
            let mut parent = parent;
            parent.proposed = Some(ProposedChange {
                request_type,
                first_half: shape.first_half,
                second_half: shape.second_half,
                is_half_day: shape.is_half_day,
                prior_status: parent.status,
            });
            let outcome = self
                .apply(parent, LeaveAction::RequestModification, actor)
                .await?;
            return Ok(vec![outcome.request]);
        }

        if parent.status == LeaveStatus::Pending {
            return Err(AppError::validation(
                "Pending requests can only be modified as a whole",
            ));
        }
        self.check_unclaimed(&parent, &selection.dates).await?;
        let runs = segment_dates(&selection.dates, &selection.calendar);
        for run in &runs {
            let claim = Claim {
                request_type: &request_type,
                range: run.range,
                slots: shape.slots(),
            };
            if let Some(conflict) = find_conflict(&claim, &active, &[parent.id]) {
                return Err(conflict.into());
            }
        }

        let template = SegmentTemplate {
            request_type,
            shape,
            status: LeaveStatus::RequestingForModification,
        };
        let now = self.deps.clock.now();
        self.create_segments(&parent, &runs, &template, now).await
    }

    /// Full wipe of the ledger rows a request holds. A segment clears its own
    /// dates under the parent's lock; a master request also clears rows its
    /// approved modification segments wrote.
    pub async fn clear_attendance(&self, id: LeaveId, actor: &Actor) -> Result<u64, AppError> {
        let request = self.load(id).await?;
        lifecycle::authorize(Who::Reviewer, &request, actor)?;
        let mut sources = vec![request.id];
        let within = match request.request_modified_from {
            Some(parent) => {
                sources.push(parent);
                Some(request.range())
            }
            None => {
                let children = self.deps.leaves.children(request.id).await?;
                sources.extend(children.iter().map(|child| child.id));
                None
            }
        };
        let cleared = self
            .deps
            .attendance
            .reset_by_source(&sources, within, ResetScope::Everything)
            .await?;
        tracing::info!(leave_id = %request.id, cleared, actor = actor.user_id, "Attendance cleared");
        Ok(cleared)
    }

    /// Rewrites the ledger for a request that owns attendance. Safe to repeat.
    pub async fn reconcile(&self, id: LeaveId, actor: &Actor) -> Result<ReconcileReport, AppError> {
        let request = self.load(id).await?;
        lifecycle::authorize(Who::Reviewer, &request, actor)?;
        let owns_attendance =
            request.status.is_granted() || request.status == LeaveStatus::ModificationApproved;
        if !owns_attendance {
            return Err(AppError::forbidden(format!(
                "Cannot reconcile a request that is {}",
                request.status
            )));
        }
        self.reconcile_now(&request).await
    }

    pub async fn mark_read(&self, id: LeaveId, actor: &Actor) -> Result<LeaveRequest, AppError> {
        let mut request = self.load(id).await?;
        let owner = actor.owns(request.employee_id);
        if !owner && !actor.is_reviewer() {
            return Err(AppError::forbidden("Not allowed to read this request"));
        }
        if owner {
            request.is_read_employee = true;
        }
        if actor.is_reviewer() {
            request.is_read = true;
        }
        self.deps.leaves.update(&request).await?;
        Ok(request)
    }

    pub async fn get_tree(&self, id: LeaveId, actor: &Actor) -> Result<LeaveTree, AppError> {
        let request = self.load(id).await?;
        lifecycle::authorize(Who::OwnerOrReviewer, &request, actor)?;
        let segments = self.deps.leaves.children(request.id).await?;
        Ok(LeaveTree { request, segments })
    }

    pub async fn list(
        &self,
        actor: &Actor,
        employee_id: Option<u64>,
        year: Option<i32>,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        let employee_id = acting_employee(actor, employee_id)?;
        self.deps.leaves.list_for_employee(employee_id, year).await
    }
}

/// The other side has something new to look at.
fn flag_unread(request: &mut LeaveRequest, actor: &Actor) {
    if actor.owns(request.employee_id) {
        request.is_read = false;
        request.is_read_employee = true;
    } else {
        request.is_read = true;
        request.is_read_employee = false;
    }
}
