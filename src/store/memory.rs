//! In-memory stores and a ready-wired engine for tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::engine::clock::FixedClock;
use crate::engine::{EngineDeps, LeaveEngine, Policy};
use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceWrite, ResetScope};
use crate::model::date_range::DateRange;
use crate::model::employee::EmploymentFacts;
use crate::model::leave_request::{LeaveId, LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::model::timesheet_blocker::{NewBlocker, TimesheetBlocker};
use crate::store::{
    AttendanceStore, BlockerStore, CalendarOracle, DocumentStore, EmployeeDirectory, LeaveEvent,
    LeaveStore, Notifier,
};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[derive(Default)]
struct State {
    next_leave_id: u64,
    leaves: BTreeMap<LeaveId, LeaveRequest>,
    next_record_id: u64,
    attendance: BTreeMap<(u64, NaiveDate), AttendanceRecord>,
    next_blocker_id: u64,
    blockers: BTreeMap<u64, TimesheetBlocker>,
    employees: BTreeMap<u64, (EmploymentFacts, Option<u64>)>,
    documents: HashMap<LeaveId, usize>,
    failing_days: BTreeSet<NaiveDate>,
    documents_fail: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Upserts for `day` fail until [`MemoryStore::clear_upsert_faults`].
    pub fn fail_upserts_on(&self, day: NaiveDate) {
        self.state().failing_days.insert(day);
    }

    pub fn clear_upsert_faults(&self) {
        self.state().failing_days.clear();
    }

    pub fn fail_documents(&self) {
        self.state().documents_fail = true;
    }

    pub fn add_documents(&self, id: LeaveId, count: usize) {
        self.state().documents.insert(id, count);
    }

    pub fn documents_of(&self, id: LeaveId) -> usize {
        self.state().documents.get(&id).copied().unwrap_or(0)
    }

    pub fn add_employee(&self, facts: EmploymentFacts, manager: Option<u64>) {
        self.state()
            .employees
            .insert(facts.employee_id, (facts, manager));
    }

    pub fn record(&self, employee_id: u64, day: NaiveDate) -> Option<AttendanceRecord> {
        self.state().attendance.get(&(employee_id, day)).cloned()
    }

    pub fn request(&self, id: LeaveId) -> Option<LeaveRequest> {
        self.state().leaves.get(&id).cloned()
    }

    fn store_record(state: &mut State, write: AttendanceWrite) -> AttendanceRecord {
        let key = (write.employee_id, write.working_date);
        let id = match state.attendance.get(&key) {
            Some(existing) => existing.id,
            None => {
                state.next_record_id += 1;
                state.next_record_id
            }
        };
        let updated_at = write.working_date.and_time(NaiveTime::MIN);
        let record = write.into_record(id, updated_at);
        state.attendance.insert(key, record.clone());
        record
    }
}

fn reset(record: &mut AttendanceRecord, scope: ResetScope) {
    match scope {
        ResetScope::Lock => record.source_request_id = None,
        ResetScope::Worked => {
            record.status = None;
            record.total_hours = None;
            record.work_location = None;
        }
        ResetScope::Everything => {
            record.status = None;
            record.total_hours = None;
            record.work_location = None;
            record.first_half = None;
            record.second_half = None;
            record.source_request_id = None;
        }
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn insert(&self, new: NewLeaveRequest) -> Result<LeaveRequest, AppError> {
        let mut state = self.state();
        state.next_leave_id += 1;
        let request = new.into_request(LeaveId(state.next_leave_id));
        state.leaves.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get(&self, id: LeaveId) -> Result<Option<LeaveRequest>, AppError> {
        Ok(self.state().leaves.get(&id).cloned())
    }

    async fn update(&self, request: &LeaveRequest) -> Result<(), AppError> {
        let mut state = self.state();
        match state.leaves.get_mut(&request.id) {
            Some(slot) => {
                *slot = request.clone();
                Ok(())
            }
            None => Err(AppError::not_found(format!("Leave request {} not found", request.id))),
        }
    }

    async fn find_overlapping(
        &self,
        employee_id: u64,
        range: DateRange,
        statuses: &[LeaveStatus],
    ) -> Result<Vec<LeaveRequest>, AppError> {
        Ok(self
            .state()
            .leaves
            .values()
            .filter(|r| r.employee_id == employee_id)
            .filter(|r| statuses.contains(&r.status))
            .filter(|r| r.range().overlaps(&range))
            .cloned()
            .collect())
    }

    async fn children(&self, parent: LeaveId) -> Result<Vec<LeaveRequest>, AppError> {
        let mut children: Vec<_> = self
            .state()
            .leaves
            .values()
            .filter(|r| r.request_modified_from == Some(parent))
            .cloned()
            .collect();
        children.sort_by_key(|r| (r.from_date, r.id));
        Ok(children)
    }

    async fn list_for_employee(
        &self,
        employee_id: u64,
        year: Option<i32>,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        Ok(self
            .state()
            .leaves
            .values()
            .filter(|r| r.employee_id == employee_id)
            .filter(|r| {
                year.is_none_or(|y| r.from_date.year() == y || r.to_date.year() == y)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn get(
        &self,
        employee_id: u64,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        Ok(self.record(employee_id, day))
    }

    async fn between(
        &self,
        employee_id: u64,
        range: DateRange,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        Ok(self
            .state()
            .attendance
            .range((employee_id, range.from)..=(employee_id, range.to))
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn upsert(&self, write: AttendanceWrite) -> Result<AttendanceRecord, AppError> {
        let mut state = self.state();
        if state.failing_days.contains(&write.working_date) {
            return Err(AppError::internal("injected upsert failure"));
        }
        Ok(Self::store_record(&mut state, write))
    }

    async fn insert_new(&self, write: AttendanceWrite) -> Result<AttendanceRecord, AppError> {
        let mut state = self.state();
        if state
            .attendance
            .contains_key(&(write.employee_id, write.working_date))
        {
            return Err(AppError::conflict("Record already exists"));
        }
        Ok(Self::store_record(&mut state, write))
    }

    async fn reset_by_source(
        &self,
        sources: &[LeaveId],
        within: Option<DateRange>,
        scope: ResetScope,
    ) -> Result<u64, AppError> {
        let mut touched = 0;
        for record in self.state().attendance.values_mut() {
            let owned = record
                .source_request_id
                .is_some_and(|source| sources.contains(&source));
            let inside = within.is_none_or(|range| range.contains(record.working_date));
            if owned && inside {
                reset(record, scope);
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn reset_range(
        &self,
        employee_id: u64,
        range: DateRange,
        scope: ResetScope,
    ) -> Result<u64, AppError> {
        let mut touched = 0;
        for (_, record) in self
            .state()
            .attendance
            .range_mut((employee_id, range.from)..=(employee_id, range.to))
        {
            reset(record, scope);
            touched += 1;
        }
        Ok(touched)
    }
}

#[async_trait]
impl BlockerStore for MemoryStore {
    async fn covering(
        &self,
        employee_id: u64,
        day: NaiveDate,
    ) -> Result<Option<TimesheetBlocker>, AppError> {
        Ok(self
            .state()
            .blockers
            .values()
            .find(|b| b.employee_id == employee_id && b.covers(day))
            .cloned())
    }

    async fn insert(&self, new: NewBlocker, blocked_by: u64) -> Result<TimesheetBlocker, AppError> {
        let mut state = self.state();
        state.next_blocker_id += 1;
        let blocker = TimesheetBlocker {
            id: state.next_blocker_id,
            employee_id: new.employee_id,
            blocked_from: new.blocked_from,
            blocked_to: new.blocked_to,
            blocked_by,
            reason: new.reason,
            created_at: new.blocked_from.and_time(NaiveTime::MIN),
        };
        state.blockers.insert(blocker.id, blocker.clone());
        Ok(blocker)
    }

    async fn list(&self, employee_id: Option<u64>) -> Result<Vec<TimesheetBlocker>, AppError> {
        Ok(self
            .state()
            .blockers
            .values()
            .filter(|b| employee_id.is_none_or(|id| b.employee_id == id))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: u64) -> Result<bool, AppError> {
        Ok(self.state().blockers.remove(&id).is_some())
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryStore {
    async fn employment_facts(
        &self,
        employee_id: u64,
    ) -> Result<Option<EmploymentFacts>, AppError> {
        Ok(self
            .state()
            .employees
            .get(&employee_id)
            .map(|(facts, _)| facts.clone()))
    }

    async fn manager_of(&self, employee_id: u64) -> Result<Option<u64>, AppError> {
        Ok(self
            .state()
            .employees
            .get(&employee_id)
            .and_then(|(_, manager)| *manager))
    }

    async fn active_employee_ids(&self) -> Result<Vec<u64>, AppError> {
        Ok(self.state().employees.keys().copied().collect())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn copy(&self, source: LeaveId, target: LeaveId) -> Result<usize, AppError> {
        let mut state = self.state();
        if state.documents_fail {
            return Err(AppError::internal("document store unavailable"));
        }
        let count = state.documents.get(&source).copied().unwrap_or(0);
        if count > 0 {
            *state.documents.entry(target).or_insert(0) += count;
        }
        Ok(count)
    }
}

/// Fixed holiday list; weekends are Saturday/Sunday unless replaced.
#[derive(Debug, Clone, Default)]
pub struct StaticCalendar {
    holidays: BTreeSet<NaiveDate>,
    weekend_days: Option<BTreeSet<NaiveDate>>,
}

impl StaticCalendar {
    pub fn with_holidays(days: &[&str]) -> Self {
        StaticCalendar {
            holidays: days.iter().map(|s| d(s)).collect(),
            weekend_days: None,
        }
    }

    /// Only these exact dates count as weekend.
    pub fn with_weekend_days(mut self, days: &[&str]) -> Self {
        self.weekend_days = Some(days.iter().map(|s| d(s)).collect());
        self
    }
}

#[async_trait]
impl CalendarOracle for StaticCalendar {
    async fn holidays_between(&self, range: DateRange) -> Result<BTreeSet<NaiveDate>, AppError> {
        Ok(self
            .holidays
            .range(range.from..=range.to)
            .copied()
            .collect())
    }

    fn is_weekend(&self, day: NaiveDate) -> bool {
        match &self.weekend_days {
            Some(days) => days.contains(&day),
            None => matches!(day.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<LeaveEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<LeaveEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: LeaveEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// An engine over one [`MemoryStore`] with a movable clock.
pub struct Harness {
    pub engine: LeaveEngine,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(now: &str) -> Self {
        Harness::with_calendar(now, StaticCalendar::default())
    }

    pub fn with_calendar(now: &str, calendar: StaticCalendar) -> Self {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(FixedClock::at(now));
        let notifier = Arc::new(RecordingNotifier::default());
        let deps = EngineDeps {
            leaves: store.clone(),
            attendance: store.clone(),
            blockers: store.clone(),
            directory: store.clone(),
            calendar: Arc::new(calendar),
            documents: store.clone(),
            notifier: notifier.clone(),
            clock: clock.clone(),
        };
        Harness {
            engine: LeaveEngine::new(deps, Policy::default()),
            store,
            clock,
            notifier,
        }
    }
}
