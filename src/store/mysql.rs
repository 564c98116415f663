//! sqlx/MySQL backing for the store traits.
//!
//! Enums are stored as their display labels and parsed back on read; a label
//! the code does not know is an internal error, never a silent default.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};

use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceWrite, ResetScope};
use crate::model::date_range::DateRange;
use crate::model::employee::EmploymentFacts;
use crate::model::leave_request::{
    LeaveId, LeaveRequest, LeaveStatus, NewLeaveRequest, ProposedChange,
};
use crate::model::timesheet_blocker::{NewBlocker, TimesheetBlocker};
use crate::store::{
    AttendanceStore, BlockerStore, CalendarOracle, DocumentStore, EmployeeDirectory, LeaveEvent,
    LeaveStore, Notifier,
};

fn parse<T: FromStr>(column: &str, value: &str) -> Result<T, AppError> {
    value.parse().map_err(|_| {
        tracing::error!(column, value, "Unrecognised value in database");
        AppError::internal(format!("Unrecognised {column} value '{value}'"))
    })
}

fn parse_opt<T: FromStr>(column: &str, value: Option<&str>) -> Result<Option<T>, AppError> {
    value.map(|v| parse(column, v)).transpose()
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/* =========================
Leave requests
========================= */

const LEAVE_COLUMNS: &str = r#"
    id, employee_id, request_type, from_date, to_date, title, description,
    status, duration, first_half, second_half, is_half_day, submitted_at,
    updated_at, request_modified_from, reviewed_by, is_read, is_read_employee,
    proposed_request_type, proposed_first_half, proposed_second_half,
    proposed_is_half_day, proposed_prior_status
"#;

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    request_type: String,
    from_date: NaiveDate,
    to_date: NaiveDate,
    title: String,
    description: Option<String>,
    status: String,
    duration: Decimal,
    first_half: String,
    second_half: String,
    is_half_day: bool,
    submitted_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    request_modified_from: Option<u64>,
    reviewed_by: Option<u64>,
    is_read: bool,
    is_read_employee: bool,
    proposed_request_type: Option<String>,
    proposed_first_half: Option<String>,
    proposed_second_half: Option<String>,
    proposed_is_half_day: Option<bool>,
    proposed_prior_status: Option<String>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = AppError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let proposed = match (
            row.proposed_request_type.as_deref(),
            row.proposed_first_half.as_deref(),
            row.proposed_second_half.as_deref(),
            row.proposed_prior_status.as_deref(),
        ) {
            (Some(kind), Some(first), Some(second), Some(prior)) => Some(ProposedChange {
                request_type: parse("proposed_request_type", kind)?,
                first_half: parse("proposed_first_half", first)?,
                second_half: parse("proposed_second_half", second)?,
                is_half_day: row.proposed_is_half_day.unwrap_or(false),
                prior_status: parse("proposed_prior_status", prior)?,
            }),
            _ => None,
        };
        Ok(LeaveRequest {
            id: LeaveId(row.id),
            employee_id: row.employee_id,
            request_type: parse("request_type", &row.request_type)?,
            from_date: row.from_date,
            to_date: row.to_date,
            title: row.title,
            description: row.description,
            status: parse("status", &row.status)?,
            duration: row.duration,
            first_half: parse("first_half", &row.first_half)?,
            second_half: parse("second_half", &row.second_half)?,
            is_half_day: row.is_half_day,
            submitted_at: row.submitted_at,
            updated_at: row.updated_at,
            request_modified_from: row.request_modified_from.map(LeaveId),
            reviewed_by: row.reviewed_by,
            is_read: row.is_read,
            is_read_employee: row.is_read_employee,
            proposed,
        })
    }
}

fn into_requests(rows: Vec<LeaveRow>) -> Result<Vec<LeaveRequest>, AppError> {
    rows.into_iter().map(LeaveRequest::try_from).collect()
}

#[derive(Clone)]
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlLeaveStore { pool }
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn insert(&self, new: NewLeaveRequest) -> Result<LeaveRequest, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, request_type, from_date, to_date, title, description,
                 status, duration, first_half, second_half, is_half_day,
                 submitted_at, updated_at, request_modified_from)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.request_type.to_string())
        .bind(new.from_date)
        .bind(new.to_date)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.status.to_string())
        .bind(new.duration)
        .bind(new.first_half.label())
        .bind(new.second_half.label())
        .bind(new.is_half_day)
        .bind(new.submitted_at)
        .bind(new.submitted_at)
        .bind(new.request_modified_from.map(|id| id.0))
        .execute(&self.pool)
        .await?;

        let id = LeaveId(result.last_insert_id());
        Ok(new.into_request(id))
    }

    async fn get(&self, id: LeaveId) -> Result<Option<LeaveRequest>, AppError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn update(&self, request: &LeaveRequest) -> Result<(), AppError> {
        let proposed = request.proposed.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE leave_requests SET
                request_type = ?, status = ?, duration = ?, first_half = ?,
                second_half = ?, is_half_day = ?, updated_at = ?, reviewed_by = ?,
                is_read = ?, is_read_employee = ?, proposed_request_type = ?,
                proposed_first_half = ?, proposed_second_half = ?,
                proposed_is_half_day = ?, proposed_prior_status = ?
            WHERE id = ?
            "#,
        )
        .bind(request.request_type.to_string())
        .bind(request.status.to_string())
        .bind(request.duration)
        .bind(request.first_half.label())
        .bind(request.second_half.label())
        .bind(request.is_half_day)
        .bind(request.updated_at)
        .bind(request.reviewed_by)
        .bind(request.is_read)
        .bind(request.is_read_employee)
        .bind(proposed.map(|p| p.request_type.to_string()))
        .bind(proposed.map(|p| p.first_half.label()))
        .bind(proposed.map(|p| p.second_half.label()))
        .bind(proposed.map(|p| p.is_half_day))
        .bind(proposed.map(|p| p.prior_status.to_string()))
        .bind(request.id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // MySQL reports 0 for unchanged rows too
            let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leave_requests WHERE id = ?")
                .bind(request.id.0)
                .fetch_one(&self.pool)
                .await?;
            if exists == 0 {
                return Err(AppError::not_found(format!("Leave request {} not found", request.id)));
            }
        }
        Ok(())
    }

    async fn find_overlapping(
        &self,
        employee_id: u64,
        range: DateRange,
        statuses: &[LeaveStatus],
    ) -> Result<Vec<LeaveRequest>, AppError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            r#"
            SELECT {LEAVE_COLUMNS} FROM leave_requests
            WHERE employee_id = ?
              AND from_date <= ?
              AND to_date >= ?
              AND status IN ({})
            ORDER BY from_date, id
            "#,
            placeholders(statuses.len())
        );
        let mut query = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(employee_id)
            .bind(range.to)
            .bind(range.from);
        for status in statuses {
            query = query.bind(status.to_string());
        }
        into_requests(query.fetch_all(&self.pool).await?)
    }

    async fn children(&self, parent: LeaveId) -> Result<Vec<LeaveRequest>, AppError> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE request_modified_from = ? ORDER BY from_date, id"
        );
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(parent.0)
            .fetch_all(&self.pool)
            .await?;
        into_requests(rows)
    }

    async fn list_for_employee(
        &self,
        employee_id: u64,
        year: Option<i32>,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        let mut where_sql = String::from(" WHERE employee_id = ?");
        if year.is_some() {
            where_sql.push_str(" AND (YEAR(from_date) = ? OR YEAR(to_date) = ?)");
        }
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests{where_sql} ORDER BY from_date DESC, id DESC"
        );
        let mut query = sqlx::query_as::<_, LeaveRow>(&sql).bind(employee_id);
        if let Some(year) = year {
            query = query.bind(year).bind(year);
        }
        into_requests(query.fetch_all(&self.pool).await?)
    }
}

/* =========================
Attendance ledger
========================= */

const ATTENDANCE_COLUMNS: &str = r#"
    id, employee_id, working_date, total_hours, work_location, status,
    first_half, second_half, source_request_id, updated_at
"#;

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    working_date: NaiveDate,
    total_hours: Option<Decimal>,
    work_location: Option<String>,
    status: Option<String>,
    first_half: Option<String>,
    second_half: Option<String>,
    source_request_id: Option<u64>,
    updated_at: NaiveDateTime,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = AppError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            working_date: row.working_date,
            total_hours: row.total_hours,
            work_location: parse_opt("work_location", row.work_location.as_deref())?,
            status: parse_opt("status", row.status.as_deref())?,
            first_half: parse_opt("first_half", row.first_half.as_deref())?,
            second_half: parse_opt("second_half", row.second_half.as_deref())?,
            source_request_id: row.source_request_id.map(LeaveId),
            updated_at: row.updated_at,
        })
    }
}

fn reset_clause(scope: ResetScope) -> &'static str {
    match scope {
        ResetScope::Lock => "source_request_id = NULL",
        ResetScope::Worked => "status = NULL, total_hours = NULL, work_location = NULL",
        ResetScope::Everything => {
            "status = NULL, total_hours = NULL, work_location = NULL, \
             first_half = NULL, second_half = NULL, source_request_id = NULL"
        }
    }
}

#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlAttendanceStore { pool }
    }

    async fn write(&self, write: &AttendanceWrite, upsert: bool) -> Result<(), AppError> {
        let conflict_clause = if upsert {
            r#"
            ON DUPLICATE KEY UPDATE
                total_hours = VALUES(total_hours),
                work_location = VALUES(work_location),
                status = VALUES(status),
                first_half = VALUES(first_half),
                second_half = VALUES(second_half),
                source_request_id = VALUES(source_request_id),
                updated_at = NOW()
            "#
        } else {
            ""
        };
        let sql = format!(
            r#"
            INSERT INTO attendance
                (employee_id, working_date, total_hours, work_location, status,
                 first_half, second_half, source_request_id, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, NOW())
            {conflict_clause}
            "#
        );
        sqlx::query(&sql)
            .bind(write.employee_id)
            .bind(write.working_date)
            .bind(write.total_hours)
            .bind(write.work_location.map(|l| l.to_string()))
            .bind(write.status.map(|s| s.to_string()))
            .bind(write.first_half.map(|h| h.label()))
            .bind(write.second_half.map(|h| h.label()))
            .bind(write.source_request_id.map(|id| id.0))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn stored(&self, employee_id: u64, day: NaiveDate) -> Result<AttendanceRecord, AppError> {
        self.get(employee_id, day).await?.ok_or_else(|| {
            AppError::internal(format!("Attendance row for {employee_id} on {day} vanished"))
        })
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn get(
        &self,
        employee_id: u64,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND working_date = ?"
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(day)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn between(
        &self,
        employee_id: u64,
        range: DateRange,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS} FROM attendance
            WHERE employee_id = ? AND working_date BETWEEN ? AND ?
            ORDER BY working_date
            "#
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(AttendanceRecord::try_from)
            .collect()
    }

    async fn upsert(&self, write: AttendanceWrite) -> Result<AttendanceRecord, AppError> {
        self.write(&write, true).await?;
        self.stored(write.employee_id, write.working_date).await
    }

    async fn insert_new(&self, write: AttendanceWrite) -> Result<AttendanceRecord, AppError> {
        self.write(&write, false).await?;
        self.stored(write.employee_id, write.working_date).await
    }

    async fn reset_by_source(
        &self,
        sources: &[LeaveId],
        within: Option<DateRange>,
        scope: ResetScope,
    ) -> Result<u64, AppError> {
        if sources.is_empty() {
            return Ok(0);
        }
        let mut sql = format!(
            "UPDATE attendance SET {}, updated_at = NOW() WHERE source_request_id IN ({})",
            reset_clause(scope),
            placeholders(sources.len())
        );
        if within.is_some() {
            sql.push_str(" AND working_date BETWEEN ? AND ?");
        }
        let mut query = sqlx::query(&sql);
        for source in sources {
            query = query.bind(source.0);
        }
        if let Some(range) = within {
            query = query.bind(range.from).bind(range.to);
        }
        Ok(query.execute(&self.pool).await?.rows_affected())
    }

    async fn reset_range(
        &self,
        employee_id: u64,
        range: DateRange,
        scope: ResetScope,
    ) -> Result<u64, AppError> {
        let sql = format!(
            "UPDATE attendance SET {}, updated_at = NOW() \
             WHERE employee_id = ? AND working_date BETWEEN ? AND ?",
            reset_clause(scope)
        );
        let result = sqlx::query(&sql)
            .bind(employee_id)
            .bind(range.from)
            .bind(range.to)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/* =========================
Timesheet blockers
========================= */

#[derive(FromRow)]
struct BlockerRow {
    id: u64,
    employee_id: u64,
    blocked_from: NaiveDate,
    blocked_to: NaiveDate,
    blocked_by: u64,
    reason: Option<String>,
    created_at: NaiveDateTime,
}

impl From<BlockerRow> for TimesheetBlocker {
    fn from(row: BlockerRow) -> Self {
        TimesheetBlocker {
            id: row.id,
            employee_id: row.employee_id,
            blocked_from: row.blocked_from,
            blocked_to: row.blocked_to,
            blocked_by: row.blocked_by,
            reason: row.reason,
            created_at: row.created_at,
        }
    }
}

const BLOCKER_COLUMNS: &str =
    "id, employee_id, blocked_from, blocked_to, blocked_by, reason, created_at";

#[derive(Clone)]
pub struct MySqlBlockerStore {
    pool: MySqlPool,
}

impl MySqlBlockerStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlBlockerStore { pool }
    }
}

#[async_trait]
impl BlockerStore for MySqlBlockerStore {
    async fn covering(
        &self,
        employee_id: u64,
        day: NaiveDate,
    ) -> Result<Option<TimesheetBlocker>, AppError> {
        let sql = format!(
            r#"
            SELECT {BLOCKER_COLUMNS} FROM timesheet_blockers
            WHERE employee_id = ? AND ? BETWEEN blocked_from AND blocked_to
            ORDER BY id
            LIMIT 1
            "#
        );
        Ok(sqlx::query_as::<_, BlockerRow>(&sql)
            .bind(employee_id)
            .bind(day)
            .fetch_optional(&self.pool)
            .await?
            .map(TimesheetBlocker::from))
    }

    async fn insert(&self, new: NewBlocker, blocked_by: u64) -> Result<TimesheetBlocker, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO timesheet_blockers
                (employee_id, blocked_from, blocked_to, blocked_by, reason, created_at)
            VALUES (?, ?, ?, ?, ?, NOW())
            "#,
        )
        .bind(new.employee_id)
        .bind(new.blocked_from)
        .bind(new.blocked_to)
        .bind(blocked_by)
        .bind(&new.reason)
        .execute(&self.pool)
        .await?;

        let sql = format!("SELECT {BLOCKER_COLUMNS} FROM timesheet_blockers WHERE id = ?");
        let row = sqlx::query_as::<_, BlockerRow>(&sql)
            .bind(result.last_insert_id())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn list(&self, employee_id: Option<u64>) -> Result<Vec<TimesheetBlocker>, AppError> {
        let mut sql = format!("SELECT {BLOCKER_COLUMNS} FROM timesheet_blockers WHERE 1=1");
        if employee_id.is_some() {
            sql.push_str(" AND employee_id = ?");
        }
        sql.push_str(" ORDER BY blocked_from DESC, id DESC");
        let mut query = sqlx::query_as::<_, BlockerRow>(&sql);
        if let Some(employee_id) = employee_id {
            query = query.bind(employee_id);
        }
        Ok(query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(TimesheetBlocker::from)
            .collect())
    }

    async fn delete(&self, id: u64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM timesheet_blockers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/* =========================
Employee directory
========================= */

#[derive(FromRow)]
struct EmploymentRow {
    id: u64,
    employment_type: Option<String>,
    designation: Option<String>,
    joining_date: NaiveDate,
    conversion_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct MySqlDirectory {
    pool: MySqlPool,
}

impl MySqlDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlDirectory { pool }
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlDirectory {
    async fn employment_facts(
        &self,
        employee_id: u64,
    ) -> Result<Option<EmploymentFacts>, AppError> {
        let row = sqlx::query_as::<_, EmploymentRow>(
            r#"
            SELECT id, employment_type, designation, joining_date, conversion_date
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| EmploymentFacts {
            employee_id: row.id,
            // free text; anything unknown falls back to the designation
            employment_type: row.employment_type.and_then(|t| t.parse().ok()),
            designation: row.designation,
            joining_date: row.joining_date,
            conversion_date: row.conversion_date,
        }))
    }

    async fn manager_of(&self, employee_id: u64) -> Result<Option<u64>, AppError> {
        let manager = sqlx::query_scalar::<_, Option<u64>>(
            "SELECT manager_id FROM employees WHERE id = ?",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(manager.flatten())
    }

    async fn active_employee_ids(&self) -> Result<Vec<u64>, AppError> {
        let mut stream = sqlx::query_scalar::<_, u64>(
            "SELECT id FROM employees WHERE is_active = 1 ORDER BY id",
        )
        .fetch(&self.pool);

        let mut ids = Vec::new();
        while let Some(id) = stream.next().await {
            ids.push(id?);
        }
        Ok(ids)
    }
}

/* =========================
Holiday calendar
========================= */

/// Holidays per calendar year.
static HOLIDAY_CACHE: Lazy<Cache<i32, Arc<BTreeSet<NaiveDate>>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(64)
        .time_to_live(Duration::from_secs(3600))
        .build()
});

async fn load_year(pool: &MySqlPool, year: i32) -> Result<Arc<BTreeSet<NaiveDate>>, AppError> {
    let days = sqlx::query_scalar::<_, NaiveDate>(
        "SELECT holiday_date FROM holidays WHERE YEAR(holiday_date) = ?",
    )
    .bind(year)
    .fetch_all(pool)
    .await?;
    tracing::debug!(year, holidays = days.len(), "Holiday calendar loaded");
    Ok(Arc::new(days.into_iter().collect()))
}

#[derive(Clone)]
pub struct MySqlCalendar {
    pool: MySqlPool,
}

impl MySqlCalendar {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlCalendar { pool }
    }
}

#[async_trait]
impl CalendarOracle for MySqlCalendar {
    async fn holidays_between(&self, range: DateRange) -> Result<BTreeSet<NaiveDate>, AppError> {
        let mut holidays = BTreeSet::new();
        for year in range.from.year()..=range.to.year() {
            let yearly = HOLIDAY_CACHE
                .try_get_with(year, load_year(&self.pool, year))
                .await
                .map_err(|e: Arc<AppError>| (*e).clone())?;
            holidays.extend(yearly.range(range.from..=range.to).copied());
        }
        Ok(holidays)
    }
}

/* =========================
Documents
========================= */

#[derive(FromRow)]
struct DocumentRow {
    storage_path: String,
    file_name: String,
    content_type: Option<String>,
}

#[derive(Clone)]
pub struct MySqlDocuments {
    pool: MySqlPool,
}

impl MySqlDocuments {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlDocuments { pool }
    }
}

#[async_trait]
impl DocumentStore for MySqlDocuments {
    async fn copy(&self, source: LeaveId, target: LeaveId) -> Result<usize, AppError> {
        let documents = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT storage_path, file_name, content_type
            FROM leave_documents
            WHERE leave_request_id = ?
            "#,
        )
        .bind(source.0)
        .fetch_all(&self.pool)
        .await?;

        for document in &documents {
            // new metadata row, same stored object
            sqlx::query(
                r#"
                INSERT INTO leave_documents
                    (leave_request_id, document_key, storage_path, file_name, content_type, created_at)
                VALUES (?, ?, ?, ?, ?, NOW())
                "#,
            )
            .bind(target.0)
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&document.storage_path)
            .bind(&document.file_name)
            .bind(&document.content_type)
            .execute(&self.pool)
            .await?;
        }
        Ok(documents.len())
    }
}

/// Writes lifecycle events to the log; delivery channels hang off this later.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: LeaveEvent) {
        tracing::info!(
            leave_id = %event.request_id,
            employee_id = event.employee_id,
            status = %event.status,
            recipient = ?event.recipient,
            "Leave event"
        );
    }
}
