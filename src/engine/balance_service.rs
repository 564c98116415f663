use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::engine::accrual::{
    LeaveBalance, MonthlyBalance, YearMonth, classify, summarize, usage_by_month, walk, walk_start,
};
use crate::engine::{LeaveEngine, acting_employee};
use crate::error::AppError;
use crate::model::date_range::DateRange;
use crate::model::employee::EmploymentFacts;
use crate::model::leave_request::LeaveStatus;
use crate::model::role::Actor;

fn last_day(month: YearMonth) -> Option<NaiveDate> {
    month.next().first_day().map(|first| first - Duration::days(1))
}

impl LeaveEngine {
    async fn employment_facts(&self, employee_id: u64) -> Result<EmploymentFacts, AppError> {
        self.deps
            .directory
            .employment_facts(employee_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Employee {employee_id} not found")))
    }

    /// Ledger usage per month between `from` and `to`, read one year at a time.
    async fn monthly_usage(
        &self,
        employee_id: u64,
        from: YearMonth,
        to: YearMonth,
    ) -> Result<BTreeMap<YearMonth, Decimal>, AppError> {
        let mut records = Vec::new();
        for year in from.year..=to.year {
            let start = if year == from.year { from } else { YearMonth::new(year, 1) };
            let end = if year == to.year { to } else { YearMonth::new(year, 12) };
            let (Some(first), Some(last)) = (start.first_day(), last_day(end)) else {
                return Err(AppError::validation(format!("Invalid month {}-{}", end.year, end.month)));
            };
            let range = DateRange::new(first, last)?;
            records.extend(self.deps.attendance.between(employee_id, range).await?);
        }
        Ok(usage_by_month(&records))
    }

    async fn walk_to(
        &self,
        facts: &EmploymentFacts,
        target: YearMonth,
    ) -> Result<Vec<MonthlyBalance>, AppError> {
        let start = walk_start(facts, self.policy.accrual_baseline_year);
        let usage = if start <= target {
            self.monthly_usage(facts.employee_id, start, target).await?
        } else {
            BTreeMap::new()
        };
        Ok(walk(facts, target, self.policy.accrual_baseline_year, &usage))
    }

    /// Year-to-date entitlement, usage and loss-of-pay. Past years run through
    /// December, the current year through the current month.
    pub async fn get_balance(
        &self,
        actor: &Actor,
        employee_id: u64,
        year: i32,
    ) -> Result<LeaveBalance, AppError> {
        let employee_id = acting_employee(actor, Some(employee_id))?;
        let today = self.deps.clock.today();
        let target = match year.cmp(&today.year()) {
            std::cmp::Ordering::Less => YearMonth::new(year, 12),
            std::cmp::Ordering::Equal => YearMonth::of(today),
            std::cmp::Ordering::Greater => {
                return Err(AppError::validation(format!(
                    "Balance for {year} is not available yet"
                )));
            }
        };
        let facts = self.employment_facts(employee_id).await?;
        let months = self.walk_to(&facts, target).await?;

        let pending: Decimal = self
            .deps
            .leaves
            .list_for_employee(employee_id, Some(year))
            .await?
            .iter()
            .filter(|request| request.status == LeaveStatus::Pending)
            .filter(|request| request.request_type.consumes_leave())
            .map(|request| request.duration)
            .sum();

        let balance = summarize(year, &months, pending);
        tracing::debug!(employee_id, year, balance = %balance.balance, lop = %balance.lop, "Balance computed");
        Ok(balance)
    }

    pub async fn get_monthly_balance(
        &self,
        actor: &Actor,
        employee_id: u64,
        month: u32,
        year: i32,
    ) -> Result<MonthlyBalance, AppError> {
        let employee_id = acting_employee(actor, Some(employee_id))?;
        if !(1..=12).contains(&month) {
            return Err(AppError::validation(format!("Invalid month {month}")));
        }
        if year > self.deps.clock.today().year() {
            return Err(AppError::validation(format!(
                "Balance for {year} is not available yet"
            )));
        }
        let target = YearMonth::new(year, month);
        let facts = self.employment_facts(employee_id).await?;
        let months = self.walk_to(&facts, target).await?;
        Ok(months
            .into_iter()
            .rev()
            .find(|entry| entry.year == year && entry.month == month)
            .unwrap_or_else(|| MonthlyBalance {
                year,
                month,
                employment_type: classify(&facts, target),
                carry_over: Decimal::ZERO,
                accrual: Decimal::ZERO,
                used: Decimal::ZERO,
                lop: Decimal::ZERO,
                balance: Decimal::ZERO,
            }))
    }
}
