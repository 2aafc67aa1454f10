use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::IntoParams;
use uuid::Uuid;

use super::calendar::{Clock, TimeWindow, WorkSchedule, hours_between, parse_timestamp};
use super::stats::{StatsQuery, attendance_stats};
use crate::error::{AttendanceError, StoreError};
use crate::model::attendance::{
    AttendancePage, AttendancePatch, AttendanceRecord, AttendanceStatus, NewAttendance, PageMeta,
    StatsReport,
};
use crate::store::{AttendanceFilter, AttendanceStore, Checkout, EmployeeDirectory};

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// First day (YYYY-MM-DD); only applied together with `endDate`
    #[param(value_type = Option<String>, example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    /// Last day (YYYY-MM-DD), inclusive
    #[param(value_type = Option<String>, example = "2026-01-31")]
    pub end_date: Option<NaiveDate>,
    /// Page number, starting at 1
    #[param(example = 1)]
    pub page: Option<u32>,
    /// Items per page
    #[param(example = 10)]
    pub limit: Option<u32>,
}

impl ListQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    fn window(&self) -> Option<TimeWindow> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(TimeWindow::days(start, end)),
            _ => None,
        }
    }
}

/// Check-in, check-out, listing and administrative edits of attendance records.
pub struct AttendanceService<S, D, C> {
    store: S,
    employees: D,
    clock: C,
    schedule: WorkSchedule,
}

impl<S, D, C> AttendanceService<S, D, C>
where
    S: AttendanceStore,
    D: EmployeeDirectory,
    C: Clock,
{
    pub fn new(store: S, employees: D, clock: C, schedule: WorkSchedule) -> Self {
        Self {
            store,
            employees,
            clock,
            schedule,
        }
    }

    async fn require_employee(&self, employee_id: u64) -> Result<(), AttendanceError> {
        if self.employees.exists(employee_id).await? {
            Ok(())
        } else {
            warn!(employee_id, "Unknown employee");
            Err(AttendanceError::employee_not_found(employee_id))
        }
    }

    fn status_for_check_in(&self, check_in: chrono::NaiveDateTime) -> AttendanceStatus {
        if self.schedule.is_late(check_in) {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        }
    }

    #[instrument(skip(self))]
    pub async fn check_in(&self, employee_id: u64) -> Result<AttendanceRecord, AttendanceError> {
        self.require_employee(employee_id).await?;

        let today = TimeWindow::day(self.clock.today());
        if self
            .store
            .find_for_employee_in_window(employee_id, today)
            .await?
            .is_some()
        {
            warn!(employee_id, "Duplicate check-in");
            return Err(AttendanceError::invalid_state("already checked in today"));
        }

        let now = self.clock.now();
        let status = self.status_for_check_in(now);

        let record = self
            .store
            .insert(NewAttendance {
                employee_id,
                check_in_time: now,
                status,
            })
            .await
            .map_err(|e| match e {
                // Lost the race against a concurrent check-in
                StoreError::Duplicate(_) => {
                    warn!(employee_id, "Duplicate check-in rejected by store");
                    AttendanceError::invalid_state("already checked in today")
                }
                other => other.into(),
            })?;

        info!(employee_id, attendance_id = %record.id, status = %record.status, "Checked in");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn check_out(&self, employee_id: u64) -> Result<AttendanceRecord, AttendanceError> {
        self.require_employee(employee_id).await?;

        let today = TimeWindow::day(self.clock.today());
        let record = self
            .store
            .find_for_employee_in_window(employee_id, today)
            .await?
            .ok_or_else(|| {
                warn!(employee_id, "Check-out without check-in");
                AttendanceError::invalid_state("no check-in today")
            })?;

        if record.is_checked_out() {
            warn!(employee_id, attendance_id = %record.id, "Repeated check-out");
            return Err(AttendanceError::invalid_state("already checked out"));
        }

        let now = self.clock.now();
        if now <= record.check_in_time {
            return Err(AttendanceError::invalid_state(
                "check-out must be after check-in",
            ));
        }

        // Only an on-time arrival is demoted by leaving early
        let status = if record.status == AttendanceStatus::Present
            && self.schedule.is_early_departure(now)
        {
            AttendanceStatus::HalfDay
        } else {
            record.status
        };

        let checkout = Checkout {
            check_out_time: now,
            work_hours: hours_between(record.check_in_time, now),
            status,
        };
        let updated = self
            .store
            .complete_checkout(record.id, checkout)
            .await?
            .ok_or_else(|| AttendanceError::invalid_state("already checked out"))?;

        info!(
            employee_id,
            attendance_id = %updated.id,
            status = %updated.status,
            work_hours = checkout.work_hours,
            "Checked out"
        );
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn list_attendance(
        &self,
        employee_id: u64,
        query: &ListQuery,
    ) -> Result<AttendancePage, AttendanceError> {
        let page = query.page();
        let limit = query.limit();
        let skip = u64::from(page - 1) * u64::from(limit);

        let filter = AttendanceFilter {
            employee_id,
            window: query.window(),
        };
        let (data, total) = self
            .store
            .find_and_count(filter, skip, u64::from(limit))
            .await?;

        Ok(AttendancePage {
            data,
            meta: PageMeta {
                total,
                page,
                limit,
                total_pages: total.div_ceil(u64::from(limit)),
            },
        })
    }

    #[instrument(skip(self, patch))]
    pub async fn update_attendance(
        &self,
        id: Uuid,
        patch: AttendancePatch,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let existing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AttendanceError::NotFound {
                entity: "Attendance",
                id: id.to_string(),
            })?;

        let check_in = patch
            .check_in_time
            .as_deref()
            .map(|text| parse_field("checkInTime", text))
            .transpose()?;
        let check_out = patch
            .check_out_time
            .as_deref()
            .map(|text| parse_field("checkOutTime", text))
            .transpose()?;

        let mut merged = existing;
        if let Some(check_in) = check_in {
            merged.check_in_time = check_in;
        }
        if let Some(check_out) = check_out {
            merged.check_out_time = Some(check_out);
        }
        if let Some(note) = patch.note {
            merged.note = Some(note);
        }

        // An explicit status wins; otherwise a new check-in time re-derives it
        merged.status = match (patch.status, check_in) {
            (Some(status), _) => status,
            (None, Some(check_in)) => self.status_for_check_in(check_in),
            (None, None) => merged.status,
        };

        if check_in.is_some() || check_out.is_some() {
            if let Some(check_out) = merged.check_out_time {
                if check_out <= merged.check_in_time {
                    return Err(AttendanceError::InvalidInput(
                        "checkOutTime must be after checkInTime".into(),
                    ));
                }
                merged.work_hours = Some(hours_between(merged.check_in_time, check_out));
            }
        }

        let saved = self.store.save(&merged).await.map_err(|e| match e {
            StoreError::Duplicate(_) => AttendanceError::invalid_state(format!(
                "employee {} already has attendance on {}",
                merged.employee_id,
                merged.check_in_time.date()
            )),
            other => other.into(),
        })?;

        info!(attendance_id = %saved.id, status = %saved.status, "Attendance updated");
        Ok(saved)
    }

    pub async fn get_stats(&self, query: &StatsQuery) -> Result<StatsReport, AttendanceError> {
        attendance_stats(&self.store, &self.clock, query).await
    }
}

fn parse_field(field: &str, text: &str) -> Result<chrono::NaiveDateTime, AttendanceError> {
    parse_timestamp(text)
        .ok_or_else(|| AttendanceError::InvalidInput(format!("{field} '{text}' is not a timestamp")))
}
