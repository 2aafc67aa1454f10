//! Persistence contracts the attendance engine depends on.
//!
//! Implementations must make `insert` atomic with respect to the
//! one-record-per-employee-per-day rule and must apply `complete_checkout`
//! only while the record is still open.

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::attendance::{
    AttendanceRecord, AttendanceStatus, DailyWorkHours, NewAttendance,
};
use crate::service::calendar::TimeWindow;

#[cfg(test)]
pub mod memory;
pub mod mysql;

/// Filter for paginated listing.
#[derive(Debug, Clone, Copy)]
pub struct AttendanceFilter {
    pub employee_id: u64,
    pub window: Option<TimeWindow>,
}

/// Values written by a successful check-out.
#[derive(Debug, Clone, Copy)]
pub struct Checkout {
    pub check_out_time: NaiveDateTime,
    pub work_hours: f64,
    pub status: AttendanceStatus,
}

#[allow(async_fn_in_trait)]
pub trait AttendanceStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AttendanceRecord>, StoreError>;

    async fn find_for_employee_in_window(
        &self,
        employee_id: u64,
        window: TimeWindow,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// One page ordered by check-in time, most recent first, plus the total match count.
    async fn find_and_count(
        &self,
        filter: AttendanceFilter,
        skip: u64,
        take: u64,
    ) -> Result<(Vec<AttendanceRecord>, u64), StoreError>;

    async fn find_all_in_window(
        &self,
        window: TimeWindow,
        employee_id: Option<u64>,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] if the employee already has a record that day.
    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError>;

    /// Returns `None` when the record was already checked out.
    async fn complete_checkout(
        &self,
        id: Uuid,
        checkout: Checkout,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Overwrites every mutable field of an existing record.
    async fn save(&self, record: &AttendanceRecord) -> Result<AttendanceRecord, StoreError>;

    /// Work-hour aggregates of checked-out records, grouped by check-in date, ascending.
    async fn daily_work_hours(
        &self,
        window: TimeWindow,
        employee_id: Option<u64>,
    ) -> Result<Vec<DailyWorkHours>, StoreError>;
}

/// Existence check against the externally owned employee records.
#[allow(async_fn_in_trait)]
pub trait EmployeeDirectory {
    async fn exists(&self, employee_id: u64) -> Result<bool, StoreError>;
}
