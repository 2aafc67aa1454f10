use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use chrono::NaiveDate;
use uuid::Uuid;

use super::{AttendanceFilter, AttendanceStore, Checkout, EmployeeDirectory};
use crate::error::StoreError;
use crate::model::attendance::{AttendanceRecord, DailyWorkHours, NewAttendance};
use crate::service::calendar::{TimeWindow, round2};

/// Vec-backed store; every operation runs under one lock, so the
/// per-day uniqueness check and the insert are atomic.
#[derive(Debug, Default)]
pub struct InMemoryAttendanceStore {
    records: Mutex<Vec<AttendanceRecord>>,
}

impl InMemoryAttendanceStore {
    pub fn with_records(records: Vec<AttendanceRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn select(
        &self,
        window: TimeWindow,
        employee_id: Option<u64>,
    ) -> Vec<AttendanceRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| window.contains(r.check_in_time))
            .filter(|r| employee_id.is_none_or(|id| r.employee_id == id))
            .cloned()
            .collect()
    }
}

fn duplicate_day(records: &[AttendanceRecord], candidate: &AttendanceRecord) -> bool {
    records.iter().any(|r| {
        r.id != candidate.id
            && r.employee_id == candidate.employee_id
            && r.check_in_time.date() == candidate.check_in_time.date()
    })
}

impl AttendanceStore for InMemoryAttendanceStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AttendanceRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn find_for_employee_in_window(
        &self,
        employee_id: u64,
        window: TimeWindow,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self.select(window, Some(employee_id)).into_iter().next())
    }

    async fn find_and_count(
        &self,
        filter: AttendanceFilter,
        skip: u64,
        take: u64,
    ) -> Result<(Vec<AttendanceRecord>, u64), StoreError> {
        let mut matching: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.employee_id == filter.employee_id)
            .filter(|r| filter.window.is_none_or(|w| w.contains(r.check_in_time)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.check_in_time.cmp(&a.check_in_time));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(skip as usize)
            .take(take as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_all_in_window(
        &self,
        window: TimeWindow,
        employee_id: Option<u64>,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.select(window, employee_id))
    }

    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let mut records = self.records.lock().unwrap();
        let created = AttendanceRecord {
            id: Uuid::new_v4(),
            employee_id: record.employee_id,
            check_in_time: record.check_in_time,
            check_out_time: None,
            status: record.status,
            work_hours: None,
            note: None,
            created_at: record.check_in_time,
            updated_at: record.check_in_time,
        };
        if duplicate_day(&records, &created) {
            return Err(StoreError::Duplicate(format!(
                "employee {} on {}",
                created.employee_id,
                created.check_in_time.date()
            )));
        }
        records.push(created.clone());
        Ok(created)
    }

    async fn complete_checkout(
        &self,
        id: Uuid,
        checkout: Checkout,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let mut records = self.records.lock().unwrap();
        let Some(record) = records
            .iter_mut()
            .find(|r| r.id == id && r.check_out_time.is_none())
        else {
            return Ok(None);
        };
        record.check_out_time = Some(checkout.check_out_time);
        record.work_hours = Some(checkout.work_hours);
        record.status = checkout.status;
        record.updated_at = checkout.check_out_time;
        Ok(Some(record.clone()))
    }

    async fn save(&self, record: &AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        let mut records = self.records.lock().unwrap();
        if duplicate_day(&records, record) {
            return Err(StoreError::Duplicate(format!(
                "employee {} on {}",
                record.employee_id,
                record.check_in_time.date()
            )));
        }
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| StoreError::Corrupt(format!("attendance {} vanished", record.id)))?;
        *slot = record.clone();
        Ok(record.clone())
    }

    async fn daily_work_hours(
        &self,
        window: TimeWindow,
        employee_id: Option<u64>,
    ) -> Result<Vec<DailyWorkHours>, StoreError> {
        Ok(group_daily_work_hours(&self.select(window, employee_id)))
    }
}

/// Groups checked-out records by check-in date, ascending.
pub fn group_daily_work_hours(records: &[AttendanceRecord]) -> Vec<DailyWorkHours> {
    let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_checked_out()) {
        by_date
            .entry(record.check_in_time.date())
            .or_default()
            .push(record.work_hours.unwrap_or_default());
    }

    by_date
        .into_iter()
        .map(|(date, hours)| {
            let sum: f64 = hours.iter().sum();
            DailyWorkHours {
                date,
                avg_work_hours: round2(sum / hours.len() as f64),
                max_work_hours: hours.iter().copied().fold(f64::MIN, f64::max),
                min_work_hours: hours.iter().copied().fold(f64::MAX, f64::min),
            }
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct InMemoryEmployeeDirectory {
    ids: HashSet<u64>,
}

impl InMemoryEmployeeDirectory {
    pub fn with_employees(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }
}

impl EmployeeDirectory for InMemoryEmployeeDirectory {
    async fn exists(&self, employee_id: u64) -> Result<bool, StoreError> {
        Ok(self.ids.contains(&employee_id))
    }
}
