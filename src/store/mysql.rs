use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{FromRow, MySqlPool};
use tracing::debug;
use uuid::Uuid;

use super::{AttendanceFilter, AttendanceStore, Checkout, EmployeeDirectory};
use crate::error::StoreError;
use crate::model::attendance::{
    AttendanceRecord, AttendanceStatus, DailyWorkHours, NewAttendance,
};
use crate::service::calendar::{TimeWindow, round2};
use crate::utils::employee_cache::EmployeeCache;

const RECORD_COLUMNS: &str = "id, employee_id, check_in_time, check_out_time, status, \
                              work_hours, note, created_at, updated_at";

#[derive(FromRow)]
struct AttendanceRow {
    id: String,
    employee_id: u64,
    check_in_time: NaiveDateTime,
    check_out_time: Option<NaiveDateTime>,
    status: String,
    work_hours: Option<f64>,
    note: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| StoreError::Corrupt(format!("id '{}': {}", row.id, e)))?;
        let status = AttendanceStatus::from_str(&row.status).map_err(|e: strum::ParseError| {
            StoreError::Corrupt(format!("status '{}' of {}: {}", row.status, id, e))
        })?;

        Ok(AttendanceRecord {
            id,
            employee_id: row.employee_id,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            status,
            work_hours: row.work_hours,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct DailyRow {
    date: NaiveDate,
    avg_work_hours: Option<f64>,
    max_work_hours: Option<f64>,
    min_work_hours: Option<f64>,
}

fn decode_all(rows: Vec<AttendanceRow>) -> Result<Vec<AttendanceRecord>, StoreError> {
    rows.into_iter().map(AttendanceRecord::try_from).collect()
}

/// `attendance` table access. The `uq_attendance_employee_day` unique key on
/// `(employee_id, work_date)` is what enforces one record per day.
#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl AttendanceStore for MySqlAttendanceStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM attendance WHERE id = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn find_for_employee_in_window(
        &self,
        employee_id: u64,
        window: TimeWindow,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance \
             WHERE employee_id = ? AND check_in_time >= ? AND check_in_time < ? \
             LIMIT 1"
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn find_and_count(
        &self,
        filter: AttendanceFilter,
        skip: u64,
        take: u64,
    ) -> Result<(Vec<AttendanceRecord>, u64), StoreError> {
        let where_clause = if filter.window.is_some() {
            "WHERE employee_id = ? AND check_in_time >= ? AND check_in_time < ?"
        } else {
            "WHERE employee_id = ?"
        };

        // ---------- total count ----------
        let count_sql = format!("SELECT COUNT(*) FROM attendance {where_clause}");
        debug!(sql = %count_sql, employee_id = filter.employee_id, "Counting attendance");

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(filter.employee_id);
        if let Some(window) = filter.window {
            count_query = count_query.bind(window.start).bind(window.end);
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        // ---------- data query ----------
        let data_sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance {where_clause} \
             ORDER BY check_in_time DESC LIMIT ? OFFSET ?"
        );
        debug!(sql = %data_sql, skip, take, "Fetching attendance page");

        let mut data_query = sqlx::query_as::<_, AttendanceRow>(&data_sql).bind(filter.employee_id);
        if let Some(window) = filter.window {
            data_query = data_query.bind(window.start).bind(window.end);
        }
        let rows = data_query
            .bind(take)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        Ok((decode_all(rows)?, total.max(0) as u64))
    }

    async fn find_all_in_window(
        &self,
        window: TimeWindow,
        employee_id: Option<u64>,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = match employee_id {
            Some(employee_id) => {
                let sql = format!(
                    "SELECT {RECORD_COLUMNS} FROM attendance \
                     WHERE check_in_time >= ? AND check_in_time < ? AND employee_id = ?"
                );
                sqlx::query_as::<_, AttendanceRow>(&sql)
                    .bind(window.start)
                    .bind(window.end)
                    .bind(employee_id)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = format!(
                    "SELECT {RECORD_COLUMNS} FROM attendance \
                     WHERE check_in_time >= ? AND check_in_time < ?"
                );
                sqlx::query_as::<_, AttendanceRow>(&sql)
                    .bind(window.start)
                    .bind(window.end)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(StoreError::from_sqlx)?;

        decode_all(rows)
    }

    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO attendance (id, employee_id, check_in_time, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(record.employee_id)
        .bind(record.check_in_time)
        .bind(record.status.as_ref())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("attendance {id} missing after insert")))
    }

    async fn complete_checkout(
        &self,
        id: Uuid,
        checkout: Checkout,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out_time = ?, work_hours = ?, status = ?
            WHERE id = ?
            AND check_out_time IS NULL
            "#,
        )
        .bind(checkout.check_out_time)
        .bind(checkout.work_hours)
        .bind(checkout.status.as_ref())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn save(&self, record: &AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        sqlx::query(
            r#"
            UPDATE attendance
            SET check_in_time = ?, check_out_time = ?, status = ?, work_hours = ?, note = ?
            WHERE id = ?
            "#,
        )
        .bind(record.check_in_time)
        .bind(record.check_out_time)
        .bind(record.status.as_ref())
        .bind(record.work_hours)
        .bind(record.note.as_deref())
        .bind(record.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        self.find_by_id(record.id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("attendance {} vanished", record.id)))
    }

    async fn daily_work_hours(
        &self,
        window: TimeWindow,
        employee_id: Option<u64>,
    ) -> Result<Vec<DailyWorkHours>, StoreError> {
        let employee_clause = if employee_id.is_some() {
            "AND employee_id = ?"
        } else {
            ""
        };
        let sql = format!(
            "SELECT DATE(check_in_time) AS date, \
                    AVG(work_hours) AS avg_work_hours, \
                    MAX(work_hours) AS max_work_hours, \
                    MIN(work_hours) AS min_work_hours \
             FROM attendance \
             WHERE check_in_time >= ? AND check_in_time < ? \
             AND check_out_time IS NOT NULL {employee_clause} \
             GROUP BY DATE(check_in_time) \
             ORDER BY date ASC"
        );

        let mut query = sqlx::query_as::<_, DailyRow>(&sql)
            .bind(window.start)
            .bind(window.end);
        if let Some(employee_id) = employee_id {
            query = query.bind(employee_id);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        Ok(rows
            .into_iter()
            .map(|row| DailyWorkHours {
                date: row.date,
                avg_work_hours: round2(row.avg_work_hours.unwrap_or_default()),
                max_work_hours: row.max_work_hours.unwrap_or_default(),
                min_work_hours: row.min_work_hours.unwrap_or_default(),
            })
            .collect())
    }
}

const EMPLOYEE_EXISTS: &str =
    "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? AND status = 'active' LIMIT 1)";

/// Looks employees up in the HR `employees` table, remembering ids already seen.
#[derive(Clone)]
pub struct MySqlEmployeeDirectory {
    pool: MySqlPool,
    cache: EmployeeCache,
}

impl MySqlEmployeeDirectory {
    pub fn new(pool: MySqlPool, cache: EmployeeCache) -> Self {
        Self { pool, cache }
    }
}

impl EmployeeDirectory for MySqlEmployeeDirectory {
    async fn exists(&self, employee_id: u64) -> Result<bool, StoreError> {
        // 1️⃣ Moka cache, fast positive
        if self.cache.is_known(employee_id).await {
            return Ok(true);
        }

        // 2️⃣ Database fallback
        let exists = sqlx::query_scalar::<_, i64>(EMPLOYEE_EXISTS)
            .bind(employee_id)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?
            != 0;

        if exists {
            self.cache.mark_known(employee_id).await;
        }
        Ok(exists)
    }
}
