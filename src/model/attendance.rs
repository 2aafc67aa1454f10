use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

/// Attendance status of a single day.
///
/// Stored and serialized in SCREAMING_SNAKE_CASE (`PRESENT`, `HALF_DAY`, ...).
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Late,
    Absent,
    HalfDay,
}

/// One employee's attendance for one local calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "0b7a3c9e-5a51-4c57-9a44-1f1f2d3c8e10",
    "employeeId": 1001,
    "checkInTime": "2026-01-05T08:50:00",
    "checkOutTime": "2026-01-05T17:30:00",
    "status": "HALF_DAY",
    "workHours": 8.67,
    "note": null,
    "createdAt": "2026-01-05T08:50:00",
    "updatedAt": "2026-01-05T17:30:00"
}))]
pub struct AttendanceRecord {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date-time")]
    pub check_in_time: NaiveDateTime,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out_time: Option<NaiveDateTime>,
    pub status: AttendanceStatus,
    pub work_hours: Option<f64>,
    pub note: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

impl AttendanceRecord {
    pub fn is_checked_out(&self) -> bool {
        self.check_out_time.is_some()
    }
}

/// Fields supplied by check-in; the store assigns id and audit timestamps.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub check_in_time: NaiveDateTime,
    pub status: AttendanceStatus,
}

/// Partial administrative edit. Omitted fields are left unchanged.
///
/// Times arrive as text and are parsed by the engine.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePatch {
    #[schema(example = "2026-01-05T08:45:00")]
    pub check_in_time: Option<String>,
    #[schema(example = "2026-01-05T18:10:00")]
    pub check_out_time: Option<String>,
    pub status: Option<AttendanceStatus>,
    #[schema(example = "Badge reader offline")]
    pub note: Option<String>,
}

/// Aggregated work hours of the completed records of one date.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyWorkHours {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub avg_work_hours: f64,
    pub max_work_hours: f64,
    pub min_work_hours: f64,
}

/// Summary over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "totalDays": 3,
    "presentDays": 1,
    "lateDays": 1,
    "halfDays": 1,
    "absentDays": 0,
    "totalWorkHours": 26.42,
    "avgWorkHours": 8.81,
    "avgCheckInTime": "9:02",
    "avgCheckOutTime": "18:10",
    "workHoursStats": [
        { "date": "2026-01-05", "avgWorkHours": 8.81, "maxWorkHours": 9.75, "minWorkHours": 8.0 }
    ]
}))]
pub struct StatsReport {
    pub total_days: u64,
    pub present_days: u64,
    pub late_days: u64,
    pub half_days: u64,
    pub absent_days: u64,
    pub total_work_hours: f64,
    pub avg_work_hours: f64,
    pub avg_check_in_time: Option<String>,
    pub avg_check_out_time: Option<String>,
    pub work_hours_stats: Vec<DailyWorkHours>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendancePage {
    pub data: Vec<AttendanceRecord>,
    pub meta: PageMeta,
}
