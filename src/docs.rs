use crate::model::attendance::{
    AttendancePage, AttendancePatch, AttendanceRecord, AttendanceStatus, DailyWorkHours,
    PageMeta, StatsReport,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance tracking

Daily check-in and check-out for employees of the HRM system, with
attendance status derived from the configured work hours.

### 🔹 Key Features
- **Check-in / check-out**
  - One record per employee per calendar day
  - `LATE` after the work-start boundary, `HALF_DAY` when an on-time employee leaves before work end
- **History**
  - Own history for employees, any employee's history for HR/Admin
- **Statistics**
  - Status counts, work hours, average check-in/out time and a per-day breakdown
- **Corrections**
  - Admin edits of times, status and note

### 🔐 Security
Every endpoint requires a **JWT Bearer** access token issued by the HRM identity service.

### 📦 Response Format
- JSON with camelCase keys
- Lists are paginated with `page` / `limit`
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::my_attendance,
        crate::api::attendance::employee_attendance,
        crate::api::attendance::attendance_stats,
        crate::api::attendance::update_attendance
    ),
    components(
        schemas(
            AttendanceRecord,
            AttendanceStatus,
            AttendancePatch,
            AttendancePage,
            PageMeta,
            StatsReport,
            DailyWorkHours
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Attendance", description = "Attendance management APIs"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
