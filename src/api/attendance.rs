use crate::auth::auth::AuthUser;
use crate::model::attendance::{AttendancePage, AttendancePatch, AttendanceRecord, StatsReport};
use crate::service::calendar::SystemClock;
use crate::service::engine::{AttendanceService, ListQuery};
use crate::service::stats::StatsQuery;
use crate::store::mysql::{MySqlAttendanceStore, MySqlEmployeeDirectory};
use actix_web::{HttpResponse, Responder, web};
use uuid::Uuid;

pub type AppAttendanceService =
    AttendanceService<MySqlAttendanceStore, MySqlEmployeeDirectory, SystemClock>;

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    responses(
        (status = 200, description = "Checked in", body = AttendanceRecord),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    service: web::Data<AppAttendanceService>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_id()?;

    let record = service.check_in(employee_id).await?;

    Ok(HttpResponse::Ok().json(record))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-out",
    responses(
        (status = 200, description = "Checked out", body = AttendanceRecord),
        (status = 400, description = "No check-in today, or already checked out", body = Object, example = json!({
            "message": "no check-in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    service: web::Data<AppAttendanceService>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_id()?;

    let record = service.check_out(employee_id).await?;

    Ok(HttpResponse::Ok().json(record))
}

/// Caller's own attendance history
#[utoipa::path(
    get,
    path = "/api/v1/attendance/me",
    params(ListQuery),
    responses(
        (status = 200, description = "Paginated attendance, most recent first", body = AttendancePage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    service: web::Data<AppAttendanceService>,
    query: web::Query<ListQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee_id()?;

    let page = service.list_attendance(employee_id, &query).await?;

    Ok(HttpResponse::Ok().json(page))
}

/// Attendance history of any employee (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/attendance/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Paginated attendance, most recent first", body = AttendancePage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn employee_attendance(
    auth: AuthUser,
    service: web::Data<AppAttendanceService>,
    path: web::Path<u64>,
    query: web::Query<ListQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let page = service.list_attendance(path.into_inner(), &query).await?;

    Ok(HttpResponse::Ok().json(page))
}

/// Attendance statistics (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/v1/attendance/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Summary over the date range", body = StatsReport),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_stats(
    auth: AuthUser,
    service: web::Data<AppAttendanceService>,
    query: web::Query<StatsQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let report = service.get_stats(&query).await?;

    Ok(HttpResponse::Ok().json(report))
}

/// Correct an attendance record (Admin)
#[utoipa::path(
    patch,
    path = "/api/v1/attendance/{attendance_id}",
    request_body = AttendancePatch,
    params(
        ("attendance_id", Path, description = "Attendance record ID")
    ),
    responses(
        (status = 200, description = "Updated record", body = AttendanceRecord),
        (status = 400, description = "Employee already has attendance on that day"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Attendance record not found"),
        (status = 422, description = "Unparseable time, or check-out not after check-in")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn update_attendance(
    auth: AuthUser,
    service: web::Data<AppAttendanceService>,
    path: web::Path<Uuid>,
    body: web::Json<AttendancePatch>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let attendance_id = path.into_inner();
    tracing::info!(user_id = auth.user_id, user = %auth.username, %attendance_id, "Administrative attendance edit");

    let record = service
        .update_attendance(attendance_id, body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(record))
}
