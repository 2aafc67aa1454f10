//! Attendance statistics over a date range.
//!
//! All figures come from one bulk read of the window (plus the store's
//! per-day aggregate); nothing is held open across the computation.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, instrument};
use utoipa::IntoParams;

use super::calendar::{Clock, ClockReading, TimeWindow, mean_instant, round2};
use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, DailyWorkHours, StatsReport};
use crate::store::AttendanceStore;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// First day of the range (YYYY-MM-DD); today when omitted
    #[param(value_type = Option<String>, example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    /// Last day of the range (YYYY-MM-DD); today when omitted
    #[param(value_type = Option<String>, example = "2026-01-31")]
    pub end_date: Option<NaiveDate>,
    /// Restrict the report to one employee
    #[param(example = 1001)]
    pub employee_id: Option<u64>,
}

impl StatsQuery {
    /// Each missing endpoint falls back to today.
    pub fn window(&self, today: NaiveDate) -> TimeWindow {
        TimeWindow::days(
            self.start_date.unwrap_or(today),
            self.end_date.unwrap_or(today),
        )
    }
}

#[instrument(skip(store, clock))]
pub async fn attendance_stats<S, C>(
    store: &S,
    clock: &C,
    query: &StatsQuery,
) -> Result<StatsReport, AttendanceError>
where
    S: AttendanceStore,
    C: Clock,
{
    let window = query.window(clock.today());
    if window.is_empty() {
        return Ok(summarize(&[], Vec::new()));
    }
    let records = store.find_all_in_window(window, query.employee_id).await?;
    let daily = store.daily_work_hours(window, query.employee_id).await?;
    debug!(records = records.len(), days = daily.len(), "Computing attendance stats");

    Ok(summarize(&records, daily))
}

/// Builds the report from the window's records and its per-day aggregate.
pub fn summarize(
    records: &[AttendanceRecord],
    work_hours_stats: Vec<DailyWorkHours>,
) -> StatsReport {
    let count = |status: AttendanceStatus| {
        records.iter().filter(|r| r.status == status).count() as u64
    };

    let total_days = records.len() as u64;
    let total_work_hours: f64 = records.iter().filter_map(|r| r.work_hours).sum();
    let avg_work_hours = if total_days == 0 {
        0.0
    } else {
        round2(total_work_hours / total_days as f64)
    };

    let avg_check_in_time = mean_instant(records.iter().map(|r| r.check_in_time))
        .map(|t| ClockReading::from(t).to_string());
    let avg_check_out_time = mean_instant(records.iter().filter_map(|r| r.check_out_time))
        .map(|t| ClockReading::from(t).to_string());

    StatsReport {
        total_days,
        present_days: count(AttendanceStatus::Present),
        late_days: count(AttendanceStatus::Late),
        half_days: count(AttendanceStatus::HalfDay),
        absent_days: count(AttendanceStatus::Absent),
        total_work_hours: round2(total_work_hours),
        avg_work_hours,
        avg_check_in_time,
        avg_check_out_time,
        work_hours_stats,
    }
}
