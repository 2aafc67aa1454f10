use chrono::{
    DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, Timelike,
};
use derive_more::Display;

/// Source of "now" in local wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Reads the host clock, truncated to the millisecond precision of `DATETIME(3)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local().trunc_subsecs(3)
    }
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Exclusive end of `date`: local midnight of the following day.
///
/// Saturates to `NaiveDateTime::MAX` on the last representable date.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.succ_opt()
        .map(start_of_day)
        .unwrap_or(NaiveDateTime::MAX)
}

/// Half-open interval `[start, end)` of local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// The calendar day window of `date`.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: start_of_day(date),
            end: end_of_day(date),
        }
    }

    /// Every instant from the start of `first` through the last millisecond of `last`.
    ///
    /// An inverted range yields an empty window.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        let start = start_of_day(first);
        Self {
            start,
            end: end_of_day(last).max(start),
        }
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Configured work-hour boundaries, identical for every employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkSchedule {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkSchedule {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, String> {
        if start >= end {
            return Err(format!(
                "work start {} must be earlier than work end {}",
                start.format("%H:%M"),
                end.format("%H:%M")
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.start)
    }

    pub fn end_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.end)
    }

    /// Arrival strictly after the day's work start is late.
    pub fn is_late(&self, check_in: NaiveDateTime) -> bool {
        check_in > self.start_on(check_in.date())
    }

    /// Departure strictly before the day's work end is early.
    pub fn is_early_departure(&self, check_out: NaiveDateTime) -> bool {
        check_out < self.end_on(check_out.date())
    }
}

impl Default for WorkSchedule {
    fn default() -> Self {
        Self {
            start: NaiveTime::MIN + Duration::hours(9),
            end: NaiveTime::MIN + Duration::hours(18),
        }
    }
}

/// Parses an `HH:MM` boundary such as `09:00`.
pub fn parse_clock_time(text: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M")
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an administrative timestamp into local wall-clock time.
///
/// RFC 3339 values carrying an offset are converted to the local zone;
/// offset-less values are taken as local already.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Elapsed hours between two instants, rounded to 2 decimals.
pub fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    round2((to - from).num_milliseconds() as f64 / 3_600_000.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Time-of-day reported by the statistics, e.g. `9:05`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(fmt = "{}:{:02}", hour, minute)]
pub struct ClockReading {
    pub hour: u32,
    pub minute: u32,
}

impl From<NaiveDateTime> for ClockReading {
    fn from(instant: NaiveDateTime) -> Self {
        Self {
            hour: instant.hour(),
            minute: instant.minute(),
        }
    }
}

/// Arithmetic mean of a set of instants; `None` for an empty set.
pub fn mean_instant<I>(instants: I) -> Option<NaiveDateTime>
where
    I: IntoIterator<Item = NaiveDateTime>,
{
    let (sum, count) = instants
        .into_iter()
        .fold((0i128, 0i128), |(sum, count), t| {
            (sum + t.and_utc().timestamp_millis() as i128, count + 1)
        });
    if count == 0 {
        return None;
    }
    let millis = i64::try_from(sum / count).ok()?;
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

#[cfg(test)]
pub mod testing {
    use super::Clock;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use std::cell::Cell;

    /// A clock the test moves by hand.
    #[derive(Debug)]
    pub struct ManualClock(Cell<NaiveDateTime>);

    impl ManualClock {
        pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Self {
            Self(Cell::new(at(date, hour, minute)))
        }

        pub fn set(&self, date: NaiveDate, hour: u32, minute: u32) {
            self.0.set(at(date, hour, minute));
        }

        pub fn advance(&self, by: Duration) {
            self.0.set(self.0.get() + by);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> NaiveDateTime {
            self.0.get()
        }
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
        date.and_hms_opt(hour, minute, 0).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{at, date};
    use super::*;

    #[test]
    fn day_window_is_half_open() {
        let day = date(2026, 3, 9);
        let window = TimeWindow::day(day);

        assert!(window.contains(start_of_day(day)));
        assert!(window.contains(at(day, 23, 59)));
        assert!(!window.contains(end_of_day(day)));
        assert_eq!(end_of_day(day), start_of_day(date(2026, 3, 10)));
    }

    #[test]
    fn multi_day_window_covers_last_day_and_inverted_is_empty() {
        let window = TimeWindow::days(date(2026, 3, 1), date(2026, 3, 3));
        assert!(window.contains(
            date(2026, 3, 3).and_hms_milli_opt(23, 59, 59, 999).unwrap()
        ));
        assert!(!window.contains(start_of_day(date(2026, 3, 4))));

        let inverted = TimeWindow::days(date(2026, 3, 3), date(2026, 3, 1));
        assert!(inverted.is_empty());
        assert!(!inverted.contains(at(date(2026, 3, 2), 10, 0)));
    }

    #[test]
    fn last_representable_day_saturates() {
        assert_eq!(end_of_day(NaiveDate::MAX), NaiveDateTime::MAX);

        let window = TimeWindow::days(date(2026, 1, 1), NaiveDate::MAX);
        assert!(!window.is_empty());
        assert!(window.contains(at(date(2026, 6, 1), 9, 0)));
        assert!(!window.contains(at(date(2025, 12, 31), 9, 0)));
    }

    #[test]
    fn schedule_boundaries_are_strict() {
        let schedule = WorkSchedule::default();
        let day = date(2026, 3, 9);

        assert!(!schedule.is_late(at(day, 9, 0)));
        assert!(schedule.is_late(at(day, 9, 0) + Duration::seconds(1)));
        assert!(!schedule.is_early_departure(at(day, 18, 0)));
        assert!(schedule.is_early_departure(at(day, 17, 59)));
    }

    #[test]
    fn schedule_rejects_inverted_boundaries() {
        let nine = parse_clock_time("09:00").unwrap();
        let six = parse_clock_time("18:00").unwrap();

        assert!(WorkSchedule::new(nine, six).is_ok());
        assert!(WorkSchedule::new(six, nine).is_err());
        assert!(WorkSchedule::new(nine, nine).is_err());
        assert!(parse_clock_time("9am").is_err());
    }

    #[test]
    fn parses_admin_timestamps() {
        let expected = at(date(2026, 1, 5), 8, 45);

        assert_eq!(parse_timestamp("2026-01-05T08:45:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-01-05 08:45:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2026-01-05T08:45:00.250"),
            Some(expected + Duration::milliseconds(250))
        );
        assert!(parse_timestamp("2026-01-05T08:45:00+09:00").is_some());
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn work_hours_round_to_two_places() {
        let day = date(2026, 1, 5);
        assert_eq!(hours_between(at(day, 8, 50), at(day, 17, 30)), 8.67);
        assert_eq!(hours_between(at(day, 9, 15), at(day, 19, 0)), 9.75);
        assert_eq!(round2(0.005), 0.01);
    }

    #[test]
    fn clock_reading_pads_minutes_only() {
        let reading = ClockReading::from(at(date(2026, 1, 5), 9, 5));
        assert_eq!(reading.to_string(), "9:05");
        assert_eq!(ClockReading { hour: 18, minute: 30 }.to_string(), "18:30");
    }

    #[test]
    fn mean_of_instants() {
        let day = date(2026, 1, 5);
        assert_eq!(mean_instant(Vec::new()), None);
        assert_eq!(
            mean_instant([at(day, 8, 0), at(day, 10, 0)]),
            Some(at(day, 9, 0))
        );
    }
}
