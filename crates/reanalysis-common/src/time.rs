//! Time handling utilities for reanalysis archives.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, ExtractResult};

/// Time format accepted on the command line.
pub const CLI_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Parse a timestamp given as `YYYY-MM-DDTHH:MM`, or any ISO 8601 variant
/// (RFC 3339, with seconds, or a bare date). Times without zone are UTC.
pub fn parse_time(s: &str) -> ExtractResult<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in [CLI_TIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(ExtractError::InvalidTime(format!(
        "'{}' (expected YYYY-MM-DDTHH:MM)",
        s
    )))
}

/// Truncate a timestamp to the whole hour.
pub fn floor_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    t - Duration::minutes(t.minute() as i64)
        - Duration::seconds(t.second() as i64)
        - Duration::nanoseconds(t.nanosecond() as i64)
}

/// A closed time interval `[start, end]` on whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Create a validated hourly range: `start <= end`, both on whole hours.
    pub fn hourly(start: DateTime<Utc>, end: DateTime<Utc>) -> ExtractResult<Self> {
        if end < start {
            return Err(ExtractError::InvalidTime(format!(
                "end time {} is before start time {}",
                end, start
            )));
        }
        for t in [start, end] {
            if floor_hour(t) != t {
                return Err(ExtractError::InvalidTime(format!(
                    "{} is not on a whole hour",
                    t
                )));
            }
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start && dt <= &self.end
    }

    /// Number of hourly samples in the closed interval.
    pub fn hour_count(&self) -> usize {
        ((self.end - self.start).num_hours() + 1).max(0) as usize
    }

    /// All timestamps in the interval, `step_hours` apart, starting at `start`.
    pub fn steps(&self, step_hours: i64) -> Vec<DateTime<Utc>> {
        let mut times = Vec::new();
        let mut current = self.start;
        while current <= self.end {
            times.push(current);
            current += Duration::hours(step_hours);
        }
        times
    }

    /// All hourly timestamps in the interval.
    pub fn hours(&self) -> Vec<DateTime<Utc>> {
        self.steps(1)
    }

    /// Widen the interval outward to multiples of `step_hours` (hour of day):
    /// the start is floored and the end is ceiled.
    pub fn expand_to_step(&self, step_hours: u32) -> Self {
        let start_rem = self.start.hour() % step_hours;
        let end_rem = (step_hours - self.end.hour() % step_hours) % step_hours;
        Self {
            start: self.start - Duration::hours(start_rem as i64),
            end: self.end + Duration::hours(end_rem as i64),
        }
    }

    /// Split into consecutive strides of `days` days. The last stride is
    /// clipped to `end`; strides never overlap and leave no gaps. A `days`
    /// below one is treated as one.
    pub fn strides(&self, days: i64) -> Vec<TimeRange> {
        let length = Duration::days(days.max(1));
        let mut strides = Vec::new();
        let mut stride_start = self.start;
        while stride_start <= self.end {
            let stride_end = (stride_start + length - Duration::hours(1)).min(self.end);
            strides.push(TimeRange::new(stride_start, stride_end));
            stride_start = stride_end + Duration::hours(1);
        }
        strides
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.format("%Y%m%d-%H%M"),
            self.end.format("%Y%m%d-%H%M")
        )
    }
}

/// Start hour of a regional forecast cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelCycle {
    /// 00Z run
    Z00,
    /// 06Z run
    Z06,
    /// 12Z run
    Z12,
    /// 18Z run
    Z18,
}

impl ModelCycle {
    pub fn from_hour(hour: u32) -> Option<Self> {
        match hour {
            0 => Some(ModelCycle::Z00),
            6 => Some(ModelCycle::Z06),
            12 => Some(ModelCycle::Z12),
            18 => Some(ModelCycle::Z18),
            _ => None,
        }
    }

    /// The latest cycle starting at or before `hour` of the same day.
    pub fn containing_hour(hour: u32) -> Self {
        match hour {
            h if h < 6 => ModelCycle::Z00,
            h if h < 12 => ModelCycle::Z06,
            h if h < 18 => ModelCycle::Z12,
            _ => ModelCycle::Z18,
        }
    }

    pub fn hour(&self) -> u32 {
        match self {
            ModelCycle::Z00 => 0,
            ModelCycle::Z06 => 6,
            ModelCycle::Z12 => 12,
            ModelCycle::Z18 => 18,
        }
    }
}

/// One model run: a calendar date plus a cycle start hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ForecastCycle {
    pub date: NaiveDate,
    pub cycle: ModelCycle,
}

impl ForecastCycle {
    pub fn new(date: NaiveDate, cycle: ModelCycle) -> Self {
        Self { date, cycle }
    }

    /// The cycle whose start is the latest cycle hour at or before `t`.
    pub fn containing(t: DateTime<Utc>) -> Self {
        Self {
            date: t.date_naive(),
            cycle: ModelCycle::containing_hour(t.hour()),
        }
    }

    /// Cycle start time.
    pub fn start(&self) -> DateTime<Utc> {
        let midnight = self.date.and_hms_opt(0, 0, 0).unwrap_or_default();
        Utc.from_utc_datetime(&midnight) + Duration::hours(self.cycle.hour() as i64)
    }

    /// Valid time of the file with forecast-hour `index` in this cycle.
    pub fn valid_time(&self, index: u32) -> DateTime<Utc> {
        self.start() + Duration::hours(index as i64)
    }

    /// The following cycle (six hours later).
    pub fn next(&self) -> Self {
        Self::containing(self.start() + Duration::hours(6))
    }

    /// The preceding cycle (six hours earlier).
    pub fn previous(&self) -> Self {
        Self::containing(self.start() - Duration::hours(6))
    }

    /// Directory fragment `YYYY/MM/DD/HH` for this cycle.
    pub fn storage_path(&self) -> String {
        format!("{}/{:02}", self.date.format("%Y/%m/%d"), self.cycle.hour())
    }

    /// File name stem `fcYYYYMMDDHH` for this cycle.
    pub fn file_stem(&self) -> String {
        format!("fc{}{:02}", self.date.format("%Y%m%d"), self.cycle.hour())
    }
}

impl std::fmt::Display for ForecastCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}T{:02}Z", self.date, self.cycle.hour())
    }
}
