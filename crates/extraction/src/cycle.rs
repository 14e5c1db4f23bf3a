//! Mapping valid times onto regional forecast-cycle files.
//!
//! Every regional cycle writes one file per forecast hour. The first
//! [`SPINUP_HOURS`] files of a cycle are model spinup, so an hourly series is
//! stitched together from forecast hours 4..=9 of consecutive cycles.
//!
//! Everything here is a pure function of the timestamp; paths are composed
//! by [`crate::layout::ArchiveLayout`].

use chrono::{DateTime, Duration, Timelike, Utc};
use reanalysis_common::{ForecastCycle, ModelCycle, TimeRange, Variable};

use crate::deaccumulate::is_boundary_hour;

/// Forecast hours at the start of each cycle that are not used directly.
pub const SPINUP_HOURS: u32 = 4;

/// Hours between stored surface-exchange samples.
pub const SURFACE_EXCHANGE_STEP_HOURS: u32 = 3;

/// Which file family of a cycle holds the variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileStream {
    /// Hourly full-physics files (`_fp.nc`).
    Primary,
    /// Surface-scheme output (`_full_sfx.nc`).
    SurfaceExchange,
}

impl FileStream {
    pub fn suffix(&self) -> &'static str {
        match self {
            FileStream::Primary => "fp",
            FileStream::SurfaceExchange => "full_sfx",
        }
    }
}

/// One file of a forecast cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CycleFile {
    pub cycle: ForecastCycle,
    /// Forecast hour within the cycle.
    pub index: u32,
    pub stream: FileStream,
}

impl CycleFile {
    pub fn new(cycle: ForecastCycle, index: u32, stream: FileStream) -> Self {
        Self {
            cycle,
            index,
            stream,
        }
    }

    /// Time of the sample stored in this file.
    pub fn valid_time(&self) -> DateTime<Utc> {
        self.cycle.valid_time(self.index)
    }

    /// `fcYYYYMMDDHH_NNN_fp.nc` or `fcYYYYMMDDHH_NNN_full_sfx.nc`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{:03}_{}.nc",
            self.cycle.file_stem(),
            self.index,
            self.stream.suffix()
        )
    }

    /// Path relative to the archive root: `YYYY/MM/DD/HH/<file_name>`.
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.cycle.storage_path(), self.file_name())
    }

    /// The spinup file of the same cycle that seeds de-accumulation of this
    /// file, if this is the first usable hour of its cycle.
    pub fn spinup(&self) -> Option<CycleFile> {
        (self.stream == FileStream::Primary && self.index == SPINUP_HOURS)
            .then(|| CycleFile::new(self.cycle, SPINUP_HOURS - 1, self.stream))
    }
}

impl std::fmt::Display for CycleFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.relative_path())
    }
}

/// Locate the file holding the sample valid at `t`.
///
/// Primary files come from the cycle started at least [`SPINUP_HOURS`] before
/// `t`, so the index is always in `4..=9`. Surface-exchange files come from
/// the cycle containing `t` itself.
pub fn locate(t: DateTime<Utc>, stream: FileStream) -> CycleFile {
    match stream {
        FileStream::Primary => {
            let offset = t - Duration::hours(SPINUP_HOURS as i64);
            let cycle = ForecastCycle::new(
                offset.date_naive(),
                ModelCycle::containing_hour(offset.hour()),
            );
            let mut index = t.hour() as i32 - cycle.cycle.hour() as i32;
            if index < 0 {
                index += 24;
            }
            CycleFile::new(cycle, index as u32, stream)
        }
        FileStream::SurfaceExchange => {
            let cycle = ForecastCycle::containing(t);
            CycleFile::new(cycle, t.hour() - cycle.cycle.hour(), stream)
        }
    }
}

/// The file holding the sample one hour before `start`, located with the
/// primary rule.
pub fn first_timestep(start: DateTime<Utc>) -> CycleFile {
    locate(start - Duration::hours(1), FileStream::Primary)
}

/// Files needed to build one hourly series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePlan {
    /// Window covered by `primary`. Equal to the request for hourly
    /// variables, widened to 3-hour boundaries for surface exchange.
    pub window: TimeRange,
    /// One file per stored sample, in time order.
    pub primary: Vec<CycleFile>,
    /// Spinup files, accumulated variables only. Never part of `primary`.
    pub spinup: Vec<CycleFile>,
    /// Sample preceding the window, for accumulated variables whose first
    /// hour is not a cycle boundary.
    pub preceding: Option<CycleFile>,
}

impl FilePlan {
    pub fn file_count(&self) -> usize {
        self.primary.len() + self.spinup.len() + usize::from(self.preceding.is_some())
    }
}

/// Plan the files for `variable` over `range`.
pub fn plan_files(variable: &Variable, range: &TimeRange) -> FilePlan {
    if variable.native_step_hours == SURFACE_EXCHANGE_STEP_HOURS {
        let window = range.expand_to_step(SURFACE_EXCHANGE_STEP_HOURS);
        let primary = window
            .steps(SURFACE_EXCHANGE_STEP_HOURS as i64)
            .into_iter()
            .map(|t| locate(t, FileStream::SurfaceExchange))
            .collect();
        return FilePlan {
            window,
            primary,
            spinup: Vec::new(),
            preceding: None,
        };
    }

    let primary: Vec<CycleFile> = range
        .hours()
        .into_iter()
        .map(|t| locate(t, FileStream::Primary))
        .collect();

    let (spinup, preceding) = if variable.is_accumulated() {
        let spinup = primary.iter().filter_map(CycleFile::spinup).collect();
        let preceding =
            (!is_boundary_hour(range.start.hour())).then(|| first_timestep(range.start));
        (spinup, preceding)
    } else {
        (Vec::new(), None)
    };

    FilePlan {
        window: *range,
        primary,
        spinup,
        preceding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn cycle(y: i32, m: u32, d: u32, h: u32) -> ForecastCycle {
        ForecastCycle::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            ModelCycle::from_hour(h).unwrap(),
        )
    }

    #[test]
    fn test_primary_midnight_uses_previous_day() {
        let file = locate(utc(2020, 1, 1, 0), FileStream::Primary);
        assert_eq!(file.cycle, cycle(2019, 12, 31, 18));
        assert_eq!(file.index, 6);
        assert_eq!(
            file.relative_path(),
            "2019/12/31/18/fc2019123118_006_fp.nc"
        );
    }

    #[test]
    fn test_primary_boundary_hours() {
        for (hour, cycle_hour) in [(4, 0), (10, 6), (16, 12), (22, 18)] {
            let file = locate(utc(2020, 6, 15, hour), FileStream::Primary);
            assert_eq!(file.cycle.cycle.hour(), cycle_hour);
            assert_eq!(file.index, SPINUP_HOURS);
            assert!(file.spinup().is_some());
        }
    }

    #[test]
    fn test_primary_valid_time_round_trip() {
        let range = TimeRange::new(utc(2019, 12, 30, 0), utc(2020, 1, 2, 0));
        for t in range.hours() {
            let file = locate(t, FileStream::Primary);
            assert_eq!(file.valid_time(), t);
            assert!((SPINUP_HOURS..SPINUP_HOURS + 6).contains(&file.index));
        }
    }

    #[test]
    fn test_consecutive_hours_never_skip_or_repeat() {
        let range = TimeRange::new(utc(2020, 2, 28, 0), utc(2020, 3, 2, 0));
        let hours = range.hours();
        for pair in hours.windows(2) {
            let a = locate(pair[0], FileStream::Primary);
            let b = locate(pair[1], FileStream::Primary);
            if a.cycle == b.cycle {
                assert_eq!(b.index, a.index + 1);
            } else {
                assert_eq!(b.cycle, a.cycle.next());
                assert_eq!(b.index, SPINUP_HOURS);
            }
        }
    }

    #[test]
    fn test_spinup_only_for_first_usable_hour() {
        let spinup = locate(utc(2020, 1, 1, 4), FileStream::Primary).spinup().unwrap();
        assert_eq!(spinup.index, 3);
        assert_eq!(spinup.valid_time(), utc(2020, 1, 1, 3));
        assert_eq!(locate(utc(2020, 1, 1, 5), FileStream::Primary).spinup(), None);
    }

    #[test]
    fn test_surface_exchange_uses_raw_hour() {
        let file = locate(utc(2017, 1, 25, 21), FileStream::SurfaceExchange);
        assert_eq!(file.cycle, cycle(2017, 1, 25, 18));
        assert_eq!(file.index, 3);
        assert_eq!(file.file_name(), "fc2017012518_003_full_sfx.nc");
    }

    #[test]
    fn test_first_timestep_of_range() {
        let file = first_timestep(utc(2020, 1, 1, 5));
        assert_eq!(file.valid_time(), utc(2020, 1, 1, 4));
        assert_eq!(file.cycle, cycle(2020, 1, 1, 0));
    }

    #[test]
    fn test_plan_accumulated() {
        let variable = Variable::regional("precipitation_amount_acc").unwrap();
        let range = TimeRange::new(utc(2020, 1, 1, 2), utc(2020, 1, 1, 11));
        let plan = plan_files(&variable, &range);

        assert_eq!(plan.primary.len(), 10);
        // Boundaries at 04 and 10.
        assert_eq!(plan.spinup.len(), 2);
        assert!(plan.spinup.iter().all(|f| f.index == 3));
        assert_eq!(plan.preceding.unwrap().valid_time(), utc(2020, 1, 1, 1));
        assert_eq!(plan.file_count(), 13);
    }

    #[test]
    fn test_plan_accumulated_starting_on_boundary() {
        let variable = Variable::regional("precipitation_amount_acc").unwrap();
        let range = TimeRange::new(utc(2020, 1, 1, 4), utc(2020, 1, 1, 6));
        let plan = plan_files(&variable, &range);
        assert_eq!(plan.preceding, None);
        assert_eq!(plan.spinup.len(), 1);
    }

    #[test]
    fn test_plan_instantaneous_has_no_extras() {
        let variable = Variable::regional("air_pressure_at_sea_level").unwrap();
        let range = TimeRange::new(utc(2020, 1, 1, 0), utc(2020, 1, 1, 23));
        let plan = plan_files(&variable, &range);
        assert_eq!(plan.primary.len(), 24);
        assert!(plan.spinup.is_empty());
        assert!(plan.preceding.is_none());
    }

    #[test]
    fn test_plan_surface_exchange_expands_window() {
        let variable = Variable::regional("LAI").unwrap();
        let range = TimeRange::new(utc(2020, 1, 1, 1), utc(2020, 1, 1, 7));
        let plan = plan_files(&variable, &range);

        assert_eq!(plan.window.start, utc(2020, 1, 1, 0));
        assert_eq!(plan.window.end, utc(2020, 1, 1, 9));
        let valid: Vec<_> = plan.primary.iter().map(CycleFile::valid_time).collect();
        assert_eq!(
            valid,
            vec![utc(2020, 1, 1, 0), utc(2020, 1, 1, 3), utc(2020, 1, 1, 6), utc(2020, 1, 1, 9)]
        );
    }
}
