//! Choosing between the regional and the global archive.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use reanalysis_common::bbox::BoundingBox;
use reanalysis_common::variable::regional_name_for_global;
use reanalysis_common::{ArchiveKind, ExtractError, ExtractResult, TimeRange, Variable};
use tracing::debug;

/// Regional archive domain, closed bounds.
pub const REGIONAL_MIN_LON: f64 = -30.0;
pub const REGIONAL_MAX_LON: f64 = 85.0;
pub const REGIONAL_MIN_LAT: f64 = 44.0;
pub const REGIONAL_MAX_LAT: f64 = 83.0;

/// First valid time served by the regional archive.
pub fn regional_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1997, 8, 1, 4, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Global archive extent: whole days from 1979-01-01 to 2019-12-31.
///
/// The end is the last hour of 2019-12-31 rather than its midnight, since the
/// December 2019 monthly file holds every hour of that day.
pub fn global_extent() -> TimeRange {
    let start = NaiveDate::from_ymd_opt(1979, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
    let end = NaiveDate::from_ymd_opt(2019, 12, 31).and_then(|d| d.and_hms_opt(23, 0, 0));
    TimeRange::new(
        start.map(|t| Utc.from_utc_datetime(&t)).unwrap_or_default(),
        end.map(|t| Utc.from_utc_datetime(&t)).unwrap_or_default(),
    )
}

pub fn regional_domain() -> BoundingBox {
    BoundingBox::new(REGIONAL_MIN_LON, REGIONAL_MIN_LAT, REGIONAL_MAX_LON, REGIONAL_MAX_LAT)
}

/// Selected archive and the variable resolved against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSelection {
    pub archive: ArchiveKind,
    pub variable: Variable,
}

impl SourceSelection {
    pub fn is_regional(&self) -> bool {
        self.archive != ArchiveKind::Global
    }
}

/// Picks the archive for a request and validates it before any file I/O.
#[derive(Debug, Clone, Copy)]
pub struct SourceSelector {
    /// Use atmosphere files for parameters found in both global groups.
    pub prefer_atmosphere: bool,
}

impl Default for SourceSelector {
    fn default() -> Self {
        Self {
            prefer_atmosphere: true,
        }
    }
}

impl SourceSelector {
    pub fn new(prefer_atmosphere: bool) -> Self {
        Self { prefer_atmosphere }
    }

    /// Select the archive for one point.
    pub fn select(
        &self,
        param: &str,
        lon: f64,
        lat: f64,
        range: &TimeRange,
    ) -> ExtractResult<SourceSelection> {
        self.select_area(param, &BoundingBox::new(lon, lat, lon, lat), range)
    }

    /// Select one archive for every point of `area` (e.g. the bounding box of
    /// a station list): regional only if the whole area is inside its domain.
    pub fn select_area(
        &self,
        param: &str,
        area: &BoundingBox,
        range: &TimeRange,
    ) -> ExtractResult<SourceSelection> {
        check_time_extent(range)?;
        if !(-90.0..=90.0).contains(&area.min_y) || !(-90.0..=90.0).contains(&area.max_y) {
            return Err(ExtractError::out_of_range(format!(
                "latitude outside [-90, 90] in {}",
                area
            )));
        }

        let regional = range.start >= regional_epoch() && regional_domain().contains(area);

        let selection = if regional {
            let name = regional_name_for_global(param).unwrap_or(param);
            let variable = Variable::regional(name)?;
            SourceSelection {
                archive: variable.archive,
                variable,
            }
        } else {
            let name = global_name_for_regional(param).unwrap_or(param);
            SourceSelection {
                archive: ArchiveKind::Global,
                variable: Variable::global(name, self.prefer_atmosphere)?,
            }
        };

        debug!(
            param = param,
            archive = %selection.archive,
            variable = %selection.variable.name,
            range = %range,
            "Selected archive"
        );
        Ok(selection)
    }
}

/// Reject times outside the global extent, which bounds both archives.
pub fn check_time_extent(range: &TimeRange) -> ExtractResult<()> {
    let extent = global_extent();
    for (label, t) in [("start", range.start), ("end", range.end)] {
        if !extent.contains(&t) {
            return Err(ExtractError::out_of_range(format!(
                "{} time {} outside data set interval {}",
                label, t, extent
            )));
        }
    }
    Ok(())
}

fn global_name_for_regional(param: &str) -> Option<&'static str> {
    ["msl", "u10", "v10"]
        .into_iter()
        .find(|global| regional_name_for_global(global) == Some(param))
}
