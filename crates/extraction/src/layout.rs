//! On-disk layout of the regional and global archives.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use reanalysis_common::{GlobalGroup, TimeRange};

use crate::cycle::CycleFile;

/// Archive roots; all paths are derived from these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    pub regional_root: PathBuf,
    pub global_root: PathBuf,
}

impl ArchiveLayout {
    pub fn new(regional_root: impl Into<PathBuf>, global_root: impl Into<PathBuf>) -> Self {
        Self {
            regional_root: regional_root.into(),
            global_root: global_root.into(),
        }
    }

    /// `{regional_root}/YYYY/MM/DD/HH/fcYYYYMMDDHH_NNN_<stream>.nc`
    pub fn cycle_file_path(&self, file: &CycleFile) -> PathBuf {
        self.regional_root.join(file.relative_path())
    }

    /// Monthly global file holding `year`/`month` for `group`.
    pub fn global_month_path(&self, group: GlobalGroup, year: i32, month: u32) -> PathBuf {
        let (dir, prefix) = match group {
            GlobalGroup::Atmosphere => ("atm", "era5_atm_CDS"),
            GlobalGroup::Wave => ("wave", "era5_wave_CDS"),
        };
        self.global_root
            .join(dir)
            .join(format!("{}_{}{:02}.nc", prefix, year, month))
    }

    /// Monthly global files covering `range`, in time order.
    pub fn global_files(&self, group: GlobalGroup, range: &TimeRange) -> Vec<PathBuf> {
        months_between(range.start, range.end)
            .into_iter()
            .map(|(year, month)| self.global_month_path(group, year, month))
            .collect()
    }

    pub fn regional_root(&self) -> &Path {
        &self.regional_root
    }
}

/// Every `(year, month)` touched by `[start, end]`.
pub fn months_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());
    while (year, month) <= (end.year(), end.month()) {
        months.push((year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    months
}
