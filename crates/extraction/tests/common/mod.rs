//! In-memory archives for assembler tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use extraction::{ArchiveLayout, ArchiveReader, CycleFile, FileStream};
use grid_locator::{CoordinateGrid, GridField, GridIndex};
use netcdf_io::PointSeries;
use reanalysis_common::{
    ExtractError, ExtractResult, ForecastCycle, GlobalGroup, Station, TimeRange,
};
use test_utils::{create_lonlat_fields, stations};

pub const REGIONAL_NX: usize = 4;
pub const REGIONAL_NY: usize = 3;

/// One archive file: a grid, a time axis and full fields per variable.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    pub grid: CoordinateGrid,
    pub times: Vec<DateTime<Utc>>,
    /// Time-major `times × ny × nx`.
    pub variables: HashMap<String, Vec<f32>>,
}

impl MemoryFile {
    fn shape(&self) -> (usize, usize) {
        self.grid.shape()
    }
}

/// [`ArchiveReader`] backed by a map of paths, recording every file opened.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    files: HashMap<PathBuf, MemoryFile>,
    opened: Mutex<Vec<PathBuf>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: PathBuf, file: MemoryFile) {
        self.files.insert(path, file);
    }

    pub fn remove(&mut self, path: &Path) -> Option<MemoryFile> {
        self.files.remove(path)
    }

    pub fn file_mut(&mut self, path: &Path) -> Option<&mut MemoryFile> {
        self.files.get_mut(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Paths opened so far, in no particular order.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }

    fn open(&self, path: &Path) -> ExtractResult<&MemoryFile> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(path.to_path_buf());
        }
        self.files
            .get(path)
            .ok_or_else(|| ExtractError::missing_file(path))
    }
}

impl ArchiveReader for MemoryArchive {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn coordinates(&self, path: &Path) -> ExtractResult<CoordinateGrid> {
        Ok(self.open(path)?.grid.clone())
    }

    fn point_series(
        &self,
        path: &Path,
        variable: &str,
        points: &[GridIndex],
    ) -> ExtractResult<PointSeries> {
        let file = self.open(path)?;
        let data = file
            .variables
            .get(variable)
            .ok_or_else(|| ExtractError::read(format!("{} not in {}", variable, path.display())))?;
        let (ny, nx) = file.shape();
        let mut values = Vec::with_capacity(file.times.len() * points.len());
        for t in 0..file.times.len() {
            for p in points {
                values.push(data[t * ny * nx + p.flat(nx)]);
            }
        }
        Ok(PointSeries {
            times: file.times.clone(),
            values,
            n_points: points.len(),
        })
    }

    fn field(&self, path: &Path, variable: &str, time_index: usize) -> ExtractResult<GridField> {
        let file = self.open(path)?;
        let data = file
            .variables
            .get(variable)
            .ok_or_else(|| ExtractError::read(format!("{} not in {}", variable, path.display())))?;
        let (ny, nx) = file.shape();
        let slice = data[time_index * ny * nx..(time_index + 1) * ny * nx].to_vec();
        GridField::new(slice, ny, nx).map_err(|e| ExtractError::read(e.to_string()))
    }
}

pub fn layout() -> ArchiveLayout {
    ArchiveLayout::new("/archive/nora3", "/archive/era5")
}

/// 4×3 curvilinear grid from (5°E, 59°N), 2° in longitude and 1° in latitude.
pub fn regional_grid() -> CoordinateGrid {
    let (lon, lat) = create_lonlat_fields(REGIONAL_NX, REGIONAL_NY, 5.0, 59.0, 2.0, 1.0);
    CoordinateGrid::Curvilinear {
        lon,
        lat,
        ny: REGIONAL_NY,
        nx: REGIONAL_NX,
    }
}

/// Oslo and Bergen; they resolve to cells (1, 3) and (1, 0) of [`regional_grid`].
pub fn test_stations() -> Vec<Station> {
    [stations::OSLO, stations::BERGEN]
        .into_iter()
        .map(|(id, lon, lat)| Station::new(id, lon, lat))
        .collect()
}

/// Add every file of every cycle whose files cover `span`, for one stream.
///
/// `value(file, cell)` gives the stored value of `variable` in each cell.
pub fn add_cycles(
    archive: &mut MemoryArchive,
    span: &TimeRange,
    stream: FileStream,
    variable: &str,
    value: impl Fn(&CycleFile, GridIndex) -> f32,
) {
    let layout = layout();
    let grid = regional_grid();
    let mut cycle = ForecastCycle::containing(span.start - Duration::hours(12));
    while cycle.start() <= span.end {
        for index in 0..24 {
            let file = CycleFile::new(cycle, index, stream);
            let mut data = Vec::with_capacity(REGIONAL_NX * REGIONAL_NY);
            for y in 0..REGIONAL_NY {
                for x in 0..REGIONAL_NX {
                    data.push(value(&file, GridIndex::new(y, x)));
                }
            }
            archive.insert(
                layout.cycle_file_path(&file),
                MemoryFile {
                    grid: grid.clone(),
                    times: vec![file.valid_time()],
                    variables: HashMap::from([(variable.to_string(), data)]),
                },
            );
        }
        cycle = cycle.next();
    }
}

/// Monthly global file on a 1° regular grid from (0°E, 62°N) to (5°E, 57°N).
/// Column 0 is land (NaN) when `land_column` is set.
pub fn add_global_month(
    archive: &mut MemoryArchive,
    group: GlobalGroup,
    year: i32,
    month: u32,
    variable: &str,
    land_column: bool,
    value: impl Fn(DateTime<Utc>, GridIndex) -> f32,
) {
    let lon: Vec<f64> = (0..6).map(|i| i as f64).collect();
    let lat: Vec<f64> = (0..6).map(|i| 62.0 - i as f64).collect();
    let (ny, nx) = (lat.len(), lon.len());

    let first = chrono::NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .expect("valid month");
    let next = if month == 12 {
        chrono::NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        chrono::NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|t| t.and_utc())
    .expect("valid month");

    let times: Vec<DateTime<Utc>> = TimeRange::new(first, next - Duration::hours(1)).hours();
    let mut data = Vec::with_capacity(times.len() * ny * nx);
    for t in &times {
        for y in 0..ny {
            for x in 0..nx {
                if land_column && x == 0 {
                    data.push(f32::NAN);
                } else {
                    data.push(value(*t, GridIndex::new(y, x)));
                }
            }
        }
    }

    archive.insert(
        layout().global_month_path(group, year, month),
        MemoryFile {
            grid: CoordinateGrid::regular(lon, lat),
            times,
            variables: HashMap::from([(variable.to_string(), data)]),
        },
    );
}
