//! Assembling hourly station series from archive files.
//!
//! # Regional archive
//!
//! ```text
//! plan_files()  ─► calendar exceptions ─► existence check ─► coordinates
//!                                                               │
//!      ┌────────────────────────────────────────────────────────┘
//!      ▼
//! nearest point per station ─► per-file reads (rayon) ─► time order check
//!      │
//!      ├─► accumulated:      deaccumulate() with spinup + preceding sample
//!      ├─► surface exchange: 3h → 1h linear resampling
//!      ▼
//! SeriesBlock (hour × station), checked against the request
//! ```
//!
//! # Global archive
//!
//! Monthly files are read in full for the station points and sliced to the
//! request. Wave parameters move dry nearest points to the nearest wet cell.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use grid_locator::{
    interpolate_block, nearest_wet_point, CoordinateGrid, GridIndex, GridLocatorError,
};
use rayon::prelude::*;
use reanalysis_common::station::validate_stations;
use reanalysis_common::{
    ArchiveKind, ExtractError, ExtractResult, GlobalGroup, Station, TimeRange, Variable,
};
use tracing::{debug, info, warn};

use crate::cycle::{locate, plan_files, CycleFile};
use crate::deaccumulate::{deaccumulate, AccumulatedSeries, NegativeIncrementPolicy};
use crate::exceptions::{ExceptionList, ExceptionPolicy};
use crate::layout::ArchiveLayout;
use crate::reader::ArchiveReader;

/// Values for many stations over a common hourly time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesBlock {
    pub times: Vec<DateTime<Utc>>,
    /// Time-major, `times.len() × n_stations`.
    pub values: Vec<f32>,
    pub n_stations: usize,
}

impl SeriesBlock {
    pub fn new(times: Vec<DateTime<Utc>>, values: Vec<f32>, n_stations: usize) -> ExtractResult<Self> {
        if values.len() != times.len() * n_stations {
            return Err(ExtractError::shape_mismatch(
                times.len() * n_stations,
                values.len(),
                "series block",
            ));
        }
        Ok(Self {
            times,
            values,
            n_stations,
        })
    }

    /// All stations at time step `t`.
    pub fn row(&self, t: usize) -> &[f32] {
        &self.values[t * self.n_stations..(t + 1) * self.n_stations]
    }

    /// One station over time.
    pub fn station_series(&self, station: usize) -> Vec<f32> {
        self.values
            .iter()
            .skip(station)
            .step_by(self.n_stations.max(1))
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Counters collected while assembling one extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub files_read: usize,
    pub files_skipped: usize,
    pub files_zero_filled: usize,
    pub clamped_increments: usize,
    pub wet_point_moves: usize,
}

/// Result of one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub variable: Variable,
    pub block: SeriesBlock,
    /// Longitude and latitude of the grid point used for each station.
    pub grid_points: Vec<(f64, f64)>,
    pub report: ExtractionReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileAction {
    Read,
    ZeroFill,
}

#[derive(Debug, Clone)]
struct PlannedFile {
    file: CycleFile,
    path: PathBuf,
    action: FileAction,
}

/// How far past a skipped window edge to look for a usable file.
const BRIDGE_LIMIT_HOURS: i64 = 48;

/// Cycles searched on each side for a coordinate file.
const NEIGHBOUR_CYCLES: usize = 4;

/// One time step for all points.
type Row = (DateTime<Utc>, Vec<f32>);

/// Builds station series from an archive.
pub struct Assembler<R: ArchiveReader> {
    reader: R,
    layout: ArchiveLayout,
    exceptions: ExceptionList,
    policy: NegativeIncrementPolicy,
}

impl<R: ArchiveReader> Assembler<R> {
    pub fn new(reader: R, layout: ArchiveLayout, exceptions: ExceptionList) -> Self {
        Self {
            reader,
            layout,
            exceptions,
            policy: NegativeIncrementPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: NegativeIncrementPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Extract `variable` at every station for each hour of `range`.
    ///
    /// The result has exactly one row per hour of `range`, or the call fails.
    pub fn extract(
        &self,
        variable: &Variable,
        stations: &[Station],
        range: &TimeRange,
    ) -> ExtractResult<Extraction> {
        validate_stations(stations)?;
        let range = TimeRange::hourly(range.start, range.end)?;

        let extraction = match variable.archive {
            ArchiveKind::Regional | ArchiveKind::SurfaceExchange => {
                self.extract_regional(variable, stations, &range)?
            }
            ArchiveKind::Global => self.extract_global(variable, stations, &range)?,
        };

        let expected = range.hours();
        if extraction.block.times != expected {
            return Err(ExtractError::shape_mismatch(
                expected.len(),
                extraction.block.times.len(),
                format!("{} over {}", variable.name, range),
            ));
        }

        info!(
            variable = %variable.name,
            archive = %variable.archive,
            range = %range,
            stations = stations.len(),
            files_read = extraction.report.files_read,
            files_skipped = extraction.report.files_skipped,
            files_zero_filled = extraction.report.files_zero_filled,
            clamped = extraction.report.clamped_increments,
            "Extraction complete"
        );
        Ok(extraction)
    }

    fn extract_regional(
        &self,
        variable: &Variable,
        stations: &[Station],
        range: &TimeRange,
    ) -> ExtractResult<Extraction> {
        let plan = plan_files(variable, range);
        let mut report = ExtractionReport::default();

        info!(
            variable = %variable.name,
            window = %plan.window,
            files = plan.file_count(),
            "Planned regional files"
        );

        let seeds: Vec<CycleFile> = plan
            .primary
            .iter()
            .chain(&plan.spinup)
            .chain(plan.preceding.iter())
            .copied()
            .collect();

        let mut primary = self.apply_exceptions(&plan.primary, variable, &mut report);
        if !variable.is_accumulated() {
            self.bridge_skipped_edges(&plan.primary, &mut primary, variable);
        }
        let spinup = self.apply_exceptions(&plan.spinup, variable, &mut report);
        let preceding: Vec<CycleFile> = plan.preceding.into_iter().collect();
        let preceding = self.apply_exceptions(&preceding, variable, &mut report);

        let to_read: Vec<&PlannedFile> = primary
            .iter()
            .chain(&spinup)
            .chain(&preceding)
            .filter(|f| f.action == FileAction::Read)
            .collect();
        self.check_exists(to_read.iter().map(|f| &f.path))?;
        report.files_read = to_read.len();

        let coordinate_path = match to_read.first() {
            Some(first) => first.path.clone(),
            None => self.coordinate_fallback(&seeds, variable, range)?,
        };
        let grid = self.reader.coordinates(&coordinate_path)?;
        let points = resolve_points(&grid, stations)?;
        let grid_points = points.iter().map(|p| grid.coordinates_at(*p)).collect();

        let rows = self.read_cycle_rows(&primary, variable, &points)?;
        let (times, values) = split_rows(rows);
        check_increasing(&times)?;

        let n = points.len();
        let (times, values) = if variable.is_accumulated() {
            let spinup_rows: HashMap<_, _> = self
                .read_cycle_rows(&spinup, variable, &points)?
                .into_iter()
                .collect();
            let preceding_row = self
                .read_cycle_rows(&preceding, variable, &points)?
                .pop()
                .map(|(_, row)| row);

            let increments = deaccumulate(
                &AccumulatedSeries {
                    times: &times,
                    values: &values,
                    n_points: n,
                    spinup: &spinup_rows,
                    preceding: preceding_row.as_deref(),
                },
                self.policy,
            )?;
            report.clamped_increments = increments.clamped;
            (times, increments.values)
        } else if times.len() != range.hour_count() || plan.window != *range {
            // Coarse or gappy samples: resample onto the requested hours.
            let targets = range.hours();
            let resampled = interpolate_block(&times, &values, n, &targets)
                .map_err(|e| locator_error(e, &variable.name, range))?;
            debug!(
                variable = %variable.name,
                samples = times.len(),
                hours = targets.len(),
                "Resampled to hourly"
            );
            (targets, resampled)
        } else {
            (times, values)
        };

        Ok(Extraction {
            variable: variable.clone(),
            block: SeriesBlock::new(times, values, n)?,
            grid_points,
            report,
        })
    }

    fn extract_global(
        &self,
        variable: &Variable,
        stations: &[Station],
        range: &TimeRange,
    ) -> ExtractResult<Extraction> {
        let group = variable.global_group.ok_or_else(|| {
            ExtractError::Config(format!("global variable {} has no file group", variable.name))
        })?;
        let files = self.layout.global_files(group, range);
        self.check_exists(files.iter())?;

        let mut report = ExtractionReport::default();
        let first = files
            .first()
            .ok_or_else(|| ExtractError::read(format!("no global files for {}", range)))?;
        let grid = self.reader.coordinates(first)?;
        let mut points = resolve_points(&grid, stations)?;

        if group == GlobalGroup::Wave {
            let field = self.reader.field(first, &variable.name, 0)?;
            for (station, point) in stations.iter().zip(points.iter_mut()) {
                if field.get(*point).map_or(false, |v| !v.is_nan()) {
                    continue;
                }
                match nearest_wet_point(&field, *point, f32::NAN) {
                    Some(wet) => {
                        debug!(station = %station.id, from = %point, to = %wet, "Using nearest wet point");
                        *point = wet;
                        report.wet_point_moves += 1;
                    }
                    None => warn!(station = %station.id, point = %point, "No wet point found"),
                }
            }
        }
        let grid_points = points.iter().map(|p| grid.coordinates_at(*p)).collect();

        let series = files
            .par_iter()
            .map(|path| self.reader.point_series(path, &variable.name, &points))
            .collect::<ExtractResult<Vec<_>>>()?;
        report.files_read = files.len();

        let n = points.len();
        let mut times = Vec::with_capacity(range.hour_count());
        let mut values = Vec::with_capacity(range.hour_count() * n);
        for s in &series {
            for (t, time) in s.times.iter().enumerate() {
                if range.contains(time) {
                    times.push(*time);
                    values.extend_from_slice(s.row(t));
                }
            }
        }
        check_increasing(&times)?;

        Ok(Extraction {
            variable: variable.clone(),
            block: SeriesBlock::new(times, values, n)?,
            grid_points,
            report,
        })
    }

    fn apply_exceptions(
        &self,
        files: &[CycleFile],
        variable: &Variable,
        report: &mut ExtractionReport,
    ) -> Vec<PlannedFile> {
        files
            .iter()
            .filter_map(|file| {
                let action = match self.exceptions.lookup(file, variable) {
                    None => FileAction::Read,
                    Some(ExceptionPolicy::ZeroFill) => {
                        warn!(file = %file, "Excluded file, substituting zeros");
                        report.files_zero_filled += 1;
                        FileAction::ZeroFill
                    }
                    Some(ExceptionPolicy::Skip) => {
                        warn!(file = %file, "Excluded file, skipping");
                        report.files_skipped += 1;
                        return None;
                    }
                };
                Some(PlannedFile {
                    file: *file,
                    path: self.layout.cycle_file_path(file),
                    action,
                })
            })
            .collect()
    }

    /// Extend `primary` outward with the nearest usable files when the first
    /// or last planned file was skipped, so resampling can bridge the edge.
    fn bridge_skipped_edges(
        &self,
        planned: &[CycleFile],
        primary: &mut Vec<PlannedFile>,
        variable: &Variable,
    ) {
        let (Some(first), Some(last)) = (planned.first(), planned.last()) else {
            return;
        };
        let step = variable.native_step_hours.max(1) as i64;

        if primary.first().map(|p| p.file) != Some(*first) {
            if let Some(before) = self.nearest_usable(first, -step, variable) {
                debug!(file = %before.file, "Bridging skipped files at window start");
                primary.insert(0, before);
            }
        }
        if primary.last().map(|p| p.file) != Some(*last) {
            if let Some(after) = self.nearest_usable(last, step, variable) {
                debug!(file = %after.file, "Bridging skipped files at window end");
                primary.push(after);
            }
        }
    }

    /// First file stepping from `from` by `step_hours` that no exception
    /// touches.
    fn nearest_usable(
        &self,
        from: &CycleFile,
        step_hours: i64,
        variable: &Variable,
    ) -> Option<PlannedFile> {
        (1..=BRIDGE_LIMIT_HOURS / step_hours.abs())
            .map(|k| locate(from.valid_time() + Duration::hours(k * step_hours), from.stream))
            .find(|file| self.exceptions.lookup(file, variable).is_none())
            .map(|file| PlannedFile {
                file,
                path: self.layout.cycle_file_path(&file),
                action: FileAction::Read,
            })
    }

    /// Coordinates for a plan that reads no file: any planned file present in
    /// the archive, else the same forecast hour of a nearby cycle.
    fn coordinate_fallback(
        &self,
        seeds: &[CycleFile],
        variable: &Variable,
        range: &TimeRange,
    ) -> ExtractResult<PathBuf> {
        let existing = seeds
            .iter()
            .map(|file| self.layout.cycle_file_path(file))
            .find(|path| self.reader.exists(path));
        if let Some(path) = existing {
            return Ok(path);
        }

        for seed in seeds {
            let (mut earlier, mut later) = (seed.cycle, seed.cycle);
            for _ in 0..NEIGHBOUR_CYCLES {
                earlier = earlier.previous();
                later = later.next();
                for cycle in [earlier, later] {
                    let file = CycleFile::new(cycle, seed.index, seed.stream);
                    if self.exceptions.lookup(&file, variable).is_some() {
                        continue;
                    }
                    let path = self.layout.cycle_file_path(&file);
                    if self.reader.exists(&path) {
                        debug!(file = %file, "Reading coordinates from neighbouring cycle");
                        return Ok(path);
                    }
                }
            }
        }

        Err(ExtractError::read(format!(
            "no file to read coordinates for {} over {}",
            variable.name, range
        )))
    }

    fn check_exists<'p>(&self, paths: impl Iterator<Item = &'p PathBuf>) -> ExtractResult<()> {
        for path in paths {
            if !self.reader.exists(path) {
                return Err(ExtractError::missing_file(path));
            }
        }
        Ok(())
    }

    /// Read one row per file, in plan order; files are read in parallel.
    fn read_cycle_rows(
        &self,
        files: &[PlannedFile],
        variable: &Variable,
        points: &[GridIndex],
    ) -> ExtractResult<Vec<Row>> {
        let per_file = files
            .par_iter()
            .map(|planned| -> ExtractResult<Vec<Row>> {
                match planned.action {
                    FileAction::ZeroFill => {
                        Ok(vec![(planned.file.valid_time(), vec![0.0; points.len()])])
                    }
                    FileAction::Read => {
                        let series =
                            self.reader
                                .point_series(&planned.path, &variable.name, points)?;
                        Ok((0..series.times.len())
                            .map(|t| (series.times[t], series.row(t).to_vec()))
                            .collect())
                    }
                }
            })
            .collect::<ExtractResult<Vec<_>>>()?;
        Ok(per_file.into_iter().flatten().collect())
    }
}

fn resolve_points(grid: &CoordinateGrid, stations: &[Station]) -> ExtractResult<Vec<GridIndex>> {
    stations
        .iter()
        .map(|s| {
            grid.nearest(s.longitude, s.latitude)
                .map_err(|e| ExtractError::out_of_range(format!("station {}: {}", s.id, e)))
        })
        .collect()
}

fn split_rows(rows: Vec<Row>) -> (Vec<DateTime<Utc>>, Vec<f32>) {
    let mut times = Vec::with_capacity(rows.len());
    let mut values = Vec::new();
    for (t, row) in rows {
        times.push(t);
        values.extend(row);
    }
    (times, values)
}

fn check_increasing(times: &[DateTime<Utc>]) -> ExtractResult<()> {
    match times.windows(2).find(|w| w[1] <= w[0]) {
        Some(w) => Err(ExtractError::OutOfOrder(format!("{} followed by {}", w[0], w[1]))),
        None => Ok(()),
    }
}

fn locator_error(err: GridLocatorError, variable: &str, range: &TimeRange) -> ExtractError {
    match err {
        GridLocatorError::NotMonotonic(msg) => ExtractError::OutOfOrder(msg),
        GridLocatorError::EmptyGrid(msg) => ExtractError::out_of_range(msg),
        other => ExtractError::shape_mismatch(
            range.hour_count(),
            0,
            format!("{} over {}: {}", variable, range, other),
        ),
    }
}
