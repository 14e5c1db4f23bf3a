//! Stride-by-stride extraction into one output archive.

use std::fmt;

use extraction::{Assembler, ArchiveReader, SourceSelector};
use netcdf_io::{ArchiveBlock, ArchiveWriter, BlockVariable, WriteOutcome};
use reanalysis_common::station::stations_bbox;
use reanalysis_common::{BoundingBox, ExtractError, ExtractResult, Station, TimeRange};
use tracing::{info, warn};

/// What to extract.
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Parameter as requested; also the name of the output variable.
    pub parameter: String,
    pub stations: Vec<Station>,
    pub range: TimeRange,
    pub stride_days: i64,
}

/// A stride that could not be extracted or written.
#[derive(Debug)]
pub struct StrideFailure {
    pub stride: TimeRange,
    pub error: ExtractError,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub strides: usize,
    pub written: usize,
    pub samples: usize,
    pub failures: Vec<StrideFailure>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} of {} strides written ({} hourly samples)",
            self.written, self.strides, self.samples
        )?;
        for failure in &self.failures {
            writeln!(f, "  FAILED {}: {}", failure.stride, failure.error)?;
        }
        Ok(())
    }
}

/// Runs a [`BatchJob`] against one archive reader and one output file.
pub struct BatchRunner<R: ArchiveReader> {
    assembler: Assembler<R>,
    selector: SourceSelector,
    writer: ArchiveWriter,
}

impl<R: ArchiveReader> BatchRunner<R> {
    pub fn new(assembler: Assembler<R>, selector: SourceSelector, writer: ArchiveWriter) -> Self {
        Self {
            assembler,
            selector,
            writer,
        }
    }

    /// Extract every stride of the job.
    ///
    /// Request errors (unknown parameter, times outside the archives, bad
    /// station list) fail the whole job before any file is opened. Errors
    /// inside a stride are collected and the next stride is attempted.
    pub fn run(&self, job: &BatchJob) -> ExtractResult<BatchSummary> {
        let range = TimeRange::hourly(job.range.start, job.range.end)?;
        let area = stations_bbox(&job.stations)
            .ok_or_else(|| ExtractError::Config("station list is empty".to_string()))?;
        self.selector.select_area(&job.parameter, &area, &range)?;

        let strides = range.strides(job.stride_days);
        info!(
            parameter = %job.parameter,
            stations = job.stations.len(),
            range = %range,
            strides = strides.len(),
            output = %self.writer.path().display(),
            "Starting batch"
        );

        let mut summary = BatchSummary {
            strides: strides.len(),
            ..Default::default()
        };
        for stride in strides {
            match self.run_stride(job, &area, &stride) {
                Ok(samples) => {
                    summary.written += 1;
                    summary.samples += samples;
                }
                Err(error) => {
                    warn!(stride = %stride, error = %error, kind = error.kind(), "Stride failed");
                    summary.failures.push(StrideFailure { stride, error });
                }
            }
        }

        info!(
            written = summary.written,
            failed = summary.failures.len(),
            samples = summary.samples,
            "Batch complete"
        );
        Ok(summary)
    }

    fn run_stride(&self, job: &BatchJob, area: &BoundingBox, stride: &TimeRange) -> ExtractResult<usize> {
        let selection = self.selector.select_area(&job.parameter, area, stride)?;
        let extraction = self
            .assembler
            .extract(&selection.variable, &job.stations, stride)?;
        let samples = extraction.block.len();

        let block = ArchiveBlock {
            times: extraction.block.times,
            stations: job.stations.clone(),
            grid_points: extraction.grid_points,
            variables: vec![BlockVariable {
                name: job.parameter.clone(),
                values: extraction.block.values,
                units: None,
            }],
        };
        let outcome = self.writer.write(&block)?;

        match outcome {
            WriteOutcome::Created => info!(stride = %stride, samples, "Created archive"),
            WriteOutcome::Appended { offset } => {
                info!(stride = %stride, samples, offset, "Appended to archive")
            }
        }
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};

    use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
    use extraction::{ArchiveLayout, ExceptionList};
    use grid_locator::{CoordinateGrid, GridField, GridIndex};
    use netcdf_io::{read_archive, PointSeries};
    use test_utils::stations::ICELAND_WEST;

    /// Global atmosphere archive over 45°W-30°W, 55°N-70°N on a 1° grid.
    /// Each value is `hour of day + column`. Months in `missing` do not exist.
    struct SyntheticGlobal {
        missing: HashSet<(i32, u32)>,
    }

    impl SyntheticGlobal {
        fn new() -> Self {
            Self {
                missing: HashSet::new(),
            }
        }

        fn month_of(path: &Path) -> Option<(i32, u32)> {
            let stem = path.file_stem()?.to_str()?;
            let digits = stem.rsplit('_').next()?;
            Some((digits[..4].parse().ok()?, digits[4..].parse().ok()?))
        }

        fn grid() -> CoordinateGrid {
            let lon = (0..16).map(|i| -45.0 + i as f64).collect();
            let lat = (0..16).map(|i| 70.0 - i as f64).collect();
            CoordinateGrid::regular(lon, lat)
        }
    }

    impl ArchiveReader for SyntheticGlobal {
        fn exists(&self, path: &Path) -> bool {
            Self::month_of(path).map_or(false, |m| !self.missing.contains(&m))
        }

        fn coordinates(&self, _path: &Path) -> ExtractResult<CoordinateGrid> {
            Ok(Self::grid())
        }

        fn point_series(
            &self,
            path: &Path,
            _variable: &str,
            points: &[GridIndex],
        ) -> ExtractResult<PointSeries> {
            let (year, month) = Self::month_of(path)
                .ok_or_else(|| ExtractError::read(format!("bad name {}", path.display())))?;
            let start: DateTime<Utc> = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap();
            let mut times = Vec::new();
            let mut t = start;
            while t.month() == month {
                times.push(t);
                t += Duration::hours(1);
            }
            let values = times
                .iter()
                .flat_map(|t| points.iter().map(move |p| t.hour() as f32 + p.x as f32))
                .collect();
            Ok(PointSeries {
                times,
                values,
                n_points: points.len(),
            })
        }

        fn field(&self, _path: &Path, _variable: &str, _time_index: usize) -> ExtractResult<GridField> {
            Err(ExtractError::read("no fields in synthetic archive"))
        }
    }

    fn stations() -> Vec<Station> {
        let (id, lon, lat) = ICELAND_WEST;
        vec![Station::new(id, lon, lat), Station::new("cape", -40.0, 60.0)]
    }

    fn runner(reader: SyntheticGlobal, output: &Path) -> BatchRunner<SyntheticGlobal> {
        let assembler = Assembler::new(
            reader,
            ArchiveLayout::new("/archive/nora3", "/archive/era5"),
            ExceptionList::empty(),
        );
        BatchRunner::new(assembler, SourceSelector::default(), ArchiveWriter::new(output))
    }

    fn job(parameter: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> BatchJob {
        BatchJob {
            parameter: parameter.to_string(),
            stations: stations(),
            range: TimeRange::new(start, end),
            stride_days: 2,
        }
    }

    fn output(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("msl.nc")
    }

    #[test]
    fn test_strides_append_across_months() {
        let dir = tempfile::tempdir().unwrap();
        let path = output(&dir);
        let start = Utc.with_ymd_and_hms(2010, 1, 30, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2010, 2, 2, 23, 0, 0).unwrap();

        let summary = runner(SyntheticGlobal::new(), &path)
            .run(&job("msl", start, end))
            .unwrap();
        assert!(summary.is_success());
        assert_eq!(summary.strides, 2);
        assert_eq!(summary.written, 2);
        assert_eq!(summary.samples, 96);

        let contents = read_archive(&path).unwrap();
        assert_eq!(contents.times.len(), 96);
        assert_eq!(contents.times[0], start);
        assert_eq!(contents.times[95], end);
        assert_eq!(contents.station_ids, vec!["iceland", "cape"]);
        assert_eq!(contents.grid_points, vec![(-35.0, 64.0), (-40.0, 60.0)]);

        let (name, values) = &contents.variables[0];
        assert_eq!(name, "msl");
        // Hour 5 of the first day: columns 10 and 5.
        assert_eq!(values[5 * 2], 15.0);
        assert_eq!(values[5 * 2 + 1], 10.0);
    }

    #[test]
    fn test_failed_stride_is_reported_and_others_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = output(&dir);
        let mut reader = SyntheticGlobal::new();
        reader.missing.insert((2010, 2));
        let start = Utc.with_ymd_and_hms(2010, 1, 28, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2010, 2, 3, 23, 0, 0).unwrap();

        let summary = runner(reader, &path).run(&job("msl", start, end)).unwrap();
        assert_eq!(summary.strides, 4);
        assert_eq!(summary.written, 2);
        assert_eq!(summary.failures.len(), 2);
        assert!(matches!(
            summary.failures[0].error,
            ExtractError::MissingFile { .. }
        ));
        assert!(summary.to_string().contains("FAILED"));

        let contents = read_archive(&path).unwrap();
        assert_eq!(contents.times.len(), 96);
    }

    #[test]
    fn test_request_errors_fail_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = output(&dir);
        let start = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();

        let err = runner(SyntheticGlobal::new(), &path)
            .run(&job("not_a_parameter", start, start + Duration::hours(5)))
            .unwrap_err();
        assert!(matches!(err, ExtractError::UndefinedParameter { .. }));

        let late = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let err = runner(SyntheticGlobal::new(), &path)
            .run(&job("msl", late, late + Duration::hours(5)))
            .unwrap_err();
        assert!(matches!(err, ExtractError::OutOfRange(_)));
        assert!(!path.exists());
    }
}
