//! Archive writer create/append round trips on temporary files.

use chrono::{DateTime, Duration, TimeZone, Utc};
use netcdf_io::{read_archive, ArchiveBlock, ArchiveWriter, BlockVariable, NetCdfError, WriteOutcome};
use reanalysis_common::{ExtractError, Station};
use test_utils::temp_test_dir_with_prefix;

fn hours_from(start: DateTime<Utc>, n: i64) -> Vec<DateTime<Utc>> {
    (0..n).map(|h| start + Duration::hours(h)).collect()
}

fn block(start: DateTime<Utc>, n_hours: i64, var: &str) -> ArchiveBlock {
    let stations = vec![
        Station::new("18700", 10.72, 59.94),
        Station::new("50540", 5.33, 60.38),
    ];
    let times = hours_from(start, n_hours);
    let values = (0..times.len() * stations.len()).map(|i| i as f32).collect();
    ArchiveBlock {
        times,
        grid_points: vec![(10.70, 59.95), (5.35, 60.37)],
        stations,
        variables: vec![BlockVariable {
            name: var.to_string(),
            values,
            units: Some("Pa".to_string()),
        }],
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
}

#[test]
fn test_create_then_append() {
    let dir = temp_test_dir_with_prefix("archive_test_");
    let path = dir.path().join("out.nc");
    let writer = ArchiveWriter::new(&path);

    let first = block(start(), 24, "air_pressure_at_sea_level");
    assert_eq!(writer.write(&first).unwrap(), WriteOutcome::Created);

    let second = block(start() + Duration::hours(24), 12, "air_pressure_at_sea_level");
    assert_eq!(
        writer.write(&second).unwrap(),
        WriteOutcome::Appended { offset: 24 }
    );

    let contents = read_archive(&path).unwrap();
    assert_eq!(contents.times.len(), 36);
    assert_eq!(contents.times[0], start());
    assert_eq!(contents.times[35], start() + Duration::hours(35));
    assert_eq!(contents.station_ids, vec!["18700", "50540"]);
    assert_eq!(contents.grid_points[1], (5.35, 60.37));

    let (name, values) = &contents.variables[0];
    assert_eq!(name, "air_pressure_at_sea_level");
    assert_eq!(values.len(), 72);
    // First row of the appended block restarts at 0.
    assert_eq!(values[48], 0.0);
}

#[test]
fn test_nan_round_trips_through_fill_value() {
    let dir = temp_test_dir_with_prefix("archive_test_");
    let path = dir.path().join("out.nc");

    let mut b = block(start(), 2, "swh");
    b.variables[0].values[1] = f32::NAN;
    ArchiveWriter::new(&path).write(&b).unwrap();

    let contents = read_archive(&path).unwrap();
    assert!(contents.variables[0].1[1].is_nan());
    assert_eq!(contents.variables[0].1[0], 0.0);
}

#[test]
fn test_append_rejects_station_count_change() {
    let dir = temp_test_dir_with_prefix("archive_test_");
    let path = dir.path().join("out.nc");
    let writer = ArchiveWriter::new(&path);
    writer.write(&block(start(), 3, "msl")).unwrap();

    let mut other = block(start() + Duration::hours(3), 3, "msl");
    other.stations.pop();
    other.grid_points.pop();
    other.variables[0].values.truncate(3);

    let err = writer.write(&other).unwrap_err();
    assert!(matches!(err, NetCdfError::SchemaMismatch { .. }));
}

#[test]
fn test_append_rejects_station_id_change() {
    let dir = temp_test_dir_with_prefix("archive_test_");
    let path = dir.path().join("out.nc");
    let writer = ArchiveWriter::new(&path);
    writer.write(&block(start(), 3, "msl")).unwrap();

    // Same count, different second station.
    let mut other = block(start() + Duration::hours(3), 3, "msl");
    other.stations[1] = Station::new("99999", 5.33, 60.38);

    let err = writer.write(&other).unwrap_err();
    assert!(matches!(err, NetCdfError::SchemaMismatch { .. }));
    assert!(err.to_string().contains("99999"));
    assert_eq!(read_archive(&path).unwrap().times.len(), 3);
}

#[test]
fn test_unwritable_path_is_a_write_error() {
    let dir = temp_test_dir_with_prefix("archive_test_");
    let path = dir.path().join("no_such_dir").join("out.nc");

    let err = ArchiveWriter::new(&path)
        .write(&block(start(), 3, "msl"))
        .unwrap_err();
    assert!(matches!(err, NetCdfError::WriteFailed { .. }));

    let err: ExtractError = err.into();
    assert_eq!(err.kind(), "WriteError");
}

#[test]
fn test_append_rejects_variable_change() {
    let dir = temp_test_dir_with_prefix("archive_test_");
    let path = dir.path().join("out.nc");
    let writer = ArchiveWriter::new(&path);
    writer.write(&block(start(), 3, "msl")).unwrap();

    let err = writer
        .write(&block(start() + Duration::hours(3), 3, "swh"))
        .unwrap_err();
    assert!(matches!(err, NetCdfError::SchemaMismatch { .. }));
}

#[test]
fn test_append_rejects_overlapping_times() {
    let dir = temp_test_dir_with_prefix("archive_test_");
    let path = dir.path().join("out.nc");
    let writer = ArchiveWriter::new(&path);
    writer.write(&block(start(), 3, "msl")).unwrap();

    let err = writer
        .write(&block(start() + Duration::hours(2), 3, "msl"))
        .unwrap_err();
    assert!(matches!(err, NetCdfError::SchemaMismatch { .. }));
}

#[test]
fn test_block_shape_validated_before_io() {
    let dir = temp_test_dir_with_prefix("archive_test_");
    let path = dir.path().join("out.nc");

    let mut b = block(start(), 3, "msl");
    b.variables[0].values.pop();
    assert!(ArchiveWriter::new(&path).write(&b).is_err());
    assert!(!path.exists());
}
