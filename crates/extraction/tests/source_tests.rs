//! Archive selection and built-in calendar exceptions for known places and dates.

use extraction::{
    locate, CycleFile, ExceptionList, ExceptionPolicy, FileStream, SourceSelector,
};
use reanalysis_common::time::parse_time;
use reanalysis_common::{ArchiveKind, BoundingBox, ForecastCycle, Station, TimeRange, Variable};
use test_utils::bbox::{NORTH_ATLANTIC, REGIONAL, SOUTHERN_NORWAY};
use test_utils::stations::{ICELAND_WEST, SOUTH_EDGE, TROMSO};
use test_utils::time::{BROKEN_SFX_DAY, LEAP_DAY_CYCLE, REGIONAL_EPOCH};

fn area((min_x, min_y, max_x, max_y): (f64, f64, f64, f64)) -> BoundingBox {
    BoundingBox::new(min_x, min_y, max_x, max_y)
}

fn station((id, lon, lat): (&str, f64, f64)) -> Station {
    Station::new(id, lon, lat)
}

fn at(s: &str) -> TimeRange {
    let t = parse_time(s).unwrap();
    TimeRange::new(t, t)
}

#[test]
fn test_domain_edge_at_epoch_selects_regional() {
    let edge = station(SOUTH_EDGE);
    let selection = SourceSelector::default()
        .select("msl", edge.longitude, edge.latitude, &at(REGIONAL_EPOCH))
        .unwrap();
    assert_eq!(selection.archive, ArchiveKind::Regional);
    assert_eq!(selection.variable.name, "air_pressure_at_sea_level");
}

#[test]
fn test_stations_outside_domain_select_global() {
    let selector = SourceSelector::default();
    let range = at("2005-06-01T12:00");

    let iceland = station(ICELAND_WEST);
    let selection = selector
        .select("msl", iceland.longitude, iceland.latitude, &range)
        .unwrap();
    assert_eq!(selection.archive, ArchiveKind::Global);

    let tromso = station(TROMSO);
    let selection = selector
        .select("msl", tromso.longitude, tromso.latitude, &range)
        .unwrap();
    assert!(selection.is_regional());
}

#[test]
fn test_station_areas() {
    let selector = SourceSelector::default();
    let range = at("2005-06-01T12:00");

    for (bbox, regional) in [(SOUTHERN_NORWAY, true), (REGIONAL, true), (NORTH_ATLANTIC, false)] {
        let selection = selector.select_area("u10", &area(bbox), &range).unwrap();
        assert_eq!(selection.is_regional(), regional, "{:?}", bbox);
    }
}

#[test]
fn test_leap_day_cycle_zero_filled_for_accumulations() {
    let exceptions = ExceptionList::embedded().unwrap();
    let cycle = ForecastCycle::containing(parse_time(LEAP_DAY_CYCLE).unwrap());
    let file = CycleFile::new(cycle, 5, FileStream::Primary);

    let precip = Variable::regional("precipitation_amount_acc").unwrap();
    let temperature = Variable::regional("air_temperature_2m").unwrap();
    assert_eq!(exceptions.lookup(&file, &precip), Some(ExceptionPolicy::ZeroFill));
    assert_eq!(exceptions.lookup(&file, &temperature), None);

    let twelve_z = ForecastCycle::containing(parse_time("2020-02-29T12:00").unwrap());
    let earlier = CycleFile::new(twelve_z, 5, FileStream::Primary);
    assert_eq!(exceptions.lookup(&earlier, &precip), None);
}

#[test]
fn test_broken_surface_exchange_day_skipped() {
    let exceptions = ExceptionList::embedded().unwrap();
    let lai = Variable::regional("LAI").unwrap();

    let file = locate(parse_time(BROKEN_SFX_DAY).unwrap(), FileStream::SurfaceExchange);
    assert_eq!(exceptions.lookup(&file, &lai), Some(ExceptionPolicy::Skip));

    let primary = locate(parse_time(BROKEN_SFX_DAY).unwrap(), FileStream::Primary);
    assert_eq!(exceptions.lookup(&primary, &lai), None);
}
