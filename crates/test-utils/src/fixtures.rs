//! Places, grids and dates whose archive behaviour is known.

/// Common bounding box definitions for testing, as (min_lon, min_lat, max_lon, max_lat).
pub mod bbox {
    /// Regional archive domain (closed bounds).
    pub const REGIONAL: (f64, f64, f64, f64) = (-30.0, 44.0, 85.0, 83.0);

    /// Southern Norway, well inside the regional domain.
    pub const SOUTHERN_NORWAY: (f64, f64, f64, f64) = (4.0, 57.0, 12.0, 63.0);

    /// North Atlantic, partly west of the regional domain.
    pub const NORTH_ATLANTIC: (f64, f64, f64, f64) = (-45.0, 40.0, 0.0, 65.0);
}

/// Station coordinates for testing, as (id, lon, lat).
pub mod stations {
    pub const OSLO: (&str, f64, f64) = ("18700", 10.72, 59.94);
    pub const BERGEN: (&str, f64, f64) = ("50540", 5.33, 60.38);
    pub const TROMSO: (&str, f64, f64) = ("90450", 18.94, 69.65);

    /// On the southern edge of the regional domain.
    pub const SOUTH_EDGE: (&str, f64, f64) = ("edge", 10.0, 44.0);

    /// West of the regional domain.
    pub const ICELAND_WEST: (&str, f64, f64) = ("iceland", -35.0, 64.0);
}

/// Regular lat/lon grids.
pub mod grid {
    /// Global 0.25 degree lat/lon grid, longitudes 0..360.
    pub const GLOBAL_QUARTER_DEGREE: GridSpec = GridSpec {
        width: 1440,
        height: 721,
        min_lon: 0.0,
        max_lon: 359.75,
        min_lat: -90.0,
        max_lat: 90.0,
    };

    /// 10×10 grid over ±10°.
    pub const SIMPLE_10X10: GridSpec = GridSpec {
        width: 10,
        height: 10,
        min_lon: -10.0,
        max_lon: 10.0,
        min_lat: -10.0,
        max_lat: 10.0,
    };

    /// Extent and size of a regular grid.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub width: usize,
        pub height: usize,
        pub min_lon: f64,
        pub max_lon: f64,
        pub min_lat: f64,
        pub max_lat: f64,
    }

    impl GridSpec {
        /// Number of cells.
        pub fn size(&self) -> usize {
            self.width * self.height
        }

        /// Spacing `(dlon, dlat)` in degrees.
        pub fn resolution(&self) -> (f64, f64) {
            let dx = (self.max_lon - self.min_lon) / (self.width.max(2) - 1) as f64;
            let dy = (self.max_lat - self.min_lat) / (self.height.max(2) - 1) as f64;
            (dx, dy)
        }

        /// 1-D longitude axis (ascending).
        pub fn lon_axis(&self) -> Vec<f64> {
            let (dx, _) = self.resolution();
            (0..self.width).map(|i| self.min_lon + i as f64 * dx).collect()
        }

        /// 1-D latitude axis, north to south.
        pub fn lat_axis(&self) -> Vec<f64> {
            let (_, dy) = self.resolution();
            (0..self.height).map(|j| self.max_lat - j as f64 * dy).collect()
        }
    }
}

/// Common time values for testing (`YYYY-MM-DDTHH:MM`).
pub mod time {
    /// First hour served by the regional archive.
    pub const REGIONAL_EPOCH: &str = "1997-08-01T04:00";

    /// Cycle with missing accumulated output.
    pub const LEAP_DAY_CYCLE: &str = "2020-02-29T18:00";

    /// Day with broken surface-exchange files.
    pub const BROKEN_SFX_DAY: &str = "2017-01-26T00:00";
}
