//! Variable catalogue for the regional (NORA3) and global (ERA5) archives.

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, ExtractResult};

/// Which archive a variable is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveKind {
    /// Regional hourly forecast files (`*_fp.nc`).
    Regional,
    /// Regional 3-hourly surface-scheme files (`*_full_sfx.nc`).
    SurfaceExchange,
    /// Global monthly files.
    Global,
}

impl ArchiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            ArchiveKind::Regional => "regional",
            ArchiveKind::SurfaceExchange => "surface_exchange",
            ArchiveKind::Global => "global",
        }
    }
}

impl std::fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Temporal accounting convention of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// Value valid at the timestamp.
    Instantaneous,
    /// Running sum since the cycle start.
    Accumulated,
}

/// File group of a global variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalGroup {
    Atmosphere,
    Wave,
}

/// Regional instantaneous parameters served from the hourly files.
pub const REGIONAL_INSTANTANEOUS: &[&str] = &[
    "air_pressure_at_sea_level",
    "x_wind_10m",
    "y_wind_10m",
    "air_temperature_2m",
    "relative_humidity_2m",
    "cloud_area_fraction",
    "convective_cloud_area_fraction",
    "high_type_cloud_area_fraction",
    "medium_type_cloud_area_fraction",
    "low_type_cloud_area_fraction",
    "lwe_thickness_of_atmosphere_mass_content_of_water_vapor",
];

/// Regional parameters stored as accumulations since cycle start.
pub const REGIONAL_ACCUMULATED: &[&str] = &[
    "integral_of_toa_net_downward_shortwave_flux_wrt_time",
    "integral_of_surface_net_downward_shortwave_flux_wrt_time",
    "integral_of_surface_downwelling_shortwave_flux_in_air_wrt_time",
    "snowfall_amount_acc",
    "precipitation_amount_acc",
];

/// Surface-scheme parameters, 3-hourly.
pub const SURFACE_EXCHANGE: &[&str] = &["ASN_VEG", "TALB_ISBA", "LAI", "VEG"];

pub const GLOBAL_ATMOSPHERE: &[&str] = &["msl", "u10", "v10"];
pub const GLOBAL_WAVE: &[&str] = &["msl", "mwd", "mp2", "pp1d", "swh"];

/// Regional equivalent of a global parameter name, if one exists.
pub fn regional_name_for_global(param: &str) -> Option<&'static str> {
    match param {
        "msl" => Some("air_pressure_at_sea_level"),
        "u10" => Some("x_wind_10m"),
        "v10" => Some("y_wind_10m"),
        _ => None,
    }
}

/// A resolved parameter with its archive and temporal properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Name of the variable inside the archive files.
    pub name: String,
    pub kind: VariableKind,
    pub archive: ArchiveKind,
    /// Hours between consecutive stored samples.
    pub native_step_hours: u32,
    /// Set for global variables only.
    pub global_group: Option<GlobalGroup>,
}

impl Variable {
    /// Look up a regional parameter (hourly or surface-exchange).
    pub fn regional(name: &str) -> ExtractResult<Self> {
        if REGIONAL_INSTANTANEOUS.contains(&name) {
            return Ok(Self::new(name, VariableKind::Instantaneous, ArchiveKind::Regional, 1));
        }
        if REGIONAL_ACCUMULATED.contains(&name) {
            return Ok(Self::new(name, VariableKind::Accumulated, ArchiveKind::Regional, 1));
        }
        if SURFACE_EXCHANGE.contains(&name) {
            return Ok(Self::new(
                name,
                VariableKind::Instantaneous,
                ArchiveKind::SurfaceExchange,
                3,
            ));
        }
        Err(ExtractError::undefined_parameter(name, "regional"))
    }

    /// Look up a global parameter. `prefer_atmosphere` selects the atmosphere
    /// files for parameters present in both groups.
    pub fn global(name: &str, prefer_atmosphere: bool) -> ExtractResult<Self> {
        let group = if prefer_atmosphere && GLOBAL_ATMOSPHERE.contains(&name) {
            GlobalGroup::Atmosphere
        } else if GLOBAL_WAVE.contains(&name) {
            GlobalGroup::Wave
        } else if GLOBAL_ATMOSPHERE.contains(&name) {
            return Err(ExtractError::undefined_parameter(
                format!("{} (not in wave files, use atmosphere files)", name),
                "global",
            ));
        } else {
            return Err(ExtractError::undefined_parameter(name, "global"));
        };

        let mut variable = Self::new(name, VariableKind::Instantaneous, ArchiveKind::Global, 1);
        variable.global_group = Some(group);
        Ok(variable)
    }

    /// Whether `name` is known to either global file group.
    pub fn is_global_name(name: &str) -> bool {
        GLOBAL_ATMOSPHERE.contains(&name) || GLOBAL_WAVE.contains(&name)
    }

    fn new(name: &str, kind: VariableKind, archive: ArchiveKind, native_step_hours: u32) -> Self {
        Self {
            name: name.to_string(),
            kind,
            archive,
            native_step_hours,
            global_group: None,
        }
    }

    pub fn is_accumulated(&self) -> bool {
        self.kind == VariableKind::Accumulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regional_lookup() {
        let v = Variable::regional("precipitation_amount_acc").unwrap();
        assert!(v.is_accumulated());
        assert_eq!(v.archive, ArchiveKind::Regional);
        assert_eq!(v.native_step_hours, 1);

        let v = Variable::regional("air_temperature_2m").unwrap();
        assert_eq!(v.kind, VariableKind::Instantaneous);
    }

    #[test]
    fn test_surface_exchange_is_three_hourly() {
        for name in SURFACE_EXCHANGE {
            let v = Variable::regional(name).unwrap();
            assert_eq!(v.archive, ArchiveKind::SurfaceExchange);
            assert_eq!(v.native_step_hours, 3);
        }
    }

    #[test]
    fn test_undefined_regional_parameter() {
        let err = Variable::regional("swh").unwrap_err();
        assert!(matches!(err, ExtractError::UndefinedParameter { .. }));
    }

    #[test]
    fn test_global_groups() {
        assert_eq!(
            Variable::global("msl", true).unwrap().global_group,
            Some(GlobalGroup::Atmosphere)
        );
        assert_eq!(
            Variable::global("msl", false).unwrap().global_group,
            Some(GlobalGroup::Wave)
        );
        assert_eq!(
            Variable::global("swh", true).unwrap().global_group,
            Some(GlobalGroup::Wave)
        );
        assert!(Variable::global("u10", false).is_err());
        assert!(Variable::global("t2m", true).is_err());
    }

    #[test]
    fn test_global_to_regional_names() {
        assert_eq!(regional_name_for_global("msl"), Some("air_pressure_at_sea_level"));
        assert_eq!(regional_name_for_global("u10"), Some("x_wind_10m"));
        assert_eq!(regional_name_for_global("v10"), Some("y_wind_10m"));
        assert_eq!(regional_name_for_global("swh"), None);
    }
}
