//! Defines the climate variables a profile carries, their units, and the unit
//! conversions applied when raw dataset values are normalised.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A climate variable sampled into a region profile.
///
/// Temperature and precipitation are mandatory for every source. Sea-surface
/// temperature is optional and may be permanently absent for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClimateVariable {
    /// Mean near-surface air temperature (2 m).
    Temperature,
    /// Precipitation amount.
    Precipitation,
    /// Sea-surface temperature.
    SeaSurfaceTemperature,
}

impl ClimateVariable {
    /// The key used for this variable in the output document.
    pub fn profile_key(&self) -> &'static str {
        match self {
            ClimateVariable::Temperature => "tmean",
            ClimateVariable::Precipitation => "prcp",
            ClimateVariable::SeaSurfaceTemperature => "sst",
        }
    }

    /// The variable name used by ERA5 / ERA5-Land files.
    pub fn default_dataset_name(&self) -> &'static str {
        match self {
            ClimateVariable::Temperature => "t2m",
            ClimateVariable::Precipitation => "tp",
            ClimateVariable::SeaSurfaceTemperature => "sst",
        }
    }

    pub fn unit(&self) -> Unit {
        match self {
            ClimateVariable::Temperature | ClimateVariable::SeaSurfaceTemperature => {
                Unit::Celsius
            }
            ClimateVariable::Precipitation => Unit::Millimetres,
        }
    }

    pub fn is_mandatory(&self) -> bool {
        !matches!(self, ClimateVariable::SeaSurfaceTemperature)
    }
}

impl fmt::Display for ClimateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.profile_key())
    }
}

/// Unit tag of a normalised monthly value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Celsius,
    Millimetres,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Celsius => write!(f, "°C"),
            Unit::Millimetres => write!(f, "mm"),
        }
    }
}

/// Conversion from a dataset's stored unit into the profile unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitConversion {
    /// Values are already stored in the profile unit.
    Identity,
    /// Kelvin to degrees Celsius (subtract 273.15).
    KelvinToCelsius,
    /// Metres to millimetres (multiply by 1000).
    MetresToMillimetres,
    /// Values stored as an integer multiple of the unit, e.g. °C×10.
    Divide(f64),
}

impl UnitConversion {
    pub const KELVIN_OFFSET: f64 = 273.15;

    /// The conversion applied to reanalysis values of `variable`.
    pub fn for_reanalysis(variable: ClimateVariable) -> Self {
        match variable {
            ClimateVariable::Temperature | ClimateVariable::SeaSurfaceTemperature => {
                UnitConversion::KelvinToCelsius
            }
            ClimateVariable::Precipitation => UnitConversion::MetresToMillimetres,
        }
    }

    pub fn apply(&self, raw: f64) -> f64 {
        match self {
            UnitConversion::Identity => raw,
            UnitConversion::KelvinToCelsius => raw - Self::KELVIN_OFFSET,
            UnitConversion::MetresToMillimetres => raw * 1000.0,
            UnitConversion::Divide(divisor) => raw / divisor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reanalysis_conversions_match_variable_units() {
        let t = UnitConversion::for_reanalysis(ClimateVariable::Temperature);
        assert_eq!(t.apply(273.15), 0.0);
        assert_eq!(t.apply(300.0), 300.0 - 273.15);

        let p = UnitConversion::for_reanalysis(ClimateVariable::Precipitation);
        assert_eq!(p.apply(0.0025), 0.0025 * 1000.0);

        let sst = UnitConversion::for_reanalysis(ClimateVariable::SeaSurfaceTemperature);
        assert_eq!(sst, UnitConversion::KelvinToCelsius);
    }

    #[test]
    fn divide_conversion_handles_tenths() {
        let c = UnitConversion::Divide(10.0);
        assert_eq!(c.apply(215.0), 21.5);
        assert_eq!(c.apply(-35.0), -3.5);
    }

    #[test]
    fn only_sst_is_optional() {
        assert!(ClimateVariable::Temperature.is_mandatory());
        assert!(ClimateVariable::Precipitation.is_mandatory());
        assert!(!ClimateVariable::SeaSurfaceTemperature.is_mandatory());
        assert_eq!(ClimateVariable::Precipitation.to_string(), "prcp");
        assert_eq!(ClimateVariable::Temperature.unit().to_string(), "°C");
    }
}
