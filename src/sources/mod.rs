//! Climate data providers.
//!
//! Every provider implements [`ClimateSource`], so the profile builder never
//! needs to know which dataset format a value came from.

pub mod error;
pub mod geotiff;
pub mod gridded_dataset;
#[cfg(feature = "netcdf")]
pub mod netcdf_reader;
pub mod monthly_raster;
pub mod raster;
pub mod tabular;
pub mod temporal_grid;

use crate::grid::sample::Sample;
use crate::types::month::CalendarMonth;
use crate::types::variable::ClimateVariable;

/// Uniform point-sampling capability shared by all dataset formats.
///
/// Sources are built once (all I/O happens at construction) and are read-only
/// afterwards, so sampling is a pure in-memory lookup.
pub trait ClimateSource {
    /// Short human-readable description used for logging and provenance.
    fn describe(&self) -> String;

    /// Whether the source carries `variable` at all.
    fn provides(&self, variable: ClimateVariable) -> bool;

    /// Value of `variable` for `month` at the cell nearest to (`lon`, `lat`),
    /// converted into the variable's profile unit.
    fn sample(&self, variable: ClimateVariable, lon: f64, lat: f64, month: CalendarMonth) -> Sample;
}

/// A type-erased source, as selected by configuration at run time.
pub type DynClimateSource = Box<dyn ClimateSource + Send + Sync>;

impl<S: ClimateSource + ?Sized> ClimateSource for Box<S> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn provides(&self, variable: ClimateVariable) -> bool {
        (**self).provides(variable)
    }

    fn sample(&self, variable: ClimateVariable, lon: f64, lat: f64, month: CalendarMonth) -> Sample {
        (**self).sample(variable, lon, lat, month)
    }
}
