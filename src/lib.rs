mod acquire;
mod error;
mod grid;
mod pipeline;
mod profiles;
mod regions;
mod sources;
mod types;
mod utils;

pub use error::ProfileError;
pub use pipeline::*;

pub use acquire::error::AcquireError;
pub use acquire::fetcher::DatasetFetcher;

pub use grid::axis::Axis;
pub use grid::climatology::{month_axis_layers, monthly_climatology, TimeStep};
pub use grid::error::GridError;
pub use grid::monthly_grid::MonthlyGrid;
pub use grid::sample::Sample;

pub use profiles::builder::build_profiles;
pub use profiles::error::WriteError;
pub use profiles::writer::write_document;

pub use regions::boundary_loader::{load_boundaries, parse_boundaries};
pub use regions::catalog::{BoundaryFeature, RegionCatalog};
pub use regions::crs::BoundaryCrs;
pub use regions::error::RegionError;
pub use regions::identifier::{resolve_admin, resolve_id, resolve_name, synthetic_id};

pub use sources::error::SourceError;
pub use sources::geotiff::read_geotiff;
pub use sources::gridded_dataset::{read_dataset, GridInput, GriddedDataset, TemporalAxis};
pub use sources::monthly_raster::{MonthlyRasterSource, RasterArchive, RasterLayout};
pub use sources::raster::Raster;
pub use sources::temporal_grid::TemporalGridSource;
pub use sources::{ClimateSource, DynClimateSource};

pub use types::month::CalendarMonth;
pub use types::monthly_variable::MonthlyVariable;
pub use types::profile::{Profile, ProfileDocument, Provenance};
pub use types::region::{LonLat, Region};
pub use types::variable::{ClimateVariable, Unit, UnitConversion};
