//! A decoded gridded variable, independent of the file format it was read from.

use crate::grid::axis::Axis;
use crate::grid::climatology::TimeStep;
use crate::grid::error::GridError;
use crate::grid::monthly_grid::MonthlyGrid;
use crate::sources::error::SourceError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};

/// Where to read one variable from.
#[derive(Debug, Clone, PartialEq)]
pub struct GridInput {
    pub path: PathBuf,
    /// Variable name inside the file (NetCDF variable or table column).
    pub variable: String,
}

impl GridInput {
    pub fn new(path: impl Into<PathBuf>, variable: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            variable: variable.into(),
        }
    }
}

/// The non-spatial leading axis of a gridded variable.
#[derive(Debug, Clone, PartialEq)]
pub enum TemporalAxis {
    /// A single layer valid for every month.
    None,
    /// One layer per time step.
    Time(Vec<NaiveDateTime>),
    /// One layer per calendar month label (1..=12).
    Month(Vec<i64>),
}

impl TemporalAxis {
    pub fn len(&self) -> usize {
        match self {
            TemporalAxis::None => 1,
            TemporalAxis::Time(times) => times.len(),
            TemporalAxis::Month(months) => months.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Raw (unconverted) values of one variable on a lon/lat grid.
///
/// `layers[i]` holds the grid for the i-th entry of `temporal`, latitude-major.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedDataset {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub temporal: TemporalAxis,
    pub layers: Vec<Vec<f64>>,
}

impl GriddedDataset {
    pub fn new(
        lon: Vec<f64>,
        lat: Vec<f64>,
        temporal: TemporalAxis,
        layers: Vec<Vec<f64>>,
    ) -> Self {
        Self {
            lon,
            lat,
            temporal,
            layers,
        }
    }

    /// Reduces the dataset to a monthly climatology grid.
    ///
    /// A time axis is aggregated by calendar month, a month axis is placed by
    /// label, and a dataset without either is broadcast to all months.
    pub fn into_monthly_grid(self) -> Result<MonthlyGrid, GridError> {
        let lon = Axis::longitude(self.lon)?;
        let lat = Axis::latitude(self.lat)?;
        if self.layers.len() != self.temporal.len() {
            return Err(GridError::LayerCount {
                expected: self.temporal.len(),
                found: self.layers.len(),
            });
        }
        match self.temporal {
            TemporalAxis::None => {
                let layer = self.layers.into_iter().next().unwrap_or_default();
                MonthlyGrid::constant(lon, lat, layer)
            }
            TemporalAxis::Time(times) => {
                let steps = times
                    .into_iter()
                    .zip(self.layers)
                    .map(|(time, values)| TimeStep::new(time, values))
                    .collect();
                MonthlyGrid::from_time_steps(lon, lat, steps)
            }
            TemporalAxis::Month(months) => {
                MonthlyGrid::from_month_axis(lon, lat, &months, self.layers)
            }
        }
    }
}

/// Reads `input` with the reader matching its file extension.
pub fn read_dataset(input: &GridInput) -> Result<GriddedDataset, SourceError> {
    let path = input.path.as_path();
    if !path.is_file() {
        return Err(SourceError::DatasetOpen(
            path.to_path_buf(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "dataset file not found"),
        ));
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("csv") | Some("parquet") => crate::sources::tabular::read_table(path, &input.variable),
        Some("nc") | Some("nc4") | Some("netcdf") => read_netcdf(path, &input.variable),
        _ => Err(SourceError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(feature = "netcdf")]
fn read_netcdf(path: &Path, variable: &str) -> Result<GriddedDataset, SourceError> {
    crate::sources::netcdf_reader::read_netcdf(path, variable)
}

#[cfg(not(feature = "netcdf"))]
fn read_netcdf(path: &Path, _variable: &str) -> Result<GriddedDataset, SourceError> {
    Err(SourceError::NetcdfDisabled(path.to_path_buf()))
}

/// Parses the date/time spellings found in dataset time columns and CF units.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    let without_zone = value.trim_end_matches('Z').trim_end_matches(" UTC");
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(without_zone, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(without_zone, "%Y-%m-%d")
                .ok()
                .or_else(|| NaiveDate::parse_from_str(&format!("{}-01", without_zone), "%Y-%m-%d").ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::sample::Sample;
    use crate::types::month::CalendarMonth;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_common_timestamp_spellings() {
        let expect = |s: &str, month: u32, hour: u32| {
            let parsed = parse_timestamp(s).unwrap_or_else(|| panic!("failed to parse {}", s));
            assert_eq!(parsed.month(), month, "{}", s);
            assert_eq!(parsed.hour(), hour, "{}", s);
        };
        expect("1991-02-01", 2, 0);
        expect("1991-02", 2, 0);
        expect("1991-03-01 06:00:00", 3, 6);
        expect("1991-03-01T06:00:00", 3, 6);
        expect("1991-03-01T06:00:00Z", 3, 6);
        expect("1900-01-01 00:00:00.0", 1, 0);
        expect("2020-12-01 12:00:00.000000", 12, 12);
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn dataset_without_time_is_broadcast() {
        let dataset = GriddedDataset::new(
            vec![0.0, 1.0],
            vec![0.0],
            TemporalAxis::None,
            vec![vec![5.0, 6.0]],
        );
        let grid = dataset.into_monthly_grid().unwrap();
        assert!(grid.is_constant());
        for month in CalendarMonth::all() {
            assert_eq!(grid.sample(month, 1.0, 0.0), Sample::Value(6.0));
        }
    }

    #[test]
    fn layer_count_must_match_temporal_axis() {
        let dataset = GriddedDataset::new(
            vec![0.0],
            vec![0.0],
            TemporalAxis::Month(vec![1, 2]),
            vec![vec![1.0]],
        );
        assert_eq!(
            dataset.into_monthly_grid(),
            Err(GridError::LayerCount {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn unknown_extension_and_missing_file_are_errors() {
        let missing = read_dataset(&GridInput::new("/nonexistent/t2m.nc", "t2m"));
        assert!(matches!(missing, Err(SourceError::DatasetOpen(_, _))));

        let file = tempfile::Builder::new().suffix(".grib").tempfile().unwrap();
        let unsupported = read_dataset(&GridInput::new(file.path(), "t2m"));
        assert!(matches!(unsupported, Err(SourceError::UnsupportedFormat(_))));
    }

    #[cfg(not(feature = "netcdf"))]
    #[test]
    fn netcdf_without_feature_names_the_build_flag() {
        let file = tempfile::Builder::new().suffix(".nc").tempfile().unwrap();
        let err = read_dataset(&GridInput::new(file.path(), "t2m")).unwrap_err();
        assert!(matches!(err, SourceError::NetcdfDisabled(_)));
        assert!(err.to_string().contains("--features netcdf"));
    }
}
