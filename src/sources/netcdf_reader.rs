//! NetCDF (CF conventions) reader, compiled with the `netcdf` feature.

use crate::sources::error::SourceError;
use crate::sources::gridded_dataset::{parse_timestamp, GriddedDataset, TemporalAxis};
use chrono::{Duration, NaiveDateTime};
use log::info;
use netcdf::AttributeValue;
use std::path::Path;

const LON_NAMES: [&str; 2] = ["longitude", "lon"];
const LAT_NAMES: [&str; 2] = ["latitude", "lat"];
const TIME_NAMES: [&str; 2] = ["time", "valid_time"];
const MONTH_NAME: &str = "month";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DimensionRole {
    Lon,
    Lat,
    Time,
    Month,
}

fn role_of(name: &str) -> Option<DimensionRole> {
    if LON_NAMES.contains(&name) {
        Some(DimensionRole::Lon)
    } else if LAT_NAMES.contains(&name) {
        Some(DimensionRole::Lat)
    } else if TIME_NAMES.contains(&name) {
        Some(DimensionRole::Time)
    } else if name == MONTH_NAME {
        Some(DimensionRole::Month)
    } else {
        None
    }
}

/// Reads `variable` laid out as `[time|month]?, lat, lon` (singleton extra
/// dimensions such as `expver` or `number` are ignored).
pub fn read_netcdf(path: &Path, variable: &str) -> Result<GriddedDataset, SourceError> {
    let nc_err = |e: netcdf::Error| SourceError::Netcdf(path.to_path_buf(), e);
    let file = netcdf::open(path).map_err(nc_err)?;
    let var = file
        .variable(variable)
        .ok_or_else(|| SourceError::MissingVariable {
            path: path.to_path_buf(),
            variable: variable.to_string(),
        })?;

    let dimensions: Vec<(String, usize)> = var
        .dimensions()
        .iter()
        .map(|d| (d.name().to_string(), d.len()))
        .collect();
    let layout_err = || SourceError::UnsupportedLayout {
        path: path.to_path_buf(),
        dimensions: dimensions.iter().map(|(name, _)| name.clone()).collect(),
    };

    let mut roles = Vec::new();
    for (name, len) in &dimensions {
        match role_of(name) {
            Some(role) => roles.push(role),
            None if *len == 1 => {}
            None => return Err(layout_err()),
        }
    }
    let temporal_role = match roles.as_slice() {
        [DimensionRole::Lat, DimensionRole::Lon] => None,
        [role @ (DimensionRole::Time | DimensionRole::Month), DimensionRole::Lat, DimensionRole::Lon] => {
            Some(*role)
        }
        _ => return Err(layout_err()),
    };

    let lon = read_coordinate(&file, path, &LON_NAMES, "longitude")?;
    let lat = read_coordinate(&file, path, &LAT_NAMES, "latitude")?;

    let raw: Vec<f64> = var.get_values::<f64, _>(..).map_err(nc_err)?;
    let scale = numeric_attribute(&var, "scale_factor").unwrap_or(1.0);
    let offset = numeric_attribute(&var, "add_offset").unwrap_or(0.0);
    let fill_values: Vec<f64> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|name| numeric_attribute(&var, name))
        .collect();
    let values: Vec<f64> = raw
        .into_iter()
        .map(|v| {
            if v.is_nan() || fill_values.iter().any(|f| *f == v) {
                f64::NAN
            } else {
                v * scale + offset
            }
        })
        .collect();

    let cells = lon.len() * lat.len();
    if cells == 0 || values.len() % cells != 0 {
        return Err(layout_err());
    }
    let layers: Vec<Vec<f64>> = values.chunks(cells).map(|chunk| chunk.to_vec()).collect();

    let temporal = match temporal_role {
        None => TemporalAxis::None,
        Some(DimensionRole::Month) => {
            let months = read_coordinate(&file, path, &[MONTH_NAME], "month")?;
            TemporalAxis::Month(months.into_iter().map(|m| m.round() as i64).collect())
        }
        Some(_) => TemporalAxis::Time(read_time(&file, path)?),
    };

    info!(
        "Opened '{}' from {:?}: {} x {} grid, {} time step(s)",
        variable,
        path,
        lat.len(),
        lon.len(),
        layers.len()
    );
    Ok(GriddedDataset::new(lon, lat, temporal, layers))
}

fn read_coordinate(
    file: &netcdf::File,
    path: &Path,
    names: &[&str],
    dimension: &'static str,
) -> Result<Vec<f64>, SourceError> {
    let var = names
        .iter()
        .find_map(|name| file.variable(name))
        .ok_or(SourceError::MissingDimension {
            path: path.to_path_buf(),
            dimension,
        })?;
    var.get_values::<f64, _>(..)
        .map_err(|e| SourceError::Netcdf(path.to_path_buf(), e))
}

fn read_time(file: &netcdf::File, path: &Path) -> Result<Vec<NaiveDateTime>, SourceError> {
    let var = TIME_NAMES
        .iter()
        .find_map(|name| file.variable(name))
        .ok_or(SourceError::MissingDimension {
            path: path.to_path_buf(),
            dimension: "time",
        })?;
    let units = match var.attribute("units").and_then(|a| a.value().ok()) {
        Some(AttributeValue::Str(units)) => units,
        _ => {
            return Err(SourceError::UnsupportedTimeUnits {
                path: path.to_path_buf(),
                units: String::new(),
            })
        }
    };
    let offsets: Vec<f64> = var
        .get_values::<f64, _>(..)
        .map_err(|e| SourceError::Netcdf(path.to_path_buf(), e))?;
    decode_cf_time(&units, &offsets).ok_or_else(|| SourceError::UnsupportedTimeUnits {
        path: path.to_path_buf(),
        units,
    })
}

/// Decodes CF `"<unit> since <reference>"` offsets into timestamps.
pub(crate) fn decode_cf_time(units: &str, offsets: &[f64]) -> Option<Vec<NaiveDateTime>> {
    let (unit, reference) = units.split_once(" since ")?;
    let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "seconds" | "second" | "s" => 1.0,
        "minutes" | "minute" | "min" => 60.0,
        "hours" | "hour" | "h" => 3600.0,
        "days" | "day" | "d" => 86_400.0,
        _ => return None,
    };
    let reference = parse_timestamp(reference)?;
    offsets
        .iter()
        .map(|offset| {
            let seconds = offset * seconds_per_unit;
            if !seconds.is_finite() {
                return None;
            }
            reference.checked_add_signed(Duration::try_seconds(seconds.round() as i64)?)
        })
        .collect()
}

fn numeric_attribute(var: &netcdf::Variable, name: &str) -> Option<f64> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(v as f64),
        AttributeValue::Short(v) => Some(v as f64),
        AttributeValue::Ushort(v) => Some(v as f64),
        AttributeValue::Int(v) => Some(v as f64),
        AttributeValue::Uint(v) => Some(v as f64),
        AttributeValue::Longlong(v) => Some(v as f64),
        AttributeValue::Ulonglong(v) => Some(v as f64),
        AttributeValue::Schar(v) => Some(v as f64),
        AttributeValue::Uchar(v) => Some(v as f64),
        _ => None,
    }
}
