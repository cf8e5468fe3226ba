//! Long-format gridded tables (`.csv` / `.parquet`): one row per cell and time step.

use crate::sources::error::SourceError;
use crate::sources::gridded_dataset::{parse_timestamp, GriddedDataset, TemporalAxis};
use chrono::NaiveDateTime;
use log::info;
use ordered_float::OrderedFloat;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const LON_COLUMNS: [&str; 2] = ["longitude", "lon"];
const LAT_COLUMNS: [&str; 2] = ["latitude", "lat"];
const TIME_COLUMNS: [&str; 2] = ["time", "valid_time"];
const MONTH_COLUMN: &str = "month";

/// Temporal key of one table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RowKey {
    Static,
    Time(NaiveDateTime),
    Month(i64),
}

/// Reads `variable` from a `.csv` or `.parquet` table at `path`.
pub fn read_table(path: &Path, variable: &str) -> Result<GriddedDataset, SourceError> {
    let table_err = |e: PolarsError| SourceError::Table(path.to_path_buf(), e);

    let df = if is_parquet(path) {
        LazyFrame::scan_parquet(path, Default::default())
            .and_then(|lf| lf.collect())
            .map_err(table_err)?
    } else {
        CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(table_err)?
    };

    let schema = df.schema();
    let lon_column = pick_column(&schema, &LON_COLUMNS).ok_or(SourceError::MissingDimension {
        path: path.to_path_buf(),
        dimension: "longitude",
    })?;
    let lat_column = pick_column(&schema, &LAT_COLUMNS).ok_or(SourceError::MissingDimension {
        path: path.to_path_buf(),
        dimension: "latitude",
    })?;
    if !schema.contains(variable) {
        return Err(SourceError::MissingVariable {
            path: path.to_path_buf(),
            variable: variable.to_string(),
        });
    }
    let time_column = pick_column(&schema, &TIME_COLUMNS);
    let has_month = schema.contains(MONTH_COLUMN);

    let mut selection = vec![
        col(lon_column).cast(DataType::Float64).alias("lon"),
        col(lat_column).cast(DataType::Float64).alias("lat"),
        col(variable).cast(DataType::Float64).alias("value"),
    ];
    if let Some(time_column) = time_column {
        selection.push(col(time_column).cast(DataType::String).alias("time"));
    } else if has_month {
        selection.push(col(MONTH_COLUMN).cast(DataType::Int64).alias("month"));
    }
    let df = df.lazy().select(selection).collect().map_err(table_err)?;

    let lons = df.column("lon").and_then(|c| c.f64()).map_err(table_err)?;
    let lats = df.column("lat").and_then(|c| c.f64()).map_err(table_err)?;
    let values = df.column("value").and_then(|c| c.f64()).map_err(table_err)?;

    let keys: Vec<RowKey> = if time_column.is_some() {
        let times = df.column("time").and_then(|c| c.str()).map_err(table_err)?;
        times
            .into_iter()
            .map(|t| {
                let raw = t.unwrap_or_default();
                parse_timestamp(raw)
                    .map(RowKey::Time)
                    .ok_or_else(|| SourceError::InvalidTime {
                        path: path.to_path_buf(),
                        value: raw.to_string(),
                    })
            })
            .collect::<Result<_, _>>()?
    } else if has_month {
        let months = df.column("month").and_then(|c| c.i64()).map_err(table_err)?;
        months
            .into_iter()
            .map(|m| RowKey::Month(m.unwrap_or(0)))
            .collect()
    } else {
        vec![RowKey::Static; df.height()]
    };

    // Rows without coordinates carry no cell and are dropped.
    let rows: Vec<(RowKey, f64, f64, f64)> = keys
        .into_iter()
        .zip(lons.into_iter().zip(lats.into_iter()).zip(values.into_iter()))
        .filter_map(|(key, ((lon, lat), value))| {
            Some((key, lon?, lat?, value.unwrap_or(f64::NAN)))
        })
        .collect();

    let lon_axis: BTreeSet<OrderedFloat<f64>> = rows.iter().map(|r| OrderedFloat(r.1)).collect();
    let lat_axis: BTreeSet<OrderedFloat<f64>> = rows.iter().map(|r| OrderedFloat(r.2)).collect();
    let lon_index: BTreeMap<OrderedFloat<f64>, usize> =
        lon_axis.iter().enumerate().map(|(i, v)| (*v, i)).collect();
    let lat_index: BTreeMap<OrderedFloat<f64>, usize> =
        lat_axis.iter().enumerate().map(|(i, v)| (*v, i)).collect();
    let cells = lon_axis.len() * lat_axis.len();

    let mut layers: BTreeMap<RowKey, Vec<f64>> = BTreeMap::new();
    for (key, lon, lat, value) in rows {
        let layer = layers.entry(key).or_insert_with(|| vec![f64::NAN; cells]);
        let cell = lat_index[&OrderedFloat(lat)] * lon_axis.len() + lon_index[&OrderedFloat(lon)];
        layer[cell] = value;
    }

    let lon: Vec<f64> = lon_axis.into_iter().map(|v| v.0).collect();
    let lat: Vec<f64> = lat_axis.into_iter().map(|v| v.0).collect();
    let keys: Vec<RowKey> = layers.keys().copied().collect();
    let layers: Vec<Vec<f64>> = layers.into_values().collect();

    let temporal = if time_column.is_some() {
        TemporalAxis::Time(
            keys.iter()
                .filter_map(|k| match k {
                    RowKey::Time(t) => Some(*t),
                    _ => None,
                })
                .collect(),
        )
    } else if has_month {
        TemporalAxis::Month(
            keys.iter()
                .filter_map(|k| match k {
                    RowKey::Month(m) => Some(*m),
                    _ => None,
                })
                .collect(),
        )
    } else {
        TemporalAxis::None
    };
    // An empty table still needs one (empty) layer for the static case.
    let layers = if matches!(temporal, TemporalAxis::None) && layers.is_empty() {
        vec![Vec::new()]
    } else {
        layers
    };

    info!(
        "Read '{}' from {:?}: {} x {} grid, {} layer(s)",
        variable,
        path,
        lat.len(),
        lon.len(),
        layers.len()
    );
    Ok(GriddedDataset::new(lon, lat, temporal, layers))
}

fn is_parquet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet"))
}

fn pick_column<'a>(schema: &Schema, candidates: &[&'a str]) -> Option<&'a str> {
    candidates.iter().copied().find(|name| schema.contains(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_time_series_table() {
        let file = csv(
            "time,latitude,longitude,t2m\n\
             2000-01-01,10,0,270\n\
             2000-01-01,10,1,271\n\
             2000-01-01,0,0,272\n\
             2000-01-01,0,1,273\n\
             2000-02-01,10,0,280\n\
             2000-02-01,10,1,281\n\
             2000-02-01,0,0,282\n",
        );
        let dataset = read_table(file.path(), "t2m").unwrap();
        assert_eq!(dataset.lon, vec![0.0, 1.0]);
        assert_eq!(dataset.lat, vec![0.0, 10.0]);
        assert_eq!(dataset.layers.len(), 2);
        // Latitude-major with ascending latitude: row 0 is latitude 0.
        assert_eq!(dataset.layers[0], vec![272.0, 273.0, 270.0, 271.0]);
        // The (lat 0, lon 1) cell has no February row.
        assert_eq!(dataset.layers[1][0], 282.0);
        assert!(dataset.layers[1][1].is_nan());
        assert_eq!(dataset.layers[1][2..], [280.0, 281.0]);
        match dataset.temporal {
            TemporalAxis::Time(times) => assert_eq!(times.len(), 2),
            other => panic!("unexpected temporal axis {:?}", other),
        }
    }

    #[test]
    fn reads_month_table_and_static_table() {
        let months = csv("lon,lat,month,tp\n5,5,1,0.1\n5,5,2,0.2\n");
        let dataset = read_table(months.path(), "tp").unwrap();
        assert_eq!(dataset.temporal, TemporalAxis::Month(vec![1, 2]));
        assert_eq!(dataset.layers, vec![vec![0.1], vec![0.2]]);

        let constant = csv("lon,lat,sst\n5,5,290\n6,5,291\n");
        let dataset = read_table(constant.path(), "sst").unwrap();
        assert_eq!(dataset.temporal, TemporalAxis::None);
        assert_eq!(dataset.layers, vec![vec![290.0, 291.0]]);
    }

    #[test]
    fn missing_columns_are_reported() {
        let file = csv("lon,lat,t2m\n0,0,1\n");
        assert!(matches!(
            read_table(file.path(), "tp"),
            Err(SourceError::MissingVariable { .. })
        ));

        let file = csv("x,lat,t2m\n0,0,1\n");
        assert!(matches!(
            read_table(file.path(), "t2m"),
            Err(SourceError::MissingDimension {
                dimension: "longitude",
                ..
            })
        ));
    }
}
