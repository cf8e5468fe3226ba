use crate::grid::axis::Axis;
use crate::grid::climatology::{month_axis_layers, monthly_climatology, TimeStep};
use crate::grid::error::GridError;
use crate::grid::sample::Sample;
use crate::types::month::CalendarMonth;

#[derive(Debug, Clone, PartialEq)]
enum Layers {
    /// One layer broadcast to every month.
    Constant(Vec<f64>),
    /// Twelve layers, January first.
    PerMonth(Vec<Vec<f64>>),
}

/// A monthly climatology on a regular longitude/latitude grid.
///
/// Cell values are stored latitude-major: the cell at (`lat_index`, `lon_index`)
/// lives at `lat_index * lon.len() + lon_index`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyGrid {
    lon: Axis,
    lat: Axis,
    layers: Layers,
}

impl MonthlyGrid {
    /// A grid without any time information; every month samples the same layer.
    pub fn constant(lon: Axis, lat: Axis, values: Vec<f64>) -> Result<Self, GridError> {
        check_cells(&lon, &lat, values.len())?;
        Ok(Self {
            lon,
            lat,
            layers: Layers::Constant(values),
        })
    }

    /// Twelve precomputed layers, January first.
    pub fn per_month(lon: Axis, lat: Axis, layers: Vec<Vec<f64>>) -> Result<Self, GridError> {
        if layers.len() != CalendarMonth::COUNT {
            return Err(GridError::LayerCount {
                expected: CalendarMonth::COUNT,
                found: layers.len(),
            });
        }
        for layer in &layers {
            check_cells(&lon, &lat, layer.len())?;
        }
        Ok(Self {
            lon,
            lat,
            layers: Layers::PerMonth(layers),
        })
    }

    /// Aggregates a time series into a monthly climatology.
    pub fn from_time_steps(lon: Axis, lat: Axis, steps: Vec<TimeStep>) -> Result<Self, GridError> {
        let cells = lon.len() * lat.len();
        let layers = monthly_climatology(steps, cells)?;
        Self::per_month(lon, lat, layers)
    }

    /// Places layers labelled by an explicit month coordinate.
    pub fn from_month_axis(
        lon: Axis,
        lat: Axis,
        months: &[i64],
        layers: Vec<Vec<f64>>,
    ) -> Result<Self, GridError> {
        let cells = lon.len() * lat.len();
        let layers = month_axis_layers(months, layers, cells)?;
        Self::per_month(lon, lat, layers)
    }

    /// Applies `f` to every cell, e.g. a unit conversion.
    pub fn map_values(mut self, f: impl Fn(f64) -> f64) -> Self {
        let apply = |layer: &mut Vec<f64>| layer.iter_mut().for_each(|v| *v = f(*v));
        match &mut self.layers {
            Layers::Constant(layer) => apply(layer),
            Layers::PerMonth(layers) => layers.iter_mut().for_each(apply),
        }
        self
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.layers, Layers::Constant(_))
    }

    /// (number of latitudes, number of longitudes)
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    /// Nearest-cell value for `month` at (`lon`, `lat`).
    pub fn sample(&self, month: CalendarMonth, lon: f64, lat: f64) -> Sample {
        let (Some(lon_index), Some(lat_index)) = (self.lon.nearest(lon), self.lat.nearest(lat))
        else {
            return Sample::OutOfExtent;
        };
        let cell = lat_index * self.lon.len() + lon_index;
        let layer = match &self.layers {
            Layers::Constant(layer) => layer,
            Layers::PerMonth(layers) => &layers[month.index()],
        };
        Sample::from_cell(layer[cell])
    }
}

fn check_cells(lon: &Axis, lat: &Axis, found: usize) -> Result<(), GridError> {
    let expected = lon.len() * lat.len();
    if found != expected {
        return Err(GridError::ShapeMismatch { expected, found });
    }
    Ok(())
}
