use crate::grid::error::GridError;

/// Tolerance used when deciding whether a longitude axis spans the full circle.
const GLOBAL_SPAN_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LongitudeConvention {
    /// Longitudes in [-180, 180).
    Signed,
    /// Longitudes in [0, 360).
    Positive,
}

/// A strictly monotonic coordinate axis of cell centres.
///
/// Coordinates may run in either direction; reanalysis latitudes usually run
/// north to south. Internally the coordinates are kept ascending and indices
/// are mapped back to the original order.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    name: &'static str,
    ascending: Vec<f64>,
    reversed: bool,
    longitude: Option<LongitudeConvention>,
    global: bool,
}

impl Axis {
    /// Creates a plain (non-wrapping) axis, e.g. latitude.
    pub fn new(name: &'static str, coords: Vec<f64>) -> Result<Self, GridError> {
        if coords.is_empty() {
            return Err(GridError::EmptyAxis(name));
        }
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(GridError::NonFiniteAxis(name));
        }
        let increasing = coords.windows(2).all(|w| w[1] > w[0]);
        let decreasing = coords.windows(2).all(|w| w[1] < w[0]);
        let (ascending, reversed) = if increasing {
            (coords, false)
        } else if decreasing {
            (coords.into_iter().rev().collect(), true)
        } else {
            return Err(GridError::NonMonotonicAxis(name));
        };
        Ok(Self {
            name,
            ascending,
            reversed,
            longitude: None,
            global: false,
        })
    }

    /// Creates a longitude axis. Query longitudes are normalised into the
    /// axis convention (0–360 or −180–180) and a full-circle axis wraps at the seam.
    pub fn longitude(coords: Vec<f64>) -> Result<Self, GridError> {
        let mut axis = Self::new("longitude", coords)?;
        let max = axis.ascending[axis.ascending.len() - 1];
        axis.longitude = Some(if max > 180.0 {
            LongitudeConvention::Positive
        } else {
            LongitudeConvention::Signed
        });
        if axis.ascending.len() >= 2 {
            let step = axis.ascending[1] - axis.ascending[0];
            let span = max - axis.ascending[0];
            axis.global = span + step >= 360.0 - GLOBAL_SPAN_TOLERANCE;
        }
        Ok(axis)
    }

    /// Creates a latitude axis.
    pub fn latitude(coords: Vec<f64>) -> Result<Self, GridError> {
        Self::new("latitude", coords)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.ascending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ascending.is_empty()
    }

    /// Coordinate at `index` in the axis' original order.
    pub fn coord(&self, index: usize) -> f64 {
        self.ascending[self.to_ascending(index)]
    }

    /// Lower and upper bound of the area covered by the axis cells.
    ///
    /// A single-coordinate axis has no cell size and covers everything.
    pub fn extent(&self) -> (f64, f64) {
        let n = self.ascending.len();
        if n == 1 {
            return (f64::NEG_INFINITY, f64::INFINITY);
        }
        let a = &self.ascending;
        (
            a[0] - (a[1] - a[0]) / 2.0,
            a[n - 1] + (a[n - 1] - a[n - 2]) / 2.0,
        )
    }

    /// Index (in original order) of the coordinate closest to `x`, or `None`
    /// when `x` lies outside the axis extent. Exact midpoints resolve toward the
    /// lower coordinate value. On a regional longitude axis the query is also
    /// tried one turn east and west, so extents reaching past ±180 still match.
    pub fn nearest(&self, x: f64) -> Option<usize> {
        if !x.is_finite() {
            return None;
        }
        let x = self.normalise(x);
        let a = &self.ascending;
        let n = a.len();
        if n == 1 {
            return Some(0);
        }

        if self.global && (x < a[0] || x > a[n - 1]) {
            let to_first = (a[0] - x).rem_euclid(360.0);
            let to_last = (x - a[n - 1]).rem_euclid(360.0);
            let ascending_index = if to_last <= to_first { n - 1 } else { 0 };
            return Some(self.to_original(ascending_index));
        }

        let (low, high) = self.extent();
        let candidates = [x, x + 360.0, x - 360.0];
        let tries = if self.longitude.is_some() { 3 } else { 1 };
        let x = candidates[..tries]
            .iter()
            .copied()
            .find(|c| (low..=high).contains(c))?;

        let upper = a.partition_point(|&c| c < x);
        let ascending_index = if upper == 0 {
            0
        } else if upper == n {
            n - 1
        } else if x - a[upper - 1] <= a[upper] - x {
            upper - 1
        } else {
            upper
        };
        Some(self.to_original(ascending_index))
    }

    fn normalise(&self, x: f64) -> f64 {
        match self.longitude {
            None => x,
            Some(LongitudeConvention::Positive) => x.rem_euclid(360.0),
            Some(LongitudeConvention::Signed) => (x + 180.0).rem_euclid(360.0) - 180.0,
        }
    }

    fn to_original(&self, ascending_index: usize) -> usize {
        if self.reversed {
            self.ascending.len() - 1 - ascending_index
        } else {
            ascending_index
        }
    }

    fn to_ascending(&self, index: usize) -> usize {
        // The mapping is its own inverse.
        self.to_original(index)
    }
}
