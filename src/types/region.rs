//! Defines the administrative region records held by a [`crate::RegionCatalog`],
//! together with the geographic point type used for sampling.

use geo::{Geometry, Point};
use serde::{Deserialize, Serialize};

/// A geographic coordinate in decimal degrees, longitude first.
///
/// # Examples
///
/// ```
/// use climate_profiles::LonLat;
///
/// let lisbon = LonLat::new(-9.14, 38.72);
/// assert_eq!(lisbon.lon, -9.14);
/// assert_eq!(lisbon.lat, 38.72);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    /// Longitude in decimal degrees (positive east).
    pub lon: f64,
    /// Latitude in decimal degrees (positive north).
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<Point<f64>> for LonLat {
    fn from(point: Point<f64>) -> Self {
        Self::new(point.x(), point.y())
    }
}

/// A single administrative region (e.g. a first-level subdivision) ready for sampling.
///
/// Regions are created by [`crate::RegionCatalog`] from boundary features. The
/// geometry is always in geographic coordinates (EPSG:4326 axis order lon/lat).
#[derive(Debug, Clone)]
pub struct Region {
    /// Identifier, unique within its catalog.
    pub id: String,
    /// Display name (English name when the boundary source has one).
    pub name: Option<String>,
    /// Name of the parent administrative unit, typically the country.
    pub admin: Option<String>,
    /// Region outline in geographic coordinates.
    pub geometry: Geometry<f64>,
    /// The point every climate variable is sampled at.
    ///
    /// This is the geometric centroid of `geometry`, computed once when the
    /// catalog is built. For concave or multi-part shapes it may fall outside
    /// the region itself.
    pub sample_point: LonLat,
}
