//! Coordinate reference systems accepted for boundary geometries and the
//! transformation of those geometries into geographic lon/lat.

use crate::regions::error::RegionError;
use geo::{Coord, Geometry, MapCoords};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// WGS84 semi-major axis used by the spherical Web Mercator projection.
const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryCrs {
    /// Geographic longitude/latitude (EPSG:4326, OGC CRS84).
    #[default]
    Wgs84,
    /// Spherical Web Mercator in metres (EPSG:3857).
    WebMercator,
}

impl BoundaryCrs {
    /// Reads the legacy GeoJSON `crs` member, e.g.
    /// `{"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3857"}}`.
    ///
    /// Files without a `crs` member are WGS84 per RFC 7946.
    pub fn from_foreign_members(members: Option<&Map<String, Value>>) -> Result<Self, RegionError> {
        let name = members
            .and_then(|m| m.get("crs"))
            .and_then(|crs| crs.get("properties"))
            .and_then(|props| props.get("name"))
            .and_then(Value::as_str);
        match name {
            Some(name) => name.parse(),
            None => Ok(BoundaryCrs::Wgs84),
        }
    }

    /// Returns `geometry` expressed in geographic lon/lat.
    pub fn to_geographic(&self, geometry: Geometry<f64>) -> Geometry<f64> {
        match self {
            BoundaryCrs::Wgs84 => geometry,
            BoundaryCrs::WebMercator => geometry.map_coords(inverse_web_mercator),
        }
    }
}

fn inverse_web_mercator(c: Coord<f64>) -> Coord<f64> {
    let lon = (c.x / WEB_MERCATOR_RADIUS).to_degrees();
    let lat = (2.0 * (c.y / WEB_MERCATOR_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2)
        .to_degrees();
    Coord { x: lon, y: lat }
}

impl FromStr for BoundaryCrs {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_uppercase();
        let code = normalised
            .rsplit(|c| c == ':' || c == '/')
            .next()
            .unwrap_or_default();
        match code {
            "4326" | "CRS84" | "WGS84" => Ok(BoundaryCrs::Wgs84),
            "3857" | "900913" | "3785" => Ok(BoundaryCrs::WebMercator),
            _ => Err(RegionError::UnsupportedCrs(s.to_string())),
        }
    }
}

impl fmt::Display for BoundaryCrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryCrs::Wgs84 => write!(f, "EPSG:4326"),
            BoundaryCrs::WebMercator => write!(f, "EPSG:3857"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;
    use serde_json::json;

    #[test]
    fn parses_common_crs_spellings() {
        assert_eq!("EPSG:4326".parse::<BoundaryCrs>().unwrap(), BoundaryCrs::Wgs84);
        assert_eq!(
            "urn:ogc:def:crs:OGC:1.3:CRS84".parse::<BoundaryCrs>().unwrap(),
            BoundaryCrs::Wgs84
        );
        assert_eq!(
            "urn:ogc:def:crs:EPSG::3857".parse::<BoundaryCrs>().unwrap(),
            BoundaryCrs::WebMercator
        );
        assert!(matches!(
            "EPSG:32633".parse::<BoundaryCrs>(),
            Err(RegionError::UnsupportedCrs(_))
        ));
    }

    #[test]
    fn missing_crs_member_defaults_to_wgs84() {
        assert_eq!(BoundaryCrs::from_foreign_members(None).unwrap(), BoundaryCrs::Wgs84);
        let members = json!({"crs": {"type": "name", "properties": {"name": "EPSG:3857"}}});
        assert_eq!(
            BoundaryCrs::from_foreign_members(members.as_object()).unwrap(),
            BoundaryCrs::WebMercator
        );
    }

    #[test]
    fn web_mercator_inverse_projects_known_points() {
        let origin = BoundaryCrs::WebMercator.to_geographic(Geometry::Point(Point::new(0.0, 0.0)));
        let Geometry::Point(p) = origin else { panic!("expected point") };
        assert!(p.x().abs() < 1e-12 && p.y().abs() < 1e-12);

        // x = R * pi maps to the antimeridian.
        let edge = BoundaryCrs::WebMercator.to_geographic(Geometry::Point(Point::new(
            WEB_MERCATOR_RADIUS * std::f64::consts::PI,
            0.0,
        )));
        let Geometry::Point(p) = edge else { panic!("expected point") };
        assert!((p.x() - 180.0).abs() < 1e-9);

        // y = R * ln(tan(pi/4 + lat/2)) for lat = 45 degrees.
        let y = WEB_MERCATOR_RADIUS * (std::f64::consts::FRAC_PI_4 + 45f64.to_radians() / 2.0).tan().ln();
        let north = BoundaryCrs::WebMercator.to_geographic(Geometry::Point(Point::new(0.0, y)));
        let Geometry::Point(p) = north else { panic!("expected point") };
        assert!((p.y() - 45.0).abs() < 1e-9);
    }
}
