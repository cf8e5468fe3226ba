//! Reads administrative boundaries from a GeoJSON FeatureCollection.

use crate::regions::catalog::{BoundaryFeature, RegionCatalog};
use crate::regions::crs::BoundaryCrs;
use crate::regions::error::RegionError;
use geo::Geometry;
use geojson::GeoJson;
use log::{info, warn};
use std::path::{Path, PathBuf};
use tokio::{fs, task};

/// Loads a boundary file and builds the region catalog from it.
///
/// The CRS is taken from `crs_override` when given, otherwise from the file's
/// legacy `crs` member, otherwise WGS84.
pub async fn load_boundaries(
    path: &Path,
    crs_override: Option<BoundaryCrs>,
) -> Result<RegionCatalog, RegionError> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| RegionError::BoundaryRead(path.to_path_buf(), e))?;
    let path_buf = path.to_path_buf();
    let catalog =
        task::spawn_blocking(move || parse_boundaries(&text, &path_buf, crs_override)).await??;
    info!(
        "Loaded {} regions from {}",
        catalog.len(),
        path.display()
    );
    Ok(catalog)
}

/// Parses GeoJSON text into a catalog. `origin` is only used for error messages.
pub fn parse_boundaries(
    text: &str,
    origin: &Path,
    crs_override: Option<BoundaryCrs>,
) -> Result<RegionCatalog, RegionError> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e| RegionError::GeoJsonParse(origin.to_path_buf(), Box::new(e)))?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(RegionError::NotAFeatureCollection(PathBuf::from(origin)));
    };

    let crs = match crs_override {
        Some(crs) => crs,
        None => BoundaryCrs::from_foreign_members(collection.foreign_members.as_ref())?,
    };

    let mut features = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            warn!("Skipping boundary feature {} without geometry", index);
            continue;
        };
        let geometry = Geometry::<f64>::try_from(geometry.value).map_err(|e| {
            RegionError::GeometryConversion {
                index,
                source: Box::new(e),
            }
        })?;
        features.push(BoundaryFeature::new(
            geometry,
            feature.properties.unwrap_or_default(),
        ));
    }

    Ok(RegionCatalog::from_features(features, crs))
}
