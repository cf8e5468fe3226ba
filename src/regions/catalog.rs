use crate::regions::crs::BoundaryCrs;
use crate::regions::identifier::{resolve_admin, resolve_id, resolve_name, synthetic_id};
use crate::types::region::{LonLat, Region};
use geo::{Centroid, Geometry};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// A parsed boundary feature: geometry in its source CRS plus its attribute table.
#[derive(Debug, Clone)]
pub struct BoundaryFeature {
    pub geometry: Geometry<f64>,
    pub properties: Map<String, Value>,
}

impl BoundaryFeature {
    pub fn new(geometry: Geometry<f64>, properties: Map<String, Value>) -> Self {
        Self {
            geometry,
            properties,
        }
    }
}

/// The ordered set of regions to profile.
///
/// Built once from boundary features; each region's sample point is computed at
/// construction and never changes afterwards.
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    regions: Vec<Region>,
}

impl RegionCatalog {
    /// Builds the catalog from boundary features in iteration order.
    ///
    /// Geometries are reprojected from `crs` to geographic coordinates. A feature
    /// without any identifier candidate receives a synthetic `region-<index>` id,
    /// where `index` is its position in the catalog. A repeated identifier is
    /// disambiguated as `<id>#<n>` with the smallest `n >= 2` not already taken.
    /// Features whose geometry has no centroid (empty geometries) are skipped.
    pub fn from_features(features: Vec<BoundaryFeature>, crs: BoundaryCrs) -> Self {
        let mut regions = Vec::with_capacity(features.len());
        let mut used: HashSet<String> = HashSet::new();
        let mut next_suffix: HashMap<String, usize> = HashMap::new();

        for (index, feature) in features.into_iter().enumerate() {
            let geometry = crs.to_geographic(feature.geometry);
            let Some(centroid) = geometry.centroid() else {
                warn!("Skipping boundary feature {} with empty geometry", index);
                continue;
            };

            let base_id = match resolve_id(&feature.properties) {
                Some(id) => id,
                None => {
                    let id = synthetic_id(regions.len());
                    warn!(
                        "Boundary feature {} has no identifier field, assigning '{}'",
                        index, id
                    );
                    id
                }
            };
            let id = if used.insert(base_id.clone()) {
                base_id
            } else {
                let suffix = next_suffix.entry(base_id.clone()).or_insert(2);
                let unique = loop {
                    let candidate = format!("{}#{}", base_id, suffix);
                    *suffix += 1;
                    if used.insert(candidate.clone()) {
                        break candidate;
                    }
                };
                warn!(
                    "Duplicate region identifier '{}' at feature {}, using '{}'",
                    base_id, index, unique
                );
                unique
            };

            let sample_point = LonLat::from(centroid);
            debug!(
                "Region '{}' sample point lon={:.4} lat={:.4}",
                id, sample_point.lon, sample_point.lat
            );
            regions.push(Region {
                id,
                name: resolve_name(&feature.properties),
                admin: resolve_admin(&feature.properties),
                geometry,
                sample_point,
            });
        }

        Self { regions }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }
}

impl<'a> IntoIterator for &'a RegionCatalog {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}
