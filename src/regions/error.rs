use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("Failed to read boundary file '{0}'")]
    BoundaryRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse GeoJSON boundary file '{0}'")]
    GeoJsonParse(PathBuf, #[source] Box<geojson::Error>),

    #[error("Boundary file '{0}' is not a FeatureCollection")]
    NotAFeatureCollection(PathBuf),

    #[error("Unsupported geometry in boundary feature {index}")]
    GeometryConversion {
        index: usize,
        #[source]
        source: Box<geojson::Error>,
    },

    #[error("Unsupported boundary coordinate reference system '{0}'")]
    UnsupportedCrs(String),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
