//! This module provides the main entry point of the crate: turning a boundary
//! file and a configured climate source into a persisted profile document.

use crate::acquire::fetcher::DatasetFetcher;
use crate::error::ProfileError;
use crate::profiles::builder::build_profiles;
use crate::profiles::writer::write_document;
use crate::regions::boundary_loader::load_boundaries;
use crate::regions::crs::BoundaryCrs;
use crate::sources::gridded_dataset::GridInput;
use crate::sources::monthly_raster::{MonthlyRasterSource, RasterArchive, RasterLayout};
use crate::sources::temporal_grid::TemporalGridSource;
use crate::sources::{ClimateSource, DynClimateSource};
use crate::types::profile::{ProfileDocument, Provenance};
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::{bon, Builder};
use log::info;
use std::path::{Path, PathBuf};

const POLYGON_MEAN_NOTE: &str = "Replace with polygon means for higher fidelity";

/// Selects which kind of climate source feeds the profiles.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    /// Gridded reanalysis time series, one dataset per variable.
    TemporalGrid {
        temperature: GridInput,
        precipitation: GridInput,
        sea_surface: Option<GridInput>,
    },
    /// Twelve precomputed monthly rasters per variable.
    MonthlyRasterSet {
        archive: RasterArchive,
        layout: RasterLayout,
    },
}

impl SourceConfig {
    /// The provenance written when the caller does not supply one.
    pub fn default_provenance(&self) -> Provenance {
        let source = match self {
            SourceConfig::TemporalGrid {
                sea_surface: Some(_),
                ..
            } => "ERA5-Land Monthly Means with ERA5 SST (centroid sample)",
            SourceConfig::TemporalGrid { .. } => "ERA5-Land Monthly Means (centroid sample)",
            SourceConfig::MonthlyRasterSet { .. } => {
                "WorldClim monthly climatology rasters (centroid sample)"
            }
        };
        Provenance::new(source, POLYGON_MEAN_NOTE)
    }
}

/// Runs the whole batch: load regions, open the source, sample, write.
///
/// The pipeline owns the dataset cache used by remote raster archives.
///
/// # Examples
///
/// ```no_run
/// use climate_profiles::{GridInput, ProfileError, ProfilePipeline, SourceConfig};
/// use std::path::Path;
///
/// # async fn run() -> Result<(), ProfileError> {
/// let pipeline = ProfilePipeline::new().await?;
/// let document = pipeline
///     .run()
///     .boundaries(Path::new("data/admin1.geojson"))
///     .source(SourceConfig::TemporalGrid {
///         temperature: GridInput::new("data/era5land_t2m_monthly.nc", "t2m"),
///         precipitation: GridInput::new("data/era5land_tp_monthly.nc", "tp"),
///         sea_surface: None,
///     })
///     .output(Path::new("public/data/admin1_climate.json"))
///     .call()
///     .await?;
/// println!("{} regions written", document.features.len());
/// # Ok(())
/// # }
/// ```
pub struct ProfilePipeline {
    fetcher: DatasetFetcher,
}

#[bon]
impl ProfilePipeline {
    /// Creates a pipeline caching downloads under the given directory.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::CacheDirCreation`] if the directory cannot be created.
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, ProfileError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| ProfileError::CacheDirCreation(cache_folder.clone(), e))?;
        Ok(Self {
            fetcher: DatasetFetcher::new(&cache_folder),
        })
    }

    /// Creates a pipeline using the platform cache directory
    /// (e.g. `~/.cache/climate_profiles_cache` on Linux).
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::CacheDirResolution`] if no cache directory is known
    /// for the platform, or [`ProfileError::CacheDirCreation`] if it cannot be created.
    pub async fn new() -> Result<Self, ProfileError> {
        let cache_folder = get_cache_dir().map_err(ProfileError::CacheDirResolution)?;
        Self::with_cache_folder(cache_folder).await
    }

    pub fn cache_dir(&self) -> &Path {
        self.fetcher.cache_dir()
    }

    /// Builds the climate source described by `config`.
    ///
    /// All I/O (downloads, archive extraction, dataset decoding) happens here;
    /// the returned source only does in-memory lookups.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Source`] when a mandatory dataset or raster layer
    /// cannot be read, and [`ProfileError::Acquire`] (wrapped in the source
    /// error) when a remote archive cannot be downloaded or extracted.
    pub async fn open_source(&self, config: &SourceConfig) -> Result<DynClimateSource, ProfileError> {
        let source: DynClimateSource = match config {
            SourceConfig::TemporalGrid {
                temperature,
                precipitation,
                sea_surface,
            } => Box::new(
                TemporalGridSource::open()
                    .temperature(temperature.clone())
                    .precipitation(precipitation.clone())
                    .maybe_sea_surface(sea_surface.clone())
                    .call()
                    .await?,
            ),
            SourceConfig::MonthlyRasterSet { archive, layout } => Box::new(
                MonthlyRasterSource::acquire(archive, layout.clone(), &self.fetcher).await?,
            ),
        };
        info!("Opened climate source: {}", source.describe());
        Ok(source)
    }

    /// Produces and saves the profile document for every region in `boundaries`.
    ///
    /// The source is opened before anything is written, so a failing mandatory
    /// dataset aborts the run without partial output.
    ///
    /// # Arguments
    ///
    /// * `.boundaries(&Path)`: **Required.** GeoJSON FeatureCollection of region boundaries.
    /// * `.boundary_crs(BoundaryCrs)`: Optional. Overrides the CRS declared by the file.
    /// * `.source(SourceConfig)`: **Required.** The climate source to sample.
    /// * `.output(&Path)`: **Required.** Where the JSON document is written.
    /// * `.provenance(Provenance)`: Optional. Defaults to [`SourceConfig::default_provenance`].
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Region`] if the boundary file cannot be read,
    /// [`ProfileError::Source`] if the source cannot be built and
    /// [`ProfileError::Write`] if the document cannot be saved.
    #[builder]
    pub async fn run(
        &self,
        boundaries: &Path,
        boundary_crs: Option<BoundaryCrs>,
        source: SourceConfig,
        output: &Path,
        provenance: Option<Provenance>,
    ) -> Result<ProfileDocument, ProfileError> {
        let climate_source = self.open_source(&source).await?;
        let catalog = load_boundaries(boundaries, boundary_crs).await?;

        let profiles = build_profiles(&catalog, &climate_source);
        let provenance = provenance.unwrap_or_else(|| source.default_provenance());
        let document = write_document(profiles, provenance);
        document.save(output).await?;
        Ok(document)
    }
}

/// Everything one batch run needs, e.g. as assembled from command-line flags.
#[derive(Debug, Clone, Builder)]
pub struct PipelineConfig {
    #[builder(into)]
    pub boundaries: PathBuf,
    pub boundary_crs: Option<BoundaryCrs>,
    #[builder(into)]
    pub output: PathBuf,
    pub source: SourceConfig,
    pub provenance: Option<Provenance>,
    /// Falls back to the platform cache directory.
    #[builder(into)]
    pub cache_dir: Option<PathBuf>,
}

impl PipelineConfig {
    /// Creates the pipeline for this configuration and runs it once.
    pub async fn execute(self) -> Result<ProfileDocument, ProfileError> {
        let pipeline = match self.cache_dir {
            Some(dir) => ProfilePipeline::with_cache_folder(dir).await?,
            None => ProfilePipeline::new().await?,
        };
        pipeline
            .run()
            .boundaries(&self.boundaries)
            .maybe_boundary_crs(self.boundary_crs)
            .source(self.source)
            .output(&self.output)
            .maybe_provenance(self.provenance)
            .call()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::Write;

    const BOUNDARIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature",
             "properties": {"adm1_code": "AAA-1", "name_en": "West", "admin": "Alpha"},
             "geometry": {"type": "Polygon", "coordinates": [[[-0.2,-0.2],[0.2,-0.2],[0.2,0.2],[-0.2,0.2],[-0.2,-0.2]]]}},
            {"type": "Feature",
             "properties": {"ne_id": 1159315805, "name": "East"},
             "geometry": {"type": "Polygon", "coordinates": [[[0.8,0.8],[1.2,0.8],[1.2,1.2],[0.8,1.2],[0.8,0.8]]]}}
        ]
    }"#;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn grid_csv(variable: &str, value: f64) -> String {
        let mut csv = format!("time,lat,lon,{}\n", variable);
        for m in 1..=12 {
            for (lat, lon) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                csv.push_str(&format!("2001-{:02}-01,{},{},{}\n", m, lat, lon, value + m as f64));
            }
        }
        csv
    }

    #[tokio::test]
    async fn end_to_end_temporal_grid_run() {
        let dir = tempfile::tempdir().unwrap();
        let boundaries = write_file(dir.path(), "admin1.geojson", BOUNDARIES);
        let t2m = write_file(dir.path(), "t2m.csv", &grid_csv("t2m", 273.15));
        let tp = write_file(dir.path(), "tp.csv", &grid_csv("tp", 0.0));
        let output = dir.path().join("out").join("profiles.json");

        let document = PipelineConfig::builder()
            .boundaries(&boundaries)
            .output(&output)
            .source(SourceConfig::TemporalGrid {
                temperature: GridInput::new(&t2m, "t2m"),
                precipitation: GridInput::new(&tp, "tp"),
                sea_surface: Some(GridInput::new(dir.path().join("missing_sst.nc"), "sst")),
            })
            .cache_dir(dir.path().join("cache"))
            .build()
            .execute()
            .await
            .unwrap();

        assert_eq!(document.features.len(), 2);
        assert_eq!(document.features[1].id, "1159315805");

        let written: Value = serde_json::from_slice(&std::fs::read(&output).unwrap()).unwrap();
        let features = written["features"].as_array().unwrap();
        assert_eq!(features[0]["id"], "AAA-1");
        assert_eq!(features[1]["name"], "East");
        assert_eq!(features[1]["sst"], Value::Null);
        let tmean = features[0]["tmean"].as_array().unwrap();
        assert_eq!(tmean.len(), 12);
        assert!((tmean[6].as_f64().unwrap() - 7.0).abs() < 1e-6);
        let prcp = features[1]["prcp"].as_array().unwrap();
        assert!((prcp[11].as_f64().unwrap() - 12_000.0).abs() < 1e-6);
        assert!(written["meta"]["source"].as_str().unwrap().contains("ERA5"));
    }

    #[tokio::test]
    async fn failing_mandatory_source_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let boundaries = write_file(dir.path(), "admin1.geojson", BOUNDARIES);
        let output = dir.path().join("profiles.json");
        let pipeline = ProfilePipeline::with_cache_folder(dir.path().join("cache"))
            .await
            .unwrap();

        let result = pipeline
            .run()
            .boundaries(&boundaries)
            .source(SourceConfig::MonthlyRasterSet {
                archive: RasterArchive::Local(dir.path().join("no_rasters")),
                layout: RasterLayout::default(),
            })
            .output(&output)
            .call()
            .await;

        assert!(matches!(result, Err(ProfileError::Source(_))));
        assert!(!output.exists());
    }

    #[test]
    fn default_provenance_names_dataset_and_sampling() {
        let config = SourceConfig::MonthlyRasterSet {
            archive: RasterArchive::Local(PathBuf::from("rasters")),
            layout: RasterLayout::default(),
        };
        let provenance = config.default_provenance();
        assert!(provenance.source.contains("WorldClim"));
        assert!(provenance.source.contains("centroid sample"));
        assert!(provenance.note.contains("polygon means"));
    }
}
