//! Twelve-layer monthly climatology rasters (WorldClim-style GeoTIFF sets).

use crate::acquire::fetcher::DatasetFetcher;
use crate::grid::error::GridError;
use crate::grid::sample::Sample;
use crate::sources::error::SourceError;
use crate::sources::geotiff::read_geotiff;
use crate::sources::raster::Raster;
use crate::sources::ClimateSource;
use crate::types::month::CalendarMonth;
use crate::types::variable::{ClimateVariable, UnitConversion};
use bon::Builder;
use log::{debug, info};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::task;

/// How the monthly layers of a raster set are named and scaled.
///
/// Patterns may contain `{m}` (month number, 1 to 12) and `{mm}` (zero-padded).
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct RasterLayout {
    #[builder(into, default = String::from("tmean_{m}.tif"))]
    pub temperature_pattern: String,
    #[builder(into, default = String::from("prec_{m}.tif"))]
    pub precipitation_pattern: String,
    /// Temperatures are stored as integer tenths of a degree.
    #[builder(default = 10.0)]
    pub temperature_divisor: f64,
}

impl Default for RasterLayout {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RasterLayout {
    /// File name of the layer holding `variable` for `month`.
    pub fn file_name(&self, variable: ClimateVariable, month: CalendarMonth) -> Option<String> {
        let pattern = match variable {
            ClimateVariable::Temperature => &self.temperature_pattern,
            ClimateVariable::Precipitation => &self.precipitation_pattern,
            ClimateVariable::SeaSurfaceTemperature => return None,
        };
        Some(
            pattern
                .replace("{mm}", &format!("{:02}", month.get()))
                .replace("{m}", &month.get().to_string()),
        )
    }

    fn conversion(&self, variable: ClimateVariable) -> UnitConversion {
        match variable {
            ClimateVariable::Temperature => UnitConversion::Divide(self.temperature_divisor),
            _ => UnitConversion::Identity,
        }
    }
}

/// Where the raster layers come from.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterArchive {
    /// A directory already holding every layer (possibly in subdirectories).
    Local(PathBuf),
    /// One zip archive per variable holding its twelve layers, cached after the first run.
    Remote {
        temperature_url: String,
        precipitation_url: String,
    },
}

/// A source backed by twelve monthly rasters per variable.
///
/// Sea-surface temperature is never provided.
#[derive(Debug, Clone)]
pub struct MonthlyRasterSource {
    temperature: Vec<Raster>,
    precipitation: Vec<Raster>,
    layout: RasterLayout,
    description: String,
}

impl MonthlyRasterSource {
    /// Builds a source from already-decoded layers, January first.
    pub fn from_layers(
        temperature: Vec<Raster>,
        precipitation: Vec<Raster>,
        layout: RasterLayout,
    ) -> Result<Self, SourceError> {
        for (variable, layers) in [
            (ClimateVariable::Temperature, &temperature),
            (ClimateVariable::Precipitation, &precipitation),
        ] {
            if layers.len() != CalendarMonth::COUNT {
                return Err(SourceError::InvalidLayers {
                    variable,
                    source: GridError::LayerCount {
                        expected: CalendarMonth::COUNT,
                        found: layers.len(),
                    },
                });
            }
        }
        Ok(Self {
            temperature,
            precipitation,
            layout,
            description: "in-memory monthly raster set".to_string(),
        })
    }

    /// Loads all layers from a local directory.
    pub async fn open(dir: &Path, layout: RasterLayout) -> Result<Self, SourceError> {
        Self::open_split(dir, dir, layout).await
    }

    /// Resolves `archive` (downloading and extracting when remote) and loads it.
    pub async fn acquire(
        archive: &RasterArchive,
        layout: RasterLayout,
        fetcher: &DatasetFetcher,
    ) -> Result<Self, SourceError> {
        match archive {
            RasterArchive::Local(dir) => Self::open(dir, layout).await,
            RasterArchive::Remote {
                temperature_url,
                precipitation_url,
            } => {
                let temperature_dir = fetcher.fetch_into_dir(temperature_url).await?;
                let precipitation_dir = fetcher.fetch_into_dir(precipitation_url).await?;
                Self::open_split(&temperature_dir, &precipitation_dir, layout).await
            }
        }
    }

    async fn open_split(
        temperature_dir: &Path,
        precipitation_dir: &Path,
        layout: RasterLayout,
    ) -> Result<Self, SourceError> {
        let description = format!(
            "monthly raster set (tmean: {}, prcp: {})",
            temperature_dir.join(&layout.temperature_pattern).display(),
            precipitation_dir.join(&layout.precipitation_pattern).display()
        );
        let temperature = {
            let (dir, layout) = (temperature_dir.to_path_buf(), layout.clone());
            task::spawn_blocking(move || load_layers(&dir, ClimateVariable::Temperature, &layout))
        };
        let precipitation = {
            let (dir, layout) = (precipitation_dir.to_path_buf(), layout.clone());
            task::spawn_blocking(move || load_layers(&dir, ClimateVariable::Precipitation, &layout))
        };
        let temperature = temperature.await??;
        let precipitation = precipitation.await??;
        let mut source = Self::from_layers(temperature, precipitation, layout)?;
        source.description = description;
        Ok(source)
    }

    fn layers(&self, variable: ClimateVariable) -> Option<&[Raster]> {
        match variable {
            ClimateVariable::Temperature => Some(&self.temperature),
            ClimateVariable::Precipitation => Some(&self.precipitation),
            ClimateVariable::SeaSurfaceTemperature => None,
        }
    }
}

impl ClimateSource for MonthlyRasterSource {
    fn describe(&self) -> String {
        self.description.clone()
    }

    fn provides(&self, variable: ClimateVariable) -> bool {
        self.layers(variable).is_some()
    }

    fn sample(&self, variable: ClimateVariable, lon: f64, lat: f64, month: CalendarMonth) -> Sample {
        let Some(layers) = self.layers(variable) else {
            return Sample::Unavailable;
        };
        let conversion = self.layout.conversion(variable);
        layers[month.index()]
            .sample(lon, lat)
            .map(|v| conversion.apply(v))
    }
}

fn load_layers(
    dir: &Path,
    variable: ClimateVariable,
    layout: &RasterLayout,
) -> Result<Vec<Raster>, SourceError> {
    let mut layers = Vec::with_capacity(CalendarMonth::COUNT);
    for month in CalendarMonth::all() {
        let file_name = layout.file_name(variable, month).unwrap_or_default();
        let path = find_file(dir, &file_name).ok_or_else(|| SourceError::MissingLayer {
            variable,
            month: month.get(),
            file_name: file_name.clone(),
            dir: dir.to_path_buf(),
        })?;
        debug!("Reading {} layer for month {} from {:?}", variable, month, path);
        layers.push(read_geotiff(&path)?);
    }
    info!("Loaded 12 {} layers from {:?}", variable, dir);
    Ok(layers)
}

/// Breadth-first search for `file_name` under `dir`; shallower matches win.
fn find_file(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let mut queue = VecDeque::from([dir.to_path_buf()]);
    while let Some(current) = queue.pop_front() {
        let candidate = current.join(file_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        let Ok(entries) = std::fs::read_dir(&current) else {
            continue;
        };
        let mut subdirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        subdirs.sort();
        queue.extend(subdirs);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::geotiff::tests::write_geotiff;

    fn month(m: u32) -> CalendarMonth {
        CalendarMonth::new(m).unwrap()
    }

    #[test]
    fn layout_expands_month_tokens() {
        let layout = RasterLayout::builder()
            .temperature_pattern("wc2.1_10m_tavg_{mm}.tif")
            .build();
        assert_eq!(
            layout.file_name(ClimateVariable::Temperature, month(3)).as_deref(),
            Some("wc2.1_10m_tavg_03.tif")
        );
        assert_eq!(
            layout.file_name(ClimateVariable::Precipitation, month(11)).as_deref(),
            Some("prec_11.tif")
        );
        assert_eq!(layout.file_name(ClimateVariable::SeaSurfaceTemperature, month(1)), None);
        assert_eq!(layout.temperature_divisor, 10.0);
    }

    #[tokio::test]
    async fn loads_nested_layers_and_scales_temperature() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("wc_extract");
        std::fs::create_dir_all(&nested).unwrap();
        for m in 1..=12u32 {
            let t = 90.0 + 10.0 * m as f32;
            write_geotiff(
                &nested.join(format!("tmean_{}.tif", m)),
                1,
                1,
                (-10.0, 10.0),
                20.0,
                None,
                &[t],
            );
            write_geotiff(
                &dir.path().join(format!("prec_{}.tif", m)),
                1,
                1,
                (-10.0, 10.0),
                20.0,
                None,
                &[m as f32 * 5.0],
            );
        }

        let source = MonthlyRasterSource::open(dir.path(), RasterLayout::default())
            .await
            .unwrap();
        for m in 1..=12u32 {
            let t = source
                .sample(ClimateVariable::Temperature, 0.0, 0.0, month(m))
                .value()
                .unwrap();
            assert!((t - (9.0 + m as f64)).abs() < 1e-9);
            assert_eq!(
                source.sample(ClimateVariable::Precipitation, 0.0, 0.0, month(m)),
                Sample::Value(m as f64 * 5.0)
            );
        }
        assert_eq!(
            source.sample(ClimateVariable::SeaSurfaceTemperature, 0.0, 0.0, month(1)),
            Sample::Unavailable
        );
        assert_eq!(
            source.sample(ClimateVariable::Temperature, 50.0, 0.0, month(1)),
            Sample::OutOfExtent
        );
    }

    #[tokio::test]
    async fn missing_layer_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = MonthlyRasterSource::open(dir.path(), RasterLayout::default()).await;
        assert!(matches!(
            result,
            Err(SourceError::MissingLayer { month: 1, .. })
        ));
    }

    #[test]
    fn from_layers_requires_twelve_months() {
        let raster = Raster::new(1, 1, 0.0, 0.0, 1.0, 1.0, None, vec![0.0]).unwrap();
        let result = MonthlyRasterSource::from_layers(
            vec![raster.clone(); 11],
            vec![raster; 12],
            RasterLayout::default(),
        );
        assert!(matches!(
            result,
            Err(SourceError::InvalidLayers {
                variable: ClimateVariable::Temperature,
                ..
            })
        ));
    }
}
