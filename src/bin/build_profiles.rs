//! Builds the per-region monthly climate profile document from the command line.

use clap::{Parser, ValueEnum};
use climate_profiles::{
    BoundaryCrs, GridInput, PipelineConfig, ProfileError, RasterArchive, RasterLayout,
    SourceConfig,
};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// ERA5-style gridded datasets (.nc, .csv, .parquet)
    TemporalGrid,
    /// Twelve GeoTIFF layers per variable
    MonthlyRaster,
}

#[derive(Parser, Debug)]
#[command(name = "build_profiles")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Administrative boundaries (GeoJSON FeatureCollection)
    #[arg(long, default_value = "data/admin1_50m.geojson")]
    admin: PathBuf,

    /// Output JSON document
    #[arg(long)]
    out: PathBuf,

    /// Kind of climate source to sample
    #[arg(long, value_enum, default_value = "temporal-grid")]
    source: SourceKind,

    /// 2 m temperature dataset (Kelvin); .nc needs a build with `--features netcdf`,
    /// .csv and .parquet always work
    #[arg(long, default_value = "data/era5land_t2m_monthly.nc")]
    t2m: PathBuf,

    /// Total precipitation dataset (metres); .nc needs `--features netcdf`
    #[arg(long, default_value = "data/era5land_tp_monthly.nc")]
    tp: PathBuf,

    /// Sea-surface temperature dataset (Kelvin); optional at run time, .nc needs
    /// `--features netcdf`
    #[arg(long, default_value = "data/era5_sst_monthly.nc")]
    sst: PathBuf,

    /// Skip sea-surface temperature entirely
    #[arg(long)]
    no_sst: bool,

    #[arg(long, default_value = "t2m")]
    t2m_var: String,

    #[arg(long, default_value = "tp")]
    tp_var: String,

    #[arg(long, default_value = "sst")]
    sst_var: String,

    /// Directory holding the monthly rasters
    #[arg(long, default_value = "data/worldclim")]
    raster_dir: PathBuf,

    /// Download URL of the temperature layers as a .zip archive (needs --prcp-url)
    #[arg(long, requires = "prcp_url")]
    tmean_url: Option<String>,

    /// Download URL of the precipitation layers as a .zip archive (needs --tmean-url)
    #[arg(long, requires = "tmean_url")]
    prcp_url: Option<String>,

    /// Temperature layer file name; {m} / {mm} expand to the month
    #[arg(long, default_value = "tmean_{m}.tif")]
    tmean_pattern: String,

    /// Precipitation layer file name; {m} / {mm} expand to the month
    #[arg(long, default_value = "prec_{m}.tif")]
    prcp_pattern: String,

    /// Download cache (defaults to the platform cache directory)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// CRS of the boundary file, e.g. EPSG:4326 or EPSG:3857
    #[arg(long)]
    boundary_crs: Option<BoundaryCrs>,

    /// Log level; RUST_LOG is used when absent
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

impl Cli {
    fn source_config(&self) -> SourceConfig {
        match self.source {
            SourceKind::TemporalGrid => SourceConfig::TemporalGrid {
                temperature: GridInput::new(&self.t2m, &self.t2m_var),
                precipitation: GridInput::new(&self.tp, &self.tp_var),
                sea_surface: (!self.no_sst).then(|| GridInput::new(&self.sst, &self.sst_var)),
            },
            SourceKind::MonthlyRaster => {
                let archive = match (&self.tmean_url, &self.prcp_url) {
                    (Some(temperature_url), Some(precipitation_url)) => RasterArchive::Remote {
                        temperature_url: temperature_url.clone(),
                        precipitation_url: precipitation_url.clone(),
                    },
                    _ => RasterArchive::Local(self.raster_dir.clone()),
                };
                let layout = RasterLayout::builder()
                    .temperature_pattern(&self.tmean_pattern)
                    .precipitation_pattern(&self.prcp_pattern)
                    .build();
                SourceConfig::MonthlyRasterSet { archive, layout }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), ProfileError> {
    let cli = Cli::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = cli.log_level {
        logger.filter_level(level);
    }
    logger.init();

    let document = PipelineConfig::builder()
        .boundaries(cli.admin.clone())
        .maybe_boundary_crs(cli.boundary_crs)
        .output(cli.out.clone())
        .source(cli.source_config())
        .maybe_cache_dir(cli.cache_dir.clone())
        .build()
        .execute()
        .await?;

    println!(
        "Wrote {} with {} regions",
        cli.out.display(),
        document.features.len()
    );
    Ok(())
}
