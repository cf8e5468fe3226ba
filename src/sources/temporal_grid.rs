//! Reanalysis-style gridded time series (ERA5 / ERA5-Land monthly means).

use crate::grid::monthly_grid::MonthlyGrid;
use crate::grid::sample::Sample;
use crate::sources::error::SourceError;
use crate::sources::gridded_dataset::{read_dataset, GridInput};
use crate::sources::ClimateSource;
use crate::types::month::CalendarMonth;
use crate::types::variable::{ClimateVariable, UnitConversion};
use bon::bon;
use log::{info, warn};
use tokio::task;

/// A source backed by one gridded dataset per variable.
///
/// Every dataset is reduced to a monthly climatology when the source is opened,
/// and converted into profile units afterwards (K to °C, m to mm).
#[derive(Debug, Clone)]
pub struct TemporalGridSource {
    temperature: MonthlyGrid,
    precipitation: MonthlyGrid,
    sea_surface: Option<MonthlyGrid>,
    description: String,
}

#[bon]
impl TemporalGridSource {
    /// Opens the datasets and builds their monthly climatologies.
    ///
    /// Temperature and precipitation are mandatory. A sea-surface input that
    /// cannot be read is logged and the source continues without it.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use climate_profiles::{GridInput, TemporalGridSource};
    ///
    /// # async fn run() -> Result<(), climate_profiles::SourceError> {
    /// let source = TemporalGridSource::open()
    ///     .temperature(GridInput::new("data/era5land_t2m_monthly.nc", "t2m"))
    ///     .precipitation(GridInput::new("data/era5land_tp_monthly.nc", "tp"))
    ///     .sea_surface(GridInput::new("data/era5_sst_monthly.nc", "sst"))
    ///     .call()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn open(
        temperature: GridInput,
        precipitation: GridInput,
        sea_surface: Option<GridInput>,
    ) -> Result<Self, SourceError> {
        let description = describe_inputs(&temperature, &precipitation, sea_surface.as_ref());

        let temperature_task = {
            let input = temperature.clone();
            task::spawn_blocking(move || load_grid(&input, ClimateVariable::Temperature))
        };
        let precipitation_task = {
            let input = precipitation.clone();
            task::spawn_blocking(move || load_grid(&input, ClimateVariable::Precipitation))
        };
        let sea_surface_task = sea_surface.clone().map(|input| {
            task::spawn_blocking(move || load_grid(&input, ClimateVariable::SeaSurfaceTemperature))
        });

        let temperature = temperature_task.await??;
        let precipitation = precipitation_task.await??;
        let sea_surface = match (sea_surface_task, sea_surface) {
            (Some(handle), Some(input)) => match handle.await? {
                Ok(grid) => Some(grid),
                Err(e) => {
                    warn!(
                        "Sea-surface temperature unavailable, continuing without it ({:?}): {}",
                        input.path, e
                    );
                    None
                }
            },
            _ => {
                warn!("No sea-surface temperature dataset configured; sst will be null");
                None
            }
        };

        Ok(Self {
            temperature,
            precipitation,
            sea_surface,
            description,
        })
    }
}

impl TemporalGridSource {
    /// Builds a source from grids still in dataset units (Kelvin, metres).
    pub fn from_raw_grids(
        temperature: MonthlyGrid,
        precipitation: MonthlyGrid,
        sea_surface: Option<MonthlyGrid>,
    ) -> Self {
        let description = format!(
            "in-memory temporal grid (sst: {})",
            if sea_surface.is_some() { "present" } else { "absent" }
        );
        Self {
            temperature: convert(temperature, ClimateVariable::Temperature),
            precipitation: convert(precipitation, ClimateVariable::Precipitation),
            sea_surface: sea_surface.map(|g| convert(g, ClimateVariable::SeaSurfaceTemperature)),
            description,
        }
    }

    fn grid(&self, variable: ClimateVariable) -> Option<&MonthlyGrid> {
        match variable {
            ClimateVariable::Temperature => Some(&self.temperature),
            ClimateVariable::Precipitation => Some(&self.precipitation),
            ClimateVariable::SeaSurfaceTemperature => self.sea_surface.as_ref(),
        }
    }
}

impl ClimateSource for TemporalGridSource {
    fn describe(&self) -> String {
        self.description.clone()
    }

    fn provides(&self, variable: ClimateVariable) -> bool {
        self.grid(variable).is_some()
    }

    fn sample(&self, variable: ClimateVariable, lon: f64, lat: f64, month: CalendarMonth) -> Sample {
        match self.grid(variable) {
            Some(grid) => grid.sample(month, lon, lat),
            None => Sample::Unavailable,
        }
    }
}

fn convert(grid: MonthlyGrid, variable: ClimateVariable) -> MonthlyGrid {
    let conversion = UnitConversion::for_reanalysis(variable);
    grid.map_values(|v| conversion.apply(v))
}

fn load_grid(input: &GridInput, variable: ClimateVariable) -> Result<MonthlyGrid, SourceError> {
    let dataset = read_dataset(input)?;
    let steps = dataset.temporal.len();
    let grid = dataset
        .into_monthly_grid()
        .map_err(|source| SourceError::Grid {
            path: input.path.clone(),
            source,
        })?;
    let (nlat, nlon) = grid.shape();
    info!(
        "Built {} climatology from '{}' in {:?} ({} x {} grid, {} step(s))",
        variable, input.variable, input.path, nlat, nlon, steps
    );
    Ok(convert(grid, variable))
}

fn describe_inputs(
    temperature: &GridInput,
    precipitation: &GridInput,
    sea_surface: Option<&GridInput>,
) -> String {
    let sst = sea_surface
        .map(|i| i.path.display().to_string())
        .unwrap_or_else(|| "none".to_string());
    format!(
        "temporal grid (t2m: {}, tp: {}, sst: {})",
        temperature.path.display(),
        precipitation.path.display(),
        sst
    )
}
