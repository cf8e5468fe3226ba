use crate::grid::sample::Sample;
use crate::regions::catalog::RegionCatalog;
use crate::sources::ClimateSource;
use crate::types::monthly_variable::MonthlyVariable;
use crate::types::profile::Profile;
use crate::types::region::{LonLat, Region};
use crate::types::variable::ClimateVariable;
use log::{debug, warn};

/// Samples every region of `catalog` from `source`, in catalog order.
///
/// Each variable is sampled at the region's sample point for months 1 to 12.
/// Absent samples (outside the source extent, or no-data cells) leave that
/// month empty and are logged; they never abort the batch. Sea-surface
/// temperature is `None` for every profile when the source does not provide it.
pub fn build_profiles<S: ClimateSource + ?Sized>(catalog: &RegionCatalog, source: &S) -> Vec<Profile> {
    let with_sst = source.provides(ClimateVariable::SeaSurfaceTemperature);
    debug!(
        "Sampling {} regions from {} (sst: {})",
        catalog.len(),
        source.describe(),
        with_sst
    );

    catalog
        .iter()
        .map(|region| Profile {
            id: region.id.clone(),
            lat: region.sample_point.lat,
            lon: region.sample_point.lon,
            admin: region.admin.clone(),
            name: region.name.clone(),
            tmean: sample_variable(source, region, ClimateVariable::Temperature),
            prcp: sample_variable(source, region, ClimateVariable::Precipitation),
            sst: with_sst
                .then(|| sample_variable(source, region, ClimateVariable::SeaSurfaceTemperature)),
        })
        .collect()
}

fn sample_variable<S: ClimateSource + ?Sized>(
    source: &S,
    region: &Region,
    variable: ClimateVariable,
) -> MonthlyVariable {
    let LonLat { lon, lat } = region.sample_point;
    let mut out_of_extent = 0;
    let mut no_data = 0;
    let mut unavailable = 0;

    let series = MonthlyVariable::from_fn(variable.unit(), |month| {
        match source.sample(variable, lon, lat, month) {
            Sample::Value(v) => Some(v),
            Sample::OutOfExtent => {
                out_of_extent += 1;
                None
            }
            Sample::NoData => {
                no_data += 1;
                None
            }
            Sample::Unavailable => {
                unavailable += 1;
                None
            }
        }
    });

    if out_of_extent > 0 {
        warn!(
            "Region '{}': sample point ({:.4}, {:.4}) is outside the {} coverage for {} month(s)",
            region.id, lon, lat, variable, out_of_extent
        );
    }
    if no_data > 0 {
        warn!(
            "Region '{}': no {} data at ({:.4}, {:.4}) for {} month(s)",
            region.id, variable, lon, lat, no_data
        );
    }
    if unavailable > 0 {
        warn!(
            "Region '{}': source does not provide {}",
            region.id, variable
        );
    }
    series
}
