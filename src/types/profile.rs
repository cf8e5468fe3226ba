//! Output records: one [`Profile`] per region, packaged into a [`ProfileDocument`].

use crate::types::monthly_variable::MonthlyVariable;
use serde::Serialize;

/// The monthly climate profile of one region.
///
/// Field order matches the output document schema consumed by the map client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: String,
    /// Latitude of the sample point.
    pub lat: f64,
    /// Longitude of the sample point (not part of the output document).
    #[serde(skip)]
    pub lon: f64,
    pub admin: Option<String>,
    pub name: Option<String>,
    /// Mean temperature in °C.
    pub tmean: MonthlyVariable,
    /// Precipitation in mm.
    pub prcp: MonthlyVariable,
    /// Sea-surface temperature in °C, `None` when the source does not provide it.
    pub sst: Option<MonthlyVariable>,
}

/// Free-text description of where the profile values came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    pub source: String,
    pub note: String,
}

impl Provenance {
    pub fn new(source: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            note: note.into(),
        }
    }
}

/// The persisted artifact: provenance plus every profile in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileDocument {
    pub meta: Provenance,
    pub features: Vec<Profile>,
}
