/// Outcome of sampling one variable at one point for one month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// The nearest cell holds a value (already in profile units).
    Value(f64),
    /// The nearest cell exists but holds no data (NaN or the dataset fill value).
    NoData,
    /// The coordinate lies outside the area the source covers.
    OutOfExtent,
    /// The source does not provide this variable at all.
    Unavailable,
}

impl Sample {
    /// Wraps a raw cell value, treating NaN as no data.
    pub fn from_cell(value: f64) -> Self {
        if value.is_nan() {
            Sample::NoData
        } else {
            Sample::Value(value)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Sample::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Sample::Value(v) => Sample::Value(f(v)),
            other => other,
        }
    }
}
