//! The twelve-value monthly series stored for each variable of a profile.

use crate::types::month::CalendarMonth;
use crate::types::variable::Unit;
use serde::{Serialize, Serializer};

/// Exactly twelve monthly values (January first) plus their unit.
///
/// A month whose sample was absent (out of the source extent, or a no-data cell)
/// holds `None`; the sequence itself always has twelve slots. Variables that a
/// source does not provide at all are represented by the profile as a whole
/// absent `MonthlyVariable`, never by a sequence of `None`s.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyVariable {
    unit: Unit,
    values: [Option<f64>; CalendarMonth::COUNT],
}

impl MonthlyVariable {
    pub fn new(unit: Unit, values: [Option<f64>; CalendarMonth::COUNT]) -> Self {
        Self { unit, values }
    }

    /// Builds the series by evaluating `sample` for each month in calendar order.
    pub fn from_fn(unit: Unit, mut sample: impl FnMut(CalendarMonth) -> Option<f64>) -> Self {
        let mut values = [None; CalendarMonth::COUNT];
        for month in CalendarMonth::all() {
            values[month.index()] = sample(month);
        }
        Self { unit, values }
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn values(&self) -> &[Option<f64>; CalendarMonth::COUNT] {
        &self.values
    }

    pub fn get(&self, month: CalendarMonth) -> Option<f64> {
        self.values[month.index()]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of months that have no value.
    pub fn missing_months(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// Serialised as a bare array of twelve numbers (or `null`s); the unit is
/// implied by the field name in the output document.
impl Serialize for MonthlyVariable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}
